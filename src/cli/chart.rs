//! Chart command implementation

use crate::cli::output::{format_chart_json, format_chart_table};
use crate::cli::session::prepare;
use crate::cli::ChartArgs;
use crate::exchange::fetch_chart;

/// Handle `telewire chart`
pub async fn run_chart(args: ChartArgs) -> Result<String, Box<dyn std::error::Error>> {
    let (config, connector) = prepare(&args.connection)?;
    let series = fetch_chart(&connector, config.rules.response_timeout()).await?;

    if args.json {
        Ok(format_chart_json(&series))
    } else if series.is_empty() {
        Ok("No chart data".to_string())
    } else {
        Ok(format_chart_table(&series))
    }
}
