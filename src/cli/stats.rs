//! Stats command implementation

use colored::Colorize;

use crate::cli::output::{format_event_json, format_stats_table};
use crate::cli::session::{follow, prepare};
use crate::cli::StatsArgs;
use crate::session::{SessionCommand, SessionMode};
use crate::sync::SyncEvent;

/// Render one event for the terminal. `None` means nothing to show.
pub fn render_stats_event(event: &SyncEvent, json: bool) -> Option<String> {
    if json {
        return match event {
            SyncEvent::ServerTime(_) => None,
            _ => Some(format_event_json(event)),
        };
    }

    match event {
        SyncEvent::StatsSeeded(stats) => Some(format!(
            "{}\n{}",
            format!("Snapshot: {} intervals", stats.len()).bold(),
            format_stats_table(stats)
        )),
        SyncEvent::StatsPrepended(stats) => Some(format!(
            "{}\n{}",
            format!("Older page: {} intervals", stats.len()).bold(),
            format_stats_table(stats)
        )),
        SyncEvent::StatsAppended(stats) => Some(format_stats_table(stats)),
        SyncEvent::HistoryExhausted => Some("No older history on the server".dimmed().to_string()),
        SyncEvent::Closed => Some("Connection closed".yellow().to_string()),
        SyncEvent::ServerTime(_) | SyncEvent::RequestsPrepended(_) => None,
    }
}

/// Handle `telewire stats`
pub async fn run_stats(args: StatsArgs) -> Result<(), Box<dyn std::error::Error>> {
    let (config, connector) = prepare(&args.connection)?;
    let mut pages_left = args.pages;

    let sync = follow(&config, connector, SessionMode::Stats, None, |event| {
        if let Some(output) = render_stats_event(event, args.json) {
            println!("{}", output);
        }

        match event {
            SyncEvent::StatsSeeded(_) | SyncEvent::StatsPrepended(_) if pages_left > 0 => {
                pages_left -= 1;
                Some(SessionCommand::LoadOlder)
            }
            _ => None,
        }
    })
    .await?;

    tracing::info!(
        intervals = sync.stats().len(),
        exhausted = sync.is_exhausted(),
        "Stats session ended"
    );
    Ok(())
}
