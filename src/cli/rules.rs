//! Rules command implementation

use colored::Colorize;

use crate::cli::output::{format_rules_json, format_rules_table, RuleView};
use crate::cli::session::prepare;
use crate::cli::{RulesActivateArgs, RulesCreateArgs, RulesListArgs};
use crate::protocol::RuleDescriptor;
use crate::rules::RuleAdmin;

/// Handle `telewire rules list`
pub async fn handle_rules_list(args: &RulesListArgs) -> Result<String, Box<dyn std::error::Error>> {
    let (config, connector) = prepare(&args.connection)?;
    let admin = RuleAdmin::new(connector).with_timeout(config.rules.response_timeout());

    let views: Vec<RuleView> = admin.list_rules().await?.iter().map(RuleView::from).collect();

    if args.json {
        Ok(format_rules_json(&views))
    } else if views.is_empty() {
        Ok("No rules defined".to_string())
    } else {
        Ok(format_rules_table(&views))
    }
}

/// Handle `telewire rules create`
pub async fn handle_rules_create(
    args: &RulesCreateArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    if args.pattern.is_empty() {
        return Err("pattern cannot be empty".into());
    }

    let (config, connector) = prepare(&args.connection)?;
    let admin = RuleAdmin::new(connector).with_timeout(config.rules.response_timeout());
    let descriptor = RuleDescriptor::pattern(args.pattern.as_bytes(), args.multi_line);

    let id = match args.id {
        Some(id) => admin.create_rule_with_id(id, descriptor, &args.label).await?,
        None => admin.create_rule(descriptor, &args.label).await?,
    };

    Ok(format!("{} Rule created: {}", "✓".green(), id))
}

/// Handle `telewire rules activate`
pub async fn handle_rules_activate(
    args: &RulesActivateArgs,
) -> Result<String, Box<dyn std::error::Error>> {
    let (_config, connector) = prepare(&args.connection)?;
    RuleAdmin::new(connector).set_active_rules(&args.ids).await?;

    Ok(if args.ids.is_empty() {
        "Active rule set cleared".to_string()
    } else {
        format!("Active rule set sent: {} rules", args.ids.len())
    })
}
