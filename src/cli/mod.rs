//! CLI module for telewire
//!
//! Command-line interface definitions and handlers.
//!
//! # Commands
//!
//! - `stats` - Follow the server's stats history
//! - `requests` - Tail the request log
//! - `chart` - Fetch aggregated chart series once
//! - `rules` - Administer matching rules (list, create, activate)
//! - `config` - Configuration utilities (init)
//! - `completions` - Generate shell completions
//!
//! # Example
//!
//! ```bash
//! # Follow stats and load two older pages
//! telewire stats --url http://127.0.0.1:8080/admin --pages 2
//!
//! # Activate rules
//! telewire rules activate 17 42
//!
//! # Generate shell completions
//! telewire completions bash > ~/.bash_completion.d/telewire
//! ```

pub mod chart;
pub mod completions;
pub mod config;
pub mod output;
pub mod requests;
pub mod rules;
pub mod session;
pub mod stats;

pub use completions::handle_completions;
pub use config::handle_config_init;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// telewire - admin channel client for telemetry and rules
#[derive(Parser, Debug)]
#[command(
    name = "telewire",
    version,
    about = "Client for binary admin telemetry channels"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the stats history
    Stats(StatsArgs),
    /// Tail the request log
    Requests(RequestsArgs),
    /// Fetch the aggregated chart once
    Chart(ChartArgs),
    /// Administer rules
    #[command(subcommand)]
    Rules(RulesCommands),
    /// Configuration utilities
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Options shared by every command that talks to a server
#[derive(Args, Debug, Clone)]
pub struct ConnectionArgs {
    /// Path to configuration file
    #[arg(short, long, default_value = "telewire.toml")]
    pub config: PathBuf,

    /// Server base URL (http, https, ws or wss)
    #[arg(short, long, env = "TELEWIRE_URL")]
    pub url: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "TELEWIRE_LOG_LEVEL")]
    pub log_level: Option<String>,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Older pages to load after the snapshot
    #[arg(short, long, default_value = "0")]
    pub pages: u32,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RequestsArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Request log entries to keep
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Print events as JSON lines
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ChartArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum RulesCommands {
    /// List rules and their active flag
    List(RulesListArgs),
    /// Create a pattern rule
    Create(RulesCreateArgs),
    /// Replace the active rule set
    Activate(RulesActivateArgs),
}

#[derive(Args, Debug)]
pub struct RulesListArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct RulesCreateArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Pattern the server matches requests against
    pub pattern: String,

    /// Human-readable label
    #[arg(long, default_value = "")]
    pub label: String,

    /// Match across lines
    #[arg(long)]
    pub multi_line: bool,

    /// Use this id instead of a random one
    #[arg(long)]
    pub id: Option<u64>,
}

#[derive(Args, Debug)]
pub struct RulesActivateArgs {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// Rule ids; any rule not listed is deactivated
    pub ids: Vec<u64>,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Initialize a new configuration file
    Init(ConfigInitArgs),
}

#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Output file path
    #[arg(short, long, default_value = "telewire.toml")]
    pub output: PathBuf,

    /// Overwrite existing file
    #[arg(short, long)]
    pub force: bool,

    /// Server base URL to write into `[connection]`
    #[arg(short, long)]
    pub url: Option<String>,
}

#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_parse_stats_defaults() {
        let cli = Cli::try_parse_from(["telewire", "stats"]).unwrap();
        match cli.command {
            Commands::Stats(args) => {
                assert_eq!(args.connection.config, PathBuf::from("telewire.toml"));
                assert_eq!(args.pages, 0);
                assert!(!args.json);
            }
            _ => panic!("Expected Stats command"),
        }
    }

    #[test]
    fn test_cli_parse_stats_with_url_and_pages() {
        let cli = Cli::try_parse_from([
            "telewire",
            "stats",
            "--url",
            "http://10.0.0.1/admin",
            "-p",
            "3",
        ])
        .unwrap();
        match cli.command {
            Commands::Stats(args) => {
                assert_eq!(args.connection.url.as_deref(), Some("http://10.0.0.1/admin"));
                assert_eq!(args.pages, 3);
            }
            _ => panic!("Expected Stats command"),
        }
    }

    #[test]
    fn test_cli_parse_requests_capacity() {
        let cli = Cli::try_parse_from(["telewire", "requests", "--capacity", "20", "--json"]).unwrap();
        match cli.command {
            Commands::Requests(args) => {
                assert_eq!(args.capacity, Some(20));
                assert!(args.json);
            }
            _ => panic!("Expected Requests command"),
        }
    }

    #[test]
    fn test_cli_parse_chart_with_config() {
        let cli = Cli::try_parse_from(["telewire", "chart", "-c", "custom.toml"]).unwrap();
        match cli.command {
            Commands::Chart(args) => {
                assert_eq!(args.connection.config, PathBuf::from("custom.toml"))
            }
            _ => panic!("Expected Chart command"),
        }
    }

    #[test]
    fn test_cli_parse_rules_create() {
        let cli = Cli::try_parse_from([
            "telewire",
            "rules",
            "create",
            "^/wp-admin",
            "--label",
            "wordpress",
            "--multi-line",
        ])
        .unwrap();
        match cli.command {
            Commands::Rules(RulesCommands::Create(args)) => {
                assert_eq!(args.pattern, "^/wp-admin");
                assert_eq!(args.label, "wordpress");
                assert!(args.multi_line);
                assert!(args.id.is_none());
            }
            _ => panic!("Expected Rules Create command"),
        }
    }

    #[test]
    fn test_cli_parse_rules_activate() {
        let cli = Cli::try_parse_from(["telewire", "rules", "activate", "1", "22", "333"]).unwrap();
        match cli.command {
            Commands::Rules(RulesCommands::Activate(args)) => {
                assert_eq!(args.ids, vec![1, 22, 333])
            }
            _ => panic!("Expected Rules Activate command"),
        }
    }

    #[test]
    fn test_cli_parse_rules_activate_empty_clears() {
        let cli = Cli::try_parse_from(["telewire", "rules", "activate"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Rules(RulesCommands::Activate(ref args)) if args.ids.is_empty()
        ));
    }

    #[test]
    fn test_cli_parse_config_init_url() {
        let cli = Cli::try_parse_from([
            "telewire",
            "config",
            "init",
            "--url",
            "https://stats.example.com/admin",
        ])
        .unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init(args)) => {
                assert_eq!(args.output, PathBuf::from("telewire.toml"));
                assert_eq!(args.url.as_deref(), Some("https://stats.example.com/admin"));
            }
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_cli_rejects_non_numeric_rule_id() {
        assert!(Cli::try_parse_from(["telewire", "rules", "activate", "abc"]).is_err());
    }
}
