use clap::Parser;
use telewire::cli::{
    chart, handle_completions, handle_config_init, requests, rules, stats, Cli, Commands,
    ConfigCommands, RulesCommands,
};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Stats(args) => stats::run_stats(args).await,
        Commands::Requests(args) => requests::run_requests(args).await,
        Commands::Chart(args) => match chart::run_chart(args).await {
            Ok(output) => {
                println!("{}", output);
                Ok(())
            }
            Err(e) => Err(e),
        },
        Commands::Rules(cmd) => {
            let output = match cmd {
                RulesCommands::List(args) => rules::handle_rules_list(&args).await,
                RulesCommands::Create(args) => rules::handle_rules_create(&args).await,
                RulesCommands::Activate(args) => rules::handle_rules_activate(&args).await,
            };
            output.map(|msg| println!("{}", msg))
        }
        Commands::Config(config_cmd) => match config_cmd {
            ConfigCommands::Init(args) => handle_config_init(&args),
        },
        Commands::Completions(args) => {
            handle_completions(&args);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
