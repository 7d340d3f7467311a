//! Wikiwall CLI - random WikiArt desktop backgrounds.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use tracing::error;
use wikiwall_core::WikiwallConfig;

mod commands;
mod exit_codes;
mod logging;
mod utils;

#[derive(Parser)]
#[command(name = "wikiwall")]
#[command(author, version, about = "Set desktop background to a random WikiArt image", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_help = "Exit codes:\n  0    Success\n  1    Something went wrong (details in the log file)\n  130  Interrupted")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,
}

#[derive(Args)]
pub struct RunArgs {
    /// Download images to specified destination
    #[arg(long, value_name = "DIR")]
    pub dest: Option<PathBuf>,

    /// Number of files to keep in download directory. Set to -1 for no limit
    #[arg(long, default_value_t = 10, allow_negative_numbers = true)]
    pub limit: i64,

    /// Show debugging messages
    #[arg(long)]
    pub debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the download directory in the file browser
    Show {
        /// Directory to open (defaults to the download directory)
        #[arg(long, value_name = "DIR")]
        dest: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config = WikiwallConfig::from_env();

    if let Err(e) = logging::init(cli.run.debug, &config.log_path()) {
        eprintln!("{}", format!("Logging to file disabled: {e:#}").yellow());
    }

    let result = match cli.command {
        Some(Commands::Show { dest }) => commands::show::execute(config, dest),
        None => {
            tokio::select! {
                result = commands::run::execute(config, cli.run) => result,
                _ = tokio::signal::ctrl_c() => {
                    println!("\nSee you!");
                    return ExitCode::from(exit_codes::INTERRUPTED);
                }
            }
        }
    };

    match result {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS),
        Err(e) => {
            error!("Something went wrong: {e:#}");
            eprintln!("{}", "Something went wrong. Check the logs.".red());
            ExitCode::from(exit_codes::GENERAL_ERROR)
        }
    }
}
