//! proxywatch: terminal client for the proxy pool dashboard.
//!
//! - `tui`: live, filterable views of history, pool, blacklist and reverify
//! - `query`: one-shot filtered query printed as a table or JSON
//! - `remove`: delete one record from a collection

use anyhow::Result;
use clap::{Parser, Subcommand};
use proxywatch_logging::{init_logging, LogConfig};
use std::process::ExitCode;

mod cli;

#[derive(Parser, Debug)]
#[command(name = "proxywatch", version, about = "Live views of the proxy pool dashboard")]
struct Cli {
    /// Enable verbose logging (info/debug to stderr)
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interactive live views
    Tui {
        #[command(flatten)]
        args: cli::tui::TuiArgs,
    },

    /// Run one filtered query and print the result
    Query {
        #[command(flatten)]
        args: cli::query::QueryArgs,
    },

    /// Remove a record from a collection
    Remove {
        #[command(flatten)]
        args: cli::remove::RemoveArgs,
    },

    /// Show the resolved configuration
    Config {
        #[command(flatten)]
        args: cli::config::ConfigArgs,
    },
}

fn command_wants_json(command: &Commands) -> bool {
    match command {
        Commands::Query { args } => args.json,
        Commands::Config { args } => args.json,
        Commands::Tui { .. } | Commands::Remove { .. } => false,
    }
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Tui { args } => cli::tui::run(args),
        Commands::Query { args } => cli::query::run(args),
        Commands::Remove { args } => cli::remove::run(args),
        Commands::Config { args } => cli::config::run(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let tui_mode = matches!(cli.command, Commands::Tui { .. });
    let json_mode = command_wants_json(&cli.command);

    if let Err(err) = init_logging(LogConfig {
        app_name: "proxywatch",
        verbose: cli.verbose,
        tui_mode,
        log_dir: None,
    }) {
        eprintln!("Warning: logging disabled: {:#}", err);
    }

    match run_command(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if json_mode {
                cli::error::print_json_error(&err);
            } else {
                eprintln!("{:?}", err);
            }
            ExitCode::from(1)
        }
    }
}
