pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use giftmatch_core::config::LoadOptions;

use crate::commands::message::MessageArgs;
use crate::commands::suggest::SuggestArgs;

#[derive(Debug, Parser)]
#[command(
    name = "giftmatch",
    about = "Giftmatch operator CLI",
    long_about = "Prepare the catalog database, inspect configuration, and run gift suggestions from a profile file.",
    after_help = "Examples:\n  giftmatch migrate\n  giftmatch seed\n  giftmatch suggest --profile recipient.json --top-n 5\n  giftmatch message --profile recipient.json --product e-reader --seed 7\n  giftmatch doctor --json"
)]
pub struct Cli {
    #[arg(long, global = true, value_name = "PATH", help = "Config file (defaults to giftmatch.toml)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the deterministic demo gift catalog and verify it")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution"
    )]
    Config,
    #[command(about = "Validate config, message templates, and catalog readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Rank the catalog for a recipient profile and write a message for the top pick")]
    Suggest(SuggestArgs),
    #[command(about = "Write a fresh message for one product")]
    Message(MessageArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Config => commands::CommandResult { exit_code: 0, output: commands::config::run(options) },
        Command::Doctor { json } => {
            let (output, passed) = commands::doctor::run(options, json);
            commands::CommandResult { exit_code: if passed { 0 } else { 1 }, output }
        }
        Command::Suggest(args) => commands::suggest::run(options, &args),
        Command::Message(args) => commands::message::run(options, &args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
