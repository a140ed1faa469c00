mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{invert, normalize, replay, InvertArgs, NormalizeArgs, ReplayArgs};
use config::Config;

/// Quire CLI - replay, invert and normalize rich-text operation logs
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply an operation log to a value
    Replay(ReplayArgs),

    /// Print the log that undoes an operation log
    Invert(InvertArgs),

    /// Repair a value against the core schema
    Normalize(NormalizeArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();
    let config = Config::load(&cwd)?;

    match cli.command {
        Command::Replay(args) => replay(args, &config),
        Command::Invert(args) => invert(args, &config),
        Command::Normalize(args) => normalize(args, &config),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
