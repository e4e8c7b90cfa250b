//! FuelOps CLI - Driver client for fueling task dispatch
//!
//! Provides commands for:
//! - Signing in as a driver
//! - Listing, starting, completing and flagging tasks
//! - Watching the task board live
//! - Reading dispatch notifications
//! - Registering push tokens and drivers

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use fuelops_core::config::Config;
use tracing_subscriber::EnvFilter;

mod commands;
mod context;
mod output;

use commands::{
    auth::AuthCommand, completions::CompletionsCommand, config::ConfigCommand,
    drivers::DriversCommand, notifications::NotificationsCommand, push::PushCommand,
    tasks::TasksCommand, watch::WatchCommand,
};
use context::{load_config, GlobalArgs};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "fuelops", version, about = "FuelOps driver client")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and out
    #[command(subcommand)]
    Auth(AuthCommand),
    /// Work with assigned tasks
    #[command(subcommand)]
    Tasks(TasksCommand),
    /// Follow the task board live until interrupted
    Watch(WatchCommand),
    /// Read dispatch notifications
    #[command(subcommand)]
    Notifications(NotificationsCommand),
    /// Register this device for push messages
    #[command(subcommand)]
    Push(PushCommand),
    /// Manage driver accounts
    #[command(subcommand)]
    Drivers(DriversCommand),
    /// View and check configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

/// Filter directive for the `-v` count, falling back to the configured level
fn log_filter(verbose: u8, quiet: bool, config: &Config) -> String {
    match verbose {
        0 if quiet => "warn".to_string(),
        0 => config.logging.level.clone(),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

fn init_tracing(filter: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let globals = GlobalArgs {
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
        quiet: cli.quiet,
        config_path: cli.config.clone().unwrap_or_else(Config::default_path),
    };

    // Defaults when the file is unreadable; `config validate` reports why.
    let logging_config = load_config(&globals.config_path).unwrap_or_default();
    init_tracing(
        &log_filter(cli.verbose, cli.quiet, &logging_config),
        logging_config.logging.format == "json",
    );

    match cli.command {
        Commands::Auth(cmd) => cmd.execute(&globals).await,
        Commands::Tasks(cmd) => cmd.execute(&globals).await,
        Commands::Watch(cmd) => cmd.execute(&globals).await,
        Commands::Notifications(cmd) => cmd.execute(&globals).await,
        Commands::Push(cmd) => cmd.execute(&globals).await,
        Commands::Drivers(cmd) => cmd.execute(&globals).await,
        Commands::Config(cmd) => cmd.execute(&globals).await,
        Commands::Completions(cmd) => cmd.execute(&globals).await,
    }
}
