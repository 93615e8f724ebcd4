//! Loopcutter CLI
//!
//! Command-line interface for loop slicing and patch export.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::info;

use loopcutter::cli::{commands, Cli, Commands};
use loopcutter::config::Config;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logger
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_filter)).init();

    info!("Loopcutter v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    match cli.command {
        Some(cmd) => handle_command(&config, cmd),
        None => {
            println!("Loopcutter v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(config: &Config, cmd: Commands) -> anyhow::Result<()> {
    if let Commands::Check = cmd {
        let passed = commands::check(config).context("self-check could not run")?;
        anyhow::ensure!(passed, "self-check failed");
        return Ok(());
    }

    let result = match cmd {
        Commands::Bpm { input } => commands::bpm(config, &input).map(|_| ()),
        Commands::Slice {
            input,
            start,
            end,
            output,
        } => commands::slice(config, &input, start, end, output.as_deref()).map(|_| ()),
        Commands::Pack {
            inputs,
            device,
            bpm,
            slices,
            output,
        } => commands::pack(
            config,
            &inputs,
            device.as_deref(),
            bpm,
            &slices,
            output.as_deref(),
        )
        .map(|_| ()),
        Commands::Batch {
            input,
            slices,
            output,
        } => commands::batch(config, &input, &slices, output.as_deref()).map(|_| ()),
        Commands::Devices => commands::devices(),
        Commands::Check => Ok(()),
    };

    if let Err(err) = &result {
        for suggestion in err.recovery_suggestions() {
            eprintln!("  hint: {}", suggestion);
        }
    }

    result.context("command failed")
}
