//! ktree - Command-line interface for the Knowledge Tree prerequisite graph.

use anyhow::Context;
use clap::Parser;
use ktree_cli::{commands, open_store, Cli, Config, Formatter};
use tracing_subscriber::EnvFilter;

fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // --verbose wins over RUST_LOG; otherwise stay quiet below warnings
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
    .context("Failed to load configuration")?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    let store = open_store(&config, cli.db.as_deref()).context("Failed to open graph database")?;

    let output = commands::execute(cli.command, &store, &config, &formatter)?;
    if !output.is_empty() {
        println!("{}", output);
    }

    Ok(())
}
