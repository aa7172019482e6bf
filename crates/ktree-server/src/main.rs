//! Knowledge Tree server binary
//!
//! Starts the HTTP server for MVG queries and graph mutation.

use ktree_server::{config::ServerConfig, start_server, ServerError};
use std::env;
use std::process;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

async fn run() -> Result<(), ServerError> {
    let args: Vec<String> = env::args().collect();

    let config = if args.len() > 2 && args[1] == "--config" {
        ServerConfig::from_file(&args[2])?
    } else if args.len() > 1 && args[1] == "--help" {
        print_help();
        process::exit(0);
    } else {
        eprintln!("Warning: No config file specified, using default test configuration");
        eprintln!("Usage: ktree-server --config <path-to-config.toml>");
        eprintln!();
        ServerConfig::default_test_config()
    };

    start_server(config).await?;

    Ok(())
}

fn print_help() {
    println!("Knowledge Tree Server - Prerequisite graph and MVG queries");
    println!();
    println!("USAGE:");
    println!("    ktree-server --config <path-to-config.toml>");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    Load configuration from TOML file");
    println!("    --help             Print this help message");
    println!();
    println!("CONFIGURATION:");
    println!("    The TOML config file should contain:");
    println!("    - bind_address, bind_port: where to listen");
    println!("    - request_timeout_ms: per-request limit (default: 5000)");
    println!("    - [storage] backend = \"memory\" | \"sqlite\", path, busy_timeout_ms");
    println!("    - [retry] [validation] [resolver]: optional tuning sections");
    println!();
    println!("LOGGING:");
    println!("    Set RUST_LOG (e.g. RUST_LOG=ktree=debug); default level is info");
    println!();
}
