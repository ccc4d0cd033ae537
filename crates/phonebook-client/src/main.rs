//! CLI binary entry point for the phonebook client.
//!
//! Usage:
//!   phonebook [OPTIONS]
//!
//! Options:
//!   -c, --config <FILE>     Path to configuration TOML file
//!   -u, --base-url <URL>    Base URL of the directory service
//!   -f, --fixture <FILE>    Serve directory data from a JSON fixture
//!   -s, --search <QUERY>    Run one search and print the result
//!   --print                 Print the tree instead of opening the TUI
//!   -v, --verbose           Increase logging verbosity

use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;

use phonebook_client::app::{service_from_config, PhonebookApp};
use phonebook_client::config::ClientConfig;
use phonebook_client::tui;

/// Phonebook - browse and search the organisation directory.
#[derive(Parser, Debug)]
#[command(name = "phonebook")]
#[command(about = "Lazy-loaded organisation phonebook in the terminal")]
#[command(version)]
struct Cli {
    /// Path to configuration TOML file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Base URL of the web application (e.g., http://127.0.0.1:5000/).
    #[arg(short = 'u', long, value_name = "URL")]
    base_url: Option<String>,

    /// JSON fixture to serve directory data from, instead of HTTP.
    #[arg(short, long, value_name = "FILE")]
    fixture: Option<PathBuf>,

    /// Run one search and print the resulting tree (implies --print).
    #[arg(short, long, value_name = "QUERY")]
    search: Option<String>,

    /// Print the top-level tree and exit instead of opening the TUI.
    #[arg(long)]
    print: bool,

    /// Increase logging verbosity (can be repeated: -v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration.
    let mut config = ClientConfig::load(cli.config.as_deref())?;

    // Apply CLI overrides.
    if let Some(base_url) = cli.base_url {
        config.service.base_url = base_url;
    }
    if let Some(fixture) = cli.fixture {
        config.service.fixture = Some(fixture);
    }

    let print_mode = cli.print || cli.search.is_some();

    // Adjust log level based on verbosity.
    let log_level = match cli.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    init_logging(log_level, &config, print_mode)?;

    tracing::info!(
        base_url = %config.service.base_url,
        fixture = ?config.service.fixture,
        print = print_mode,
        "Starting phonebook client"
    );

    let service = service_from_config(&config)?;
    let mut app = PhonebookApp::new(service, config.search_config());

    if print_mode {
        for line in app.run_once(cli.search.as_deref()).await {
            println!("{}", line);
        }
        if let Some(message) = app.error() {
            eprintln!("{}", message);
            std::process::exit(1);
        }
        return Ok(());
    }

    tui::run_tui(app, config.tick()).await
}

/// Print mode logs to stderr. The TUI owns the terminal, so it logs to the
/// configured file or not at all.
fn init_logging(level: &str, config: &ClientConfig, print_mode: bool) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if print_mode {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    } else if let Some(path) = &config.logging.file {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}
