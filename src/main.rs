use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use feedcheck::config::Config;
use feedcheck::report::Driver;

#[derive(Parser, Debug)]
#[command(
    name = "feedcheck",
    about = "Validate the RSS 2.0 and Atom 1.0 feeds of a local dev server"
)]
struct Args {
    /// Server base URL (e.g. http://localhost:3001); skips port discovery
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Candidate port to probe (repeatable; replaces the default list)
    #[arg(long = "port", value_name = "PORT")]
    ports: Vec<u16>,

    /// TOML settings file
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Feed fetch timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,
}

impl Args {
    /// Settings file (if any) with command-line overrides applied.
    fn into_config(self) -> Result<Config> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)
                .with_context(|| format!("Failed to load config file: {}", path.display()))?,
            None => Config::default(),
        };

        if let Some(base_url) = self.base_url {
            config.base_url = Some(base_url);
        }
        if !self.ports.is_empty() {
            config.candidate_ports = self.ports;
        }
        if let Some(timeout) = self.timeout {
            config.fetch_timeout_secs = timeout;
        }

        config.validate().context("Invalid settings")?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Args::parse().into_config()?;
    tracing::debug!(?config, "Starting feed validation");

    let client = reqwest::Client::builder()
        .user_agent(concat!("feedcheck/", env!("CARGO_PKG_VERSION")))
        .timeout(config.fetch_timeout())
        .build()
        .context("Failed to build HTTP client")?;

    let driver = Driver::new(client, config);
    let mut stdout = std::io::stdout();
    let summary = driver
        .run(&mut stdout)
        .await
        .context("Failed to write report")?;

    Ok(ExitCode::from(summary.exit_code()))
}
