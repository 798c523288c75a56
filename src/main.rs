use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod analysis;
mod client;
mod config;
mod output;

use analysis::StatsCollector;
use client::{Client, ResponseCache, Token};
use config::Config;
use output::Reporter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Dashboard configuration file
    #[arg(long, global = true, env = "OPENSTATS_CONFIG", default_value = "openstats.yaml")]
    config: PathBuf,

    /// Secrets file holding API_TOKEN when it is not in the environment
    #[arg(long, global = true, default_value = ".openstats/secrets.toml")]
    secrets: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch repository statistics and render the dashboard
    Report {
        /// Output format (html, json)
        #[arg(short, long, default_value = "html")]
        output: String,

        /// Output file (report.html|json)
        #[arg(long, default_value = "openstats_report")]
        output_file: String,

        /// Also export the competitor commit comparison as CSV
        #[arg(long)]
        csv: Option<PathBuf>,

        /// Refresh every N seconds, clearing cached responses between rounds
        #[arg(long)]
        watch: Option<u64>,
    },
    /// Write the dashboard theme file
    Theme {
        /// Directory receiving config.toml
        #[arg(long, default_value = ".streamlit")]
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .init();

    let config = Config::load(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;

    match cli.command {
        Command::Theme { dir } => {
            let path = output::theme::write_theme(&config.style, &dir)?;
            println!("{} {}", "Theme written to".bright_green(), path.display());
            Ok(())
        }
        Command::Report {
            output,
            output_file,
            csv,
            watch,
        } => {
            let token = Token::resolve(&cli.secrets)?;
            let client = Client::new(&config.client, token, Arc::new(ResponseCache::new()))?;

            println!("{}", config.title.bright_cyan().bold());
            println!(
                "Repository: {}",
                format!("{}/{}", client.owner(), client.repo()).bright_white()
            );

            let mut reporter = Reporter::new(&output, &output_file)?;

            loop {
                let dashboard = StatsCollector::new(&client, &config).collect().await;

                output::terminal::print_summary(&dashboard);
                reporter.generate_report(&dashboard).await?;
                if let Some(path) = &csv {
                    reporter.export_csv(&dashboard, path)?;
                }

                let Some(seconds) = watch else {
                    break;
                };

                info!("Next refresh in {}s", seconds);
                tokio::time::sleep(Duration::from_secs(seconds)).await;

                debug!("Dropping {} cached responses", client.cache().len().await);
                client.cache().clear().await;
            }

            println!("\n{}", "Dashboard complete!".bright_green().bold());
            Ok(())
        }
    }
}
