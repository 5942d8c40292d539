use std::{fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use flockplan::{
    profile::profile_for_age,
    web::{self, WebServerConfig},
    AllocationEngine, AllocationRequest, ServiceConfig,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Flock placement and transfer planner")]
struct Cli {
    /// Path to the service YAML file (built-in demo farm when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Solve one request read from a JSON file and print the result
    Solve {
        #[arg(long)]
        request: PathBuf,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },
    /// Serve the allocation endpoint over HTTP
    Serve {
        /// Override the configured listen host
        #[arg(long)]
        host: Option<String>,

        /// Override the configured listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Print the climate profile for a flock age in days
    Profile {
        #[arg(long)]
        age: u32,
    },
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ServiceConfig::from_yaml(path)?,
        None => ServiceConfig::demo(),
    };
    init_logging(&config.logging.level);

    let engine = AllocationEngine::from_config(&config.facility)
        .with_context(|| format!("invalid facility in config '{}'", config.name))?;

    match cli.command {
        Command::Solve { request: path, pretty } => {
            let data = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read request file {}", path.display()))?;
            let request: AllocationRequest = serde_json::from_str(&data)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            let result = engine.allocate(&request)?;
            let output = if pretty {
                serde_json::to_string_pretty(&result)?
            } else {
                serde_json::to_string(&result)?
            };
            println!("{output}");
        }
        Command::Serve { host, port } => {
            web::run(WebServerConfig {
                engine,
                host: host.unwrap_or(config.server.host),
                port: port.unwrap_or(config.server.port),
                solve_timeout: Duration::from_millis(config.server.solve_timeout_ms),
            })
            .await?;
        }
        Command::Profile { age } => {
            let profile = profile_for_age(age);
            println!(
                "Age {} days: ideal temperature {} °C, baseline density {} per m²",
                age, profile.ideal_temperature, profile.baseline_density
            );
        }
    }
    Ok(())
}
