use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde_json::Value;

use panorama_core::HandlerConfig;
use panorama_provider::{PanoramaProvider, type_names};

#[derive(Parser)]
#[command(name = "panorama-handler")]
#[command(about = "Run CloudFormation resource handlers for AWS Panorama", long_about = None)]
struct Cli {
    /// Path to a JSON handler config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// AWS region (overrides the config file)
    #[arg(long, global = true)]
    region: Option<String>,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the supported resource type names
    Types,
    /// Run a single handler step and print the progress event
    Invoke {
        /// Resource type name, e.g. AWS::Panorama::Package
        #[arg(long = "type")]
        type_name: String,

        /// Path to a JSON handler request
        #[arg(long)]
        request: PathBuf,
    },
    /// Run a handler to completion, calling back after each requested delay
    Run {
        /// Resource type name, e.g. AWS::Panorama::Package
        #[arg(long = "type")]
        type_name: String,

        /// Path to a JSON handler request
        #[arg(long)]
        request: PathBuf,

        /// Upper bound on the wait between steps, in seconds
        #[arg(long, default_value_t = 60)]
        max_delay: u64,
    },
}

#[tokio::main]
async fn main() {
    let Cli {
        config,
        region,
        verbose,
        command,
    } = Cli::parse();
    init_logging(verbose);

    let result = match command {
        Commands::Types => {
            run_types();
            Ok(())
        }
        Commands::Invoke { type_name, request } => {
            run_invoke(config.as_deref(), region, &type_name, &request).await
        }
        Commands::Run {
            type_name,
            request,
            max_delay,
        } => run_to_completion(config.as_deref(), region, &type_name, &request, max_delay).await,
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn load_config(path: Option<&Path>, region: Option<String>) -> anyhow::Result<HandlerConfig> {
    let config = match path {
        Some(path) => HandlerConfig::load(path)?,
        None => HandlerConfig::default(),
    };
    Ok(match region {
        Some(region) => config.with_region(region),
        None => config,
    })
}

fn load_request(path: &Path) -> anyhow::Result<Value> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read request file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Request file {} is not valid JSON", path.display()))
}

/// Build the callback request from the previous request and its IN_PROGRESS event
fn callback_request(mut request: Value, event: &Value) -> Value {
    if let Some(model) = event.get("resourceModel") {
        request["desiredResourceState"] = model.clone();
    }
    if let Some(context) = event.get("callbackContext") {
        request["callbackContext"] = context.clone();
    }
    request
}

/// Describe a terminal failure event
fn failure_summary(event: &Value) -> String {
    let code = event["errorCode"].as_str().unwrap_or("Unknown");
    let message = event["message"].as_str().unwrap_or("no message");
    format!("{}: {}", code, message)
}

fn run_types() {
    for type_name in type_names() {
        println!("{}", type_name);
    }
}

async fn run_invoke(
    config: Option<&Path>,
    region: Option<String>,
    type_name: &str,
    request: &Path,
) -> anyhow::Result<()> {
    let config = load_config(config, region)?;
    let request = load_request(request)?;
    let provider = PanoramaProvider::new(&config).await;

    let event = provider.handle(type_name, request).await?;
    println!("{}", serde_json::to_string_pretty(&event)?);
    Ok(())
}

async fn run_to_completion(
    config: Option<&Path>,
    region: Option<String>,
    type_name: &str,
    request: &Path,
    max_delay: u64,
) -> anyhow::Result<()> {
    let config = load_config(config, region)?;
    let mut request = load_request(request)?;
    let provider = PanoramaProvider::new(&config).await;

    println!("{}", format!("Running {}...", type_name).cyan().bold());
    let mut step = 1;
    loop {
        let event = provider.handle(type_name, request.clone()).await?;
        println!("{}", serde_json::to_string_pretty(&event)?);

        match event["status"].as_str() {
            Some("IN_PROGRESS") => {
                let delay = event["callbackDelaySeconds"]
                    .as_u64()
                    .unwrap_or(1)
                    .clamp(1, max_delay.max(1));
                println!(
                    "  {} step {} in progress, calling back in {}s",
                    "…".yellow(),
                    step,
                    delay
                );
                log::debug!("callback context: {}", event["callbackContext"]);
                request = callback_request(request, &event);
                step += 1;
                tokio::time::sleep(Duration::from_secs(delay)).await;
            }
            Some("SUCCESS") => {
                println!("  {} completed after {} step(s)", "✓".green(), step);
                return Ok(());
            }
            _ => {
                println!("  {} failed after {} step(s)", "✗".red(), step);
                bail!("{}", failure_summary(&event));
            }
        }
    }
}
