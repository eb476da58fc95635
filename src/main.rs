//! Loveroom command line
//!
//! Every subcommand runs one service operation and prints its result as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use loveroom::logging::{LogFormat, LogLevel, LogOutput, LoggingConfig, LoggingSystem};
use loveroom::{
    ConfigSource, FileConfigSource, LoveroomService, RemoteConnector, ServiceConfig,
    UpdateOutcome,
};

#[derive(Parser)]
#[command(name = "loveroom", about = "Semantic memory pool with verified desensitization")]
struct Args {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "LOVEROOM_CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Global log level, overrides `logging.level`
    #[arg(long)]
    log_level: Option<LogLevel>,

    /// Also write rolling log files into this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Per-module level, e.g. `loveroom::pool=debug` (repeatable)
    #[arg(long = "log-module", value_parser = parse_module_level)]
    log_modules: Vec<(String, LogLevel)>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drop and recreate a collection
    CreateCollection {
        /// Collection name, defaults to the configured one
        #[arg(long)]
        name: Option<String>,

        /// Vector dimension, defaults to the configured one
        #[arg(long)]
        dimension: Option<u64>,
    },
    /// Embed and store a record
    Update {
        #[arg(long)]
        id: String,
        #[arg(long)]
        text: String,
    },
    /// Remove a record
    Delete {
        #[arg(long)]
        id: String,
    },
    /// Relevant records for a query
    Search {
        #[arg(long)]
        query: String,
    },
    /// Scrub personal information from text
    Desensitize {
        #[arg(long)]
        text: String,
    },
    /// Desensitize, then store the result if it was accepted
    UpdateDesensitized {
        #[arg(long)]
        id: String,
        #[arg(long)]
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let source = Arc::new(FileConfigSource::optional(&args.config));
    let loaded = source
        .load()
        .with_context(|| format!("failed to load configuration from {:?}", args.config));

    let logging = match &loaded {
        Ok(config) => logging_config(&args, config.logging.clone()),
        Err(_) => logging_config(&args, LoggingConfig::default()),
    };
    let logging_system = LoggingSystem::init(logging).context("failed to initialize logging")?;
    if let Some(dir) = logging_system.log_directory() {
        tracing::debug!(dir = ?dir, "Writing log files");
    }

    let result = match loaded {
        Ok(config) => run(args, source, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(output) => {
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "Command failed");
            let output = json!({ "status": "error", "message": format!("{:#}", e) });
            println!("{}", serde_json::to_string_pretty(&output)?);
            // Exit skips destructors, flush file logs first
            drop(logging_system);
            std::process::exit(1);
        }
    }
}

/// Configured logging with command line overrides applied
fn logging_config(args: &Args, mut config: LoggingConfig) -> LoggingConfig {
    if args.json_logs {
        config = config.with_format(LogFormat::Json);
    }
    if let Some(level) = args.log_level {
        config = config.with_level(level);
    }
    if let Some(dir) = &args.log_dir {
        config = config
            .with_output(LogOutput::Both)
            .with_log_directory(dir.clone());
    }
    for (module, level) in &args.log_modules {
        config = config.with_module_level(module.clone(), *level);
    }
    config
}

fn parse_module_level(s: &str) -> Result<(String, LogLevel), String> {
    let (module, level) = s
        .split_once('=')
        .ok_or_else(|| format!("expected MODULE=LEVEL, got '{}'", s))?;
    if module.trim().is_empty() {
        return Err(format!("missing module in '{}'", s));
    }
    Ok((module.trim().to_string(), level.parse()?))
}

async fn run(
    args: Args,
    source: Arc<FileConfigSource>,
    config: ServiceConfig,
) -> anyhow::Result<Value> {
    let service = LoveroomService::new(source, Arc::new(RemoteConnector::new()))
        .context("failed to build service")?;

    let output = match args.command {
        Command::CreateCollection { name, dimension } => {
            let name = name.unwrap_or(config.collection_name);
            let dimension = dimension.unwrap_or(config.vector_dimension);
            service.create_collection(&name, dimension).await?;
            json!({
                "status": "success",
                "message": format!("Collection '{}' created with dimension {}.", name, dimension),
            })
        }
        Command::Update { id, text } => {
            service.update(&text, &id).await?;
            json!({
                "status": "success",
                "message": format!("ID '{}' updated successfully.", id),
            })
        }
        Command::Delete { id } => {
            service.delete(&id).await?;
            json!({
                "status": "success",
                "message": format!("ID '{}' deleted successfully.", id),
            })
        }
        Command::Search { query } => {
            let results = service.search(&query).await?;
            json!({ "status": "success", "results": results, "query": query })
        }
        Command::Desensitize { text } => {
            let desensitized = service.desensitize(&text).await?;
            json!({ "status": desensitized.status, "message": desensitized.text })
        }
        Command::UpdateDesensitized { id, text } => {
            match service.update_with_desensitization(&text, &id).await? {
                UpdateOutcome::Stored { id, text } => json!({
                    "status": "success",
                    "message": format!("ID '{}' updated successfully with {}.", id, text),
                }),
                UpdateOutcome::Skipped { message, .. } => {
                    json!({ "status": "failed", "message": message })
                }
            }
        }
    };

    Ok(output)
}
