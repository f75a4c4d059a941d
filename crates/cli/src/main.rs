//! Retail assistant CLI - run the search tools from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Check the cluster connection
//! retail-cli ping
//!
//! # List tool definitions, optionally for one domain
//! retail-cli tools --domain inventory
//!
//! # Execute a tool
//! retail-cli call check_product_inventory --input '{"product_id": "P0001"}'
//! ```
//!
//! Connection settings come from the environment (or `.env`); see
//! `retail_agents_tools::config`. Results are printed to stdout as JSON,
//! logs go to stderr.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;

use clap::{Parser, Subcommand};
use retail_agents_core::ResultEnvelope;
use retail_agents_tools::{
    ConfigError, EsClient, RetailConfig, RetailTools, SearchError, ToolError, all_retail_tools,
    get_tools_by_domain,
};
use sentry::integrations::tracing as sentry_tracing;
use serde_json::{Value, json};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "retail-cli")]
#[command(author, version, about = "Retail assistant search tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to the cluster and print its name and version
    Ping,
    /// List tool definitions
    Tools {
        /// Only tools of this domain (inventory, shopping, products, reviews, support)
        #[arg(short, long)]
        domain: Option<String>,
    },
    /// Execute a tool and print its result envelope
    Call {
        /// Tool name
        tool: String,

        /// Tool input as a JSON object
        #[arg(short, long, default_value = "{}")]
        input: String,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Search error: {0}")]
    Search(#[from] SearchError),
    #[error("Invalid --input JSON: {0}")]
    Input(serde_json::Error),
    #[error("Failed to write output: {0}")]
    Output(String),
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &RetailConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(sentry_enabled: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "retail_agents_tools=info,retail_agents_cli=info".into());

    let is_json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    let json_layer = is_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!is_json).then(|| {
        tracing_subscriber::fmt::layer()
            .compact()
            .with_writer(std::io::stderr)
    });
    let sentry_layer =
        sentry_enabled.then(|| sentry_tracing::layer().event_filter(sentry_event_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_layer)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = RetailConfig::from_env();
    let sentry_guard = config.as_ref().ok().and_then(init_sentry);
    init_tracing(sentry_guard.is_some());

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: RetailConfig) -> Result<(), CliError> {
    match cli.command {
        Commands::Ping => {
            let (_, info) = EsClient::connect(&config.connection).await?;
            print_json(&json!({
                "cluster_name": info.cluster_name,
                "version": info.version.number,
            }))
        }
        Commands::Tools { domain } => {
            let tools = domain.map_or_else(all_retail_tools, |d| get_tools_by_domain(&d));
            let value = serde_json::to_value(&tools).map_err(|e| CliError::Output(e.to_string()))?;
            print_json(&value)
        }
        Commands::Call { tool, input } => {
            let input: Value = serde_json::from_str(&input).map_err(CliError::Input)?;
            let envelope = match EsClient::new(&config.connection) {
                Ok(client) => {
                    RetailTools::new(client, config.settings)
                        .execute(&tool, &input)
                        .await
                }
                Err(e) => {
                    tracing::error!(tool = %tool, error = %e, "Search client unavailable");
                    ResultEnvelope::failure(ToolError::from(e).to_info())
                }
            };
            print_json(&envelope.to_value())
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered =
        serde_json::to_string_pretty(value).map_err(|e| CliError::Output(e.to_string()))?;
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{rendered}").map_err(|e| CliError::Output(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_call_parses_tool_and_input() {
        let cli = Cli::try_parse_from([
            "retail-cli",
            "call",
            "get_faq_by_id",
            "--input",
            r#"{"faq_id":"f1"}"#,
        ])
        .unwrap();
        match cli.command {
            Commands::Call { tool, input } => {
                assert_eq!(tool, "get_faq_by_id");
                assert_eq!(input, r#"{"faq_id":"f1"}"#);
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn test_call_input_defaults_to_empty_object() {
        let cli = Cli::try_parse_from(["retail-cli", "call", "get_inventory_statistics"]).unwrap();
        assert!(matches!(cli.command, Commands::Call { input, .. } if input == "{}"));
    }
}
