// ABOUTME: Entry point for the promptlab binary.
// ABOUTME: Parses CLI arguments, initializes tracing, and either serves the HTTP API or previews a request.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use promptlab_core::model::{GenerationConfig, Provider};
use promptlab_providers::{RequestSpec, build_request};
use promptlab_server::{AppState, PromptlabConfig, create_router};

const DEFAULT_FILTER: &str = "promptlab=debug,tower_http=debug";

#[derive(Parser)]
#[command(name = "promptlab", version, about = "Prompt playground for OpenAI and Anthropic")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP API.
    Serve,
    /// Print the masked provider request a template would produce, without sending it.
    Preview {
        #[arg(long)]
        provider: Provider,
        #[arg(long)]
        model: String,
        /// File holding the prompt template.
        #[arg(long)]
        template: PathBuf,
        /// Variable assignment, repeatable.
        #[arg(long = "var", value_name = "NAME=VALUE", value_parser = parse_var)]
        vars: Vec<(String, String)>,
        /// File holding a JSON Schema for structured output.
        #[arg(long)]
        schema: Option<PathBuf>,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        max_tokens: Option<u32>,
        #[arg(long)]
        top_p: Option<f64>,
    },
}

fn parse_var(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got {:?}", raw)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)),
        )
        .init();

    let cli = Cli::parse();
    let config = PromptlabConfig::from_env().context("failed to load configuration")?;

    match cli.command {
        Command::Serve => serve(config).await,
        Command::Preview {
            provider,
            model,
            template,
            vars,
            schema,
            temperature,
            max_tokens,
            top_p,
        } => {
            let template = std::fs::read_to_string(&template)
                .with_context(|| format!("failed to read template {}", template.display()))?;
            let response_schema = match schema {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("failed to read schema {}", path.display()))?,
                ),
                None => None,
            };
            let credentials = config
                .bootstrap
                .into_iter()
                .find(|(p, _)| *p == provider)
                .map(|(_, c)| c)
                .unwrap_or_default();

            let spec = RequestSpec {
                provider,
                model,
                template,
                variables: vars.into_iter().collect::<BTreeMap<_, _>>(),
                config: GenerationConfig {
                    temperature,
                    max_tokens,
                    top_p,
                },
                credentials,
                response_schema,
                messages: None,
            };
            let raw = build_request(&spec)?.display();
            println!("{}", serde_json::to_string_pretty(&raw)?);
            Ok(())
        }
    }
}

async fn serve(config: PromptlabConfig) -> Result<()> {
    tracing::info!(bind = %config.bind, "promptlab starting up");

    let state = Arc::new(AppState::with_network());
    for (provider, credentials) in config.bootstrap {
        state.credentials.upsert(provider, None, credentials).await;
    }
    if state.credentials.list().await.is_empty() {
        tracing::warn!("no provider credentials configured; register them via POST /api/providers");
    }

    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("failed to bind {}", config.bind))?;
    tracing::info!(addr = %config.bind, "listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
