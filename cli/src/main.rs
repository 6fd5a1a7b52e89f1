//! CLI entrypoint for vocab-router
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vocab_application::{
    RecallOptions, RecallUseCase, RecordExecutionUseCase, ResolveRequestUseCase, RunChainInput,
    RunChainUseCase,
};
use vocab_domain::alias::entities::Layer;
use vocab_infrastructure::{
    ConfigLoader, EchoToolInvoker, HashedTrigramEmbedder, InMemoryAliasCatalog,
    JsonlExecutionLogStore,
};

#[derive(Parser)]
#[command(name = "vocab-router", version, about = "Route natural-language requests to alias action chains")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a config file (TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Visibility layer of the request ("public" or a scope name)
    #[arg(long, default_value = "public", global = true)]
    layer: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Match a request against the alias catalog without executing it
    Resolve {
        /// The natural-language request
        request: String,

        /// Context tags narrowing which aliases apply (repeatable)
        #[arg(long = "context")]
        context: Vec<String>,
    },
    /// Match a request and execute the winning alias's action chain
    Run {
        /// The natural-language request
        request: String,

        /// Context tags narrowing which aliases apply (repeatable)
        #[arg(long = "context")]
        context: Vec<String>,

        /// Session variable as key=value; values parse as JSON when possible
        #[arg(long = "var")]
        vars: Vec<String>,

        /// Requesting user id, recorded in the audit log
        #[arg(long)]
        user: Option<String>,
    },
    /// Search past executions
    Recall {
        /// Free-text query
        #[arg(default_value = "")]
        query: String,

        /// Only executions that touched this entity
        #[arg(long)]
        entity: Option<String>,

        /// Maximum results
        #[arg(long, default_value_t = 10)]
        limit: usize,

        /// Force keyword search even when semantic ranking is available
        #[arg(long)]
        keyword: bool,
    },
}

fn parse_session_var(raw: &str) -> Result<(String, Value)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("--var expects key=value, got '{raw}'"))?;
    // JSON literals pass through typed; anything else is a plain string
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"), // -vvv or more
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow!(e))?;
    let layer = Layer::parse(&cli.layer);

    // === Dependency Injection ===
    let catalog = Arc::new(InMemoryAliasCatalog::new());
    if let Some(path) = &config.catalog.path {
        let aliases = vocab_infrastructure::load_catalog_file(path)
            .with_context(|| format!("loading alias catalog from {path}"))?;
        let count = catalog
            .insert_all(aliases)
            .map_err(|e| anyhow!("registering aliases: {e}"))?;
        info!(count, "Alias catalog loaded");
    }

    let embedder: Option<Arc<HashedTrigramEmbedder>> = config
        .matching
        .semantic_enabled
        .then(|| Arc::new(HashedTrigramEmbedder::default()));
    if let Some(embedder) = &embedder {
        catalog.index_embeddings(embedder.as_ref()).await?;
    }

    let store = Arc::new(JsonlExecutionLogStore::new(&config.log.path)?);

    match cli.command {
        Command::Resolve { request, context } => {
            let mut resolver =
                ResolveRequestUseCase::new(catalog.clone()).with_config(config.match_config());
            if let Some(embedder) = &embedder {
                resolver = resolver.with_embedder(embedder.clone());
            }

            match resolver.resolve(&request, &layer, &context).await? {
                Some(result) => {
                    println!("{}", serde_json::to_string_pretty(&result)?);
                }
                None => bail!("no alias matched '{request}'"),
            }
        }
        Command::Run {
            request,
            context,
            vars,
            user,
        } => {
            let mut resolver =
                ResolveRequestUseCase::new(catalog.clone()).with_config(config.match_config());
            if let Some(embedder) = &embedder {
                resolver = resolver.with_embedder(embedder.clone());
            }

            let Some(matched) = resolver.resolve(&request, &layer, &context).await? else {
                bail!("no alias matched '{request}'");
            };
            info!(
                pattern = %matched.alias.pattern,
                tier = %matched.match_type,
                confidence = matched.confidence,
                "Alias matched"
            );

            let mut recorder = RecordExecutionUseCase::new(store.clone());
            if let Some(embedder) = &embedder {
                recorder = recorder.with_embedder(embedder.clone());
            }
            let executor = RunChainUseCase::new(Arc::new(EchoToolInvoker), Arc::new(recorder));

            let mut input = RunChainInput::new(matched.alias, request)
                .with_extracted_vars(matched.extracted_vars)
                .with_layer(layer);
            if let Some(user) = user {
                input = input.with_user(user);
            }
            for raw in &vars {
                let (key, value) = parse_session_var(raw)?;
                input = input.with_session_var(key, value);
            }

            let result = executor.execute(input).await;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if !result.success {
                std::process::exit(1);
            }
        }
        Command::Recall {
            query,
            entity,
            limit,
            keyword,
        } => {
            let mut recaller = RecallUseCase::new(store.clone());
            if let Some(embedder) = &embedder {
                recaller = recaller.with_embedder(embedder.clone());
            }

            let logs = recaller
                .recall(
                    &query,
                    &layer,
                    RecallOptions {
                        entity,
                        limit,
                        use_semantic: !keyword,
                    },
                )
                .await?;
            if logs.is_empty() {
                println!("No matching executions.");
            } else {
                println!("{}", serde_json::to_string_pretty(&logs)?);
            }
        }
    }

    Ok(())
}
