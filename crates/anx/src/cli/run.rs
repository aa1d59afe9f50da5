//! Command execution.

use super::commands::{Cli, Commands};
use anx::{AnxApi, AnxConfig, AnxResult, JsonError, RateLimitHooks, RequestOptions, Response};
use serde_json::Value;
use tracing::{info, warn};

fn parse_body(body: &str) -> AnxResult<Value> {
    serde_json::from_str(body)
        .map_err(|e| JsonError::new(format!("Invalid --body JSON: {}", e)).into())
}

fn logging_hooks() -> RateLimitHooks {
    RateLimitHooks::new()
        .on_exceeded(|class, err| warn!(%class, error = %err, "Rate limit exceeded"))
        .on_pause(|class| info!(%class, "Rate limit reached; pausing"))
        .on_resume(|class| info!(%class, "Resuming"))
}

/// Load configuration and apply command line overrides.
fn load_config(cli: &Cli) -> AnxResult<AnxConfig> {
    let mut config = match &cli.config {
        Some(path) => AnxConfig::from_file(path)?,
        None => AnxConfig::load()?,
    };
    if let Some(target) = &cli.target {
        config.target = Some(target.clone());
    }
    if let Some(token) = &cli.token {
        config.token = Some(token.clone());
    }
    Ok(config)
}

/// Execute the parsed command and return the response.
pub async fn run(cli: Cli) -> AnxResult<Response> {
    let config = load_config(&cli)?;
    let api = AnxApi::builder(config)
        .rate_limit_hooks(logging_hooks())
        .build()?;

    match cli.command {
        Commands::Get { uri } => api.get(uri).await,
        Commands::Delete { uri } => api.delete(uri).await,
        Commands::Post { uri, body } => api.post(uri, parse_body(&body)?).await,
        Commands::Put { uri, body } => api.put(uri, parse_body(&body)?).await,
        Commands::GetAll { uri, num_elements } => {
            let mut options = RequestOptions::from(uri);
            options.num_elements = num_elements;
            api.get_all(options).await
        }
    }
}
