//! Global options and the session they describe

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::executor::config::MAX_BACKOFF_MS;
use crate::executor::{AuthContext, CallExecutor, ExecutorConfig};
use crate::service::{DiscoveryDocument, EnvTokenSource, HttpService};

use super::{CallArgs, CliError, ListArgs, PageSizeArgs};

/// Environment variable read for the access token when `--token-env` is absent
pub const DEFAULT_TOKEN_ENV: &str = "PAGED_RPC_ACCESS_TOKEN";

/// Parse `key=value`; the value is read as JSON when it parses, else as a string
pub fn parse_key_value(s: &str) -> Result<(String, Value), String> {
    let (key, raw) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}

/// Invoke discovery-described API operations with retries and paging
#[derive(Parser, Debug)]
#[command(name = "paged-rpc")]
#[command(about = "Resilient calls and paged listing for discovery-described APIs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Discovery document describing the API
    #[arg(long, global = true, env = "PAGED_RPC_DISCOVERY")]
    pub discovery: Option<PathBuf>,

    /// Environment variable holding the access token
    #[arg(long, global = true, default_value = DEFAULT_TOKEN_ENV)]
    pub token_env: String,

    /// Parameter merged into every call (repeatable)
    #[arg(long = "extra", global = true, value_parser = parse_key_value)]
    pub extra: Vec<(String, Value)>,

    /// Initial retry backoff in milliseconds
    #[arg(long, global = true, default_value = "1000")]
    pub backoff_ms: u64,

    /// Cache GET responses for the session
    #[arg(long, global = true, default_value_t = false)]
    pub cache: bool,

    /// OAuth client id named in access-denied messages
    #[arg(long, global = true, default_value = "")]
    pub client_id: String,

    /// Scope named in access-denied messages (repeatable)
    #[arg(long = "scope", global = true)]
    pub scopes: Vec<String>,

    /// User being impersonated
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Serve Prometheus metrics on this address
    #[arg(long, global = true)]
    pub metrics_addr: Option<SocketAddr>,

    /// Output format
    #[arg(long, global = true, default_value = "json")]
    pub output_format: OutputFormat,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one operation and print the response
    Call(CallArgs),

    /// Fetch every page of a list operation and print the items
    List(ListArgs),

    /// Show the page size that would be requested for an operation
    PageSize(PageSizeArgs),
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed JSON
    Json,
    /// One compact JSON value per line
    Lines,
}

impl Cli {
    /// Executor configuration from the global flags
    pub fn executor_config(&self) -> ExecutorConfig {
        let initial = Duration::from_millis(self.backoff_ms);
        let max = Duration::from_millis(MAX_BACKOFF_MS.max(self.backoff_ms));
        let mut config = ExecutorConfig::default()
            .with_backoff(initial, max)
            .with_auth(AuthContext {
                client_id: self.client_id.clone(),
                scopes: self.scopes.clone(),
                current_user: self.user.clone(),
            });
        for (key, value) in &self.extra {
            config = config.with_extra_param(key.clone(), value.clone());
        }
        config
    }

    /// Executor for this session
    pub fn executor(&self) -> CallExecutor {
        CallExecutor::with_config(self.executor_config())
    }

    /// HTTP service for the configured discovery document
    pub fn service(&self) -> Result<HttpService, CliError> {
        let path = self.discovery.as_ref().ok_or_else(|| {
            CliError::InvalidArgument("--discovery is required".to_string())
        })?;
        let discovery = DiscoveryDocument::from_path(path)?;
        debug!("Loaded discovery document {:?}", path);

        let service = HttpService::new(discovery, Arc::new(EnvTokenSource::new(&self.token_env)));
        Ok(if self.cache { service.with_cache() } else { service })
    }

    /// Render a value for stdout
    pub fn render(&self, value: &Value) -> Result<String, CliError> {
        let text = match (self.output_format, value) {
            (OutputFormat::Lines, Value::Array(items)) => items
                .iter()
                .map(serde_json::to_string)
                .collect::<Result<Vec<_>, _>>()?
                .join("\n"),
            (OutputFormat::Lines, other) => serde_json::to_string(other)?,
            (OutputFormat::Json, other) => serde_json::to_string_pretty(other)?,
        };
        Ok(text)
    }
}
