//! Single call command

use clap::Args;
use serde_json::Value;
use tracing::info;

use super::request::RequestArgs;
use super::{Cli, CliError};

/// Call command arguments
#[derive(Args, Debug)]
pub struct CallArgs {
    /// Operation and error policy
    #[command(flatten)]
    pub request: RequestArgs,

    /// Print only this field of the response as a list (empty when absent)
    #[arg(long)]
    pub items: Option<String>,
}

impl CallArgs {
    /// Execute the call; an ignored error yields `null`
    pub async fn execute(&self, cli: &Cli) -> Result<Value, CliError> {
        let service = cli.service()?;
        let executor = cli.executor();
        let request = self.request.request()?;
        let policy = self.request.policy();

        info!("Calling {}", request.operation);

        if let Some(items_key) = &self.items {
            let items = crate::paging::get_items(&executor, &service, &request, items_key, &policy).await?;
            return Ok(Value::Array(items));
        }

        Ok(executor
            .call(&service, &request, &policy)
            .await?
            .unwrap_or(Value::Null))
    }
}
