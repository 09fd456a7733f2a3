//! Paged listing commands

use clap::Args;
use serde_json::{json, Value};
use tracing::info;

use crate::executor::CallError;
use crate::paging::progress::{got_total_items_first_last_msg, got_total_items_msg};
use crate::paging::{FetchOptions, MessageAttribute, PageAggregator, PageSizeNegotiator};
use crate::service::Params;

use super::request::RequestArgs;
use super::{Cli, CliError};

/// List command arguments
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Operation and error policy
    #[command(flatten)]
    pub request: RequestArgs,

    /// Response field holding each page's items
    #[arg(long, default_value = "items")]
    pub items: String,

    /// Noun used in progress messages (defaults to the items field)
    #[arg(long)]
    pub item_label: Option<String>,

    /// Item field shown as first/last of each page (dotted paths allowed)
    #[arg(long)]
    pub message_attribute: Option<String>,

    /// Send page size and token inside the request body
    #[arg(long, default_value_t = false)]
    pub page_args_in_body: bool,

    /// Do not print progress messages
    #[arg(long, default_value_t = false)]
    pub quiet: bool,
}

impl ListArgs {
    /// Fetch options for the listing
    pub fn options(&self) -> FetchOptions {
        let label = self.item_label.as_deref().unwrap_or(&self.items);
        let mut options = FetchOptions::items(&self.items).with_policy(self.request.policy());

        if !self.quiet {
            options = match &self.message_attribute {
                Some(attribute) => options
                    .with_page_message(got_total_items_first_last_msg(label))
                    .with_message_attribute(MessageAttribute::parse(attribute)),
                None => options.with_page_message(got_total_items_msg(label, "...")),
            };
        }
        if self.page_args_in_body {
            options = options.with_page_args_in_body();
        }
        options
    }

    /// Fetch every page and return the items
    pub async fn execute(&self, cli: &Cli) -> Result<Value, CliError> {
        let service = cli.service()?;
        let request = self.request.request()?;
        let options = self.options();

        info!("Listing {}", request.operation);

        let mut aggregator = PageAggregator::new(cli.executor());
        let items = aggregator.fetch_all(&service, &request, &options).await?;
        Ok(Value::Array(items))
    }
}

/// Page size command arguments
#[derive(Args, Debug)]
pub struct PageSizeArgs {
    /// Operation to inspect (e.g. users.list)
    pub operation: String,
}

impl PageSizeArgs {
    /// Report the negotiated page size
    pub async fn execute(&self, cli: &Cli) -> Result<Value, CliError> {
        let service = cli.service()?;
        let params = cli.executor().merged_params(&Params::new());

        let page_size = PageSizeNegotiator::new()
            .negotiate(&service, &self.operation, &params)
            .map_err(CallError::from_transport)?;

        Ok(json!({
            "operation": self.operation,
            "maxResults": page_size.map(|p| p.max_results),
        }))
    }
}
