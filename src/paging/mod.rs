//! Page aggregation
//!
//! [`PageAggregator::fetch_all`] walks every page of a paged operation:
//!
//! 1. Negotiates `maxResults` once, unless the caller already set a page size
//! 2. Calls the operation through the [`CallExecutor`] (with its retries)
//! 3. Appends the page's items and updates the running total
//! 4. Writes the expanded page message over the current progress line
//! 5. Follows `nextPageToken` until it is absent or empty
//!
//! A failed call propagates before its page is merged, so a partial aggregate
//! is never returned.

use serde_json::{Map, Value};
use tracing::debug;

use crate::executor::{CallError, CallExecutor, CallPolicy, CallResult};
use crate::metrics;
use crate::service::{OperationRequest, Params, ServiceHandle, BODY_PARAM};

pub mod page_size;
pub mod progress;
pub mod sink;

pub use page_size::{PageSize, PageSizeNegotiator, MAX_RESULTS_PARAM, PAGE_SIZE_PARAM, PAGE_TOKEN_PARAM};
pub use progress::{MessageAttribute, ProgressStream};
pub use sink::{AggregateSink, IndexedSink, SequenceSink};

/// Response field holding the continuation token
pub const NEXT_PAGE_TOKEN_FIELD: &str = "nextPageToken";

/// Default name of the items field in a page
pub const DEFAULT_ITEMS_KEY: &str = "items";

/// How to walk a paged operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOptions {
    /// Response field holding the page's items
    pub items_key: String,
    /// Progress template written after every page
    pub page_message: Option<String>,
    /// Field identifying an item in the progress template
    pub message_attribute: Option<MessageAttribute>,
    /// Error policy applied to every page call
    pub policy: CallPolicy,
    /// Put page size and token in the request body instead of the query
    pub page_args_in_body: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            items_key: DEFAULT_ITEMS_KEY.to_string(),
            page_message: None,
            message_attribute: None,
            policy: CallPolicy::default(),
            page_args_in_body: false,
        }
    }
}

impl FetchOptions {
    /// Options reading items from `items_key`
    pub fn items(items_key: impl Into<String>) -> Self {
        Self {
            items_key: items_key.into(),
            ..Self::default()
        }
    }

    /// Show `template` after every page
    pub fn with_page_message(mut self, template: impl Into<String>) -> Self {
        self.page_message = Some(template.into());
        self
    }

    /// Identify items by `attribute` in the page message
    pub fn with_message_attribute(mut self, attribute: MessageAttribute) -> Self {
        self.message_attribute = Some(attribute);
        self
    }

    /// Error policy for every page call
    pub fn with_policy(mut self, policy: CallPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Send page arguments in the body
    pub fn with_page_args_in_body(mut self) -> Self {
        self.page_args_in_body = true;
        self
    }
}

/// Drives a paged operation to completion
pub struct PageAggregator {
    executor: CallExecutor,
    negotiator: PageSizeNegotiator,
    progress: ProgressStream,
}

impl PageAggregator {
    /// Aggregator writing progress to stderr
    pub fn new(executor: CallExecutor) -> Self {
        Self {
            executor,
            negotiator: PageSizeNegotiator::default(),
            progress: ProgressStream::stderr(),
        }
    }

    /// Use a custom page size negotiator
    pub fn with_negotiator(mut self, negotiator: PageSizeNegotiator) -> Self {
        self.negotiator = negotiator;
        self
    }

    /// Write progress to `progress`
    pub fn with_progress(mut self, progress: ProgressStream) -> Self {
        self.progress = progress;
        self
    }

    /// Underlying call executor
    pub fn executor(&self) -> &CallExecutor {
        &self.executor
    }

    /// Fetch every page and return all items in page order
    pub async fn fetch_all(
        &mut self,
        handle: &dyn ServiceHandle,
        request: &OperationRequest,
        options: &FetchOptions,
    ) -> CallResult<Vec<Value>> {
        self.fetch_all_into(handle, request, options, SequenceSink::new())
            .await
    }

    /// Fetch every page into `sink`, then drain it
    pub async fn fetch_all_into<S: AggregateSink + Send>(
        &mut self,
        handle: &dyn ServiceHandle,
        request: &OperationRequest,
        options: &FetchOptions,
        mut sink: S,
    ) -> CallResult<Vec<Value>> {
        let operation = request.operation.as_str();
        let mut params = request.params.clone();

        if options.page_args_in_body {
            ensure_body(&mut params);
        }

        if !has_page_size(&params) {
            let negotiated = self
                .negotiator
                .negotiate(handle, operation, &params)
                .map_err(CallError::from_transport)?;
            if let Some(page_size) = negotiated {
                let (key, value) = page_size.to_param();
                set_page_arg(&mut params, options.page_args_in_body, key, value);
            }
        }

        let mut total_items = 0usize;
        let mut page_number = 0usize;

        loop {
            page_number += 1;
            let page_request = OperationRequest::new(operation, params.clone());
            let page = self
                .executor
                .call(handle, &page_request, &options.policy)
                .await?;

            let (page_token, page_items) = split_page(page, &options.items_key);
            total_items += page_items.len();
            metrics::record_page(operation, page_items.len());
            debug!(
                "Received {} items in page {} of {} (total {})",
                page_items.len(),
                page_number,
                operation,
                total_items
            );

            if let Some(template) = &options.page_message {
                let message = progress::expand(
                    template,
                    total_items,
                    page_items.first(),
                    page_items.last(),
                    options.message_attribute.as_ref(),
                );
                if let Err(e) = self.progress.show(&message) {
                    debug!("Failed to write progress: {}", e);
                }
            }

            for item in page_items {
                sink.append(item);
            }

            let Some(token) = page_token else {
                if let Some(template) = &options.page_message {
                    if let Err(e) = self.progress.finish(template) {
                        debug!("Failed to finish progress line: {}", e);
                    }
                }
                debug!(
                    "Pagination completed after {} pages. Total items: {}",
                    page_number,
                    sink.len()
                );
                return Ok(sink.drain());
            };

            set_page_arg(
                &mut params,
                options.page_args_in_body,
                PAGE_TOKEN_PARAM.to_string(),
                Value::String(token),
            );
        }
    }
}

/// Fetch a single page and return its items, or an empty list
pub async fn get_items(
    executor: &CallExecutor,
    handle: &dyn ServiceHandle,
    request: &OperationRequest,
    items_key: &str,
    policy: &CallPolicy,
) -> CallResult<Vec<Value>> {
    let page = executor.call(handle, request, policy).await?;
    Ok(split_page(page, items_key).1)
}

/// Continuation token (absent when missing or empty) and the page's items
fn split_page(page: Option<Value>, items_key: &str) -> (Option<String>, Vec<Value>) {
    let Some(Value::Object(mut page)) = page else {
        return (None, Vec::new());
    };

    let token = match page.remove(NEXT_PAGE_TOKEN_FIELD) {
        Some(Value::String(token)) if !token.is_empty() => Some(token),
        _ => None,
    };
    let items = match page.remove(items_key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    (token, items)
}

fn ensure_body(params: &mut Params) {
    if !matches!(params.get(BODY_PARAM), Some(Value::Object(_))) {
        params.insert(BODY_PARAM.to_string(), Value::Object(Map::new()));
    }
}

fn has_page_size(params: &Params) -> bool {
    params.contains_key(MAX_RESULTS_PARAM)
        || params.contains_key(PAGE_SIZE_PARAM)
        || params
            .get(BODY_PARAM)
            .and_then(Value::as_object)
            .is_some_and(|body| body.contains_key(PAGE_SIZE_PARAM))
}

/// Insert a page size or token parameter at the top level or into `body`
fn set_page_arg(params: &mut Params, in_body: bool, key: String, value: Value) {
    if !in_body {
        params.insert(key, value);
        return;
    }
    ensure_body(params);
    if let Some(Value::Object(body)) = params.get_mut(BODY_PARAM) {
        body.insert(key, value);
    }
}
