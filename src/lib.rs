//! # Paged RPC
//!
//! A resilient invocation layer for discovery-described REST APIs. It wraps
//! single calls with error classification, bounded retries with exponential
//! backoff, and credential recovery, and it drives paged list operations to
//! completion with live progress messages.
//!
//! ## Quick Start
//!
//! ```no_run
//! use paged_rpc::paging::{FetchOptions, PageAggregator};
//! use paged_rpc::service::{DiscoveryDocument, EnvTokenSource, HttpService, OperationRequest};
//! use paged_rpc::CallExecutor;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let discovery = DiscoveryDocument::from_path("directory_v1.json")?;
//! let service = HttpService::new(discovery, Arc::new(EnvTokenSource::new("ACCESS_TOKEN")));
//!
//! let request = OperationRequest::named("users.list").with_param("customer", "my_customer");
//! let options = FetchOptions::items("users")
//!     .with_page_message(paged_rpc::paging::progress::got_total_items_msg("users", "...\n"));
//!
//! let mut aggregator = PageAggregator::new(CallExecutor::new());
//! let users = aggregator.fetch_all(&service, &request, &options).await?;
//! println!("{} users", users.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`service`] - The [`ServiceHandle`] seam, discovery documents, and a reqwest handle
//! - [`classify`] - Maps raw protocol errors to a reason or a control action
//! - [`executor`] - Single-call execution with retries and credential recovery
//! - [`paging`] - Page size negotiation, aggregation, and progress messages
//! - [`metrics`] - Prometheus counters for calls, retries, and pages
//! - [`cli`] - Command line front end

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Protocol error classification
pub mod classify;

/// CLI command implementations
pub mod cli;

/// Call execution with retries
pub mod executor;

/// Metrics collection and export
pub mod metrics;

/// Paged operation aggregation
pub mod paging;

/// Service handle abstraction and HTTP implementation
pub mod service;

pub use classify::{classify, Classification, ErrorReason};
pub use executor::{
    ApiError, ApiErrorKind, CallError, CallExecutor, CallPolicy, CallResult, ExecutorConfig,
};
pub use paging::{get_items, AggregateSink, FetchOptions, PageAggregator, PageSizeNegotiator};
pub use service::{OperationRequest, Params, ServiceHandle, TransportError};
