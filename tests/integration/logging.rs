//! Integration tests for logging and tracing

use paged_rpc::service::OperationRequest;
use paged_rpc::{CallExecutor, CallPolicy, ExecutorConfig};
use serde_json::json;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use crate::support::fake_service::{api_error, FakeService};

#[test]
fn test_env_filter_accepts_crate_directive() {
    let _filter = EnvFilter::new("paged_rpc=debug");
    let _filter = EnvFilter::new("paged_rpc::executor=trace,paged_rpc::paging=info");
}

#[test]
fn test_json_subscriber_initialization() {
    // Fails only when another test already installed a global subscriber
    let result = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("paged_rpc=info"))
        .with_test_writer()
        .try_init();
    let _ = result;
}

#[tokio::test]
async fn test_retries_log_through_subscriber() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("paged_rpc=trace"))
        .with_test_writer()
        .finish();
    let _guard = tracing::subscriber::set_default(subscriber);

    let service = FakeService::new()
        .fail_times(5, api_error(503, "backendError", "Backend Error"))
        .respond(Ok(json!({"ok": true})));
    let executor =
        CallExecutor::with_config(ExecutorConfig::default().with_backoff(Duration::ZERO, Duration::ZERO));

    let result = executor
        .call(&service, &OperationRequest::named("users.list"), &CallPolicy::new())
        .await
        .unwrap();

    assert_eq!(result, Some(json!({"ok": true})));
    assert_eq!(service.executions.get_count(), 6);
}
