//! Integration tests for the Prometheus exporter

use paged_rpc::metrics;
use paged_rpc::service::OperationRequest;
use paged_rpc::{CallExecutor, ExecutorConfig, FetchOptions, PageAggregator};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::time::sleep;

use crate::support::capture::CaptureBuffer;
use crate::support::fake_service::FakeService;

/// Helper to fetch metrics text from endpoint
async fn fetch_metrics_text(addr: &str) -> Result<String, Box<dyn std::error::Error>> {
    let url = format!("http://{}/metrics", addr);
    let resp = reqwest::get(&url).await?;
    Ok(resp.text().await?)
}

// Single test: the exporter is process-global
#[tokio::test]
async fn test_metrics_exported_after_aggregation() {
    let addr: SocketAddr = "127.0.0.1:19191".parse().unwrap();

    assert!(metrics::init_metrics(addr).await.is_ok());
    assert!(metrics::init_metrics(addr).await.is_ok());
    assert!(metrics::is_initialized().await);

    let service = FakeService::new().page(0, 3, Some("T1")).page(3, 2, None);
    let executor =
        CallExecutor::with_config(ExecutorConfig::default().with_backoff(Duration::ZERO, Duration::ZERO));
    let capture = CaptureBuffer::new();
    let items = PageAggregator::new(executor)
        .with_progress(capture.stream())
        .fetch_all(&service, &OperationRequest::named("users.list"), &FetchOptions::default())
        .await
        .unwrap();
    assert_eq!(items.len(), 5);

    sleep(Duration::from_millis(100)).await;

    let text = fetch_metrics_text("127.0.0.1:19191").await.unwrap();
    assert!(text.contains("rpc_pages_total"));
    assert!(text.contains("rpc_calls_total"));
}
