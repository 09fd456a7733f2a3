//! Unit tests for page size negotiation

use paged_rpc::paging::page_size::DEFAULT_KNOWN_PAGE_SIZES;
use paged_rpc::paging::{PageSize, PageSizeNegotiator};
use paged_rpc::service::{Params, TransportError};
use serde_json::json;

use crate::support::fake_service::FakeService;

#[test]
fn test_discovery_maximum_wins() {
    let service = FakeService::new();
    let size = PageSizeNegotiator::new()
        .negotiate(&service, "users.list", &Params::new())
        .unwrap();
    assert_eq!(size, Some(PageSize { max_results: 500 }));
}

#[test]
fn test_known_table_fills_missing_maximum() {
    let service = FakeService::new();
    let size = PageSizeNegotiator::new()
        .negotiate(&service, "events.list", &Params::new())
        .unwrap();
    assert_eq!(size.map(|s| s.max_results), Some(2500));
    assert_eq!(DEFAULT_KNOWN_PAGE_SIZES.get("calendar.events.list"), Some(&2500));
}

#[test]
fn test_page_size_parameter_disables_negotiation() {
    let service = FakeService::new();
    let size = PageSizeNegotiator::new()
        .negotiate(&service, "devices.list", &Params::new())
        .unwrap();
    assert_eq!(size, None);
}

#[test]
fn test_method_without_max_results() {
    let service = FakeService::new();
    let size = PageSizeNegotiator::new()
        .negotiate(&service, "members.list", &Params::new())
        .unwrap();
    assert_eq!(size, None);
}

#[test]
fn test_unknown_method_has_no_known_max() {
    let negotiator = PageSizeNegotiator::new();
    assert_eq!(negotiator.known_max("directory.users.list"), None);
    assert_eq!(negotiator.known_max("drive.files.list"), Some(1000));
}

#[test]
fn test_unresolvable_operation_is_an_error() {
    let service = FakeService::new();
    let err = PageSizeNegotiator::new()
        .negotiate(&service, "widgets.list", &Params::new())
        .unwrap_err();
    assert_eq!(err, TransportError::UnknownOperation("widgets.list".to_string()));
}

#[test]
fn test_negotiation_does_not_execute() {
    let service = FakeService::new();
    PageSizeNegotiator::new()
        .negotiate(&service, "users.list", &Params::new())
        .unwrap();
    assert_eq!(service.executions.get_count(), 0);
}

#[test]
fn test_page_size_param() {
    let (key, value) = PageSize { max_results: 200 }.to_param();
    assert_eq!(key, "maxResults");
    assert_eq!(value, json!(200));
}
