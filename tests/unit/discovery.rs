//! Unit tests for the discovery document model

use paged_rpc::service::discovery::enum_values_minus_unspecified;
use paged_rpc::service::{DiscoveryDocument, TransportError};
use std::fs;
use tempfile::TempDir;

use crate::support::fake_service::DISCOVERY_JSON;

#[test]
fn test_load_from_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("directory_v1.json");
    fs::write(&path, DISCOVERY_JSON).unwrap();

    let doc = DiscoveryDocument::from_path(&path).unwrap();
    assert_eq!(doc.name, "directory");
    assert_eq!(doc.root_url, "https://api.example.com/");
    assert_eq!(doc.methods().len(), 6);
}

#[test]
fn test_missing_file_is_argument_fault() {
    let dir = TempDir::new().unwrap();
    let err = DiscoveryDocument::from_path(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, TransportError::InvalidArgument(_)));
}

#[test]
fn test_invalid_json_is_malformed() {
    let err = DiscoveryDocument::from_json("{not json").unwrap_err();
    assert!(matches!(err, TransportError::MalformedValue(_)));
}

#[test]
fn test_find_method_and_parameters() {
    let doc = DiscoveryDocument::from_json(DISCOVERY_JSON).unwrap();

    let list = doc.find_method("users.list").unwrap();
    assert_eq!(list.id.as_deref(), Some("directory.users.list"));
    assert_eq!(list.parameters["maxResults"].maximum_value(), Some(500));
    assert!(!list.parameters["maxResults"].is_path());

    let get = doc.find_method("users.get").unwrap();
    assert!(get.parameters["userKey"].is_path());
    assert!(get.parameters["userKey"].required);

    let devices = doc.find_method("devices.list").unwrap();
    assert_eq!(devices.parameters["maxResults"].maximum_value(), Some(100));

    assert!(doc.find_method("users").is_none());
    assert!(doc.find_method("widgets.list").is_none());
}

#[test]
fn test_nested_resources() {
    let doc = DiscoveryDocument::from_json(
        r#"{"resources": {"customer": {"resources": {"devices": {"resources": {"chromeos": {
            "methods": {"list": {"id": "admin.customer.devices.chromeos.list"}}
        }}}}}}}"#,
    )
    .unwrap();

    let method = doc.find_method("customer.devices.chromeos.list").unwrap();
    assert_eq!(method.id.as_deref(), Some("admin.customer.devices.chromeos.list"));
    assert_eq!(doc.methods().len(), 1);
}

#[test]
fn test_enum_values_minus_unspecified() {
    let values = vec![
        "DEVICE_TYPE_UNSPECIFIED".to_string(),
        "ANDROID".to_string(),
        "IOS".to_string(),
    ];
    assert_eq!(enum_values_minus_unspecified(&values), vec!["ANDROID", "IOS"]);
}
