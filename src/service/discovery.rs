//! Discovery document model
//!
//! Only the subset of the document needed to route requests and to find
//! page-size parameters is modelled; unknown fields are ignored.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;

use super::{ServiceResult, TransportError};

/// Root of a service discovery document
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryDocument {
    /// Service name (e.g. "admin")
    #[serde(default)]
    pub name: String,
    /// Root URL of the API, with trailing slash
    #[serde(default)]
    pub root_url: String,
    /// Path appended to the root URL for every method
    #[serde(default)]
    pub service_path: String,
    /// Top-level resources
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDesc>,
}

/// A resource groups methods and nested resources
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceDesc {
    /// Methods keyed by short name
    #[serde(default)]
    pub methods: BTreeMap<String, MethodDesc>,
    /// Nested resources
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDesc>,
}

/// A callable method
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodDesc {
    /// Fully qualified identifier (e.g. "directory.users.list")
    pub id: Option<String>,
    /// Path template relative to the service path
    pub path: Option<String>,
    /// HTTP verb, defaults to GET
    pub http_method: Option<String>,
    /// Declared parameters keyed by name
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterDesc>,
}

/// A declared method parameter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParameterDesc {
    /// "path" or "query"
    pub location: Option<String>,
    /// JSON schema type
    #[serde(rename = "type")]
    pub kind: Option<String>,
    /// Upper bound; discovery documents encode it as a string
    pub maximum: Option<Value>,
    /// Whether the parameter must be supplied
    #[serde(default)]
    pub required: bool,
    /// Allowed values for enum parameters
    #[serde(rename = "enum", default)]
    pub enum_values: Vec<String>,
}

impl ParameterDesc {
    /// Numeric value of `maximum`, whether encoded as a string or a number
    pub fn maximum_value(&self) -> Option<u32> {
        match self.maximum.as_ref()? {
            Value::String(s) => s.trim().parse().ok(),
            Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
            _ => None,
        }
    }

    /// Whether the parameter is placed in the URL path
    pub fn is_path(&self) -> bool {
        self.location.as_deref() == Some("path")
    }
}

impl DiscoveryDocument {
    /// Parse a discovery document from JSON text
    pub fn from_json(text: &str) -> ServiceResult<Self> {
        serde_json::from_str(text)
            .map_err(|e| TransportError::MalformedValue(format!("invalid discovery document: {e}")))
    }

    /// Load a discovery document from a file
    pub fn from_path(path: impl AsRef<Path>) -> ServiceResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            TransportError::InvalidArgument(format!(
                "cannot read discovery document {}: {e}",
                path.display()
            ))
        })?;
        Self::from_json(&text)
    }

    /// Find a method by dotted operation name (`resource[.resource].method`)
    pub fn find_method(&self, operation: &str) -> Option<&MethodDesc> {
        let mut parts: Vec<&str> = operation.split('.').collect();
        let method = parts.pop()?;
        let (first, rest) = parts.split_first()?;

        let mut resource = self.resources.get(*first)?;
        for name in rest {
            resource = resource.resources.get(*name)?;
        }
        resource.methods.get(method)
    }

    /// Every declared method, depth first
    pub fn methods(&self) -> Vec<&MethodDesc> {
        fn collect<'a>(resource: &'a ResourceDesc, out: &mut Vec<&'a MethodDesc>) {
            out.extend(resource.methods.values());
            for nested in resource.resources.values() {
                collect(nested, out);
            }
        }

        let mut out = Vec::new();
        for resource in self.resources.values() {
            collect(resource, &mut out);
        }
        out
    }
}

/// Drop the `*_UNSPECIFIED` placeholder from a list of enum values
pub fn enum_values_minus_unspecified(values: &[String]) -> Vec<String> {
    values
        .iter()
        .filter(|value| !value.contains("_UNSPECIFIED"))
        .cloned()
        .collect()
}
