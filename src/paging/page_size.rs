//! Page size negotiation from discovery metadata

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::service::{Params, ServiceHandle, ServiceResult};

/// Name of the parameter carrying the requested page size
pub const MAX_RESULTS_PARAM: &str = "maxResults";

/// Parameter name used by APIs whose default page size is already the maximum
pub const PAGE_SIZE_PARAM: &str = "pageSize";

/// Name of the continuation token parameter
pub const PAGE_TOKEN_PARAM: &str = "pageToken";

/// Known maxima for methods whose discovery entry omits `maximum`
pub static DEFAULT_KNOWN_PAGE_SIZES: Lazy<HashMap<&'static str, u32>> = Lazy::new(|| {
    HashMap::from([
        ("calendar.acl.list", 250),
        ("calendar.calendarList.list", 250),
        ("calendar.events.list", 2500),
        ("calendar.settings.list", 250),
        ("directory.chromeosdevices.list", 200),
        ("drive.files.list", 1000),
    ])
});

/// Page size to request on every page of an aggregation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSize {
    /// Value for `maxResults`
    pub max_results: u32,
}

impl PageSize {
    /// Parameter name and value to merge into a request
    pub fn to_param(&self) -> (String, Value) {
        (MAX_RESULTS_PARAM.to_string(), Value::from(self.max_results))
    }
}

/// Picks the largest safe page size for an operation
#[derive(Debug, Clone)]
pub struct PageSizeNegotiator {
    known: HashMap<String, u32>,
}

impl Default for PageSizeNegotiator {
    fn default() -> Self {
        Self {
            known: DEFAULT_KNOWN_PAGE_SIZES
                .iter()
                .map(|(id, max)| (id.to_string(), *max))
                .collect(),
        }
    }
}

impl PageSizeNegotiator {
    /// Negotiator with the built-in table of known maxima
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a known maximum for a method id
    pub fn with_known_max(mut self, method_id: impl Into<String>, max: u32) -> Self {
        self.known.insert(method_id.into(), max);
        self
    }

    /// Known maximum for a method id, if any
    pub fn known_max(&self, method_id: &str) -> Option<u32> {
        self.known.get(method_id).copied()
    }

    /// Largest `maxResults` the operation accepts.
    ///
    /// Returns `None` when the method does not declare `maxResults`, declares
    /// `pageSize` instead, or no maximum is known. Resolving the method id does
    /// not send a request.
    pub fn negotiate(
        &self,
        handle: &dyn ServiceHandle,
        operation: &str,
        params: &Params,
    ) -> ServiceResult<Option<PageSize>> {
        let method_id = handle.method_id(operation, params)?;

        let Some(method) = handle
            .discovery()
            .methods()
            .into_iter()
            .find(|m| m.id.as_deref() == Some(method_id.as_str()))
        else {
            debug!("No discovery entry for {}", method_id);
            return Ok(None);
        };

        let parameters = &method.parameters;
        let Some(max_results) = parameters.get(MAX_RESULTS_PARAM) else {
            return Ok(None);
        };
        if parameters.contains_key(PAGE_SIZE_PARAM) {
            return Ok(None);
        }

        let max = max_results
            .maximum_value()
            .or_else(|| self.known_max(&method_id));
        debug!("Negotiated page size for {}: {:?}", method_id, max);
        Ok(max.map(|max_results| PageSize { max_results }))
    }
}
