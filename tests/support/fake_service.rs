//! Scripted in-memory service handle

#![allow(dead_code)]

use async_trait::async_trait;
use paged_rpc::service::{DiscoveryDocument, Params, ServiceHandle, ServiceResult, TransportError};
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Helper struct to track handle calls
#[derive(Clone, Default)]
pub struct CallTracker {
    call_count: Arc<Mutex<usize>>,
}

impl CallTracker {
    pub fn get_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    fn increment(&self) {
        let mut count = self.call_count.lock().unwrap();
        *count += 1;
    }
}

/// Discovery document with a handful of list methods
pub const DISCOVERY_JSON: &str = r#"{
    "name": "directory",
    "rootUrl": "https://api.example.com/",
    "servicePath": "admin/directory/v1/",
    "resources": {
        "users": {
            "methods": {
                "list": {
                    "id": "directory.users.list",
                    "path": "users",
                    "httpMethod": "GET",
                    "parameters": {
                        "customer": {"type": "string", "location": "query"},
                        "maxResults": {"type": "integer", "location": "query", "maximum": "500"},
                        "pageToken": {"type": "string", "location": "query"}
                    }
                },
                "get": {
                    "id": "directory.users.get",
                    "path": "users/{userKey}",
                    "httpMethod": "GET",
                    "parameters": {
                        "userKey": {"type": "string", "location": "path", "required": true}
                    }
                }
            }
        },
        "events": {
            "methods": {
                "list": {
                    "id": "calendar.events.list",
                    "path": "events",
                    "parameters": {
                        "maxResults": {"type": "integer", "location": "query"}
                    }
                }
            }
        },
        "devices": {
            "methods": {
                "list": {
                    "id": "cloudidentity.devices.list",
                    "path": "devices",
                    "parameters": {
                        "maxResults": {"type": "integer", "location": "query", "maximum": 100},
                        "pageSize": {"type": "integer", "location": "query"}
                    }
                },
                "search": {
                    "id": "cloudidentity.devices.search",
                    "path": "devices:search",
                    "httpMethod": "POST"
                }
            }
        },
        "members": {
            "methods": {
                "list": {
                    "id": "directory.members.list",
                    "path": "groups/{groupKey}/members",
                    "parameters": {
                        "groupKey": {"type": "string", "location": "path", "required": true}
                    }
                }
            }
        }
    }
}"#;

/// Fake handle replaying scripted responses in order
pub struct FakeService {
    discovery: DiscoveryDocument,
    responses: Mutex<VecDeque<ServiceResult<Value>>>,
    refresh_results: Mutex<VecDeque<ServiceResult<()>>>,
    calls: Mutex<Vec<(String, Params)>>,
    cache_active: Mutex<bool>,
    pub executions: CallTracker,
    pub refreshes: CallTracker,
    pub resets: CallTracker,
    pub cache_clears: CallTracker,
}

impl FakeService {
    pub fn new() -> Self {
        Self {
            discovery: DiscoveryDocument::from_json(DISCOVERY_JSON).unwrap(),
            responses: Mutex::new(VecDeque::new()),
            refresh_results: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            cache_active: Mutex::new(false),
            executions: CallTracker::default(),
            refreshes: CallTracker::default(),
            resets: CallTracker::default(),
            cache_clears: CallTracker::default(),
        }
    }

    /// Queue a response; an exhausted script answers `{}`
    pub fn respond(self, response: ServiceResult<Value>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    /// Queue `n` copies of a failure
    pub fn fail_times(self, n: usize, err: TransportError) -> Self {
        let mut this = self;
        for _ in 0..n {
            this = this.respond(Err(err.clone()));
        }
        this
    }

    /// Queue a page of `count` items starting at `first`
    pub fn page(self, first: usize, count: usize, next_token: Option<&str>) -> Self {
        let items: Vec<Value> = (first..first + count)
            .map(|n| json!({"id": format!("u{n}"), "primaryEmail": format!("user{n}@example.com")}))
            .collect();
        let mut page = json!({"items": items});
        if let Some(token) = next_token {
            page["nextPageToken"] = json!(token);
        }
        self.respond(Ok(page))
    }

    /// Queue the result of the next credential refresh; unscripted refreshes succeed
    pub fn refresh_result(self, result: ServiceResult<()>) -> Self {
        self.refresh_results.lock().unwrap().push_back(result);
        self
    }

    /// Pretend a response cache is active
    pub fn with_cache(self) -> Self {
        *self.cache_active.lock().unwrap() = true;
        self
    }

    /// Parameters of every executed request, in order
    pub fn call_log(&self) -> Vec<Params> {
        self.calls.lock().unwrap().iter().map(|(_, p)| p.clone()).collect()
    }
}

#[async_trait]
impl ServiceHandle for FakeService {
    async fn execute(&self, operation: &str, params: &Params) -> ServiceResult<Value> {
        if self.discovery.find_method(operation).is_none() {
            return Err(TransportError::UnknownOperation(operation.to_string()));
        }
        self.executions.increment();
        self.calls
            .lock()
            .unwrap()
            .push((operation.to_string(), params.clone()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(json!({})))
    }

    fn method_id(&self, operation: &str, _params: &Params) -> ServiceResult<String> {
        self.discovery
            .find_method(operation)
            .and_then(|m| m.id.clone())
            .ok_or_else(|| TransportError::UnknownOperation(operation.to_string()))
    }

    fn discovery(&self) -> &DiscoveryDocument {
        &self.discovery
    }

    async fn refresh_credentials(&self) -> ServiceResult<()> {
        self.refreshes.increment();
        self.refresh_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(()))
    }

    fn clear_cache(&self) -> bool {
        self.cache_clears.increment();
        std::mem::replace(&mut *self.cache_active.lock().unwrap(), false)
    }

    fn reset_connections(&self) {
        self.resets.increment();
    }
}

/// JSON error body in the usual `{"error": {...}}` shape
pub fn api_error(status: u16, reason: &str, message: &str) -> TransportError {
    TransportError::Http {
        status,
        body: json!({
            "error": {
                "code": status,
                "message": message,
                "errors": [{"reason": reason, "message": message}]
            }
        })
        .to_string(),
    }
}
