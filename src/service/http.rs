//! reqwest-backed [`ServiceHandle`] driven by a discovery document
//!
//! Routes `resource.method` operations to HTTP requests:
//! - Path parameters expanded from `{name}` / `{+name}` templates
//! - Remaining parameters sent as the query string, `body` as JSON
//! - Optional in-memory cache of GET responses
//! - Bearer credentials obtained from a [`TokenSource`]

use async_trait::async_trait;
use reqwest::{Client, Method, Url};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

use super::{
    DiscoveryDocument, MethodDesc, Params, ServiceHandle, ServiceResult, TransportError,
    BODY_PARAM,
};

/// Source of bearer tokens for an [`HttpService`]
pub trait TokenSource: Send + Sync {
    /// Produce a fresh access token
    fn token(&self) -> ServiceResult<String>;
}

/// Reads the access token from an environment variable on every refresh
#[derive(Debug, Clone)]
pub struct EnvTokenSource {
    var: String,
}

impl EnvTokenSource {
    /// Token source backed by `var`
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl TokenSource for EnvTokenSource {
    fn token(&self) -> ServiceResult<String> {
        match std::env::var(&self.var) {
            Ok(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(TransportError::Refresh(format!(
                "access token variable {} is not set",
                self.var
            ))),
        }
    }
}

/// Always returns the same token
#[derive(Debug, Clone)]
pub struct StaticTokenSource(pub String);

impl TokenSource for StaticTokenSource {
    fn token(&self) -> ServiceResult<String> {
        Ok(self.0.clone())
    }
}

/// A request resolved from a discovery method and parameters
#[derive(Debug, Clone, PartialEq)]
struct PreparedRequest {
    method: Method,
    url: Url,
    query: Vec<(String, String)>,
    body: Option<Value>,
}

/// HTTP implementation of [`ServiceHandle`]
pub struct HttpService {
    discovery: DiscoveryDocument,
    client: Mutex<Arc<Client>>,
    token_source: Arc<dyn TokenSource>,
    token: Mutex<Option<String>>,
    cache: Mutex<Option<HashMap<String, String>>>,
}

impl HttpService {
    /// Create a service for `discovery`, authenticating with `token_source`
    pub fn new(discovery: DiscoveryDocument, token_source: Arc<dyn TokenSource>) -> Self {
        let token = token_source.token().ok();
        Self {
            discovery,
            client: Mutex::new(Arc::new(Client::new())),
            token_source,
            token: Mutex::new(token),
            cache: Mutex::new(None),
        }
    }

    /// Enable the in-memory GET response cache
    pub fn with_cache(self) -> Self {
        *lock(&self.cache) = Some(HashMap::new());
        self
    }

    /// Whether the response cache is active
    pub fn cache_enabled(&self) -> bool {
        lock(&self.cache).is_some()
    }

    fn resolve(&self, operation: &str) -> ServiceResult<&MethodDesc> {
        self.discovery
            .find_method(operation)
            .ok_or_else(|| TransportError::UnknownOperation(operation.to_string()))
    }

    fn prepare(&self, desc: &MethodDesc, params: &Params) -> ServiceResult<PreparedRequest> {
        let base = format!("{}{}", self.discovery.root_url, self.discovery.service_path);
        let mut url = Url::parse(&base)
            .map_err(|e| TransportError::InvalidArgument(format!("invalid service URL {base}: {e}")))?;

        let template = desc.path.as_deref().unwrap_or_default();
        let mut consumed: Vec<&str> = Vec::new();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                TransportError::InvalidArgument(format!("service URL {base} cannot hold a path"))
            })?;
            segments.pop_if_empty();

            for segment in template.split('/').filter(|s| !s.is_empty()) {
                match template_name(segment) {
                    Some((name, reserved)) => {
                        let value = params.get(name).ok_or_else(|| {
                            TransportError::InvalidArgument(format!(
                                "missing required path parameter '{name}'"
                            ))
                        })?;
                        let value = param_text(value);
                        if reserved {
                            segments.extend(value.split('/'));
                        } else {
                            segments.push(&value);
                        }
                        consumed.push(name);
                    }
                    None => {
                        segments.push(segment);
                    }
                }
            }
        }

        let mut query = Vec::new();
        for (key, value) in params {
            if key == BODY_PARAM || consumed.contains(&key.as_str()) {
                continue;
            }
            match value {
                Value::Null => {}
                Value::Array(values) => {
                    query.extend(values.iter().map(|v| (key.clone(), param_text(v))));
                }
                other => query.push((key.clone(), param_text(other))),
            }
        }

        let method = desc
            .http_method
            .as_deref()
            .unwrap_or("GET")
            .parse::<Method>()
            .map_err(|e| TransportError::InvalidArgument(format!("invalid HTTP method: {e}")))?;

        Ok(PreparedRequest {
            method,
            url,
            query,
            body: params.get(BODY_PARAM).cloned(),
        })
    }

    fn cached(&self, key: &str) -> Option<String> {
        lock(&self.cache).as_ref()?.get(key).cloned()
    }

    fn store(&self, key: String, text: &str) {
        if let Some(cache) = lock(&self.cache).as_mut() {
            cache.insert(key, text.to_string());
        }
    }
}

#[async_trait]
impl ServiceHandle for HttpService {
    async fn execute(&self, operation: &str, params: &Params) -> ServiceResult<Value> {
        let desc = self.resolve(operation)?;
        let request = self.prepare(desc, params)?;

        let key = (request.method == Method::GET).then(|| cache_key(&request));
        if let Some(text) = key.as_deref().and_then(|key| self.cached(key)) {
            debug!("Serving {} from response cache", operation);
            return decode(&text);
        }

        let client = lock(&self.client).clone();
        let mut builder = client
            .request(request.method.clone(), request.url.clone())
            .query(&request.query);
        let token = lock(&self.token).clone();
        if let Some(token) = token {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!("{} {} with {} query params", request.method, request.url, request.query.len());

        let response = builder.send().await.map_err(from_reqwest)?;
        let status = response.status();
        let text = response.text().await.map_err(from_reqwest)?;

        if !status.is_success() {
            return Err(TransportError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let value = decode(&text)?;
        if let Some(key) = key {
            self.store(key, &text);
        }
        Ok(value)
    }

    fn method_id(&self, operation: &str, params: &Params) -> ServiceResult<String> {
        let desc = self.resolve(operation)?;
        self.prepare(desc, params)?;
        desc.id
            .clone()
            .ok_or_else(|| TransportError::InvalidArgument(format!("method {operation} has no id")))
    }

    fn discovery(&self) -> &DiscoveryDocument {
        &self.discovery
    }

    async fn refresh_credentials(&self) -> ServiceResult<()> {
        let token = self.token_source.token()?;
        *lock(&self.token) = Some(token);
        debug!("Credentials refreshed");
        Ok(())
    }

    fn clear_cache(&self) -> bool {
        lock(&self.cache).take().is_some()
    }

    fn reset_connections(&self) {
        *lock(&self.client) = Arc::new(Client::new());
        debug!("Connection pool reset");
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// `{name}` → (name, false), `{+name}` → (name, true)
fn template_name(segment: &str) -> Option<(&str, bool)> {
    let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
    match inner.strip_prefix('+') {
        Some(name) => Some((name, true)),
        None => Some((inner, false)),
    }
}

fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn cache_key(request: &PreparedRequest) -> String {
    let query: Vec<String> = request
        .query
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect();
    format!("{}?{}", request.url, query.join("&"))
}

fn decode(text: &str) -> ServiceResult<Value> {
    if text.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    serde_json::from_str(text).map_err(|e| TransportError::MalformedValue(e.to_string()))
}

fn from_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_decode() {
        TransportError::MalformedValue(err.to_string())
    } else if err.is_builder() {
        TransportError::InvalidArgument(err.to_string())
    } else {
        TransportError::Connection(err.to_string())
    }
}
