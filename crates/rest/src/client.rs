//! REST test client
//!
//! One call is one transport round-trip followed by diagnostics: a curl
//! reproduction, structured log lines, report attachments, and a JSON parse
//! of the response body. Non-2xx statuses come back as ordinary responses so
//! the scenario decides what counts as a failure.
//!
//! A `RestClient` owns a pooled connection and is meant to have one owner.
//! It is deliberately not `Clone`; callers that share it across tasks must
//! bring their own synchronization.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, COOKIE};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use taskboard_common::{NullReporter, Reporter};

use crate::diagnostics::{self, CallRecord};
use crate::error::{RestError, RestResult};

/// Timeout applied to every call
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(35);

/// HTTP verbs the client dispatches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::Get,
        Method::Post,
        Method::Put,
        Method::Delete,
        Method::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
            Method::Patch => "PATCH",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            "PATCH" => Ok(Method::Patch),
            other => Err(RestError::UnsupportedMethod(other.to_string())),
        }
    }
}

/// Request payload
///
/// `Form`, `Text` and `Raw` are the form-data family; `Json` is the
/// structured payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Form(BTreeMap<String, String>),
    Text(String),
    Raw(Bytes),
    Json(Value),
}

impl Body {
    pub fn is_structured(&self) -> bool {
        matches!(self, Body::Json(_))
    }

    fn kind(&self) -> &'static str {
        match self {
            Body::Form(_) => "form",
            Body::Text(_) => "text",
            Body::Raw(_) => "raw",
            Body::Json(_) => "json",
        }
    }
}

/// Everything a call carries besides its path and verb
#[derive(Debug, Clone, Default)]
pub struct RequestSpec {
    pub headers: BTreeMap<String, String>,
    pub query: BTreeMap<String, String>,
    pub cookies: BTreeMap<String, String>,
    pub body: Option<Body>,
}

impl RequestSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    pub fn cookie(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cookies.insert(name.into(), value.into());
        self
    }

    /// Form-encoded body; replaces any previous body
    pub fn form<K, V>(mut self, fields: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.body = Some(Body::Form(fields));
        self
    }

    /// Raw text body; replaces any previous body
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(Body::Text(text.into()));
        self
    }

    /// Raw byte body; replaces any previous body
    pub fn raw(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = Some(Body::Raw(bytes.into()));
        self
    }

    /// Structured body; replaces any previous body
    pub fn json(mut self, value: Value) -> Self {
        self.body = Some(Body::Json(value));
        self
    }

    /// `Cookie` header value, `None` when no cookies are set
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();
        Some(pairs.join("; "))
    }
}

/// A fully read response
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    headers: HeaderMap,
    url: String,
    body: Bytes,
    json: Option<Value>,
}

impl Response {
    pub fn new(status: u16, headers: HeaderMap, url: String, body: Bytes) -> Self {
        let json = serde_json::from_slice(&body).ok();
        Self {
            status,
            headers,
            url,
            body,
            json,
        }
    }

    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Parsed body, `None` if it is not JSON
    pub fn json(&self) -> Option<&Value> {
        self.json.as_ref()
    }

    /// Decode the body into a typed value
    pub fn json_as<T: DeserializeOwned>(&self) -> RestResult<T> {
        serde_json::from_slice(&self.body).map_err(|e| RestError::ResponseParse {
            url: self.url.clone(),
            message: e.to_string(),
        })
    }
}

type EncodeBody = fn(Option<&Body>) -> RestResult<Option<Body>>;

/// How a verb goes on the wire
struct VerbHandler {
    method: reqwest::Method,
    encode: EncodeBody,
}

fn handler(method: Method) -> VerbHandler {
    match method {
        Method::Get => VerbHandler {
            method: reqwest::Method::GET,
            encode: no_body,
        },
        Method::Post => VerbHandler {
            method: reqwest::Method::POST,
            encode: native_body,
        },
        Method::Delete => VerbHandler {
            method: reqwest::Method::DELETE,
            encode: json_only,
        },
        // PUT and PATCH pre-serialize a structured body and send it as text
        Method::Put => VerbHandler {
            method: reqwest::Method::PUT,
            encode: json_as_text,
        },
        Method::Patch => VerbHandler {
            method: reqwest::Method::PATCH,
            encode: json_as_text,
        },
    }
}

fn no_body(_body: Option<&Body>) -> RestResult<Option<Body>> {
    Ok(None)
}

fn native_body(body: Option<&Body>) -> RestResult<Option<Body>> {
    Ok(body.cloned())
}

fn json_only(body: Option<&Body>) -> RestResult<Option<Body>> {
    Ok(body.filter(|b| b.is_structured()).cloned())
}

fn json_as_text(body: Option<&Body>) -> RestResult<Option<Body>> {
    match body {
        Some(Body::Json(value)) => Ok(Some(Body::Text(serde_json::to_string(value)?))),
        other => Ok(other.cloned()),
    }
}

/// Construction parameters for [`RestClient`]
#[derive(Clone)]
pub struct RestClientConfig {
    /// Prefixed onto every path
    pub base_url: String,

    /// Per-call timeout
    pub timeout: Duration,

    /// Receives the per-call attachments
    pub reporter: Arc<dyn Reporter>,
}

impl RestClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            reporter: Arc::new(NullReporter),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// REST client with per-call diagnostics
pub struct RestClient {
    base_url: String,
    timeout: Duration,
    http: reqwest::Client,
    reporter: Arc<dyn Reporter>,
}

impl RestClient {
    /// Create a client with the default timeout and no attachment sink
    pub fn new(base_url: impl Into<String>) -> RestResult<Self> {
        Self::with_config(RestClientConfig::new(base_url))
    }

    /// Create a client with custom configuration
    pub fn with_config(config: RestClientConfig) -> RestResult<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        debug!("REST client ready for {}", config.base_url);

        Ok(Self {
            base_url: config.base_url,
            timeout: config.timeout,
            http,
            reporter: config.reporter,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Full URL for `path`: the base URL followed by the path, nothing else
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn get(&self, path: &str, spec: RequestSpec) -> RestResult<Response> {
        self.send(path, Method::Get, spec).await
    }

    pub async fn post(&self, path: &str, spec: RequestSpec) -> RestResult<Response> {
        self.send(path, Method::Post, spec).await
    }

    pub async fn put(&self, path: &str, spec: RequestSpec) -> RestResult<Response> {
        self.send(path, Method::Put, spec).await
    }

    pub async fn delete(&self, path: &str, spec: RequestSpec) -> RestResult<Response> {
        self.send(path, Method::Delete, spec).await
    }

    pub async fn patch(&self, path: &str, spec: RequestSpec) -> RestResult<Response> {
        self.send(path, Method::Patch, spec).await
    }

    /// Perform a call with the verb given by name
    ///
    /// Unknown verbs fail with [`RestError::UnsupportedMethod`] before
    /// anything is sent.
    pub async fn request(
        &self,
        path: &str,
        method: &str,
        spec: RequestSpec,
    ) -> RestResult<Response> {
        let method: Method = method.parse()?;
        self.send(path, method, spec).await
    }

    /// Perform a call and emit its diagnostics
    pub async fn send(
        &self,
        path: &str,
        method: Method,
        spec: RequestSpec,
    ) -> RestResult<Response> {
        let url = self.url_for(path);
        let handler = handler(method);

        let payload = (handler.encode)(spec.body.as_ref())?;
        if let (Some(body), None) = (&spec.body, &payload) {
            warn!("{} does not transmit a {} body; it was not sent", method, body.kind());
        }

        let request = self.build(handler.method, &url, &spec, payload)?;
        let captured = request.try_clone();

        let response = self
            .http
            .execute(request)
            .await
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&url, e))?;
        let response = Response::new(status, headers, url.clone(), body);

        let reporter = self.reporter.as_ref();
        diagnostics::capture_curl(reporter, captured.as_ref());
        diagnostics::log_call(
            reporter,
            &CallRecord {
                url: &url,
                method,
                status,
                spec: &spec,
            },
            &response,
        );
        diagnostics::log_response_json(&response);

        Ok(response)
    }

    fn build(
        &self,
        method: reqwest::Method,
        url: &str,
        spec: &RequestSpec,
        payload: Option<Body>,
    ) -> RestResult<reqwest::Request> {
        let mut builder = self.http.request(method, url).timeout(self.timeout);

        for (name, value) in &spec.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !spec.query.is_empty() {
            builder = builder.query(&spec.query);
        }
        if let Some(cookie) = spec.cookie_header() {
            builder = builder.header(COOKIE, cookie);
        }

        builder = match payload {
            Some(Body::Form(fields)) => builder.form(&fields),
            Some(Body::Text(text)) => builder.body(text),
            Some(Body::Raw(bytes)) => builder.body(bytes),
            Some(Body::Json(value)) => builder.json(&value),
            None => builder,
        };

        builder
            .build()
            .map_err(|e| RestError::InvalidRequest(e.to_string()))
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> RestError {
        if err.is_timeout() {
            RestError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            }
        } else if err.is_connect() {
            RestError::Connection {
                url: url.to_string(),
                source: err,
            }
        } else {
            RestError::Transport(err)
        }
    }

    /// Release the pooled connection
    pub fn close(self) {
        debug!("Closing REST client for {}", self.base_url);
    }
}
