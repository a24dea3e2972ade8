//! Per-call diagnostics
//!
//! Nothing in here may fail a call. Capture and formatting problems are
//! logged and replaced with placeholders.

use serde::Serialize;
use thiserror::Error;
use tracing::{error, info, warn};

use taskboard_common::{AttachmentKind, Reporter};

use crate::client::{Body, Method, RequestSpec, Response};

pub const CURL_ATTACHMENT: &str = "requests curl";
pub const CURL_ERROR_ATTACHMENT: &str = "requests curl error";
pub const SUMMARY_ATTACHMENT: &str = "requests method/url/time/header";
pub const PARAMS_ATTACHMENT: &str = "requests params";
pub const DATA_ATTACHMENT: &str = "requests data";
pub const JSON_ATTACHMENT: &str = "requests json";
pub const COOKIES_ATTACHMENT: &str = "requests cookies";

/// Why a request could not be rendered as a curl command
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CurlError {
    #[error("request was not captured before sending")]
    NotCaptured,

    #[error("request body is a stream and cannot be replayed")]
    StreamingBody,

    #[error("request body is not valid UTF-8")]
    NonUtf8Body,
}

/// Render a request as a shell-ready curl command
pub fn to_curl(request: &reqwest::Request) -> Result<String, CurlError> {
    let mut parts = vec![
        "curl".to_string(),
        "-X".to_string(),
        request.method().to_string(),
    ];

    let mut headers: Vec<(String, String)> = request
        .headers()
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();
    headers.sort();

    for (name, value) in headers {
        parts.push("-H".to_string());
        parts.push(shell_quote(&format!("{}: {}", name, value)));
    }

    if let Some(body) = request.body() {
        let bytes = body.as_bytes().ok_or(CurlError::StreamingBody)?;
        if !bytes.is_empty() {
            let text = std::str::from_utf8(bytes).map_err(|_| CurlError::NonUtf8Body)?;
            parts.push("-d".to_string());
            parts.push(shell_quote(text));
        }
    }

    parts.push(shell_quote(request.url().as_str()));
    Ok(parts.join(" "))
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r#"'"'"'"#))
}

/// Attach the curl reproduction of `request`, or a placeholder if it cannot be built
pub(crate) fn capture_curl(reporter: &dyn Reporter, request: Option<&reqwest::Request>) {
    match request.ok_or(CurlError::NotCaptured).and_then(to_curl) {
        Ok(curl) => reporter.attach(CURL_ATTACHMENT, AttachmentKind::Text, &curl),
        Err(e) => {
            reporter.attach(CURL_ERROR_ATTACHMENT, AttachmentKind::Text, "None");
            error!("Curl capture error: {}", e);
        }
    }
}

/// What was asked for, as the caller supplied it
pub(crate) struct CallRecord<'a> {
    pub url: &'a str,
    pub method: Method,
    pub status: u16,
    pub spec: &'a RequestSpec,
}

/// Log the call and attach its parts to the report
pub(crate) fn log_call(reporter: &dyn Reporter, call: &CallRecord<'_>, response: &Response) {
    let spec = call.spec;

    info!("api url ==> {}", call.url);
    info!("api method ==> {}", call.method);
    info!("status code ==> {}", call.status);
    info!("api request headers ==> {}", pretty(&spec.headers));

    reporter.attach(
        SUMMARY_ATTACHMENT,
        AttachmentKind::Text,
        &format!("{} {} \nStatus Code: {} ", call.method, call.url, call.status),
    );

    if !spec.query.is_empty() {
        let params = pretty(&spec.query);
        info!("api request params ==> {}", params);
        reporter.attach(PARAMS_ATTACHMENT, AttachmentKind::Json, &params);
    }

    match &spec.body {
        Some(Body::Json(value)) => {
            let json = pretty(value);
            info!("api request json ==> {}", json);
            reporter.attach(JSON_ATTACHMENT, AttachmentKind::Json, &json);
        }
        Some(body) => {
            let (data, kind) = describe_data(body);
            info!("api request data ==> {}", data);
            reporter.attach(DATA_ATTACHMENT, kind, &data);
        }
        None => {}
    }

    if !spec.cookies.is_empty() {
        let cookies = pretty(&spec.cookies);
        info!("api request cookies ==> {}", cookies);
        reporter.attach(COOKIES_ATTACHMENT, AttachmentKind::Json, &cookies);
    }

    if !response.bytes().is_empty() {
        let name = format!("{} Response body", call.url);
        match response.json() {
            Some(value) => reporter.attach(&name, AttachmentKind::Json, &pretty(value)),
            None => reporter.attach(&name, AttachmentKind::Text, &response.text()),
        }
    }
}

/// Log the parsed response body, or the raw text when it is not JSON
pub(crate) fn log_response_json(response: &Response) {
    match response.json() {
        Some(value) => info!("api response json ==> {}", pretty(value)),
        None => error!("Json decode error, json text is ==> {}", response.text()),
    }
}

fn describe_data(body: &Body) -> (String, AttachmentKind) {
    match body {
        Body::Form(fields) => (pretty(fields), AttachmentKind::Json),
        Body::Text(text) => (text.clone(), AttachmentKind::Text),
        Body::Raw(bytes) => match std::str::from_utf8(bytes) {
            Ok(text) => (text.to_string(), AttachmentKind::Text),
            Err(_) => (format!("<{} bytes of binary data>", bytes.len()), AttachmentKind::Text),
        },
        Body::Json(value) => (pretty(value), AttachmentKind::Json),
    }
}

fn pretty<T: Serialize + ?Sized>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to pretty-print log value: {}", e);
            "<unprintable>".to_string()
        }
    }
}
