//! Request snapshot capture.
//!
//! # Responsibilities
//! - Decide which methods are mirrored at all
//! - Record method, full routed path, decoded query and selected headers
//! - Buffer and parse small JSON or form bodies without changing what
//!   downstream handlers read
//!
//! # Design Decisions
//! - The path comes from `OriginalUri`, so nest prefixes are always included
//! - JSON and form bodies are buffered up to the configured limit, with or
//!   without `content-length`; a declared length above the limit is not read
//! - Whatever was read is chained back in front of the unread stream, so an
//!   overflow or a mid-stream error reaches the handler exactly as sent
//! - Parse failures produce an absent body, never an error

use std::collections::BTreeMap;

use axum::{
    body::{Body, Bytes},
    extract::{OriginalUri, Request},
    http::{header, HeaderMap, Method},
};
use futures_util::{stream, StreamExt};
use serde::Serialize;

/// Methods whose exchanges are mirrored. OPTIONS and extension methods are not.
const MIRRORED_METHODS: [Method; 6] = [
    Method::GET,
    Method::HEAD,
    Method::POST,
    Method::PUT,
    Method::DELETE,
    Method::PATCH,
];

pub fn is_mirrored_method(method: &Method) -> bool {
    MIRRORED_METHODS.contains(method)
}

/// A decoded query value. Repeated keys collect into a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum QueryValue {
    One(String),
    Many(Vec<String>),
}

impl QueryValue {
    fn push(&mut self, value: String) {
        match self {
            QueryValue::One(first) => {
                *self = QueryValue::Many(vec![std::mem::take(first), value]);
            }
            QueryValue::Many(values) => values.push(value),
        }
    }
}

/// The request as routed, captured before any handler runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub path: String,
    pub query: BTreeMap<String, QueryValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

/// Decode a raw query string into a mapping.
pub fn parse_query(query: Option<&str>) -> BTreeMap<String, QueryValue> {
    let mut decoded: BTreeMap<String, QueryValue> = BTreeMap::new();

    for (key, value) in url::form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
        let value = value.into_owned();
        match decoded.get_mut(key.as_ref()) {
            Some(existing) => existing.push(value),
            None => {
                decoded.insert(key.into_owned(), QueryValue::One(value));
            }
        }
    }
    decoded
}

/// Capture a snapshot of `req`, returning the request to hand downstream.
///
/// When the body is buffered the returned request carries the same bytes.
pub async fn capture(req: Request, max_body_bytes: usize) -> (Request, RequestSnapshot) {
    let uri = req
        .extensions()
        .get::<OriginalUri>()
        .map(|OriginalUri(uri)| uri.clone())
        .unwrap_or_else(|| req.uri().clone());

    let headers = req.headers();
    let mut snapshot = RequestSnapshot {
        method: req.method().to_string(),
        path: uri.path().to_string(),
        query: parse_query(uri.query()),
        body: None,
        host: header_string(headers, header::HOST),
        origin: header_string(headers, header::ORIGIN),
    };

    let Some(kind) = body_kind(headers, max_body_bytes) else {
        return (req, snapshot);
    };

    let (parts, body) = req.into_parts();
    let mut data = body.into_data_stream();
    let mut read: Vec<Bytes> = Vec::new();
    let mut total = 0usize;

    loop {
        match data.next().await {
            Some(Ok(chunk)) => {
                total += chunk.len();
                read.push(chunk);
                if total > max_body_bytes {
                    tracing::debug!(limit = max_body_bytes, "Request body exceeds snapshot limit");
                    let body = Body::from_stream(replay(read).chain(data));
                    return (Request::from_parts(parts, body), snapshot);
                }
            }
            Some(Err(e)) => {
                tracing::debug!(error = %e, "Failed to buffer request body for snapshot");
                let failed = stream::once(async move { Err(e) });
                let body = Body::from_stream(replay(read).chain(failed));
                return (Request::from_parts(parts, body), snapshot);
            }
            None => break,
        }
    }

    let bytes = Bytes::from(read.concat());
    if !bytes.is_empty() {
        snapshot.body = kind.parse(&bytes);
    }
    (Request::from_parts(parts, Body::from(bytes)), snapshot)
}

/// Chunks already taken off the wire, in order, ready to precede the rest.
fn replay(chunks: Vec<Bytes>) -> impl futures_util::Stream<Item = Result<Bytes, axum::Error>> {
    stream::iter(chunks.into_iter().map(Ok))
}

fn header_string(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Form,
}

impl BodyKind {
    fn parse(self, bytes: &Bytes) -> Option<serde_json::Value> {
        match self {
            BodyKind::Json => serde_json::from_slice(bytes).ok(),
            BodyKind::Form => {
                let fields = url::form_urlencoded::parse(bytes)
                    .map(|(k, v)| (k.into_owned(), serde_json::Value::String(v.into_owned())))
                    .collect();
                Some(serde_json::Value::Object(fields))
            }
        }
    }
}

fn body_kind(headers: &HeaderMap, max_body_bytes: usize) -> Option<BodyKind> {
    if let Some(length) = headers.get(header::CONTENT_LENGTH) {
        let length: usize = length.to_str().ok()?.trim().parse().ok()?;
        if length == 0 || length > max_body_bytes {
            return None;
        }
    }

    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let essence = content_type.split(';').next()?.trim().to_ascii_lowercase();

    if essence == "application/json" || essence.ends_with("+json") {
        Some(BodyKind::Json)
    } else if essence == "application/x-www-form-urlencoded" {
        Some(BodyKind::Form)
    } else {
        None
    }
}
