//! Response emission primitives.
//!
//! Handlers answer through a [`Res`] handle instead of returning a finished
//! response. The handle routes both emission primitives (`send` and `end`)
//! through an [`Emitter`] chain stored in the request extensions, which lets
//! middleware decorate emission without touching the handler.
//!
//! # Design Decisions
//! - Decorators wrap the inner emitter by reference and must call through
//!   with the original arguments
//! - The base emitter only writes into the handle; the bytes reach the client
//!   when the handler returns the handle
//! - A second emission on a finished handle is ignored by the base emitter

use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Serialize, Serializer};

/// The argument of the primary (`send`) primitive, and the body recorded in a
/// mirrored response.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    #[default]
    Absent,
    Text(String),
    Json(serde_json::Value),
    Binary(Bytes),
}

impl Payload {
    pub fn is_absent(&self) -> bool {
        matches!(self, Payload::Absent)
    }
}

impl Serialize for Payload {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Buffer<'a> {
            #[serde(rename = "type")]
            kind: &'static str,
            data: &'a [u8],
        }

        match self {
            Payload::Absent => serializer.serialize_none(),
            Payload::Text(text) => serializer.serialize_str(text),
            Payload::Json(value) => value.serialize(serializer),
            Payload::Binary(bytes) => Buffer {
                kind: "Buffer",
                data: bytes,
            }
            .serialize(serializer),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

impl From<Bytes> for Payload {
    fn from(bytes: Bytes) -> Self {
        Payload::Binary(bytes)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(bytes: Vec<u8>) -> Self {
        Payload::Binary(bytes.into())
    }
}

/// The argument of the secondary (`end`) primitive: a final chunk, or a
/// callback run once the response is finalized.
pub enum Chunk {
    Absent,
    Text(String),
    Binary(Bytes),
    Callback(Box<dyn FnOnce() + Send + 'static>),
}

impl Chunk {
    pub fn callback(f: impl FnOnce() + Send + 'static) -> Self {
        Chunk::Callback(Box::new(f))
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::Absent => f.write_str("Absent"),
            Chunk::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Chunk::Binary(bytes) => f.debug_tuple("Binary").field(bytes).finish(),
            Chunk::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl From<&str> for Chunk {
    fn from(text: &str) -> Self {
        Chunk::Text(text.to_string())
    }
}

impl From<String> for Chunk {
    fn from(text: String) -> Self {
        Chunk::Text(text)
    }
}

impl From<Bytes> for Chunk {
    fn from(bytes: Bytes) -> Self {
        Chunk::Binary(bytes)
    }
}

impl From<Vec<u8>> for Chunk {
    fn from(bytes: Vec<u8>) -> Self {
        Chunk::Binary(bytes.into())
    }
}

/// A response-emission capability.
pub trait Emitter: Send + Sync + 'static {
    /// Buffered emission of a complete payload.
    fn send(&self, res: &mut Res, body: Payload);

    /// Direct termination of the response, optionally writing a last chunk.
    fn end(&self, res: &mut Res, chunk: Chunk);
}

/// The innermost emitter: writes the body into the handle.
#[derive(Debug, Default, Clone, Copy)]
pub struct Direct;

impl Emitter for Direct {
    fn send(&self, res: &mut Res, body: Payload) {
        if res.finished() {
            tracing::warn!("send called on a finished response, ignoring");
            return;
        }

        match body {
            Payload::Absent => res.finish(Bytes::new()),
            Payload::Text(text) => {
                res.default_content_type("text/html; charset=utf-8");
                res.finish(Bytes::from(text));
            }
            Payload::Json(value) => {
                res.default_content_type("application/json");
                res.finish(Bytes::from(value.to_string()));
            }
            Payload::Binary(bytes) => {
                res.default_content_type("application/octet-stream");
                res.finish(bytes);
            }
        }
    }

    fn end(&self, res: &mut Res, chunk: Chunk) {
        if res.finished() {
            tracing::warn!("end called on a finished response, ignoring");
            return;
        }

        match chunk {
            Chunk::Absent => res.finish(Bytes::new()),
            Chunk::Text(text) => res.finish(Bytes::from(text)),
            Chunk::Binary(bytes) => res.finish(bytes),
            Chunk::Callback(done) => {
                res.finish(Bytes::new());
                done();
            }
        }
    }
}

/// Request extension carrying the emitter chain for one exchange.
#[derive(Clone)]
pub struct ResponseEmitter {
    emitter: Arc<dyn Emitter>,
    mirrored_to: Vec<String>,
}

impl ResponseEmitter {
    /// The chain currently installed on a request, or the bare base emitter.
    pub fn current(extensions: &axum::http::Extensions) -> Self {
        extensions.get::<Self>().cloned().unwrap_or_default()
    }

    /// Whether a mirror for `endpoint` already decorates this chain.
    pub fn is_mirrored_to(&self, endpoint: &str) -> bool {
        self.mirrored_to.iter().any(|e| e == endpoint)
    }

    pub fn emitter(&self) -> Arc<dyn Emitter> {
        Arc::clone(&self.emitter)
    }

    /// Replace the chain with `decorated`, recording the mirrored endpoint.
    pub fn decorate(mut self, endpoint: &str, decorated: Arc<dyn Emitter>) -> Self {
        self.emitter = decorated;
        self.mirrored_to.push(endpoint.to_string());
        self
    }
}

impl Default for ResponseEmitter {
    fn default() -> Self {
        Self {
            emitter: Arc::new(Direct),
            mirrored_to: Vec::new(),
        }
    }
}

/// Handle through which a handler emits its response.
pub struct Res {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
    emitter: Arc<dyn Emitter>,
}

impl Res {
    pub fn new(emitter: Arc<dyn Emitter>) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
            emitter,
        }
    }

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        self.status = status;
        self
    }

    pub fn header(&mut self, name: HeaderName, value: HeaderValue) -> &mut Self {
        self.headers.insert(name, value);
        self
    }

    /// Primary emission primitive.
    pub fn send(&mut self, body: impl Into<Payload>) -> &mut Self {
        let emitter = Arc::clone(&self.emitter);
        emitter.send(self, body.into());
        self
    }

    /// Secondary emission primitive.
    pub fn end(&mut self, chunk: impl Into<Chunk>) -> &mut Self {
        let emitter = Arc::clone(&self.emitter);
        emitter.end(self, chunk.into());
        self
    }

    /// Serialize `value` and emit it through [`Res::send`] as text.
    pub fn json<T: Serialize + ?Sized>(&mut self, value: &T) -> &mut Self {
        match serde_json::to_string(value) {
            Ok(text) => {
                self.default_content_type("application/json");
                self.send(text)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize JSON response");
                self.status(StatusCode::INTERNAL_SERVER_ERROR).end(Chunk::Absent)
            }
        }
    }

    /// Whether an emission primitive has written the body.
    pub fn finished(&self) -> bool {
        self.body.is_some()
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn default_content_type(&mut self, value: &'static str) {
        if !self.headers.contains_key(header::CONTENT_TYPE) {
            self.headers
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(value));
        }
    }

    fn finish(&mut self, body: Bytes) {
        self.body = Some(body);
    }
}

impl fmt::Debug for Res {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Res")
            .field("status", &self.status)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .finish_non_exhaustive()
    }
}

impl<S> FromRequestParts<S> for Res
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Res::new(ResponseEmitter::current(&parts.extensions).emitter()))
    }
}

impl IntoResponse for Res {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body.unwrap_or_default()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}
