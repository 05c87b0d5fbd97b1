//! Satellite mirroring middleware.
//!
//! Installed with [`axum::middleware::from_fn_with_state`]:
//!
//! ```ignore
//! let mirror = SatelliteMirror::new(&config.mirror)?;
//! let app = Router::new()
//!     .route("/", get(handler))
//!     .layer(middleware::from_fn_with_state(mirror, mirror_middleware));
//! ```
//!
//! For every mirrored exchange the emitter chain gains a [`Mirror`] decorator.
//! `send` is mirrored only for text payloads; `end` is mirrored on every call.
//! The original primitive always runs afterwards with the original argument.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::config::MirrorConfig;
use crate::http::request::{self, RequestSnapshot};
use crate::http::response::{Chunk, Emitter, Payload, Res, ResponseEmitter};
use crate::observability::metrics;
use crate::satellite::{Notification, ResponseSnapshot, SatelliteClient, SatelliteError, Sink};

/// One middleware installation: a sink plus capture settings.
#[derive(Clone)]
pub struct SatelliteMirror {
    sink: Arc<dyn Sink>,
    max_body_bytes: usize,
}

impl SatelliteMirror {
    /// Mirror to the HTTP satellite described by `config`.
    pub fn new(config: &MirrorConfig) -> Result<Self, SatelliteError> {
        let client = SatelliteClient::new(config)?;
        tracing::info!(endpoint = %client.endpoint(), "Satellite mirror configured");
        Ok(Self::with_sink(Arc::new(client), config.max_body_bytes))
    }

    /// Mirror to an arbitrary sink.
    pub fn with_sink(sink: Arc<dyn Sink>, max_body_bytes: usize) -> Self {
        Self {
            sink,
            max_body_bytes,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.sink.endpoint()
    }
}

/// Emitter decorator that notifies the sink before calling through.
struct Mirror {
    inner: Arc<dyn Emitter>,
    request: RequestSnapshot,
    sink: Arc<dyn Sink>,
}

impl Mirror {
    fn notify(&self, body: Payload) {
        self.sink.dispatch(Notification {
            req: self.request.clone(),
            res: ResponseSnapshot { body },
        });
        metrics::record_notification("dispatched");
    }
}

impl Emitter for Mirror {
    fn send(&self, res: &mut Res, body: Payload) {
        match &body {
            Payload::Text(text) => self.notify(Payload::Text(text.clone())),
            _ => metrics::record_skipped("non_text"),
        }
        self.inner.send(res, body);
    }

    fn end(&self, res: &mut Res, chunk: Chunk) {
        let body = match &chunk {
            Chunk::Absent | Chunk::Callback(_) => Payload::Absent,
            Chunk::Text(text) => Payload::Text(text.clone()),
            Chunk::Binary(bytes) => Payload::Binary(bytes.clone()),
        };
        self.notify(body);
        self.inner.end(res, chunk);
    }
}

/// Capture the request and decorate its emitter chain, then run downstream.
pub async fn mirror_middleware(
    State(mirror): State<SatelliteMirror>,
    req: Request,
    next: Next,
) -> Response {
    if !request::is_mirrored_method(req.method()) {
        tracing::trace!(method = %req.method(), "Method not mirrored");
        metrics::record_skipped("method");
        return next.run(req).await;
    }

    let chain = ResponseEmitter::current(req.extensions());
    if chain.is_mirrored_to(mirror.endpoint()) {
        tracing::trace!(endpoint = %mirror.endpoint(), "Exchange already mirrored");
        metrics::record_skipped("duplicate");
        return next.run(req).await;
    }

    let (mut req, snapshot) = request::capture(req, mirror.max_body_bytes).await;
    tracing::debug!(
        method = %snapshot.method,
        path = %snapshot.path,
        endpoint = %mirror.endpoint(),
        "Mirroring exchange"
    );

    let decorated = Arc::new(Mirror {
        inner: chain.emitter(),
        request: snapshot,
        sink: Arc::clone(&mirror.sink),
    });
    req.extensions_mut()
        .insert(chain.decorate(mirror.endpoint(), decorated));

    next.run(req).await
}
