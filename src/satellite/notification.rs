//! Notification payload posted to the satellite.

use serde::Serialize;

use crate::http::request::RequestSnapshot;
use crate::http::response::Payload;

/// What a response emitted, as mirrored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSnapshot {
    #[serde(skip_serializing_if = "Payload::is_absent")]
    pub body: Payload,
}

/// One mirrored exchange. Built fresh for every emission call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub req: RequestSnapshot,
    pub res: ResponseSnapshot,
}
