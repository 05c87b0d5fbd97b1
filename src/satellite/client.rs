//! Fire-and-forget delivery of notifications.
//!
//! # Responsibilities
//! - Resolve the `/requests` endpoint from the configured satellite host
//! - POST each notification as JSON on a detached task
//! - Log and count failures without surfacing them to the caller

use std::time::Duration;

use url::Url;

use crate::config::MirrorConfig;
use crate::observability::metrics;
use crate::satellite::notification::Notification;

/// Errors building a satellite client.
#[derive(Debug, thiserror::Error)]
pub enum SatelliteError {
    #[error("satellite host must not be empty")]
    EmptyHost,
    #[error("invalid satellite endpoint '{endpoint}': {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Destination for notifications.
///
/// `dispatch` must return promptly and never fail; delivery is best-effort.
pub trait Sink: Send + Sync + 'static {
    /// Identifies the destination; one exchange is mirrored once per endpoint.
    fn endpoint(&self) -> &str;

    fn dispatch(&self, notification: Notification);
}

/// Build `{host}/requests`, assuming `http://` when no scheme is given.
pub fn requests_endpoint(satellite_host: &str) -> Result<Url, SatelliteError> {
    let host = satellite_host.trim().trim_end_matches('/');
    if host.is_empty() {
        return Err(SatelliteError::EmptyHost);
    }

    let endpoint = if host.contains("://") {
        format!("{host}/requests")
    } else {
        format!("http://{host}/requests")
    };

    Url::parse(&endpoint).map_err(|source| SatelliteError::InvalidEndpoint { endpoint, source })
}

/// HTTP sink posting to a satellite.
#[derive(Debug, Clone)]
pub struct SatelliteClient {
    client: reqwest::Client,
    endpoint: Url,
}

impl SatelliteClient {
    pub fn new(config: &MirrorConfig) -> Result<Self, SatelliteError> {
        let endpoint = requests_endpoint(&config.satellite_host)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, endpoint })
    }
}

impl Sink for SatelliteClient {
    fn endpoint(&self) -> &str {
        self.endpoint.as_str()
    }

    fn dispatch(&self, notification: Notification) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(endpoint = %self.endpoint, "No async runtime, dropping notification");
            metrics::record_notification("dropped");
            return;
        };

        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        runtime.spawn(async move {
            let result = client
                .post(endpoint.clone())
                .json(&notification)
                .send()
                .await
                .and_then(reqwest::Response::error_for_status);

            match result {
                Ok(response) => {
                    tracing::debug!(
                        endpoint = %endpoint,
                        status = %response.status(),
                        path = %notification.req.path,
                        "Notification delivered"
                    );
                    metrics::record_notification("delivered");
                }
                Err(e) => {
                    tracing::warn!(
                        endpoint = %endpoint,
                        path = %notification.req.path,
                        error = %e,
                        "Failed to deliver notification to satellite"
                    );
                    metrics::record_notification("failed");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_endpoint() {
        assert_eq!(
            requests_endpoint("http://satellite:4000").unwrap().as_str(),
            "http://satellite:4000/requests"
        );
        assert_eq!(
            requests_endpoint("https://satellite.example.com/base/").unwrap().as_str(),
            "https://satellite.example.com/base/requests"
        );
        assert_eq!(
            requests_endpoint("example-satellite.cluster.local").unwrap().as_str(),
            "http://example-satellite.cluster.local/requests"
        );
    }

    #[test]
    fn test_requests_endpoint_errors() {
        assert!(matches!(requests_endpoint(" / "), Err(SatelliteError::EmptyHost)));
        assert!(matches!(
            requests_endpoint("http://bad host"),
            Err(SatelliteError::InvalidEndpoint { .. })
        ));
    }

    #[test]
    fn test_dispatch_outside_runtime_is_dropped() {
        use crate::http::request::{parse_query, RequestSnapshot};
        use crate::http::response::Payload;
        use crate::satellite::notification::ResponseSnapshot;
        use metrics_util::debugging::{DebugValue, DebuggingRecorder};

        let recorder = DebuggingRecorder::new();
        let snapshotter = recorder.snapshotter();
        let client = SatelliteClient::new(&MirrorConfig::default()).unwrap();

        ::metrics::with_local_recorder(&recorder, || {
            client.dispatch(Notification {
                req: RequestSnapshot {
                    method: "GET".into(),
                    path: "/".into(),
                    query: parse_query(None),
                    body: None,
                    host: None,
                    origin: None,
                },
                res: ResponseSnapshot { body: Payload::Absent },
            });
        });

        let counters: Vec<_> = snapshotter
            .snapshot()
            .into_vec()
            .into_iter()
            .filter(|(key, ..)| key.key().name() == "mirror_notifications_total")
            .map(|(key, _, _, value)| {
                let outcome = key
                    .key()
                    .labels()
                    .find(|label| label.key() == "outcome")
                    .map(|label| label.value().to_string());
                (outcome, value)
            })
            .collect();
        assert_eq!(
            counters,
            vec![(Some("dropped".to_string()), DebugValue::Counter(1))]
        );
    }
}
