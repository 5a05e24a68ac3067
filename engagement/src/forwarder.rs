use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{Error, ForwardingError},
    event::{Event, ForwardedEventPayload},
};

pub const INGEST_PATH: &str = "/api/v1/events/ingest";
pub const DEFAULT_SOURCE_SERVICE: &str = "minimal-lms";
pub const FORWARD_TIMEOUT: Duration = Duration::from_secs(5);

/// Sends events to the engagement tracker.
///
/// Every call to [`EventForwarder::forward`] is a single POST: no retry, no
/// queue. Calling it twice with the same event delivers it twice.
#[derive(Clone, Debug)]
pub struct EventForwarder {
    ingest_url: String,
    client: reqwest::Client,
    timeout: Duration,
    source_service: String,
}

impl EventForwarder {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        let base_url = base_url.trim_end_matches('/');
        let parsed = Url::parse(base_url).map_err(|e| {
            Error::InvalidConfig(format!("engagement tracker URL '{base_url}' is invalid: {e}"))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidConfig(format!(
                "engagement tracker URL '{base_url}' must use http or https"
            )));
        }

        // A 3xx must surface as a failed delivery, never be followed
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| Error::InvalidConfig(format!("unable to build HTTP client: {e}")))?;

        let forwarder = Self {
            ingest_url: format!("{base_url}{INGEST_PATH}"),
            client,
            timeout: FORWARD_TIMEOUT,
            source_service: DEFAULT_SOURCE_SERVICE.to_string(),
        };
        Ok(forwarder)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_source_service(mut self, source_service: &str) -> Self {
        self.source_service = source_service.to_string();
        self
    }

    pub fn ingest_url(&self) -> &str {
        &self.ingest_url
    }

    /// POSTs the event for `student_id`, returning the tracker's JSON response as is
    #[instrument(skip_all, fields(%student_id, event_type = %event.event_type), err(Debug))]
    pub async fn forward(&self, student_id: &str, event: &Event) -> Result<Value, ForwardingError> {
        let payload = ForwardedEventPayload::new(student_id, event, &self.source_service);
        let url = &self.ingest_url;

        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.send_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(e) => {
                    warn!(error = %e, "unable to read engagement tracker error body");
                    format!("<unreadable body: {e}>")
                }
            };
            warn!(status = status.as_u16(), %body, "engagement tracker rejected event");
            return Err(ForwardingError::Status {
                url: url.clone(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response.bytes().await.map_err(|e| self.send_error(e))?;
        let ack: Value =
            serde_json::from_slice(&body).map_err(|e| ForwardingError::InvalidResponse {
                url: url.clone(),
                reason: format!("{e} (body: {})", String::from_utf8_lossy(&body)),
            })?;

        info!(status = status.as_u16(), "event forwarded");
        debug!(?ack);
        Ok(ack)
    }

    fn send_error(&self, e: reqwest::Error) -> ForwardingError {
        let url = self.ingest_url.clone();
        if e.is_timeout() {
            ForwardingError::Timeout {
                url,
                timeout: self.timeout,
            }
        } else {
            ForwardingError::Transport { url, source: e }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ingest_url_joins_base_and_path() {
        let forwarder = EventForwarder::new("http://localhost:8005/").unwrap();
        assert_eq!(
            forwarder.ingest_url(),
            "http://localhost:8005/api/v1/events/ingest"
        );
    }

    #[test]
    fn new_rejects_invalid_urls() {
        for bad in ["", "localhost:8005", "ftp://tracker", "not a url"] {
            assert!(
                matches!(EventForwarder::new(bad), Err(Error::InvalidConfig(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn defaults_are_fixed() {
        let forwarder = EventForwarder::new("https://tracker.example").unwrap();
        assert_eq!(forwarder.timeout, Duration::from_secs(5));
        assert_eq!(forwarder.source_service, "minimal-lms");
    }
}
