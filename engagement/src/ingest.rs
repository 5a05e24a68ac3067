use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    error::{Error, ErrorKind},
    event::Event,
    forwarder::EventForwarder,
    mapping::IdentityMappingStore,
    resolver::resolve_student_id,
};

/// Tag naming where accepted events were sent
pub const FORWARDED_TO: &str = "engagement-tracker";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IngestAck {
    pub status: String,
    pub student_id: String,
    pub forwarded_to: String,
    pub engagement_tracker_response: Value,
}

/// Resolves the event's student, then forwards the event.
///
/// Identity errors return before any request is made to the tracker.
#[instrument(skip_all, fields(event_type = %event.event_type))]
pub async fn ingest(
    store: &dyn IdentityMappingStore,
    forwarder: &EventForwarder,
    event: Event,
) -> Result<IngestAck, Error> {
    let student_id = match resolve_student_id(store, &event).await {
        Ok(student_id) => student_id,
        Err(e) => {
            match e.kind() {
                ErrorKind::Caller => warn!(error = %e, "rejecting event"),
                _ => tracing::error!(error = ?e, "unable to resolve student"),
            }
            return Err(e);
        }
    };

    let engagement_tracker_response = forwarder.forward(&student_id, &event).await?;

    info!(%student_id, "event ingested");
    Ok(IngestAck {
        status: "success".to_string(),
        student_id,
        forwarded_to: FORWARDED_TO.to_string(),
        engagement_tracker_response,
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::{error::ForwardingError, mapping::CountingStore};

    fn event(body: Value) -> Event {
        serde_json::from_value(body).unwrap()
    }

    #[tokio::test]
    async fn mapped_user_is_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/events/ingest"))
            .and(body_partial_json(json!({
                "student_id": "STU0001",
                "event_type": "video_play",
                "source_service": "minimal-lms",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "evt_1"})))
            .expect(1)
            .mount(&server)
            .await;

        let store = CountingStore::new("7=STU0001");
        let forwarder = EventForwarder::new(&server.uri()).unwrap();

        let ack = ingest(
            &store,
            &forwarder,
            event(json!({
                "event_type": "video_play",
                "event_timestamp": "2025-03-01T09:30:00Z",
                "lms_user_id": 7,
            })),
        )
        .await
        .unwrap();

        assert_eq!(ack.status, "success");
        assert_eq!(ack.student_id, "STU0001");
        assert_eq!(ack.forwarded_to, "engagement-tracker");
        assert_eq!(ack.engagement_tracker_response, json!({"id": "evt_1"}));
    }

    #[tokio::test]
    async fn unmapped_user_makes_no_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let store = CountingStore::new("7=STU0001");
        let forwarder = EventForwarder::new(&server.uri()).unwrap();

        let err = ingest(
            &store,
            &forwarder,
            event(json!({
                "event_type": "login",
                "event_timestamp": "2025-03-01T09:30:00Z",
                "lms_user_id": 99,
            })),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::UnmappedUser(99)));
        assert_eq!(err.kind(), ErrorKind::Caller);
    }

    #[tokio::test]
    async fn missing_identity_makes_no_lookup_or_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(0)
            .mount(&server)
            .await;

        let store = CountingStore::new("7=STU0001");
        let forwarder = EventForwarder::new(&server.uri()).unwrap();

        let err = ingest(
            &store,
            &forwarder,
            event(json!({
                "event_type": "logout",
                "event_timestamp": "2025-03-01T09:30:00Z",
            })),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::MissingIdentity));
        assert_eq!(store.lookups(), 0);
    }

    #[tokio::test]
    async fn tracker_timeout_is_a_gateway_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(201)
                    .set_body_json(json!({"id": "evt_late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let store = CountingStore::new("");
        let forwarder = EventForwarder::new(&server.uri())
            .unwrap()
            .with_timeout(Duration::from_millis(200));

        let err = ingest(
            &store,
            &forwarder,
            event(json!({
                "event_type": "quiz_start",
                "event_timestamp": "2025-03-01T09:30:00Z",
                "student_id": "STU0002",
            })),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Gateway);
        assert!(matches!(
            err,
            Error::Forwarding(ForwardingError::Timeout { .. })
        ));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn tracker_error_status_is_a_gateway_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
            .expect(1)
            .mount(&server)
            .await;

        let store = CountingStore::new("");
        let forwarder = EventForwarder::new(&server.uri()).unwrap();

        let err = ingest(
            &store,
            &forwarder,
            event(json!({
                "event_type": "forum_post",
                "event_timestamp": "2025-03-01T09:30:00Z",
                "student_id": "STU0002",
            })),
        )
        .await
        .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Gateway);
        let msg = err.to_string();
        assert!(msg.contains("503"), "{msg}");
        assert!(msg.contains("maintenance"), "{msg}");
    }
}
