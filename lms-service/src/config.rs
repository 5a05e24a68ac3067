use std::sync::Arc;

use engagement::{EventForwarder, IdentityMappingStore, InMemoryMappingStore};
use tracing::{info, warn};

use crate::courses::CourseCatalog;

#[derive(Clone)]
pub struct AppState {
    pub mappings: Arc<dyn IdentityMappingStore>,
    pub forwarder: EventForwarder,
    pub courses: Arc<CourseCatalog>,
    pub env_vars: EnvVars,
}

impl AppState {
    /// Seeds the mapping store and points the forwarder at the engagement tracker
    pub fn new(env_vars: EnvVars) -> Result<Self, engagement::Error> {
        let mappings = InMemoryMappingStore::parse(&env_vars.identity_mappings)?;
        info!(count = mappings.len(), "loaded identity mappings");
        let forwarder = EventForwarder::new(&env_vars.engagement_tracker_url)?;
        info!(url = forwarder.ingest_url(), "forwarding events");

        Ok(Self {
            mappings: Arc::new(mappings),
            forwarder,
            courses: Arc::new(CourseCatalog::new()),
            env_vars,
        })
    }
}

#[derive(Debug, Clone)]
pub struct EnvVars {
    pub engagement_tracker_url: String,
    /// `<lms_user_id>=<student_id>` pairs, comma separated
    pub identity_mappings: String,
    pub port: u16,
    pub request_body_size_limit: usize,
    pub request_timeout_in_ms: u64,
    pub sentry_dsn: Option<String>,
}

impl Default for EnvVars {
    fn default() -> Self {
        Self {
            engagement_tracker_url: "http://localhost:8005".to_string(),
            identity_mappings: String::new(),
            port: 8010,
            request_body_size_limit: 5 * 2_usize.pow(20),
            request_timeout_in_ms: 30_000,
            sentry_dsn: None,
        }
    }
}

impl EnvVars {
    pub fn new() -> Self {
        let defaults = Self::default();

        let engagement_tracker_url = match std::env::var("ENGAGEMENT_TRACKER_URL") {
            Ok(s) if !s.is_empty() => s,
            _ => {
                warn!(
                    "ENGAGEMENT_TRACKER_URL not set. Defaulting to {}",
                    defaults.engagement_tracker_url
                );
                defaults.engagement_tracker_url
            }
        };

        let identity_mappings = match std::env::var("IDENTITY_MAPPINGS") {
            Ok(s) => s,
            Err(_e) => {
                warn!("IDENTITY_MAPPINGS not set. No LMS users will be mapped");
                defaults.identity_mappings
            }
        };

        let port = match std::env::var("PORT") {
            Ok(port_string) => port_string.parse().expect("PORT to be parseable as u16"),
            Err(_e) => {
                warn!("PORT not set. Defaulting to {}", defaults.port);
                defaults.port
            }
        };

        let request_timeout_in_ms = match std::env::var("REQUEST_TIMEOUT_IN_MS") {
            Ok(s) => s
                .parse()
                .expect("REQUEST_TIMEOUT_IN_MS to be valid unsigned integer"),
            Err(_e) => {
                warn!(
                    "REQUEST_TIMEOUT_IN_MS not set. Defaulting to {}",
                    defaults.request_timeout_in_ms
                );
                defaults.request_timeout_in_ms
            }
        };

        let request_body_size_limit = match std::env::var("REQUEST_BODY_SIZE_LIMIT") {
            Ok(s) => s
                .parse()
                .expect("REQUEST_BODY_SIZE_LIMIT to be valid unsigned integer"),
            Err(_e) => {
                warn!(
                    "REQUEST_BODY_SIZE_LIMIT not set. Defaulting to {}",
                    defaults.request_body_size_limit
                );
                defaults.request_body_size_limit
            }
        };

        let sentry_dsn = match std::env::var("SENTRY_DSN") {
            Ok(dsn) if !dsn.is_empty() => {
                assert!(
                    dsn.parse::<sentry::types::Dsn>().is_ok(),
                    "SENTRY_DSN is not valid DSN."
                );
                Some(dsn)
            }
            _ => {
                warn!("SENTRY_DSN not set.");
                None
            }
        };

        EnvVars {
            engagement_tracker_url,
            identity_mappings,
            port,
            request_body_size_limit,
            request_timeout_in_ms,
            sentry_dsn,
        }
    }
}
