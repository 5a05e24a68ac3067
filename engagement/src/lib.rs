//! LMS to EduMind engagement pipeline
//!
//! ## Current API
//!
//! - Resolve an event's student identity (direct id or LMS user mapping)
//! - Forward a resolved event to the engagement tracker
//! - Ingest an event end to end (resolve, then forward)
//!
pub mod error;
pub mod event;
pub mod forwarder;
pub mod ingest;
pub mod mapping;
pub mod resolver;

pub use error::{Error, ErrorKind, ForwardingError};
pub use event::{Event, EventType, ForwardedEventPayload};
pub use forwarder::EventForwarder;
pub use ingest::{IngestAck, ingest};
pub use mapping::{IdentityMapping, IdentityMappingStore, InMemoryMappingStore};
pub use resolver::resolve_student_id;
