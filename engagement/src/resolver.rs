use tracing::{debug, instrument};

use crate::{error::Error, event::Event, mapping::IdentityMappingStore};

/// Decides which EduMind student an event belongs to:
/// 1. A non-blank `student_id` is used verbatim, the store is not consulted
/// 2. Otherwise `lms_user_id` is looked up in the mapping store
/// 3. Otherwise the event has no identity
#[instrument(skip_all, fields(lms_user_id = event.lms_user_id))]
pub async fn resolve_student_id(
    store: &dyn IdentityMappingStore,
    event: &Event,
) -> Result<String, Error> {
    if let Some(student_id) = event
        .student_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
    {
        debug!(student_id, "using student id from event");
        return Ok(student_id.to_string());
    }

    let Some(lms_user_id) = event.lms_user_id else {
        return Err(Error::MissingIdentity);
    };

    match store.lookup_by_local_id(lms_user_id).await? {
        Some(student_id) => {
            debug!(%student_id, "mapped LMS user to student");
            Ok(student_id)
        }
        None => Err(Error::UnmappedUser(lms_user_id)),
    }
}
