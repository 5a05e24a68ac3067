use std::time::Duration;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Either student_id or lms_user_id must be provided.")]
    MissingIdentity,
    #[error("No EduMind mapping found for LMS user id {0}")]
    UnmappedUser(i64),
    #[error("{0}")]
    MappingConflict(String),
    #[error("mapping store error: {0}")]
    MappingStore(String),
    #[error("{0}")]
    InvalidConfig(String),
    // Froms
    #[error("{0}")]
    Forwarding(#[from] ForwardingError),
}

/// Who is responsible for an [`Error`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself is wrong, retrying it unchanged will not help
    Caller,
    /// The engagement tracker failed, the request may succeed later
    Gateway,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::MissingIdentity | Error::UnmappedUser(_) => ErrorKind::Caller,
            Error::Forwarding(_) => ErrorKind::Gateway,
            Error::MappingConflict(_) | Error::MappingStore(_) | Error::InvalidConfig(_) => {
                ErrorKind::Internal
            }
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ForwardingError {
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },
    #[error("{url} responded with status {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },
    #[error("unable to reach {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("invalid JSON response from {url}: {reason}")]
    InvalidResponse { url: String, reason: String },
}
