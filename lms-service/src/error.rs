use axum::Json;
use axum::extract::FromRequest;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use engagement::ErrorKind;
use serde_json::json;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("{1}")]
    Server(StatusCode, String),
    // Froms
    #[error("{0}")]
    Engagement(#[from] engagement::Error),
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Server(rejection.status(), rejection.body_text())
    }
}

/// `Json` extractor whose rejections render as `{"detail": ...}`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct AppJson<T>(pub T);

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            Error::Engagement(e) if e.kind() == ErrorKind::Gateway => {
                format!("Failed to send event to engagement tracker: {e}")
            }
            Error::Engagement(e) if e.kind() == ErrorKind::Internal => {
                tracing::error!(error = ?e, "internal error");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Server(c, _) => *c,
            Error::Engagement(e) => match e.kind() {
                ErrorKind::Caller => StatusCode::BAD_REQUEST,
                ErrorKind::Gateway => StatusCode::BAD_GATEWAY,
                ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}
