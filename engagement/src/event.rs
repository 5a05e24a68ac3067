use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Login,
    Logout,
    PageView,
    VideoPlay,
    VideoComplete,
    QuizStart,
    QuizSubmit,
    AssignmentSubmit,
    ForumPost,
    ForumReply,
    ResourceDownload,
    ContentInteraction,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Login => "login",
            EventType::Logout => "logout",
            EventType::PageView => "page_view",
            EventType::VideoPlay => "video_play",
            EventType::VideoComplete => "video_complete",
            EventType::QuizStart => "quiz_start",
            EventType::QuizSubmit => "quiz_submit",
            EventType::AssignmentSubmit => "assignment_submit",
            EventType::ForumPost => "forum_post",
            EventType::ForumReply => "forum_reply",
            EventType::ResourceDownload => "resource_download",
            EventType::ContentInteraction => "content_interaction",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event sent by the LMS frontend.
///
/// Either `student_id` (an EduMind id, used as is) or `lms_user_id` (mapped to
/// an EduMind id) identifies the student.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    /// Must carry an offset, naive timestamps are rejected
    pub event_timestamp: DateTime<FixedOffset>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub event_data: Map<String, Value>,
    #[serde(default)]
    pub student_id: Option<String>,
    #[serde(default)]
    pub lms_user_id: Option<i64>,
}

/// Body POSTed to the engagement tracker's ingest endpoint
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForwardedEventPayload {
    pub student_id: String,
    pub event_type: EventType,
    pub event_timestamp: DateTime<FixedOffset>,
    pub session_id: Option<String>,
    pub event_data: Map<String, Value>,
    pub source_service: String,
}

impl ForwardedEventPayload {
    pub fn new(student_id: &str, event: &Event, source_service: &str) -> Self {
        Self {
            student_id: student_id.to_string(),
            event_type: event.event_type,
            event_timestamp: event.event_timestamp,
            session_id: event.session_id.clone(),
            event_data: event.event_data.clone(),
            source_service: source_service.to_string(),
        }
    }
}
