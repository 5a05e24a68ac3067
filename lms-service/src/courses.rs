use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::Error;

pub const TITLE_MAX_LEN: usize = 200;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseCreate {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseList {
    pub courses: Vec<Course>,
    pub total: usize,
}

/// Course catalog kept in memory, ids start at 1
#[derive(Debug, Default)]
pub struct CourseCatalog {
    courses: RwLock<Vec<Course>>,
}

impl CourseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self, course: CourseCreate) -> Result<Course, Error> {
        if course.title.chars().count() > TITLE_MAX_LEN {
            return Err(Error::Server(
                StatusCode::UNPROCESSABLE_ENTITY,
                format!("title must be at most {TITLE_MAX_LEN} characters"),
            ));
        }

        let mut courses = self.courses.write().await;
        let id = courses.last().map_or(1, |c| c.id + 1);
        let course = Course {
            id,
            title: course.title,
            description: course.description,
            created_at: Utc::now(),
        };
        courses.push(course.clone());
        Ok(course)
    }

    pub async fn list(&self, skip: usize, limit: usize) -> CourseList {
        let courses = self.courses.read().await;
        CourseList {
            courses: courses.iter().skip(skip).take(limit).cloned().collect(),
            total: courses.len(),
        }
    }

    pub async fn get(&self, id: i64) -> Option<Course> {
        let courses = self.courses.read().await;
        courses.iter().find(|c| c.id == id).cloned()
    }
}
