//! A scheduled session of a study.

use serde::{Deserialize, Serialize};

use super::duration::Duration;
use super::start_date::StartDate;

/// One session of a study's schedule.
///
/// `order` is derived from the session's position whenever sessions are
/// listed. It is never serialized, and an `order` field arriving from the
/// wire is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    pub study_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub start_date: StartDate,
    /// Session length or repeat interval.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
    #[serde(skip)]
    pub order: usize,
}

impl StudySession {
    /// New session starting on day 1 with a generated id.
    pub fn new(study_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_id(uuid::Uuid::new_v4().to_string(), study_id, name)
    }

    pub fn with_id(
        id: impl Into<String>,
        study_id: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            study_id: study_id.into(),
            name: name.into(),
            start_date: StartDate::default(),
            duration: None,
            order: 0,
        }
    }

    #[must_use]
    pub fn with_start_date(mut self, start_date: StartDate) -> Self {
        self.start_date = start_date;
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }
}
