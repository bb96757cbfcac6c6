//! Study schedule model.
//!
//! A [`Schedule`] holds the sessions of a study together with study-level
//! scheduling metadata. Session order is positional: [`list_sessions`]
//! recomputes it from array position on every read, and
//! [`replace_sessions`] swaps a study's sessions wholesale.

pub mod duration;
pub mod session;
pub mod start_date;

pub use duration::{Duration, TimeUnit};
pub use session::StudySession;
pub use start_date::{StartDate, StartDateType};

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Sessions of `study_id`, with `order` set to their position (0-based).
pub fn list_sessions(sessions: &[StudySession], study_id: &str) -> Vec<StudySession> {
    sessions
        .iter()
        .filter(|s| s.study_id == study_id)
        .enumerate()
        .map(|(index, s)| StudySession {
            order: index,
            ..s.clone()
        })
        .collect()
}

/// Drop every session of `study_id` and append `new_sessions` in their place.
///
/// Sessions of other studies keep their values and relative order. The new
/// sessions are stamped with `study_id`.
pub fn replace_sessions(
    sessions: &[StudySession],
    study_id: &str,
    new_sessions: Vec<StudySession>,
) -> Vec<StudySession> {
    sessions
        .iter()
        .filter(|s| s.study_id != study_id)
        .cloned()
        .chain(new_sessions.into_iter().map(|s| StudySession {
            study_id: study_id.to_string(),
            ..s
        }))
        .collect()
}

/// The schedule of one study.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub study_id: String,
    #[serde(default)]
    pub name: String,
    /// Overall length of participation, if set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Duration>,
    #[serde(default)]
    pub sessions: Vec<StudySession>,
}

impl Schedule {
    pub fn empty(study_id: impl Into<String>) -> Self {
        Self {
            study_id: study_id.into(),
            name: String::new(),
            duration: None,
            sessions: Vec::new(),
        }
    }

    pub fn list_sessions(&self, study_id: &str) -> Vec<StudySession> {
        list_sessions(&self.sessions, study_id)
    }

    /// Sessions of the schedule's own study, positionally ordered.
    pub fn own_sessions(&self) -> Vec<StudySession> {
        self.list_sessions(&self.study_id)
    }

    #[must_use]
    pub fn replace_sessions(&self, study_id: &str, new_sessions: Vec<StudySession>) -> Schedule {
        Schedule {
            sessions: replace_sessions(&self.sessions, study_id, new_sessions),
            ..self.clone()
        }
    }

    pub fn session(&self, id: &str) -> Option<&StudySession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Copy of the schedule with one session rewritten by `f`.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::UnknownSession`] if no session has `id`.
    pub fn update_session<F>(&self, id: &str, f: F) -> Result<Schedule, ValidationError>
    where
        F: FnOnce(&StudySession) -> StudySession,
    {
        let index = self
            .sessions
            .iter()
            .position(|s| s.id == id)
            .ok_or_else(|| ValidationError::UnknownSession { id: id.to_string() })?;
        let mut sessions = self.sessions.clone();
        sessions[index] = f(&self.sessions[index]);
        Ok(Schedule {
            sessions,
            ..self.clone()
        })
    }
}
