//! Remote study/schedule service.
//!
//! Every write has full-replace semantics scoped to its key: posting a
//! schedule or a session list for a study deletes whatever was stored for
//! that study and is absent from the posted body.

pub mod http;
pub mod memory;

pub use http::HttpStudyApi;
pub use memory::InMemoryStudyApi;

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::schedule::{Schedule, StudySession};
use crate::study::Study;

/// Async contract of the backing service.
#[async_trait]
pub trait StudyApi: Send + Sync {
    async fn get_study(&self, id: &str) -> Result<Study, RemoteError>;

    /// Replace the study record.
    async fn save_study(&self, id: &str, study: &Study) -> Result<Study, RemoteError>;

    async fn get_schedule(&self, study_id: &str) -> Result<Schedule, RemoteError>;

    /// Replace the schedule of `study_id`.
    async fn save_schedule(&self, study_id: &str, schedule: &Schedule)
        -> Result<Schedule, RemoteError>;

    /// Sessions of `study_id`, `order` set positionally.
    async fn get_sessions(&self, study_id: &str) -> Result<Vec<StudySession>, RemoteError>;

    /// Replace every session of `study_id`.
    async fn save_sessions(
        &self,
        study_id: &str,
        sessions: &[StudySession],
    ) -> Result<(), RemoteError>;
}
