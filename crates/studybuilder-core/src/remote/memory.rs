//! In-process stand-in for the study service.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use super::StudyApi;
use crate::error::RemoteError;
use crate::schedule::{self, Schedule, StudySession};
use crate::study::Study;

#[derive(Debug, Default)]
struct Tables {
    studies: Vec<Study>,
    schedules: Vec<Schedule>,
    sessions: Vec<StudySession>,
}

/// Study service backed by in-memory tables.
#[derive(Debug, Default)]
pub struct InMemoryStudyApi {
    tables: Mutex<Tables>,
    offline: AtomicBool,
}

impl InMemoryStudyApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed with studies.
    pub fn with_studies(studies: impl IntoIterator<Item = Study>) -> Self {
        let api = Self::new();
        api.tables().studies.extend(studies);
        api
    }

    /// While offline every call fails with [`RemoteError::Offline`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_online(&self) -> Result<(), RemoteError> {
        if self.offline.load(Ordering::SeqCst) {
            Err(RemoteError::Offline)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl StudyApi for InMemoryStudyApi {
    async fn get_study(&self, id: &str) -> Result<Study, RemoteError> {
        self.ensure_online()?;
        self.tables()
            .studies
            .iter()
            .find(|s| s.identifier == id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound {
                resource: "study".into(),
                id: id.to_string(),
            })
    }

    async fn save_study(&self, id: &str, study: &Study) -> Result<Study, RemoteError> {
        self.ensure_online()?;
        let mut tables = self.tables();
        match tables.studies.iter_mut().find(|s| s.identifier == id) {
            Some(existing) => *existing = study.clone(),
            None => tables.studies.push(study.clone()),
        }
        Ok(study.clone())
    }

    async fn get_schedule(&self, study_id: &str) -> Result<Schedule, RemoteError> {
        self.ensure_online()?;
        let mut tables = self.tables();
        if let Some(found) = tables.schedules.iter().find(|s| s.study_id == study_id) {
            return Ok(found.clone());
        }
        let created = Schedule::empty(study_id);
        tables.schedules.push(created.clone());
        Ok(created)
    }

    async fn save_schedule(
        &self,
        study_id: &str,
        schedule: &Schedule,
    ) -> Result<Schedule, RemoteError> {
        self.ensure_online()?;
        let stored = Schedule {
            study_id: study_id.to_string(),
            ..schedule.clone()
        };
        let mut tables = self.tables();
        tables.schedules.retain(|s| s.study_id != study_id);
        tables.schedules.push(stored.clone());
        Ok(stored)
    }

    async fn get_sessions(&self, study_id: &str) -> Result<Vec<StudySession>, RemoteError> {
        self.ensure_online()?;
        Ok(schedule::list_sessions(&self.tables().sessions, study_id))
    }

    async fn save_sessions(
        &self,
        study_id: &str,
        sessions: &[StudySession],
    ) -> Result<(), RemoteError> {
        self.ensure_online()?;
        let mut tables = self.tables();
        let replaced = schedule::replace_sessions(&tables.sessions, study_id, sessions.to_vec());
        tables.sessions = replaced;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_study_is_not_found() {
        let api = InMemoryStudyApi::new();
        let err = api.get_study("nope").await.unwrap_err();
        assert_eq!(
            err,
            RemoteError::NotFound { resource: "study".into(), id: "nope".into() }
        );
    }

    #[tokio::test]
    async fn save_study_replaces_or_appends() {
        let api = InMemoryStudyApi::with_studies([Study::new("S1", "One")]);
        let mut renamed = Study::new("S1", "Renamed");
        renamed.version = 2;
        api.save_study("S1", &renamed).await.unwrap();
        api.save_study("S2", &Study::new("S2", "Two")).await.unwrap();
        assert_eq!(api.get_study("S1").await.unwrap().name, "Renamed");
        assert_eq!(api.get_study("S2").await.unwrap().name, "Two");
    }

    #[tokio::test]
    async fn missing_schedule_is_created_empty() {
        let api = InMemoryStudyApi::new();
        let schedule = api.get_schedule("S1").await.unwrap();
        assert_eq!(schedule, Schedule::empty("S1"));
    }

    #[tokio::test]
    async fn save_schedule_forces_study_id() {
        let api = InMemoryStudyApi::new();
        let mut posted = Schedule::empty("wrong");
        posted.name = "Main".into();
        let stored = api.save_schedule("S1", &posted).await.unwrap();
        assert_eq!(stored.study_id, "S1");
        assert_eq!(api.get_schedule("S1").await.unwrap().name, "Main");
    }

    #[tokio::test]
    async fn save_sessions_deletes_absent_sessions() {
        let api = InMemoryStudyApi::new();
        let a = StudySession::with_id("a", "S1", "A");
        let b = StudySession::with_id("b", "S1", "B");
        let x = StudySession::with_id("x", "S2", "X");
        api.save_sessions("S1", &[a.clone(), b]).await.unwrap();
        api.save_sessions("S2", &[x.clone()]).await.unwrap();
        api.save_sessions("S1", &[a]).await.unwrap();

        let s1 = api.get_sessions("S1").await.unwrap();
        assert_eq!(s1.len(), 1);
        assert_eq!(s1[0].id, "a");
        assert_eq!(api.get_sessions("S2").await.unwrap(), vec![x]);
    }

    #[tokio::test]
    async fn offline_rejects_every_call() {
        let api = InMemoryStudyApi::with_studies([Study::new("S1", "One")]);
        api.set_offline(true);
        assert_eq!(api.get_study("S1").await.unwrap_err(), RemoteError::Offline);
        assert_eq!(api.save_sessions("S1", &[]).await.unwrap_err(), RemoteError::Offline);
        api.set_offline(false);
        assert!(api.get_study("S1").await.is_ok());
    }
}
