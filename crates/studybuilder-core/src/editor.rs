//! Editor session for one study.
//!
//! Loads a study with its schedule into the shared context, applies edits
//! through dispatched actions and writes the schedule back on save. Remote
//! calls go through request controllers so that a reload or a closed editor
//! never lets an old response land in the context.

use std::sync::Arc;

use crate::context::{Action, StudyInfoContext, StudyInfoData, StudyInfoProvider};
use crate::error::{CoreError, RemoteError, Result, ValidationError};
use crate::remote::StudyApi;
use crate::request::{AsyncController, RunOutcome};
use crate::schedule::{Duration, Schedule, StartDateType, StudySession};
use crate::study::{EnrollmentType, Study};

async fn fetch_all<A>(api: &A, study_id: &str) -> std::result::Result<StudyInfoData, RemoteError>
where
    A: StudyApi + ?Sized,
{
    let study = api.get_study(study_id).await?;
    let schedule = api.get_schedule(study_id).await?;
    let sessions = api.get_sessions(study_id).await?;
    let schedule = schedule.replace_sessions(study_id, sessions);
    Ok(StudyInfoData::new(study, Some(schedule)))
}

pub struct StudyEditor<A: ?Sized> {
    api: Arc<A>,
    provider: StudyInfoProvider,
    loader: AsyncController<StudyInfoData>,
    saver: AsyncController<Schedule>,
}

impl<A> StudyEditor<A>
where
    A: StudyApi + ?Sized + 'static,
{
    pub fn new(api: Arc<A>) -> Self {
        Self {
            api,
            provider: StudyInfoProvider::new(),
            loader: AsyncController::new(),
            saver: AsyncController::new(),
        }
    }

    /// Handle for views that read or edit the shared state.
    pub fn context(&self) -> StudyInfoContext {
        self.provider.context()
    }

    pub fn state(&self) -> Arc<StudyInfoData> {
        self.provider.state()
    }

    pub fn loader(&self) -> &AsyncController<StudyInfoData> {
        &self.loader
    }

    pub fn saver(&self) -> &AsyncController<Schedule> {
        &self.saver
    }

    fn study(&self) -> Result<Study> {
        self.state()
            .study
            .clone()
            .ok_or_else(|| ValidationError::NotLoaded.into())
    }

    fn schedule(&self) -> Result<Schedule> {
        self.state()
            .schedule
            .clone()
            .ok_or_else(|| ValidationError::NotLoaded.into())
    }

    /// Fetch study, schedule and sessions, then publish them with `SET_ALL`.
    ///
    /// A load that is overtaken by a newer load, or that settles after the
    /// editor was closed, returns its discard outcome and changes nothing.
    ///
    /// # Errors
    ///
    /// Returns the remote error when the fetch is rejected, and
    /// [`ValidationError::StudyMismatch`] when the service answers with a
    /// schedule of another study. Nothing is published in either case.
    pub async fn load(&self, study_id: &str) -> Result<RunOutcome> {
        let api = Arc::clone(&self.api);
        let id = study_id.to_string();
        let outcome = self
            .loader
            .run(move || async move { fetch_all(api.as_ref(), &id).await })
            .await;

        match outcome {
            RunOutcome::Resolved => {
                if let Some(StudyInfoData {
                    study: Some(study),
                    schedule,
                }) = self.loader.data()
                {
                    if let Some(found) = schedule.as_ref().map(|s| &s.study_id) {
                        if found != study_id {
                            tracing::warn!(study_id, %found, "schedule of another study");
                            return Err(ValidationError::StudyMismatch {
                                expected: study_id.to_string(),
                                found: found.clone(),
                            }
                            .into());
                        }
                    }
                    let sessions = schedule.as_ref().map_or(0, |s| s.sessions.len());
                    self.provider.dispatch(Action::SetAll { study, schedule });
                    tracing::info!(study_id, sessions, "study loaded");
                }
                Ok(outcome)
            }
            RunOutcome::Rejected => Err(self.rejection(self.loader.error(), study_id)),
            RunOutcome::Superseded | RunOutcome::Abandoned => Ok(outcome),
        }
    }

    fn rejection(&self, error: Option<RemoteError>, study_id: &str) -> CoreError {
        let error = error.unwrap_or(RemoteError::Offline);
        tracing::warn!(study_id, %error, "remote call failed");
        error.into()
    }

    /// Sessions of the loaded study in positional order.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotLoaded`] before a successful load.
    pub fn sessions(&self) -> Result<Vec<StudySession>> {
        Ok(self.schedule()?.own_sessions())
    }

    /// Whether the enrollment selector has to be answered first.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotLoaded`] before a successful load.
    pub fn needs_enrollment_type(&self) -> Result<bool> {
        Ok(self.study()?.needs_enrollment_type())
    }

    fn update_session<F>(&self, session_id: &str, f: F) -> Result<bool>
    where
        F: FnOnce(&StudySession) -> StudySession,
    {
        let schedule = self.schedule()?;
        let updated = schedule.update_session(session_id, f)?;
        if updated == schedule {
            return Ok(false);
        }
        self.provider.dispatch(Action::SetSchedule(Some(updated)));
        Ok(true)
    }

    /// Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotLoaded`] or [`ValidationError::UnknownSession`].
    pub fn set_start_type(&self, session_id: &str, start_type: StartDateType) -> Result<bool> {
        self.update_session(session_id, |s| StudySession {
            start_date: s.start_date.set_type(start_type),
            ..s.clone()
        })
    }

    /// Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotLoaded`] or [`ValidationError::UnknownSession`].
    pub fn set_start_offset(&self, session_id: &str, offset: Duration) -> Result<bool> {
        self.update_session(session_id, |s| StudySession {
            start_date: s.start_date.set_offset(offset),
            ..s.clone()
        })
    }

    /// Returns whether anything changed.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotLoaded`] or [`ValidationError::UnknownSession`].
    pub fn set_session_duration(&self, session_id: &str, duration: Duration) -> Result<bool> {
        self.update_session(session_id, |s| s.clone().with_duration(duration))
    }

    /// Replace the study's sessions locally and return the new listing.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotLoaded`] before a successful load.
    pub fn replace_sessions(&self, sessions: Vec<StudySession>) -> Result<Vec<StudySession>> {
        let schedule = self.schedule()?;
        let study_id = schedule.study_id.clone();
        let updated = schedule.replace_sessions(&study_id, sessions);
        let listed = updated.own_sessions();
        self.provider.dispatch(Action::SetSchedule(Some(updated)));
        Ok(listed)
    }

    /// Merge the enrollment type into the study, publish it and save it.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotLoaded`], or the remote error of the save. The
    /// local change stays in place when the save fails.
    pub async fn set_enrollment_type(&self, enrollment_type: EnrollmentType) -> Result<Study> {
        let updated = self.study()?.set_enrollment_type(enrollment_type);
        self.provider.dispatch(Action::SetStudy(updated.clone()));

        let saved = self
            .api
            .save_study(&updated.identifier, &updated)
            .await
            .map_err(|e| self.rejection(Some(e), &updated.identifier))?;
        if saved != updated {
            self.provider.dispatch(Action::SetStudy(saved.clone()));
        }
        tracing::info!(study_id = %saved.identifier, ?enrollment_type, "enrollment type saved");
        Ok(saved)
    }

    /// Write the schedule and its sessions back to the service.
    ///
    /// On success the confirmed schedule is published with `SET_SCHEDULE`
    /// and the loader is seeded with the new state, so no re-fetch is needed.
    /// Edits dispatched while the save was in flight win: the confirmed
    /// schedule is only published if the context still holds what was sent.
    ///
    /// # Errors
    ///
    /// [`ValidationError::NotLoaded`], or the remote error of the save.
    pub async fn save(&self) -> Result<RunOutcome> {
        let schedule = self.schedule()?;
        let posted = schedule.clone();
        let study_id = schedule.study_id.clone();
        let api = Arc::clone(&self.api);
        let id = study_id.clone();

        let outcome = self
            .saver
            .run(move || async move {
                let sessions = schedule.own_sessions();
                let saved = api.save_schedule(&id, &schedule).await?;
                api.save_sessions(&id, &sessions).await?;
                Ok::<_, RemoteError>(saved.replace_sessions(&id, sessions))
            })
            .await;

        match outcome {
            RunOutcome::Resolved => {
                let Some(confirmed) = self.saver.data() else {
                    return Ok(outcome);
                };
                let sessions = confirmed.sessions.len();
                if self.state().schedule.as_ref() != Some(&posted) {
                    tracing::info!(
                        study_id = %study_id,
                        sessions,
                        "schedule saved, newer local edits kept"
                    );
                    return Ok(outcome);
                }
                let state = self.provider.dispatch(Action::SetSchedule(Some(confirmed)));
                self.loader.set_data(StudyInfoData::clone(&state));
                tracing::info!(study_id = %study_id, sessions, "schedule saved");
                Ok(outcome)
            }
            RunOutcome::Rejected => Err(self.rejection(self.saver.error(), &study_id)),
            RunOutcome::Superseded | RunOutcome::Abandoned => Ok(outcome),
        }
    }
}

impl<A: ?Sized> Drop for StudyEditor<A> {
    fn drop(&mut self) {
        self.loader.teardown();
        self.saver.teardown();
    }
}
