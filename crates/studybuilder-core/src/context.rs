//! Shared study/schedule state for an editor session.
//!
//! A [`StudyInfoProvider`] owns the state. Consumers get a
//! [`StudyInfoContext`] handle that can read the current value and dispatch
//! [`Action`]s; there is no other way to write. A handle whose provider has
//! been dropped fails with [`ContextError::OutsideProvider`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use serde::{Deserialize, Serialize};

use crate::error::ContextError;
use crate::request::Subscription;
use crate::schedule::Schedule;
use crate::study::Study;

/// Value shared by everything under the provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudyInfoData {
    #[serde(default)]
    pub study: Option<Study>,
    #[serde(default)]
    pub schedule: Option<Schedule>,
}

impl StudyInfoData {
    pub fn new(study: Study, schedule: Option<Schedule>) -> Self {
        Self {
            study: Some(study),
            schedule,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.study.is_none() && self.schedule.is_none()
    }
}

/// State transitions of the shared context.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Replace study and schedule together.
    SetAll {
        study: Study,
        schedule: Option<Schedule>,
    },
    SetStudy(Study),
    SetSchedule(Option<Schedule>),
}

impl Action {
    pub fn tag(&self) -> &'static str {
        match self {
            Action::SetAll { .. } => "SET_ALL",
            Action::SetStudy(_) => "SET_STUDY",
            Action::SetSchedule(_) => "SET_SCHEDULE",
        }
    }
}

/// Action as it travels over a string-tagged boundary: a tag plus a full
/// [`StudyInfoData`] payload, of which only the tag's fields are used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAction {
    #[serde(rename = "type")]
    pub tag: String,
    #[serde(default)]
    pub payload: StudyInfoData,
}

impl TryFrom<RawAction> for Action {
    type Error = ContextError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let RawAction { tag, payload } = raw;
        let StudyInfoData { study, schedule } = payload;
        let missing_study = || ContextError::MissingPayload {
            tag: tag.clone(),
            field: "study",
        };
        match tag.as_str() {
            "SET_ALL" => Ok(Action::SetAll {
                study: study.ok_or_else(missing_study)?,
                schedule,
            }),
            "SET_STUDY" => Ok(Action::SetStudy(study.ok_or_else(missing_study)?)),
            "SET_SCHEDULE" => Ok(Action::SetSchedule(schedule)),
            _ => Err(ContextError::UnknownAction { tag: tag.clone() }),
        }
    }
}

/// Pure reducer.
pub fn reduce(state: &StudyInfoData, action: Action) -> StudyInfoData {
    match action {
        Action::SetAll { study, schedule } => StudyInfoData {
            study: Some(study),
            schedule,
        },
        Action::SetStudy(study) => StudyInfoData {
            study: Some(study),
            schedule: state.schedule.clone(),
        },
        Action::SetSchedule(schedule) => StudyInfoData {
            study: state.study.clone(),
            schedule,
        },
    }
}

type Listener = Arc<dyn Fn(&Arc<StudyInfoData>) + Send + Sync>;

struct Store {
    state: Arc<StudyInfoData>,
    listeners: Vec<(u64, Listener)>,
    next_listener_id: u64,
}

fn lock(store: &Mutex<Store>) -> MutexGuard<'_, Store> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

fn dispatch_to(store: &Mutex<Store>, action: Action) -> Arc<StudyInfoData> {
    let mut guard = lock(store);
    tracing::debug!(action = action.tag(), "dispatch");
    let next = Arc::new(reduce(&guard.state, action));
    guard.state = Arc::clone(&next);
    let listeners: Vec<_> = guard.listeners.iter().map(|(_, l)| Arc::clone(l)).collect();
    drop(guard);
    for listener in listeners {
        listener(&next);
    }
    next
}

/// Owner of the shared state. Dropping it invalidates every context handle.
pub struct StudyInfoProvider {
    store: Arc<Mutex<Store>>,
}

impl StudyInfoProvider {
    pub fn new() -> Self {
        Self::with_state(StudyInfoData::default())
    }

    pub fn with_state(initial: StudyInfoData) -> Self {
        Self {
            store: Arc::new(Mutex::new(Store {
                state: Arc::new(initial),
                listeners: Vec::new(),
                next_listener_id: 0,
            })),
        }
    }

    /// Handle for consumers below this provider.
    pub fn context(&self) -> StudyInfoContext {
        StudyInfoContext {
            store: Arc::downgrade(&self.store),
        }
    }

    pub fn state(&self) -> Arc<StudyInfoData> {
        Arc::clone(&lock(&self.store).state)
    }

    pub fn dispatch(&self, action: Action) -> Arc<StudyInfoData> {
        dispatch_to(&self.store, action)
    }
}

impl Default for StudyInfoProvider {
    fn default() -> Self {
        Self::new()
    }
}

/// Consumer handle onto a provider's state.
#[derive(Clone)]
pub struct StudyInfoContext {
    store: Weak<Mutex<Store>>,
}

impl StudyInfoContext {
    /// A handle that was never attached to a provider.
    pub fn detached() -> Self {
        Self { store: Weak::new() }
    }

    fn store(&self) -> Result<Arc<Mutex<Store>>, ContextError> {
        self.store.upgrade().ok_or(ContextError::OutsideProvider)
    }

    /// Current state. A new `Arc` is installed on every dispatch, so
    /// `Arc::ptr_eq` tells whether anything was dispatched in between.
    ///
    /// # Errors
    ///
    /// [`ContextError::OutsideProvider`] if the provider is gone.
    pub fn state(&self) -> Result<Arc<StudyInfoData>, ContextError> {
        let store = self.store()?;
        let state = Arc::clone(&lock(&store).state);
        Ok(state)
    }

    /// # Errors
    ///
    /// [`ContextError::OutsideProvider`] if the provider is gone.
    pub fn dispatch(&self, action: Action) -> Result<Arc<StudyInfoData>, ContextError> {
        let store = self.store()?;
        Ok(dispatch_to(&store, action))
    }

    /// Dispatch a string-tagged action.
    ///
    /// # Errors
    ///
    /// [`ContextError::UnknownAction`] for a tag that names no action,
    /// [`ContextError::OutsideProvider`] if the provider is gone.
    pub fn dispatch_raw(&self, raw: RawAction) -> Result<Arc<StudyInfoData>, ContextError> {
        let action = Action::try_from(raw)?;
        self.dispatch(action)
    }

    /// Call `listener` after every dispatch.
    ///
    /// # Errors
    ///
    /// [`ContextError::OutsideProvider`] if the provider is gone.
    pub fn subscribe<F>(&self, listener: F) -> Result<Subscription, ContextError>
    where
        F: Fn(&Arc<StudyInfoData>) + Send + Sync + 'static,
    {
        let store = self.store()?;
        let id = {
            let mut guard = lock(&store);
            let id = guard.next_listener_id;
            guard.next_listener_id += 1;
            guard.listeners.push((id, Arc::new(listener)));
            id
        };
        let weak = Arc::downgrade(&store);
        Ok(Subscription::new(move || {
            if let Some(store) = weak.upgrade() {
                lock(&store).listeners.retain(|(lid, _)| *lid != id);
            }
        }))
    }
}

impl std::fmt::Debug for StudyInfoContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StudyInfoContext")
            .field("attached", &(self.store.strong_count() > 0))
            .finish()
    }
}
