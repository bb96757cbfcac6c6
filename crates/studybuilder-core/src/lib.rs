//! # Study Builder Core Library
//!
//! Scheduling core of the study builder: the timing model of a study's
//! sessions, the shared editor state that views read and dispatch into, and
//! the request controller that keeps late responses out of that state. The
//! `studybuilder` CLI is a thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Schedule**: canonical `"<n><unit>"` duration tokens, session start
//!   policies (Day 1 or N days after Day 1) and positional session lists
//! - **Context**: a reducer store owned by a provider; handles dispatch
//!   `SET_ALL`, `SET_STUDY` and `SET_SCHEDULE`
//! - **Request**: generation-checked async controller with teardown
//! - **Remote**: the study service behind the [`StudyApi`] trait, with an
//!   HTTP adapter and an in-memory one
//! - **Storage**: TOML configuration
//!
//! ## Key Components
//!
//! - [`Duration`]: Duration token value
//! - [`StartDate`]: Session start policy
//! - [`StudyInfoProvider`]: Owner of the shared study/schedule state
//! - [`AsyncController`]: Request lifecycle state machine
//! - [`StudyEditor`]: Load, edit and save one study

pub mod schedule;
pub mod study;
pub mod request;
pub mod context;
pub mod remote;
pub mod editor;
pub mod launch;
pub mod storage;
pub mod error;

pub use schedule::{Duration, Schedule, StartDate, StartDateType, StudySession, TimeUnit};
pub use study::{EnrollmentType, Study, StudyOptions, StudyStatus};
pub use request::{AsyncController, AsyncState, RequestStatus, RunOutcome, Subscription};
pub use context::{Action, RawAction, StudyInfoContext, StudyInfoData, StudyInfoProvider};
pub use remote::{HttpStudyApi, InMemoryStudyApi, StudyApi};
pub use editor::StudyEditor;
pub use launch::{LaunchChecklist, LaunchStep, LaunchStepKind};
pub use storage::{ApiConfig, Config, SchedulingConfig};
pub use error::{ConfigError, ContextError, CoreError, DurationError, RemoteError, ValidationError};
