//! Launch requirements a study goes through before it goes live.
//!
//! The checklist is a cursor over a fixed list of steps. Advancing marks
//! the current step complete; once every step is complete the study can be
//! launched.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::study::{Study, StudyStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchStepKind {
    StudyPayment,
    ReviewAlerts,
    IrbDetails,
    StudyLive,
}

impl LaunchStepKind {
    pub fn label(self) -> &'static str {
        match self {
            LaunchStepKind::StudyPayment => "Study payment",
            LaunchStepKind::ReviewAlerts => "Review Alerts",
            LaunchStepKind::IrbDetails => "IRB Details",
            LaunchStepKind::StudyLive => "Study is live",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchStep {
    pub kind: LaunchStepKind,
    pub complete: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchChecklist {
    steps: Vec<LaunchStep>,
    /// Equal to `steps.len()` once past the last step.
    active: usize,
}

impl LaunchChecklist {
    pub fn new() -> Self {
        let steps = [
            LaunchStepKind::StudyPayment,
            LaunchStepKind::ReviewAlerts,
            LaunchStepKind::IrbDetails,
            LaunchStepKind::StudyLive,
        ]
        .into_iter()
        .map(|kind| LaunchStep {
            kind,
            complete: false,
        })
        .collect();
        Self { steps, active: 0 }
    }

    pub fn steps(&self) -> &[LaunchStep] {
        &self.steps
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    /// `None` once every step has been passed.
    pub fn active_step(&self) -> Option<&LaunchStep> {
        self.steps.get(self.active)
    }

    pub fn is_finished(&self) -> bool {
        self.active >= self.steps.len()
    }

    /// Complete the active step and move on. Returns false when already
    /// finished.
    pub fn next(&mut self) -> bool {
        match self.steps.get_mut(self.active) {
            Some(step) => {
                step.complete = true;
                self.active += 1;
                true
            }
            None => false,
        }
    }

    pub fn back(&mut self) -> bool {
        if self.active == 0 {
            return false;
        }
        self.active -= 1;
        true
    }

    /// # Errors
    ///
    /// [`ValidationError::InvalidStep`] if `index` is not a step.
    pub fn jump(&mut self, index: usize) -> Result<(), ValidationError> {
        if index >= self.steps.len() {
            return Err(ValidationError::InvalidStep {
                index,
                len: self.steps.len(),
            });
        }
        self.active = index;
        Ok(())
    }

    /// Back to the first step; completed steps stay complete.
    pub fn reset(&mut self) {
        self.active = 0;
    }

    pub fn pending(&self) -> Vec<&'static str> {
        self.steps
            .iter()
            .filter(|s| !s.complete)
            .map(|s| s.kind.label())
            .collect()
    }

    /// The study, marked active.
    ///
    /// # Errors
    ///
    /// [`ValidationError::IncompleteLaunch`] while any step is incomplete.
    pub fn launch(&self, study: &Study) -> Result<Study, ValidationError> {
        let pending = self.pending();
        if !pending.is_empty() {
            return Err(ValidationError::IncompleteLaunch {
                pending: pending.into_iter().map(String::from).collect(),
            });
        }
        Ok(Study {
            status: StudyStatus::Active,
            ..study.clone()
        })
    }
}

impl Default for LaunchChecklist {
    fn default() -> Self {
        Self::new()
    }
}
