//! Study record as consumed by the scheduling core.

use serde::{Deserialize, Serialize};

use crate::schedule::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnrollmentType {
    Id,
    Phone,
}

impl std::fmt::Display for EnrollmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnrollmentType::Id => f.write_str("ID"),
            EnrollmentType::Phone => f.write_str("PHONE"),
        }
    }
}

impl std::str::FromStr for EnrollmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ID" => Ok(EnrollmentType::Id),
            "PHONE" => Ok(EnrollmentType::Phone),
            other => Err(format!("unknown enrollment type: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StudyStatus {
    #[default]
    Draft,
    Active,
    Completed,
}

/// Client options bag of a study. Keys this crate does not know about are
/// carried through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enrollment_type: Option<EnrollmentType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generate_ids: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Study {
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub status: StudyStatus,
    #[serde(default)]
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub study_duration: Option<Duration>,
    #[serde(default, rename = "clientData", alias = "options")]
    pub options: StudyOptions,
}

impl Study {
    pub fn new(identifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: name.into(),
            status: StudyStatus::Draft,
            version: 1,
            subtitle: None,
            description: None,
            study_duration: None,
            options: StudyOptions::default(),
        }
    }

    /// Copy of the study with the enrollment type merged into its options.
    /// Every other option key is preserved.
    #[must_use]
    pub fn set_enrollment_type(&self, enrollment_type: EnrollmentType) -> Study {
        Study {
            options: StudyOptions {
                enrollment_type: Some(enrollment_type),
                ..self.options.clone()
            },
            ..self.clone()
        }
    }

    /// Whether an enrollment type still has to be picked before the
    /// scheduling screens are usable.
    pub fn needs_enrollment_type(&self) -> bool {
        self.options.enrollment_type.is_none()
    }
}
