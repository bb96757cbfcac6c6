use std::sync::Arc;

use clap::Subcommand;
use studybuilder_core::{Config, EnrollmentType, HttpStudyApi, StudyApi, StudyEditor};

use super::block_on;

#[derive(Subcommand)]
pub enum StudyAction {
    /// Show a study record
    Show {
        /// Study identifier
        id: String,
    },
    /// Set how participants enroll (ID or PHONE)
    Enrollment {
        /// Study identifier
        id: String,
        /// Enrollment type
        enrollment_type: String,
    },
}

pub fn run(action: StudyAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let api = Arc::new(HttpStudyApi::new(&config.api)?);
    match action {
        StudyAction::Show { id } => {
            let study = block_on(api.get_study(&id))?;
            println!("{}", serde_json::to_string_pretty(&study)?);
        }
        StudyAction::Enrollment {
            id,
            enrollment_type,
        } => {
            let enrollment_type: EnrollmentType = enrollment_type.parse()?;
            let editor = StudyEditor::new(api);
            let study = block_on(async {
                editor.load(&id).await?;
                editor.set_enrollment_type(enrollment_type).await
            })?;
            println!("enrollment type of {} set to {enrollment_type}", study.identifier);
        }
    }
    Ok(())
}
