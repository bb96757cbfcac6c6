use std::sync::Arc;

use clap::Subcommand;
use studybuilder_core::{
    Config, Duration, HttpStudyApi, StartDateType, StudyApi, StudyEditor, StudySession, TimeUnit,
};

use super::block_on;

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Show a study's schedule as JSON
    Show {
        /// Study identifier
        study: String,
    },
    /// List a study's sessions in order
    Sessions {
        /// Study identifier
        study: String,
    },
    /// Set when a session starts
    Start {
        /// Study identifier
        study: String,
        /// Session id
        session: String,
        /// DAY1 or NDAYS_DAY1
        start_type: String,
        /// Offset after day 1; a bare number uses the configured unit
        #[arg(long)]
        offset: Option<String>,
    },
}

/// Accept `"3"` as shorthand for three of the default unit.
fn parse_offset(raw: &str, default_unit: TimeUnit) -> Result<Duration, Box<dyn std::error::Error>> {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(Duration::parse(&format!("{raw}{}", default_unit.code()))?);
    }
    Ok(Duration::parse(raw)?)
}

fn describe_start(session: &StudySession) -> String {
    match session.start_date.effective_offset() {
        Some(offset) => format!("{}+{}", StartDateType::NDaysDay1.as_str(), offset),
        None => StartDateType::Day1.as_str().to_string(),
    }
}

pub fn run(action: ScheduleAction, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let api = Arc::new(HttpStudyApi::new(&config.api)?);
    match action {
        ScheduleAction::Show { study } => {
            let schedule = block_on(api.get_schedule(&study))?;
            println!("{}", serde_json::to_string_pretty(&schedule)?);
        }
        ScheduleAction::Sessions { study } => {
            let sessions = block_on(api.get_sessions(&study))?;
            if sessions.is_empty() {
                println!("no sessions");
            }
            for session in &sessions {
                let duration = session
                    .duration
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| "-".into());
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    session.order,
                    session.id,
                    session.name,
                    describe_start(session),
                    duration
                );
            }
        }
        ScheduleAction::Start {
            study,
            session,
            start_type,
            offset,
        } => {
            let start_type: StartDateType = start_type.parse()?;
            let offset = offset
                .map(|raw| parse_offset(&raw, config.scheduling.default_offset_unit))
                .transpose()?;

            let editor = StudyEditor::new(api);
            let updated = block_on(async {
                editor.load(&study).await?;
                let mut changed = editor.set_start_type(&session, start_type)?;
                if let Some(offset) = offset {
                    changed |= editor.set_start_offset(&session, offset)?;
                }
                if changed {
                    editor.save().await?;
                }
                editor.sessions()
            })?;

            if let Some(found) = updated.iter().find(|s| s.id == session) {
                println!("{}: {}", found.id, describe_start(found));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_offset_uses_default_unit() {
        assert_eq!(parse_offset("3", TimeUnit::Week).unwrap(), Duration::weeks(3));
        assert_eq!(parse_offset("36H", TimeUnit::Week).unwrap(), Duration::hours(36));
        assert!(parse_offset("3X", TimeUnit::Day).is_err());
    }

    #[test]
    fn start_description() {
        let session = StudySession::with_id("a", "S1", "A");
        assert_eq!(describe_start(&session), "DAY1");
        let later = session.with_start_date(studybuilder_core::StartDate::after_day1(Duration::days(4)));
        assert_eq!(describe_start(&later), "NDAYS_DAY1+4D");
    }
}
