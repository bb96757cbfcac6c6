use clap::Subcommand;
use studybuilder_core::{Duration, TimeUnit};

#[derive(Subcommand)]
pub enum DurationAction {
    /// Parse a duration token (e.g. "3D", "12H")
    Parse {
        /// Token: count followed by H, D, W or M
        token: String,
    },
    /// Convert a duration token to another unit, truncating the remainder
    Convert {
        /// Token to convert
        token: String,
        /// Target unit (H/D/W/M or hour/day/week/month)
        unit: String,
    },
}

pub fn run(action: DurationAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        DurationAction::Parse { token } => {
            let duration = Duration::parse(&token)?;
            let json = serde_json::json!({
                "token": duration.format(),
                "count": duration.count,
                "unit": duration.unit,
                "hours": duration.total_hours(),
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        DurationAction::Convert { token, unit } => {
            let duration = Duration::parse(&token)?;
            let unit: TimeUnit = unit.parse()?;
            println!("{}", duration.convert(unit));
        }
    }
    Ok(())
}
