//! When a session's schedule begins relative to the study anchor event.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::duration::{Duration, TimeUnit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StartDateType {
    /// Begins on the study's day 1.
    #[serde(rename = "DAY1")]
    Day1,
    /// Begins a number of units after day 1.
    #[serde(rename = "NDAYS_DAY1")]
    NDaysDay1,
}

impl StartDateType {
    pub fn as_str(self) -> &'static str {
        match self {
            StartDateType::Day1 => "DAY1",
            StartDateType::NDaysDay1 => "NDAYS_DAY1",
        }
    }
}

impl std::str::FromStr for StartDateType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DAY1" => Ok(StartDateType::Day1),
            "NDAYS_DAY1" => Ok(StartDateType::NDaysDay1),
            other => Err(format!("unknown start date type: {other}")),
        }
    }
}

/// Start-date policy of a session.
///
/// The offset is kept even while the type is `DAY1` so that toggling the
/// type back restores what the user entered. All setters return a new value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartDate {
    #[serde(rename = "type")]
    pub start_type: StartDateType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<Duration>,
}

impl StartDate {
    pub fn day1() -> Self {
        Self {
            start_type: StartDateType::Day1,
            offset: None,
        }
    }

    pub fn after_day1(offset: Duration) -> Self {
        Self {
            start_type: StartDateType::NDaysDay1,
            offset: Some(offset),
        }
    }

    /// Switch the policy type. Same type returns the input unchanged; the
    /// offset always survives.
    #[must_use]
    pub fn set_type(&self, start_type: StartDateType) -> StartDate {
        if start_type == self.start_type {
            return self.clone();
        }
        StartDate {
            start_type,
            offset: self.offset,
        }
    }

    /// Replace the offset regardless of the current type.
    #[must_use]
    pub fn set_offset(&self, offset: Duration) -> StartDate {
        StartDate {
            start_type: self.start_type,
            offset: Some(offset),
        }
    }

    /// Offset that takes part in scheduling: `None` for `DAY1`, the stored
    /// offset (zero days when unset) for `NDAYS_DAY1`.
    pub fn effective_offset(&self) -> Option<Duration> {
        match self.start_type {
            StartDateType::Day1 => None,
            StartDateType::NDaysDay1 => {
                Some(self.offset.unwrap_or_else(|| Duration::zero(TimeUnit::Day)))
            }
        }
    }

    /// Concrete start instant for the given anchor event, or `None` if the
    /// offset lands outside the calendar range.
    pub fn resolve(&self, anchor: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self.effective_offset() {
            Some(offset) => anchor.checked_add_signed(offset.to_chrono()?),
            None => Some(anchor),
        }
    }
}

impl Default for StartDate {
    fn default() -> Self {
        Self::day1()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn set_type_to_same_type_is_noop() {
        let sd = StartDate::after_day1(Duration::days(3));
        assert_eq!(sd.set_type(StartDateType::NDaysDay1), sd);
    }

    #[test]
    fn toggling_type_preserves_offset() {
        let sd = StartDate::after_day1(Duration::weeks(2));
        let toggled = sd
            .set_type(StartDateType::Day1)
            .set_type(StartDateType::NDaysDay1);
        assert_eq!(toggled.offset, Some(Duration::weeks(2)));
        assert_eq!(toggled, sd);
    }

    #[test]
    fn set_offset_allowed_on_day1() {
        let sd = StartDate::day1().set_offset(Duration::days(5));
        assert_eq!(sd.start_type, StartDateType::Day1);
        assert_eq!(sd.offset, Some(Duration::days(5)));
        assert_eq!(sd.effective_offset(), None);
    }

    #[test]
    fn ndays_without_offset_defaults_to_zero() {
        let sd = StartDate::day1().set_type(StartDateType::NDaysDay1);
        assert_eq!(sd.effective_offset(), Some(Duration::days(0)));
    }

    #[test]
    fn resolve_adds_offset_to_anchor() {
        let anchor = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        assert_eq!(StartDate::day1().resolve(anchor), Some(anchor));
        let later = StartDate::after_day1(Duration::days(3)).resolve(anchor);
        assert_eq!(later, Some(Utc.with_ymd_and_hms(2026, 3, 4, 9, 0, 0).unwrap()));
        // offset retained but ignored for DAY1
        let ignored = StartDate::after_day1(Duration::days(3))
            .set_type(StartDateType::Day1)
            .resolve(anchor);
        assert_eq!(ignored, Some(anchor));
    }

    #[test]
    fn resolve_out_of_calendar_range_is_none() {
        let anchor = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        let far = StartDate::after_day1(Duration::parse("100000000D").unwrap());
        assert_eq!(far.resolve(anchor), None);
        let huge = StartDate::after_day1(Duration::parse("4294967295M").unwrap());
        assert_eq!(huge.resolve(anchor), None);
        // the offset is ignored for DAY1, so it still resolves
        assert_eq!(huge.set_type(StartDateType::Day1).resolve(anchor), Some(anchor));
    }

    #[test]
    fn serializes_with_wire_names() {
        let sd = StartDate::after_day1(Duration::days(2));
        let json = serde_json::to_value(&sd).unwrap();
        assert_eq!(json, serde_json::json!({"type": "NDAYS_DAY1", "offset": "2D"}));
        let day1: StartDate = serde_json::from_str(r#"{"type":"DAY1"}"#).unwrap();
        assert_eq!(day1, StartDate::day1());
    }
}
