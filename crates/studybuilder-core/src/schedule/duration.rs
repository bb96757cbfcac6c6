//! Durations expressed as a count of hours, days, weeks or months.
//!
//! A duration travels as a compact token: the count followed by a one-letter
//! unit code, e.g. `"3D"` or `"12H"`. Tokens are canonical (uppercase code,
//! no sign, no leading zeros), so formatting a parsed token always yields the
//! original text.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DurationError;

const HOURS_PER_DAY: u64 = 24;
const HOURS_PER_WEEK: u64 = 7 * HOURS_PER_DAY;
/// Months are treated as 30 days for arithmetic.
const HOURS_PER_MONTH: u64 = 30 * HOURS_PER_DAY;

/// HDWM unit set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TimeUnit {
    Hour,
    Day,
    Week,
    Month,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 4] = [TimeUnit::Hour, TimeUnit::Day, TimeUnit::Week, TimeUnit::Month];

    /// One-letter code used in duration tokens.
    pub fn code(self) -> char {
        match self {
            TimeUnit::Hour => 'H',
            TimeUnit::Day => 'D',
            TimeUnit::Week => 'W',
            TimeUnit::Month => 'M',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'H' => Some(TimeUnit::Hour),
            'D' => Some(TimeUnit::Day),
            'W' => Some(TimeUnit::Week),
            'M' => Some(TimeUnit::Month),
            _ => None,
        }
    }

    fn hours(self) -> u64 {
        match self {
            TimeUnit::Hour => 1,
            TimeUnit::Day => HOURS_PER_DAY,
            TimeUnit::Week => HOURS_PER_WEEK,
            TimeUnit::Month => HOURS_PER_MONTH,
        }
    }
}

impl FromStr for TimeUnit {
    type Err = DurationError;

    /// Accepts the one-letter code (`"D"`) or the full name (`"day"`, `"DAY"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if let Some(unit) = TimeUnit::from_code(c.to_ascii_uppercase()) {
                return Ok(unit);
            }
        }
        match s.to_ascii_lowercase().as_str() {
            "hour" | "hours" => Ok(TimeUnit::Hour),
            "day" | "days" => Ok(TimeUnit::Day),
            "week" | "weeks" => Ok(TimeUnit::Week),
            "month" | "months" => Ok(TimeUnit::Month),
            _ => Err(DurationError::UnknownUnit { code: s.to_string() }),
        }
    }
}

/// A non-negative span of time in one of the HDWM units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Duration {
    pub count: u32,
    pub unit: TimeUnit,
}

impl Duration {
    pub fn new(count: u32, unit: TimeUnit) -> Self {
        Self { count, unit }
    }

    pub fn hours(count: u32) -> Self {
        Self::new(count, TimeUnit::Hour)
    }

    pub fn days(count: u32) -> Self {
        Self::new(count, TimeUnit::Day)
    }

    pub fn weeks(count: u32) -> Self {
        Self::new(count, TimeUnit::Week)
    }

    pub fn months(count: u32) -> Self {
        Self::new(count, TimeUnit::Month)
    }

    /// Zero-length duration in the given unit.
    pub fn zero(unit: TimeUnit) -> Self {
        Self::new(0, unit)
    }

    pub fn is_zero(&self) -> bool {
        self.count == 0
    }

    /// Parse a canonical `<count><unit>` token.
    ///
    /// # Errors
    ///
    /// Returns [`DurationError`] when the token is empty, carries an unknown
    /// unit code, has a non-canonical count (sign, whitespace, leading zeros)
    /// or a count that does not fit in `u32`.
    pub fn parse(token: &str) -> Result<Self, DurationError> {
        let last = token.chars().last().ok_or(DurationError::Empty)?;
        let (digits, code) = token.split_at(token.len() - last.len_utf8());

        let unit = match TimeUnit::from_code(last) {
            Some(unit) => unit,
            None if last.is_ascii_digit() => {
                return Err(DurationError::Malformed { token: token.to_string() })
            }
            None => return Err(DurationError::UnknownUnit { code: code.to_string() }),
        };

        let canonical = !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
            && (digits == "0" || !digits.starts_with('0'));
        if !canonical {
            return Err(DurationError::Malformed { token: token.to_string() });
        }

        let count = digits
            .parse::<u32>()
            .map_err(|_| DurationError::Overflow { token: token.to_string() })?;
        Ok(Self { count, unit })
    }

    /// Render the canonical token. Inverse of [`Duration::parse`].
    pub fn format(&self) -> String {
        self.to_string()
    }

    /// Express this duration in another unit.
    ///
    /// Non-integral results are truncated toward zero (`36H` is `1D`, the
    /// remaining 12 hours are dropped). Results larger than `u32::MAX`
    /// saturate.
    pub fn convert(&self, target: TimeUnit) -> Duration {
        let total_hours = u64::from(self.count) * self.unit.hours();
        let count = total_hours / target.hours();
        Duration::new(u32::try_from(count).unwrap_or(u32::MAX), target)
    }

    /// Total length in hours.
    pub fn total_hours(&self) -> u64 {
        u64::from(self.count) * self.unit.hours()
    }

    /// Equivalent chrono duration (months as 30 days). `None` when the span
    /// is beyond what chrono can represent.
    pub fn to_chrono(&self) -> Option<chrono::Duration> {
        let hours = i64::try_from(self.total_hours()).ok()?;
        chrono::Duration::try_hours(hours)
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.count, self.unit.code())
    }
}

impl FromStr for Duration {
    type Err = DurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Duration::parse(s)
    }
}

impl TryFrom<String> for Duration {
    type Error = DurationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Duration::parse(&value)
    }
}

impl From<Duration> for String {
    fn from(value: Duration) -> Self {
        value.to_string()
    }
}
