//! Scheduled-day and time-slot evaluation.
//!
//! The window check is deliberately fail-open: missing schedule data or an
//! endpoint that does not parse never blocks a check-in. Blocking only
//! happens on a definite mismatch (wrong weekday, or a slot that parsed and
//! excludes the current time).

use chrono::{DateTime, Datelike, Local, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Days a course session can be scheduled on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; 5] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Monday" => Ok(Day::Monday),
            "Tuesday" => Ok(Day::Tuesday),
            "Wednesday" => Ok(Day::Wednesday),
            "Thursday" => Ok(Day::Thursday),
            "Friday" => Ok(Day::Friday),
            other => Err(format!("invalid day: {other}")),
        }
    }
}

/// Full-week weekday name for an instant. Sessions only use Monday-Friday,
/// but "now" can fall on a weekend, which must compare as closed.
fn weekday_name(now: DateTime<Local>) -> &'static str {
    match now.weekday() {
        chrono::Weekday::Mon => "Monday",
        chrono::Weekday::Tue => "Tuesday",
        chrono::Weekday::Wed => "Wednesday",
        chrono::Weekday::Thu => "Thursday",
        chrono::Weekday::Fri => "Friday",
        chrono::Weekday::Sat => "Saturday",
        chrono::Weekday::Sun => "Sunday",
    }
}

/// Parse one slot endpoint: `H[:MM] [AM|PM]`, minutes and meridiem optional.
/// An endpoint without a meridiem is read as 24-hour. Returns `None` when
/// the label does not parse; callers treat that as an open window.
pub fn parse_time_endpoint(label: &str) -> Option<NaiveTime> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return None;
    }

    let upper = trimmed.to_ascii_uppercase();
    let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end().to_string(), Some(false))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end().to_string(), Some(true))
    } else {
        (upper, None)
    };

    let (hour_part, minute_part) = match clock.split_once(':') {
        Some((h, m)) => (h.trim(), Some(m.trim())),
        None => (clock.trim(), None),
    };

    if hour_part.is_empty() || hour_part.len() > 2 || !hour_part.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }
    let mut hour: u32 = hour_part.parse().ok()?;

    let minute: u32 = match minute_part {
        Some(m) => {
            if m.len() != 2 || !m.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            m.parse().ok()?
        }
        None => 0,
    };

    match meridiem {
        Some(true) if hour != 12 => hour += 12,
        Some(false) if hour == 12 => hour = 0,
        _ => {}
    }

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// True when `now` falls inside the session's scheduled window.
///
/// - `enforce` false: always open (configuration escape hatch).
/// - missing `time_slot` or `day`: open (missing schedule data never blocks).
/// - weekday mismatch: closed.
/// - unparseable endpoint: open.
/// - otherwise `start <= now <= end`, both resolved to today.
pub fn is_open(
    time_slot: Option<&str>,
    day: Option<Day>,
    now: DateTime<Local>,
    enforce: bool,
) -> bool {
    if !enforce {
        return true;
    }
    let (slot, day) = match (time_slot, day) {
        (Some(s), Some(d)) if !s.trim().is_empty() => (s, d),
        _ => return true,
    };

    if day.as_str() != weekday_name(now) {
        return false;
    }

    let (start_raw, end_raw) = match slot.split_once('-') {
        Some(parts) => parts,
        None => return true,
    };
    let (start, end) = match (parse_time_endpoint(start_raw), parse_time_endpoint(end_raw)) {
        (Some(s), Some(e)) => (s, e),
        _ => return true,
    };

    let now_time = NaiveTime::from_hms_opt(now.hour(), now.minute(), now.second())
        .unwrap_or(NaiveTime::MIN);
    start <= now_time && now_time <= end
}

/// Strict validation of the authored slot format: `H:MM AM - H:MM PM`
/// (minutes and meridiem required on both endpoints).
pub fn is_strict_slot_format(slot: &str) -> bool {
    let Some((start, end)) = slot.split_once('-') else {
        return false;
    };
    is_strict_endpoint(start) && is_strict_endpoint(end)
}

fn is_strict_endpoint(endpoint: &str) -> bool {
    let upper = endpoint.trim().to_ascii_uppercase();
    let rest = match upper.strip_suffix("AM").or_else(|| upper.strip_suffix("PM")) {
        Some(r) => r.trim_end(),
        None => return false,
    };
    let Some((h, m)) = rest.split_once(':') else {
        return false;
    };
    let h = h.trim();
    (1..=2).contains(&h.len())
        && h.bytes().all(|b| b.is_ascii_digit())
        && m.len() == 2
        && m.bytes().all(|b| b.is_ascii_digit())
}
