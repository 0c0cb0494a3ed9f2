//! Compound dosing frequency.
//!
//! Stored orders carry frequency as one string, `"<times>/d <days>d/w"` (for example
//! `"3/d 5d/w"`: three times a day, five days a week). The form edits the two numbers with
//! separate selectors, so the value is split when an order is bound and re-encoded when the form
//! is submitted. In between it is a structured [`Frequency`].

use crate::error::FrequencyError;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

pub const TIMES_PER_DAY: RangeInclusive<u8> = 1..=10;
pub const DAYS_PER_WEEK: RangeInclusive<u8> = 1..=7;

const DAY_MARKER: &str = "/d";
const WEEK_MARKER: &str = "d/";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Frequency {
    times_per_day: u8,
    days_per_week: u8,
}

impl Frequency {
    pub fn new(times_per_day: u8, days_per_week: u8) -> Result<Self, FrequencyError> {
        check_range("times per day", times_per_day, &TIMES_PER_DAY)?;
        check_range("days per week", days_per_week, &DAYS_PER_WEEK)?;
        Ok(Self {
            times_per_day,
            days_per_week,
        })
    }

    /// Builds a frequency from the two selector values.
    pub fn from_parts(times_per_day: &str, days_per_week: &str) -> Result<Self, FrequencyError> {
        Self::new(parse_part(times_per_day)?, parse_part(days_per_week)?)
    }

    pub fn times_per_day(&self) -> u8 {
        self.times_per_day
    }

    pub fn days_per_week(&self) -> u8 {
        self.days_per_week
    }

    /// The stored wire form, `"<times>/d <days>d/w"`.
    pub fn encode(&self) -> String {
        format!("{}/d {}d/w", self.times_per_day, self.days_per_week)
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Frequency {
    type Err = FrequencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (times, days) = split(s);
        Self::from_parts(times, days)
    }
}

/// Splits a stored frequency into its two selector values without interpreting them.
///
/// The times-per-day part is everything before the first `/d` (the whole input when absent);
/// the days-per-week part is what follows `/d` up to the next `d/` (empty when `/d` is absent).
/// Both parts are trimmed.
pub fn split(encoded: &str) -> (&str, &str) {
    let times = match encoded.find(DAY_MARKER) {
        Some(idx) => &encoded[..idx],
        None => encoded,
    };
    let days = match encoded.find(DAY_MARKER) {
        Some(idx) => {
            let rest = &encoded[idx + DAY_MARKER.len()..];
            match rest.find(WEEK_MARKER) {
                Some(end) => &rest[..end],
                None => rest,
            }
        }
        None => "",
    };
    (times.trim(), days.trim())
}

fn parse_part(raw: &str) -> Result<u8, FrequencyError> {
    let trimmed = raw.trim();
    trimmed
        .parse::<u8>()
        .map_err(|_| FrequencyError::NotNumeric(trimmed.to_string()))
}

fn check_range(
    field: &'static str,
    value: u8,
    range: &RangeInclusive<u8>,
) -> Result<(), FrequencyError> {
    if range.contains(&value) {
        Ok(())
    } else {
        Err(FrequencyError::OutOfRange {
            field,
            value,
            min: *range.start(),
            max: *range.end(),
        })
    }
}
