// Time-related operations.
use serde::{Deserialize, Serialize};
use time::{
    format_description::BorrowedFormatItem,
    macros::format_description,
    Date, Duration, PrimitiveDateTime
};

use crate::error::{EngineError, Result};

// Use this format when showing slot times to humans.
static DATETIME_FORMAT: &[BorrowedFormatItem<'_>] = format_description!("[year]-[month]-[day] [hour]:[minute]");

// A window of calendar days, both ends inclusive.
#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    // Build the object.
    pub fn build(start: Date, end: Date) -> Result<Self> {
        let range = DateRange { start: start, end: end };
        range.validate()?;
        return Ok(range);
    }

    // The fields are public, so ranges built by hand are checked again before use.
    pub fn validate(&self) -> Result<()> {
        if self.end < self.start {
            return Err(EngineError::validation(format!("date range ends ({}) before it starts ({})", self.end, self.start)));
        }
        return Ok(());
    }

    // Check if the moment falls on one of the days in the window.
    pub fn contains(&self, moment: &PrimitiveDateTime) -> bool {
        let date = moment.date();
        self.start <= date && date <= self.end
    }
}

// A span of time between two moments. End is exclusive.
#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: PrimitiveDateTime,
    pub end: PrimitiveDateTime,
}

impl Interval {
    // The end saturates at the largest representable moment.
    pub fn build(start: PrimitiveDateTime, duration: Duration) -> Self {
        Interval { start: start, end: start.saturating_add(duration) }
    }

    // Check if the intervals overlap once both are widened by the given gap.
    // Touching intervals do not overlap when the gap is zero.
    pub fn overlaps(&self, other: &Self, gap: Duration) -> bool {
        self.start < other.end.saturating_add(gap) && other.start < self.end.saturating_add(gap)
    }
}

// Get time::Duration from desired minutes.
pub fn get_duration_from_minutes(minutes: u32) -> Duration {
    Duration::minutes(i64::from(minutes))
}

// Format a moment for logs and error messages.
pub fn format_datetime(moment: &PrimitiveDateTime) -> String {
    match moment.format(&DATETIME_FORMAT) {
        Ok(s) => s,
        Err(_) => moment.to_string(),
    }
}
