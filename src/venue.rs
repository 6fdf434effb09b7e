// Venues and the time slots they offer. Read-only to the engine.
use serde::{Deserialize, Serialize};
use time::{Duration, PrimitiveDateTime};

use crate::{time::{DateRange, Interval}, types::VenueId};

#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub venue_id: VenueId,
    pub start: PrimitiveDateTime,
    pub duration: Duration,
}

impl TimeSlot {
    pub fn build(venue_id: VenueId, start: PrimitiveDateTime, duration: Duration) -> Self {
        Self {
            venue_id: venue_id,
            start: start,
            duration: duration,
        }
    }

    pub fn interval(&self) -> Interval {
        Interval::build(self.start, self.duration)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Venue {
    pub id: VenueId,
    pub name: String,
    pub slots: Vec<TimeSlot>,
}

// Basics.
impl Venue {
    pub fn build(id: VenueId, name: &str) -> Self {
        Self {
            id: id,
            name: name.to_string(),
            slots: Vec::new(),
        }
    }

    // Add a slot owned by this venue.
    pub fn add_slot(&mut self, start: PrimitiveDateTime, duration: Duration) {
        self.slots.push(TimeSlot::build(self.id, start, duration));
    }

    // Build a venue with evenly spaced slots.
    pub fn with_regular_slots(id: VenueId, name: &str, first: PrimitiveDateTime, duration: Duration, every: Duration, count: usize) -> Self {
        let mut venue = Self::build(id, name);
        let mut start = first;
        for _ in 0..count {
            venue.add_slot(start, duration);
            start = start.saturating_add(every);
        }

        return venue;
    }
}

// Functional.
impl Venue {
    // Get a copy of the venue with only the slots that start inside the date range.
    pub fn within(&self, range: &DateRange) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            slots: self.slots.iter().filter(|s| range.contains(&s.start)).copied().collect(),
        }
    }

    // The most matches the venue can host: the largest set of its slots that do not overlap.
    // Earliest-ending slot first.
    pub fn usable_slot_count(&self) -> u32 {
        let mut intervals: Vec<Interval> = self.slots.iter().map(|s| s.interval()).collect();
        intervals.sort_by(|a, b| a.end.cmp(&b.end).then(a.start.cmp(&b.start)));

        let mut count = 0;
        let mut last_end: Option<PrimitiveDateTime> = None;
        for interval in intervals {
            if last_end.is_none_or(|end| interval.start >= end) {
                count += 1;
                last_end = Some(interval.end);
            }
        }

        return count;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, datetime};

    #[test]
    fn overlapping_slots_of_one_venue_count_once() {
        let mut venue = Venue::build(1, "Arena");
        venue.add_slot(datetime!(2026 - 05 - 01 10:00), Duration::hours(2));
        venue.add_slot(datetime!(2026 - 05 - 01 11:00), Duration::hours(2));
        venue.add_slot(datetime!(2026 - 05 - 01 13:00), Duration::hours(2));
        assert_eq!(venue.usable_slot_count(), 2);
    }

    #[test]
    fn within_keeps_slots_starting_in_range() {
        let venue = Venue::with_regular_slots(1, "Arena", datetime!(2026 - 05 - 01 18:00), Duration::hours(2), Duration::days(1), 5);
        let range = DateRange::build(date!(2026 - 05 - 02), date!(2026 - 05 - 03)).unwrap();
        let trimmed = venue.within(&range);
        assert_eq!(trimmed.slots.len(), 2);
        assert_eq!(trimmed.slots[0].start, datetime!(2026 - 05 - 02 18:00));
        assert_eq!(venue.slots.len(), 5);
    }
}
