// Checking whether a venue inventory can host a competition before generating it.

use serde::{Deserialize, Serialize};

use crate::{
    competition::format::{Format, GenerationOptions},
    error::{EngineError, Result}, time::DateRange, venue::Venue
};

#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, PartialEq, Eq)]
pub struct CapacityReport {
    pub feasible: bool,
    pub required: u32,
    pub available_slot_count: u32,
    pub shortfall: u32,
}

impl CapacityReport {
    // Turn an infeasible report into a capacity error.
    pub fn into_result(self) -> Result<Self> {
        if self.feasible {
            return Ok(self);
        }

        Err(EngineError::Capacity {
            required: self.required,
            available: self.available_slot_count,
            shortfall: self.shortfall,
        })
    }
}

// Count the usable slots inside the date range and compare them with the match count.
pub fn estimate(match_count: u32, venues: &[Venue], range: &DateRange) -> CapacityReport {
    let available: u32 = venues.iter()
        .map(|v| v.within(range).usable_slot_count())
        .sum();

    let shortfall = match_count.saturating_sub(available);
    log::debug!("capacity: {match_count} matches, {available} usable slots across {} venues", venues.len());

    CapacityReport {
        feasible: shortfall == 0,
        required: match_count,
        available_slot_count: available,
        shortfall: shortfall,
    }
}

// Estimate for a format using its closed-form match count.
pub fn estimate_format(format: Format, team_count: usize, options: &GenerationOptions, venues: &[Venue], range: &DateRange) -> CapacityReport {
    estimate(format.required_matches(team_count, options), venues, range)
}
