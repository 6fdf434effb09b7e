// The round robin rules and the counts they imply.
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, PartialEq)]
pub struct RoundRobin {
    pub legs: u8,   // How many times each team plays one another.
}

// Basics
impl RoundRobin {
    pub const MIN_TEAMS: usize = 2;

    pub fn build(double: bool) -> Self {
        Self {
            legs: if double { 2 } else { 1 },
        }
    }
}

impl RoundRobin {
    // Get how many matches one leg has: every pair once.
    pub fn get_matches_per_leg(teams: usize) -> u32 {
        (teams * teams.saturating_sub(1) / 2) as u32
    }

    // Get how many matches there should be in the stage in total.
    pub fn get_theoretical_total_matches(&self, teams: usize) -> u32 {
        Self::get_matches_per_leg(teams) * self.legs as u32
    }
}
