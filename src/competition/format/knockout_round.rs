// Shape of a single-elimination bracket.

use ordinal::ToOrdinal as _;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, Default)]
pub struct KnockoutRound;

impl KnockoutRound {
    pub const MIN_TEAMS: usize = 2;

    // Get the bracket size: the team count padded to the next power of two.
    pub fn bracket_size(teams: usize) -> usize {
        teams.max(1).next_power_of_two()
    }

    // Get how many rounds the bracket has.
    pub fn round_count(teams: usize) -> u8 {
        Self::bracket_size(teams).trailing_zeros() as u8
    }

    // Every playable match eliminates one team, and all but one get eliminated.
    pub fn total_matches(teams: usize) -> u32 {
        teams.saturating_sub(1) as u32
    }

    // Get a generic name for a knockout round based on how many teams it has.
    pub fn round_name(round: u8, total_rounds: u8) -> String {
        let rounds_left = total_rounds.saturating_sub(round) + 1;
        let teams_in_round = 1u32 << rounds_left.min(31);

        match (rounds_left, teams_in_round) {
            (1, 2) => "Final".to_string(),
            (2, 4) => "Semi Final".to_string(),
            (3, 8) => "Quarter Final".to_string(),
            _ => format!("{} Round", (round as usize).to_ordinal_string())
        }
    }
}
