pub mod round_robin;
pub mod knockout_round;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    competition::format::{knockout_round::KnockoutRound as KnockoutRoundFormat, round_robin::RoundRobin as RoundRobinFormat},
    error::{EngineError, Result}, team::Team, types::convert
};

#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Format {
    RoundRobin,
    Knockout,
    GroupsPlusKnockout,
}

#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, PartialEq)]
#[serde(default)]
pub struct GenerationOptions {
    pub double_round_robin: bool,   // Every pair meets twice, home and away reversed.
    pub group_count: u8,
    pub qualifiers_per_group: u8,

    // Teams sharing a seed rank are drawn into a reproducible random order with this seed.
    // Without it they are ordered by team id.
    pub draw_seed: Option<u64>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            double_round_robin: false,
            group_count: 1,
            qualifiers_per_group: 2,
            draw_seed: None,
        }
    }
}

// Functional.
impl Format {
    // Make sure the roster and the options can produce this format.
    pub fn validate(&self, teams: &[Team], options: &GenerationOptions) -> Result<()> {
        let ids: BTreeSet<_> = teams.iter().map(|t| t.id).collect();
        if ids.len() != teams.len() {
            return Err(EngineError::validation("team ids must be unique"));
        }

        match self {
            Format::RoundRobin => {
                if teams.len() < RoundRobinFormat::MIN_TEAMS {
                    return Err(EngineError::validation(format!("round robin needs at least {} teams, got {}", RoundRobinFormat::MIN_TEAMS, teams.len())));
                }
            },
            Format::Knockout => {
                if teams.len() < KnockoutRoundFormat::MIN_TEAMS {
                    return Err(EngineError::validation(format!("knockout needs at least {} teams, got {}", KnockoutRoundFormat::MIN_TEAMS, teams.len())));
                }
            },
            Format::GroupsPlusKnockout => Self::validate_groups(teams.len(), options)?,
        }

        // Team counts must fit the id and ordinal types used downstream.
        convert::int::<usize, u16>(teams.len())?;
        return Ok(());
    }

    // Every group needs a round robin of its own, and the qualifiers must fill a bracket.
    fn validate_groups(team_count: usize, options: &GenerationOptions) -> Result<()> {
        let groups = options.group_count as usize;
        if groups < 1 || groups > team_count {
            return Err(EngineError::validation(format!("group count {groups} must be between 1 and the team count {team_count}")));
        }

        let smallest_group = team_count / groups;
        if smallest_group < RoundRobinFormat::MIN_TEAMS {
            return Err(EngineError::validation(format!("{team_count} teams in {groups} groups leaves a group with fewer than {} teams", RoundRobinFormat::MIN_TEAMS)));
        }

        let qualifiers = options.qualifiers_per_group as usize;
        if qualifiers < 1 || qualifiers > smallest_group {
            return Err(EngineError::validation(format!("qualifiers per group {qualifiers} must be between 1 and the smallest group size {smallest_group}")));
        }

        if qualifiers * groups < KnockoutRoundFormat::MIN_TEAMS {
            return Err(EngineError::validation("the knockout stage needs at least 2 qualifiers"));
        }

        return Ok(());
    }

    // Get how many playable matches the whole competition needs, without generating it.
    pub fn required_matches(&self, team_count: usize, options: &GenerationOptions) -> u32 {
        match self {
            Format::RoundRobin => RoundRobinFormat::build(options.double_round_robin).get_theoretical_total_matches(team_count),
            Format::Knockout => KnockoutRoundFormat::total_matches(team_count),
            Format::GroupsPlusKnockout => {
                let round_robin = RoundRobinFormat::build(options.double_round_robin);
                let groups = (options.group_count as usize).max(1);
                let group_matches: u32 = group_sizes(team_count, groups).iter()
                    .map(|size| round_robin.get_theoretical_total_matches(*size))
                    .sum();

                group_matches + KnockoutRoundFormat::total_matches(groups * options.qualifiers_per_group as usize)
            },
        }
    }
}

// Sizes of the groups a serpentine deal produces. The first groups get the leftover teams.
pub fn group_sizes(team_count: usize, groups: usize) -> Vec<usize> {
    (0..groups).map(|i| team_count / groups + usize::from(i < team_count % groups)).collect()
}
