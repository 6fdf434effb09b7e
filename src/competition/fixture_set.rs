// The engine's output: scheduled games plus balance and utilisation diagnostics.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::json;
use time::PrimitiveDateTime;

use crate::{
    competition::match_generator::knockout::Bracket,
    game::{group_into_rounds, Game, GameStatus, Round, Stage},
    team::Group,
    types::{GameId, TeamId, VenueId},
    venue::Venue
};

#[derive(Debug, Serialize, Deserialize)]
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct HomeAway {
    pub home: u16,
    pub away: u16,
}

impl HomeAway {
    // Get the difference between home and away matches.
    // Positive values indicate there are more home matches.
    // Negative values indicate there are more away matches.
    pub fn get_home_away_difference(&self) -> i32 {
        i32::from(self.home) - i32::from(self.away)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub struct VenueUsage {
    pub used: u32,
    pub available: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Diagnostics {
    pub team_balance: BTreeMap<TeamId, HomeAway>,
    pub venue_usage: BTreeMap<VenueId, VenueUsage>,
}

impl Diagnostics {
    pub fn build(games: &[Game], venues: &[Venue]) -> Self {
        let mut diagnostics = Self::default();

        for game in games.iter().filter(|g| g.is_playable()) {
            if let Some(home) = game.home.team() {
                diagnostics.team_balance.entry(home).or_default().home += 1;
            }
            if let Some(away) = game.away.team() {
                diagnostics.team_balance.entry(away).or_default().away += 1;
            }
        }

        for venue in venues.iter() {
            diagnostics.venue_usage.entry(venue.id).or_default().available += venue.usable_slot_count();
        }
        for game in games.iter().filter(|g| g.status == GameStatus::Scheduled) {
            if let Some(venue_id) = game.venue_id {
                diagnostics.venue_usage.entry(venue_id).or_default().used += 1;
            }
        }

        return diagnostics;
    }

    // The largest home/away imbalance of any team.
    pub fn worst_imbalance(&self) -> i32 {
        self.team_balance.values()
            .map(|b| b.get_home_away_difference().abs())
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, PartialEq)]
pub struct FixtureSet {
    pub games: Vec<Game>,
    pub groups: Vec<Group>,
    pub bracket: Option<Bracket>,
    pub diagnostics: Diagnostics,
}

// Basics.
impl FixtureSet {
    pub fn build(games: Vec<Game>, groups: Vec<Group>, bracket: Option<Bracket>, venues: &[Venue]) -> Self {
        let diagnostics = Diagnostics::build(&games, venues);
        Self {
            games: games,
            groups: groups,
            bracket: bracket,
            diagnostics: diagnostics,
        }
    }

    // Get JSON for the API layer.
    pub fn summary_json(&self) -> serde_json::Value {
        json!({
            "games": self.games.iter().map(|g| g.summary_json()).collect::<Vec<serde_json::Value>>(),
            "groups": self.groups.iter().map(|g| g.summary_json()).collect::<Vec<serde_json::Value>>(),
            "rounds": self.rounds(),
            "bracket": self.bracket.as_ref().map(|b| b.summary_json()),
            "diagnostics": self.diagnostics,
        })
    }
}

// Functional.
impl FixtureSet {
    // Group the games into named rounds.
    pub fn rounds(&self) -> Vec<Round> {
        group_into_rounds(&self.games, |stage, ordinal| match (stage, self.bracket.as_ref()) {
            (Stage::Knockout, Some(bracket)) => bracket.round_name(ordinal),
            _ => format!("Matchday {ordinal}"),
        })
    }

    pub fn game(&self, id: GameId) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }

    // Games that need a venue, walkovers left out.
    pub fn playable_count(&self) -> usize {
        self.games.iter().filter(|g| g.is_playable()).count()
    }

    pub fn scheduled_count(&self) -> usize {
        self.games.iter().filter(|g| g.status == GameStatus::Scheduled).count()
    }

    // When the last scheduled game ends.
    pub fn last_end(&self) -> Option<PrimitiveDateTime> {
        self.games.iter().filter_map(|g| g.interval()).map(|i| i.end).max()
    }

    pub fn next_game_id(&self) -> GameId {
        self.games.iter().map(|g| g.id).max().unwrap_or(0) + 1
    }
}
