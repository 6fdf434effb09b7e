// Matches, called games throughout the crate, and the rounds they belong to.
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::json;
use time::PrimitiveDateTime;

use crate::{time::{format_datetime, Interval}, types::{GameId, GroupId, TeamId, VenueId}, venue::TimeSlot};

// One side of a game.
#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Side {
    Team(TeamId),
    Bye,
}

impl Side {
    pub fn team(&self) -> Option<TeamId> {
        match self {
            Side::Team(id) => Some(*id),
            Side::Bye => None,
        }
    }

    pub fn is_bye(&self) -> bool {
        *self == Side::Bye
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Side::Team(id) => write!(f, "team {id}"),
            Side::Bye => write!(f, "bye"),
        }
    }
}

// Which part of the competition a game belongs to.
#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    Group(GroupId),
    Knockout,
}

#[derive(Debug, Serialize, Deserialize)]
#[derive(Default, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    #[default]
    Unscheduled,
    Scheduled,

    // A knockout pairing against a bye. Never played, never scheduled.
    Walkover,
}

#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, PartialEq, Eq)]
pub struct Game {
    pub id: GameId,
    pub home: Side,
    pub away: Side,
    pub stage: Stage,
    pub round: u8,
    pub venue_id: Option<VenueId>,
    pub slot: Option<TimeSlot>,
    pub status: GameStatus,
}

// Basics.
impl Game {
    pub fn build(id: GameId, home: Side, away: Side, stage: Stage, round: u8) -> Self {
        let status = if home.is_bye() || away.is_bye() {
            GameStatus::Walkover
        }
        else {
            GameStatus::Unscheduled
        };

        Self {
            id: id,
            home: home,
            away: away,
            stage: stage,
            round: round,
            venue_id: None,
            slot: None,
            status: status,
        }
    }

    // Get JSON for the API layer.
    pub fn summary_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "home": self.home.team(),
            "away": self.away.team(),
            "stage": self.stage,
            "round": self.round,
            "venue_id": self.venue_id,
            "start": self.slot.as_ref().map(|s| format_datetime(&s.start)),
            "status": self.status,
        })
    }
}

// Functional.
impl Game {
    // Whether the game needs a venue and a time slot.
    pub fn is_playable(&self) -> bool {
        self.status != GameStatus::Walkover
    }

    // Get the ids of the actual teams in the game.
    pub fn team_ids(&self) -> Vec<TeamId> {
        [self.home, self.away].iter().filter_map(|s| s.team()).collect()
    }

    pub fn involves(&self, team_id: TeamId) -> bool {
        self.home == Side::Team(team_id) || self.away == Side::Team(team_id)
    }

    // Give the game its venue and time.
    pub fn assign(&mut self, slot: TimeSlot) {
        self.venue_id = Some(slot.venue_id);
        self.slot = Some(slot);
        self.status = GameStatus::Scheduled;
    }

    pub fn interval(&self) -> Option<Interval> {
        self.slot.as_ref().map(|s| s.interval())
    }

    pub fn start(&self) -> Option<PrimitiveDateTime> {
        self.slot.as_ref().map(|s| s.start)
    }

    // Get the same fixture with home and away reversed.
    pub fn mirrored(&self, id: GameId, round: u8) -> Self {
        Self::build(id, self.away, self.home, self.stage, round)
    }
}

// A reported outcome of a knockout game, supplied by the results collaborator.
#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub game_id: GameId,
    pub winner: TeamId,
}

impl GameResult {
    pub fn build(game_id: GameId, winner: TeamId) -> Self {
        Self { game_id: game_id, winner: winner }
    }
}

// A matchday or a knockout round of one stage.
#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, PartialEq, Eq)]
pub struct Round {
    pub stage: Stage,
    pub ordinal: u8,
    pub name: String,
    pub games: Vec<GameId>,
}

// Group the games into rounds, ordered by stage and round ordinal.
// Games keep their relative order inside a round.
pub fn group_into_rounds(games: &[Game], name_for: impl Fn(Stage, u8) -> String) -> Vec<Round> {
    let mut keys: Vec<(Stage, u8)> = games.iter().map(|g| (g.stage, g.round)).collect();
    keys.sort();
    keys.dedup();

    let mut rounds = Vec::new();
    for (stage, ordinal) in keys {
        rounds.push(Round {
            stage: stage,
            ordinal: ordinal,
            name: name_for(stage, ordinal),
            games: games.iter().filter(|g| g.stage == stage && g.round == ordinal).map(|g| g.id).collect(),
        });
    }

    return rounds;
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::{macros::datetime, Duration};

    #[test]
    fn games_against_a_bye_are_walkovers() {
        let game = Game::build(1, Side::Team(1), Side::Bye, Stage::Knockout, 1);
        assert_eq!(game.status, GameStatus::Walkover);
        assert!(!game.is_playable());
        assert_eq!(game.team_ids(), vec![1]);
    }

    #[test]
    fn assigning_marks_the_game_scheduled() {
        let mut game = Game::build(1, Side::Team(1), Side::Team(2), Stage::Group(0), 1);
        game.assign(TimeSlot::build(3, datetime!(2026 - 05 - 01 10:00), Duration::hours(2)));
        assert_eq!(game.status, GameStatus::Scheduled);
        assert_eq!(game.venue_id, Some(3));
        assert_eq!(game.interval().unwrap().end, datetime!(2026 - 05 - 01 12:00));
    }

    #[test]
    fn rounds_follow_stage_then_ordinal() {
        let games = vec![
            Game::build(1, Side::Team(1), Side::Team(2), Stage::Group(1), 2),
            Game::build(2, Side::Team(3), Side::Team(4), Stage::Group(0), 1),
            Game::build(3, Side::Team(5), Side::Team(6), Stage::Group(1), 2),
        ];
        let rounds = group_into_rounds(&games, |_, n| format!("Matchday {n}"));
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0].stage, Stage::Group(0));
        assert_eq!(rounds[1].games, vec![1, 3]);
        assert_eq!(rounds[1].name, "Matchday 2");
    }
}
