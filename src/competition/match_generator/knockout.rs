// Single-elimination brackets. Only the current round exists as games;
// the next one is built from reported results with advance_round.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    competition::{format::knockout_round::KnockoutRound as KnockoutRoundFormat, match_generator::GameIds},
    error::{EngineError, Result}, game::{Game, GameResult, GameStatus, Side, Stage}, types::{GameId, TeamId}
};

#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, PartialEq)]
pub struct Bracket {
    pub size: usize,    // Slots in the first round, byes included.
    pub total_rounds: u8,
    pub current_round: u8,
    current: Vec<GameId>,   // Games of the current round in bracket order.
    next_id: GameId,
    pub champion: Option<TeamId>,
}

// Basics.
impl Bracket {
    // Pair up neighbouring slots into first round games.
    pub fn build(slots: &[Side], ids: &mut GameIds) -> Result<(Self, Vec<Game>)> {
        if slots.len() < 2 || !slots.len().is_power_of_two() {
            return Err(EngineError::validation(format!("a bracket needs a power of two slots, got {}", slots.len())));
        }

        let mut games = Vec::new();
        for pair in slots.chunks(2) {
            if pair[0].is_bye() && pair[1].is_bye() {
                return Err(EngineError::validation("a bye cannot meet another bye"));
            }
            games.push(Game::build(ids.next(), pair[0], pair[1], Stage::Knockout, 1));
        }

        let bracket = Self {
            size: slots.len(),
            total_rounds: KnockoutRoundFormat::round_count(slots.len()),
            current_round: 1,
            current: games.iter().map(|g| g.id).collect(),
            next_id: ids.peek(),
            champion: None,
        };

        log::debug!("bracket of {} slots seeded with {} first round games", bracket.size, games.len());
        return Ok((bracket, games));
    }

    pub fn round_name(&self, round: u8) -> String {
        KnockoutRoundFormat::round_name(round, self.total_rounds)
    }

    pub fn current_games(&self) -> &[GameId] {
        &self.current
    }

    pub fn is_decided(&self) -> bool {
        self.champion.is_some()
    }

    // Get JSON for the API layer.
    pub fn summary_json(&self) -> serde_json::Value {
        json!({
            "size": self.size,
            "rounds": (1..=self.total_rounds).map(|r| self.round_name(r)).collect::<Vec<String>>(),
            "current_round": self.current_round,
            "current_games": self.current,
            "champion": self.champion,
        })
    }
}

// Functional.
impl Bracket {
    // Build the next round from the winners of the current one.
    // Winners of neighbouring games meet; the upper game's winner is at home.
    // After the final, the champion is recorded and no games are returned.
    pub fn advance_round(&mut self, prior: &[Game], results: &[GameResult]) -> Result<Vec<Game>> {
        if self.is_decided() {
            return Err(EngineError::validation("the bracket has already been decided"));
        }

        let mut winners = Vec::new();
        for id in self.current.iter() {
            let game = match prior.iter().find(|g| g.id == *id) {
                Some(g) => g,
                None => return Err(EngineError::validation(format!("match {id} of round {} is missing", self.current_round))),
            };
            winners.push(Self::get_winner(game, results)?);
        }

        if winners.len() == 1 {
            self.champion = Some(winners[0]);
            log::info!("knockout decided, champion is team {}", winners[0]);
            return Ok(Vec::new());
        }

        let round = self.current_round + 1;
        let mut ids = GameIds::starting_at(self.next_id);
        let mut games = Vec::new();
        for pair in winners.chunks(2) {
            games.push(Game::build(ids.next(), Side::Team(pair[0]), Side::Team(pair[1]), Stage::Knockout, round));
        }

        self.current_round = round;
        self.current = games.iter().map(|g| g.id).collect();
        self.next_id = ids.peek();

        log::debug!("advanced bracket to {} with {} games", self.round_name(round), games.len());
        return Ok(games);
    }

    // Get the team that goes through from a game of the current round.
    fn get_winner(game: &Game, results: &[GameResult]) -> Result<TeamId> {
        if game.status == GameStatus::Walkover {
            return match game.team_ids().first() {
                Some(id) => Ok(*id),
                None => Err(EngineError::validation(format!("match {} has no team", game.id))),
            };
        }

        let result = match results.iter().find(|r| r.game_id == game.id) {
            Some(r) => r,
            None => return Err(EngineError::validation(format!("match {} has no reported winner", game.id))),
        };

        if !game.involves(result.winner) {
            return Err(EngineError::validation(format!("team {} did not play in match {}", result.winner, game.id)));
        }

        return Ok(result.winner);
    }
}
