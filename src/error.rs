use std::fmt;

use serde::Serialize;
use thiserror::Error;
use time::PrimitiveDateTime;

use crate::{game::Side, time::format_datetime, types::{GameId, TeamId}};

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    // Malformed or infeasible input shape.
    #[error("validation error: {0}")]
    Validation(String),

    // The venue inventory can't host the number of matches the format needs.
    #[error("capacity error: {required} matches need slots, {available} available (short by {shortfall})")]
    Capacity { required: u32, available: u32, shortfall: u32 },

    // Matches that could not be placed after the retry pass.
    #[error("scheduling error: {} match(es) could not be placed: {}", .unplaced.len(), describe(.unplaced))]
    Scheduling { unplaced: Vec<Unplaced> },

    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    // Whether resubmitting with more venues or a wider date range can help.
    pub fn is_retryable_with_more_capacity(&self) -> bool {
        matches!(self, EngineError::Capacity { .. } | EngineError::Scheduling { .. })
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        EngineError::Validation(msg.into())
    }
}

// A match the scheduler could not place, and what stood in its way.
#[derive(Debug, Serialize)]
#[derive(Clone, PartialEq)]
pub struct Unplaced {
    pub game_id: GameId,
    pub home: Side,
    pub away: Side,
    pub blocker: Blocker,
}

#[derive(Debug, Serialize)]
#[derive(Clone, PartialEq)]
pub enum Blocker {
    // Every free slot overlaps another match of this team.
    Team(TeamId),

    // No unconsumed venue slot is left.
    NoFreeSlot,

    // Free slots exist only before the earliest start allowed by earlier rounds.
    RoundOrder { not_before: PrimitiveDateTime },

    // The match holds an assignment that clashes with another match.
    Conflict { other: GameId },
}

impl fmt::Display for Blocker {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Blocker::Team(id) => write!(f, "team {id} has no free time"),
            Blocker::NoFreeSlot => write!(f, "no free venue slot"),
            Blocker::RoundOrder { not_before } => write!(f, "no free slot after {}", format_datetime(not_before)),
            Blocker::Conflict { other } => write!(f, "clashes with match {other}"),
        }
    }
}

fn describe(unplaced: &[Unplaced]) -> String {
    unplaced.iter()
        .map(|u| format!("match {} ({})", u.game_id, u.blocker))
        .collect::<Vec<String>>()
        .join(", ")
}
