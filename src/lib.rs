//! Fixture generation and scheduling for multi-team competitions.
//!
//! Give the engine a roster, a format and a venue inventory; get back every match
//! with a venue and a time slot, or an error saying why that was not possible.
pub mod competition;
pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod team;
pub mod time;
pub mod types;
pub mod venue;

pub use crate::{
    competition::{
        capacity::{estimate, estimate_format, CapacityReport},
        fixture_set::{Diagnostics, FixtureSet, HomeAway, VenueUsage},
        format::{Format, GenerationOptions},
        match_generator::{generate, knockout::Bracket, Pairings},
        schedule_generator::{check_conflicts, schedule, Scheduler},
        seeding::{distribute_into_groups, seed_bracket},
    },
    config::{EngineConfig, SchedulingRules},
    engine::{run_generation, Engine, Run, RunState},
    error::{Blocker, EngineError, Result, Unplaced},
    game::{Game, GameResult, GameStatus, Round, Side, Stage},
    team::{Group, Team},
    time::DateRange,
    venue::{TimeSlot, Venue},
};
