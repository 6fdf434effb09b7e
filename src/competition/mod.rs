// Everything that turns a roster and a format into a schedule.
pub mod format;
pub mod seeding;
pub mod match_generator;
pub mod capacity;
pub mod schedule_generator;
pub mod fixture_set;

pub use self::{
    capacity::CapacityReport,
    fixture_set::{Diagnostics, FixtureSet},
    format::{Format, GenerationOptions},
    match_generator::{knockout::Bracket, Pairings},
};
