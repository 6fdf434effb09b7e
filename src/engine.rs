// The facade: validate, check capacity, generate, schedule.
// Every run works on its own copies of the inputs; runs share nothing.

use std::collections::BTreeSet;

use serde::Serialize;
use time::Duration;

use crate::{
    competition::{
        capacity,
        fixture_set::FixtureSet,
        format::{Format, GenerationOptions},
        match_generator,
        schedule_generator::Scheduler
    },
    config::{EngineConfig, SchedulingRules},
    error::{EngineError, Result},
    game::{Game, GameResult},
    team::Team,
    time::{format_datetime, DateRange},
    types::TeamId,
    venue::{TimeSlot, Venue}
};

#[derive(Debug, Serialize)]
#[derive(Default, Clone, PartialEq)]
pub enum RunState {
    #[default]
    Pending,
    Validated,
    Generated,
    Scheduled,
    Done,
    Failed(String),
}

#[derive(Debug)]
#[derive(Default, Clone)]
pub struct Engine {
    config: EngineConfig,
}

// Basics.
impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config: config }
    }
}

// Functional.
impl Engine {
    // Produce a fully scheduled fixture set, or the first failure.
    pub fn run_generation(&self, teams: &[Team], format: Format, options: &GenerationOptions, venues: &[Venue], range: &DateRange) -> Result<FixtureSet> {
        let mut run = Run::build(self, teams, format, options, venues, range);
        run.execute()
    }

    // Seed and schedule the knockout stage after the group stage of a groups-plus-knockout competition.
    // Qualifiers are given per group, best first, as decided by whoever keeps the standings.
    pub fn start_knockout(&self, fixtures: &FixtureSet, qualifiers: &[Vec<TeamId>], options: &GenerationOptions, venues: &[Venue], range: &DateRange) -> Result<FixtureSet> {
        if fixtures.bracket.is_some() {
            return Err(EngineError::validation("the knockout stage has already started"));
        }
        if fixtures.groups.is_empty() {
            return Err(EngineError::validation("there is no group stage to qualify from"));
        }

        let (bracket, games) = match_generator::start_knockout(&fixtures.groups, qualifiers, options.qualifiers_per_group as usize, fixtures.next_game_id())?;
        log::info!("knockout stage seeded with {} qualifiers", qualifiers.iter().map(|q| q.len()).sum::<usize>());

        let scheduled = self.schedule_after(fixtures, games, venues, range)?;
        let mut all_games = fixtures.games.clone();
        all_games.extend(scheduled);

        return Ok(FixtureSet::build(all_games, fixtures.groups.clone(), Some(bracket), &inventory(venues, range)));
    }

    // Build the next knockout round from reported results and schedule it.
    // After the final the champion is recorded and no games are added.
    pub fn advance_knockout(&self, fixtures: &FixtureSet, results: &[GameResult], venues: &[Venue], range: &DateRange) -> Result<FixtureSet> {
        let mut bracket = match fixtures.bracket.clone() {
            Some(b) => b,
            None => return Err(EngineError::validation("there is no knockout bracket to advance")),
        };

        let games = bracket.advance_round(&fixtures.games, results)?;
        let scheduled = self.schedule_after(fixtures, games, venues, range)?;
        let mut all_games = fixtures.games.clone();
        all_games.extend(scheduled);

        return Ok(FixtureSet::build(all_games, fixtures.groups.clone(), Some(bracket), &inventory(venues, range)));
    }

    // Schedule new games around the ones already in the fixture set, after all of them have ended.
    fn schedule_after(&self, fixtures: &FixtureSet, games: Vec<Game>, venues: &[Venue], range: &DateRange) -> Result<Vec<Game>> {
        if games.is_empty() {
            return Ok(games);
        }

        range.validate()?;
        validate_venues(venues, &self.config.scheduling)?;
        let inventory = inventory(venues, range);
        let mut scheduler = Scheduler::new(&inventory, &self.config.scheduling).with_existing(&fixtures.games)?;
        if let Some(end) = fixtures.last_end() {
            scheduler = scheduler.not_before(end);
        }

        return scheduler.schedule(games);
    }
}

// One generation request and where it got to.
#[derive(Debug)]
pub struct Run<'a> {
    engine: &'a Engine,
    teams: &'a [Team],
    format: Format,
    options: &'a GenerationOptions,
    venues: &'a [Venue],
    range: &'a DateRange,
    state: RunState,
    history: Vec<RunState>,     // Every state the run has left, oldest first.
}

impl<'a> Run<'a> {
    pub fn build(engine: &'a Engine, teams: &'a [Team], format: Format, options: &'a GenerationOptions, venues: &'a [Venue], range: &'a DateRange) -> Self {
        Self {
            engine: engine,
            teams: teams,
            format: format,
            options: options,
            venues: venues,
            range: range,
            state: RunState::Pending,
            history: Vec::new(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn history(&self) -> &[RunState] {
        &self.history
    }

    // Run every step once. The first failure ends the run and is returned as is.
    pub fn execute(&mut self) -> Result<FixtureSet> {
        log::info!("generating {:?} for {} teams across {} venues", self.format, self.teams.len(), self.venues.len());

        match self.try_execute() {
            Ok(fixtures) => {
                self.transition(RunState::Done);
                log::info!("fixture set ready: {} games, {} scheduled, worst home/away imbalance {}",
                    fixtures.games.len(), fixtures.scheduled_count(), fixtures.diagnostics.worst_imbalance());
                Ok(fixtures)
            },
            Err(e) => {
                log::warn!("generation failed: {e}");
                self.transition(RunState::Failed(e.to_string()));
                Err(e)
            },
        }
    }

    fn try_execute(&mut self) -> Result<FixtureSet> {
        self.format.validate(self.teams, self.options)?;
        self.range.validate()?;
        validate_venues(self.venues, &self.engine.config.scheduling)?;
        self.transition(RunState::Validated);

        capacity::estimate_format(self.format, self.teams.len(), self.options, self.venues, self.range).into_result()?;

        let pairings = match_generator::generate(self.teams, self.format, self.options)?;
        self.transition(RunState::Generated);

        let inventory = inventory(self.venues, self.range);
        let games = Scheduler::new(&inventory, &self.engine.config.scheduling).schedule(pairings.games)?;
        self.transition(RunState::Scheduled);

        return Ok(FixtureSet::build(games, pairings.groups, pairings.bracket, &inventory));
    }

    fn transition(&mut self, state: RunState) {
        log::debug!("run state {:?} -> {:?}", self.state, state);
        let previous = std::mem::replace(&mut self.state, state);
        self.history.push(previous);
    }
}

// Run a generation with the default configuration.
pub fn run_generation(teams: &[Team], format: Format, options: &GenerationOptions, venues: &[Venue], range: &DateRange) -> Result<FixtureSet> {
    Engine::default().run_generation(teams, format, options, venues, range)
}

// Every slot must belong to the venue listing it and last a while. Venue ids must be unique.
// A slot must also end, rest gap included, at a moment the calendar can represent.
fn validate_venues(venues: &[Venue], rules: &SchedulingRules) -> Result<()> {
    let ids: BTreeSet<_> = venues.iter().map(|v| v.id).collect();
    if ids.len() != venues.len() {
        return Err(EngineError::validation("venue ids must be unique"));
    }

    for venue in venues.iter() {
        if let Some(slot) = venue.slots.iter().find(|s| s.venue_id != venue.id) {
            return Err(EngineError::validation(format!("venue {} lists a slot of venue {}", venue.id, slot.venue_id)));
        }
        if venue.slots.iter().any(|s| s.duration <= Duration::ZERO) {
            return Err(EngineError::validation(format!("venue {} has a slot without duration", venue.id)));
        }

        let unbounded = |s: &TimeSlot| s.duration.checked_add(rules.rest()).and_then(|d| s.start.checked_add(d)).is_none();
        if let Some(slot) = venue.slots.iter().find(|s| unbounded(*s)) {
            return Err(EngineError::validation(format!("venue {} has a slot at {} that never ends", venue.id, format_datetime(&slot.start))));
        }
    }

    return Ok(());
}

// The venues with only the slots inside the date range.
fn inventory(venues: &[Venue], range: &DateRange) -> Vec<Venue> {
    venues.iter().map(|v| v.within(range)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Blocker;
    use time::{macros::{date, datetime}, Date, PrimitiveDateTime};

    fn teams(n: u16) -> Vec<Team> {
        (1..=n).map(|i| Team::build(i, &format!("Team {i}"), i)).collect()
    }

    fn range() -> DateRange {
        DateRange::build(date!(2026 - 09 - 01), date!(2026 - 09 - 30)).unwrap()
    }

    fn venues(count: u16, slots: usize) -> Vec<Venue> {
        (1..=count).map(|id| Venue::with_regular_slots(id, "Ground", datetime!(2026 - 09 - 01 10:00), Duration::hours(2), Duration::hours(3), slots)).collect()
    }

    #[test]
    fn successful_run_ends_done() {
        let engine = Engine::default();
        let (roster, venues, range, options) = (teams(4), venues(2, 3), range(), GenerationOptions::default());
        let mut run = Run::build(&engine, &roster, Format::RoundRobin, &options, &venues, &range);
        let fixtures = run.execute().unwrap();
        assert_eq!(run.state(), &RunState::Done);
        assert_eq!(fixtures.scheduled_count(), 6);
    }

    #[test]
    fn failed_run_records_the_reason() {
        let engine = Engine::default();
        let (roster, venues, range, options) = (teams(4), venues(1, 2), range(), GenerationOptions::default());
        let mut run = Run::build(&engine, &roster, Format::RoundRobin, &options, &venues, &range);
        assert!(matches!(run.execute(), Err(EngineError::Capacity { shortfall: 4, .. })));
        assert!(matches!(run.state(), RunState::Failed(reason) if reason.starts_with("capacity error")));

        // The run stopped before any game was generated.
        assert_eq!(run.history(), &[RunState::Pending, RunState::Validated]);
    }

    #[test]
    fn unplaceable_games_fail_after_generation() {
        // Three teams, three slots that all overlap: only one game can be played.
        let mut inventory = vec![Venue::build(1, "North"), Venue::build(2, "South"), Venue::build(3, "East")];
        inventory[0].add_slot(datetime!(2026 - 09 - 05 10:00), Duration::hours(2));
        inventory[1].add_slot(datetime!(2026 - 09 - 05 11:00), Duration::hours(2));
        inventory[2].add_slot(datetime!(2026 - 09 - 05 10:30), Duration::hours(2));

        let engine = Engine::default();
        let (roster, range, options) = (teams(3), range(), GenerationOptions::default());
        let mut run = Run::build(&engine, &roster, Format::RoundRobin, &options, &inventory, &range);

        let Err(EngineError::Scheduling { unplaced }) = run.execute() else { panic!("expected a scheduling error") };
        assert_eq!(unplaced.len(), 2);
        assert!(unplaced.iter().all(|u| matches!(u.blocker, Blocker::Team(_))));
        assert!(matches!(run.state(), RunState::Failed(reason) if reason.starts_with("scheduling error")));
        assert_eq!(run.history(), &[RunState::Pending, RunState::Validated, RunState::Generated]);
    }

    #[test]
    fn endless_slots_fail_validation() {
        let mut inventory = venues(1, 1);
        inventory[0].add_slot(datetime!(2026 - 09 - 10 10:00), Duration::MAX);
        let err = run_generation(&teams(2), Format::RoundRobin, &GenerationOptions::default(), &inventory, &range()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        // A slot that only overflows once the rest gap is added is refused as well.
        let engine = Engine::new(EngineConfig { scheduling: SchedulingRules { rest_minutes: u32::MAX, ..Default::default() } });
        let mut late = Venue::build(1, "Ground");
        late.add_slot(PrimitiveDateTime::MAX - Duration::days(1), Duration::hours(2));
        let far = DateRange::build(Date::MAX - Duration::days(2), Date::MAX).unwrap();
        let err = engine.run_generation(&teams(2), Format::RoundRobin, &GenerationOptions::default(), &[late], &far).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn reversed_date_range_fails_validation() {
        let backwards = DateRange { start: date!(2026 - 09 - 30), end: date!(2026 - 09 - 01) };
        let err = run_generation(&teams(4), Format::RoundRobin, &GenerationOptions::default(), &venues(2, 3), &backwards).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn foreign_slots_fail_validation() {
        let mut bad = venues(1, 3);
        bad[0].slots.push(TimeSlot::build(9, datetime!(2026 - 09 - 02 10:00), Duration::hours(2)));
        let err = run_generation(&teams(4), Format::RoundRobin, &GenerationOptions::default(), &bad, &range()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn duplicate_venues_fail_validation() {
        let mut dup = venues(2, 3);
        dup[1].id = 1;
        for slot in dup[1].slots.iter_mut() {
            slot.venue_id = 1;
        }
        assert!(run_generation(&teams(4), Format::RoundRobin, &GenerationOptions::default(), &dup, &range()).is_err());
    }

    #[test]
    fn advancing_without_a_bracket_fails() {
        let fixtures = run_generation(&teams(4), Format::RoundRobin, &GenerationOptions::default(), &venues(2, 3), &range()).unwrap();
        let err = Engine::default().advance_knockout(&fixtures, &[], &venues(2, 3), &range()).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }
}
