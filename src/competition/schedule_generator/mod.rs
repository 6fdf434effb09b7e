// Assigning generated games to venue time slots.
// All working state lives in one Scheduler value; nothing is shared between runs.

use std::collections::BTreeMap;

use time::{Duration, PrimitiveDateTime};

use crate::{
    config::SchedulingRules,
    error::{Blocker, EngineError, Result, Unplaced},
    game::{Game, GameStatus, Stage},
    time::{format_datetime, Interval},
    types::{TeamId, VenueId},
    venue::{TimeSlot, Venue}
};

// A game that already holds its slot, as far as round ordering is concerned.
#[derive(Debug)]
#[derive(Clone)]
struct Placement {
    stage: Stage,
    round: u8,
    interval: Interval,
}

#[derive(Debug)]
pub struct Scheduler<'a> {
    rules: &'a SchedulingRules,
    slots: Vec<TimeSlot>,   // Every slot of every venue, earliest first.
    consumed: Vec<bool>,
    venue_busy: BTreeMap<VenueId, Vec<Interval>>,
    team_busy: BTreeMap<TeamId, Vec<Interval>>,
    placed: Vec<Placement>,
    assigned: Vec<Game>,
    not_before: Option<PrimitiveDateTime>,
}

// Basics.
impl<'a> Scheduler<'a> {
    pub fn new(venues: &[Venue], rules: &'a SchedulingRules) -> Self {
        let mut slots: Vec<TimeSlot> = venues.iter().flat_map(|v| v.slots.iter().copied()).collect();
        slots.sort_by(|a, b| {
            a.start.cmp(&b.start)
                .then(a.venue_id.cmp(&b.venue_id))
                .then(a.duration.cmp(&b.duration))
        });

        Self {
            rules: rules,
            consumed: vec![false; slots.len()],
            slots: slots,
            venue_busy: BTreeMap::new(),
            team_busy: BTreeMap::new(),
            placed: Vec::new(),
            assigned: Vec::new(),
            not_before: None,
        }
    }

    // No game may start before this moment.
    pub fn not_before(mut self, moment: PrimitiveDateTime) -> Self {
        self.not_before = Some(moment);
        return self;
    }

    // Treat games that already hold slots as occupied resources.
    // Fails if those games clash among themselves.
    pub fn with_existing(mut self, games: &[Game]) -> Result<Self> {
        let fixed: Vec<Game> = games.iter().filter(|g| g.slot.is_some()).cloned().collect();
        check_conflicts(&fixed, self.rules)?;
        for game in fixed {
            self.register(game);
        }

        return Ok(self);
    }
}

// Functional.
impl Scheduler<'_> {
    // Place every unscheduled game, round by round.
    // Returns the games in their input order, or every game that could not be placed.
    pub fn schedule(mut self, games: Vec<Game>) -> Result<Vec<Game>> {
        // Games that arrive with an assignment are fixed; check them first.
        let fixed: Vec<Game> = games.iter().filter(|g| g.status == GameStatus::Scheduled).cloned().collect();
        let mut everything_fixed = self.assigned.clone();
        everything_fixed.extend(fixed.iter().cloned());
        check_conflicts(&everything_fixed, self.rules)?;
        for game in fixed {
            self.register(game);
        }

        let mut rounds: BTreeMap<u8, Vec<usize>> = BTreeMap::new();
        for (i, game) in games.iter().enumerate() {
            if game.status == GameStatus::Unscheduled {
                rounds.entry(game.round).or_default().push(i);
            }
        }

        let mut games = games;
        let mut unplaced = Vec::new();
        for (round, indexes) in rounds {
            unplaced.append(&mut self.schedule_round(round, &indexes, &mut games));
        }

        if !unplaced.is_empty() {
            log::warn!("{} game(s) could not be scheduled", unplaced.len());
            return Err(EngineError::Scheduling { unplaced: unplaced });
        }

        // Final check over everything this scheduler handed out.
        check_conflicts(&self.assigned, self.rules)?;
        return Ok(games);
    }

    // Place the games of one round.
    // First pass: only slots that do not start after the round's frontier, except for the first game.
    // Retry pass: deferred games take their earliest feasible slot.
    fn schedule_round(&mut self, round: u8, indexes: &[usize], games: &mut [Game]) -> Vec<Unplaced> {
        let mut frontier: Option<PrimitiveDateTime> = None;
        let mut deferred = Vec::new();

        for index in indexes {
            match self.find_slot(&games[*index]) {
                Some(slot) if frontier.is_none_or(|f| self.slots[slot].start <= f) => {
                    let start = self.slots[slot].start;
                    frontier = Some(frontier.map_or(start, |f| f.max(start)));
                    self.assign(&mut games[*index], slot);
                },
                _ => deferred.push(*index),
            }
        }

        if !deferred.is_empty() {
            log::debug!("round {round}: retrying {} deferred game(s)", deferred.len());
        }

        let mut unplaced = Vec::new();
        for index in deferred {
            match self.find_slot(&games[index]) {
                Some(slot) => self.assign(&mut games[index], slot),
                None => {
                    let game = &games[index];
                    let blocker = self.diagnose(game);
                    log::warn!("round {round}: game {} cannot be placed ({blocker})", game.id);
                    unplaced.push(Unplaced { game_id: game.id, home: game.home, away: game.away, blocker: blocker });
                },
            }
        }

        log::debug!("round {round}: placed {} of {} game(s)", indexes.len() - unplaced.len(), indexes.len());
        return unplaced;
    }

    // Get the earliest slot the game can take.
    fn find_slot(&self, game: &Game) -> Option<usize> {
        let floor = self.get_floor(game);
        (0..self.slots.len()).find(|i| {
            let slot = &self.slots[*i];
            floor.is_none_or(|f| slot.start >= f)
            && self.is_slot_free(*i)
            && game.team_ids().iter().all(|t| self.is_team_free(*t, &slot.interval()))
        })
    }

    // Earliest allowed start for the game: not before any game of an earlier round of the same stage.
    // Knockout rounds may also have to wait for the previous round to end.
    fn get_floor(&self, game: &Game) -> Option<PrimitiveDateTime> {
        let wait_for_end = game.stage == Stage::Knockout && self.rules.sequential_knockout_rounds;

        self.placed.iter()
            .filter(|p| p.stage == game.stage && p.round < game.round)
            .map(|p| if wait_for_end { p.interval.end } else { p.interval.start })
            .chain(self.not_before)
            .max()
    }

    fn is_slot_free(&self, index: usize) -> bool {
        if self.consumed[index] { return false; }

        let slot = &self.slots[index];
        match self.venue_busy.get(&slot.venue_id) {
            Some(busy) => !busy.iter().any(|b| b.overlaps(&slot.interval(), Duration::ZERO)),
            None => true,
        }
    }

    fn is_team_free(&self, team_id: TeamId, interval: &Interval) -> bool {
        match self.team_busy.get(&team_id) {
            Some(busy) => !busy.iter().any(|b| b.overlaps(interval, self.rules.rest())),
            None => true,
        }
    }

    fn assign(&mut self, game: &mut Game, index: usize) {
        let slot = self.slots[index];
        game.assign(slot);
        self.register(game.clone());
    }

    // Mark the game's slot, venue time and team time as taken.
    fn register(&mut self, game: Game) {
        let Some(slot) = game.slot else { return };
        let interval = slot.interval();

        if let Some(i) = (0..self.slots.len()).find(|i| !self.consumed[*i] && self.slots[*i] == slot) {
            self.consumed[i] = true;
        }

        self.venue_busy.entry(slot.venue_id).or_default().push(interval);
        for team in game.team_ids() {
            self.team_busy.entry(team).or_default().push(interval);
        }

        self.placed.push(Placement { stage: game.stage, round: game.round, interval: interval });
        self.assigned.push(game);
    }

    // Work out what keeps a game from being placed.
    fn diagnose(&self, game: &Game) -> Blocker {
        let free: Vec<&TimeSlot> = (0..self.slots.len())
            .filter(|i| self.is_slot_free(*i))
            .map(|i| &self.slots[i])
            .collect();

        if free.is_empty() {
            return Blocker::NoFreeSlot;
        }

        let floor = self.get_floor(game);
        let after_floor: Vec<&&TimeSlot> = free.iter().filter(|s| floor.is_none_or(|f| s.start >= f)).collect();
        if after_floor.is_empty() {
            if let Some(f) = floor {
                return Blocker::RoundOrder { not_before: f };
            }
        }

        let teams = game.team_ids();
        for team in teams.iter() {
            if after_floor.iter().all(|s| !self.is_team_free(*team, &s.interval())) {
                return Blocker::Team(*team);
            }
        }

        // Each slot is blocked by one team or the other; name whoever blocks the earliest one.
        match after_floor.first() {
            Some(slot) => match teams.iter().find(|t| !self.is_team_free(**t, &slot.interval())) {
                Some(team) => Blocker::Team(*team),
                None => Blocker::NoFreeSlot,
            },
            None => Blocker::NoFreeSlot,
        }
    }
}

// Assign the games to the venues' slots.
pub fn schedule(games: Vec<Game>, venues: &[Venue], rules: &SchedulingRules) -> Result<Vec<Game>> {
    Scheduler::new(venues, rules).schedule(games)
}

// Check that no venue hosts two overlapping games and no team plays two overlapping games.
pub fn check_conflicts(games: &[Game], rules: &SchedulingRules) -> Result<()> {
    let mut unplaced = Vec::new();

    for (i, a) in games.iter().enumerate() {
        let Some(a_interval) = a.interval() else { continue };

        for b in games[..i].iter() {
            let Some(b_interval) = b.interval() else { continue };

            let venue_clash = a.venue_id == b.venue_id && a_interval.overlaps(&b_interval, Duration::ZERO);
            let team_clash = a.team_ids().iter().any(|t| b.involves(*t)) && a_interval.overlaps(&b_interval, rules.rest());

            if venue_clash || team_clash {
                log::warn!("game {} at {} clashes with game {}", a.id, format_datetime(&a_interval.start), b.id);
                unplaced.push(Unplaced { game_id: a.id, home: a.home, away: a.away, blocker: Blocker::Conflict { other: b.id } });
                break;
            }
        }
    }

    if unplaced.is_empty() {
        return Ok(());
    }

    return Err(EngineError::Scheduling { unplaced: unplaced });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        competition::match_generator::{round_robin, GameIds},
        game::Side
    };
    use proptest::prelude::*;
    use time::macros::datetime;

    fn four_team_round_robin() -> Vec<Game> {
        round_robin::generate(&[1, 2, 3, 4], Stage::Group(0), false, &mut GameIds::starting_at(1)).unwrap()
    }

    // Two venues, three back-to-back two-hour slots each.
    fn two_venues() -> Vec<Venue> {
        (1..=2).map(|id| Venue::with_regular_slots(id, &format!("Court {id}"), datetime!(2026 - 07 - 04 09:00), Duration::hours(2), Duration::hours(3), 3)).collect()
    }

    fn assert_no_conflicts(games: &[Game]) {
        check_conflicts(games, &SchedulingRules::default()).unwrap();
    }

    #[test]
    fn six_games_fill_two_venues() {
        let rules = SchedulingRules::default();
        let games = schedule(four_team_round_robin(), &two_venues(), &rules).unwrap();

        assert_eq!(games.len(), 6);
        assert!(games.iter().all(|g| g.status == GameStatus::Scheduled));
        assert_no_conflicts(&games);

        // Both venues are used at the same time.
        let first_round: Vec<&Game> = games.iter().filter(|g| g.round == 1).collect();
        assert_eq!(first_round[0].start(), first_round[1].start());
        assert_ne!(first_round[0].venue_id, first_round[1].venue_id);

        let again = schedule(four_team_round_robin(), &two_venues(), &rules).unwrap();
        assert_eq!(games, again);
    }

    #[test]
    fn later_rounds_never_start_earlier() {
        let games = schedule(four_team_round_robin(), &two_venues(), &SchedulingRules::default()).unwrap();
        for game in games.iter() {
            for earlier in games.iter().filter(|g| g.round < game.round) {
                assert!(game.start() >= earlier.start());
            }
        }
    }

    #[test]
    fn overlapping_slots_cannot_share_a_team() {
        let mut venues = vec![Venue::build(1, "North"), Venue::build(2, "South")];
        venues[0].add_slot(datetime!(2026 - 07 - 04 10:00), Duration::hours(2));
        venues[1].add_slot(datetime!(2026 - 07 - 04 11:00), Duration::hours(2));

        let games = vec![
            Game::build(1, Side::Team(1), Side::Team(2), Stage::Group(0), 1),
            Game::build(2, Side::Team(1), Side::Team(3), Stage::Group(0), 2),
        ];

        let err = schedule(games, &venues, &SchedulingRules::default()).unwrap_err();
        let EngineError::Scheduling { unplaced } = err else { panic!("expected a scheduling error") };
        assert_eq!(unplaced.len(), 1);
        assert_eq!(unplaced[0].game_id, 2);
        assert_eq!(unplaced[0].blocker, Blocker::Team(1));
    }

    #[test]
    fn pre_assigned_clash_is_refused() {
        let mut a = Game::build(1, Side::Team(1), Side::Team(2), Stage::Group(0), 1);
        let mut b = Game::build(2, Side::Team(1), Side::Team(3), Stage::Group(0), 2);
        a.assign(TimeSlot::build(1, datetime!(2026 - 07 - 04 10:00), Duration::hours(2)));
        b.assign(TimeSlot::build(2, datetime!(2026 - 07 - 04 11:00), Duration::hours(2)));

        let err = schedule(vec![a, b], &two_venues(), &SchedulingRules::default()).unwrap_err();
        let EngineError::Scheduling { unplaced } = err else { panic!("expected a scheduling error") };
        assert_eq!(unplaced[0].blocker, Blocker::Conflict { other: 1 });
    }

    #[test]
    fn venue_double_booking_is_refused() {
        let mut a = Game::build(1, Side::Team(1), Side::Team(2), Stage::Group(0), 1);
        let mut b = Game::build(2, Side::Team(3), Side::Team(4), Stage::Group(0), 1);
        a.assign(TimeSlot::build(1, datetime!(2026 - 07 - 04 10:00), Duration::hours(2)));
        b.assign(TimeSlot::build(1, datetime!(2026 - 07 - 04 10:00), Duration::hours(2)));
        assert!(check_conflicts(&[a, b], &SchedulingRules::default()).is_err());
    }

    #[test]
    fn running_out_of_slots_names_every_game() {
        let venues = vec![Venue::with_regular_slots(1, "Hall", datetime!(2026 - 07 - 04 09:00), Duration::hours(2), Duration::hours(3), 2)];
        let err = schedule(four_team_round_robin(), &venues, &SchedulingRules::default()).unwrap_err();
        let EngineError::Scheduling { unplaced } = err else { panic!("expected a scheduling error") };
        assert_eq!(unplaced.len(), 4);
        assert!(unplaced.iter().all(|u| u.blocker == Blocker::NoFreeSlot));
    }

    #[test]
    fn round_order_blocks_early_slots() {
        let mut venue = Venue::build(1, "Hall");
        venue.add_slot(datetime!(2026 - 07 - 04 12:00), Duration::hours(2));
        venue.add_slot(datetime!(2026 - 07 - 04 09:00), Duration::hours(2));

        // Round 2 listed first still waits for round 1.
        let games = vec![
            Game::build(2, Side::Team(3), Side::Team(4), Stage::Group(0), 2),
            Game::build(1, Side::Team(1), Side::Team(2), Stage::Group(0), 1),
        ];
        let games = schedule(games, &[venue], &SchedulingRules::default()).unwrap();
        assert_eq!(games[1].start(), Some(datetime!(2026 - 07 - 04 09:00)));
        assert_eq!(games[0].start(), Some(datetime!(2026 - 07 - 04 12:00)));
    }

    #[test]
    fn only_early_slots_left_is_a_round_order_block() {
        let mut venue = Venue::build(1, "Hall");
        venue.add_slot(datetime!(2026 - 07 - 04 09:00), Duration::hours(2));
        venue.add_slot(datetime!(2026 - 07 - 04 12:00), Duration::hours(2));

        // Round 1 already holds the 12:00 slot, so round 2 cannot take 09:00.
        let mut first = Game::build(1, Side::Team(1), Side::Team(2), Stage::Group(0), 1);
        first.assign(TimeSlot::build(1, datetime!(2026 - 07 - 04 12:00), Duration::hours(2)));
        let second = Game::build(2, Side::Team(3), Side::Team(4), Stage::Group(0), 2);

        let err = schedule(vec![first, second], &[venue], &SchedulingRules::default()).unwrap_err();
        let EngineError::Scheduling { unplaced } = err else { panic!("expected a scheduling error") };
        assert_eq!(unplaced.len(), 1);
        assert_eq!(unplaced[0].game_id, 2);
        assert_eq!(unplaced[0].blocker, Blocker::RoundOrder { not_before: datetime!(2026 - 07 - 04 12:00) });
    }

    #[test]
    fn rest_gap_spreads_a_teams_games() {
        let venues = vec![Venue::with_regular_slots(1, "Hall", datetime!(2026 - 07 - 04 09:00), Duration::hours(2), Duration::hours(2), 4)];
        let games = vec![
            Game::build(1, Side::Team(1), Side::Team(2), Stage::Group(0), 1),
            Game::build(2, Side::Team(1), Side::Team(3), Stage::Group(0), 2),
        ];

        let rules = SchedulingRules { rest_minutes: 60, ..Default::default() };
        let games = schedule(games, &venues, &rules).unwrap();
        assert_eq!(games[1].start(), Some(datetime!(2026 - 07 - 04 13:00)));
    }

    #[test]
    fn frontier_keeps_rounds_compact() {
        // Game 2 shares team 1 with game 1, so it is deferred and game 3 fills the first window.
        let venues = two_venues();
        let games = vec![
            Game::build(1, Side::Team(1), Side::Team(2), Stage::Group(0), 1),
            Game::build(2, Side::Team(1), Side::Team(3), Stage::Group(0), 1),
            Game::build(3, Side::Team(4), Side::Team(5), Stage::Group(0), 1),
        ];
        let games = schedule(games, &venues, &SchedulingRules::default()).unwrap();
        assert_eq!(games[0].start(), games[2].start());
        assert_eq!(games[1].start(), Some(datetime!(2026 - 07 - 04 12:00)));
    }

    #[test]
    fn knockout_rounds_wait_for_the_previous_round() {
        let venues = vec![Venue::with_regular_slots(1, "Hall", datetime!(2026 - 07 - 04 09:00), Duration::hours(2), Duration::hours(1), 6)];
        let games = vec![
            Game::build(1, Side::Team(1), Side::Team(2), Stage::Knockout, 1),
            Game::build(2, Side::Team(3), Side::Team(4), Stage::Knockout, 2),
        ];
        let games = schedule(games, &venues, &SchedulingRules::default()).unwrap();
        assert_eq!(games[1].start(), Some(datetime!(2026 - 07 - 04 11:00)));
    }

    proptest! {
        #[test]
        fn prop_scheduling_is_idempotent_and_conflict_free(n in 2u16..12, venue_count in 1u16..4) {
            let teams: Vec<TeamId> = (1..=n).collect();
            let games = round_robin::generate(&teams, Stage::Group(0), false, &mut GameIds::starting_at(1)).unwrap();
            let venues: Vec<Venue> = (1..=venue_count)
                .map(|id| Venue::with_regular_slots(id, "Ground", datetime!(2026 - 07 - 04 09:00), Duration::hours(2), Duration::hours(2), 80))
                .collect();

            let rules = SchedulingRules::default();
            let first = schedule(games.clone(), &venues, &rules).unwrap();
            let second = schedule(games, &venues, &rules).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert!(check_conflicts(&first, &rules).is_ok());
            prop_assert!(first.iter().all(|g| g.status == GameStatus::Scheduled));
        }
    }
}
