// Ordering and distributing teams by seed: serpentine group deals and bracket seeding.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

use crate::{
    competition::format::knockout_round::KnockoutRound as KnockoutRoundFormat,
    error::{EngineError, Result}, game::Side, team::{Group, Team}, types::{convert, GroupId, SeedRank, TeamId}
};

// Create pots of teams sharing a seed rank. Top seeds are first, bottom seeds are last.
fn create_pots(teams: &[Team]) -> Vec<(SeedRank, Vec<Team>)> {
    let mut pots: Vec<(SeedRank, Vec<Team>)> = Vec::new();
    for team in teams.iter() {
        match pots.iter().position(|pot| pot.0 == team.seed) {
            // Add team to an existing pot.
            Some(i) => pots[i].1.push(team.clone()),
            // Create a new pot if one does not exist.
            _ => pots.push((team.seed, vec![team.clone()]))
        }
    }

    // Sorting by seeds, and by id inside a pot so the input order never matters.
    pots.sort_by(|a, b| a.0.cmp(&b.0));
    for pot in pots.iter_mut() {
        pot.1.sort_by_key(|t| t.id);
    }

    return pots;
}

// Get the teams from strongest to weakest.
// With a draw seed, teams in the same pot are drawn into a reproducible random order.
pub fn seeding_order(teams: &[Team], draw_seed: Option<u64>) -> Vec<Team> {
    let mut rng = draw_seed.map(StdRng::seed_from_u64);
    let mut ordered = Vec::new();

    for (_, mut pot) in create_pots(teams) {
        if let Some(rng) = rng.as_mut() {
            pot.shuffle(rng);
        }
        ordered.append(&mut pot);
    }

    return ordered;
}

// Deal the teams into groups in snake order: forward through the groups, then back, and so on.
pub fn distribute_into_groups(teams: &[Team], group_count: usize) -> Result<Vec<Group>> {
    distribute_into_groups_with_draw(teams, group_count, None)
}

pub fn distribute_into_groups_with_draw(teams: &[Team], group_count: usize, draw_seed: Option<u64>) -> Result<Vec<Group>> {
    if group_count < 1 || group_count > teams.len() {
        return Err(EngineError::validation(format!("cannot split {} teams into {group_count} groups", teams.len())));
    }

    let mut groups = Vec::new();
    for i in 0..group_count {
        groups.push(Group::build(convert::int::<usize, GroupId>(i)?, &Group::letter_name(i)));
    }

    for (i, team) in seeding_order(teams, draw_seed).iter().enumerate() {
        let pass = i / group_count;
        let position = i % group_count;
        let index = if pass % 2 == 0 { position } else { group_count - 1 - position };
        groups[index].teams.push(team.id);
    }

    return Ok(groups);
}

// Get the seed numbers in bracket slot order.
// Seed 1 faces the weakest seed, and seeds 1 and 2 are in opposite halves.
pub fn bracket_positions(size: usize) -> Vec<usize> {
    let mut positions = vec![1];
    while positions.len() < size {
        let next_size = positions.len() * 2;
        positions = positions.iter()
            .flat_map(|seed| [*seed, next_size + 1 - seed])
            .collect();
    }

    return positions;
}

// Lay the teams out in a bracket, padded to a power of two with byes.
// Byes land next to the highest seeds.
pub fn seed_bracket(teams: &[Team]) -> Vec<Side> {
    seed_bracket_with_draw(teams, None)
}

pub fn seed_bracket_with_draw(teams: &[Team], draw_seed: Option<u64>) -> Vec<Side> {
    let ordered: Vec<TeamId> = seeding_order(teams, draw_seed).iter().map(|t| t.id).collect();
    bracket_slots(&ordered)
}

// Lay out teams that are already in seed order.
pub fn bracket_slots(ordered: &[TeamId]) -> Vec<Side> {
    let size = KnockoutRoundFormat::bracket_size(ordered.len());
    bracket_positions(size).iter()
        .map(|seed| match ordered.get(seed - 1) {
            Some(id) => Side::Team(*id),
            None => Side::Bye,
        })
        .collect()
}
