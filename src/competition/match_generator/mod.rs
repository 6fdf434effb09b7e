// Generating the full set of unscheduled games for a competition format.
pub mod round_robin;
pub mod knockout;

use serde::{Deserialize, Serialize};

use crate::{
    competition::{
        format::{Format, GenerationOptions},
        seeding::{bracket_slots, distribute_into_groups_with_draw, seed_bracket_with_draw, seeding_order}
    },
    error::{EngineError, Result}, game::{Game, Side, Stage}, team::{Group, Team}, types::{GameId, TeamId}
};

use self::knockout::Bracket;

// Hands out game ids in generation order.
#[derive(Debug)]
#[derive(Clone)]
pub struct GameIds {
    next: GameId,
}

impl GameIds {
    pub fn starting_at(first: GameId) -> Self {
        Self { next: first }
    }

    pub fn next(&mut self) -> GameId {
        let id = self.next;
        self.next += 1;
        return id;
    }

    // The id the next game will get.
    pub fn peek(&self) -> GameId {
        self.next
    }
}

// Everything the pairing generator produces.
#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, PartialEq)]
pub struct Pairings {
    pub games: Vec<Game>,
    pub groups: Vec<Group>,
    pub bracket: Option<Bracket>,
}

// Generate the games of a format. For groups plus knockout only the group stage exists at this point;
// the bracket is seeded later from the qualifiers with start_knockout.
pub fn generate(teams: &[Team], format: Format, options: &GenerationOptions) -> Result<Pairings> {
    format.validate(teams, options)?;
    let mut ids = GameIds::starting_at(1);

    let pairings = match format {
        Format::RoundRobin => {
            let mut league = Group::build(0, "League");
            league.teams = seeding_order(teams, options.draw_seed).iter().map(|t| t.id).collect();
            let games = round_robin::generate(&league.teams, Stage::Group(league.id), options.double_round_robin, &mut ids)?;

            Pairings { games: games, groups: vec![league], bracket: None }
        },
        Format::Knockout => {
            let slots = seed_bracket_with_draw(teams, options.draw_seed);
            let (bracket, games) = Bracket::build(&slots, &mut ids)?;

            Pairings { games: games, groups: Vec::new(), bracket: Some(bracket) }
        },
        Format::GroupsPlusKnockout => {
            let groups = distribute_into_groups_with_draw(teams, options.group_count as usize, options.draw_seed)?;
            let mut games = Vec::new();
            for group in groups.iter() {
                games.append(&mut round_robin::generate(&group.teams, Stage::Group(group.id), options.double_round_robin, &mut ids)?);
            }

            Pairings { games: games, groups: groups, bracket: None }
        },
    };

    log::debug!("generated {} games for {:?}", pairings.games.len(), format);
    return Ok(pairings);
}

// Seed the knockout stage of a groups-plus-knockout competition.
// Qualifiers come per group, best first, in the same order as the groups.
// Group winners take the top seeds, runners-up the next ones, and so on.
pub fn start_knockout(groups: &[Group], qualifiers: &[Vec<TeamId>], qualifiers_per_group: usize, first_id: GameId) -> Result<(Bracket, Vec<Game>)> {
    if qualifiers.len() != groups.len() {
        return Err(EngineError::validation(format!("expected qualifiers for {} groups, got {}", groups.len(), qualifiers.len())));
    }

    for (group, teams) in groups.iter().zip(qualifiers.iter()) {
        if teams.len() != qualifiers_per_group {
            return Err(EngineError::validation(format!("group {} must send {qualifiers_per_group} teams, got {}", group.name, teams.len())));
        }

        if let Some(stranger) = teams.iter().find(|id| !group.contains(**id)) {
            return Err(EngineError::validation(format!("team {stranger} is not in group {}", group.name)));
        }
    }

    let mut ordered: Vec<TeamId> = Vec::new();
    for position in 0..qualifiers_per_group {
        for teams in qualifiers.iter() {
            if ordered.contains(&teams[position]) {
                return Err(EngineError::validation(format!("team {} qualified twice", teams[position])));
            }
            ordered.push(teams[position]);
        }
    }

    if ordered.len() < 2 {
        return Err(EngineError::validation("the knockout stage needs at least 2 qualifiers"));
    }

    let mut slots = bracket_slots(&ordered);
    separate_group_rematches(&mut slots, groups);
    return Bracket::build(&slots, &mut GameIds::starting_at(first_id));
}

// Swap first round away sides so that no two teams of the same group meet, where another pairing allows it.
// Home sides are the better seeds and keep their places. Byes are never moved.
fn separate_group_rematches(slots: &mut [Side], groups: &[Group]) {
    let pairs = slots.len() / 2;
    let movable: Vec<usize> = (0..pairs).filter(|j| !slots[2 * j + 1].is_bye()).collect();

    for i in 0..pairs {
        if !is_rematch(slots[2 * i], slots[2 * i + 1], groups) { continue; }

        for j in movable.iter().copied().filter(|j| *j != i) {
            slots.swap(2 * i + 1, 2 * j + 1);
            if !is_rematch(slots[2 * i], slots[2 * i + 1], groups) && !is_rematch(slots[2 * j], slots[2 * j + 1], groups) {
                log::debug!("moved a group rematch out of the first knockout round");
                break;
            }
            slots.swap(2 * i + 1, 2 * j + 1);
        }
    }
}

fn is_rematch(home: Side, away: Side, groups: &[Group]) -> bool {
    let group_of = |side: Side| side.team().and_then(|id| groups.iter().position(|g| g.contains(id)));
    let home = group_of(home);
    home.is_some() && home == group_of(away)
}
