// Round robin pairings with the circle method.

use crate::{
    competition::match_generator::GameIds,
    error::Result, game::{Game, Side, Stage}, types::{convert, TeamId}
};

// Generate every round of a round robin between the given teams.
// One team stays fixed while the others rotate around it, one step per round.
// With an odd team count a bye takes the fixed place, and whoever faces it rests that round.
pub fn generate(team_ids: &[TeamId], stage: Stage, double: bool, ids: &mut GameIds) -> Result<Vec<Game>> {
    let mut circle: Vec<Side> = Vec::new();
    if team_ids.len() % 2 != 0 {
        circle.push(Side::Bye);
    }
    circle.extend(team_ids.iter().map(|id| Side::Team(*id)));

    let slots = circle.len();
    let rounds = slots.saturating_sub(1);
    let legs = if double { 2 } else { 1 };
    convert::int::<usize, u8>(rounds * legs)?;

    let mut first_leg = Vec::new();
    for round in 0..rounds {
        let ordinal = convert::int::<usize, u8>(round + 1)?;
        for i in 0..slots / 2 {
            let upper = circle[i];
            let lower = circle[slots - 1 - i];

            // The fixed team alternates, everyone else is home in the upper half.
            let (home, away) = if i == 0 && round % 2 == 1 { (lower, upper) } else { (upper, lower) };
            if home.is_bye() || away.is_bye() { continue; }

            first_leg.push(Game::build(ids.next(), home, away, stage, ordinal));
        }

        circle[1..].rotate_right(1);
    }

    if !double {
        return Ok(first_leg);
    }

    // Second leg: same rounds again with home and away reversed.
    let offset = convert::int::<usize, u8>(rounds)?;
    let mut second_leg = Vec::new();
    for game in first_leg.iter() {
        second_leg.push(game.mirrored(ids.next(), game.round + offset));
    }

    first_leg.append(&mut second_leg);
    return Ok(first_leg);
}
