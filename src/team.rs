// Teams and the groups they are distributed into.
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::types::{GroupId, SeedRank, TeamId};

#[derive(Debug, Serialize, Deserialize)]
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: TeamId,
    pub name: String,

    // Only used for bracket and group seeding.
    // The lower the value, the better the seed is.
    pub seed: SeedRank,
}

// Basics.
impl Team {
    pub fn build(id: TeamId, name: &str, seed: SeedRank) -> Self {
        Self {
            id: id,
            name: name.to_string(),
            seed: seed,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[derive(Default, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub teams: Vec<TeamId>,  // In the order they were dealt, strongest first.
}

// Basics.
impl Group {
    pub fn build(id: GroupId, name: &str) -> Self {
        Self {
            id: id,
            name: name.to_string(),
            teams: Vec::new(),
        }
    }

    // The name of a group in a groups-plus-knockout competition: A, B, C...
    pub fn letter_name(index: usize) -> String {
        let letters = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";
        match letters.get(index) {
            Some(c) => (*c as char).to_string(),
            _ => format!("Group {}", index + 1),
        }
    }

    pub fn contains(&self, team_id: TeamId) -> bool {
        self.teams.contains(&team_id)
    }

    // Get JSON for the API layer.
    pub fn summary_json(&self) -> serde_json::Value {
        json!({
            "id": self.id,
            "name": self.name,
            "teams": self.teams,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_names_run_through_the_alphabet() {
        assert_eq!(Group::letter_name(0), "A");
        assert_eq!(Group::letter_name(25), "Z");
        assert_eq!(Group::letter_name(26), "Group 27");
    }
}
