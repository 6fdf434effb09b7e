// Engine configuration, read from JSON.
use std::{fs::File, io::Read, path::Path};

use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{error::Result, time::get_duration_from_minutes};

#[derive(Debug, Serialize, Deserialize)]
#[derive(Default, Clone, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    pub scheduling: SchedulingRules,
}

// Rules the scheduler follows on top of the hard conflict constraints.
#[derive(Debug, Serialize, Deserialize)]
#[derive(Clone, PartialEq)]
#[serde(default)]
pub struct SchedulingRules {
    pub rest_minutes: u32,  // Minimum gap between two matches of the same team.
    pub sequential_knockout_rounds: bool,   // Next knockout round starts only after the previous one has ended.
}

impl Default for SchedulingRules {
    fn default() -> Self {
        Self {
            rest_minutes: 0,
            sequential_knockout_rounds: true,
        }
    }
}

impl SchedulingRules {
    pub fn rest(&self) -> Duration {
        get_duration_from_minutes(self.rest_minutes)
    }
}

impl EngineConfig {
    // Parse a configuration from a JSON string. Missing fields get their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let config = serde_json::from_str(json)?;
        return Ok(config);
    }

    // Read a JSON configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let mut json = String::new();
        let mut file = File::open(path)?;
        file.read_to_string(&mut json)?;
        log::debug!("loaded engine config from {}", path.display());
        return Self::from_json(&json);
    }
}
