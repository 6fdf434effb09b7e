// Custom types that are widely used are defined here.

// ID types.
pub type TeamId = u16;
pub type VenueId = u16;
pub type GameId = u32;
pub type GroupId = u8;

// Seed rank. The lower the value, the stronger the team.
pub type SeedRank = u16;

// Type conversions.
pub mod convert {
    use std::fmt::Display;

    use crate::error::{EngineError, Result};

    // Convert between integers.
    pub fn int<N1: Display + Copy, N2: TryFrom<N1>>(num: N1) -> Result<N2> {
        match num.try_into() {
            Ok(n) => Ok(n),
            Err(_) => Err(EngineError::Validation(format!("number {num} is out of range"))),
        }
    }
}
