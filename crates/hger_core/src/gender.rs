use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Genderless,
    Unknown(u8),
}

impl Gender {
    pub const MALE_RAW: u8 = 0;
    pub const FEMALE_RAW: u8 = 1;
    pub const GENDERLESS_RAW: u8 = 2;

    pub fn from_raw(raw: u8) -> Self {
        match raw {
            Self::MALE_RAW => Self::Male,
            Self::FEMALE_RAW => Self::Female,
            Self::GENDERLESS_RAW => Self::Genderless,
            other => Self::Unknown(other),
        }
    }

    pub fn raw(&self) -> u8 {
        match *self {
            Self::Male => Self::MALE_RAW,
            Self::Female => Self::FEMALE_RAW,
            Self::Genderless => Self::GENDERLESS_RAW,
            Self::Unknown(other) => other,
        }
    }

    /// Derive a creature's gender from its PID and the species' gender ratio.
    pub fn from_ratio(pid: u32, ratio: u8) -> Self {
        match ratio {
            255 => Self::Genderless,
            254 => Self::Female,
            0 => Self::Male,
            threshold if ((pid & 0xFF) as u8) < threshold => Self::Female,
            _ => Self::Male,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Male => "Male",
            Self::Female => "Female",
            Self::Genderless => "Genderless",
            Self::Unknown(_) => "Unknown",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Unknown(v) => write!(f, "Unknown ({})", v),
            _ => f.write_str(self.as_str()),
        }
    }
}
