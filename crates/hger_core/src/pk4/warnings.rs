use std::fmt;

use serde::{Deserialize, Serialize};

/// Advisory findings about a record. None of these stop a record from being
/// written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordWarning {
    NoSpecies,
    NoNickname,
    NoAbility,
    NoMoves,
    NoMetLevel,
}

impl RecordWarning {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoSpecies => "no_species",
            Self::NoNickname => "no_nickname",
            Self::NoAbility => "no_ability",
            Self::NoMoves => "no_moves",
            Self::NoMetLevel => "no_met_level",
        }
    }
}

impl fmt::Display for RecordWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
