//! Lookup interfaces consumed by the record codec.
//!
//! The codec never owns table contents. Callers hand it something that
//! implements [`GameData`]; [`crate::core_api::GameTables`] is the stock
//! implementation loaded from a data directory.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const NATURE_COUNT: u8 = 25;

pub const NATURE_NAMES: [&str; NATURE_COUNT as usize] = [
    "Hardy", "Lonely", "Brave", "Adamant", "Naughty", "Bold", "Docile", "Relaxed", "Impish", "Lax",
    "Timid", "Hasty", "Serious", "Jolly", "Naive", "Modest", "Mild", "Quiet", "Bashful", "Rash",
    "Calm", "Gentle", "Sassy", "Careful", "Quirky",
];

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 100;

pub fn nature_name(nature: u8) -> &'static str {
    NATURE_NAMES
        .get(usize::from(nature))
        .copied()
        .unwrap_or("Unknown")
}

/// Case-insensitive lookup of a nature by English name.
pub fn nature_from_name(name: &str) -> Option<u8> {
    NATURE_NAMES
        .iter()
        .position(|n| n.eq_ignore_ascii_case(name.trim()))
        .map(|idx| idx as u8)
}

/// The six stats, in the order the record stores EVs, IVs and battle stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stat {
    Hp,
    Attack,
    Defense,
    Speed,
    SpAttack,
    SpDefense,
}

impl Stat {
    pub const ALL: [Stat; 6] = [
        Stat::Hp,
        Stat::Attack,
        Stat::Defense,
        Stat::Speed,
        Stat::SpAttack,
        Stat::SpDefense,
    ];

    /// Position in the record's stat ordering.
    pub fn index(self) -> usize {
        match self {
            Self::Hp => 0,
            Self::Attack => 1,
            Self::Defense => 2,
            Self::Speed => 3,
            Self::SpAttack => 4,
            Self::SpDefense => 5,
        }
    }

    /// Column in the nature table. HP is never affected by nature.
    pub fn nature_index(self) -> Option<u8> {
        match self {
            Self::Hp => None,
            Self::Attack => Some(0),
            Self::Defense => Some(1),
            Self::Speed => Some(2),
            Self::SpAttack => Some(3),
            Self::SpDefense => Some(4),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Hp => "HP",
            Self::Attack => "Atk",
            Self::Defense => "Def",
            Self::Speed => "Spe",
            Self::SpAttack => "SpA",
            Self::SpDefense => "SpD",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub hp: u8,
    pub atk: u8,
    pub def: u8,
    pub spa: u8,
    pub spd: u8,
    pub spe: u8,
}

impl BaseStats {
    pub fn get(&self, stat: Stat) -> u8 {
        match stat {
            Stat::Hp => self.hp,
            Stat::Attack => self.atk,
            Stat::Defense => self.def,
            Stat::Speed => self.spe,
            Stat::SpAttack => self.spa,
            Stat::SpDefense => self.spd,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GrowthRate {
    #[default]
    MediumFast,
    Erratic,
    Fluctuating,
    MediumSlow,
    Fast,
    Slow,
}

impl GrowthRate {
    /// Parse the names used by `growth_rates.csv`. Unknown names are
    /// Medium Fast.
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "Erratic" => Self::Erratic,
            "Fluctuating" => Self::Fluctuating,
            "Medium Slow" => Self::MediumSlow,
            "Fast" => Self::Fast,
            "Slow" => Self::Slow,
            _ => Self::MediumFast,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MediumFast => "Medium Fast",
            Self::Erratic => "Erratic",
            Self::Fluctuating => "Fluctuating",
            Self::MediumSlow => "Medium Slow",
            Self::Fast => "Fast",
            Self::Slow => "Slow",
        }
    }

    /// Total experience required to reach `level`. Levels above 100 are
    /// treated as 100; level 0 needs nothing.
    pub fn exp_for_level(self, level: u8) -> u32 {
        if level == 0 {
            return 0;
        }
        let n = i64::from(level.min(MAX_LEVEL));
        let cube = n * n * n;

        let exp = match self {
            Self::MediumFast => cube,
            Self::Erratic => {
                if n < 50 {
                    cube * (100 - n) / 50
                } else if n < 68 {
                    cube * (150 - n) / 100
                } else if n < 98 {
                    cube * ((1911 - 10 * n) / 3) / 500
                } else {
                    cube * (160 - n) / 100
                }
            }
            Self::Fluctuating => {
                if n < 15 {
                    cube * ((n + 1) / 3 + 24) / 50
                } else if n < 36 {
                    cube * (n + 14) / 50
                } else {
                    cube * (n / 2 + 32) / 50
                }
            }
            Self::MediumSlow => ((6 * cube - 75 * n * n + 500 * n - 700).div_euclid(5)).max(0),
            Self::Fast => 4 * cube / 5,
            Self::Slow => 5 * cube / 4,
        };

        exp as u32
    }

    /// Highest level whose threshold does not exceed `exp`.
    pub fn level_for_exp(self, exp: u32) -> u8 {
        (MIN_LEVEL..=MAX_LEVEL)
            .rev()
            .find(|&level| self.exp_for_level(level) <= exp)
            .unwrap_or(MIN_LEVEL)
    }
}

impl fmt::Display for GrowthRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 1.1 for the boosted stat, 0.9 for the lowered one, 1.0 otherwise and for
/// the five neutral natures.
pub fn default_nature_modifier(nature: u8, stat: Stat) -> f64 {
    let Some(column) = stat.nature_index() else {
        return 1.0;
    };
    if nature >= NATURE_COUNT {
        return 1.0;
    }

    let boost = nature / 5;
    let reduce = nature % 5;
    if boost == reduce {
        1.0
    } else if column == boost {
        1.1
    } else if column == reduce {
        0.9
    } else {
        1.0
    }
}

/// Species-keyed lookups needed to derive gender, level and stats.
pub trait GameData {
    fn base_stats(&self, species: u16, form: u8) -> Option<BaseStats>;

    fn growth_rate(&self, species: u16) -> GrowthRate;

    /// 0 all male, 254 all female, 255 genderless, otherwise the female
    /// threshold on the PID's low byte.
    fn gender_ratio(&self, species: u16) -> u8;

    fn nature_modifier(&self, nature: u8, stat: Stat) -> f64 {
        default_nature_modifier(nature, stat)
    }

    fn exp_for_level(&self, rate: GrowthRate, level: u8) -> u32 {
        rate.exp_for_level(level)
    }
}
