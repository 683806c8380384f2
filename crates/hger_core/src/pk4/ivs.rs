use serde::{Deserialize, Serialize};

use crate::game_data::Stat;

const IV_MASK: u32 = 0x1F;
const IV_BITS: usize = 5;
const EGG_BIT: u32 = 1 << 30;
const NICKNAMED_BIT: u32 = 1 << 31;

pub const MAX_IV: u8 = IV_MASK as u8;

/// The packed IV word: six 5-bit values followed by the egg and nicknamed
/// flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IvWord(u32);

impl IvWord {
    pub(crate) fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub(crate) fn raw(self) -> u32 {
        self.0
    }

    fn shift(stat: Stat) -> usize {
        stat.index() * IV_BITS
    }

    pub fn get(self, stat: Stat) -> u8 {
        ((self.0 >> Self::shift(stat)) & IV_MASK) as u8
    }

    /// Values above 31 are masked to five bits.
    pub fn set(&mut self, stat: Stat, value: u8) {
        let shift = Self::shift(stat);
        self.0 = (self.0 & !(IV_MASK << shift)) | ((u32::from(value) & IV_MASK) << shift);
    }

    /// All six IVs in record order.
    pub fn all(self) -> [u8; 6] {
        Stat::ALL.map(|stat| self.get(stat))
    }

    pub fn is_egg(self) -> bool {
        self.0 & EGG_BIT != 0
    }

    pub fn set_egg(&mut self, egg: bool) {
        self.set_flag(EGG_BIT, egg);
    }

    pub fn is_nicknamed(self) -> bool {
        self.0 & NICKNAMED_BIT != 0
    }

    pub fn set_nicknamed(&mut self, nicknamed: bool) {
        self.set_flag(NICKNAMED_BIT, nicknamed);
    }

    fn set_flag(&mut self, bit: u32, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_one_iv_leaves_neighbours_and_flags() {
        let mut word = IvWord::from_raw(u32::MAX);
        word.set(Stat::Defense, 0);
        assert_eq!(word.get(Stat::Defense), 0);
        assert_eq!(word.get(Stat::Attack), 31);
        assert_eq!(word.get(Stat::Speed), 31);
        assert!(word.is_egg());
        assert!(word.is_nicknamed());
        assert_eq!(word.raw(), !(0x1F << 10));
    }

    #[test]
    fn iv_values_are_masked() {
        let mut word = IvWord::default();
        word.set(Stat::SpDefense, 0xFF);
        assert_eq!(word.get(Stat::SpDefense), 31);
        assert!(!word.is_egg());
        assert_eq!(word.raw(), 0x1F << 25);
    }

    #[test]
    fn flags_toggle_independently() {
        let mut word = IvWord::default();
        word.set_nicknamed(true);
        assert_eq!(word.raw(), 0x8000_0000);
        word.set_egg(true);
        word.set_nicknamed(false);
        assert_eq!(word.raw(), 0x4000_0000);
        assert_eq!(word.all(), [0; 6]);
    }
}
