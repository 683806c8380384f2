//! Creature records.
//!
//! A [`Pk4`] always holds its bytes decrypted and in logical block order.
//! Field accessors read and write those bytes directly; [`Pk4::encrypt`]
//! produces the on-disk form again.

mod ivs;
pub(crate) mod offsets;
mod warnings;

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::crypto::{self, BATTLE_STATS_START, SIZE_PARTY, SIZE_STORED, ShuffleResolver};
use crate::game_data::{GameData, MAX_LEVEL, MIN_LEVEL, NATURE_COUNT, Stat};
use crate::gender::Gender;
use crate::reader::{read_u8, read_u16, read_u32, write_u8, write_u16, write_u32};
use crate::text::CharTable;

pub use ivs::{IvWord, MAX_IV};
pub use warnings::RecordWarning;

const SPECIES_DISPLAY_THRESHOLD: u16 = 494;
const SPECIES_STORED_THRESHOLD: u16 = 544;
const SPECIES_STORED_OFFSET: u16 = 50;

/// Highest species ID whose stored form still fits the species word.
pub const MAX_SPECIES: u16 = u16::MAX - SPECIES_STORED_OFFSET;

pub const MOVE_COUNT: usize = 4;
const MOVE_EMPTY: u16 = 0xFFFF;

const FORM_SHIFT: u8 = 3;
const FORM_KEEP_MASK: u8 = 0x07;
const MET_LEVEL_MASK: u8 = 0x7F;
const OT_FEMALE_BIT: u8 = 0x80;
const SHINY_THRESHOLD: u16 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecordKind {
    /// 136-byte boxed record.
    Stored,
    /// 236-byte party record with battle stats.
    Party,
}

impl RecordKind {
    pub fn size(self) -> usize {
        match self {
            Self::Stored => SIZE_STORED,
            Self::Party => SIZE_PARTY,
        }
    }

    pub fn from_len(len: usize) -> Option<Self> {
        match len {
            SIZE_STORED => Some(Self::Stored),
            SIZE_PARTY => Some(Self::Party),
            _ => None,
        }
    }
}

/// Year (offset from 2000), month and day as stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordDate {
    pub year: u8,
    pub month: u8,
    pub day: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pk4 {
    data: Vec<u8>,
    /// Whether the stored checksum matched when the record was decoded.
    /// Explicit blanks count as matching.
    checksum_ok: bool,
    /// Block order the record was found in when it differs from the PID's.
    shuffle_override: Option<usize>,
}

impl Pk4 {
    pub fn decrypt(raw: &[u8]) -> Result<Self, CoreError> {
        Self::decrypt_with(raw, ShuffleResolver::Fixed)
    }

    pub fn decrypt_with(raw: &[u8], resolver: ShuffleResolver) -> Result<Self, CoreError> {
        check_len(raw.len())?;

        let (data, sv) = crypto::decrypt_record(raw, resolver);
        let checksum_ok = crypto::checksum(&data) == read_u16(&data, crypto::OFS_CHECKSUM);
        let standard = crypto::shuffle_value(read_u32(&data, crypto::OFS_PID));

        Ok(Self {
            data,
            checksum_ok,
            shuffle_override: (sv != standard).then_some(sv),
        })
    }

    /// Wrap bytes that are already decrypted and in logical order.
    pub fn from_decrypted(data: Vec<u8>) -> Result<Self, CoreError> {
        check_len(data.len())?;
        let checksum_ok = crypto::checksum(&data) == read_u16(&data, crypto::OFS_CHECKSUM);
        Ok(Self {
            data,
            checksum_ok,
            shuffle_override: None,
        })
    }

    /// An all-zero record that is treated as structurally valid.
    pub fn blank(kind: RecordKind) -> Self {
        Self {
            data: vec![0; kind.size()],
            checksum_ok: true,
            shuffle_override: None,
        }
    }

    pub fn empty() -> Self {
        Self::blank(RecordKind::Stored)
    }

    pub fn encrypt(&self) -> Vec<u8> {
        crypto::encrypt_record(&self.data, self.shuffle_value())
    }

    pub fn shuffle_value(&self) -> usize {
        self.shuffle_override
            .unwrap_or_else(|| crypto::shuffle_value(self.pid()))
    }

    pub fn kind(&self) -> RecordKind {
        if self.data.len() == SIZE_PARTY {
            RecordKind::Party
        } else {
            RecordKind::Stored
        }
    }

    pub fn is_party(&self) -> bool {
        self.kind() == RecordKind::Party
    }

    /// The decrypted logical-order bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_checksum_valid(&self) -> bool {
        self.checksum_ok
    }

    pub fn is_empty(&self) -> bool {
        self.species() == 0 || !self.checksum_ok
    }

    /// Widen to party size with a zeroed battle-stat tail.
    pub fn to_party(&self) -> Self {
        let mut widened = self.clone();
        widened.data.resize(SIZE_PARTY, 0);
        widened
    }

    /// Narrow to boxed size, dropping the battle-stat tail.
    pub fn to_stored(&self) -> Self {
        let mut narrowed = self.clone();
        narrowed.data.truncate(SIZE_STORED);
        narrowed
    }

    pub fn pid(&self) -> u32 {
        read_u32(&self.data, crypto::OFS_PID)
    }

    /// Changing the PID also drops any remembered non-standard block order.
    pub fn set_pid(&mut self, pid: u32) {
        write_u32(&mut self.data, crypto::OFS_PID, pid);
        self.shuffle_override = None;
    }

    pub fn species(&self) -> u16 {
        let raw = self.stored_species();
        if raw >= SPECIES_STORED_THRESHOLD {
            raw - SPECIES_STORED_OFFSET
        } else {
            raw
        }
    }

    /// IDs above [`MAX_SPECIES`] are clamped to it.
    pub fn set_species(&mut self, species: u16) {
        let species = species.min(MAX_SPECIES);
        let stored = if species >= SPECIES_DISPLAY_THRESHOLD {
            species + SPECIES_STORED_OFFSET
        } else {
            species
        };
        write_u16(&mut self.data, offsets::SPECIES, stored);
    }

    /// The species word exactly as stored, before the display adjustment.
    pub fn stored_species(&self) -> u16 {
        read_u16(&self.data, offsets::SPECIES)
    }

    pub fn held_item(&self) -> u16 {
        read_u16(&self.data, offsets::HELD_ITEM)
    }

    pub fn set_held_item(&mut self, item: u16) {
        write_u16(&mut self.data, offsets::HELD_ITEM, item);
    }

    pub fn tid(&self) -> u16 {
        read_u16(&self.data, offsets::TID)
    }

    pub fn set_tid(&mut self, tid: u16) {
        write_u16(&mut self.data, offsets::TID, tid);
    }

    pub fn sid(&self) -> u16 {
        read_u16(&self.data, offsets::SID)
    }

    pub fn set_sid(&mut self, sid: u16) {
        write_u16(&mut self.data, offsets::SID, sid);
    }

    pub fn exp(&self) -> u32 {
        read_u32(&self.data, offsets::EXP)
    }

    pub fn set_exp(&mut self, exp: u32) {
        write_u32(&mut self.data, offsets::EXP, exp);
    }

    pub fn friendship(&self) -> u8 {
        read_u8(&self.data, offsets::FRIENDSHIP)
    }

    pub fn set_friendship(&mut self, value: u8) {
        write_u8(&mut self.data, offsets::FRIENDSHIP, value);
    }

    pub fn ability(&self) -> u8 {
        read_u8(&self.data, offsets::ABILITY)
    }

    pub fn set_ability(&mut self, ability: u8) {
        write_u8(&mut self.data, offsets::ABILITY, ability);
    }

    pub fn markings(&self) -> u8 {
        read_u8(&self.data, offsets::MARKINGS)
    }

    pub fn set_markings(&mut self, markings: u8) {
        write_u8(&mut self.data, offsets::MARKINGS, markings);
    }

    pub fn language(&self) -> u8 {
        read_u8(&self.data, offsets::LANGUAGE)
    }

    pub fn set_language(&mut self, language: u8) {
        write_u8(&mut self.data, offsets::LANGUAGE, language);
    }

    pub fn ev(&self, stat: Stat) -> u8 {
        read_u8(&self.data, offsets::EVS + stat.index())
    }

    pub fn set_ev(&mut self, stat: Stat, value: u8) {
        write_u8(&mut self.data, offsets::EVS + stat.index(), value);
    }

    pub fn evs(&self) -> [u8; 6] {
        Stat::ALL.map(|stat| self.ev(stat))
    }

    /// Move in slot `index` (0..4). Out-of-range slots read as 0.
    pub fn move_id(&self, index: usize) -> u16 {
        if index >= MOVE_COUNT {
            return 0;
        }
        read_u16(&self.data, offsets::MOVES + index * 2)
    }

    pub fn set_move(&mut self, index: usize, move_id: u16) {
        if index < MOVE_COUNT {
            write_u16(&mut self.data, offsets::MOVES + index * 2, move_id);
        }
    }

    pub fn moves(&self) -> [u16; MOVE_COUNT] {
        std::array::from_fn(|i| self.move_id(i))
    }

    pub fn pp(&self, index: usize) -> u8 {
        if index >= MOVE_COUNT {
            return 0;
        }
        read_u8(&self.data, offsets::PP + index)
    }

    pub fn set_pp(&mut self, index: usize, pp: u8) {
        if index < MOVE_COUNT {
            write_u8(&mut self.data, offsets::PP + index, pp);
        }
    }

    pub fn pp_up(&self, index: usize) -> u8 {
        if index >= MOVE_COUNT {
            return 0;
        }
        read_u8(&self.data, offsets::PP_UPS + index)
    }

    pub fn set_pp_up(&mut self, index: usize, pp_ups: u8) {
        if index < MOVE_COUNT {
            write_u8(&mut self.data, offsets::PP_UPS + index, pp_ups);
        }
    }

    pub fn ivs(&self) -> IvWord {
        IvWord::from_raw(read_u32(&self.data, offsets::IV_WORD))
    }

    pub fn set_ivs(&mut self, ivs: IvWord) {
        write_u32(&mut self.data, offsets::IV_WORD, ivs.raw());
    }

    pub fn iv(&self, stat: Stat) -> u8 {
        self.ivs().get(stat)
    }

    pub fn set_iv(&mut self, stat: Stat, value: u8) {
        let mut ivs = self.ivs();
        ivs.set(stat, value);
        self.set_ivs(ivs);
    }

    pub fn is_egg(&self) -> bool {
        self.ivs().is_egg()
    }

    pub fn set_egg(&mut self, egg: bool) {
        let mut ivs = self.ivs();
        ivs.set_egg(egg);
        self.set_ivs(ivs);
    }

    pub fn is_nicknamed(&self) -> bool {
        self.ivs().is_nicknamed()
    }

    pub fn set_nicknamed(&mut self, nicknamed: bool) {
        let mut ivs = self.ivs();
        ivs.set_nicknamed(nicknamed);
        self.set_ivs(ivs);
    }

    pub fn form(&self) -> u8 {
        read_u8(&self.data, offsets::FORM) >> FORM_SHIFT
    }

    /// Forms are five bits wide; the low three bits of the byte are kept.
    pub fn set_form(&mut self, form: u8) {
        let kept = read_u8(&self.data, offsets::FORM) & FORM_KEEP_MASK;
        write_u8(&mut self.data, offsets::FORM, kept | ((form & 0x1F) << FORM_SHIFT));
    }

    /// Raw mint byte. See [`Pk4::mint_nature`].
    pub fn stat_nature(&self) -> u8 {
        read_u8(&self.data, offsets::STAT_NATURE)
    }

    pub fn set_stat_nature(&mut self, raw: u8) {
        write_u8(&mut self.data, offsets::STAT_NATURE, raw);
    }

    /// Nature imposed by a mint, if the mint byte encodes one.
    pub fn mint_nature(&self) -> Option<u8> {
        let raw = self.stat_nature();
        if raw < 2 || raw % 2 != 0 {
            return None;
        }
        let nature = raw / 2 - 1;
        (nature < NATURE_COUNT).then_some(nature)
    }

    pub fn set_mint_nature(&mut self, nature: Option<u8>) {
        let raw = match nature {
            Some(n) if n < NATURE_COUNT => (n + 1) * 2,
            _ => 0,
        };
        self.set_stat_nature(raw);
    }

    pub fn met_location(&self) -> u16 {
        read_u16(&self.data, offsets::MET_LOCATION)
    }

    pub fn set_met_location(&mut self, location: u16) {
        write_u16(&mut self.data, offsets::MET_LOCATION, location);
    }

    pub fn nickname(&self, chars: &CharTable) -> String {
        chars.decode(&self.data, offsets::NICKNAME, offsets::NICKNAME_LEN)
    }

    pub fn set_nickname(&mut self, chars: &CharTable, nickname: &str) {
        chars.encode(nickname, &mut self.data, offsets::NICKNAME, offsets::NICKNAME_LEN);
    }

    pub fn origin_game(&self) -> u8 {
        read_u8(&self.data, offsets::ORIGIN_GAME)
    }

    pub fn set_origin_game(&mut self, game: u8) {
        write_u8(&mut self.data, offsets::ORIGIN_GAME, game);
    }

    pub fn ot_name(&self, chars: &CharTable) -> String {
        chars.decode(&self.data, offsets::OT_NAME, offsets::OT_NAME_LEN)
    }

    pub fn set_ot_name(&mut self, chars: &CharTable, name: &str) {
        chars.encode(name, &mut self.data, offsets::OT_NAME, offsets::OT_NAME_LEN);
    }

    pub fn egg_date(&self) -> RecordDate {
        self.date_at(offsets::EGG_DATE)
    }

    pub fn set_egg_date(&mut self, date: RecordDate) {
        self.set_date_at(offsets::EGG_DATE, date);
    }

    pub fn met_date(&self) -> RecordDate {
        self.date_at(offsets::MET_DATE)
    }

    pub fn set_met_date(&mut self, date: RecordDate) {
        self.set_date_at(offsets::MET_DATE, date);
    }

    fn date_at(&self, offset: usize) -> RecordDate {
        RecordDate {
            year: read_u8(&self.data, offset),
            month: read_u8(&self.data, offset + 1),
            day: read_u8(&self.data, offset + 2),
        }
    }

    fn set_date_at(&mut self, offset: usize, date: RecordDate) {
        write_u8(&mut self.data, offset, date.year);
        write_u8(&mut self.data, offset + 1, date.month);
        write_u8(&mut self.data, offset + 2, date.day);
    }

    pub fn ball(&self) -> u8 {
        read_u8(&self.data, offsets::BALL)
    }

    /// Written to both ball bytes so either game revision reads it.
    pub fn set_ball(&mut self, ball: u8) {
        write_u8(&mut self.data, offsets::BALL, ball);
        write_u8(&mut self.data, offsets::BALL_PLATINUM, ball);
    }

    pub fn met_level(&self) -> u8 {
        read_u8(&self.data, offsets::MET_LEVEL_OT_GENDER) & MET_LEVEL_MASK
    }

    pub fn set_met_level(&mut self, level: u8) {
        let packed = read_u8(&self.data, offsets::MET_LEVEL_OT_GENDER);
        write_u8(
            &mut self.data,
            offsets::MET_LEVEL_OT_GENDER,
            (packed & OT_FEMALE_BIT) | (level & MET_LEVEL_MASK),
        );
    }

    pub fn ot_is_female(&self) -> bool {
        read_u8(&self.data, offsets::MET_LEVEL_OT_GENDER) & OT_FEMALE_BIT != 0
    }

    pub fn set_ot_female(&mut self, female: bool) {
        let packed = read_u8(&self.data, offsets::MET_LEVEL_OT_GENDER) & MET_LEVEL_MASK;
        let flag = if female { OT_FEMALE_BIT } else { 0 };
        write_u8(&mut self.data, offsets::MET_LEVEL_OT_GENDER, packed | flag);
    }

    pub fn gender(&self, data: &dyn GameData) -> Gender {
        Gender::from_ratio(self.pid(), data.gender_ratio(self.species()))
    }

    /// Nature derived from the PID.
    pub fn nature(&self) -> u8 {
        (self.pid() % u32::from(NATURE_COUNT)) as u8
    }

    /// Nature used for stat modifiers: the mint nature when one is set.
    pub fn effective_nature(&self) -> u8 {
        self.mint_nature().unwrap_or_else(|| self.nature())
    }

    pub fn is_shiny(&self) -> bool {
        let pid = self.pid();
        let pid_hi = (pid >> 16) as u16;
        let pid_lo = (pid & 0xFFFF) as u16;
        (self.tid() ^ self.sid() ^ pid_hi ^ pid_lo) < SHINY_THRESHOLD
    }

    pub fn level(&self, data: &dyn GameData) -> u8 {
        let rate = data.growth_rate(self.species());
        let exp = self.exp();
        (MIN_LEVEL..=MAX_LEVEL)
            .rev()
            .find(|&level| data.exp_for_level(rate, level) <= exp)
            .unwrap_or(MIN_LEVEL)
    }

    /// Set experience to the threshold of `level`.
    pub fn set_level(&mut self, level: u8, data: &dyn GameData) {
        let rate = data.growth_rate(self.species());
        let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        self.set_exp(data.exp_for_level(rate, level));
    }

    pub fn status(&self) -> u32 {
        self.tail_u32(offsets::STATUS)
    }

    pub fn set_status(&mut self, status: u32) {
        if self.is_party() {
            write_u32(&mut self.data, offsets::STATUS, status);
        }
    }

    pub fn current_level(&self) -> u8 {
        if self.is_party() {
            read_u8(&self.data, offsets::CURRENT_LEVEL)
        } else {
            0
        }
    }

    pub fn set_current_level(&mut self, level: u8) {
        if self.is_party() {
            write_u8(&mut self.data, offsets::CURRENT_LEVEL, level);
        }
    }

    pub fn current_hp(&self) -> u16 {
        self.tail_u16(offsets::CURRENT_HP)
    }

    pub fn set_current_hp(&mut self, hp: u16) {
        self.set_tail_u16(offsets::CURRENT_HP, hp);
    }

    pub fn max_hp(&self) -> u16 {
        self.battle_stat(Stat::Hp)
    }

    /// Computed stat held in the party tail. Boxed records read 0.
    pub fn battle_stat(&self, stat: Stat) -> u16 {
        self.tail_u16(offsets::BATTLE_STATS + stat.index() * 2)
    }

    pub fn set_battle_stat(&mut self, stat: Stat, value: u16) {
        self.set_tail_u16(offsets::BATTLE_STATS + stat.index() * 2, value);
    }

    pub fn battle_stats(&self) -> [u16; 6] {
        Stat::ALL.map(|stat| self.battle_stat(stat))
    }

    fn tail_u16(&self, offset: usize) -> u16 {
        debug_assert!(offset >= BATTLE_STATS_START);
        if self.is_party() {
            read_u16(&self.data, offset)
        } else {
            0
        }
    }

    fn tail_u32(&self, offset: usize) -> u32 {
        if self.is_party() {
            read_u32(&self.data, offset)
        } else {
            0
        }
    }

    fn set_tail_u16(&mut self, offset: usize, value: u16) {
        if self.is_party() {
            write_u16(&mut self.data, offset, value);
        }
    }

    /// Recompute level and battle stats of a party record.
    ///
    /// Stats stay untouched when `data` has no base stats for the species;
    /// the stored level is still refreshed.
    pub fn refresh_stats(&mut self, data: &dyn GameData) {
        if !self.is_party() {
            return;
        }

        let level = self.level(data);
        self.set_current_level(level);

        let Some(base) = data.base_stats(self.species(), self.form()) else {
            return;
        };

        let nature = self.effective_nature();
        for stat in Stat::ALL {
            let value = match stat {
                Stat::Hp => calc_hp(base.hp, self.iv(stat), self.ev(stat), level),
                _ => calc_stat(
                    base.get(stat),
                    self.iv(stat),
                    self.ev(stat),
                    level,
                    data.nature_modifier(nature, stat),
                ),
            };
            self.set_battle_stat(stat, value);
        }
        self.set_current_hp(self.max_hp());
    }

    pub fn validation_warnings(&self, chars: &CharTable) -> Vec<RecordWarning> {
        let mut warnings = Vec::new();
        if self.species() == 0 {
            warnings.push(RecordWarning::NoSpecies);
        }
        if self.nickname(chars).trim().is_empty() {
            warnings.push(RecordWarning::NoNickname);
        }
        if self.ability() == 0 {
            warnings.push(RecordWarning::NoAbility);
        }
        if self
            .moves()
            .iter()
            .all(|&m| m == 0 || m == MOVE_EMPTY)
        {
            warnings.push(RecordWarning::NoMoves);
        }
        if self.met_level() == 0 {
            warnings.push(RecordWarning::NoMetLevel);
        }
        warnings
    }

    pub fn has_warnings(&self, chars: &CharTable) -> bool {
        !self.is_empty() && !self.validation_warnings(chars).is_empty()
    }
}

fn check_len(len: usize) -> Result<(), CoreError> {
    if RecordKind::from_len(len).is_some() {
        return Ok(());
    }
    Err(CoreError::new(
        CoreErrorCode::Parse,
        format!("record must be {SIZE_STORED} or {SIZE_PARTY} bytes, got {len}"),
    ))
}

fn stat_core(base: u8, iv: u8, ev: u8, level: u8) -> u32 {
    (2 * u32::from(base) + u32::from(iv) + u32::from(ev) / 4) * u32::from(level) / 100
}

fn calc_hp(base: u8, iv: u8, ev: u8, level: u8) -> u16 {
    (stat_core(base, iv, ev, level) + u32::from(level) + 10) as u16
}

fn calc_stat(base: u8, iv: u8, ev: u8, level: u8, modifier: f64) -> u16 {
    (f64::from(stat_core(base, iv, ev, level) + 5) * modifier).floor() as u16
}
