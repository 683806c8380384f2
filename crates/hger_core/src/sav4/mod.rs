//! HeartGold/SoulSilver-layout save container.

pub mod blocks;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::crypto::{self, SIZE_PARTY, SIZE_STORED, ShuffleResolver};
use crate::game_data::GameData;
use crate::gender::Gender;
use crate::layout::{BlockFamily, BlockLayout, BlockRegion, BlockSide};
use crate::pk4::{Pk4, RecordKind};
use crate::reader::{read_u8, read_u16, read_u32, write_u8, write_u16, write_u32};
use crate::text::CharTable;

use blocks::SAVE_SIZE;

// general block
const OFS_TRAINER_NAME: usize = 0x64;
const TRAINER_NAME_LEN: usize = 8;
const OFS_TID: usize = 0x74;
const OFS_SID: usize = 0x76;
const OFS_MONEY: usize = 0x78;
const OFS_GENDER: usize = 0x7C;
const OFS_PLAYTIME_HOURS: usize = 0x86;
const OFS_PLAYTIME_MINUTES: usize = 0x88;
const OFS_PLAYTIME_SECONDS: usize = 0x89;
const OFS_PARTY_COUNT: usize = 0x94;
const OFS_PARTY: usize = 0x98;

// storage block
const BOX_STRIDE: usize = 0x1000;
const OFS_BOX_NAMES: usize = 0x1E000;
const BOX_NAME_ENTRY_SIZE: usize = 40;
const BOX_NAME_HEADER_SIZE: usize = 12;
const BOX_NAME_LEN: usize = 14;
const OFS_CURRENT_BOX: usize = 0x1E4B0;

pub const PARTY_CAPACITY: usize = 6;
pub const BOX_COUNT: usize = 30;
pub const BOX_SLOT_COUNT: usize = 30;
pub const MAX_MONEY: u32 = 999_999;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Playtime {
    pub hours: u16,
    pub minutes: u8,
    pub seconds: u8,
}

impl fmt::Display for Playtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }
}

/// A record slot, zero-based internally.
///
/// The text form is one-based: `party:1`..`party:6` and `box:1:1`..`box:30:30`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotRef {
    Party(usize),
    Box { box_index: usize, slot: usize },
}

impl SlotRef {
    pub fn is_party(&self) -> bool {
        matches!(self, Self::Party(_))
    }
}

impl fmt::Display for SlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Party(index) => write!(f, "party:{}", index + 1),
            Self::Box { box_index, slot } => write!(f, "box:{}:{}", box_index + 1, slot + 1),
        }
    }
}

impl FromStr for SlotRef {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || {
            CoreError::new(
                CoreErrorCode::InvalidInput,
                format!("invalid slot '{s}', expected party:N or box:B:S"),
            )
        };
        let one_based = |part: &str, max: usize| -> Result<usize, CoreError> {
            let value: usize = part.trim().parse().map_err(|_| invalid())?;
            if value == 0 || value > max {
                return Err(CoreError::new(
                    CoreErrorCode::InvalidInput,
                    format!("slot '{s}' is out of range (1-{max})"),
                ));
            }
            Ok(value - 1)
        };

        let parts: Vec<&str> = s.trim().split(':').collect();
        match parts.as_slice() {
            [kind, index] if kind.eq_ignore_ascii_case("party") => {
                Ok(Self::Party(one_based(index, PARTY_CAPACITY)?))
            }
            [kind, box_index, slot] if kind.eq_ignore_ascii_case("box") => Ok(Self::Box {
                box_index: one_based(box_index, BOX_COUNT)?,
                slot: one_based(slot, BOX_SLOT_COUNT)?,
            }),
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveFile {
    raw: Vec<u8>,
    layout: BlockLayout,
    resolver: ShuffleResolver,
    modified: bool,
}

impl SaveFile {
    /// Take ownership of a save image. Short images are zero-padded to the
    /// full 512 KiB; longer ones are kept whole.
    pub fn from_bytes(mut raw: Vec<u8>) -> Self {
        if raw.len() < SAVE_SIZE {
            tracing::debug!(len = raw.len(), "padding short save image");
            raw.resize(SAVE_SIZE, 0);
        }
        let layout = blocks::select_layout(&raw);
        Self {
            raw,
            layout,
            resolver: ShuffleResolver::default(),
            modified: false,
        }
    }

    pub fn with_resolver(mut self, resolver: ShuffleResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn resolver(&self) -> ShuffleResolver {
        self.resolver
    }

    pub fn block_layout(&self) -> &BlockLayout {
        &self.layout
    }

    pub fn probe_block(&self, family: BlockFamily, side: BlockSide) -> BlockRegion {
        blocks::probe_block(&self.raw, family, side)
    }

    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Recompute the active blocks' CRCs and hand out the image.
    ///
    /// Save counters and the inactive side are left as they are.
    pub fn to_bytes(&mut self) -> Vec<u8> {
        blocks::recalc_crc(&mut self.raw, &self.layout.general);
        blocks::recalc_crc(&mut self.raw, &self.layout.storage);
        self.modified = false;
        self.raw.clone()
    }

    fn general(&self) -> usize {
        self.layout.general.base()
    }

    fn storage(&self) -> usize {
        self.layout.storage.base()
    }

    pub fn trainer_name(&self, chars: &CharTable) -> String {
        chars.decode(&self.raw, self.general() + OFS_TRAINER_NAME, TRAINER_NAME_LEN)
    }

    pub fn set_trainer_name(&mut self, chars: &CharTable, name: &str) {
        let offset = self.general() + OFS_TRAINER_NAME;
        chars.encode(name, &mut self.raw, offset, TRAINER_NAME_LEN);
        self.modified = true;
    }

    pub fn tid(&self) -> u16 {
        read_u16(&self.raw, self.general() + OFS_TID)
    }

    pub fn set_tid(&mut self, tid: u16) {
        let offset = self.general() + OFS_TID;
        write_u16(&mut self.raw, offset, tid);
        self.modified = true;
    }

    pub fn sid(&self) -> u16 {
        read_u16(&self.raw, self.general() + OFS_SID)
    }

    pub fn set_sid(&mut self, sid: u16) {
        let offset = self.general() + OFS_SID;
        write_u16(&mut self.raw, offset, sid);
        self.modified = true;
    }

    pub fn money(&self) -> u32 {
        read_u32(&self.raw, self.general() + OFS_MONEY)
    }

    /// Capped at 999 999.
    pub fn set_money(&mut self, money: u32) {
        let offset = self.general() + OFS_MONEY;
        write_u32(&mut self.raw, offset, money.min(MAX_MONEY));
        self.modified = true;
    }

    pub fn gender(&self) -> Gender {
        Gender::from_raw(read_u8(&self.raw, self.general() + OFS_GENDER))
    }

    /// Only the low bit is stored, so genderless maps to male.
    pub fn set_gender(&mut self, gender: Gender) {
        let offset = self.general() + OFS_GENDER;
        write_u8(&mut self.raw, offset, gender.raw() & 1);
        self.modified = true;
    }

    pub fn playtime(&self) -> Playtime {
        let base = self.general();
        Playtime {
            hours: read_u16(&self.raw, base + OFS_PLAYTIME_HOURS),
            minutes: read_u8(&self.raw, base + OFS_PLAYTIME_MINUTES),
            seconds: read_u8(&self.raw, base + OFS_PLAYTIME_SECONDS),
        }
    }

    pub fn party_count(&self) -> usize {
        usize::from(read_u8(&self.raw, self.general() + OFS_PARTY_COUNT))
    }

    fn set_party_count(&mut self, count: usize) {
        let offset = self.general() + OFS_PARTY_COUNT;
        write_u8(&mut self.raw, offset, count.min(PARTY_CAPACITY) as u8);
    }

    fn party_offset(&self, index: usize) -> usize {
        self.general() + OFS_PARTY + index * SIZE_PARTY
    }

    /// Whether a party slot holds a species, decoded the way reads decode it.
    fn party_slot_occupied(&self, index: usize) -> bool {
        let offset = self.party_offset(index);
        let raw = &self.raw[offset..offset + SIZE_PARTY];
        match self.resolver {
            ShuffleResolver::Fixed => crypto::peek_species(raw) != 0,
            ShuffleResolver::Heuristic => {
                Pk4::decrypt_with(raw, self.resolver).is_ok_and(|pk| pk.species() != 0)
            }
        }
    }

    fn check_party_index(index: usize) -> Result<(), CoreError> {
        if index < PARTY_CAPACITY {
            return Ok(());
        }
        Err(CoreError::new(
            CoreErrorCode::InvalidInput,
            format!("party index {index} out of range (0-{})", PARTY_CAPACITY - 1),
        ))
    }

    pub fn party_slot(&self, index: usize) -> Result<Pk4, CoreError> {
        Self::check_party_index(index)?;
        let offset = self.party_offset(index);
        Pk4::decrypt_with(&self.raw[offset..offset + SIZE_PARTY], self.resolver)
    }

    /// Write a record into a party slot.
    ///
    /// Boxed records are widened first, and battle stats are recomputed from
    /// `data` before encoding. The party count grows to cover a non-empty
    /// record; writing an empty record inside the party shrinks the count to
    /// just past the last remaining member.
    pub fn set_party_slot(
        &mut self,
        index: usize,
        record: Pk4,
        data: &dyn GameData,
    ) -> Result<(), CoreError> {
        Self::check_party_index(index)?;

        let mut record = match record.kind() {
            RecordKind::Party => record,
            RecordKind::Stored => record.to_party(),
        };
        record.refresh_stats(data);

        let offset = self.party_offset(index);
        self.raw[offset..offset + SIZE_PARTY].copy_from_slice(&record.encrypt());

        let count = self.party_count();
        if record.species() == 0 {
            if index < count {
                let new_count = (0..count.min(PARTY_CAPACITY))
                    .filter(|&i| i != index)
                    .filter(|&i| self.party_slot_occupied(i))
                    .last()
                    .map_or(0, |i| i + 1);
                self.set_party_count(new_count);
            }
        } else if index + 1 > count {
            self.set_party_count(index + 1);
        }

        self.modified = true;
        Ok(())
    }

    /// Remove a party member, moving later members up one slot.
    ///
    /// The last member cannot be removed.
    pub fn delete_party_slot(&mut self, index: usize, data: &dyn GameData) -> Result<(), CoreError> {
        let count = self.party_count().min(PARTY_CAPACITY);
        if index >= count {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                format!("party slot {index} is not occupied (party has {count})"),
            ));
        }
        if count <= 1 {
            return Err(CoreError::new(
                CoreErrorCode::UnsupportedOperation,
                "cannot remove the last party member",
            ));
        }

        for i in index..count - 1 {
            let next = self.party_slot(i + 1)?;
            self.set_party_slot(i, next, data)?;
        }
        self.set_party_slot(count - 1, Pk4::blank(RecordKind::Party), data)
    }

    fn box_offset(&self, box_index: usize, slot: usize) -> usize {
        self.storage() + box_index * BOX_STRIDE + slot * SIZE_STORED
    }

    fn check_box_slot(box_index: usize, slot: usize) -> Result<(), CoreError> {
        if box_index >= BOX_COUNT {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                format!("box index {box_index} out of range (0-{})", BOX_COUNT - 1),
            ));
        }
        if slot >= BOX_SLOT_COUNT {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                format!("box slot {slot} out of range (0-{})", BOX_SLOT_COUNT - 1),
            ));
        }
        Ok(())
    }

    pub fn box_slot(&self, box_index: usize, slot: usize) -> Result<Pk4, CoreError> {
        Self::check_box_slot(box_index, slot)?;
        let offset = self.box_offset(box_index, slot);
        Pk4::decrypt_with(&self.raw[offset..offset + SIZE_STORED], self.resolver)
    }

    /// Write a record into a box slot. Party records lose their battle stats.
    pub fn set_box_slot(
        &mut self,
        box_index: usize,
        slot: usize,
        record: Pk4,
    ) -> Result<(), CoreError> {
        Self::check_box_slot(box_index, slot)?;

        let record = match record.kind() {
            RecordKind::Stored => record,
            RecordKind::Party => record.to_stored(),
        };
        let offset = self.box_offset(box_index, slot);
        self.raw[offset..offset + SIZE_STORED].copy_from_slice(&record.encrypt());
        self.modified = true;
        Ok(())
    }

    pub fn slot(&self, slot: SlotRef) -> Result<Pk4, CoreError> {
        match slot {
            SlotRef::Party(index) => self.party_slot(index),
            SlotRef::Box { box_index, slot } => self.box_slot(box_index, slot),
        }
    }

    pub fn set_slot(
        &mut self,
        slot: SlotRef,
        record: Pk4,
        data: &dyn GameData,
    ) -> Result<(), CoreError> {
        match slot {
            SlotRef::Party(index) => self.set_party_slot(index, record, data),
            SlotRef::Box { box_index, slot } => self.set_box_slot(box_index, slot, record),
        }
    }

    /// Empty a slot. Party slots are compacted.
    pub fn clear_slot(&mut self, slot: SlotRef, data: &dyn GameData) -> Result<(), CoreError> {
        match slot {
            SlotRef::Party(index) => self.delete_party_slot(index, data),
            SlotRef::Box { box_index, slot } => self.set_box_slot(box_index, slot, Pk4::empty()),
        }
    }

    /// Copy the record in `from` over whatever is in `to`.
    pub fn copy_slot(
        &mut self,
        from: SlotRef,
        to: SlotRef,
        data: &dyn GameData,
    ) -> Result<(), CoreError> {
        let record = self.slot(from)?;
        if record.is_empty() {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                format!("slot {from} is empty"),
            ));
        }
        self.set_slot(to, record, data)
    }

    fn box_name_offset(&self, box_index: usize) -> usize {
        self.storage() + OFS_BOX_NAMES + box_index * BOX_NAME_ENTRY_SIZE + BOX_NAME_HEADER_SIZE
    }

    fn box_name_fits(&self, offset: usize) -> bool {
        offset + (BOX_NAME_ENTRY_SIZE - BOX_NAME_HEADER_SIZE) <= self.raw.len()
    }

    pub fn box_name(&self, box_index: usize, chars: &CharTable) -> Result<String, CoreError> {
        Self::check_box_slot(box_index, 0)?;
        let offset = self.box_name_offset(box_index);
        if !self.box_name_fits(offset) {
            return Ok(format!("BOX {}", box_index + 1));
        }
        Ok(chars.decode(&self.raw, offset, BOX_NAME_LEN))
    }

    pub fn set_box_name(
        &mut self,
        box_index: usize,
        chars: &CharTable,
        name: &str,
    ) -> Result<(), CoreError> {
        Self::check_box_slot(box_index, 0)?;
        let offset = self.box_name_offset(box_index);
        if !self.box_name_fits(offset) {
            return Ok(());
        }
        chars.encode(name, &mut self.raw, offset, BOX_NAME_LEN);
        self.modified = true;
        Ok(())
    }

    pub fn current_box(&self) -> u8 {
        read_u8(&self.raw, self.storage() + OFS_CURRENT_BOX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pk4;

    #[test]
    fn slot_refs_parse_one_based() {
        assert_eq!("party:1".parse::<SlotRef>().ok(), Some(SlotRef::Party(0)));
        assert_eq!(
            "box:30:2".parse::<SlotRef>().ok(),
            Some(SlotRef::Box {
                box_index: 29,
                slot: 1
            })
        );
        assert_eq!(SlotRef::Party(5).to_string(), "party:6");
        for bad in ["party:0", "party:7", "box:31:1", "box:1", "pc:1", "party:x"] {
            let err = bad.parse::<SlotRef>().expect_err("slot should be rejected");
            assert_eq!(err.code, CoreErrorCode::InvalidInput, "{bad}");
        }
    }

    #[test]
    fn short_images_are_padded_and_long_ones_kept() {
        let save = SaveFile::from_bytes(vec![1u8; 16]);
        assert_eq!(save.as_bytes().len(), SAVE_SIZE);
        assert_eq!(&save.as_bytes()[..16], &[1u8; 16]);

        let save = SaveFile::from_bytes(vec![0u8; SAVE_SIZE + 0x7A]);
        assert_eq!(save.as_bytes().len(), SAVE_SIZE + 0x7A);
    }

    #[test]
    fn money_and_gender_are_masked_on_write() {
        let mut save = SaveFile::from_bytes(Vec::new());
        save.set_money(5_000_000);
        assert_eq!(save.money(), MAX_MONEY);
        save.set_gender(Gender::Unknown(3));
        assert_eq!(save.gender(), Gender::Female);
        assert!(save.is_modified());
    }

    #[test]
    fn out_of_range_indices_are_errors() {
        let save = SaveFile::from_bytes(Vec::new());
        assert!(save.party_slot(6).is_err());
        assert!(save.box_slot(30, 0).is_err());
        assert!(save.box_slot(0, 30).is_err());
        assert!(save.box_name(30, &CharTable::basic_latin()).is_err());
    }

    /// A party record whose blocks were stored in reverse order under PID 0.
    fn reversed_party_record() -> Vec<u8> {
        let mut data = vec![0u8; SIZE_PARTY];
        write_u16(&mut data, pk4::offsets::SPECIES, 152);
        write_u8(&mut data, pk4::offsets::LANGUAGE, 2);
        write_u16(&mut data, pk4::offsets::MOVES, 33);
        write_u8(&mut data, pk4::offsets::PP, 35);
        write_u16(&mut data, pk4::offsets::NICKNAME, 0x0131);
        for i in 1..pk4::offsets::NICKNAME_LEN {
            write_u16(&mut data, pk4::offsets::NICKNAME + i * 2, 0xFFFF);
        }
        write_u8(&mut data, pk4::offsets::BALL_PLATINUM, 4);
        crypto::encrypt_record(&data, 23)
    }

    fn party_after_clearing_slot_two(resolver: ShuffleResolver) -> usize {
        let tables = crate::core_api::GameTables::new();
        let mut save = SaveFile::from_bytes(Vec::new()).with_resolver(resolver);
        let offset = save.party_offset(0);
        save.raw[offset..offset + SIZE_PARTY].copy_from_slice(&reversed_party_record());

        let mut second = Pk4::blank(RecordKind::Party);
        second.set_pid(0x20);
        second.set_species(25);
        save.set_party_slot(1, second, &tables).expect("slot 2");
        assert_eq!(save.party_count(), 2);

        save.set_party_slot(1, Pk4::blank(RecordKind::Party), &tables)
            .expect("clearing slot 2");
        save.party_count()
    }

    #[test]
    fn clearing_a_slot_keeps_members_found_by_the_heuristic() {
        assert_eq!(party_after_clearing_slot_two(ShuffleResolver::Heuristic), 1);
        assert_eq!(
            Pk4::decrypt_with(&reversed_party_record(), ShuffleResolver::Heuristic)
                .expect("record decodes")
                .species(),
            152
        );
        assert_eq!(party_after_clearing_slot_two(ShuffleResolver::Fixed), 0);
    }
}
