use std::sync::Arc;

use crate::crypto::ShuffleResolver;
use crate::game_data::nature_name;
use crate::gender::Gender;
use crate::layout::{BlockFamily, BlockLayout, BlockRegion, BlockSide};
use crate::pk4::{MOVE_COUNT, Pk4, RecordKind};
use crate::sav4::{BOX_COUNT, BOX_SLOT_COUNT, PARTY_CAPACITY, SaveFile, SlotRef};

use super::error::{CoreError, CoreErrorCode};
use super::game_tables::{GameTables, language_name};
use super::types::{BoxSummary, Capabilities, CreatureSummary, MoveEntry, Snapshot};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    pub resolver: ShuffleResolver,
}

#[derive(Debug, Clone, Default)]
pub struct Engine {
    tables: Arc<GameTables>,
}

#[derive(Debug, Clone)]
pub struct Session {
    tables: Arc<GameTables>,
    save: SaveFile,
    original: Vec<u8>,
    snapshot: Snapshot,
    capabilities: Capabilities,
}

impl Engine {
    pub fn new(tables: GameTables) -> Self {
        Self::with_shared_tables(Arc::new(tables))
    }

    pub fn with_shared_tables(tables: Arc<GameTables>) -> Self {
        Self { tables }
    }

    pub fn tables(&self) -> &GameTables {
        &self.tables
    }

    pub fn open_bytes<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        options: OpenOptions,
    ) -> Result<Session, CoreError> {
        let bytes = bytes.as_ref();
        if bytes.is_empty() {
            return Err(CoreError::new(CoreErrorCode::Parse, "input is empty"));
        }

        let save = SaveFile::from_bytes(bytes.to_vec()).with_resolver(options.resolver);
        let capabilities = Capabilities::from_layout(save.block_layout());
        tracing::debug!(layout = %save.block_layout(), "opened save");

        Ok(Session {
            tables: Arc::clone(&self.tables),
            snapshot: snapshot_of(&save, &self.tables),
            save,
            original: bytes.to_vec(),
            capabilities,
        })
    }
}

fn snapshot_of(save: &SaveFile, tables: &GameTables) -> Snapshot {
    Snapshot {
        trainer_name: save.trainer_name(tables.chars()),
        tid: save.tid(),
        sid: save.sid(),
        money: save.money(),
        gender: save.gender(),
        playtime: save.playtime(),
        party_count: save.party_count(),
        current_box: save.current_box(),
        layout: *save.block_layout(),
    }
}

fn record_kind(slot: SlotRef) -> RecordKind {
    if slot.is_party() {
        RecordKind::Party
    } else {
        RecordKind::Stored
    }
}

impl Session {
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    pub fn tables(&self) -> &GameTables {
        &self.tables
    }

    pub fn save(&self) -> &SaveFile {
        &self.save
    }

    pub fn is_modified(&self) -> bool {
        self.save.is_modified()
    }

    pub fn block_layout(&self) -> &BlockLayout {
        self.save.block_layout()
    }

    /// All four physical blocks, each probed on its own.
    pub fn probe_blocks(&self) -> Vec<BlockRegion> {
        let mut regions = Vec::with_capacity(4);
        for family in [BlockFamily::General, BlockFamily::Storage] {
            for side in [BlockSide::Primary, BlockSide::Backup] {
                regions.push(self.save.probe_block(family, side));
            }
        }
        regions
    }

    pub fn record(&self, slot: SlotRef) -> Result<Pk4, CoreError> {
        self.save.slot(slot)
    }

    /// `None` when the slot holds no valid record.
    pub fn creature(&self, slot: SlotRef) -> Result<Option<CreatureSummary>, CoreError> {
        let record = self.save.slot(slot)?;
        if record.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.summarize(slot, &record)))
    }

    pub fn party(&self) -> Vec<CreatureSummary> {
        let count = self.save.party_count().min(PARTY_CAPACITY);
        (0..count)
            .filter_map(|index| self.creature(SlotRef::Party(index)).ok().flatten())
            .collect()
    }

    pub fn box_contents(&self, box_index: usize) -> Result<Vec<CreatureSummary>, CoreError> {
        let mut contents = Vec::new();
        for slot in 0..BOX_SLOT_COUNT {
            if let Some(summary) = self.creature(SlotRef::Box { box_index, slot })? {
                contents.push(summary);
            }
        }
        Ok(contents)
    }

    pub fn boxes(&self) -> Vec<BoxSummary> {
        (0..BOX_COUNT)
            .map(|index| {
                let occupied = (0..BOX_SLOT_COUNT)
                    .filter(|&slot| {
                        self.save
                            .box_slot(index, slot)
                            .is_ok_and(|record| !record.is_empty())
                    })
                    .count();
                BoxSummary {
                    index: index + 1,
                    name: self
                        .save
                        .box_name(index, self.tables.chars())
                        .unwrap_or_else(|_| format!("BOX {}", index + 1)),
                    occupied,
                }
            })
            .collect()
    }

    pub fn summarize(&self, slot: SlotRef, record: &Pk4) -> CreatureSummary {
        let tables = self.tables.as_ref();
        let chars = tables.chars();

        let moves = (0..MOVE_COUNT)
            .filter_map(|i| {
                let id = record.move_id(i);
                (id != 0 && id != u16::MAX).then(|| MoveEntry {
                    id,
                    name: tables.move_name(id),
                    pp: record.pp(i),
                    pp_ups: record.pp_up(i),
                })
            })
            .collect();

        let (stats, current_hp) = if record.is_party() {
            (Some(record.battle_stats()), Some(record.current_hp()))
        } else {
            (None, None)
        };

        CreatureSummary {
            slot: slot.to_string(),
            species: record.species(),
            species_name: tables.species_name(record.species()),
            form: record.form(),
            form_name: tables
                .form_name(record.species(), record.form())
                .map(str::to_string),
            nickname: record.nickname(chars),
            level: record.level(tables),
            nature: nature_name(record.nature()).to_string(),
            mint_nature: record.mint_nature().map(|n| nature_name(n).to_string()),
            gender: record.gender(tables),
            shiny: record.is_shiny(),
            egg: record.is_egg(),
            held_item: tables.item_name(record.held_item()),
            ability: tables.ability_name(record.ability()),
            ot_name: record.ot_name(chars),
            tid: record.tid(),
            sid: record.sid(),
            exp: record.exp(),
            friendship: record.friendship(),
            ball: tables.ball_name(record.ball()),
            met_location: tables.location_name(record.met_location()),
            met_level: record.met_level(),
            language: language_name(record.language()),
            moves,
            ivs: record.ivs().all(),
            evs: record.evs(),
            stats,
            current_hp,
            checksum_valid: record.is_checksum_valid(),
            warnings: record.validation_warnings(chars),
        }
    }

    pub fn set_trainer_name(&mut self, name: &str) -> Result<(), CoreError> {
        if name.trim().is_empty() {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                "trainer name must not be empty",
            ));
        }
        self.save.set_trainer_name(self.tables.chars(), name);
        self.refresh_snapshot();
        Ok(())
    }

    pub fn set_tid(&mut self, tid: u16) {
        self.save.set_tid(tid);
        self.snapshot.tid = tid;
    }

    pub fn set_sid(&mut self, sid: u16) {
        self.save.set_sid(sid);
        self.snapshot.sid = sid;
    }

    /// Values above 999 999 are capped.
    pub fn set_money(&mut self, money: u32) {
        self.save.set_money(money);
        self.snapshot.money = self.save.money();
    }

    pub fn set_gender(&mut self, gender: Gender) -> Result<(), CoreError> {
        if !matches!(gender, Gender::Male | Gender::Female) {
            return Err(CoreError::new(
                CoreErrorCode::InvalidInput,
                format!("trainer gender must be male or female, got {gender}"),
            ));
        }
        self.save.set_gender(gender);
        self.snapshot.gender = gender;
        Ok(())
    }

    pub fn set_box_name(&mut self, box_index: usize, name: &str) -> Result<(), CoreError> {
        self.save.set_box_name(box_index, self.tables.chars(), name)
    }

    /// Decode the record in `slot`, apply `edit`, and write it back.
    ///
    /// An empty slot starts from a blank record. Party writes refresh the
    /// battle stats from the loaded tables.
    pub fn edit_record<F>(&mut self, slot: SlotRef, edit: F) -> Result<(), CoreError>
    where
        F: FnOnce(&mut Pk4, &GameTables) -> Result<(), CoreError>,
    {
        let mut record = self.save.slot(slot)?;
        if record.is_empty() {
            record = Pk4::blank(record_kind(slot));
        }
        edit(&mut record, self.tables.as_ref())?;

        tracing::debug!(%slot, species = record.species(), "writing edited record");
        self.save.set_slot(slot, record, self.tables.as_ref())?;
        self.refresh_snapshot();
        Ok(())
    }

    pub fn copy_slot(&mut self, from: SlotRef, to: SlotRef) -> Result<(), CoreError> {
        self.save.copy_slot(from, to, self.tables.as_ref())?;
        self.refresh_snapshot();
        Ok(())
    }

    /// Empty a slot. Removing the last party member is refused.
    pub fn delete_slot(&mut self, slot: SlotRef) -> Result<(), CoreError> {
        self.save.clear_slot(slot, self.tables.as_ref())?;
        self.refresh_snapshot();
        Ok(())
    }

    pub fn to_bytes_unmodified(&self) -> Vec<u8> {
        self.original.clone()
    }

    /// The edited image with the active blocks' CRCs recomputed.
    pub fn to_bytes_modified(&mut self) -> Vec<u8> {
        self.save.to_bytes()
    }

    fn refresh_snapshot(&mut self) {
        self.snapshot = snapshot_of(&self.save, &self.tables);
    }
}
