use serde::{Deserialize, Serialize};

use crate::gender::Gender;
use crate::layout::BlockLayout;
use crate::pk4::RecordWarning;
use crate::sav4::Playtime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub trainer_name: String,
    pub tid: u16,
    pub sid: u16,
    pub money: u32,
    pub gender: Gender,
    pub playtime: Playtime,
    pub party_count: usize,
    pub current_box: u8,
    pub layout: BlockLayout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveEntry {
    pub id: u16,
    pub name: String,
    pub pp: u8,
    pub pp_ups: u8,
}

/// Everything a viewer shows for one occupied slot, with IDs resolved to
/// names through the loaded tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatureSummary {
    pub slot: String,
    pub species: u16,
    pub species_name: String,
    pub form: u8,
    pub form_name: Option<String>,
    pub nickname: String,
    pub level: u8,
    pub nature: String,
    pub mint_nature: Option<String>,
    pub gender: Gender,
    pub shiny: bool,
    pub egg: bool,
    pub held_item: String,
    pub ability: String,
    pub ot_name: String,
    pub tid: u16,
    pub sid: u16,
    pub exp: u32,
    pub friendship: u8,
    pub ball: String,
    pub met_location: String,
    pub met_level: u8,
    pub language: String,
    pub moves: Vec<MoveEntry>,
    pub ivs: [u8; 6],
    pub evs: [u8; 6],
    /// Party records only.
    pub stats: Option<[u16; 6]>,
    pub current_hp: Option<u16>,
    pub checksum_valid: bool,
    pub warnings: Vec<RecordWarning>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BoxSummary {
    pub index: usize,
    pub name: String,
    pub occupied: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CapabilityIssue {
    GeneralBlockFallback,
    StorageBlockFallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Capabilities {
    pub can_query: bool,
    pub can_apply_edits: bool,
    pub issues: Vec<CapabilityIssue>,
}

impl Capabilities {
    /// Fallback layouts are still editable; the issues only flag that the
    /// offsets were guessed.
    pub fn from_layout(layout: &BlockLayout) -> Self {
        let mut issues = Vec::new();
        if !layout.general.detected {
            issues.push(CapabilityIssue::GeneralBlockFallback);
        }
        if !layout.storage.detected {
            issues.push(CapabilityIssue::StorageBlockFallback);
        }
        Self {
            can_query: true,
            can_apply_edits: true,
            issues,
        }
    }

    pub fn is_confident(&self) -> bool {
        self.issues.is_empty()
    }
}
