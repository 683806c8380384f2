use serde::{Deserialize, Serialize};

use super::shuffle::{BLOCK_ORDER, shuffle_value, unshuffle_blocks};
use super::SIZE_STORED;
use crate::pk4::offsets;
use crate::reader::{read_u16, read_u32, read_u8};

/// How the block order of a record is chosen while decrypting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShuffleResolver {
    /// Always the order derived from the PID.
    #[default]
    Fixed,
    /// Try the PID-derived order first and fall back to whichever other order
    /// yields a plausible record. Rescues records written by tools that used a
    /// different shuffle formula.
    Heuristic,
}

impl ShuffleResolver {
    /// Pick the shuffle value for a payload that is XOR-decrypted but still in
    /// storage order.
    pub fn resolve(&self, xor_decrypted: &[u8], pid: u32) -> usize {
        let standard = shuffle_value(pid);
        match self {
            Self::Fixed => standard,
            Self::Heuristic => resolve_heuristic(xor_decrypted, standard),
        }
    }
}

fn resolve_heuristic(xor_decrypted: &[u8], standard: usize) -> usize {
    if looks_plausible(xor_decrypted, standard) {
        return standard;
    }

    match (0..BLOCK_ORDER.len())
        .filter(|&sv| sv != standard)
        .find(|&sv| looks_plausible(xor_decrypted, sv))
    {
        Some(sv) => {
            tracing::debug!(standard, resolved = sv, "record used a non-standard block order");
            sv
        }
        None => standard,
    }
}

const VALID_LANGUAGES: [u8; 7] = [1, 2, 3, 4, 5, 7, 8];
const MAX_BALL: u8 = 26;

fn looks_plausible(xor_decrypted: &[u8], sv: usize) -> bool {
    let Some(src) = xor_decrypted.get(..SIZE_STORED) else {
        return false;
    };
    let mut data = [0u8; SIZE_STORED];
    data.copy_from_slice(src);
    unshuffle_blocks(&mut data, sv);

    if read_u16(&data, offsets::SPECIES) == 0 {
        return false;
    }
    if !VALID_LANGUAGES.contains(&read_u8(&data, offsets::LANGUAGE)) {
        return false;
    }
    if !(1..=MAX_BALL).contains(&read_u8(&data, offsets::BALL_PLATINUM)) {
        return false;
    }
    let first_move = read_u16(&data, offsets::MOVES);
    if first_move == 0 || first_move == 0xFFFF {
        return false;
    }
    if read_u8(&data, offsets::PP) == 0 && read_u32(&data, offsets::IV_WORD) == 0 {
        return false;
    }

    (0..offsets::NICKNAME_LEN)
        .any(|i| read_u16(&data, offsets::NICKNAME + i * 2) == crate::text::TERMINATOR)
}
