//! Footer scanning and active-block selection.
//!
//! Every function here is a pure function of the save buffer.

use crate::crypto::crc16;
use crate::layout::{BlockFamily, BlockLayout, BlockRegion, BlockSide, ByteRange};
use crate::reader::{read_u16, read_u32, write_u16};

pub const SAVE_SIZE: usize = 0x80000;

pub const GENERAL_A_BASE: usize = 0x00000;
pub const STORAGE_A_BASE: usize = 0x10000;
pub const GENERAL_B_BASE: usize = 0x40000;
pub const STORAGE_B_BASE: usize = 0x50000;

pub const GENERAL_ALLOC_SIZE: usize = 0x10000;
pub const STORAGE_ALLOC_SIZE: usize = 0x30000;

/// Sizes assumed when no valid footer is found.
pub const GENERAL_FALLBACK_SIZE: usize = 0xF628;
pub const STORAGE_FALLBACK_SIZE: usize = 0x12310;

pub const FOOTER_SIZE: usize = 0x10;
const FOOTER_SAVE_COUNT: usize = 0x00;
const FOOTER_BLOCK_SIZE: usize = 0x04;
const FOOTER_CRC: usize = 0x0E;

const MIN_BLOCK_SIZE: usize = FOOTER_SIZE + 4;
const SIZE_STEP: usize = 4;

pub fn block_base(family: BlockFamily, side: BlockSide) -> usize {
    match (family, side) {
        (BlockFamily::General, BlockSide::Primary) => GENERAL_A_BASE,
        (BlockFamily::General, BlockSide::Backup) => GENERAL_B_BASE,
        (BlockFamily::Storage, BlockSide::Primary) => STORAGE_A_BASE,
        (BlockFamily::Storage, BlockSide::Backup) => STORAGE_B_BASE,
    }
}

pub fn alloc_size(family: BlockFamily) -> usize {
    match family {
        BlockFamily::General => GENERAL_ALLOC_SIZE,
        BlockFamily::Storage => STORAGE_ALLOC_SIZE,
    }
}

pub fn fallback_size(family: BlockFamily) -> usize {
    match family {
        BlockFamily::General => GENERAL_FALLBACK_SIZE,
        BlockFamily::Storage => STORAGE_FALLBACK_SIZE,
    }
}

/// CRC over the data part of a block, everything before its footer.
pub fn compute_block_crc(raw: &[u8], base: usize, size: usize) -> Option<u16> {
    let data_end = (base + size).checked_sub(FOOTER_SIZE)?;
    raw.get(base..data_end).map(crc16)
}

/// Smallest size whose footer names itself and whose CRC matches.
///
/// Sizes are tried from 20 upward in steps of 4, never past `alloc` or the
/// end of the buffer.
pub fn detect_block_size(raw: &[u8], base: usize, alloc: usize) -> Option<usize> {
    let max_size = alloc.min(raw.len().saturating_sub(base));

    (MIN_BLOCK_SIZE..=max_size)
        .step_by(SIZE_STEP)
        .find(|&size| footer_is_valid(raw, base, size))
}

fn footer_is_valid(raw: &[u8], base: usize, size: usize) -> bool {
    let footer = base + size - FOOTER_SIZE;
    if read_u32(raw, footer + FOOTER_BLOCK_SIZE) as usize != size {
        return false;
    }
    let stored = read_u16(raw, footer + FOOTER_CRC);
    compute_block_crc(raw, base, size) == Some(stored)
}

pub fn save_count(raw: &[u8], base: usize, size: usize) -> u32 {
    match (base + size).checked_sub(FOOTER_SIZE) {
        Some(footer) => read_u32(raw, footer + FOOTER_SAVE_COUNT),
        None => 0,
    }
}

/// Inspect one physical block in isolation.
pub fn probe_block(raw: &[u8], family: BlockFamily, side: BlockSide) -> BlockRegion {
    let base = block_base(family, side);
    let detected = detect_block_size(raw, base, alloc_size(family));
    region(raw, family, side, detected)
}

fn region(
    raw: &[u8],
    family: BlockFamily,
    side: BlockSide,
    detected: Option<usize>,
) -> BlockRegion {
    let base = block_base(family, side);
    let size = detected.unwrap_or_else(|| fallback_size(family));
    BlockRegion {
        family,
        side,
        range: ByteRange::new(base, size),
        save_count: save_count(raw, base, size),
        detected: detected.is_some(),
    }
}

/// Choose the active general/storage pair.
///
/// Side A wins ties on the save counter. A side is only eligible when its
/// general block validated; with neither valid, A is used with the fallback
/// size. Storage is then detected on the chosen side.
pub fn select_layout(raw: &[u8]) -> BlockLayout {
    let general_a = detect_block_size(raw, GENERAL_A_BASE, GENERAL_ALLOC_SIZE);
    let general_b = detect_block_size(raw, GENERAL_B_BASE, GENERAL_ALLOC_SIZE);

    let count_a = general_a.map_or(0, |size| save_count(raw, GENERAL_A_BASE, size));
    let count_b = general_b.map_or(0, |size| save_count(raw, GENERAL_B_BASE, size));

    let (active, general_size) = match (general_a, general_b) {
        (Some(size), _) if count_a >= count_b => (BlockSide::Primary, Some(size)),
        (_, Some(size)) => (BlockSide::Backup, Some(size)),
        _ => (BlockSide::Primary, general_a),
    };

    let general = region(raw, BlockFamily::General, active, general_size);
    if general.detected {
        tracing::debug!(
            side = %active,
            size = general.size(),
            count_a,
            count_b,
            "general block detected"
        );
    } else {
        tracing::warn!(
            size = general.size(),
            "no valid general block footer, assuming default size"
        );
    }

    let storage_base = block_base(BlockFamily::Storage, active);
    let storage_size = detect_block_size(raw, storage_base, STORAGE_ALLOC_SIZE);
    let storage = region(raw, BlockFamily::Storage, active, storage_size);
    if storage.detected {
        tracing::debug!(side = %active, size = storage.size(), "storage block detected");
    } else {
        tracing::warn!(
            side = %active,
            size = storage.size(),
            "no valid storage block footer, assuming default size"
        );
    }

    BlockLayout {
        active,
        general,
        storage,
    }
}

/// Rewrite a block's footer CRC from its current contents.
pub fn recalc_crc(raw: &mut [u8], region: &BlockRegion) {
    let size = region.size();
    if size <= FOOTER_SIZE {
        return;
    }
    let crc_offset = region.base() + size - FOOTER_SIZE + FOOTER_CRC;
    if crc_offset + 2 > raw.len() {
        return;
    }
    if let Some(crc) = compute_block_crc(raw, region.base(), size) {
        write_u16(raw, crc_offset, crc);
    }
}
