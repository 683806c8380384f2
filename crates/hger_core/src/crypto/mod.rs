//! Record encryption, sub-block shuffling and block checksums.
//!
//! A stored record is `PID | sanity | checksum | 4×32-byte sub-blocks` with an
//! optional 100-byte battle-stat tail. The sub-blocks are XORed with an LCRNG
//! keystream seeded by the checksum and stored in a PID-selected order; the
//! tail is XORed with a keystream seeded by the PID itself.

pub mod resolver;
pub mod shuffle;

use crate::reader::{read_u16, read_u32, write_u16};

pub use resolver::ShuffleResolver;
pub use shuffle::{
    BLOCK_COUNT, BLOCK_ORDER, shuffle_blocks, shuffle_value, storage_position, unshuffle_blocks,
};

/// Party record size: stored record plus battle stats.
pub const SIZE_PARTY: usize = 236;
/// Boxed record size.
pub const SIZE_STORED: usize = 136;
pub const BLOCK_SIZE: usize = 32;
pub const PAYLOAD_START: usize = 8;
pub const PAYLOAD_END: usize = PAYLOAD_START + BLOCK_SIZE * BLOCK_COUNT;
pub const BATTLE_STATS_START: usize = PAYLOAD_END;

pub(crate) const OFS_PID: usize = 0x00;
pub(crate) const OFS_CHECKSUM: usize = 0x06;

const LCRNG_MULT: u32 = 0x41C6_4E6D;
const LCRNG_ADD: u32 = 0x6073;

pub fn lcrng_next(state: u32) -> u32 {
    state.wrapping_mul(LCRNG_MULT).wrapping_add(LCRNG_ADD)
}

/// XOR `length` bytes at `offset` with the LCRNG keystream for `seed`.
///
/// Applying it twice with the same arguments restores the input. The range is
/// clamped to the buffer; an odd trailing byte takes the low keystream byte.
pub fn crypt(data: &mut [u8], seed: u32, offset: usize, length: usize) {
    let end = offset.saturating_add(length).min(data.len());
    if offset >= end {
        return;
    }

    let mut state = seed;
    for pair in data[offset..end].chunks_mut(2) {
        state = lcrng_next(state);
        let key = ((state >> 16) as u16).to_le_bytes();
        for (byte, k) in pair.iter_mut().zip(key) {
            *byte ^= k;
        }
    }
}

/// Sum of the little-endian words of the decrypted payload, truncated to 16 bits.
pub fn checksum(decrypted: &[u8]) -> u16 {
    (PAYLOAD_START..PAYLOAD_END)
        .step_by(2)
        .fold(0u16, |sum, offset| sum.wrapping_add(read_u16(decrypted, offset)))
}

/// Decrypt an on-disk record into logical A/B/C/D order.
///
/// Returns the plaintext and the shuffle value that was undone.
pub fn decrypt_record(raw: &[u8], resolver: ShuffleResolver) -> (Vec<u8>, usize) {
    let mut result = raw.to_vec();
    let seed = u32::from(read_u16(raw, OFS_CHECKSUM));
    crypt(&mut result, seed, PAYLOAD_START, PAYLOAD_END - PAYLOAD_START);

    let pid = read_u32(raw, OFS_PID);
    let sv = resolver.resolve(&result, pid);
    unshuffle_blocks(&mut result, sv);

    if result.len() == SIZE_PARTY {
        crypt(&mut result, pid, BATTLE_STATS_START, SIZE_PARTY - BATTLE_STATS_START);
    }

    (result, sv)
}

/// Encrypt a logical-order record, recomputing and storing its checksum.
pub fn encrypt_record(decrypted: &[u8], sv: usize) -> Vec<u8> {
    let mut result = decrypted.to_vec();
    let pid = read_u32(decrypted, OFS_PID);

    let sum = checksum(decrypted);
    write_u16(&mut result, OFS_CHECKSUM, sum);

    shuffle_blocks(&mut result, sv);
    crypt(&mut result, u32::from(sum), PAYLOAD_START, PAYLOAD_END - PAYLOAD_START);

    if result.len() == SIZE_PARTY {
        crypt(&mut result, pid, BATTLE_STATS_START, SIZE_PARTY - BATTLE_STATS_START);
    }

    result
}

/// Read the stored species word of an encrypted record without decrypting
/// anything but that word.
pub fn peek_species(raw: &[u8]) -> u16 {
    if raw.len() < SIZE_STORED {
        return 0;
    }

    let pid = read_u32(raw, OFS_PID);
    let position = storage_position(shuffle_value(pid), 0);
    let word_index = position * BLOCK_SIZE / 2;

    let mut state = u32::from(read_u16(raw, OFS_CHECKSUM));
    for _ in 0..=word_index {
        state = lcrng_next(state);
    }

    read_u16(raw, PAYLOAD_START + position * BLOCK_SIZE) ^ (state >> 16) as u16
}

/// CRC-16/CCITT-FALSE as used by the save block footers.
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0xFFFF;
    for &byte in data {
        crc ^= u16::from(byte) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}
