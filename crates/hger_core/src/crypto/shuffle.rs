use super::{BLOCK_SIZE, PAYLOAD_START};

pub const BLOCK_COUNT: usize = 4;

/// Storage order of the logical blocks A=0, B=1, C=2, D=3 for each shuffle
/// value. Entry `i` names the logical block held at storage position `i`.
pub const BLOCK_ORDER: [[u8; BLOCK_COUNT]; 24] = [
    [0, 1, 2, 3],
    [0, 1, 3, 2],
    [0, 2, 1, 3],
    [0, 2, 3, 1],
    [0, 3, 1, 2],
    [0, 3, 2, 1],
    [1, 0, 2, 3],
    [1, 0, 3, 2],
    [1, 2, 0, 3],
    [1, 2, 3, 0],
    [1, 3, 0, 2],
    [1, 3, 2, 0],
    [2, 0, 1, 3],
    [2, 0, 3, 1],
    [2, 1, 0, 3],
    [2, 1, 3, 0],
    [2, 3, 0, 1],
    [2, 3, 1, 0],
    [3, 0, 1, 2],
    [3, 0, 2, 1],
    [3, 1, 0, 2],
    [3, 1, 2, 0],
    [3, 2, 0, 1],
    [3, 2, 1, 0],
];

const SHUFFLED_LEN: usize = BLOCK_SIZE * BLOCK_COUNT;

pub fn shuffle_value(pid: u32) -> usize {
    (((pid & 0x3_E000) >> 13) % 24) as usize
}

fn order(sv: usize) -> &'static [u8; BLOCK_COUNT] {
    &BLOCK_ORDER[sv % BLOCK_ORDER.len()]
}

/// Storage position that holds `logical_block` under shuffle value `sv`.
pub fn storage_position(sv: usize, logical_block: usize) -> usize {
    order(sv)
        .iter()
        .position(|&block| usize::from(block) == logical_block)
        .unwrap_or(logical_block)
}

/// Rearrange logical A/B/C/D blocks into storage order.
pub fn shuffle_blocks(data: &mut [u8], sv: usize) {
    let Some(payload) = data.get_mut(PAYLOAD_START..PAYLOAD_START + SHUFFLED_LEN) else {
        return;
    };

    let mut temp = [0u8; SHUFFLED_LEN];
    for (position, &logical) in order(sv).iter().enumerate() {
        let src = usize::from(logical) * BLOCK_SIZE;
        let dst = position * BLOCK_SIZE;
        temp[dst..dst + BLOCK_SIZE].copy_from_slice(&payload[src..src + BLOCK_SIZE]);
    }
    payload.copy_from_slice(&temp);
}

/// Rearrange storage-order blocks back into logical A/B/C/D order.
pub fn unshuffle_blocks(data: &mut [u8], sv: usize) {
    let Some(payload) = data.get_mut(PAYLOAD_START..PAYLOAD_START + SHUFFLED_LEN) else {
        return;
    };

    let mut temp = [0u8; SHUFFLED_LEN];
    for (position, &logical) in order(sv).iter().enumerate() {
        let src = position * BLOCK_SIZE;
        let dst = usize::from(logical) * BLOCK_SIZE;
        temp[dst..dst + BLOCK_SIZE].copy_from_slice(&payload[src..src + BLOCK_SIZE]);
    }
    payload.copy_from_slice(&temp);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::SIZE_STORED;

    fn tagged_blocks() -> Vec<u8> {
        let mut data = vec![0xEEu8; SIZE_STORED];
        for block in 0..BLOCK_COUNT {
            let start = PAYLOAD_START + block * BLOCK_SIZE;
            data[start..start + BLOCK_SIZE].fill(block as u8);
        }
        data
    }

    #[test]
    fn every_order_is_a_permutation() {
        for order in BLOCK_ORDER {
            let mut seen = order;
            seen.sort_unstable();
            assert_eq!(seen, [0, 1, 2, 3]);
        }
    }

    #[test]
    fn unshuffle_inverts_shuffle_for_all_orders() {
        let original = tagged_blocks();
        for sv in 0..BLOCK_ORDER.len() {
            let mut data = original.clone();
            shuffle_blocks(&mut data, sv);
            unshuffle_blocks(&mut data, sv);
            assert_eq!(data, original, "sv={sv}");
        }
    }

    #[test]
    fn shuffle_places_logical_blocks_per_table() {
        let mut data = tagged_blocks();
        // order 9 is B C D A
        shuffle_blocks(&mut data, 9);
        let at = |pos: usize| data[PAYLOAD_START + pos * BLOCK_SIZE];
        assert_eq!([at(0), at(1), at(2), at(3)], [1, 2, 3, 0]);
        assert_eq!(storage_position(9, 0), 3);
        assert_eq!(&data[..PAYLOAD_START], &[0xEE; PAYLOAD_START]);
    }

    #[test]
    fn shuffle_value_uses_pid_bits_13_to_17() {
        assert_eq!(shuffle_value(0), 0);
        assert_eq!(shuffle_value(0x0000_2000), 1);
        assert_eq!(shuffle_value(0x0003_E000), 31 % 24);
        assert_eq!(shuffle_value(0xFFFC_1FFF), 0);
        assert_eq!(shuffle_value(0x1234_5678), ((0x1234_5678u32 & 0x3E000) >> 13) as usize % 24);
    }

    #[test]
    fn short_buffers_are_left_alone() {
        let mut data = vec![1u8; 40];
        shuffle_blocks(&mut data, 5);
        assert_eq!(data, vec![1u8; 40]);
    }
}
