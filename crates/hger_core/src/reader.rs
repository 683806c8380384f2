//! Little-endian integer access at fixed offsets inside a byte buffer.
//!
//! Every save structure in this crate is addressed by absolute offset rather
//! than streamed, so these helpers replace a cursor-style reader. Reads past
//! the end of the buffer yield zero and writes past the end are dropped.

pub(crate) fn read_u8(buf: &[u8], offset: usize) -> u8 {
    buf.get(offset).copied().unwrap_or(0)
}

pub(crate) fn read_u16(buf: &[u8], offset: usize) -> u16 {
    match buf.get(offset..offset + 2) {
        Some(bytes) => u16::from_le_bytes([bytes[0], bytes[1]]),
        None => 0,
    }
}

pub(crate) fn read_u32(buf: &[u8], offset: usize) -> u32 {
    match buf.get(offset..offset + 4) {
        Some(bytes) => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        None => 0,
    }
}

pub(crate) fn write_u8(buf: &mut [u8], offset: usize, value: u8) {
    if let Some(slot) = buf.get_mut(offset) {
        *slot = value;
    }
}

pub(crate) fn write_u16(buf: &mut [u8], offset: usize, value: u16) {
    if let Some(bytes) = buf.get_mut(offset..offset + 2) {
        bytes.copy_from_slice(&value.to_le_bytes());
    }
}

pub(crate) fn write_u32(buf: &mut [u8], offset: usize, value: u32) {
    if let Some(bytes) = buf.get_mut(offset..offset + 4) {
        bytes.copy_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::{read_u16, read_u32, write_u16, write_u32};

    #[test]
    fn reads_little_endian_values() {
        let buf = [0x78, 0x56, 0x34, 0x12];
        assert_eq!(read_u16(&buf, 0), 0x5678);
        assert_eq!(read_u32(&buf, 0), 0x1234_5678);
    }

    #[test]
    fn out_of_range_access_is_inert() {
        let mut buf = [0xAAu8; 3];
        assert_eq!(read_u32(&buf, 0), 0);
        assert_eq!(read_u16(&buf, 2), 0);
        write_u32(&mut buf, 1, 0xFFFF_FFFF);
        write_u16(&mut buf, 2, 0);
        assert_eq!(buf, [0xAA; 3]);
    }
}
