use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ByteRange {
    pub start: usize,
    pub end: usize,
}

impl ByteRange {
    pub fn new(start: usize, len: usize) -> Self {
        Self {
            start,
            end: start + len,
        }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn contains(&self, offset: usize) -> bool {
        (self.start..self.end).contains(&offset)
    }
}

/// Which member of a redundant block pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockSide {
    Primary,
    Backup,
}

impl BlockSide {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Primary => "A",
            Self::Backup => "B",
        }
    }
}

impl fmt::Display for BlockSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockFamily {
    /// Trainer data and party.
    General,
    /// Box storage.
    Storage,
}

impl BlockFamily {
    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::General => "general",
            Self::Storage => "storage",
        }
    }
}

impl fmt::Display for BlockFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where one block lives and how it was sized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRegion {
    pub family: BlockFamily,
    pub side: BlockSide,
    pub range: ByteRange,
    pub save_count: u32,
    /// False when no self-referential, CRC-valid footer was found and the
    /// default size was assumed.
    pub detected: bool,
}

impl BlockRegion {
    pub fn base(&self) -> usize {
        self.range.start
    }

    pub fn size(&self) -> usize {
        self.range.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockLayout {
    pub active: BlockSide,
    pub general: BlockRegion,
    pub storage: BlockRegion,
}

impl BlockLayout {
    pub fn is_fully_detected(&self) -> bool {
        self.general.detected && self.storage.detected
    }
}

impl fmt::Display for BlockLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Active={}  General=0x{:X}  Storage=0x{:X}  SaveCount={}",
            self.active,
            self.general.size(),
            self.storage.size(),
            self.general.save_count
        )
    }
}
