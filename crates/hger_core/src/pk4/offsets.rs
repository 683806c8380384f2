// Offsets into a decrypted record in logical A/B/C/D order.

// block A
pub(crate) const SPECIES: usize = 0x08;
pub(crate) const HELD_ITEM: usize = 0x0A;
pub(crate) const TID: usize = 0x0C;
pub(crate) const SID: usize = 0x0E;
pub(crate) const EXP: usize = 0x10;
pub(crate) const FRIENDSHIP: usize = 0x14;
pub(crate) const ABILITY: usize = 0x15;
pub(crate) const MARKINGS: usize = 0x16;
pub(crate) const LANGUAGE: usize = 0x17;
pub(crate) const EVS: usize = 0x18;

// block B
pub(crate) const MOVES: usize = 0x28;
pub(crate) const PP: usize = 0x30;
pub(crate) const PP_UPS: usize = 0x34;
pub(crate) const IV_WORD: usize = 0x38;
pub(crate) const FORM: usize = 0x40;
pub(crate) const STAT_NATURE: usize = 0x42;
pub(crate) const MET_LOCATION: usize = 0x46;

// block C
pub(crate) const NICKNAME: usize = 0x48;
pub(crate) const NICKNAME_LEN: usize = 11;
pub(crate) const ORIGIN_GAME: usize = 0x5F;

// block D
pub(crate) const OT_NAME: usize = 0x68;
pub(crate) const OT_NAME_LEN: usize = 8;
pub(crate) const EGG_DATE: usize = 0x78;
pub(crate) const MET_DATE: usize = 0x7B;
pub(crate) const BALL_PLATINUM: usize = 0x83;
pub(crate) const MET_LEVEL_OT_GENDER: usize = 0x84;
pub(crate) const BALL: usize = 0x86;

// party tail
pub(crate) const STATUS: usize = 0x88;
pub(crate) const CURRENT_LEVEL: usize = 0x8C;
pub(crate) const CURRENT_HP: usize = 0x8E;
pub(crate) const BATTLE_STATS: usize = 0x90;
