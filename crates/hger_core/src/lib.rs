//! Save inspection and editing for HeartGold/SoulSilver saves built on
//! hg-engine.
//!
//! [`sav4::SaveFile`] owns a 512 KiB image and exposes trainer data, the
//! party and the PC boxes. Creature records are [`pk4::Pk4`] values, decoded
//! through [`crypto`]. [`core_api`] wraps both behind an engine/session API
//! with names resolved from a data directory.

pub mod core_api;
pub mod crypto;
pub mod game_data;
pub mod gender;
pub mod layout;
pub mod pk4;
mod reader;
pub mod sav4;
pub mod text;
