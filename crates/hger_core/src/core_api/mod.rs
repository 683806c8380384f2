mod engine;
mod error;
mod game_tables;
mod types;

pub use engine::{Engine, OpenOptions, Session};
pub use error::{CoreError, CoreErrorCode};
pub use game_tables::{GameTables, language_name};
pub use types::{
    BoxSummary, Capabilities, CapabilityIssue, CreatureSummary, MoveEntry, Snapshot,
};
