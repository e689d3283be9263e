//! Join engine and row emission
//!
//! Drives the per-record route/scan/emit cycle over a loaded secondary table.

pub mod emit;
mod engine;

pub use emit::{write_joined_row, write_placeholder_row, RowEmitter};
pub use engine::{
    join_files, JoinConfig, JoinEngine, JoinOptions, JoinStats, RecordOutcome,
    MIN_PARALLEL_CANDIDATES,
};
