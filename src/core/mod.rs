//! Core interval join data structures
//!
//! This module contains the record model, the secondary table,
//! the chromosome bucket index and input/output plumbing.

mod columns;
mod error;
mod index;
pub mod io;
mod record;
mod table;

pub use columns::ColumnSpec;
pub use error::{ColumnSpecError, InputRole, JoinError, RecordError, RecordResult, Result};
pub use index::ChromosomeIndex;
pub use io::{
    create_output, open_input, CompressionFormat, IoStrategy, LineReader, SmartReader,
    DEFAULT_BUFFER_SIZE, LARGE_BUFFER_SIZE, MMAP_THRESHOLD, STDOUT_PATH,
};
pub use record::{overlap, trim_line_end, IntervalRecord};
pub use table::{Placeholder, SecondaryTable, MISSING_MARKER};
