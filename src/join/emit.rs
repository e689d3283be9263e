//! Row emitter
//!
//! The output stream is shared by every worker scanning a record, so all
//! writes go through one mutex. A row is always written in full while the
//! lock is held.

use crate::core::io::buffered;
use crate::core::Placeholder;
use std::io::{self, BufWriter, Write};
use std::sync::{Mutex, MutexGuard};

/// Write `<primary>\t<secondary>\n`
#[inline]
pub fn write_joined_row<W: Write + ?Sized>(out: &mut W, primary: &[u8], secondary: &[u8]) -> io::Result<()> {
    out.write_all(primary)?;
    out.write_all(b"\t")?;
    out.write_all(secondary)?;
    out.write_all(b"\n")
}

/// Write `<primary>\t.\t.…\n`
#[inline]
pub fn write_placeholder_row<W: Write + ?Sized>(
    out: &mut W,
    primary: &[u8],
    placeholder: &Placeholder,
) -> io::Result<()> {
    write_joined_row(out, primary, placeholder.as_str().as_bytes())
}

/// Mutex-guarded, buffered output shared across scan workers
pub struct RowEmitter<W: Write> {
    out: Mutex<BufWriter<W>>,
}

impl<W: Write> RowEmitter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            out: Mutex::new(buffered(inner)),
        }
    }

    /// Take the output lock
    ///
    /// Callers that must check shared state before writing do so while
    /// holding the returned guard.
    pub fn lock(&self) -> MutexGuard<'_, BufWriter<W>> {
        // a panicking writer leaves at worst a partial row behind
        self.out.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Write one joined row
    pub fn write_match(&self, primary: &[u8], secondary: &[u8]) -> io::Result<()> {
        write_joined_row(&mut *self.lock(), primary, secondary)
    }

    /// Write one placeholder row
    pub fn write_placeholder(&self, primary: &[u8], placeholder: &Placeholder) -> io::Result<()> {
        write_placeholder_row(&mut *self.lock(), primary, placeholder)
    }

    /// Flush buffered rows and hand back the sink
    pub fn finish(self) -> io::Result<W> {
        let writer = self
            .out
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        writer.into_inner().map_err(|e| e.into_error())
    }
}
