//! Input and output plumbing
//!
//! Opens inputs with an I/O strategy picked from file size and compression
//! (plain, gzip, bzip2), creates the output sink, and provides a
//! line-numbered reader that reuses its buffer.

use crate::core::error::{InputRole, JoinError, Result};
use crate::core::record::trim_line_end;
use memmap2::Mmap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Default buffer size for BufReader (128KB)
pub const DEFAULT_BUFFER_SIZE: usize = 128 * 1024;

/// Large buffer size for high-throughput I/O (1MB)
pub const LARGE_BUFFER_SIZE: usize = 1024 * 1024;

/// Threshold for using memory mapping (100MB)
pub const MMAP_THRESHOLD: u64 = 100 * 1024 * 1024;

/// Path that selects stdout as the output sink
pub const STDOUT_PATH: &str = "-";

/// I/O strategy for plain-text inputs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IoStrategy {
    /// Buffered reading with the given buffer size
    Buffered(usize),
    /// Memory map the whole file
    MemoryMapped,
    /// Select from the file size
    #[default]
    Auto,
}

/// Compression format of an input file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionFormat {
    /// Plain text (uncompressed)
    Plain,
    /// Gzip or BGZF compressed (.gz)
    Gzip,
    /// Bzip2 compressed (.bz2)
    Bzip2,
}

impl CompressionFormat {
    /// Detect from extension first, then from magic bytes
    pub fn detect(path: &Path) -> io::Result<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("gz") | Some("bgz") => return Ok(CompressionFormat::Gzip),
            Some("bz2") => return Ok(CompressionFormat::Bzip2),
            _ => {}
        }

        let mut file = File::open(path)?;
        let mut magic = [0u8; 3];
        let bytes_read = file.read(&mut magic)?;
        Ok(Self::from_magic(&magic[..bytes_read]))
    }

    /// Detect from the first bytes of a stream
    pub fn from_magic(magic: &[u8]) -> Self {
        if magic.starts_with(&[0x1f, 0x8b]) {
            CompressionFormat::Gzip
        } else if magic.starts_with(b"BZh") {
            CompressionFormat::Bzip2
        } else {
            CompressionFormat::Plain
        }
    }
}

/// Memory-mapped file reader
pub struct MappedReader {
    mmap: Mmap,
    position: usize,
}

impl MappedReader {
    pub fn new(file: &File) -> io::Result<Self> {
        // SAFETY: inputs are not expected to change while a join runs
        let mmap = unsafe { Mmap::map(file)? };
        Ok(Self { mmap, position: 0 })
    }

    /// Give up the reader and keep the whole mapping
    pub fn into_mmap(self) -> Mmap {
        self.mmap
    }
}

impl Read for MappedReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = &self.mmap[self.position..];
        let n = buf.len().min(remaining.len());
        buf[..n].copy_from_slice(&remaining[..n]);
        self.position += n;
        Ok(n)
    }
}

impl BufRead for MappedReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        Ok(&self.mmap[self.position..])
    }

    fn consume(&mut self, amt: usize) {
        self.position = (self.position + amt).min(self.mmap.len());
    }
}

/// Reader over one input file, decompressing when needed
pub enum SmartReader {
    Buffered(BufReader<File>),
    Mapped(MappedReader),
    Gzip(BufReader<flate2::read::MultiGzDecoder<File>>),
    Bzip2(BufReader<bzip2::read::BzDecoder<File>>),
}

impl SmartReader {
    /// Open a file, choosing the reader from compression and `strategy`
    ///
    /// `strategy` only applies to plain-text files.
    pub fn open<P: AsRef<Path>>(path: P, strategy: IoStrategy) -> io::Result<Self> {
        let path = path.as_ref();
        let format = CompressionFormat::detect(path)?;
        let file = File::open(path)?;

        match format {
            CompressionFormat::Gzip => Ok(SmartReader::Gzip(BufReader::with_capacity(
                DEFAULT_BUFFER_SIZE,
                flate2::read::MultiGzDecoder::new(file),
            ))),
            CompressionFormat::Bzip2 => Ok(SmartReader::Bzip2(BufReader::with_capacity(
                DEFAULT_BUFFER_SIZE,
                bzip2::read::BzDecoder::new(file),
            ))),
            CompressionFormat::Plain => match strategy {
                IoStrategy::Buffered(size) => {
                    Ok(SmartReader::Buffered(BufReader::with_capacity(size, file)))
                }
                IoStrategy::MemoryMapped => Ok(SmartReader::Mapped(MappedReader::new(&file)?)),
                IoStrategy::Auto => {
                    let file_size = file.metadata()?.len();
                    if file_size >= MMAP_THRESHOLD {
                        Ok(SmartReader::Mapped(MappedReader::new(&file)?))
                    } else {
                        let size = if file_size > 10 * 1024 * 1024 {
                            LARGE_BUFFER_SIZE
                        } else {
                            DEFAULT_BUFFER_SIZE
                        };
                        Ok(SmartReader::Buffered(BufReader::with_capacity(size, file)))
                    }
                }
            },
        }
    }

    pub fn is_mapped(&self) -> bool {
        matches!(self, SmartReader::Mapped(_))
    }

    pub fn is_compressed(&self) -> bool {
        matches!(self, SmartReader::Gzip(_) | SmartReader::Bzip2(_))
    }
}

impl Read for SmartReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SmartReader::Buffered(r) => r.read(buf),
            SmartReader::Mapped(r) => r.read(buf),
            SmartReader::Gzip(r) => r.read(buf),
            SmartReader::Bzip2(r) => r.read(buf),
        }
    }
}

impl BufRead for SmartReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            SmartReader::Buffered(r) => r.fill_buf(),
            SmartReader::Mapped(r) => r.fill_buf(),
            SmartReader::Gzip(r) => r.fill_buf(),
            SmartReader::Bzip2(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            SmartReader::Buffered(r) => r.consume(amt),
            SmartReader::Mapped(r) => r.consume(amt),
            SmartReader::Gzip(r) => r.consume(amt),
            SmartReader::Bzip2(r) => r.consume(amt),
        }
    }
}

/// Open an input file, reporting failures as [`JoinError::FileAccess`]
pub fn open_input<P: AsRef<Path>>(
    path: P,
    role: InputRole,
    strategy: IoStrategy,
) -> Result<SmartReader> {
    let path = path.as_ref();
    SmartReader::open(path, strategy).map_err(|source| JoinError::FileAccess {
        role,
        path: path.to_path_buf(),
        source,
    })
}

/// Create the output sink; `-` writes to stdout
pub fn create_output<P: AsRef<Path>>(path: P) -> Result<Box<dyn Write + Send>> {
    let path = path.as_ref();
    if path == Path::new(STDOUT_PATH) {
        return Ok(Box::new(io::stdout()));
    }
    let file = File::create(path).map_err(|source| JoinError::OutputCreate {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Box::new(file))
}

/// Wrap a sink in the default-sized write buffer
pub fn buffered<W: Write>(inner: W) -> BufWriter<W> {
    BufWriter::with_capacity(DEFAULT_BUFFER_SIZE, inner)
}

/// Line reader that reuses one buffer and counts physical lines
///
/// Lines are raw bytes; no encoding is assumed.
pub struct LineReader<R: BufRead> {
    reader: R,
    buffer: Vec<u8>,
    line_number: usize,
}

impl<R: BufRead> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::with_capacity(1024),
            line_number: 0,
        }
    }

    /// Next line without its terminator; `None` at EOF
    pub fn next_line(&mut self) -> Option<io::Result<&[u8]>> {
        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => None,
            Ok(_) => {
                self.line_number += 1;
                Some(Ok(trim_line_end(&self.buffer)))
            }
            Err(e) => Some(Err(e)),
        }
    }

    /// 1-based number of the line last returned
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}
