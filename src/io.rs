//! Typed binary stream readers and writers
//!
//! The similarity graph file stores 4-byte values little-endian; the cluster
//! file keeps the big-endian 4-byte layout of JVM typed-data streams so both
//! sides of the pipeline stay interchangeable with existing tooling.

use std::io::{ErrorKind, Read, Write};

use anyhow::{bail, Context, Result};

/// Little-endian reader for headerless record streams.
///
/// Callers wrap the source in a `BufReader`; this type only does the framing.
pub struct LeReader<R: Read> {
    inner: R,
    scratch: [u8; 4],
}

impl<R: Read> LeReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            scratch: [0; 4],
        }
    }

    /// Read the next `i32`, or `None` on a clean end of stream.
    ///
    /// End of stream is only clean on a record boundary; hitting EOF with a
    /// partial value is an error.
    pub fn try_read_i32(&mut self) -> Result<Option<i32>> {
        if !self.fill(true)? {
            return Ok(None);
        }
        Ok(Some(i32::from_le_bytes(self.scratch)))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        self.fill(false)?;
        Ok(i32::from_le_bytes(self.scratch))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        self.fill(false)?;
        Ok(f32::from_le_bytes(self.scratch))
    }

    fn fill(&mut self, eof_ok: bool) -> Result<bool> {
        let mut filled = 0;
        while filled < self.scratch.len() {
            match self.inner.read(&mut self.scratch[filled..]) {
                Ok(0) if filled == 0 && eof_ok => return Ok(false),
                Ok(0) => bail!("unexpected end of stream: wanted 4 bytes, got {filled}"),
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("reading binary stream"),
            }
        }
        Ok(true)
    }
}

/// Little-endian writer, used for the edge and vector files.
pub struct LeWriter<W: Write> {
    inner: W,
}

impl<W: Write> LeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.inner
            .write_all(&value.to_le_bytes())
            .context("writing binary stream")
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.inner
            .write_all(&value.to_le_bytes())
            .context("writing binary stream")
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().context("flushing binary stream")
    }
}

/// Big-endian writer for the cluster file.
pub struct BeWriter<W: Write> {
    inner: W,
}

impl<W: Write> BeWriter<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.inner
            .write_all(&value.to_be_bytes())
            .context("writing cluster stream")
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.inner
            .write_all(&value.to_be_bytes())
            .context("writing cluster stream")
    }

    pub fn flush(&mut self) -> Result<()> {
        self.inner.flush().context("flushing cluster stream")
    }
}
