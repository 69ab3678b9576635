use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use polars::prelude::*;
use sha2::{Digest, Sha256};

use crate::error::Result;

/// Hex SHA-256 of a file's bytes.
pub fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; 8192];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Hex SHA-256 of the frame rendered as CSV with a header row. Two frames
/// with the same digest print byte-identically.
pub fn sha256_frame_as_csv(frame: &DataFrame) -> Result<String> {
    let mut frame = frame.clone();
    let mut writer = HashingWriter::new(io::sink());
    CsvWriter::new(&mut writer)
        .include_header(true)
        .finish(&mut frame)?;
    Ok(writer.finalize_hex())
}

struct HashingWriter<W: Write> {
    inner: W,
    hasher: Sha256,
}

impl<W: Write> HashingWriter<W> {
    fn new(inner: W) -> Self {
        Self {
            inner,
            hasher: Sha256::new(),
        }
    }

    fn finalize_hex(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

impl<W: Write> Write for HashingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.hasher.update(&buf[..written]);
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
