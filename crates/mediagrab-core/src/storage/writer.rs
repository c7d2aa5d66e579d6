//! Sequential writer for a download's hidden temp file.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use super::temp_path;

/// Temp file for one download. Created on the first write; removed when
/// dropped unless [`PartFile::finalize`] succeeded.
pub struct PartFile {
    file: Option<File>,
    temp_path: PathBuf,
    written: u64,
    created: bool,
    finalized: bool,
}

impl PartFile {
    /// Prepares (but does not create) the temp file for `final_path`.
    pub fn new(final_path: &Path) -> Self {
        Self {
            file: None,
            temp_path: temp_path(final_path),
            written: 0,
            created: false,
            finalized: false,
        }
    }

    /// Path to the temp file.
    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    fn open(&mut self) -> io::Result<&mut File> {
        if self.file.is_none() {
            let file = File::options()
                .write(true)
                .create(true)
                .truncate(true)
                .open(&self.temp_path)?;
            self.file = Some(file);
            self.created = true;
        }
        match self.file.as_mut() {
            Some(f) => Ok(f),
            None => Err(io::Error::new(io::ErrorKind::Other, "temp file not open")),
        }
    }

    /// Appends one chunk.
    pub fn write(&mut self, data: &[u8]) -> io::Result<()> {
        self.open()?.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Flushes, closes and renames the temp file onto `final_path`; returns the byte count.
    /// An empty body still produces an (empty) file.
    pub fn finalize(mut self, final_path: &Path) -> io::Result<u64> {
        let file = self.open()?;
        file.flush()?;
        drop(self.file.take());
        std::fs::rename(&self.temp_path, final_path)?;
        self.finalized = true;
        Ok(self.written)
    }
}

impl Drop for PartFile {
    fn drop(&mut self) {
        if self.finalized {
            return;
        }
        drop(self.file.take());
        if self.created {
            if let Err(e) = std::fs::remove_file(&self.temp_path) {
                tracing::debug!(path = %self.temp_path.display(), "could not remove partial file: {}", e);
            }
        }
    }
}
