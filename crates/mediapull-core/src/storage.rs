//! Disk side of a download: stream into `<dest>.part`, then rename.
//!
//! A failed download removes its temp file, so the destination path never
//! holds a partial image.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before the rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `cat.jpg` → `cat.jpg.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Buffered temp file for one download.
pub struct PartFile {
    writer: BufWriter<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl PartFile {
    /// Create intermediate directories (idempotent) and truncate/create the temp file.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let temp_path = temp_path(final_path);
        let file = File::create(&temp_path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Bytes written so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    /// Flush and rename onto the final path. Returns bytes written.
    /// On error the temp file is removed.
    pub fn finalize(self) -> io::Result<u64> {
        let PartFile {
            writer,
            temp_path,
            final_path,
            written,
        } = self;
        let result = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| {
                drop(file);
                fs::rename(&temp_path, &final_path)
            });
        if let Err(e) = result {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        Ok(written)
    }

    /// Drop the temp file. Best-effort; removal errors are ignored.
    pub fn discard(self) {
        let PartFile {
            writer, temp_path, ..
        } = self;
        drop(writer);
        if let Err(e) = fs::remove_file(&temp_path) {
            tracing::debug!(path = %temp_path.display(), "temp file cleanup failed: {}", e);
        }
    }
}

impl Write for PartFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.writer.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
