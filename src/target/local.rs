// src/target/local.rs

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{check_format, Target, TargetWriter};
use crate::errors::{PipelineError, Result};
use crate::types::Format;

/// A file on the local filesystem.
///
/// Writes are buffered and land in a sibling temp file that is renamed over
/// the destination on commit, so `exists()` never sees a partial file.
#[derive(Debug, Clone)]
pub struct LocalTarget {
    path: PathBuf,
    format: Format,
}

impl LocalTarget {
    pub fn new(path: impl Into<PathBuf>, format: Format) -> Self {
        Self {
            path: path.into(),
            format,
        }
    }

    pub fn text(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Format::Text)
    }

    pub fn binary(path: impl Into<PathBuf>) -> Self {
        Self::new(path, Format::Nop)
    }

    pub fn local_path(&self) -> &Path {
        &self.path
    }
}

impl Target for LocalTarget {
    fn path(&self) -> String {
        self.path.display().to_string()
    }

    fn format(&self) -> Format {
        self.format
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        match fs::File::open(&self.path) {
            Ok(file) => Ok(Box::new(file)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(PipelineError::NotFound(self.path()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn open_write(&self) -> Result<Box<dyn TargetWriter>> {
        Ok(Box::new(LocalWriter {
            path: self.path.clone(),
            format: self.format,
            buf: Vec::new(),
        }))
    }
}

struct LocalWriter {
    path: PathBuf,
    format: Format,
    buf: Vec<u8>,
}

impl Write for LocalWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TargetWriter for LocalWriter {
    fn commit(self: Box<Self>) -> Result<()> {
        let path_str = self.path.display().to_string();
        check_format(self.format, &path_str, &self.buf)?;

        let parent = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent)?;

        let mut tmp = NamedTempFile::new_in(&parent)?;
        tmp.write_all(&self.buf)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;

        debug!(path = %path_str, bytes = self.buf.len(), "committed local target");
        Ok(())
    }
}
