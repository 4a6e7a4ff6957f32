// src/target/mod.rs

//! Completion-checkable storage locations.
//!
//! A [`Target`] answers `exists()` and hands out readers and writers. A
//! write only becomes visible when its [`TargetWriter`] is committed; a
//! writer dropped without `commit` leaves the target untouched.
//!
//! - [`local`]: files under the shared data directory (temp file + rename).
//! - [`remote`]: keys in an object store (single put on commit).
//! - [`store`]: the object store abstraction and its implementations.

pub mod local;
pub mod remote;
pub mod store;

use std::fmt::Debug;
use std::io::{Read, Write};
use std::sync::Arc;

pub use local::LocalTarget;
pub use remote::RemoteTarget;
pub use store::{DirectoryObjectStore, MemoryObjectStore, ObjectStore};

use crate::errors::{PipelineError, Result};
use crate::types::Format;

pub type TargetRef = Arc<dyn Target>;

pub trait Target: Send + Sync + Debug {
    /// Human-readable location (filesystem path or `scheme://bucket/key`).
    fn path(&self) -> String;

    fn format(&self) -> Format;

    /// True iff a previously committed write is visible here.
    fn exists(&self) -> bool;

    /// Fails with `NotFound` if nothing was committed.
    fn open_read(&self) -> Result<Box<dyn Read + Send>>;

    fn open_write(&self) -> Result<Box<dyn TargetWriter>>;
}

/// Write stream whose contents become visible only on [`TargetWriter::commit`].
pub trait TargetWriter: Write + Send {
    fn commit(self: Box<Self>) -> Result<()>;
}

/// Whole-object convenience helpers available on every target.
pub trait TargetExt {
    fn read_bytes(&self) -> Result<Vec<u8>>;
    fn read_to_string(&self) -> Result<String>;
    fn write_bytes(&self, bytes: &[u8]) -> Result<()>;
}

impl<T: Target + ?Sized> TargetExt for T {
    fn read_bytes(&self) -> Result<Vec<u8>> {
        let mut reader = self.open_read()?;
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        Ok(buf)
    }

    fn read_to_string(&self) -> Result<String> {
        let bytes = self.read_bytes()?;
        String::from_utf8(bytes)
            .map_err(|e| PipelineError::Storage(format!("{} is not UTF-8 text: {e}", self.path())))
    }

    fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        let mut writer = self.open_write()?;
        writer.write_all(bytes)?;
        writer.commit()
    }
}

/// Validate a buffered payload against the target's transfer mode.
pub(crate) fn check_format(format: Format, path: &str, bytes: &[u8]) -> Result<()> {
    match format {
        Format::Nop => Ok(()),
        Format::Text => std::str::from_utf8(bytes).map(|_| ()).map_err(|e| {
            PipelineError::Storage(format!("refusing to write non-UTF-8 text to {path}: {e}"))
        }),
    }
}
