// src/target/remote.rs

use std::io::{self, Cursor, Read, Write};
use std::sync::Arc;

use tracing::{debug, warn};

use super::store::ObjectStore;
use super::{check_format, Target, TargetWriter};
use crate::errors::{PipelineError, Result};
use crate::types::Format;

/// An object addressed by a root (`s3://bucket`) plus a relative key.
///
/// The whole payload is buffered and handed to the store in one `put` on
/// commit; a failed put leaves no object behind.
#[derive(Debug, Clone)]
pub struct RemoteTarget {
    store: Arc<dyn ObjectStore>,
    root: String,
    key: String,
    format: Format,
}

impl RemoteTarget {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        root: impl Into<String>,
        key: impl Into<String>,
        format: Format,
    ) -> Self {
        Self {
            store,
            root: root.into().trim_end_matches('/').to_string(),
            key: key.into().trim_start_matches('/').to_string(),
            format,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Target for RemoteTarget {
    fn path(&self) -> String {
        format!("{}/{}", self.root, self.key)
    }

    fn format(&self) -> Format {
        self.format
    }

    fn exists(&self) -> bool {
        match self.store.head(&self.key) {
            Ok(found) => found,
            Err(e) => {
                warn!(path = %self.path(), error = %e, "existence check failed; treating as absent");
                false
            }
        }
    }

    fn open_read(&self) -> Result<Box<dyn Read + Send>> {
        match self.store.get(&self.key)? {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes))),
            None => Err(PipelineError::NotFound(self.path())),
        }
    }

    fn open_write(&self) -> Result<Box<dyn TargetWriter>> {
        Ok(Box::new(RemoteWriter {
            target: self.clone(),
            buf: Vec::new(),
        }))
    }
}

struct RemoteWriter {
    target: RemoteTarget,
    buf: Vec<u8>,
}

impl Write for RemoteWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.write(data)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl TargetWriter for RemoteWriter {
    fn commit(self: Box<Self>) -> Result<()> {
        let RemoteWriter { target, buf } = *self;
        let path = target.path();
        check_format(target.format, &path, &buf)?;

        let len = buf.len();
        target.store.put(&target.key, buf)?;
        debug!(path = %path, bytes = len, "committed remote target");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::{MemoryObjectStore, TargetExt};

    fn target(store: &MemoryObjectStore, key: &str) -> RemoteTarget {
        RemoteTarget::new(Arc::new(store.clone()), "s3://bucket/", key, Format::Text)
    }

    #[test]
    fn path_joins_root_and_key() {
        let store = MemoryObjectStore::new();
        assert_eq!(target(&store, "/data/train.csv").path(), "s3://bucket/data/train.csv");
    }

    #[test]
    fn commit_is_a_single_visible_put() {
        let store = MemoryObjectStore::new();
        let t = target(&store, "data/train.csv");

        let mut w = t.open_write().unwrap();
        w.write_all(b"a,b\n").unwrap();
        assert!(!t.exists());
        w.write_all(b"1,2\n").unwrap();
        w.commit().unwrap();

        assert!(t.exists());
        assert_eq!(t.read_to_string().unwrap(), "a,b\n1,2\n");
    }

    #[test]
    fn failed_put_leaves_target_absent() {
        let store = MemoryObjectStore::new();
        store.set_fail_puts(true);
        let t = target(&store, "data/test.csv");

        let err = t.write_bytes(b"x").unwrap_err();
        assert!(matches!(err, PipelineError::Storage(_)));
        assert!(!t.exists());
    }

    #[test]
    fn missing_object_is_not_found() {
        let store = MemoryObjectStore::new();
        let err = target(&store, "data/heart.csv").read_bytes().unwrap_err();
        assert!(err.is_not_found());
    }
}
