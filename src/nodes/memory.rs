use super::engine::{EngineFactory, EngineOptions, StorageEngine};
use crate::error::EngineError;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Ordered in-process engine. Contents are lost on close.
///
/// Nothing is written to `location`; it only identifies the node in logs.
pub struct MemoryEngine {
    data: RwLock<Option<BTreeMap<Vec<u8>, Vec<u8>>>>,
    location: PathBuf,
}

impl MemoryEngine {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            data: RwLock::new(Some(BTreeMap::new())),
            location: location.into(),
        }
    }

    /// Number of stored records; zero once closed.
    pub fn len(&self) -> usize {
        self.data.read().as_ref().map(|data| data.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl StorageEngine for MemoryEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        let guard = self.data.read();
        let data = guard.as_ref().ok_or(EngineError::Closed)?;
        Ok(data.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        let mut guard = self.data.write();
        let data = guard.as_mut().ok_or(EngineError::Closed)?;
        data.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), EngineError> {
        let mut guard = self.data.write();
        let data = guard.as_mut().ok_or(EngineError::Closed)?;
        data.remove(key);
        Ok(())
    }

    fn close(&self) -> Result<(), EngineError> {
        self.data.write().take().map(|_| ()).ok_or(EngineError::Closed)
    }

    fn location(&self) -> &Path {
        &self.location
    }
}

pub struct MemoryEngineFactory;

impl EngineFactory for MemoryEngineFactory {
    fn open(
        &self,
        location: &Path,
        _options: &EngineOptions,
    ) -> Result<Arc<dyn StorageEngine>, EngineError> {
        Ok(Arc::new(MemoryEngine::new(location)))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
