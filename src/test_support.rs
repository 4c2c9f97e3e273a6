//! Fault-injecting engines shared by unit tests.

use crate::error::EngineError;
use crate::nodes::{EngineFactory, EngineOptions, MemoryEngine, StorageEngine};
use dashmap::{DashMap, DashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

/// In-memory engine whose reads, writes and close can be made to fail on demand.
pub struct FaultyEngine {
    inner: MemoryEngine,
    pub fail_reads: AtomicBool,
    pub fail_writes: AtomicBool,
    pub fail_close: AtomicBool,
    /// Milliseconds `close` blocks before releasing the engine.
    pub close_delay_ms: AtomicU64,
    pub writes: AtomicUsize,
}

impl FaultyEngine {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            inner: MemoryEngine::new(location),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
            fail_close: AtomicBool::new(false),
            close_delay_ms: AtomicU64::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    fn injected(flag: &AtomicBool, what: &str) -> Result<(), EngineError> {
        if flag.load(Ordering::SeqCst) {
            return Err(EngineError::Backend(format!("injected {} failure", what)));
        }
        Ok(())
    }
}

impl StorageEngine for FaultyEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        Self::injected(&self.fail_reads, "read")?;
        self.inner.get(key)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        Self::injected(&self.fail_writes, "write")?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.put(key, value)
    }

    fn delete(&self, key: &[u8]) -> Result<(), EngineError> {
        Self::injected(&self.fail_writes, "delete")?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete(key)
    }

    fn close(&self) -> Result<(), EngineError> {
        let delay = self.close_delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        let closed = self.inner.close();
        Self::injected(&self.fail_close, "close")?;
        closed
    }

    fn location(&self) -> &Path {
        self.inner.location()
    }
}

/// Opens [`FaultyEngine`]s and remembers them by location so tests can reach in.
#[derive(Default)]
pub struct FaultyFactory {
    engines: DashMap<PathBuf, Arc<FaultyEngine>>,
    refuse: DashSet<PathBuf>,
    pub opened: AtomicUsize,
}

impl FaultyFactory {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes every later open of `location` fail.
    pub fn refuse(&self, location: impl Into<PathBuf>) {
        self.refuse.insert(location.into());
    }

    pub fn engine(&self, location: impl AsRef<Path>) -> Arc<FaultyEngine> {
        self.engines
            .get(location.as_ref())
            .map(|entry| entry.value().clone())
            .expect("engine was never opened")
    }
}

impl EngineFactory for FaultyFactory {
    fn open(
        &self,
        location: &Path,
        _options: &EngineOptions,
    ) -> Result<Arc<dyn StorageEngine>, EngineError> {
        if self.refuse.contains(location) {
            return Err(EngineError::Backend(format!(
                "injected open failure at {}",
                location.display()
            )));
        }
        let engine = Arc::new(FaultyEngine::new(location));
        self.engines.insert(location.to_path_buf(), engine.clone());
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(engine)
    }

    fn name(&self) -> &'static str {
        "faulty"
    }
}
