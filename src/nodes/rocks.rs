use super::engine::{EngineFactory, EngineOptions, StorageEngine};
use crate::error::EngineError;
use parking_lot::RwLock;
use rocksdb::{DB, Options, WriteOptions};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// RocksDB database living in a single node directory.
///
/// The handle stays valid for shared use until [`StorageEngine::close`] takes the
/// database out; the write lock on close waits for in-flight calls to drain.
pub struct RocksEngine {
    db: RwLock<Option<DB>>,
    location: PathBuf,
    sync_writes: bool,
}

impl RocksEngine {
    pub fn open(location: impl AsRef<Path>, options: &EngineOptions) -> Result<Self, EngineError> {
        let location = location.as_ref().to_path_buf();
        if options.create_if_missing {
            fs::create_dir_all(&location)?;
        }

        let db = DB::open(&db_options(options), &location)?;
        Ok(Self {
            db: RwLock::new(Some(db)),
            location,
            sync_writes: options.sync_writes,
        })
    }

    fn write_options(&self) -> WriteOptions {
        let mut write_options = WriteOptions::default();
        write_options.set_sync(self.sync_writes);
        write_options
    }
}

fn db_options(options: &EngineOptions) -> Options {
    let mut db_options = Options::default();
    db_options.create_if_missing(options.create_if_missing);
    db_options.set_error_if_exists(options.error_if_exists);
    db_options.set_paranoid_checks(options.paranoid_checks);
    if let Some(max_open_files) = options.max_open_files {
        db_options.set_max_open_files(max_open_files);
    }
    if let Some(write_buffer_size) = options.write_buffer_size {
        db_options.set_write_buffer_size(write_buffer_size);
    }
    db_options
}

impl StorageEngine for RocksEngine {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, EngineError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(EngineError::Closed)?;
        Ok(db.get(key)?)
    }

    fn put(&self, key: &[u8], value: &[u8]) -> Result<(), EngineError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(EngineError::Closed)?;
        db.put_opt(key, value, &self.write_options())?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), EngineError> {
        let guard = self.db.read();
        let db = guard.as_ref().ok_or(EngineError::Closed)?;
        db.delete_opt(key, &self.write_options())?;
        Ok(())
    }

    fn close(&self) -> Result<(), EngineError> {
        let db = self.db.write().take().ok_or(EngineError::Closed)?;
        let flushed = db.flush();
        db.cancel_all_background_work(true);
        drop(db);
        flushed.map_err(EngineError::from)
    }

    fn location(&self) -> &Path {
        &self.location
    }
}

pub struct RocksEngineFactory;

impl EngineFactory for RocksEngineFactory {
    fn open(
        &self,
        location: &Path,
        options: &EngineOptions,
    ) -> Result<Arc<dyn StorageEngine>, EngineError> {
        Ok(Arc::new(RocksEngine::open(location, options)?))
    }

    fn name(&self) -> &'static str {
        "rocksdb"
    }
}
