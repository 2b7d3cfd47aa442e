//! Table cache keyed by source identity.
//!
//! Built tables are kept and shared as `Arc<Table>`. An entry is reused only while the file on
//! disk has the same length and modification time and the same load options were
//! requested; anything else rebuilds it.

use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::SystemTime,
};

use log::debug;

use crate::{error::LoadError, loader::LoadOptions, table::Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceIdentity {
    pub path: PathBuf,
    pub len: u64,
    pub modified: Option<SystemTime>,
}

impl SourceIdentity {
    pub fn of(path: &Path) -> Result<Self, LoadError> {
        let metadata = fs::metadata(path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound(path.to_path_buf()),
            _ => LoadError::malformed(format!("Reading metadata for {path:?}: {err}")),
        })?;
        if !metadata.is_file() {
            return Err(LoadError::malformed(format!("{path:?} is not a file")));
        }
        let canonical = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        Ok(Self {
            path: canonical,
            len: metadata.len(),
            modified: metadata.modified().ok(),
        })
    }
}

struct CacheEntry {
    identity: SourceIdentity,
    options: LoadOptions,
    table: Arc<Table>,
}

#[derive(Default)]
pub struct TableCache {
    entries: HashMap<PathBuf, CacheEntry>,
    builds: usize,
    hits: usize,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached table for `path`, or builds it with `build` when the
    /// source changed, the options differ, or nothing is cached yet.
    pub fn get_or_load<F>(
        &mut self,
        path: &Path,
        options: &LoadOptions,
        build: F,
    ) -> Result<Arc<Table>, LoadError>
    where
        F: FnOnce(&Path, &LoadOptions) -> Result<Table, LoadError>,
    {
        let identity = SourceIdentity::of(path)?;
        if let Some(entry) = self.entries.get(&identity.path)
            && entry.identity == identity
            && &entry.options == options
        {
            self.hits += 1;
            debug!("Cache hit for {:?}", identity.path);
            return Ok(Arc::clone(&entry.table));
        }

        debug!("Cache miss for {:?}; building table", identity.path);
        let table = Arc::new(build(path, options)?);
        self.builds += 1;
        self.entries.insert(
            identity.path.clone(),
            CacheEntry {
                identity,
                options: options.clone(),
                table: Arc::clone(&table),
            },
        );
        Ok(table)
    }

    pub fn invalidate(&mut self, path: &Path) -> bool {
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        self.entries.remove(&key).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of tables built from disk since the cache was created.
    pub fn builds(&self) -> usize {
        self.builds
    }

    pub fn hits(&self) -> usize {
        self.hits
    }
}
