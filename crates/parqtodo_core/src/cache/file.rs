//! Directory-backed snapshot cache.

use super::{validate_key, CacheResult, SnapshotCache};
use bytes::Bytes;
use log::{debug, error};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

const SNAPSHOT_EXTENSION: &str = "snapshot";

/// Stores each key as `<dir>/<key>.snapshot`, replaced atomically by rename.
#[derive(Debug, Clone)]
pub struct FileSnapshotCache {
    dir: PathBuf,
}

impl FileSnapshotCache {
    /// Opens the cache, creating `dir` when missing.
    pub fn open(dir: impl AsRef<Path>) -> CacheResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> CacheResult<PathBuf> {
        validate_key(key)?;
        Ok(self.dir.join(format!("{key}.{SNAPSHOT_EXTENSION}")))
    }
}

impl SnapshotCache for FileSnapshotCache {
    fn get(&self, key: &str) -> CacheResult<Option<Bytes>> {
        let path = self.path_for(key)?;
        match fs::read(&path) {
            Ok(buffer) => Ok(Some(Bytes::from(buffer))),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => {
                error!(
                    "event=cache_get module=cache status=error key={} error={}",
                    key, err
                );
                Err(err.into())
            }
        }
    }

    fn set(&self, key: &str, value: Bytes) -> CacheResult<()> {
        let path = self.path_for(key)?;
        let staging = path.with_extension(format!("{SNAPSHOT_EXTENSION}.tmp"));
        let written = write_staging(&staging, &value).and_then(|()| fs::rename(&staging, &path));
        if let Err(err) = written {
            // The staging file may be partial or absent.
            let _ = fs::remove_file(&staging);
            error!(
                "event=cache_set module=cache status=error key={} error={}",
                key, err
            );
            return Err(err.into());
        }
        debug!(
            "event=cache_set module=cache status=ok key={} bytes={}",
            key,
            value.len()
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> CacheResult<bool> {
        let path = self.path_for(key)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}

fn write_staging(staging: &Path, value: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(staging)?;
    file.write_all(value)?;
    file.sync_all()
}
