use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::io::ErrorKind;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::log;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("io failure on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed json in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no ids left in {key} after {last}")]
    IdsExhausted { key: String, last: i64 },
}

/// Id for a record appended after `last`, starting at 1.
pub fn next_id(key: &impl Display, last: Option<i64>) -> Result<i64, DbError> {
    match last {
        None => Ok(1),
        Some(last) => last.checked_add(1).ok_or_else(|| DbError::IdsExhausted { key: key.to_string(), last }),
    }
}

/// Flat-file store: every key maps to one `<key>.json` file under `root`,
/// holding a single serialized value (usually a whole collection).
pub struct Db<K: Display, V: DeserializeOwned + Serialize> {
    pub root: PathBuf,
    key_type: PhantomData<K>,
    value_type: PhantomData<V>,
}

impl<K: Display, V: DeserializeOwned + Serialize> Db<K, V> {
    pub fn new(root: impl AsRef<Path>) -> Db<K, V> {
        Db {
            root: root.as_ref().to_path_buf(),
            key_type: PhantomData,
            value_type: PhantomData,
        }
    }

    /// `Ok(None)` when the file does not exist yet.
    pub fn read(&self, key: &K) -> Result<Option<V>, DbError> {
        let before = Instant::now();
        let path = self.get_path(key);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("[DB] No file for {key}");
                return Ok(None);
            }
            Err(e) => return Err(DbError::Io { path: path.display().to_string(), source: e }),
        };
        let value = serde_json::from_str(&data).map_err(|e| {
            log::error!("[DB] Read failed {} {}", path.display(), e);
            DbError::Parse { path: path.display().to_string(), source: e }
        })?;
        log::debug!("[DB] Read {key} {:.2?}", before.elapsed());
        Ok(Some(value))
    }

    pub fn read_or_default(&self, key: &K) -> Result<V, DbError>
    where
        V: Default,
    {
        Ok(self.read(key)?.unwrap_or_default())
    }

    pub fn write(&self, key: &K, obj: &V) -> Result<(), DbError> {
        let before = Instant::now();
        let path = self.get_path(key);
        let io_err = |source| DbError::Io { path: path.display().to_string(), source };

        let json = serde_json::to_string_pretty(obj)
            .map_err(|e| DbError::Parse { path: path.display().to_string(), source: e })?;
        std::fs::create_dir_all(&self.root).map_err(io_err)?;

        // rename is atomic on the same filesystem, readers never see a half-written file
        let tmp_path = path.with_extension("json.tmp");
        std::fs::write(&tmp_path, json).map_err(io_err)?;
        std::fs::rename(&tmp_path, &path).map_err(io_err)?;

        log::debug!("[DB] Wrote {key} {:.2?}", before.elapsed());
        Ok(())
    }

    pub fn exists(&self, key: &K) -> bool {
        self.get_path(key).is_file()
    }

    pub fn get_path(&self, key: &K) -> PathBuf {
        self.root.join(format!("{key}.json"))
    }
}
