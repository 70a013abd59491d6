//! Habit document accessor over a key-value store.
//!
//! # Responsibility
//! - Load, save and clear the single JSON document under [`STORAGE_KEY`].
//! - Map storage and parse failures to semantic errors.
//!
//! # Invariants
//! - An absent key loads as `None`; it is not an error.
//! - A stored value that fails to decode is reported as corrupt, never
//!   partially recovered.
//! - Writes always replace the full document.

use crate::db::DbError;
use crate::model::app_data::{AppData, DecodeError};
use crate::repo::kv_repo::KeyValueStore;
use log::{error, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Fixed key holding the habit document.
pub const STORAGE_KEY: &str = "appData";

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failures for the habit document.
#[derive(Debug)]
pub enum StoreError {
    /// The key-value backend could not be read or written.
    Unavailable(DbError),
    /// Stored text is not a usable habit document.
    CorruptDocument(DecodeError),
    /// The in-memory document could not be encoded.
    Encode(serde_json::Error),
}

impl StoreError {
    pub fn is_corrupt(&self) -> bool {
        matches!(self, Self::CorruptDocument(_))
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "store_unavailable",
            Self::CorruptDocument(_) => "corrupt_document",
            Self::Encode(_) => "encode_failed",
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable(err) => write!(f, "storage unavailable: {err}"),
            Self::CorruptDocument(err) => write!(f, "corrupt store: {err}"),
            Self::Encode(err) => write!(f, "failed to encode habit document: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unavailable(err) => Some(err),
            Self::CorruptDocument(err) => Some(err),
            Self::Encode(err) => Some(err),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Unavailable(value)
    }
}

/// Repository interface for the whole-document habit store.
pub trait AppDataStore {
    fn load(&self) -> StoreResult<Option<AppData>>;
    fn save(&self, data: &AppData) -> StoreResult<()>;
    fn clear(&self) -> StoreResult<()>;
}

/// Document accessor bound to one key-value backend.
pub struct KvAppDataStore<K: KeyValueStore> {
    kv: K,
}

impl<K: KeyValueStore> KvAppDataStore<K> {
    pub fn new(kv: K) -> Self {
        Self { kv }
    }

    /// Borrows the backing key-value store.
    pub fn kv(&self) -> &K {
        &self.kv
    }
}

impl<K: KeyValueStore> AppDataStore for KvAppDataStore<K> {
    fn load(&self) -> StoreResult<Option<AppData>> {
        let stored = self
            .kv
            .get(STORAGE_KEY)
            .map_err(|err| log_failure("load", err.into()))?;
        let Some(text) = stored else {
            return Ok(None);
        };

        match AppData::from_json(&text) {
            Ok(data) => Ok(Some(data)),
            Err(err) => {
                warn!(
                    "event=store_load module=repo status=error error_code=corrupt_document bytes={}",
                    text.len()
                );
                Err(StoreError::CorruptDocument(err))
            }
        }
    }

    fn save(&self, data: &AppData) -> StoreResult<()> {
        let text = data
            .to_json()
            .map_err(|err| log_failure("save", StoreError::Encode(err)))?;
        self.kv
            .set(STORAGE_KEY, &text)
            .map_err(|err| log_failure("save", err.into()))
    }

    fn clear(&self) -> StoreResult<()> {
        self.kv
            .clear()
            .map_err(|err| log_failure("clear", err.into()))
    }
}

fn log_failure(op: &'static str, err: StoreError) -> StoreError {
    error!(
        "event=store_{} module=repo status=error error_code={} error={}",
        op,
        err.code(),
        err
    );
    err
}

#[cfg(test)]
mod tests {
    use super::{AppDataStore, KvAppDataStore, STORAGE_KEY};
    use crate::db::open_db_in_memory;
    use crate::repo::kv_repo::{KeyValueStore, SqliteKeyValueStore};

    fn store() -> KvAppDataStore<SqliteKeyValueStore> {
        let kv = SqliteKeyValueStore::try_new(open_db_in_memory().expect("open in-memory db"))
            .expect("kv store");
        KvAppDataStore::new(kv)
    }

    #[test]
    fn load_without_document_returns_none() {
        assert!(store().load().expect("load should succeed").is_none());
    }

    #[test]
    fn load_reports_corrupt_document() {
        let store = store();
        store.kv().set(STORAGE_KEY, "{\"habits\": 3}").expect("seed bad value");
        let error = store.load().expect_err("bad shape must be corrupt");
        assert!(error.is_corrupt());
    }
}
