//! One-way mirror of store state into local storage, plus one-time hydration.
//!
//! Every write replaces the whole value under its key. There is no schema
//! version and no cross-key atomicity.

use crate::{
    domain::LocalStorage,
    errors::StorageError,
    models::{Meme, User},
};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;

pub const MEMES_KEY: &str = "memes";
pub const TRENDING_KEY: &str = "trendingMemes";
pub const USER_KEY: &str = "user";

#[derive(Clone)]
pub struct PersistenceMirror {
    storage: Arc<dyn LocalStorage>,
}

impl PersistenceMirror {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    pub fn load_memes(&self) -> Result<Option<Vec<Meme>>, StorageError> {
        self.load(MEMES_KEY)
    }

    pub fn load_trending(&self) -> Result<Option<Vec<Meme>>, StorageError> {
        self.load(TRENDING_KEY)
    }

    pub fn load_user(&self) -> Result<Option<User>, StorageError> {
        self.load(USER_KEY)
    }

    /// Writes collection then trending subset; a failure between the two leaves them out of step.
    pub fn save_memes(&self, memes: &[Meme], trending: &[Meme]) -> Result<(), StorageError> {
        self.save(MEMES_KEY, memes)?;
        self.save(TRENDING_KEY, trending)
    }

    pub fn save_user(&self, user: &User) -> Result<(), StorageError> {
        self.save(USER_KEY, user)
    }

    fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        let Some(raw) = self.storage.get_item(key)? else {
            tracing::debug!(key, "Mirror: nothing stored");
            return Ok(None);
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| StorageError::Serde { key: key.to_string(), source })
    }

    fn save<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|source| StorageError::Serde { key: key.to_string(), source })?;
        self.storage.set_item(key, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{source::fixtures, storage::MemoryStorage};

    #[test]
    fn empty_storage_hydrates_nothing() {
        let mirror = PersistenceMirror::new(Arc::new(MemoryStorage::new()));
        assert!(mirror.load_memes().unwrap().is_none());
        assert!(mirror.load_trending().unwrap().is_none());
        assert!(mirror.load_user().unwrap().is_none());
    }

    #[test]
    fn saved_state_reads_back_equal() {
        let mirror = PersistenceMirror::new(Arc::new(MemoryStorage::new()));
        let memes = fixtures::memes(6);
        let trending = memes[..2].to_vec();
        mirror.save_memes(&memes, &trending).unwrap();
        mirror.save_user(&User::default()).unwrap();

        assert_eq!(mirror.load_memes().unwrap().unwrap(), memes);
        assert_eq!(mirror.load_trending().unwrap().unwrap(), trending);
        assert_eq!(mirror.load_user().unwrap().unwrap(), User::default());
    }

    #[test]
    fn corrupt_value_is_a_serde_error() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item(USER_KEY, "{not json").unwrap();
        let mirror = PersistenceMirror::new(storage);
        assert!(matches!(
            mirror.load_user(),
            Err(StorageError::Serde { ref key, .. }) if key == USER_KEY
        ));
    }
}
