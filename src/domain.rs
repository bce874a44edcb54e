use crate::errors::{SourceError, StorageError};
use crate::models::{Meme, MemeTemplate};
use async_trait::async_trait;

/// Where memes come from. The production source calls Imgflip and enriches the
/// templates with synthetic engagement; tests use a fixed fixture.
#[async_trait]
pub trait MemeSource: Send + Sync + 'static { // Send+Sync+'static required for Arc<dyn>
    /// Every template, already turned into memes.
    async fn fetch_memes(&self) -> Result<Vec<Meme>, SourceError>;

    /// Server-side search. Returns Ok(None) when no premium search is configured,
    /// in which case callers filter locally.
    async fn search_memes(&self, query: &str) -> Result<Option<Vec<Meme>>, SourceError>;

    /// Raw templates, for template-based creation.
    async fn templates(&self) -> Result<Vec<MemeTemplate>, SourceError>;
}

/// Synchronous string key/value store standing in for browser local storage.
/// Writes block the caller and are not transactional across keys.
pub trait LocalStorage: Send + Sync + 'static {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}
