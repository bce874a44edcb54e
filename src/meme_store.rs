//! Client-held meme collection and its trending view.
//!
//! The trending subset is a copy, so every mutation is applied to both lists.
//! Overlapping fetches resolve "last request wins": each fetch takes a ticket
//! and its result is dropped unless the ticket is still the newest issued.

use crate::{
    category::{self, Leaderboard},
    domain::MemeSource,
    errors::{SourceError, StorageError, StoreError},
    mirror::PersistenceMirror,
    models::{Comment, Meme, MemeCategory, NewComment},
};
use chrono::Utc;
use serde::Serialize;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::sync::RwLock;
use uuid::Uuid;

pub const FETCH_ERROR_MESSAGE: &str = "Failed to fetch memes";

#[derive(Serialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemeState {
    pub memes: Vec<Meme>,
    pub trending_memes: Vec<Meme>,
    pub loading: bool,
    pub error: Option<String>,
}

pub struct MemeStore {
    source: Arc<dyn MemeSource>,
    mirror: PersistenceMirror,
    state: RwLock<MemeState>,
    latest_request: AtomicU64,
}

impl MemeStore {
    pub fn new(source: Arc<dyn MemeSource>, mirror: PersistenceMirror) -> Self {
        Self {
            source,
            mirror,
            state: RwLock::new(MemeState::default()),
            latest_request: AtomicU64::new(0),
        }
    }

    /// Seeds the store from local storage. Returns true if a collection was found.
    ///
    /// The two keys load independently: an unreadable value is dropped with a
    /// warning and the other key still hydrates.
    pub async fn hydrate(&self) -> Result<bool, StoreError> {
        let memes = readable(self.mirror.load_memes())?;
        let trending = readable(self.mirror.load_trending())?;

        let mut state = self.state.write().await;
        let hydrated = memes.is_some();
        if let Some(memes) = memes {
            state.memes = memes;
        }
        if let Some(trending) = trending {
            state.trending_memes = trending;
        }
        tracing::info!(
            memes = state.memes.len(),
            trending = state.trending_memes.len(),
            "Meme store hydrated from local storage"
        );
        Ok(hydrated)
    }

    /// Replaces both the trending subset and the collection with the first
    /// page of remote memes, most liked first.
    pub async fn load_trending(&self) -> Result<Vec<Meme>, StoreError> {
        self.fetch_trending(true).await
    }

    /// Replaces only the trending subset. The collection, uploads included,
    /// is left as hydrated.
    pub async fn refresh_trending(&self) -> Result<Vec<Meme>, StoreError> {
        self.fetch_trending(false).await
    }

    async fn fetch_trending(&self, replace_collection: bool) -> Result<Vec<Meme>, StoreError> {
        let ticket = self.begin_request().await;
        tracing::debug!(ticket, replace_collection, "Loading trending memes");

        let mut trending = match self.source.fetch_memes().await {
            Ok(memes) => memes,
            Err(e) => return Err(self.fail_request(ticket, e).await),
        };
        trending.truncate(category::CATEGORY_LIMIT);
        category::sort_by_likes(&mut trending);

        let mut state = self.state.write().await;
        if !self.is_latest(ticket) {
            tracing::debug!(ticket, "Discarding superseded trending result");
            return Ok(trending);
        }
        state.trending_memes = trending.clone();
        if replace_collection {
            state.memes = trending.clone();
        }
        state.loading = false;
        state.error = None;
        self.mirror.save_memes(&state.memes, &state.trending_memes)?;
        tracing::info!(count = trending.len(), replace_collection, "Trending memes loaded");
        Ok(trending)
    }

    /// Fetches every template, narrows to `category`, and replaces the
    /// collection. On failure the error is recorded and the collection kept.
    /// A result overtaken by a newer fetch is returned but not applied.
    pub async fn fetch_by_category(
        &self,
        category: MemeCategory,
    ) -> Result<Vec<Meme>, StoreError> {
        let ticket = self.begin_request().await;
        tracing::debug!(ticket, %category, "Fetching memes by category");

        let fetched = match self.source.fetch_memes().await {
            Ok(memes) => memes,
            Err(e) => return Err(self.fail_request(ticket, e).await),
        };
        let narrowed = category::narrow_by_category(fetched, category, &mut rand::thread_rng());

        let mut state = self.state.write().await;
        if !self.is_latest(ticket) {
            tracing::debug!(ticket, %category, "Discarding superseded fetch result");
            return Ok(narrowed);
        }
        state.memes = narrowed.clone();
        state.loading = false;
        state.error = None;
        self.mirror.save_memes(&state.memes, &state.trending_memes)?;
        tracing::info!(%category, count = narrowed.len(), "Meme collection replaced");
        Ok(narrowed)
    }

    /// Read-only: results are returned, the collection is left alone.
    pub async fn search(&self, query: &str) -> Result<Vec<Meme>, StoreError> {
        tracing::debug!(%query, "Searching memes");
        if !query.is_empty() {
            let delegated = self.source.search_memes(query).await.map_err(StoreError::Fetch)?;
            if let Some(results) = delegated {
                return Ok(results);
            }
        }
        let memes = self.source.fetch_memes().await.map_err(StoreError::Fetch)?;
        Ok(category::filter_by_query(memes, query))
    }

    /// Prepends, so the collection reads most recent first.
    pub async fn add_meme(&self, meme: Meme) -> Result<(), StoreError> {
        let mut state = self.state.write().await;
        tracing::info!(meme_id = %meme.id, "Adding meme to collection");
        state.memes.insert(0, meme);
        self.mirror.save_memes(&state.memes, &state.trending_memes)?;
        Ok(())
    }

    /// Adds one like wherever the meme appears. Returns the updated meme, or
    /// None if the id is unknown.
    pub async fn like_meme(&self, id: &str) -> Result<Option<Meme>, StoreError> {
        let mut state = self.state.write().await;
        let MemeState { memes, trending_memes, .. } = &mut *state;

        let mut updated = None;
        for meme in memes.iter_mut().chain(trending_memes.iter_mut()) {
            if meme.id == id {
                meme.likes += 1;
                updated.get_or_insert_with(|| meme.clone());
            }
        }

        if updated.is_none() {
            tracing::warn!(meme_id = %id, "Like ignored: meme not found");
            return Ok(None);
        }
        self.mirror.save_memes(&state.memes, &state.trending_memes)?;
        tracing::debug!(meme_id = %id, "Meme liked");
        Ok(updated)
    }

    /// Appends a comment with a fresh id and the current time. Returns the new
    /// comment, or None if the meme is unknown.
    pub async fn add_comment(
        &self,
        meme_id: &str,
        comment: NewComment,
    ) -> Result<Option<Comment>, StoreError> {
        let new_comment = Comment {
            id: Uuid::new_v4().to_string(),
            text: comment.text,
            username: comment.username,
            created_at: Utc::now(),
        };

        let mut state = self.state.write().await;
        let MemeState { memes, trending_memes, .. } = &mut *state;

        let mut found = false;
        for meme in memes.iter_mut().chain(trending_memes.iter_mut()) {
            if meme.id == meme_id {
                meme.comments.push(new_comment.clone());
                found = true;
            }
        }

        if !found {
            tracing::warn!(%meme_id, "Comment ignored: meme not found");
            return Ok(None);
        }
        self.mirror.save_memes(&state.memes, &state.trending_memes)?;
        tracing::debug!(%meme_id, comment_id = %new_comment.id, "Comment added");
        Ok(Some(new_comment))
    }

    /// Looks in the collection, then the trending subset. Never fetches.
    pub async fn get_by_id(&self, id: &str) -> Option<Meme> {
        let state = self.state.read().await;
        state
            .memes
            .iter()
            .chain(state.trending_memes.iter())
            .find(|meme| meme.id == id)
            .cloned()
    }

    pub async fn memes(&self) -> Vec<Meme> {
        self.state.read().await.memes.clone()
    }

    pub async fn trending(&self) -> Vec<Meme> {
        self.state.read().await.trending_memes.clone()
    }

    pub async fn snapshot(&self) -> MemeState {
        self.state.read().await.clone()
    }

    pub async fn leaderboard(&self) -> Leaderboard {
        category::leaderboard(&self.state.read().await.memes)
    }

    async fn begin_request(&self) -> u64 {
        let ticket = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.write().await.loading = true;
        ticket
    }

    fn is_latest(&self, ticket: u64) -> bool {
        self.latest_request.load(Ordering::SeqCst) == ticket
    }

    async fn fail_request(&self, ticket: u64, error: SourceError) -> StoreError {
        tracing::error!(ticket, error = %error, "Meme fetch failed");
        let mut state = self.state.write().await;
        if self.is_latest(ticket) {
            state.loading = false;
            state.error = Some(FETCH_ERROR_MESSAGE.to_string());
        }
        StoreError::Fetch(error)
    }
}

fn readable<T>(loaded: Result<Option<T>, StorageError>) -> Result<Option<T>, StorageError> {
    match loaded {
        Err(StorageError::Serde { key, source }) => {
            tracing::warn!(%key, error = %source, "Ignoring unreadable stored value");
            Ok(None)
        }
        other => other,
    }
}
