use crate::{
    config::Config,
    domain::{LocalStorage, MemeSource},
    errors::StoreError,
    imgflip::ImgflipClient,
    meme_store::MemeStore,
    mirror::PersistenceMirror,
    source::RemoteMemeSource,
    storage::FileStorage,
    studio::Studio,
    user_store::UserStore,
    AppState,
};
use std::{sync::Arc, time::Duration};
use tracing;

/// Wires the stores and studio around a source and a local storage backend.
pub fn assemble(
    source: Arc<dyn MemeSource>,
    storage: Arc<dyn LocalStorage>,
    premium: Option<ImgflipClient>,
    upload_delay: Duration,
    ai_caption_delay: Duration,
) -> Arc<AppState> {
    let mirror = PersistenceMirror::new(storage);
    Arc::new(AppState {
        meme_store: MemeStore::new(source.clone(), mirror.clone()),
        user_store: UserStore::new(mirror),
        studio: Studio::new(source, premium, upload_delay, ai_caption_delay),
    })
}

/// Builds production state: Imgflip-backed source and directory-backed storage.
pub fn build_state(config: &Config) -> Result<Arc<AppState>, StoreError> {
    let storage = FileStorage::open(&config.storage_dir)?;
    let client = ImgflipClient::new(
        config.imgflip_api_url.clone(),
        config.imgflip_credentials.clone(),
    );
    let source = RemoteMemeSource::new(client.clone());

    Ok(assemble(
        Arc::new(source),
        Arc::new(storage),
        Some(client),
        config.upload_delay,
        config.ai_caption_delay,
    ))
}

/// Hydrates both stores before any remote fetch, then runs the trending query.
/// With a stored collection only the trending subset is refreshed; with none
/// the trending page seeds both lists. A failed fetch is recorded in the store
/// and is not fatal.
pub async fn initialize(state: &AppState) -> Result<(), StoreError> {
    tracing::info!("Startup: hydrating stores from local storage...");
    state.user_store.hydrate().await?;

    let hydrated = match state.meme_store.hydrate().await {
        Ok(hydrated) => hydrated,
        Err(StoreError::Storage(e)) => {
            tracing::warn!(error = %e, "Startup: local storage unreadable, ignoring stored memes");
            false
        }
        Err(e) => return Err(e),
    };

    let seeded = if hydrated {
        tracing::info!("Startup: using stored memes, refreshing trending subset");
        state.meme_store.refresh_trending().await
    } else {
        tracing::info!("Startup: no stored memes, loading trending page");
        state.meme_store.load_trending().await
    };
    if let Err(e) = seeded {
        tracing::warn!(error = %e, "Startup: initial trending fetch failed, keeping stored state");
    }
    Ok(())
}
