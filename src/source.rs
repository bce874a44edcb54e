use crate::{
    domain::MemeSource,
    errors::SourceError,
    imgflip::ImgflipClient,
    models::{Meme, MemeTemplate},
    transform::transform_templates,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Mutex,
};

/// Imgflip templates plus synthetic engagement.
#[derive(Debug, Clone)]
pub struct RemoteMemeSource {
    client: ImgflipClient,
}

impl RemoteMemeSource {
    pub fn new(client: ImgflipClient) -> Self {
        Self { client }
    }

    fn enrich(templates: Vec<MemeTemplate>) -> Vec<Meme> {
        transform_templates(templates, &mut rand::thread_rng(), Utc::now())
    }
}

#[async_trait]
impl MemeSource for RemoteMemeSource {
    async fn fetch_memes(&self) -> Result<Vec<Meme>, SourceError> {
        let templates = self.client.get_memes().await?;
        Ok(Self::enrich(templates))
    }

    async fn search_memes(&self, query: &str) -> Result<Option<Vec<Meme>>, SourceError> {
        if !self.client.is_premium() {
            return Ok(None);
        }
        tracing::debug!(%query, "Delegating search to premium endpoint");
        let templates = self.client.search_memes(query, false).await?;
        Ok(Some(Self::enrich(templates)))
    }

    async fn templates(&self) -> Result<Vec<MemeTemplate>, SourceError> {
        self.client.get_memes().await
    }
}

/// Deterministic source: always returns the same memes, or fails on demand.
/// Search is local unless delegated results are set.
#[derive(Debug, Default)]
pub struct FixtureMemeSource {
    memes: Mutex<Vec<Meme>>,
    search_results: Mutex<Option<Vec<Meme>>>,
    failing: AtomicBool,
}

impl FixtureMemeSource {
    pub fn new(memes: Vec<Meme>) -> Self {
        Self {
            memes: Mutex::new(memes),
            search_results: Mutex::new(None),
            failing: AtomicBool::new(false),
        }
    }

    /// Makes every subsequent call fail with an API error until reset.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_memes(&self, memes: Vec<Meme>) {
        if let Ok(mut guard) = self.memes.lock() {
            *guard = memes;
        }
    }

    /// Acts like a premium account: every non-empty query answers with `results`.
    pub fn set_search_results(&self, results: Option<Vec<Meme>>) {
        if let Ok(mut guard) = self.search_results.lock() {
            *guard = results;
        }
    }

    fn check_failing(&self) -> Result<(), SourceError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SourceError::Api("fixture source is failing".to_string()));
        }
        Ok(())
    }

    fn current(&self) -> Result<Vec<Meme>, SourceError> {
        self.check_failing()?;
        self.memes
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| SourceError::Api("fixture source lock poisoned".to_string()))
    }
}

#[async_trait]
impl MemeSource for FixtureMemeSource {
    async fn fetch_memes(&self) -> Result<Vec<Meme>, SourceError> {
        self.current()
    }

    async fn search_memes(&self, query: &str) -> Result<Option<Vec<Meme>>, SourceError> {
        let results = self
            .search_results
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| SourceError::Api("fixture source lock poisoned".to_string()))?;
        if results.is_some() {
            tracing::debug!(%query, "Fixture source answering delegated search");
            self.check_failing()?;
        }
        Ok(results)
    }

    async fn templates(&self) -> Result<Vec<MemeTemplate>, SourceError> {
        Ok(self
            .current()?
            .into_iter()
            .map(|meme| MemeTemplate {
                id: meme.id,
                name: meme.name,
                url: meme.url,
                width: meme.width,
                height: meme.height,
                box_count: meme.box_count.unwrap_or(2),
                captions: None,
            })
            .collect())
    }
}

/// Reproducible memes for tests and local development.
pub mod fixtures {
    use crate::models::{Comment, Meme, MemeCategory};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0)
            .single()
            .unwrap_or_default()
    }

    /// `n` memes with distinct likes and creation times, categories cycling
    /// through the assignable ones, and `i % 3` comments each.
    pub fn memes(n: usize) -> Vec<Meme> {
        (0..n)
            .map(|i| {
                let created_at = epoch() - Duration::hours(((i * 13) % n.max(1)) as i64);
                Meme {
                    id: format!("tpl-{}", i),
                    name: format!("Template {}", i),
                    url: format!("https://i.imgflip.com/tpl{}.jpg", i),
                    width: 500,
                    height: 500,
                    box_count: Some(2),
                    caption: None,
                    likes: ((i * 389) % 1000) as u64,
                    comments: (0..i % 3)
                        .map(|c| Comment {
                            id: format!("comment-{}-{}", c, i),
                            text: "This is so relatable!".to_string(),
                            username: "meme_lord".to_string(),
                            created_at: created_at + Duration::minutes(c as i64),
                        })
                        .collect(),
                    category: MemeCategory::ASSIGNABLE[i % 4],
                    created_at,
                    creator: None,
                }
            })
            .collect()
    }
}
