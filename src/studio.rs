//! Meme creation flows: mock upload, mock AI captions, and template-based
//! creation (optionally rendered by the premium API).
//!
//! Nothing here touches the stores. Callers add the returned meme to the meme
//! store and its id to the user's uploads.

use crate::{
    domain::MemeSource,
    errors::StoreError,
    imgflip::{AiMemeParams, ImgflipClient},
    models::{Meme, MemeCategory, MemeTemplate},
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::Utc;
use rand::seq::SliceRandom;
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use uuid::Uuid;

const DEFAULT_DIMENSION: u32 = 500;

const AI_CAPTIONS: [&str; 7] = [
    "When you finally find the missing semicolon in your code",
    "That moment when you realize it's only Tuesday",
    "Me pretending to work when the boss walks by",
    "My face when someone says they'll be there in 5 minutes",
    "How I look waiting for my code to compile",
    "When the food arrives and it looks nothing like the picture",
    "Nobody: ... Me at 3am making memes instead of sleeping",
];

#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub title: String,
    pub image_url: String,
    pub caption: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct CreateRequest {
    pub template_id: String,
    #[serde(default)]
    pub top_text: String,
    #[serde(default)]
    pub bottom_text: String,
    pub caption: Option<String>,
}

/// `prompt` alone goes to automeme. Anything else goes to ai_meme, with
/// `prompt` as the prefix and `text` as the full caption text.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct AiMemeRequest {
    pub prompt: Option<String>,
    pub template_id: Option<String>,
    pub text: Option<String>,
    #[serde(default)]
    pub no_watermark: bool,
}

#[derive(Debug, PartialEq)]
enum AiRoute {
    Automeme { text: String, no_watermark: bool },
    AiMeme(AiMemeParams),
}

impl AiMemeRequest {
    fn route(self) -> AiRoute {
        let prompt = self.prompt.filter(|p| !p.trim().is_empty());
        let text = self.text.filter(|t| !t.trim().is_empty());
        match (prompt, self.template_id, text) {
            (Some(text), None, None) => AiRoute::Automeme { text, no_watermark: self.no_watermark },
            (prefix_text, template_id, text) => AiRoute::AiMeme(AiMemeParams {
                text,
                template_id,
                prefix_text,
                no_watermark: self.no_watermark,
            }),
        }
    }
}

pub struct Studio {
    source: Arc<dyn MemeSource>,
    // Present only when premium credentials are configured.
    premium: Option<ImgflipClient>,
    upload_delay: Duration,
    ai_caption_delay: Duration,
}

impl Studio {
    pub fn new(
        source: Arc<dyn MemeSource>,
        premium: Option<ImgflipClient>,
        upload_delay: Duration,
        ai_caption_delay: Duration,
    ) -> Self {
        Self {
            source,
            premium: premium.filter(ImgflipClient::is_premium),
            upload_delay,
            ai_caption_delay,
        }
    }

    /// Mock upload: validates, waits, and builds a fresh meme. Never fails past validation.
    pub async fn upload(
        &self,
        request: UploadRequest,
        creator: Option<&str>,
    ) -> Result<Meme, StoreError> {
        if request.title.trim().is_empty() || request.image_url.is_empty() {
            return Err(StoreError::validation("Please provide a title and select an image"));
        }

        tokio::time::sleep(self.upload_delay).await;

        let now = Utc::now();
        let suffix = Uuid::new_v4().simple().to_string();
        let meme = Meme {
            id: format!("meme-{}-{}", now.timestamp_millis(), &suffix[..8]),
            name: request.title.trim().to_string(),
            url: request.image_url,
            width: request.width.unwrap_or(DEFAULT_DIMENSION),
            height: request.height.unwrap_or(DEFAULT_DIMENSION),
            box_count: None,
            caption: Some(request.caption.unwrap_or_default()),
            likes: 0,
            comments: Vec::new(),
            category: MemeCategory::New,
            created_at: now,
            creator: Some(creator.unwrap_or("anonymous").to_string()),
        };
        tracing::info!(meme_id = %meme.id, creator = %meme.creator_name(), "Meme uploaded");
        Ok(meme)
    }

    /// Mock AI caption: waits, then picks a canned caption.
    pub async fn generate_ai_caption(&self, image_name: &str) -> String {
        tracing::debug!(%image_name, "Generating AI caption");
        tokio::time::sleep(self.ai_caption_delay).await;
        AI_CAPTIONS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or_default()
            .to_string()
    }

    /// Template plus top/bottom text. Premium renders the captions onto the
    /// image; otherwise the plain template image is used.
    pub async fn create_from_template(
        &self,
        request: CreateRequest,
        creator: Option<&str>,
    ) -> Result<Meme, StoreError> {
        if request.template_id.trim().is_empty() {
            return Err(StoreError::validation("Please select a meme template"));
        }
        if request.top_text.trim().is_empty() && request.bottom_text.trim().is_empty() {
            return Err(StoreError::validation("Please add at least one text caption"));
        }

        let template = self.find_template(&request.template_id).await?;
        let image_url = match &self.premium {
            Some(client) => {
                client
                    .caption_image(&request.template_id, &request.top_text, &request.bottom_text)
                    .await
                    .map_err(StoreError::Fetch)?
                    .url
            }
            None => template
                .as_ref()
                .map(|t| t.url.clone())
                .ok_or_else(|| {
                    let message = format!("Unknown meme template: {}", request.template_id);
                    StoreError::validation(message)
                })?,
        };

        let caption = request
            .caption
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| {
                format!("{} {}", request.top_text, request.bottom_text).trim().to_string()
            });

        self.upload(
            UploadRequest {
                title: template
                    .as_ref()
                    .map_or_else(|| "Custom Meme".to_string(), |t| t.name.clone()),
                image_url,
                caption: Some(caption),
                width: template.as_ref().map(|t| t.width),
                height: template.as_ref().map(|t| t.height),
            },
            creator,
        )
        .await
    }

    /// Premium: let the API pick or fill a template from free text.
    pub async fn create_with_ai(
        &self,
        request: AiMemeRequest,
        creator: Option<&str>,
    ) -> Result<Meme, StoreError> {
        let client = self.premium_client()?;

        let (url, caption, template_id) = match request.route() {
            AiRoute::Automeme { text, no_watermark } => {
                let rendered = client
                    .automeme(&text, no_watermark)
                    .await
                    .map_err(StoreError::Fetch)?;
                (rendered.url, text, None)
            }
            AiRoute::AiMeme(params) => {
                let requested = params.template_id.clone();
                let generated = client.ai_meme(params).await.map_err(StoreError::Fetch)?;
                let template_id = requested.unwrap_or_else(|| generated.template_id.to_string());
                let caption = generated.texts.join(" ").trim().to_string();
                (generated.url, caption, Some(template_id))
            }
        };

        let template = match template_id {
            Some(id) => self.find_template(&id).await?,
            None => None,
        };
        self.upload(
            UploadRequest {
                title: template.as_ref().map_or_else(|| "AI Meme".to_string(), |t| t.name.clone()),
                image_url: url,
                caption: Some(caption),
                width: template.as_ref().map(|t| t.width),
                height: template.as_ref().map(|t| t.height),
            },
            creator,
        )
        .await
    }

    async fn find_template(&self, template_id: &str) -> Result<Option<MemeTemplate>, StoreError> {
        if let Some(client) = &self.premium {
            match client.get_meme(template_id).await {
                Ok(template) => return Ok(Some(template)),
                Err(e) => tracing::warn!(
                    %template_id,
                    error = %e,
                    "Premium template lookup failed, scanning list"
                ),
            }
        }
        let templates = self.source.templates().await.map_err(StoreError::Fetch)?;
        Ok(templates.into_iter().find(|t| t.id == template_id))
    }

    fn premium_client(&self) -> Result<&ImgflipClient, StoreError> {
        self.premium
            .as_ref()
            .ok_or(StoreError::Fetch(crate::errors::SourceError::PremiumNotConfigured))
    }
}

/// Inline `data:` URL for uploaded image bytes. The content type comes from the
/// upload itself, else from the file name, else a generic binary type.
pub fn image_data_url(bytes: &[u8], content_type: Option<&str>, file_name: Option<&str>) -> String {
    let mime = content_type
        .filter(|ct| !ct.is_empty())
        .map(str::to_string)
        .or_else(|| {
            file_name.and_then(|name| mime_guess::from_path(name).first_raw().map(str::to_string))
        })
        .unwrap_or_else(|| "application/octet-stream".to_string());
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}
