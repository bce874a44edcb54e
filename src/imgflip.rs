//! HTTP client for the Imgflip template API.
//!
//! `get_memes` is public. Everything else is a premium POST endpoint taking
//! form-encoded parameters, with the account credentials appended to the form.

use crate::config::ImgflipCredentials;
use crate::errors::SourceError;
use crate::models::{
    AiGeneratedMeme, CaptionedMeme, ImgflipResponse, MemeTemplate, TemplateEnvelope, TemplateList,
};
use serde::de::DeserializeOwned;

#[derive(Debug, Clone)]
pub struct ImgflipClient {
    http: reqwest::Client,
    base_url: String,
    credentials: Option<ImgflipCredentials>,
}

/// Parameters for `/ai_meme`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiMemeParams {
    pub text: Option<String>,
    pub template_id: Option<String>,
    pub prefix_text: Option<String>,
    pub no_watermark: bool,
}

impl AiMemeParams {
    fn into_form(self) -> Vec<(&'static str, String)> {
        let mut form = vec![
            ("model", "openai".to_string()),
            ("no_watermark", flag(self.no_watermark)),
        ];
        if let Some(text) = self.text {
            form.push(("text", text));
        }
        if let Some(template_id) = self.template_id {
            form.push(("template_id", template_id));
        }
        if let Some(prefix_text) = self.prefix_text {
            form.push(("prefix_text", prefix_text));
        }
        form
    }
}

impl ImgflipClient {
    pub fn new(base_url: impl Into<String>, credentials: Option<ImgflipCredentials>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        tracing::info!(%base_url, premium = credentials.is_some(), "Initializing Imgflip client");
        Self {
            http: reqwest::Client::new(),
            base_url,
            credentials,
        }
    }

    pub fn is_premium(&self) -> bool {
        self.credentials.is_some()
    }

    /// Popular templates (`GET /get_memes`).
    pub async fn get_memes(&self) -> Result<Vec<MemeTemplate>, SourceError> {
        let url = format!("{}/get_memes", self.base_url);
        tracing::debug!(%url, "Imgflip: fetching templates");

        let response = self.http.get(&url).send().await?;
        let list: TemplateList = unwrap_response(response).await?;

        tracing::debug!(count = list.memes.len(), "Imgflip: templates received");
        Ok(list.memes)
    }

    /// Renders captions onto a template (`POST /caption_image`).
    pub async fn caption_image(
        &self,
        template_id: &str,
        text0: &str,
        text1: &str,
    ) -> Result<CaptionedMeme, SourceError> {
        self.post(
            "caption_image",
            vec![
                ("template_id", template_id.to_string()),
                ("text0", text0.to_string()),
                ("text1", text1.to_string()),
            ],
        )
        .await
    }

    /// Template search (`POST /search_memes`).
    pub async fn search_memes(
        &self,
        query: &str,
        include_nsfw: bool,
    ) -> Result<Vec<MemeTemplate>, SourceError> {
        let list: TemplateList = self
            .post(
                "search_memes",
                vec![
                    ("query", query.to_string()),
                    ("include_nsfw", flag(include_nsfw)),
                ],
            )
            .await?;
        Ok(list.memes)
    }

    /// Single template lookup (`POST /get_meme`).
    pub async fn get_meme(&self, template_id: &str) -> Result<MemeTemplate, SourceError> {
        let envelope: TemplateEnvelope = self
            .post("get_meme", vec![("template_id", template_id.to_string())])
            .await?;
        Ok(envelope.meme)
    }

    /// AI text generation over a template (`POST /ai_meme`).
    pub async fn ai_meme(&self, params: AiMemeParams) -> Result<AiGeneratedMeme, SourceError> {
        self.post("ai_meme", params.into_form()).await
    }

    /// Picks a template for free text (`POST /automeme`).
    pub async fn automeme(
        &self,
        text: &str,
        no_watermark: bool,
    ) -> Result<CaptionedMeme, SourceError> {
        let form = vec![("text", text.to_string()), ("no_watermark", flag(no_watermark))];
        self.post("automeme", form).await
    }

    async fn post<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        mut form: Vec<(&'static str, String)>,
    ) -> Result<T, SourceError> {
        let credentials = self.credentials.as_ref().ok_or(SourceError::PremiumNotConfigured)?;
        form.push(("username", credentials.username.clone()));
        form.push(("password", credentials.password.clone()));

        let url = format!("{}/{}", self.base_url, endpoint);
        tracing::debug!(%url, "Imgflip: premium request");

        let response = self.http.post(&url).form(&form).send().await?;
        unwrap_response(response).await
    }
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

async fn unwrap_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SourceError> {
    let status = response.status();
    let body = response.text().await?;

    // Imgflip reports most failures in the body, so try that first.
    match serde_json::from_str::<ImgflipResponse<T>>(&body) {
        Ok(parsed) => decode_envelope(parsed),
        Err(_) if !status.is_success() => Err(SourceError::Status(status)),
        Err(e) => Err(SourceError::Decode(e.to_string())),
    }
}

fn decode_envelope<T>(parsed: ImgflipResponse<T>) -> Result<T, SourceError> {
    if !parsed.success {
        let message = parsed
            .error_message
            .unwrap_or_else(|| "API request failed".to_string());
        return Err(SourceError::Api(message));
    }
    parsed
        .data
        .ok_or_else(|| SourceError::Decode("successful response without data".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsuccessful_envelope_becomes_api_error() {
        let parsed: ImgflipResponse<TemplateList> =
            serde_json::from_str(r#"{"success":false,"error_message":"Rate limited"}"#).unwrap();
        match decode_envelope(parsed) {
            Err(SourceError::Api(msg)) => assert_eq!(msg, "Rate limited"),
            other => panic!("expected Api error, got {:?}", other.map(|l| l.memes.len())),
        }

        let parsed: ImgflipResponse<TemplateList> =
            serde_json::from_str(r#"{"success":false}"#).unwrap();
        assert!(matches!(
            decode_envelope(parsed),
            Err(SourceError::Api(ref m)) if m == "API request failed"
        ));
    }

    #[test]
    fn successful_envelope_yields_templates() {
        let body = r#"{
            "success": true,
            "data": {"memes": [
                {
                    "id": "181913649",
                    "name": "Drake Hotline Bling",
                    "url": "https://i.imgflip.com/30b1gx.jpg",
                    "width": 1200,
                    "height": 1200,
                    "box_count": 2,
                    "captions": 1500000
                }
            ]}
        }"#;
        let parsed: ImgflipResponse<TemplateList> = serde_json::from_str(body).unwrap();
        let list = decode_envelope(parsed).unwrap();
        assert_eq!(list.memes.len(), 1);
        assert_eq!(list.memes[0].box_count, 2);
    }

    #[tokio::test]
    async fn premium_calls_without_credentials_fail_fast() {
        // Unroutable base URL: the request must never be attempted.
        let client = ImgflipClient::new("http://127.0.0.1:9", None);
        assert!(!client.is_premium());
        let err = client.automeme("one does not simply", false).await.unwrap_err();
        assert!(matches!(err, SourceError::PremiumNotConfigured));
    }

    #[test]
    fn ai_meme_form_carries_only_the_given_fields() {
        let form = AiMemeParams {
            text: Some("when the build is green".into()),
            template_id: Some("181913649".into()),
            no_watermark: true,
            ..AiMemeParams::default()
        }
        .into_form();
        assert!(form.contains(&("no_watermark", "1".to_string())));
        assert!(form.contains(&("text", "when the build is green".to_string())));
        assert!(form.contains(&("template_id", "181913649".to_string())));
        assert!(!form.iter().any(|(name, _)| *name == "prefix_text"));

        let bare = AiMemeParams::default().into_form();
        assert_eq!(
            bare,
            vec![("model", "openai".to_string()), ("no_watermark", "0".to_string())]
        );
    }
}
