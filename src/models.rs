use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Sorting/filtering mode for a fetch. `All` is only ever requested, never assigned.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MemeCategory {
    #[default]
    Trending,
    New,
    Classic,
    Random,
    All,
}

impl MemeCategory {
    /// Categories the transform may assign to a meme.
    pub const ASSIGNABLE: [MemeCategory; 4] = [
        MemeCategory::Trending,
        MemeCategory::New,
        MemeCategory::Classic,
        MemeCategory::Random,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MemeCategory::Trending => "trending",
            MemeCategory::New => "new",
            MemeCategory::Classic => "classic",
            MemeCategory::Random => "random",
            MemeCategory::All => "all",
        }
    }
}

impl fmt::Display for MemeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Unknown values mean "everything", so parsing never fails.
impl FromStr for MemeCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "trending" => MemeCategory::Trending,
            "new" => MemeCategory::New,
            "classic" => MemeCategory::Classic,
            "random" => MemeCategory::Random,
            _ => MemeCategory::All,
        })
    }
}

/// A base template as returned by the remote source.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MemeTemplate {
    pub id: String,
    pub name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    pub box_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captions: Option<u64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub text: String,
    pub username: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meme {
    pub id: String,
    pub name: String,
    pub url: String,
    pub width: u32,
    pub height: u32,
    #[serde(default, rename = "box_count", skip_serializing_if = "Option::is_none")]
    pub box_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    pub likes: u64,
    #[serde(default)]
    pub comments: Vec<Comment>,
    pub category: MemeCategory,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<String>,
}

impl Meme {
    pub fn creator_name(&self) -> &str {
        self.creator.as_deref().unwrap_or("anonymous")
    }

    /// Case-insensitive substring match on name or caption. `query` must already be lowercase.
    pub fn matches_lowercase(&self, query: &str) -> bool {
        self.name.to_lowercase().contains(query)
            || self
                .caption
                .as_deref()
                .is_some_and(|caption| caption.to_lowercase().contains(query))
    }
}

/// Comment payload before the store assigns id and timestamp.
#[derive(Deserialize, Debug, Clone)]
pub struct NewComment {
    pub text: String,
    pub username: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    pub avatar: String,
    pub bio: String,
    #[serde(default)]
    pub liked_memes: Vec<String>,
    #[serde(default)]
    pub uploaded_memes: Vec<String>,
}

impl Default for User {
    fn default() -> Self {
        User {
            id: "1".to_string(),
            username: "MemeEnthusiast".to_string(),
            avatar: "/placeholder.svg?height=200&width=200".to_string(),
            bio: "Just a meme lover exploring the MemeVerse".to_string(),
            liked_memes: Vec::new(),
            uploaded_memes: Vec::new(),
        }
    }
}

/// Partial profile edit; absent fields are left untouched.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

// --- Remote API wire types ---

#[derive(Deserialize, Debug)]
pub struct ImgflipResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error_message: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct TemplateList {
    pub memes: Vec<MemeTemplate>,
}

#[derive(Deserialize, Debug)]
pub struct TemplateEnvelope {
    pub meme: MemeTemplate,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CaptionedMeme {
    pub url: String,
    pub page_url: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AiGeneratedMeme {
    pub url: String,
    pub page_url: String,
    pub template_id: u64,
    pub texts: Vec<String>,
}
