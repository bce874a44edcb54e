use crate::{
    category::Leaderboard,
    errors::AppError,
    models::{Comment, Meme, MemeCategory, NewComment, User, UserUpdate},
    studio::{image_data_url, AiMemeRequest, CreateRequest, UploadRequest},
    AppState,
};
use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing;

#[derive(Deserialize, Debug, Default)]
pub struct CategoryQuery {
    pub category: Option<String>,
}

#[derive(Deserialize, Debug, Default)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Serialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub loading: bool,
    pub error: Option<String>,
    pub meme_count: usize,
    pub trending_count: usize,
}

#[derive(Serialize, Debug)]
pub struct LikeResponse {
    pub liked: bool,
    pub meme: Meme,
}

#[derive(Deserialize, Debug)]
pub struct CommentBody {
    pub text: String,
}

#[derive(Deserialize, Debug)]
pub struct LoginBody {
    pub username: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct AiCaptionBody {
    #[serde(default)]
    pub image_name: String,
}

pub async fn list_memes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CategoryQuery>,
) -> Result<Json<Vec<Meme>>, AppError> {
    let category = query
        .category
        .as_deref()
        .map(|raw| raw.parse::<MemeCategory>().unwrap_or_default())
        .unwrap_or(MemeCategory::Trending);
    tracing::debug!(%category, "Listing memes via handler");
    let memes = state.meme_store.fetch_by_category(category).await?;
    Ok(Json(memes))
}

pub async fn trending_memes(State(state): State<Arc<AppState>>) -> Json<Vec<Meme>> {
    Json(state.meme_store.trending().await)
}

pub async fn search_memes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Meme>>, AppError> {
    let results = state.meme_store.search(&query.q).await?;
    tracing::info!(query = %query.q, hits = results.len(), "Search handled");
    Ok(Json(results))
}

pub async fn store_status(State(state): State<Arc<AppState>>) -> Json<StoreStatus> {
    let snapshot = state.meme_store.snapshot().await;
    Json(StoreStatus {
        loading: snapshot.loading,
        error: snapshot.error,
        meme_count: snapshot.memes.len(),
        trending_count: snapshot.trending_memes.len(),
    })
}

pub async fn get_meme(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Meme>, AppError> {
    tracing::debug!(meme_id = %id, "Fetching meme details via handler");
    state
        .meme_store
        .get_by_id(&id)
        .await
        .map(Json)
        .ok_or(AppError::MemeNotFound(id))
}

/// Like toggle. Liking bumps the meme counter and records the like on the
/// profile; unliking only removes it from the profile.
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<LikeResponse>, AppError> {
    require_user(&state).await?;
    let Some(meme) = state.meme_store.get_by_id(&id).await else {
        return Err(AppError::MemeNotFound(id));
    };

    if state.user_store.is_meme_liked(&id).await {
        state.user_store.unlike_meme(&id).await?;
        tracing::info!(meme_id = %id, "Meme unliked");
        return Ok(Json(LikeResponse { liked: false, meme }));
    }

    let meme = state
        .meme_store
        .like_meme(&id)
        .await?
        .ok_or_else(|| AppError::MemeNotFound(id.clone()))?;
    state.user_store.like_meme(&id).await?;
    tracing::info!(meme_id = %id, likes = meme.likes, "Meme liked");
    Ok(Json(LikeResponse { liked: true, meme }))
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<CommentBody>,
) -> Result<(StatusCode, Json<Comment>), AppError> {
    let user = require_user(&state).await?;
    let text = body.text.trim();
    if text.is_empty() {
        return Err(AppError::InvalidInput("Comment cannot be empty".to_string()));
    }

    let comment = state
        .meme_store
        .add_comment(&id, NewComment { text: text.to_string(), username: user.username })
        .await?
        .ok_or(AppError::MemeNotFound(id))?;
    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn upload_meme(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&state).await?;
    let mut request = UploadRequest::default();

    while let Some(field) = multipart.next_field().await? {
        let field_name = match field.name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        match field_name.as_str() {
            "title" => request.title = field.text().await?,
            "caption" => request.caption = Some(field.text().await?).filter(|c| !c.is_empty()),
            "image" => {
                let file_name = field.file_name().map(|s| s.to_string());
                let content_type = field.content_type().map(|m| m.to_string());
                let bytes = field.bytes().await?;
                if !bytes.is_empty() {
                    request.image_url =
                        image_data_url(&bytes, content_type.as_deref(), file_name.as_deref());
                }
            }
            "width" | "height" => {
                let raw = field.text().await?;
                let value = raw
                    .trim()
                    .parse::<u32>()
                    .map_err(|e| AppError::InvalidInput(format!("Invalid {}: {}", field_name, e)))?;
                if field_name == "width" {
                    request.width = Some(value);
                } else {
                    request.height = Some(value);
                }
            }
            _ => tracing::debug!("Ignoring unknown multipart field: {}", field_name),
        }
    }

    let meme = state.studio.upload(request, Some(&user.username)).await?;
    publish(&state, meme).await
}

pub async fn create_meme(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&state).await?;
    let meme = state.studio.create_from_template(request, Some(&user.username)).await?;
    publish(&state, meme).await
}

pub async fn create_ai_meme(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AiMemeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = require_user(&state).await?;
    let meme = state.studio.create_with_ai(request, Some(&user.username)).await?;
    publish(&state, meme).await
}

pub async fn ai_caption(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AiCaptionBody>,
) -> Json<serde_json::Value> {
    let caption = state.studio.generate_ai_caption(&body.image_name).await;
    Json(serde_json::json!({ "caption": caption }))
}

pub async fn leaderboard(State(state): State<Arc<AppState>>) -> Json<Leaderboard> {
    Json(state.meme_store.leaderboard().await)
}

pub async fn get_user(State(state): State<Arc<AppState>>) -> Result<Json<User>, AppError> {
    require_user(&state).await.map(Json)
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.user_store.login(&body.username).await?))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Json(update): Json<UserUpdate>,
) -> Result<Json<User>, AppError> {
    Ok(Json(state.user_store.update_profile(update).await?))
}

pub async fn is_liked(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Json<serde_json::Value> {
    let liked = state.user_store.is_meme_liked(&id).await;
    Json(serde_json::json!({ "memeId": id, "liked": liked }))
}

async fn require_user(state: &AppState) -> Result<User, AppError> {
    state.user_store.current().await.ok_or(AppError::UserNotReady)
}

/// Cross-store bookkeeping for a freshly created meme.
async fn publish(state: &AppState, meme: Meme) -> Result<(StatusCode, Json<Meme>), AppError> {
    state.meme_store.add_meme(meme.clone()).await?;
    state.user_store.add_uploaded_meme(&meme.id).await?;
    tracing::info!(meme_id = %meme.id, "Meme created successfully via handler");
    Ok((StatusCode::CREATED, Json(meme)))
}
