use crate::{
    handlers, // Import handlers module
    AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

/// Creates the Axum router and associates routes with handlers.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/memes", get(handlers::list_memes))
        .route("/memes/trending", get(handlers::trending_memes))
        .route("/memes/search", get(handlers::search_memes))
        .route("/memes/state", get(handlers::store_status))
        .route("/memes/create", post(handlers::create_meme))
        .route("/memes/ai", post(handlers::create_ai_meme))
        .route("/meme/{id}", get(handlers::get_meme))
        .route("/meme/{id}/like", post(handlers::toggle_like))
        .route("/meme/{id}/comments", post(handlers::add_comment))
        .route("/upload_meme", post(handlers::upload_meme))
        .route("/captions/ai", post(handlers::ai_caption))
        .route("/leaderboard", get(handlers::leaderboard))
        .route("/user", get(handlers::get_user).put(handlers::update_user))
        .route("/user/login", post(handlers::login))
        .route("/user/liked/{id}", get(handlers::is_liked))
        // Middleware Layers
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(10 * 1024 * 1024))
        .with_state(state) // Pass the application state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{Comment, Meme, MemeCategory},
        source::{fixtures, FixtureMemeSource},
        startup,
        storage::MemoryStorage,
    };
    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        response::Response,
    };
    use serde::de::DeserializeOwned;
    use std::time::Duration;
    use tower::ServiceExt;

    async fn app() -> (Router, Arc<AppState>, Arc<FixtureMemeSource>) {
        let source = Arc::new(FixtureMemeSource::new(fixtures::memes(30)));
        let storage = Arc::new(MemoryStorage::new());
        let state =
            startup::assemble(source.clone(), storage, None, Duration::ZERO, Duration::ZERO);
        startup::initialize(&state).await.unwrap();
        (create_router(state.clone()), state, source)
    }

    async fn send(
        router: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        router.clone().oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn login(router: &Router, username: &str) {
        let body = serde_json::json!({ "username": username });
        let resp = send(router, Method::POST, "/user/login", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    async fn json<T: DeserializeOwned>(resp: Response) -> T {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn category_listing_and_detail() {
        let (router, _, _) = app().await;

        let resp = send(&router, Method::GET, "/memes?category=new", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let memes: Vec<Meme> = json(resp).await;
        assert_eq!(memes.len(), 20);

        let resp = send(&router, Method::GET, &format!("/meme/{}", memes[0].id), None).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(&router, Method::GET, "/meme/does-not-exist", None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn fetch_failure_is_reported_and_recorded() {
        let (router, state, source) = app().await;
        source.set_failing(true);

        let resp = send(&router, Method::GET, "/memes?category=classic", None).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let body: serde_json::Value = json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("try again later"));

        assert!(state.meme_store.snapshot().await.error.is_some());
        // Startup seeded the trending page, which is still there.
        assert_eq!(state.meme_store.memes().await.len(), 20);
    }

    #[tokio::test]
    async fn like_toggle_updates_both_stores() {
        let (router, state, _) = app().await;
        let target = state.meme_store.trending().await[0].clone();
        let uri = format!("/meme/{}/like", target.id);

        let resp = send(&router, Method::POST, &uri, None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: serde_json::Value = json(resp).await;
        assert_eq!(body["liked"], true);
        assert_eq!(body["meme"]["likes"], target.likes + 1);
        assert!(state.user_store.is_meme_liked(&target.id).await);

        let body: serde_json::Value = json(send(&router, Method::POST, &uri, None).await).await;
        assert_eq!(body["liked"], false);
        assert!(!state.user_store.is_meme_liked(&target.id).await);
        // Unliking leaves the counter alone.
        assert_eq!(state.meme_store.get_by_id(&target.id).await.unwrap().likes, target.likes + 1);
    }

    #[tokio::test]
    async fn comments_are_attributed_and_validated() {
        let (router, state, _) = app().await;
        login(&router, "alice").await;
        let target = state.meme_store.memes().await[2].clone();
        let uri = format!("/meme/{}/comments", target.id);

        let body = serde_json::json!({ "text": "Story of my life" });
        let resp = send(&router, Method::POST, &uri, Some(body)).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let comment: Comment = json(resp).await;
        assert_eq!(comment.username, "alice");
        let stored = state.meme_store.get_by_id(&target.id).await.unwrap();
        assert_eq!(stored.comments.last(), Some(&comment));

        let body = serde_json::json!({ "text": "   " });
        let resp = send(&router, Method::POST, &uri, Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn multipart_upload_creates_meme_for_current_user() {
        let (router, state, _) = app().await;
        login(&router, "alice").await;

        let boundary = "memeverse-boundary";
        let body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"title\"\r\n\r\nCat Fail\r\n\
             --{b}\r\nContent-Disposition: form-data; name=\"image\"; filename=\"cat.png\"\r\n\
             Content-Type: image/png\r\n\r\nPNGDATA\r\n\
             --{b}--\r\n",
            b = boundary
        );
        let request = Request::builder()
            .method(Method::POST)
            .uri("/upload_meme")
            .header(header::CONTENT_TYPE, format!("multipart/form-data; boundary={}", boundary))
            .body(Body::from(body))
            .unwrap();
        let resp = router.clone().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);

        let meme: Meme = json(resp).await;
        assert_eq!(meme.name, "Cat Fail");
        assert_eq!(meme.likes, 0);
        assert_eq!(meme.category, MemeCategory::New);
        assert_eq!(meme.creator.as_deref(), Some("alice"));
        assert!(meme.comments.is_empty());
        assert!(meme.url.starts_with("data:image/png;base64,"));

        assert_eq!(state.meme_store.memes().await[0].id, meme.id);
        let user = state.user_store.current().await.unwrap();
        assert_eq!(user.uploaded_memes, vec![meme.id]);
    }

    #[tokio::test]
    async fn profile_update_rejects_blank_username() {
        let (router, _, _) = app().await;
        let body = serde_json::json!({ "username": "" });
        let resp = send(&router, Method::PUT, "/user", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body = serde_json::json!({ "bio": "hi" });
        let resp = send(&router, Method::PUT, "/user", Some(body)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let user: crate::models::User = json(resp).await;
        assert_eq!(user.bio, "hi");
    }
}
