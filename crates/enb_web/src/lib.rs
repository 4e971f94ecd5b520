use axum::{
    routing::{delete, get, post},
    Router,
};
use enb_core::Result;
use std::net::SocketAddr;
use tower_http::cors::CorsLayer;
use tracing::info;

pub mod error;
pub mod handlers;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

pub async fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::permissive();

    Router::new()
        .route("/", get(handlers::root))
        .route("/api/articles", get(handlers::list_articles).post(handlers::create_article))
        .route("/api/articles/", get(handlers::list_articles).post(handlers::create_article))
        .route("/api/articles/:id", delete(handlers::delete_article))
        .route("/api/articles/:id/relevance", get(handlers::article_relevance))
        .route("/api/keywords", get(handlers::list_keywords).post(handlers::create_keyword))
        .route("/api/keywords/", get(handlers::list_keywords).post(handlers::create_keyword))
        .route("/api/keywords/:id", delete(handlers::delete_keyword))
        .route("/api/companies", get(handlers::list_companies).post(handlers::create_company))
        .route("/api/companies/", get(handlers::list_companies).post(handlers::create_company))
        .route("/api/companies/:id", delete(handlers::delete_company))
        .route("/api/pickup/run", post(handlers::run_pipeline))
        .route("/api/process-articles", post(handlers::process_articles))
        .route("/api/process-articles/", post(handlers::process_articles))
        .route("/api/teams/post-high-relevance", post(handlers::post_high_relevance))
        .route("/api/teams/post-high-relevance/", post(handlers::post_high_relevance))
        .route("/api/pickup-results", get(handlers::live_pickup_results))
        .route("/api/pickup-results/persisted", get(handlers::stored_pickup_results))
        .layer(cors)
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = create_app(state).await;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("🌐 Listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

pub mod prelude {
    pub use crate::{create_app, serve, AppState};
    pub use enb_core::{Error, Result};
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use enb_core::{Config, ContentFetcher, Error, FetchedContent, LexiconStorage, Notifier, ScoredPickup, Storage};
    use enb_pickup::PickupService;
    use enb_storage::InMemoryStorage;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    struct PageFetcher;

    #[async_trait]
    impl ContentFetcher for PageFetcher {
        async fn fetch(&self, url: &str) -> Result<Option<FetchedContent>> {
            match url {
                "https://news.example/eneos" => Ok(Some(FetchedContent::new(
                    Some("ENEOS PPA".to_string()),
                    "太陽光発電 Tesla",
                ))),
                "https://news.example/tesla" => Ok(Some(FetchedContent::new(
                    Some("Tesla".to_string()),
                    "",
                ))),
                _ => Err(Error::fetch_failure(url, "HTTP 404")),
            }
        }
    }

    struct AcceptAll;

    #[async_trait]
    impl Notifier for AcceptAll {
        fn name(&self) -> &str {
            "accept-all"
        }

        async fn post(&self, _pickup: &ScoredPickup) -> bool {
            true
        }
    }

    async fn app(with_notifier: bool) -> Router {
        let storage = InMemoryStorage::new();
        for word in ["太陽光発電", "PPA"] {
            storage.add_keyword(word).await.unwrap();
        }
        for name in ["ENEOS", "Tesla"] {
            storage.add_company(name).await.unwrap();
        }
        let storage: Arc<dyn Storage> = Arc::new(storage);

        let mut service = PickupService::new(storage, Arc::new(PageFetcher), Config::default())
            .with_rate_limit(5, Duration::ZERO);
        if with_notifier {
            service = service.with_notifier(Arc::new(AcceptAll));
        }
        create_app(AppState::new(service)).await
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_root() {
        let app = app(false).await;
        let (status, body) = send(&app, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Energy News Bot API");
    }

    #[tokio::test]
    async fn test_keyword_crud() {
        let app = app(false).await;

        let (status, body) = send(&app, "POST", "/api/keywords/", Some(json!({ "word": "CPPA" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "id": 3, "word": "CPPA" }));

        let (status, body) = send(&app, "POST", "/api/keywords", Some(json!({ "word": "CPPA" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Keyword already exists");

        let (status, body) = send(&app, "DELETE", "/api/keywords/999", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Keyword not found");

        let (status, body) = send(&app, "DELETE", "/api/keywords/3", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Keyword deleted successfully");

        let (_, body) = send(&app, "GET", "/api/keywords/", None).await;
        assert_eq!(body.as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_company_and_article_registration() {
        let app = app(false).await;

        let (status, _) = send(&app, "POST", "/api/companies/", Some(json!({ "name": "出光興産" }))).await;
        assert_eq!(status, StatusCode::OK);
        let (_, body) = send(&app, "GET", "/api/companies", None).await;
        assert_eq!(body[2]["name"], "出光興産");

        let (status, body) = send(
            &app,
            "POST",
            "/api/articles/",
            Some(json!({ "url": "https://news.example/eneos" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], 1);

        let (status, _) = send(&app, "DELETE", "/api/articles/1", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = send(&app, "DELETE", "/api/articles/1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Article not found");
    }

    #[tokio::test]
    async fn test_article_relevance() {
        let app = app(false).await;
        send(&app, "POST", "/api/articles", Some(json!({ "url": "https://news.example/eneos" }))).await;
        send(&app, "POST", "/api/articles", Some(json!({ "url": "https://news.example/gone" }))).await;

        let (status, body) = send(&app, "GET", "/api/articles/1/relevance", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["score"], 1.0);
        assert_eq!(body["matching_keywords"], json!(["太陽光発電", "PPA"]));

        let (status, body) = send(&app, "GET", "/api/articles/2/relevance", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Could not fetch article content");

        let (status, _) = send(&app, "GET", "/api/articles/9/relevance", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_live_and_persisted_results_stay_separate() {
        let app = app(false).await;
        send(&app, "POST", "/api/articles", Some(json!({ "url": "https://news.example/eneos" }))).await;
        send(&app, "POST", "/api/articles", Some(json!({ "url": "https://news.example/gone" }))).await;

        let (status, live) = send(&app, "GET", "/api/pickup-results", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(live.as_array().unwrap().len(), 1);
        assert_eq!(live[0]["importance"], "High");

        let (_, stored) = send(&app, "GET", "/api/pickup-results/persisted", None).await;
        assert_eq!(stored, json!([]));

        let (status, run) = send(&app, "POST", "/api/pickup/run?persist=true", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(run["persisted"], true);
        assert_eq!(run["skipped"][0]["url"], "https://news.example/gone");

        let (_, stored) = send(&app, "GET", "/api/pickup-results/persisted", None).await;
        assert_eq!(stored.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_post_high_relevance() {
        let app = app(true).await;
        send(&app, "POST", "/api/articles", Some(json!({ "url": "https://news.example/eneos" }))).await;
        send(&app, "POST", "/api/articles", Some(json!({ "url": "https://news.example/tesla" }))).await;

        let (status, body) = send(&app, "POST", "/api/teams/post-high-relevance/?threshold=0.2", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["articles_posted"], 2);
        assert_eq!(body["threshold"], 0.2);

        let (_, body) = send(&app, "POST", "/api/teams/post-high-relevance/", None).await;
        assert_eq!(body["threshold"], 0.75);
        assert_eq!(body["total_high_relevance"], 1);
    }

    #[tokio::test]
    async fn test_post_high_relevance_without_webhook() {
        let app = app(false).await;
        let (status, body) = send(&app, "POST", "/api/teams/post-high-relevance/", None).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["detail"].as_str().unwrap().contains("teams_webhook_url"));
    }

    #[tokio::test]
    async fn test_process_articles() {
        let app = app(true).await;
        send(&app, "POST", "/api/articles", Some(json!({ "url": "https://news.example/eneos" }))).await;

        let (status, body) = send(&app, "POST", "/api/process-articles/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collected_articles"], 0);
        assert_eq!(body["processed_articles"], 1);
        assert_eq!(body["posted_to_teams"], 1);
    }
}
