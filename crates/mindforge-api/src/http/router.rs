//! Axum router configuration with middleware.
//!
//! All authenticated routes are under `/api/v1/`; `/health` is open.
//! Middleware: CORS, request tracing.

use axum::Router;
use axum::routing::{get, post, put};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::http::handlers;
use crate::state::AppState;

/// Build the complete API router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/chats",
            post(handlers::chat::create_chat).get(handlers::chat::list_chats),
        )
        .route(
            "/chats/{id}",
            get(handlers::chat::get_chat).delete(handlers::chat::delete_chat),
        )
        .route("/chats/{id}/title", put(handlers::chat::rename_chat))
        .route(
            "/chats/{id}/messages",
            post(handlers::message::post_message).get(handlers::message::list_messages),
        )
        .route("/health", get(handlers::health::health));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/health", get(handlers::health::health))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use http_body_util::BodyExt;
    use mindforge_core::llm::box_provider::BoxLlmProvider;
    use mindforge_core::llm::provider::LlmProvider;
    use mindforge_core::llm::registry::ProviderRegistry;
    use mindforge_infra::sqlite::pool::{DatabasePool, database_url};
    use mindforge_types::config::GlobalConfig;
    use mindforge_types::llm::{ChatRequest, ChatResponse, LlmError, TokenUsage};
    use serde_json::{Value, json};
    use tokio::time::Instant;
    use tower::ServiceExt;

    use super::*;
    use crate::http::extractors::auth::issue_api_key;

    /// Replies with its own name and the last message it was sent.
    struct EchoProvider(&'static str);

    impl LlmProvider for EchoProvider {
        fn name(&self) -> &str {
            self.0
        }

        fn default_model(&self) -> &str {
            "echo"
        }

        async fn chat(&self, request: &ChatRequest, _deadline: Instant) -> Result<ChatResponse, LlmError> {
            let last = request.messages.last().map(|m| m.content.as_str()).unwrap_or("");
            Ok(ChatResponse {
                content: format!("{}: {last}", self.0),
                model: "echo".to_string(),
                usage: TokenUsage::default(),
            })
        }
    }

    struct TestApp {
        router: Router,
        state: AppState,
        alice: String,
        bob: String,
    }

    async fn test_app() -> TestApp {
        let dir = tempfile::tempdir().unwrap();
        let data_dir: PathBuf = dir.path().to_path_buf();
        let pool = DatabasePool::new(&database_url(&data_dir)).await.unwrap();
        std::mem::forget(dir);

        let registry = ProviderRegistry::builder("openrouter")
            .register(BoxLlmProvider::new(EchoProvider("openrouter")))
            .register(BoxLlmProvider::new(EchoProvider("grok")))
            .rule(["grok"], "grok")
            .build()
            .unwrap();
        let state = AppState::assemble(GlobalConfig::default(), pool, registry, data_dir);

        let mut keys = Vec::new();
        for name in ["alice", "bob"] {
            let user = state.users.create_user(name).await.unwrap();
            keys.push(issue_api_key(&state.users, &user.id).await.unwrap());
        }
        let bob = keys.pop().unwrap();
        let alice = keys.pop().unwrap();

        TestApp {
            router: build_router(state.clone()),
            state,
            alice,
            bob,
        }
    }

    impl TestApp {
        async fn send(
            &self,
            method: &str,
            uri: &str,
            key: Option<&str>,
            body: Option<Value>,
        ) -> (StatusCode, Value) {
            let mut builder = Request::builder().method(method).uri(uri);
            if let Some(key) = key {
                builder = builder.header("authorization", format!("Bearer {key}"));
            }
            let request = match body {
                Some(body) => builder
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
                None => builder.body(Body::empty()).unwrap(),
            };

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        async fn create_chat(&self, key: &str, model: &str) -> String {
            let (status, body) = self
                .send("POST", "/api/v1/chats", Some(key), Some(json!({"ai_model": model})))
                .await;
            assert_eq!(status, StatusCode::CREATED);
            body["data"]["id"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_health_is_open_and_lists_providers() {
        let app = test_app().await;
        let (status, body) = app.send("GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");
        assert_eq!(body["data"]["providers"], json!(["grok", "openrouter"]));
        assert_eq!(body["data"]["default_provider"], "openrouter");
    }

    #[tokio::test]
    async fn test_requests_without_valid_key_are_rejected() {
        let app = test_app().await;
        let (status, body) = app.send("GET", "/api/v1/chats", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["errors"][0]["code"], "UNAUTHORIZED");

        let (status, _) = app.send("GET", "/api/v1/chats", Some("mf_forged"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_chat_validates_model() {
        let app = test_app().await;
        let (status, body) = app
            .send(
                "POST",
                "/api/v1/chats",
                Some(&app.alice),
                Some(json!({"ai_model": "  grok-beta ", "title": "Space"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["ai_model"], "grok-beta");
        assert_eq!(body["data"]["title"], "Space");

        let (status, body) = app
            .send("POST", "/api/v1/chats", Some(&app.alice), Some(json!({"ai_model": " "})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_message_is_answered_in_background() {
        let app = test_app().await;
        let chat_id = app.create_chat(&app.alice, "grok-beta").await;
        let uri = format!("/api/v1/chats/{chat_id}/messages");

        let (status, body) = app
            .send("POST", &uri, Some(&app.alice), Some(json!({"content": " hello "})))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["status"], "processing");
        assert_eq!(body["data"]["user_message"]["content"], "hello");
        assert_eq!(body["data"]["user_message"]["role"], "user");

        app.state.dispatcher.shutdown().await;

        let (status, body) = app.send("GET", &uri, Some(&app.alice), None).await;
        assert_eq!(status, StatusCode::OK);
        let messages = body["data"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"], "grok: hello");
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected_without_dispatch() {
        let app = test_app().await;
        let chat_id = app.create_chat(&app.alice, "deepseek-chat").await;
        let uri = format!("/api/v1/chats/{chat_id}/messages");

        let (status, _) = app
            .send("POST", &uri, Some(&app.alice), Some(json!({"content": "   "})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        app.state.dispatcher.shutdown().await;
        let (_, body) = app.send("GET", &uri, Some(&app.alice), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_missing_and_malformed_ids() {
        let app = test_app().await;
        let chat_id = app.create_chat(&app.alice, "qwen3-max").await;

        let (status, body) = app
            .send("GET", &format!("/api/v1/chats/{chat_id}"), Some(&app.bob), None)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["errors"][0]["code"], "FORBIDDEN");

        let (status, _) = app
            .send(
                "POST",
                &format!("/api/v1/chats/{chat_id}/messages"),
                Some(&app.bob),
                Some(json!({"content": "let me in"})),
            )
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let missing = uuid::Uuid::now_v7();
        let (status, _) = app
            .send("GET", &format!("/api/v1/chats/{missing}"), Some(&app.alice), None)
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = app
            .send("GET", "/api/v1/chats/not-a-uuid", Some(&app.alice), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_rename_list_and_delete() {
        let app = test_app().await;
        let chat_id = app.create_chat(&app.alice, "GigaChat").await;
        let title_uri = format!("/api/v1/chats/{chat_id}/title");

        let (status, _) = app
            .send("PUT", &title_uri, Some(&app.alice), Some(json!({"title": "x".repeat(201)})))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = app
            .send("PUT", &title_uri, Some(&app.alice), Some(json!({"title": "Renamed"})))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["title"], "Renamed");

        let (_, body) = app.send("GET", "/api/v1/chats", Some(&app.alice), None).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        let (_, body) = app.send("GET", "/api/v1/chats", Some(&app.bob), None).await;
        assert!(body["data"].as_array().unwrap().is_empty());

        let chat_uri = format!("/api/v1/chats/{chat_id}");
        let (status, _) = app.send("DELETE", &chat_uri, Some(&app.alice), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = app.send("GET", &chat_uri, Some(&app.alice), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
