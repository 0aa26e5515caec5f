//! Axum router construction.
//!
//! [`build`] assembles the complete application router, including:
//! - Middleware layers (CORS, per-request trace-ID injection)
//! - Optional Swagger UI / OpenAPI spec endpoint (disable with `GATEWAY_ENABLE_SWAGGER=false`)
//! - Health / heartbeat route, open to everyone
//! - OpenAI-compatible `/v1` routes, protected by the bearer API key

pub mod doc;
mod health;
mod v1;

use std::sync::Arc;

use axum::{Router, middleware};
use tower::ServiceBuilder;
use utoipa_swagger_ui::SwaggerUi;

use crate::middleware::{cors, trace};
use crate::state::AppState;

/// Build the complete Axum [`Router`] for the application.
pub fn build(state: Arc<AppState>) -> Router {
    let mut app = Router::new()
        .merge(health::router())
        .nest("/v1", v1::router(state.clone()));

    if state.config.enable_swagger {
        app = app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", doc::get_docs()));
    }

    app
        // Outermost layers execute first on the way in.
        .layer(ServiceBuilder::new().layer(cors::cors_layer(&state.config)))
        .layer(middleware::from_fn(trace::trace_middleware))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use hugchat_client::{ChatBackend, ClientError, FragmentStream, Reply, WebSearchSource};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    const API_KEY: &str = "sk-test";

    #[derive(Default)]
    struct MockBackend {
        reply: Option<Reply>,
        fragments: Vec<Result<String, String>>,
        models: Vec<String>,
        failure: Option<String>,
        asks: Mutex<Vec<(String, bool)>>,
        stream_asks: Mutex<Vec<(String, bool)>>,
    }

    impl MockBackend {
        fn fail(&self) -> Result<(), ClientError> {
            match &self.failure {
                Some(message) => Err(ClientError::Upstream(message.clone())),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl ChatBackend for MockBackend {
        async fn ask(&self, text: &str, web_search: bool) -> Result<Reply, ClientError> {
            self.asks.lock().unwrap().push((text.to_owned(), web_search));
            self.fail()?;
            Ok(self.reply.clone().unwrap_or_else(|| Reply::Plain(String::new())))
        }

        async fn ask_stream(
            &self,
            text: &str,
            web_search: bool,
        ) -> Result<FragmentStream, ClientError> {
            self.stream_asks
                .lock()
                .unwrap()
                .push((text.to_owned(), web_search));
            self.fail()?;
            let items: Vec<_> = self
                .fragments
                .iter()
                .cloned()
                .map(|item| item.map_err(ClientError::Upstream))
                .collect();
            Ok(Box::pin(futures::stream::iter(items)))
        }

        async fn list_models(&self) -> Result<Vec<String>, ClientError> {
            self.fail()?;
            Ok(self.models.clone())
        }
    }

    fn app(backend: Arc<MockBackend>) -> Router {
        let config = Config::from_lookup(|key| match key {
            "GATEWAY_API_KEY" => Some(API_KEY.to_owned()),
            "GATEWAY_REQUEST_TIMEOUT_SECS" => Some("5".to_owned()),
            _ => None,
        });
        build(Arc::new(AppState {
            config: Arc::new(config),
            backend,
            backend_model: "meta-llama/Llama-3.3-70B-Instruct".into(),
        }))
    }

    fn chat_request(auth: Option<&str>, body: Value) -> Request<Body> {
        let mut builder = Request::post("/v1/chat/completions")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(auth) = auth {
            builder = builder.header(header::AUTHORIZATION, auth);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    fn bearer() -> Option<&'static str> {
        Some("Bearer sk-test")
    }

    async fn body_bytes(resp: Response) -> Vec<u8> {
        resp.into_body().collect().await.unwrap().to_bytes().to_vec()
    }

    async fn body_json(resp: Response) -> Value {
        serde_json::from_slice(&body_bytes(resp).await).unwrap()
    }

    fn hi(model: &str, stream: bool) -> Value {
        json!({
            "model": model,
            "messages": [{ "role": "user", "content": "hi" }],
            "stream": stream,
        })
    }

    #[tokio::test]
    async fn health_needs_no_api_key() {
        let resp = app(Arc::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp.headers().contains_key(trace::X_TRACE_ID));

        let body = body_json(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["backend_model"], "meta-llama/Llama-3.3-70B-Instruct");
    }

    #[tokio::test]
    async fn rejects_bad_credentials_without_calling_backend() {
        let backend = Arc::new(MockBackend::default());
        for auth in [None, Some("Bearer wrong"), Some("Basic sk-test"), Some("sk-test")] {
            let resp = app(backend.clone())
                .oneshot(chat_request(auth, hi("m", false)))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{auth:?}");
            assert_eq!(
                body_json(resp).await,
                json!({ "error": "Invalid or missing API key" })
            );
        }
        assert!(backend.asks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn models_route_is_protected() {
        let resp = app(Arc::default())
            .oneshot(Request::get("/v1/models").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn synchronous_completion_with_web_search() {
        let backend = Arc::new(MockBackend {
            reply: Some(Reply::Structured {
                text: "hello there".into(),
                sources: Some(vec![WebSearchSource {
                    link: "https://example.com".into(),
                    title: "Example".into(),
                    hostname: "example.com".into(),
                }]),
            }),
            ..Default::default()
        });

        let resp = app(backend.clone())
            .oneshot(chat_request(bearer(), hi("llama-internet", false)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["object"], "chat.completion");
        assert_eq!(body["model"], "llama-internet");
        assert_eq!(body["choices"][0]["message"]["role"], "assistant");
        assert_eq!(body["choices"][0]["message"]["content"], "hello there");
        assert_eq!(body["choices"][0]["finish_reason"], "stop");
        assert_eq!(body["sources"][0]["hostname"], "example.com");
        assert_eq!(body["usage"]["total_tokens"], 0);

        assert_eq!(
            *backend.asks.lock().unwrap(),
            vec![("hi".to_owned(), true)]
        );
    }

    #[tokio::test]
    async fn forwards_only_the_last_message() {
        let backend = Arc::new(MockBackend {
            reply: Some(Reply::Plain("ok".into())),
            ..Default::default()
        });
        let body = json!({
            "model": "whatever-model",
            "messages": [
                { "role": "system", "content": "be brief" },
                { "role": "user", "content": "first" },
                { "role": "user", "content": "second" },
            ],
        });

        let resp = app(backend.clone())
            .oneshot(chat_request(bearer(), body))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["model"], "whatever-model");
        assert_eq!(
            *backend.asks.lock().unwrap(),
            vec![("second".to_owned(), false)]
        );
    }

    #[tokio::test]
    async fn streaming_completion_is_event_stream() {
        let backend = Arc::new(MockBackend {
            fragments: vec![Ok("Hel".into()), Ok("lo".into())],
            ..Default::default()
        });

        let resp = app(backend.clone())
            .oneshot(chat_request(bearer(), hi("llama", true)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(
            resp.headers()[header::CONTENT_TYPE]
                .to_str()
                .unwrap()
                .starts_with("text/event-stream")
        );

        let text = String::from_utf8(body_bytes(resp).await).unwrap();
        assert!(text.ends_with("data: [DONE]\n\n"), "{text}");

        let chunks: Vec<Value> = text
            .split("\n\n")
            .filter_map(|event| event.strip_prefix("data: "))
            .filter(|data| *data != "[DONE]")
            .map(|data| serde_json::from_str(data).unwrap())
            .collect();
        assert_eq!(chunks.len(), 3);

        let content: String = chunks
            .iter()
            .filter_map(|c| c["choices"][0]["delta"]["content"].as_str())
            .collect();
        assert_eq!(content, "Hello");
        assert!(chunks.iter().all(|c| c["object"] == "chat.completion.chunk"));
        assert!(chunks.iter().all(|c| c["model"] == "llama"));
        assert_eq!(chunks[2]["choices"][0]["finish_reason"], "stop");

        assert_eq!(
            *backend.stream_asks.lock().unwrap(),
            vec![("hi".to_owned(), false)]
        );
        assert!(backend.asks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn stream_failure_still_ends_with_sentinel() {
        let backend = Arc::new(MockBackend {
            fragments: vec![Ok("par".into()), Err("socket closed".into())],
            ..Default::default()
        });

        let resp = app(backend)
            .oneshot(chat_request(bearer(), hi("llama", true)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let text = String::from_utf8(body_bytes(resp).await).unwrap();
        assert!(text.ends_with("data: [DONE]\n\n"), "{text}");
        assert!(!text.contains("\"finish_reason\":\"stop\""));
    }

    #[tokio::test]
    async fn lists_doubled_catalog() {
        let backend = Arc::new(MockBackend {
            models: vec!["a".into(), "b".into()],
            ..Default::default()
        });

        let resp = app(backend)
            .oneshot(
                Request::get("/v1/models")
                    .header(header::AUTHORIZATION, "Bearer sk-test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["object"], "list");
        let ids: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["a", "b", "a-internet", "b-internet"]);
        assert_eq!(body["data"][0]["owned_by"], "huggingface");
        assert_eq!(body["data"][0]["object"], "model");
    }

    #[tokio::test]
    async fn backend_failure_is_internal_error() {
        let backend = Arc::new(MockBackend {
            failure: Some("Model is overloaded".into()),
            ..Default::default()
        });

        let resp = app(backend)
            .oneshot(chat_request(bearer(), hi("llama", false)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(resp).await;
        assert_eq!(body["error"]["type"], "internal_error");
        assert_eq!(body["error"]["message"], "Model is overloaded");
    }

    #[tokio::test]
    async fn models_backend_failure_is_internal_error() {
        let backend = Arc::new(MockBackend {
            failure: Some("catalog unavailable".into()),
            ..Default::default()
        });

        let resp = app(backend)
            .oneshot(
                Request::get("/v1/models")
                    .header(header::AUTHORIZATION, "Bearer sk-test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(resp).await;
        assert_eq!(body["error"]["type"], "internal_error");
        assert_eq!(body["error"]["message"], "catalog unavailable");
        assert_eq!(body["error"]["param"], Value::Null);
        assert_eq!(body["error"]["code"], Value::Null);
    }

    #[tokio::test]
    async fn stream_open_failure_is_internal_error() {
        let backend = Arc::new(MockBackend {
            failure: Some("conversation limit reached".into()),
            ..Default::default()
        });

        let resp = app(backend)
            .oneshot(chat_request(bearer(), hi("llama", true)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(resp).await["error"]["message"],
            "conversation limit reached"
        );
    }

    #[tokio::test]
    async fn empty_messages_are_rejected() {
        let backend = Arc::new(MockBackend::default());
        let resp = app(backend.clone())
            .oneshot(chat_request(
                bearer(),
                json!({ "model": "llama", "messages": [] }),
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"]["type"], "invalid_request");
        assert!(backend.asks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_invalid_request() {
        let req = Request::post("/v1/chat/completions")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, "Bearer sk-test")
            .body(Body::from("{not json"))
            .unwrap();

        let resp = app(Arc::default()).oneshot(req).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = body_json(resp).await;
        assert_eq!(body["error"]["type"], "invalid_request");
        assert!(!body["error"]["message"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        struct Stalled;

        #[async_trait]
        impl ChatBackend for Stalled {
            async fn ask(&self, _: &str, _: bool) -> Result<Reply, ClientError> {
                futures::future::pending().await
            }
            async fn ask_stream(&self, _: &str, _: bool) -> Result<FragmentStream, ClientError> {
                futures::future::pending().await
            }
            async fn list_models(&self) -> Result<Vec<String>, ClientError> {
                futures::future::pending().await
            }
        }

        let config = Config::from_lookup(|key| match key {
            "GATEWAY_API_KEY" => Some(API_KEY.to_owned()),
            _ => None,
        });
        let state = Arc::new(AppState {
            config: Arc::new(Config {
                request_timeout: Duration::from_millis(20),
                ..config
            }),
            backend: Arc::new(Stalled),
            backend_model: "m".into(),
        });

        let resp = build(state)
            .oneshot(chat_request(bearer(), hi("llama", false)))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"]["type"], "internal_error");
    }

    #[tokio::test]
    async fn swagger_document_is_served() {
        let resp = app(Arc::default())
            .oneshot(
                Request::get("/api-docs/openapi.json")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let doc = body_json(resp).await;
        assert!(doc["paths"].get("/v1/chat/completions").is_some());
        assert!(doc["paths"].get("/v1/models").is_some());
    }
}
