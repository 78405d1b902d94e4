#![allow(dead_code)]

use std::{
    net::SocketAddr,
    path::Path,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use axum_test::{
    TestServer,
    multipart::{MultipartForm, Part},
};
use clap::Parser;
use pantrychef_api::{
    application::http::server::http_server::{router, state},
    args::Args,
};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const API_KEY: &str = "sk-test-key";

pub const RECIPE_ANSWER: &str = "# Tortilla de patatas
## 🛒 INGREDIENTES
- 4 huevos
- 1 cebolla
## 👨‍🍳 PREPARACIÓN
1. Bate los huevos.
2. Pocha la cebolla.
## 🛍 LISTA DE COMPRAS SUGERIDA
- [ ] Aceite de oliva";

/// Stand-in for a chat-completions provider that counts calls.
pub struct FakeProvider {
    pub vision_calls: AtomicUsize,
    pub recipe_calls: AtomicUsize,
    pub vision_status: StatusCode,
    pub vision_answer: String,
    pub vision_delay: Duration,
}

impl FakeProvider {
    pub fn new(vision_status: StatusCode, vision_answer: &str) -> Self {
        Self {
            vision_calls: AtomicUsize::new(0),
            recipe_calls: AtomicUsize::new(0),
            vision_status,
            vision_answer: vision_answer.to_string(),
            vision_delay: Duration::ZERO,
        }
    }

    /// Holds every vision answer back for `delay`.
    pub fn with_vision_delay(mut self, delay: Duration) -> Self {
        self.vision_delay = delay;
        self
    }

    pub fn vision_calls(&self) -> usize {
        self.vision_calls.load(Ordering::SeqCst)
    }

    pub fn recipe_calls(&self) -> usize {
        self.recipe_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.vision_calls() + self.recipe_calls()
    }
}

fn completion(content: &str) -> Json<Value> {
    Json(json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    }))
}

async fn chat_completions(
    State(provider): State<Arc<FakeProvider>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let authorized = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {}", API_KEY));
    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": { "message": "Incorrect API key provided" } })),
        );
    }

    let is_vision = body["messages"][0]["content"].is_array();
    if is_vision {
        provider.vision_calls.fetch_add(1, Ordering::SeqCst);
        if !provider.vision_delay.is_zero() {
            tokio::time::sleep(provider.vision_delay).await;
        }
        if !provider.vision_status.is_success() {
            return (
                provider.vision_status,
                Json(json!({ "error": { "message": "provider says no" } })),
            );
        }
        (StatusCode::OK, completion(&provider.vision_answer))
    } else {
        provider.recipe_calls.fetch_add(1, Ordering::SeqCst);
        (StatusCode::OK, completion(RECIPE_ANSWER))
    }
}

pub async fn spawn_provider(provider: Arc<FakeProvider>) -> SocketAddr {
    let app = Router::new()
        .route("/v1/chat/completions", post(chat_completions))
        .with_state(provider);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

pub struct TestApp {
    pub server: TestServer,
    pub provider: Arc<FakeProvider>,
    pub upload_dir: TempDir,
}

impl TestApp {
    pub async fn new(provider: FakeProvider) -> Self {
        Self::with_overrides(provider, &[]).await
    }

    /// Starts the app against a fresh fake provider. `overrides` replace the
    /// default value of the named flags.
    pub async fn with_overrides(provider: FakeProvider, overrides: &[(&str, &str)]) -> Self {
        let provider = Arc::new(provider);
        let addr = spawn_provider(provider.clone()).await;
        let upload_dir = TempDir::new().unwrap();

        let base_url = format!("http://{}/v1", addr);
        let upload_folder = upload_dir.path().to_string_lossy().to_string();
        let mut flags: Vec<(&str, &str)> = vec![
            ("--ai-provider", "openai"),
            ("--openai-api-key", API_KEY),
            ("--openai-base-url", base_url.as_str()),
            ("--upload-folder", upload_folder.as_str()),
            ("--root-path", ""),
            ("--llm-retry-initial-delay-ms", "0"),
            ("--llm-max-attempts", "3"),
            ("--max-recipes", "3"),
            ("--max-images", "3"),
            ("--max-content-length", "1MiB"),
            ("--allowed-extensions", "png,jpg,jpeg"),
            ("--rate-limit-per-minute", "100"),
            ("--rate-limit-per-hour", "1000"),
        ];
        for &(flag, value) in overrides {
            match flags.iter_mut().find(|(name, _)| *name == flag) {
                Some(entry) => entry.1 = value,
                None => flags.push((flag, value)),
            }
        }

        let mut argv = vec!["pantrychef".to_string()];
        for (flag, value) in flags {
            argv.push(format!("{}={}", flag, value));
        }

        let args = Args::try_parse_from(argv).unwrap();
        let app_state = state(Arc::new(args)).await.unwrap();
        let server = TestServer::new(router(app_state).unwrap()).unwrap();

        Self {
            server,
            provider,
            upload_dir,
        }
    }

    pub fn upload_dir_is_empty(&self) -> bool {
        dir_is_empty(self.upload_dir.path())
    }
}

pub fn dir_is_empty(path: &Path) -> bool {
    std::fs::read_dir(path).unwrap().next().is_none()
}

pub fn photo(name: &str) -> Part {
    Part::bytes(vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10])
        .file_name(name.to_string())
        .mime_type("image/jpeg")
}

pub fn form_with_photo(name: &str) -> MultipartForm {
    MultipartForm::new().add_part("images", photo(name))
}
