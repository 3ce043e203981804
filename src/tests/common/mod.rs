// Common test utilities and helpers

use async_trait::async_trait;
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::services::llm::{ChatCompletion, ChatCompletionRequest, CompletionTransport, LLMError, TokenUsage};

/// Create an in-memory SQLite database for testing
pub async fn create_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .acquire_timeout(Duration::from_secs(3))
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create test database");

    sqlx::migrate!().run(&pool).await.expect("Failed to run migrations");

    pool
}

/// Two brands, three generations:
///
/// | brand | model | generation            |
/// |-------|-------|-----------------------|
/// | b1 VW | Golf  | g1 Golf VII (5G, 2012-2020) |
/// | b1 VW | Golf  | g2 Golf VIII (CD1, 2019-)   |
/// | b2 BMW| 3er   | g3 E90 (2005-2012)          |
pub async fn seed_vehicle_catalog(pool: &SqlitePool) {
    for (id, name, slug) in [("b1", "Volkswagen", "volkswagen"), ("b2", "BMW", "bmw")] {
        sqlx::query("INSERT INTO vehicle_brands (id, name, slug) VALUES (?, ?, ?)")
            .bind(id)
            .bind(name)
            .bind(slug)
            .execute(pool)
            .await
            .expect("Failed to seed brand");
    }

    for (id, brand_id, name, slug) in [("m1", "b1", "Golf", "golf"), ("m2", "b2", "3er", "3er")] {
        sqlx::query("INSERT INTO vehicle_models (id, brand_id, name, slug) VALUES (?, ?, ?, ?)")
            .bind(id)
            .bind(brand_id)
            .bind(name)
            .bind(slug)
            .execute(pool)
            .await
            .expect("Failed to seed model");
    }

    let generations: [(&str, &str, &str, Option<&str>, Option<i64>, Option<i64>); 3] = [
        ("g1", "m1", "Golf VII", Some("5G"), Some(2012), Some(2020)),
        ("g2", "m1", "Golf VIII", Some("CD1"), Some(2019), None),
        ("g3", "m2", "E90", None, Some(2005), Some(2012)),
    ];
    for (id, model_id, name, code, start, end) in generations {
        sqlx::query(
            "INSERT INTO vehicle_generations (id, model_id, name, generation_code, year_start, year_end)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(model_id)
        .bind(name)
        .bind(code)
        .bind(start)
        .bind(end)
        .execute(pool)
        .await
        .expect("Failed to seed generation");
    }
}

type Responder = Box<dyn Fn(usize, &ChatCompletionRequest) -> Result<ChatCompletion, LLMError> + Send + Sync>;

/// Scripted chat-completion upstream.
///
/// The responder gets the 0-based call index and the request; every request is recorded.
pub struct StubTransport {
    responder: Responder,
    calls: AtomicUsize,
    requests: Mutex<Vec<ChatCompletionRequest>>,
}

impl StubTransport {
    pub fn new(
        responder: impl Fn(usize, &ChatCompletionRequest) -> Result<ChatCompletion, LLMError> + Send + Sync + 'static,
    ) -> Self {
        Self { responder: Box::new(responder), calls: AtomicUsize::new(0), requests: Mutex::new(Vec::new()) }
    }

    /// Same text for every call
    pub fn fixed(text: &str) -> Self {
        let text = text.to_string();
        Self::new(move |_, _| Ok(completion(&text)))
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// User turns of all recorded requests
    pub fn prompts(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter_map(|r| r.messages.last().map(|m| m.content.clone()))
            .collect()
    }
}

#[async_trait]
impl CompletionTransport for StubTransport {
    async fn send(&self, request: &ChatCompletionRequest) -> Result<ChatCompletion, LLMError> {
        let index = self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.responder)(index, request)
    }
}

pub fn completion(text: &str) -> ChatCompletion {
    ChatCompletion { text: text.to_string(), usage: TokenUsage { input_tokens: 100, output_tokens: 20 } }
}

/// `count` numbered lines that are unique per `tag`
pub fn numbered_lines(tag: &str, count: usize) -> String {
    (1..=count).map(|i| format!("{}. {} Frage {}?", i, tag, i)).collect::<Vec<_>>().join("\n")
}

pub fn http_error(status: u16, message: &str) -> LLMError {
    LLMError::Http { status, message: message.to_string() }
}
