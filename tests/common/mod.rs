#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;

use translachat_api::config::GatewayConfig;
use translachat_api::model::{GenerationRequest, LanguageModel};
use translachat_api::routes;
use translachat_api::state::AppState;

/// Stand-in model that replays canned replies and records call overlap
pub struct FakeModel {
    pub calls: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
    in_flight: AtomicUsize,
    delay: Duration,
    replies: Mutex<VecDeque<Result<String, String>>>,
}

impl FakeModel {
    pub fn new(delay: Duration, replies: Vec<Result<&str, &str>>) -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            in_flight: AtomicUsize::new(0),
            delay,
            replies: Mutex::new(
                replies
                    .into_iter()
                    .map(|r| r.map(str::to_string).map_err(str::to_string))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl LanguageModel for FakeModel {
    fn model_id(&self) -> &str {
        "fake-gemma"
    }

    async fn generate(&self, _request: &GenerationRequest) -> Result<String, anyhow::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Ok(text)) => Ok(text),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Ok("translated".to_string()),
        }
    }
}

pub struct TestApp {
    pub app: Router,
    pub calls: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

pub fn test_app(model: FakeModel) -> TestApp {
    let calls = model.calls.clone();
    let max_in_flight = model.max_in_flight.clone();
    let state = AppState::new(&GatewayConfig::default(), Box::new(model));
    TestApp {
        app: routes::create_app(state),
        calls,
        max_in_flight,
    }
}

/// Serve the app on an ephemeral local port and return its base URL
pub async fn spawn_server(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
