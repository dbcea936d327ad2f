//! Common test utilities and helpers

#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::HeaderValue;
use axum_test::TestServer;
use school_eval_core::{
    api::{ApiServer, AppState},
    auth::hash_credential,
    config::Settings,
    error::{EvalError, Result},
    seeding,
    services::{ChatCompletion, ChatRequest},
    storage::NewSchool,
    LibsqlStore, School, SurveyStore,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Create a file-backed store with the standard indicators installed
///
/// libSQL's `:memory:` mode gives every connection its own database, so
/// tests use a temporary file instead.
pub async fn create_test_store() -> (TempDir, Arc<LibsqlStore>) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("school-eval-test.db");
    let store = LibsqlStore::open(&path.to_string_lossy(), true)
        .await
        .expect("Failed to create test store");
    seeding::ensure_standard_hierarchy(&store)
        .await
        .expect("Failed to seed indicators");
    (dir, Arc::new(store))
}

/// Settings with a cheap bcrypt cost
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.auth.bcrypt_cost = 4;
    settings
}

/// Register a school whose credential is stored verbatim
pub async fn add_school(store: &LibsqlStore, code: &str, stored_credential: &str) -> School {
    store
        .create_school(&NewSchool {
            school_code: code.to_string(),
            school_name: format!("{} 초등학교", code),
            password_hash: stored_credential.to_string(),
            region: Some("서울".to_string()),
            school_type: Some("초등학교".to_string()),
        })
        .await
        .expect("Failed to create school")
}

/// Register a school with a bcrypt credential
pub async fn add_bcrypt_school(store: &LibsqlStore, code: &str, password: &str) -> School {
    let hash = hash_credential(password, 4).expect("hash");
    add_school(store, code, &hash).await
}

/// Chat completion stub replaying scripted replies and recording requests
#[derive(Default)]
pub struct ScriptedLlm {
    replies: Mutex<VecDeque<std::result::Result<String, String>>>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl ScriptedLlm {
    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(message.to_string())])),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ChatRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ChatCompletion for ScriptedLlm {
    async fn complete(&self, request: ChatRequest) -> Result<String> {
        self.requests.lock().unwrap().push(request);
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(EvalError::LlmApi(message)),
            None => Err(EvalError::LlmApi("no scripted reply left".to_string())),
        }
    }
}

/// Everything an HTTP-level test needs
pub struct TestApp {
    pub _dir: TempDir,
    pub store: Arc<LibsqlStore>,
    pub llm: Arc<ScriptedLlm>,
    pub server: TestServer,
}

/// Router over a fresh store and the given model stub
pub async fn create_test_app(llm: Arc<ScriptedLlm>) -> TestApp {
    let (dir, store) = create_test_store().await;
    let state = AppState::new(store.clone(), llm.clone(), test_settings());
    let server = TestServer::new(ApiServer::build_router(state)).expect("test server");
    TestApp {
        _dir: dir,
        store,
        llm,
        server,
    }
}

/// `Authorization: Bearer <token>` header value
pub fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).expect("header value")
}

/// Log a school in over HTTP and return its session token
pub async fn login(server: &TestServer, code: &str, password: &str) -> String {
    let response = server
        .post("/functions/secure-login")
        .json(&serde_json::json!({ "schoolCode": code, "password": password }))
        .await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    body["sessionToken"]
        .as_str()
        .expect("session token")
        .to_string()
}
