use std::sync::Arc;

use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::task::JoinHandle;

use campus::config::DB_FILE_NAME;
use campus::seed::{DEMO_PASSWORD, run_seed};
use campus::server::{AppState, create_router};
use campus::store::{SqliteStore, Store};

/// An in-process server on a random port, backed by a seeded temp database.
pub struct TestServer {
    pub temp_dir: TempDir,
    pub base_url: String,
    pub client: reqwest::Client,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with_session_ttl(24).await
    }

    /// Starts a server whose new sessions live for `hours`; negative values
    /// issue tokens that are already expired.
    pub async fn start_with_session_ttl(hours: i64) -> Self {
        let temp_dir = TempDir::new().expect("create temp dir");
        let store = SqliteStore::new(temp_dir.path().join(DB_FILE_NAME)).expect("open store");
        store.initialize().expect("initialize store");
        run_seed(&store, DEMO_PASSWORD).expect("seed demo data");

        let state = Arc::new(AppState {
            store: Arc::new(store),
            session_ttl_hours: hours,
        });
        let app = create_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let port = listener.local_addr().expect("local addr").port();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("serve");
        });

        let base_url = format!("http://127.0.0.1:{}", port);
        let client = reqwest::Client::new();
        Self::wait_for_ready(&client, &base_url).await;

        Self {
            temp_dir,
            base_url,
            client,
            handle,
        }
    }

    async fn wait_for_ready(client: &reqwest::Client, base_url: &str) {
        for _ in 0..50 {
            if client
                .get(format!("{}/health", base_url))
                .send()
                .await
                .is_ok()
            {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        }
        panic!("Server did not become ready");
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Logs in a demo user and returns the bearer token.
    pub async fn login(&self, email: &str) -> String {
        let resp = self
            .client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "email": email, "password": DEMO_PASSWORD }))
            .send()
            .await
            .expect("login request");
        assert_eq!(resp.status(), 200, "login failed for {email}");

        let body: Value = resp.json().await.expect("parse login response");
        body["data"]["token"]
            .as_str()
            .expect("token not a string")
            .to_string()
    }

    pub async fn get(&self, token: &str, path: &str) -> (u16, Value) {
        let resp = self
            .client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .expect("send request");
        Self::read(resp).await
    }

    pub async fn send(
        &self,
        method: reqwest::Method,
        token: &str,
        path: &str,
        body: Value,
    ) -> (u16, Value) {
        let resp = self
            .client
            .request(method, self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .expect("send request");
        Self::read(resp).await
    }

    pub async fn post(&self, token: &str, path: &str, body: Value) -> (u16, Value) {
        self.send(reqwest::Method::POST, token, path, body).await
    }

    async fn read(resp: reqwest::Response) -> (u16, Value) {
        let status = resp.status().as_u16();
        let bytes = resp.bytes().await.expect("read body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse JSON body")
        };
        (status, body)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
