//! Common test utilities and helpers
//!
//! - `test_config` - fast bcrypt, small connection buffers
//! - `TestApp` - a backend served on a real loopback listener, for
//!   websocket tests
//! - thin `reqwest` wrappers for the JSON API

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use calsync::backend::server::{build_app, AppState, ServerConfig};
use calsync::backend::sync::{ChangeBroker, MemoryBroker};
use calsync::shared::{Project, ProjectEvent, ProjectId};
use futures_util::StreamExt;
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

pub type ClientSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub fn test_config() -> ServerConfig {
    ServerConfig::builder()
        .host("127.0.0.1")
        .port(0)
        .jwt_secret("integration-test-secret")
        .bcrypt_cost(4)
        .connection_buffer(16)
        .build()
        .unwrap()
}

pub struct TestApp {
    pub addr: SocketAddr,
    pub state: AppState,
    pub http: reqwest::Client,
}

impl TestApp {
    /// Serve a fresh backend with its own in-process broker
    pub async fn spawn() -> Self {
        Self::spawn_with_broker(Arc::new(MemoryBroker::new())).await
    }

    /// Serve a backend on `broker`; several apps sharing one broker act as
    /// several processes
    pub async fn spawn_with_broker(broker: Arc<dyn ChangeBroker>) -> Self {
        Self::spawn_with(test_config(), broker).await
    }

    /// Serve a backend with its own in-process broker and a custom config
    pub async fn spawn_with_config(config: ServerConfig) -> Self {
        Self::spawn_with(config, Arc::new(MemoryBroker::new())).await
    }

    async fn spawn_with(config: ServerConfig, broker: Arc<dyn ChangeBroker>) -> Self {
        let (router, state) = build_app(config, broker).await.unwrap();
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self {
            addr,
            state,
            http: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn signup(&self, username: &str) -> String {
        let response = self
            .http
            .post(self.url("/api/auth/signup"))
            .json(&json!({ "username": username, "password": "password123" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let body: Value = response.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn create_project(&self, token: &str, name: &str) -> Project {
        self.http
            .post(self.url("/api/projects"))
            .bearer_auth(token)
            .json(&json!({ "name": name }))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap()
    }

    pub async fn add_member(&self, token: &str, project_id: ProjectId, username: &str) {
        let response = self
            .http
            .post(self.url(&format!("/api/projects/{project_id}/members")))
            .bearer_auth(token)
            .json(&json!({ "username": username }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
    }

    pub async fn create_event(&self, token: &str, project_id: ProjectId, title: &str, date: &str) -> ProjectEvent {
        let response = self
            .http
            .post(self.url(&format!("/api/projects/{project_id}/events")))
            .bearer_auth(token)
            .json(&json!({ "title": title, "date": date }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        response.json().await.unwrap()
    }

    pub async fn update_event(
        &self,
        token: &str,
        event: &ProjectEvent,
        title: &str,
        version: u64,
    ) -> reqwest::Response {
        self.http
            .put(self.url(&format!("/api/projects/{}/events/{}", event.project_id, event.id)))
            .bearer_auth(token)
            .json(&json!({ "title": title, "date": event.date, "version": version }))
            .send()
            .await
            .unwrap()
    }

    pub async fn delete_event(&self, token: &str, event: &ProjectEvent) -> reqwest::Response {
        self.http
            .delete(self.url(&format!("/api/projects/{}/events/{}", event.project_id, event.id)))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    /// Open a live socket; the handshake succeeds even for rejected clients
    pub async fn connect(&self, project_id: ProjectId, token: Option<&str>) -> ClientSocket {
        let url = match token {
            Some(token) => format!("ws://{}/ws/projects/{}?token={}", self.addr, project_id, token),
            None => format!("ws://{}/ws/projects/{}", self.addr, project_id),
        };
        let (socket, _response) = connect_async(url).await.unwrap();
        socket
    }

    /// Wait until the project's room on this app holds `size` connections
    pub async fn wait_for_room(&self, project_id: ProjectId, size: usize) {
        let registry = self.state.registry.clone();
        tokio::time::timeout(Duration::from_secs(5), async move {
            while registry.room_size(project_id) != size {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("room {project_id} never reached {size} connections"));
    }
}

/// Next text frame as JSON
pub async fn next_json(socket: &mut ClientSocket) -> Value {
    let message = tokio::time::timeout(Duration::from_secs(5), socket.next())
        .await
        .expect("timed out waiting for a change record")
        .expect("socket closed")
        .expect("socket error");
    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("expected a text frame, got {other:?}"),
    }
}

/// Assert nothing arrives within `window`
pub async fn assert_silent(socket: &mut ClientSocket, window: Duration) {
    if let Ok(Some(message)) = tokio::time::timeout(window, socket.next()).await {
        panic!("expected no message, got {message:?}");
    }
}

/// Wait for the close frame and return its code
pub async fn close_code(socket: &mut ClientSocket) -> Option<u16> {
    let deadline = Duration::from_secs(5);
    loop {
        match tokio::time::timeout(deadline, socket.next()).await {
            Ok(Some(Ok(Message::Close(frame)))) => return frame.map(|f| u16::from(f.code)),
            Ok(Some(Ok(_))) => continue,
            Ok(Some(Err(_))) | Ok(None) => return None,
            Err(_) => panic!("timed out waiting for close"),
        }
    }
}
