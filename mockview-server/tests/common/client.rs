//! WebSocket test client for protocol testing
//!
//! Provides both low-level WsConnection and high-level TestClient.
//!
//! Note: Some methods may appear unused because they're only used in specific
//! test files and clippy checks each test independently.

use std::net::SocketAddr;
use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Upper bound on waiting for any single server message
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Low-level WebSocket connection
pub struct WsConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WsConnection {
    /// Connect to the WebSocket endpoint with a token in the query string
    pub async fn connect(addr: SocketAddr, token: &str) -> Self {
        let url = format!("ws://{}/ws?token={}", addr, token);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("Failed to connect");
        let (sink, stream) = ws.split();
        Self { sink, stream }
    }

    /// Send raw text message
    pub async fn send_raw(&mut self, msg: &str) {
        self.sink
            .send(Message::Text(msg.to_string().into()))
            .await
            .unwrap();
    }

    /// Send JSON message
    pub async fn send_json<T: Serialize>(&mut self, msg: &T) {
        let json = serde_json::to_string(msg).unwrap();
        self.send_raw(&json).await;
    }

    /// Receive raw text message
    pub async fn recv_raw(&mut self) -> String {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return text.to_string(),
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("WebSocket error: {}", e),
                None => panic!("WebSocket closed"),
            }
        }
    }

    /// Receive and deserialize JSON message
    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> T {
        let text = tokio::time::timeout(RECV_TIMEOUT, self.recv_raw())
            .await
            .expect("Timed out waiting for server message");
        serde_json::from_str(&text).expect("Failed to parse JSON")
    }

    /// Receive with timeout, returns None if timeout
    pub async fn recv_timeout(&mut self, duration: Duration) -> Option<String> {
        tokio::time::timeout(duration, self.recv_raw()).await.ok()
    }

    /// Close the connection
    pub async fn close(mut self) {
        let _ = self.sink.send(Message::Close(None)).await;
    }
}

/// High-level test client with helper methods
pub struct TestClient {
    pub conn: WsConnection,
}

impl TestClient {
    /// Connect to server (consumes initial auth_context message)
    #[allow(dead_code)]
    pub async fn connect(addr: SocketAddr, token: &str) -> Self {
        let mut conn = WsConnection::connect(addr, token).await;

        // Server sends auth_context on connect, consume it
        let auth_msg: Value = conn.recv_json().await;
        assert_eq!(
            auth_msg["event"], "auth_context",
            "Expected auth_context message on connect"
        );

        Self { conn }
    }

    /// Send a client event
    #[allow(dead_code)]
    pub async fn emit(&mut self, event: &str, data: Value) {
        self.conn
            .send_json(&json!({"event": event, "data": data}))
            .await;
    }

    /// Receive the next server message
    #[allow(dead_code)]
    pub async fn recv(&mut self) -> Value {
        self.conn.recv_json().await
    }

    /// Receive messages until one named `event` arrives, returning its data
    #[allow(dead_code)]
    pub async fn expect_event(&mut self, event: &str) -> Value {
        let msg = self.recv().await;
        assert_eq!(msg["event"], event, "Expected {} but got: {}", event, msg);
        msg["data"].clone()
    }

    /// Start an interview and return the `interview_started` payload
    #[allow(dead_code)]
    pub async fn start_interview(&mut self, interview_type: &str, tier: &str) -> Value {
        self.emit(
            "start_interview",
            json!({"type": interview_type, "difficulty": "medium", "durationTier": tier}),
        )
        .await;
        self.expect_event("interview_started").await
    }

    /// Submit an answer to the given question
    #[allow(dead_code)]
    pub async fn submit_answer(&mut self, session_id: &str, question_id: &str, answer: &str) {
        self.emit(
            "submit_answer",
            json!({
                "sessionId": session_id,
                "questionId": question_id,
                "answer": answer,
                "timeSpent": 30,
            }),
        )
        .await;
    }

    /// Close the connection
    #[allow(dead_code)]
    pub async fn close(self) {
        self.conn.close().await;
    }
}
