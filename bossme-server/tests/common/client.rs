//! WebSocket and HTTP test clients
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
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Low-level WebSocket connection
pub struct WsConnection {
    sink: SplitSink<WsStream, Message>,
    stream: SplitStream<WsStream>,
}

impl WsConnection {
    /// Connect to the default push path
    pub async fn connect(addr: SocketAddr) -> Self {
        Self::connect_path(addr, "/ws").await
    }

    /// Connect to a specific push path
    pub async fn connect_path(addr: SocketAddr, path: &str) -> Self {
        let url = format!("ws://{}{}", addr, path);
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("Failed to connect");
        let (sink, stream) = ws.split();
        Self { sink, stream }
    }

    /// Connect with a tiny receive buffer, for clients that stop reading
    pub async fn connect_with_small_buffer(addr: SocketAddr) -> Self {
        let socket = tokio::net::TcpSocket::new_v4().unwrap();
        socket.set_recv_buffer_size(4096).unwrap();
        let stream = socket.connect(addr).await.unwrap();
        let url = format!("ws://{}/ws", addr);
        let (ws, _) = tokio_tungstenite::client_async(url, MaybeTlsStream::Plain(stream))
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

    /// Send a close frame
    pub async fn close(&mut self) {
        self.sink.send(Message::Close(None)).await.unwrap();
    }

    /// Receive raw text message
    pub async fn recv_raw(&mut self) -> String {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return text.to_string(),
                Some(Ok(Message::Ping(_))) => continue,
                Some(Ok(_)) => continue,
                Some(Err(e)) => panic!("WebSocket error: {}", e),
                None => panic!("WebSocket closed"),
            }
        }
    }

    /// Receive and deserialize JSON message
    pub async fn recv_json<T: DeserializeOwned>(&mut self) -> T {
        let text = self.recv_raw().await;
        serde_json::from_str(&text).expect("Failed to parse JSON")
    }

    /// Receive with timeout, returns None if timeout
    pub async fn recv_timeout(&mut self, duration: Duration) -> Option<String> {
        tokio::time::timeout(duration, self.recv_raw()).await.ok()
    }

    /// Wait for the server to close the connection; false on timeout
    pub async fn expect_closed(&mut self, duration: Duration) -> bool {
        let closed = async {
            loop {
                match self.stream.next().await {
                    Some(Ok(Message::Close(_))) | Some(Err(_)) | None => return,
                    Some(Ok(_)) => continue,
                }
            }
        };
        tokio::time::timeout(duration, closed).await.is_ok()
    }
}

/// High-level test client with helper methods
pub struct TestClient {
    pub conn: WsConnection,
}

impl TestClient {
    /// Connect to server (consumes the initial connection ack)
    #[allow(dead_code)]
    pub async fn connect(addr: SocketAddr) -> Self {
        Self::connect_path(addr, "/ws").await
    }

    /// Connect to a push path other than the default
    #[allow(dead_code)]
    pub async fn connect_path(addr: SocketAddr, path: &str) -> Self {
        let mut conn = WsConnection::connect_path(addr, path).await;

        let ack: serde_json::Value = conn.recv_json().await;
        assert_eq!(
            ack["type"], "connection",
            "Expected connection ack on connect"
        );

        Self { conn }
    }

    /// Send a ping, return the pong
    #[allow(dead_code)]
    pub async fn ping(&mut self) -> serde_json::Value {
        self.conn
            .send_json(&serde_json::json!({ "type": "ping" }))
            .await;
        let pong: serde_json::Value = self.conn.recv_json().await;
        assert_eq!(pong["type"], "pong", "Expected pong but got: {}", pong);
        pong
    }

    /// Receive next message
    #[allow(dead_code)]
    pub async fn recv(&mut self) -> serde_json::Value {
        self.conn.recv_json().await
    }

    /// Receive next message, failing after a second
    #[allow(dead_code)]
    pub async fn recv_within_second(&mut self) -> serde_json::Value {
        let text = self
            .conn
            .recv_timeout(Duration::from_secs(1))
            .await
            .expect("Expected a message within a second");
        serde_json::from_str(&text).expect("Failed to parse JSON")
    }

    /// Assert no message received within duration
    #[allow(dead_code)]
    pub async fn expect_no_message(&mut self, duration: Duration) {
        assert!(
            self.conn.recv_timeout(duration).await.is_none(),
            "Expected no message but received one"
        );
    }
}

/// HTTP client that can act as a user behind the OAuth proxy
#[allow(dead_code)]
pub struct HttpClient {
    base: String,
    inner: reqwest::Client,
}

#[allow(dead_code)]
impl HttpClient {
    pub fn new(addr: SocketAddr) -> Self {
        Self {
            base: format!("http://{}", addr),
            inner: reqwest::Client::new(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.inner.get(self.url(path)).send().await.unwrap()
    }

    pub async fn get_json(&self, path: &str) -> serde_json::Value {
        self.get(path).await.json().await.unwrap()
    }

    /// POST as `user` with `role`, optionally with a JSON body
    pub async fn post_as(
        &self,
        path: &str,
        user: &str,
        role: &str,
        body: Option<serde_json::Value>,
    ) -> reqwest::Response {
        let mut request = self
            .inner
            .post(self.url(path))
            .header("x-bossme-user", user)
            .header("x-bossme-role", role);
        if let Some(body) = body {
            request = request.json(&body);
        }
        request.send().await.unwrap()
    }
}
