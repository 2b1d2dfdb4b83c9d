use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::debug;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport send failed: {0}")]
    Send(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
    #[error("transport is not connected")]
    NotConnected,
}

/// Duplex text-frame channel to the voice API.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    /// Next text frame, or `None` once the peer has closed the stream.
    async fn next_frame(&self) -> Result<Option<String>, TransportError>;
    async fn send(&self, frame: String) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

pub struct WebSocketTransport {
    url: String,
    api_key: SecretString,
    max_frame_bytes: usize,
    stream: Mutex<Option<WsStream>>,
}

impl WebSocketTransport {
    pub fn new(url: impl Into<String>, api_key: SecretString, max_frame_bytes: usize) -> Self {
        Self { url: url.into(), api_key, max_frame_bytes, stream: Mutex::new(None) }
    }
}

#[async_trait]
impl RealtimeTransport for WebSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let mut request = self
            .url
            .as_str()
            .into_client_request()
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key.expose_secret()))
            .map_err(|error| TransportError::Connect(format!("invalid credential header: {error}")))?;
        request.headers_mut().insert("Authorization", bearer);

        let mut config = WebSocketConfig::default();
        config.max_message_size = Some(self.max_frame_bytes);
        config.max_frame_size = Some(self.max_frame_bytes);

        let (stream, _response) =
            tokio_tungstenite::connect_async_with_config(request, Some(config), false)
                .await
                .map_err(|error| TransportError::Connect(error.to_string()))?;
        *self.stream.lock().await = Some(stream);
        Ok(())
    }

    async fn next_frame(&self) -> Result<Option<String>, TransportError> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(TransportError::NotConnected)?;

        loop {
            match stream.next().await {
                None => return Ok(None),
                Some(Err(error)) => return Err(TransportError::Receive(error.to_string())),
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Binary(bytes))) => {
                    return Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
                }
                Some(Ok(Message::Close(frame))) => {
                    debug!(event_name = "realtime.transport.close_received", ?frame, "peer closed");
                    return Ok(None);
                }
                // control frames are answered by tungstenite itself
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => continue,
            }
        }
    }

    async fn send(&self, frame: String) -> Result<(), TransportError> {
        let mut guard = self.stream.lock().await;
        let stream = guard.as_mut().ok_or(TransportError::NotConnected)?;
        stream.send(Message::Text(frame)).await.map_err(|error| TransportError::Send(error.to_string()))
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let Some(mut stream) = self.stream.lock().await.take() else {
            return Ok(());
        };
        match stream.close(None).await {
            Ok(()) => Ok(()),
            Err(tokio_tungstenite::tungstenite::Error::ConnectionClosed) => Ok(()),
            Err(error) => Err(TransportError::Disconnect(error.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{RealtimeTransport, TransportError, WebSocketTransport};

    #[tokio::test]
    async fn reads_before_connect_are_rejected() {
        let transport =
            WebSocketTransport::new("wss://example.invalid/realtime", "key".to_string().into(), 1024);

        assert_eq!(transport.next_frame().await, Err(TransportError::NotConnected));
        assert_eq!(transport.send("{}".to_string()).await, Err(TransportError::NotConnected));
        assert_eq!(transport.disconnect().await, Ok(()));
    }

    #[tokio::test]
    async fn malformed_url_fails_to_connect() {
        let transport = WebSocketTransport::new("not a url", "key".to_string().into(), 1024);
        assert!(matches!(transport.connect().await, Err(TransportError::Connect(_))));
    }
}
