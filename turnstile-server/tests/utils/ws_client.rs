use anyhow::{Context, Result, bail};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use turnstile_core::{NegotiationRequest, NegotiationResponse, SessionDescription, StatusFrame};

use super::SIGNAL_TIMEOUT_MS;

/// A browser stand-in speaking the signaling protocol over a real socket.
pub struct WsClient {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl WsClient {
    pub async fn connect(addr: SocketAddr) -> Result<Self> {
        let (stream, _) = connect_async(format!("ws://{addr}/ws"))
            .await
            .context("WebSocket handshake failed")?;
        Ok(Self { stream })
    }

    async fn next_message(&mut self) -> Result<Message> {
        loop {
            let msg = tokio::time::timeout(
                Duration::from_millis(SIGNAL_TIMEOUT_MS),
                self.stream.next(),
            )
            .await
            .context("Timeout waiting for a frame")?
            .context("Socket ended")??;

            match msg {
                Message::Ping(_) | Message::Pong(_) => continue,
                other => return Ok(other),
            }
        }
    }

    pub async fn next_text(&mut self) -> Result<String> {
        match self.next_message().await? {
            Message::Text(text) => Ok(text.as_str().to_owned()),
            other => bail!("Expected a text frame, got {other:?}"),
        }
    }

    pub async fn next_status(&mut self) -> Result<StatusFrame> {
        let text = self.next_text().await?;
        text.parse()
            .with_context(|| format!("Not a status frame: {text}"))
    }

    /// Skips status frames until `status` arrives.
    pub async fn wait_for_status(&mut self, status: StatusFrame) -> Result<()> {
        loop {
            let frame = self.next_status().await?;
            if frame == status {
                return Ok(());
            }
            tracing::debug!("[WsClient] Skipping {}", frame);
        }
    }

    pub async fn send_offer(&mut self, sdp: &str, video_transform: &str) -> Result<()> {
        let request = NegotiationRequest::new(SessionDescription::offer(sdp), video_transform);
        self.send_text(serde_json::to_string(&request)?).await
    }

    pub async fn send_text(&mut self, text: String) -> Result<()> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .context("Failed to send frame")
    }

    pub async fn expect_answer(&mut self) -> Result<NegotiationResponse> {
        let text = self.next_text().await?;
        serde_json::from_str(&text).with_context(|| format!("Not an answer: {text}"))
    }

    /// Returns the code of the close frame, skipping any text before it.
    pub async fn expect_close(&mut self) -> Result<u16> {
        loop {
            match self.next_message().await? {
                Message::Close(Some(frame)) => return Ok(u16::from(frame.code)),
                Message::Close(None) => bail!("Close frame without a code"),
                Message::Text(_) => continue,
                other => bail!("Expected a close frame, got {other:?}"),
            }
        }
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await.context("Failed to close")
    }
}
