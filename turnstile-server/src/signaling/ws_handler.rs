use crate::gateway::Gateway;
use crate::signaling::{InboundSignal, OutboundSignal, SignalLink};
use axum::extract::ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use turnstile_core::ClientId;

const INBOUND_BUFFER: usize = 16;
const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    State(gateway): State<Gateway>,
) -> impl IntoResponse {
    let address = client_address(&headers, remote);

    ws.on_upgrade(move |socket| handle_socket(socket, address, gateway))
}

/// `X-Forwarded-For` when a proxy set it, else the socket peer.
fn client_address(headers: &HeaderMap, remote: SocketAddr) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| remote.ip().to_string())
}

async fn handle_socket(socket: WebSocket, address: String, gateway: Gateway) {
    let id = ClientId::new();
    info!(client = %id, %address, "New WebSocket connection");

    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<OutboundSignal>();
    let (inbound_tx, inbound_rx) = mpsc::channel::<InboundSignal>(INBOUND_BUFFER);

    let mut send_task = tokio::spawn(async move {
        while let Some(signal) = outbound_rx.recv().await {
            let (msg, last) = match to_message(signal) {
                Ok(converted) => converted,
                Err(e) => {
                    error!("Failed to serialize answer frame: {}", e);
                    continue;
                }
            };
            if sender.send(msg).await.is_err() || last {
                break;
            }
        }
    });

    let recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let signal = match msg {
                Ok(Message::Text(text)) => InboundSignal::Text(text.to_string()),
                Ok(Message::Binary(_)) => InboundSignal::Binary,
                Ok(Message::Close(frame)) => close_signal(frame),
                Ok(_) => continue,
                Err(e) => InboundSignal::Error(e.to_string()),
            };

            let stop = matches!(signal, InboundSignal::Closed | InboundSignal::Error(_));
            if inbound_tx.send(signal).await.is_err() || stop {
                break;
            }
        }
    });

    let link = SignalLink::new(id, address, inbound_rx, outbound_tx);
    let exit = gateway.accept(link).await;

    // The link is gone, so the send task ends once the queued frames are out.
    if tokio::time::timeout(FLUSH_TIMEOUT, &mut send_task)
        .await
        .is_err()
    {
        warn!(client = %id, "Timed out flushing frames");
        send_task.abort();
    }
    recv_task.abort();

    info!(client = %id, ?exit, "WebSocket disconnected");
}

/// Returns the frame and whether it is the last one for this socket.
fn to_message(signal: OutboundSignal) -> serde_json::Result<(Message, bool)> {
    let converted = match signal {
        OutboundSignal::Status(frame) => (Message::Text(frame.to_string().into()), false),
        OutboundSignal::Answer(response) => (Message::Text(response.to_json()?.into()), false),
        OutboundSignal::Close(reason) => (
            Message::Close(Some(CloseFrame {
                code: reason.code(),
                reason: Utf8Bytes::from_static(reason.reason()),
            })),
            true,
        ),
    };
    Ok(converted)
}

/// 1000 and 1001 count as a clean close, anything else as an error.
fn close_signal(frame: Option<CloseFrame>) -> InboundSignal {
    match frame {
        None => InboundSignal::Closed,
        Some(frame) if matches!(frame.code, 1000 | 1001) => InboundSignal::Closed,
        Some(frame) => InboundSignal::Error(format!(
            "closed with code {}: {}",
            frame.code,
            frame.reason.as_str()
        )),
    }
}
