//! Tokio/tungstenite implementation of the [`Transport`] seam.
//!
//! The factory spawns a background task that performs the websocket
//! handshake (with the passphrase as the `guid` query parameter) and then
//! forwards incoming frames over the event channel until the stream ends.

use crate::transport::{Endpoint, Transport, TransportEvent, TransportFactory};
use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Builds the websocket URL for an endpoint. Accepts http(s) addresses the
/// way the settings screen stores them and maps them onto ws(s); the guid
/// credential rides as a urlencoded query parameter.
fn connection_url(endpoint: &Endpoint) -> String {
    let base = endpoint.server_address.trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        base.to_string()
    };
    format!("{}/?guid={}", base, urlencoding::encode(&endpoint.guid))
}

pub struct WebSocketTransport {
    sink: Arc<Mutex<Option<WsSink>>>,
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn send(&self, frame: &[u8]) -> Result<(), anyhow::Error> {
        let mut guard = self.sink.lock().await;
        let sink = guard
            .as_mut()
            .ok_or_else(|| anyhow::anyhow!("socket is closed"))?;
        let text = std::str::from_utf8(frame)
            .map_err(|e| anyhow::anyhow!("frame is not valid UTF-8: {e}"))?;
        sink.send(Message::text(text.to_owned()))
            .await
            .map_err(|e| anyhow::anyhow!("websocket send error: {e}"))?;
        Ok(())
    }

    async fn disconnect(&self) {
        let mut guard = self.sink.lock().await;
        if let Some(mut sink) = guard.take() {
            let _ = sink.close().await;
        }
    }
}

/// Factory for tungstenite-backed transports.
#[derive(Default)]
pub struct WebSocketTransportFactory;

impl WebSocketTransportFactory {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TransportFactory for WebSocketTransportFactory {
    async fn create_transport(
        &self,
        endpoint: &Endpoint,
    ) -> Result<(Arc<dyn Transport>, mpsc::Receiver<TransportEvent>), anyhow::Error> {
        let (events_tx, events_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let sink_slot: Arc<Mutex<Option<WsSink>>> = Arc::new(Mutex::new(None));
        let transport = Arc::new(WebSocketTransport {
            sink: sink_slot.clone(),
        });

        let url = connection_url(endpoint);
        let server_address = endpoint.server_address.clone();
        tokio::spawn(async move {
            let ws = match connect_async(url.as_str()).await {
                Ok((ws, _response)) => ws,
                Err(e) => {
                    warn!(target: "Transport", "Websocket connect to {server_address} failed: {e}");
                    let _ = events_tx
                        .send(TransportEvent::ConnectFailed(e.to_string()))
                        .await;
                    return;
                }
            };
            info!(target: "Transport", "Websocket connected to {server_address}");

            let (sink, mut stream) = ws.split();
            *sink_slot.lock().await = Some(sink);
            if events_tx.send(TransportEvent::Connected).await.is_err() {
                return;
            }

            while let Some(message) = stream.next().await {
                let frame = match message {
                    Ok(Message::Text(text)) => Bytes::from(text.as_str().to_owned()),
                    Ok(Message::Binary(data)) => Bytes::from(data),
                    Ok(Message::Close(_)) => break,
                    // Ping/pong replies are handled inside tungstenite.
                    Ok(_) => continue,
                    Err(e) => {
                        warn!(target: "Transport", "Websocket read error: {e}");
                        break;
                    }
                };
                if events_tx
                    .send(TransportEvent::FrameReceived(frame))
                    .await
                    .is_err()
                {
                    break;
                }
            }

            *sink_slot.lock().await = None;
            let _ = events_tx.send(TransportEvent::Disconnected).await;
            debug!(target: "Transport", "Reader task for {server_address} finished");
        });

        Ok((transport, events_rx))
    }
}
