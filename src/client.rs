use crate::config::{ConfigStore, ConnectionConfig};
use crate::error::ConnectError;
use crate::transport::{Endpoint, Transport, TransportEvent, TransportFactory};
use crate::wire::AckFrame;
use log::{debug, info, warn};
use rand::RngCore;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, Notify, mpsc, oneshot, watch};

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection lifecycle. Transitions are driven only by transport events,
/// never set directly by callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Connector tunables.
#[derive(Debug, Clone)]
pub struct ConnectorOptions {
    /// How long a request waits for its acknowledgement before failing with
    /// [`RequestError::NoResponse`](crate::RequestError::NoResponse).
    pub request_timeout: Duration,
}

impl Default for ConnectorOptions {
    fn default() -> Self {
        Self {
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Owns one logical connection to the relay and the per-request waiter map
/// that pairs outbound events with their acknowledgements.
pub struct Connector {
    pub(crate) config_store: Arc<dyn ConfigStore>,
    pub(crate) transport_factory: Arc<dyn TransportFactory>,
    pub(crate) transport: Mutex<Option<Arc<dyn Transport>>>,
    pub(crate) response_waiters: Mutex<HashMap<String, oneshot::Sender<AckFrame>>>,
    pub(crate) request_timeout: Duration,
    pub(crate) unique_id: String,
    pub(crate) id_counter: AtomicU64,
    is_connecting: AtomicBool,
    expected_disconnect: AtomicBool,
    shutdown_notifier: Notify,
    state_tx: watch::Sender<ConnectionState>,
}

impl Connector {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        transport_factory: Arc<dyn TransportFactory>,
    ) -> Arc<Self> {
        Self::with_options(config_store, transport_factory, ConnectorOptions::default())
    }

    pub fn with_options(
        config_store: Arc<dyn ConfigStore>,
        transport_factory: Arc<dyn TransportFactory>,
        options: ConnectorOptions,
    ) -> Arc<Self> {
        let mut raw = [0u8; 4];
        rand::rng().fill_bytes(&mut raw);
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Arc::new(Self {
            config_store,
            transport_factory,
            transport: Mutex::new(None),
            response_waiters: Mutex::new(HashMap::new()),
            request_timeout: options.request_timeout,
            unique_id: hex::encode(raw),
            id_counter: AtomicU64::new(0),
            is_connecting: AtomicBool::new(false),
            expected_disconnect: AtomicBool::new(false),
            shutdown_notifier: Notify::new(),
            state_tx,
        })
    }

    pub fn state(&self) -> ConnectionState {
        *self.state_tx.borrow()
    }

    /// Watch channel over the connection state, for callers that want to
    /// observe transitions instead of polling.
    pub fn subscribe_state(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Generates a new unique request id string.
    pub(crate) fn generate_request_id(&self) -> String {
        let count = self.id_counter.fetch_add(1, Ordering::Relaxed);
        format!("{}-{}", self.unique_id, count)
    }

    /// Establishes the connection. Validates configuration first (failing
    /// with `ConfigurationMissing` before any network activity), then opens
    /// one transport and waits for exactly one of the three connection
    /// signals. On `ConnectFailed` during the initial attempt the half-open
    /// transport is torn down before the error surfaces, so it cannot keep
    /// retrying in the background.
    pub async fn connect(self: &Arc<Self>, initial_attempt: bool) -> Result<(), ConnectError> {
        if self.is_connecting.swap(true, Ordering::SeqCst) {
            return Err(ConnectError::ConnectInProgress);
        }
        let _guard = scopeguard::guard((), |_| {
            self.is_connecting.store(false, Ordering::Relaxed);
        });

        if self.is_connected() {
            return Err(ConnectError::AlreadyConnected);
        }

        let config = ConnectionConfig::load(self.config_store.as_ref())?;
        let endpoint = Endpoint {
            server_address: config.server_address,
            guid: config.passphrase,
        };

        self.state_tx.send_replace(ConnectionState::Connecting);
        let (transport, mut events) = match self.transport_factory.create_transport(&endpoint).await
        {
            Ok(pair) => pair,
            Err(e) => {
                self.state_tx.send_replace(ConnectionState::Disconnected);
                return Err(ConnectError::Transport(e));
            }
        };

        // Exactly one of Connected / ConnectFailed / Disconnected settles
        // this attempt.
        loop {
            match events.recv().await {
                Some(TransportEvent::Connected) => break,
                Some(TransportEvent::ConnectFailed(reason)) => {
                    if initial_attempt {
                        transport.disconnect().await;
                    }
                    self.state_tx.send_replace(ConnectionState::Disconnected);
                    return Err(ConnectError::ConnectionFailed(reason));
                }
                Some(TransportEvent::Disconnected) | None => {
                    self.state_tx.send_replace(ConnectionState::Disconnected);
                    return Err(ConnectError::ConnectionLost);
                }
                Some(TransportEvent::FrameReceived(_)) => {
                    debug!(target: "Connector", "Ignoring frame before connect settled");
                }
            }
        }

        info!(target: "Connector", "Connected to {}", endpoint.server_address);
        *self.transport.lock().await = Some(transport);
        self.expected_disconnect.store(false, Ordering::Relaxed);
        self.state_tx.send_replace(ConnectionState::Connected);

        let connector = self.clone();
        tokio::spawn(async move { connector.read_loop(events).await });

        Ok(())
    }

    /// Tears the connection down. Pending requests are failed with
    /// `ConnectionLost` rather than left to run out their timeouts.
    pub async fn disconnect(&self) {
        info!(target: "Connector", "Disconnecting.");
        self.expected_disconnect.store(true, Ordering::Relaxed);
        self.shutdown_notifier.notify_waiters();

        if let Some(transport) = self.transport.lock().await.take() {
            transport.disconnect().await;
        }
        self.cleanup_connection_state().await;
    }

    async fn cleanup_connection_state(&self) {
        *self.transport.lock().await = None;
        self.state_tx.send_replace(ConnectionState::Disconnected);

        // Dropping the senders wakes every pending caller with a channel
        // error, which the request layer maps to ConnectionLost.
        let waiters = std::mem::take(&mut *self.response_waiters.lock().await);
        if !waiters.is_empty() {
            debug!(target: "Connector", "Dropped {} pending request waiter(s)", waiters.len());
        }
    }

    /// Routes acknowledgement frames to their waiters until the transport
    /// disconnects or shutdown is signaled.
    async fn read_loop(self: Arc<Self>, mut events: mpsc::Receiver<TransportEvent>) {
        debug!(target: "Connector", "Starting acknowledgement routing loop");
        loop {
            tokio::select! {
                biased;
                _ = self.shutdown_notifier.notified() => {
                    debug!(target: "Connector", "Shutdown signaled, exiting routing loop");
                    return;
                }
                event = events.recv() => match event {
                    Some(TransportEvent::FrameReceived(frame)) => {
                        self.handle_frame(&frame).await;
                    }
                    Some(TransportEvent::Disconnected) | None => {
                        if !self.expected_disconnect.load(Ordering::Relaxed) {
                            warn!(target: "Connector", "Transport disconnected unexpectedly");
                        }
                        self.cleanup_connection_state().await;
                        return;
                    }
                    Some(TransportEvent::Connected) => {
                        debug!(target: "Connector", "Duplicate connected signal");
                    }
                    Some(TransportEvent::ConnectFailed(reason)) => {
                        warn!(target: "Connector", "Late connect failure: {reason}");
                    }
                }
            }
        }
    }

    async fn handle_frame(&self, frame: &[u8]) {
        let ack = match AckFrame::decode(frame) {
            Ok(ack) => ack,
            Err(e) => {
                warn!(target: "Connector", "Discarding undecodable frame: {e}");
                return;
            }
        };
        match self.response_waiters.lock().await.remove(&ack.id) {
            Some(waiter) => {
                let id = ack.id.clone();
                if waiter.send(ack).is_err() {
                    debug!(target: "Connector", "Ack receiver for {id} was dropped before delivery");
                }
            }
            None => {
                warn!(target: "Connector", "Ack with unknown id {}", ack.id);
            }
        }
    }
}
