use crate::error::ConnectError;
use std::collections::HashMap;
use std::sync::Mutex;

pub const KEY_SERVER_ADDRESS: &str = "serverAddress";
pub const KEY_PASSPHRASE: &str = "passphrase";

/// Read-only view of the app's persistent settings. The connector only ever
/// reads the two connection keys; what backs the store is the app's concern.
pub trait ConfigStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

/// The two values a connection attempt needs, snapshotted from the store.
/// The passphrase is a credential: it travels in the handshake and must never
/// appear in logs or error messages.
#[derive(Clone)]
pub struct ConnectionConfig {
    pub server_address: String,
    pub passphrase: String,
}

impl ConnectionConfig {
    /// Reads and validates the connection settings. Fails with
    /// [`ConnectError::ConfigurationMissing`] when either value is absent or
    /// empty, before any network activity happens.
    pub fn load(store: &dyn ConfigStore) -> Result<Self, ConnectError> {
        let server_address = store.get(KEY_SERVER_ADDRESS).unwrap_or_default();
        let passphrase = store.get(KEY_PASSPHRASE).unwrap_or_default();
        if server_address.is_empty() || passphrase.is_empty() {
            return Err(ConnectError::ConfigurationMissing);
        }
        Ok(Self {
            server_address,
            passphrase,
        })
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("server_address", &self.server_address)
            .field("passphrase", &"<redacted>")
            .finish()
    }
}

/// In-memory [`ConfigStore`] for tests and the demo binary.
#[derive(Default)]
pub struct MemoryConfigStore {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, key: &str, value: &str) {
        self.values
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }
}

impl ConfigStore for MemoryConfigStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().unwrap().get(key).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_requires_both_values() {
        let store = MemoryConfigStore::new();
        assert!(matches!(
            ConnectionConfig::load(&store),
            Err(ConnectError::ConfigurationMissing)
        ));

        store.set(KEY_SERVER_ADDRESS, "https://relay.example.com");
        assert!(matches!(
            ConnectionConfig::load(&store),
            Err(ConnectError::ConfigurationMissing)
        ));

        store.set(KEY_PASSPHRASE, "hunter2");
        let config = ConnectionConfig::load(&store).unwrap();
        assert_eq!(config.server_address, "https://relay.example.com");
        assert_eq!(config.passphrase, "hunter2");
    }

    #[test]
    fn empty_values_count_as_missing() {
        let store = MemoryConfigStore::new();
        store.set(KEY_SERVER_ADDRESS, "https://relay.example.com");
        store.set(KEY_PASSPHRASE, "");
        assert!(matches!(
            ConnectionConfig::load(&store),
            Err(ConnectError::ConfigurationMissing)
        ));
    }

    #[test]
    fn debug_never_prints_the_passphrase() {
        let config = ConnectionConfig {
            server_address: "https://relay.example.com".into(),
            passphrase: "hunter2".into(),
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("hunter2"));
    }
}
