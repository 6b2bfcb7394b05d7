//! Session state persistence
//!
//! One durable slot holds the whole `SessionState` as compact JSON and is
//! overwritten on every mutation. Backends only move the record text;
//! encoding and the tolerant load live here.

use crate::models::SessionState;
use crate::Result;
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

pub mod file;
pub mod postgres;

pub use file::FileSessionStore;
pub use postgres::PostgresSessionStore;

/// Well-known key of the durable slot
pub const SLOT_KEY: &str = "moneyCommanderState";

/// Trait for the durable session slot
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn read_record(&self) -> Result<Option<String>>;
    async fn write_record(&self, record: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;

    /// Load the stored session. A missing, unreadable or malformed record
    /// yields `None` so the caller can fall back to a fresh session.
    async fn load(&self) -> Option<SessionState> {
        let record = match self.read_record().await {
            Ok(Some(record)) => record,
            Ok(None) => {
                debug!("No stored session; starting fresh");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Could not read stored session; starting fresh");
                return None;
            }
        };

        match decode_record(&record) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(error = %e, "Stored session is malformed; starting fresh");
                None
            }
        }
    }

    /// Overwrite the slot with `state` (last write wins).
    async fn save(&self, state: &SessionState) -> Result<()> {
        let record = encode_record(state)?;
        self.write_record(&record).await
    }
}

pub fn encode_record(state: &SessionState) -> Result<String> {
    Ok(serde_json::to_string(state)?)
}

pub fn decode_record(record: &str) -> Result<SessionState> {
    Ok(serde_json::from_str(record)?)
}

/// SHA-256 of the durable record, hex encoded.
/// Streams the JSON straight into the hasher.
pub fn record_digest(state: &SessionState) -> String {
    let mut hasher = Sha256::new();

    if serde_json::to_writer(&mut HashWriter(&mut hasher), state).is_err() {
        return String::new();
    }

    hex::encode(hasher.finalize())
}

/// Adapter to allow writing into Sha256 via std::io::Write
struct HashWriter<'a, H: Digest>(&'a mut H);

impl<'a, H: Digest> Write for HashWriter<'a, H> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.update(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Pick the durable backend: Postgres when a database URL is configured,
/// otherwise the JSON file at `path`.
pub fn build_store(database_url: Option<&str>, path: &Path) -> Arc<dyn SessionStore> {
    if let Some(url) = database_url {
        match PostgresSessionStore::connect_lazy(url) {
            Ok(store) => {
                info!("Session slot backend: postgres");
                return Arc::new(store);
            }
            Err(error) => {
                warn!(
                    "Failed to initialize postgres session slot, falling back to file: {}",
                    error
                );
            }
        }
    }

    info!(path = %path.display(), "Session slot backend: file");
    Arc::new(FileSessionStore::new(path))
}

/// In-memory slot for development and tests
#[derive(Default)]
pub struct InMemorySessionStore {
    slots: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn read_record(&self) -> Result<Option<String>> {
        let slots = self.slots.read().await;
        Ok(slots.get(SLOT_KEY).cloned())
    }

    async fn write_record(&self, record: &str) -> Result<()> {
        let mut slots = self.slots.write().await;
        slots.insert(SLOT_KEY.to_string(), record.to_string());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut slots = self.slots.write().await;
        slots.remove(SLOT_KEY);
        Ok(())
    }
}
