//! JSON-file-backed status registry
//!
//! Single source of truth for all services: a durable, pretty-printed JSON
//! document keyed by service id, mirrored into an in-memory map for reads.
//! The document is rewritten in full on every mutation, last writer wins;
//! sharing the file with a second process is unsupported.
//!
//! Every mutation persists to disk before committing to the cache, so a
//! failed durable write leaves reads at the pre-mutation value. Successful
//! mutations broadcast a snapshot of the full service set; the channel sync
//! driver subscribes to that instead of being called under the store lock,
//! which keeps slow network work out of the critical section.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tokio::sync::{Mutex, broadcast};
use tracing::warn;

use crate::service::{Service, ServiceId};

/// Storage errors
#[derive(Debug)]
pub enum StoreError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e)
    }
}

/// Broadcast after every successful mutation
#[derive(Clone, Debug)]
pub enum StoreEvent {
    /// Full snapshot of the service set after the mutation
    Refreshed { services: Vec<Service> },
}

struct Inner {
    path: PathBuf,
    cache: BTreeMap<ServiceId, Service>,
}

impl Inner {
    /// Write the staged map to disk; the cache is only committed by callers
    /// after this succeeds.
    fn persist(&self, staged: &BTreeMap<ServiceId, Service>) -> Result<(), StoreError> {
        let body = serde_json::to_string_pretty(staged)?;
        std::fs::write(&self.path, body)?;
        Ok(())
    }

    fn snapshot(&self) -> Vec<Service> {
        self.cache.values().cloned().collect()
    }
}

/// Thread-safe persistent registry of services
pub struct StatusStore {
    inner: Mutex<Inner>,
    events: broadcast::Sender<StoreEvent>,
}

impl StatusStore {
    /// Open the registry at `path`, creating an empty store file if none
    /// exists. Entries that fail to deserialize are skipped with a warning;
    /// an unreadable or unparsable file is fatal.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let mut cache = BTreeMap::new();

        if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let root: serde_json::Map<String, serde_json::Value> =
                serde_json::from_str(&content)?;
            for (id, value) in root {
                match serde_json::from_value::<Service>(value) {
                    Ok(service) => {
                        cache.insert(id, service);
                    }
                    Err(e) => {
                        warn!(service_id = %id, error = %e, "skipping unparsable store entry");
                    }
                }
            }
        } else {
            let empty: BTreeMap<ServiceId, Service> = BTreeMap::new();
            std::fs::write(&path, serde_json::to_string_pretty(&empty)?)?;
        }

        let (events, _) = broadcast::channel(16);
        Ok(Self {
            inner: Mutex::new(Inner { path, cache }),
            events,
        })
    }

    /// Subscribe to post-mutation snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    /// Insert or overwrite a service keyed by its id
    pub async fn add(&self, service: Service) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let mut staged = inner.cache.clone();
        staged.insert(service.service_id.clone(), service);
        inner.persist(&staged)?;
        inner.cache = staged;
        let snapshot = inner.snapshot();
        drop(inner);
        self.refresh(snapshot);
        Ok(())
    }

    /// Replace the status fields of an existing service. Silently a no-op
    /// when the id is unknown: no error, no creation, no re-render.
    pub async fn update(
        &self,
        service_id: &str,
        new_status: &str,
        new_description: &str,
        new_outage_description: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(existing) = inner.cache.get(service_id) else {
            return Ok(());
        };
        let updated =
            existing.with_updated_status(new_status, new_description, new_outage_description);
        let mut staged = inner.cache.clone();
        staged.insert(service_id.to_string(), updated);
        inner.persist(&staged)?;
        inner.cache = staged;
        let snapshot = inner.snapshot();
        drop(inner);
        self.refresh(snapshot);
        Ok(())
    }

    /// Delete a service. Idempotent; children keep their now-dangling
    /// `parent_id` and render standalone.
    pub async fn remove(&self, service_id: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        let mut staged = inner.cache.clone();
        staged.remove(service_id);
        inner.persist(&staged)?;
        inner.cache = staged;
        let snapshot = inner.snapshot();
        drop(inner);
        self.refresh(snapshot);
        Ok(())
    }

    pub async fn get(&self, service_id: &str) -> Option<Service> {
        self.inner.lock().await.cache.get(service_id).cloned()
    }

    /// All services, in stable id order
    pub async fn list(&self) -> Vec<Service> {
        self.inner.lock().await.snapshot()
    }

    fn refresh(&self, services: Vec<Service>) {
        // No subscribers is fine, e.g. in tests
        let _ = self.events.send(StoreEvent::Refreshed { services });
    }
}
