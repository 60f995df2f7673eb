//! Reader registry and session state.
//!
//! The registry is the only state shared between the connection manager and
//! the scan pre-processor. Everything except the stop flag sits behind one
//! async mutex; the stop flag is a `watch` channel so that waiters wake as
//! soon as it is raised.

use std::collections::HashMap;
use std::sync::Arc;

use taplink_core::Token;
use taplink_readers::{AnyReader, Reader};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::platform::ReaderSnapshot;

#[derive(Default)]
struct RegistryState {
    readers: HashMap<String, AnyReader>,
    active_token: Option<Token>,
    software_token: Option<Token>,
    wrote_token: Option<Token>,
    last_scanned: Option<Token>,
}

/// Shared registry of open readers plus token session state.
///
/// Cloning is cheap; every clone refers to the same registry.
#[derive(Clone)]
pub struct ReaderRegistry {
    state: Arc<Mutex<RegistryState>>,
    stop: Arc<watch::Sender<bool>>,
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderRegistry {
    pub fn new() -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(RegistryState::default())),
            stop: Arc::new(stop),
        }
    }

    // ------------------------------------------------------------------
    // Readers
    // ------------------------------------------------------------------

    /// Register an opened reader under `id`.
    ///
    /// Returns the reader previously registered under the same id, if any.
    /// The caller owns it and is expected to close it.
    pub async fn insert_reader(&self, id: impl Into<String>, reader: AnyReader) -> Option<AnyReader> {
        let id = id.into();
        info!("Registered reader: {}", id);
        self.state.lock().await.readers.insert(id, reader)
    }

    pub async fn contains_reader(&self, id: &str) -> bool {
        self.state.lock().await.readers.contains_key(id)
    }

    /// Ids of all registered readers, sorted.
    pub async fn reader_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.state.lock().await.readers.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn reader_count(&self) -> usize {
        self.state.lock().await.readers.len()
    }

    /// Drop every reader that no longer reports itself connected.
    ///
    /// Liveness is read under the lock. [`Reader::connected`] answers from
    /// cached driver state, so this never waits on a device.
    ///
    /// Returns the ids of the pruned readers.
    pub async fn prune_disconnected(&self) -> Vec<String> {
        let mut state = self.state.lock().await;
        let dead: Vec<String> = state
            .readers
            .iter()
            .filter(|(_, reader)| !reader.connected())
            .map(|(id, _)| id.clone())
            .collect();

        for id in &dead {
            state.readers.remove(id);
            info!("Pruned disconnected reader: {}", id);
        }

        dead
    }

    /// Describe every registered reader.
    pub async fn snapshot(&self) -> ReaderSnapshot {
        self.state
            .lock()
            .await
            .readers
            .iter()
            .map(|(id, reader)| (id.clone(), reader.info()))
            .collect()
    }

    /// Close and drop every registered reader.
    ///
    /// Close failures are logged and counted, never propagated. Returns the
    /// number of readers that failed to close.
    pub async fn close_all(&self) -> usize {
        let readers = std::mem::take(&mut self.state.lock().await.readers);

        let mut failures = 0;
        for (id, mut reader) in readers {
            match reader.close().await {
                Ok(()) => debug!("Closed reader: {}", id),
                Err(e) => {
                    warn!("Error closing reader {}: {}", id, e);
                    failures += 1;
                }
            }
        }

        failures
    }

    // ------------------------------------------------------------------
    // Session state
    // ------------------------------------------------------------------

    /// Token currently present on a reader.
    pub async fn active_token(&self) -> Option<Token> {
        self.state.lock().await.active_token.clone()
    }

    pub async fn set_active_token(&self, token: Option<Token>) {
        self.state.lock().await.active_token = token;
    }

    /// Token whose launch started the running software.
    pub async fn software_token(&self) -> Option<Token> {
        self.state.lock().await.software_token.clone()
    }

    pub async fn set_software_token(&self, token: Option<Token>) {
        self.state.lock().await.software_token = token;
    }

    /// Token just written to a tag, whose echo scan must not launch.
    pub async fn wrote_token(&self) -> Option<Token> {
        self.state.lock().await.wrote_token.clone()
    }

    pub async fn set_wrote_token(&self, token: Option<Token>) {
        self.state.lock().await.wrote_token = token;
    }

    /// Clear the written token, returning what was there.
    pub async fn take_wrote_token(&self) -> Option<Token> {
        self.state.lock().await.wrote_token.take()
    }

    /// Most recent new token seen, kept after removal.
    pub async fn last_scanned(&self) -> Option<Token> {
        self.state.lock().await.last_scanned.clone()
    }

    pub async fn set_last_scanned(&self, token: Option<Token>) {
        self.state.lock().await.last_scanned = token;
    }

    // ------------------------------------------------------------------
    // Stop signal
    // ------------------------------------------------------------------

    /// Ask every service task to stop. Idempotent.
    pub fn request_stop(&self) {
        if !self.stop.send_replace(true) {
            info!("Stop requested");
        }
    }

    pub fn stop_requested(&self) -> bool {
        *self.stop.borrow()
    }

    /// Resolve once a stop has been requested.
    pub async fn stopped(&self) {
        let mut rx = self.stop.subscribe();
        // The sender lives in `self`, so this only errors if it is dropped.
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

impl std::fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReaderRegistry")
            .field("stop_requested", &self.stop_requested())
            .finish_non_exhaustive()
    }
}
