//! Service orchestration.
//!
//! [`TokenService`] wires the connection manager and the scan pre-processor
//! to one registry and one set of queues. The launcher side talks to the
//! running service through a [`ServiceHandle`].
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use taplink_service::{ServiceConfig, SharedConfig, TokenService};
//! # use taplink_service::platform::{Platform, ReaderSnapshot};
//! # use taplink_readers::AnyReader;
//! # struct MyPlatform;
//! # impl Platform for MyPlatform {
//! #     fn active_launcher(&self) -> Option<String> { None }
//! #     async fn kill_launcher(&self) -> taplink_service::Result<()> { Ok(()) }
//! #     fn play_success_sound(&self) {}
//! #     fn play_fail_sound(&self) {}
//! #     fn supported_readers(&self, _: &ServiceConfig) -> Vec<AnyReader> { Vec::new() }
//! #     fn readers_update_hook(&self, _: &ReaderSnapshot) -> taplink_service::Result<()> { Ok(()) }
//! # }
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = SharedConfig::new(ServiceConfig::default().hold_mode(true));
//!     let (service, mut handle) = TokenService::new(Arc::new(MyPlatform), config);
//!     let running = tokio::spawn(service.run());
//!
//!     while let Some(token) = handle.recv_launch().await {
//!         println!("launch {}", token);
//!         handle.notify_software(Some(token));
//!     }
//!
//!     handle.shutdown();
//!     running.await.unwrap();
//! }
//! ```

use std::sync::Arc;

use taplink_core::constants::LAUNCH_QUEUE_CAPACITY;
use taplink_core::{Scan, Token};
use taplink_readers::{ScanReceiver, ScanSender};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::SharedConfig;
use crate::connection::ConnectionManager;
use crate::platform::Platform;
use crate::preprocessor::{ScanPreprocessor, SoftwareReceiver, SoftwareSender};
use crate::registry::ReaderRegistry;

/// The reader/token coordination engine, ready to run.
pub struct TokenService<P> {
    platform: Arc<P>,
    config: SharedConfig,
    registry: ReaderRegistry,
    scans: (ScanSender, ScanReceiver),
    software: (SoftwareSender, SoftwareReceiver),
    launches: mpsc::Sender<Token>,
}

impl<P: Platform> TokenService<P> {
    /// Create the service and the handle used to talk to it.
    pub fn new(platform: Arc<P>, config: SharedConfig) -> (Self, ServiceHandle) {
        let registry = ReaderRegistry::new();
        let (scan_tx, scan_rx) = mpsc::unbounded_channel();
        let (software_tx, software_rx) = mpsc::unbounded_channel();
        let (launch_tx, launch_rx) = mpsc::channel(LAUNCH_QUEUE_CAPACITY);

        let handle = ServiceHandle {
            registry: registry.clone(),
            scans: scan_tx.clone(),
            software: software_tx.clone(),
            launches: launch_rx,
        };

        let service = Self {
            platform,
            config,
            registry,
            scans: (scan_tx, scan_rx),
            software: (software_tx, software_rx),
            launches: launch_tx,
        };

        (service, handle)
    }

    pub fn registry(&self) -> &ReaderRegistry {
        &self.registry
    }

    /// Run until a stop is requested, then close every reader.
    pub async fn run(self) {
        let (scan_tx, scan_rx) = self.scans;

        let manager = ConnectionManager::new(
            Arc::clone(&self.platform),
            self.config.clone(),
            self.registry.clone(),
            scan_tx,
        );
        let manager_task = tokio::spawn(manager.run());

        info!("Token service started");

        let preprocessor = ScanPreprocessor::new(
            self.platform,
            self.config,
            self.registry.clone(),
            scan_rx,
            self.software,
            self.launches,
        );
        preprocessor.run().await;

        // The pre-processor also ends when its inputs close.
        self.registry.request_stop();

        match manager_task.await {
            Ok(()) => debug!("Connection manager stopped"),
            Err(e) if e.is_cancelled() => debug!("Connection manager cancelled"),
            Err(e) => error!("Connection manager panicked: {}", e),
        }

        let failures = self.registry.close_all().await;
        if failures > 0 {
            warn!("Failed to close {} reader(s)", failures);
        }

        info!("Token service stopped");
    }
}

/// Launcher-side handle to a running [`TokenService`].
#[derive(Debug)]
pub struct ServiceHandle {
    registry: ReaderRegistry,
    scans: ScanSender,
    software: SoftwareSender,
    launches: mpsc::Receiver<Token>,
}

impl ServiceHandle {
    /// Wait for the next accepted token.
    ///
    /// Returns `None` once the service has stopped and every queued launch
    /// has been received.
    pub async fn recv_launch(&mut self) -> Option<Token> {
        self.launches.recv().await
    }

    pub fn try_recv_launch(&mut self) -> Option<Token> {
        self.launches.try_recv().ok()
    }

    /// Report which token started the running software, or `None` when
    /// the software exited.
    pub fn notify_software(&self, token: Option<Token>) {
        if self.software.send(token).is_err() {
            debug!("Software notification dropped, service stopped");
        }
    }

    /// Push a scan as if a reader produced it, e.g. a remote token.
    pub fn inject_scan(&self, scan: Scan) -> bool {
        self.scans.send(scan).is_ok()
    }

    /// Sender for the raw scan queue.
    pub fn scan_sender(&self) -> ScanSender {
        self.scans.clone()
    }

    pub fn registry(&self) -> &ReaderRegistry {
        &self.registry
    }

    /// Ask the service to stop. [`TokenService::run`] returns once every
    /// reader has been closed.
    pub fn shutdown(&self) {
        self.registry.request_stop();
    }
}
