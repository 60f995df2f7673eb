//! Scan pre-processing loop.
//!
//! Merges the raw scan queue from every reader with the software
//! notification queue from the launcher and turns them into launch events:
//!
//! ```text
//! ┌──────────┐   scans    ┌──────────────────┐  launches  ┌──────────┐
//! │ Readers  │───────────►│                  │───────────►│ Launcher │
//! └──────────┘            │  ScanPreprocessor│            └────┬─────┘
//!                         │                  │◄────────────────┘
//!                         └────────┬─────────┘  software tokens
//!                                  │ removal
//!                                  ▼
//!                          ┌──────────────┐
//!                          │  Exit timer  │── kill + software: None
//!                          └──────────────┘
//! ```
//!
//! Consecutive identical tokens collapse into one transition. Removing a
//! token in hold mode schedules an exit of the running software, which a
//! reinsertion of the same token cancels.

use std::sync::Arc;
use std::time::Duration;

use taplink_core::constants::FAIL_FEEDBACK_WINDOW_MS;
use taplink_core::{Scan, ScanKind, Token};
use taplink_readers::ScanReceiver;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::SharedConfig;
use crate::exit_timer::ExitTimerSlot;
use crate::platform::Platform;
use crate::registry::ReaderRegistry;

/// Producer side of the software notification queue.
pub type SoftwareSender = mpsc::UnboundedSender<Option<Token>>;

/// Consumer side of the software notification queue.
pub type SoftwareReceiver = mpsc::UnboundedReceiver<Option<Token>>;

/// Rate limiter for failure feedback.
///
/// Feedback plays only if the previous error is older than the window.
/// Every error restarts the window, including suppressed ones.
#[derive(Debug)]
pub struct FailFeedback {
    window: Duration,
    last_error: Option<Instant>,
}

impl Default for FailFeedback {
    fn default() -> Self {
        Self::new(Duration::from_millis(FAIL_FEEDBACK_WINDOW_MS))
    }
}

impl FailFeedback {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_error: None,
        }
    }

    /// Record an error at `now`; returns whether feedback should play.
    pub fn record(&mut self, now: Instant) -> bool {
        let play = self
            .last_error
            .is_none_or(|last| now.saturating_duration_since(last) > self.window);
        self.last_error = Some(now);
        play
    }
}

/// The central event loop.
pub struct ScanPreprocessor<P> {
    platform: Arc<P>,
    config: SharedConfig,
    registry: ReaderRegistry,
    scans: ScanReceiver,
    software_rx: SoftwareReceiver,
    software_tx: SoftwareSender,
    launches: mpsc::Sender<Token>,
    prev_token: Option<Token>,
    exit_timer: ExitTimerSlot,
    fail_feedback: FailFeedback,
}

impl<P: Platform> ScanPreprocessor<P> {
    pub fn new(
        platform: Arc<P>,
        config: SharedConfig,
        registry: ReaderRegistry,
        scans: ScanReceiver,
        software: (SoftwareSender, SoftwareReceiver),
        launches: mpsc::Sender<Token>,
    ) -> Self {
        let (software_tx, software_rx) = software;
        Self {
            platform,
            config,
            registry,
            scans,
            software_rx,
            software_tx,
            launches,
            prev_token: None,
            exit_timer: ExitTimerSlot::new(),
            fail_feedback: FailFeedback::default(),
        }
    }

    /// Process events until a stop is requested or every input closes.
    ///
    /// A pending exit timer is cancelled on the way out.
    pub async fn run(mut self) {
        loop {
            tokio::select! {
                biased;

                _ = self.registry.stopped() => break,

                Some(scan) = self.scans.recv() => self.handle_scan(scan).await,

                Some(token) = self.software_rx.recv() => self.handle_software(token).await,

                else => break,
            }
        }

        if self.exit_timer.cancel() {
            debug!("Cancelled pending exit timer on shutdown");
        }
        debug!("Scan pre-processor stopped");
    }

    async fn handle_scan(&mut self, scan: Scan) {
        debug!("Pre-processing scan from {}: {:?}", scan.source, scan.kind);

        let token = match scan.kind {
            ScanKind::Inserted(token) => Some(token),
            ScanKind::Removed => None,
            ScanKind::Failed(message) => {
                error!("Error reading token from {}: {}", scan.source, message);
                if self.fail_feedback.record(Instant::now()) {
                    self.platform.play_fail_sound();
                }
                return;
            }
        };

        if Token::same(token.as_ref(), self.prev_token.as_ref()) {
            debug!("Ignoring duplicate scan");
            return;
        }

        self.prev_token = token.clone();

        match token {
            Some(token) => self.handle_inserted(token).await,
            None => self.handle_removed().await,
        }
    }

    async fn handle_inserted(&mut self, token: Token) {
        info!("New token scanned: {}", token);
        self.registry.set_active_token(Some(token.clone())).await;
        self.registry.set_last_scanned(Some(token.clone())).await;

        if !self.config.script_execution_enabled() {
            debug!("Skipping token, script execution disabled");
            return;
        }

        if self.exit_timer.cancel() {
            let software = self.registry.software_token().await;
            if Token::same(Some(&token), software.as_ref()) {
                info!("Same token reinserted, cancelling exit");
                return;
            }
            info!("New token inserted, restarting exit timer");
            self.start_timed_exit();
        }

        if self
            .registry
            .take_wrote_token()
            .await
            .is_some_and(|wrote| wrote == token)
        {
            info!("Skipping launch of just written token");
            return;
        }

        info!("Sending token: {}", token);
        self.platform.play_success_sound();

        tokio::select! {
            biased;

            _ = self.registry.stopped() => {
                debug!("Stop requested, dropping pending launch");
            }

            result = self.launches.send(token) => {
                if let Err(e) = result {
                    warn!("Launch queue closed, dropping token: {}", e.0);
                }
            }
        }
    }

    async fn handle_removed(&mut self) {
        info!("Token was removed");
        self.registry.set_active_token(None).await;

        if self.should_exit().await {
            self.start_timed_exit();
        }
    }

    async fn handle_software(&mut self, token: Option<Token>) {
        debug!("New software token: {:?}", token);

        let current = self.registry.software_token().await;
        if !Token::same(token.as_ref(), current.as_ref()) && self.exit_timer.cancel() {
            info!("Different software token started, cancelling exit");
        }

        self.registry.set_software_token(token).await;
    }

    /// Whether removing the token should schedule an exit.
    async fn should_exit(&self) -> bool {
        if !self.config.hold_mode_enabled() {
            return false;
        }

        // Nothing running, nothing to exit.
        let Some(launcher) = self.platform.active_launcher() else {
            return false;
        };

        if self
            .registry
            .last_scanned()
            .await
            .is_some_and(|token| token.remote)
        {
            return false;
        }

        if self.config.is_exit_blocked(&launcher) {
            debug!("Launcher {} is exit blocked", launcher);
            return false;
        }

        true
    }

    fn start_timed_exit(&mut self) {
        let delay = self.config.exit_delay();
        let platform = Arc::clone(&self.platform);
        let registry = self.registry.clone();
        let software_tx = self.software_tx.clone();

        self.exit_timer.start(delay, async move {
            exit_software(platform.as_ref(), &registry, &software_tx).await;
        });
    }
}

/// Exit timer action: stop the running software and clear the software
/// token through the notification queue.
async fn exit_software<P: Platform>(
    platform: &P,
    registry: &ReaderRegistry,
    software_tx: &SoftwareSender,
) {
    if platform.active_launcher().is_none() || registry.software_token().await.is_none() {
        debug!("No active launcher, not exiting");
        return;
    }

    info!("Exiting software");
    if let Err(e) = platform.kill_launcher().await {
        warn!("Error killing launcher: {}", e);
    }

    if software_tx.send(None).is_err() {
        debug!("Software queue closed after exit");
    }
}
