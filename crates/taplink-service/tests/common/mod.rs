//! Shared fixtures for service integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use taplink_core::{Scan, Token};
use taplink_readers::AnyReader;
use taplink_service::{
    Platform, ReaderSnapshot, Result, ServiceConfig, ServiceError, ServiceHandle, SharedConfig,
    TokenService,
};
use tokio::task::JoinHandle;

/// Id used for scans injected by tests.
pub const TEST_READER: &str = "mock:test";

#[derive(Debug, Default)]
struct Recorded {
    active_launcher: Option<String>,
    kills: usize,
    kill_error: Option<String>,
    success_sounds: usize,
    fail_sounds: usize,
    readers: Vec<AnyReader>,
    snapshots: Vec<ReaderSnapshot>,
    hook_error: Option<String>,
}

/// Platform that records every call.
///
/// `supported_readers` hands out clones of the registered readers, so mock
/// readers keep sharing state with their test handles.
#[derive(Debug, Default)]
pub struct TestPlatform {
    inner: Mutex<Recorded>,
}

impl TestPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_launcher(self, launcher: &str) -> Self {
        self.set_active_launcher(Some(launcher));
        self
    }

    pub fn with_reader(self, reader: impl Into<AnyReader>) -> Self {
        self.inner.lock().readers.push(reader.into());
        self
    }

    pub fn set_active_launcher(&self, launcher: Option<&str>) {
        self.inner.lock().active_launcher = launcher.map(str::to_string);
    }

    pub fn fail_kills(&self, message: &str) {
        self.inner.lock().kill_error = Some(message.to_string());
    }

    pub fn fail_hook(&self, message: &str) {
        self.inner.lock().hook_error = Some(message.to_string());
    }

    pub fn kills(&self) -> usize {
        self.inner.lock().kills
    }

    pub fn success_sounds(&self) -> usize {
        self.inner.lock().success_sounds
    }

    pub fn fail_sounds(&self) -> usize {
        self.inner.lock().fail_sounds
    }

    pub fn last_snapshot(&self) -> Option<ReaderSnapshot> {
        self.inner.lock().snapshots.last().cloned()
    }

    pub fn hook_calls(&self) -> usize {
        self.inner.lock().snapshots.len()
    }
}

impl Platform for TestPlatform {
    fn active_launcher(&self) -> Option<String> {
        self.inner.lock().active_launcher.clone()
    }

    async fn kill_launcher(&self) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.kills += 1;
        match inner.kill_error.clone() {
            Some(message) => Err(ServiceError::platform(message)),
            None => {
                inner.active_launcher = None;
                Ok(())
            }
        }
    }

    fn play_success_sound(&self) {
        self.inner.lock().success_sounds += 1;
    }

    fn play_fail_sound(&self) {
        self.inner.lock().fail_sounds += 1;
    }

    fn supported_readers(&self, _config: &ServiceConfig) -> Vec<AnyReader> {
        self.inner
            .lock()
            .readers
            .iter()
            .filter_map(|reader| match reader {
                AnyReader::Mock(mock) => Some(AnyReader::Mock(mock.clone())),
                _ => None,
            })
            .collect()
    }

    fn readers_update_hook(&self, readers: &ReaderSnapshot) -> Result<()> {
        let mut inner = self.inner.lock();
        inner.snapshots.push(readers.clone());
        match &inner.hook_error {
            Some(message) => Err(ServiceError::readers_hook(message.clone())),
            None => Ok(()),
        }
    }
}

/// A running service plus the handles tests drive it with.
pub struct Harness {
    pub platform: Arc<TestPlatform>,
    pub config: SharedConfig,
    pub handle: ServiceHandle,
    pub task: JoinHandle<()>,
}

impl Harness {
    /// Start a service. Must be called inside a Tokio runtime.
    pub fn start(platform: TestPlatform, config: ServiceConfig) -> Self {
        let platform = Arc::new(platform);
        let config = SharedConfig::new(config);
        let (service, handle) = TokenService::new(Arc::clone(&platform), config.clone());
        let task = tokio::spawn(service.run());

        Self {
            platform,
            config,
            handle,
            task,
        }
    }

    pub fn insert(&self, token: &Token) {
        assert!(
            self.handle
                .inject_scan(Scan::inserted(TEST_READER, token.clone()))
        );
    }

    pub fn remove(&self) {
        assert!(self.handle.inject_scan(Scan::removed(TEST_READER)));
    }

    pub fn fail(&self, message: &str) {
        assert!(self.handle.inject_scan(Scan::failed(TEST_READER, message)));
    }

    /// Drain every launch received so far.
    pub fn launches(&mut self) -> Vec<Token> {
        let mut launches = Vec::new();
        while let Some(token) = self.handle.try_recv_launch() {
            launches.push(token);
        }
        launches
    }

    pub async fn stop(self) {
        self.handle.shutdown();
        tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("service did not stop")
            .expect("service task panicked");
    }
}

pub fn token(uid: &str) -> Token {
    Token::new(uid, "").unwrap()
}

/// Let every ready task run. Under a paused clock this also advances time
/// by `ms`.
pub async fn settle_for(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

pub async fn settle() {
    settle_for(10).await;
}
