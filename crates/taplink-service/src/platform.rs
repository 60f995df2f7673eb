//! Platform integration boundary.
//!
//! The coordination engine never launches or kills software, plays sounds
//! or knows which reader drivers exist. It asks the [`Platform`] for all of
//! that.

use std::collections::BTreeMap;
use std::future::Future;

use taplink_readers::{AnyReader, ReaderInfo};

use crate::config::ServiceConfig;
use crate::error::Result;

/// Connected readers by id (`driver:path`), ordered for stable output.
pub type ReaderSnapshot = BTreeMap<String, ReaderInfo>;

/// Services the host platform provides to the engine.
///
/// Implementations must be cheap to call from the pre-processor loop; the
/// sound methods in particular should not block.
pub trait Platform: Send + Sync + 'static {
    /// Name of the launcher currently running software, if any.
    fn active_launcher(&self) -> Option<String>;

    /// Terminate the running software.
    ///
    /// # Errors
    ///
    /// Returns an error if the launcher could not be stopped. The engine
    /// logs it and carries on.
    fn kill_launcher(&self) -> impl Future<Output = Result<()>> + Send;

    fn play_success_sound(&self);

    fn play_fail_sound(&self);

    /// Fresh, unopened instances of every reader driver the platform
    /// supports. Called once per connection pass.
    fn supported_readers(&self, config: &ServiceConfig) -> Vec<AnyReader>;

    /// Receive the set of connected readers after each connection pass.
    ///
    /// # Errors
    ///
    /// An error aborts the connection pass and is reported by the
    /// connection manager.
    fn readers_update_hook(&self, readers: &ReaderSnapshot) -> Result<()>;
}
