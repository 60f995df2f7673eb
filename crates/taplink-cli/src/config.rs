//! Configuration file loading.

use std::path::Path;

use anyhow::Context;
use taplink_service::ServiceConfig;
use tracing::info;

/// Load a TOML configuration file.
///
/// A missing file is not an error: the defaults are used instead. The
/// loaded configuration is validated before it is returned.
pub fn load(path: &Path) -> anyhow::Result<ServiceConfig> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: ServiceConfig = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        info!("Loaded config from {}", path.display());
        config
    } else {
        info!("Config file {} not found, using defaults", path.display());
        ServiceConfig::default()
    };

    config
        .validate()
        .with_context(|| format!("invalid config file {}", path.display()))?;

    Ok(config)
}
