//! Publish configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PortpubError, PortpubResult};

/// Default number of ephemeral port probes per auto-published port.
pub const DEFAULT_PROBE_ATTEMPTS: u32 = 15;

/// Tunables for port publishing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Probes allowed when searching a free host port for one exposed port.
    pub probe_attempts: u32,
    /// Accept host port ranges ending at 65536.
    ///
    /// Older engines checked `host_port + range - 1 <= 65536`. The last port
    /// of such a range wraps to 0 and is then rejected during expansion.
    pub legacy_host_port_bound: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            probe_attempts: DEFAULT_PROBE_ATTEMPTS,
            legacy_host_port_bound: false,
        }
    }
}

impl PublishConfig {
    /// Set the probe budget.
    #[must_use]
    pub const fn with_probe_attempts(mut self, attempts: u32) -> Self {
        self.probe_attempts = attempts;
        self
    }

    /// Use the legacy host port bound.
    #[must_use]
    pub const fn with_legacy_host_port_bound(mut self) -> Self {
        self.legacy_host_port_bound = true;
        self
    }

    /// Highest value `host_port + range - 1` may reach.
    #[must_use]
    pub const fn host_port_ceiling(&self) -> u32 {
        if self.legacy_host_port_bound {
            65536
        } else {
            65535
        }
    }

    /// Check the configuration for values the allocator cannot work with.
    pub fn validate(&self) -> PortpubResult<()> {
        if self.probe_attempts == 0 {
            return Err(PortpubError::Config {
                message: "probe_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Parse from TOML.
    pub fn from_toml_str(content: &str) -> PortpubResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| PortpubError::Config {
            message: format!("Failed to parse TOML: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> PortpubResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        tracing::debug!(path = %path.display(), ?config, "Loaded publish configuration");
        Ok(config)
    }
}
