//! Daemon configuration management

use crate::usb::{DetectionPolicy, DetectionStrategy, DeviceFilter};
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DaemonConfig {
    #[serde(default)]
    pub daemon: DaemonSettings,
    #[serde(default)]
    pub detection: DetectionSettings,
    #[serde(default)]
    pub helper: HelperSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSettings {
    /// Control-socket path; a leading tilde is expanded when binding
    #[serde(default = "DaemonSettings::default_socket_path")]
    pub socket_path: String,
    /// Emit systemd readiness and watchdog notifications
    #[serde(default)]
    pub service_mode: bool,
    #[serde(default = "DaemonSettings::default_log_level")]
    pub log_level: String,
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            socket_path: Self::default_socket_path(),
            service_mode: false,
            log_level: Self::default_log_level(),
        }
    }
}

impl DaemonSettings {
    fn default_socket_path() -> String {
        common::DEFAULT_SOCKET_PATH.to_string()
    }

    fn default_log_level() -> String {
        "info".to_string()
    }
}

/// Phone-presence detection configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DetectionSettings {
    /// Decision procedure for detect calls
    #[serde(default)]
    pub strategy: DetectionStrategy,
    /// VID:PID patterns consulted by the id-allowlist strategy
    /// (e.g., "0x18d1:*" for any device from one vendor)
    #[serde(default)]
    pub allowlist: Vec<String>,
}

/// Helper bridge configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HelperSettings {
    /// Bridge executable; a bare name resolves through the fixed PATH the
    /// helper runs under
    #[serde(default = "HelperSettings::default_program")]
    pub program: String,
    /// Handset directory that transfers push into and pull from
    #[serde(default = "HelperSettings::default_remote_dir")]
    pub remote_dir: String,
}

impl Default for HelperSettings {
    fn default() -> Self {
        Self {
            program: Self::default_program(),
            remote_dir: Self::default_remote_dir(),
        }
    }
}

impl HelperSettings {
    fn default_program() -> String {
        "adb".to_string()
    }

    fn default_remote_dir() -> String {
        "/sdcard/".to_string()
    }
}

impl DaemonConfig {
    /// Load configuration from the specified path
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            // Try standard locations in order
            let candidates = vec![Self::default_path(), PathBuf::from("/etc/mobdev/daemon.toml")];

            candidates
                .into_iter()
                .find(|p| p.exists())
                .ok_or_else(|| anyhow!("No configuration file found, using defaults"))?
        };

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: DaemonConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;

        config.validate()?;

        tracing::info!("Loaded configuration from: {}", config_path.display());
        Ok(config)
    }

    /// Load configuration or return defaults if not found
    pub fn load_or_default() -> Self {
        match Self::load(None) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config: {}, using defaults", e);
                Self::default()
            }
        }
    }

    /// Save configuration to the specified path
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::info!("Saved configuration to: {}", path.display());
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("mobdev").join("daemon.toml")
        } else {
            PathBuf::from(".config/mobdev/daemon.toml")
        }
    }

    /// Control-socket path with the tilde expanded
    pub fn socket_path(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.daemon.socket_path).as_ref())
    }

    /// Build the detection policy this configuration selects
    ///
    /// Allowlist patterns are re-parsed here; `validate` has already
    /// rejected configurations where that can fail.
    pub fn detection_policy(&self) -> Result<DetectionPolicy> {
        match self.detection.strategy {
            DetectionStrategy::ClassHeuristic => Ok(DetectionPolicy::ClassHeuristic),
            DetectionStrategy::IdAllowlist => {
                let filters = self
                    .detection
                    .allowlist
                    .iter()
                    .map(|pattern| DeviceFilter::parse(pattern))
                    .collect::<Result<Vec<_>>>()?;
                Ok(DetectionPolicy::IdAllowlist(filters))
            }
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        // Validate log level
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.daemon.log_level.as_str()) {
            return Err(anyhow!(
                "Invalid log level '{}', must be one of: {}",
                self.daemon.log_level,
                valid_levels.join(", ")
            ));
        }

        if self.daemon.socket_path.is_empty() {
            return Err(anyhow!("Socket path must not be empty"));
        }

        // Validate allowlist patterns (VID:PID format)
        for pattern in &self.detection.allowlist {
            DeviceFilter::parse(pattern)
                .with_context(|| format!("Invalid detection allowlist entry '{}'", pattern))?;
        }

        // An id-allowlist strategy with nothing listed would never detect
        // anything; reject it instead of silently going blind.
        if self.detection.strategy == DetectionStrategy::IdAllowlist
            && self.detection.allowlist.is_empty()
        {
            return Err(anyhow!(
                "Detection strategy 'id-allowlist' requires at least one allowlist pattern"
            ));
        }

        if self.helper.program.is_empty() {
            return Err(anyhow!("Helper program must not be empty"));
        }

        if self.helper.remote_dir.is_empty() {
            return Err(anyhow!("Helper remote directory must not be empty"));
        }

        Ok(())
    }
}
