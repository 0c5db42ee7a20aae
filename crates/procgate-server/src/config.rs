//! Gateway configuration, loaded from YAML.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// HTTP listen port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// The pm2 binary to drive. A bare name is resolved through PATH.
    #[serde(default = "default_pm2_bin")]
    pub pm2_bin: String,

    /// Bound on any single external command (manager CLI, git, log tail).
    #[serde(default = "default_command_timeout", with = "duration_serde")]
    pub command_timeout: Duration,

    /// Log lines returned when the caller does not pass `?lines=`.
    #[serde(default = "default_log_lines")]
    pub default_log_lines: usize,

    /// Log lines fetched by the update workflow's terminal tail stage.
    #[serde(default = "default_update_log_lines")]
    pub update_log_lines: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            pm2_bin: default_pm2_bin(),
            command_timeout: default_command_timeout(),
            default_log_lines: default_log_lines(),
            update_log_lines: default_update_log_lines(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from a YAML file.
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        Self::load_from_string(&content)
    }

    /// Load configuration from a YAML string.
    pub fn load_from_string(content: &str) -> Result<Self> {
        let config: GatewayConfig =
            serde_yaml::from_str(content).context("Failed to parse YAML configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// One-line description for startup logging.
    pub fn describe(&self) -> String {
        format!(
            "port={} pm2_bin={} command_timeout={:?}",
            self.port, self.pm2_bin, self.command_timeout
        )
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            anyhow::bail!("port must be non-zero");
        }
        if self.pm2_bin.trim().is_empty() {
            anyhow::bail!("pm2_bin must not be empty");
        }
        if self.command_timeout.is_zero() {
            anyhow::bail!("command_timeout must be positive");
        }
        if self.default_log_lines == 0 {
            anyhow::bail!("default_log_lines must be positive");
        }
        if self.update_log_lines == 0 {
            anyhow::bail!("update_log_lines must be positive");
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    9615
}

fn default_pm2_bin() -> String {
    "pm2".to_string()
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_log_lines() -> usize {
    30
}

fn default_update_log_lines() -> usize {
    10
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&format!("{}s", duration.as_secs()))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_duration(&s).map_err(serde::de::Error::custom)
    }

    // "ms" must be checked before "s" since it ends with 's'.
    fn parse_duration(s: &str) -> Result<Duration, String> {
        let invalid = |_| format!("Invalid duration: {}", s);
        if let Some(num) = s.strip_suffix("ms") {
            Ok(Duration::from_millis(num.parse().map_err(invalid)?))
        } else if let Some(num) = s.strip_suffix('s') {
            Ok(Duration::from_secs(num.parse().map_err(invalid)?))
        } else {
            // Bare number of seconds.
            Ok(Duration::from_secs(s.parse().map_err(invalid)?))
        }
    }
}
