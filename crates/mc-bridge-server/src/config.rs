use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use mc_bridge_inventory::ReconcilerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Deserialize)]
pub struct BridgeConfig {
    #[serde(default)]
    pub inventory: InventorySection,
    #[serde(default)]
    pub session: SessionSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Deserialize)]
pub struct InventorySection {
    /// Delay before accepting the server's correction of a rejected click, in ms.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    /// Number of fire-and-forget drop ids remembered for their acknowledgements.
    #[serde(default = "default_drop_ack_window")]
    pub drop_ack_window: usize,
}

fn default_retry_delay_ms() -> u64 {
    200
}

fn default_drop_ack_window() -> usize {
    32
}

impl Default for InventorySection {
    fn default() -> Self {
        Self {
            retry_delay_ms: default_retry_delay_ms(),
            drop_ack_window: default_drop_ack_window(),
        }
    }
}

impl InventorySection {
    pub fn reconciler_config(&self) -> ReconcilerConfig {
        ReconcilerConfig {
            retry_delay: Duration::from_millis(self.retry_delay_ms),
            drop_ack_window: self.drop_ack_window,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SessionSection {
    /// Capacity of the session event channel.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
}

fn default_event_buffer() -> usize {
    64
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            event_buffer: default_event_buffer(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoggingSection {
    pub level: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            inventory: InventorySection::default(),
            session: SessionSection::default(),
            logging: LoggingSection {
                level: "info".into(),
            },
        }
    }
}

impl BridgeConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&contents)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.session.event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "session.event_buffer must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_config() {
        let toml_str = r#"
            [inventory]
            retry_delay_ms = 50
            drop_ack_window = 8

            [session]
            event_buffer = 16

            [logging]
            level = "debug"
        "#;
        let config = BridgeConfig::parse(toml_str).unwrap();
        assert_eq!(config.inventory.retry_delay_ms, 50);
        assert_eq!(config.inventory.drop_ack_window, 8);
        assert_eq!(config.session.event_buffer, 16);
        assert_eq!(config.logging.level, "debug");

        let reconciler = config.inventory.reconciler_config();
        assert_eq!(reconciler.retry_delay, Duration::from_millis(50));
        assert_eq!(reconciler.drop_ack_window, 8);
    }

    #[test]
    fn sections_default_when_absent() {
        let config = BridgeConfig::parse("[logging]\nlevel = \"info\"\n").unwrap();
        assert_eq!(config.inventory.retry_delay_ms, 200);
        assert_eq!(config.inventory.drop_ack_window, 32);
        assert_eq!(config.session.event_buffer, 64);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let toml_str = r#"
            [inventory]
            retry_delay_ms = 10

            [logging]
            level = "warn"
        "#;
        let config = BridgeConfig::parse(toml_str).unwrap();
        assert_eq!(config.inventory.retry_delay_ms, 10);
        assert_eq!(config.inventory.drop_ack_window, 32);
    }

    #[test]
    fn logging_section_is_required() {
        assert!(matches!(
            BridgeConfig::parse("[session]\nevent_buffer = 4\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_event_buffer_is_rejected() {
        let toml_str = "[session]\nevent_buffer = 0\n[logging]\nlevel = \"info\"\n";
        assert!(matches!(
            BridgeConfig::parse(toml_str),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = BridgeConfig::load_or_default("definitely/not/here/bridge.toml").unwrap();
        assert_eq!(config.logging.level, "info");
        assert!(matches!(
            BridgeConfig::load("definitely/not/here/bridge.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
