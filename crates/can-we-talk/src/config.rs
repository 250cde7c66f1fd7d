//! Application configuration
//!
//! Layered from an optional TOML file and `CAN_WE_TALK__*` environment
//! variables; command-line flags are applied on top by the caller.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use obd_protocol::{AdapterKind, SessionConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "CAN_WE_TALK";

/// Bus adapter selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Adapter kind
    pub adapter: AdapterKind,
    /// Channel / interface name
    pub channel: String,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            adapter: AdapterKind::SocketCan,
            channel: "can0".to_string(),
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub bus: BusConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    /// Load from an optional file plus the environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(environment());
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        builder.build()?.try_deserialize()
    }

    /// Apply command-line flags; a flag wins over file and environment
    pub fn apply_overrides(&mut self, overrides: CliOverrides) {
        if let Some(adapter) = overrides.adapter {
            self.bus.adapter = adapter;
        }
        if let Some(channel) = overrides.channel {
            self.bus.channel = channel;
        }
        if let Some(timeout_ms) = overrides.timeout_ms {
            self.session.timeout_ms = timeout_ms;
        }
    }
}

/// Settings given on the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub adapter: Option<AdapterKind>,
    pub channel: Option<String>,
    pub timeout_ms: Option<u64>,
}

/// `CAN_WE_TALK__SECTION__KEY` variables, e.g. `CAN_WE_TALK__BUS__CHANNEL=vcan0`
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::{FileFormat, Map};
    use obd_protocol::Addressing;

    fn parse(toml: &str) -> AppConfig {
        let builder = Config::builder().add_source(File::from_str(toml, FileFormat::Toml));
        AppConfig::from_builder(builder).unwrap()
    }

    #[test]
    fn test_defaults() {
        let config = parse("");
        assert_eq!(config.bus.adapter, AdapterKind::SocketCan);
        assert_eq!(config.bus.channel, "can0");
        assert_eq!(config.session.timeout_ms, 1000);
        assert_eq!(config.session.addressing, Addressing::Functional);
        assert_eq!(config.session.settle_ms, 0);
    }

    #[test]
    fn test_file_values() {
        let config = parse(
            r#"
            [bus]
            adapter = "virtual"
            channel = "vcan0"

            [session]
            timeout_ms = 250

            [session.addressing]
            mode = "physical"
            ecu = 1
            "#,
        );
        assert_eq!(config.bus.adapter, AdapterKind::Virtual);
        assert_eq!(config.bus.channel, "vcan0");
        assert_eq!(config.session.timeout_ms, 250);
        assert_eq!(config.session.addressing, Addressing::Physical { ecu: 1 });
    }

    #[test]
    fn test_environment_overrides_file() {
        let vars: Map<String, String> = [
            ("CAN_WE_TALK__SESSION__TIMEOUT_MS", "250"),
            ("CAN_WE_TALK__BUS__ADAPTER", "virtual"),
            ("OTHER_TOOL__BUS__CHANNEL", "can9"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let builder = Config::builder()
            .add_source(File::from_str(
                "[session]\ntimeout_ms = 900\n[bus]\nchannel = \"vcan0\"\n",
                FileFormat::Toml,
            ))
            .add_source(environment().source(Some(vars)));
        let config = AppConfig::from_builder(builder).unwrap();

        assert_eq!(config.session.timeout_ms, 250);
        assert_eq!(config.bus.adapter, AdapterKind::Virtual);
        assert_eq!(config.bus.channel, "vcan0");
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = parse("[bus]\nadapter = \"virtual\"\nchannel = \"vcan0\"\n");
        config.apply_overrides(CliOverrides {
            adapter: Some(AdapterKind::SocketCan),
            channel: None,
            timeout_ms: Some(40),
        });
        assert_eq!(config.bus.adapter, AdapterKind::SocketCan);
        assert_eq!(config.bus.channel, "vcan0");
        assert_eq!(config.session.timeout_ms, 40);

        let before = config.clone();
        config.apply_overrides(CliOverrides::default());
        assert_eq!(config.bus.channel, before.bus.channel);
        assert_eq!(config.session.timeout_ms, before.session.timeout_ms);
    }

    #[test]
    fn test_legacy_bustype_name() {
        let config = parse("[bus]\nadapter = \"socketcan_native\"\n");
        assert_eq!(config.bus.adapter, AdapterKind::SocketCan);
    }
}
