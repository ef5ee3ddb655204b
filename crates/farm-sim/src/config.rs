// crates/farm-sim/src/config.rs
//
// Runtime configuration for the farm simulator.
// Loaded from a TOML file or populated with defaults.

use serde::Deserialize;
use std::fs;

use farm_core::FarmError;
use farm_economics::{EmissionParams, StakingSettings};

/// Simulator configuration: emission schedule plus controller setup.
#[derive(Debug, Clone, Deserialize)]
pub struct FarmConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// `[emission]` table.
    #[serde(default)]
    pub emission: EmissionParams,

    /// `[staking]` table.
    #[serde(default)]
    pub staking: StakingSettings,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for FarmConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            emission: EmissionParams::default(),
            staking: StakingSettings::default(),
        }
    }
}

impl FarmConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// emission parameters are inconsistent.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        Ok(config)
    }

    /// Parse and validate configuration text.
    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: FarmConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FarmError> {
        self.emission.validate()?;
        self.staking.validate()
    }
}
