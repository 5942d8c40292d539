//! Service configuration: facility tables, server and logging settings

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Top-level YAML configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub facility: FacilityConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Static enclosure areas and the pairwise movement cost table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityConfig {
    pub enclosures: Vec<EnclosureConfig>,
    #[serde(default)]
    pub movement_costs: Vec<MovementCostConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnclosureConfig {
    pub id: String,
    /// Total floor area in m².
    pub area: f64,
}

/// Cost of moving one animal between two enclosures, in either direction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementCostConfig {
    pub from: String,
    pub to: String,
    pub cost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_solve_timeout_ms")]
    pub solve_timeout_ms: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_solve_timeout_ms() -> u64 {
    10_000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            solve_timeout_ms: default_solve_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ServiceConfig = serde_yaml::from_str(&data)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a YAML file
    pub fn to_yaml(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    /// The four-house demo farm.
    pub fn demo() -> Self {
        let enclosures = [("G1", 1400.0), ("G2", 1000.0), ("G3", 1400.0), ("G4", 1800.0)]
            .into_iter()
            .map(|(id, area)| EnclosureConfig {
                id: id.to_string(),
                area,
            })
            .collect();
        let movement_costs = [
            ("G1", "G2", 50.0),
            ("G1", "G3", 100.0),
            ("G1", "G4", 145.0),
            ("G2", "G3", 50.0),
            ("G2", "G4", 95.0),
            ("G3", "G4", 45.0),
        ]
        .into_iter()
        .map(|(from, to, cost)| MovementCostConfig {
            from: from.to_string(),
            to: to.to_string(),
            cost,
        })
        .collect();

        Self {
            name: "demo_farm".to_string(),
            facility: FacilityConfig {
                enclosures,
                movement_costs,
            },
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
