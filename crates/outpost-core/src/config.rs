//! Configuration loading and typed config structures for the Outpost
//! simulation.
//!
//! The canonical configuration lives in `outpost-config.yaml` at the project
//! root. Every section is optional; missing sections and fields fall back to
//! the defaults below. Balance numbers (build times, capacities, conversion
//! divisors) live here and nowhere else.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use outpost_ledger::{Population, StorableResources};
use outpost_types::{MineYield, StructureKind};

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but holds a value the simulation cannot use.
    #[error("invalid config value for {field}: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level simulation configuration.
///
/// Mirrors the structure of `outpost-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SimulationConfig {
    /// Colony name, seed, starting population and stockpile.
    #[serde(default)]
    pub colony: ColonyConfig,

    /// Map size and mine count.
    #[serde(default)]
    pub map: MapConfig,

    /// Mining and refining rates.
    #[serde(default)]
    pub production: ProductionConfig,

    /// Ore per dug level, by deposit yield.
    #[serde(default)]
    pub mine_yields: MineYieldConfig,

    /// Per-kind blueprint overrides.
    #[serde(default)]
    pub structures: BTreeMap<StructureKind, BlueprintOverride>,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML, or
    /// [`ConfigError::Invalid`] if a value fails validation.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make the simulation misbehave.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad field.
    pub const fn validate(&self) -> Result<(), ConfigError> {
        if self.map.width == 0 {
            return Err(ConfigError::Invalid {
                field: "map.width",
                reason: "must be positive",
            });
        }
        if self.map.height == 0 {
            return Err(ConfigError::Invalid {
                field: "map.height",
                reason: "must be positive",
            });
        }
        if self.production.metal_divisor == 0 {
            return Err(ConfigError::Invalid {
                field: "production.metal_divisor",
                reason: "must be positive",
            });
        }
        if self.production.mineral_divisor == 0 {
            return Err(ConfigError::Invalid {
                field: "production.mineral_divisor",
                reason: "must be positive",
            });
        }
        if self.production.minimum_smelting_batch == 0 {
            return Err(ConfigError::Invalid {
                field: "production.minimum_smelting_batch",
                reason: "must be positive",
            });
        }
        Ok(())
    }
}

/// Colony-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ColonyConfig {
    /// Human-readable colony name.
    #[serde(default = "default_colony_name")]
    pub name: String,

    /// Random seed for mine placement.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Turns the headless engine runs before stopping.
    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Starting headcount by role.
    #[serde(default = "default_population")]
    pub population: Population,

    /// Refined materials on hand at landing.
    #[serde(default = "default_starting_resources")]
    pub starting_resources: StorableResources,
}

impl Default for ColonyConfig {
    fn default() -> Self {
        Self {
            name: default_colony_name(),
            seed: default_seed(),
            max_turns: default_max_turns(),
            population: default_population(),
            starting_resources: default_starting_resources(),
        }
    }
}

/// Map dimensions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MapConfig {
    /// Columns.
    #[serde(default = "default_map_width")]
    pub width: u32,

    /// Rows.
    #[serde(default = "default_map_height")]
    pub height: u32,

    /// Underground levels below the surface.
    #[serde(default = "default_max_depth")]
    pub max_depth: u32,

    /// Deposits scattered at startup.
    #[serde(default = "default_mine_count")]
    pub mine_count: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: default_map_width(),
            height: default_map_height(),
            max_depth: default_max_depth(),
            mine_count: default_mine_count(),
        }
    }
}

/// Mining and refining parameters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProductionConfig {
    /// Ore pulled per material per turn by a mine facility.
    #[serde(default = "default_mine_rate")]
    pub mine_rate: u32,

    /// Turns a shaft extension takes.
    #[serde(default = "default_shaft_extension_turns")]
    pub shaft_extension_turns: u32,

    /// Ore a refinery needs of one material before converting it.
    #[serde(default = "default_minimum_smelting_batch")]
    pub minimum_smelting_batch: u32,

    /// Ore units per refined unit for metals.
    #[serde(default = "default_metal_divisor")]
    pub metal_divisor: u32,

    /// Ore units per refined unit for minerals.
    #[serde(default = "default_mineral_divisor")]
    pub mineral_divisor: u32,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            mine_rate: default_mine_rate(),
            shaft_extension_turns: default_shaft_extension_turns(),
            minimum_smelting_batch: default_minimum_smelting_batch(),
            metal_divisor: default_metal_divisor(),
            mineral_divisor: default_mineral_divisor(),
        }
    }
}

/// Ore each newly dug level holds, by deposit yield.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MineYieldConfig {
    /// Poor deposits.
    #[serde(default = "default_low_vein")]
    pub low: StorableResources,

    /// Average deposits.
    #[serde(default = "default_medium_vein")]
    pub medium: StorableResources,

    /// Rich deposits.
    #[serde(default = "default_high_vein")]
    pub high: StorableResources,
}

impl MineYieldConfig {
    /// Vein contents for a yield.
    pub const fn vein(&self, richness: MineYield) -> StorableResources {
        match richness {
            MineYield::Low => self.low,
            MineYield::Medium => self.medium,
            MineYield::High => self.high,
        }
    }
}

impl Default for MineYieldConfig {
    fn default() -> Self {
        Self {
            low: default_low_vein(),
            medium: default_medium_vein(),
            high: default_high_vein(),
        }
    }
}

/// Partial blueprint. Present fields replace the built-in value for the
/// kind; absent fields keep it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlueprintOverride {
    /// Turns under construction.
    pub turns_to_build: Option<u32>,
    /// Age at which the structure is condemned, 0 for never.
    pub max_age: Option<u32>,
    /// Energy drawn while running.
    pub energy_required: Option<u32>,
    /// Energy supplied while operational.
    pub energy_produced: Option<u32>,
    /// Needs an operational CHAP facility.
    pub requires_chap: Option<bool>,
    /// Runs without a tube connection.
    pub self_sustained: Option<bool>,
    /// Runs without drawing on the energy budget.
    pub energy_exempt: Option<bool>,
    /// Workers needed to run.
    pub workers: Option<u32>,
    /// Scientists needed to run.
    pub scientists: Option<u32>,
    /// Refined storage added to the colony stockpile.
    pub storage_capacity: Option<u32>,
    /// Capacity of the structure's own finished-goods buffer.
    pub internal_capacity: Option<u32>,
    /// Colonists housed.
    pub residents: Option<u32>,
    /// Refined materials charged on placement.
    pub cost: Option<StorableResources>,
    /// Refined materials consumed per operational turn.
    pub resource_input: Option<StorableResources>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

fn default_colony_name() -> String {
    "New Terra".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_max_turns() -> u32 {
    60
}

const fn default_population() -> Population {
    Population {
        children: 10,
        students: 5,
        workers: 20,
        scientists: 8,
        retired: 2,
    }
}

const fn default_starting_resources() -> StorableResources {
    StorableResources::new(150, 120, 40, 30)
}

const fn default_map_width() -> u32 {
    32
}

const fn default_map_height() -> u32 {
    32
}

const fn default_max_depth() -> u32 {
    4
}

const fn default_mine_count() -> u32 {
    8
}

const fn default_mine_rate() -> u32 {
    10
}

const fn default_shaft_extension_turns() -> u32 {
    10
}

const fn default_minimum_smelting_batch() -> u32 {
    20
}

const fn default_metal_divisor() -> u32 {
    2
}

const fn default_mineral_divisor() -> u32 {
    3
}

const fn default_low_vein() -> StorableResources {
    StorableResources::new(300, 300, 100, 100)
}

const fn default_medium_vein() -> StorableResources {
    StorableResources::new(600, 600, 200, 200)
}

const fn default_high_vein() -> StorableResources {
    StorableResources::new(1000, 1000, 400, 400)
}

fn default_log_level() -> String {
    "info".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = SimulationConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.colony.seed, 42);
        assert_eq!(config.production.metal_divisor, 2);
        assert_eq!(config.production.mineral_divisor, 3);
        assert_eq!(config.colony.population.workers, 20);
        assert!(config.structures.is_empty());
    }

    #[test]
    fn empty_yaml_yields_defaults() {
        let config = SimulationConfig::parse("{}").unwrap();
        assert_eq!(config, SimulationConfig::default());
    }

    #[test]
    fn parse_partial_yaml() {
        let yaml = r"
colony:
  name: Test Colony
  seed: 7
  population:
    workers: 3
    scientists: 1
map:
  width: 10
  height: 12
production:
  minimum_smelting_batch: 30
structures:
  Smelter:
    turns_to_build: 1
    workers: 0
logging:
  format: json
";
        let config = SimulationConfig::parse(yaml).unwrap();
        assert_eq!(config.colony.name, "Test Colony");
        assert_eq!(config.colony.population.workers, 3);
        assert_eq!(config.colony.population.children, 0);
        assert_eq!(config.map.width, 10);
        assert_eq!(config.map.max_depth, 4);
        assert_eq!(config.production.minimum_smelting_batch, 30);
        assert_eq!(config.production.mine_rate, 10);
        let smelter = config.structures.get(&StructureKind::Smelter).unwrap();
        assert_eq!(smelter.turns_to_build, Some(1));
        assert_eq!(smelter.max_age, None);
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn zero_divisor_is_rejected() {
        let err = SimulationConfig::parse("production:\n  mineral_divisor: 0\n").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "production.mineral_divisor",
                ..
            }
        ));
    }

    #[test]
    fn malformed_yaml_is_a_yaml_error() {
        let err = SimulationConfig::parse("map: [1, 2").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml { .. }));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = SimulationConfig::from_file(Path::new("/nonexistent/outpost.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn vein_lookup_by_yield() {
        let yields = MineYieldConfig::default();
        assert_eq!(yields.vein(MineYield::High).common_metals, 1000);
        assert_eq!(yields.vein(MineYield::Low).rare_minerals, 100);
    }

    #[test]
    fn shipped_config_parses() {
        let config = SimulationConfig::parse(include_str!("../../../outpost-config.yaml")).unwrap();
        assert_eq!(config.colony.name, "New Terra");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(
            config.structures.get(&StructureKind::Smelter).and_then(|o| o.workers),
            Some(4)
        );
    }
}
