use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::content::ResourceId;
use crate::persistence::StoreLimits;
use crate::spatial::point::DEFAULT_LEAF_CAPACITY;
use crate::systems::Rules;
use crate::world::terrain::TerrainTable;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Order in which the work queue hands entities back out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueDiscipline {
    /// The most recently pushed entity runs next.
    #[default]
    Lifo,
    Fifo,
}

/// Runtime settings. Every field has a default so a partial JSON file works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub temp_root: PathBuf,
    pub save_root: PathBuf,
    pub entity_cache_capacity: usize,
    pub map_cache_capacity: usize,
    pub point_leaf_capacity: usize,
    pub heartbeat_ms: u64,
    pub turn_ms: u64,
    pub queue_discipline: QueueDiscipline,
    pub swim_threshold: i32,
    pub step_cost: i32,
    pub terrain: TerrainTable,
    /// Content modules in load order.
    pub modules: Vec<String>,
    pub player_species: ResourceId,
    pub start_map: ResourceId,
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            temp_root: PathBuf::from("./run/tmp"),
            save_root: PathBuf::from("./run/saves"),
            entity_cache_capacity: 256,
            map_cache_capacity: 4,
            point_leaf_capacity: DEFAULT_LEAF_CAPACITY,
            heartbeat_ms: 100,
            turn_ms: 1000,
            queue_discipline: QueueDiscipline::Lifo,
            swim_threshold: 50,
            step_cost: 100,
            terrain: TerrainTable::default(),
            modules: vec!["base".to_string()],
            player_species: ResourceId::new("base", "human"),
            start_map: ResourceId::new("base", "start"),
            seed: 0x5eed,
        }
    }
}

impl SimConfig {
    /// Load from a JSON file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        let config: Self = serde_json::from_str(&data).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.heartbeat_ms == 0 || self.turn_ms == 0 {
            return Err(ConfigError::Invalid(
                "heartbeat_ms and turn_ms must be positive".to_string(),
            ));
        }
        if self.step_cost <= 0 {
            return Err(ConfigError::Invalid("step_cost must be positive".to_string()));
        }
        if self.point_leaf_capacity == 0 {
            return Err(ConfigError::Invalid(
                "point_leaf_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Turn fraction covered by one real-time heartbeat.
    pub fn realtime_fraction(&self) -> f32 {
        self.heartbeat_ms as f32 / self.turn_ms as f32
    }

    pub fn store_limits(&self) -> StoreLimits {
        StoreLimits {
            entity_capacity: self.entity_cache_capacity,
            map_capacity: self.map_cache_capacity,
            leaf_capacity: self.point_leaf_capacity,
        }
    }

    pub fn rules(&self) -> Rules {
        Rules {
            step_cost: self.step_cost,
            swim_threshold: self.swim_threshold,
            terrain: self.terrain.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sim.json");
        fs::write(&path, r#"{ "queue_discipline": "fifo", "step_cost": 50 }"#).unwrap();

        let config = SimConfig::load(&path).unwrap();
        assert_eq!(config.queue_discipline, QueueDiscipline::Fifo);
        assert_eq!(config.step_cost, 50);
        assert_eq!(config.entity_cache_capacity, 256);
        assert_eq!(config.swim_threshold, 50);
    }

    #[test]
    fn missing_file_is_default() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = SimConfig::load(dir.path().join("absent.json")).unwrap();
        assert_eq!(config, SimConfig::default());
        assert!((config.realtime_fraction() - 0.1).abs() < f32::EPSILON);
    }

    #[test]
    fn bad_values_are_rejected() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sim.json");
        fs::write(&path, r#"{ "turn_ms": 0 }"#).unwrap();
        assert!(matches!(SimConfig::load(&path), Err(ConfigError::Invalid(_))));

        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(SimConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
