// Data-driven belief configuration.
//
// Every tunable the belief core reads lives in `BeliefConfig`, loaded from
// JSON at agent start. The core never hardcodes entity categories or
// distance thresholds: which tags block navigation, which entities count as
// doors or buttons, and the proximity tolerances all come from here.
//
// Missing fields fall back to the defaults below (`#[serde(default)]`), so a
// config file only has to name what it changes.
//
// See also: `belief.rs` which owns the config as part of `BeliefState`,
// `blocking.rs` which reads `obstacle_tags`, `mental_map.rs` which reads
// `waypoint_tolerance`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Tunable parameters for the belief core.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeliefConfig {
    /// Tags of interactive entities that block navigation while inactive
    /// (closed). Interactive entities with any other tag never block.
    pub obstacle_tags: Vec<String>,

    /// Tags identifying doors for the `known_doors*` queries.
    pub door_tags: Vec<String>,

    /// Tags identifying buttons. An interactive entity is a button if its
    /// tag is listed here or its ID starts with one of `button_id_prefixes`.
    pub button_tags: Vec<String>,

    /// ID prefixes identifying buttons.
    pub button_id_prefixes: Vec<String>,

    /// Radius for `within_range` proximity checks.
    pub within_range: f32,

    /// Distance at which the agent counts as having reached the next
    /// waypoint of its current route.
    pub waypoint_tolerance: f32,

    /// Maximum distance from an interactive entity's centre at which the
    /// agent can interact with it.
    pub interaction_range: f32,
}

impl Default for BeliefConfig {
    fn default() -> Self {
        Self {
            obstacle_tags: vec!["Door".into()],
            door_tags: vec!["Door".into()],
            button_tags: Vec::new(),
            button_id_prefixes: vec!["b".into(), "B".into()],
            within_range: 0.4,
            waypoint_tolerance: 0.4,
            interaction_range: 1.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config at {path} is invalid: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("config is invalid: {0}")]
    Json(#[source] serde_json::Error),
}

impl BeliefConfig {
    /// Parse a config from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(ConfigError::Json)
    }

    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn is_obstacle_tag(&self, tag: &str) -> bool {
        self.obstacle_tags.iter().any(|t| t == tag)
    }

    pub fn is_door_tag(&self, tag: &str) -> bool {
        self.door_tags.iter().any(|t| t == tag)
    }

    /// Button classification by tag or ID prefix.
    pub fn is_button(&self, id: &str, tag: &str) -> bool {
        self.button_tags.iter().any(|t| t == tag)
            || self
                .button_id_prefixes
                .iter()
                .any(|prefix| id.starts_with(prefix.as_str()))
    }
}
