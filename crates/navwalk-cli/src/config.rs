//! Viewer configuration loading.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use navwalk::NavigatorConfig;
use serde::{Deserialize, Serialize};

/// Host configuration, loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Navmesh file, used when `--map` is not given
    pub map: Option<PathBuf>,

    /// Fixed frame delta for replays, in seconds
    #[serde(default = "default_frame_dt")]
    pub frame_dt: f32,

    /// Navigator tuning (speed, spawn, teleport distance, ...)
    pub navigator: NavigatorConfig,
}

fn default_frame_dt() -> f32 {
    1.0 / 60.0
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            map: None,
            frame_dt: default_frame_dt(),
            navigator: NavigatorConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        if let Some(dir) = path.parent() {
            config.resolve_paths(dir);
        }
        Ok(config)
    }

    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)?;
        if !(config.frame_dt.is_finite() && config.frame_dt > 0.0) {
            anyhow::bail!("frame_dt must be a positive number, got {}", config.frame_dt);
        }
        Ok(config)
    }

    /// Resolve the map path relative to the config file's directory
    pub fn resolve_paths(&mut self, base: &Path) {
        if let Some(map) = self.map.as_mut() {
            if map.is_relative() {
                *map = base.join(&*map);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use navwalk::Vec3;

    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults() {
        let config = ViewerConfig::from_yaml(
            "map: level.obj\nnavigator:\n  spawn: { x: 26.0, y: 0.0, z: 9.0 }\n",
        )
        .expect("config");

        assert_eq!(config.map, Some(PathBuf::from("level.obj")));
        assert_eq!(config.frame_dt, 1.0 / 60.0);
        assert_eq!(config.navigator.spawn, Vec3::new(26.0, 0.0, 9.0));
        assert_eq!(config.navigator.speed, 20.0);
        assert_eq!(config.navigator.zone_id, "level");
    }

    #[test]
    fn rejects_non_positive_frame_dt() {
        assert!(ViewerConfig::from_yaml("frame_dt: 0.0\n").is_err());
    }

    #[test]
    fn relative_map_is_resolved_against_config_dir() {
        let mut config = ViewerConfig {
            map: Some(PathBuf::from("maps/level.json")),
            ..ViewerConfig::default()
        };
        config.resolve_paths(Path::new("/srv/viewer"));
        assert_eq!(config.map, Some(PathBuf::from("/srv/viewer/maps/level.json")));
    }
}
