//! Navigator tuning.

use crate::Vec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Navigator configuration. Every field has a default, so partial config files
/// are fine.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NavigatorConfig {
    /// Oracle zone the terrain is indexed under.
    pub zone_id: String,

    /// Walking speed in world units per second.
    pub speed: f32,

    /// Clicks further than this from the player teleport instead of walking.
    pub teleport_distance: f32,

    /// A waypoint counts as reached once the player is within this distance.
    pub arrival_threshold: f32,

    /// Largest pointer movement (per screen axis) between press and release that
    /// still counts as a click rather than a camera drag.
    pub drag_epsilon: f32,

    /// Vertex weld tolerance used when indexing terrain geometry.
    pub weld_tolerance: f32,

    /// Player placement when terrain is loaded.
    pub spawn: Vec3,
}

impl Default for NavigatorConfig {
    fn default() -> Self {
        Self {
            zone_id: "level".to_owned(),
            speed: 20.0,
            teleport_distance: 100.0,
            arrival_threshold: 1.0,
            drag_epsilon: 0.0,
            weld_tolerance: crate::zone::DEFAULT_WELD_TOLERANCE,
            spawn: Vec3::ZERO,
        }
    }
}

impl NavigatorConfig {
    pub fn with_spawn(mut self, spawn: Vec3) -> Self {
        self.spawn = spawn;
        self
    }

    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_teleport_distance(mut self, distance: f32) -> Self {
        self.teleport_distance = distance;
        self
    }

    pub fn with_zone_id(mut self, zone_id: impl Into<String>) -> Self {
        self.zone_id = zone_id.into();
        self
    }
}
