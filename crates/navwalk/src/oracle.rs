use std::collections::BTreeMap;

use crate::{GroupId, NavError, NavGeometry, Node, NodeId, Vec3, Zone};

/// Navigation-mesh query service used by the [`crate::Navigator`].
///
/// Implementations are addressed by zone id so several independently indexed
/// meshes can live side by side. Every query is synchronous and never mutates the
/// points it is given; "not found" is reported as `None`, never as an error.
pub trait NavOracle {
    type Zone;

    fn build_zone(&self, geometry: &NavGeometry) -> Result<Self::Zone, NavError>;

    fn set_zone(&mut self, zone_id: &str, zone: Self::Zone);

    fn has_zone(&self, zone_id: &str) -> bool;

    fn get_group(&self, zone_id: &str, point: Vec3, check_polygon: bool) -> Option<GroupId>;

    fn get_closest_node(
        &self,
        point: Vec3,
        zone_id: &str,
        group: GroupId,
        check_polygon: bool,
    ) -> Option<Node>;

    /// Waypoints from `from` to `to` in travel order, excluding `from`.
    ///
    /// `None` or an empty list both mean "no path".
    fn find_path(&self, from: Vec3, to: Vec3, zone_id: &str, group: GroupId)
        -> Option<Vec<Vec3>>;

    /// Write the furthest safely reachable point of the step `from -> to` into
    /// `out`, returning the node it lies on.
    fn clamp_step(
        &self,
        from: Vec3,
        to: Vec3,
        node: &Node,
        zone_id: &str,
        group: GroupId,
        out: &mut Vec3,
    ) -> Option<NodeId>;
}

/// Default oracle backed by [`Zone`] indexes.
#[derive(Debug, Clone)]
pub struct Pathfinding {
    zones: BTreeMap<String, Zone>,
    tolerance: f32,
}

impl Default for Pathfinding {
    fn default() -> Self {
        Self {
            zones: BTreeMap::new(),
            tolerance: crate::zone::DEFAULT_WELD_TOLERANCE,
        }
    }
}

impl Pathfinding {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tolerance(tolerance: f32) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }

    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    pub fn zone(&self, zone_id: &str) -> Option<&Zone> {
        self.zones.get(zone_id)
    }

    pub fn try_zone(&self, zone_id: &str) -> Result<&Zone, NavError> {
        self.zone(zone_id)
            .ok_or_else(|| NavError::UnknownZone(zone_id.to_owned()))
    }

    pub fn remove_zone(&mut self, zone_id: &str) -> Option<Zone> {
        self.zones.remove(zone_id)
    }
}

impl NavOracle for Pathfinding {
    type Zone = Zone;

    fn build_zone(&self, geometry: &NavGeometry) -> Result<Zone, NavError> {
        Zone::build_with_tolerance(geometry, self.tolerance)
    }

    fn set_zone(&mut self, zone_id: &str, zone: Zone) {
        tracing::debug!(
            zone = zone_id,
            nodes = zone.node_count(),
            groups = zone.group_count(),
            "zone indexed"
        );
        self.zones.insert(zone_id.to_owned(), zone);
    }

    fn has_zone(&self, zone_id: &str) -> bool {
        self.zones.contains_key(zone_id)
    }

    fn get_group(&self, zone_id: &str, point: Vec3, check_polygon: bool) -> Option<GroupId> {
        self.zone(zone_id)?.group_at(point, check_polygon)
    }

    fn get_closest_node(
        &self,
        point: Vec3,
        zone_id: &str,
        group: GroupId,
        check_polygon: bool,
    ) -> Option<Node> {
        self.zone(zone_id)?
            .closest_node(point, group, check_polygon)
    }

    fn find_path(
        &self,
        from: Vec3,
        to: Vec3,
        zone_id: &str,
        group: GroupId,
    ) -> Option<Vec<Vec3>> {
        self.zone(zone_id)?.find_path(from, to, group)
    }

    fn clamp_step(
        &self,
        from: Vec3,
        to: Vec3,
        node: &Node,
        zone_id: &str,
        group: GroupId,
        out: &mut Vec3,
    ) -> Option<NodeId> {
        self.zone(zone_id)?
            .clamp_step_into(from, to, node.id, group, out)
    }
}
