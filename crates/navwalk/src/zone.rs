use core::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap, VecDeque};

use crate::{NavError, NavGeometry, Vec3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Vertex weld distance used when no explicit tolerance is given.
pub const DEFAULT_WELD_TOLERANCE: f32 = 1e-4;

/// Vertical slack when deciding whether a point lies on a polygon.
const POLYGON_HEIGHT_SLACK: f32 = 2.0;

/// Connectivity group: nodes of one group are reachable from each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupId(pub u32);

/// Zone-local node (triangle) identifier, stable for a given geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NodeId(pub u32);

/// Owned view of a zone node, as returned by closest-node lookups.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Node {
    pub id: NodeId,
    pub group: GroupId,
    pub centroid: Vec3,
}

#[derive(Debug, Clone)]
struct NodeData {
    group: GroupId,
    vertex_ids: [u32; 3],
    centroid: Vec3,
    neighbours: Vec<NodeId>,
    /// Shared edge with `neighbours[i]`, as vertex ids.
    portals: Vec<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct OpenNode {
    f: u32,
    g: u32,
    node: usize,
    tie: u64,
}

impl OpenNode {
    fn key(&self) -> (u32, u32, usize, u64) {
        (self.f, self.g, self.node, self.tie)
    }
}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap.
        other.key().cmp(&self.key())
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reusable scratch buffers for `Zone` path queries.
///
/// This avoids per-query allocations when a host plans many paths per frame.
#[derive(Debug, Default)]
pub struct ZoneQuery {
    search: NodeSearch,
    node_path: Vec<usize>,
    portals: Vec<(Vec3, Vec3)>,
}

#[derive(Debug, Default)]
struct NodeSearch {
    open: BinaryHeap<OpenNode>,
    g_score: Vec<u32>,
    came_from: Vec<Option<usize>>,
    /// Where the search entered each node: the start point, or the midpoint of
    /// the portal it was reached through.
    entry: Vec<Vec3>,
}

impl NodeSearch {
    fn reset(&mut self, node_count: usize) {
        self.open.clear();
        self.g_score.clear();
        self.g_score.resize(node_count, u32::MAX);
        self.came_from.clear();
        self.came_from.resize(node_count, None);
        self.entry.clear();
        self.entry.resize(node_count, Vec3::ZERO);
    }
}

/// Indexed navigation mesh: welded vertices, triangle nodes with adjacency, and
/// connectivity groups.
#[derive(Debug, Clone)]
pub struct Zone {
    vertices: Vec<Vec3>,
    nodes: Vec<NodeData>,
    groups: Vec<Vec<NodeId>>,
}

impl Zone {
    pub fn build(geometry: &NavGeometry) -> Result<Self, NavError> {
        Self::build_with_tolerance(geometry, DEFAULT_WELD_TOLERANCE)
    }

    /// Build a zone, merging each vertex into an earlier vertex within
    /// `tolerance` of it, so that triangles exported without shared indices
    /// still connect.
    pub fn build_with_tolerance(geometry: &NavGeometry, tolerance: f32) -> Result<Self, NavError> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(NavError::InvalidTolerance(tolerance));
        }

        let raw_tris = geometry.triangles()?;
        let (vertices, remap) = weld(&geometry.positions, tolerance);

        let tris: Vec<[u32; 3]> = raw_tris
            .into_iter()
            .map(|t| [remap[t[0] as usize], remap[t[1] as usize], remap[t[2] as usize]])
            .filter(|t| {
                if t[0] == t[1] || t[1] == t[2] || t[2] == t[0] {
                    return false;
                }
                let [a, b, c] = t.map(|i| vertices[i as usize]);
                (b - a).cross(c - a).length_squared() > f32::EPSILON * f32::EPSILON
            })
            .collect();

        if tris.is_empty() {
            return Err(NavError::EmptyGeometry);
        }

        let mut neighbors = vec![[None; 3]; tris.len()];
        let mut edge_map: BTreeMap<(u32, u32), (usize, usize)> = BTreeMap::new();
        for (tri_idx, tri) in tris.iter().enumerate() {
            for (edge_idx, (a, b)) in tri_edges(tri).into_iter().enumerate() {
                let key = (a.min(b), a.max(b));
                if let Some((other_tri, other_edge)) = edge_map.remove(&key) {
                    neighbors[tri_idx][edge_idx] = Some(other_tri);
                    neighbors[other_tri][other_edge] = Some(tri_idx);
                } else {
                    edge_map.insert(key, (tri_idx, edge_idx));
                }
            }
        }

        // Flood fill in triangle order so group ids are deterministic.
        let mut group_of: Vec<Option<GroupId>> = vec![None; tris.len()];
        let mut groups: Vec<Vec<NodeId>> = Vec::new();
        let mut frontier = VecDeque::new();
        for seed in 0..tris.len() {
            if group_of[seed].is_some() {
                continue;
            }
            let group = GroupId(groups.len() as u32);
            let mut members = Vec::new();
            group_of[seed] = Some(group);
            frontier.push_back(seed);
            while let Some(tri) = frontier.pop_front() {
                members.push(NodeId(tri as u32));
                for n in neighbors[tri].into_iter().flatten() {
                    if group_of[n].is_none() {
                        group_of[n] = Some(group);
                        frontier.push_back(n);
                    }
                }
            }
            members.sort();
            groups.push(members);
        }

        let nodes = tris
            .iter()
            .enumerate()
            .map(|(tri_idx, tri)| {
                let mut neighbours = Vec::new();
                let mut portals = Vec::new();
                for (edge_idx, edge) in tri_edges(tri).into_iter().enumerate() {
                    if let Some(n) = neighbors[tri_idx][edge_idx] {
                        neighbours.push(NodeId(n as u32));
                        portals.push(edge);
                    }
                }
                let [a, b, c] = tri.map(|i| vertices[i as usize]);
                NodeData {
                    group: group_of[tri_idx].unwrap_or(GroupId(0)),
                    vertex_ids: *tri,
                    centroid: (a + b + c) / 3.0,
                    neighbours,
                    portals,
                }
            })
            .collect();

        Ok(Self {
            vertices,
            nodes,
            groups,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn group_nodes(&self, group: GroupId) -> &[NodeId] {
        self.groups
            .get(group.0 as usize)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn node(&self, id: NodeId) -> Option<Node> {
        let data = self.nodes.get(id.0 as usize)?;
        Some(Node {
            id,
            group: data.group,
            centroid: data.centroid,
        })
    }

    pub fn neighbours(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(id.0 as usize)
            .map(|n| n.neighbours.as_slice())
            .unwrap_or(&[])
    }

    pub fn triangle(&self, id: NodeId) -> Option<[Vec3; 3]> {
        let data = self.nodes.get(id.0 as usize)?;
        Some(data.vertex_ids.map(|i| self.vertices[i as usize]))
    }

    /// True when `point` projects into the node's triangle on the XZ plane and
    /// sits within the triangle's height range (plus slack).
    pub fn contains(&self, id: NodeId, point: Vec3) -> bool {
        let Some(tri) = self.triangle(id) else {
            return false;
        };
        let lowest = tri.iter().map(|v| v.y).fold(f32::INFINITY, f32::min);
        let highest = tri.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max);
        point.y >= lowest - POLYGON_HEIGHT_SLACK
            && point.y <= highest + POLYGON_HEIGHT_SLACK
            && point_in_triangle_xz(point, tri)
    }

    /// Group containing `point`, or the group of the nearest node centroid.
    ///
    /// With `check_polygon`, a node whose polygon contains the point wins over
    /// any closer centroid.
    pub fn group_at(&self, point: Vec3, check_polygon: bool) -> Option<GroupId> {
        let mut best: Option<(f32, GroupId)> = None;
        for (idx, node) in self.nodes.iter().enumerate() {
            if check_polygon && self.contains(NodeId(idx as u32), point) {
                return Some(node.group);
            }
            let d2 = node.centroid.distance_squared(point);
            match best {
                Some((best_d2, _)) if d2 >= best_d2 => {}
                _ => best = Some((d2, node.group)),
            }
        }
        best.map(|(_, group)| group)
    }

    /// Node of `group` with the nearest centroid; with `check_polygon`, only nodes
    /// whose polygon contains `point` qualify.
    pub fn closest_node(&self, point: Vec3, group: GroupId, check_polygon: bool) -> Option<Node> {
        let mut best: Option<(f32, NodeId)> = None;
        for id in self.group_nodes(group).iter().copied() {
            let d2 = self.nodes[id.0 as usize].centroid.distance_squared(point);
            if best.is_some_and(|(best_d2, _)| d2 >= best_d2) {
                continue;
            }
            if check_polygon && !self.contains(id, point) {
                continue;
            }
            best = Some((d2, id));
        }
        best.and_then(|(_, id)| self.node(id))
    }

    pub fn find_path(&self, start: Vec3, goal: Vec3, group: GroupId) -> Option<Vec<Vec3>> {
        let mut query = ZoneQuery::default();
        let mut out = Vec::new();
        self.find_path_into(start, goal, group, &mut query, &mut out)?;
        Some(out)
    }

    /// Plan a straightened path from `start` to `goal` inside `group`.
    ///
    /// `out` receives the waypoints in travel order. The start point itself is not
    /// included; the last waypoint is always `goal`.
    pub fn find_path_into(
        &self,
        start: Vec3,
        goal: Vec3,
        group: GroupId,
        query: &mut ZoneQuery,
        out: &mut Vec<Vec3>,
    ) -> Option<()> {
        out.clear();

        let start_node = self.closest_node(start, group, true)?;
        let goal_node = self.closest_node(goal, group, true)?;

        let ZoneQuery {
            search,
            node_path,
            portals,
        } = query;
        self.search_nodes(
            start_node.id.0 as usize,
            goal_node.id.0 as usize,
            start,
            goal,
            search,
            node_path,
        )?;

        if node_path.len() <= 1 {
            out.push(goal);
            return Some(());
        }

        portals.clear();
        portals.reserve(node_path.len() + 1);
        portals.push((start, start));
        for w in node_path.windows(2) {
            let (p0, p1) = self.shared_edge(w[0], w[1])?;
            let c0 = self.nodes[w[0]].centroid;
            let dir = self.nodes[w[1]].centroid - c0;
            let s0 = cross_xz(dir, p0 - c0);
            let s1 = cross_xz(dir, p1 - c0);
            let (left, right) = if s0 >= s1 { (p0, p1) } else { (p1, p0) };
            portals.push((left, right));
        }
        portals.push((goal, goal));

        string_pull_into(portals, out);
        // The funnel always starts at the apex; callers walk from there already.
        if !out.is_empty() {
            out.remove(0);
        }
        if out.last().copied() != Some(goal) {
            out.push(goal);
        }

        Some(())
    }

    /// Clamp a step from `start` towards `end` to the walkable surface around `node`.
    ///
    /// Nodes reachable from `node` whose polygons come within the step length of
    /// `start` are searched for the closest point to `end`; it is written to `out`
    /// and the node holding it is returned. `out` is untouched on failure.
    pub fn clamp_step_into(
        &self,
        start: Vec3,
        end: Vec3,
        node: NodeId,
        group: GroupId,
        out: &mut Vec3,
    ) -> Option<NodeId> {
        let data = self.nodes.get(node.0 as usize)?;
        if data.group != group {
            return None;
        }

        let radius = start.distance(end) + 1.0;
        let radius2 = radius * radius;

        let mut visited = vec![false; self.nodes.len()];
        let mut frontier = VecDeque::from([node]);
        visited[node.0 as usize] = true;

        let mut best: Option<(f32, Vec3, NodeId)> = None;
        while let Some(current) = frontier.pop_front() {
            let Some([a, b, c]) = self.triangle(current) else {
                continue;
            };
            let q = closest_point_on_triangle(end, a, b, c);
            let d2 = q.distance_squared(end);
            match best {
                Some((best_d2, _, _)) if d2 >= best_d2 => {}
                _ => best = Some((d2, q, current)),
            }

            for n in self.neighbours(current).iter().copied() {
                let slot = &mut visited[n.0 as usize];
                if *slot {
                    continue;
                }
                *slot = true;
                if let Some([na, nb, nc]) = self.triangle(n) {
                    if closest_point_on_triangle(start, na, nb, nc).distance_squared(start)
                        <= radius2
                    {
                        frontier.push_back(n);
                    }
                }
            }
        }

        let (_, point, id) = best?;
        *out = point;
        Some(id)
    }

    /// A* over shared edges from node `start` to node `goal`.
    ///
    /// Step costs run from the point where the search entered a node to the
    /// midpoint of the portal it leaves through, beginning at `from`. Long thin
    /// triangles therefore cost what crossing them costs, not what their
    /// centroids suggest.
    fn search_nodes(
        &self,
        start: usize,
        goal: usize,
        from: Vec3,
        to: Vec3,
        search: &mut NodeSearch,
        out: &mut Vec<usize>,
    ) -> Option<()> {
        out.clear();
        if start == goal {
            out.push(start);
            return Some(());
        }

        search.reset(self.nodes.len());
        search.g_score[start] = 0;
        search.entry[start] = from;
        search.open.push(OpenNode {
            f: quantise(from.distance(to)),
            g: 0,
            node: start,
            tie: 0,
        });
        let mut tie: u64 = 1;

        while let Some(current) = search.open.pop() {
            if current.node == goal {
                let mut at = goal;
                out.push(at);
                while let Some(prev) = search.came_from[at] {
                    out.push(prev);
                    at = prev;
                }
                out.reverse();
                return Some(());
            }
            if current.g != search.g_score[current.node] {
                continue;
            }

            let here = search.entry[current.node];
            let data = &self.nodes[current.node];
            for (next, &(a, b)) in data.neighbours.iter().zip(&data.portals) {
                let next = next.0 as usize;
                let crossing = (self.vertices[a as usize] + self.vertices[b as usize]) * 0.5;
                let g = current
                    .g
                    .saturating_add(quantise(here.distance(crossing)))
                    .saturating_add(1);
                if g >= search.g_score[next] {
                    continue;
                }

                search.g_score[next] = g;
                search.came_from[next] = Some(current.node);
                search.entry[next] = crossing;
                search.open.push(OpenNode {
                    f: g.saturating_add(quantise(crossing.distance(to))),
                    g,
                    node: next,
                    tie,
                });
                tie += 1;
            }
        }

        None
    }

    fn shared_edge(&self, from: usize, to: usize) -> Option<(Vec3, Vec3)> {
        let data = &self.nodes[from];
        let slot = data
            .neighbours
            .iter()
            .position(|n| n.0 as usize == to)?;
        let (a, b) = data.portals[slot];
        Some((self.vertices[a as usize], self.vertices[b as usize]))
    }
}

/// Merge positions within `tolerance` of each other. Returns the welded
/// vertices and, for every input position, its welded index.
///
/// Positions are bucketed into cells one tolerance wide; a match is always
/// in the same or an adjacent cell.
fn weld(positions: &[Vec3], tolerance: f32) -> (Vec<Vec3>, Vec<u32>) {
    let max_d2 = tolerance * tolerance;
    let cell = |v: f32| (v / tolerance).floor() as i64;

    let mut cells: BTreeMap<(i64, i64, i64), Vec<u32>> = BTreeMap::new();
    let mut vertices: Vec<Vec3> = Vec::new();
    let mut remap = Vec::with_capacity(positions.len());
    for p in positions.iter().copied() {
        let key = (cell(p.x), cell(p.y), cell(p.z));

        let mut found = None;
        'cells: for dx in -1..=1 {
            for dy in -1..=1 {
                for dz in -1..=1 {
                    let Some(ids) = cells.get(&(key.0 + dx, key.1 + dy, key.2 + dz)) else {
                        continue;
                    };
                    if let Some(&id) = ids
                        .iter()
                        .find(|&&id| vertices[id as usize].distance_squared(p) <= max_d2)
                    {
                        found = Some(id);
                        break 'cells;
                    }
                }
            }
        }

        let id = found.unwrap_or_else(|| {
            vertices.push(p);
            let id = (vertices.len() - 1) as u32;
            cells.entry(key).or_default().push(id);
            id
        });
        remap.push(id);
    }
    (vertices, remap)
}

/// Path costs in fixed point (1/1024 unit) so the open set orders exactly.
fn quantise(distance: f32) -> u32 {
    (distance.max(0.0) * 1024.0) as u32
}

fn tri_edges(tri: &[u32; 3]) -> [(u32, u32); 3] {
    [(tri[0], tri[1]), (tri[1], tri[2]), (tri[2], tri[0])]
}

/// 2D cross product on the ground (XZ) plane.
fn cross_xz(a: Vec3, b: Vec3) -> f32 {
    a.x * b.z - a.z * b.x
}

fn tri_area2(a: Vec3, b: Vec3, c: Vec3) -> f32 {
    cross_xz(b - a, c - a)
}

fn point_in_triangle_xz(p: Vec3, tri: [Vec3; 3]) -> bool {
    let eps = 1e-6;
    let [a, b, c] = tri;
    let ab = tri_area2(a, b, p);
    let bc = tri_area2(b, c, p);
    let ca = tri_area2(c, a, p);
    let has_neg = ab < -eps || bc < -eps || ca < -eps;
    let has_pos = ab > eps || bc > eps || ca > eps;
    !(has_neg && has_pos)
}

fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;
    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        return b + (c - b) * ((d4 - d3) / ((d4 - d3) + (d5 - d6)));
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

/// Simple stupid funnel over `(left, right)` portals on the XZ plane.
///
/// `portals[0]` must be the degenerate `(start, start)` portal and the last one
/// `(goal, goal)`. "Left" is the side with a positive XZ cross product relative
/// to the direction of travel.
fn string_pull_into(portals: &[(Vec3, Vec3)], out: &mut Vec<Vec3>) {
    out.clear();
    let Some(&(start, _)) = portals.first() else {
        return;
    };
    out.push(start);

    let mut apex = start;
    let mut left = start;
    let mut right = start;
    let mut left_index: usize = 0;
    let mut right_index: usize = 0;

    let mut i: usize = 1;
    while i < portals.len() {
        let (p_left, p_right) = portals[i];

        // Update right vertex.
        if tri_area2(apex, right, p_right) >= 0.0 {
            if apex == right || tri_area2(apex, left, p_right) < 0.0 {
                right = p_right;
                right_index = i;
            } else {
                push_corner(out, left);
                apex = left;
                let new_index = left_index;
                left = apex;
                right = apex;
                left_index = new_index;
                right_index = new_index;
                i = new_index + 1;
                continue;
            }
        }

        // Update left vertex.
        if tri_area2(apex, left, p_left) <= 0.0 {
            if apex == left || tri_area2(apex, right, p_left) > 0.0 {
                left = p_left;
                left_index = i;
            } else {
                push_corner(out, right);
                apex = right;
                let new_index = right_index;
                left = apex;
                right = apex;
                left_index = new_index;
                right_index = new_index;
                i = new_index + 1;
                continue;
            }
        }

        i += 1;
    }
}

/// The apex can be re-emitted after a restart when consecutive portals share it.
fn push_corner(out: &mut Vec<Vec3>, corner: Vec3) {
    if out.last() != Some(&corner) {
        out.push(corner);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_point_is_identity_inside_triangle() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(4.0, 0.0, 0.0);
        let c = Vec3::new(0.0, 0.0, 4.0);
        let p = Vec3::new(1.0, 0.0, 1.0);
        assert_eq!(closest_point_on_triangle(p, a, b, c), p);

        let outside = Vec3::new(-3.0, 0.0, 1.0);
        let q = closest_point_on_triangle(outside, a, b, c);
        assert!(q.distance(Vec3::new(0.0, 0.0, 1.0)) < 1e-5, "{q:?}");
    }

    #[test]
    fn funnel_keeps_straight_line_when_portals_are_wide() {
        let start = Vec3::new(0.0, 0.0, 0.0);
        let goal = Vec3::new(0.0, 0.0, 4.0);
        let portals = [
            (start, start),
            (Vec3::new(-2.0, 0.0, 1.0), Vec3::new(2.0, 0.0, 1.0)),
            (Vec3::new(-2.0, 0.0, 2.0), Vec3::new(2.0, 0.0, 2.0)),
            (goal, goal),
        ];
        // Heading +z, the positive-cross side is -x.
        assert!(cross_xz(goal - start, portals[1].0 - start) > 0.0);

        let mut out = Vec::new();
        string_pull_into(&portals, &mut out);
        assert_eq!(out, vec![start, goal]);
    }

    #[test]
    fn funnel_bends_around_a_narrow_portal() {
        let start = Vec3::new(0.0, 0.0, 0.0);
        let goal = Vec3::new(0.0, 0.0, 4.0);
        let corner = Vec3::new(2.0, 0.0, 2.0);
        let portals = [
            (start, start),
            // Portal entirely off to the +x (right) side of the straight line.
            (corner, Vec3::new(4.0, 0.0, 2.0)),
            (goal, goal),
        ];

        let mut out = Vec::new();
        string_pull_into(&portals, &mut out);
        assert_eq!(out, vec![start, corner]);
    }
}
