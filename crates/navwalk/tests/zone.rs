use navwalk::{GroupId, NavError, NavGeometry, NodeId, Vec3, Zone, ZoneQuery};

fn v(x: f32, z: f32) -> Vec3 {
    Vec3::new(x, 0.0, z)
}

fn l_shape_geometry() -> NavGeometry {
    NavGeometry::from_triangles(vec![
        // Lower-left quad split.
        [v(0.0, 0.0), v(4.0, 0.0), v(3.0, 1.0)],
        [v(0.0, 0.0), v(3.0, 1.0), v(0.0, 1.0)],
        // Upper-right quad split.
        [v(4.0, 0.0), v(4.0, 4.0), v(3.0, 4.0)],
        [v(4.0, 0.0), v(3.0, 4.0), v(3.0, 1.0)],
    ])
}

fn square(x0: f32, z0: f32, size: f32) -> [[Vec3; 3]; 2] {
    rect(x0, z0, x0 + size, z0 + size)
}

fn rect(x0: f32, z0: f32, x1: f32, z1: f32) -> [[Vec3; 3]; 2] {
    [
        [v(x0, z0), v(x1, z0), v(x1, z1)],
        [v(x0, z0), v(x1, z1), v(x0, z1)],
    ]
}

/// Two legs joined by a bar across the top; the inner corners are (8, 10)
/// and (2, 10).
fn u_corridor() -> Zone {
    let tris: Vec<[Vec3; 3]> = [
        rect(8.0, 0.0, 10.0, 10.0),
        rect(8.0, 10.0, 10.0, 12.0),
        rect(2.0, 10.0, 8.0, 12.0),
        rect(0.0, 10.0, 2.0, 12.0),
        rect(0.0, 0.0, 2.0, 10.0),
    ]
    .into_iter()
    .flatten()
    .collect();
    Zone::build(&NavGeometry::from_triangles(tris)).expect("zone")
}

fn assert_path_on_mesh(zone: &Zone, start: Vec3, path: &[Vec3]) {
    let mut from = start;
    for &to in path {
        for k in 0..=16 {
            let p = from + (to - from) * (k as f32 / 16.0);
            assert!(
                (0..zone.node_count()).any(|i| zone.contains(NodeId(i as u32), p)),
                "{p:?} on segment {from:?} -> {to:?} leaves the mesh"
            );
        }
        from = to;
    }
}

fn two_islands() -> Zone {
    let tris: Vec<[Vec3; 3]> = square(0.0, 0.0, 10.0)
        .into_iter()
        .chain(square(20.0, 0.0, 10.0))
        .collect();
    Zone::build(&NavGeometry::from_triangles(tris)).expect("zone")
}

#[test]
fn unindexed_triangles_are_welded_into_one_group() {
    let zone = Zone::build(&l_shape_geometry()).expect("zone");

    assert_eq!(zone.node_count(), 4);
    assert_eq!(zone.vertex_count(), 6);
    assert_eq!(zone.group_count(), 1);
    assert_eq!(zone.group_nodes(GroupId(0)).len(), 4);
    assert_eq!(zone.neighbours(NodeId(0)), &[NodeId(3), NodeId(1)]);
}

#[test]
fn disconnected_islands_get_separate_groups() {
    let zone = two_islands();
    assert_eq!(zone.group_count(), 2);

    assert_eq!(zone.group_at(v(5.0, 5.0), true), Some(GroupId(0)));
    assert_eq!(zone.group_at(v(25.0, 5.0), true), Some(GroupId(1)));
    // Off-mesh points fall back to the nearest centroid.
    assert_eq!(zone.group_at(v(33.0, 5.0), true), Some(GroupId(1)));
}

#[test]
fn closest_node_respects_polygon_check() {
    let zone = two_islands();

    let inside = zone
        .closest_node(v(8.0, 2.0), GroupId(0), true)
        .expect("point is on island A");
    assert_eq!(inside.id, NodeId(0));
    assert_eq!(inside.group, GroupId(0));

    assert!(zone.closest_node(v(25.0, 5.0), GroupId(0), true).is_none());
    assert!(zone.closest_node(v(25.0, 5.0), GroupId(0), false).is_some());

    // Far above the surface does not count as "on" the polygon.
    let high = Vec3::new(8.0, 10.0, 2.0);
    assert!(zone.closest_node(high, GroupId(0), true).is_none());
}

#[test]
fn path_turns_the_corner_of_an_l_shape() {
    let zone = Zone::build(&l_shape_geometry()).expect("zone");
    let start = v(0.2, 0.2);
    let goal = v(3.8, 3.8);

    let path = zone.find_path(start, goal, GroupId(0)).expect("path");
    assert_eq!(path, vec![v(3.0, 1.0), goal]);
    assert_path_on_mesh(&zone, start, &path);

    // Allocation-reuse API produces identical output.
    let mut query = ZoneQuery::default();
    let mut out = Vec::new();
    zone.find_path_into(start, goal, GroupId(0), &mut query, &mut out)
        .expect("into path");
    assert_eq!(out, path);
}

#[test]
fn path_turns_right_around_a_mirrored_l() {
    let mirrored = NavGeometry::new(
        l_shape_geometry()
            .positions
            .iter()
            .map(|p| Vec3::new(-p.x, p.y, p.z))
            .collect(),
    );
    let zone = Zone::build(&mirrored).expect("zone");
    let start = v(-0.2, 0.2);
    let goal = v(-3.8, 3.8);

    let path = zone.find_path(start, goal, GroupId(0)).expect("path");
    assert_eq!(path, vec![v(-3.0, 1.0), goal]);
    assert_path_on_mesh(&zone, start, &path);
}

#[test]
fn path_rounds_both_inner_corners_of_a_u() {
    let zone = u_corridor();
    assert_eq!(zone.group_count(), 1);
    let start = v(9.0, 1.0);
    let goal = v(1.0, 1.0);

    let path = zone.find_path(start, goal, GroupId(0)).expect("path");
    assert_eq!(path, vec![v(8.0, 10.0), v(2.0, 10.0), goal]);
    assert!(path.windows(2).all(|w| w[0] != w[1]), "{path:?}");
    assert_path_on_mesh(&zone, start, &path);

    // And back the other way.
    let back = zone.find_path(goal, start, GroupId(0)).expect("path");
    assert_eq!(back, vec![v(2.0, 10.0), v(8.0, 10.0), start]);
    assert_path_on_mesh(&zone, goal, &back);
}

#[test]
fn close_vertices_weld_across_cell_boundaries() {
    // Each shared vertex differs by 0.002, straddling a 0.01 grid line.
    let geometry = NavGeometry::from_triangles([
        [v(0.0, 0.0), v(1.004, 0.0), v(0.0, 0.999)],
        [v(1.006, 0.0), v(1.0, 1.0), v(0.0, 1.001)],
    ]);
    let zone = Zone::build_with_tolerance(&geometry, 0.01).expect("zone");

    assert_eq!(zone.vertex_count(), 4);
    assert_eq!(zone.group_count(), 1);
    assert_eq!(zone.neighbours(NodeId(0)), &[NodeId(1)]);
}

#[test]
fn path_within_one_node_is_just_the_goal() {
    let zone = two_islands();
    let goal = v(9.0, 1.0);
    let path = zone.find_path(v(6.0, 1.0), goal, GroupId(0)).expect("path");
    assert_eq!(path, vec![goal]);
}

#[test]
fn path_across_groups_is_not_found() {
    let zone = two_islands();
    assert!(zone.find_path(v(5.0, 5.0), v(25.0, 5.0), GroupId(0)).is_none());
    assert!(zone.find_path(v(5.0, 5.0), v(5.0, 5.0), GroupId(1)).is_none());
}

#[test]
fn clamp_step_stops_at_the_mesh_edge() {
    let zone = two_islands();
    let start = v(5.0, 5.0);
    let node = zone.closest_node(start, GroupId(0), false).expect("node");

    let mut out = Vec3::ZERO;
    let landed = zone
        .clamp_step_into(start, v(25.0, 5.0), node.id, GroupId(0), &mut out)
        .expect("clamped");
    assert!(out.distance(v(10.0, 5.0)) < 1e-4, "unexpected clamp: {out:?}");
    assert_eq!(zone.node(landed).map(|n| n.group), Some(GroupId(0)));

    // A step that stays on the mesh is returned unchanged.
    zone.clamp_step_into(start, v(7.0, 6.0), node.id, GroupId(0), &mut out)
        .expect("clamped");
    assert!(out.distance(v(7.0, 6.0)) < 1e-5);

    // Wrong group leaves `out` alone.
    let before = out;
    assert!(zone
        .clamp_step_into(start, v(25.0, 5.0), node.id, GroupId(1), &mut out)
        .is_none());
    assert_eq!(out, before);
}

#[test]
fn malformed_geometry_is_rejected() {
    assert_eq!(
        Zone::build(&NavGeometry::default()).unwrap_err(),
        NavError::EmptyGeometry
    );
    assert_eq!(
        Zone::build(&NavGeometry::new(vec![Vec3::ZERO; 4])).unwrap_err(),
        NavError::UnalignedPositions(4)
    );
    assert_eq!(
        Zone::build(&NavGeometry::indexed(vec![Vec3::ZERO; 3], vec![0, 1, 7])).unwrap_err(),
        NavError::IndexOutOfRange {
            index: 7,
            vertex_count: 3
        }
    );
    // Only degenerate triangles left after welding.
    assert_eq!(
        Zone::build(&NavGeometry::new(vec![Vec3::ZERO; 3])).unwrap_err(),
        NavError::EmptyGeometry
    );
    assert_eq!(
        Zone::build_with_tolerance(&l_shape_geometry(), 0.0).unwrap_err(),
        NavError::InvalidTolerance(0.0)
    );
}
