//! Tests that follow a point along a route made of several corridors.

use corridor::{
    math::{Point2d, Vector2d},
    Boundaries, Corridor, CorridorAttributes, CorridorNetwork, FrenetPoint,
};
use assert_approx_eq::assert_approx_eq;

/// Builds a straight approach, a quarter turn of radius 40 m to the left,
/// and a straight exit heading north.
fn build_network() -> (CorridorNetwork, Vec<corridor::CorridorId>) {
    let mut network = CorridorNetwork::new();

    let line = [Point2d::new(0.0, 0.0), Point2d::new(60.0, 0.0)];
    let approach = Corridor::with_offsets(&line, 1.75, -1.75).unwrap();

    let arc = (0..=18)
        .map(|i| {
            let angle = std::f64::consts::FRAC_PI_2 * i as f64 / 18.0;
            Point2d::new(60.0 + 40.0 * angle.sin(), 40.0 - 40.0 * angle.cos())
        })
        .collect::<Vec<_>>();
    let turn = Corridor::new(&CorridorAttributes {
        reference_line: &arc,
        end_tangents: Some([Vector2d::new(1.0, 0.0), Vector2d::new(0.0, 1.0)]),
        boundaries: Boundaries::Offsets {
            left: 1.75,
            right: -1.75,
        },
    })
    .unwrap();

    let line = [Point2d::new(100.0, 40.0), Point2d::new(100.0, 100.0)];
    let exit = Corridor::with_offsets(&line, 1.75, -1.75).unwrap();

    let ids = vec![
        network.add_corridor(approach),
        network.add_corridor(turn),
        network.add_corridor(exit),
    ];
    network.connect(ids[0], ids[1]).unwrap();
    network.connect(ids[1], ids[2]).unwrap();
    (network, ids)
}

/// A point moving along the route keeps an increasing arc length,
/// and lands in each corridor in turn.
#[test]
fn point_tracks_along_route() {
    let (network, ids) = build_network();
    let path = network.find_path(ids[0], ids[2]).unwrap();
    assert_eq!(path.ids(), ids.as_slice());

    let sequence = network.sequence(&path).unwrap();
    let length = sequence.total_length();
    assert_approx_eq!(length, 60.0 + 20.0 * std::f64::consts::PI + 60.0, 0.05);

    let mut hint = 0.0;
    let mut visited = Vec::new();
    let mut pos = 0.5;
    while pos < length - 0.5 {
        let point = sequence.to_cartesian_point(FrenetPoint::new(pos, 0.8));
        let result = sequence.frenet_position_with_frame(point, hint);
        assert_approx_eq!(result.global_pos(), pos, 1e-4);
        assert_approx_eq!(result.local.position.lat, 0.8, 1e-4);
        if visited.last() != Some(&result.corridor) {
            visited.push(result.corridor);
        }
        hint = result.global_pos();
        pos += 2.0;
    }
    assert_eq!(visited, ids);
}

/// The corridor stays 3.5 m wide all along the route, including through the turn.
#[test]
fn width_is_continuous() {
    let (network, ids) = build_network();
    let sequence = network.sequence(&network.find_path(ids[0], ids[2]).unwrap()).unwrap();
    let mut pos = 0.0;
    while pos <= sequence.total_length() {
        assert_approx_eq!(sequence.width_at(pos), 3.5);
        assert!(sequence.curvature_at(pos) >= -1e-6);
        pos += 1.0;
    }
    assert_approx_eq!(sequence.curvature_at(60.0 + 10.0 * std::f64::consts::PI), 1.0 / 40.0, 1e-3);
}
