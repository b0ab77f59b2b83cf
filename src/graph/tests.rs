//! Tests for the road network, spatial index and id remapping.

use super::*;
use crate::error::NetworkError;

fn grid(n: u16) -> RoadNetwork {
    // n x n nodes spaced 0.01 degrees apart; ids start at 1.
    let mut b = RoadNetwork::builder();
    for r in 0..n {
        for c in 0..n {
            let id = r * n + c + 1;
            b.add_node(id, Coordinate::new(104.0 + f64::from(c) * 0.01, 30.0 + f64::from(r) * 0.01))
                .unwrap();
        }
    }
    for r in 0..n {
        for c in 0..n {
            let id = r * n + c + 1;
            if c + 1 < n {
                b.add_road(id, id + 1, 1.0, 1.0).unwrap();
            }
            if r + 1 < n {
                b.add_road(id, id + n, 1.0, 1.0).unwrap();
            }
        }
    }
    b.build()
}

#[test]
fn test_edges_are_mirrored_on_both_endpoints() {
    let mut b = RoadNetwork::builder();
    b.add_node(1, Coordinate::new(0.0, 0.0)).unwrap();
    b.add_node(2, Coordinate::new(0.0, 0.01)).unwrap();
    b.add_edge(1, 2, 2.5, 10.0).unwrap();

    let net = b.build();
    assert!(net.has_edge(1, 2));
    assert!(!net.has_edge(2, 1));
    assert_eq!(net.outgoing(1).map(|(v, _)| v).collect::<Vec<_>>(), vec![2]);
    assert_eq!(net.incoming(2).map(|(v, _)| v).collect::<Vec<_>>(), vec![1]);
    assert_eq!(net.incoming(1).count(), 0);

    let (_, edge) = net.outgoing(1).next().unwrap();
    assert_eq!(edge.source, 1);
    assert_eq!(edge.destination, 2);
    assert!((edge.cost - 2.5).abs() < f64::EPSILON);
}

#[test]
fn test_duplicate_edges_are_ignored() {
    let mut b = RoadNetwork::builder();
    b.add_node(1, Coordinate::new(0.0, 0.0)).unwrap();
    b.add_node(2, Coordinate::new(0.0, 0.01)).unwrap();
    b.add_edge(1, 2, 1.0, 1.0).unwrap();
    b.add_edge(1, 2, 7.0, 7.0).unwrap();
    let net = b.build();
    assert_eq!(net.edge_count(), 1);
    assert_eq!(net.node(1).unwrap().out_degree(), 1);
    assert_eq!(net.node(2).unwrap().in_degree(), 1);
}

#[test]
fn test_builder_rejects_bad_input() {
    let mut b = RoadNetwork::builder();
    b.add_node(3, Coordinate::new(0.0, 0.0)).unwrap();
    assert_eq!(b.add_node(3, Coordinate::new(1.0, 1.0)).unwrap_err(), NetworkError::DuplicateNode(3));
    assert!(matches!(
        b.add_edge(3, 9, 1.0, 1.0),
        Err(NetworkError::UnknownEndpoint { source: 3, destination: 9 })
    ));
    assert!(matches!(b.add_edge(3, 3, 0.0, 1.0), Err(NetworkError::InvalidWeight { .. })));
    assert!(matches!(b.add_edge(3, 3, 1.0, f64::NAN), Err(NetworkError::InvalidWeight { .. })));
}

#[test]
fn test_unknown_ids_have_no_adjacency() {
    let net = grid(2);
    assert!(net.node(0).is_none());
    assert!(net.neighbors(99).is_none());
    assert_eq!(net.outgoing(99).count(), 0);
    assert!(!net.contains(0));
}

#[test]
fn test_bounding_box_covers_radius() {
    let center = Coordinate::new(104.06, 30.67);
    let bbox = center.bounding_box(1000.0);
    assert!(bbox.contains(center));
    // ~0.009 degrees of latitude per kilometre.
    assert!((bbox.max_lat - center.latitude - 0.00898).abs() < 1e-4);
    assert!((center.latitude - bbox.min_lat - 0.00898).abs() < 1e-4);
    // Longitude span widens with latitude.
    assert!(bbox.max_lng - center.longitude > bbox.max_lat - center.latitude);
}

#[test]
fn test_range_query_small_radius_hits_single_node() {
    let net = grid(4);
    let at = net.node(6).unwrap().location();
    assert_eq!(net.nodes_within_range(at, 100.0), vec![6]);
}

#[test]
fn test_range_query_matches_linear_scan() {
    let net = grid(12);
    let center = Coordinate::new(104.043, 30.061);
    for radius in [50.0, 800.0, 2500.0, 6000.0] {
        let bbox = center.bounding_box(radius);
        let mut expected: Vec<NodeId> = net
            .node_ids()
            .filter(|&id| bbox.contains(net.node(id).unwrap().location()))
            .collect();
        let mut got = net.nodes_within_range(center, radius);
        expected.sort_unstable();
        got.sort_unstable();
        assert_eq!(got, expected, "radius {radius}");
    }
}

#[test]
fn test_spatial_index_tiny_buckets() {
    let points: Vec<(NodeId, Coordinate)> = (1..=50u16)
        .map(|i| (i, Coordinate::new(f64::from(i % 7), f64::from(i / 7))))
        .collect();
    let index = SpatialIndex::with_bucket(points.clone(), 1);
    let bbox = BoundingBox {
        min_lng: 2.0,
        min_lat: 1.0,
        max_lng: 4.0,
        max_lat: 3.0,
    };
    let mut got = index.range(&bbox);
    got.sort_unstable();
    let expected: Vec<NodeId> = points
        .iter()
        .filter(|(_, c)| bbox.contains(*c))
        .map(|(id, _)| *id)
        .collect();
    assert_eq!(got, expected);
    assert_eq!(index.len(), 50);
}

#[test]
fn test_empty_spatial_index() {
    let index = SpatialIndex::build(Vec::new());
    assert!(index.is_empty());
    assert!(index.range(&Coordinate::new(0.0, 0.0).bounding_box(1e6)).is_empty());
}

#[test]
fn test_id_map_reserves_padding() {
    let mut map = NodeIdMap::new();
    let a = map.intern(9_000_000_001).unwrap();
    let b = map.intern(42).unwrap();
    assert_eq!(a, 1);
    assert_eq!(b, 2);
    assert_eq!(map.intern(9_000_000_001).unwrap(), 1);
    assert_eq!(map.get(42), Some(2));
    assert_eq!(map.raw(2), Some(42));
    assert_eq!(map.raw(PAD_NODE), None);
    assert_eq!(map.len(), 2);
}

#[test]
fn test_id_map_exhaustion() {
    let map: NodeIdMap = (0..100_000i64).collect();
    assert_eq!(map.len(), usize::from(u16::MAX));
    let mut map = map;
    assert_eq!(map.intern(-1), Err(NetworkError::IdSpaceExhausted));
}
