use quadtree::history::HistoryQuadTree;
use quadtree::quadtree::{Config, QuadTree, RelocationRequest};
use quadtree::shapes::{Circle, Point, Rectangle, RotRect, Segment, Shape, ShapeEnum};
use quadtree::QuadtreeError;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::f32::consts::PI;

fn hundred() -> QuadTree {
    QuadTree::new(Rectangle::new(50.0, 50.0, 100.0, 100.0)).unwrap()
}

fn rect(x: f32, y: f32, width: f32, height: f32) -> ShapeEnum {
    ShapeEnum::Rectangle(Rectangle::new(x, y, width, height))
}

fn query(qt: &QuadTree, shape: &ShapeEnum) -> Vec<u32> {
    let mut collisions = Vec::new();
    qt.collisions(shape, &mut collisions).unwrap();
    collisions.sort_unstable();
    collisions
}

fn point_query(qt: &QuadTree, x: f32, y: f32) -> Vec<u32> {
    let mut collisions = Vec::new();
    qt.collisions_point(x, y, &mut collisions).unwrap();
    collisions
}

/// Items a full scan finds, skipping those still waiting outside the bounds.
fn brute_force(qt: &QuadTree, shape: &ShapeEnum) -> Vec<u32> {
    let mut hits: Vec<u32> = qt
        .items()
        .filter(|(value, item)| {
            qt.membership(*value).unwrap().node.is_some() && collisions::intersects(item, shape)
        })
        .map(|(value, _)| value)
        .collect();
    hits.sort_unstable();
    hits
}

fn random_shape(rng: &mut StdRng, lo: f32, hi: f32) -> ShapeEnum {
    let x = rng.gen_range(lo..hi);
    let y = rng.gen_range(lo..hi);
    match rng.gen_range(0..4) {
        0 => ShapeEnum::Point(Point::new(x, y)),
        1 => ShapeEnum::Circle(Circle::new(x, y, rng.gen_range(0.5..20.0))),
        2 => rect(x, y, rng.gen_range(1.0..40.0), rng.gen_range(1.0..40.0)),
        _ => ShapeEnum::RotRect(RotRect::centered(
            x,
            y,
            rng.gen_range(1.0..40.0),
            rng.gen_range(1.0..40.0),
            rng.gen_range(-PI..PI),
        )),
    }
}

fn random_query(rng: &mut StdRng) -> ShapeEnum {
    let x = rng.gen_range(-50.0..1050.0);
    let y = rng.gen_range(-50.0..1050.0);
    match rng.gen_range(0..6) {
        0 => ShapeEnum::Point(Point::new(x, y)),
        1 => ShapeEnum::Circle(Circle::new(x, y, rng.gen_range(0.0..150.0))),
        2 => rect(x, y, rng.gen_range(0.0..300.0), rng.gen_range(0.0..300.0)),
        3 => ShapeEnum::RotRect(RotRect::centered(
            x,
            y,
            rng.gen_range(1.0..300.0),
            rng.gen_range(1.0..300.0),
            rng.gen_range(-PI..PI),
        )),
        4 => ShapeEnum::from(Segment::from_ray(
            x,
            y,
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(0.0..600.0),
            rng.gen_range(0.5..4.0),
        )),
        _ => rect(x, y, 0.0, 0.0),
    }
}

fn assert_matches_brute_force(qt: &QuadTree, rng: &mut StdRng, queries: usize) {
    for _ in 0..queries {
        let shape = random_query(rng);
        assert_eq!(query(qt, &shape), brute_force(qt, &shape), "query {:?}", shape);
    }
}

fn assert_capacity_invariant(qt: &QuadTree) {
    let config = qt.config();
    for node in qt.nodes() {
        if node.is_leaf {
            assert!(
                node.item_count <= config.node_capacity || node.depth >= config.max_depth,
                "overfull leaf {:?}",
                node
            );
        } else {
            assert_eq!(node.item_count, 0);
        }
    }
}

#[test]
fn test_single_collision() {
    let mut qt = hundred();
    qt.insert(0, rect(50.0, 65.0, 100.0, 50.0)).unwrap();
    assert_eq!(query(&qt, &rect(50.0, 50.0, 20.0, 20.0)), vec![0]);
}

#[test]
fn test_full_tree() {
    let mut qt = QuadTree::new(Rectangle::new(500.0, 500.0, 1000.0, 1000.0)).unwrap();
    qt.insert(0, rect(500.0, 500.0, 50.0, 50.0)).unwrap();
    qt.insert(1, ShapeEnum::Circle(Circle::new(500.0, 500.0, 25.0)))
        .unwrap();

    let mut rng = StdRng::seed_from_u64(1);
    for i in 2..5 {
        qt.insert(
            i,
            rect(
                rng.gen_range(0.0..900.0),
                rng.gen_range(0.0..900.0),
                rng.gen_range(0.0..100.0),
                rng.gen_range(0.0..100.0),
            ),
        )
        .unwrap();
    }
    for i in 5..8 {
        qt.insert(
            i,
            ShapeEnum::Circle(Circle::new(
                rng.gen_range(0.0..950.0),
                rng.gen_range(0.0..950.0),
                rng.gen_range(0.0..50.0),
            )),
        )
        .unwrap();
    }
    qt.update();

    let mut bounding_boxes = Vec::new();
    qt.all_node_bounding_boxes(&mut bounding_boxes);
    assert_eq!(bounding_boxes.len(), qt.node_count());

    let mut shapes = Vec::new();
    qt.all_shapes(&mut shapes);
    assert_eq!(shapes.len(), 8);

    let hits = query(&qt, &rect(500.0, 500.0, 1.0, 1.0));
    assert!(hits.contains(&0));
    assert!(hits.contains(&1));

    let hits = query(&qt, &ShapeEnum::Circle(Circle::new(500.0, 500.0, 1.0)));
    assert!(hits.contains(&0));
    assert!(hits.contains(&1));
}

#[test]
fn test_huge_bounds() {
    let bounds = Rectangle::new(0.0, 0.0, 2000000.0, 2000000.0);
    let mut qt = QuadTree::new(bounds).unwrap();
    qt.insert(0, rect(16000.0, -355.0, 60.0, 60.0)).unwrap();
    qt.insert(1, rect(15980.0, -350.0, 60.0, 60.0)).unwrap();
    let hits: HashSet<_> = query(&qt, &rect(15980.0, -350.0, 60.0, 60.0))
        .into_iter()
        .collect();
    assert_eq!(hits.len(), 2);
    assert!(hits.contains(&0));
    assert!(hits.contains(&1));
}

#[test]
fn test_no_collision() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 20.0, 20.0)).unwrap();
    qt.insert(1, rect(50.0, 50.0, 20.0, 20.0)).unwrap();
    assert!(query(&qt, &rect(80.0, 80.0, 10.0, 10.0)).is_empty());
}

#[test]
fn test_multiple_collisions() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 20.0, 20.0)).unwrap();
    qt.insert(1, rect(20.0, 20.0, 30.0, 30.0)).unwrap();
    qt.insert(2, rect(15.0, 15.0, 15.0, 15.0)).unwrap();
    assert_eq!(query(&qt, &rect(15.0, 15.0, 20.0, 20.0)), vec![0, 1, 2]);
}

#[test]
fn test_object_relocation() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 10.0, 10.0)).unwrap();
    assert!(qt.relocate(0, rect(60.0, 60.0, 10.0, 10.0)).unwrap());
    assert_eq!(query(&qt, &rect(60.0, 60.0, 10.0, 10.0)), vec![0]);
    assert!(query(&qt, &rect(10.0, 10.0, 2.0, 2.0)).is_empty());
}

#[test]
fn test_relocate_unknown_identity() {
    let mut qt = hundred();
    assert!(!qt.relocate(0, rect(10.0, 10.0, 10.0, 10.0)).unwrap());
    assert!(!qt.contains(0));
    qt.insert(0, rect(10.0, 10.0, 10.0, 10.0)).unwrap();
    assert!(qt.relocate(0, rect(60.0, 60.0, 10.0, 10.0)).unwrap());
    assert_eq!(query(&qt, &rect(60.0, 60.0, 10.0, 10.0)), vec![0]);
}

#[test]
fn test_object_relocation_multiple_times() {
    let mut qt = hundred();
    let mut rng = StdRng::seed_from_u64(42);

    fn random_rectangle(rng: &mut StdRng) -> ShapeEnum {
        rect(
            rng.gen_range(5.0..95.0),
            rng.gen_range(5.0..95.0),
            rng.gen_range(1.0..10.0),
            rng.gen_range(1.0..10.0),
        )
    }

    for i in 0..1_000 {
        qt.insert(i, random_rectangle(&mut rng)).unwrap();
    }
    qt.update();
    for _ in 0..10 {
        for i in 0..1_000 {
            assert!(qt.relocate(i, random_rectangle(&mut rng)).unwrap());
        }
        qt.update();
        assert_capacity_invariant(&qt);
    }
    assert_eq!(qt.len(), 1_000);
    assert_matches_brute_force(&qt, &mut rng, 50);
}

#[test]
fn test_relocate_batch() {
    let mut qt = hundred();
    for i in 0..10 {
        qt.insert(i, rect(5.0 + i as f32, 5.0, 1.0, 1.0)).unwrap();
    }
    let requests: Vec<RelocationRequest> = (0..10)
        .map(|i| RelocationRequest {
            value: i,
            shape: rect(5.0 + i as f32, 80.0, 1.0, 1.0),
        })
        .collect();
    qt.relocate_batch(&requests).unwrap();
    qt.update();
    assert_eq!(query(&qt, &rect(50.0, 80.0, 100.0, 2.0)).len(), 10);
    assert!(query(&qt, &rect(50.0, 5.0, 100.0, 2.0)).is_empty());
}

#[test]
fn test_object_deletion() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 10.0, 10.0)).unwrap();
    qt.insert(1, rect(50.0, 50.0, 10.0, 10.0)).unwrap();
    assert!(qt.delete(0));
    assert!(!qt.delete(0));
    assert!(!qt.contains(0));
    assert!(qt.contains(1));
    assert!(query(&qt, &rect(10.0, 10.0, 10.0, 10.0)).is_empty());
}

#[test]
fn test_object_out_of_bounds_waits_for_update() {
    let mut qt = hundred();
    qt.insert(0, rect(150.0, 150.0, 10.0, 10.0)).unwrap();
    assert!(qt.contains(0));
    assert_eq!(qt.pending_count(), 1);
    assert!(query(&qt, &rect(150.0, 150.0, 10.0, 10.0)).is_empty());

    qt.update();
    assert_eq!(qt.pending_count(), 0);
    assert_eq!(query(&qt, &rect(150.0, 150.0, 10.0, 10.0)), vec![0]);
    assert!(qt.bounds().unwrap().contains_point(150.0, 150.0));
}

#[test]
fn test_empty_quad_tree() {
    let qt = hundred();
    assert!(query(&qt, &rect(10.0, 10.0, 10.0, 10.0)).is_empty());

    let unbounded = QuadTree::unbounded();
    assert!(unbounded.bounds().is_none());
    assert!(query(&unbounded, &rect(10.0, 10.0, 10.0, 10.0)).is_empty());
    assert!(point_query(&unbounded, 0.0, 0.0).is_empty());
}

#[test]
fn test_query_with_large_shape() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 10.0, 10.0)).unwrap();
    qt.insert(1, rect(50.0, 50.0, 10.0, 10.0)).unwrap();
    qt.insert(2, rect(70.0, 70.0, 10.0, 10.0)).unwrap();
    assert_eq!(query(&qt, &rect(50.0, 50.0, 100.0, 100.0)), vec![0, 1, 2]);
}

#[test]
fn test_boundary_collision() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 20.0, 20.0)).unwrap();
    assert!(query(&qt, &rect(30.0, 10.0, 10.0, 10.0)).is_empty());
    // Touching edges count as a hit.
    assert_eq!(query(&qt, &rect(25.0, 10.0, 10.0, 10.0)), vec![0]);
}

#[test]
fn test_shape_spanning_multiple_quadrants() {
    let mut qt = QuadTree::new_with_config(
        Rectangle::new(50.0, 50.0, 100.0, 100.0),
        Config {
            node_capacity: 1,
            ..Config::default()
        },
    )
    .unwrap();
    qt.insert(0, rect(45.0, 45.0, 30.0, 30.0)).unwrap();
    qt.insert(1, rect(90.0, 90.0, 2.0, 2.0)).unwrap();
    qt.insert(2, rect(90.0, 10.0, 2.0, 2.0)).unwrap();
    qt.update();
    assert!(qt.node_count() > 1);
    // The query sits in the south-east quadrant; item 0 lives in the north-west one.
    assert_eq!(query(&qt, &rect(55.0, 55.0, 2.0, 2.0)), vec![0]);
}

#[test]
fn test_object_insertion_with_same_key() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 10.0, 10.0)).unwrap();
    assert_eq!(
        qt.insert(0, rect(60.0, 60.0, 10.0, 10.0)),
        Err(QuadtreeError::DuplicateItem { value: 0 })
    );
    assert_eq!(query(&qt, &rect(10.0, 10.0, 10.0, 10.0)), vec![0]);
    assert!(query(&qt, &rect(60.0, 60.0, 10.0, 10.0)).is_empty());
    assert_eq!(qt.len(), 1);
}

#[test]
fn test_invalid_shapes_are_rejected() {
    let mut qt = hundred();
    assert!(matches!(
        qt.insert(0, ShapeEnum::Point(Point::new(f32::NAN, 1.0))),
        Err(QuadtreeError::InvalidCoordinates { .. })
    ));
    assert_eq!(
        qt.insert(1, ShapeEnum::Circle(Circle::new(1.0, 1.0, -2.0))),
        Err(QuadtreeError::InvalidCircleRadius { radius: -2.0 })
    );
    assert_eq!(
        qt.insert(2, rect(1.0, 1.0, -1.0, 3.0)),
        Err(QuadtreeError::InvalidRectangleDims {
            width: -1.0,
            height: 3.0
        })
    );
    assert_eq!(
        qt.insert(
            3,
            ShapeEnum::RotRect(RotRect::centered(1.0, 1.0, 2.0, 2.0, f32::INFINITY))
        ),
        Err(QuadtreeError::InvalidRotation {
            angle: f32::INFINITY
        })
    );
    assert!(qt.is_empty());

    let mut collisions = Vec::new();
    assert!(qt
        .collisions_circle_raw(0.0, 0.0, -1.0, &mut collisions)
        .is_err());
    assert!(qt
        .collisions_rect_extent(10.0, 0.0, 0.0, 10.0, &mut collisions)
        .is_err());
    assert!(QuadTree::new(Rectangle::new(0.0, 0.0, f32::INFINITY, 1.0)).is_err());
    assert!(qt.set_bounds(Rectangle::new(0.0, 0.0, -5.0, 1.0)).is_err());
}

#[test]
fn test_relocation_outside_quadtree_bounds() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 10.0, 10.0)).unwrap();
    assert!(qt.relocate(0, rect(500.0, 500.0, 10.0, 10.0)).unwrap());

    // Membership is immediate, spatial placement waits for the next update.
    assert!(qt.contains(0));
    assert!(point_query(&qt, 500.0, 500.0).is_empty());
    assert!(qt.membership(0).unwrap().node.is_none());

    qt.update();
    let bounds = qt.bounds().unwrap();
    assert!(bounds.contains_point(500.0, 500.0));
    assert_eq!(point_query(&qt, 500.0, 500.0), vec![0]);
    let node = qt.membership(0).unwrap().node.unwrap();
    assert!(node.bounds.contains_point(500.0, 500.0));
}

#[test]
fn test_pending_item_rejoins_when_moved_back() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 2.0, 2.0)).unwrap();
    qt.relocate(0, rect(500.0, 10.0, 2.0, 2.0)).unwrap();
    assert_eq!(qt.pending_count(), 1);
    qt.relocate(0, rect(20.0, 10.0, 2.0, 2.0)).unwrap();
    assert_eq!(qt.pending_count(), 0);
    assert_eq!(point_query(&qt, 20.0, 10.0), vec![0]);

    // Nothing is left to grow for.
    let before = qt.bounds();
    qt.update();
    assert_eq!(qt.bounds(), before);
}

#[test]
fn test_bootstrap_bounds_from_first_item() {
    let mut qt = QuadTree::unbounded();
    qt.insert(9, ShapeEnum::Point(Point::new(5.0, 5.0))).unwrap();
    assert_eq!(qt.bounds(), Some(Rectangle::new(5.0, 5.0, 1.0, 1.0)));
    assert_eq!(point_query(&qt, 5.0, 5.0), vec![9]);
    assert!(point_query(&qt, 5.1, 5.0).is_empty());
}

#[test]
fn test_deleting_last_item_drops_bounds() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 2.0, 2.0)).unwrap();
    qt.insert(1, rect(20.0, 10.0, 2.0, 2.0)).unwrap();
    qt.delete(0);
    assert!(qt.bounds().is_some());
    qt.delete(1);
    assert!(qt.bounds().is_none());
    assert_eq!(qt.node_count(), 0);
    assert!(qt.is_empty());

    qt.insert(2, ShapeEnum::Point(Point::new(-3.0, 7.0))).unwrap();
    assert_eq!(qt.bounds(), Some(Rectangle::new(-3.0, 7.0, 1.0, 1.0)));
}

#[test]
fn test_thousand_items_scenario() {
    let config = Config {
        node_capacity: 16,
        max_depth: 6,
        ..Config::default()
    };
    let mut qt =
        QuadTree::new_with_config(Rectangle::new(500.0, 500.0, 1000.0, 1000.0), config).unwrap();
    let mut rng = StdRng::seed_from_u64(1000);
    let mut centers = Vec::new();
    for i in 0..1000u32 {
        let x = rng.gen_range(0.0..1000.0);
        let y = rng.gen_range(0.0..1000.0);
        qt.insert(i, rect(x, y, rng.gen_range(0.5..4.0), rng.gen_range(0.5..4.0)))
            .unwrap();
        centers.push((x, y));
    }
    qt.update();

    let nodes = qt.nodes();
    assert_eq!(qt.node_count(), nodes.len());
    assert!(qt.node_count() > 1);
    assert_eq!((qt.node_count() - 1) % 4, 0);
    assert_eq!(nodes.iter().map(|node| node.item_count).sum::<usize>(), 1000);
    assert!(nodes.iter().all(|node| node.depth <= 6));
    assert_capacity_invariant(&qt);

    for (i, &(x, y)) in centers.iter().enumerate() {
        assert!(point_query(&qt, x, y).contains(&(i as u32)));
    }

    let mut everything = Vec::new();
    qt.collisions_rect_extent(0.0, 0.0, 1000.0, 1000.0, &mut everything)
        .unwrap();
    assert_eq!(everything.len(), 1000);
    let unique: HashSet<u32> = everything.into_iter().collect();
    assert_eq!(unique.len(), 1000);
}

#[test]
fn test_drained_subtree_coalesces_to_single_leaf() {
    let mut qt = hundred();
    // A 8x5 grid packed into the north-west corner forces three levels of splits.
    for i in 0..40u32 {
        let x = 1.0 + (i % 8) as f32 * 3.0;
        let y = 1.0 + (i / 8) as f32 * 4.0;
        qt.insert(i, ShapeEnum::Point(Point::new(x, y))).unwrap();
    }
    qt.update();
    assert_eq!(qt.node_count(), 13);
    assert!(qt.nodes().iter().any(|node| node.depth == 3));

    for i in 4..40u32 {
        assert!(qt.delete(i));
    }
    qt.update();
    assert_eq!(qt.node_count(), 1);
    let root = &qt.nodes()[0];
    assert!(root.is_leaf);
    assert_eq!(root.item_count, 4);
    for i in 0..4u32 {
        let x = 1.0 + i as f32 * 3.0;
        assert_eq!(point_query(&qt, x, 1.0), vec![i]);
    }
}

#[test]
fn test_max_depth_accepts_overflow() {
    let config = Config {
        node_capacity: 2,
        max_depth: 3,
        ..Config::default()
    };
    let mut qt =
        QuadTree::new_with_config(Rectangle::new(50.0, 50.0, 100.0, 100.0), config).unwrap();
    for i in 0..10 {
        qt.insert(i, ShapeEnum::Point(Point::new(10.0, 10.0))).unwrap();
    }
    qt.update();
    let nodes = qt.nodes();
    assert!(nodes.iter().all(|node| node.depth <= 3));
    let deepest = nodes.iter().find(|node| node.item_count == 10).unwrap();
    assert_eq!(deepest.depth, 3);
    assert!(deepest.is_leaf);
    assert_eq!(point_query(&qt, 10.0, 10.0).len(), 10);
}

#[test]
fn test_min_size_stops_splitting() {
    let config = Config {
        node_capacity: 2,
        max_depth: 10,
        min_size: 30.0,
        ..Config::default()
    };
    let mut qt =
        QuadTree::new_with_config(Rectangle::new(50.0, 50.0, 100.0, 100.0), config).unwrap();
    for i in 0..10 {
        qt.insert(i, ShapeEnum::Point(Point::new(10.0 + i as f32, 10.0)))
            .unwrap();
    }
    qt.update();
    // 100 -> 50 -> 25: a 25-wide leaf is below the minimum and stays whole.
    assert!(qt.nodes().iter().all(|node| node.depth <= 2));
    assert_eq!(qt.node_count(), 9);
}

#[test]
fn test_update_is_idempotent() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut qt = QuadTree::new(Rectangle::new(500.0, 500.0, 1000.0, 1000.0)).unwrap();
    for i in 0..500 {
        qt.insert(i, random_shape(&mut rng, 1.0, 999.0)).unwrap();
    }
    for i in 0..200 {
        qt.relocate(i, random_shape(&mut rng, -200.0, 1200.0)).unwrap();
    }
    for i in 200..300 {
        qt.delete(i);
    }
    qt.update();
    let nodes = qt.nodes();
    let bounds = qt.bounds();
    let counts = qt.storage_counts();
    qt.update();
    assert_eq!(qt.nodes(), nodes);
    assert_eq!(qt.bounds(), bounds);
    assert_eq!(qt.storage_counts(), counts);
    assert_eq!(qt.pending_count(), 0);
}

#[test]
fn test_tight_bounds_follow_contents() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 4.0, 4.0)).unwrap();
    qt.insert(1, rect(30.0, 20.0, 2.0, 2.0)).unwrap();
    qt.update();
    let root = &qt.nodes()[0];
    assert_eq!(
        root.tight_bounds,
        Some(Rectangle::from_min_max(8.0, 8.0, 31.0, 21.0))
    );

    qt.delete(1);
    qt.update();
    assert_eq!(
        qt.nodes()[0].tight_bounds,
        Some(Rectangle::new(10.0, 10.0, 4.0, 4.0))
    );
}

#[test]
fn test_large_item_found_from_far_quadrant() {
    let mut qt = hundred();
    // Centered in the west half, reaching well into the east half.
    qt.insert(0, rect(30.0, 10.0, 80.0, 4.0)).unwrap();
    let mut rng = StdRng::seed_from_u64(3);
    for i in 1..60 {
        qt.insert(
            i,
            rect(
                rng.gen_range(55.0..95.0),
                rng.gen_range(40.0..95.0),
                1.0,
                1.0,
            ),
        )
        .unwrap();
    }
    // Before and after maintenance.
    assert!(query(&qt, &rect(65.0, 10.0, 1.0, 1.0)).contains(&0));
    qt.update();
    assert!(qt.node_count() > 1);
    assert!(query(&qt, &rect(65.0, 10.0, 1.0, 1.0)).contains(&0));
    assert!(query(&qt, &ShapeEnum::Circle(Circle::new(69.0, 10.0, 0.5))).contains(&0));
}

#[test]
fn test_randomized_queries_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(2024);
    let mut qt = QuadTree::new(Rectangle::new(500.0, 500.0, 1000.0, 1000.0)).unwrap();
    let mut live: Vec<u32> = Vec::new();
    let mut next_value = 0u32;

    for round in 0..6 {
        for _ in 0..150 {
            qt.insert(next_value, random_shape(&mut rng, 1.0, 999.0))
                .unwrap();
            live.push(next_value);
            next_value += 1;
        }
        for _ in 0..100 {
            let value = live[rng.gen_range(0..live.len())];
            qt.relocate(value, random_shape(&mut rng, 1.0, 999.0))
                .unwrap();
        }
        for _ in 0..40 {
            let index = rng.gen_range(0..live.len());
            assert!(qt.delete(live.swap_remove(index)));
        }

        // Mid-tick: structure is stale but queries must stay exact.
        assert_matches_brute_force(&qt, &mut rng, 40);
        qt.update();
        assert_matches_brute_force(&qt, &mut rng, 40);
        assert_capacity_invariant(&qt);
        assert_eq!(qt.len(), live.len(), "round {}", round);
    }

    for &value in &live {
        assert!(qt.contains(value));
    }
}

#[test]
fn test_randomized_relocations_far_outside() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut qt = hundred();
    for i in 0..200 {
        qt.insert(i, random_shape(&mut rng, 1.0, 99.0)).unwrap();
    }
    qt.update();
    for i in 0..200 {
        let shape = random_shape(&mut rng, -400.0, 600.0);
        qt.relocate(i, shape).unwrap();
    }
    assert_matches_brute_force(&qt, &mut rng, 30);
    qt.update();
    assert_eq!(qt.pending_count(), 0);
    for i in 0..200 {
        let membership = qt.membership(i).unwrap();
        let (x, y) = membership.shape.center();
        // Leaf cells on the outer edge may round by an ulp going through center form.
        let mut cell = membership.node.unwrap().bounds;
        cell.width += 1e-3;
        cell.height += 1e-3;
        assert!(cell.contains_point(x, y));
    }
    assert_matches_brute_force(&qt, &mut rng, 30);
}

#[test]
fn test_segment_results_sorted_by_distance() {
    let mut qt = hundred();
    qt.insert(3, rect(50.0, 5.0, 4.0, 4.0)).unwrap();
    qt.insert(1, rect(10.0, 5.0, 4.0, 4.0)).unwrap();
    qt.insert(2, rect(30.0, 5.0, 4.0, 4.0)).unwrap();
    qt.insert(4, rect(30.0, 40.0, 4.0, 4.0)).unwrap();

    let mut hits = Vec::new();
    let forward = Segment::from_ray(0.0, 5.0, 1.0, 0.0, 100.0, 1.0);
    qt.collisions_segment(&forward, &mut hits).unwrap();
    assert_eq!(hits, vec![1, 2, 3]);

    let mut hits = Vec::new();
    let backward = Segment::from_ray(100.0, 5.0, -1.0, 0.0, 100.0, 1.0);
    qt.collisions_segment(&backward, &mut hits).unwrap();
    assert_eq!(hits, vec![3, 2, 1]);

    let mut hits = Vec::new();
    let short = Segment::from_ray(0.0, 5.0, 1.0, 0.0, 20.0, 1.0);
    qt.collisions_segment(&short, &mut hits).unwrap();
    assert_eq!(hits, vec![1]);
}

#[test]
fn test_rotated_queries() {
    let mut qt = hundred();
    qt.insert(0, ShapeEnum::Point(Point::new(50.0, 50.0))).unwrap();
    qt.insert(1, ShapeEnum::Point(Point::new(55.0, 55.0))).unwrap();
    qt.insert(2, ShapeEnum::Point(Point::new(55.0, 45.0))).unwrap();

    // Long thin box along the main diagonal.
    let diagonal = RotRect::centered(50.0, 50.0, 30.0, 2.0, PI / 4.0);
    let mut hits = Vec::new();
    qt.collisions_rot_rect(&diagonal, &mut hits).unwrap();
    hits.sort_unstable();
    assert_eq!(hits, vec![0, 1]);

    // A rotated item is classified by the center of its rotated envelope.
    let swung = RotRect::new(80.0, 80.0, 10.0, 2.0, PI / 2.0, 0.0, 0.0);
    qt.insert(3, ShapeEnum::RotRect(swung)).unwrap();
    let (cx, cy) = swung.center();
    assert!((cx - 79.0).abs() < 1e-3 && (cy - 85.0).abs() < 1e-3);
    assert_eq!(point_query(&qt, 79.0, 85.0), vec![3]);
    assert!(point_query(&qt, 85.0, 81.0).is_empty());
}

#[test]
fn test_circle_query_uses_closest_point() {
    let mut qt = hundred();
    qt.insert(0, rect(50.0, 50.0, 10.0, 10.0)).unwrap();
    let mut hits = Vec::new();
    // Near the corner: inside the inflated box but further than the radius.
    qt.collisions_circle_raw(58.0, 58.0, 3.5, &mut hits).unwrap();
    assert!(hits.is_empty());
    qt.collisions_circle_raw(58.0, 58.0, 5.0, &mut hits).unwrap();
    assert_eq!(hits, vec![0]);
}

#[test]
fn test_circle_with_fields_written_directly() {
    let config = Config {
        node_capacity: 1,
        ..Config::default()
    };
    let mut qt =
        QuadTree::new_with_config(Rectangle::new(50.0, 50.0, 100.0, 100.0), config).unwrap();
    let mut circle = Circle::new(20.0, 20.0, 1.0);
    circle.radius = 15.0;
    qt.insert(0, ShapeEnum::Circle(circle)).unwrap();
    qt.insert(1, ShapeEnum::Point(Point::new(80.0, 80.0))).unwrap();
    qt.insert(2, ShapeEnum::Point(Point::new(80.0, 20.0))).unwrap();
    qt.update();
    assert!(qt.node_count() > 1);

    // Tight bounds come from the written radius, so the rim is still found.
    assert_eq!(point_query(&qt, 34.0, 20.0), vec![0]);
    let mut hits = Vec::new();
    qt.collisions_circle_raw(40.0, 20.0, 4.5, &mut hits).unwrap();
    assert!(hits.is_empty());
    qt.collisions_circle_raw(40.0, 20.0, 6.0, &mut hits).unwrap();
    assert_eq!(hits, vec![0]);

    circle.radius = 2.0;
    assert!(qt.relocate(0, ShapeEnum::Circle(circle)).unwrap());
    qt.update();
    assert!(point_query(&qt, 34.0, 20.0).is_empty());
    assert_eq!(point_query(&qt, 21.5, 20.0), vec![0]);
}

#[test]
fn test_degenerate_query_is_point_containment() {
    let mut qt = hundred();
    qt.insert(0, rect(20.0, 20.0, 10.0, 10.0)).unwrap();
    qt.insert(1, ShapeEnum::Circle(Circle::new(60.0, 60.0, 5.0)))
        .unwrap();
    assert_eq!(query(&qt, &rect(25.0, 25.0, 0.0, 0.0)), vec![0]);
    assert_eq!(
        query(&qt, &ShapeEnum::Circle(Circle::new(64.0, 60.0, 0.0))),
        vec![1]
    );
    assert!(query(&qt, &rect(25.1, 25.0, 0.0, 0.0)).is_empty());
}

#[test]
fn test_collisions_batch() {
    let mut quadtree = QuadTree::new(Rectangle::new(5.0, 5.0, 10.0, 10.0)).unwrap();
    quadtree
        .insert(1, ShapeEnum::Circle(Circle::new(2.0, 2.0, 1.0)))
        .unwrap();
    quadtree
        .insert(2, ShapeEnum::Circle(Circle::new(4.0, 4.0, 1.0)))
        .unwrap();
    quadtree
        .insert(3, ShapeEnum::Circle(Circle::new(6.0, 6.0, 1.0)))
        .unwrap();

    let queries = vec![
        ShapeEnum::Circle(Circle::new(2.0, 2.0, 1.5)),
        ShapeEnum::Circle(Circle::new(6.0, 6.0, 1.5)),
        ShapeEnum::Circle(Circle::new(8.0, 8.0, 1.0)),
    ];
    let results = quadtree.collisions_batch(&queries).unwrap();
    assert_eq!(results, vec![vec![1], vec![3], vec![]]);
}

#[test]
fn test_collisions_with_callback() {
    let mut qt = hundred();
    for i in 0..5 {
        qt.insert(i, rect(10.0 + 10.0 * i as f32, 50.0, 2.0, 2.0))
            .unwrap();
    }
    let mut seen = Vec::new();
    qt.collisions_with(&rect(30.0, 50.0, 24.0, 4.0), |value| seen.push(value))
        .unwrap();
    seen.sort_unstable();
    assert_eq!(seen, vec![1, 2, 3]);
}

#[test]
fn test_shrink_fits_item_points() {
    let mut qt = QuadTree::new(Rectangle::new(500.0, 500.0, 1000.0, 1000.0)).unwrap();
    qt.insert(0, rect(10.0, 10.0, 4.0, 4.0)).unwrap();
    qt.insert(1, ShapeEnum::Circle(Circle::new(20.0, 30.0, 2.0)))
        .unwrap();
    qt.shrink();
    assert_eq!(qt.bounds(), Some(Rectangle::new(15.0, 20.0, 10.0, 20.0)));
    assert_eq!(point_query(&qt, 10.0, 10.0), vec![0]);
    assert_eq!(point_query(&qt, 20.0, 30.0), vec![1]);

    let mut single = QuadTree::unbounded();
    single.shrink();
    assert!(single.bounds().is_none());
    single.insert(0, ShapeEnum::Point(Point::new(3.0, 4.0))).unwrap();
    single.insert(1, ShapeEnum::Point(Point::new(3.0, 4.0))).unwrap();
    single.shrink();
    assert_eq!(single.bounds(), Some(Rectangle::new(3.0, 4.0, 1.0, 1.0)));
}

#[test]
fn test_set_bounds_parks_outside_items() {
    let mut qt = hundred();
    qt.insert(0, rect(10.0, 10.0, 2.0, 2.0)).unwrap();
    qt.insert(1, rect(90.0, 90.0, 2.0, 2.0)).unwrap();
    qt.set_bounds(Rectangle::new(25.0, 25.0, 50.0, 50.0)).unwrap();
    assert_eq!(qt.pending_count(), 1);
    assert!(point_query(&qt, 90.0, 90.0).is_empty());
    assert_eq!(point_query(&qt, 10.0, 10.0), vec![0]);

    qt.update();
    assert_eq!(qt.bounds(), Some(Rectangle::new(45.0, 45.0, 90.0, 90.0)));
    assert_eq!(point_query(&qt, 90.0, 90.0), vec![1]);
}

#[test]
fn test_clear_and_storage_reuse() {
    let mut qt = hundred();
    for i in 0..100 {
        qt.insert(i, rect(1.0 + (i % 10) as f32 * 9.0, 1.0 + (i / 10) as f32 * 9.0, 1.0, 1.0))
            .unwrap();
    }
    qt.update();
    let before = qt.storage_counts();
    assert_eq!(before.items, 100);
    assert!(before.nodes > 1);

    qt.clear();
    assert!(qt.is_empty());
    assert!(qt.bounds().is_none());
    let cleared = qt.storage_counts();
    assert_eq!(cleared.nodes, 0);
    assert_eq!(cleared.items, 0);
    assert_eq!(cleared.item_slots, before.item_slots);

    qt.insert(7, rect(3.0, 3.0, 1.0, 1.0)).unwrap();
    assert_eq!(qt.storage_counts().item_slots, before.item_slots);
    assert_eq!(point_query(&qt, 3.0, 3.0), vec![7]);
}

#[test]
fn test_membership_and_bundles() {
    let mut qt = QuadTree::new_with_config(
        Rectangle::new(50.0, 50.0, 100.0, 100.0),
        Config {
            node_capacity: 1,
            ..Config::default()
        },
    )
    .unwrap();
    qt.insert(0, rect(20.0, 20.0, 2.0, 2.0)).unwrap();
    qt.insert(1, rect(80.0, 80.0, 2.0, 2.0)).unwrap();
    qt.insert(2, rect(500.0, 80.0, 2.0, 2.0)).unwrap();
    qt.update();
    qt.relocate(2, rect(900.0, 80.0, 2.0, 2.0)).unwrap();

    let membership = qt.membership(0).unwrap();
    assert_eq!(membership.shape, rect(20.0, 20.0, 2.0, 2.0));
    let node = membership.node.unwrap();
    assert!(node.is_leaf);
    assert!(node.depth >= 1);
    assert!(node.bounds.contains_point(20.0, 20.0));
    assert!(qt.membership(2).unwrap().node.is_none());
    assert!(qt.membership(42).is_none());
    assert_eq!(qt.shape(1), Some(&rect(80.0, 80.0, 2.0, 2.0)));

    let mut bundles = qt.bundles();
    bundles.sort_by_key(|(value, _)| *value);
    assert_eq!(bundles.len(), 3);
    assert!(bundles[0].1.unwrap().contains_point(20.0, 20.0));
    assert!(bundles[1].1.unwrap().contains_point(80.0, 80.0));
    assert!(bundles[2].1.is_none());
}

#[test]
fn test_history_undo_redo() {
    let mut history = HistoryQuadTree::new(hundred());
    assert!(!history.undo().unwrap());

    history.insert(0, rect(10.0, 10.0, 2.0, 2.0)).unwrap();
    history.insert(1, rect(20.0, 20.0, 2.0, 2.0)).unwrap();
    history.relocate(1, rect(70.0, 70.0, 2.0, 2.0)).unwrap();
    history.delete(0);
    assert!(!history.tree().contains(0));

    assert!(history.undo().unwrap());
    assert!(history.tree().contains(0));
    assert_eq!(history.tree().shape(0), Some(&rect(10.0, 10.0, 2.0, 2.0)));

    assert!(history.undo().unwrap());
    assert_eq!(history.tree().shape(1), Some(&rect(20.0, 20.0, 2.0, 2.0)));
    assert_eq!(point_query(history.tree(), 20.0, 20.0), vec![1]);

    assert!(history.redo().unwrap());
    assert_eq!(history.tree().shape(1), Some(&rect(70.0, 70.0, 2.0, 2.0)));
    assert!(history.can_redo());

    // A fresh mutation drops the redo stack.
    history.insert(2, rect(30.0, 30.0, 2.0, 2.0)).unwrap();
    assert!(!history.can_redo());
    assert!(!history.redo().unwrap());

    while history.undo().unwrap() {}
    assert!(history.tree().is_empty());
    assert!(!history.can_undo());
}

#[test]
fn test_history_restores_bounds() {
    let mut history = HistoryQuadTree::new(hundred());
    history.insert(0, rect(10.0, 10.0, 2.0, 2.0)).unwrap();
    history.relocate(0, rect(500.0, 500.0, 2.0, 2.0)).unwrap();
    history.update();
    assert_eq!(
        history.tree().bounds(),
        Some(Rectangle::new(250.0, 250.0, 500.0, 500.0))
    );

    history.undo().unwrap();
    assert_eq!(
        history.tree().bounds(),
        Some(Rectangle::new(50.0, 50.0, 100.0, 100.0))
    );
    assert_eq!(point_query(history.tree(), 10.0, 10.0), vec![0]);

    history.set_bounds(Rectangle::new(5.0, 5.0, 20.0, 20.0)).unwrap();
    history.undo().unwrap();
    assert_eq!(
        history.tree().bounds(),
        Some(Rectangle::new(50.0, 50.0, 100.0, 100.0))
    );
}

#[test]
fn test_history_clear_round_trip() {
    let mut history = HistoryQuadTree::unbounded_with_config(Config::default());
    for i in 0..20 {
        history
            .insert(i, ShapeEnum::Point(Point::new(i as f32, 2.0 * i as f32)))
            .unwrap();
    }
    history.update();
    let bounds = history.tree().bounds();

    history.clear();
    assert!(history.tree().is_empty());
    assert!(history.tree().bounds().is_none());

    history.undo().unwrap();
    assert_eq!(history.tree().len(), 20);
    assert_eq!(history.tree().bounds(), bounds);
    history.update();
    for i in 0..20 {
        assert_eq!(point_query(history.tree(), i as f32, 2.0 * i as f32), vec![i]);
    }

    history.redo().unwrap();
    assert!(history.tree().is_empty());
    let tree = history.into_inner();
    assert_eq!(tree.node_count(), 0);
}
