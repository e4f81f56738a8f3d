mod common;

use std::collections::BTreeMap;

use behavior_tree::layout::{self, LayoutConfig};
use behavior_tree::leaves::Succeed;
use behavior_tree::{LayoutError, NodeId, NodeKind, Policy, Size, Tree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use common::Log;

fn a_b_c() -> (Tree<Log>, [NodeId; 3]) {
    let mut tree = Tree::new();
    let a = tree.add_root("A").unwrap();
    let b = tree.add_child(a, "B", NodeKind::leaf(Succeed)).unwrap();
    let c = tree.add_child(a, "C", NodeKind::leaf(Succeed)).unwrap();
    (tree, [a, b, c])
}

/// Builds a random tree of `size` nodes where every node may become a parent.
fn random_tree(rng: &mut StdRng, size: usize) -> Tree<Log> {
    let mut tree = Tree::new();
    let root = tree.add_root("root").unwrap();
    let mut parents = vec![root];
    for i in 1..size {
        let parent = parents[rng.gen_range(0..parents.len())];
        let child = tree
            .add_child(parent, format!("n{i}"), NodeKind::Composite(Policy::Sequence))
            .unwrap();
        parents.push(child);
    }
    tree
}

/// Placements grouped by depth, left to right.
fn rows(tree: &Tree<Log>, layout: &behavior_tree::Layout) -> BTreeMap<usize, Vec<f64>> {
    let mut rows: BTreeMap<usize, Vec<f64>> = BTreeMap::new();
    for id in tree.pre_order() {
        let depth = tree.depth_of(id).unwrap();
        rows.entry(depth).or_default().push(layout.get(id).unwrap().x);
    }
    rows
}

#[test]
fn siblings_are_ordered_and_do_not_overlap() {
    let (tree, [a, b, c]) = a_b_c();
    let layout = layout::compute(&tree, &LayoutConfig::default()).unwrap();

    let (pa, pb, pc) = (layout.get(a).unwrap(), layout.get(b).unwrap(), layout.get(c).unwrap());
    assert!(pb.x < pc.x);
    assert!(!pb.rect.overlaps(&pc.rect));
    assert!(!pa.rect.overlaps(&pb.rect));
    assert!(pa.y < pb.y);
    assert_eq!(pb.y, pc.y);
    // The parent is centred over its two children.
    assert!((pa.x - (pb.x + pc.x) / 2.0).abs() < 1e-9);
}

#[test]
fn layout_is_deterministic() {
    let mut rng = StdRng::seed_from_u64(5);
    let tree = random_tree(&mut rng, 40);
    let first = layout::compute(&tree, &LayoutConfig::default()).unwrap();
    let second = layout::compute(&tree, &LayoutConfig::default()).unwrap();

    assert_eq!(first, second);
    let bits = |l: &behavior_tree::Layout| -> Vec<(u64, u64)> {
        l.iter().map(|p| (p.rect.x.to_bits(), p.rect.y.to_bits())).collect()
    };
    assert_eq!(bits(&first), bits(&second));
}

#[test]
fn coordinates_are_strictly_positive_after_normalization() {
    // A wide subtree to the right of a leaf is pulled left of its parent,
    // which drives raw x values negative before normalization.
    let mut tree: Tree<Log> = Tree::new();
    let root = tree.add_root("root").unwrap();
    tree.add_child(root, "leaf", NodeKind::leaf(Succeed)).unwrap();
    let wide = tree.add_child(root, "wide", NodeKind::Composite(Policy::Selector)).unwrap();
    for i in 0..6 {
        tree.add_child(wide, format!("w{i}"), NodeKind::leaf(Succeed)).unwrap();
    }

    let layout = layout::compute(&tree, &LayoutConfig::default()).unwrap();
    assert_eq!(layout.len(), tree.len());
    for placement in &layout {
        assert!(placement.x > 0.0, "{placement:?}");
        assert!(placement.y > 0.0, "{placement:?}");
        assert!(placement.rect.x > 0.0 && placement.rect.y > 0.0);
    }

    let mut rng = StdRng::seed_from_u64(17);
    for size in [1, 2, 5, 13, 60] {
        let tree = random_tree(&mut rng, size);
        let layout = layout::compute(&tree, &LayoutConfig::default()).unwrap();
        assert!(layout.iter().all(|p| p.x > 0.0 && p.y > 0.0));
    }
}

#[test]
fn nodes_on_the_same_level_never_overlap() {
    let config = LayoutConfig::default();
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..25 {
        let size = rng.gen_range(2..50);
        let tree = random_tree(&mut rng, size);
        let layout = layout::compute(&tree, &config).unwrap();

        for (depth, row) in rows(&tree, &layout) {
            for pair in row.windows(2) {
                // Neighbours keep at least one unit of separation.
                assert!(
                    pair[1] - pair[0] >= config.distance * config.horizontal_spacing - 1e-9,
                    "depth {depth}: {row:?}"
                );
            }
        }
        let placements: Vec<_> = layout.iter().collect();
        for (i, p) in placements.iter().enumerate() {
            for q in &placements[i + 1..] {
                assert!(!p.rect.overlaps(&q.rect), "{p:?} overlaps {q:?}");
            }
        }
    }
}

#[test]
fn node_sizes_scale_the_rectangles() {
    let (mut tree, [_, b, _]) = a_b_c();
    tree.set_size(b, Size::new(40.0, 20.0)).unwrap();
    let layout = layout::compute(&tree, &LayoutConfig::default()).unwrap();

    // Positions use the largest node size; each rectangle keeps its own.
    let cell = Size::default();
    let pb = layout.get(b).unwrap();
    assert_eq!(pb.rect.width, 40.0);
    assert_eq!(pb.rect.height, 20.0);
    assert_eq!(pb.rect.x, pb.x * cell.width);
    assert_eq!(pb.rect.y, pb.y * cell.height);
}

/// Every pair of rectangles is disjoint and every child sits below its parent.
fn assert_disjoint_and_stacked(tree: &Tree<Log>, layout: &behavior_tree::Layout) {
    let placements: Vec<_> = layout.iter().collect();
    for (i, p) in placements.iter().enumerate() {
        for q in &placements[i + 1..] {
            assert!(!p.rect.overlaps(&q.rect), "{p:?} overlaps {q:?}");
        }
    }
    for edge in tree.edges() {
        let parent = layout.get(edge.parent).unwrap();
        let child = layout.get(edge.child).unwrap();
        assert!(child.rect.y > parent.rect.bottom(), "{child:?} is not below {parent:?}");
    }
}

#[test]
fn mixed_node_sizes_never_overlap() {
    let (mut tree, [a, b, c]) = a_b_c();
    tree.set_size(b, Size::new(300.0, 75.0)).unwrap();
    let layout = layout::compute(&tree, &LayoutConfig::default()).unwrap();
    assert_disjoint_and_stacked(&tree, &layout);
    assert!(layout.get(b).unwrap().rect.right() < layout.get(c).unwrap().rect.x);
    assert!(layout.get(a).unwrap().rect.bottom() < layout.get(b).unwrap().rect.y);

    let mut rng = StdRng::seed_from_u64(41);
    for _ in 0..20 {
        let size = rng.gen_range(2..40);
        let mut tree = random_tree(&mut rng, size);
        for id in tree.pre_order() {
            let node_size = Size::new(rng.gen_range(10.0..400.0), rng.gen_range(10.0..200.0));
            tree.set_size(id, node_size).unwrap();
        }
        let layout = layout::compute(&tree, &LayoutConfig::default()).unwrap();
        assert_disjoint_and_stacked(&tree, &layout);
    }
}

#[test]
fn layout_follows_structural_edits() {
    let (mut tree, [a, b, c]) = a_b_c();
    let before = layout::compute(&tree, &LayoutConfig::default()).unwrap();
    tree.delete(b).unwrap();
    let after = layout::compute(&tree, &LayoutConfig::default()).unwrap();

    assert!(after.get(b).is_none());
    assert_eq!(after.len(), 2);
    assert_ne!(before.get(c), after.get(c));
    assert_eq!(after.get(a).unwrap().x, after.get(c).unwrap().x);
}

#[test]
fn layout_is_blocked_when_the_tree_has_no_root() {
    let (mut tree, [a, ..]) = a_b_c();
    tree.delete(a).unwrap();
    assert!(matches!(
        layout::compute(&tree, &LayoutConfig::default()),
        Err(LayoutError::IntegrityCheckFailed(_))
    ));
}
