//! Linear-time tree layout.
//!
//! Positions every node of a [`Tree`] for drawing, using the Buchheim/Walker
//! algorithm: a post-order pass places subtrees side by side, pushing each
//! subtree right just far enough to clear the contour of its left neighbours;
//! a pre-order pass then turns the accumulated offsets into absolute
//! coordinates. Threads let contour walks skip over shallow subtrees, so the
//! whole layout runs in O(n) regardless of branching factor.
//!
//! The result is a pure function of the tree's shape and per-node sizes:
//! laying out an unchanged tree twice produces bit-identical coordinates.

use std::collections::HashMap;

use crate::error::LayoutError;
use crate::node::{NodeId, Size};
use crate::tree::Tree;

/// Spacing constants applied during normalization.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutConfig {
    /// Multiplier applied to normalized x positions.
    pub horizontal_spacing: f64,
    /// Multiplier applied to normalized y positions.
    pub vertical_spacing: f64,
    /// Minimum separation between neighbouring subtrees, in layout units.
    pub distance: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_spacing: 2.01,
            vertical_spacing: 4.01,
            distance: 1.0,
        }
    }
}

/// Axis-aligned screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Whether the two rectangles share interior area. Touching edges do not
    /// count as overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        Rect {
            x,
            y,
            width: self.right().max(other.right()) - x,
            height: self.bottom().max(other.bottom()) - y,
        }
    }
}

/// Computed position of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Placement {
    pub node: NodeId,
    /// Normalized, spacing-scaled column position (strictly positive).
    pub x: f64,
    /// Normalized, spacing-scaled row position (strictly positive).
    pub y: f64,
    /// On-screen rectangle: `x` and `y` scaled by the largest node width and
    /// height in the tree, sized to this node.
    pub rect: Rect,
}

/// Placements for every node of a tree, in pre-order.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Layout {
    placements: Vec<Placement>,
    #[cfg_attr(feature = "serde", serde(skip))]
    index: HashMap<NodeId, usize>,
}

impl Layout {
    pub fn get(&self, node: NodeId) -> Option<&Placement> {
        self.index.get(&node).map(|&i| &self.placements[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &Placement> {
        self.placements.iter()
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    /// Bounding box of every node rectangle.
    pub fn bounds(&self) -> Option<Rect> {
        self.placements
            .iter()
            .map(|placement| placement.rect)
            .reduce(|acc, rect| acc.union(&rect))
    }
}

impl<'a> IntoIterator for &'a Layout {
    type Item = &'a Placement;
    type IntoIter = std::slice::Iter<'a, Placement>;

    fn into_iter(self) -> Self::IntoIter {
        self.placements.iter()
    }
}

/// Lays out `tree`.
///
/// # Errors
///
/// Returns [`LayoutError::IntegrityCheckFailed`] if the tree does not pass
/// [`Tree::validate`]; the tree is never repaired here.
pub fn compute<C>(tree: &Tree<C>, config: &LayoutConfig) -> Result<Layout, LayoutError> {
    tree.validate().map_err(LayoutError::IntegrityCheckFailed)?;

    let mut walker = Walker::new(tree, config.distance);
    walker.first_walk(0);
    let min_x = walker.second_walk(0, 0.0, 0);
    if min_x < 0.0 {
        walker.third_walk(-min_x);
    }

    // After the shift every x is non-negative; the root sits on row 0.
    let min_x = walker
        .nodes
        .iter()
        .map(|node| node.x)
        .fold(f64::INFINITY, f64::min);
    let min_y = 0.0;

    // Positions scale by one shared cell so mixed node sizes keep the
    // separation the walker guarantees in layout units.
    let sizes: Vec<Size> = walker
        .nodes
        .iter()
        .map(|scratch| tree.get(scratch.id).map(|node| node.size()).unwrap_or_default())
        .collect();
    let cell = sizes.iter().fold(Size::new(0.0, 0.0), |cell, size| {
        Size::new(cell.width.max(size.width), cell.height.max(size.height))
    });

    let mut layout = Layout::default();
    for (position, (scratch, size)) in walker.nodes.iter().zip(&sizes).enumerate() {
        let x = (scratch.x + min_x + 1.0) * config.horizontal_spacing;
        let y = (scratch.depth as f64 + min_y + 1.0) * config.vertical_spacing;
        layout.placements.push(Placement {
            node: scratch.id,
            x,
            y,
            rect: Rect {
                x: x * cell.width,
                y: y * cell.height,
                width: size.width,
                height: size.height,
            },
        });
        layout.index.insert(scratch.id, position);
    }
    Ok(layout)
}

/// Per-node scratch state for one layout pass.
#[derive(Debug, Clone)]
struct Scratch {
    id: NodeId,
    parent: Option<usize>,
    children: Vec<usize>,
    /// 1-based position among siblings.
    number: usize,
    depth: usize,
    x: f64,
    modifier: f64,
    shift: f64,
    change: f64,
    thread: Option<usize>,
    ancestor: usize,
}

/// Scratch nodes indexed in pre-order; index 0 is the root.
struct Walker {
    nodes: Vec<Scratch>,
    distance: f64,
}

impl Walker {
    fn new<C>(tree: &Tree<C>, distance: f64) -> Self {
        let order = tree.pre_order();
        let position: HashMap<NodeId, usize> =
            order.iter().enumerate().map(|(i, id)| (*id, i)).collect();

        let mut nodes: Vec<Scratch> = order
            .iter()
            .enumerate()
            .map(|(i, &id)| Scratch {
                id,
                parent: tree.parent(id).and_then(|p| position.get(&p).copied()),
                children: tree
                    .children(id)
                    .iter()
                    .filter_map(|child| position.get(child).copied())
                    .collect(),
                number: 1,
                depth: 0,
                x: 0.0,
                modifier: 0.0,
                shift: 0.0,
                change: 0.0,
                thread: None,
                ancestor: i,
            })
            .collect();

        // Pre-order guarantees parents are finalized before their children.
        for i in 0..nodes.len() {
            let depth = nodes[i].depth;
            for (k, child) in nodes[i].children.clone().into_iter().enumerate() {
                nodes[child].number = k + 1;
                nodes[child].depth = depth + 1;
            }
        }

        Self { nodes, distance }
    }

    fn left(&self, v: usize) -> Option<usize> {
        self.nodes[v]
            .thread
            .or_else(|| self.nodes[v].children.first().copied())
    }

    fn right(&self, v: usize) -> Option<usize> {
        self.nodes[v]
            .thread
            .or_else(|| self.nodes[v].children.last().copied())
    }

    fn left_brother(&self, v: usize) -> Option<usize> {
        let parent = self.nodes[v].parent?;
        let number = self.nodes[v].number;
        (number > 1).then(|| self.nodes[parent].children[number - 2])
    }

    fn leftmost_sibling(&self, v: usize) -> Option<usize> {
        let parent = self.nodes[v].parent?;
        let first = self.nodes[parent].children[0];
        (first != v).then_some(first)
    }

    fn first_walk(&mut self, v: usize) {
        let children = self.nodes[v].children.clone();
        let Some((&first, &last)) = children.first().zip(children.last()) else {
            self.nodes[v].x = match self.left_brother(v) {
                Some(w) => self.nodes[w].x + self.distance,
                None => 0.0,
            };
            return;
        };

        let mut default_ancestor = first;
        for &w in &children {
            self.first_walk(w);
            default_ancestor = self.apportion(w, default_ancestor);
        }
        self.execute_shifts(v);

        let midpoint = (self.nodes[first].x + self.nodes[last].x) / 2.0;
        match self.left_brother(v) {
            Some(w) => {
                let x = self.nodes[w].x + self.distance;
                self.nodes[v].x = x;
                self.nodes[v].modifier = x - midpoint;
            }
            None => self.nodes[v].x = midpoint,
        }
    }

    fn apportion(&mut self, v: usize, default_ancestor: usize) -> usize {
        let Some(w) = self.left_brother(v) else {
            return default_ancestor;
        };
        let mut default_ancestor = default_ancestor;

        // Inner/outer contour walkers on the right (v's subtree) and left
        // (already placed siblings) sides.
        let (mut vir, mut vor) = (v, v);
        let mut vil = w;
        let mut vol = self.leftmost_sibling(v).unwrap_or(w);
        let mut sir = self.nodes[v].modifier;
        let mut sor = sir;
        let mut sil = self.nodes[vil].modifier;
        let mut sol = self.nodes[vol].modifier;

        while let (Some(next_il), Some(next_ir)) = (self.right(vil), self.left(vir)) {
            vil = next_il;
            vir = next_ir;
            vol = self.left(vol).unwrap_or(vol);
            vor = self.right(vor).unwrap_or(vor);
            self.nodes[vor].ancestor = v;

            let shift = (self.nodes[vil].x + sil) - (self.nodes[vir].x + sir) + self.distance;
            if shift > 0.0 {
                let ancestor = self.ancestor(vil, v, default_ancestor);
                self.move_subtree(ancestor, v, shift);
                sir += shift;
                sor += shift;
            }
            sil += self.nodes[vil].modifier;
            sir += self.nodes[vir].modifier;
            sol += self.nodes[vol].modifier;
            sor += self.nodes[vor].modifier;
        }

        if let Some(thread) = self.right(vil)
            && self.right(vor).is_none()
        {
            self.nodes[vor].thread = Some(thread);
            self.nodes[vor].modifier += sil - sor;
        } else {
            if let Some(thread) = self.left(vir)
                && self.left(vol).is_none()
            {
                self.nodes[vol].thread = Some(thread);
                self.nodes[vol].modifier += sir - sol;
            }
            default_ancestor = v;
        }
        default_ancestor
    }

    /// The greatest distinct ancestor of `vil` and `v`: `vil`'s recorded
    /// ancestor when that is a sibling of `v`, otherwise the default.
    fn ancestor(&self, vil: usize, v: usize, default_ancestor: usize) -> usize {
        let candidate = self.nodes[vil].ancestor;
        if self.nodes[candidate].parent.is_some() && self.nodes[candidate].parent == self.nodes[v].parent
        {
            candidate
        } else {
            default_ancestor
        }
    }

    fn move_subtree(&mut self, wl: usize, wr: usize, shift: f64) {
        let subtrees = (self.nodes[wr].number - self.nodes[wl].number) as f64;
        self.nodes[wr].change -= shift / subtrees;
        self.nodes[wr].shift += shift;
        self.nodes[wl].change += shift / subtrees;
        self.nodes[wr].x += shift;
        self.nodes[wr].modifier += shift;
    }

    fn execute_shifts(&mut self, v: usize) {
        let mut shift = 0.0;
        let mut change = 0.0;
        for i in (0..self.nodes[v].children.len()).rev() {
            let w = self.nodes[v].children[i];
            self.nodes[w].x += shift;
            self.nodes[w].modifier += shift;
            change += self.nodes[w].change;
            shift += self.nodes[w].shift + change;
        }
    }

    /// Converts relative offsets into absolute x and returns the minimum x.
    fn second_walk(&mut self, v: usize, m: f64, depth: usize) -> f64 {
        self.nodes[v].x += m;
        self.nodes[v].depth = depth;
        let mut min = self.nodes[v].x;
        let m = m + self.nodes[v].modifier;
        for i in 0..self.nodes[v].children.len() {
            let w = self.nodes[v].children[i];
            min = min.min(self.second_walk(w, m, depth + 1));
        }
        min
    }

    fn third_walk(&mut self, n: f64) {
        for node in &mut self.nodes {
            node.x += n;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::composite::Policy;
    use crate::leaves::Succeed;
    use crate::node::NodeKind;

    #[test]
    fn single_root_sits_at_the_normalized_origin() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let layout = compute(&tree, &LayoutConfig::default()).unwrap();

        let placement = layout.get(root).unwrap();
        assert_eq!(placement.x, 2.01);
        assert_eq!(placement.y, 4.01);
        assert_eq!(placement.rect.x, 2.01 * 150.0);
        assert_eq!(placement.rect.width, 150.0);
    }

    #[test]
    fn parent_is_centred_over_its_children() {
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("A").unwrap();
        let b = tree.add_child(root, "B", NodeKind::leaf(Succeed)).unwrap();
        let c = tree.add_child(root, "C", NodeKind::leaf(Succeed)).unwrap();
        let d = tree.add_child(root, "D", NodeKind::leaf(Succeed)).unwrap();

        let mut walker = Walker::new(&tree, 1.0);
        walker.first_walk(0);
        walker.second_walk(0, 0.0, 0);
        let x: Vec<_> = walker.nodes.iter().map(|n| n.x).collect();
        assert_eq!(x, vec![1.0, 0.0, 1.0, 2.0]);
        assert_eq!(walker.nodes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![root, b, c, d]);
    }

    #[test]
    fn neighbouring_subtrees_are_pushed_apart() {
        // origin -> [left: [a, b, c], right: [d, e, f]]
        let mut tree: Tree<()> = Tree::new();
        let root = tree.add_root("origin").unwrap();
        let left = tree.add_child(root, "left", NodeKind::Composite(Policy::Sequence)).unwrap();
        let right = tree.add_child(root, "right", NodeKind::Composite(Policy::Sequence)).unwrap();
        for name in ["a", "b", "c"] {
            tree.add_child(left, name, NodeKind::leaf(Succeed)).unwrap();
        }
        for name in ["d", "e", "f"] {
            tree.add_child(right, name, NodeKind::leaf(Succeed)).unwrap();
        }

        let layout = compute(&tree, &LayoutConfig::default()).unwrap();
        let row: Vec<f64> = tree
            .children(left)
            .iter()
            .chain(tree.children(right))
            .map(|id| layout.get(*id).unwrap().x)
            .collect();
        assert!(row.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(layout.get(left).unwrap().x < layout.get(right).unwrap().x);
    }

    #[test]
    fn layout_refuses_a_tree_that_fails_validation() {
        let tree: Tree<()> = Tree::new();
        assert!(matches!(
            compute(&tree, &LayoutConfig::default()),
            Err(LayoutError::IntegrityCheckFailed(_))
        ));
    }

    #[test]
    fn rect_overlap_ignores_touching_edges() {
        let a = Rect {
            x: 0.0,
            y: 0.0,
            width: 10.0,
            height: 10.0,
        };
        let b = Rect { x: 10.0, ..a };
        let c = Rect { x: 5.0, ..a };
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert_eq!(a.union(&b).width, 20.0);
    }
}
