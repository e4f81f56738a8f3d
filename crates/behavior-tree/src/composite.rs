//! Composite selection policies.
//!
//! Composite nodes control the execution flow of multiple children. This
//! module defines the four policies the scheduler understands and the
//! per-activation cursor ([`Order`]) that decides which child runs next.
//! Children are always executed one at a time; the scheduler starts the next
//! child only after the previous one has torn down.

use rand::Rng;

use crate::node::NodeType;
use crate::status::Status;

/// How a composite picks and combines its children.
///
/// # Semantics
///
/// - `Sequence`: children left to right; **stops on the first `Failure`** and
///   reports it, reports `Success` only if every child succeeds. A
///   short-circuited logical AND.
/// - `Selector`: children left to right; **stops on the first `Success`** and
///   reports it, reports `Failure` only if every child fails. A
///   short-circuited logical OR.
/// - `RandomSequence` / `RandomSelector`: the same short-circuit rules, but
///   each next child is drawn uniformly from the children not yet executed in
///   this activation.
///
/// A composite with no children reports `Failure` without ticking anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Policy {
    Sequence,
    Selector,
    RandomSequence,
    RandomSelector,
}

impl Policy {
    pub fn node_type(self) -> NodeType {
        match self {
            Policy::Sequence => NodeType::Sequence,
            Policy::Selector => NodeType::Selector,
            Policy::RandomSequence => NodeType::RandomSequence,
            Policy::RandomSelector => NodeType::RandomSelector,
        }
    }

    /// Whether children are drawn at random instead of in index order.
    pub fn is_random(self) -> bool {
        matches!(self, Policy::RandomSequence | Policy::RandomSelector)
    }

    /// The child status that stops the composite early.
    pub fn short_circuit_on(self) -> Status {
        match self {
            Policy::Sequence | Policy::RandomSequence => Status::Failure,
            Policy::Selector | Policy::RandomSelector => Status::Success,
        }
    }

    /// The status reported once every child ran without short-circuiting.
    ///
    /// `ran_any` is false for a composite without children, which always
    /// fails.
    pub fn exhausted(self, ran_any: bool) -> Status {
        if ran_any {
            self.short_circuit_on().invert()
        } else {
            Status::Failure
        }
    }
}

/// Per-activation child cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Order {
    InOrder { next: usize, len: usize },
    /// Child indices not yet drawn in this activation.
    Shuffled { remaining: Vec<usize> },
}

impl Order {
    pub(crate) fn new(policy: Policy, len: usize) -> Self {
        if policy.is_random() {
            Order::Shuffled {
                remaining: (0..len).collect(),
            }
        } else {
            Order::InOrder { next: 0, len }
        }
    }

    /// Picks the next child index, or `None` once every child has run.
    pub(crate) fn next_child(&mut self, rng: &mut impl Rng) -> Option<usize> {
        match self {
            Order::InOrder { next, len } => {
                if *next >= *len {
                    return None;
                }
                let index = *next;
                *next += 1;
                Some(index)
            }
            Order::Shuffled { remaining } => {
                if remaining.is_empty() {
                    return None;
                }
                let draw = rng.gen_range(0..remaining.len());
                Some(remaining.swap_remove(draw))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn sequence_and_selector_short_circuit_on_opposite_statuses() {
        assert_eq!(Policy::Sequence.short_circuit_on(), Status::Failure);
        assert_eq!(Policy::RandomSequence.short_circuit_on(), Status::Failure);
        assert_eq!(Policy::Selector.short_circuit_on(), Status::Success);
        assert_eq!(Policy::RandomSelector.short_circuit_on(), Status::Success);
    }

    #[test]
    fn exhausted_composites_report_the_non_short_circuit_status() {
        assert_eq!(Policy::Sequence.exhausted(true), Status::Success);
        assert_eq!(Policy::Selector.exhausted(true), Status::Failure);
    }

    #[test]
    fn empty_composites_fail() {
        for policy in [
            Policy::Sequence,
            Policy::Selector,
            Policy::RandomSequence,
            Policy::RandomSelector,
        ] {
            assert_eq!(policy.exhausted(false), Status::Failure);
        }
    }

    #[test]
    fn in_order_visits_every_index_once() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut order = Order::new(Policy::Sequence, 3);
        let drawn: Vec<_> = std::iter::from_fn(|| order.next_child(&mut rng)).collect();
        assert_eq!(drawn, vec![0, 1, 2]);
    }

    #[test]
    fn shuffled_draws_without_replacement() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let mut order = Order::new(Policy::RandomSelector, 6);
            let mut drawn: Vec<_> = std::iter::from_fn(|| order.next_child(&mut rng)).collect();
            drawn.sort_unstable();
            assert_eq!(drawn, vec![0, 1, 2, 3, 4, 5]);
        }
    }

    #[test]
    fn empty_order_yields_nothing() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(Order::new(Policy::RandomSequence, 0).next_child(&mut rng), None);
        assert_eq!(Order::new(Policy::Selector, 0).next_child(&mut rng), None);
    }
}
