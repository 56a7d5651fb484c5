//! Ordering types for sorted sequences.
//!
//! Provides [`Dir`] for sort direction, [`OrderBy`] for one sort key, and
//! the [`Ordered`] node built by `order_by` and extended by `then_by`.

use std::cmp::Ordering;
use std::fmt;

use tracing::trace;

use crate::sequence::{Iter, Sequence};

/// Which way a sort key runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    /// Smallest first.
    Asc,
    /// Largest first.
    Desc,
}

impl Dir {
    /// Orients a key comparison; `Desc` flips it.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }
}

/// A single sort key: a selector, a comparator over the selected values and
/// a direction.
pub struct OrderBy<'f, T> {
    compare: Box<dyn Fn(&T, &T) -> Ordering + 'f>,
    dir: Dir,
}

impl<'f, T> OrderBy<'f, T> {
    /// Creates a sort key comparing `selector(element)` with `comparator`.
    pub fn new<P, F, C>(selector: F, comparator: C, dir: Dir) -> Self
    where
        F: Fn(&T) -> P + 'f,
        C: Fn(&P, &P) -> Ordering + 'f,
    {
        OrderBy {
            compare: Box::new(move |a: &T, b: &T| comparator(&selector(a), &selector(b))),
            dir,
        }
    }

    /// Creates an ascending key using the natural order of the selected value.
    pub fn asc<P: Ord + 'f, F>(selector: F) -> Self
    where
        F: Fn(&T) -> P + 'f,
    {
        OrderBy::new(selector, P::cmp, Dir::Asc)
    }

    /// Creates a descending key using the natural order of the selected value.
    pub fn desc<P: Ord + 'f, F>(selector: F) -> Self
    where
        F: Fn(&T) -> P + 'f,
    {
        OrderBy::new(selector, P::cmp, Dir::Desc)
    }

    /// Returns the direction of this key.
    pub fn dir(&self) -> Dir {
        self.dir
    }

    /// Compares two elements according to this key.
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        self.dir.apply((self.compare)(a, b))
    }
}

impl<T> fmt::Debug for OrderBy<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OrderBy").field("dir", &self.dir).finish()
    }
}

/// Compares two items using a list of sort keys.
///
/// Uses the first key as the primary sort key, the second to break ties, etc.
/// If all keys compare equal, returns `Equal`.
pub fn compare_by_orderings<T>(a: &T, b: &T, orderings: &[OrderBy<'_, T>]) -> Ordering {
    for order_by in orderings {
        let ordering = order_by.compare(a, b);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// A sequence sorted by one or more keys, most significant first.
///
/// Built by `order_by` and friends; further keys are appended with
/// [`then_by`](Ordered::then_by). Traversal materializes the upstream and
/// sorts it with a stable sort, so elements that tie on every key keep
/// their upstream order.
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Ordered<'f, S: Sequence> {
    source: S,
    orderings: Vec<OrderBy<'f, S::Item>>,
}

impl<'f, S: Sequence> Ordered<'f, S> {
    pub(crate) fn new(source: S, ordering: OrderBy<'f, S::Item>) -> Self {
        Ordered {
            source,
            orderings: vec![ordering],
        }
    }

    /// Adds a sort key.
    pub fn then(mut self, ordering: OrderBy<'f, S::Item>) -> Self {
        self.orderings.push(ordering);
        self
    }

    /// Adds an ascending secondary key.
    pub fn then_by<P: Ord + 'f, F>(self, selector: F) -> Self
    where
        F: Fn(&S::Item) -> P + 'f,
    {
        self.then(OrderBy::new(selector, P::cmp, Dir::Asc))
    }

    /// Adds an ascending secondary key with a custom comparator.
    pub fn then_by_with<P, F, C>(self, selector: F, comparator: C) -> Self
    where
        F: Fn(&S::Item) -> P + 'f,
        C: Fn(&P, &P) -> Ordering + 'f,
    {
        self.then(OrderBy::new(selector, comparator, Dir::Asc))
    }

    /// Adds a descending secondary key.
    pub fn then_by_descending<P: Ord + 'f, F>(self, selector: F) -> Self
    where
        F: Fn(&S::Item) -> P + 'f,
    {
        self.then(OrderBy::new(selector, P::cmp, Dir::Desc))
    }

    /// Adds a descending secondary key with a custom comparator.
    pub fn then_by_descending_with<P, F, C>(self, selector: F, comparator: C) -> Self
    where
        F: Fn(&S::Item) -> P + 'f,
        C: Fn(&P, &P) -> Ordering + 'f,
    {
        self.then(OrderBy::new(selector, comparator, Dir::Desc))
    }

    /// Returns the sort keys, most significant first.
    pub fn orderings(&self) -> &[OrderBy<'f, S::Item>] {
        &self.orderings
    }
}

impl<S: Sequence> Sequence for Ordered<'_, S> {
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        let mut items: Vec<S::Item> = self.source.traverse().collect();
        trace!(
            len = items.len(),
            keys = self.orderings.len(),
            "sorting ordered sequence"
        );
        items.sort_by(|a, b| compare_by_orderings(a, b, &self.orderings));
        Box::new(items.into_iter())
    }
}
