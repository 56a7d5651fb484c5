//! The operator surface.
//!
//! [`Query`] is an extension trait implemented for every [`Sequence`].
//! Operators consume `self` and return a new node wrapping it; terminal
//! evaluators borrow `self` and drive one traversal to completion (or until
//! the answer is known). To keep a source after chaining, chain on a
//! reference instead: `(&source).filter(..)` or `source.by_ref().filter(..)`.
//!
//! Naming follows a small set of suffixes:
//!
//! - `_with`: takes a custom comparator or equality check instead of
//!   `Ord::cmp` / `PartialEq::eq`.
//! - `_by`: compares a key selected from each element.
//! - `_where`: only elements matching a predicate count.
//! - `_or_none`: answers `None` where the plain form would fail.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

use crate::distinct::{Distinct, DistinctBy};
use crate::error::{Result, SeqError};
use crate::grouping::{BucketedGroupBy, GroupBy};
use crate::join::{clone_left, InnerJoin, LeftJoin, OuterJoin, RightJoin};
use crate::ordering::{Dir, OrderBy, Ordered};
use crate::sequence::{BoxedSequence, Sequence};
use crate::transform::{Concat, Filter, Inspect, Merge, Select, SelectMany, SelectManyWith};
use crate::value::{AsNumber, Number};
use crate::window::{
    Batch, Below, Every, Insert, Repeated, Reverse, Shuffle, SkipWhile, Tail, TailMode, TakeWhile,
};

/// Default equality check, `PartialEq::eq`.
pub type Equality<T> = fn(&T, &T) -> bool;

/// Default comparator, `Ord::cmp`.
pub type Comparison<T> = fn(&T, &T) -> Ordering;

/// Join result selector that keeps the left element.
pub type KeepLeft<T> = fn(&T, &T) -> T;

/// Operators and terminal evaluators for every [`Sequence`].
pub trait Query: Sequence {
    // ========================================================================
    // Plumbing
    // ========================================================================

    /// Borrows the sequence so operators can be chained without moving it.
    fn by_ref(&self) -> &Self {
        self
    }

    /// Erases the node type.
    fn boxed<'a>(self) -> BoxedSequence<'a, Self::Item>
    where
        Self: Sized + 'a,
    {
        Box::new(self)
    }

    // ========================================================================
    // Projection and filtering
    // ========================================================================

    /// Maps every element, one to one.
    fn select<R, F>(self, selector: F) -> Select<Self, F>
    where
        Self: Sized,
        F: Fn(Self::Item) -> R,
    {
        Select::new(self, selector)
    }

    /// Maps every element to a collection and flattens the collections.
    fn select_many<C, F>(self, selector: F) -> SelectMany<Self, F, C>
    where
        Self: Sized,
        C: IntoIterator,
        F: Fn(Self::Item) -> C,
    {
        SelectMany::new(self, selector)
    }

    /// Flattens per-element collections, combining each child with its
    /// parent element.
    fn select_many_with<C, F, G, R>(self, collection: F, result: G) -> SelectManyWith<Self, F, G, C>
    where
        Self: Sized,
        C: IntoIterator,
        F: Fn(&Self::Item) -> C,
        G: Fn(&Self::Item, C::Item) -> R,
    {
        SelectManyWith::new(self, collection, result)
    }

    /// Keeps the elements matching a predicate.
    #[doc(alias = "where")]
    fn filter<P>(self, predicate: P) -> Filter<Self, P>
    where
        Self: Sized,
        P: Fn(&Self::Item) -> bool,
    {
        Filter::new(self, predicate)
    }

    /// Runs an action on every element as it flows through.
    #[doc(alias = "pipe")]
    fn inspect<F>(self, action: F) -> Inspect<Self, F>
    where
        Self: Sized,
        F: Fn(&Self::Item),
    {
        Inspect::new(self, action)
    }

    // ========================================================================
    // Composition
    // ========================================================================

    /// Yields this sequence, then `other`.
    fn append_many<O>(self, other: O) -> Concat<Self, O>
    where
        Self: Sized,
        O: Sequence<Item = Self::Item>,
    {
        Concat::new(self, other)
    }

    /// Yields `other`, then this sequence.
    fn prepend_many<O>(self, other: O) -> Concat<O, Self>
    where
        Self: Sized,
        O: Sequence<Item = Self::Item>,
    {
        other.append_many(self)
    }

    /// Yields this sequence, then `element`.
    fn append(self, element: Self::Item) -> Concat<Self, [Self::Item; 1]>
    where
        Self: Sized,
    {
        Concat::new(self, [element])
    }

    /// Yields `element`, then this sequence.
    fn prepend(self, element: Self::Item) -> Concat<[Self::Item; 1], Self>
    where
        Self: Sized,
    {
        Concat::new([element], self)
    }

    /// Yields `elements` right before the element at `index`.
    ///
    /// `index` equal to the length appends; a larger index inserts nothing.
    fn insert_many<I>(self, index: usize, elements: I) -> Insert<Self, I>
    where
        Self: Sized,
        I: Sequence<Item = Self::Item>,
    {
        Insert::new(self, index, elements)
    }

    /// Yields `element` right before the element at `index`.
    fn insert(self, index: usize, element: Self::Item) -> Insert<Self, [Self::Item; 1]>
    where
        Self: Sized,
    {
        Insert::new(self, index, [element])
    }

    /// Yields the whole sequence `times` times.
    fn repeat(self, times: usize) -> Repeated<Self>
    where
        Self: Sized,
    {
        Repeated::new(self, times)
    }

    /// Lazily merges two sequences that are each ordered by `Ord`.
    fn merge<O>(self, other: O) -> Merge<Self, O, Comparison<Self::Item>>
    where
        Self: Sized,
        Self::Item: Ord,
        O: Sequence<Item = Self::Item>,
    {
        Merge::new(self, other, Ord::cmp as Comparison<Self::Item>)
    }

    /// Lazily merges two sequences that are each ordered by `comparator`.
    ///
    /// When both heads compare equal the element from `self` comes first.
    fn merge_with<O, C>(self, other: O, comparator: C) -> Merge<Self, O, C>
    where
        Self: Sized,
        O: Sequence<Item = Self::Item>,
        C: Fn(&Self::Item, &Self::Item) -> Ordering,
    {
        Merge::new(self, other, comparator)
    }

    // ========================================================================
    // Distinct and set algebra
    // ========================================================================

    /// Drops elements equal to an earlier one.
    fn distinct(self) -> Distinct<Self, Equality<Self::Item>, Self::Item>
    where
        Self: Sized,
        Self::Item: Clone + PartialEq,
    {
        self.distinct_with(PartialEq::eq as Equality<Self::Item>)
    }

    /// Drops elements equal to an earlier one under `equality`.
    fn distinct_with<E>(self, equality: E) -> Distinct<Self, E, Self::Item>
    where
        Self: Sized,
        Self::Item: Clone,
        E: Fn(&Self::Item, &Self::Item) -> bool,
    {
        DistinctBy::new(self, Clone::clone as fn(&Self::Item) -> Self::Item, equality)
    }

    /// Keeps the first element for every distinct key.
    fn distinct_by<K, F>(self, key_selector: F) -> DistinctBy<Self, F, Equality<K>, K>
    where
        Self: Sized,
        K: PartialEq,
        F: Fn(&Self::Item) -> K,
    {
        DistinctBy::new(self, key_selector, PartialEq::eq as Equality<K>)
    }

    /// Keeps the first element for every distinct key under `equality`.
    fn distinct_by_with<K, F, E>(self, key_selector: F, equality: E) -> DistinctBy<Self, F, E, K>
    where
        Self: Sized,
        F: Fn(&Self::Item) -> K,
        E: Fn(&K, &K) -> bool,
    {
        DistinctBy::new(self, key_selector, equality)
    }

    /// Both sequences with duplicates collapsed, first occurrence winning.
    fn union<O>(self, other: O) -> Distinct<Concat<Self, O>, Equality<Self::Item>, Self::Item>
    where
        Self: Sized,
        Self::Item: Clone + PartialEq,
        O: Sequence<Item = Self::Item>,
    {
        self.append_many(other).distinct()
    }

    /// [`union`](Query::union) under a custom equality check.
    fn union_with<O, E>(self, other: O, equality: E) -> Distinct<Concat<Self, O>, E, Self::Item>
    where
        Self: Sized,
        Self::Item: Clone,
        O: Sequence<Item = Self::Item>,
        E: Fn(&Self::Item, &Self::Item) -> bool,
    {
        self.append_many(other).distinct_with(equality)
    }

    /// Elements of `self` that have an equal element in `other`.
    ///
    /// This is an inner join on equality keeping the left element, so a left
    /// element equal to `k` right elements is yielded `k` times.
    fn intersect<O>(
        self,
        other: O,
    ) -> InnerJoin<Self, O, Equality<Self::Item>, KeepLeft<Self::Item>>
    where
        Self: Sized,
        Self::Item: Clone + PartialEq,
        O: Sequence<Item = Self::Item>,
    {
        self.intersect_with(other, PartialEq::eq as Equality<Self::Item>)
    }

    /// [`intersect`](Query::intersect) under a custom equality check.
    fn intersect_with<O, E>(self, other: O, equality: E) -> InnerJoin<Self, O, E, KeepLeft<Self::Item>>
    where
        Self: Sized,
        Self::Item: Clone,
        O: Sequence<Item = Self::Item>,
        E: Fn(&Self::Item, &Self::Item) -> bool,
    {
        InnerJoin::new(self, other, equality, clone_left as KeepLeft<Self::Item>)
    }

    // ========================================================================
    // Skip and take
    // ========================================================================

    /// Skips leading elements while `predicate(element, index)` holds.
    fn skip_while<P>(self, predicate: P) -> SkipWhile<Self, P>
    where
        Self: Sized,
        P: Fn(&Self::Item, usize) -> bool,
    {
        SkipWhile::new(self, predicate)
    }

    /// Yields leading elements while `predicate(element, index)` holds.
    fn take_while<P>(self, predicate: P) -> TakeWhile<Self, P>
    where
        Self: Sized,
        P: Fn(&Self::Item, usize) -> bool,
    {
        TakeWhile::new(self, predicate)
    }

    /// Skips the first `count` elements.
    fn skip(self, count: usize) -> SkipWhile<Self, Below>
    where
        Self: Sized,
    {
        SkipWhile::new(self, Below(count))
    }

    /// Yields at most the first `count` elements.
    fn take(self, count: usize) -> TakeWhile<Self, Below>
    where
        Self: Sized,
    {
        TakeWhile::new(self, Below(count))
    }

    /// Drops the last `count` elements. Traverses the upstream twice.
    fn skip_last(self, count: usize) -> Tail<Self>
    where
        Self: Sized,
    {
        Tail::new(self, count, TailMode::SkipLast)
    }

    /// Yields only the last `count` elements. Traverses the upstream twice.
    fn take_last(self, count: usize) -> Tail<Self>
    where
        Self: Sized,
    {
        Tail::new(self, count, TailMode::TakeLast)
    }

    /// Yields the elements at positions `0, n, 2n, ...`.
    ///
    /// Returns an error if `n` is zero.
    fn take_every(self, n: usize) -> Result<Every<Self>>
    where
        Self: Sized,
    {
        Every::new(self, n, true)
    }

    /// Yields every element except those at positions `0, n, 2n, ...`.
    ///
    /// Returns an error if `n` is zero.
    fn skip_every(self, n: usize) -> Result<Every<Self>>
    where
        Self: Sized,
    {
        Every::new(self, n, false)
    }

    /// Splits the sequence into `Vec`s of `size` elements; the last may be
    /// shorter.
    ///
    /// Returns an error if `size` is zero.
    fn batch(self, size: usize) -> Result<Batch<Self>>
    where
        Self: Sized,
    {
        Batch::new(self, size)
    }

    // ========================================================================
    // Reordering
    // ========================================================================

    /// Yields the elements back to front.
    fn reverse(self) -> Reverse<Self>
    where
        Self: Sized,
    {
        Reverse::new(self)
    }

    /// Yields the elements in a fresh random order on every traversal.
    fn shuffle(self) -> Shuffle<Self>
    where
        Self: Sized,
    {
        Shuffle::new(self, None)
    }

    /// Yields the elements in a random order fixed by `seed`.
    fn shuffle_seeded(self, seed: u64) -> Shuffle<Self>
    where
        Self: Sized,
    {
        Shuffle::new(self, Some(seed))
    }

    /// Sorts ascending by a key.
    fn order_by<'f, P, F>(self, selector: F) -> Ordered<'f, Self>
    where
        Self: Sized,
        P: Ord + 'f,
        F: Fn(&Self::Item) -> P + 'f,
    {
        Ordered::new(self, OrderBy::new(selector, P::cmp, Dir::Asc))
    }

    /// Sorts ascending by a key under a custom comparator.
    fn order_by_with<'f, P, F, C>(self, selector: F, comparator: C) -> Ordered<'f, Self>
    where
        Self: Sized,
        F: Fn(&Self::Item) -> P + 'f,
        C: Fn(&P, &P) -> Ordering + 'f,
    {
        Ordered::new(self, OrderBy::new(selector, comparator, Dir::Asc))
    }

    /// Sorts descending by a key.
    fn order_by_descending<'f, P, F>(self, selector: F) -> Ordered<'f, Self>
    where
        Self: Sized,
        P: Ord + 'f,
        F: Fn(&Self::Item) -> P + 'f,
    {
        Ordered::new(self, OrderBy::new(selector, P::cmp, Dir::Desc))
    }

    /// Sorts descending by a key under a custom comparator.
    fn order_by_descending_with<'f, P, F, C>(self, selector: F, comparator: C) -> Ordered<'f, Self>
    where
        Self: Sized,
        F: Fn(&Self::Item) -> P + 'f,
        C: Fn(&P, &P) -> Ordering + 'f,
    {
        Ordered::new(self, OrderBy::new(selector, comparator, Dir::Desc))
    }

    // ========================================================================
    // Grouping
    // ========================================================================

    /// Groups elements by key, lazily.
    ///
    /// Groups come in first-encounter key order and each group re-filters
    /// the source when traversed.
    fn group_by<K, F>(self, key_selector: F) -> GroupBy<Self, F, Equality<K>, K>
    where
        Self: Sized,
        K: Clone + PartialEq,
        F: Fn(&Self::Item) -> K,
    {
        GroupBy::new(self, key_selector, PartialEq::eq as Equality<K>)
    }

    /// Groups elements by key under a custom equality check.
    fn group_by_with<K, F, E>(self, key_selector: F, equality: E) -> GroupBy<Self, F, E, K>
    where
        Self: Sized,
        K: Clone,
        F: Fn(&Self::Item) -> K,
        E: Fn(&K, &K) -> bool,
    {
        GroupBy::new(self, key_selector, equality)
    }

    /// Groups elements by a hashable key in a single pass.
    fn group_by_bucketed<K, F>(self, key_selector: F) -> BucketedGroupBy<Self, F, K>
    where
        Self: Sized,
        K: Hash + Eq + Clone,
        F: Fn(&Self::Item) -> K,
    {
        BucketedGroupBy::new(self, key_selector)
    }

    // ========================================================================
    // Joins
    // ========================================================================

    /// Yields `selector(l, r)` for every pair satisfying `condition`.
    fn inner_join<O, C, F, R>(self, other: O, condition: C, selector: F) -> InnerJoin<Self, O, C, F>
    where
        Self: Sized,
        O: Sequence,
        C: Fn(&Self::Item, &O::Item) -> bool,
        F: Fn(&Self::Item, &O::Item) -> R,
    {
        InnerJoin::new(self, other, condition, selector)
    }

    /// Like [`inner_join`](Query::inner_join), with one
    /// `selector(l, None)` for every unmatched left element.
    fn left_join<O, C, F, R>(self, other: O, condition: C, selector: F) -> LeftJoin<Self, O, C, F>
    where
        Self: Sized,
        O: Sequence,
        C: Fn(&Self::Item, &O::Item) -> bool,
        F: Fn(&Self::Item, Option<&O::Item>) -> R,
    {
        LeftJoin::new(self, other, condition, selector)
    }

    /// `other.left_join(self)` with the arguments flipped back: every right
    /// element is kept, in right-then-left order.
    fn right_join<O, C, F, R>(self, other: O, condition: C, selector: F) -> RightJoin<Self, O, C, F>
    where
        Self: Sized,
        O: Sequence,
        C: Fn(&Self::Item, &O::Item) -> bool,
        F: Fn(Option<&Self::Item>, &O::Item) -> R,
    {
        RightJoin::new(self, other, condition, selector)
    }

    /// A left join followed by every right element that never matched.
    fn outer_join<O, C, F, R>(self, other: O, condition: C, selector: F) -> OuterJoin<Self, O, C, F>
    where
        Self: Sized,
        O: Sequence,
        C: Fn(&Self::Item, &O::Item) -> bool,
        F: Fn(Option<&Self::Item>, Option<&O::Item>) -> R,
    {
        OuterJoin::new(self, other, condition, selector)
    }

    // ========================================================================
    // Conversion
    // ========================================================================

    /// Collects the elements into a `Vec`.
    fn to_vec(&self) -> Vec<Self::Item> {
        self.traverse().collect()
    }

    /// Collects the elements into a `HashSet`.
    fn to_set(&self) -> HashSet<Self::Item>
    where
        Self::Item: Hash + Eq,
    {
        self.traverse().collect()
    }

    /// Collects the elements into a `BTreeSet`.
    fn to_btree_set(&self) -> BTreeSet<Self::Item>
    where
        Self::Item: Ord,
    {
        self.traverse().collect()
    }

    /// Collects `(key, value)` pairs into a `HashMap`. On duplicate keys the
    /// last element wins.
    fn to_map<K, V, FK, FV>(&self, key_selector: FK, value_selector: FV) -> HashMap<K, V>
    where
        K: Hash + Eq,
        FK: Fn(&Self::Item) -> K,
        FV: Fn(&Self::Item) -> V,
    {
        self.traverse()
            .map(|e| (key_selector(&e), value_selector(&e)))
            .collect()
    }

    /// Collects `(key, value)` pairs into a `BTreeMap`. On duplicate keys
    /// the last element wins.
    fn to_btree_map<K, V, FK, FV>(&self, key_selector: FK, value_selector: FV) -> BTreeMap<K, V>
    where
        K: Ord,
        FK: Fn(&Self::Item) -> K,
        FV: Fn(&Self::Item) -> V,
    {
        self.traverse()
            .map(|e| (key_selector(&e), value_selector(&e)))
            .collect()
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// Left fold.
    fn aggregate<A, F>(&self, seed: A, folder: F) -> A
    where
        F: Fn(A, Self::Item) -> A,
    {
        self.traverse().fold(seed, folder)
    }

    /// Number of elements.
    fn count(&self) -> usize {
        self.traverse().count()
    }

    /// Number of elements matching a predicate.
    fn count_where<P>(&self, predicate: P) -> usize
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.traverse().filter(|e| predicate(e)).count()
    }

    /// Sum of numeric elements. An empty sequence sums to `I64(0)`.
    ///
    /// Returns [`SeqError::TypeMismatch`] on the first non-numeric element.
    fn sum(&self) -> Result<Number>
    where
        Self::Item: AsNumber,
    {
        fold_numbers(self.traverse()).map(|(total, _)| total)
    }

    /// Sum of a numeric value selected from every element.
    fn sum_of<P, F>(&self, selector: F) -> Result<Number>
    where
        P: AsNumber,
        F: Fn(&Self::Item) -> P,
    {
        fold_numbers(self.traverse().map(|e| selector(&e))).map(|(total, _)| total)
    }

    /// Arithmetic mean of numeric elements.
    ///
    /// Returns [`SeqError::EmptySequence`] on an empty sequence and
    /// [`SeqError::TypeMismatch`] on a non-numeric element.
    fn average(&self) -> Result<f64>
    where
        Self::Item: AsNumber,
    {
        mean(fold_numbers(self.traverse())?)
    }

    /// Arithmetic mean of a numeric value selected from every element.
    fn average_of<P, F>(&self, selector: F) -> Result<f64>
    where
        P: AsNumber,
        F: Fn(&Self::Item) -> P,
    {
        mean(fold_numbers(self.traverse().map(|e| selector(&e)))?)
    }

    /// The greatest element; the first one on ties.
    fn maximum(&self) -> Result<Self::Item>
    where
        Self::Item: Ord,
    {
        self.maximum_with(Ord::cmp)
    }

    /// The greatest element under `comparator`; the first one on ties.
    fn maximum_with<C>(&self, comparator: C) -> Result<Self::Item>
    where
        C: Fn(&Self::Item, &Self::Item) -> Ordering,
    {
        pick(self.traverse(), |candidate, best| {
            comparator(candidate, best) == Ordering::Greater
        })
    }

    /// The element with the greatest key; the first one on ties.
    fn maximum_by<K, F>(&self, key_selector: F) -> Result<Self::Item>
    where
        K: Ord,
        F: Fn(&Self::Item) -> K,
    {
        self.maximum_by_with(key_selector, K::cmp)
    }

    /// The element with the greatest key under `comparator`.
    fn maximum_by_with<K, F, C>(&self, key_selector: F, comparator: C) -> Result<Self::Item>
    where
        F: Fn(&Self::Item) -> K,
        C: Fn(&K, &K) -> Ordering,
    {
        let keyed = self.traverse().map(|e| (key_selector(&e), e));
        pick(keyed, |candidate, best| {
            comparator(&candidate.0, &best.0) == Ordering::Greater
        })
        .map(|(_, element)| element)
    }

    /// The greatest selected value.
    fn max_of<P, F>(&self, selector: F) -> Result<P>
    where
        P: Ord,
        F: Fn(&Self::Item) -> P,
    {
        self.max_of_with(selector, P::cmp)
    }

    /// The greatest selected value under `comparator`.
    fn max_of_with<P, F, C>(&self, selector: F, comparator: C) -> Result<P>
    where
        F: Fn(&Self::Item) -> P,
        C: Fn(&P, &P) -> Ordering,
    {
        pick(self.traverse().map(|e| selector(&e)), |candidate, best| {
            comparator(candidate, best) == Ordering::Greater
        })
    }

    /// The least element; the first one on ties.
    fn minimum(&self) -> Result<Self::Item>
    where
        Self::Item: Ord,
    {
        self.minimum_with(Ord::cmp)
    }

    /// The least element under `comparator`; the first one on ties.
    fn minimum_with<C>(&self, comparator: C) -> Result<Self::Item>
    where
        C: Fn(&Self::Item, &Self::Item) -> Ordering,
    {
        self.maximum_with(|a, b| comparator(b, a))
    }

    /// The element with the least key; the first one on ties.
    fn minimum_by<K, F>(&self, key_selector: F) -> Result<Self::Item>
    where
        K: Ord,
        F: Fn(&Self::Item) -> K,
    {
        self.minimum_by_with(key_selector, K::cmp)
    }

    /// The element with the least key under `comparator`.
    fn minimum_by_with<K, F, C>(&self, key_selector: F, comparator: C) -> Result<Self::Item>
    where
        F: Fn(&Self::Item) -> K,
        C: Fn(&K, &K) -> Ordering,
    {
        self.maximum_by_with(key_selector, |a: &K, b: &K| comparator(b, a))
    }

    /// The least selected value.
    fn min_of<P, F>(&self, selector: F) -> Result<P>
    where
        P: Ord,
        F: Fn(&Self::Item) -> P,
    {
        self.min_of_with(selector, P::cmp)
    }

    /// The least selected value under `comparator`.
    fn min_of_with<P, F, C>(&self, selector: F, comparator: C) -> Result<P>
    where
        F: Fn(&Self::Item) -> P,
        C: Fn(&P, &P) -> Ordering,
    {
        self.max_of_with(selector, |a: &P, b: &P| comparator(b, a))
    }

    // ========================================================================
    // Search
    // ========================================================================

    /// The first element.
    fn first(&self) -> Result<Self::Item> {
        self.first_or_none().ok_or(SeqError::EmptySequence)
    }

    /// The first element matching a predicate.
    fn first_where<P>(&self, predicate: P) -> Result<Self::Item>
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.first_or_none_where(predicate)
            .ok_or(SeqError::EmptySequence)
    }

    /// The first element, if any.
    fn first_or_none(&self) -> Option<Self::Item> {
        self.traverse().next()
    }

    /// The first element matching a predicate, if any.
    fn first_or_none_where<P>(&self, predicate: P) -> Option<Self::Item>
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.traverse().find(|e| predicate(e))
    }

    /// The last element.
    fn last(&self) -> Result<Self::Item> {
        self.last_or_none().ok_or(SeqError::EmptySequence)
    }

    /// The last element matching a predicate.
    fn last_where<P>(&self, predicate: P) -> Result<Self::Item>
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.last_or_none_where(predicate)
            .ok_or(SeqError::EmptySequence)
    }

    /// The last element, if any.
    fn last_or_none(&self) -> Option<Self::Item> {
        self.traverse().last()
    }

    /// The last element matching a predicate, if any.
    fn last_or_none_where<P>(&self, predicate: P) -> Option<Self::Item>
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.traverse().filter(|e| predicate(e)).last()
    }

    /// The only element.
    ///
    /// Fails with [`SeqError::EmptySequence`] when there is none and
    /// [`SeqError::MultipleMatches`] when there are several.
    fn single(&self) -> Result<Self::Item> {
        self.single_where(|_| true)
    }

    /// The only element matching a predicate.
    fn single_where<P>(&self, predicate: P) -> Result<Self::Item>
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.single_or_none_where(predicate)?
            .ok_or(SeqError::EmptySequence)
    }

    /// The only element, or `None` if there is none.
    ///
    /// Still fails with [`SeqError::MultipleMatches`] when there are several.
    fn single_or_none(&self) -> Result<Option<Self::Item>> {
        self.single_or_none_where(|_| true)
    }

    /// The only element matching a predicate, or `None` if none does.
    fn single_or_none_where<P>(&self, predicate: P) -> Result<Option<Self::Item>>
    where
        P: Fn(&Self::Item) -> bool,
    {
        let mut matches = self.traverse().filter(|e| predicate(e));
        let found = matches.next();
        if found.is_some() && matches.next().is_some() {
            return Err(SeqError::MultipleMatches);
        }
        Ok(found)
    }

    /// The element at a 0-based position.
    fn element_at(&self, index: usize) -> Result<Self::Item> {
        self.element_at_or_none(index)
            .ok_or(SeqError::IndexOutOfRange { index })
    }

    /// The element at a 0-based position, if the sequence is long enough.
    fn element_at_or_none(&self, index: usize) -> Option<Self::Item> {
        self.traverse().nth(index)
    }

    /// Position of the first element equal to `element`.
    fn position(&self, element: &Self::Item) -> Option<usize>
    where
        Self::Item: PartialEq,
    {
        self.position_with(element, PartialEq::eq)
    }

    /// Position of the first element equal to `element` under `equality`.
    fn position_with<E>(&self, element: &Self::Item, equality: E) -> Option<usize>
    where
        E: Fn(&Self::Item, &Self::Item) -> bool,
    {
        self.traverse().position(|e| equality(&e, element))
    }

    /// Whether some element equals `element`.
    fn contains(&self, element: &Self::Item) -> bool
    where
        Self::Item: PartialEq,
    {
        self.position(element).is_some()
    }

    /// Whether some element equals `element` under `equality`.
    fn contains_with<E>(&self, element: &Self::Item, equality: E) -> bool
    where
        E: Fn(&Self::Item, &Self::Item) -> bool,
    {
        self.position_with(element, equality).is_some()
    }

    // ========================================================================
    // Quantifiers
    // ========================================================================

    /// Whether the sequence has no elements.
    fn is_empty(&self) -> bool {
        !self.any()
    }

    /// Whether every element matches. True for an empty sequence.
    fn all<P>(&self, predicate: P) -> bool
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.traverse().all(|e| predicate(&e))
    }

    /// Whether the sequence has any element.
    fn any(&self) -> bool {
        self.traverse().next().is_some()
    }

    /// Whether any element matches.
    fn any_where<P>(&self, predicate: P) -> bool
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.traverse().any(|e| predicate(&e))
    }

    /// Whether the sequence has at least `n` elements.
    fn at_least(&self, n: usize) -> bool {
        self.at_least_where(n, |_| true)
    }

    /// Whether at least `n` elements match. Stops at the `n`th match.
    fn at_least_where<P>(&self, n: usize, predicate: P) -> bool
    where
        P: Fn(&Self::Item) -> bool,
    {
        match n.checked_sub(1) {
            None => true,
            Some(last) => self.traverse().filter(|e| predicate(e)).nth(last).is_some(),
        }
    }

    /// Whether the sequence has at most `n` elements.
    fn at_most(&self, n: usize) -> bool {
        self.at_most_where(n, |_| true)
    }

    /// Whether at most `n` elements match. Stops at match `n + 1`.
    fn at_most_where<P>(&self, n: usize, predicate: P) -> bool
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.traverse().filter(|e| predicate(e)).nth(n).is_none()
    }

    /// Whether the sequence has exactly `n` elements.
    fn exactly(&self, n: usize) -> bool {
        self.exactly_where(n, |_| true)
    }

    /// Whether exactly `n` elements match. Stops at match `n + 1`.
    fn exactly_where<P>(&self, n: usize, predicate: P) -> bool
    where
        P: Fn(&Self::Item) -> bool,
    {
        self.traverse()
            .filter(|e| predicate(e))
            .take(n.saturating_add(1))
            .count()
            == n
    }

    // ========================================================================
    // Comparison
    // ========================================================================

    /// Whether both sequences have equal elements in the same order.
    fn sequence_equal<O>(&self, other: O) -> bool
    where
        Self::Item: PartialEq,
        O: Sequence<Item = Self::Item>,
    {
        self.sequence_equal_with(other, PartialEq::eq)
    }

    /// [`sequence_equal`](Query::sequence_equal) under `equality`.
    ///
    /// Walks both sequences together and stops at the first difference.
    fn sequence_equal_with<O, E>(&self, other: O, equality: E) -> bool
    where
        O: Sequence<Item = Self::Item>,
        E: Fn(&Self::Item, &Self::Item) -> bool,
    {
        let mut left = self.traverse();
        let mut right = other.traverse();
        loop {
            match (left.next(), right.next()) {
                (None, None) => return true,
                (Some(a), Some(b)) if equality(&a, &b) => continue,
                _ => return false,
            }
        }
    }

    /// Whether the sequence begins with the elements of `prefix`.
    fn starts_with<O>(&self, prefix: O) -> bool
    where
        Self::Item: PartialEq,
        O: Sequence<Item = Self::Item>,
    {
        self.starts_with_with(prefix, PartialEq::eq)
    }

    /// [`starts_with`](Query::starts_with) under `equality`.
    fn starts_with_with<O, E>(&self, prefix: O, equality: E) -> bool
    where
        O: Sequence<Item = Self::Item>,
        E: Fn(&Self::Item, &Self::Item) -> bool,
    {
        let mut elements = self.traverse();
        let mut prefix = prefix.traverse();
        prefix.all(|p| elements.next().is_some_and(|e| equality(&e, &p)))
    }

    /// Whether the sequence ends with the elements of `suffix`.
    fn ends_with<O>(&self, suffix: O) -> bool
    where
        Self::Item: PartialEq,
        O: Sequence<Item = Self::Item>,
    {
        self.ends_with_with(suffix, PartialEq::eq)
    }

    /// [`ends_with`](Query::ends_with) under `equality`. Materializes both
    /// sequences.
    fn ends_with_with<O, E>(&self, suffix: O, equality: E) -> bool
    where
        O: Sequence<Item = Self::Item>,
        E: Fn(&Self::Item, &Self::Item) -> bool,
    {
        let elements = self.to_vec();
        let suffix: Vec<Self::Item> = suffix.traverse().collect();
        match elements.len().checked_sub(suffix.len()) {
            None => false,
            Some(start) => elements[start..]
                .iter()
                .zip(&suffix)
                .all(|(e, s)| equality(e, s)),
        }
    }
}

impl<S: Sequence + ?Sized> Query for S {}

/// Keeps the first element unless a later one is strictly `better`.
fn pick<T, I, B>(mut elements: I, better: B) -> Result<T>
where
    I: Iterator<Item = T>,
    B: Fn(&T, &T) -> bool,
{
    let first = elements.next().ok_or(SeqError::EmptySequence)?;
    Ok(elements.fold(first, |best, candidate| {
        if better(&candidate, &best) {
            candidate
        } else {
            best
        }
    }))
}

/// Sums numeric elements and counts them.
fn fold_numbers<T, I>(elements: I) -> Result<(Number, usize)>
where
    T: AsNumber,
    I: Iterator<Item = T>,
{
    let mut total: Option<Number> = None;
    let mut count = 0;
    for element in elements {
        let number = element.as_number().ok_or(SeqError::TypeMismatch {
            expected: "number",
            actual: element.kind(),
        })?;
        total = Some(match total {
            Some(total) => total.add(number),
            None => number,
        });
        count += 1;
    }
    Ok((total.unwrap_or_default(), count))
}

fn mean((total, count): (Number, usize)) -> Result<f64> {
    if count == 0 {
        return Err(SeqError::EmptySequence);
    }
    Ok(total.to_f64() / count as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source;
    use crate::value::Value;
    use std::cell::Cell;

    #[test]
    fn chains_do_not_consume_borrowed_sources() {
        let numbers = vec![1, 2, 3, 4];
        let evens = numbers.by_ref().filter(|n| n % 2 == 0).select(|n| n * 10);
        assert_eq!(evens.to_vec(), vec![20, 40]);
        assert_eq!(evens.to_vec(), vec![20, 40]);
        assert_eq!(numbers.to_vec(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn boxed_sequences_compose() {
        let pipelines: Vec<BoxedSequence<'_, i32>> = vec![
            vec![3, 1, 2].boxed(),
            vec![1, 2].select(|n| n + 100).boxed(),
        ];
        let lengths: Vec<usize> = pipelines.iter().map(|p| p.count()).collect();
        assert_eq!(lengths, vec![3, 2]);
    }

    #[test]
    fn single_element_composition() {
        let seq = vec![2, 3].append(4).prepend(1).insert(2, 9);
        assert_eq!(seq.to_vec(), vec![1, 2, 9, 3, 4]);
        assert_eq!(vec![1].prepend_many(vec![5, 6]).to_vec(), vec![5, 6, 1]);
    }

    #[test]
    fn set_algebra() {
        assert_eq!(vec![1, 2, 2, 3].union(vec![3, 4, 1]).to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(vec![1, 2, 3].intersect(vec![2, 2, 3]).to_vec(), vec![2, 2, 3]);

        let caseless = |a: &&str, b: &&str| a.eq_ignore_ascii_case(b);
        let words = vec!["a", "B"].union_with(vec!["A", "b", "c"], caseless);
        assert_eq!(words.to_vec(), vec!["a", "B", "c"]);
    }

    #[test]
    fn distinct_variants() {
        assert_eq!(vec![3, 3, 1, 3].distinct().to_vec(), vec![3, 1]);
        assert_eq!(
            vec![10, 11, 20, 21].distinct_by(|n| n / 10).to_vec(),
            vec![10, 20]
        );
        assert_eq!(
            vec![1, -1, 2].distinct_with(|a: &i32, b: &i32| a.abs() == b.abs()).to_vec(),
            vec![1, 2]
        );
    }

    #[test]
    fn skip_and_take_over_unbounded_sources() {
        let naturals = source::generate(usize::MAX, |i| i);
        assert_eq!(naturals.by_ref().skip(3).take(3).to_vec(), vec![3, 4, 5]);
        assert_eq!(
            naturals.by_ref().take_while(|n, _| *n < 4).to_vec(),
            vec![0, 1, 2, 3]
        );
        assert!(naturals.any_where(|n| *n == 1000));
    }

    #[test]
    fn skip_last_take_last_and_every() {
        let data: Vec<i32> = (1..=6).collect();
        assert_eq!(data.by_ref().skip_last(2).to_vec(), vec![1, 2, 3, 4]);
        assert_eq!(data.by_ref().take_last(2).to_vec(), vec![5, 6]);
        assert_eq!(data.by_ref().take_every(2).unwrap().to_vec(), vec![1, 3, 5]);
        assert_eq!(data.by_ref().skip_every(2).unwrap().to_vec(), vec![2, 4, 6]);
        assert!(data.take_every(0).is_err());
    }

    #[test]
    fn ordering_is_stable_across_keys() {
        let rows = vec![("b", 2), ("a", 2), ("c", 1), ("a", 1)];
        let sorted = rows
            .by_ref()
            .order_by(|r| r.1)
            .then_by_descending(|r| r.0)
            .to_vec();
        assert_eq!(sorted, vec![("c", 1), ("a", 1), ("b", 2), ("a", 2)]);

        let by_len_desc = vec!["bb", "a", "cc", "d"].order_by_descending(|w| w.len());
        assert_eq!(by_len_desc.to_vec(), vec!["bb", "cc", "a", "d"]);
    }

    #[test]
    fn merge_keeps_left_on_ties() {
        let left = vec![(1, 'l'), (3, 'l')];
        let right = vec![(1, 'r'), (2, 'r')];
        let merged = left.merge_with(right, |a, b| a.0.cmp(&b.0));
        assert_eq!(merged.to_vec(), vec![(1, 'l'), (1, 'r'), (2, 'r'), (3, 'l')]);
        assert_eq!(vec![1, 4].merge(vec![2, 3, 5]).to_vec(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn conversions() {
        let pairs = vec![("a", 1), ("b", 2), ("a", 3)];
        let map = pairs.to_map(|p| p.0, |p| p.1);
        assert_eq!(map.len(), 2);
        assert_eq!(map["a"], 3);

        let ordered = pairs.to_btree_map(|p| p.0, |p| p.1);
        assert_eq!(ordered.into_iter().collect::<Vec<_>>(), vec![("a", 3), ("b", 2)]);

        assert_eq!(vec![2, 1, 2].to_set().len(), 2);
        assert_eq!(vec![2, 1, 2].to_btree_set().into_iter().collect::<Vec<_>>(), vec![1, 2]);
    }

    #[test]
    fn aggregation() {
        let data = vec![4, 1, 3];
        assert_eq!(data.aggregate(String::new(), |acc, n| format!("{acc}{n}")), "413");
        assert_eq!(data.count_where(|n| *n > 1), 2);
        assert_eq!(data.sum(), Ok(Number::I64(8)));
        assert_eq!(data.average(), Ok(8.0 / 3.0));
        assert_eq!(data.maximum(), Ok(4));
        assert_eq!(data.minimum(), Ok(1));
        assert_eq!(data.max_of(|n| n * -1), Ok(-1));
        assert_eq!(data.min_of(|n| n * -1), Ok(-4));
        assert_eq!(data.sum_of(|n| *n as f64 / 2.0), Ok(Number::F64(4.0)));
        assert_eq!(data.average_of(|n| *n * 2), Ok(16.0 / 3.0));
    }

    #[test]
    fn empty_aggregation() {
        let none: Vec<i32> = Vec::new();
        assert_eq!(none.sum(), Ok(Number::I64(0)));
        assert_eq!(none.average(), Err(SeqError::EmptySequence));
        assert_eq!(none.maximum(), Err(SeqError::EmptySequence));
        assert_eq!(none.minimum_by(|n| *n), Err(SeqError::EmptySequence));
    }

    #[test]
    fn numeric_evaluators_reject_non_numbers() {
        let cells = vec![Value::from(1), Value::from("two"), Value::from(3)];
        assert_eq!(
            cells.sum(),
            Err(SeqError::TypeMismatch {
                expected: "number",
                actual: "string"
            })
        );
        let numbers = vec![Value::from(1), Value::from(2.5)];
        assert_eq!(numbers.average(), Ok(1.75));
    }

    #[test]
    fn extremes_keep_the_first_tie() {
        let people = vec![("ana", 30), ("bo", 40), ("cy", 40), ("di", 20), ("ed", 20)];
        assert_eq!(people.maximum_by(|p| p.1), Ok(("bo", 40)));
        assert_eq!(people.minimum_by(|p| p.1), Ok(("di", 20)));
        assert_eq!(
            people.maximum_with(|a, b| a.0.len().cmp(&b.0.len())),
            Ok(("ana", 30))
        );
        assert_eq!(
            people.minimum_by_with(|p| p.0, |a: &&str, b: &&str| b.cmp(a)),
            Ok(("ed", 20))
        );
    }

    #[test]
    fn search() {
        let data = vec![5, 8, 13, 21];
        assert_eq!(Query::first(&data), Ok(5));
        assert_eq!(data.first_where(|n| n % 2 == 0), Ok(8));
        assert_eq!(data.first_where(|n| *n > 100), Err(SeqError::EmptySequence));
        assert_eq!(data.first_or_none_where(|n| *n > 100), None);
        assert_eq!(Query::last(&data), Ok(21));
        assert_eq!(data.last_where(|n| *n < 10), Ok(8));
        assert_eq!(data.last_or_none_where(|n| *n > 100), None);
        assert_eq!(data.element_at(2), Ok(13));
        assert_eq!(
            data.element_at(4),
            Err(SeqError::IndexOutOfRange { index: 4 })
        );
        assert_eq!(data.element_at_or_none(9), None);
        assert_eq!(data.position(&13), Some(2));
        assert!(data.contains_with(&-8, |a: &i32, b: &i32| a.abs() == b.abs()));
    }

    #[test]
    fn single_variants() {
        let data = vec![1, 2, 3];
        assert_eq!(data.single_where(|n| *n == 2), Ok(2));
        assert_eq!(data.single(), Err(SeqError::MultipleMatches));
        assert_eq!(data.single_where(|n| *n > 5), Err(SeqError::EmptySequence));
        assert_eq!(data.single_or_none_where(|n| *n > 5), Ok(None));
        assert_eq!(
            data.single_or_none_where(|n| *n > 1),
            Err(SeqError::MultipleMatches)
        );
        assert_eq!(vec![7].single_or_none(), Ok(Some(7)));
    }

    #[test]
    fn quantifiers_short_circuit() {
        let pulled = Cell::new(0);
        let counted = vec![1, 2, 3, 4, 5, 6].inspect(|_| pulled.set(pulled.get() + 1));

        assert!(counted.at_least_where(2, |n| n % 2 == 0));
        assert_eq!(pulled.get(), 4);

        pulled.set(0);
        assert!(!counted.at_most(1));
        assert_eq!(pulled.get(), 2);

        pulled.set(0);
        assert!(!counted.exactly(1));
        assert_eq!(pulled.get(), 2);

        pulled.set(0);
        assert!(counted.any());
        assert_eq!(pulled.get(), 1);
    }

    #[test]
    fn quantifier_edges() {
        let none: Vec<i32> = Vec::new();
        assert!(none.all(|_| false));
        assert!(!none.any());
        assert!(none.at_least(0));
        assert!(none.exactly(0));
        assert!(vec![1, 2].at_most(2));
        assert!(vec![1, 2].exactly_where(1, |n| *n > 1));
        assert!(!vec![1, 2].at_least(3));
    }

    #[test]
    fn sequence_comparison() {
        let data = vec![1, 2, 3];
        assert!(data.sequence_equal(vec![1, 2, 3]));
        assert!(!data.sequence_equal(vec![1, 2]));
        assert!(!data.sequence_equal(vec![1, 2, 3, 4]));
        assert!(data.sequence_equal_with(vec![-1, -2, -3], |a: &i32, b: &i32| *a == -b));

        assert!(Query::starts_with(&data, vec![1, 2]));
        assert!(!Query::starts_with(&data, vec![1, 2, 3, 4]));
        assert!(Query::ends_with(&data, vec![2, 3]));
        assert!(!Query::ends_with(&data, vec![1, 3]));
        assert!(Query::ends_with(&data, Vec::new()));
    }

    #[test]
    fn joins_through_the_trait() {
        let owners = vec![(1, "ana"), (2, "bo")];
        let pets = vec![(1, "rex"), (3, "kit")];
        let inner = owners
            .by_ref()
            .inner_join(pets.by_ref(), |o, p| o.0 == p.0, |o, p| (o.1, p.1));
        assert_eq!(inner.to_vec(), vec![("ana", "rex")]);

        let outer = owners.outer_join(pets, |o, p| o.0 == p.0, |o, p| {
            (o.map(|o| o.1), p.map(|p| p.1))
        });
        assert_eq!(
            outer.to_vec(),
            vec![
                (Some("ana"), Some("rex")),
                (Some("bo"), None),
                (None, Some("kit")),
            ]
        );
    }

    #[test]
    fn grouping_through_the_trait() {
        let words = vec!["apple", "avocado", "banana"];
        let lazy: Vec<(char, usize)> = words
            .by_ref()
            .group_by(|w| w.chars().next().unwrap_or_default())
            .traverse()
            .map(|g| (*g.key(), g.count()))
            .collect();
        assert_eq!(lazy, vec![('a', 2), ('b', 1)]);

        let bucketed: Vec<(usize, Vec<&str>)> = words
            .group_by_bucketed(|w| w.len())
            .traverse()
            .map(|g| g.into_parts())
            .collect();
        assert_eq!(bucketed, vec![(5, vec!["apple"]), (7, vec!["avocado"]), (6, vec!["banana"])]);
    }
}
