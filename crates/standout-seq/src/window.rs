//! Stateful single-pass operators.
//!
//! Skip/take variants, batching, insertion, sampling and the operators that
//! must see the whole upstream before yielding anything (`reverse`,
//! `skip_last`, `take_last`, `shuffle`).

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use tracing::trace;

use crate::error::{Result, SeqError};
use crate::sequence::{Iter, Sequence};

/// A predicate over an element and its 0-based position.
pub trait IndexPredicate<T> {
    /// Tests the element at `index`.
    fn test(&self, element: &T, index: usize) -> bool;

    /// An index at which the predicate is known to fail, whatever the
    /// element. `TakeWhile` stops before pulling it.
    fn bound(&self) -> Option<usize> {
        None
    }
}

impl<T, F> IndexPredicate<T> for F
where
    F: Fn(&T, usize) -> bool,
{
    fn test(&self, element: &T, index: usize) -> bool {
        self(element, index)
    }
}

/// Index-bound predicate used by `skip` and `take`: true while `index < n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Below(pub usize);

impl<T> IndexPredicate<T> for Below {
    fn test(&self, _element: &T, index: usize) -> bool {
        index < self.0
    }

    fn bound(&self) -> Option<usize> {
        Some(self.0)
    }
}

/// Skips leading elements while a predicate holds. Once an element fails
/// the predicate, everything after it is yielded.
#[derive(Debug, Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct SkipWhile<S, P> {
    source: S,
    predicate: P,
}

impl<S, P> SkipWhile<S, P> {
    pub(crate) fn new(source: S, predicate: P) -> Self {
        SkipWhile { source, predicate }
    }
}

impl<S, P> Sequence for SkipWhile<S, P>
where
    S: Sequence,
    P: IndexPredicate<S::Item>,
{
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        let mut open = false;
        Box::new(
            self.source
                .traverse()
                .enumerate()
                .filter_map(move |(index, element)| {
                    if !open && self.predicate.test(&element, index) {
                        return None;
                    }
                    open = true;
                    Some(element)
                }),
        )
    }
}

/// Yields leading elements while a predicate holds and stops pulling from
/// upstream at the first failure, or before the predicate's
/// [`bound`](IndexPredicate::bound) when it has one.
#[derive(Debug, Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct TakeWhile<S, P> {
    source: S,
    predicate: P,
}

impl<S, P> TakeWhile<S, P> {
    pub(crate) fn new(source: S, predicate: P) -> Self {
        TakeWhile { source, predicate }
    }
}

impl<S, P> Sequence for TakeWhile<S, P>
where
    S: Sequence,
    P: IndexPredicate<S::Item>,
{
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        let upstream: Iter<'a, S::Item> = match self.predicate.bound() {
            Some(n) => Box::new(self.source.traverse().take(n)),
            None => self.source.traverse(),
        };
        Box::new(
            upstream
                .enumerate()
                .take_while(move |(index, element)| self.predicate.test(element, *index))
                .map(|(_, element)| element),
        )
    }
}

/// Which end of the sequence [`Tail`] keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TailMode {
    /// Drop the last `n` elements.
    SkipLast,
    /// Keep only the last `n` elements.
    TakeLast,
}

/// `skip_last` / `take_last`.
///
/// Counts the upstream with one full traversal, then yields from a second
/// one. Single-use upstreams cannot be used here.
#[derive(Debug, Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Tail<S> {
    source: S,
    count: usize,
    mode: TailMode,
}

impl<S> Tail<S> {
    pub(crate) fn new(source: S, count: usize, mode: TailMode) -> Self {
        Tail {
            source,
            count,
            mode,
        }
    }
}

impl<S: Sequence> Sequence for Tail<S> {
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        let total = self.source.traverse().count();
        let boundary = total.saturating_sub(self.count);
        trace!(total, boundary, mode = ?self.mode, "counted upstream");
        let upstream = self.source.traverse();
        match self.mode {
            TailMode::SkipLast => Box::new(upstream.take(boundary)),
            TailMode::TakeLast => Box::new(upstream.skip(boundary)),
        }
    }
}

/// Consecutive chunks of `size` elements; the last one may be shorter.
#[derive(Debug, Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Batch<S> {
    source: S,
    size: usize,
}

impl<S> Batch<S> {
    pub(crate) fn new(source: S, size: usize) -> Result<Self> {
        if size < 1 {
            return Err(SeqError::InvalidArgument {
                arg: "size",
                reason: "batch size must be at least 1",
            });
        }
        Ok(Batch { source, size })
    }
}

impl<S: Sequence> Sequence for Batch<S> {
    type Item = Vec<S::Item>;

    fn traverse<'a>(&'a self) -> Iter<'a, Vec<S::Item>>
    where
        S::Item: 'a,
    {
        let mut upstream = self.source.traverse().fuse();
        let size = self.size;
        Box::new(std::iter::from_fn(move || {
            let batch: Vec<S::Item> = upstream.by_ref().take(size).collect();
            (!batch.is_empty()).then_some(batch)
        }))
    }
}

/// Inserts the elements of another sequence before position `index`.
///
/// `index == len` appends at the end; a larger index inserts nothing.
#[derive(Debug, Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Insert<S, I> {
    source: S,
    index: usize,
    elements: I,
}

impl<S, I> Insert<S, I> {
    pub(crate) fn new(source: S, index: usize, elements: I) -> Self {
        Insert {
            source,
            index,
            elements,
        }
    }
}

impl<S, I> Sequence for Insert<S, I>
where
    S: Sequence,
    I: Sequence<Item = S::Item>,
{
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        let mut upstream = self.source.traverse().fuse();
        let mut inserting: Option<Iter<'a, S::Item>> = None;
        let mut inserted = false;
        let mut position = 0;
        Box::new(std::iter::from_fn(move || loop {
            if let Some(elements) = inserting.as_mut() {
                match elements.next() {
                    Some(element) => return Some(element),
                    None => inserting = None,
                }
            }
            if !inserted && position == self.index {
                inserted = true;
                inserting = Some(self.elements.traverse());
                continue;
            }
            let next = upstream.next();
            if next.is_some() {
                position += 1;
            }
            return next;
        }))
    }
}

/// Materializes the upstream and yields it back to front.
#[derive(Debug, Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Reverse<S> {
    source: S,
}

impl<S> Reverse<S> {
    pub(crate) fn new(source: S) -> Self {
        Reverse { source }
    }
}

impl<S: Sequence> Sequence for Reverse<S> {
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        let items: Vec<S::Item> = self.source.traverse().collect();
        trace!(len = items.len(), "reversing materialized sequence");
        Box::new(items.into_iter().rev())
    }
}

/// Keeps (or drops) every `step`-th element, starting with the first.
#[derive(Debug, Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Every<S> {
    source: S,
    step: usize,
    keep: bool,
}

impl<S> Every<S> {
    pub(crate) fn new(source: S, step: usize, keep: bool) -> Result<Self> {
        if step == 0 {
            return Err(SeqError::InvalidArgument {
                arg: "n",
                reason: "step must be at least 1",
            });
        }
        Ok(Every { source, step, keep })
    }
}

impl<S: Sequence> Sequence for Every<S> {
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        let (step, keep) = (self.step, self.keep);
        Box::new(
            self.source
                .traverse()
                .enumerate()
                .filter(move |(index, _)| (index % step == 0) == keep)
                .map(|(_, element)| element),
        )
    }
}

/// The whole upstream, `times` times over.
#[derive(Debug, Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Repeated<S> {
    source: S,
    times: usize,
}

impl<S> Repeated<S> {
    pub(crate) fn new(source: S, times: usize) -> Self {
        Repeated { source, times }
    }
}

impl<S: Sequence> Sequence for Repeated<S> {
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        Box::new((0..self.times).flat_map(move |_| self.source.traverse()))
    }
}

/// Materializes the upstream and yields it in random order.
#[derive(Debug, Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Shuffle<S> {
    source: S,
    seed: Option<u64>,
}

impl<S> Shuffle<S> {
    pub(crate) fn new(source: S, seed: Option<u64>) -> Self {
        Shuffle { source, seed }
    }
}

impl<S: Sequence> Sequence for Shuffle<S> {
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        let mut items: Vec<S::Item> = self.source.traverse().collect();
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        items.shuffle(&mut rng);
        trace!(len = items.len(), seeded = self.seed.is_some(), "shuffled sequence");
        Box::new(items.into_iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn collect<S: Sequence>(seq: &S) -> Vec<S::Item> {
        seq.traverse().collect()
    }

    #[test]
    fn skip_while_never_recloses() {
        let seq = SkipWhile::new(vec![1, 2, 5, 1, 2], |n: &i32, _: usize| *n < 3);
        assert_eq!(collect(&seq), vec![5, 1, 2]);
    }

    #[test]
    fn skip_while_sees_indices() {
        let seq = SkipWhile::new(vec!['a', 'b', 'c', 'd'], |_: &char, i: usize| i < 2);
        assert_eq!(collect(&seq), vec!['c', 'd']);
        assert_eq!(collect(&SkipWhile::new(vec![1, 2], Below(5))), Vec::<i32>::new());
    }

    #[test]
    fn take_while_stops_pulling() {
        let pulled = Cell::new(0);
        let source = crate::transform::Inspect::new(vec![1, 2, 3, 10, 4, 5], |_: &i32| {
            pulled.set(pulled.get() + 1)
        });
        let seq = TakeWhile::new(source, |n: &i32, _: usize| *n < 5);

        assert_eq!(collect(&seq), vec![1, 2, 3]);
        assert_eq!(pulled.get(), 4);
    }

    #[test]
    fn below_bounds_take() {
        assert_eq!(collect(&TakeWhile::new(vec![1, 2, 3], Below(2))), vec![1, 2]);
        assert_eq!(collect(&TakeWhile::new(vec![1, 2, 3], Below(0))), Vec::<i32>::new());
    }

    #[test]
    fn below_never_pulls_the_bound_index() {
        let pulled = Cell::new(0);
        let source = crate::transform::Inspect::new(vec![1, 2, 3, 4], |_: &i32| {
            pulled.set(pulled.get() + 1)
        });

        assert_eq!(collect(&TakeWhile::new(&source, Below(2))), vec![1, 2]);
        assert_eq!(pulled.get(), 2);

        pulled.set(0);
        assert_eq!(TakeWhile::new(&source, Below(0)).traverse().next(), None);
        assert_eq!(pulled.get(), 0);
    }

    #[test]
    fn tail_modes() {
        let skip_last = Tail::new(vec![1, 2, 3, 4], 1, TailMode::SkipLast);
        let take_last = Tail::new(vec![1, 2, 3, 4], 3, TailMode::TakeLast);
        assert_eq!(collect(&skip_last), vec![1, 2, 3]);
        assert_eq!(collect(&take_last), vec![2, 3, 4]);

        let too_many = Tail::new(vec![1, 2], 5, TailMode::TakeLast);
        assert_eq!(collect(&too_many), vec![1, 2]);
        let all_gone = Tail::new(vec![1, 2], 5, TailMode::SkipLast);
        assert_eq!(collect(&all_gone), Vec::<i32>::new());
    }

    #[test]
    fn batch_sizes() {
        let seq = Batch::new(vec![1, 2, 3, 4, 5], 2).unwrap();
        assert_eq!(collect(&seq), vec![vec![1, 2], vec![3, 4], vec![5]]);

        let exact = Batch::new(vec![1, 2, 3, 4], 2).unwrap();
        assert_eq!(collect(&exact), vec![vec![1, 2], vec![3, 4]]);

        let none = Batch::new(Vec::<i32>::new(), 3).unwrap();
        assert!(collect(&none).is_empty());
    }

    #[test]
    fn batch_rejects_zero() {
        assert!(matches!(
            Batch::new(vec![1], 0),
            Err(SeqError::InvalidArgument { arg: "size", .. })
        ));
    }

    #[test]
    fn insert_positions() {
        let middle = Insert::new(vec![1, 2, 3], 1, vec![8, 9]);
        assert_eq!(collect(&middle), vec![1, 8, 9, 2, 3]);

        let front = Insert::new(vec![1, 2], 0, vec![0]);
        assert_eq!(collect(&front), vec![0, 1, 2]);

        let end = Insert::new(vec![1, 2], 2, vec![3]);
        assert_eq!(collect(&end), vec![1, 2, 3]);

        let past_end = Insert::new(vec![1, 2], 5, vec![3]);
        assert_eq!(collect(&past_end), vec![1, 2]);
    }

    #[test]
    fn reverse_and_repeat() {
        assert_eq!(collect(&Reverse::new(vec![1, 2, 3])), vec![3, 2, 1]);
        assert_eq!(collect(&Repeated::new(vec![1, 2], 2)), vec![1, 2, 1, 2]);
        assert_eq!(collect(&Repeated::new(vec![1, 2], 0)), Vec::<i32>::new());
    }

    #[test]
    fn every_keeps_or_drops() {
        let data: Vec<i32> = (0..7).collect();
        assert_eq!(collect(&Every::new(data.clone(), 3, true).unwrap()), vec![0, 3, 6]);
        assert_eq!(
            collect(&Every::new(data, 3, false).unwrap()),
            vec![1, 2, 4, 5]
        );
        assert!(Every::new(vec![1], 0, true).is_err());
    }

    #[test]
    fn shuffle_is_a_permutation() {
        let data: Vec<i32> = (0..50).collect();
        let seeded = Shuffle::new(data.clone(), Some(7));
        let first = collect(&seeded);
        assert_eq!(first, collect(&seeded));

        let mut sorted = collect(&Shuffle::new(data.clone(), None));
        sorted.sort();
        assert_eq!(sorted, data);
    }
}
