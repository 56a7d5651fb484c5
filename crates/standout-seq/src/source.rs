//! Sequence sources.
//!
//! Entry points for building a pipeline when the data does not already live
//! in a collection: numeric ranges, repeated values, generated and random
//! elements. Arguments are validated when the source is built, so a bad
//! count fails where it is written rather than at the terminal evaluator.

use std::marker::PhantomData;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{Result, SeqError};
use crate::sequence::{Iter, Sequence};

/// Collects the given elements into a sequence.
pub fn from<I: IntoIterator>(elements: I) -> Vec<I::Item> {
    elements.into_iter().collect()
}

/// A sequence with no elements.
pub fn empty<T>() -> Empty<T> {
    Empty(PhantomData)
}

/// `count` consecutive integers starting at `start`.
///
/// Fails with [`SeqError::InvalidArgument`] if `count` is negative or the
/// range would run past `i64::MAX`.
pub fn range(start: i64, count: i64) -> Result<Range> {
    if count < 0 {
        return Err(SeqError::InvalidArgument {
            arg: "count",
            reason: "must not be negative",
        });
    }
    if start.checked_add(count).is_none() {
        return Err(SeqError::InvalidArgument {
            arg: "count",
            reason: "range overflows i64",
        });
    }
    Ok(Range { start, count })
}

/// `value`, `count` times.
pub fn repeat<T: Clone>(value: T, count: usize) -> Repeat<T> {
    Repeat { value, count }
}

/// `generator(0), generator(1), … generator(count - 1)`.
pub fn generate<T, F>(count: usize, generator: F) -> Generate<F>
where
    F: Fn(usize) -> T,
{
    Generate { count, generator }
}

/// `count` floats drawn uniformly from `[min, max]`.
///
/// Every traversal draws new values. Use [`random_seeded`] when the
/// sequence has to be re-traversable.
pub fn random(count: usize, min: f64, max: f64) -> Result<Random> {
    Random::new(count, min, max, None)
}

/// Like [`random`], but every traversal replays the same values.
pub fn random_seeded(count: usize, min: f64, max: f64, seed: u64) -> Result<Random> {
    Random::new(count, min, max, Some(seed))
}

/// See [`empty`].
#[derive(Debug, Clone, Copy)]
pub struct Empty<T>(PhantomData<fn() -> T>);

impl<T> Sequence for Empty<T> {
    type Item = T;

    fn traverse<'a>(&'a self) -> Iter<'a, T>
    where
        T: 'a,
    {
        Box::new(std::iter::empty())
    }
}

/// See [`range`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    start: i64,
    count: i64,
}

impl Sequence for Range {
    type Item = i64;

    fn traverse<'a>(&'a self) -> Iter<'a, i64>
    where
        i64: 'a,
    {
        Box::new(self.start..self.start + self.count)
    }
}

/// See [`repeat`].
#[derive(Debug, Clone)]
pub struct Repeat<T> {
    value: T,
    count: usize,
}

impl<T: Clone> Sequence for Repeat<T> {
    type Item = T;

    fn traverse<'a>(&'a self) -> Iter<'a, T>
    where
        T: 'a,
    {
        Box::new(std::iter::repeat(&self.value).take(self.count).cloned())
    }
}

/// See [`generate`].
#[derive(Clone)]
pub struct Generate<F> {
    count: usize,
    generator: F,
}

impl<T, F> Sequence for Generate<F>
where
    F: Fn(usize) -> T,
{
    type Item = T;

    fn traverse<'a>(&'a self) -> Iter<'a, T>
    where
        T: 'a,
    {
        Box::new((0..self.count).map(&self.generator))
    }
}

/// See [`random`] and [`random_seeded`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Random {
    count: usize,
    min: f64,
    max: f64,
    seed: Option<u64>,
}

impl Random {
    fn new(count: usize, min: f64, max: f64, seed: Option<u64>) -> Result<Self> {
        if !min.is_finite() || !max.is_finite() {
            return Err(SeqError::InvalidArgument {
                arg: "min/max",
                reason: "bounds must be finite",
            });
        }
        if min > max {
            return Err(SeqError::InvalidArgument {
                arg: "min/max",
                reason: "min must not exceed max",
            });
        }
        Ok(Random {
            count,
            min,
            max,
            seed,
        })
    }

    /// Returns the seed, if this sequence replays its values.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }
}

impl Sequence for Random {
    type Item = f64;

    fn traverse<'a>(&'a self) -> Iter<'a, f64>
    where
        f64: 'a,
    {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };
        let (min, max) = (self.min, self.max);
        Box::new((0..self.count).map(move |_| rng.random_range(min..=max)))
    }
}
