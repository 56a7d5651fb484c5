//! Stateless operators.
//!
//! Each node here produces its output from the current upstream element
//! alone and never buffers more than that element.

use std::cmp::Ordering;
use std::marker::PhantomData;

use crate::sequence::{Iter, Sequence};

/// Maps every element. See `Query::select`.
#[derive(Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Select<S, F> {
    source: S,
    selector: F,
}

impl<S, F> Select<S, F> {
    pub(crate) fn new(source: S, selector: F) -> Self {
        Select { source, selector }
    }
}

impl<S, F, R> Sequence for Select<S, F>
where
    S: Sequence,
    F: Fn(S::Item) -> R,
{
    type Item = R;

    fn traverse<'a>(&'a self) -> Iter<'a, R>
    where
        R: 'a,
    {
        Box::new(self.source.traverse().map(&self.selector))
    }
}

/// Maps every element to a collection and flattens the result.
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct SelectMany<S, F, C> {
    source: S,
    selector: F,
    collection: PhantomData<fn() -> C>,
}

impl<S, F, C> SelectMany<S, F, C> {
    pub(crate) fn new(source: S, selector: F) -> Self {
        SelectMany {
            source,
            selector,
            collection: PhantomData,
        }
    }
}

impl<S, F, C> Sequence for SelectMany<S, F, C>
where
    S: Sequence,
    F: Fn(S::Item) -> C,
    C: IntoIterator,
{
    type Item = C::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, C::Item>
    where
        C::Item: 'a,
    {
        Box::new(self.source.traverse().flat_map(&self.selector))
    }
}

/// Like [`SelectMany`], combining each parent with each of its children.
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct SelectManyWith<S, F, G, C> {
    source: S,
    collection: F,
    result: G,
    marker: PhantomData<fn() -> C>,
}

impl<S, F, G, C> SelectManyWith<S, F, G, C> {
    pub(crate) fn new(source: S, collection: F, result: G) -> Self {
        SelectManyWith {
            source,
            collection,
            result,
            marker: PhantomData,
        }
    }
}

impl<S, F, G, C, R> Sequence for SelectManyWith<S, F, G, C>
where
    S: Sequence,
    F: Fn(&S::Item) -> C,
    C: IntoIterator,
    G: Fn(&S::Item, C::Item) -> R,
{
    type Item = R;

    fn traverse<'a>(&'a self) -> Iter<'a, R>
    where
        R: 'a,
    {
        Box::new(self.source.traverse().flat_map(move |parent| {
            let children = (self.collection)(&parent);
            children
                .into_iter()
                .map(move |child| (self.result)(&parent, child))
        }))
    }
}

/// Keeps the elements matching a predicate. See `Query::filter`.
#[derive(Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Filter<S, P> {
    source: S,
    predicate: P,
}

impl<S, P> Filter<S, P> {
    pub(crate) fn new(source: S, predicate: P) -> Self {
        Filter { source, predicate }
    }
}

impl<S, P> Sequence for Filter<S, P>
where
    S: Sequence,
    P: Fn(&S::Item) -> bool,
{
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        Box::new(self.source.traverse().filter(&self.predicate))
    }
}

/// Runs an action on every element as it passes through.
#[derive(Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Inspect<S, F> {
    source: S,
    action: F,
}

impl<S, F> Inspect<S, F> {
    pub(crate) fn new(source: S, action: F) -> Self {
        Inspect { source, action }
    }
}

impl<S, F> Sequence for Inspect<S, F>
where
    S: Sequence,
    F: Fn(&S::Item),
{
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        Box::new(self.source.traverse().inspect(&self.action))
    }
}

/// The elements of `first` followed by the elements of `second`.
#[derive(Debug, Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Concat<A, B> {
    first: A,
    second: B,
}

impl<A, B> Concat<A, B> {
    pub(crate) fn new(first: A, second: B) -> Self {
        Concat { first, second }
    }
}

impl<A, B> Sequence for Concat<A, B>
where
    A: Sequence,
    B: Sequence<Item = A::Item>,
{
    type Item = A::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, A::Item>
    where
        A::Item: 'a,
    {
        Box::new(self.first.traverse().chain(self.second.traverse()))
    }
}

/// Two-way merge of two ordered sequences.
///
/// Pulls one element ahead from each side; on ties the left element is
/// yielded first.
#[derive(Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct Merge<A, B, C> {
    left: A,
    right: B,
    comparator: C,
}

impl<A, B, C> Merge<A, B, C> {
    pub(crate) fn new(left: A, right: B, comparator: C) -> Self {
        Merge {
            left,
            right,
            comparator,
        }
    }
}

impl<A, B, C> Sequence for Merge<A, B, C>
where
    A: Sequence,
    B: Sequence<Item = A::Item>,
    C: Fn(&A::Item, &A::Item) -> Ordering,
{
    type Item = A::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, A::Item>
    where
        A::Item: 'a,
    {
        let mut left = self.left.traverse().peekable();
        let mut right = self.right.traverse().peekable();
        Box::new(std::iter::from_fn(move || {
            let take_right = match (left.peek(), right.peek()) {
                (Some(l), Some(r)) => (self.comparator)(r, l) == Ordering::Less,
                (None, Some(_)) => true,
                _ => false,
            };
            if take_right {
                right.next()
            } else {
                left.next()
            }
        }))
    }
}
