//! Nested-loop joins.
//!
//! Every join scans the full right sequence once per left element and
//! yields results in left-then-right nested order. Conditions and result
//! selectors borrow both sides; a missing side is passed as `None`.

use std::cell::RefCell;
use std::rc::Rc;

use crate::sequence::{Iter, Sequence};

/// Pairs every left element with every matching right element.
#[derive(Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct InnerJoin<L, R, C, F> {
    left: L,
    right: R,
    condition: C,
    selector: F,
}

impl<L, R, C, F> InnerJoin<L, R, C, F> {
    pub(crate) fn new(left: L, right: R, condition: C, selector: F) -> Self {
        InnerJoin {
            left,
            right,
            condition,
            selector,
        }
    }
}

impl<L, R, C, F, O> Sequence for InnerJoin<L, R, C, F>
where
    L: Sequence,
    R: Sequence,
    C: Fn(&L::Item, &R::Item) -> bool,
    F: Fn(&L::Item, &R::Item) -> O,
{
    type Item = O;

    fn traverse<'a>(&'a self) -> Iter<'a, O>
    where
        O: 'a,
    {
        Box::new(self.left.traverse().flat_map(move |l| {
            self.right.traverse().filter_map(move |r| {
                (self.condition)(&l, &r).then(|| (self.selector)(&l, &r))
            })
        }))
    }
}

/// Like [`InnerJoin`], plus one `selector(l, None)` result for every left
/// element that matched nothing.
#[derive(Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct LeftJoin<L, R, C, F> {
    left: L,
    right: R,
    condition: C,
    selector: F,
}

impl<L, R, C, F> LeftJoin<L, R, C, F> {
    pub(crate) fn new(left: L, right: R, condition: C, selector: F) -> Self {
        LeftJoin {
            left,
            right,
            condition,
            selector,
        }
    }
}

impl<L, R, C, F, O> Sequence for LeftJoin<L, R, C, F>
where
    L: Sequence,
    R: Sequence,
    C: Fn(&L::Item, &R::Item) -> bool,
    F: Fn(&L::Item, Option<&R::Item>) -> O,
{
    type Item = O;

    fn traverse<'a>(&'a self) -> Iter<'a, O>
    where
        O: 'a,
    {
        nested_left_join(
            self.left.traverse(),
            &self.right,
            move |l: &L::Item, r: &R::Item| (self.condition)(l, r),
            move |l: &L::Item, r: Option<&R::Item>| (self.selector)(l, r),
        )
    }
}

/// The mirror of [`LeftJoin`]: every right element is kept, with
/// `selector(None, r)` for those no left element matched.
///
/// Runs as a left join driven from the right side, so results come in
/// right-then-left nested order.
#[derive(Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct RightJoin<L, R, C, F> {
    left: L,
    right: R,
    condition: C,
    selector: F,
}

impl<L, R, C, F> RightJoin<L, R, C, F> {
    pub(crate) fn new(left: L, right: R, condition: C, selector: F) -> Self {
        RightJoin {
            left,
            right,
            condition,
            selector,
        }
    }
}

impl<L, R, C, F, O> Sequence for RightJoin<L, R, C, F>
where
    L: Sequence,
    R: Sequence,
    C: Fn(&L::Item, &R::Item) -> bool,
    F: Fn(Option<&L::Item>, &R::Item) -> O,
{
    type Item = O;

    fn traverse<'a>(&'a self) -> Iter<'a, O>
    where
        O: 'a,
    {
        nested_left_join(
            self.right.traverse(),
            &self.left,
            move |r: &R::Item, l: &L::Item| (self.condition)(l, r),
            move |r: &R::Item, l: Option<&L::Item>| (self.selector)(l, r),
        )
    }
}

/// Full outer join: a left join pass followed by one `selector(None, r)`
/// result per right element that never matched.
///
/// Matched right elements are tracked by their position in the right
/// traversal, so two equal right elements are still told apart. An
/// unmatched right value that occurs twice yields two `selector(None, r)`
/// results; unmatched rights are not de-duplicated by value.
#[derive(Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct OuterJoin<L, R, C, F> {
    left: L,
    right: R,
    condition: C,
    selector: F,
}

impl<L, R, C, F> OuterJoin<L, R, C, F> {
    pub(crate) fn new(left: L, right: R, condition: C, selector: F) -> Self {
        OuterJoin {
            left,
            right,
            condition,
            selector,
        }
    }
}

impl<L, R, C, F, O> Sequence for OuterJoin<L, R, C, F>
where
    L: Sequence,
    R: Sequence,
    C: Fn(&L::Item, &R::Item) -> bool,
    F: Fn(Option<&L::Item>, Option<&R::Item>) -> O,
{
    type Item = O;

    fn traverse<'a>(&'a self) -> Iter<'a, O>
    where
        O: 'a,
    {
        let used: Rc<RefCell<Vec<bool>>> = Rc::default();
        let marks = Rc::clone(&used);

        let left_pass = self.left.traverse().flat_map(move |l| {
            let l = Rc::new(l);
            let probe = Rc::clone(&l);
            let marks = Rc::clone(&marks);
            let mut matches = self
                .right
                .traverse()
                .enumerate()
                .filter_map(move |(position, r)| {
                    if !(self.condition)(&probe, &r) {
                        return None;
                    }
                    let mut marks = marks.borrow_mut();
                    if marks.len() <= position {
                        marks.resize(position + 1, false);
                    }
                    marks[position] = true;
                    Some((self.selector)(Some(&*probe), Some(&r)))
                })
                .peekable();
            let fallback = matches
                .peek()
                .is_none()
                .then(|| (self.selector)(Some(&*l), None));
            matches.chain(fallback)
        });

        let unmatched = std::iter::once_with(move || {
            self.right
                .traverse()
                .enumerate()
                .filter(move |(position, _)| {
                    !used.borrow().get(*position).copied().unwrap_or(false)
                })
                .map(move |(_, r)| (self.selector)(None, Some(&r)))
        })
        .flatten();

        Box::new(left_pass.chain(unmatched))
    }
}

/// Shared driver for left and right joins: every `outer` element is paired
/// with the matching `inner` elements, or once with `None`.
fn nested_left_join<'a, A, B, C, F, O>(
    outer: Iter<'a, A>,
    inner: &'a B,
    condition: C,
    selector: F,
) -> Iter<'a, O>
where
    A: 'a,
    B: Sequence,
    B::Item: 'a,
    C: Fn(&A, &B::Item) -> bool + Copy + 'a,
    F: Fn(&A, Option<&B::Item>) -> O + Copy + 'a,
    O: 'a,
{
    Box::new(outer.flat_map(move |a| {
        let a = Rc::new(a);
        let probe = Rc::clone(&a);
        let mut matches = inner
            .traverse()
            .filter_map(move |b| condition(&probe, &b).then(|| selector(&probe, Some(&b))))
            .peekable();
        let fallback = matches.peek().is_none().then(|| selector(&a, None));
        matches.chain(fallback)
    }))
}

/// Result selector for joins that keep the left element.
pub(crate) fn clone_left<T: Clone>(left: &T, _right: &T) -> T {
    left.clone()
}
