//! Keyed partitioning.
//!
//! [`GroupBy`] is the lazy form: it finds the distinct keys in
//! first-encounter order and hands out one [`Grouping`] per key whose
//! members are found by re-filtering the source when the grouping itself is
//! traversed. Walking every group and every member therefore scans the
//! source once per distinct key. [`BucketedGroupBy`] trades that for a
//! single hashed pass that materializes the members up front.

use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::rc::Rc;

use tracing::trace;

use crate::sequence::{Iter, Sequence};

/// A keyed sub-sequence. Traversing a grouping traverses its members.
#[derive(Debug, Clone, PartialEq)]
pub struct Grouping<K, M> {
    key: K,
    members: M,
}

impl<K, M> Grouping<K, M> {
    pub(crate) fn new(key: K, members: M) -> Self {
        Grouping { key, members }
    }

    /// The key shared by every member.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// The members, as a sequence of their own.
    pub fn members(&self) -> &M {
        &self.members
    }

    /// Splits the grouping into its key and members.
    pub fn into_parts(self) -> (K, M) {
        (self.key, self.members)
    }
}

impl<K, M: Sequence> Sequence for Grouping<K, M> {
    type Item = M::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, M::Item>
    where
        M::Item: 'a,
    {
        self.members.traverse()
    }
}

/// Lazy group-by. See the module docs for the cost model.
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct GroupBy<S, F, E, K> {
    source: Rc<S>,
    key_selector: Rc<F>,
    equality: Rc<E>,
    key: PhantomData<fn() -> K>,
}

impl<S, F, E, K> GroupBy<S, F, E, K> {
    pub(crate) fn new(source: S, key_selector: F, equality: E) -> Self {
        GroupBy {
            source: Rc::new(source),
            key_selector: Rc::new(key_selector),
            equality: Rc::new(equality),
            key: PhantomData,
        }
    }
}

impl<S, F, E, K> Clone for GroupBy<S, F, E, K> {
    fn clone(&self) -> Self {
        GroupBy {
            source: Rc::clone(&self.source),
            key_selector: Rc::clone(&self.key_selector),
            equality: Rc::clone(&self.equality),
            key: PhantomData,
        }
    }
}

impl<S, F, E, K> Sequence for GroupBy<S, F, E, K>
where
    S: Sequence,
    F: Fn(&S::Item) -> K,
    E: Fn(&K, &K) -> bool,
    K: Clone,
{
    type Item = Grouping<K, GroupMembers<S, F, E, K>>;

    fn traverse<'a>(&'a self) -> Iter<'a, Self::Item>
    where
        Self::Item: 'a,
    {
        let mut seen: Vec<K> = Vec::new();
        Box::new(self.source.traverse().filter_map(move |element| {
            let key = (self.key_selector)(&element);
            if seen.iter().any(|previous| (self.equality)(previous, &key)) {
                return None;
            }
            seen.push(key.clone());
            let members = GroupMembers {
                source: Rc::clone(&self.source),
                key_selector: Rc::clone(&self.key_selector),
                equality: Rc::clone(&self.equality),
                key: key.clone(),
            };
            Some(Grouping::new(key, members))
        }))
    }
}

/// The members of one lazy [`Grouping`]: the source filtered by key equality.
pub struct GroupMembers<S, F, E, K> {
    source: Rc<S>,
    key_selector: Rc<F>,
    equality: Rc<E>,
    key: K,
}

impl<S, F, E, K: Clone> Clone for GroupMembers<S, F, E, K> {
    fn clone(&self) -> Self {
        GroupMembers {
            source: Rc::clone(&self.source),
            key_selector: Rc::clone(&self.key_selector),
            equality: Rc::clone(&self.equality),
            key: self.key.clone(),
        }
    }
}

impl<S, F, E, K> Sequence for GroupMembers<S, F, E, K>
where
    S: Sequence,
    F: Fn(&S::Item) -> K,
    E: Fn(&K, &K) -> bool,
{
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        Box::new(
            self.source
                .traverse()
                .filter(move |element| (self.equality)(&(self.key_selector)(element), &self.key)),
        )
    }
}

/// Single-pass group-by over hashable keys.
///
/// Each traversal buckets the whole source before yielding the first group.
/// Key order and member order match [`GroupBy`].
#[derive(Clone)]
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct BucketedGroupBy<S, F, K> {
    source: S,
    key_selector: F,
    key: PhantomData<fn() -> K>,
}

impl<S, F, K> BucketedGroupBy<S, F, K> {
    pub(crate) fn new(source: S, key_selector: F) -> Self {
        BucketedGroupBy {
            source,
            key_selector,
            key: PhantomData,
        }
    }
}

impl<S, F, K> Sequence for BucketedGroupBy<S, F, K>
where
    S: Sequence,
    F: Fn(&S::Item) -> K,
    K: Hash + Eq + Clone,
{
    type Item = Grouping<K, Vec<S::Item>>;

    fn traverse<'a>(&'a self) -> Iter<'a, Self::Item>
    where
        Self::Item: 'a,
    {
        let mut index: HashMap<K, usize> = HashMap::new();
        let mut groups: Vec<Grouping<K, Vec<S::Item>>> = Vec::new();
        for element in self.source.traverse() {
            let key = (self.key_selector)(&element);
            match index.get(&key) {
                Some(&slot) => groups[slot].members.push(element),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(Grouping::new(key, vec![element]));
                }
            }
        }
        trace!(groups = groups.len(), "bucketed source");
        Box::new(groups.into_iter())
    }
}
