//! The sequence abstraction.
//!
//! A [`Sequence`] is a capability, not a container: it hands out a fresh
//! traversal of its elements every time [`Sequence::traverse`] is called.
//! Every operator in this crate is a `Sequence` wrapping its upstream
//! sequence(s), and every standard collection is a `Sequence` over clones
//! of its elements.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::rc::Rc;

/// A traversal handed out by [`Sequence::traverse`].
pub type Iter<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

/// A type-erased sequence.
pub type BoxedSequence<'a, T> = Box<dyn Sequence<Item = T> + 'a>;

/// Repeatable, on-demand, ordered production of elements.
///
/// Each call to [`traverse`](Sequence::traverse) must start a logically
/// independent iteration: any cursor, buffer or counter lives inside the
/// returned iterator, never in `self`. Sequences built over in-memory
/// collections therefore re-yield the same elements in the same order on
/// every traversal.
///
/// # Manual Implementation
///
/// ```
/// use standout_seq::{Iter, Query, Sequence};
///
/// struct Evens {
///     count: u32,
/// }
///
/// impl Sequence for Evens {
///     type Item = u32;
///
///     fn traverse<'a>(&'a self) -> Iter<'a, u32>
///     where
///         u32: 'a,
///     {
///         Box::new((0..self.count).map(|n| n * 2))
///     }
/// }
///
/// let evens = Evens { count: 4 };
/// assert_eq!(evens.to_vec(), vec![0, 2, 4, 6]);
/// assert_eq!(evens.sum().unwrap().to_f64(), 12.0);
/// ```
pub trait Sequence {
    /// The element type.
    type Item;

    /// Starts a fresh traversal of the elements.
    fn traverse<'a>(&'a self) -> Iter<'a, Self::Item>
    where
        Self::Item: 'a;
}

impl<S: Sequence + ?Sized> Sequence for &S {
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        (**self).traverse()
    }
}

impl<S: Sequence + ?Sized> Sequence for Box<S> {
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        (**self).traverse()
    }
}

impl<S: Sequence + ?Sized> Sequence for Rc<S> {
    type Item = S::Item;

    fn traverse<'a>(&'a self) -> Iter<'a, S::Item>
    where
        S::Item: 'a,
    {
        (**self).traverse()
    }
}

// ============================================================================
// Collection adapters
// ============================================================================

macro_rules! cloned_sequence {
    ($ty:ty, [$($bounds:tt)*]) => {
        impl<T: $($bounds)*> Sequence for $ty {
            type Item = T;

            fn traverse<'a>(&'a self) -> Iter<'a, T>
            where
                T: 'a,
            {
                Box::new(self.iter().cloned())
            }
        }
    };
}

cloned_sequence!(Vec<T>, [Clone]);
cloned_sequence!([T], [Clone]);
cloned_sequence!(VecDeque<T>, [Clone]);
cloned_sequence!(BTreeSet<T>, [Clone]);

impl<T: Clone, const N: usize> Sequence for [T; N] {
    type Item = T;

    fn traverse<'a>(&'a self) -> Iter<'a, T>
    where
        T: 'a,
    {
        Box::new(self.as_slice().iter().cloned())
    }
}

impl<T: Clone, H> Sequence for HashSet<T, H> {
    type Item = T;

    fn traverse<'a>(&'a self) -> Iter<'a, T>
    where
        T: 'a,
    {
        Box::new(self.iter().cloned())
    }
}

impl<K: Clone, V: Clone, H> Sequence for HashMap<K, V, H> {
    type Item = (K, V);

    fn traverse<'a>(&'a self) -> Iter<'a, (K, V)>
    where
        (K, V): 'a,
    {
        Box::new(self.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

impl<K: Clone, V: Clone> Sequence for BTreeMap<K, V> {
    type Item = (K, V);

    fn traverse<'a>(&'a self) -> Iter<'a, (K, V)>
    where
        (K, V): 'a,
    {
        Box::new(self.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<S: Sequence + ?Sized>(seq: &S) -> Vec<S::Item> {
        seq.traverse().collect()
    }

    #[test]
    fn vec_traversals_are_independent() {
        let items = vec![1, 2, 3];
        let mut first = items.traverse();
        assert_eq!(first.next(), Some(1));

        // A second traversal starts over regardless of the first cursor.
        assert_eq!(collect(&items), vec![1, 2, 3]);
        assert_eq!(first.next(), Some(2));
    }

    #[test]
    fn arrays_slices_and_deques() {
        assert_eq!(collect(&[4, 5]), vec![4, 5]);
        assert_eq!(collect(&vec![1, 2][..]), vec![1, 2]);
        assert_eq!(collect(&VecDeque::from(vec!['a', 'b'])), vec!['a', 'b']);
    }

    #[test]
    fn maps_yield_pairs() {
        let map: BTreeMap<&str, i32> = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(collect(&map), vec![("a", 1), ("b", 2)]);

        let hashed: HashMap<&str, i32> = [("x", 9)].into_iter().collect();
        assert_eq!(collect(&hashed), vec![("x", 9)]);
    }

    #[test]
    fn sets_repeat_their_order() {
        let set: HashSet<i32> = (0..20).collect();
        assert_eq!(collect(&set), collect(&set));
        assert_eq!(collect(&BTreeSet::from([3, 1, 2])), vec![1, 2, 3]);
    }

    #[test]
    fn wrappers_forward() {
        let shared = Rc::new(vec![7, 8]);
        assert_eq!(collect(&shared), vec![7, 8]);

        let boxed: BoxedSequence<'_, i32> = Box::new(vec![1]);
        assert_eq!(collect(&boxed), vec![1]);
        assert_eq!(collect(&&boxed), vec![1]);
    }
}
