//! First-occurrence de-duplication.

use std::marker::PhantomData;

use crate::sequence::{Iter, Sequence};

/// Yields the first element seen for each distinct key, in first-encounter
/// order.
///
/// Keys already seen are kept in a per-traversal buffer and each new key is
/// tested against all of them with the equality check, so the cost grows
/// with the square of the number of distinct keys. Use
/// `Query::group_by_bucketed` when keys are hashable and inputs are large.
#[must_use = "sequence operators are lazy and do nothing unless traversed"]
pub struct DistinctBy<S, F, E, K> {
    source: S,
    key_selector: F,
    equality: E,
    key: PhantomData<fn() -> K>,
}

/// [`DistinctBy`] over the elements themselves.
pub type Distinct<S, E, T> = DistinctBy<S, fn(&T) -> T, E, T>;

impl<S, F, E, K> DistinctBy<S, F, E, K> {
    pub(crate) fn new(source: S, key_selector: F, equality: E) -> Self {
        DistinctBy {
            source,
            key_selector,
            equality,
            key: PhantomData,
        }
    }
}

impl<S, F, E, K> Sequence for DistinctBy<S, F, E, K>
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
        let mut seen: Vec<K> = Vec::new();
        Box::new(self.source.traverse().filter(move |element| {
            let key = (self.key_selector)(element);
            if seen.iter().any(|previous| (self.equality)(previous, &key)) {
                return false;
            }
            seen.push(key);
            true
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<S: Sequence>(seq: &S) -> Vec<S::Item> {
        seq.traverse().collect()
    }

    #[test]
    fn keeps_first_occurrence() {
        let seq: Distinct<_, _, i32> =
            DistinctBy::new(vec![3, 1, 3, 2, 1], Clone::clone, PartialEq::eq);
        assert_eq!(collect(&seq), vec![3, 1, 2]);
    }

    #[test]
    fn by_key_with_custom_equality() {
        let words = vec!["Apple", "avocado", "Banana", "blueberry", "cherry"];
        let seq = DistinctBy::new(
            words,
            |w: &&str| w.chars().next().unwrap_or_default(),
            |a: &char, b: &char| a.eq_ignore_ascii_case(b),
        );
        assert_eq!(collect(&seq), vec!["Apple", "Banana", "cherry"]);
    }

    #[test]
    fn every_traversal_starts_clean() {
        let seq: Distinct<_, _, i32> = DistinctBy::new(vec![1, 1, 2], Clone::clone, PartialEq::eq);
        assert_eq!(collect(&seq), vec![1, 2]);
        assert_eq!(collect(&seq), vec![1, 2]);
    }
}
