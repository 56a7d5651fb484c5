//! Seq - Lazy, composable query operators over any Rust collection.
//!
//! Seq turns every collection into a [`Sequence`]: something that can hand
//! out a fresh traversal of its elements on demand. The [`Query`] extension
//! trait then layers chainable operators on top. It supports:
//!
//! - Projection and filtering: `select`, `select_many`, `filter`, `inspect`
//! - Windowing: `skip`/`take` (and their `_while`/`_last` forms), `batch`,
//!   `take_every`, `insert_many`
//! - Set algebra: `distinct`, `union`, `intersect`
//! - Grouping, nested-loop joins and multi-key ordering
//! - Terminal evaluators: aggregation, search, quantifiers and conversions
//!
//! # Quick Start
//!
//! ```rust
//! use standout_seq::Query;
//!
//! let numbers = vec![1, 2, 3, 4];
//!
//! // Nothing runs until a terminal evaluator pulls.
//! let small_desc = numbers
//!     .by_ref()
//!     .filter(|n| *n < 3)
//!     .order_by_descending(|n| *n);
//!
//! assert_eq!(small_desc.to_vec(), vec![2, 1]);
//! // Pipelines are restartable and never touch their source.
//! assert_eq!(small_desc.to_vec(), vec![2, 1]);
//! assert_eq!(numbers.count(), 4);
//! ```
//!
//! # Laziness
//!
//! Each operator pulls from its upstream only as many elements as it needs
//! for its next output, so unbounded sources work as long as something
//! downstream stops pulling:
//!
//! ```rust
//! use standout_seq::{source, Query};
//!
//! let naturals = source::generate(usize::MAX, |i| i as u64);
//! let squares = naturals.select(|n| n * n).skip(2).take(3);
//! assert_eq!(squares.to_vec(), vec![4, 9, 16]);
//! ```
//!
//! A few operators must see the whole upstream before they can yield
//! anything: `reverse`, the `order_by` family, `skip_last`/`take_last`,
//! `shuffle` and `group_by_bucketed`.
//!
//! # Grouping and Joins
//!
//! ```rust
//! use standout_seq::Query;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! struct Person { name: &'static str, age: u32 }
//!
//! let people = vec![
//!     Person { name: "ana", age: 19 },
//!     Person { name: "bo", age: 25 },
//!     Person { name: "cy", age: 19 },
//! ];
//!
//! let groups: Vec<(u32, usize)> = people
//!     .by_ref()
//!     .group_by(|p| p.age)
//!     .to_vec()
//!     .into_iter()
//!     .map(|g| (*g.key(), g.count()))
//!     .collect();
//! assert_eq!(groups, vec![(19, 2), (25, 1)]);
//!
//! let cities = vec![("ana", "Lisbon"), ("cy", "Porto")];
//! let located = people
//!     .left_join(cities, |p, c| p.name == c.0, |p, c| (p.name, c.map(|c| c.1)))
//!     .to_vec();
//! assert_eq!(located, vec![("ana", Some("Lisbon")), ("bo", None), ("cy", Some("Porto"))]);
//! ```
//!
//! # Errors
//!
//! Evaluators that can fail return [`Result`]; each has an `_or_none`
//! companion where absence is a normal answer:
//!
//! ```rust
//! use standout_seq::{source, Query, SeqError};
//!
//! let nothing = source::empty::<i32>();
//! assert_eq!(nothing.first_or_none(), None);
//! assert_eq!(nothing.first(), Err(SeqError::EmptySequence));
//! assert!(source::range(0, -1).is_err());
//! ```
//!
//! # Method Resolution
//!
//! With [`Query`] in scope, its methods take precedence over slice methods
//! reached through auto-deref and over inherent `&mut self` methods of the
//! same name. `vec.first()` and `vec.last()` return `Result<T>` instead of
//! `Option<&T>`, and `vec.reverse()`, `vec.insert(i, x)` and
//! `vec.append(x)` build lazy nodes instead of mutating the vector (every
//! node is `#[must_use]`, so a discarded one is flagged). Call the
//! collection method by path (`Vec::insert(&mut vec, i, x)`,
//! `vec.as_slice().first()`) or import `Query` in a narrower scope when the
//! collection form is wanted.

mod distinct;
mod error;
mod grouping;
mod join;
mod ordering;
mod query;
mod sequence;
pub mod source;
mod transform;
mod value;
mod window;

// Re-export public API
pub use distinct::{Distinct, DistinctBy};
pub use error::{Result, SeqError};
pub use grouping::{BucketedGroupBy, GroupBy, GroupMembers, Grouping};
pub use join::{InnerJoin, LeftJoin, OuterJoin, RightJoin};
pub use ordering::{compare_by_orderings, Dir, OrderBy, Ordered};
pub use query::{Comparison, Equality, KeepLeft, Query};
pub use sequence::{BoxedSequence, Iter, Sequence};
pub use source::{empty, from, generate, random, random_seeded, range, repeat};
pub use transform::{Concat, Filter, Inspect, Merge, Select, SelectMany, SelectManyWith};
pub use value::{AsNumber, Number, Value};
pub use window::{
    Batch, Below, Every, IndexPredicate, Insert, Repeated, Reverse, Shuffle, SkipWhile, Tail,
    TailMode, TakeWhile,
};
