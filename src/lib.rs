//! Chunked sequences with monoid-cached measurements.
//!
//! A chunked sequence stores items in fixed-capacity chunks arranged as
//! a shallow, uniform-depth tree, with two finger chunks at each end.
//! That layout gives amortized O(1) push/pop at both ends, O(log n)
//! indexed access, and O(log n) split and concat. Every node caches a
//! monoid fold of the items below it, so splits can also be directed by
//! a monotone predicate over the running prefix measurement (by weight,
//! by key, or by any client algebra).
//!
//! # Quick start
//!
//! ```
//! use chunkseq::seq::Deque;
//!
//! let mut seq: Deque<i32> = (1..=10).collect();
//! assert_eq!(seq.len(), 10);
//!
//! let mut tail = seq.split_off_at(4);
//! assert_eq!(seq.iter().cloned().collect::<Vec<_>>(), vec![1, 2, 3, 4]);
//! assert_eq!(tail.len(), 6);
//!
//! seq.concat(&mut tail);
//! assert_eq!(seq.len(), 10);
//! assert!(tail.is_empty());
//! ```
//!
//! The engine is parameterized by a measurement policy ([`measure`]) and
//! a chunk representation ([`chunk`]); the derived configurations in
//! [`seq`] and the sorted map in [`map`] are thin instantiations of the
//! same core.

pub mod chunk;
pub mod cursor;
pub mod map;
pub mod measure;
pub mod profiling;
pub mod seq;
pub mod tree;
