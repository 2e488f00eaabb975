//! Property-based tests for the chunked sequence and sorted map.

use std::collections::BTreeMap;
use std::collections::VecDeque;

use proptest::prelude::*;

use chunkseq::map::SortedMap;
use chunkseq::measure::Weight;
use chunkseq::seq::ChunkedSeq;
use chunkseq::seq::Deque;
use chunkseq::seq::WeightedSeq;

// =============================================================================
// Test helpers
// =============================================================================

/// One end operation on a sequence.
#[derive(Clone, Debug)]
enum EndOp {
    PushBack(i32),
    PushFront(i32),
    PopBack,
    PopFront,
}

fn arbitrary_end_op() -> impl Strategy<Value = EndOp> {
    prop_oneof![
        any::<i32>().prop_map(EndOp::PushBack),
        any::<i32>().prop_map(EndOp::PushFront),
        Just(EndOp::PopBack),
        Just(EndOp::PopFront),
    ]
}

/// Small even chunk capacities push the tree to depth quickly.
fn arbitrary_capacity() -> impl Strategy<Value = usize> {
    return prop_oneof![Just(2usize), Just(4), Just(8), Just(16)];
}

#[derive(Clone, Debug)]
struct Item(i32, u64);

impl Weight for Item {
    fn weight(&self) -> u64 {
        return self.1;
    }
}

// =============================================================================
// Sequence properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Any stream of end operations leaves the sequence observably equal
    /// to a VecDeque driven by the same stream.
    #[test]
    fn end_ops_match_vec_deque(
        cap in arbitrary_capacity(),
        ops in prop::collection::vec(arbitrary_end_op(), 0..400),
    ) {
        let mut seq = Deque::with_chunk_capacity(cap);
        let mut model: VecDeque<i32> = VecDeque::new();

        for op in &ops {
            match op {
                EndOp::PushBack(x) => {
                    seq.push_back(*x);
                    model.push_back(*x);
                }
                EndOp::PushFront(x) => {
                    seq.push_front(*x);
                    model.push_front(*x);
                }
                EndOp::PopBack => prop_assert_eq!(seq.pop_back(), model.pop_back()),
                EndOp::PopFront => prop_assert_eq!(seq.pop_front(), model.pop_front()),
            }
            prop_assert_eq!(seq.len(), model.len());
        }

        let items: Vec<i32> = seq.iter().cloned().collect();
        let expected: Vec<i32> = model.iter().cloned().collect();
        prop_assert_eq!(items, expected);

        let backward: Vec<i32> = seq.iter().rev().cloned().collect();
        let expected_backward: Vec<i32> = model.iter().rev().cloned().collect();
        prop_assert_eq!(backward, expected_backward);
    }

    /// split(i) then concat restores the original sequence, for every
    /// cut index.
    #[test]
    fn split_concat_round_trips(
        cap in arbitrary_capacity(),
        items in prop::collection::vec(any::<i32>(), 0..300),
        cut_pct in 0.0..=1.0f64,
    ) {
        let cut = ((items.len() as f64) * cut_pct) as usize;
        let mut seq: Deque<i32> = Deque::with_chunk_capacity(cap);
        for item in &items {
            seq.push_back(*item);
        }

        let mut tail = seq.split_off_at(cut);
        let left: Vec<i32> = seq.iter().cloned().collect();
        let right: Vec<i32> = tail.iter().cloned().collect();
        prop_assert_eq!(&left[..], &items[..cut]);
        prop_assert_eq!(&right[..], &items[cut..]);

        seq.concat(&mut tail);
        prop_assert!(tail.is_empty());
        let rejoined: Vec<i32> = seq.iter().cloned().collect();
        prop_assert_eq!(rejoined, items);
    }

    /// Indexed reads agree with the model at every position.
    #[test]
    fn indexing_matches_model(
        cap in arbitrary_capacity(),
        items in prop::collection::vec(any::<i32>(), 1..200),
    ) {
        let mut seq: Deque<i32> = Deque::with_chunk_capacity(cap);
        for item in &items {
            seq.push_back(*item);
        }
        for (i, item) in items.iter().enumerate() {
            prop_assert_eq!(seq.get(i), Some(item));
        }
        prop_assert_eq!(seq.get(items.len()), None);
    }

    /// The incrementally maintained measurement equals the fold
    /// recomputed from scratch, bit for bit, after arbitrary mutation.
    #[test]
    fn cached_measure_equals_recomputed_fold(
        weights in prop::collection::vec(0u64..100, 0..200),
        ops in prop::collection::vec(arbitrary_end_op(), 0..100),
    ) {
        let mut seq: WeightedSeq<Item> = ChunkedSeq::with_chunk_capacity(4);
        for (i, w) in weights.iter().enumerate() {
            seq.push_back(Item(i as i32, *w));
        }
        for op in &ops {
            match op {
                EndOp::PushBack(x) => seq.push_back(Item(*x, (*x as u64) % 17)),
                EndOp::PushFront(x) => seq.push_front(Item(*x, (*x as u64) % 17)),
                EndOp::PopBack => {
                    seq.pop_back();
                }
                EndOp::PopFront => {
                    seq.pop_front();
                }
            }
        }

        let (count, weight) = seq.measure();
        let expected_weight: u64 = seq.iter().map(|item| item.1).sum();
        prop_assert_eq!(count, seq.iter().count());
        prop_assert_eq!(weight, expected_weight);
    }

    /// Weight-directed splits land on the first item whose inclusive
    /// prefix weight reaches the target.
    #[test]
    fn weighted_split_is_first_true(
        weights in prop::collection::vec(0u64..5, 1..150),
        target_pct in 0.0..=1.0f64,
    ) {
        let total: u64 = weights.iter().sum();
        let target = ((total as f64) * target_pct) as u64;

        let mut seq: WeightedSeq<Item> = ChunkedSeq::with_chunk_capacity(4);
        for (i, w) in weights.iter().enumerate() {
            seq.push_back(Item(i as i32, *w));
        }
        let tail = seq.split_off_by(|v| v.1 >= target);

        let mut acc = 0u64;
        let mut cut = weights.len();
        for (i, w) in weights.iter().enumerate() {
            acc += w;
            if acc >= target {
                cut = i;
                break;
            }
        }
        prop_assert_eq!(seq.len(), cut);
        prop_assert_eq!(tail.len(), weights.len() - cut);
    }
}

// =============================================================================
// Map properties
// =============================================================================

/// One map operation.
#[derive(Clone, Debug)]
enum MapOp {
    Insert(u8, i32),
    Remove(u8),
    Get(u8),
}

fn arbitrary_map_op() -> impl Strategy<Value = MapOp> {
    prop_oneof![
        (any::<u8>(), any::<i32>()).prop_map(|(k, v)| MapOp::Insert(k, v)),
        any::<u8>().prop_map(MapOp::Remove),
        any::<u8>().prop_map(MapOp::Get),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// The sorted map agrees with BTreeMap on every operation's result
    /// and on the final contents.
    #[test]
    fn map_matches_btree_map(
        ops in prop::collection::vec(arbitrary_map_op(), 0..300),
    ) {
        let mut map: SortedMap<u8, i32> = SortedMap::with_chunk_capacity(4);
        let mut model: BTreeMap<u8, i32> = BTreeMap::new();

        for op in &ops {
            match op {
                MapOp::Insert(k, v) => prop_assert_eq!(map.insert(*k, *v), model.insert(*k, *v)),
                MapOp::Remove(k) => prop_assert_eq!(map.remove(k), model.remove(k)),
                MapOp::Get(k) => prop_assert_eq!(map.get(k), model.get(k)),
            }
        }

        prop_assert_eq!(map.len(), model.len());
        let pairs: Vec<(u8, i32)> = map.iter().map(|(k, v)| (*k, *v)).collect();
        let expected: Vec<(u8, i32)> = model.iter().rev().map(|(k, v)| (*k, *v)).collect();
        prop_assert_eq!(pairs, expected);
    }
}
