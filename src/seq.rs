//! Bootstrapped chunked sequence.
//!
//! The outer structure keeps up to four finger chunks (two at each end)
//! around a middle tree whose payload entries are *whole chunks* of
//! items. End operations land in the outer fingers in O(1); a full outer
//! finger is swapped fresh and the full chunk displaces the inner finger
//! down into the middle tree, which is why pushes stay amortized O(1)
//! while split and concat stay O(log n).
//!
//! The total measurement is derived from the five cached measurements
//! (four fingers plus the middle tree), so `measure` and `len` are O(1).
//!
//! Derived configurations are type aliases over the same engine:
//! [`Deque`], [`StackSeq`], [`BagSeq`], and [`WeightedSeq`].

use serde::de::SeqAccess;
use serde::de::Visitor;
use serde::ser::SerializeSeq;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;

use crate::chunk::Bag;
use crate::chunk::Buffer;
use crate::chunk::Chunk;
use crate::chunk::ChunkMeasure;
use crate::chunk::Ring;
use crate::chunk::Stack;
use crate::chunk::DEFAULT_CAPACITY;
use crate::measure::ByWeight;
use crate::measure::Count;
use crate::measure::HasSize;
use crate::measure::Measure;
use crate::measure::Monoid;
use crate::measure::Pair;
use crate::profiling;
use crate::tree::Tree;

/// A chunked sequence: amortized O(1) ends, O(log n) indexed access,
/// split, and concat, parameterized by a measurement policy and a chunk
/// representation.
pub struct ChunkedSeq<T, M: Measure<T> = Count, B: Buffer<T> = Ring<T>> {
    front_outer: Chunk<T, M, B>,
    front_inner: Chunk<T, M, B>,
    middle: Tree<Chunk<T, M, B>, ChunkMeasure<M>>,
    back_inner: Chunk<T, M, B>,
    back_outer: Chunk<T, M, B>,
    cap: usize,
}

/// Double-ended queue: ring chunks under the size policy.
pub type Deque<T> = ChunkedSeq<T, Count, Ring<T>>;

/// Stack-shaped sequence: one-sided chunks under the size policy. Back
/// operations are O(1); front operations cost O(K) inside a chunk.
pub type StackSeq<T> = ChunkedSeq<T, Count, Stack<T>>;

/// Bag: compacting chunks under the size policy. Front operations
/// redirect to the back, so ordering across pops is not preserved.
pub type BagSeq<T> = ChunkedSeq<T, Count, Bag<T>>;

/// Weighted sequence: ring chunks measured by item count and weight, so
/// both indexing and weight-directed splits are available.
pub type WeightedSeq<T> = ChunkedSeq<T, Pair<Count, ByWeight>, Ring<T>>;

impl<T, M: Measure<T>, B: Buffer<T>> ChunkedSeq<T, M, B> {
    /// Create an empty sequence with the default chunk capacity.
    pub fn new() -> Self {
        return Self::with_chunk_capacity(DEFAULT_CAPACITY);
    }

    /// Create an empty sequence whose chunks hold up to `cap` items.
    /// `cap` must be a positive even number.
    pub fn with_chunk_capacity(cap: usize) -> Self {
        assert!(cap >= 2 && cap % 2 == 0, "chunk capacity must be a positive even number");
        return ChunkedSeq {
            front_outer: Chunk::new(cap),
            front_inner: Chunk::new(cap),
            middle: Tree::new(cap),
            back_inner: Chunk::new(cap),
            back_outer: Chunk::new(cap),
            cap,
        };
    }

    #[inline]
    pub fn chunk_capacity(&self) -> usize {
        return self.cap;
    }

    /// The measurement of the whole sequence: the fold of the four
    /// finger caches and the middle tree's cache. O(1).
    pub fn measure(&self) -> M::Value {
        let mut acc = self.front_outer.measure().clone();
        acc = acc.combine(self.front_inner.measure());
        acc = acc.combine(self.middle.measure());
        acc = acc.combine(self.back_inner.measure());
        acc = acc.combine(self.back_outer.measure());
        return acc;
    }

    /// Number of items. O(1). Requires a size-bearing policy.
    pub fn len(&self) -> usize
    where
        M::Value: HasSize,
    {
        return self.measure().size();
    }

    pub fn is_empty(&self) -> bool {
        return self.front_outer.is_empty()
            && self.front_inner.is_empty()
            && self.middle.is_empty()
            && self.back_inner.is_empty()
            && self.back_outer.is_empty();
    }

    // --- End operations ---

    /// Append an item. Amortized O(1).
    pub fn push_back(&mut self, item: T) {
        if self.back_outer.is_full() {
            let full = std::mem::replace(&mut self.back_outer, Chunk::new(self.cap));
            if self.back_inner.is_empty() {
                self.back_inner = full;
            } else {
                let spill = std::mem::replace(&mut self.back_inner, full);
                self.middle.push_back(spill);
                profiling::finger_spill();
            }
        }
        self.back_outer.push_back(item);
    }

    /// Prepend an item. Amortized O(1).
    pub fn push_front(&mut self, item: T) {
        if self.front_outer.is_full() {
            let full = std::mem::replace(&mut self.front_outer, Chunk::new(self.cap));
            if self.front_inner.is_empty() {
                self.front_inner = full;
            } else {
                let spill = std::mem::replace(&mut self.front_inner, full);
                self.middle.push_front(spill);
                profiling::finger_spill();
            }
        }
        self.front_outer.push_front(item);
    }

    /// Remove and return the last item, or `None` when empty.
    /// Amortized O(1).
    pub fn pop_back(&mut self) -> Option<T> {
        if !self.back_outer.is_empty() {
            return self.back_outer.pop_back();
        }
        if !self.back_inner.is_empty() {
            std::mem::swap(&mut self.back_outer, &mut self.back_inner);
            return self.back_outer.pop_back();
        }
        if let Some(chunk) = self.middle.pop_back() {
            profiling::finger_refill();
            self.back_outer = chunk;
            return self.back_outer.pop_back();
        }
        if !self.front_inner.is_empty() {
            return self.front_inner.pop_back();
        }
        return self.front_outer.pop_back();
    }

    /// Remove and return the first item, or `None` when empty.
    /// Amortized O(1).
    pub fn pop_front(&mut self) -> Option<T> {
        if !self.front_outer.is_empty() {
            return self.front_outer.pop_front();
        }
        if !self.front_inner.is_empty() {
            std::mem::swap(&mut self.front_outer, &mut self.front_inner);
            return self.front_outer.pop_front();
        }
        if let Some(chunk) = self.middle.pop_front() {
            profiling::finger_refill();
            self.front_outer = chunk;
            return self.front_outer.pop_front();
        }
        if !self.back_inner.is_empty() {
            return self.back_inner.pop_front();
        }
        return self.back_outer.pop_front();
    }

    pub fn front(&self) -> Option<&T> {
        if let Some(item) = self.front_outer.front() {
            return Some(item);
        }
        if let Some(item) = self.front_inner.front() {
            return Some(item);
        }
        if let Some(chunk) = self.middle.front() {
            return chunk.front();
        }
        if let Some(item) = self.back_inner.front() {
            return Some(item);
        }
        return self.back_outer.front();
    }

    pub fn back(&self) -> Option<&T> {
        if let Some(item) = self.back_outer.back() {
            return Some(item);
        }
        if let Some(item) = self.back_inner.back() {
            return Some(item);
        }
        if let Some(chunk) = self.middle.back() {
            return chunk.back();
        }
        if let Some(item) = self.front_inner.back() {
            return Some(item);
        }
        return self.front_outer.back();
    }

    // --- Indexed access ---

    /// The item at `index`, or `None` out of range. O(log n).
    pub fn get(&self, index: usize) -> Option<&T>
    where
        M::Value: HasSize,
    {
        let mut i = index;
        for chunk in [&self.front_outer, &self.front_inner] {
            if i < chunk.len() {
                return chunk.get(i);
            }
            i -= chunk.len();
        }
        let mid = self.middle.measure().size();
        if i < mid {
            let (chunk, prefix) = self.middle.get(i)?;
            return chunk.get(i - prefix.size());
        }
        i -= mid;
        for chunk in [&self.back_inner, &self.back_outer] {
            if i < chunk.len() {
                return chunk.get(i);
            }
            i -= chunk.len();
        }
        return None;
    }

    /// Mutate the item at `index` through a closure, repairing every
    /// cached measurement on the enclosing path. O(log n).
    pub fn update_at<R>(&mut self, index: usize, f: impl FnOnce(&mut T) -> R) -> R
    where
        M::Value: HasSize,
    {
        debug_assert!(index < self.len(), "index out of bounds");
        let mut i = index;
        if i < self.front_outer.len() {
            return self.front_outer.update(i, f);
        }
        i -= self.front_outer.len();
        if i < self.front_inner.len() {
            return self.front_inner.update(i, f);
        }
        i -= self.front_inner.len();
        let mid = self.middle.measure().size();
        if i < mid {
            return self.middle.update_at(i, |chunk, offset| chunk.update(offset, f));
        }
        i -= mid;
        if i < self.back_inner.len() {
            return self.back_inner.update(i, f);
        }
        i -= self.back_inner.len();
        return self.back_outer.update(i, f);
    }

    /// Replace the item at `index`, returning the previous one.
    pub fn set(&mut self, index: usize, item: T) -> T
    where
        M::Value: HasSize,
    {
        return self.update_at(index, |slot| std::mem::replace(slot, item));
    }

    // --- Search ---

    /// Locate the first item at which `p` holds over the running prefix
    /// measurement. Returns the item and the prefix measured strictly
    /// before it. `p` should be monotone; a non-monotone predicate still
    /// deterministically yields the first position in scan order.
    /// O(log n).
    pub fn search_by<F>(&self, p: F) -> Option<(&T, M::Value)>
    where
        F: Fn(&M::Value) -> bool,
    {
        let mut acc = M::Value::identity();
        for chunk in [&self.front_outer, &self.front_inner] {
            match Self::scan_chunk(chunk, acc, &p) {
                Ok(hit) => return Some(hit),
                Err(after) => acc = after,
            }
        }
        let with_middle = acc.combine(self.middle.measure());
        if p(&with_middle) {
            if let Some((chunk, prefix)) = self.middle.search_by(acc.clone(), &p) {
                if let Ok(hit) = Self::scan_chunk(chunk, prefix, &p) {
                    return Some(hit);
                }
            }
        }
        acc = with_middle;
        for chunk in [&self.back_inner, &self.back_outer] {
            match Self::scan_chunk(chunk, acc, &p) {
                Ok(hit) => return Some(hit),
                Err(after) => acc = after,
            }
        }
        return None;
    }

    /// Scan one chunk for the first-true position: the hit with its
    /// prefix, or the accumulated measure past the chunk.
    fn scan_chunk<'a, F>(
        chunk: &'a Chunk<T, M, B>,
        acc: M::Value,
        p: &F,
    ) -> Result<(&'a T, M::Value), M::Value>
    where
        F: Fn(&M::Value) -> bool,
    {
        let mut acc = acc;
        for item in chunk.iter() {
            let next = acc.combine(&M::measure(item));
            if p(&next) {
                return Ok((item, acc));
            }
            acc = next;
        }
        return Err(acc);
    }

    // --- Split and concat ---

    /// Split before the first item at which `p` holds over the running
    /// prefix: `self` keeps everything before it, the returned sequence
    /// starts with it (empty if `p` never holds). O(log n).
    pub fn split_off_by<F>(&mut self, p: F) -> Self
    where
        F: Fn(&M::Value) -> bool,
    {
        self.spill_fingers_into_middle();
        let mut right_tree = self.middle.split_off_by(M::Value::identity(), &p);

        // The cut may land inside the boundary chunk; split it item-wise.
        if !right_tree.is_empty() {
            let acc = self.middle.measure().clone();
            let mut boundary = right_tree.pop_front().unwrap();
            let mut pos = 0;
            let mut a = acc;
            for item in boundary.iter() {
                let next = a.combine(&M::measure(item));
                if p(&next) {
                    break;
                }
                a = next;
                pos += 1;
            }
            let right_part = boundary.split_off(pos);
            if !boundary.is_empty() {
                self.middle.push_back(boundary);
            }
            if !right_part.is_empty() {
                right_tree.push_front(right_part);
            }
        }

        let mut other = Self::with_chunk_capacity(self.cap);
        other.middle = right_tree;
        self.restore_fingers();
        other.restore_fingers();
        return other;
    }

    /// Split at `index`: `self` keeps items `[0, index)`, the returned
    /// sequence gets `[index, len)`. O(log n).
    pub fn split_off_at(&mut self, index: usize) -> Self
    where
        M::Value: HasSize,
    {
        debug_assert!(index <= self.len(), "split index out of bounds");
        return self.split_off_by(|v| v.size() > index);
    }

    /// Three-way split: remove and return the first item at which `p`
    /// holds, along with everything after it. `self` keeps the items
    /// before it. O(log n).
    pub fn split_around_by<F>(&mut self, p: F) -> (Option<T>, Self)
    where
        F: Fn(&M::Value) -> bool,
    {
        let mut right = self.split_off_by(p);
        let hit = right.pop_front();
        return (hit, right);
    }

    /// Append all of `other`'s items, leaving `other` empty. O(log n).
    pub fn concat(&mut self, other: &mut Self) {
        debug_assert_eq!(self.cap, other.cap, "concat across chunk capacities");
        self.spill_fingers_into_middle();
        other.spill_fingers_into_middle();
        self.middle.concat(&mut other.middle);
        self.restore_fingers();
    }

    /// Push every non-empty finger into the middle tree so the whole
    /// sequence lives there, in order. Used to normalize before split
    /// and concat.
    fn spill_fingers_into_middle(&mut self) {
        let front_inner = std::mem::replace(&mut self.front_inner, Chunk::new(self.cap));
        if !front_inner.is_empty() {
            self.middle.push_front(front_inner);
        }
        let front_outer = std::mem::replace(&mut self.front_outer, Chunk::new(self.cap));
        if !front_outer.is_empty() {
            self.middle.push_front(front_outer);
        }
        let back_inner = std::mem::replace(&mut self.back_inner, Chunk::new(self.cap));
        if !back_inner.is_empty() {
            self.middle.push_back(back_inner);
        }
        let back_outer = std::mem::replace(&mut self.back_outer, Chunk::new(self.cap));
        if !back_outer.is_empty() {
            self.middle.push_back(back_outer);
        }
    }

    /// Re-establish the finger discipline after a normalize: a non-empty
    /// sequence keeps a non-empty outer finger. Inner fingers refill
    /// lazily on the next spill.
    fn restore_fingers(&mut self) {
        if self.back_outer.is_empty() {
            if let Some(chunk) = self.middle.pop_back() {
                self.back_outer = chunk;
                profiling::finger_refill();
            }
        }
        if self.front_outer.is_empty() {
            if let Some(chunk) = self.middle.pop_front() {
                self.front_outer = chunk;
                profiling::finger_refill();
            }
        }
    }

    // --- Whole-sequence operations ---

    pub fn clear(&mut self) {
        *self = Self::with_chunk_capacity(self.cap);
    }

    /// Exchange the contents of two sequences. O(1).
    pub fn swap(&mut self, other: &mut Self) {
        std::mem::swap(self, other);
    }

    /// Drop items from the back until `len` is at most `new_len`.
    pub fn truncate(&mut self, new_len: usize)
    where
        M::Value: HasSize,
    {
        while self.len() > new_len {
            self.pop_back();
        }
    }

    /// Grow with clones of `value` or shrink from the back until the
    /// length is exactly `new_len`. O(|new_len − len|).
    pub fn resize(&mut self, new_len: usize, value: T)
    where
        T: Clone,
        M::Value: HasSize,
    {
        while self.len() > new_len {
            self.pop_back();
        }
        while self.len() < new_len {
            self.push_back(value.clone());
        }
    }

    // --- Traversal ---

    /// Visit every contiguous memory segment of the sequence, in order.
    pub fn for_each_segment<'a>(&'a self, mut f: impl FnMut(&'a [T])) {
        self.front_outer.for_each_segment(&mut f);
        self.front_inner.for_each_segment(&mut f);
        self.middle.for_each(&mut |chunk: &Chunk<T, M, B>| {
            chunk.for_each_segment(&mut f);
        });
        self.back_inner.for_each_segment(&mut f);
        self.back_outer.for_each_segment(&mut f);
    }

    /// Resolve `index` to its enclosing contiguous segment: the segment,
    /// the absolute index of the segment's first item, and the
    /// measurement of `[0, index)`. `index == len` resolves to an empty
    /// end segment. Backs the cursor. O(log n).
    pub(crate) fn locate(&self, index: usize) -> (&[T], usize, M::Value)
    where
        M::Value: HasSize,
    {
        debug_assert!(index <= self.len(), "locate out of bounds");
        let mut acc = M::Value::identity();
        let mut base = 0usize;
        for chunk in [&self.front_outer, &self.front_inner] {
            if index < base + chunk.len() {
                return Self::locate_in_chunk(chunk, base, index, acc);
            }
            acc = acc.combine(chunk.measure());
            base += chunk.len();
        }
        let mid = self.middle.measure().size();
        if index < base + mid {
            let (chunk, prefix) = self.middle.search_by(acc, |v| v.size() > index).unwrap();
            let chunk_start = prefix.size();
            return Self::locate_in_chunk(chunk, chunk_start, index, prefix);
        }
        acc = acc.combine(self.middle.measure());
        base += mid;
        for chunk in [&self.back_inner, &self.back_outer] {
            if index < base + chunk.len() {
                return Self::locate_in_chunk(chunk, base, index, acc);
            }
            acc = acc.combine(chunk.measure());
            base += chunk.len();
        }
        return (&[], index, acc);
    }

    fn locate_in_chunk<'a>(
        chunk: &'a Chunk<T, M, B>,
        chunk_start: usize,
        index: usize,
        mut acc: M::Value,
    ) -> (&'a [T], usize, M::Value) {
        let offset = index - chunk_start;
        for item in chunk.iter().take(offset) {
            acc = acc.combine(&M::measure(item));
        }
        let (a, b) = chunk.as_slices();
        if offset < a.len() {
            return (a, chunk_start, acc);
        }
        return (b, chunk_start + a.len(), acc);
    }

    /// Iterate the items in order. Double-ended and exact-size.
    pub fn iter(&self) -> Iter<'_, T> {
        let mut segments = Vec::new();
        let mut total = 0;
        self.for_each_segment(|segment| {
            total += segment.len();
            segments.push(segment);
        });
        let back_seg = segments.len();
        return Iter {
            segments,
            front_seg: 0,
            front_idx: 0,
            back_seg,
            back_idx: 0,
            remaining: total,
        };
    }
}

impl<T, M: Measure<T>, B: Buffer<T>> Default for ChunkedSeq<T, M, B> {
    fn default() -> Self {
        return Self::new();
    }
}

impl<T: Clone, M: Measure<T>, B: Buffer<T> + Clone> Clone for ChunkedSeq<T, M, B> {
    fn clone(&self) -> Self {
        return ChunkedSeq {
            front_outer: self.front_outer.clone(),
            front_inner: self.front_inner.clone(),
            middle: self.middle.clone(),
            back_inner: self.back_inner.clone(),
            back_outer: self.back_outer.clone(),
            cap: self.cap,
        };
    }
}

impl<T: std::fmt::Debug, M: Measure<T>, B: Buffer<T>> std::fmt::Debug for ChunkedSeq<T, M, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        return f.debug_list().entries(self.iter()).finish();
    }
}

impl<T: PartialEq, M: Measure<T>, B: Buffer<T>> PartialEq for ChunkedSeq<T, M, B> {
    fn eq(&self, other: &Self) -> bool {
        let a = self.iter();
        let b = other.iter();
        if a.len() != b.len() {
            return false;
        }
        return a.zip(b).all(|(x, y)| x == y);
    }
}

impl<T: Eq, M: Measure<T>, B: Buffer<T>> Eq for ChunkedSeq<T, M, B> {}

impl<T, M: Measure<T>, B: Buffer<T>> std::ops::Index<usize> for ChunkedSeq<T, M, B>
where
    M::Value: HasSize,
{
    type Output = T;

    fn index(&self, index: usize) -> &T {
        return self.get(index).expect("index out of bounds");
    }
}

impl<T, M: Measure<T>, B: Buffer<T>> FromIterator<T> for ChunkedSeq<T, M, B> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut seq = Self::new();
        for item in iter {
            seq.push_back(item);
        }
        return seq;
    }
}

impl<T, M: Measure<T>, B: Buffer<T>> Extend<T> for ChunkedSeq<T, M, B> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push_back(item);
        }
    }
}

/// Borrowed iterator over a sequence, walking its contiguous segments.
pub struct Iter<'a, T> {
    segments: Vec<&'a [T]>,
    front_seg: usize,
    front_idx: usize,
    back_seg: usize,
    back_idx: usize,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        while self.front_idx >= self.segments[self.front_seg].len() {
            self.front_seg += 1;
            self.front_idx = 0;
        }
        let item = &self.segments[self.front_seg][self.front_idx];
        self.front_idx += 1;
        self.remaining -= 1;
        return Some(item);
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        return (self.remaining, Some(self.remaining));
    }
}

impl<'a, T> DoubleEndedIterator for Iter<'a, T> {
    fn next_back(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        while self.back_idx == 0 {
            self.back_seg -= 1;
            self.back_idx = self.segments[self.back_seg].len();
        }
        self.back_idx -= 1;
        self.remaining -= 1;
        return Some(&self.segments[self.back_seg][self.back_idx]);
    }
}

impl<'a, T> ExactSizeIterator for Iter<'a, T> {}

/// Owning iterator that drains the sequence from either end.
pub struct IntoIter<T, M: Measure<T>, B: Buffer<T>> {
    seq: ChunkedSeq<T, M, B>,
}

impl<T, M: Measure<T>, B: Buffer<T>> Iterator for IntoIter<T, M, B> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        return self.seq.pop_front();
    }
}

impl<T, M: Measure<T>, B: Buffer<T>> DoubleEndedIterator for IntoIter<T, M, B> {
    fn next_back(&mut self) -> Option<T> {
        return self.seq.pop_back();
    }
}

impl<T, M: Measure<T>, B: Buffer<T>> IntoIterator for ChunkedSeq<T, M, B> {
    type Item = T;
    type IntoIter = IntoIter<T, M, B>;

    fn into_iter(self) -> IntoIter<T, M, B> {
        return IntoIter { seq: self };
    }
}

impl<'a, T, M: Measure<T>, B: Buffer<T>> IntoIterator for &'a ChunkedSeq<T, M, B> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        return self.iter();
    }
}

impl<T: Serialize, M: Measure<T>, B: Buffer<T>> Serialize for ChunkedSeq<T, M, B> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let items = self.iter();
        let mut seq = serializer.serialize_seq(Some(items.len()))?;
        for item in items {
            seq.serialize_element(item)?;
        }
        return seq.end();
    }
}

impl<'de, T, M, B> Deserialize<'de> for ChunkedSeq<T, M, B>
where
    T: Deserialize<'de>,
    M: Measure<T>,
    B: Buffer<T>,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SeqVisitor<T, M, B>(std::marker::PhantomData<(T, M, B)>);

        impl<'de, T, M, B> Visitor<'de> for SeqVisitor<T, M, B>
        where
            T: Deserialize<'de>,
            M: Measure<T>,
            B: Buffer<T>,
        {
            type Value = ChunkedSeq<T, M, B>;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                return write!(f, "a sequence of items");
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut seq = ChunkedSeq::new();
                while let Some(item) = access.next_element()? {
                    seq.push_back(item);
                }
                return Ok(seq);
            }
        }

        return deserializer.deserialize_seq(SeqVisitor(std::marker::PhantomData));
    }
}

#[cfg(test)]
impl<T, M: Measure<T>, B: Buffer<T>> ChunkedSeq<T, M, B>
where
    M::Value: PartialEq + std::fmt::Debug,
{
    /// Assert the sequence-level invariants: exact total measurement,
    /// no empty chunks inside the middle tree, sound middle tree, and a
    /// non-empty outer finger whenever the sequence is non-empty.
    pub(crate) fn check_invariants(&self) {
        self.middle.check_invariants();
        self.middle.for_each(&mut |chunk: &Chunk<T, M, B>| {
            assert!(!chunk.is_empty(), "empty chunk in the middle tree");
        });
        if !self.is_empty() {
            assert!(
                !self.front_outer.is_empty() || !self.back_outer.is_empty(),
                "non-empty sequence with both outer fingers empty"
            );
        }
        let mut acc = M::Value::identity();
        self.for_each_segment(|segment| {
            acc = acc.combine(&M::measure_slice(segment));
        });
        assert_eq!(acc, self.measure(), "stale total measurement");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::Weight;

    fn filled(n: i32) -> Deque<i32> {
        let mut seq = Deque::with_chunk_capacity(4);
        for i in 1..=n {
            seq.push_back(i);
        }
        return seq;
    }

    fn collect(seq: &Deque<i32>) -> Vec<i32> {
        return seq.iter().cloned().collect();
    }

    #[test]
    fn empty_sequence() {
        let seq: Deque<i32> = Deque::with_chunk_capacity(4);
        assert!(seq.is_empty());
        assert_eq!(seq.len(), 0);
        assert_eq!(seq.measure(), 0);
        assert_eq!(seq.front(), None);
        assert_eq!(seq.back(), None);
        assert_eq!(seq.get(0), None);
        seq.check_invariants();
    }

    #[test]
    fn pop_on_empty_returns_none() {
        let mut seq: Deque<i32> = Deque::with_chunk_capacity(4);
        assert_eq!(seq.pop_front(), None);
        assert_eq!(seq.pop_back(), None);
    }

    #[test]
    fn ten_pushes_iterate_in_order() {
        // Size 10, measure 10, iteration 1..=10.
        let seq = filled(10);
        assert_eq!(seq.len(), 10);
        assert_eq!(seq.measure(), 10);
        assert_eq!(collect(&seq), (1..=10).collect::<Vec<_>>());
        seq.check_invariants();
    }

    #[test]
    fn split_then_concat_restores() {
        let mut seq = filled(10);
        let mut tail = seq.split_off_at(4);
        assert_eq!(collect(&seq), vec![1, 2, 3, 4]);
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.measure(), 4);
        assert_eq!(collect(&tail), vec![5, 6, 7, 8, 9, 10]);
        assert_eq!(tail.len(), 6);
        assert_eq!(tail.measure(), 6);
        seq.check_invariants();
        tail.check_invariants();

        seq.concat(&mut tail);
        assert_eq!(collect(&seq), (1..=10).collect::<Vec<_>>());
        assert!(tail.is_empty());
        seq.check_invariants();
        tail.check_invariants();
    }

    #[test]
    fn split_and_concat_round_trip_every_index() {
        for n in [0, 1, 5, 23, 100] {
            for i in 0..=n {
                let mut seq = filled(n as i32);
                let mut tail = seq.split_off_at(i);
                assert_eq!(collect(&seq), (1..=i as i32).collect::<Vec<_>>());
                assert_eq!(collect(&tail), (i as i32 + 1..=n as i32).collect::<Vec<_>>());
                seq.check_invariants();
                tail.check_invariants();

                seq.concat(&mut tail);
                assert_eq!(collect(&seq), (1..=n as i32).collect::<Vec<_>>());
                seq.check_invariants();
            }
        }
    }

    #[test]
    fn push_pop_round_trip_at_each_end() {
        let mut seq = filled(10);
        seq.push_back(11);
        assert_eq!(seq.pop_back(), Some(11));
        seq.push_front(0);
        assert_eq!(seq.pop_front(), Some(0));
        assert_eq!(collect(&seq), (1..=10).collect::<Vec<_>>());
        seq.check_invariants();
    }

    #[test]
    fn single_item_sequence() {
        let mut seq: Deque<i32> = Deque::with_chunk_capacity(4);
        seq.push_back(42);
        assert_eq!(seq.get(0), Some(&42));
        assert_eq!(seq.front(), Some(&42));
        assert_eq!(seq.back(), Some(&42));
        assert_eq!(seq.pop_back(), Some(42));
        assert!(seq.is_empty());
    }

    #[test]
    fn drain_from_the_front_crosses_all_regions() {
        let mut seq = filled(100);
        for expected in 1..=100 {
            assert_eq!(seq.pop_front(), Some(expected));
        }
        assert!(seq.is_empty());
        seq.check_invariants();
    }

    #[test]
    fn drain_from_the_back_crosses_all_regions() {
        let mut seq = filled(100);
        for expected in (1..=100).rev() {
            assert_eq!(seq.pop_back(), Some(expected));
        }
        assert!(seq.is_empty());
    }

    #[test]
    fn indexing_covers_fingers_and_middle() {
        let seq = filled(100);
        for i in 0..100usize {
            assert_eq!(seq.get(i), Some(&(i as i32 + 1)));
            assert_eq!(seq[i], i as i32 + 1);
        }
        assert_eq!(seq.get(100), None);
    }

    #[test]
    fn set_and_update_repair_measurements() {
        let mut seq = filled(50);
        let old = seq.set(20, 999);
        assert_eq!(old, 21);
        assert_eq!(seq[20], 999);
        assert_eq!(seq.len(), 50);
        seq.check_invariants();
    }

    #[test]
    fn iterate_both_ends() {
        let seq = filled(30);
        let forward: Vec<i32> = seq.iter().cloned().collect();
        assert_eq!(forward, (1..=30).collect::<Vec<_>>());

        let backward: Vec<i32> = seq.iter().rev().cloned().collect();
        assert_eq!(backward, (1..=30).rev().collect::<Vec<_>>());

        // Meet in the middle.
        let mut iter = seq.iter();
        assert_eq!(iter.next(), Some(&1));
        assert_eq!(iter.next_back(), Some(&30));
        assert_eq!(iter.len(), 28);
    }

    #[test]
    fn into_iter_drains() {
        let seq = filled(20);
        let items: Vec<i32> = seq.into_iter().collect();
        assert_eq!(items, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn resize_grows_and_shrinks() {
        let mut seq = filled(10);
        seq.resize(13, 0);
        assert_eq!(seq.len(), 13);
        assert_eq!(seq[12], 0);
        seq.resize(4, 0);
        assert_eq!(collect(&seq), vec![1, 2, 3, 4]);
        seq.check_invariants();
    }

    #[test]
    fn concat_of_two_empties_is_empty() {
        let mut a: Deque<i32> = Deque::with_chunk_capacity(4);
        let mut b: Deque<i32> = Deque::with_chunk_capacity(4);
        a.concat(&mut b);
        assert!(a.is_empty());
        assert!(b.is_empty());
    }

    #[test]
    fn split_of_empty_yields_two_empties() {
        let mut a: Deque<i32> = Deque::with_chunk_capacity(4);
        let b = a.split_off_at(0);
        assert!(a.is_empty());
        assert!(b.is_empty());
    }

    #[test]
    fn bag_pop_front_removes_some_item() {
        let mut bag: BagSeq<i32> = BagSeq::with_chunk_capacity(4);
        for i in 1..=5 {
            bag.push_back(i);
        }
        let removed = bag.pop_front().unwrap();
        assert!((1..=5).contains(&removed));
        assert_eq!(bag.len(), 4);

        let mut rest: Vec<i32> = bag.iter().cloned().collect();
        rest.push(removed);
        rest.sort();
        assert_eq!(rest, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn stack_behaves_like_a_deque_on_the_back() {
        let mut stack: StackSeq<i32> = StackSeq::with_chunk_capacity(4);
        for i in 1..=20 {
            stack.push_back(i);
        }
        assert_eq!(stack.len(), 20);
        for expected in (1..=20).rev() {
            assert_eq!(stack.pop_back(), Some(expected));
        }
    }

    struct Word(&'static str);

    impl Weight for Word {
        fn weight(&self) -> u64 {
            if self.0.len() % 2 == 0 {
                return 1;
            }
            return 0;
        }
    }

    #[test]
    fn weighted_split_lands_on_the_weight_boundary() {
        let words = ["Let's", "divide", "this", "string", "into", "two", "pieces"];
        let mut seq: WeightedSeq<Word> = WeightedSeq::with_chunk_capacity(4);
        for word in words {
            seq.push_back(Word(word));
        }
        assert_eq!(seq.measure().1, 5);
        assert_eq!(seq.len(), 7);

        let tail = seq.split_off_by(|v| v.1 >= 3);
        let left: Vec<&str> = seq.iter().map(|w| w.0).collect();
        let right: Vec<&str> = tail.iter().map(|w| w.0).collect();
        assert_eq!(left, vec!["Let's", "divide", "this"]);
        assert_eq!(right, vec!["string", "into", "two", "pieces"]);
    }

    #[test]
    fn search_by_reports_item_and_prefix() {
        let seq = filled(100);
        let (item, prefix) = seq.search_by(|acc| *acc > 57).unwrap();
        assert_eq!(*item, 58);
        assert_eq!(prefix, 57);
        assert!(seq.search_by(|acc| *acc > 100).is_none());
    }

    #[test]
    fn split_around_extracts_the_boundary_item() {
        let mut seq = filled(10);
        let (hit, mut rest) = seq.split_around_by(|acc| *acc > 4);
        assert_eq!(hit, Some(5));
        assert_eq!(collect(&seq), vec![1, 2, 3, 4]);
        assert_eq!(collect(&rest), vec![6, 7, 8, 9, 10]);
        seq.concat(&mut rest);
        assert_eq!(seq.len(), 9);
    }

    #[test]
    fn equality_and_clone() {
        let seq = filled(40);
        let copy = seq.clone();
        assert_eq!(seq, copy);
        copy.check_invariants();

        let mut other = copy;
        other.push_back(0);
        assert_ne!(seq, other);
    }

    #[test]
    fn swap_is_constant_time_exchange() {
        let mut a = filled(10);
        let mut b = filled(3);
        a.swap(&mut b);
        assert_eq!(a.len(), 3);
        assert_eq!(b.len(), 10);
    }

    #[test]
    fn segments_partition_the_sequence() {
        let seq = filled(100);
        let mut total = 0;
        let mut items = Vec::new();
        seq.for_each_segment(|segment| {
            assert!(!segment.is_empty());
            total += segment.len();
            items.extend_from_slice(segment);
        });
        assert_eq!(total, 100);
        assert_eq!(items, (1..=100).collect::<Vec<_>>());
    }

    #[test]
    fn serde_round_trip() {
        let seq = filled(25);
        let json = serde_json::to_string(&seq).unwrap();
        let back: Deque<i32> = serde_json::from_str(&json).unwrap();
        assert_eq!(collect(&back), (1..=25).collect::<Vec<_>>());
    }

    #[test]
    fn trivial_policy_supports_end_operations() {
        // No size measure, so only the end operations and iteration
        // are available.
        let mut seq: ChunkedSeq<i32, crate::measure::Trivial> =
            ChunkedSeq::with_chunk_capacity(4);
        for i in 0..20 {
            seq.push_back(i);
        }
        assert!(!seq.is_empty());
        assert_eq!(seq.iter().cloned().collect::<Vec<_>>(), (0..20).collect::<Vec<_>>());
        assert_eq!(seq.pop_front(), Some(0));
        assert_eq!(seq.pop_back(), Some(19));
    }

    #[test]
    fn from_iterator_and_extend() {
        let mut seq: Deque<i32> = (1..=10).collect();
        seq.extend(11..=15);
        assert_eq!(seq.len(), 15);
        assert_eq!(seq.iter().cloned().collect::<Vec<_>>(), (1..=15).collect::<Vec<_>>());
    }
}
