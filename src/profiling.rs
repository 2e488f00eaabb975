//! Structural event counters for understanding rebalance behavior.

use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

pub static FINGER_SPILLS: AtomicU64 = AtomicU64::new(0);
pub static FINGER_REFILLS: AtomicU64 = AtomicU64::new(0);
pub static NODE_SPLITS: AtomicU64 = AtomicU64::new(0);
pub static NODE_MERGES: AtomicU64 = AtomicU64::new(0);
pub static NODE_STEALS: AtomicU64 = AtomicU64::new(0);

/// A full finger chunk was pushed down into the middle tree.
#[inline]
pub fn finger_spill() {
    FINGER_SPILLS.fetch_add(1, Ordering::Relaxed);
}

/// An empty finger was refilled with a chunk from the middle tree.
#[inline]
pub fn finger_refill() {
    FINGER_REFILLS.fetch_add(1, Ordering::Relaxed);
}

/// A full node gained a fresh sibling or was cut in half.
#[inline]
pub fn node_split() {
    NODE_SPLITS.fetch_add(1, Ordering::Relaxed);
}

/// Two underfull siblings were merged into one node.
#[inline]
pub fn node_merge() {
    NODE_MERGES.fetch_add(1, Ordering::Relaxed);
}

/// An underfull node stole entries from its sibling.
#[inline]
pub fn node_steal() {
    NODE_STEALS.fetch_add(1, Ordering::Relaxed);
}

pub fn reset() {
    FINGER_SPILLS.store(0, Ordering::Relaxed);
    FINGER_REFILLS.store(0, Ordering::Relaxed);
    NODE_SPLITS.store(0, Ordering::Relaxed);
    NODE_MERGES.store(0, Ordering::Relaxed);
    NODE_STEALS.store(0, Ordering::Relaxed);
}

pub fn report() -> String {
    return format!(
        "Fingers: {} spills, {} refills; Nodes: {} splits, {} merges, {} steals",
        FINGER_SPILLS.load(Ordering::Relaxed),
        FINGER_REFILLS.load(Ordering::Relaxed),
        NODE_SPLITS.load(Ordering::Relaxed),
        NODE_MERGES.load(Ordering::Relaxed),
        NODE_STEALS.load(Ordering::Relaxed),
    );
}
