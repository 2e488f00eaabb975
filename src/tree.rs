//! Weighted tree: a uniform-depth tree whose nodes are chunks.
//!
//! Leaves are chunks of payload items; interior nodes are chunks of child
//! pointers whose cached measurement is the fold of the children's cached
//! measurements. All structural operations are parameterized by the
//! measurement policy, so the same tree serves both item payloads and the
//! bootstrapped sequence's chunk payloads.
//!
//! Structure:
//! - Every leaf sits at the same depth.
//! - Interior nodes off the left/right spine hold at least `cap / 2`
//!   children; spine nodes may run thin because pushes introduce fresh
//!   extremal siblings.
//! - Underflow repair is steal-first, merge-second against the adjacent
//!   sibling, recursing toward the root. The same repair reattaches
//!   boundary nodes after splits and concat seams.
//!
//! Operations:
//! - push/pop at either end: O(1) amortized, O(log n) on overflow
//! - search_by: O(log n) first-true descent over the running prefix
//! - split_off_by / split_off_at: O(log n)
//! - concat: O(log n), walks the two spines to a common depth

use std::marker::PhantomData;

use crate::chunk::Buffer;
use crate::chunk::Chunk;
use crate::measure::HasSize;
use crate::measure::Measure;
use crate::measure::Monoid;
use crate::profiling;

/// A tree node. Either shape physically is a chunk.
pub(crate) enum Node<P, M: Measure<P>> {
    Leaf(Chunk<P, M>),
    Inner(InnerChunk<P, M>),
}

impl<P: Clone, M: Measure<P>> Clone for Node<P, M> {
    fn clone(&self) -> Self {
        match self {
            Node::Leaf(chunk) => return Node::Leaf(chunk.clone()),
            Node::Inner(children) => return Node::Inner(children.clone()),
        }
    }
}

/// Interior chunk: owning child pointers measured by their cached values.
pub(crate) type InnerChunk<P, M> = Chunk<Box<Node<P, M>>, NodeMeasure<M>>;

/// Measures a child node by its cached measurement, in O(1).
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct NodeMeasure<M>(PhantomData<M>);

impl<P, M: Measure<P>> Measure<Box<Node<P, M>>> for NodeMeasure<M> {
    type Value = M::Value;

    fn measure(node: &Box<Node<P, M>>) -> Self::Value {
        return node.measure().clone();
    }
}

impl<P, M: Measure<P>> Node<P, M> {
    fn measure(&self) -> &M::Value {
        match self {
            Node::Leaf(chunk) => return chunk.measure(),
            Node::Inner(children) => return children.measure(),
        }
    }

    /// Chunk occupancy at this node: item count for leaves, child count
    /// for interior nodes.
    fn len(&self) -> usize {
        match self {
            Node::Leaf(chunk) => return chunk.len(),
            Node::Inner(children) => return children.len(),
        }
    }
}

/// A uniform-depth weighted tree with cached measurements.
pub struct Tree<P, M: Measure<P>> {
    root: Node<P, M>,
    /// Distance from the root to the leaves. 0 means the root is a leaf.
    height: usize,
    cap: usize,
}

impl<P, M: Measure<P>> Tree<P, M> {
    /// Create an empty tree whose chunks hold up to `cap` entries.
    pub fn new(cap: usize) -> Tree<P, M> {
        debug_assert!(cap >= 2 && cap % 2 == 0, "chunk capacity must be a positive even number");
        return Tree {
            root: Node::Leaf(Chunk::new(cap)),
            height: 0,
            cap,
        };
    }

    /// The cached measurement of the whole tree.
    #[inline]
    pub fn measure(&self) -> &M::Value {
        return self.root.measure();
    }

    pub fn is_empty(&self) -> bool {
        match &self.root {
            Node::Leaf(chunk) => return chunk.is_empty(),
            Node::Inner(_) => return false,
        }
    }

    /// Number of payload entries, by the size component of the measure.
    pub fn len(&self) -> usize
    where
        M::Value: HasSize,
    {
        return self.measure().size();
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        return self.cap;
    }

    pub fn clear(&mut self) {
        *self = Tree::new(self.cap);
    }

    // --- End operations ---

    pub fn push_back(&mut self, item: P) {
        let carry = Self::push_back_rec(&mut self.root, item, self.cap);
        if let Some(sibling) = carry {
            self.grow_root(sibling, false);
        }
    }

    pub fn push_front(&mut self, item: P) {
        let carry = Self::push_front_rec(&mut self.root, item, self.cap);
        if let Some(sibling) = carry {
            self.grow_root(sibling, true);
        }
    }

    pub fn pop_back(&mut self) -> Option<P> {
        if self.is_empty() {
            return None;
        }
        let item = Self::pop_back_rec(&mut self.root, self.cap);
        self.shrink_root();
        return Some(item);
    }

    pub fn pop_front(&mut self) -> Option<P> {
        if self.is_empty() {
            return None;
        }
        let item = Self::pop_front_rec(&mut self.root, self.cap);
        self.shrink_root();
        return Some(item);
    }

    pub fn front(&self) -> Option<&P> {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(chunk) => return chunk.front(),
                Node::Inner(children) => node = &**children.front()?,
            }
        }
    }

    pub fn back(&self) -> Option<&P> {
        let mut node = &self.root;
        loop {
            match node {
                Node::Leaf(chunk) => return chunk.back(),
                Node::Inner(children) => node = &**children.back()?,
            }
        }
    }

    /// Push into the rightmost leaf. A full extremal chunk gets a fresh
    /// sibling instead of shifting items; the carry propagates upward.
    fn push_back_rec(node: &mut Node<P, M>, item: P, cap: usize) -> Option<Node<P, M>> {
        match node {
            Node::Leaf(chunk) => {
                if !chunk.is_full() {
                    chunk.push_back(item);
                    return None;
                }
                let mut fresh: Chunk<P, M> = Chunk::new(cap);
                fresh.push_back(item);
                profiling::node_split();
                return Some(Node::Leaf(fresh));
            }
            Node::Inner(children) => {
                let mut last = children.pop_back().unwrap();
                let carry = Self::push_back_rec(&mut last, item, cap);
                children.push_back(last);
                let Some(sibling) = carry else {
                    return None;
                };
                if !children.is_full() {
                    children.push_back(Box::new(sibling));
                    return None;
                }
                let mut fresh: InnerChunk<P, M> = Chunk::new(cap);
                fresh.push_back(Box::new(sibling));
                profiling::node_split();
                return Some(Node::Inner(fresh));
            }
        }
    }

    fn push_front_rec(node: &mut Node<P, M>, item: P, cap: usize) -> Option<Node<P, M>> {
        match node {
            Node::Leaf(chunk) => {
                if !chunk.is_full() {
                    chunk.push_front(item);
                    return None;
                }
                let mut fresh: Chunk<P, M> = Chunk::new(cap);
                fresh.push_front(item);
                profiling::node_split();
                return Some(Node::Leaf(fresh));
            }
            Node::Inner(children) => {
                let mut first = children.pop_front().unwrap();
                let carry = Self::push_front_rec(&mut first, item, cap);
                children.push_front(first);
                let Some(sibling) = carry else {
                    return None;
                };
                if !children.is_full() {
                    children.push_front(Box::new(sibling));
                    return None;
                }
                let mut fresh: InnerChunk<P, M> = Chunk::new(cap);
                fresh.push_front(Box::new(sibling));
                profiling::node_split();
                return Some(Node::Inner(fresh));
            }
        }
    }

    fn pop_back_rec(node: &mut Node<P, M>, cap: usize) -> P {
        match node {
            Node::Leaf(chunk) => return chunk.pop_back().unwrap(),
            Node::Inner(children) => {
                let mut last = children.pop_back().unwrap();
                let item = Self::pop_back_rec(&mut last, cap);
                Self::reattach_back(children, *last, cap);
                return item;
            }
        }
    }

    fn pop_front_rec(node: &mut Node<P, M>, cap: usize) -> P {
        match node {
            Node::Leaf(chunk) => return chunk.pop_front().unwrap(),
            Node::Inner(children) => {
                let mut first = children.pop_front().unwrap();
                let item = Self::pop_front_rec(&mut first, cap);
                Self::reattach_front(children, *first, cap);
                return item;
            }
        }
    }

    /// Reattach `node` as the last child of `children`, repairing
    /// underflow against the adjacent sibling: steal first, merge second.
    /// An emptied node is dropped; a node without a sibling is attached
    /// as-is and left for the level above to repair.
    fn reattach_back(children: &mut InnerChunk<P, M>, node: Node<P, M>, cap: usize) {
        let len = node.len();
        if len == 0 {
            return;
        }
        if len >= cap / 2 || children.is_empty() {
            children.push_back(Box::new(node));
            return;
        }
        let mut left = children.pop_back().unwrap();
        let mut node = node;
        let total = left.len() + len;
        if total <= cap {
            Self::merge_nodes(&mut left, node);
            children.push_back(left);
            profiling::node_merge();
            return;
        }
        let steal = left.len() - total / 2;
        Self::steal_back_to_front(&mut left, &mut node, steal);
        children.push_back(left);
        children.push_back(Box::new(node));
        profiling::node_steal();
    }

    /// Mirror of `reattach_back` for the front end.
    fn reattach_front(children: &mut InnerChunk<P, M>, node: Node<P, M>, cap: usize) {
        let len = node.len();
        if len == 0 {
            return;
        }
        if len >= cap / 2 || children.is_empty() {
            children.push_front(Box::new(node));
            return;
        }
        let mut right = children.pop_front().unwrap();
        let mut node = node;
        let total = len + right.len();
        if total <= cap {
            Self::merge_nodes(&mut node, *right);
            children.push_front(Box::new(node));
            profiling::node_merge();
            return;
        }
        let steal = right.len() - total / 2;
        Self::steal_front_to_back(&mut right, &mut node, steal);
        children.push_front(right);
        children.push_front(Box::new(node));
        profiling::node_steal();
    }

    /// Absorb `right`'s entries at the back of `left`. Siblings share a
    /// depth, so the shapes always match.
    fn merge_nodes(left: &mut Node<P, M>, right: Node<P, M>) {
        match (left, right) {
            (Node::Leaf(l), Node::Leaf(mut r)) => l.concat(&mut r),
            (Node::Inner(l), Node::Inner(mut r)) => l.concat(&mut r),
            _ => unreachable!("siblings at different depths"),
        }
    }

    /// Move `n` entries from the back of `left` to the front of `right`.
    fn steal_back_to_front(left: &mut Node<P, M>, right: &mut Node<P, M>, n: usize) {
        match (left, right) {
            (Node::Leaf(l), Node::Leaf(r)) => l.transfer_back_to_front(r, n),
            (Node::Inner(l), Node::Inner(r)) => l.transfer_back_to_front(r, n),
            _ => unreachable!("siblings at different depths"),
        }
    }

    /// Move `n` entries from the front of `right` to the back of `left`.
    fn steal_front_to_back(right: &mut Node<P, M>, left: &mut Node<P, M>, n: usize) {
        match (right, left) {
            (Node::Leaf(r), Node::Leaf(l)) => r.transfer_front_to_back(l, n),
            (Node::Inner(r), Node::Inner(l)) => r.transfer_front_to_back(l, n),
            _ => unreachable!("siblings at different depths"),
        }
    }

    fn grow_root(&mut self, sibling: Node<P, M>, at_front: bool) {
        let old = std::mem::replace(&mut self.root, Node::Leaf(Chunk::new(self.cap)));
        let mut children: InnerChunk<P, M> = Chunk::new(self.cap);
        if at_front {
            children.push_back(Box::new(sibling));
            children.push_back(Box::new(old));
        } else {
            children.push_back(Box::new(old));
            children.push_back(Box::new(sibling));
        }
        self.root = Node::Inner(children);
        self.height += 1;
    }

    /// Collapse single-child roots so the height stays tight.
    fn shrink_root(&mut self) {
        loop {
            match &mut self.root {
                Node::Inner(children) => {
                    if children.len() > 1 {
                        return;
                    }
                    match children.pop_back() {
                        Some(only) => {
                            self.root = *only;
                            self.height -= 1;
                        }
                        None => {
                            self.root = Node::Leaf(Chunk::new(self.cap));
                            self.height = 0;
                        }
                    }
                }
                Node::Leaf(_) => return,
            }
        }
    }

    // --- Search ---

    /// Locate the first entry at which `p` holds over the running prefix
    /// `init ⊕ m(e₀) ⊕ … ⊕ m(eᵢ)`. Returns the entry and the prefix
    /// measured strictly before it. `p` should be monotone; for a
    /// non-monotone predicate this still deterministically picks the
    /// first position in left-to-right scan order.
    pub fn search_by<F>(&self, init: M::Value, p: F) -> Option<(&P, M::Value)>
    where
        F: Fn(&M::Value) -> bool,
    {
        if self.is_empty() {
            return None;
        }
        return Self::search_rec(&self.root, init, &p);
    }

    fn search_rec<'a, F>(node: &'a Node<P, M>, mut acc: M::Value, p: &F) -> Option<(&'a P, M::Value)>
    where
        F: Fn(&M::Value) -> bool,
    {
        match node {
            Node::Leaf(chunk) => {
                for item in chunk.iter() {
                    let next = acc.combine(&M::measure(item));
                    if p(&next) {
                        return Some((item, acc));
                    }
                    acc = next;
                }
                return None;
            }
            Node::Inner(children) => {
                for child in children.iter() {
                    let next = acc.combine(child.measure());
                    if p(&next) {
                        return Self::search_rec(child, acc, p);
                    }
                    acc = next;
                }
                return None;
            }
        }
    }

    /// The entry whose size range covers `index`, with the prefix
    /// measured before it.
    pub fn get(&self, index: usize) -> Option<(&P, M::Value)>
    where
        M::Value: HasSize,
    {
        return self.search_by(M::Value::identity(), |v| v.size() > index);
    }

    /// Mutate the entry whose size range covers `index` through a
    /// closure, repairing every cache on the path. The closure receives
    /// the entry and the index offset within it.
    pub fn update_at<R>(&mut self, index: usize, f: impl FnOnce(&mut P, usize) -> R) -> R
    where
        M::Value: HasSize,
    {
        debug_assert!(index < self.measure().size(), "tree index out of bounds");
        return Self::update_rec(&mut self.root, index, f);
    }

    fn update_rec<R>(node: &mut Node<P, M>, index: usize, f: impl FnOnce(&mut P, usize) -> R) -> R
    where
        M::Value: HasSize,
    {
        match node {
            Node::Leaf(chunk) => {
                let mut pos = 0;
                let mut before = 0;
                loop {
                    let size = M::measure(chunk.get(pos).unwrap()).size();
                    if before + size > index {
                        break;
                    }
                    before += size;
                    pos += 1;
                }
                return chunk.update(pos, |item| f(item, index - before));
            }
            Node::Inner(children) => {
                let mut pos = 0;
                let mut before = 0;
                loop {
                    let size = children.get(pos).unwrap().measure().size();
                    if before + size > index {
                        break;
                    }
                    before += size;
                    pos += 1;
                }
                return children.update(pos, |child| Self::update_rec(child, index - before, f));
            }
        }
    }

    /// Visit every payload entry in order.
    pub fn for_each<'a, F: FnMut(&'a P)>(&'a self, f: &mut F) {
        Self::for_each_rec(&self.root, f);
    }

    fn for_each_rec<'a, F: FnMut(&'a P)>(node: &'a Node<P, M>, f: &mut F) {
        match node {
            Node::Leaf(chunk) => {
                for item in chunk.iter() {
                    f(item);
                }
            }
            Node::Inner(children) => {
                for child in children.iter() {
                    Self::for_each_rec(child, f);
                }
            }
        }
    }

    // --- Split ---

    /// Split before the first entry at which `p` holds over the running
    /// prefix. `self` keeps everything before that entry; the returned
    /// tree starts with it. If `p` never holds the returned tree is
    /// empty.
    pub fn split_off_by<F>(&mut self, init: M::Value, p: F) -> Tree<P, M>
    where
        F: Fn(&M::Value) -> bool,
    {
        if self.is_empty() {
            return Tree::new(self.cap);
        }
        let cap = self.cap;
        let height = self.height;
        let root = std::mem::replace(&mut self.root, Node::Leaf(Chunk::new(cap)));
        let (left, right) = Self::split_rec(root, init, &p, cap);
        *self = Self::assemble(left, height, cap);
        return Self::assemble(right, height, cap);
    }

    /// Split before the entry whose size range covers `index`: `self`
    /// keeps sizes `[0, index)`.
    pub fn split_off_at(&mut self, index: usize) -> Tree<P, M>
    where
        M::Value: HasSize,
    {
        return self.split_off_by(M::Value::identity(), |v| v.size() > index);
    }

    fn split_rec<F>(
        node: Node<P, M>,
        acc: M::Value,
        p: &F,
        cap: usize,
    ) -> (Option<Node<P, M>>, Option<Node<P, M>>)
    where
        F: Fn(&M::Value) -> bool,
    {
        match node {
            Node::Leaf(mut chunk) => {
                let mut a = acc;
                let mut pos = 0;
                for item in chunk.iter() {
                    let next = a.combine(&M::measure(item));
                    if p(&next) {
                        break;
                    }
                    a = next;
                    pos += 1;
                }
                let right = chunk.split_off(pos);
                let left = (!chunk.is_empty()).then(|| Node::Leaf(chunk));
                let right = (!right.is_empty()).then(|| Node::Leaf(right));
                return (left, right);
            }
            Node::Inner(mut children) => {
                let mut a = acc;
                let mut pos = 0;
                let mut found = false;
                for child in children.iter() {
                    let next = a.combine(child.measure());
                    if p(&next) {
                        found = true;
                        break;
                    }
                    a = next;
                    pos += 1;
                }
                if !found {
                    return (Some(Node::Inner(children)), None);
                }
                let mut right_children = children.split_off(pos);
                let target = right_children.pop_front().unwrap();
                let (l_sub, r_sub) = Self::split_rec(*target, a, p, cap);
                let left = Self::close_back(children, l_sub, cap);
                let right = Self::close_front(right_children, r_sub, cap);
                return (left, right);
            }
        }
    }

    /// Finish the left side of a split level: attach the partial child
    /// and repair its underflow as in pop.
    fn close_back(
        mut children: InnerChunk<P, M>,
        sub: Option<Node<P, M>>,
        cap: usize,
    ) -> Option<Node<P, M>> {
        if let Some(node) = sub {
            Self::reattach_back(&mut children, node, cap);
        }
        if children.is_empty() {
            return None;
        }
        return Some(Node::Inner(children));
    }

    fn close_front(
        mut children: InnerChunk<P, M>,
        sub: Option<Node<P, M>>,
        cap: usize,
    ) -> Option<Node<P, M>> {
        if let Some(node) = sub {
            Self::reattach_front(&mut children, node, cap);
        }
        if children.is_empty() {
            return None;
        }
        return Some(Node::Inner(children));
    }

    /// Rebuild a tree from one side of a split, collapsing the
    /// single-child chain left along the cut so the height is tight
    /// again.
    fn assemble(part: Option<Node<P, M>>, height: usize, cap: usize) -> Tree<P, M> {
        let Some(node) = part else {
            return Tree::new(cap);
        };
        let mut node = node;
        let mut h = height;
        loop {
            match node {
                Node::Inner(mut children) if children.len() == 1 => {
                    node = *children.pop_back().unwrap();
                    h -= 1;
                }
                other => {
                    node = other;
                    break;
                }
            }
        }
        return Tree {
            root: node,
            height: h,
            cap,
        };
    }

    // --- Concat ---

    /// Append all of `other`'s entries, leaving `other` empty. Walks the
    /// right spine of `self` and the left spine of `other` to a common
    /// depth, joins the seam chunks (merge when they fit, rebalance to at
    /// least `cap / 2` otherwise), and carries overflow upward.
    pub fn concat(&mut self, other: &mut Tree<P, M>) {
        debug_assert_eq!(self.cap, other.cap, "concat across chunk capacities");
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            std::mem::swap(self, other);
            return;
        }
        let cap = self.cap;
        let left = std::mem::replace(&mut self.root, Node::Leaf(Chunk::new(cap)));
        let right = std::mem::replace(&mut other.root, Node::Leaf(Chunk::new(cap)));
        let lh = self.height;
        let rh = other.height;
        other.height = 0;
        let (node, carry) = Self::join(left, lh, right, rh, cap);
        self.height = lh.max(rh);
        self.root = node;
        if let Some(extra) = carry {
            let old = std::mem::replace(&mut self.root, Node::Leaf(Chunk::new(cap)));
            let mut children: InnerChunk<P, M> = Chunk::new(cap);
            children.push_back(Box::new(old));
            children.push_back(Box::new(extra));
            self.root = Node::Inner(children);
            self.height += 1;
        }
        self.shrink_root();
    }

    /// Join two trees into one node at depth `max(lh, rh)`, plus an
    /// optional right sibling at the same depth. The sibling, when
    /// present, always holds at least `cap / 2` entries.
    fn join(
        left: Node<P, M>,
        lh: usize,
        right: Node<P, M>,
        rh: usize,
        cap: usize,
    ) -> (Node<P, M>, Option<Node<P, M>>) {
        if lh == rh {
            if lh == 0 {
                let (Node::Leaf(mut lc), Node::Leaf(mut rc)) = (left, right) else {
                    unreachable!("height says leaf");
                };
                if lc.len() + rc.len() <= cap {
                    lc.concat(&mut rc);
                    return (Node::Leaf(lc), None);
                }
                Self::balance_pair(&mut lc, &mut rc, cap);
                return (Node::Leaf(lc), Some(Node::Leaf(rc)));
            }
            let (Node::Inner(mut lc), Node::Inner(mut rc)) = (left, right) else {
                unreachable!("height says interior");
            };
            // Join the seam children first so the formerly-extremal nodes
            // end up sound before they become interior.
            let a = lc.pop_back().unwrap();
            let b = rc.pop_front().unwrap();
            let (seam, carry) = Self::join(*a, lh - 1, *b, rh - 1, cap);
            Self::reattach_back(&mut lc, seam, cap);
            if let Some(extra) = carry {
                if !lc.is_full() {
                    lc.push_back(Box::new(extra));
                } else {
                    rc.push_front(Box::new(extra));
                }
            }
            if lc.len() + rc.len() <= cap {
                lc.concat(&mut rc);
                return (Node::Inner(lc), None);
            }
            Self::balance_pair(&mut lc, &mut rc, cap);
            return (Node::Inner(lc), Some(Node::Inner(rc)));
        }
        if lh > rh {
            let Node::Inner(mut lc) = left else {
                unreachable!("taller tree must be interior");
            };
            let a = lc.pop_back().unwrap();
            let (seam, carry) = Self::join(*a, lh - 1, right, rh, cap);
            Self::reattach_back(&mut lc, seam, cap);
            let Some(extra) = carry else {
                return (Node::Inner(lc), None);
            };
            if !lc.is_full() {
                lc.push_back(Box::new(extra));
                return (Node::Inner(lc), None);
            }
            let mut spill = lc.split_off(lc.len() / 2);
            spill.push_back(Box::new(extra));
            profiling::node_split();
            return (Node::Inner(lc), Some(Node::Inner(spill)));
        }
        let Node::Inner(mut rc) = right else {
            unreachable!("taller tree must be interior");
        };
        let b = rc.pop_front().unwrap();
        let (seam, carry) = Self::join(left, lh, *b, rh - 1, cap);
        let Some(extra) = carry else {
            Self::reattach_front(&mut rc, seam, cap);
            return (Node::Inner(rc), None);
        };
        if rc.len() + 2 <= cap {
            rc.push_front(Box::new(extra));
            Self::reattach_front(&mut rc, seam, cap);
            return (Node::Inner(rc), None);
        }
        let spill = rc.split_off(rc.len() / 2);
        rc.push_front(Box::new(extra));
        Self::reattach_front(&mut rc, seam, cap);
        profiling::node_split();
        return (Node::Inner(rc), Some(Node::Inner(spill)));
    }

    /// Redistribute two overfull-as-one chunks so both hold at least
    /// `cap / 2` entries.
    fn balance_pair<X, MX: Measure<X>, BX: Buffer<X>>(
        left: &mut Chunk<X, MX, BX>,
        right: &mut Chunk<X, MX, BX>,
        cap: usize,
    ) {
        let total = left.len() + right.len();
        debug_assert!(total > cap);
        if left.len() < cap / 2 {
            right.transfer_front_to_back(left, total / 2 - left.len());
            profiling::node_steal();
        } else if right.len() < cap / 2 {
            left.transfer_back_to_front(right, total / 2 - right.len());
            profiling::node_steal();
        }
    }
}

impl<P: std::fmt::Debug, M: Measure<P>> std::fmt::Debug for Tree<P, M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        self.for_each(&mut |item| {
            list.entry(item);
        });
        return list.finish();
    }
}

impl<P: Clone, M: Measure<P>> Clone for Tree<P, M> {
    fn clone(&self) -> Self {
        return Tree {
            root: self.root.clone(),
            height: self.height,
            cap: self.cap,
        };
    }
}

#[cfg(test)]
impl<P, M: Measure<P>> Tree<P, M>
where
    M::Value: PartialEq + std::fmt::Debug,
{
    /// Walk the whole tree and assert the structural invariants: uniform
    /// leaf depth, exact caches at every node, chunk bounds, and (off
    /// the spine) minimum occupancy.
    pub(crate) fn check_invariants(&self) {
        Self::check_node(&self.root, self.height, true, true, self.cap);
    }

    fn check_node(
        node: &Node<P, M>,
        height: usize,
        left_spine: bool,
        right_spine: bool,
        cap: usize,
    ) -> M::Value {
        match node {
            Node::Leaf(chunk) => {
                assert_eq!(height, 0, "leaf off the ground level");
                assert!(chunk.len() <= cap, "leaf past capacity");
                if !left_spine && !right_spine {
                    assert!(chunk.len() >= cap / 2, "thin leaf off the spine");
                }
                let mut acc = M::Value::identity();
                for item in chunk.iter() {
                    acc = acc.combine(&M::measure(item));
                }
                assert_eq!(&acc, chunk.measure(), "stale leaf cache");
                return acc;
            }
            Node::Inner(children) => {
                assert!(height > 0, "interior node at ground level");
                assert!(!children.is_empty(), "empty interior node");
                assert!(children.len() <= cap, "interior node past capacity");
                if !left_spine && !right_spine {
                    assert!(children.len() >= cap / 2, "thin interior node off the spine");
                }
                let count = children.len();
                let mut acc = M::Value::identity();
                for (i, child) in children.iter().enumerate() {
                    let sub = Self::check_node(
                        child,
                        height - 1,
                        left_spine && i == 0,
                        right_spine && i == count - 1,
                        cap,
                    );
                    assert_eq!(&sub, child.measure(), "stale child cache");
                    acc = acc.combine(&sub);
                }
                assert_eq!(&acc, children.measure(), "stale interior cache");
                return acc;
            }
        }
    }
}
