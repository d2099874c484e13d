//! Binary tree of buffer references.
//!
//! Nodes live in an arena and address each other through [`NodeId`]s. `left`/`right` are the
//! ownership edges; `parent` is a plain back-index used to walk upwards.
//!
//! Every node caches [`Counts`], but asymmetrically:
//!
//! - a leaf caches the counts of its own text;
//! - an internal node caches the counts of its **entire left subtree only**.
//!
//! Descending towards a character (or line) index therefore needs one comparison per level:
//! targets below `counts.chars` are in the left subtree, everything else is in the right subtree
//! after subtracting `counts.chars`. The flip side is that every leaf mutation must be followed by
//! [`Tree::propagate`], which adds the delta to each ancestor reached from its left child.
//!
//! Internal nodes always have two children. Removing a leaf collapses its parent into the
//! remaining sibling; the root always exists and becomes an empty leaf when the text is cleared.
//! There is no global rebalancing after edits: merge trees built by [`Tree::graft`] are balanced
//! locally and [`Tree::rebalance`] rebuilds the whole tree on request.

use crate::buffer::{is_high_surrogate, is_low_surrogate};
use crate::buffer_ref::BufferReference;
use crate::counts::{Counts, LINE_FEED};
use crate::error::BufferError;

/// Index of a node in the tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(usize);

/// Which side of an existing leaf new content is grafted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Before,
    After,
}

#[derive(Debug)]
enum NodeKind {
    Leaf {
        buffer_ref: BufferReference,
        counts: Counts,
    },
    Internal {
        left: NodeId,
        right: NodeId,
        /// Aggregate of the left subtree.
        counts: Counts,
    },
    /// Free arena slot.
    Vacant,
}

#[derive(Debug)]
struct Node {
    parent: Option<NodeId>,
    kind: NodeKind,
}

#[derive(Debug)]
pub(crate) struct Tree {
    nodes: Vec<Node>,
    free: Vec<usize>,
    root: NodeId,
    initial_capacity: usize,
    max_capacity: usize,
}

impl Tree {
    /// Create a tree holding a single empty leaf.
    pub(crate) fn new(initial_capacity: usize, max_capacity: usize) -> Result<Self, BufferError> {
        let buffer_ref = BufferReference::empty(initial_capacity, max_capacity)?;
        Ok(Self {
            nodes: vec![Node {
                parent: None,
                kind: NodeKind::Leaf {
                    buffer_ref,
                    counts: Counts::default(),
                },
            }],
            free: Vec::new(),
            root: NodeId(0),
            initial_capacity,
            max_capacity,
        })
    }

    pub(crate) fn initial_capacity(&self) -> usize {
        self.initial_capacity
    }

    pub(crate) fn max_capacity(&self) -> usize {
        self.max_capacity
    }

    fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    fn alloc(&mut self, parent: Option<NodeId>, kind: NodeKind) -> NodeId {
        let node = Node { parent, kind };
        match self.free.pop() {
            Some(slot) => {
                self.nodes[slot] = node;
                NodeId(slot)
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Vacate a slot and hand back what it held.
    fn release(&mut self, id: NodeId) -> NodeKind {
        let kind = std::mem::replace(&mut self.node_mut(id).kind, NodeKind::Vacant);
        self.node_mut(id).parent = None;
        self.free.push(id.0);
        kind
    }

    fn children(&self, id: NodeId) -> Option<(NodeId, NodeId)> {
        match self.node(id).kind {
            NodeKind::Internal { left, right, .. } => Some((left, right)),
            _ => None,
        }
    }

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if let NodeKind::Internal { left, right, .. } = &mut self.node_mut(parent).kind {
            if *left == old {
                *left = new;
            } else if *right == old {
                *right = new;
            }
        }
        self.node_mut(new).parent = Some(parent);
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// The reference held by a leaf.
    pub(crate) fn leaf_ref(&self, id: NodeId) -> Option<&BufferReference> {
        match &self.node(id).kind {
            NodeKind::Leaf { buffer_ref, .. } => Some(buffer_ref),
            _ => None,
        }
    }

    /// Text of a leaf; empty for non-leaves.
    pub(crate) fn leaf_slice(&self, id: NodeId) -> &[u16] {
        self.leaf_ref(id).map_or(&[], BufferReference::as_slice)
    }

    fn leaf_counts(&self, id: NodeId) -> Counts {
        match &self.node(id).kind {
            NodeKind::Leaf { counts, .. } => *counts,
            _ => Counts::default(),
        }
    }

    /// Aggregate counts of the subtree rooted at `id`, walking its right spine.
    fn subtree_counts(&self, id: NodeId) -> Counts {
        let mut total = Counts::default();
        let mut id = id;
        loop {
            match &self.node(id).kind {
                NodeKind::Internal { right, counts, .. } => {
                    total += *counts;
                    id = *right;
                }
                NodeKind::Leaf { counts, .. } => return total + *counts,
                NodeKind::Vacant => return total,
            }
        }
    }

    /// Counts of the whole document.
    pub(crate) fn total_counts(&self) -> Counts {
        self.subtree_counts(self.root)
    }

    pub(crate) fn char_count(&self) -> usize {
        self.total_counts().chars as usize
    }

    /// The leaf containing the character at `idx` and the offset of `idx` inside it.
    pub(crate) fn leaf_at(&self, idx: usize) -> Option<(NodeId, usize)> {
        let mut id = self.root;
        let mut idx = idx as isize;
        loop {
            match &self.node(id).kind {
                NodeKind::Internal {
                    left,
                    right,
                    counts,
                } => {
                    if idx < counts.chars {
                        id = *left;
                    } else {
                        idx -= counts.chars;
                        id = *right;
                    }
                }
                NodeKind::Leaf { counts, .. } => {
                    return (idx < counts.chars).then_some((id, idx as usize));
                }
                NodeKind::Vacant => return None,
            }
        }
    }

    /// The leaf whose text ends exactly at `idx` (the first leaf when `idx == 0`) and the offset
    /// of `idx` inside it.
    pub(crate) fn leaf_ending_at(&self, idx: usize) -> Option<(NodeId, usize)> {
        if idx == 0 {
            return Some((self.first_leaf(), 0));
        }
        self.leaf_at(idx - 1).map(|(id, offset)| (id, offset + 1))
    }

    /// The code unit at `idx`.
    pub(crate) fn unit_at(&self, idx: usize) -> Option<u16> {
        let (leaf, offset) = self.leaf_at(idx)?;
        self.leaf_slice(leaf).get(offset).copied()
    }

    /// Index of the line containing the character at `idx`; `idx == len` is on the last line.
    pub(crate) fn line_index_for_char(&self, idx: usize) -> Option<usize> {
        let total = self.total_counts();
        if idx as isize > total.chars {
            return None;
        }
        if idx as isize == total.chars {
            return Some(total.line_breaks as usize);
        }

        let mut id = self.root;
        let mut idx = idx as isize;
        let mut lines = 0isize;
        loop {
            match &self.node(id).kind {
                NodeKind::Internal {
                    left,
                    right,
                    counts,
                } => {
                    if idx < counts.chars {
                        id = *left;
                    } else {
                        idx -= counts.chars;
                        lines += counts.line_breaks;
                        id = *right;
                    }
                }
                NodeKind::Leaf { buffer_ref, .. } => {
                    let before = &buffer_ref.as_slice()[..idx as usize];
                    let in_leaf = before.iter().filter(|&&u| u == LINE_FEED).count();
                    return Some(lines as usize + in_leaf);
                }
                NodeKind::Vacant => return None,
            }
        }
    }

    /// Index of the first character of line `line`, or `None` beyond the last line.
    pub(crate) fn first_char_index_at_line(&self, line: usize) -> Option<usize> {
        if line == 0 {
            return Some(0);
        }
        if line as isize > self.total_counts().line_breaks {
            return None;
        }

        // Find the `line`-th line feed; the line starts right after it.
        let mut id = self.root;
        let mut target = line as isize;
        let mut chars = 0isize;
        loop {
            match &self.node(id).kind {
                NodeKind::Internal {
                    left,
                    right,
                    counts,
                } => {
                    if counts.line_breaks >= target {
                        id = *left;
                    } else {
                        target -= counts.line_breaks;
                        chars += counts.chars;
                        id = *right;
                    }
                }
                NodeKind::Leaf { buffer_ref, .. } => {
                    let mut seen = 0isize;
                    for (pos, &unit) in buffer_ref.as_slice().iter().enumerate() {
                        if unit == LINE_FEED {
                            seen += 1;
                            if seen == target {
                                return Some((chars as usize) + pos + 1);
                            }
                        }
                    }
                    return None;
                }
                NodeKind::Vacant => return None,
            }
        }
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some((left, _)) = self.children(id) {
            id = left;
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some((_, right)) = self.children(id) {
            id = right;
        }
        id
    }

    pub(crate) fn first_leaf(&self) -> NodeId {
        self.leftmost(self.root)
    }

    pub(crate) fn last_leaf(&self) -> NodeId {
        self.rightmost(self.root)
    }

    /// The leaf following `id` in document order.
    pub(crate) fn next_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut child = id;
        while let Some(parent) = self.parent(child) {
            let (left, right) = self.children(parent)?;
            if left == child {
                return Some(self.leftmost(right));
            }
            child = parent;
        }
        None
    }

    /// The leaf preceding `id` in document order.
    pub(crate) fn prev_leaf(&self, id: NodeId) -> Option<NodeId> {
        let mut child = id;
        while let Some(parent) = self.parent(child) {
            let (left, right) = self.children(parent)?;
            if right == child {
                return Some(self.rightmost(left));
            }
            child = parent;
        }
        None
    }

    /// All leaves in document order.
    fn leaf_ids(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = Some(self.first_leaf());
        while let Some(id) = current {
            out.push(id);
            current = self.next_leaf(id);
        }
        out
    }

    pub(crate) fn leaf_count(&self) -> usize {
        self.leaf_ids().len()
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub(crate) fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 1usize)];
        while let Some((id, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Some((left, right)) = self.children(id) {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        deepest
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Add `delta` to every ancestor of `from` that is reached from its left child.
    pub(crate) fn propagate(&mut self, delta: Counts, from: NodeId) {
        let mut child = from;
        while let Some(parent) = self.parent(child) {
            if let NodeKind::Internal { left, counts, .. } = &mut self.node_mut(parent).kind
                && *left == child
            {
                *counts += delta;
            }
            child = parent;
        }
    }

    /// Append `units` in place at the end of `leaf`, if its buffer may be extended.
    ///
    /// Returns the number of units absorbed, which may be less than `units.len()`.
    pub(crate) fn append_to_leaf(
        &mut self,
        leaf: NodeId,
        units: &[u16],
    ) -> Result<usize, BufferError> {
        let NodeKind::Leaf { buffer_ref, counts } = &mut self.node_mut(leaf).kind else {
            return Ok(0);
        };
        let written = buffer_ref.append(units)?;
        if written == 0 {
            return Ok(0);
        }
        let delta = Counts::of(&units[..written]);
        *counts += delta;
        self.propagate(delta, leaf);
        Ok(written)
    }

    /// Make sure a leaf boundary exists at `idx`.
    pub(crate) fn split_before(&mut self, idx: usize) {
        if let Some((leaf, offset)) = self.leaf_at(idx)
            && offset > 0
        {
            self.split_leaf(leaf, offset);
        }
    }

    /// Turn `leaf` into an internal node over two leaves sharing its buffer.
    fn split_leaf(&mut self, leaf: NodeId, offset: usize) {
        let NodeKind::Leaf { buffer_ref, counts } =
            std::mem::replace(&mut self.node_mut(leaf).kind, NodeKind::Vacant)
        else {
            return;
        };
        let (left_ref, right_ref) = buffer_ref.split_at(offset);
        drop(buffer_ref);
        let left_counts = left_ref.counts();
        let right_counts = counts - left_counts;
        tracing::trace!(offset, len = counts.chars, "split leaf");

        let left = self.alloc(
            Some(leaf),
            NodeKind::Leaf {
                buffer_ref: left_ref,
                counts: left_counts,
            },
        );
        let right = self.alloc(
            Some(leaf),
            NodeKind::Leaf {
                buffer_ref: right_ref,
                counts: right_counts,
            },
        );
        self.node_mut(leaf).kind = NodeKind::Internal {
            left,
            right,
            counts: left_counts,
        };
    }

    /// Build a perfectly balanced tree over `refs`, bottom-up, and return its root and total
    /// counts. The new root has no parent yet.
    fn build_balanced(&mut self, refs: Vec<BufferReference>) -> Option<(NodeId, Counts)> {
        let mut level: Vec<(NodeId, Counts)> = refs
            .into_iter()
            .map(|buffer_ref| {
                let counts = buffer_ref.counts();
                let id = self.alloc(None, NodeKind::Leaf { buffer_ref, counts });
                (id, counts)
            })
            .collect();

        while level.len() > 1 {
            let mut next = Vec::with_capacity(level.len().div_ceil(2));
            for pair in level.chunks(2) {
                match *pair {
                    [(left, left_counts), (right, right_counts)] => {
                        let id = self.alloc(
                            None,
                            NodeKind::Internal {
                                left,
                                right,
                                counts: left_counts,
                            },
                        );
                        self.node_mut(left).parent = Some(id);
                        self.node_mut(right).parent = Some(id);
                        next.push((id, left_counts + right_counts));
                    }
                    [single] => next.push(single),
                    _ => {}
                }
            }
            level = next;
        }
        level.pop()
    }

    /// Insert `refs` next to `leaf`: before it or after it.
    ///
    /// The new references become a balanced subtree that sits beside a copy of the original leaf
    /// under `leaf`, which turns into an internal node. An empty leaf is replaced outright.
    pub(crate) fn graft(&mut self, leaf: NodeId, side: Side, refs: Vec<BufferReference>) {
        let Some((merged, total)) = self.build_balanced(refs) else {
            return;
        };
        tracing::trace!(side = ?side, units = total.chars, "graft subtree");

        if self.leaf_counts(leaf).chars == 0 {
            match self.release(merged) {
                NodeKind::Internal {
                    left,
                    right,
                    counts,
                } => {
                    self.node_mut(left).parent = Some(leaf);
                    self.node_mut(right).parent = Some(leaf);
                    self.node_mut(leaf).kind = NodeKind::Internal {
                        left,
                        right,
                        counts,
                    };
                }
                kind => self.node_mut(leaf).kind = kind,
            }
            self.propagate(total, leaf);
            return;
        }

        let original = std::mem::replace(&mut self.node_mut(leaf).kind, NodeKind::Vacant);
        let original_counts = match &original {
            NodeKind::Leaf { counts, .. } => *counts,
            _ => Counts::default(),
        };
        let copy = self.alloc(Some(leaf), original);
        self.node_mut(merged).parent = Some(leaf);
        self.node_mut(leaf).kind = match side {
            Side::After => NodeKind::Internal {
                left: copy,
                right: merged,
                counts: original_counts,
            },
            Side::Before => NodeKind::Internal {
                left: merged,
                right: copy,
                counts: total,
            },
        };
        self.propagate(total, leaf);
    }

    /// Detach `leaf` from the tree and hand back its reference.
    ///
    /// The leaf's parent collapses into the remaining sibling. Removing the root leaf leaves a
    /// fresh empty leaf behind.
    pub(crate) fn remove_leaf(&mut self, leaf: NodeId) -> Result<BufferReference, BufferError> {
        let counts = self.leaf_counts(leaf);
        self.propagate(-counts, leaf);

        let Some(parent) = self.parent(leaf) else {
            let empty = NodeKind::Leaf {
                buffer_ref: BufferReference::empty(self.initial_capacity, self.max_capacity)?,
                counts: Counts::default(),
            };
            return match std::mem::replace(&mut self.node_mut(leaf).kind, empty) {
                NodeKind::Leaf { buffer_ref, .. } => Ok(buffer_ref),
                _ => BufferReference::empty(self.initial_capacity, self.max_capacity),
            };
        };

        let sibling = match self.children(parent) {
            Some((left, right)) if left == leaf => right,
            Some((left, _)) => left,
            None => parent,
        };
        let grandparent = self.parent(parent);
        let removed = self.release(leaf);
        self.release(parent);

        match grandparent {
            Some(grandparent) => self.replace_child(grandparent, parent, sibling),
            None => {
                self.node_mut(sibling).parent = None;
                self.root = sibling;
            }
        }

        match removed {
            NodeKind::Leaf { buffer_ref, .. } => Ok(buffer_ref),
            _ => BufferReference::empty(self.initial_capacity, self.max_capacity),
        }
    }

    /// Rebuild the tree as a perfectly balanced tree over its current leaves.
    pub(crate) fn rebalance(&mut self) -> Result<(), BufferError> {
        let refs: Vec<BufferReference> = self
            .leaf_ids()
            .into_iter()
            .filter_map(|id| self.leaf_ref(id).cloned())
            .filter(|r| !r.is_empty())
            .collect();

        let mut fresh = Tree::new(self.initial_capacity, self.max_capacity)?;
        let root = fresh.first_leaf();
        fresh.graft(root, Side::After, refs);
        *self = fresh;
        Ok(())
    }

    /// Verify the cached counts, parent links and surrogate-safe leaf boundaries.
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        if self.parent(self.root).is_some() {
            return Err("root has a parent".to_string());
        }

        // Post-order walk computing each subtree's aggregate.
        let mut totals: Vec<Option<Counts>> = vec![None; self.nodes.len()];
        let mut stack = vec![(self.root, false)];
        while let Some((id, expanded)) = stack.pop() {
            match &self.node(id).kind {
                NodeKind::Vacant => return Err(format!("vacant node {} is reachable", id.0)),
                NodeKind::Leaf { buffer_ref, counts } => {
                    if buffer_ref.len() as isize != counts.chars {
                        return Err(format!(
                            "leaf {} holds {} units but counts {}",
                            id.0,
                            buffer_ref.len(),
                            counts.chars
                        ));
                    }
                    if buffer_ref.counts() != *counts {
                        return Err(format!("leaf {} has stale line-break count", id.0));
                    }
                    totals[id.0] = Some(*counts);
                }
                NodeKind::Internal {
                    left,
                    right,
                    counts,
                } => {
                    if left == right {
                        return Err(format!("node {} has the same child twice", id.0));
                    }
                    for child in [left, right] {
                        if self.parent(*child) != Some(id) {
                            return Err(format!("node {} has a wrong parent link", child.0));
                        }
                    }
                    if !expanded {
                        stack.push((id, true));
                        stack.push((*left, false));
                        stack.push((*right, false));
                        continue;
                    }
                    let (Some(left_total), Some(right_total)) = (totals[left.0], totals[right.0])
                    else {
                        return Err(format!("children of node {} were not visited", id.0));
                    };
                    if left_total != *counts {
                        return Err(format!(
                            "node {} caches {:?} but its left subtree holds {:?}",
                            id.0, counts, left_total
                        ));
                    }
                    totals[id.0] = Some(left_total + right_total);
                }
            }
        }

        let mut previous: Option<u16> = None;
        for id in self.leaf_ids() {
            let slice = self.leaf_slice(id);
            if let (Some(last), Some(&first)) = (previous, slice.first())
                && is_high_surrogate(last)
                && is_low_surrogate(first)
            {
                return Err(format!("leaf {} starts inside a surrogate pair", id.0));
            }
            if let Some(&last) = slice.last() {
                previous = Some(last);
            }
        }
        Ok(())
    }
}
