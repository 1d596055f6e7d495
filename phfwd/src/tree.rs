// Copyright 2022 Oxide Computer Company

//! Arena-backed radix tree over the digit alphabet.
//!
//! Every vertex corresponds to exactly one word: the concatenation of the
//! labels on the path from the root down to the vertex. Sibling labels have
//! distinct first digits and siblings are kept in lexicographic order of
//! that digit. Labels may be arbitrarily long, so a chain of single-child
//! vertices only exists while some vertex on it is in use.
//!
//! A vertex may belong to a *redirect ring*: a circular doubly-linked list
//! joining one target word with every source word currently forwarded to
//! it. Both trees of a forwarding engine live in one arena, so ring links
//! are plain node ids and never dangle across engines.

use crate::digits;
use crate::strings;
use std::ops::{Index, IndexMut};

/// Handle to a vertex. Only valid for the arena that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(u32);

#[derive(Debug)]
pub struct Node {
    /// Label of the edge from the parent. Empty only on a root.
    pub label: String,

    /// Parent vertex, absent on a root.
    pub parent: Option<NodeId>,

    /// Left sibling in label order.
    pub prev: Option<NodeId>,

    /// Right sibling in label order.
    pub next: Option<NodeId>,

    /// Lexicographically smallest child.
    pub first: Option<NodeId>,

    /// Lexicographically largest child.
    pub last: Option<NodeId>,

    /// Left neighbour in the redirect ring; self when the ring is trivial.
    pub ring_left: NodeId,

    /// Right neighbour in the redirect ring; self when the ring is trivial.
    pub ring_right: NodeId,

    /// For a source vertex, the target it is forwarded to.
    pub fwd: Option<NodeId>,

    /// The full word of this vertex, cached while it participates in a
    /// redirect ring.
    pub full_word: Option<String>,

    /// Bitmask of the digits occurring in `label`.
    pub charset: u16,
}

/// Slab of vertices with slot reuse. Freed slots go on a free list and are
/// handed out again by later allocations.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Option<Node>>,
    free: Vec<NodeId>,
}

/// Length of the common prefix of `a` and `b`.
fn mismatch(a: &str, b: &str) -> usize {
    a.bytes().zip(b.bytes()).take_while(|(x, y)| x == y).count()
}

impl Index<NodeId> for Arena {
    type Output = Node;

    fn index(&self, id: NodeId) -> &Node {
        self.nodes[id.0 as usize].as_ref().expect("vacant node slot")
    }
}

impl IndexMut<NodeId> for Arena {
    fn index_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.0 as usize].as_mut().expect("vacant node slot")
    }
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a detached vertex with the given label and a trivial
    /// redirect ring.
    pub fn alloc(&mut self, label: String) -> Option<NodeId> {
        let id = match self.free.pop() {
            Some(id) => id,
            None => {
                self.nodes.try_reserve(1).ok()?;
                let id = NodeId(self.nodes.len() as u32);
                self.nodes.push(None);
                id
            }
        };
        self.nodes[id.0 as usize] = Some(Node {
            charset: digits::charset(&label),
            label,
            parent: None,
            prev: None,
            next: None,
            first: None,
            last: None,
            ring_left: id,
            ring_right: id,
            fwd: None,
            full_word: None,
        });
        Some(id)
    }

    /// Allocates a fresh root.
    pub fn root(&mut self) -> Option<NodeId> {
        self.alloc(String::new())
    }

    fn release(&mut self, id: NodeId) {
        self.nodes[id.0 as usize] = None;
        if self.free.try_reserve(1).is_ok() {
            self.free.push(id);
        }
    }

    fn set_label(&mut self, id: NodeId, label: String) {
        let node = &mut self[id];
        node.charset = digits::charset(&label);
        node.label = label;
    }

    pub fn children(&self, v: NodeId) -> Children<'_> {
        Children { arena: self, cur: self[v].first }
    }

    /// The child of `v` whose label starts with `first`, if any.
    pub fn select_child(&self, v: NodeId, first: u8) -> Option<NodeId> {
        for c in self.children(v) {
            let b = self[c].label.as_bytes()[0];
            if b == first {
                return Some(c);
            }
            if b > first {
                break;
            }
        }
        None
    }

    /// The child of `v` whose label starts with the first digit of `key`,
    /// created with the whole of `key` as its label if absent. Insertion
    /// keeps the siblings ordered.
    pub fn add_child(&mut self, v: NodeId, key: &str) -> Option<NodeId> {
        let first = key.as_bytes()[0];
        let mut before = None;
        for c in self.children(v) {
            let b = self[c].label.as_bytes()[0];
            if b == first {
                return Some(c);
            }
            if b > first {
                before = Some(c);
                break;
            }
        }
        let label = strings::copy(key)?;
        let new = self.alloc(label)?;
        self.attach(v, new, before);
        Some(new)
    }

    /// Links a detached vertex under `parent`, in front of `before` or at
    /// the right end of the sibling list.
    fn attach(&mut self, parent: NodeId, new: NodeId, before: Option<NodeId>) {
        self[new].parent = Some(parent);
        match before {
            Some(sib) => {
                let prev = self[sib].prev;
                self[new].prev = prev;
                self[new].next = Some(sib);
                self[sib].prev = Some(new);
                match prev {
                    Some(p) => self[p].next = Some(new),
                    None => self[parent].first = Some(new),
                }
            }
            None => {
                let last = self[parent].last;
                self[new].prev = last;
                self[new].next = None;
                match last {
                    Some(l) => self[l].next = Some(new),
                    None => self[parent].first = Some(new),
                }
                self[parent].last = Some(new);
            }
        }
    }

    /// Puts `r` in the tree position currently held by `v`: same parent,
    /// same neighbours, same extreme-child status.
    fn splice(&mut self, v: NodeId, r: NodeId) {
        let (parent, prev, next) = {
            let n = &self[v];
            (n.parent, n.prev, n.next)
        };
        self[r].parent = parent;
        self[r].prev = prev;
        self[r].next = next;
        match prev {
            Some(p) => self[p].next = Some(r),
            None => {
                if let Some(par) = parent {
                    self[par].first = Some(r);
                }
            }
        }
        match next {
            Some(n) => self[n].prev = Some(r),
            None => {
                if let Some(par) = parent {
                    self[par].last = Some(r);
                }
            }
        }
    }

    /// Unlinks `v` from its parent and siblings, leaving its subtree
    /// intact but detached.
    fn detach(&mut self, v: NodeId) {
        let (parent, prev, next) = {
            let n = &self[v];
            (n.parent, n.prev, n.next)
        };
        match prev {
            Some(p) => self[p].next = next,
            None => {
                if let Some(par) = parent {
                    self[par].first = next;
                }
            }
        }
        match next {
            Some(n) => self[n].prev = prev,
            None => {
                if let Some(par) = parent {
                    self[par].last = prev;
                }
            }
        }
        let node = &mut self[v];
        node.parent = None;
        node.prev = None;
        node.next = None;
    }

    /// Splits `v`'s label at `breakpoint`, introducing a new parent that
    /// carries the prefix and keeps `v` as its sole child with the suffix.
    /// On allocation failure the tree is left unchanged.
    pub fn add_above(&mut self, v: NodeId, breakpoint: usize) -> Option<NodeId> {
        let (head, tail) = {
            let label = &self[v].label;
            (strings::copy(&label[..breakpoint])?, strings::copy(&label[breakpoint..])?)
        };
        let new = self.alloc(head)?;
        self.splice(v, new);
        self[new].first = Some(v);
        self[new].last = Some(v);
        self[v].parent = Some(new);
        self[v].prev = None;
        self[v].next = None;
        self.set_label(v, tail);
        Some(new)
    }

    /// Excises a vertex with at most one child. A sole child absorbs the
    /// parent label; if that merged label cannot be allocated the tree is
    /// left unchanged and `false` is returned.
    pub fn remove_from_tree(&mut self, v: NodeId) -> bool {
        debug_assert_eq!(self[v].first, self[v].last);
        match self[v].first {
            None => {
                self.detach(v);
                self.release(v);
                true
            }
            Some(child) => {
                let merged = match strings::concat(&self[v].label, &self[child].label) {
                    Some(s) => s,
                    None => return false,
                };
                self.splice(v, child);
                self.set_label(child, merged);
                self.release(v);
                true
            }
        }
    }

    /// Removes `v` if it has become redundant, then walks up the tree
    /// repeating the check. A vertex is redundant when it is not a root,
    /// sits in a trivial redirect ring, and has at most one child; its
    /// cached full word is dropped along the way. A failed label merge
    /// stops the cascade, leaving a well-formed but less compressed tree.
    pub fn cleanup(&mut self, v: NodeId) {
        let mut v = v;
        loop {
            if self[v].parent.is_none() || self[v].ring_right != v {
                return;
            }
            self[v].full_word = None;
            if self[v].first != self[v].last {
                return;
            }
            let parent = self[v].parent;
            if !self.remove_from_tree(v) {
                return;
            }
            match parent {
                Some(p) => v = p,
                None => return,
            }
        }
    }

    /// Inserts `key` into the tree rooted at `root` and returns the vertex
    /// whose path spells `key`, splitting labels as needed. `None` only on
    /// allocation failure.
    pub fn add_key(&mut self, root: NodeId, key: &str) -> Option<NodeId> {
        let mut v = root;
        let mut key = key;
        loop {
            let child = self.add_child(v, key)?;
            let n = mismatch(key, &self[child].label);
            let label_len = self[child].label.len();
            if n == key.len() && n == label_len {
                return Some(child);
            }
            if n == key.len() {
                return self.add_above(child, n);
            }
            if n < label_len {
                let fork = self.add_above(child, n)?;
                return self.add_child(fork, &key[n..]);
            }
            v = child;
            key = &key[n..];
        }
    }

    /// Finds the root of the subtree of words beginning with `prefix`, or
    /// `None` if no stored word has that prefix.
    pub fn get_branch(&self, root: NodeId, prefix: &str) -> Option<NodeId> {
        let mut v = root;
        let mut rest = prefix;
        loop {
            let c = self.select_child(v, rest.as_bytes()[0])?;
            let n = mismatch(rest, &self[c].label);
            if n == rest.len() {
                return Some(c);
            }
            if n == self[c].label.len() {
                v = c;
                rest = &rest[n..];
                continue;
            }
            return None;
        }
    }

    /// Finds the vertex whose path is exactly `key`.
    pub fn get_exact(&self, root: NodeId, key: &str) -> Option<NodeId> {
        let mut v = root;
        let mut rest = key;
        loop {
            let c = self.select_child(v, rest.as_bytes()[0])?;
            let n = mismatch(rest, &self[c].label);
            if n == rest.len() && n == self[c].label.len() {
                return Some(c);
            }
            if n == self[c].label.len() {
                v = c;
                rest = &rest[n..];
                continue;
            }
            return None;
        }
    }

    /// Inserts source vertex `src` into the redirect ring of `dst`,
    /// immediately to its right, and records the forwarding.
    pub fn link(&mut self, src: NodeId, dst: NodeId) {
        let right = self[dst].ring_right;
        self[src].ring_left = dst;
        self[src].ring_right = right;
        self[right].ring_left = src;
        self[dst].ring_right = src;
        self[src].fwd = Some(dst);
    }

    /// Excises `src` from its redirect ring, resetting it to the trivial
    /// self-loop, and returns the target it was forwarded to.
    pub fn unlink(&mut self, src: NodeId) -> Option<NodeId> {
        let (l, r) = (self[src].ring_left, self[src].ring_right);
        self[l].ring_right = r;
        self[r].ring_left = l;
        self[src].ring_left = src;
        self[src].ring_right = src;
        self[src].fwd.take()
    }

    /// Deletes every word with the given prefix from the tree rooted at
    /// `root`. Each deleted source vertex is unlinked from its ring and its
    /// former target swept by `cleanup`; afterwards the detachment point
    /// itself is re-compressed.
    pub fn remove_branch(&mut self, root: NodeId, prefix: &str) {
        let sub = match self.get_branch(root, prefix) {
            Some(sub) => sub,
            None => return,
        };
        let parent = self[sub].parent;
        self.detach(sub);
        self.remove_branch_rec(sub);
        if let Some(p) = parent {
            self.cleanup(p);
        }
    }

    fn remove_branch_rec(&mut self, v: NodeId) {
        if self[v].fwd.is_some() {
            if let Some(target) = self.unlink(v) {
                self.cleanup(target);
            }
        }
        let mut c = self[v].first;
        while let Some(id) = c {
            c = self[id].next;
            self.remove_branch_rec(id);
        }
        self.release(v);
    }

    /// The word this vertex stands for: all labels from the root down.
    pub fn path(&self, v: NodeId) -> String {
        let mut labels = Vec::new();
        let mut cur = Some(v);
        while let Some(id) = cur {
            labels.push(self[id].label.as_str());
            cur = self[id].parent;
        }
        labels.iter().rev().copied().collect()
    }

    /// All occupied slots, in no particular order.
    #[cfg(test)]
    pub(crate) fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_some())
            .map(|(i, _)| NodeId(i as u32))
    }
}

pub struct Children<'a> {
    arena: &'a Arena,
    cur: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.cur?;
        self.cur = self.arena[id].next;
        Some(id)
    }
}
