// Copyright 2022 Oxide Computer Company

//! The phone-forwarding engine.
//!
//! An engine holds two radix trees in one arena: *from*, the tree of source
//! prefixes, and *to*, the tree of target prefixes. Each active redirect
//! joins a source vertex to its target vertex through a redirect ring, and
//! both endpoints cache the full word they stand for, so lookups never
//! re-walk the tree to reconstruct a number.

use crate::digits;
use crate::sorter::Sorter;
use crate::strings;
use crate::tree::{Arena, NodeId};

/// A set of phone-number redirects over one digit alphabet.
pub struct PhoneForward {
    arena: Arena,
    from: NodeId,
    to: NodeId,
}

/// An owned sequence of phone numbers, as returned by lookups. The strings
/// are copies; the list stays valid across later engine mutations.
#[derive(Debug, Default)]
pub struct PhoneNumbers {
    numbers: Vec<String>,
}

impl PhoneNumbers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a number, reporting whether storage could be grown.
    pub(crate) fn push(&mut self, number: String) -> bool {
        if self.numbers.try_reserve(1).is_err() {
            return false;
        }
        self.numbers.push(number);
        true
    }

    pub fn get(&self, idx: usize) -> Option<&str> {
        self.numbers.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.numbers.iter().map(String::as_str)
    }
}

impl PhoneForward {
    /// Creates an empty engine. `None` on allocation failure.
    pub fn new() -> Option<Self> {
        let mut arena = Arena::new();
        let from = arena.root()?;
        let to = arena.root()?;
        Some(PhoneForward { arena, from, to })
    }

    /// Installs the redirect `num1` → `num2`: afterwards every number with
    /// `num1` as a prefix forwards to the same number with that prefix
    /// replaced by `num2`. Re-adding an existing redirect is a no-op;
    /// adding with a new target rebinds the source and lazily reclaims the
    /// old target. Returns `false`, without observable change, when either
    /// argument is not a phone number, the two are equal, or an allocation
    /// fails.
    pub fn add(&mut self, num1: &str, num2: &str) -> bool {
        if !digits::is_number(num1) || !digits::is_number(num2) || num1 == num2 {
            return false;
        }
        log::trace!("add redirect {num1} > {num2}");
        let key1 = match self.arena.add_key(self.from, num1) {
            Some(id) => id,
            None => return false,
        };
        let key2 = match self.arena.add_key(self.to, num2) {
            Some(id) => id,
            None => {
                self.arena.cleanup(key1);
                return false;
            }
        };
        if self.arena[key1].fwd == Some(key2) {
            return true;
        }

        if self.arena[key1].full_word.is_none() {
            match strings::copy(num1) {
                Some(word) => self.arena[key1].full_word = Some(word),
                None => return self.rollback(key1, key2),
            }
        }
        if self.arena[key2].full_word.is_none() {
            match strings::copy(num2) {
                Some(word) => self.arena[key2].full_word = Some(word),
                None => return self.rollback(key1, key2),
            }
        }

        let old = self.arena.unlink(key1);
        self.arena.link(key1, key2);
        if let Some(old) = old {
            self.arena.cleanup(old);
        }
        true
    }

    /// Sweeps the partial work of a failed `add` back out of both trees.
    fn rollback(&mut self, key1: NodeId, key2: NodeId) -> bool {
        self.arena.cleanup(key2);
        self.arena.cleanup(key1);
        false
    }

    /// Erases every redirect whose source has `prefix` as a prefix. Not a
    /// phone number: no-op.
    pub fn remove(&mut self, prefix: &str) {
        if !digits::is_number(prefix) {
            return;
        }
        log::debug!("remove redirects with source prefix {prefix}");
        self.arena.remove_branch(self.from, prefix);
    }

    /// Forward lookup: rewrites `key` by its longest matching source
    /// prefix, or returns `key` itself when nothing matches. The result is
    /// a one-element list; for a malformed key it is a zero-element list.
    /// `None` only on allocation failure.
    pub fn get(&self, key: &str) -> Option<PhoneNumbers> {
        let mut numbers = PhoneNumbers::new();
        if !digits::is_number(key) {
            return Some(numbers);
        }

        let mut v = self.from;
        let mut rest = key;
        let mut best_prefix = "";
        let mut best_suffix = key;
        loop {
            if let Some(target) = self.arena[v].fwd {
                if let Some(word) = self.arena[target].full_word.as_deref() {
                    best_prefix = word;
                    best_suffix = rest;
                }
            }
            if rest.is_empty() {
                break;
            }
            let c = match self.arena.select_child(v, rest.as_bytes()[0]) {
                Some(c) => c,
                None => break,
            };
            match rest.strip_prefix(self.arena[c].label.as_str()) {
                Some(r) => {
                    v = c;
                    rest = r;
                }
                None => break,
            }
        }

        let rewritten = strings::concat(best_prefix, best_suffix)?;
        if !numbers.push(rewritten) {
            return None;
        }
        Some(numbers)
    }

    /// Reverse lookup: the lexicographically ordered, deduplicated set of
    /// numbers that the current redirects map onto `key`, plus `key`
    /// itself. For a malformed key the list is empty. `None` on allocation
    /// failure.
    pub fn reverse(&self, key: &str) -> Option<PhoneNumbers> {
        if !digits::is_number(key) {
            return Some(PhoneNumbers::new());
        }

        let mut sorter = Sorter::new(key)?;
        let mut v = self.to;
        let mut rest = key;
        loop {
            let mut r = self.arena[v].ring_right;
            while r != v {
                let source = self.arena[r]
                    .full_word
                    .as_deref()
                    .expect("ring member carries its full word");
                let candidate = strings::concat(source, rest)?;
                if !sorter.insert(candidate) {
                    return None;
                }
                r = self.arena[r].ring_right;
            }
            if rest.is_empty() {
                break;
            }
            let c = match self.arena.select_child(v, rest.as_bytes()[0]) {
                Some(c) => c,
                None => break,
            };
            match rest.strip_prefix(self.arena[c].label.as_str()) {
                Some(r) => {
                    v = c;
                    rest = r;
                }
                None => break,
            }
        }
        sorter.into_numbers()
    }

    /// Counts the digit strings of length exactly `len` over the distinct
    /// digits of `set` that forward lookup rewrites non-trivially. The
    /// count wraps modulo 2⁶⁴.
    pub fn non_trivial_count(&self, set: &str, len: usize) -> u64 {
        let cs = digits::charset(set);
        let k = u64::from(digits::charset_size(cs));
        self.count_rec(self.to, cs, k, len as u64)
    }

    fn count_rec(&self, v: NodeId, cs: u16, k: u64, len: u64) -> u64 {
        // a targeted vertex is reached by some redirect, so every
        // continuation of the remaining length lands in the image space
        if self.arena[v].ring_right != v {
            return pow_wrapping(k, len);
        }
        let mut total = 0u64;
        for c in self.arena.children(v) {
            let node = &self.arena[c];
            let label_len = node.label.len() as u64;
            if digits::is_subset(node.charset, cs) && label_len <= len {
                total = total.wrapping_add(self.count_rec(c, cs, k, len - label_len));
            }
        }
        total
    }
}

fn pow_wrapping(base: u64, exp: u64) -> u64 {
    let mut base = base;
    let mut exp = exp;
    let mut acc = 1u64;
    while exp != 0 {
        if exp % 2 == 1 {
            acc = acc.wrapping_mul(base);
        }
        exp /= 2;
        base = base.wrapping_mul(base);
    }
    acc
}
