// Copyright 2022 Oxide Computer Company

//! Ordered-set container for reverse lookups.
//!
//! A sorter is a private radix tree whose vertices carry nothing but an
//! optional full word. Inserting the same word twice lands on the same
//! vertex, so the set deduplicates for free, and a pre-order walk reads the
//! stored words out in lexicographic order.

use crate::engine::PhoneNumbers;
use crate::strings;
use crate::tree::{Arena, NodeId};

pub struct Sorter {
    arena: Arena,
    root: NodeId,
}

impl Sorter {
    /// Creates a sorter seeded with `key`. `None` on allocation failure.
    pub fn new(key: &str) -> Option<Self> {
        let mut arena = Arena::new();
        let root = arena.root()?;
        let mut sorter = Sorter { arena, root };
        let v = sorter.arena.add_key(sorter.root, key)?;
        sorter.arena[v].full_word = Some(strings::copy(key)?);
        Some(sorter)
    }

    /// Adds `word` to the set, taking ownership of it. Duplicates are
    /// absorbed. `false` on allocation failure.
    pub fn insert(&mut self, word: String) -> bool {
        let v = match self.arena.add_key(self.root, &word) {
            Some(v) => v,
            None => return false,
        };
        if self.arena[v].full_word.is_none() {
            self.arena[v].full_word = Some(word);
        }
        true
    }

    /// Consumes the sorter, moving the stored words into a result list in
    /// lexicographic order. `None` on allocation failure.
    pub fn into_numbers(mut self) -> Option<PhoneNumbers> {
        let mut numbers = PhoneNumbers::new();
        if collect(&mut self.arena, self.root, &mut numbers) {
            Some(numbers)
        } else {
            None
        }
    }
}

/// Pre-order walk: a vertex's word precedes its children's, children run in
/// first-digit order.
fn collect(arena: &mut Arena, v: NodeId, out: &mut PhoneNumbers) -> bool {
    if let Some(word) = arena[v].full_word.take() {
        if !out.push(word) {
            return false;
        }
    }
    let mut c = arena[v].first;
    while let Some(id) = c {
        c = arena[id].next;
        if !collect(arena, id, out) {
            return false;
        }
    }
    true
}
