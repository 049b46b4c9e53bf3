//! The set of live sequences for one alignment direction.
//!
//! Sequences live in an arena addressed by generational [`SeqId`] handles.
//! Every source and target position keeps the handles of the sequences that
//! currently hold a pair on it; the hypothesis is the only place that adds
//! or removes pairs, so the registry is updated in the same step as the
//! sequence itself. Removing a sequence bumps its slot's generation, and
//! stale handles simply resolve to `None`.

use std::sync::Arc;

use crate::dictionary::Dictionary;
use crate::errors::{AlignError, Result};
use crate::sequence::{Pair, Sequence};
use crate::types::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SeqId {
    index: u32,
    generation: u32,
}

#[derive(Debug)]
struct Entry {
    generation: u32,
    sequence: Option<Sequence>,
}

#[derive(Debug)]
pub struct Hypothesis {
    dict: Arc<Dictionary>,
    entries: Vec<Entry>,
    free: Vec<u32>,
    order: Vec<SeqId>,
    source_refs: Vec<Vec<SeqId>>,
    target_refs: Vec<Vec<SeqId>>,
}

impl Hypothesis {
    pub fn new(dict: Arc<Dictionary>) -> Self {
        let source_refs = vec![Vec::new(); dict.source().len()];
        let target_refs = vec![Vec::new(); dict.target().len()];
        Hypothesis {
            dict,
            entries: Vec::new(),
            free: Vec::new(),
            order: Vec::new(),
            source_refs,
            target_refs,
        }
    }

    #[inline] pub fn dictionary(&self) -> &Arc<Dictionary> { &self.dict }
    #[inline] pub fn len(&self) -> usize { self.order.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.order.is_empty() }

    /// Handles of the live sequences, in hypothesis order.
    #[inline] pub fn ids(&self) -> &[SeqId] { &self.order }

    pub fn get(&self, id: SeqId) -> Option<&Sequence> {
        let entry = self.entries.get(id.index as usize)?;
        if entry.generation != id.generation { return None; }
        entry.sequence.as_ref()
    }

    fn get_mut(&mut self, id: SeqId) -> Option<&mut Sequence> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation { return None; }
        entry.sequence.as_mut()
    }

    pub fn contains(&self, id: SeqId) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SeqId, &Sequence)> + '_ {
        self.order.iter().filter_map(move |&id| self.get(id).map(|s| (id, s)))
    }

    pub fn sequences(&self) -> impl Iterator<Item = &Sequence> + '_ {
        self.iter().map(|(_, s)| s)
    }

    /// Sequences currently holding a pair on source position `position`.
    pub fn at_source(&self, position: Position) -> &[SeqId] {
        self.source_refs.get(position).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Sequences currently holding a pair on target position `position`.
    pub fn at_target(&self, position: Position) -> &[SeqId] {
        self.target_refs.get(position).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Creates a sequence from `first` and appends it to the hypothesis.
    pub fn new_sequence(&mut self, first: Pair) -> Result<SeqId> {
        self.check(&first)?;
        let id = self.alloc(Sequence::new(first));
        self.order.push(id);
        Ok(id)
    }

    // Both positions must lie inside the texts of the dictionary.
    fn check(&self, pair: &Pair) -> Result<()> {
        self.dict.source().at(pair.slot())?;
        self.dict.target().at(pair.target_slot())?;
        Ok(())
    }

    fn alloc(&mut self, sequence: Sequence) -> SeqId {
        let pairs: Vec<Pair> = sequence.pairs().to_vec();
        let id = match self.free.pop() {
            Some(index) => {
                let entry = &mut self.entries[index as usize];
                entry.sequence = Some(sequence);
                SeqId { index, generation: entry.generation }
            }
            None => {
                let index = self.entries.len() as u32;
                self.entries.push(Entry { generation: 0, sequence: Some(sequence) });
                SeqId { index, generation: 0 }
            }
        };
        for pair in &pairs {
            self.register(id, pair);
        }
        id
    }

    fn register(&mut self, id: SeqId, pair: &Pair) {
        for refs in [&mut self.source_refs[pair.slot()], &mut self.target_refs[pair.target_slot()]] {
            if !refs.contains(&id) {
                refs.push(id);
            }
        }
    }

    fn deregister(&mut self, id: SeqId, pair: &Pair) {
        self.source_refs[pair.slot()].retain(|&other| other != id);
        self.target_refs[pair.target_slot()].retain(|&other| other != id);
    }

    /// Destroys the sequence and drops every back reference to it.
    pub fn remove_sequence(&mut self, id: SeqId) -> Option<Sequence> {
        let sequence = self.take(id)?;
        self.order.retain(|&other| other != id);
        Some(sequence)
    }

    // Frees the arena slot without touching `order`.
    fn take(&mut self, id: SeqId) -> Option<Sequence> {
        let entry = self.entries.get_mut(id.index as usize)?;
        if entry.generation != id.generation { return None; }
        let sequence = entry.sequence.take()?;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        for pair in sequence.pairs() {
            self.deregister(id, pair);
        }
        Some(sequence)
    }

    /// Appends `pair` unconditionally. `Ok(false)` for a stale handle.
    pub fn add(&mut self, id: SeqId, pair: Pair) -> Result<bool> {
        self.check(&pair)?;
        match self.get_mut(id) {
            Some(seq) => seq.push(pair),
            None => return Ok(false),
        }
        self.register(id, &pair);
        Ok(true)
    }

    /// Appends `pair` if it is monotone, within the closeness window of the
    /// last pair, and its target isn't in the sequence yet.
    pub fn add_if_close(&mut self, id: SeqId, pair: Pair, opts: &AlignOptions) -> Result<bool> {
        self.check(&pair)?;
        if !self.get(id).is_some_and(|seq| seq.accepts(&pair, opts)) {
            return Ok(false);
        }
        self.add(id, pair)
    }

    /// Appends all pairs of `other` to `into` and removes `other`; its tokens
    /// now point at `into`.
    pub fn merge(&mut self, into: SeqId, other: SeqId) -> bool {
        if into == other || !self.contains(into) {
            return false;
        }
        let Some(absorbed) = self.remove_sequence(other) else { return false };
        let pairs = absorbed.pairs().to_vec();
        if let Some(seq) = self.get_mut(into) {
            seq.append(absorbed);
        }
        for pair in &pairs {
            self.register(into, pair);
        }
        true
    }

    pub(crate) fn set_score(&mut self, id: SeqId, score: Score) {
        if let Some(seq) = self.get_mut(id) {
            seq.set_score(score);
        }
    }

    /// Removes every sequence for which `keep` returns false.
    pub fn retain(&mut self, mut keep: impl FnMut(&Sequence) -> bool) -> usize {
        let doomed: Vec<SeqId> = self
            .iter()
            .filter(|&(_, seq)| !keep(seq))
            .map(|(id, _)| id)
            .collect();
        for &id in &doomed {
            self.remove_sequence(id);
        }
        doomed.len()
    }

    /// Stable sort of the hypothesis order by starting slot.
    pub fn sort_by_slot(&mut self) {
        let mut keyed: Vec<(Position, SeqId)> = self.iter().map(|(id, s)| (s.slot(), id)).collect();
        keyed.sort_by_key(|&(slot, _)| slot);
        self.order = keyed.into_iter().map(|(_, id)| id).collect();
    }

    /// Swaps source and target of every pair and rebinds to `reversed`, the
    /// mirror of the current dictionary.
    pub fn reverse(&mut self, reversed: Arc<Dictionary>) -> Result<()> {
        if !reversed.is_reverse_of(&self.dict) {
            return Err(AlignError::DictionaryMismatch(format!(
                "{} -> {} is not the reverse of {} -> {}",
                reversed.source().name(),
                reversed.target().name(),
                self.dict.source().name(),
                self.dict.target().name()
            )));
        }
        for entry in self.entries.iter_mut() {
            if let Some(seq) = entry.sequence.as_mut() {
                seq.reverse();
            }
        }
        core::mem::swap(&mut self.source_refs, &mut self.target_refs);
        self.dict = reversed;
        Ok(())
    }

    /// Moves the sequences of `other` into this hypothesis, merged by
    /// starting slot. A sequence equal to one already present at its slot is
    /// dropped. Returns the number of sequences taken over.
    pub fn munch(&mut self, mut other: Hypothesis) -> Result<usize> {
        if !Arc::ptr_eq(&self.dict, &other.dict) {
            return Err(AlignError::DictionaryMismatch(format!(
                "cannot merge {} -> {} into {} -> {}",
                other.dict.source().name(),
                other.dict.target().name(),
                self.dict.source().name(),
                self.dict.target().name()
            )));
        }
        self.sort_by_slot();
        other.sort_by_slot();

        let mine = core::mem::take(&mut self.order);
        let incoming: Vec<Sequence> = other
            .order
            .clone()
            .into_iter()
            .filter_map(|id| other.take(id))
            .collect();

        let mut merged: Vec<SeqId> = Vec::with_capacity(mine.len() + incoming.len());
        let mut rest = mine.into_iter().peekable();
        let mut taken = 0;
        for seq in incoming {
            while let Some(&id) = rest.peek() {
                match self.get(id) {
                    Some(s) if s.slot() > seq.slot() => break,
                    _ => merged.push(id),
                }
                rest.next();
            }
            let duplicate = merged
                .iter()
                .rev()
                .filter_map(|&id| self.get(id))
                .take_while(|s| s.slot() == seq.slot())
                .any(|s| *s == seq);
            if duplicate {
                continue;
            }
            merged.push(self.alloc(seq));
            taken += 1;
        }
        merged.extend(rest);
        self.order = merged;
        tracing::debug!(taken, total = self.len(), "munched reverse hypothesis");
        Ok(taken)
    }

    /// Every registry entry matches a pair of the sequence it names, and the
    /// other way round.
    #[cfg(test)]
    pub(crate) fn registry_is_consistent(&self) -> bool {
        let live = self.iter().all(|(id, seq)| {
            seq.iter().all(|p| {
                self.at_source(p.slot()).contains(&id) && self.at_target(p.target_slot()).contains(&id)
            })
        });
        let sources = self.source_refs.iter().enumerate().all(|(pos, refs)| {
            refs.iter().all(|&id| self.get(id).is_some_and(|s| s.iter().any(|p| p.slot() == pos)))
        });
        let targets = self.target_refs.iter().enumerate().all(|(pos, refs)| {
            refs.iter().all(|&id| self.get(id).is_some_and(|s| s.has_target(pos)))
        });
        live && sources && targets
    }
}
