use std::collections::BTreeMap;

use crate::dictionary::Dictionary;
use crate::errors::Result;
use crate::types::*;

/// Translation candidates per source position, in source order.
///
/// Seeding and expansion consume the map: a claimed (source, target) pair
/// is removed so no later sequence can claim it again.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Candidates {
    translations: BTreeMap<Position, Vec<Position>>,
}

impl Candidates {
    /// Every occurrence in the target text of every translation of every
    /// source token. Tokens without a dictionary entry get no slot; tokens
    /// whose entry yields nothing (no letters) get an empty one.
    pub fn collect(dict: &Dictionary) -> Result<Candidates> {
        let target = dict.target();
        let mut translations = BTreeMap::new();
        for token in dict.source().tokens() {
            if !dict.has(token)? {
                continue;
            }
            let f_tokens: Vec<Position> = dict
                .lookup(token)?
                .iter()
                .flat_map(|&t| target.word_type(t).positions().iter().copied())
                .collect();
            translations.insert(token.position(), f_tokens);
        }
        tracing::debug!(
            slots = translations.len(),
            candidates = translations.values().map(Vec::len).sum::<usize>(),
            "candidates collected"
        );
        Ok(Candidates { translations })
    }

    #[inline] pub fn len(&self) -> usize { self.translations.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.translations.is_empty() }

    /// Number of unclaimed (source, target) pairs.
    pub fn remaining(&self) -> usize {
        self.translations.values().map(Vec::len).sum()
    }

    pub fn get(&self, source: Position) -> &[Position] {
        self.translations.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (Position, &[Position])> + '_ {
        self.translations.iter().map(|(&s, t)| (s, t.as_slice()))
    }

    /// Source positions with an entry, exhausted or not.
    pub fn slots(&self) -> Vec<Position> {
        self.translations.keys().copied().collect()
    }

    /// First source position after `slot` that still has candidates.
    pub fn next_nonempty_after(&self, slot: Position) -> Option<Position> {
        self.translations
            .range(slot + 1..)
            .find(|(_, t)| !t.is_empty())
            .map(|(&s, _)| s)
    }

    /// Removes `target` from the candidates of `source`.
    pub fn claim(&mut self, source: Position, target: Position) -> bool {
        let Some(list) = self.translations.get_mut(&source) else { return false };
        match list.iter().position(|&t| t == target) {
            Some(k) => {
                list.remove(k);
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_entries(entries: Vec<(Position, Vec<Position>)>) -> Candidates {
        Candidates { translations: entries.into_iter().collect() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{Text, TextFormat};
    use std::sync::Arc;

    #[test]
    fn collect_lists_every_target_occurrence_in_entry_order() {
        let e = Arc::new(Text::parse("e", "der baum und das haus", TextFormat::Words));
        let f = Arc::new(Text::parse(
            "f",
            "home tree and house the house",
            TextFormat::Words,
        ));
        let dict = Dictionary::parse(e, f, "haus = house\nhaus = home\nbaum = tree\n");
        let cands = Candidates::collect(&dict).unwrap();
        assert_eq!(cands.len(), 2);
        assert_eq!(cands.get(1), &[1]);
        assert_eq!(cands.get(4), &[3, 5, 0]);
        // "der", "und", "das" have no dictionary entry
        assert!(cands.get(0).is_empty());
        assert_eq!(cands.slots(), vec![1, 4]);
        assert_eq!(cands.remaining(), 4);
    }

    #[test]
    fn entries_without_letters_keep_an_empty_slot() {
        let e = Arc::new(Text::parse("e", "haus 1999 baum", TextFormat::Words));
        let f = Arc::new(Text::parse("f", "house 1999 tree", TextFormat::Words));
        let dict = Dictionary::parse(e, f, "haus = house\n1999 = 1999\nbaum = tree\n");
        let cands = Candidates::collect(&dict).unwrap();
        assert_eq!(cands.slots(), vec![0, 1, 2]);
        assert!(cands.get(1).is_empty());
        assert_eq!(cands.next_nonempty_after(0), Some(2));
        assert_eq!(cands.remaining(), 2);
    }

    #[test]
    fn claim_and_next_nonempty() {
        let mut cands = Candidates::from_entries(vec![(2, vec![5]), (4, vec![7, 9]), (6, vec![10])]);
        assert_eq!(cands.next_nonempty_after(2), Some(4));
        assert!(cands.claim(4, 7));
        assert!(!cands.claim(4, 7));
        assert!(!cands.claim(3, 7));
        assert!(cands.claim(4, 9));
        assert_eq!(cands.next_nonempty_after(2), Some(6));
        assert_eq!(cands.next_nonempty_after(6), None);
        // exhausted slots keep their entry
        assert_eq!(cands.slots(), vec![2, 4, 6]);
        assert_eq!(cands.remaining(), 2);
    }
}
