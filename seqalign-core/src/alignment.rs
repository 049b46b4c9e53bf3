use std::sync::Arc;

use crate::candidates::Candidates;
use crate::dictionary::Dictionary;
use crate::errors::Result;
use crate::hypothesis::{Hypothesis, SeqId};
use crate::scoring::ScoringMethods;
use crate::sequence::Pair;
use crate::types::*;

/// Phase after which [`Aligner::make`] returns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BreakAfter {
    Initial,
    Expand,
    Merge,
    #[default]
    Never,
}

// Seeds two-pair sequences from neighbouring candidate slots. Both sides of a
// seed are claimed right away; the first eligible (f1, f2) wins.
pub fn initial_sequences(
    hyp: &mut Hypothesis,
    cands: &mut Candidates,
    opts: &AlignOptions,
) -> Result<usize> {
    let slots = cands.slots();
    let mut created = 0;
    for (k, &e1) in slots.iter().enumerate() {
        if cands.get(e1).is_empty() { continue; }

        let mut skipped = 0;
        let mut partner = None;
        for &next in &slots[k + 1..] {
            if cands.get(next).is_empty() {
                skipped += 1;
            } else {
                partner = Some(next);
                break;
            }
        }
        let Some(e2) = partner else { continue };
        if skipped > opts.max_skip { continue; }

        for f1 in cands.get(e1).to_vec() {
            let found = cands
                .get(e2)
                .iter()
                .copied()
                .find(|&f2| f1 < f2 && close_to(f1, f2, opts.closeness));
            let Some(f2) = found else { continue };
            cands.claim(e1, f1);
            cands.claim(e2, f2);
            let id = hyp.new_sequence(Pair::new(e1, f1))?;
            hyp.add(id, Pair::new(e2, f2))?;
            created += 1;
            tracing::trace!(e1, f1, e2, f2, "seeded");
        }
    }
    tracing::debug!(created, "initial sequences");
    Ok(created)
}

// Grows every sequence at its tail from the next slot that still has
// candidates, until a sweep adds nothing.
pub fn expand_sequences(
    hyp: &mut Hypothesis,
    cands: &mut Candidates,
    opts: &AlignOptions,
) -> Result<usize> {
    let mut total = 0;
    loop {
        let mut added = 0;
        for id in hyp.ids().to_vec() {
            let Some(back) = hyp.get(id).map(|s| s.back_slot()) else { continue };
            let Some(next) = cands.next_nonempty_after(back) else { continue };
            for f in cands.get(next).to_vec() {
                if hyp.add_if_close(id, Pair::new(next, f), opts)? {
                    cands.claim(next, f);
                    added += 1;
                }
            }
        }
        total += added;
        if added == 0 { break; }
    }
    tracing::debug!(added = total, left = cands.remaining(), "expanded sequences");
    Ok(total)
}

// Fuses each sequence with the next one starting after its back slot when
// the junction is close on both axes, until a sweep fuses nothing.
pub fn merge_sequences(hyp: &mut Hypothesis, opts: &AlignOptions) -> usize {
    hyp.sort_by_slot();
    let mut total = 0;
    loop {
        let mut combined = 0;
        let mut i = 0;
        while i < hyp.len() {
            let id = hyp.ids()[i];
            if let Some(other) = next_after(hyp, i) {
                let close = match (hyp.get(id), hyp.get(other)) {
                    (Some(seq), Some(o)) => seq.last_pair().both_close(o.first_pair(), opts),
                    _ => false,
                };
                if close && hyp.merge(id, other) {
                    tracing::trace!(?id, ?other, "merged");
                    combined += 1;
                }
            }
            i += 1;
        }
        total += combined;
        if combined == 0 { break; }
    }
    tracing::debug!(merged = total, sequences = hyp.len(), "merged sequences");
    total
}

// The first sequence after position `i` whose slot lies beyond i's back slot.
fn next_after(hyp: &Hypothesis, i: usize) -> Option<SeqId> {
    let back = hyp.get(hyp.ids()[i])?.back_slot();
    hyp.ids()[i + 1..]
        .iter()
        .copied()
        .find(|&o| hyp.get(o).is_some_and(|s| s.slot() > back))
}

/// Scores every sequence: raw scores first, then normalization by each
/// method's running maximum, averaged over methods.
pub fn collect_scores(hyp: &mut Hypothesis, methods: &mut ScoringMethods) {
    let dict = Arc::clone(hyp.dictionary());
    let raw: Vec<(SeqId, Vec<Score>)> = hyp
        .iter()
        .map(|(id, seq)| (id, methods.raw_scores(seq, &dict)))
        .collect();
    for (id, scores) in raw {
        hyp.set_score(id, methods.combine(&scores));
    }
    tracing::debug!(sequences = hyp.len(), maxima = ?methods, "scores collected");
}

/// Drops sequences of two pairs or less, then lets every sequence remove the
/// competitors sharing one of its tokens that don't score higher. A tie
/// removes both sides. Returns the number of removed sequences.
pub fn get_topranking(hyp: &mut Hypothesis) -> usize {
    let before = hyp.len();
    hyp.retain(|seq| seq.len() > 2);

    for id in hyp.ids().to_vec() {
        let Some(seq) = hyp.get(id) else { continue };
        let score = seq.score();
        let pairs = seq.pairs().to_vec();
        let mut tied = false;
        for pair in pairs {
            let mut competitors = hyp.at_source(pair.slot()).to_vec();
            competitors.extend_from_slice(hyp.at_target(pair.target_slot()));
            for other in competitors {
                if other == id { continue; }
                let Some(other_score) = hyp.get(other).map(|s| s.score()) else { continue };
                if other_score == score {
                    tied = true;
                }
                if other_score <= score {
                    hyp.remove_sequence(other);
                }
            }
        }
        if tied {
            hyp.remove_sequence(id);
        }
    }
    let removed = before - hyp.len();
    tracing::debug!(removed, kept = hyp.len(), "top ranking");
    removed
}

/// Runs the alignment phases over one or two dictionaries.
#[derive(Debug)]
pub struct Aligner {
    options: AlignOptions,
    scoring: ScoringMethods,
}

impl Aligner {
    pub fn new(options: AlignOptions) -> Self {
        Aligner::with_scoring(options, ScoringMethods::default())
    }

    pub fn with_scoring(options: AlignOptions, scoring: ScoringMethods) -> Self {
        if !options.monotony {
            tracing::warn!("non-monotone alignment is not supported, monotonicity stays enforced");
        }
        Aligner { options, scoring }
    }

    #[inline] pub fn options(&self) -> &AlignOptions { &self.options }
    #[inline] pub fn scoring(&self) -> &ScoringMethods { &self.scoring }

    /// Seeds and expands a hypothesis over `dict`. The candidates are dropped
    /// afterwards.
    pub fn grow(&self, dict: Arc<Dictionary>, break_after: BreakAfter) -> Result<Hypothesis> {
        let mut cands = Candidates::collect(&dict)?;
        let mut hyp = Hypothesis::new(dict);
        initial_sequences(&mut hyp, &mut cands, &self.options)?;
        if break_after != BreakAfter::Initial {
            expand_sequences(&mut hyp, &mut cands, &self.options)?;
        }
        Ok(hyp)
    }

    /// Aligns the texts of `dict`.
    pub fn make(&mut self, dict: Arc<Dictionary>, break_after: BreakAfter) -> Result<Hypothesis> {
        let mut hyp = self.grow(dict, break_after)?;
        if matches!(break_after, BreakAfter::Initial | BreakAfter::Expand) {
            return Ok(hyp);
        }
        merge_sequences(&mut hyp, &self.options);
        if break_after == BreakAfter::Merge {
            return Ok(hyp);
        }
        self.rank(&mut hyp);
        Ok(hyp)
    }

    /// Aligns with `forward` (e -> f) and adds what `reverse` (f -> e) finds.
    ///
    /// Reverse sequences are seeded and expanded on their own, flipped into
    /// the forward direction and munched into the merged forward hypothesis.
    /// Flipped sequences whose target gaps leave the closeness window are
    /// dropped before munching.
    pub fn make_bidirectional(
        &mut self,
        forward: Arc<Dictionary>,
        reverse: Arc<Dictionary>,
        break_after: BreakAfter,
    ) -> Result<Hypothesis> {
        let mut hyp = self.grow(Arc::clone(&forward), BreakAfter::Never)?;
        merge_sequences(&mut hyp, &self.options);

        let mut back = self.grow(reverse, BreakAfter::Never)?;
        back.reverse(forward)?;
        let opts = &self.options;
        let dropped = back.retain(|seq| seq.is_consistent(opts));
        let taken = hyp.munch(back)?;
        tracing::info!(taken, dropped, "reverse direction merged");

        if break_after == BreakAfter::Never {
            self.rank(&mut hyp);
        }
        Ok(hyp)
    }

    fn rank(&mut self, hyp: &mut Hypothesis) {
        collect_scores(hyp, &mut self.scoring);
        get_topranking(hyp);
        tracing::info!(
            sequences = hyp.len(),
            pairs = hyp.sequences().map(|s| s.len()).sum::<usize>(),
            "alignment done"
        );
    }
}

/// One-shot alignment with the default scorers.
pub fn align(dict: Arc<Dictionary>, options: &AlignOptions) -> Result<Hypothesis> {
    Aligner::new(options.clone()).make(dict, BreakAfter::Never)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::{Text, TextFormat};

    fn dict(len: usize) -> Arc<Dictionary> {
        let words = (0..len).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");
        let e = Arc::new(Text::parse("e", &words, TextFormat::Words));
        let f = Arc::new(Text::parse("f", &words, TextFormat::Words));
        Arc::new(Dictionary::parse(e, f, ""))
    }

    fn slots(hyp: &Hypothesis) -> Vec<Vec<(Position, Position)>> {
        hyp.sequences()
            .map(|s| s.iter().map(|p| (p.slot(), p.target_slot())).collect())
            .collect()
    }

    fn build(hyp: &mut Hypothesis, pairs: &[(Position, Position)], score: Score) -> SeqId {
        let id = hyp.new_sequence(Pair::new(pairs[0].0, pairs[0].1)).unwrap();
        for &(s, t) in &pairs[1..] {
            hyp.add(id, Pair::new(s, t)).unwrap();
        }
        hyp.set_score(id, score);
        id
    }

    #[test]
    fn seeding_takes_first_close_partner_and_claims_both() {
        let opts = AlignOptions::default();
        let mut hyp = Hypothesis::new(dict(20));
        let mut cands = Candidates::from_entries(vec![(1, vec![9, 4, 12]), (2, vec![3, 5, 6, 13])]);
        assert_eq!(initial_sequences(&mut hyp, &mut cands, &opts).unwrap(), 2);
        assert_eq!(slots(&hyp), vec![vec![(1, 4), (2, 5)], vec![(1, 12), (2, 13)]]);
        assert_eq!(cands.get(1), &[9]);
        assert_eq!(cands.get(2), &[3, 6]);
        assert!(hyp.registry_is_consistent());
    }

    #[test]
    fn seeding_respects_skip_budget() {
        let opts = AlignOptions::default();
        // slot 3 is exhausted: one skip is allowed, two are not
        let mut hyp = Hypothesis::new(dict(20));
        let mut cands =
            Candidates::from_entries(vec![(1, vec![5]), (3, vec![]), (4, vec![6])]);
        assert_eq!(initial_sequences(&mut hyp, &mut cands, &opts).unwrap(), 1);
        assert_eq!(slots(&hyp), vec![vec![(1, 5), (4, 6)]]);

        let mut hyp = Hypothesis::new(dict(20));
        let mut cands =
            Candidates::from_entries(vec![(1, vec![5]), (2, vec![]), (3, vec![]), (4, vec![6])]);
        assert_eq!(initial_sequences(&mut hyp, &mut cands, &opts).unwrap(), 0);
        assert_eq!(cands.remaining(), 2);
    }

    #[test]
    fn entries_without_letters_count_against_the_skip_budget() {
        let e = Arc::new(Text::parse("e", "haus 1999 baum", TextFormat::Words));
        let f = Arc::new(Text::parse("f", "house 1999 tree", TextFormat::Words));
        let dict = Arc::new(Dictionary::parse(e, f, "haus = house\n1999 = 1999\nbaum = tree\n"));

        let strict = AlignOptions { max_skip: 0, ..AlignOptions::default() };
        let mut hyp = Hypothesis::new(Arc::clone(&dict));
        let mut cands = Candidates::collect(&dict).unwrap();
        assert_eq!(initial_sequences(&mut hyp, &mut cands, &strict).unwrap(), 0);

        let mut hyp = Hypothesis::new(Arc::clone(&dict));
        let mut cands = Candidates::collect(&dict).unwrap();
        assert_eq!(initial_sequences(&mut hyp, &mut cands, &AlignOptions::default()).unwrap(), 1);
        assert_eq!(slots(&hyp), vec![vec![(0, 0), (2, 2)]]);
    }

    #[test]
    fn bidirectional_drops_reversed_sequences_outside_the_window() {
        let e = Arc::new(Text::parse("e", "a0 a1 a2 a3 a4 haus baum a7", TextFormat::Words));
        let f = Arc::new(Text::parse("f", "b0 b1 house b3 b4 b5 tree b7", TextFormat::Words));
        let forward = Arc::new(Dictionary::parse(
            Arc::clone(&e),
            Arc::clone(&f),
            "haus = house\nbaum = tree\n",
        ));
        let reverse = Arc::new(Dictionary::parse(f, e, "house = haus\ntree = baum\n"));
        let mut aligner = Aligner::new(AlignOptions::default());

        // forward, the targets 2 and 6 are too far apart to seed
        let fwd = aligner.grow(Arc::clone(&forward), BreakAfter::Never).unwrap();
        assert!(fwd.is_empty());
        // reverse, the same pairs seed since only the e side must be close
        let back = aligner.grow(Arc::clone(&reverse), BreakAfter::Never).unwrap();
        assert_eq!(slots(&back), vec![vec![(2, 5), (6, 6)]]);

        // flipped into the forward direction its target gap is 4
        let hyp = aligner.make_bidirectional(forward, reverse, BreakAfter::Merge).unwrap();
        assert!(hyp.is_empty());
    }

    #[test]
    fn expansion_grows_one_slot_per_sweep_until_fixed_point() {
        let opts = AlignOptions::default();
        let mut hyp = Hypothesis::new(dict(20));
        build(&mut hyp, &[(1, 1), (2, 2)], 0.0);
        let mut cands = Candidates::from_entries(vec![
            (3, vec![9, 3]),
            (4, vec![4]),
            (5, vec![5]),
            (9, vec![12]),
        ]);
        assert_eq!(expand_sequences(&mut hyp, &mut cands, &opts).unwrap(), 3);
        assert_eq!(slots(&hyp), vec![vec![(1, 1), (2, 2), (3, 3), (4, 4), (5, 5)]]);
        assert_eq!(cands.get(3), &[9]);
        assert_eq!(cands.get(9), &[12]);
        assert_eq!(expand_sequences(&mut hyp, &mut cands, &opts).unwrap(), 0);
        assert!(hyp.registry_is_consistent());
    }

    #[test]
    fn expansion_after_seeding_claims_leftovers() {
        let opts = AlignOptions::default();
        let mut hyp = Hypothesis::new(dict(20));
        let mut cands = Candidates::from_entries(vec![
            (1, vec![1]),
            (2, vec![2]),
            (3, vec![3, 4]),
            (5, vec![5]),
            (9, vec![12]),
        ]);
        initial_sequences(&mut hyp, &mut cands, &opts).unwrap();
        assert_eq!(slots(&hyp), vec![vec![(1, 1), (2, 2)], vec![(3, 3), (5, 5)]]);
        assert_eq!(expand_sequences(&mut hyp, &mut cands, &opts).unwrap(), 1);
        assert_eq!(slots(&hyp), vec![vec![(1, 1), (2, 2), (3, 4)], vec![(3, 3), (5, 5)]]);
        assert_eq!(cands.remaining(), 1);
    }

    #[test]
    fn merge_fuses_close_neighbours_only() {
        let opts = AlignOptions::default();
        let mut hyp = Hypothesis::new(dict(30));
        build(&mut hyp, &[(1, 1), (2, 2)], 0.0);
        build(&mut hyp, &[(3, 3), (4, 4)], 0.0);
        build(&mut hyp, &[(5, 5), (6, 6)], 0.0);
        build(&mut hyp, &[(12, 20), (13, 21)], 0.0);
        assert_eq!(merge_sequences(&mut hyp, &opts), 2);
        assert_eq!(
            slots(&hyp),
            vec![
                vec![(1, 1), (2, 2), (3, 3), (4, 4), (5, 5), (6, 6)],
                vec![(12, 20), (13, 21)],
            ]
        );
        assert_eq!(merge_sequences(&mut hyp, &opts), 0);
        assert!(hyp.registry_is_consistent());
    }

    #[test]
    fn topranking_keeps_strict_maximum_per_token() {
        let mut hyp = Hypothesis::new(dict(30));
        let short = build(&mut hyp, &[(0, 0), (1, 1)], 0.9);
        let low = build(&mut hyp, &[(2, 2), (3, 3), (4, 4)], 0.4);
        let high = build(&mut hyp, &[(4, 6), (5, 7), (6, 8)], 0.8);
        let alone = build(&mut hyp, &[(20, 20), (21, 21), (22, 22)], 0.1);
        assert_eq!(get_topranking(&mut hyp), 2);
        assert!(!hyp.contains(short));
        assert!(!hyp.contains(low));
        assert!(hyp.contains(high));
        assert!(hyp.contains(alone));
        assert!(hyp.registry_is_consistent());
    }

    #[test]
    fn topranking_ties_eliminate_both() {
        let mut hyp = Hypothesis::new(dict(30));
        build(&mut hyp, &[(0, 0), (1, 1), (2, 2)], 0.5);
        build(&mut hyp, &[(5, 2), (6, 3), (7, 4)], 0.5);
        let alone = build(&mut hyp, &[(10, 10), (11, 11), (12, 12)], 0.1);
        assert_eq!(get_topranking(&mut hyp), 2);
        assert_eq!(hyp.ids(), &[alone]);
    }

    #[test]
    fn scores_are_normalized_means() {
        let mut hyp = Hypothesis::new(dict(10));
        let a = build(&mut hyp, &[(0, 0), (1, 1), (2, 2), (3, 3)], 0.0);
        let b = build(&mut hyp, &[(5, 5), (6, 6)], 0.0);
        let mut methods = ScoringMethods::empty().with(crate::scoring::LengthScorer);
        collect_scores(&mut hyp, &mut methods);
        assert!((hyp.get(a).unwrap().score() - 1.0).abs() < 1e-6);
        assert!((hyp.get(b).unwrap().score() - 0.5).abs() < 1e-6);
    }
}
