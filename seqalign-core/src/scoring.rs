//! Scoring methods for sequences.
//!
//! A [`Scorer`] computes a raw score for one sequence. [`ScoringMethods`]
//! wraps every registered scorer with the running maximum of its raw scores,
//! which is the divisor used for normalization. Maxima only ever grow, so a
//! score is only meaningful once every sequence of a run has been seen.

use crate::bisim::bi_sim;
use crate::dictionary::Dictionary;
use crate::sequence::Sequence;
use crate::types::*;

pub trait Scorer {
    fn name(&self) -> &'static str;
    fn raw_score(&self, seq: &Sequence, dict: &Dictionary) -> Score;
}

/// Favors long sequences.
#[derive(Clone, Copy, Debug, Default)]
pub struct LengthScorer;

impl Scorer for LengthScorer {
    fn name(&self) -> &'static str { "length" }
    fn raw_score(&self, seq: &Sequence, _dict: &Dictionary) -> Score {
        seq.len() as Score
    }
}

/// Favors sequences whose relative positions in both texts agree.
#[derive(Clone, Copy, Debug, Default)]
pub struct IndexDiffScorer;

impl Scorer for IndexDiffScorer {
    fn name(&self) -> &'static str { "i-diff" }
    fn raw_score(&self, seq: &Sequence, dict: &Dictionary) -> Score {
        let s_len = dict.source().len() as Score;
        let t_len = dict.target().len() as Score;
        let diff: Score = seq
            .iter()
            .map(|p| (p.slot() as Score / s_len - p.target_slot() as Score / t_len).abs())
            .sum();
        1.0 - diff / seq.len() as Score
    }
}

/// Favors cognate-like pairs.
#[derive(Clone, Copy, Debug, Default)]
pub struct BisimScorer;

impl Scorer for BisimScorer {
    fn name(&self) -> &'static str { "bi_sim" }
    fn raw_score(&self, seq: &Sequence, dict: &Dictionary) -> Score {
        let (source, target) = (dict.source(), dict.target());
        let total: f64 = seq
            .iter()
            .map(|p| bi_sim(source.str_at(p.slot()), target.str_at(p.target_slot())))
            .sum();
        (total / seq.len() as f64) as Score
    }
}

struct Method {
    scorer: Box<dyn Scorer>,
    max: Score,
}

/// The registered scorers and the maximum each one has produced so far.
pub struct ScoringMethods {
    methods: Vec<Method>,
}

impl Default for ScoringMethods {
    fn default() -> Self {
        ScoringMethods::empty()
            .with(LengthScorer)
            .with(IndexDiffScorer)
            .with(BisimScorer)
    }
}

impl ScoringMethods {
    pub fn empty() -> Self {
        ScoringMethods { methods: Vec::new() }
    }

    pub fn with(mut self, scorer: impl Scorer + 'static) -> Self {
        self.methods.push(Method { scorer: Box::new(scorer), max: 0.0 });
        self
    }

    #[inline] pub fn len(&self) -> usize { self.methods.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.methods.is_empty() }

    pub fn names(&self) -> Vec<&'static str> {
        self.methods.iter().map(|m| m.scorer.name()).collect()
    }

    /// Largest raw score seen so far, per method.
    pub fn maxima(&self) -> Vec<Score> {
        self.methods.iter().map(|m| m.max).collect()
    }

    /// Raw scores of `seq` for every method, updating the maxima.
    pub fn raw_scores(&mut self, seq: &Sequence, dict: &Dictionary) -> Vec<Score> {
        self.methods
            .iter_mut()
            .map(|m| {
                let raw = m.scorer.raw_score(seq, dict);
                if raw > m.max {
                    m.max = raw;
                }
                raw
            })
            .collect()
    }

    /// Mean of the raw scores divided by their method's maximum.
    pub fn combine(&self, raw: &[Score]) -> Score {
        if self.methods.is_empty() {
            return 0.0;
        }
        let sum: Score = self
            .methods
            .iter()
            .zip(raw)
            .map(|(m, &r)| if m.max > 0.0 { r / m.max } else { 0.0 })
            .sum();
        sum / self.methods.len() as Score
    }
}

impl core::fmt::Debug for ScoringMethods {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map()
            .entries(self.methods.iter().map(|m| (m.scorer.name(), m.max)))
            .finish()
    }
}
