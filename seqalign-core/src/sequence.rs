use crate::types::*;

/// An aligned (source position, target position) correspondence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pair {
    source: Position,
    target: Position,
}

impl Pair {
    #[inline] pub fn new(source: Position, target: Position) -> Self { Pair { source, target } }
    #[inline] pub fn slot(&self) -> Position { self.source }
    #[inline] pub fn target_slot(&self) -> Position { self.target }
    #[inline] pub fn reversed(self) -> Pair { Pair { source: self.target, target: self.source } }

    /// `other` may follow `self` in a sequence: both positions strictly
    /// increase and the target gap stays within the closeness window.
    #[inline]
    pub fn targets_close(&self, other: &Pair, opts: &AlignOptions) -> bool {
        self.source < other.source
            && self.target < other.target
            && other.target - self.target <= opts.closeness
    }

    /// Like [`Pair::targets_close`], with the source gap bounded as well.
    #[inline]
    pub fn both_close(&self, other: &Pair, opts: &AlignOptions) -> bool {
        self.targets_close(other, opts) && other.source - self.source <= opts.closeness
    }
}

/// A monotone chain of pairs; never empty.
///
/// Sequences are only created, grown and merged through
/// [`Hypothesis`](crate::hypothesis::Hypothesis), which keeps the token
/// registry in step with their pairs.
#[derive(Clone, Debug)]
pub struct Sequence {
    pairs: Vec<Pair>,
    score: Score,
}

impl Sequence {
    pub(crate) fn new(first: Pair) -> Self {
        Sequence { pairs: vec![first], score: 0.0 }
    }

    /// Source position of the first pair.
    #[inline] pub fn slot(&self) -> Position { self.first_pair().slot() }
    /// Source position of the last pair.
    #[inline] pub fn back_slot(&self) -> Position { self.last_pair().slot() }
    #[inline] pub fn len(&self) -> usize { self.pairs.len() }
    #[inline] pub fn score(&self) -> Score { self.score }
    #[inline] pub(crate) fn set_score(&mut self, score: Score) { self.score = score; }

    #[inline] pub fn first_pair(&self) -> &Pair { &self.pairs[0] }
    #[inline] pub fn last_pair(&self) -> &Pair { &self.pairs[self.pairs.len() - 1] }
    #[inline] pub fn pairs(&self) -> &[Pair] { &self.pairs }
    #[inline] pub fn iter(&self) -> core::slice::Iter<'_, Pair> { self.pairs.iter() }

    pub fn has_target(&self, target: Position) -> bool {
        self.pairs.iter().any(|p| p.target_slot() == target)
    }

    /// Whether `pair` may be appended under the closeness rules.
    pub fn accepts(&self, pair: &Pair, opts: &AlignOptions) -> bool {
        self.last_pair().targets_close(pair, opts) && !self.has_target(pair.target_slot())
    }

    /// Every consecutive pair satisfies [`Pair::targets_close`].
    pub fn is_consistent(&self, opts: &AlignOptions) -> bool {
        self.pairs.windows(2).all(|w| w[0].targets_close(&w[1], opts))
    }

    #[inline] pub(crate) fn push(&mut self, pair: Pair) { self.pairs.push(pair); }

    pub(crate) fn append(&mut self, other: Sequence) {
        self.pairs.extend(other.pairs);
    }

    pub(crate) fn reverse(&mut self) {
        for pair in self.pairs.iter_mut() {
            *pair = pair.reversed();
        }
    }
}

impl PartialEq for Sequence {
    fn eq(&self, other: &Self) -> bool {
        self.pairs == other.pairs
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Pair;
    type IntoIter = core::slice::Iter<'a, Pair>;
    fn into_iter(self) -> Self::IntoIter { self.pairs.iter() }
}
