pub type Position = usize;
pub type TypeId = u32;

#[cfg(feature = "double-precision")]
pub type Score = f64;
#[cfg(not(feature = "double-precision"))]
pub type Score = f32;

pub const DEFAULT_CLOSENESS: usize = 2;
pub const DEFAULT_MAX_SKIP: usize = 1;

/// Knobs consumed by the alignment phases.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlignOptions {
    /// Largest position gap two consecutive pairs may have.
    pub closeness: usize,
    /// Number of exhausted candidate slots a seed search may step over.
    pub max_skip: usize,
    /// Only monotone alignment is implemented; `false` is accepted and ignored.
    pub monotony: bool,
}

impl Default for AlignOptions {
    fn default() -> Self {
        AlignOptions {
            closeness: DEFAULT_CLOSENESS,
            max_skip: DEFAULT_MAX_SKIP,
            monotony: true,
        }
    }
}

/// Two positions are close if they differ, but by no more than `closeness`.
#[inline]
pub fn close_to(a: Position, b: Position, closeness: usize) -> bool {
    a != b && a.abs_diff(b) <= closeness
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn close_to_excludes_identical_positions() {
        assert!(!close_to(4, 4, 2));
        assert!(close_to(4, 6, 2));
        assert!(close_to(6, 4, 2));
        assert!(!close_to(4, 7, 2));
    }

    #[test]
    fn default_options() {
        let opts = AlignOptions::default();
        assert_eq!(opts.closeness, 2);
        assert_eq!(opts.max_skip, 1);
        assert!(opts.monotony);
    }
}
