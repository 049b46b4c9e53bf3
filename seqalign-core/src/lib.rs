pub mod types;
pub mod errors;
pub mod text;
pub mod dictionary;
pub mod bisim;
pub mod sequence;
pub mod hypothesis;
pub mod candidates;
pub mod scoring;
pub mod alignment;

pub use alignment::{align, Aligner, BreakAfter};
pub use candidates::Candidates;
pub use dictionary::{Dictionary, DictionaryFactory};
pub use errors::{AlignError, Result};
pub use hypothesis::{Hypothesis, SeqId};
pub use scoring::{Scorer, ScoringMethods};
pub use sequence::{Pair, Sequence};
pub use text::{write_sequences, Text, TextFormat};
pub use types::AlignOptions;
