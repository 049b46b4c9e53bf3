use std::fs;
use std::path::{Path, PathBuf};

use hashbrown::HashMap;

use crate::errors::{AlignError, Result};
use crate::hypothesis::Hypothesis;
use crate::types::*;

/// How a text file is split into tokens.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextFormat {
    /// One token per line.
    #[default]
    Lines,
    /// Whitespace separated tokens.
    Words,
}

/// All occurrences of one lower-cased string within a text.
#[derive(Clone, Debug)]
pub struct WordType {
    string: String,
    positions: Vec<Position>,
}

impl WordType {
    #[inline] pub fn as_str(&self) -> &str { &self.string }
    #[inline] pub fn positions(&self) -> &[Position] { &self.positions }
    #[inline] pub fn frequency(&self) -> usize { self.positions.len() }
}

#[derive(Clone, Debug)]
pub struct Text {
    name: String,
    path: Option<PathBuf>,
    tokens: Vec<TypeId>,
    types: Vec<WordType>,
    index: HashMap<String, TypeId>,
}

impl Text {
    pub fn parse(name: impl Into<String>, content: &str, format: TextFormat) -> Text {
        let mut text = Text {
            name: name.into(),
            path: None,
            tokens: Vec::new(),
            types: Vec::new(),
            index: HashMap::new(),
        };
        match format {
            TextFormat::Lines => content.lines().for_each(|l| text.push(l.trim())),
            TextFormat::Words => content.split_whitespace().for_each(|w| text.push(w)),
        }
        text
    }

    pub fn open(path: &Path, format: TextFormat) -> Result<Text> {
        let content = fs::read_to_string(path).map_err(|source| AlignError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut text = Text::parse(basename(path), &content, format);
        text.path = Some(path.to_path_buf());
        tracing::debug!(text = %text.name, tokens = text.len(), types = text.types.len(), "text loaded");
        Ok(text)
    }

    fn push(&mut self, raw: &str) {
        let lower = raw.to_lowercase();
        let position = self.tokens.len();
        let id = match self.index.get(&lower) {
            Some(&id) => id,
            None => {
                let id = self.types.len() as TypeId;
                self.types.push(WordType { string: lower.clone(), positions: Vec::new() });
                self.index.insert(lower, id);
                id
            }
        };
        self.types[id as usize].positions.push(position);
        self.tokens.push(id);
    }

    /// File name without directories; dictionaries are indexed by it.
    #[inline] pub fn name(&self) -> &str { &self.name }
    #[inline] pub fn path(&self) -> Option<&Path> { self.path.as_deref() }
    #[inline] pub fn len(&self) -> usize { self.tokens.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.tokens.is_empty() }

    /// Range checked token access.
    pub fn at(&self, position: Position) -> Result<TokenRef<'_>> {
        match self.tokens.get(position) {
            Some(&type_id) => Ok(TokenRef { text: self, position, type_id }),
            None => Err(AlignError::OutOfRange { position, length: self.len() }),
        }
    }

    pub fn tokens(&self) -> impl Iterator<Item = TokenRef<'_>> + '_ {
        self.tokens
            .iter()
            .enumerate()
            .map(move |(position, &type_id)| TokenRef { text: self, position, type_id })
    }

    /// String of the token at `position`. Callers hold positions taken from this text.
    #[inline]
    pub(crate) fn str_at(&self, position: Position) -> &str {
        self.types[self.tokens[position] as usize].as_str()
    }

    #[inline] pub fn word_type(&self, id: TypeId) -> &WordType { &self.types[id as usize] }

    pub fn type_of(&self, string: &str) -> Option<TypeId> {
        self.index.get(string).copied()
    }
}

/// A token viewed through the text it belongs to.
#[derive(Clone, Copy, Debug)]
pub struct TokenRef<'t> {
    text: &'t Text,
    position: Position,
    type_id: TypeId,
}

impl<'t> TokenRef<'t> {
    #[inline] pub fn text(&self) -> &'t Text { self.text }
    #[inline] pub fn position(&self) -> Position { self.position }
    #[inline] pub fn type_id(&self) -> TypeId { self.type_id }
    #[inline] pub fn as_str(&self) -> &'t str { self.text.word_type(self.type_id).as_str() }
}

impl PartialEq for TokenRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.text, other.text)
            && self.type_id == other.type_id
            && self.position == other.position
    }
}
impl Eq for TokenRef<'_> {}

pub fn has_alpha(s: &str) -> bool {
    s.chars().any(char::is_alphabetic)
}

pub(crate) fn basename(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

// One sequence per line: score, then (position,string)-(position,string) pairs.
pub fn write_sequences(hypothesis: &Hypothesis) -> String {
    let source = hypothesis.dictionary().source();
    let target = hypothesis.dictionary().target();
    let mut out = String::new();
    for seq in hypothesis.sequences() {
        let pairs: Vec<String> = seq
            .iter()
            .map(|pair| {
                format!(
                    "({},{})-({},{})",
                    pair.slot(),
                    source.str_at(pair.slot()),
                    pair.target_slot(),
                    target.str_at(pair.target_slot())
                )
            })
            .collect();
        out.push_str(&format!("{:.4}\t{}\n", seq.score(), pairs.join(" ")));
    }
    out
}
