//! Directional bilingual dictionaries over a pair of texts.
//!
//! A [`Dictionary`] built for (e, f) maps types of the source text e to types
//! of the target text f. It is not interchangeable with the (f, e) dictionary.
//! [`DictionaryFactory`] locates dictionary files through an `INDEX` file in a
//! base directory and caches both texts and dictionaries, so that the forward
//! and reverse dictionary of a text pair share the same [`Text`] instances.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hashbrown::HashMap;

use crate::errors::{AlignError, Result};
use crate::text::{basename, has_alpha, Text, TextFormat, TokenRef};
use crate::types::*;

pub const INDEX_FILE: &str = "INDEX";
const COMMENT: &str = "###";
const SEPARATOR: &str = " = ";

#[derive(Debug)]
pub struct Dictionary {
    source: Arc<Text>,
    target: Arc<Text>,
    entries: HashMap<TypeId, Vec<TypeId>>,
}

impl Dictionary {
    /// Reads `source = target` lines. Entries whose words don't occur in the
    /// texts are dropped.
    pub fn parse(source: Arc<Text>, target: Arc<Text>, content: &str) -> Dictionary {
        let mut entries: HashMap<TypeId, Vec<TypeId>> = HashMap::new();
        for line in content.lines() {
            if line.starts_with(COMMENT) { continue; }
            let Some((sword, tword)) = line.split_once(SEPARATOR) else { continue };
            let sword = sword.trim().to_lowercase();
            let tword = tword.trim().to_lowercase();
            let (Some(st), Some(tt)) = (source.type_of(&sword), target.type_of(&tword)) else {
                continue;
            };
            let translations = entries.entry(st).or_default();
            if !translations.contains(&tt) {
                translations.push(tt);
            }
        }
        Dictionary { source, target, entries }
    }

    pub fn open(source: Arc<Text>, target: Arc<Text>, path: &Path) -> Result<Dictionary> {
        let content = fs::read_to_string(path).map_err(|err| AlignError::Io {
            path: path.to_path_buf(),
            source: err,
        })?;
        let dict = Dictionary::parse(source, target, &content);
        tracing::debug!(
            file = %path.display(),
            source = %dict.source.name(),
            target = %dict.target.name(),
            entries = dict.entries.len(),
            "dictionary loaded"
        );
        Ok(dict)
    }

    #[inline] pub fn source(&self) -> &Arc<Text> { &self.source }
    #[inline] pub fn target(&self) -> &Arc<Text> { &self.target }
    #[inline] pub fn len(&self) -> usize { self.entries.len() }
    #[inline] pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    fn check_text(&self, token: &TokenRef<'_>) -> Result<()> {
        if core::ptr::eq(token.text(), Arc::as_ptr(&self.source)) {
            Ok(())
        } else {
            Err(AlignError::TextMismatch {
                token: token.as_str().to_string(),
                expected: self.source.name().to_string(),
            })
        }
    }

    pub fn has(&self, token: TokenRef<'_>) -> Result<bool> {
        self.check_text(&token)?;
        Ok(self.entries.contains_key(&token.type_id()))
    }

    /// Target types translating `token`; empty for tokens without letters.
    pub fn lookup(&self, token: TokenRef<'_>) -> Result<&[TypeId]> {
        self.check_text(&token)?;
        if !has_alpha(token.as_str()) {
            return Ok(&[]);
        }
        Ok(self.entries.get(&token.type_id()).map(Vec::as_slice).unwrap_or(&[]))
    }

    /// True if `other` is the (f, e) dictionary for this (e, f) dictionary.
    pub fn is_reverse_of(&self, other: &Dictionary) -> bool {
        Arc::ptr_eq(&self.source, &other.target) && Arc::ptr_eq(&self.target, &other.source)
    }
}

/// Loads and caches texts and the dictionaries between them.
#[derive(Debug)]
pub struct DictionaryFactory {
    base: PathBuf,
    format: TextFormat,
    texts: HashMap<PathBuf, Arc<Text>>,
    dictionaries: HashMap<(String, String), Arc<Dictionary>>,
}

impl DictionaryFactory {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        DictionaryFactory {
            base: base.into(),
            format: TextFormat::default(),
            texts: HashMap::new(),
            dictionaries: HashMap::new(),
        }
    }

    pub fn with_format(mut self, format: TextFormat) -> Self {
        self.format = format;
        self
    }

    pub fn get_text(&mut self, path: &Path) -> Result<Arc<Text>> {
        if let Some(text) = self.texts.get(path) {
            return Ok(Arc::clone(text));
        }
        let text = Arc::new(Text::open(path, self.format)?);
        self.texts.insert(path.to_path_buf(), Arc::clone(&text));
        Ok(text)
    }

    /// The dictionary translating text `e` into text `f`.
    pub fn get_dictionary(&mut self, e: &Path, f: &Path) -> Result<Arc<Dictionary>> {
        let key = (basename(e), basename(f));
        if let Some(dict) = self.dictionaries.get(&key) {
            return Ok(Arc::clone(dict));
        }
        let file = self.locate(&key.0, &key.1)?;
        let source = self.get_text(e)?;
        let target = self.get_text(f)?;
        let dict = Arc::new(Dictionary::open(source, target, &file)?);
        self.dictionaries.insert(key, Arc::clone(&dict));
        Ok(dict)
    }

    /// The (f, e) dictionary mirroring `dict`. Both texts must have been
    /// loaded from files.
    pub fn get_reverse(&mut self, dict: &Dictionary) -> Result<Arc<Dictionary>> {
        match (dict.target().path(), dict.source().path()) {
            (Some(f), Some(e)) => self.get_dictionary(f, e),
            _ => Err(AlignError::DictionaryMismatch(format!(
                "{} -> {} has no files to reverse",
                dict.source().name(),
                dict.target().name()
            ))),
        }
    }

    // The first index line naming e before f holds the file name before its ':'.
    fn locate(&self, e_name: &str, f_name: &str) -> Result<PathBuf> {
        let index = self.base.join(INDEX_FILE);
        let content =
            fs::read_to_string(&index).map_err(|_| AlignError::IndexNotFound(index.clone()))?;
        for line in content.lines() {
            let (Some(e_pos), Some(f_pos)) = (line.find(e_name), line.find(f_name)) else {
                continue;
            };
            if e_pos < f_pos {
                let file = line.split(':').next().unwrap_or(line).trim();
                return Ok(self.base.join(file));
            }
        }
        Err(AlignError::DictionaryNotFound {
            source_name: e_name.to_string(),
            target_name: f_name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts() -> (Arc<Text>, Arc<Text>) {
        let e = Text::parse("e.txt", "das\nhaus\nist\n1999\nhaus", TextFormat::Lines);
        let f = Text::parse("f.txt", "the\nhouse\nis\nhome\n1999", TextFormat::Lines);
        (Arc::new(e), Arc::new(f))
    }

    #[test]
    fn parse_skips_comments_unknown_words_and_duplicates() {
        let (e, f) = texts();
        let dict = Dictionary::parse(
            Arc::clone(&e),
            Arc::clone(&f),
            "### comment = ignored\nHaus = house\nhaus = home\nhaus = house\nbaum = tree\nist=is\n1999 = 1999\n",
        );
        // "baum" is not in e, "ist=is" lacks the separator
        assert_eq!(dict.len(), 2);
        let haus = e.at(1).unwrap();
        let found: Vec<&str> = dict
            .lookup(haus)
            .unwrap()
            .iter()
            .map(|&t| f.word_type(t).as_str())
            .collect();
        assert_eq!(found, vec!["house", "home"]);
        assert!(!dict.has(e.at(2).unwrap()).unwrap());
    }

    #[test]
    fn lookup_ignores_tokens_without_letters() {
        let (e, f) = texts();
        let dict = Dictionary::parse(Arc::clone(&e), f, "1999 = 1999\n");
        let year = e.at(3).unwrap();
        assert!(dict.has(year).unwrap());
        assert!(dict.lookup(year).unwrap().is_empty());
    }

    #[test]
    fn lookup_rejects_tokens_of_other_texts() {
        let (e, f) = texts();
        let dict = Dictionary::parse(e, Arc::clone(&f), "haus = house\n");
        let err = dict.lookup(f.at(1).unwrap()).unwrap_err();
        assert!(matches!(err, AlignError::TextMismatch { .. }));
        assert!(dict.has(f.at(1).unwrap()).is_err());
    }

    #[test]
    fn reverse_dictionaries_share_texts() {
        let (e, f) = texts();
        let fwd = Dictionary::parse(Arc::clone(&e), Arc::clone(&f), "haus = house\n");
        let rev = Dictionary::parse(Arc::clone(&f), Arc::clone(&e), "house = haus\n");
        assert!(fwd.is_reverse_of(&rev));
        assert!(rev.is_reverse_of(&fwd));
        assert!(!fwd.is_reverse_of(&fwd));
    }

    #[test]
    fn missing_index_is_reported() {
        let mut factory = DictionaryFactory::new("/nonexistent/seqalign");
        let err = factory
            .get_dictionary(Path::new("e.txt"), Path::new("f.txt"))
            .unwrap_err();
        assert!(matches!(err, AlignError::IndexNotFound(_)));
    }
}
