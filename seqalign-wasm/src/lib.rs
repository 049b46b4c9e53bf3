use std::sync::Arc;

use seqalign_core::{
    write_sequences, AlignOptions, Aligner, BreakAfter, Dictionary, Hypothesis, Text, TextFormat,
};
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
pub struct AlignOutput {
    sequences: String,
    count: usize,
    pairs: usize,
}

#[wasm_bindgen]
impl AlignOutput {
    #[wasm_bindgen(getter)]
    pub fn sequences(&self) -> String {
        self.sequences.clone()
    }
    #[wasm_bindgen(getter)]
    pub fn count(&self) -> usize {
        self.count
    }
    #[wasm_bindgen(getter)]
    pub fn pairs(&self) -> usize {
        self.pairs
    }
}

impl From<&Hypothesis> for AlignOutput {
    fn from(hyp: &Hypothesis) -> Self {
        AlignOutput {
            sequences: write_sequences(hyp),
            count: hyp.len(),
            pairs: hyp.sequences().map(|s| s.len()).sum(),
        }
    }
}

fn texts(source_text: &str, target_text: &str, words: bool) -> (Arc<Text>, Arc<Text>) {
    let format = if words { TextFormat::Words } else { TextFormat::Lines };
    (
        Arc::new(Text::parse("source", source_text, format)),
        Arc::new(Text::parse("target", target_text, format)),
    )
}

fn options(closeness: usize, max_skip: usize) -> AlignOptions {
    AlignOptions { closeness, max_skip, ..AlignOptions::default() }
}

/// Aligns `source_text` to `target_text` with a `source = target` dictionary.
#[wasm_bindgen]
pub fn align_texts(
    source_text: &str,
    target_text: &str,
    dictionary: &str,
    closeness: usize,
    max_skip: usize,
    words: bool,
) -> Result<AlignOutput, JsValue> {
    let (source, target) = texts(source_text, target_text, words);
    let dict = Arc::new(Dictionary::parse(source, target, dictionary));
    let hyp = Aligner::new(options(closeness, max_skip))
        .make(dict, BreakAfter::Never)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(AlignOutput::from(&hyp))
}

/// Like [`align_texts`], also merging what `reverse_dictionary`
/// (`target = source` lines) finds.
#[wasm_bindgen]
pub fn align_bidirectional(
    source_text: &str,
    target_text: &str,
    forward_dictionary: &str,
    reverse_dictionary: &str,
    closeness: usize,
    max_skip: usize,
    words: bool,
) -> Result<AlignOutput, JsValue> {
    let (source, target) = texts(source_text, target_text, words);
    let forward = Arc::new(Dictionary::parse(Arc::clone(&source), Arc::clone(&target), forward_dictionary));
    let reverse = Arc::new(Dictionary::parse(target, source, reverse_dictionary));
    let hyp = Aligner::new(options(closeness, max_skip))
        .make_bidirectional(forward, reverse, BreakAfter::Never)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    Ok(AlignOutput::from(&hyp))
}
