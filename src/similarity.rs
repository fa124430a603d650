//! Word similarity used by `text_similar`.
//!
//! The scoring backend is pluggable through [`SimilarityService`]; a vector
//! model can be wired in by the caller. [`LexicalSimilarity`] is the built-in
//! scorer: token-set overlap on the cleaned surface forms and on crude lemma
//! forms, taking the larger of the two.

use std::collections::BTreeSet;

/// Words that carry no meaning when matching UI labels to bug reports.
const STOP_WORDS: &[&str] = &["the", "a", "an", "in", "on", "at", "to", "with", "button", "of", "or"];

/// Scores how similar two pieces of text are, in `[0, 1]`.
pub trait SimilarityService {
    fn similarity(&self, a: &str, b: &str) -> f64;
}

/// Lower-case, drop quotes, spell out `+`, split glued `menuview` and remove
/// stop words. Tokens are joined by single spaces.
pub fn clean_text(text: &str) -> String {
    let lowered =
        text.to_lowercase().replace(['"', '\'', '`'], "").replace('+', " add ").replace("menuview", "menu view");
    lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty() && !STOP_WORDS.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip a plural ending, then a verb ending: `settings` → `sett`,
/// `categories` → `category`, `saved` → `sav`.
pub fn lemma(word: &str) -> String {
    let mut stem = word;
    if stem.len() > 4 && stem.ends_with("ies") {
        return format!("{}y", &stem[..stem.len() - 3]);
    }
    if stem.len() > 4 && ["ses", "xes", "zes", "ches", "shes"].iter().any(|s| stem.ends_with(s)) {
        stem = &stem[..stem.len() - 2];
    } else if stem.len() > 3 && stem.ends_with('s') && !stem.ends_with("ss") {
        stem = &stem[..stem.len() - 1];
    }
    if stem.len() > 5 && stem.ends_with("ing") {
        stem = &stem[..stem.len() - 3];
    } else if stem.len() > 4 && stem.ends_with("ed") {
        stem = &stem[..stem.len() - 2];
    }
    stem.to_string()
}

fn overlap(a: &BTreeSet<String>, b: &BTreeSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(b).count() as f64;
    shared / ((a.len() * b.len()) as f64).sqrt()
}

/// Cosine overlap of token sets, surface or lemma form, whichever is higher.
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalSimilarity;

impl SimilarityService for LexicalSimilarity {
    fn similarity(&self, a: &str, b: &str) -> f64 {
        let (a, b) = (clean_text(a), clean_text(b));
        if a.is_empty() || b.is_empty() {
            return 0.0;
        }
        if a == b {
            return 1.0;
        }
        let surface = |s: &str| s.split(' ').map(str::to_string).collect::<BTreeSet<_>>();
        let lemmas = |s: &str| s.split(' ').map(lemma).collect::<BTreeSet<_>>();
        let by_surface = overlap(&surface(&a), &surface(&b));
        let by_lemma = overlap(&lemmas(&a), &lemmas(&b));
        by_surface.max(by_lemma)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cleaning() {
        assert_eq!(clean_text("Tap the \"Save\" button"), "tap save");
        assert_eq!(clean_text("+ Note"), "add note");
        assert_eq!(clean_text("MenuView"), "menu view");
        assert_eq!(clean_text("the a an"), "");
    }

    #[test]
    fn lemmas() {
        assert_eq!(lemma("settings"), "sett");
        assert_eq!(lemma("setting"), "sett");
        assert_eq!(lemma("categories"), "category");
        assert_eq!(lemma("boxes"), "box");
        assert_eq!(lemma("address"), "address");
        assert_eq!(lemma("saved"), "sav");
        assert_eq!(lemma("bus"), "bus");
    }

    #[test]
    fn scores() {
        let s = LexicalSimilarity;
        assert_eq!(s.similarity("Save", "save"), 1.0);
        assert_eq!(s.similarity("+ note", "Add note"), 1.0);
        assert_eq!(s.similarity("Settings", "setting"), 1.0);
        assert_eq!(s.similarity("", "save"), 0.0);
        assert_eq!(s.similarity("the", "the"), 0.0);
        assert_eq!(s.similarity("save", "delete"), 0.0);
        let partial = s.similarity("save draft", "save");
        assert!((partial - 1.0 / 2f64.sqrt()).abs() < 1e-9);
    }
}
