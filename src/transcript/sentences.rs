//! Sentence segmentation and word-level tokenization for English transcripts

use regex::Regex;
use std::sync::OnceLock;

/// Words that end in a period without ending the sentence
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "e.g", "i.e", "inc", "ltd",
    "fig", "approx", "dept", "est", "mt", "a.m", "p.m",
];

fn boundary_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"[.!?…]+["'”’)\]]*\s+"#).expect("sentence boundary pattern is valid")
    })
}

fn token_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\w+(?:['’-]\w+)*|\.\.\.|[^\w\s]").expect("token pattern is valid")
    })
}

/// Split text into sentences.
///
/// Each sentence is trimmed and has internal whitespace collapsed to single
/// spaces, so the same sentence reads identically whether it came from a
/// single caption or from the joined transcript.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut sentence_start = 0;

    for boundary in boundary_pattern().find_iter(text) {
        let candidate = &text[sentence_start..boundary.start()];
        if ends_with_abbreviation(candidate, boundary.as_str()) {
            continue;
        }

        push_sentence(&mut sentences, &text[sentence_start..boundary.end()]);
        sentence_start = boundary.end();
    }

    push_sentence(&mut sentences, &text[sentence_start..]);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, raw: &str) {
    let sentence = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if !sentence.is_empty() {
        sentences.push(sentence);
    }
}

fn ends_with_abbreviation(candidate: &str, boundary: &str) -> bool {
    // Only a lone period can follow an abbreviation or initial
    if !boundary.starts_with('.') || boundary.trim_end().len() != 1 {
        return false;
    }

    let last_word = match candidate.split_whitespace().last() {
        Some(word) => word.trim_start_matches(|c: char| !c.is_alphanumeric()),
        None => return false,
    };

    // a lone "I" is the pronoun, not an initial
    let is_initial = last_word.chars().count() == 1
        && last_word != "I"
        && last_word.chars().all(|c| c.is_uppercase());

    is_initial || ABBREVIATIONS.contains(&last_word.to_lowercase().as_str())
}

/// Word-level tokens: words and standalone punctuation marks
pub fn tokenize(text: &str) -> Vec<&str> {
    token_pattern().find_iter(text).map(|m| m.as_str()).collect()
}

pub fn count_tokens(text: &str) -> usize {
    token_pattern().find_iter(text).count()
}
