//! Sentence segmentation and boilerplate filtering.
//!
//! Paragraphs are split with UAX #29 sentence boundaries, then pieces that
//! end in a known abbreviation or an initial are rejoined with what follows.
//! Page-marker lines stand alone so they never glue onto the first sentence
//! of a page. Hard line breaks inside a paragraph are treated as spaces
//! because OCR wraps lines mid-sentence.

use std::sync::LazyLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Sentences containing any of these (case-insensitive) are recording
/// stamps, notary blocks, margin notes or page furniture.
pub const NOISE_MARKERS: &[&str] = &[
    "instr#",
    "page",
    "jk-",
    "seal",
    "notary",
    "commission",
    "my commission expires",
    "prepared by",
    "doc stamps",
    "appraisers",
    "space above this line",
];

/// Abbreviations that never end a sentence in these records.
const LEADING_ABBREVIATIONS: &[&str] = &[
    "Mr", "Mrs", "Ms", "Dr", "Prof", "Rev", "Hon", "St", "Ave", "Blvd", "Rd", "Mt", "Ft",
    "No", "Nos", "Sec", "Twp", "Rng", "Blk", "Jan", "Feb", "Mar", "Apr", "Jun", "Jul",
    "Aug", "Sep", "Sept", "Oct", "Nov", "Dec", "vs", "approx",
];

/// Name and entity suffixes. These can end a sentence, so they only join
/// when the next piece clearly continues it.
const TRAILING_ABBREVIATIONS: &[&str] = &[
    "Inc", "Co", "Corp", "Ltd", "Jr", "Sr", "Esq", "Bros", "Assn", "etc",
];

static PAGE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^--- Page \d+( \((Text|OCR)\))? ---$").unwrap());

/// Split text into trimmed, non-empty sentences in source order.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut paragraph = String::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || PAGE_MARKER.is_match(line) {
            flush_paragraph(&mut paragraph, &mut sentences);
            if !line.is_empty() {
                sentences.push(line.to_string());
            }
            continue;
        }
        if !paragraph.is_empty() {
            paragraph.push(' ');
        }
        paragraph.push_str(line);
    }
    flush_paragraph(&mut paragraph, &mut sentences);

    sentences
}

fn flush_paragraph(paragraph: &mut String, out: &mut Vec<String>) {
    let mut current = String::new();
    for piece in paragraph.unicode_sentences().map(str::trim).filter(|s| !s.is_empty()) {
        if !current.is_empty() {
            if joins_next(&current, piece) {
                current.push(' ');
                current.push_str(piece);
                continue;
            }
            out.push(std::mem::take(&mut current));
        }
        current.push_str(piece);
    }
    if !current.is_empty() {
        out.push(current);
    }
    paragraph.clear();
}

/// Whether the boundary after `current` was a false split.
fn joins_next(current: &str, next: &str) -> bool {
    let Some(word) = last_word(current).strip_suffix('.') else {
        return false;
    };
    if is_initial(word) || matches_any(word, LEADING_ABBREVIATIONS) {
        return true;
    }
    if !is_trailing_abbreviation(word) {
        return false;
    }

    let first = next.split_whitespace().next().unwrap_or("");
    let continues_lowercase = first.chars().next().is_some_and(|c| !c.is_uppercase());
    let chained = first
        .strip_suffix('.')
        .is_some_and(|w| is_trailing_abbreviation(w) || matches_any(w, LEADING_ABBREVIATIONS));
    continues_lowercase || chained
}

fn last_word(text: &str) -> &str {
    text.split_whitespace()
        .next_back()
        .unwrap_or("")
        .trim_start_matches(|c: char| !c.is_alphanumeric())
}

/// A single capital letter, as in "John Q. Public".
fn is_initial(word: &str) -> bool {
    let mut chars = word.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_uppercase())
}

fn matches_any(word: &str, list: &[&str]) -> bool {
    list.iter().any(|abbr| word.eq_ignore_ascii_case(abbr))
}

/// Suffix words plus dotted forms such as "N.A" or "U.S".
fn is_trailing_abbreviation(word: &str) -> bool {
    matches_any(word, TRAILING_ABBREVIATIONS)
        || (word.contains('.')
            && word
                .split('.')
                .all(|part| (1..=2).contains(&part.len()) && part.chars().all(char::is_alphabetic)))
}

pub fn is_noise(sentence: &str) -> bool {
    let lower = sentence.to_lowercase();
    NOISE_MARKERS.iter().any(|marker| lower.contains(marker))
}

/// Candidate sentences for entity matching: segmented, noise dropped.
pub fn clean_sentences(text: &str) -> Vec<String> {
    split_sentences(text)
        .into_iter()
        .filter(|s| !is_noise(s))
        .collect()
}
