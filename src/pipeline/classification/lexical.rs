use serde::Serialize;

use super::keywords::DOCUMENT_KEYWORDS;
use crate::models::enums::DocumentType;

/// Keyword scores for all five categories plus the argmax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LexicalOutcome {
    /// Phrase-hit count per category, in table order.
    pub scores: Vec<(DocumentType, usize)>,
    /// First category holding the highest score. Never `Unknown`.
    pub best: DocumentType,
    /// False when the top score is zero or shared by two categories.
    pub conclusive: bool,
}

impl LexicalOutcome {
    pub fn score_of(&self, doc_type: DocumentType) -> usize {
        self.scores
            .iter()
            .find(|(t, _)| *t == doc_type)
            .map(|(_, s)| *s)
            .unwrap_or(0)
    }
}

/// Count how many of each category's phrases occur in the text.
///
/// Matching is plain substring search on the lowercased text, so "lien"
/// also hits inside "client". Each phrase counts at most once.
pub fn score_keywords(text: &str) -> LexicalOutcome {
    let lower = text.to_lowercase();

    let scores: Vec<(DocumentType, usize)> = DOCUMENT_KEYWORDS
        .iter()
        .map(|(doc_type, keywords)| {
            let hits = keywords.iter().filter(|kw| lower.contains(*kw)).count();
            (*doc_type, hits)
        })
        .collect();

    let mut best = (DocumentType::Deed, 0usize);
    for (i, &(doc_type, score)) in scores.iter().enumerate() {
        if i == 0 || score > best.1 {
            best = (doc_type, score);
        }
    }

    let mut sorted: Vec<usize> = scores.iter().map(|(_, s)| *s).collect();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    let conclusive = sorted[0] > 0 && sorted.get(1).map_or(true, |second| *second != sorted[0]);

    LexicalOutcome {
        scores,
        best: best.0,
        conclusive,
    }
}
