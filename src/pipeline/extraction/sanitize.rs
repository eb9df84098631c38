use std::sync::LazyLock;

use regex::Regex;

static OCR_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--- Page \d+ \(OCR\) ---").unwrap());

static BLANK_RUNS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{2,}").unwrap());

/// Prepare assembled text for human labeling.
/// Drops OCR page markers, squeezes blank-line runs to one blank line, trims.
/// `(Text)` markers and failed-page markers are left in place.
pub fn clean_for_annotation(text: &str) -> String {
    let without_markers = OCR_MARKER.replace_all(text, "");
    BLANK_RUNS
        .replace_all(&without_markers, "\n\n")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_ocr_markers() {
        let cleaned = clean_for_annotation("--- Page 1 (OCR) ---\nQUIT CLAIM DEED");
        assert_eq!(cleaned, "QUIT CLAIM DEED");
    }

    #[test]
    fn keeps_text_markers() {
        let input = "--- Page 1 (Text) ---\nWARRANTY DEED\n\n--- Page 2 (OCR) ---\nSigned";
        assert_eq!(
            clean_for_annotation(input),
            "--- Page 1 (Text) ---\nWARRANTY DEED\n\nSigned"
        );
    }

    #[test]
    fn collapses_blank_line_runs() {
        assert_eq!(clean_for_annotation("a\n\n\n\n\nb"), "a\n\nb");
    }

    #[test]
    fn multi_digit_page_numbers() {
        let cleaned = clean_for_annotation("x\n\n--- Page 117 (OCR) ---\ny");
        assert!(!cleaned.contains("Page 117"));
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_for_annotation(""), "");
        assert_eq!(clean_for_annotation("\n\n  \n"), "");
    }
}
