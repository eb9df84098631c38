use super::types::{PageKind, PageLayout};

/// Native text longer than this (in characters, after trimming) is trusted outright.
pub const MIN_NATIVE_TEXT_CHARS: usize = 30;

/// Decide whether a page carries a usable text layer or must be OCR'd.
///
/// First matching rule wins:
/// 1. trimmed native text longer than `min_chars` → native text
/// 2. at least one non-empty text object → native text
/// 3. an embedded image, or no native text at all → scanned
/// 4. otherwise (short text, no images) → native text
pub fn classify_page(layout: &PageLayout, min_chars: usize) -> PageKind {
    let text = layout.native_text.trim();

    if text.chars().count() > min_chars {
        return PageKind::NativeText;
    }
    if layout.text_blocks > 0 {
        return PageKind::NativeText;
    }
    if layout.image_count > 0 || text.is_empty() {
        return PageKind::Scanned;
    }
    PageKind::NativeText
}
