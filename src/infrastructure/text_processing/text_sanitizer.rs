use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static BROKEN_WORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<head>\w)[-\u{00AD}][ \t]*\n[ \t]*(?P<tail>\w)").expect("broken-word pattern")
});

/// Running headers and footers such as `12`, `- 12 -` or `Page 3 of 40`.
static PAGE_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:page\s+)?-?\s*\d{1,4}\s*-?(?:\s+of\s+\d{1,4})?$")
        .expect("page-marker pattern")
});

/// Cleans text pulled out of a guideline PDF before it is chunked.
///
/// Folds ligatures with NFKC and rejoins words hyphenated across lines.
/// Blank-line runs become one paragraph break.
pub fn sanitize_extracted_text(raw: &str) -> String {
    let normalized: String = raw
        .nfkc()
        .filter(|c| !c.is_control() || matches!(c, '\n' | '\t'))
        .collect();
    let joined = BROKEN_WORD.replace_all(&normalized, "$head$tail");

    let mut paragraphs: Vec<String> = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in joined.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
            continue;
        }
        if PAGE_MARKER.is_match(line) {
            continue;
        }
        current.push(line.split_whitespace().collect::<Vec<_>>().join(" "));
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs.join("\n\n")
}
