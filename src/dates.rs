use std::sync::LazyLock;

use regex::Regex;

static DATE_PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // 07/12/2025, 7/12/25
        r"(?i)^\d{1,2}/\d{1,2}/\d{2,4}$",
        // 7th December 2025, 7th Dec 24
        r"(?i)^\d{1,2}[a-z]{2}\s+[a-z]{3,9}\s+\d{2,4}$",
        // 7 December 2025, 13 Nov 24
        r"(?i)^\d{1,2}\s+[a-z]{3,9}\s+\d{2,4}$",
    ]
    .map(|pattern| Regex::new(pattern).expect("hardcoded date regex is valid"))
});

/// Whether the whole of `text` (after trimming) has a recognised date shape.
#[must_use]
pub fn is_date_like(text: &str) -> bool {
    let text = text.trim();
    DATE_PATTERNS.iter().any(|pattern| pattern.is_match(text))
}
