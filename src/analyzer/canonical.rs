//! NFKC + lowercase + whitespace-collapse canonicalization (§4.2 step 3).

use unicode_normalization::UnicodeNormalization;

/// Canonicalizes a fragment of ingredient note text: NFKC-normalizes,
/// lowercases, and collapses runs of whitespace to a single space, trimming
/// the ends.
#[must_use]
pub fn canonicalize(text: &str) -> String {
    let normalized: String = text.nfkc().collect();
    let lowered = normalized.to_lowercase();
    lowered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_collapses_whitespace() {
        assert_eq!(canonicalize("  a   knob  of\tbutter  "), "a knob of butter");
    }

    #[test]
    fn test_canonicalize_lowercases() {
        assert_eq!(canonicalize("Tablespoon"), "tablespoon");
    }

    #[test]
    fn test_canonicalize_empty_input() {
        assert_eq!(canonicalize("   "), "");
    }

    #[test]
    fn test_canonicalize_normalizes_compatibility_forms() {
        // U+FB01 LATIN SMALL LIGATURE FI normalizes to "fi" under NFKC.
        assert_eq!(canonicalize("\u{FB01}sh"), "fish");
    }
}
