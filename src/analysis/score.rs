//! Score extraction from the finished report.

use regex::Regex;
use std::sync::LazyLock;

static SCORE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"([0-9]{1,3})/100").unwrap());

/// First `NN/100` in `text`, ASCII digits only. Multi-candidate reports may
/// carry several scores; only the first one is taken.
pub fn extract_score(text: &str) -> Option<u32> {
    SCORE_RE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_score() {
        assert_eq!(extract_score("## Verdict\nFinal Score: 82/100\nHire."), Some(82));
    }

    #[test]
    fn test_no_score() {
        assert_eq!(extract_score("No numeric verdict was given."), None);
        assert_eq!(extract_score("score: /100"), None);
        assert_eq!(extract_score(""), None);
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(extract_score("9/100 and later 85/100"), Some(9));
    }

    #[test]
    fn test_non_ascii_digits_are_skipped() {
        assert_eq!(extract_score("Rating \u{0668}/100, Final Score: 85/100"), Some(85));
        assert_eq!(extract_score("\u{0668}\u{0665}/100"), None);
    }

    #[test]
    fn test_digit_window() {
        // Only the last three digits before the slash are captured.
        assert_eq!(extract_score("Score 1234/100"), Some(234));
        assert_eq!(extract_score("Score: 100/100"), Some(100));
        assert_eq!(extract_score("Score: 7/1000"), Some(7));
    }
}
