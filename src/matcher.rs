//! Glob-style name matching for table, column, index and foreign-key rules.
//!
//! Only `*` is special: it matches any run of characters, including none.
//! Patterns are anchored at both ends and matched case-sensitively.

use regex::Regex;
use tracing::{debug, warn};

/// Returns true when `candidate` matches `pattern`.
///
/// Both inputs are trimmed first. Exact equality short-circuits; otherwise the
/// pattern is escaped, `*` becomes `.*`, and the result is anchored. A pattern
/// that fails to compile is logged and treated as a non-match.
pub fn matches(pattern: &str, candidate: &str) -> bool {
    let pattern = pattern.trim();
    let candidate = candidate.trim();
    if pattern == candidate {
        debug!(pattern, candidate, "simple_match: equal");
        return true;
    }
    if !pattern.contains('*') {
        return false;
    }

    let expr = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    match Regex::new(&expr) {
        Ok(re) => re.is_match(candidate),
        Err(err) => {
            warn!(pattern, expr = %expr, error = %err, "simple_match: invalid pattern");
            false
        }
    }
}

/// Returns true when any pattern in `patterns` matches `candidate`.
pub fn matches_any<S: AsRef<str>>(patterns: &[S], candidate: &str) -> bool {
    patterns
        .iter()
        .any(|pattern| matches(pattern.as_ref(), candidate))
}

/// Splits a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_wildcard_is_anchored() {
        assert!(matches("order_*", "order_base"));
        assert!(matches("order_*", "order_2024"));
        assert!(matches("order_*", "order_"));
        assert!(!matches("order_*", "orders"));
        assert!(!matches("order_*", "my_order_1"));
    }

    #[test]
    fn star_matches_everything() {
        assert!(matches("*", "users"));
        assert!(matches("*", "a"));
    }

    #[test]
    fn literal_pattern_needs_exact_name() {
        assert!(matches("users", "users"));
        assert!(matches("  users ", "users"));
        assert!(!matches("users", "users_bak"));
        assert!(!matches("users", "Users"));
    }

    #[test]
    fn regex_metacharacters_are_literal() {
        assert!(matches("t.a*", "t.abc"));
        assert!(!matches("t.a*", "txabc"));
        assert!(matches("*_bak(1)", "users_bak(1)"));
        assert!(!matches("a+*", "aaa"));
    }

    #[test]
    fn infix_wildcard() {
        assert!(matches("*_bak*", "users_bak_2020"));
        assert!(matches("*_bak*", "x_bak"));
        assert!(!matches("*_bak*", "backup"));
    }

    #[test]
    fn matches_any_checks_every_pattern() {
        let patterns = vec!["product_base".to_string(), "order_*".to_string()];
        assert!(matches_any(&patterns, "order_item"));
        assert!(matches_any(&patterns, "product_base"));
        assert!(!matches_any(&patterns, "product"));
        assert!(!matches_any::<String>(&[], "product"));
    }

    #[test]
    fn split_list_drops_blank_entries() {
        assert_eq!(
            split_list(" product_base, order_* ,,"),
            vec!["product_base".to_string(), "order_*".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
