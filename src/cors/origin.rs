//! Origin matching logic.
//!
//! # Responsibilities
//! - Compile allow-list entries into exact or wildcard rules
//! - Decide allow/deny for an optional request origin
//!
//! # Design Decisions
//! - Absent origin = allowed (mobile apps, CLI tools, server-to-server)
//! - Exact rules compare the full string, case-sensitive
//! - Wildcard rules match when the origin *contains* the text after `*`.
//!   `https://*.vercel.app` therefore also admits `https://x.vercel.app.evil.test`
//! - The rule set is a union: order never changes the outcome

use std::fmt;

/// One allow-list entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OriginRule {
    /// Allowed iff the origin equals this string.
    Exact(String),
    /// `prefix*suffix`; allowed iff the origin contains `suffix`.
    Wildcard { prefix: String, suffix: String },
}

impl OriginRule {
    pub fn parse(pattern: &str) -> Self {
        let pattern = pattern.trim();
        match pattern.split_once('*') {
            Some((prefix, suffix)) => OriginRule::Wildcard {
                prefix: prefix.to_string(),
                suffix: suffix.to_string(),
            },
            None => OriginRule::Exact(pattern.to_string()),
        }
    }

    pub fn matches(&self, origin: &str) -> bool {
        match self {
            OriginRule::Exact(expected) => origin == expected,
            OriginRule::Wildcard { suffix, .. } => origin.contains(suffix.as_str()),
        }
    }
}

impl fmt::Display for OriginRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OriginRule::Exact(origin) => f.write_str(origin),
            OriginRule::Wildcard { prefix, suffix } => write!(f, "{prefix}*{suffix}"),
        }
    }
}

/// Allow/deny decision for an optional origin.
pub fn is_allowed(origin: Option<&str>, rules: &[OriginRule]) -> bool {
    match origin {
        None => true,
        Some(origin) => rules.iter().any(|rule| rule.matches(origin)),
    }
}

/// Immutable, compiled allow-list.
#[derive(Debug, Clone, Default)]
pub struct OriginPolicy {
    rules: Vec<OriginRule>,
}

impl OriginPolicy {
    pub fn new(rules: Vec<OriginRule>) -> Self {
        Self { rules }
    }

    pub fn from_patterns<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            patterns
                .into_iter()
                .map(|p| OriginRule::parse(p.as_ref()))
                .collect(),
        )
    }

    pub fn rules(&self) -> &[OriginRule] {
        &self.rules
    }

    pub fn is_allowed(&self, origin: Option<&str>) -> bool {
        is_allowed(origin, &self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Vec<OriginRule> {
        ["http://localhost:5173", "https://*.vercel.app"]
            .iter()
            .map(|p| OriginRule::parse(p))
            .collect()
    }

    #[test]
    fn parse_splits_wildcard() {
        assert_eq!(
            OriginRule::parse("https://*.vercel.app"),
            OriginRule::Wildcard {
                prefix: "https://".into(),
                suffix: ".vercel.app".into()
            }
        );
        assert_eq!(
            OriginRule::parse("http://localhost:3000"),
            OriginRule::Exact("http://localhost:3000".into())
        );
        assert_eq!(OriginRule::parse("https://*.vercel.app").to_string(), "https://*.vercel.app");
    }

    #[test]
    fn missing_origin_is_allowed() {
        assert!(is_allowed(None, &rules()));
        assert!(is_allowed(None, &[]));
    }

    #[test]
    fn exact_match() {
        assert!(is_allowed(Some("http://localhost:5173"), &rules()));
        assert!(!is_allowed(Some("http://localhost:5174"), &rules()));
        assert!(!is_allowed(Some("HTTP://LOCALHOST:5173"), &rules()));
    }

    #[test]
    fn wildcard_is_substring_match() {
        assert!(is_allowed(Some("https://preview-123.vercel.app"), &rules()));
        // Loose on purpose: substring, not domain suffix.
        assert!(is_allowed(Some("https://a.vercel.app.evil.test"), &rules()));
        assert!(!is_allowed(Some("https://vercel.app"), &rules()));
        assert!(!is_allowed(Some("https://evil.test"), &rules()));
    }

    #[test]
    fn order_does_not_matter() {
        let mut reversed = rules();
        reversed.reverse();
        for origin in ["http://localhost:5173", "https://x.vercel.app", "https://nope.test"] {
            assert_eq!(
                is_allowed(Some(origin), &rules()),
                is_allowed(Some(origin), &reversed)
            );
        }
    }

    #[test]
    fn empty_rule_set_denies_browsers() {
        let policy = OriginPolicy::default();
        assert!(!policy.is_allowed(Some("http://localhost:5173")));
        assert!(policy.is_allowed(None));
    }
}
