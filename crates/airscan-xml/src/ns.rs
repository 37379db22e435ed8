//! Namespace prefix substitution.
//!
//! Protocol messages from different vendors bind the same namespace to
//! arbitrary prefixes, and sometimes to slightly different URIs (`http`
//! vs `https`, SOAP 1.1 vs 1.2). The reader maps every namespace URI onto a
//! canonical prefix from a table of glob rules, so callers can match paths
//! like `s:Envelope/s:Body` regardless of how the document spells them.

use crate::types::{XmlNs, ns_table};
use glob::Pattern;
use rustc_hash::FxHashMap;
use std::borrow::Cow;

/// A compiled substitution rule.
struct Rule<'r> {
    /// Compiled URI pattern; `None` if the pattern is not a valid glob, in
    /// which case the rule matches the URI literally.
    pattern: Option<Pattern>,
    uri: &'r str,
    prefix: &'r str,
}

impl Rule<'_> {
    fn matches(&self, uri: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.matches(uri),
            None => self.uri == uri,
        }
    }
}

/// Collapse every run of `*` into a single `*`.
///
/// In a shell pattern `**` means the same as `*`, while [`Pattern`] gives
/// it a recursive meaning and rejects it inside a path component.
fn shell_pattern(uri: &str) -> Cow<'_, str> {
    if !uri.contains("**") {
        return Cow::Borrowed(uri);
    }

    let mut pattern = String::with_capacity(uri.len());
    for c in uri.chars() {
        if c != '*' || !pattern.ends_with('*') {
            pattern.push(c);
        }
    }
    Cow::Owned(pattern)
}

/// Maps namespace URIs to canonical prefixes.
///
/// Rules are tried in table order and the first match wins. Every URI that
/// matched a rule is memoized, so repeated lookups skip the glob scan. URIs
/// that match no rule are not memoized.
pub(crate) struct NsSubst<'r> {
    rules: Option<Vec<Rule<'r>>>,
    cache: FxHashMap<String, &'r str>,
}

impl<'r> NsSubst<'r> {
    /// Compile a rule table. `None` disables substitution.
    pub(crate) fn new(rules: Option<&'r [XmlNs<'r>]>) -> Self {
        let rules = rules.map(|table| {
            ns_table(table)
                .map(|ns| Rule {
                    pattern: match Pattern::new(&shell_pattern(ns.uri)) {
                        Ok(pattern) => Some(pattern),
                        Err(err) => {
                            tracing::warn!(
                                pattern = ns.uri,
                                error = %err,
                                "Invalid namespace pattern, matching literally"
                            );
                            None
                        }
                    },
                    uri: ns.uri,
                    prefix: ns.prefix,
                })
                .collect()
        });

        Self {
            rules,
            cache: FxHashMap::default(),
        }
    }

    /// Resolve the prefix for a namespace `uri` that the document bound to
    /// `prefix`.
    ///
    /// Returns the document's own prefix if substitution is disabled or no
    /// rule matches.
    pub(crate) fn lookup<'a>(&mut self, prefix: Option<&'a str>, uri: &str) -> Option<&'a str>
    where
        'r: 'a,
    {
        let Some(rules) = &self.rules else {
            return prefix;
        };

        if let Some(&cached) = self.cache.get(uri) {
            return Some(cached);
        }

        match rules.iter().find(|rule| rule.matches(uri)) {
            Some(rule) => {
                tracing::trace!(uri, prefix = rule.prefix, "Caching namespace substitution");
                self.cache.insert(uri.to_string(), rule.prefix);
                Some(rule.prefix)
            }
            None => prefix,
        }
    }

    #[cfg(test)]
    fn cache_len(&self) -> usize {
        self.cache.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RULES: &[XmlNs<'static>] = &[
        XmlNs::new("s", "http*://schemas.xmlsoap.org/soap/envelope"),
        XmlNs::new("s", "http*://www.w3.org/2003/05/soap-envelope"),
        XmlNs::new("scan", "http://schemas.hp.com/imaging/escl/2011/05/03"),
        XmlNs::new("pwg", "http://www.pwg.org/schemas/2010/12/sm"),
        XmlNs::new("any", "urn:*"),
        XmlNs::END,
    ];

    #[test]
    fn test_no_rules_returns_document_prefix() {
        let mut subst = NsSubst::new(None);
        assert_eq!(subst.lookup(Some("a"), "urn:x"), Some("a"));
        assert_eq!(subst.lookup(None, "urn:x"), None);
        assert_eq!(subst.cache_len(), 0);
    }

    #[test]
    fn test_glob_match_and_cache() {
        let mut subst = NsSubst::new(Some(RULES));
        assert_eq!(
            subst.lookup(Some("soap"), "https://schemas.xmlsoap.org/soap/envelope"),
            Some("s")
        );
        assert_eq!(subst.cache_len(), 1);

        // Same URI again hits the cache, whatever the document prefix
        assert_eq!(
            subst.lookup(Some("env"), "https://schemas.xmlsoap.org/soap/envelope"),
            Some("s")
        );
        assert_eq!(subst.cache_len(), 1);

        assert_eq!(
            subst.lookup(None, "http://www.w3.org/2003/05/soap-envelope"),
            Some("s")
        );
        assert_eq!(subst.cache_len(), 2);
    }

    #[test]
    fn test_first_match_wins() {
        let rules = [
            XmlNs::new("first", "urn:x:*"),
            XmlNs::new("second", "urn:x:1"),
        ];
        let mut subst = NsSubst::new(Some(&rules[..]));
        assert_eq!(subst.lookup(Some("a"), "urn:x:1"), Some("first"));
    }

    #[test]
    fn test_star_matches_slashes() {
        let rules = [XmlNs::new("w", "http://*/ws")];
        let mut subst = NsSubst::new(Some(&rules[..]));
        assert_eq!(subst.lookup(None, "http://example.org/a/b/ws"), Some("w"));
    }

    #[test]
    fn test_unmatched_uri_is_not_cached() {
        let mut subst = NsSubst::new(Some(RULES));
        assert_eq!(subst.lookup(Some("x"), "http://example.org/other"), Some("x"));
        assert_eq!(subst.lookup(None, "http://example.org/other"), None);
        assert_eq!(subst.cache_len(), 0);
    }

    #[test]
    fn test_rules_after_terminator_are_ignored() {
        let rules = [XmlNs::END, XmlNs::new("x", "urn:*")];
        let mut subst = NsSubst::new(Some(&rules[..]));
        assert_eq!(subst.lookup(Some("a"), "urn:x"), Some("a"));
    }

    #[test]
    fn test_double_star_is_single_star() {
        let rules = [
            XmlNs::new("s", "http**://example.org/s"),
            XmlNs::new("d", "urn:**/**:x"),
        ];
        let mut subst = NsSubst::new(Some(&rules[..]));
        assert_eq!(subst.lookup(Some("x"), "https://example.org/s"), Some("s"));
        assert_eq!(subst.lookup(Some("x"), "http://example.org/s"), Some("s"));
        assert_eq!(subst.lookup(Some("x"), "urn:a/b/c:x"), Some("d"));
        // A path component still needs its slashes
        assert_eq!(subst.lookup(Some("x"), "urn:ab:x"), Some("x"));
    }

    #[test]
    fn test_shell_pattern() {
        assert!(matches!(shell_pattern("urn:*"), Cow::Borrowed("urn:*")));
        assert_eq!(shell_pattern("a***b**c*"), "a*b*c*");
    }

    #[test]
    fn test_invalid_pattern_matches_literally() {
        let rules = [XmlNs::new("b", "urn:[broken")];
        let mut subst = NsSubst::new(Some(&rules[..]));
        assert_eq!(subst.lookup(None, "urn:[broken"), Some("b"));
        assert_eq!(subst.lookup(None, "urn:b"), None);
    }
}
