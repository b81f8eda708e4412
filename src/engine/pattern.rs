// Copyright 2025 Rowsift Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Compiled LIKE patterns and the process-wide pattern cache
//!
//! Wildcards: `*` and `%` match any run of characters (including empty),
//! `?` matches exactly one character. Matching is case-insensitive.
//!
//! Wildcard placement follows the legacy prefix/suffix/contains policy: when
//! the first `*`/`%` occurrence is not at the start of the pattern AND the
//! last occurrence is not at the end, the pattern matches nothing at all
//! (`A*e` is unconditionally false). `?` does not participate in the
//! placement check.
//!
//! Simple patterns compile to direct string operations; anything with `?` or
//! interior run-wildcards falls back to an anchored, case-insensitive regex.

use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use regex::Regex;
use rustc_hash::FxHashMap;

/// Compiled LIKE pattern for fast matching
#[derive(Debug, Clone)]
pub enum LikePattern {
    /// Pattern with an illegal interior wildcard; matches nothing
    Never,
    /// Match anything: `*` or `%`
    MatchAll,
    /// Exact match (no wildcards), stored lowercased
    Exact(String),
    /// Prefix match: `abc*`, stored lowercased
    Prefix(String),
    /// Suffix match: `*abc`, stored lowercased
    Suffix(String),
    /// Contains match: `*abc*`, stored lowercased
    Contains(String),
    /// Anything else (single-char wildcards, multiple runs)
    Regex(Regex),
}

/// Check for the run wildcards `*` and `%`
fn is_run_wildcard(c: char) -> bool {
    c == '*' || c == '%'
}

impl LikePattern {
    /// Compile a LIKE pattern into optimized form
    pub fn compile(pattern: &str) -> Self {
        let chars: Vec<char> = pattern.chars().collect();

        let first_wildcard = chars.iter().position(|&c| is_run_wildcard(c));
        let last_wildcard = chars.iter().rposition(|&c| is_run_wildcard(c));

        // Legacy placement rule: a run wildcard that neither starts nor ends
        // the pattern makes it unmatchable
        if let (Some(first), Some(last)) = (first_wildcard, last_wildcard) {
            if first > 0 && last < chars.len() - 1 {
                return LikePattern::Never;
            }
        }

        let has_single = chars.contains(&'?');
        let starts_with_run = chars.first().copied().is_some_and(is_run_wildcard);
        let ends_with_run = chars.last().copied().is_some_and(is_run_wildcard);

        if !has_single {
            match (first_wildcard, last_wildcard) {
                (None, None) => {
                    return LikePattern::Exact(pattern.to_lowercase());
                }
                (Some(first), Some(last)) if first == last => {
                    if chars.len() == 1 {
                        return LikePattern::MatchAll;
                    }
                    if ends_with_run {
                        let prefix: String = chars[..chars.len() - 1].iter().collect();
                        return LikePattern::Prefix(prefix.to_lowercase());
                    }
                    let suffix: String = chars[1..].iter().collect();
                    return LikePattern::Suffix(suffix.to_lowercase());
                }
                (Some(first), Some(last))
                    if first == 0 && last == chars.len() - 1 && last == first + 1 =>
                {
                    // `**` or `*%` etc.
                    return LikePattern::MatchAll;
                }
                (Some(0), Some(last))
                    if last == chars.len() - 1
                        && !chars[1..chars.len() - 1].iter().copied().any(is_run_wildcard) =>
                {
                    let middle: String = chars[1..chars.len() - 1].iter().collect();
                    return LikePattern::Contains(middle.to_lowercase());
                }
                _ => {}
            }
        }

        // General case: anchored, case-insensitive regex
        let mut regex = String::with_capacity(pattern.len() * 2 + 6);
        regex.push_str("(?i)");
        if !starts_with_run {
            regex.push('^');
        }
        for &c in &chars {
            match c {
                '*' | '%' => regex.push_str(".*"),
                '?' => regex.push('.'),
                other => regex.push_str(&regex::escape(&other.to_string())),
            }
        }
        if !ends_with_run {
            regex.push('$');
        }

        match Regex::new(&regex) {
            Ok(re) => LikePattern::Regex(re),
            Err(_) => LikePattern::Never,
        }
    }

    /// Match the pattern against a string (case-insensitive)
    pub fn matches(&self, text: &str) -> bool {
        match self {
            LikePattern::Never => false,
            LikePattern::MatchAll => true,
            LikePattern::Exact(p) => text.to_lowercase() == *p,
            LikePattern::Prefix(p) => text.to_lowercase().starts_with(p),
            LikePattern::Suffix(s) => text.to_lowercase().ends_with(s),
            LikePattern::Contains(c) => text.to_lowercase().contains(c),
            LikePattern::Regex(re) => re.is_match(text),
        }
    }
}

/// Thread-safe cache of compiled LIKE patterns, keyed by pattern text
///
/// Unbounded: distinct pattern texts are bounded by the application's
/// expression vocabulary.
pub struct PatternCache {
    cache: RwLock<FxHashMap<String, Arc<LikePattern>>>,
}

impl PatternCache {
    /// Create a new pattern cache
    pub fn new() -> Self {
        Self {
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Get a compiled pattern, compiling and caching on first use
    pub fn get_or_compile(&self, pattern: &str) -> Arc<LikePattern> {
        {
            let cache = self.cache.read();
            if let Some(compiled) = cache.get(pattern) {
                return Arc::clone(compiled);
            }
        }

        let compiled = Arc::new(LikePattern::compile(pattern));
        let mut cache = self.cache.write();
        Arc::clone(
            cache
                .entry(pattern.to_string())
                .or_insert_with(|| Arc::clone(&compiled)),
        )
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.cache.write().clear();
    }

    /// Number of cached patterns
    pub fn size(&self) -> usize {
        self.cache.read().len()
    }
}

impl Default for PatternCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Global pattern cache instance
static GLOBAL_CACHE: OnceLock<PatternCache> = OnceLock::new();

/// Get the global pattern cache
pub fn global_pattern_cache() -> &'static PatternCache {
    GLOBAL_CACHE.get_or_init(PatternCache::new)
}

/// LIKE with null semantics: a NULL value or NULL pattern never matches
pub fn like(value: Option<&str>, pattern: Option<&str>) -> bool {
    match (value, pattern) {
        (Some(value), Some(pattern)) => global_pattern_cache()
            .get_or_compile(pattern)
            .matches(value),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let p = LikePattern::compile("Alice");
        assert!(p.matches("Alice"));
        assert!(p.matches("ALICE"));
        assert!(!p.matches("Alic"));
        assert!(!p.matches("Alice "));
    }

    #[test]
    fn test_prefix_match() {
        let p = LikePattern::compile("A*");
        assert!(p.matches("Alice"));
        assert!(p.matches("a"));
        assert!(!p.matches("Bob"));

        let p = LikePattern::compile("Al%");
        assert!(p.matches("ALICE"));
    }

    #[test]
    fn test_suffix_match() {
        let p = LikePattern::compile("*e");
        assert!(p.matches("Alice"));
        assert!(!p.matches("Bob"));
    }

    #[test]
    fn test_contains_match() {
        let p = LikePattern::compile("*lic*");
        assert!(p.matches("Alice"));
        assert!(!p.matches("Bob"));
    }

    #[test]
    fn test_illegal_middle_wildcard() {
        let p = LikePattern::compile("A*e");
        assert!(matches!(p, LikePattern::Never));
        assert!(!p.matches("Alice"));
        assert!(!p.matches("Ae"));

        // placement rule ignores '?'
        let p = LikePattern::compile("A?ice");
        assert!(p.matches("Alice"));
        assert!(!p.matches("Aice"));
        assert!(!p.matches("Ablice"));
    }

    #[test]
    fn test_leading_run_with_interior_wildcard_allowed() {
        // first wildcard at position 0, so the placement rule passes
        let p = LikePattern::compile("*a*b");
        assert!(p.matches("xayb"));
        assert!(p.matches("ab"));
        assert!(!p.matches("ba"));
    }

    #[test]
    fn test_match_all() {
        assert!(LikePattern::compile("*").matches(""));
        assert!(LikePattern::compile("%").matches("anything"));
    }

    #[test]
    fn test_empty_pattern() {
        let p = LikePattern::compile("");
        assert!(p.matches(""));
        assert!(!p.matches("x"));
    }

    #[test]
    fn test_regex_metacharacters_escaped() {
        let p = LikePattern::compile("a.c?");
        assert!(p.matches("a.cd"));
        assert!(!p.matches("abcd"));
    }

    #[test]
    fn test_like_null_semantics() {
        assert!(!like(None, Some("*")));
        assert!(!like(Some("Alice"), None));
        assert!(!like(None, None));
        assert!(like(Some("Alice"), Some("A*")));
    }

    #[test]
    fn test_pattern_cache_reuse() {
        let cache = PatternCache::new();
        let p1 = cache.get_or_compile("test*");
        let p2 = cache.get_or_compile("test*");
        assert!(Arc::ptr_eq(&p1, &p2));
        assert_eq!(cache.size(), 1);

        cache.clear();
        assert_eq!(cache.size(), 0);
    }
}
