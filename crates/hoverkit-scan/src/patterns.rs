//! Class-name patterns that identify scrollable list containers.

use once_cell::sync::Lazy;
use regex::{Regex, RegexSet};

use crate::{Error, Result};

/// Patterns matched against a node's class name when no configuration is given.
pub const DEFAULT_LIST_PATTERNS: &[&str] = &["RecyclerView", "ListView"];

/// Compiled default set, shared by every [`ListPatterns::default`].
static DEFAULT_SET: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new(DEFAULT_LIST_PATTERNS).unwrap_or_else(|_| RegexSet::empty())
});

/// A configurable set of class-name regexes.
///
/// A class name matches when any pattern matches anywhere within it, so plain
/// words behave like substring checks.
#[derive(Clone, Debug)]
pub struct ListPatterns {
    /// Compiled set.
    set: RegexSet,
}

impl Default for ListPatterns {
    fn default() -> Self {
        Self {
            set: DEFAULT_SET.clone(),
        }
    }
}

impl ListPatterns {
    /// Compile `patterns`, reporting the first one that fails.
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let sources: Vec<String> = patterns.iter().map(|p| p.as_ref().to_string()).collect();
        match RegexSet::new(&sources) {
            Ok(set) => Ok(Self { set }),
            Err(e) => {
                let bad = sources
                    .iter()
                    .find(|p| Regex::new(p).is_err())
                    .cloned()
                    .unwrap_or_default();
                Err(Error::Pattern {
                    pattern: bad,
                    message: e.to_string(),
                })
            }
        }
    }

    /// True if `class_name` looks like a list container.
    pub fn matches(&self, class_name: &str) -> bool {
        self.set.is_match(class_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_list_families() {
        let p = ListPatterns::default();
        assert!(p.matches("androidx.recyclerview.widget.RecyclerView"));
        assert!(p.matches("android.widget.ListView"));
        assert!(p.matches("android.widget.ExpandableListView"));
        assert!(!p.matches("android.widget.TextView"));
    }

    #[test]
    fn custom_patterns_replace_defaults() {
        let p = ListPatterns::new(&["^com\\.chat\\.MessageList$"]).expect("compile");
        assert!(p.matches("com.chat.MessageList"));
        assert!(!p.matches("android.widget.ListView"));
    }

    #[test]
    fn invalid_pattern_is_named() {
        let err = ListPatterns::new(&["ok", "(unclosed"]).expect_err("should fail");
        let Error::Pattern { pattern, .. } = err;
        assert_eq!(pattern, "(unclosed");
    }
}
