//! Capability vocabulary and intent scoring
//!
//! Intent matching is an explicit scoring function over a fixed tag
//! vocabulary. A [`CapabilityVocabulary`] maps words (and their light
//! inflections) to canonical capability tags; [`score`] counts how many of an
//! intent's tags a tool covers; [`rank`] orders candidates by that score and
//! then by observed performance.
//!
//! Everything here is pure and deterministic so it can be tested without any
//! natural-language layer in front of it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use super::entities::ToolDescriptor;

/// Word → canonical capability tag table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityVocabulary {
    words: BTreeMap<String, String>,
}

impl CapabilityVocabulary {
    /// Create an empty vocabulary
    pub fn empty() -> Self {
        Self {
            words: BTreeMap::new(),
        }
    }

    /// Register a canonical tag together with its synonyms
    pub fn with_tag(mut self, tag: &str, synonyms: &[&str]) -> Self {
        let tag = tag.to_lowercase();
        self.words.insert(tag.clone(), tag.clone());
        for synonym in synonyms {
            self.words.insert(synonym.to_lowercase(), tag.clone());
        }
        self
    }

    /// All canonical tags
    pub fn tags(&self) -> BTreeSet<&str> {
        self.words.values().map(String::as_str).collect()
    }

    /// Map one word to its canonical tag, trying light stemming
    pub fn canonicalize(&self, word: &str) -> Option<&str> {
        let word = word.to_lowercase();
        if let Some(tag) = self.words.get(&word) {
            return Some(tag);
        }

        for suffix in ["ing", "ed", "es", "s"] {
            let Some(stem) = word.strip_suffix(suffix) else {
                continue;
            };
            if stem.len() < 3 {
                continue;
            }
            if let Some(tag) = self.words.get(stem) {
                return Some(tag);
            }
            // "stored" -> "stor" -> "store"
            if let Some(tag) = self.words.get(&format!("{}e", stem)) {
                return Some(tag);
            }
        }
        None
    }

    /// Extract canonical tags from free text, in order of first appearance
    pub fn extract(&self, text: &str) -> Vec<String> {
        let mut seen = BTreeSet::new();
        let mut tags = Vec::new();
        for word in words(text) {
            if let Some(tag) = self.canonicalize(word)
                && seen.insert(tag.to_string())
            {
                tags.push(tag.to_string());
            }
        }
        tags
    }

    /// Canonicalize declared tags; tags outside the vocabulary are kept as-is
    pub fn normalize_tags<'a, I>(&self, tags: I) -> BTreeSet<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        tags.into_iter()
            .map(|t| {
                self.canonicalize(t)
                    .map(str::to_string)
                    .unwrap_or_else(|| t.trim().to_lowercase())
            })
            .filter(|t| !t.is_empty())
            .collect()
    }
}

impl Default for CapabilityVocabulary {
    fn default() -> Self {
        Self::empty()
            .with_tag("search", &["find", "lookup", "query", "grep", "locate", "discover"])
            .with_tag("fetch", &["download", "retrieve", "get", "scrape", "crawl"])
            .with_tag("read", &["open", "load", "view", "cat"])
            .with_tag("write", &["save", "create", "edit", "update", "modify", "append"])
            .with_tag("list", &["enumerate", "ls", "browse_directory", "directory"])
            .with_tag("store", &["persist", "remember", "archive", "index", "record"])
            .with_tag("recall", &["memory", "retrieve_memory", "remind"])
            .with_tag("notify", &["notification", "alert", "send", "message", "email", "ping"])
            .with_tag("browse", &["navigate", "click", "screenshot", "browser"])
            .with_tag("issue", &["ticket", "bug", "task", "jira"])
            .with_tag("commit", &["push", "pull", "merge", "branch", "repository", "repo"])
            .with_tag("transcribe", &["audio", "speech", "caption"])
            .with_tag("test", &["verify", "validate", "check", "assert"])
            .with_tag("summarize", &["summary", "digest", "condense"])
    }
}

/// Split text into alphanumeric words, preserving order
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
}

/// Number of query tags a tool covers
pub fn score(query: &[String], tool: &ToolDescriptor) -> usize {
    query.iter().filter(|tag| tool.has_capability(tag)).count()
}

/// Order by higher success rate, then lower mean latency, then name
pub fn performance_order(a: &ToolDescriptor, b: &ToolDescriptor) -> Ordering {
    b.performance
        .success_rate
        .total_cmp(&a.performance.success_rate)
        .then_with(|| {
            a.performance
                .mean_latency_ms
                .total_cmp(&b.performance.mean_latency_ms)
        })
        .then_with(|| a.name.cmp(&b.name))
}

/// Rank tools against a query, dropping tools that cover no tag
///
/// Higher overlap wins; ties are broken by [`performance_order`].
pub fn rank<'a, I>(query: &[String], tools: I) -> Vec<(&'a ToolDescriptor, usize)>
where
    I: IntoIterator<Item = &'a ToolDescriptor>,
{
    let mut scored: Vec<_> = tools
        .into_iter()
        .map(|t| (t, score(query, t)))
        .filter(|(_, s)| *s > 0)
        .collect();
    scored.sort_by(|(a, sa), (b, sb)| sb.cmp(sa).then_with(|| performance_order(a, b)));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::category::ToolCategory;
    use crate::tool::entities::{SourceKind, ToolDefinition};
    use std::time::Duration;

    fn tool(name: &str, tags: &[&str]) -> ToolDescriptor {
        ToolDescriptor::from_definition(
            ToolDefinition::new(name, ""),
            "test",
            SourceKind::Internal,
            ToolCategory::Unknown,
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[test]
    fn test_extract_in_order_of_first_appearance() {
        let vocab = CapabilityVocabulary::default();
        let tags = vocab.extract("Search the web, store the results and notify the team");
        assert_eq!(tags, vec!["search", "store", "notify"]);
    }

    #[test]
    fn test_extract_dedupes_and_canonicalizes_synonyms() {
        let vocab = CapabilityVocabulary::default();
        let tags = vocab.extract("find files, then lookup more and save them");
        assert_eq!(tags, vec!["search", "write"]);
    }

    #[test]
    fn test_light_stemming() {
        let vocab = CapabilityVocabulary::default();
        assert_eq!(vocab.canonicalize("searching"), Some("search"));
        assert_eq!(vocab.canonicalize("stored"), Some("store"));
        assert_eq!(vocab.canonicalize("alerts"), Some("notify"));
        assert_eq!(vocab.canonicalize("xyz"), None);
    }

    #[test]
    fn test_normalize_keeps_unknown_tags() {
        let vocab = CapabilityVocabulary::default();
        let declared = vec!["Lookup".to_string(), "geocode".to_string()];
        let tags = vocab.normalize_tags(&declared);
        assert!(tags.contains("search"));
        assert!(tags.contains("geocode"));
    }

    #[test]
    fn test_score_counts_overlap() {
        let query = vec!["search".to_string(), "store".to_string()];
        assert_eq!(score(&query, &tool("a", &["search", "store", "read"])), 2);
        assert_eq!(score(&query, &tool("b", &["search"])), 1);
        assert_eq!(score(&query, &tool("c", &["notify"])), 0);
    }

    #[test]
    fn test_rank_by_score_then_performance() {
        let query = vec!["search".to_string(), "fetch".to_string()];

        let both = tool("both", &["search", "fetch"]);
        let mut reliable = tool("reliable", &["search"]);
        let mut flaky = tool("flaky", &["search"]);
        let mut slow = tool("slow", &["search"]);
        let none = tool("none", &["notify"]);

        reliable.performance.record(true, Duration::from_millis(10));
        flaky.performance.record(false, Duration::from_millis(1));
        slow.performance.record(true, Duration::from_millis(500));

        let tools = [none, slow, flaky, reliable, both];
        let ranked: Vec<_> = rank(&query, tools.iter())
            .into_iter()
            .map(|(t, _)| t.name.as_str())
            .collect();

        assert_eq!(ranked, vec!["both", "reliable", "slow", "flaky"]);
    }

    #[test]
    fn test_rank_ties_broken_by_name() {
        let query = vec!["search".to_string()];
        let tools = [tool("zeta", &["search"]), tool("alpha", &["search"])];
        let ranked = rank(&query, tools.iter());
        assert_eq!(ranked[0].0.name, "alpha");
    }
}
