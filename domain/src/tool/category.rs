//! Tool categorization
//!
//! Every tool registered in the catalog is assigned one [`ToolCategory`] by a
//! [`Categorizer`]. The categorizer is a plain ordered table of
//! [`CategoryRule`]s; adding a category means adding a row, never touching
//! the matching code.
//!
//! Matching works on lowercase alphanumeric tokens:
//!
//! 1. The rules are walked in order against the tokens of the tool **name**.
//! 2. If no rule matched the name, the rules are walked again against the
//!    tokens of the **description**.
//! 3. The first matching rule wins; unmatched tools are [`ToolCategory::Unknown`].
//!
//! Names are checked first because they are the more specific signal: a tool
//! named `grep_search` whose description mentions "web pages" is still a
//! file-system tool.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Fixed category taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolCategory {
    FileSystem,
    WebSearch,
    KnowledgeStore,
    CodeHosting,
    ProjectTracking,
    BrowserAutomation,
    Media,
    ApiTesting,
    Unknown,
}

impl ToolCategory {
    pub const ALL: [ToolCategory; 9] = [
        ToolCategory::FileSystem,
        ToolCategory::WebSearch,
        ToolCategory::KnowledgeStore,
        ToolCategory::CodeHosting,
        ToolCategory::ProjectTracking,
        ToolCategory::BrowserAutomation,
        ToolCategory::Media,
        ToolCategory::ApiTesting,
        ToolCategory::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCategory::FileSystem => "file-system",
            ToolCategory::WebSearch => "web-search",
            ToolCategory::KnowledgeStore => "knowledge-store",
            ToolCategory::CodeHosting => "code-hosting",
            ToolCategory::ProjectTracking => "project-tracking",
            ToolCategory::BrowserAutomation => "browser-automation",
            ToolCategory::Media => "media",
            ToolCategory::ApiTesting => "api-testing",
            ToolCategory::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ToolCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ToolCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        ToolCategory::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Unknown tool category: {}", s))
    }
}

/// One row of the categorization table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub category: ToolCategory,
    pub keywords: Vec<String>,
}

impl CategoryRule {
    pub fn new(category: ToolCategory, keywords: &[&str]) -> Self {
        Self {
            category,
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    fn matches(&self, tokens: &BTreeSet<String>) -> bool {
        self.keywords.iter().any(|k| tokens.contains(k))
    }
}

/// Ordered, table-driven tool categorizer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Categorizer {
    rules: Vec<CategoryRule>,
}

impl Categorizer {
    /// Create a categorizer from an explicit rule table
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        Self { rules }
    }

    /// Append a rule at the end of the table (lowest precedence)
    pub fn with_rule(mut self, rule: CategoryRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    /// Assign a category to a tool from its name and description
    pub fn categorize(&self, name: &str, description: &str) -> ToolCategory {
        let name_tokens = tokenize(name);
        if let Some(rule) = self.rules.iter().find(|r| r.matches(&name_tokens)) {
            return rule.category;
        }

        let description_tokens = tokenize(description);
        self.rules
            .iter()
            .find(|r| r.matches(&description_tokens))
            .map(|r| r.category)
            .unwrap_or(ToolCategory::Unknown)
    }
}

impl Default for Categorizer {
    fn default() -> Self {
        Self::new(vec![
            CategoryRule::new(
                ToolCategory::CodeHosting,
                &[
                    "github", "gitlab", "bitbucket", "git", "repo", "repository", "commit",
                    "branch", "pull", "merge",
                ],
            ),
            CategoryRule::new(
                ToolCategory::ProjectTracking,
                &[
                    "jira", "linear", "asana", "trello", "issue", "issues", "ticket", "sprint",
                    "backlog", "todo",
                ],
            ),
            CategoryRule::new(
                ToolCategory::BrowserAutomation,
                &[
                    "browser", "puppeteer", "playwright", "selenium", "navigate", "click",
                    "screenshot", "page",
                ],
            ),
            CategoryRule::new(
                ToolCategory::ApiTesting,
                &["api", "postman", "endpoint", "graphql", "openapi", "rest", "request"],
            ),
            CategoryRule::new(
                ToolCategory::Media,
                &[
                    "image", "images", "video", "audio", "media", "photo", "music",
                    "transcribe",
                ],
            ),
            CategoryRule::new(
                ToolCategory::KnowledgeStore,
                &[
                    "memory", "knowledge", "store", "recall", "vector", "embedding", "notes",
                    "database", "db",
                ],
            ),
            CategoryRule::new(
                ToolCategory::FileSystem,
                &[
                    "file", "files", "directory", "dir", "folder", "path", "glob", "grep", "fs",
                ],
            ),
            CategoryRule::new(
                ToolCategory::WebSearch,
                &[
                    "web", "search", "google", "bing", "brave", "duckduckgo", "fetch", "url",
                    "http",
                ],
            ),
        ])
    }
}

/// Split text into lowercase alphanumeric tokens
pub(crate) fn tokenize(text: &str) -> BTreeSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}
