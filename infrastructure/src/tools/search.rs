//! Search tools: glob_search, grep_search

use glob::glob;
use regex::RegexBuilder;
use serde_json::{Map, Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use toolweave_domain::{ParamType, ToolDefinition, ToolError, ToolParameter};

use super::args::{get_bool, get_str, get_usize, require_str};
use super::file::resolve;

/// Tool name constants
pub const GLOB_SEARCH: &str = "glob_search";
pub const GREP_SEARCH: &str = "grep_search";

/// Maximum number of results to return
const MAX_RESULTS: usize = 1000;

/// Maximum file size for grep (5 MB)
const MAX_GREP_FILE_SIZE: u64 = 5 * 1024 * 1024;

pub fn glob_search_definition() -> ToolDefinition {
    ToolDefinition::new(
        GLOB_SEARCH,
        "Find files whose paths match a glob pattern (e.g., '**/*.rs', 'src/*.txt')",
    )
    .with_capabilities(["search", "list"])
    .with_parameter(ToolParameter::new("pattern", "Glob pattern to match files", true))
    .with_parameter(ToolParameter::new(
        "base_dir",
        "Base directory to search from (default: working directory)",
        false,
    ))
    .with_parameter(
        ToolParameter::new("max_results", "Maximum number of results (default: 1000)", false)
            .with_type(ParamType::Integer),
    )
}

pub fn grep_search_definition() -> ToolDefinition {
    ToolDefinition::new(
        GREP_SEARCH,
        "Search file contents for lines matching a regex",
    )
    .with_capability("search")
    .with_parameter(ToolParameter::new("pattern", "Regex pattern to search for", true))
    .with_parameter(ToolParameter::new(
        "path",
        "File or directory to search in (default: working directory)",
        false,
    ))
    .with_parameter(ToolParameter::new(
        "file_pattern",
        "Glob pattern to filter files (e.g., '*.rs')",
        false,
    ))
    .with_parameter(
        ToolParameter::new("case_insensitive", "Perform case-insensitive search", false)
            .with_type(ParamType::Boolean),
    )
}

pub fn execute_glob_search(root: &Path, params: &Map<String, Value>) -> Result<Value, ToolError> {
    let pattern = require_str(params, "pattern")?;
    let base_dir = resolve(root, get_str(params, "base_dir").unwrap_or("."));
    let max_results = get_usize(params, "max_results")
        .unwrap_or(MAX_RESULTS)
        .min(MAX_RESULTS);

    let full_pattern = if Path::new(pattern).is_absolute() {
        pattern.to_string()
    } else {
        format!("{}/{}", base_dir.display(), pattern)
    };

    let entries = glob(&full_pattern)
        .map_err(|e| ToolError::invalid_argument(format!("Invalid glob pattern: {}", e)))?;

    let mut matches = Vec::new();
    let mut unreadable = 0;
    let mut truncated = false;
    for entry in entries {
        if matches.len() >= max_results {
            truncated = true;
            break;
        }
        match entry {
            Ok(path) => matches.push(path.display().to_string()),
            Err(_) => unreadable += 1,
        }
    }

    Ok(json!({
        "matches": matches,
        "truncated": truncated,
        "unreadable": unreadable,
    }))
}

pub fn execute_grep_search(root: &Path, params: &Map<String, Value>) -> Result<Value, ToolError> {
    let pattern = require_str(params, "pattern")?;
    let path = resolve(root, get_str(params, "path").unwrap_or("."));
    if !path.exists() {
        return Err(ToolError::not_found(path.display().to_string()));
    }

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(get_bool(params, "case_insensitive").unwrap_or(false))
        .build()
        .map_err(|e| ToolError::invalid_argument(format!("Invalid regex pattern: {}", e)))?;

    let files = if path.is_file() {
        vec![path.clone()]
    } else {
        collect_files(&path, get_str(params, "file_pattern"))
    };

    let mut matches = Vec::new();
    let mut total = 0usize;
    for file in files {
        if fs::metadata(&file).is_ok_and(|m| m.len() > MAX_GREP_FILE_SIZE) {
            continue;
        }
        // Binary or unreadable files are skipped
        let Ok(content) = fs::read_to_string(&file) else {
            continue;
        };
        for (index, line) in content.lines().enumerate() {
            if !regex.is_match(line) {
                continue;
            }
            total += 1;
            if matches.len() < MAX_RESULTS {
                matches.push(json!({
                    "file": file.display().to_string(),
                    "line": index + 1,
                    "text": line,
                }));
            }
        }
    }

    Ok(json!({
        "matches": matches,
        "total": total,
        "truncated": total > MAX_RESULTS,
    }))
}

/// Collect files from a directory, optionally filtered by a glob pattern
fn collect_files(dir: &Path, file_pattern: Option<&str>) -> Vec<PathBuf> {
    let pattern = match file_pattern {
        Some(p) if p.contains('/') => p.to_string(),
        Some(p) => format!("**/{}", p),
        None => "**/*".to_string(),
    };
    let full_pattern = format!("{}/{}", dir.display(), pattern);

    let mut files: Vec<PathBuf> = glob(&full_pattern)
        .map(|paths| paths.flatten().filter(|p| p.is_file()).collect())
        .unwrap_or_default();
    files.sort();
    files
}
