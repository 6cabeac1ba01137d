//! File operation tools: read_file, write_file, list_directory

use serde_json::{Map, Value, json};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use toolweave_domain::{ParamType, ToolDefinition, ToolError, ToolParameter};

use super::args::{as_text, get_bool, get_str, get_usize, require_str};

/// Tool name constants
pub const READ_FILE: &str = "read_file";
pub const WRITE_FILE: &str = "write_file";
pub const LIST_DIRECTORY: &str = "list_directory";

/// Maximum file size to read (10 MB)
const MAX_READ_SIZE: u64 = 10 * 1024 * 1024;

/// Maximum directory entries returned
const MAX_ENTRIES: usize = 1000;

pub fn read_file_definition() -> ToolDefinition {
    ToolDefinition::new(READ_FILE, "Read the contents of a file at the specified path")
        .with_capability("read")
        .with_parameter(ToolParameter::new("path", "Path to the file to read", true))
        .with_parameter(
            ToolParameter::new("offset", "Line number to start reading from (0-indexed)", false)
                .with_type(ParamType::Integer),
        )
        .with_parameter(
            ToolParameter::new("limit", "Maximum number of lines to read", false)
                .with_type(ParamType::Integer),
        )
}

pub fn write_file_definition() -> ToolDefinition {
    ToolDefinition::new(
        WRITE_FILE,
        "Write content to a file, creating it if needed and overwriting it otherwise",
    )
    .with_capability("write")
    .with_parameter(
        ToolParameter::new(
            "content",
            "Content to write; non-text values are written as JSON",
            true,
        )
        .with_type(ParamType::Any),
    )
    .with_parameter(ToolParameter::new("path", "Path to the file to write", true))
    .with_parameter(
        ToolParameter::new("create_dirs", "Create parent directories if they don't exist", false)
            .with_type(ParamType::Boolean),
    )
}

pub fn list_directory_definition() -> ToolDefinition {
    ToolDefinition::new(LIST_DIRECTORY, "List the entries of a directory")
        .with_capability("list")
        .with_parameter(ToolParameter::new(
            "path",
            "Directory to list (default: working directory)",
            false,
        ))
}

/// Resolve a tool-supplied path against the registry's root
pub fn resolve(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

/// Map an I/O failure onto the tool error codes
pub fn io_error(path: &Path, action: &str, e: io::Error) -> ToolError {
    match e.kind() {
        io::ErrorKind::NotFound => ToolError::not_found(path.display().to_string()),
        io::ErrorKind::PermissionDenied => {
            ToolError::permission_denied(path.display().to_string())
        }
        _ => ToolError::execution_failed(format!("Failed to {} {}: {}", action, path.display(), e)),
    }
}

pub fn execute_read_file(root: &Path, params: &Map<String, Value>) -> Result<Value, ToolError> {
    let path = resolve(root, require_str(params, "path")?);

    let metadata = fs::metadata(&path).map_err(|e| io_error(&path, "read", e))?;
    if !metadata.is_file() {
        return Err(ToolError::invalid_argument(format!(
            "'{}' is not a file",
            path.display()
        )));
    }
    if metadata.len() > MAX_READ_SIZE {
        return Err(ToolError::invalid_argument(format!(
            "File too large ({} bytes). Maximum size is {} bytes",
            metadata.len(),
            MAX_READ_SIZE
        )));
    }

    let content = fs::read_to_string(&path).map_err(|e| io_error(&path, "read", e))?;
    let total_lines = content.lines().count();

    let offset = get_usize(params, "offset").unwrap_or(0);
    let limit = get_usize(params, "limit");
    let content = if offset > 0 || limit.is_some() {
        content
            .lines()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .collect::<Vec<_>>()
            .join("\n")
    } else {
        content
    };

    Ok(json!({
        "path": path.display().to_string(),
        "content": content,
        "total_lines": total_lines,
    }))
}

pub fn execute_write_file(root: &Path, params: &Map<String, Value>) -> Result<Value, ToolError> {
    let path = resolve(root, require_str(params, "path")?);
    let content = params
        .get("content")
        .map(as_text)
        .ok_or_else(|| ToolError::invalid_argument("'content' is required"))?;

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        if get_bool(params, "create_dirs").unwrap_or(false) {
            fs::create_dir_all(parent).map_err(|e| io_error(parent, "create", e))?;
        } else {
            return Err(ToolError::not_found(format!(
                "Parent directory does not exist: {}",
                parent.display()
            )));
        }
    }

    fs::write(&path, &content).map_err(|e| io_error(&path, "write", e))?;

    Ok(json!({
        "path": path.display().to_string(),
        "bytes": content.len(),
    }))
}

pub fn execute_list_directory(
    root: &Path,
    params: &Map<String, Value>,
) -> Result<Value, ToolError> {
    let path = resolve(root, get_str(params, "path").unwrap_or("."));

    let mut entries = Vec::new();
    for entry in fs::read_dir(&path).map_err(|e| io_error(&path, "list", e))? {
        let entry = entry.map_err(|e| io_error(&path, "list", e))?;
        let kind = match entry.file_type() {
            Ok(t) if t.is_dir() => "directory",
            Ok(t) if t.is_symlink() => "symlink",
            _ => "file",
        };
        entries.push((entry.file_name().to_string_lossy().into_owned(), kind));
    }
    entries.sort();

    let truncated = entries.len() > MAX_ENTRIES;
    let entries: Vec<Value> = entries
        .into_iter()
        .take(MAX_ENTRIES)
        .map(|(name, kind)| json!({"name": name, "kind": kind}))
        .collect();

    Ok(json!({
        "path": path.display().to_string(),
        "entries": entries,
        "truncated": truncated,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_read_file_success() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "Hello, World!").unwrap();
        let path = temp_file.path().to_str().unwrap();

        let result = execute_read_file(Path::new("."), &params(json!({"path": path}))).unwrap();

        assert!(result["content"].as_str().unwrap().contains("Hello, World!"));
        assert_eq!(result["total_lines"], 1);
    }

    #[test]
    fn test_read_file_not_found() {
        let err = execute_read_file(
            Path::new("."),
            &params(json!({"path": "/nonexistent/file.txt"})),
        )
        .unwrap_err();
        assert_eq!(err.code, ToolError::NOT_FOUND);
    }

    #[test]
    fn test_read_file_with_offset_and_limit() {
        let mut temp_file = NamedTempFile::new().unwrap();
        writeln!(temp_file, "line1\nline2\nline3\nline4\nline5").unwrap();
        let path = temp_file.path().to_str().unwrap();

        let result = execute_read_file(
            Path::new("."),
            &params(json!({"path": path, "offset": 1, "limit": 2})),
        )
        .unwrap();

        assert_eq!(result["content"], "line2\nline3");
    }

    #[test]
    fn test_read_directory_is_rejected() {
        let dir = tempdir().unwrap();
        let err = execute_read_file(dir.path(), &params(json!({"path": "."}))).unwrap_err();
        assert_eq!(err.code, ToolError::INVALID_ARGUMENT);
    }

    #[test]
    fn test_write_file_relative_to_root() {
        let dir = tempdir().unwrap();

        let result = execute_write_file(
            dir.path(),
            &params(json!({"path": "test.txt", "content": "Hello, World!"})),
        )
        .unwrap();

        assert_eq!(result["bytes"], 13);
        assert_eq!(
            fs::read_to_string(dir.path().join("test.txt")).unwrap(),
            "Hello, World!"
        );
    }

    #[test]
    fn test_write_file_serializes_structured_content() {
        let dir = tempdir().unwrap();
        execute_write_file(
            dir.path(),
            &params(json!({"path": "out.json", "content": {"hits": [1, 2]}})),
        )
        .unwrap();
        assert_eq!(
            fs::read_to_string(dir.path().join("out.json")).unwrap(),
            r#"{"hits":[1,2]}"#
        );
    }

    #[test]
    fn test_write_file_create_dirs() {
        let dir = tempdir().unwrap();
        execute_write_file(
            dir.path(),
            &params(json!({"path": "sub/test.txt", "content": "x", "create_dirs": true})),
        )
        .unwrap();
        assert!(dir.path().join("sub/test.txt").exists());
    }

    #[test]
    fn test_write_file_parent_not_exists() {
        let err = execute_write_file(
            Path::new("."),
            &params(json!({"path": "/nonexistent/dir/file.txt", "content": "content"})),
        )
        .unwrap_err();
        assert_eq!(err.code, ToolError::NOT_FOUND);
    }

    #[test]
    fn test_list_directory_sorted() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "").unwrap();
        fs::write(dir.path().join("a.txt"), "").unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();

        let result = execute_list_directory(dir.path(), &Map::new()).unwrap();
        let entries = result["entries"].as_array().unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], json!({"name": "a.txt", "kind": "file"}));
        assert_eq!(entries[2], json!({"name": "sub", "kind": "directory"}));
        assert_eq!(result["truncated"], false);
    }

    #[test]
    fn test_list_missing_directory() {
        let dir = tempdir().unwrap();
        let err = execute_list_directory(dir.path(), &params(json!({"path": "nope"}))).unwrap_err();
        assert_eq!(err.code, ToolError::NOT_FOUND);
    }
}
