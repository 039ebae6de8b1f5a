//! Package loading - files on disk to resolved units
//!
//! A directory holds one or more packages (one per package clause, e.g. `p`
//! and `p_test`). Patterns ending in `/...` select every package directory
//! below a root, skipping `testdata`, `vendor` and hidden directories the way
//! the Go tool does.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use crate::parser::{ast::SourceFile, parse_file};
use crate::resolve::resolve_package;
use crate::types::Unit;
use crate::{Error, Result};

/// Suffix selecting a directory tree instead of a single directory
pub const RECURSIVE_SUFFIX: &str = "...";

/// Expand a command-line pattern to the files or directories it names
///
/// `dir/...` yields every directory under `dir` that contains Go files, in
/// sorted order. Any other pattern is returned as is.
pub fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let Some(prefix) = pattern.strip_suffix(RECURSIVE_SUFFIX) else {
        return Ok(vec![PathBuf::from(pattern)]);
    };
    let root = match prefix.trim_end_matches('/') {
        "" => Path::new("."),
        trimmed => Path::new(trimmed),
    };
    if !root.is_dir() {
        return Err(Error::IoError {
            path: root.to_path_buf(),
            message: "not a directory".into(),
        });
    }

    let mut dirs = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e))
    {
        let entry = entry.map_err(|e| Error::IoError {
            path: e.path().unwrap_or(root).to_path_buf(),
            message: e.to_string(),
        })?;
        if entry.file_type().is_dir() && !go_files(entry.path())?.is_empty() {
            dirs.push(entry.into_path());
        }
    }
    tracing::debug!(pattern, packages = dirs.len(), "expanded pattern");
    Ok(dirs)
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    if !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    name == "testdata" || name == "vendor" || name.starts_with('.') || name.starts_with('_')
}

/// Go source files of a directory, test files excluded, sorted
pub fn go_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, &e))?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| Error::io(dir, &e))?.path();
        if path.is_file() && is_go_source(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn is_go_source(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(".go") && !name.ends_with("_test.go") && !name.starts_with(['.', '_'])
}

fn read_source(path: &Path) -> Result<SourceFile> {
    let source = fs::read_to_string(path).map_err(|e| Error::io(path, &e))?;
    parse_file(&path.display().to_string(), &source)
}

/// Load the packages at `path`: a single `.go` file or a directory
///
/// # Errors
/// I/O failures, parse errors in any file, or files that cannot be grouped.
#[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub fn load_path(path: &Path) -> Result<Vec<Unit>> {
    let files = if path.is_dir() {
        go_files(path)?
    } else if path.exists() {
        vec![path.to_path_buf()]
    } else {
        return Err(Error::IoError {
            path: path.to_path_buf(),
            message: "no such file or directory".into(),
        });
    };
    if files.is_empty() {
        tracing::warn!(path = %path.display(), "no Go files");
        return Ok(Vec::new());
    }

    let mut by_package: BTreeMap<String, Vec<SourceFile>> = BTreeMap::new();
    for file in &files {
        let parsed = read_source(file)?;
        by_package
            .entry(parsed.package.name.clone())
            .or_default()
            .push(parsed);
    }
    by_package
        .values()
        .map(|sources| resolve_package(sources))
        .collect()
}
