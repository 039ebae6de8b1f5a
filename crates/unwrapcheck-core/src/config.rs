//! Checker configuration
//!
//! Loaded from `--config FILE`, or from the nearest `.unwrapcheck.toml`
//! walking up from the working directory. Command-line flags override
//! whatever the file says.
//!
//! ```toml
//! strict-unwrap = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// File name searched for during discovery
pub const CONFIG_FILE_NAME: &str = ".unwrapcheck.toml";

/// Directories inspected, starting directory included
const MAX_TRAVERSAL_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct Config {
    /// Multiple-cause types must declare exactly `Unwrap() []error`
    pub strict_unwrap: bool,
}

impl Config {
    pub fn strict() -> Self {
        Config {
            strict_unwrap: true,
        }
    }

    /// Parse a TOML document
    ///
    /// # Errors
    /// `ConfigError` for malformed TOML, unknown keys or wrong value types.
    pub fn from_toml(contents: &str) -> Result<Config> {
        toml::from_str(contents).map_err(|e| Error::ConfigError(e.to_string()))
    }

    /// Read and parse a config file
    pub fn load(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, &e))?;
        Self::from_toml(&contents).map_err(|e| match e {
            Error::ConfigError(msg) => {
                Error::ConfigError(format!("{}: {}", path.display(), msg.trim_end()))
            }
            other => other,
        })
    }
}

/// `start` and its parents, nearest first, at most `max_depth` entries
pub fn directory_ancestors(start: &Path, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start.to_path_buf()), |dir| {
        let mut parent = dir.clone();
        parent.pop().then_some(parent)
    })
    .take(max_depth)
}

/// Nearest `.unwrapcheck.toml` at or above `start`
pub fn find_config_file(start: &Path) -> Option<PathBuf> {
    directory_ancestors(start, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(CONFIG_FILE_NAME))
        .find(|path| path.is_file())
}

/// Resolve the effective configuration
///
/// An explicit path must exist; a discovered file is only used when found.
/// Without either, defaults apply.
pub fn load_config(explicit: Option<&Path>, start: &Path) -> Result<Config> {
    if let Some(path) = explicit {
        return Config::load(path);
    }
    match find_config_file(start) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "using discovered config");
            Config::load(&path)
        }
        None => {
            tracing::debug!(
                "no {} within {} directories, using defaults",
                CONFIG_FILE_NAME,
                MAX_TRAVERSAL_DEPTH
            );
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir()
            .join(format!("unwrapcheck_config_{}_{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn test_defaults_are_lenient() {
        assert!(!Config::default().strict_unwrap);
        assert_eq!(Config::from_toml("").expect("empty parses"), Config::default());
    }

    #[test]
    fn test_parse_kebab_case_key() {
        let config = Config::from_toml("strict-unwrap = true\n").expect("parses");
        assert_eq!(config, Config::strict());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml("strict_unwrap = true\n").unwrap_err();
        assert!(matches!(err, Error::ConfigError(_)), "got {:?}", err);
    }

    #[test]
    fn test_wrong_value_type_rejected() {
        assert!(Config::from_toml("strict-unwrap = \"yes\"\n").is_err());
    }

    #[test]
    fn test_directory_ancestors_bounded() {
        let dirs: Vec<PathBuf> = directory_ancestors(Path::new("/a/b/c/d"), 3).collect();
        assert_eq!(
            dirs,
            vec![
                PathBuf::from("/a/b/c/d"),
                PathBuf::from("/a/b/c"),
                PathBuf::from("/a/b")
            ]
        );
    }

    #[test]
    fn test_discovers_config_in_parent() {
        let root = scratch_dir("discover");
        let nested = root.join("pkg").join("sub");
        fs::create_dir_all(&nested).expect("create nested");
        fs::write(root.join(CONFIG_FILE_NAME), "strict-unwrap = true\n").expect("write config");

        assert_eq!(find_config_file(&nested), Some(root.join(CONFIG_FILE_NAME)));
        assert_eq!(load_config(None, &nested).expect("loads"), Config::strict());
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_explicit_missing_file_is_io_error() {
        let root = scratch_dir("missing");
        let err = load_config(Some(&root.join("nope.toml")), &root).unwrap_err();
        assert!(matches!(err, Error::IoError { .. }), "got {:?}", err);
        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn test_invalid_file_error_names_path() {
        let root = scratch_dir("invalid");
        let path = root.join("bad.toml");
        fs::write(&path, "strict-unwrap = \n").expect("write config");
        let err = Config::load(&path).unwrap_err();
        assert!(err.to_string().contains("bad.toml"), "got {}", err);
        let _ = fs::remove_dir_all(&root);
    }
}
