//! Fixture conformance tests
//!
//! Each directory under `tests/fixtures/` is a Go package. Lines carrying
//! `// want `regex`` must receive exactly one diagnostic whose message
//! matches; every other line must receive none.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use regex::Regex;
use unwrapcheck_core::loader::{go_files, load_path};
use unwrapcheck_core::{check_unit, Config, Diagnostic};

fn fixture_dir(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

/// `(file, line)` → expected message patterns
fn expectations(dir: &Path) -> BTreeMap<(String, usize), Vec<Regex>> {
    let want = Regex::new(r"// want (.*)$").expect("valid regex");
    let quoted = Regex::new(r"`([^`]*)`").expect("valid regex");
    let mut expected = BTreeMap::new();
    for file in go_files(dir).expect("fixture dir readable") {
        let source = fs::read_to_string(&file).expect("fixture readable");
        for (i, line) in source.lines().enumerate() {
            let Some(caps) = want.captures(line) else {
                continue;
            };
            let patterns = quoted
                .captures_iter(&caps[1])
                .map(|c| Regex::new(&c[1]).expect("want pattern compiles"))
                .collect();
            expected.insert((file.display().to_string(), i + 1), patterns);
        }
    }
    expected
}

fn run(name: &str, config: Config) {
    let dir = fixture_dir(name);
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    for unit in load_path(&dir).expect("fixture loads") {
        assert!(
            unit.warnings().is_empty(),
            "{}: unexpected resolution warnings {:?}",
            name,
            unit.warnings()
        );
        diagnostics.extend(check_unit(&unit, &config).diagnostics);
    }

    let mut expected = expectations(&dir);
    let mut failures = Vec::new();
    for diagnostic in &diagnostics {
        let key = (diagnostic.position.file.clone(), diagnostic.position.line);
        let patterns = expected.entry(key).or_default();
        match patterns.iter().position(|p| p.is_match(&diagnostic.message)) {
            Some(i) => {
                patterns.remove(i);
            }
            None => failures.push(format!("unexpected diagnostic: {}", diagnostic)),
        }
    }
    for ((file, line), patterns) in expected {
        for pattern in patterns {
            failures.push(format!("{}:{}: no diagnostic matched `{}`", file, line, pattern));
        }
    }
    assert!(failures.is_empty(), "{}:\n{}", name, failures.join("\n"));
}

#[test]
fn test_errortype() {
    run("errortype", Config::default());
}

#[test]
fn test_embedding() {
    run("embedding", Config::default());
}

#[test]
fn test_generics() {
    run("generics", Config::default());
}

#[test]
fn test_strict_mode() {
    run("strict", Config::strict());
}

#[test]
fn test_cycles_terminate() {
    run("cycles", Config::default());
}

#[test]
fn test_accessor_signatures() {
    run("accessors", Config::default());
}

#[test]
fn test_clean_package() {
    run("clean", Config::strict());
}

#[test]
fn test_repeated_runs_are_identical() {
    let dir = fixture_dir("errortype");
    let units = load_path(&dir).expect("fixture loads");
    let first: Vec<_> = units
        .iter()
        .flat_map(|u| check_unit(u, &Config::default()).diagnostics)
        .collect();
    for _ in 0..8 {
        let again: Vec<_> = units
            .iter()
            .flat_map(|u| check_unit(u, &Config::default()).diagnostics)
            .collect();
        assert_eq!(first, again);
    }
}
