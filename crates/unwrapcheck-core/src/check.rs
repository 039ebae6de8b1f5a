//! Driver - checks every declared type of a unit
//!
//! For each named, non-alias declaration the driver:
//!
//! 1. skips definitions with unresolved type information
//! 2. skips types that do not satisfy the error contract
//! 3. classifies the definition with [`Mode::DECLARATION`]
//! 4. requires an `Unwrap` accessor for `Single` and `Multiple`
//! 5. validates the accessor's results against the classification
//!
//! Declarations are independent, so they are checked in parallel on the
//! rayon pool. Findings are delivered to a [`DiagnosticSink`].

use std::fmt;

use parking_lot::Mutex;
use rayon::prelude::*;
use serde::Serialize;

use crate::classify::{classify, Classification, Mode};
use crate::config::Config;
use crate::methods::find_accessor;
use crate::types::{DeclId, Position, Unit};
use crate::validate::{validate, Mismatch};

// ── Diagnostics ───────────────────────────────────────────

/// Category of finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Error type wraps an error but declares no `Unwrap`
    MissingAccessor,
    /// `Unwrap` declares zero or several results
    ArityMismatch,
    /// `Unwrap` returns the wrong type
    ShapeMismatch,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DiagnosticKind::MissingAccessor => write!(f, "missing-accessor"),
            DiagnosticKind::ArityMismatch => write!(f, "arity-mismatch"),
            DiagnosticKind::ShapeMismatch => write!(f, "shape-mismatch"),
        }
    }
}

/// A single finding, anchored at a source position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub position: Position,
    /// Name of the declared type the finding is about
    pub type_name: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.message)
    }
}

/// Receives diagnostics; shared by all worker threads of one check
pub trait DiagnosticSink: Sync {
    fn report(&self, diagnostic: Diagnostic);
}

/// Sink that keeps every diagnostic in memory
#[derive(Debug, Default)]
pub struct Collector {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl Collector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collected diagnostics ordered by file, line, column
    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.into_inner();
        diagnostics.sort_by(|a, b| {
            a.position
                .cmp(&b.position)
                .then_with(|| a.message.cmp(&b.message))
        });
        diagnostics
    }
}

impl DiagnosticSink for Collector {
    fn report(&self, diagnostic: Diagnostic) {
        self.diagnostics.lock().push(diagnostic);
    }
}

// ── Check result ──────────────────────────────────────────

/// Outcome of checking one unit
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CheckResult {
    pub package: String,
    pub diagnostics: Vec<Diagnostic>,
}

impl CheckResult {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> Vec<&Diagnostic> {
        self.diagnostics.iter().filter(|d| d.kind == kind).collect()
    }
}

// ── Driver ────────────────────────────────────────────────

/// Check a unit and collect its diagnostics in source order
pub fn check_unit(unit: &Unit, config: &Config) -> CheckResult {
    let collector = Collector::new();
    report_unit(unit, config, &collector);
    CheckResult {
        package: unit.package.clone(),
        diagnostics: collector.into_sorted(),
    }
}

/// Check every declaration of a unit in parallel, reporting into `sink`
#[tracing::instrument(level = "debug", skip_all, fields(package = %unit.package))]
pub fn report_unit(unit: &Unit, config: &Config, sink: &dyn DiagnosticSink) {
    let ids: Vec<DeclId> = unit.decls().map(|(id, _)| id).collect();
    ids.par_iter().for_each(|&id| {
        if let Some(diagnostic) = check_decl(unit, id, config.strict_unwrap) {
            sink.report(diagnostic);
        }
    });
    tracing::debug!(decls = ids.len(), "unit checked");
}

/// Check one declaration; at most one diagnostic per declaration
pub fn check_decl(unit: &Unit, id: DeclId, strict: bool) -> Option<Diagnostic> {
    let decl = unit.decl(id);
    if decl.alias || decl.is_anonymous() {
        return None;
    }
    if decl.definition.contains_invalid() {
        tracing::debug!(name = %decl.name, "skipping declaration with unresolved types");
        return None;
    }
    if !unit.satisfies_error_contract(&unit.declared_type(id)) {
        return None;
    }

    let classification = classify(unit, &decl.definition, Mode::DECLARATION);
    tracing::debug!(name = %decl.name, %classification, "classified error type");
    if classification == Classification::None {
        return None;
    }

    let Some(accessor) = find_accessor(&decl.methods) else {
        let shape = match classification {
            Classification::Multiple => "[]error",
            _ => "error",
        };
        return Some(Diagnostic {
            kind: DiagnosticKind::MissingAccessor,
            position: decl.position.clone(),
            type_name: decl.name.clone(),
            message: format!(
                "error type {} does not implement Unwrap() {}",
                decl.name, shape
            ),
        });
    };

    let mismatch = validate(unit, &accessor.signature, classification, strict).err()?;
    let kind = match mismatch {
        Mismatch::Arity { .. } => DiagnosticKind::ArityMismatch,
        Mismatch::Shape { .. } => DiagnosticKind::ShapeMismatch,
    };
    Some(Diagnostic {
        kind,
        position: accessor.position.clone(),
        type_name: decl.name.clone(),
        message: mismatch.to_string(),
    })
}
