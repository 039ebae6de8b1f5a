//! unwrapcheck core - checks that Go error types expose their wrapped causes
//!
//! A declared Go type that implements `error` and structurally holds other
//! errors must declare an `Unwrap` accessor: `Unwrap() error` when it wraps
//! one cause, `Unwrap() []error` (or, leniently, `Unwrap() error`) when it
//! wraps a sequence.
//!
//! # Architecture
//!
//! ```text
//! Go source → Parser → AST → Resolver → Unit
//!                                        ↓
//!                          Driver → Classifier → Accessor lookup → Validator
//!                                        ↓
//!                                  DiagnosticSink
//! ```
//!
//! # Guarantees
//!
//! - **Pure classification**: the classifier is a total function of type and mode
//! - **Deterministic**: diagnostics are sorted by file, line and column
//! - **Non-fatal findings**: violations are diagnostics, never errors

pub mod check;
pub mod classify;
pub mod config;
pub mod error;
pub mod loader;
pub mod methods;
pub mod parser;
pub mod resolve;
pub mod types;
pub mod validate;

pub use check::{check_unit, CheckResult, Collector, Diagnostic, DiagnosticKind, DiagnosticSink};
pub use classify::{classify, Classification, Mode};
pub use config::Config;
pub use error::{Error, Result};
pub use types::{Position, Type, Unit};
pub use validate::{validate, ExpectedShape, Mismatch};

/// Parse, resolve and check a single-file package
///
/// # Example
/// ```
/// use unwrapcheck_core::{check_source, Config};
///
/// let result = check_source(
///     "errs.go",
///     "package errs\n\
///      type Wrapped struct{ cause error }\n\
///      func (w *Wrapped) Error() string { return w.cause.Error() }\n",
///     &Config::default(),
/// ).unwrap();
/// assert_eq!(
///     result.diagnostics[0].message,
///     "error type Wrapped does not implement Unwrap() error"
/// );
/// ```
pub fn check_source(path: &str, source: &str, config: &Config) -> Result<CheckResult> {
    let file = parser::parse_file(path, source)?;
    let unit = resolve::resolve_package(&[file])?;
    Ok(check_unit(&unit, config))
}
