//! Accessor signature validation
//!
//! Return types are compared by their rendered text, so a result type that
//! merely satisfies the error contract is still a mismatch.

use std::fmt;

use serde::Serialize;

use crate::classify::Classification;
use crate::types::{Signature, Unit};

/// Return shapes accepted for an `Unwrap` accessor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExpectedShape {
    /// `error`
    Error,
    /// `[]error`
    ErrorSlice,
    /// `error` or `[]error`
    Either,
}

impl ExpectedShape {
    fn accepts(self, rendered: &str) -> bool {
        match self {
            ExpectedShape::Error => rendered == "error",
            ExpectedShape::ErrorSlice => rendered == "[]error",
            ExpectedShape::Either => rendered == "error" || rendered == "[]error",
        }
    }
}

impl fmt::Display for ExpectedShape {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ExpectedShape::Error => write!(f, "error"),
            ExpectedShape::ErrorSlice => write!(f, "[]error"),
            ExpectedShape::Either => write!(f, "error or []error"),
        }
    }
}

/// Shape an accessor must return for a classification; `None` needs no accessor
pub fn expected_shape(classification: Classification, strict: bool) -> Option<ExpectedShape> {
    match classification {
        Classification::None => None,
        Classification::Single => Some(ExpectedShape::Error),
        Classification::Multiple if strict => Some(ExpectedShape::ErrorSlice),
        Classification::Multiple => Some(ExpectedShape::Either),
    }
}

/// Why an existing accessor does not fit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mismatch {
    /// Not exactly one result; `actual` is the whole result tuple
    Arity { expected: ExpectedShape, actual: String },
    /// One result of the wrong type
    Shape { expected: ExpectedShape, actual: String },
}

impl Mismatch {
    pub fn expected(&self) -> ExpectedShape {
        match self {
            Mismatch::Arity { expected, .. } | Mismatch::Shape { expected, .. } => *expected,
        }
    }

    pub fn actual(&self) -> &str {
        match self {
            Mismatch::Arity { actual, .. } | Mismatch::Shape { actual, .. } => actual,
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Expected Unwrap to return {}, got {}",
            self.expected(),
            self.actual()
        )
    }
}

/// Check an accessor's results against the classification of its type
///
/// A `None` classification accepts any accessor.
pub fn validate(
    unit: &Unit,
    accessor: &Signature,
    classification: Classification,
    strict: bool,
) -> Result<(), Mismatch> {
    let Some(expected) = expected_shape(classification, strict) else {
        return Ok(());
    };
    let [result] = accessor.results.as_slice() else {
        return Err(Mismatch::Arity {
            expected,
            actual: unit.display_tuple(&accessor.results),
        });
    };
    let actual = unit.display(&result.ty).to_string();
    if expected.accepts(&actual) {
        Ok(())
    } else {
        Err(Mismatch::Shape { expected, actual })
    }
}
