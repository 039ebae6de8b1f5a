//! Type-shape classifier
//!
//! Decides how many error values a type wraps: none, a single one, or a
//! sequence. The classifier is a pure function of the type and the traversal
//! [`Mode`]; it never reports anything.

use std::fmt;

use serde::Serialize;

use crate::types::{NamedRef, Type, Unit};

/// Named expansions allowed on one path before the branch is cut off
const MAX_NAMED_DEPTH: usize = 64;

/// How many error values a type wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    None,
    Single,
    Multiple,
}

impl Classification {
    pub fn wraps(self) -> bool {
        self != Classification::None
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Classification::None => write!(f, "none"),
            Classification::Single => write!(f, "single"),
            Classification::Multiple => write!(f, "multiple"),
        }
    }
}

/// Traversal flags for one classification step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Mode {
    /// Descend into the fields of a struct
    pub traverse_records: bool,
    /// An interface-typed value counts as an error when it has `Error() string`
    pub permit_interface_match: bool,
}

impl Mode {
    /// Mode for the definition of a declared type
    pub const DECLARATION: Mode = Mode {
        traverse_records: true,
        permit_interface_match: false,
    };

    /// Mode for a struct field; only embedded fields are traversed further
    pub fn field(embedded: bool) -> Mode {
        Mode {
            traverse_records: embedded,
            permit_interface_match: true,
        }
    }

    /// Mode for the element of a slice or array
    pub fn element(self) -> Mode {
        Mode {
            traverse_records: self.traverse_records,
            permit_interface_match: true,
        }
    }
}

/// Classify `ty` under `mode`
pub fn classify(unit: &Unit, ty: &Type, mode: Mode) -> Classification {
    Classifier {
        unit,
        stack: Vec::new(),
        embedded: Vec::new(),
    }
    .classify(ty, mode)
}

struct Classifier<'u> {
    unit: &'u Unit,
    /// Named types being expanded on the current path
    stack: Vec<(NamedRef, Mode)>,
    /// Named types whose value embedding is being expanded
    embedded: Vec<NamedRef>,
}

impl Classifier<'_> {
    fn classify(&mut self, ty: &Type, mode: Mode) -> Classification {
        match ty {
            Type::Invalid | Type::Basic(_) => Classification::None,
            Type::Named(named) => self.classify_named(named, ty, mode),
            Type::Pointer(elem) => self.classify(elem, mode),
            Type::Slice(elem) | Type::Array { elem, .. } => {
                match self.classify(elem, mode.element()) {
                    Classification::None => Classification::None,
                    _ => Classification::Multiple,
                }
            }
            Type::Struct(st) if mode.traverse_records => {
                let mut result = Classification::None;
                for field in &st.fields {
                    let inner = if field.embedded {
                        self.classify_embedded(&field.ty)
                    } else {
                        self.classify(&field.ty, Mode::field(false))
                    };
                    match inner {
                        Classification::Multiple => return Classification::Multiple,
                        Classification::Single => result = Classification::Single,
                        Classification::None => {}
                    }
                }
                result
            }
            _ => self.contract(ty, mode),
        }
    }

    fn classify_named(&mut self, named: &NamedRef, ty: &Type, mode: Mode) -> Classification {
        let key = (named.clone(), mode);
        if self.stack.contains(&key) || self.depth() >= MAX_NAMED_DEPTH {
            return Classification::None;
        }
        self.stack.push(key);
        let inner = self.classify(&self.unit.underlying(ty), mode);
        self.stack.pop();
        if inner.wraps() {
            return inner;
        }
        self.contract(ty, mode)
    }

    /// Embedded fields are classified by their underlying type. A value
    /// embedding never passes through `classify_named`, so it is guarded here.
    fn classify_embedded(&mut self, ty: &Type) -> Classification {
        let mode = Mode::field(true);
        let Type::Named(named) = ty else {
            return self.classify(&self.unit.underlying(ty), mode);
        };
        if self.embedded.contains(named) || self.depth() >= MAX_NAMED_DEPTH {
            return Classification::None;
        }
        self.embedded.push(named.clone());
        let inner = self.classify(&self.unit.underlying(ty), mode);
        self.embedded.pop();
        inner
    }

    fn depth(&self) -> usize {
        self.stack.len() + self.embedded.len()
    }

    /// The fallback test: does the type itself satisfy the error contract
    fn contract(&self, ty: &Type, mode: Mode) -> Classification {
        if !mode.permit_interface_match && self.unit.is_interface(ty) {
            return Classification::None;
        }
        if self.unit.satisfies_error_contract(ty) {
            Classification::Single
        } else {
            Classification::None
        }
    }
}
