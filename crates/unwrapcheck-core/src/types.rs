//! Type model - resolved Go types of one package
//!
//! A [`Unit`] is the value object the checker queries: it owns every type
//! declaration of a package, answers structural questions about types
//! (`underlying`, interface-ness) and renders types the way `go/types` does.
//! Method sets and the error-contract query live in [`crate::methods`].
//!
//! Types are plain immutable data (`Send + Sync`), so any number of threads
//! may query the same unit.

use std::fmt;

use serde::Serialize;

pub use crate::parser::ast::ChanDir;
use crate::parser::tokenizer::Span;

/// Longest chain of named-to-named definitions followed before giving up
const MAX_NAMED_CHAIN: usize = 64;

// ── Positions ─────────────────────────────────────────────

/// A source location: file plus line and column
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Position {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: &str, span: Span) -> Self {
        Position {
            file: file.to_string(),
            line: span.line,
            column: span.column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

// ── Types ─────────────────────────────────────────────────

/// Index of a type declaration within its [`Unit`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeclId(pub(crate) usize);

impl DeclId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    String,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    Byte,
    Rune,
}

impl BasicKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" => BasicKind::Bool,
            "string" => BasicKind::String,
            "int" => BasicKind::Int,
            "int8" => BasicKind::Int8,
            "int16" => BasicKind::Int16,
            "int32" => BasicKind::Int32,
            "int64" => BasicKind::Int64,
            "uint" => BasicKind::Uint,
            "uint8" => BasicKind::Uint8,
            "uint16" => BasicKind::Uint16,
            "uint32" => BasicKind::Uint32,
            "uint64" => BasicKind::Uint64,
            "uintptr" => BasicKind::Uintptr,
            "float32" => BasicKind::Float32,
            "float64" => BasicKind::Float64,
            "complex64" => BasicKind::Complex64,
            "complex128" => BasicKind::Complex128,
            "byte" => BasicKind::Byte,
            "rune" => BasicKind::Rune,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::String => "string",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::Byte => "byte",
            BasicKind::Rune => "rune",
        }
    }
}

/// A reference to a named type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NamedRef {
    /// The predeclared `error` interface
    Error,
    /// A type declared in the unit, instantiated with `args`
    Decl { id: DeclId, args: Vec<Type> },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StructType {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: Option<String>,
    pub ty: Type,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceMethod {
    pub name: String,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InterfaceType {
    pub methods: Vec<InterfaceMethod>,
    /// Embedded interfaces, flattened on demand
    pub embeds: Vec<Type>,
    /// Has type-set terms (`~int | string`); only valid as a constraint
    pub type_set: bool,
}

/// A qualified reference into another package; its structure is unknown
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalRef {
    pub path: String,
    pub name: String,
    pub args: Vec<Type>,
}

/// A resolved Go type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// Unresolvable type information
    Invalid,
    Basic(BasicKind),
    Named(NamedRef),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    Array { len: String, elem: Box<Type> },
    Map { key: Box<Type>, value: Box<Type> },
    Chan { dir: ChanDir, elem: Box<Type> },
    Struct(StructType),
    Interface(InterfaceType),
    Signature(Signature),
    /// Type parameter `index` of declaration `decl`
    Param { decl: DeclId, index: usize, name: String },
    External(ExternalRef),
}

impl Type {
    /// The predeclared `error` type
    pub fn error() -> Type {
        Type::Named(NamedRef::Error)
    }

    pub fn pointer(elem: Type) -> Type {
        Type::Pointer(Box::new(elem))
    }

    pub fn slice(elem: Type) -> Type {
        Type::Slice(Box::new(elem))
    }

    /// `interface{ Error() string }`, the underlying type of `error`
    pub fn error_interface() -> Type {
        Type::Interface(InterfaceType {
            methods: vec![InterfaceMethod {
                name: "Error".to_string(),
                signature: Signature {
                    params: Vec::new(),
                    results: vec![Param {
                        name: None,
                        ty: Type::Basic(BasicKind::String),
                    }],
                    variadic: false,
                },
            }],
            embeds: Vec::new(),
            type_set: false,
        })
    }

    /// Whether any part of this type failed to resolve
    pub fn contains_invalid(&self) -> bool {
        match self {
            Type::Invalid => true,
            Type::Basic(_) | Type::Param { .. } => false,
            Type::Named(NamedRef::Error) => false,
            Type::Named(NamedRef::Decl { args, .. }) => args.iter().any(Type::contains_invalid),
            Type::External(ext) => ext.args.iter().any(Type::contains_invalid),
            Type::Pointer(elem) | Type::Slice(elem) => elem.contains_invalid(),
            Type::Array { elem, .. } | Type::Chan { elem, .. } => elem.contains_invalid(),
            Type::Map { key, value } => key.contains_invalid() || value.contains_invalid(),
            Type::Struct(st) => st.fields.iter().any(|f| f.ty.contains_invalid()),
            Type::Interface(iface) => {
                iface.embeds.iter().any(Type::contains_invalid)
                    || iface.methods.iter().any(|m| m.signature.contains_invalid())
            }
            Type::Signature(sig) => sig.contains_invalid(),
        }
    }

    /// Replace the type parameters of `decl` with `args`
    pub fn substitute(&self, decl: DeclId, args: &[Type]) -> Type {
        if args.is_empty() {
            return self.clone();
        }
        let sub = |t: &Type| t.substitute(decl, args);
        let boxed = |t: &Type| Box::new(t.substitute(decl, args));
        match self {
            Type::Param { decl: owner, index, .. } if *owner == decl && *index < args.len() => {
                args[*index].clone()
            }
            Type::Invalid | Type::Basic(_) | Type::Param { .. } | Type::Named(NamedRef::Error) => {
                self.clone()
            }
            Type::Named(NamedRef::Decl { id, args: inner }) => Type::Named(NamedRef::Decl {
                id: *id,
                args: inner.iter().map(sub).collect(),
            }),
            Type::External(ext) => Type::External(ExternalRef {
                path: ext.path.clone(),
                name: ext.name.clone(),
                args: ext.args.iter().map(sub).collect(),
            }),
            Type::Pointer(elem) => Type::Pointer(boxed(elem)),
            Type::Slice(elem) => Type::Slice(boxed(elem)),
            Type::Array { len, elem } => Type::Array {
                len: len.clone(),
                elem: boxed(elem),
            },
            Type::Map { key, value } => Type::Map {
                key: boxed(key),
                value: boxed(value),
            },
            Type::Chan { dir, elem } => Type::Chan {
                dir: *dir,
                elem: boxed(elem),
            },
            Type::Struct(st) => Type::Struct(StructType {
                fields: st
                    .fields
                    .iter()
                    .map(|f| Field {
                        name: f.name.clone(),
                        ty: sub(&f.ty),
                        embedded: f.embedded,
                    })
                    .collect(),
            }),
            Type::Interface(iface) => Type::Interface(InterfaceType {
                methods: iface
                    .methods
                    .iter()
                    .map(|m| InterfaceMethod {
                        name: m.name.clone(),
                        signature: m.signature.substitute(decl, args),
                    })
                    .collect(),
                embeds: iface.embeds.iter().map(sub).collect(),
                type_set: iface.type_set,
            }),
            Type::Signature(sig) => Type::Signature(sig.substitute(decl, args)),
        }
    }
}

impl Signature {
    fn contains_invalid(&self) -> bool {
        self.params
            .iter()
            .chain(&self.results)
            .any(|p| p.ty.contains_invalid())
    }

    pub fn substitute(&self, decl: DeclId, args: &[Type]) -> Signature {
        let sub = |p: &Param| Param {
            name: p.name.clone(),
            ty: p.ty.substitute(decl, args),
        };
        Signature {
            params: self.params.iter().map(sub).collect(),
            results: self.results.iter().map(sub).collect(),
            variadic: self.variadic,
        }
    }
}

// ── Declarations ──────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamDecl {
    pub name: String,
    pub constraint: Type,
}

/// A method declared directly on a type (not promoted)
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    pub name: String,
    pub pointer_receiver: bool,
    pub signature: Signature,
    pub position: Position,
}

/// A declared type: `type Name[Params] Definition` plus its methods
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub name: String,
    pub position: Position,
    pub alias: bool,
    pub params: Vec<TypeParamDecl>,
    pub definition: Type,
    pub methods: Vec<Method>,
}

impl TypeDecl {
    /// `_` declarations introduce no usable type
    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty() || self.name == "_"
    }
}

/// A non-fatal problem found while resolving declarations
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolveWarning {
    pub position: Position,
    pub message: String,
}

/// One compilation unit (a Go package) with fully resolved declarations
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub package: String,
    pub(crate) decls: Vec<TypeDecl>,
    pub(crate) warnings: Vec<ResolveWarning>,
}

impl Unit {
    /// Build a unit from already-resolved declarations
    pub fn new(package: impl Into<String>, decls: Vec<TypeDecl>) -> Self {
        Unit {
            package: package.into(),
            decls,
            warnings: Vec::new(),
        }
    }

    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &TypeDecl)> {
        self.decls.iter().enumerate().map(|(i, d)| (DeclId(i), d))
    }

    pub fn decl(&self, id: DeclId) -> &TypeDecl {
        &self.decls[id.0]
    }

    pub fn lookup(&self, name: &str) -> Option<DeclId> {
        self.decls
            .iter()
            .position(|d| d.name == name)
            .map(DeclId)
    }

    pub fn warnings(&self) -> &[ResolveWarning] {
        &self.warnings
    }

    /// The declared type itself, instantiated with its own parameters
    pub fn declared_type(&self, id: DeclId) -> Type {
        let args = self
            .decl(id)
            .params
            .iter()
            .enumerate()
            .map(|(index, p)| Type::Param {
                decl: id,
                index,
                name: p.name.clone(),
            })
            .collect();
        Type::Named(NamedRef::Decl { id, args })
    }

    pub fn param_constraint(&self, decl: DeclId, index: usize) -> Type {
        self.decls
            .get(decl.0)
            .and_then(|d| d.params.get(index))
            .map(|p| p.constraint.clone())
            .unwrap_or(Type::Invalid)
    }

    /// Structural definition behind any chain of named types
    pub fn underlying(&self, ty: &Type) -> Type {
        let mut current = ty.clone();
        for _ in 0..MAX_NAMED_CHAIN {
            current = match current {
                Type::Named(NamedRef::Error) => return Type::error_interface(),
                Type::Named(NamedRef::Decl { id, args }) => match self.decls.get(id.0) {
                    Some(decl) => decl.definition.substitute(id, &args),
                    None => return Type::Invalid,
                },
                Type::Param { decl, index, .. } => {
                    let constraint = self.param_constraint(decl, index);
                    return match self.underlying(&constraint) {
                        Type::Interface(iface) => Type::Interface(iface),
                        _ => Type::Interface(InterfaceType::default()),
                    };
                }
                other => return other,
            };
        }
        Type::Invalid
    }

    /// Interfaces and type parameters
    pub fn is_interface(&self, ty: &Type) -> bool {
        match ty {
            Type::Param { .. } | Type::Interface(_) | Type::Named(NamedRef::Error) => true,
            Type::Named(_) => matches!(self.underlying(ty), Type::Interface(_)),
            _ => false,
        }
    }

    /// Render a type the way `go/types` prints it
    pub fn display<'a>(&'a self, ty: &'a Type) -> TypeDisplay<'a> {
        TypeDisplay { unit: self, ty }
    }

    /// Render a result list as a tuple: `()`, `(int, error)`, `(n int, err error)`
    pub fn display_tuple(&self, params: &[Param]) -> String {
        let items: Vec<String> = params
            .iter()
            .map(|p| match &p.name {
                Some(name) => format!("{} {}", name, self.display(&p.ty)),
                None => self.display(&p.ty).to_string(),
            })
            .collect();
        format!("({})", items.join(", "))
    }
}

// ── Display ───────────────────────────────────────────────

pub struct TypeDisplay<'a> {
    unit: &'a Unit,
    ty: &'a Type,
}

impl TypeDisplay<'_> {
    fn nested<'b>(&'b self, ty: &'b Type) -> TypeDisplay<'b> {
        TypeDisplay {
            unit: self.unit,
            ty,
        }
    }

    fn write_args(&self, f: &mut fmt::Formatter, args: &[Type]) -> fmt::Result {
        if args.is_empty() {
            return Ok(());
        }
        write!(f, "[")?;
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", self.nested(arg))?;
        }
        write!(f, "]")
    }

    fn write_signature(&self, f: &mut fmt::Formatter, sig: &Signature) -> fmt::Result {
        write!(f, "(")?;
        for (i, p) in sig.params.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            if sig.variadic && i + 1 == sig.params.len() {
                write!(f, "...")?;
            }
            write!(f, "{}", self.nested(&p.ty))?;
        }
        write!(f, ")")?;
        match sig.results.as_slice() {
            [] => Ok(()),
            [single] if single.name.is_none() => write!(f, " {}", self.nested(&single.ty)),
            results => write!(f, " {}", self.unit.display_tuple(results)),
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.ty {
            Type::Invalid => write!(f, "invalid type"),
            Type::Basic(kind) => write!(f, "{}", kind.name()),
            Type::Named(NamedRef::Error) => write!(f, "error"),
            Type::Named(NamedRef::Decl { id, args }) => {
                let name = self
                    .unit
                    .decls
                    .get(id.0)
                    .map(|d| d.name.as_str())
                    .unwrap_or("?");
                write!(f, "{}.{}", self.unit.package, name)?;
                self.write_args(f, args)
            }
            Type::Pointer(elem) => write!(f, "*{}", self.nested(elem)),
            Type::Slice(elem) => write!(f, "[]{}", self.nested(elem)),
            Type::Array { len, elem } => write!(f, "[{}]{}", len, self.nested(elem)),
            Type::Map { key, value } => {
                write!(f, "map[{}]{}", self.nested(key), self.nested(value))
            }
            Type::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {}", self.nested(elem)),
                ChanDir::Send => write!(f, "chan<- {}", self.nested(elem)),
                ChanDir::Recv => write!(f, "<-chan {}", self.nested(elem)),
            },
            Type::Struct(st) => {
                write!(f, "struct{{")?;
                for (i, field) in st.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", self.nested(&field.ty))?;
                    } else {
                        write!(f, "{} {}", field.name, self.nested(&field.ty))?;
                    }
                }
                write!(f, "}}")
            }
            Type::Interface(iface) => {
                write!(f, "interface{{")?;
                let mut first = true;
                for embed in &iface.embeds {
                    if !first {
                        write!(f, "; ")?;
                    }
                    first = false;
                    write!(f, "{}", self.nested(embed))?;
                }
                for method in &iface.methods {
                    if !first {
                        write!(f, "; ")?;
                    }
                    first = false;
                    write!(f, "{}", method.name)?;
                    self.write_signature(f, &method.signature)?;
                }
                write!(f, "}}")
            }
            Type::Signature(sig) => {
                write!(f, "func")?;
                self.write_signature(f, sig)
            }
            Type::Param { name, .. } => write!(f, "{}", name),
            Type::External(ext) => {
                write!(f, "{}.{}", ext.path, ext.name)?;
                self.write_args(f, &ext.args)
            }
        }
    }
}
