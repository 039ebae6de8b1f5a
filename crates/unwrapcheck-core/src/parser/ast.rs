//! Go declaration AST - the parsed shape of one source file
//!
//! Only what the checker needs survives parsing: the package clause,
//! imports, type declarations (including those local to a function body)
//! and method declarations. Statements, plain function signatures, `var`
//! and `const` declarations are skipped by the parser.
//!
//! All AST types are immutable after construction.

use super::tokenizer::Span;

/// An identifier together with where it appeared
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub name: String,
    pub span: Span,
}

impl Ident {
    pub fn new(name: impl Into<String>, span: Span) -> Self {
        Ident {
            name: name.into(),
            span,
        }
    }
}

/// One parsed `.go` file
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    pub path: String,
    pub package: Ident,
    pub imports: Vec<Import>,
    pub decls: Vec<Decl>,
}

/// `import alias "path"`
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    /// Explicit name: an identifier, `.` or `_`
    pub alias: Option<String>,
    pub path: String,
    pub span: Span,
}

impl Import {
    /// Name the import is referred to by in qualified identifiers
    pub fn local_name(&self) -> &str {
        match &self.alias {
            Some(alias) => alias,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Type(TypeSpec),
    Method(MethodDecl),
    Local(LocalTypes),
}

/// `type Name[Params] Type` or `type Name = Type`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    pub params: Vec<TypeParamNode>,
    pub alias: bool,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeParamNode {
    pub name: Ident,
    pub constraint: TypeExpr,
}

/// `func (recv) Name(params) results`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDecl {
    pub receiver: Receiver,
    pub name: Ident,
    pub signature: SignatureNode,
}

/// Type declarations found in one function or method body
#[derive(Debug, Clone, PartialEq)]
pub struct LocalTypes {
    pub func: Ident,
    /// Type parameters of a generic function
    pub type_params: Vec<TypeParamNode>,
    /// Set when the body belongs to a method
    pub receiver: Option<Receiver>,
    /// In source order; each is visible to the ones after it
    pub specs: Vec<TypeSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receiver {
    pub name: Option<Ident>,
    pub pointer: bool,
    pub base: Ident,
    /// Receiver type parameter names, positional
    pub type_params: Vec<Ident>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SignatureNode {
    pub params: Vec<ParamNode>,
    pub results: Vec<ParamNode>,
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParamNode {
    pub name: Option<Ident>,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldNode {
    /// Empty for embedded fields
    pub names: Vec<Ident>,
    pub ty: TypeExpr,
    pub embedded: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InterfaceElem {
    Method { name: Ident, signature: SignatureNode },
    /// Embedded interface or type-set union (`~int | string`)
    Embed(TypeExpr),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnionTerm {
    pub tilde: bool,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Type expressions as written in source
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    /// `name`, `pkg.name`, optionally instantiated `name[args]`
    Name {
        package: Option<Ident>,
        name: Ident,
        args: Vec<TypeExpr>,
    },
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    /// Length kept as written; it never affects classification
    Array { len: String, elem: Box<TypeExpr> },
    Map { key: Box<TypeExpr>, value: Box<TypeExpr> },
    Chan { dir: ChanDir, elem: Box<TypeExpr> },
    Func(SignatureNode),
    Struct(Vec<FieldNode>),
    Interface(Vec<InterfaceElem>),
    /// Constraint union with more than one term, or a single `~T` term
    Union(Vec<UnionTerm>),
}
