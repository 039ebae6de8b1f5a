//! Name resolution - parsed files to a [`Unit`]
//!
//! Names resolve through, in order: types and type parameters local to a
//! function body, type parameters in scope, the package's own type
//! declarations (aliases are replaced by their targets), the predeclared
//! universe, and the file's imports. Anything else becomes
//! [`Type::Invalid`] with a warning; a bad name never aborts the package.

use std::collections::HashMap;

use crate::parser::ast::{
    Decl, FieldNode, InterfaceElem, LocalTypes, MethodDecl, ParamNode, SignatureNode, SourceFile,
    TypeExpr, TypeSpec,
};
use crate::parser::tokenizer::Span;
use crate::types::{
    BasicKind, DeclId, ExternalRef, Field, InterfaceMethod, InterfaceType, Method, NamedRef,
    Param, Position, ResolveWarning, Signature, StructType, Type, TypeDecl, TypeParamDecl, Unit,
};
use crate::{Error, Result};

/// Assemble one package from its parsed files
///
/// # Errors
/// Returns `ResolveError` when `files` is empty or the files disagree on
/// the package name.
#[tracing::instrument(level = "debug", skip_all, fields(files = files.len()))]
pub fn resolve_package(files: &[SourceFile]) -> Result<Unit> {
    let first = files
        .first()
        .ok_or_else(|| Error::ResolveError("no Go files to resolve".into()))?;
    let package = first.package.name.clone();
    if let Some(other) = files.iter().find(|f| f.package.name != package) {
        return Err(Error::ResolveError(format!(
            "{}: found package {} but expected {}",
            other.path, other.package.name, package
        )));
    }

    let mut resolver = Resolver::new(files);
    let decls = resolver.resolve_decls();
    tracing::debug!(
        package = %package,
        decls = decls.len(),
        warnings = resolver.warnings.len(),
        "package resolved"
    );
    Ok(Unit {
        package,
        decls,
        warnings: resolver.warnings,
    })
}

/// A type declaration together with the file it came from
struct SpecEntry<'a> {
    file: &'a SourceFile,
    spec: &'a TypeSpec,
}

/// Names visible while resolving one type expression
struct Scope<'a> {
    file: &'a SourceFile,
    params: Vec<(&'a str, DeclId, usize)>,
    /// Function-local names; later entries shadow earlier ones
    locals: Vec<(&'a str, Type)>,
}

impl<'a> Scope<'a> {
    fn file(file: &'a SourceFile) -> Self {
        Scope {
            file,
            params: Vec::new(),
            locals: Vec::new(),
        }
    }

    fn local(&self, name: &str) -> Option<&Type> {
        self.locals
            .iter()
            .rev()
            .find(|(n, _)| *n == name)
            .map(|(_, ty)| ty)
    }

    fn param(&self, name: &str) -> Option<Type> {
        self.params
            .iter()
            .find(|(n, _, _)| *n == name)
            .map(|(n, decl, index)| Type::Param {
                decl: *decl,
                index: *index,
                name: n.to_string(),
            })
    }
}

struct Resolver<'a> {
    files: &'a [SourceFile],
    specs: Vec<SpecEntry<'a>>,
    index: HashMap<&'a str, DeclId>,
    /// Aliases currently being expanded
    alias_stack: Vec<DeclId>,
    warnings: Vec<ResolveWarning>,
}

impl<'a> Resolver<'a> {
    fn new(files: &'a [SourceFile]) -> Self {
        let mut resolver = Resolver {
            files,
            specs: Vec::new(),
            index: HashMap::new(),
            alias_stack: Vec::new(),
            warnings: Vec::new(),
        };
        for file in files {
            for decl in &file.decls {
                let Decl::Type(spec) = decl else { continue };
                let name = spec.name.name.as_str();
                if name != "_" && resolver.index.contains_key(name) {
                    let message = format!("{} redeclared in this block", name);
                    resolver.warn(file, spec.name.span, message);
                    continue;
                }
                let id = DeclId(resolver.specs.len());
                if name != "_" {
                    resolver.index.insert(name, id);
                }
                resolver.specs.push(SpecEntry { file, spec });
            }
        }
        resolver
    }

    fn warn(&mut self, file: &SourceFile, span: Span, message: String) {
        let position = Position::new(&file.path, span);
        tracing::warn!(%position, "{}", message);
        self.warnings.push(ResolveWarning { position, message });
    }

    fn resolve_decls(&mut self) -> Vec<TypeDecl> {
        let mut decls = Vec::with_capacity(self.specs.len());
        for i in 0..self.specs.len() {
            let id = DeclId(i);
            let SpecEntry { file, spec } = self.specs[i];
            let scope = self.decl_scope(file, spec, id);
            decls.push(self.resolve_spec(file, spec, &scope));
        }

        // Local declarations come after every package-level one, so the
        // package's DeclIds stay aligned with `specs`
        for file in self.files {
            for decl in &file.decls {
                if let Decl::Local(block) = decl {
                    self.resolve_locals(file, block, &mut decls);
                }
            }
        }

        for file in self.files {
            for decl in &file.decls {
                if let Decl::Method(method) = decl {
                    if let Some((id, resolved)) = self.resolve_method(file, method) {
                        decls[id.0].methods.push(resolved);
                    }
                }
            }
        }
        decls
    }

    fn resolve_spec(&mut self, file: &SourceFile, spec: &TypeSpec, scope: &Scope) -> TypeDecl {
        let params = spec
            .params
            .iter()
            .map(|p| TypeParamDecl {
                name: p.name.name.clone(),
                constraint: self.resolve_constraint(&p.constraint, scope),
            })
            .collect();
        let definition = self.resolve_expr(&spec.ty, scope);
        TypeDecl {
            name: spec.name.name.clone(),
            position: Position::new(&file.path, spec.name.span),
            alias: spec.alias,
            params,
            definition,
            methods: Vec::new(),
        }
    }

    fn decl_scope(&self, file: &'a SourceFile, spec: &'a TypeSpec, id: DeclId) -> Scope<'a> {
        Scope {
            file,
            params: spec
                .params
                .iter()
                .enumerate()
                .map(|(i, p)| (p.name.name.as_str(), id, i))
                .collect(),
            locals: Vec::new(),
        }
    }

    /// Types declared in one function body. They are never entered in the
    /// package index; each is visible to itself and to the ones after it.
    fn resolve_locals(
        &mut self,
        file: &'a SourceFile,
        block: &'a LocalTypes,
        decls: &mut Vec<TypeDecl>,
    ) {
        let mut locals: Vec<(&'a str, Type)> = Vec::new();

        if let Some(receiver) = &block.receiver {
            let id = self.index.get(receiver.base.name.as_str()).copied();
            if let Some(id) = id.filter(|id| {
                self.specs[id.0].spec.params.len() == receiver.type_params.len()
            }) {
                for (index, param) in receiver.type_params.iter().enumerate() {
                    let ty = Type::Param {
                        decl: id,
                        index,
                        name: param.name.clone(),
                    };
                    locals.push((param.name.as_str(), ty));
                }
            }
        }

        // A function's type parameters stand for their constraints. Every
        // name is bound first so constraints may mention each other.
        let start = locals.len();
        for param in &block.type_params {
            locals.push((param.name.name.as_str(), Type::Interface(InterfaceType::default())));
        }
        for (i, param) in block.type_params.iter().enumerate() {
            let scope = Scope {
                file,
                params: Vec::new(),
                locals: locals.clone(),
            };
            let constraint = self.resolve_constraint(&param.constraint, &scope);
            locals[start + i].1 = constraint;
        }

        for spec in &block.specs {
            let id = DeclId(decls.len());
            let named = spec.name.name != "_";
            if named && !spec.alias {
                let ty = Type::Named(NamedRef::Decl {
                    id,
                    args: Vec::new(),
                });
                locals.push((spec.name.name.as_str(), ty));
            }
            let mut scope = self.decl_scope(file, spec, id);
            scope.locals = locals.clone();
            let decl = self.resolve_spec(file, spec, &scope);
            if named && spec.alias {
                locals.push((spec.name.name.as_str(), decl.definition.clone()));
            }
            tracing::debug!(func = %block.func.name, name = %decl.name, "local type");
            decls.push(decl);
        }
    }

    fn resolve_method(
        &mut self,
        file: &'a SourceFile,
        method: &'a MethodDecl,
    ) -> Option<(DeclId, Method)> {
        let receiver = &method.receiver;
        let base = receiver.base.name.as_str();
        let id = match self.index.get(base).copied() {
            Some(id) if self.specs[id.0].spec.alias => {
                let target = self.expand_alias(id, &[], &Scope::file(file), receiver.base.span);
                match target {
                    Type::Named(NamedRef::Decl { id, .. }) => Some(id),
                    _ => None,
                }
            }
            other => other,
        };
        let Some(id) = id else {
            self.warn(
                file,
                receiver.base.span,
                format!("method {} on undefined receiver type {}", method.name.name, base),
            );
            return None;
        };

        let expected = self.specs[id.0].spec.params.len();
        if receiver.type_params.len() != expected {
            self.warn(
                file,
                receiver.base.span,
                format!(
                    "receiver {} has {} type parameters, declaration has {}",
                    base,
                    receiver.type_params.len(),
                    expected
                ),
            );
            return None;
        }

        // Receiver parameter names bind positionally to the declaration's
        let scope = Scope {
            file,
            params: receiver
                .type_params
                .iter()
                .enumerate()
                .map(|(i, p)| (p.name.as_str(), id, i))
                .collect(),
            locals: Vec::new(),
        };
        let signature = self.resolve_signature(&method.signature, &scope);
        Some((
            id,
            Method {
                name: method.name.name.clone(),
                pointer_receiver: receiver.pointer,
                signature,
                position: Position::new(&file.path, method.name.span),
            },
        ))
    }

    fn expand_alias(&mut self, id: DeclId, args: &[Type], scope: &Scope, span: Span) -> Type {
        let SpecEntry { file, spec } = self.specs[id.0];
        if self.alias_stack.contains(&id) {
            let message = format!("invalid recursive type alias {}", spec.name.name);
            self.warn(scope.file, span, message);
            return Type::Invalid;
        }
        if args.len() != spec.params.len() {
            self.warn(
                scope.file,
                span,
                format!("wrong number of type arguments for {}", spec.name.name),
            );
            return Type::Invalid;
        }
        self.alias_stack.push(id);
        let alias_scope = self.decl_scope(file, spec, id);
        let target = self.resolve_expr(&spec.ty, &alias_scope);
        self.alias_stack.pop();
        target.substitute(id, args)
    }

    fn resolve_expr(&mut self, expr: &TypeExpr, scope: &Scope) -> Type {
        match expr {
            TypeExpr::Name {
                package: Some(pkg),
                name,
                args,
            } => {
                let args = args.iter().map(|a| self.resolve_expr(a, scope)).collect();
                match scope
                    .file
                    .imports
                    .iter()
                    .find(|i| i.local_name() == pkg.name)
                {
                    Some(import) => Type::External(ExternalRef {
                        path: import.path.clone(),
                        name: name.name.clone(),
                        args,
                    }),
                    None => {
                        let message = format!("undefined: {}.{}", pkg.name, name.name);
                        self.warn(scope.file, pkg.span, message);
                        Type::Invalid
                    }
                }
            }
            TypeExpr::Name {
                package: None,
                name,
                args,
            } => {
                let args: Vec<Type> = args.iter().map(|a| self.resolve_expr(a, scope)).collect();
                self.resolve_name(&name.name, args, scope, name.span)
            }
            TypeExpr::Pointer(elem) => Type::pointer(self.resolve_expr(elem, scope)),
            TypeExpr::Slice(elem) => Type::slice(self.resolve_expr(elem, scope)),
            TypeExpr::Array { len, elem } => Type::Array {
                len: len.clone(),
                elem: Box::new(self.resolve_expr(elem, scope)),
            },
            TypeExpr::Map { key, value } => Type::Map {
                key: Box::new(self.resolve_expr(key, scope)),
                value: Box::new(self.resolve_expr(value, scope)),
            },
            TypeExpr::Chan { dir, elem } => Type::Chan {
                dir: *dir,
                elem: Box::new(self.resolve_expr(elem, scope)),
            },
            TypeExpr::Func(sig) => Type::Signature(self.resolve_signature(sig, scope)),
            TypeExpr::Struct(fields) => Type::Struct(self.resolve_struct(fields, scope)),
            TypeExpr::Interface(elems) => Type::Interface(self.resolve_interface(elems, scope)),
            TypeExpr::Union(_) => {
                tracing::debug!("type-set union used outside a constraint");
                Type::Invalid
            }
        }
    }

    fn resolve_name(&mut self, name: &str, args: Vec<Type>, scope: &Scope, span: Span) -> Type {
        if let Some(local) = scope.local(name) {
            return match local {
                Type::Named(NamedRef::Decl { id, .. }) if !args.is_empty() => {
                    Type::Named(NamedRef::Decl { id: *id, args })
                }
                other => other.clone(),
            };
        }
        if let Some(param) = scope.param(name) {
            return param;
        }
        if let Some(&id) = self.index.get(name) {
            let spec = self.specs[id.0].spec;
            if spec.alias {
                return self.expand_alias(id, &args, scope, span);
            }
            if args.len() != spec.params.len() {
                self.warn(
                    scope.file,
                    span,
                    format!(
                        "{} expects {} type arguments, got {}",
                        name,
                        spec.params.len(),
                        args.len()
                    ),
                );
                return Type::Invalid;
            }
            return Type::Named(NamedRef::Decl { id, args });
        }
        match name {
            "error" => Type::error(),
            "any" | "comparable" => Type::Interface(InterfaceType::default()),
            _ => match BasicKind::from_name(name) {
                Some(kind) => Type::Basic(kind),
                None => {
                    self.warn(scope.file, span, format!("undefined: {}", name));
                    Type::Invalid
                }
            },
        }
    }

    /// Constraints are interfaces; bare unions and non-interface terms are type sets
    fn resolve_constraint(&mut self, expr: &TypeExpr, scope: &Scope) -> Type {
        match expr {
            TypeExpr::Union(_) => Type::Interface(InterfaceType {
                type_set: true,
                ..InterfaceType::default()
            }),
            other => match self.resolve_expr(other, scope) {
                ty @ (Type::Interface(_) | Type::Named(_) | Type::External(_) | Type::Invalid) => ty,
                _ => Type::Interface(InterfaceType {
                    type_set: true,
                    ..InterfaceType::default()
                }),
            },
        }
    }

    fn resolve_signature(&mut self, sig: &SignatureNode, scope: &Scope) -> Signature {
        Signature {
            params: self.resolve_params(&sig.params, scope),
            results: self.resolve_params(&sig.results, scope),
            variadic: sig.variadic,
        }
    }

    fn resolve_params(&mut self, params: &[ParamNode], scope: &Scope) -> Vec<Param> {
        params
            .iter()
            .map(|p| Param {
                name: p.name.as_ref().map(|n| n.name.clone()),
                ty: self.resolve_expr(&p.ty, scope),
            })
            .collect()
    }

    fn resolve_struct(&mut self, fields: &[FieldNode], scope: &Scope) -> StructType {
        let mut out = Vec::new();
        for field in fields {
            let ty = self.resolve_expr(&field.ty, scope);
            if field.embedded {
                out.push(Field {
                    name: embedded_name(&field.ty),
                    ty,
                    embedded: true,
                });
            } else {
                for name in &field.names {
                    out.push(Field {
                        name: name.name.clone(),
                        ty: ty.clone(),
                        embedded: false,
                    });
                }
            }
        }
        StructType { fields: out }
    }

    fn resolve_interface(&mut self, elems: &[InterfaceElem], scope: &Scope) -> InterfaceType {
        let mut iface = InterfaceType::default();
        for elem in elems {
            match elem {
                InterfaceElem::Method { name, signature } => iface.methods.push(InterfaceMethod {
                    name: name.name.clone(),
                    signature: self.resolve_signature(signature, scope),
                }),
                InterfaceElem::Embed(TypeExpr::Union(_)) => iface.type_set = true,
                InterfaceElem::Embed(expr) => match self.resolve_expr(expr, scope) {
                    ty @ (Type::Named(_) | Type::Interface(_) | Type::External(_)) => {
                        iface.embeds.push(ty)
                    }
                    Type::Invalid => iface.embeds.push(Type::Invalid),
                    _ => iface.type_set = true,
                },
            }
        }
        iface
    }
}

/// Field name of an embedded field: the type name without package or pointer
fn embedded_name(expr: &TypeExpr) -> String {
    match expr {
        TypeExpr::Pointer(inner) => embedded_name(inner),
        TypeExpr::Name { name, .. } => name.name.clone(),
        _ => String::new(),
    }
}

/// Parse and resolve a single-file package; panics on bad input
#[cfg(test)]
pub(crate) fn unit_from_source(source: &str) -> Unit {
    let file = crate::parser::parse_file("test.go", source).expect("test source parses");
    resolve_package(&[file]).expect("test source resolves")
}
