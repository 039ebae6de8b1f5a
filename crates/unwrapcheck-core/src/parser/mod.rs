//! Go declaration parser - tokenizer, AST types, and recursive descent parser
//!
//! Converts Go source text into a [`SourceFile`] holding the package clause,
//! imports, type declarations and method declarations. Function bodies are
//! scanned only for local `type` declarations; statements and `var`/`const`
//! blocks are skipped by balanced-bracket scanning, since they never affect
//! whether an error type wraps another error.

pub mod ast;
pub mod tokenizer;

use ast::*;
use tokenizer::{Span, SpannedToken, Token, Tokenizer};

use crate::{Error, Result};

/// Parse one Go source file
///
/// # Errors
/// Returns `ParseError` carrying `path:line:column` for lexical or
/// syntax violations in the declarations the checker reads.
///
/// # Example
/// ```
/// let file = unwrapcheck_core::parser::parse_file(
///     "errs.go",
///     "package errs\n\ntype Wrapped struct{ error }\n",
/// ).unwrap();
/// assert_eq!(file.package.name, "errs");
/// ```
pub fn parse_file(path: &str, source: &str) -> Result<SourceFile> {
    let tokens = Tokenizer::new(source).tokenize().map_err(|err| match err {
        Error::ParseError(msg) => Error::ParseError(format!("{}:{}", path, msg)),
        other => other,
    })?;
    Parser::new(path, tokens).parse_file()
}

/// One parameter-list entry before Go's name grouping is applied
struct ParamEntry {
    name: Option<Ident>,
    ty: TypeExpr,
    /// A lone identifier: a type, or a name sharing the next entry's type
    bare: Option<Ident>,
}

struct Parser {
    path: String,
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(path: &str, tokens: Vec<SpannedToken>) -> Self {
        Parser {
            path: path.to_string(),
            tokens,
            pos: 0,
        }
    }

    // ── Token helpers ──────────────────────────────────────

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> &Token {
        self.tokens
            .get(self.pos + offset)
            .map(|t| &t.token)
            .unwrap_or(&Token::Eof)
    }

    fn span(&self) -> Span {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map(|t| t.span)
            .unwrap_or(Span {
                line: 1,
                column: 1,
                offset: 0,
            })
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, token: &Token) -> bool {
        self.peek() == token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl std::fmt::Display) -> Error {
        Error::ParseError(format!("{}:{}: {}", self.path, self.span(), message))
    }

    fn expect(&mut self, token: &Token, what: &str) -> Result<Span> {
        let span = self.span();
        if self.eat(token) {
            Ok(span)
        } else {
            Err(self.error(format!("expected {}, found {:?}", what, self.peek())))
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<Ident> {
        let span = self.span();
        match self.peek().clone() {
            Token::Identifier(name) => {
                self.advance();
                Ok(Ident::new(name, span))
            }
            other => Err(self.error(format!("expected {}, found {:?}", what, other))),
        }
    }

    /// A `;` is required between elements unless a closing token follows
    fn expect_separator(&mut self) -> Result<()> {
        match self.peek() {
            Token::Semicolon => {
                self.advance();
                Ok(())
            }
            Token::RParen | Token::RBrace | Token::Eof => Ok(()),
            other => Err(self.error(format!("expected ';' or newline, found {:?}", other))),
        }
    }

    fn skip_semicolons(&mut self) {
        while self.eat(&Token::Semicolon) {}
    }

    fn starts_type(token: &Token) -> bool {
        matches!(
            token,
            Token::Identifier(_)
                | Token::Star
                | Token::LBracket
                | Token::Map
                | Token::Chan
                | Token::Func
                | Token::Struct
                | Token::Interface
                | Token::LParen
                | Token::Arrow
        )
    }

    /// Index of the bracket closing the one at `open`
    fn matching_bracket(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (i, t) in self.tokens.iter().enumerate().skip(open) {
            match t.token {
                Token::LBracket => depth += 1,
                Token::RBracket => {
                    depth -= 1;
                    if depth == 0 {
                        return Some(i);
                    }
                }
                Token::Eof => return None,
                _ => {}
            }
        }
        None
    }

    /// Whether `[` at absolute index `open` instantiates the preceding name
    /// (`Wrapper[error]`) rather than starting an array/slice type that
    /// follows a field or parameter name (`errs []error`).
    fn bracket_is_type_args(&self, open: usize) -> bool {
        if matches!(
            self.tokens.get(open + 1).map(|t| &t.token),
            Some(Token::RBracket) | Some(Token::NumberLiteral(_)) | Some(Token::Ellipsis)
        ) {
            return false;
        }
        match self.matching_bracket(open) {
            Some(close) => !self
                .tokens
                .get(close + 1)
                .is_some_and(|t| Self::starts_type(&t.token)),
            None => false,
        }
    }

    // ── File structure ─────────────────────────────────────

    fn parse_file(&mut self) -> Result<SourceFile> {
        self.skip_semicolons();
        self.expect(&Token::Package, "'package'")?;
        let package = self.expect_ident("package name")?;
        self.expect_separator()?;

        let mut imports = Vec::new();
        let mut decls = Vec::new();

        loop {
            self.skip_semicolons();
            match self.peek() {
                Token::Eof => break,
                Token::Import => self.parse_import_decl(&mut imports)?,
                Token::Type => self.parse_type_decl(&mut decls)?,
                Token::Func => self.parse_func_decl(&mut decls)?,
                Token::Var | Token::Const => self.skip_value_decl()?,
                other => {
                    return Err(self.error(format!("expected declaration, found {:?}", other)))
                }
            }
        }

        Ok(SourceFile {
            path: self.path.clone(),
            package,
            imports,
            decls,
        })
    }

    fn parse_import_decl(&mut self, imports: &mut Vec<Import>) -> Result<()> {
        self.advance(); // import
        if self.eat(&Token::LParen) {
            loop {
                self.skip_semicolons();
                if self.eat(&Token::RParen) {
                    break;
                }
                imports.push(self.parse_import_spec()?);
                self.expect_separator()?;
            }
        } else {
            imports.push(self.parse_import_spec()?);
        }
        self.expect_separator()
    }

    fn parse_import_spec(&mut self) -> Result<Import> {
        let span = self.span();
        let alias = match self.peek().clone() {
            Token::Identifier(name) => {
                self.advance();
                Some(name)
            }
            Token::Dot => {
                self.advance();
                Some(".".to_string())
            }
            _ => None,
        };
        match self.advance() {
            Token::StringLiteral(path) => Ok(Import { alias, path, span }),
            other => Err(self.error(format!("expected import path, found {:?}", other))),
        }
    }

    // ── Type declarations ──────────────────────────────────

    fn parse_type_decl(&mut self, decls: &mut Vec<Decl>) -> Result<()> {
        self.advance(); // type
        if self.eat(&Token::LParen) {
            loop {
                self.skip_semicolons();
                if self.eat(&Token::RParen) {
                    break;
                }
                decls.push(Decl::Type(self.parse_type_spec()?));
                self.expect_separator()?;
            }
        } else {
            decls.push(Decl::Type(self.parse_type_spec()?));
        }
        self.expect_separator()
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec> {
        let name = self.expect_ident("type name")?;
        let params = if self.check(&Token::LBracket) {
            self.try_type_params().unwrap_or_default()
        } else {
            Vec::new()
        };
        let alias = self.eat(&Token::Equals);
        let ty = self.parse_type()?;
        Ok(TypeSpec {
            name,
            params,
            alias,
            ty,
        })
    }

    /// `type A[T any] ...` versus the array type in `type A [N * 2]int`.
    /// The bracket holds type parameters only when it parses as a parameter
    /// list followed by a type; otherwise the position is restored.
    fn try_type_params(&mut self) -> Option<Vec<TypeParamNode>> {
        let start = self.pos;
        match self.parse_type_params() {
            Ok(params) if Self::starts_type(self.peek()) || self.check(&Token::Equals) => {
                Some(params)
            }
            _ => {
                self.pos = start;
                None
            }
        }
    }

    fn parse_type_params(&mut self) -> Result<Vec<TypeParamNode>> {
        self.expect(&Token::LBracket, "'['")?;
        let mut params = Vec::new();
        loop {
            let mut names = vec![self.expect_ident("type parameter name")?];
            while self.eat(&Token::Comma) {
                names.push(self.expect_ident("type parameter name")?);
            }
            let constraint = self.parse_constraint()?;
            for name in names {
                params.push(TypeParamNode {
                    name,
                    constraint: constraint.clone(),
                });
            }
            if !self.eat(&Token::Comma) || self.check(&Token::RBracket) {
                break;
            }
        }
        self.expect(&Token::RBracket, "']'")?;
        Ok(params)
    }

    /// `T`, `~T`, or `~int | string | Named`
    fn parse_constraint(&mut self) -> Result<TypeExpr> {
        let mut terms = Vec::new();
        loop {
            let tilde = self.eat(&Token::Tilde);
            let ty = self.parse_type()?;
            terms.push(UnionTerm { tilde, ty });
            if !self.eat(&Token::Pipe) {
                break;
            }
        }
        if terms.len() == 1 && !terms[0].tilde {
            if let Some(term) = terms.pop() {
                return Ok(term.ty);
            }
        }
        Ok(TypeExpr::Union(terms))
    }

    // ── Functions & methods ────────────────────────────────

    /// Parses any `func` declaration; methods and local types are kept
    fn parse_func_decl(&mut self, decls: &mut Vec<Decl>) -> Result<()> {
        self.advance(); // func
        let receiver = if self.check(&Token::LParen) {
            Some(self.parse_receiver()?)
        } else {
            None
        };
        let name = self.expect_ident("function name")?;
        let type_params = if receiver.is_none() && self.check(&Token::LBracket) {
            self.parse_type_params()?
        } else {
            Vec::new()
        };
        let signature = self.parse_signature()?;
        let specs = if self.check(&Token::LBrace) {
            self.scan_body()?
        } else {
            Vec::new()
        };
        self.expect_separator()?;

        if !specs.is_empty() {
            decls.push(Decl::Local(LocalTypes {
                func: name.clone(),
                type_params,
                receiver: receiver.clone(),
                specs,
            }));
        }
        if let Some(receiver) = receiver {
            decls.push(Decl::Method(MethodDecl {
                receiver,
                name,
                signature,
            }));
        }
        Ok(())
    }

    fn parse_receiver(&mut self) -> Result<Receiver> {
        self.expect(&Token::LParen, "'('")?;
        let name = match (self.peek(), self.peek_at(1)) {
            (Token::Identifier(_), Token::Identifier(_) | Token::Star) => {
                Some(self.expect_ident("receiver name")?)
            }
            _ => None,
        };
        let pointer = self.eat(&Token::Star);
        let base = self.expect_ident("receiver type")?;
        let mut type_params = Vec::new();
        if self.eat(&Token::LBracket) {
            loop {
                type_params.push(self.expect_ident("receiver type parameter")?);
                if !self.eat(&Token::Comma) || self.check(&Token::RBracket) {
                    break;
                }
            }
            self.expect(&Token::RBracket, "']'")?;
        }
        self.eat(&Token::Comma);
        self.expect(&Token::RParen, "')'")?;
        Ok(Receiver {
            name,
            pointer,
            base,
            type_params,
        })
    }

    fn parse_signature(&mut self) -> Result<SignatureNode> {
        let (params, variadic) = self.parse_parameters()?;
        let results = if self.check(&Token::LParen) {
            self.parse_parameters()?.0
        } else if Self::starts_type(self.peek()) {
            vec![ParamNode {
                name: None,
                ty: self.parse_type()?,
            }]
        } else {
            Vec::new()
        };
        Ok(SignatureNode {
            params,
            results,
            variadic,
        })
    }

    /// `(a, b int, err error)` with Go's grouping rules applied
    fn parse_parameters(&mut self) -> Result<(Vec<ParamNode>, bool)> {
        self.expect(&Token::LParen, "'('")?;
        let mut entries = Vec::new();
        let mut variadic = false;
        while !self.check(&Token::RParen) {
            entries.push(self.parse_param_entry(&mut variadic)?);
            if !self.eat(&Token::Comma) {
                break;
            }
        }
        self.expect(&Token::RParen, "')'")?;
        Ok((self.group_params(entries)?, variadic))
    }

    fn parse_param_entry(&mut self, variadic: &mut bool) -> Result<ParamEntry> {
        if self.eat(&Token::Ellipsis) {
            *variadic = true;
            return Ok(ParamEntry {
                name: None,
                ty: self.parse_type()?,
                bare: None,
            });
        }
        let Token::Identifier(_) = self.peek() else {
            return Ok(ParamEntry {
                name: None,
                ty: self.parse_type()?,
                bare: None,
            });
        };
        let named = match self.peek_at(1) {
            Token::Comma | Token::RParen => {
                let ident = self.expect_ident("parameter")?;
                return Ok(ParamEntry {
                    name: None,
                    ty: TypeExpr::Name {
                        package: None,
                        name: ident.clone(),
                        args: Vec::new(),
                    },
                    bare: Some(ident),
                });
            }
            Token::Dot => false,
            Token::Ellipsis => true,
            Token::LBracket => !self.bracket_is_type_args(self.pos + 1),
            next => Self::starts_type(next),
        };
        if !named {
            return Ok(ParamEntry {
                name: None,
                ty: self.parse_type()?,
                bare: None,
            });
        }
        let name = self.expect_ident("parameter name")?;
        if self.eat(&Token::Ellipsis) {
            *variadic = true;
        }
        Ok(ParamEntry {
            name: Some(name),
            ty: self.parse_type()?,
            bare: None,
        })
    }

    fn group_params(&self, entries: Vec<ParamEntry>) -> Result<Vec<ParamNode>> {
        if !entries.iter().any(|e| e.name.is_some()) {
            return Ok(entries
                .into_iter()
                .map(|e| ParamNode {
                    name: None,
                    ty: e.ty,
                })
                .collect());
        }
        let mut params = Vec::new();
        let mut pending: Vec<Ident> = Vec::new();
        for entry in entries {
            if let Some(bare) = entry.bare {
                pending.push(bare);
                continue;
            }
            for name in pending.drain(..) {
                params.push(ParamNode {
                    name: Some(name),
                    ty: entry.ty.clone(),
                });
            }
            params.push(ParamNode {
                name: entry.name,
                ty: entry.ty,
            });
        }
        if !pending.is_empty() {
            return Err(self.error("mixed named and unnamed parameters"));
        }
        Ok(params)
    }

    // ── Types ──────────────────────────────────────────────

    fn parse_type(&mut self) -> Result<TypeExpr> {
        match self.peek() {
            Token::Identifier(_) => self.parse_type_name(),
            Token::Star => {
                self.advance();
                Ok(TypeExpr::Pointer(Box::new(self.parse_type()?)))
            }
            Token::LBracket => {
                self.advance();
                if self.eat(&Token::RBracket) {
                    return Ok(TypeExpr::Slice(Box::new(self.parse_type()?)));
                }
                let len = self.scan_array_len()?;
                Ok(TypeExpr::Array {
                    len,
                    elem: Box::new(self.parse_type()?),
                })
            }
            Token::Map => {
                self.advance();
                self.expect(&Token::LBracket, "'['")?;
                let key = self.parse_type()?;
                self.expect(&Token::RBracket, "']'")?;
                let value = self.parse_type()?;
                Ok(TypeExpr::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            Token::Chan => {
                self.advance();
                let dir = if self.eat(&Token::Arrow) {
                    ChanDir::Send
                } else {
                    ChanDir::Both
                };
                Ok(TypeExpr::Chan {
                    dir,
                    elem: Box::new(self.parse_type()?),
                })
            }
            Token::Arrow => {
                self.advance();
                self.expect(&Token::Chan, "'chan'")?;
                Ok(TypeExpr::Chan {
                    dir: ChanDir::Recv,
                    elem: Box::new(self.parse_type()?),
                })
            }
            Token::Func => {
                self.advance();
                Ok(TypeExpr::Func(self.parse_signature()?))
            }
            Token::Struct => self.parse_struct(),
            Token::Interface => self.parse_interface(),
            Token::LParen => {
                self.advance();
                let ty = self.parse_type()?;
                self.expect(&Token::RParen, "')'")?;
                Ok(ty)
            }
            other => Err(self.error(format!("expected type, found {:?}", other))),
        }
    }

    /// Array lengths are constant expressions; only their text is kept.
    /// Consumes everything up to and including the closing `]`.
    fn scan_array_len(&mut self) -> Result<String> {
        let start = self.span();
        let mut len = String::new();
        let mut depth = 0usize;
        loop {
            let token = self.advance();
            match token {
                Token::Eof => {
                    return Err(Error::ParseError(format!(
                        "{}:{}: unterminated array length",
                        self.path, start
                    )))
                }
                Token::RBracket if depth == 0 => return Ok(len),
                Token::LBracket | Token::LParen | Token::LBrace => depth += 1,
                Token::RBracket | Token::RParen | Token::RBrace => {
                    depth = depth.saturating_sub(1)
                }
                _ => {}
            }
            len.push_str(&token.to_string());
        }
    }

    fn parse_type_name(&mut self) -> Result<TypeExpr> {
        let first = self.expect_ident("type name")?;
        let (package, name) = if self.eat(&Token::Dot) {
            (Some(first), self.expect_ident("qualified type name")?)
        } else {
            (None, first)
        };
        let mut args = Vec::new();
        if self.eat(&Token::LBracket) {
            loop {
                args.push(self.parse_type()?);
                if !self.eat(&Token::Comma) || self.check(&Token::RBracket) {
                    break;
                }
            }
            self.expect(&Token::RBracket, "']'")?;
        }
        Ok(TypeExpr::Name {
            package,
            name,
            args,
        })
    }

    fn parse_struct(&mut self) -> Result<TypeExpr> {
        self.advance(); // struct
        self.expect(&Token::LBrace, "'{'")?;
        let mut fields = Vec::new();
        loop {
            self.skip_semicolons();
            if self.eat(&Token::RBrace) {
                break;
            }
            fields.push(self.parse_field_decl()?);
            if let Token::StringLiteral(_) = self.peek() {
                self.advance(); // field tag
            }
            self.expect_separator()?;
        }
        Ok(TypeExpr::Struct(fields))
    }

    fn parse_field_decl(&mut self) -> Result<FieldNode> {
        let span = self.span();
        if self.eat(&Token::Star) {
            let ty = self.parse_type_name()?;
            return Ok(FieldNode {
                names: Vec::new(),
                ty: TypeExpr::Pointer(Box::new(ty)),
                embedded: true,
                span,
            });
        }
        if !matches!(self.peek(), Token::Identifier(_)) {
            return Err(self.error(format!("expected field, found {:?}", self.peek())));
        }
        let embedded = match self.peek_at(1) {
            Token::Dot | Token::Semicolon | Token::RBrace | Token::StringLiteral(_) => true,
            Token::LBracket => self.bracket_is_type_args(self.pos + 1),
            _ => false,
        };
        if embedded {
            return Ok(FieldNode {
                names: Vec::new(),
                ty: self.parse_type_name()?,
                embedded: true,
                span,
            });
        }
        let mut names = vec![self.expect_ident("field name")?];
        while self.eat(&Token::Comma) {
            names.push(self.expect_ident("field name")?);
        }
        Ok(FieldNode {
            names,
            ty: self.parse_type()?,
            embedded: false,
            span,
        })
    }

    fn parse_interface(&mut self) -> Result<TypeExpr> {
        self.advance(); // interface
        self.expect(&Token::LBrace, "'{'")?;
        let mut elems = Vec::new();
        loop {
            self.skip_semicolons();
            if self.eat(&Token::RBrace) {
                break;
            }
            let elem = match (self.peek(), self.peek_at(1)) {
                (Token::Identifier(_), Token::LParen) => {
                    let name = self.expect_ident("method name")?;
                    InterfaceElem::Method {
                        name,
                        signature: self.parse_signature()?,
                    }
                }
                _ => InterfaceElem::Embed(self.parse_constraint()?),
            };
            elems.push(elem);
            self.expect_separator()?;
        }
        Ok(TypeExpr::Interface(elems))
    }

    // ── Skipping ───────────────────────────────────────────

    /// Skip one balanced `{...}`, `(...)` or `[...]` group
    fn skip_balanced(&mut self) -> Result<()> {
        let start = self.span();
        let mut depth = 0usize;
        loop {
            match self.advance() {
                Token::LBrace | Token::LParen | Token::LBracket => depth += 1,
                Token::RBrace | Token::RParen | Token::RBracket => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(());
                    }
                }
                Token::Eof => {
                    return Err(Error::ParseError(format!(
                        "{}:{}: unbalanced brackets",
                        self.path, start
                    )))
                }
                _ => {}
            }
        }
    }

    /// Skip a function body, keeping the type declarations inside it.
    /// A local declaration that fails to parse is skipped like a statement.
    fn scan_body(&mut self) -> Result<Vec<TypeSpec>> {
        let start = self.span();
        let mut specs = Vec::new();
        let mut depth = 0usize;
        loop {
            match self.peek() {
                // `x.(type)` in a type switch is not a declaration
                Token::Type if !self.follows(&Token::LParen) => {
                    let resume = self.pos + 1;
                    let mut local = Vec::new();
                    match self.parse_type_decl(&mut local) {
                        Ok(()) => specs.extend(local.into_iter().filter_map(|d| match d {
                            Decl::Type(spec) => Some(spec),
                            _ => None,
                        })),
                        Err(err) => {
                            tracing::debug!(%err, "skipping local type declaration");
                            self.pos = resume;
                        }
                    }
                }
                Token::LBrace | Token::LParen | Token::LBracket => {
                    self.advance();
                    depth += 1;
                }
                Token::RBrace | Token::RParen | Token::RBracket => {
                    self.advance();
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Ok(specs);
                    }
                }
                Token::Eof => {
                    return Err(Error::ParseError(format!(
                        "{}:{}: unbalanced brackets",
                        self.path, start
                    )))
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Whether the token just consumed is `token`
    fn follows(&self, token: &Token) -> bool {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .is_some_and(|t| &t.token == token)
    }

    /// Skip a `var` or `const` declaration up to its terminating `;`
    fn skip_value_decl(&mut self) -> Result<()> {
        self.advance(); // var | const
        loop {
            match self.peek() {
                Token::LBrace | Token::LParen | Token::LBracket => self.skip_balanced()?,
                Token::Semicolon | Token::Eof => break,
                _ => {
                    self.advance();
                }
            }
        }
        self.expect_separator()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(input: &str) -> SourceFile {
        parse_file("test.go", input).expect("test input should parse")
    }

    fn parse_err(input: &str) -> String {
        parse_file("test.go", input).unwrap_err().to_string()
    }

    fn type_specs(file: &SourceFile) -> Vec<&TypeSpec> {
        file.decls
            .iter()
            .filter_map(|d| match d {
                Decl::Type(spec) => Some(spec),
                _ => None,
            })
            .collect()
    }

    fn methods(file: &SourceFile) -> Vec<&MethodDecl> {
        file.decls
            .iter()
            .filter_map(|d| match d {
                Decl::Method(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    fn name(n: &str) -> String {
        n.to_string()
    }

    fn type_name(expr: &TypeExpr) -> String {
        match expr {
            TypeExpr::Name { package: Some(pkg), name, .. } => format!("{}.{}", pkg.name, name.name),
            TypeExpr::Name { name, .. } => name.name.clone(),
            TypeExpr::Pointer(inner) => format!("*{}", type_name(inner)),
            TypeExpr::Slice(inner) => format!("[]{}", type_name(inner)),
            other => format!("{:?}", other),
        }
    }

    // ── File structure ─────────────────────────────────

    #[test]
    fn test_parse_package_and_imports() {
        let file = parse(
            r#"package strict

import (
	"errors"
	h "net/http"
	_ "embed"
)

import "fmt"
"#,
        );
        assert_eq!(file.package.name, "strict");
        let imports: Vec<(Option<String>, String)> = file
            .imports
            .iter()
            .map(|i| (i.alias.clone(), i.path.clone()))
            .collect();
        assert_eq!(imports, vec![
            (None, name("errors")),
            (Some(name("h")), name("net/http")),
            (Some(name("_")), name("embed")),
            (None, name("fmt")),
        ]);
        assert_eq!(file.imports[1].local_name(), "h");
        assert_eq!(file.imports[0].local_name(), "errors");
    }

    #[test]
    fn test_missing_package_clause() {
        let err = parse_err("type A int\n");
        assert!(err.contains("expected 'package'"), "got: {}", err);
        assert!(err.contains("test.go:1:1"), "got: {}", err);
    }

    // ── Type declarations ──────────────────────────────

    #[test]
    fn test_parse_struct_with_embedded_and_named_fields() {
        let file = parse(
            "package p\n\ntype E struct {\n\terror\n\t*Base\n\tio.Reader\n\ta, b error `json:\"a\"`\n\terrs []error\n}\n",
        );
        let specs = type_specs(&file);
        let TypeExpr::Struct(fields) = &specs[0].ty else {
            panic!("expected struct, got {:?}", specs[0].ty);
        };
        let shape: Vec<(Vec<String>, String, bool)> = fields
            .iter()
            .map(|f| {
                (
                    f.names.iter().map(|n| n.name.clone()).collect(),
                    type_name(&f.ty),
                    f.embedded,
                )
            })
            .collect();
        assert_eq!(shape, vec![
            (vec![], name("error"), true),
            (vec![], name("*Base"), true),
            (vec![], name("io.Reader"), true),
            (vec![name("a"), name("b")], name("error"), false),
            (vec![name("errs")], name("[]error"), false),
        ]);
    }

    #[test]
    fn test_parse_generic_embedded_field() {
        let file = parse("package p\ntype U struct {\n\tWrapper[error]\n\tpairs [2]error\n}\n");
        let TypeExpr::Struct(fields) = &type_specs(&file)[0].ty else {
            panic!("expected struct");
        };
        assert!(fields[0].embedded);
        let TypeExpr::Name { name: n, args, .. } = &fields[0].ty else {
            panic!("expected name");
        };
        assert_eq!(n.name, "Wrapper");
        assert_eq!(args.len(), 1);
        assert!(!fields[1].embedded);
        assert!(matches!(fields[1].ty, TypeExpr::Array { ref len, .. } if len == "2"));
    }

    #[test]
    fn test_parse_alias_group_and_type_params() {
        let file = parse(
            "package p\n\ntype (\n\tAliasError = error\n\tPair[K comparable, V any] struct{ k K; v V }\n\tList[T, U any] []T\n\tNums[T ~int | ~int64] []T\n\tFixed [4]byte\n)\n",
        );
        let specs = type_specs(&file);
        assert_eq!(specs.len(), 5);
        assert!(specs[0].alias);
        let params: Vec<&str> = specs[1].params.iter().map(|p| p.name.name.as_str()).collect();
        assert_eq!(params, vec!["K", "V"]);
        let params: Vec<&str> = specs[2].params.iter().map(|p| p.name.name.as_str()).collect();
        assert_eq!(params, vec!["T", "U"]);
        assert!(matches!(specs[3].params[0].constraint, TypeExpr::Union(ref terms) if terms.len() == 2));
        assert!(specs[4].params.is_empty());
        assert!(matches!(specs[4].ty, TypeExpr::Array { .. }));
    }

    #[test]
    fn test_parse_interface_elements() {
        let file = parse("package p\ntype I interface {\n\terror\n\tUnwrap() []error\n\tIs(target error) bool\n}\n");
        let TypeExpr::Interface(elems) = &type_specs(&file)[0].ty else {
            panic!("expected interface");
        };
        assert_eq!(elems.len(), 3);
        assert!(matches!(&elems[0], InterfaceElem::Embed(_)));
        let InterfaceElem::Method { name: n, signature } = &elems[1] else {
            panic!("expected method");
        };
        assert_eq!(n.name, "Unwrap");
        assert_eq!(type_name(&signature.results[0].ty), "[]error");
    }

    #[test]
    fn test_parse_composite_types() {
        let file = parse(
            "package p\ntype A map[string][]*error\ntype B chan<- error\ntype C <-chan error\ntype D func(int, ...string) (n int, err error)\n",
        );
        let specs = type_specs(&file);
        assert!(matches!(specs[0].ty, TypeExpr::Map { .. }));
        assert!(matches!(specs[1].ty, TypeExpr::Chan { dir: ChanDir::Send, .. }));
        assert!(matches!(specs[2].ty, TypeExpr::Chan { dir: ChanDir::Recv, .. }));
        let TypeExpr::Func(sig) = &specs[3].ty else {
            panic!("expected func");
        };
        assert!(sig.variadic);
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.results.len(), 2);
        assert_eq!(sig.results[1].name.as_ref().map(|n| n.name.as_str()), Some("err"));
    }

    #[test]
    fn test_array_lengths_are_constant_expressions() {
        let file = parse(
            "package p\n\
             const N = 2\n\
             type Pair [N * 2]error\n\
             type Sized [len(\"ab\")]error\n\
             type Nested [cap([N]int{})]error\n\
             type Generic[T any] [N]T\n",
        );
        let specs = type_specs(&file);
        let lens: Vec<&str> = specs
            .iter()
            .map(|spec| match &spec.ty {
                TypeExpr::Array { len, .. } => len.as_str(),
                other => panic!("expected array, got {:?}", other),
            })
            .collect();
        assert_eq!(lens, vec!["N*2", "len(\"ab\")", "cap([N]int{})", "N"]);
        assert!(specs[0].params.is_empty());
        assert!(specs[1].params.is_empty());
        assert_eq!(specs[3].params.len(), 1);
    }

    #[test]
    fn test_bracket_after_type_name_prefers_params_when_they_parse() {
        let file = parse("package p\ntype Ptr[T *int] struct{ v T }\ntype Arr [T * 4]error\n");
        let specs = type_specs(&file);
        assert_eq!(specs[0].params.len(), 1);
        assert!(matches!(specs[0].ty, TypeExpr::Struct(_)));
        assert!(specs[1].params.is_empty());
        assert!(matches!(specs[1].ty, TypeExpr::Array { .. }));
    }

    #[test]
    fn test_array_length_in_field() {
        let file = parse("package p\ntype S struct{ errs [N * 2]error; Wrapper[error] }\n");
        let TypeExpr::Struct(fields) = &type_specs(&file)[0].ty else {
            panic!("expected struct");
        };
        assert!(!fields[0].embedded);
        assert!(matches!(fields[0].ty, TypeExpr::Array { .. }));
        assert!(fields[1].embedded);
    }

    // ── Methods ────────────────────────────────────────

    #[test]
    fn test_parse_methods_and_skip_bodies() {
        let file = parse(
            r#"package p

func (e *E) Error() string {
	if e == nil { return "nil" }
	return fmt.Sprintf("%v}", e.err)
}

func (E) Unwrap() error { return nil }

func (e *G[T]) Unwrap() (error, bool) { return nil, false }

func helper[T any](v T) T {
	return v
}
"#,
        );
        let ms = methods(&file);
        assert_eq!(ms.len(), 3);
        assert_eq!(ms[0].name.name, "Error");
        assert!(ms[0].receiver.pointer);
        assert_eq!(ms[0].receiver.name.as_ref().map(|n| n.name.as_str()), Some("e"));
        assert_eq!(ms[0].name.span.line, 3);
        assert!(!ms[1].receiver.pointer);
        assert!(ms[1].receiver.name.is_none());
        assert_eq!(ms[2].receiver.base.name, "G");
        assert_eq!(ms[2].receiver.type_params.len(), 1);
        assert_eq!(ms[2].signature.results.len(), 2);
    }

    #[test]
    fn test_local_types_in_bodies() {
        let file = parse(
            r#"package p

func build[E error](cause E) error {
	type local struct{ error }
	switch v := any(cause).(type) {
	case error:
		type (
			first  struct{ cause E }
			second = first
		)
		_ = v
	}
	return nil
}

func (w *W) Error() string {
	type reason string
	return string(reason("w"))
}

func plain() {}
"#,
        );
        let blocks: Vec<&LocalTypes> = file
            .decls
            .iter()
            .filter_map(|d| match d {
                Decl::Local(block) => Some(block),
                _ => None,
            })
            .collect();
        assert_eq!(blocks.len(), 2);

        let names: Vec<&str> = blocks[0].specs.iter().map(|s| s.name.name.as_str()).collect();
        assert_eq!(names, vec!["local", "first", "second"]);
        assert!(blocks[0].specs[2].alias);
        assert_eq!(blocks[0].func.name, "build");
        assert_eq!(blocks[0].type_params.len(), 1);
        assert!(blocks[0].receiver.is_none());
        assert_eq!(blocks[0].specs[0].name.span.line, 4);

        assert_eq!(blocks[1].specs[0].name.name, "reason");
        assert_eq!(
            blocks[1].receiver.as_ref().map(|r| r.base.name.as_str()),
            Some("W")
        );
        assert_eq!(methods(&file).len(), 1);
    }

    #[test]
    fn test_parameter_grouping() {
        let file = parse("package p\nfunc (e E) M(a, b int, c error) (x, y error) { }\n");
        let m = methods(&file)[0];
        let params: Vec<(Option<String>, String)> = m
            .signature
            .params
            .iter()
            .map(|p| (p.name.as_ref().map(|n| n.name.clone()), type_name(&p.ty)))
            .collect();
        assert_eq!(params, vec![
            (Some(name("a")), name("int")),
            (Some(name("b")), name("int")),
            (Some(name("c")), name("error")),
        ]);
        assert_eq!(m.signature.results.len(), 2);
    }

    #[test]
    fn test_unnamed_parameters() {
        let file = parse("package p\nfunc (e E) M(int, error) {}\nfunc (e E) N(errs []error, w Wrapper[int]) {}\n");
        let ms = methods(&file);
        assert!(ms[0].signature.params.iter().all(|p| p.name.is_none()));
        assert_eq!(ms[1].signature.params.len(), 2);
        assert_eq!(type_name(&ms[1].signature.params[0].ty), "[]error");
    }

    #[test]
    fn test_mixed_parameters_rejected() {
        let err = parse_err("package p\nfunc (e E) M(a, b) (x int, error) {}\n");
        assert!(err.contains("mixed named and unnamed"), "got: {}", err);
    }

    // ── Skipped declarations ───────────────────────────

    #[test]
    fn test_skip_var_and_const() {
        let file = parse(
            "package p\n\nvar ErrX = errors.New(\"x\")\n\nconst (\n\tA = iota\n\tB\n)\n\nvar f = func() error {\n\treturn nil\n}\n\ntype E struct{ error }\n",
        );
        assert_eq!(type_specs(&file).len(), 1);
        assert_eq!(type_specs(&file)[0].name.name, "E");
    }

    #[test]
    fn test_unbalanced_body() {
        let err = parse_err("package p\nfunc (e E) Error() string {\n");
        assert!(err.contains("unbalanced"), "got: {}", err);
    }

    #[test]
    fn test_parse_determinism() {
        let input = "package p\ntype E struct { errs []error }\nfunc (e E) Error() string { return \"\" }\n";
        let first = parse(input);
        for i in 0..20 {
            assert_eq!(first, parse(input), "non-determinism at iteration {}", i);
        }
    }
}
