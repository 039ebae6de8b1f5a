//! Go tokenizer - converts Go source text into a token stream
//!
//! Handles: keywords relevant to declarations, identifiers, interpreted and
//! raw string literals, rune literals, numbers, every Go operator, and both
//! comment forms. Implements Go's automatic semicolon insertion so the parser
//! can rely on `;` separating declarations, fields and interface elements.
//!
//! Guarantees:
//! - Deterministic: same input always produces same token stream
//! - line:column for every token and every error

/// Token types for the Go declaration subset
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    // Keywords
    Package,
    Import,
    Type,
    Func,
    Struct,
    Interface,
    Map,
    Chan,
    Var,
    Const,

    // Literals
    StringLiteral(String),
    RuneLiteral(String),
    NumberLiteral(String),

    // Symbols
    LBrace,    // {
    RBrace,    // }
    LParen,    // (
    RParen,    // )
    LBracket,  // [
    RBracket,  // ]
    Comma,     // ,
    Semicolon, // ; (explicit or inserted)
    Dot,       // .
    Ellipsis,  // ...
    Star,      // *
    Equals,    // =
    Tilde,     // ~
    Pipe,      // |
    Arrow,     // <-

    /// Any other operator; only meaningful inside skipped bodies
    Operator(String),

    // Other
    Identifier(String),
    Eof,
}

impl Token {
    /// Whether a newline directly after this token ends the statement
    fn ends_line(&self) -> bool {
        match self {
            Token::Identifier(_)
            | Token::StringLiteral(_)
            | Token::RuneLiteral(_)
            | Token::NumberLiteral(_)
            | Token::RParen
            | Token::RBracket
            | Token::RBrace => true,
            Token::Operator(op) => op == "++" || op == "--",
            _ => false,
        }
    }
}

/// Source spelling, used where a token run is kept as opaque text
impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let text = match self {
            Token::Package => "package",
            Token::Import => "import",
            Token::Type => "type",
            Token::Func => "func",
            Token::Struct => "struct",
            Token::Interface => "interface",
            Token::Map => "map",
            Token::Chan => "chan",
            Token::Var => "var",
            Token::Const => "const",
            Token::StringLiteral(value) => return write!(f, "{:?}", value),
            Token::RuneLiteral(value) => return write!(f, "'{}'", value),
            Token::NumberLiteral(text) | Token::Operator(text) | Token::Identifier(text) => {
                return write!(f, "{}", text)
            }
            Token::LBrace => "{",
            Token::RBrace => "}",
            Token::LParen => "(",
            Token::RParen => ")",
            Token::LBracket => "[",
            Token::RBracket => "]",
            Token::Comma => ",",
            Token::Semicolon => ";",
            Token::Dot => ".",
            Token::Ellipsis => "...",
            Token::Star => "*",
            Token::Equals => "=",
            Token::Tilde => "~",
            Token::Pipe => "|",
            Token::Arrow => "<-",
            Token::Eof => "",
        };
        f.write_str(text)
    }
}

/// Position in source text for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
pub struct Span {
    pub line: usize,
    /// 1-based byte column, as Go tools report it
    pub column: usize,
    pub offset: usize,
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Token with source position
#[derive(Debug, Clone, PartialEq)]
pub struct SpannedToken {
    pub token: Token,
    pub span: Span,
}

/// Multi-character operators, longest first
const OPERATORS: &[&str] = &[
    "<<=", ">>=", "&^=", "...", "&&", "||", "<-", "++", "--", "==", "!=", "<=", ">=", ":=",
    "+=", "-=", "*=", "/=", "%=", "&=", "|=", "^=", "<<", ">>", "&^",
];

/// Tokenizer for Go source text
pub struct Tokenizer {
    input: Vec<char>,
    position: usize,
    line: usize,
    column: usize,
    /// Set when the last emitted token allows semicolon insertion
    pending_semicolon: bool,
}

impl Tokenizer {
    /// Create a new tokenizer for the given input text
    pub fn new(text: &str) -> Self {
        Tokenizer {
            input: text.chars().collect(),
            position: 0,
            line: 1,
            column: 1,
            pending_semicolon: false,
        }
    }

    /// Tokenize the entire input into a stream of spanned tokens
    pub fn tokenize(&mut self) -> crate::Result<Vec<SpannedToken>> {
        let mut tokens = Vec::new();

        loop {
            if let Some(span) = self.skip_whitespace_and_comments()? {
                if self.pending_semicolon {
                    tokens.push(SpannedToken {
                        token: Token::Semicolon,
                        span,
                    });
                    self.pending_semicolon = false;
                }
            }

            if self.is_at_end() {
                if self.pending_semicolon {
                    tokens.push(SpannedToken {
                        token: Token::Semicolon,
                        span: self.current_span(),
                    });
                }
                tokens.push(SpannedToken {
                    token: Token::Eof,
                    span: self.current_span(),
                });
                break;
            }

            let token = self.next_token()?;
            self.pending_semicolon = token.token.ends_line();
            tokens.push(token);
        }

        Ok(tokens)
    }

    // ── Character helpers ──────────────────────────────────

    fn is_at_end(&self) -> bool {
        self.position >= self.input.len()
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.position).copied()
    }

    fn peek_ahead(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.input.get(self.position).copied();
        if let Some(c) = ch {
            self.position += 1;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += c.len_utf8();
            }
        }
        ch
    }

    fn current_span(&self) -> Span {
        Span {
            line: self.line,
            column: self.column,
            offset: self.position,
        }
    }

    fn starts_with(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.peek_ahead(i) == Some(c))
    }

    // ── Whitespace & Comments ──────────────────────────────

    /// Skip whitespace and comments. Returns the span of the first line
    /// break crossed, if any (a general comment spanning lines counts).
    fn skip_whitespace_and_comments(&mut self) -> crate::Result<Option<Span>> {
        let mut newline = None;
        loop {
            while let Some(ch) = self.peek() {
                if ch == '\n' {
                    newline.get_or_insert(self.current_span());
                    self.advance();
                } else if ch.is_whitespace() {
                    self.advance();
                } else {
                    break;
                }
            }

            if self.starts_with("//") {
                while let Some(ch) = self.peek() {
                    if ch == '\n' {
                        break;
                    }
                    self.advance();
                }
                continue;
            }

            if self.starts_with("/*") {
                let start = self.current_span();
                self.advance();
                self.advance();
                loop {
                    if self.is_at_end() {
                        return Err(crate::Error::ParseError(format!(
                            "{}: unterminated comment",
                            start
                        )));
                    }
                    if self.starts_with("*/") {
                        self.advance();
                        self.advance();
                        break;
                    }
                    if self.peek() == Some('\n') {
                        newline.get_or_insert(self.current_span());
                    }
                    self.advance();
                }
                continue;
            }

            break;
        }
        Ok(newline)
    }

    // ── Main dispatch ──────────────────────────────────────

    fn next_token(&mut self) -> crate::Result<SpannedToken> {
        let span = self.current_span();
        let Some(ch) = self.peek() else {
            return Ok(SpannedToken {
                token: Token::Eof,
                span,
            });
        };

        match ch {
            '"' => return self.read_string(span),
            '`' => return self.read_raw_string(span),
            '\'' => return self.read_rune(span),
            c if c.is_ascii_digit() => return Ok(self.read_number(span)),
            '.' if self.peek_ahead(1).is_some_and(|c| c.is_ascii_digit()) => {
                return Ok(self.read_number(span));
            }
            c if c.is_alphabetic() || c == '_' => return Ok(self.read_identifier_or_keyword(span)),
            _ => {}
        }

        for op in OPERATORS {
            if self.starts_with(op) {
                for _ in 0..op.chars().count() {
                    self.advance();
                }
                let token = match *op {
                    "..." => Token::Ellipsis,
                    "<-" => Token::Arrow,
                    other => Token::Operator(other.to_string()),
                };
                return Ok(SpannedToken { token, span });
            }
        }

        self.advance();
        let token = match ch {
            '{' => Token::LBrace,
            '}' => Token::RBrace,
            '(' => Token::LParen,
            ')' => Token::RParen,
            '[' => Token::LBracket,
            ']' => Token::RBracket,
            ',' => Token::Comma,
            ';' => Token::Semicolon,
            '.' => Token::Dot,
            '*' => Token::Star,
            '=' => Token::Equals,
            '~' => Token::Tilde,
            '|' => Token::Pipe,
            '+' | '-' | '/' | '%' | '&' | '^' | '<' | '>' | '!' | ':' => {
                Token::Operator(ch.to_string())
            }
            _ => {
                return Err(crate::Error::ParseError(format!(
                    "{}: unexpected character '{}'",
                    span, ch
                )))
            }
        };
        Ok(SpannedToken { token, span })
    }

    // ── String & rune literals ─────────────────────────────

    fn read_string(&mut self, span: Span) -> crate::Result<SpannedToken> {
        self.advance(); // consume opening "
        let mut value = String::new();

        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(crate::Error::ParseError(format!(
                        "{}: unterminated string literal",
                        span
                    )));
                }
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('\\') => value.push('\\'),
                    Some('"') => value.push('"'),
                    Some(c) => {
                        // Escapes we don't need to decode are kept verbatim
                        value.push('\\');
                        value.push(c);
                    }
                    None => {
                        return Err(crate::Error::ParseError(format!(
                            "{}: unterminated escape sequence",
                            self.current_span()
                        )));
                    }
                },
                Some(c) => value.push(c),
            }
        }

        Ok(SpannedToken {
            token: Token::StringLiteral(value),
            span,
        })
    }

    fn read_raw_string(&mut self, span: Span) -> crate::Result<SpannedToken> {
        self.advance(); // consume opening `
        let mut value = String::new();
        loop {
            match self.advance() {
                None => {
                    return Err(crate::Error::ParseError(format!(
                        "{}: unterminated raw string literal",
                        span
                    )));
                }
                Some('`') => break,
                Some(c) => value.push(c),
            }
        }
        Ok(SpannedToken {
            token: Token::StringLiteral(value),
            span,
        })
    }

    fn read_rune(&mut self, span: Span) -> crate::Result<SpannedToken> {
        self.advance(); // consume opening '
        let mut value = String::new();
        loop {
            match self.advance() {
                None | Some('\n') => {
                    return Err(crate::Error::ParseError(format!(
                        "{}: unterminated rune literal",
                        span
                    )));
                }
                Some('\'') => break,
                Some('\\') => {
                    value.push('\\');
                    if let Some(c) = self.advance() {
                        value.push(c);
                    }
                }
                Some(c) => value.push(c),
            }
        }
        Ok(SpannedToken {
            token: Token::RuneLiteral(value),
            span,
        })
    }

    // ── Numbers ────────────────────────────────────────────

    /// Reads any Go numeric literal as text (ints, floats, hex, imaginary,
    /// digit separators). Values are never needed, only the lexeme.
    fn read_number(&mut self, span: Span) -> SpannedToken {
        let start = self.position;
        let is_hex = self.starts_with("0x") || self.starts_with("0X");
        while let Some(ch) = self.peek() {
            let exponent_sign = (ch == '+' || ch == '-')
                && self.position > start
                && match self.input[self.position - 1] {
                    'e' | 'E' => !is_hex,
                    'p' | 'P' => true,
                    _ => false,
                };
            if ch.is_ascii_alphanumeric() || ch == '_' || ch == '.' || exponent_sign {
                self.advance();
            } else {
                break;
            }
        }
        let text: String = self.input[start..self.position].iter().collect();
        SpannedToken {
            token: Token::NumberLiteral(text),
            span,
        }
    }

    // ── Identifiers & Keywords ─────────────────────────────

    fn read_identifier_or_keyword(&mut self, span: Span) -> SpannedToken {
        let start = self.position;

        while let Some(ch) = self.peek() {
            if ch.is_alphanumeric() || ch == '_' {
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.input[start..self.position].iter().collect();

        let token = match text.as_str() {
            "package" => Token::Package,
            "import" => Token::Import,
            "type" => Token::Type,
            "func" => Token::Func,
            "struct" => Token::Struct,
            "interface" => Token::Interface,
            "map" => Token::Map,
            "chan" => Token::Chan,
            "var" => Token::Var,
            "const" => Token::Const,
            _ => Token::Identifier(text),
        };

        SpannedToken { token, span }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize(input: &str) -> Vec<Token> {
        Tokenizer::new(input)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|st| st.token)
            .collect()
    }

    fn tokenize_err(input: &str) -> String {
        Tokenizer::new(input)
            .tokenize()
            .unwrap_err()
            .to_string()
    }

    fn ident(name: &str) -> Token {
        Token::Identifier(name.to_string())
    }

    // ── Keywords ───────────────────────────────────────

    #[test]
    fn test_tokenize_keywords() {
        let tokens = tokenize("package import type func struct interface map chan var const");
        assert_eq!(tokens, vec![
            Token::Package,
            Token::Import,
            Token::Type,
            Token::Func,
            Token::Struct,
            Token::Interface,
            Token::Map,
            Token::Chan,
            Token::Var,
            Token::Const,
            Token::Eof,
        ]);
    }

    // ── Semicolon insertion ────────────────────────────

    #[test]
    fn test_semicolon_after_identifier_line() {
        let tokens = tokenize("package errs\n");
        assert_eq!(tokens, vec![
            Token::Package,
            ident("errs"),
            Token::Semicolon,
            Token::Eof,
        ]);
    }

    #[test]
    fn test_no_semicolon_after_open_brace() {
        let tokens = tokenize("struct {\n\terror\n}\n");
        assert_eq!(tokens, vec![
            Token::Struct,
            Token::LBrace,
            ident("error"),
            Token::Semicolon,
            Token::RBrace,
            Token::Semicolon,
            Token::Eof,
        ]);
    }

    #[test]
    fn test_semicolon_inserted_at_eof() {
        let tokens = tokenize("type A int");
        assert_eq!(tokens.last(), Some(&Token::Eof));
        assert_eq!(tokens[tokens.len() - 2], Token::Semicolon);
    }

    #[test]
    fn test_multiline_block_comment_counts_as_newline() {
        let tokens = tokenize("a /* one\ntwo */ b");
        assert_eq!(tokens, vec![
            ident("a"),
            Token::Semicolon,
            ident("b"),
            Token::Semicolon,
            Token::Eof,
        ]);
    }

    #[test]
    fn test_single_line_block_comment_is_not_newline() {
        let tokens = tokenize("a /* inline */ b");
        assert_eq!(tokens, vec![ident("a"), ident("b"), Token::Semicolon, Token::Eof]);
    }

    // ── Literals ───────────────────────────────────────

    #[test]
    fn test_tokenize_strings() {
        let tokens = tokenize(r#""net/http" `json:"x"`"#);
        assert_eq!(tokens, vec![
            Token::StringLiteral("net/http".to_string()),
            Token::StringLiteral(r#"json:"x""#.to_string()),
            Token::Semicolon,
            Token::Eof,
        ]);
    }

    #[test]
    fn test_tokenize_rune_with_escape() {
        let tokens = tokenize(r"'\''");
        assert_eq!(tokens[0], Token::RuneLiteral(r"\'".to_string()));
    }

    #[test]
    fn test_tokenize_numbers() {
        let tokens = tokenize("42 0x1F 1_000 3.14 1e-9 2i");
        assert_eq!(tokens, vec![
            Token::NumberLiteral("42".into()),
            Token::NumberLiteral("0x1F".into()),
            Token::NumberLiteral("1_000".into()),
            Token::NumberLiteral("3.14".into()),
            Token::NumberLiteral("1e-9".into()),
            Token::NumberLiteral("2i".into()),
            Token::Semicolon,
            Token::Eof,
        ]);
    }

    #[test]
    fn test_unterminated_string() {
        let err = tokenize_err(r#""hello"#);
        assert!(err.contains("unterminated string"), "got: {}", err);
    }

    #[test]
    fn test_unterminated_comment() {
        let err = tokenize_err("/* never closed");
        assert!(err.contains("unterminated comment"), "got: {}", err);
    }

    // ── Symbols ────────────────────────────────────────

    #[test]
    fn test_tokenize_symbols() {
        let tokens = tokenize("{ } ( ) [ ] , ; . ... * = ~ | <-");
        assert_eq!(tokens, vec![
            Token::LBrace,
            Token::RBrace,
            Token::LParen,
            Token::RParen,
            Token::LBracket,
            Token::RBracket,
            Token::Comma,
            Token::Semicolon,
            Token::Dot,
            Token::Ellipsis,
            Token::Star,
            Token::Equals,
            Token::Tilde,
            Token::Pipe,
            Token::Arrow,
            Token::Eof,
        ]);
    }

    #[test]
    fn test_longest_operator_wins() {
        let tokens = tokenize("a := b == c || d");
        assert_eq!(tokens, vec![
            ident("a"),
            Token::Operator(":=".into()),
            ident("b"),
            Token::Operator("==".into()),
            ident("c"),
            Token::Operator("||".into()),
            ident("d"),
            Token::Semicolon,
            Token::Eof,
        ]);
    }

    #[test]
    fn test_unexpected_character() {
        let err = tokenize_err("@");
        assert!(err.contains("unexpected character"), "got: {}", err);
    }

    // ── Span tracking ──────────────────────────────────

    #[test]
    fn test_span_tracking() {
        let tokens = Tokenizer::new("type E struct {\n  err error\n}").tokenize().unwrap();
        assert_eq!(tokens[0].span, Span { line: 1, column: 1, offset: 0 });
        assert_eq!(tokens[1].token, ident("E"));
        assert_eq!(tokens[1].span, Span { line: 1, column: 6, offset: 5 });
        assert_eq!(tokens[4].token, ident("err"));
        assert_eq!(tokens[4].span, Span { line: 2, column: 3, offset: 18 });
    }

    #[test]
    fn test_columns_count_bytes() {
        let tokens = Tokenizer::new("func (Émoji) Unwrap() error").tokenize().unwrap();
        assert_eq!(tokens[2].token, ident("Émoji"));
        assert_eq!(tokens[2].span.column, 7);
        assert_eq!(tokens[4].token, ident("Unwrap"));
        assert_eq!(tokens[4].span.column, 15);
        assert_eq!(tokens[4].span.offset, 13);
    }

    #[test]
    fn test_token_spelling() {
        assert_eq!(Token::Arrow.to_string(), "<-");
        assert_eq!(ident("N").to_string(), "N");
        assert_eq!(Token::StringLiteral("ab".into()).to_string(), "\"ab\"");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(tokenize(""), vec![Token::Eof]);
        assert_eq!(tokenize("  \n\t// only a comment\n"), vec![Token::Eof]);
    }
}
