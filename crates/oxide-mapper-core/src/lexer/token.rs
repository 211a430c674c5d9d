//! Token types for the SQL lexer.

use super::Span;

/// Keywords that mark statement and clause boundaries.
///
/// Every other word is lexed as an identifier; the splitter only needs to
/// recognise where top-level clauses begin and end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    With,
    From,
    Where,
    Group,
    Having,
    Window,
    Order,
    By,
    Limit,
    Offset,
    Fetch,
    For,
    Union,
    Intersect,
    Except,
    Minus,
}

impl Keyword {
    /// Looks up a keyword, ignoring ASCII case.
    #[must_use]
    pub fn lookup(word: &str) -> Option<Self> {
        const TABLE: [(&str, Keyword); 17] = [
            ("SELECT", Keyword::Select),
            ("WITH", Keyword::With),
            ("FROM", Keyword::From),
            ("WHERE", Keyword::Where),
            ("GROUP", Keyword::Group),
            ("HAVING", Keyword::Having),
            ("WINDOW", Keyword::Window),
            ("ORDER", Keyword::Order),
            ("BY", Keyword::By),
            ("LIMIT", Keyword::Limit),
            ("OFFSET", Keyword::Offset),
            ("FETCH", Keyword::Fetch),
            ("FOR", Keyword::For),
            ("UNION", Keyword::Union),
            ("INTERSECT", Keyword::Intersect),
            ("EXCEPT", Keyword::Except),
            ("MINUS", Keyword::Minus),
        ];
        TABLE
            .iter()
            .find(|(text, _)| text.eq_ignore_ascii_case(word))
            .map(|(_, kw)| *kw)
    }

    /// Returns true for keywords that end a FROM clause at the top level.
    #[must_use]
    pub const fn ends_from_clause(self) -> bool {
        !matches!(self, Self::Select | Self::With | Self::From | Self::By)
    }

    /// Returns true for set operators joining two SELECTs.
    #[must_use]
    pub const fn is_set_operator(self) -> bool {
        matches!(
            self,
            Self::Union | Self::Intersect | Self::Except | Self::Minus
        )
    }
}

/// The kind of a lexed token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A clause keyword.
    Keyword(Keyword),
    /// A bare word (identifier, function name, non-clause keyword).
    Identifier(String),
    /// A quoted identifier: `"name"`, `` `name` `` or `[name]`.
    QuotedIdentifier(String),
    /// A string literal with quotes removed and escapes resolved.
    String(String),
    /// A numeric literal, as written.
    Number(String),
    /// A named or numbered bind parameter: `@name`, `:name`, `$1`.
    Parameter {
        /// The marker character.
        prefix: char,
        /// The name following the marker.
        name: String,
    },
    /// Positional parameter `?`.
    Question,
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Dot,
    Star,
    /// Any other operator or punctuation.
    Operator(String),
    /// Something the lexer could not make sense of.
    Error(String),
    /// End of input.
    Eof,
}

/// A token with its location in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// What was lexed.
    pub kind: TokenKind,
    /// Where it was lexed.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Returns true if this is the end-of-input token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns the keyword, if this token is one.
    #[must_use]
    pub const fn keyword(&self) -> Option<Keyword> {
        match self.kind {
            TokenKind::Keyword(kw) => Some(kw),
            _ => None,
        }
    }
}
