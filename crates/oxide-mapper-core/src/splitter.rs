//! Structural slicing of caller-supplied SQL fragments.
//!
//! Callers hand the adapters anything from an empty string to a bare
//! `where ...` predicate to a complete `select`. [`SqlClauses`] answers the
//! three questions the adapters need without a grammar: is this a full
//! SELECT, where is its top-level ORDER BY, and where is its top-level FROM.
//! Keywords inside string literals, quoted identifiers, comments and
//! parenthesized sub-expressions are ignored.

use crate::lexer::{Keyword, Lexer, Span, Token, TokenKind};

/// The statement separator that marks a fragment as "use verbatim".
pub const PASSTHROUGH_MARKER: char = ';';

/// Clause boundaries of a SQL fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlClauses<'a> {
    sql: &'a str,
    is_select: bool,
    order_by: Option<Span>,
    from: Option<Span>,
}

impl<'a> SqlClauses<'a> {
    /// Scans a fragment. Leading and trailing whitespace is ignored, as are
    /// trailing top-level `;` terminators.
    #[must_use]
    pub fn parse(sql: &'a str) -> Self {
        let sql = strip_terminators(sql.trim());
        let tokens = Lexer::new(sql).tokenize();

        let is_select = matches!(
            tokens.first().and_then(Token::keyword),
            Some(Keyword::Select | Keyword::With)
        );

        let mut depth = 0_usize;
        let mut order_by: Option<Span> = None;
        let mut order_start: Option<usize> = None;
        let mut from: Option<Span> = None;
        let mut from_start: Option<usize> = None;
        let mut last_end = 0_usize;

        for (i, token) in tokens.iter().enumerate() {
            match token.kind {
                TokenKind::LeftParen => depth += 1,
                TokenKind::RightParen => depth = depth.saturating_sub(1),
                _ => {}
            }

            let top_level = depth == 0 && !matches!(token.kind, TokenKind::RightParen);
            if top_level {
                let ends_clause = match &token.kind {
                    TokenKind::Keyword(kw) => kw.ends_from_clause(),
                    TokenKind::Semicolon | TokenKind::Eof => true,
                    _ => false,
                };

                if ends_clause {
                    if let Some(start) = from_start.take() {
                        from = Some(Span::new(start, last_end));
                    }
                }

                let ends_order = matches!(
                    token.kind,
                    TokenKind::Keyword(Keyword::Limit | Keyword::Offset | Keyword::Fetch | Keyword::For)
                        | TokenKind::Semicolon
                        | TokenKind::Eof
                );
                if ends_order {
                    if let Some(start) = order_start.take() {
                        order_by = Some(Span::new(start, last_end));
                    }
                }

                match token.kind {
                    TokenKind::Keyword(Keyword::From) if from.is_none() && from_start.is_none() => {
                        from_start = Some(token.span.start);
                    }
                    TokenKind::Keyword(Keyword::Order)
                        if tokens
                            .get(i + 1)
                            .and_then(Token::keyword)
                            .is_some_and(|kw| kw == Keyword::By) =>
                    {
                        order_start = Some(token.span.start);
                        order_by = None;
                    }
                    TokenKind::Keyword(kw) if kw.is_set_operator() => {
                        order_start = None;
                        order_by = None;
                    }
                    _ => {}
                }
            }

            if !token.is_eof() {
                last_end = token.span.end;
            }
        }

        Self {
            sql,
            is_select,
            order_by,
            from,
        }
    }

    /// The trimmed fragment.
    #[must_use]
    pub const fn sql(&self) -> &'a str {
        self.sql
    }

    /// Returns true if the fragment is empty or whitespace.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Returns true if the fragment is a complete SELECT (or WITH ... SELECT).
    #[must_use]
    pub const fn is_select(&self) -> bool {
        self.is_select
    }

    /// If the fragment starts with the passthrough marker, returns the text
    /// after it.
    #[must_use]
    pub fn passthrough(&self) -> Option<&'a str> {
        self.sql
            .strip_prefix(PASSTHROUGH_MARKER)
            .map(str::trim_start)
    }

    /// The literal top-level `ORDER BY ...` clause, if any.
    #[must_use]
    pub fn order_by_clause(&self) -> Option<&'a str> {
        self.order_by.map(|span| span.text(self.sql))
    }

    /// The literal top-level `FROM ...` clause, if any.
    #[must_use]
    pub fn from_clause(&self) -> Option<&'a str> {
        self.from.map(|span| span.text(self.sql))
    }

    /// The fragment with its top-level ORDER BY clause cut out.
    #[must_use]
    pub fn without_order_by(&self) -> String {
        let Some(span) = self.order_by else {
            return String::from(self.sql);
        };
        let head = self.sql[..span.start].trim_end();
        let tail = self.sql[span.end..].trim_start();
        match (head.is_empty(), tail.is_empty()) {
            (_, true) => String::from(head),
            (true, false) => String::from(tail),
            (false, false) => format!("{head} {tail}"),
        }
    }
}

/// Cuts trailing `;` tokens and the whitespace before them. A `;` at the
/// very start is the passthrough marker and stays.
fn strip_terminators(sql: &str) -> &str {
    let mut end = sql.len();
    for token in Lexer::new(sql).tokenize().iter().rev().filter(|t| !t.is_eof()) {
        if !matches!(token.kind, TokenKind::Semicolon) || token.span.start == 0 {
            break;
        }
        end = token.span.start;
    }
    sql[..end].trim_end()
}

/// Splits a batch into its top-level statements.
///
/// Empty statements are dropped; separators inside literals or parentheses
/// do not split.
#[must_use]
pub fn split_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut depth = 0_usize;
    let mut start = 0_usize;

    for token in Lexer::new(sql).tokenize() {
        match token.kind {
            TokenKind::LeftParen => depth += 1,
            TokenKind::RightParen => depth = depth.saturating_sub(1),
            TokenKind::Semicolon | TokenKind::Eof if depth == 0 || token.is_eof() => {
                let statement = sql[start..token.span.start].trim();
                if !statement.is_empty() {
                    statements.push(statement);
                }
                start = token.span.end;
            }
            _ => {}
        }
    }
    statements
}
