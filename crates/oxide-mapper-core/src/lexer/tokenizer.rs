//! Cursor-based scanner over SQL text.

use super::{Keyword, Span, Token, TokenKind};

/// Splits SQL text into tokens with byte spans.
///
/// Whitespace and comments are dropped. Literals and quoted identifiers are
/// kept whole, so nothing inside them is ever read as structure.
pub struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    start: usize,
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '#')
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn bump_while(&mut self, pred: impl Fn(char) -> bool) {
        let len = self
            .rest()
            .find(|c: char| !pred(c))
            .unwrap_or_else(|| self.rest().len());
        self.pos += len;
    }

    fn skip_trivia(&mut self) {
        loop {
            self.bump_while(char::is_whitespace);
            let rest = self.rest();
            if rest.starts_with("--") {
                self.bump_while(|c| c != '\n');
            } else if let Some(body) = rest.strip_prefix("/*") {
                // An unterminated block comment runs to the end of input.
                self.pos += body.find("*/").map_or(rest.len(), |end| end + 4);
            } else {
                return;
            }
        }
    }

    fn emit(&self, kind: TokenKind) -> Token {
        Token::new(kind, Span::new(self.start, self.pos))
    }

    fn lexeme(&self) -> &'a str {
        &self.input[self.start..self.pos]
    }

    fn word(&mut self) -> Token {
        self.bump_while(is_word_char);
        let text = self.lexeme();
        let kind = Keyword::lookup(text)
            .map_or_else(|| TokenKind::Identifier(String::from(text)), TokenKind::Keyword);
        self.emit(kind)
    }

    /// Reads up to `close`; a doubled `close` stands for itself.
    fn delimited(&mut self, close: char) -> Option<String> {
        self.bump();
        let mut text = String::new();
        while let Some(c) = self.bump() {
            if c != close {
                text.push(c);
            } else if self.peek() == Some(close) {
                self.bump();
                text.push(close);
            } else {
                return Some(text);
            }
        }
        None
    }

    fn quoted(&mut self, close: char, wrap: fn(String) -> TokenKind, what: &str) -> Token {
        let kind = self
            .delimited(close)
            .map_or_else(|| TokenKind::Error(format!("unterminated {what}")), wrap);
        self.emit(kind)
    }

    /// Digits, fraction and exponent are kept as one lexeme.
    fn number(&mut self) -> Token {
        self.bump_while(|c| c.is_ascii_alphanumeric() || c == '.');
        let text = String::from(self.lexeme());
        self.emit(TokenKind::Number(text))
    }

    /// Scans the next token.
    #[must_use]
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();
        self.start = self.pos;

        let Some(c) = self.peek() else {
            return self.emit(TokenKind::Eof);
        };
        match c {
            '\'' => return self.quoted('\'', TokenKind::String, "string literal"),
            '"' => return self.quoted('"', TokenKind::QuotedIdentifier, "quoted identifier"),
            '`' => return self.quoted('`', TokenKind::QuotedIdentifier, "quoted identifier"),
            '[' => return self.quoted(']', TokenKind::QuotedIdentifier, "quoted identifier"),
            c if c.is_ascii_digit() => return self.number(),
            c if c.is_alphabetic() || c == '_' => return self.word(),
            _ => {}
        }

        self.bump();
        let next = self.peek();
        let kind = match c {
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '*' => TokenKind::Star,
            '?' => TokenKind::Question,
            // `@@ROWCOUNT` and friends are server variables, not parameters.
            '@' if next == Some('@') => {
                self.bump();
                self.bump_while(is_word_char);
                TokenKind::Identifier(String::from(self.lexeme()))
            }
            '@' | ':' | '$' if next.is_some_and(is_word_char) => {
                let name_start = self.pos;
                self.bump_while(is_word_char);
                TokenKind::Parameter {
                    prefix: c,
                    name: String::from(&self.input[name_start..self.pos]),
                }
            }
            '<' | '>' | '!' | '=' | '|' | ':' => {
                if matches!(next, Some('=' | '>' | '|' | ':')) {
                    self.bump();
                }
                TokenKind::Operator(String::from(self.lexeme()))
            }
            c => TokenKind::Operator(c.to_string()),
        };
        self.emit(kind)
    }

    /// Scans the whole input; the last token is always `Eof`.
    #[must_use]
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.is_eof();
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }
}
