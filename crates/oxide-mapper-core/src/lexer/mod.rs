//! SQL Lexer
//!
//! A hand-written lexer producing a stream of tokens with byte spans. It is
//! the only SQL "parsing" this crate does: the clause splitter and the
//! parameter rewriter work on its tokens so that keywords inside string
//! literals, quoted identifiers and comments are never mistaken for structure.

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Keyword, Token, TokenKind};
pub use tokenizer::Lexer;
