//! PHP Lexer
//!
//! Tokenizes PHP source files into a flat stream of classified tokens.
//! Handles inline markup around `<?php` tags, comments, quoted strings with
//! interpolation, heredoc and nowdoc literals, casts, and the full PHP
//! operator set. The texts of the produced tokens always concatenate back
//! to the input, so tools can rewrite code by deciding what to emit between
//! tokens.
//!
//! # Example
//!
//! ```
//! use mwcu_lexer::{Scanner, TokenKind};
//!
//! let tokens = Scanner::tokenize_code("$a=1;");
//! assert_eq!(tokens[1].kind, TokenKind::Assign);
//! assert_eq!(tokens.iter().map(|t| t.text).collect::<String>(), "$a=1;");
//! ```

pub mod scanner;
pub mod token;

pub use scanner::{Scanner, SourceMode};
pub use token::{Keyword, Span, Token, TokenKind};
