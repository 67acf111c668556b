//! Fast token-level syntax check for PHP files.
//!
//! Catches the errors that break a file outright: literals and comments
//! that never end, and brackets that do not pair up. It does not parse, so
//! it never rejects valid code, but it also misses errors that only a
//! grammar would see.

use std::path::{Path, PathBuf};

use mwcu_lexer::{Scanner, TokenKind};

use crate::walk::{has_extension, source_files};
use crate::{read_source, AnalysisError};

/// The first syntax problem in a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Problem {
    pub line: usize,
    pub message: String,
}

impl Problem {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// `.php` files under `root`, skipping dot-files and dot-directories.
pub fn files(root: &Path) -> Result<Vec<PathBuf>, AnalysisError> {
    source_files(root, true, |p| has_extension(p, &["php"]))
}

pub fn check_file(path: &Path) -> Result<Option<Problem>, AnalysisError> {
    Ok(check_source(&read_source(path)?))
}

/// Check a PHP file, stopping at the first problem like the PHP compiler.
pub fn check_source(source: &str) -> Option<Problem> {
    let tokens = Scanner::tokenize(source);
    let mut open: Vec<(&str, usize)> = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        let token = &tokens[i];
        let line = token.span.line;
        match token.kind {
            TokenKind::DoubleQuote
            | TokenKind::SingleQuote
            | TokenKind::Backtick
            | TokenKind::HeredocStart => {
                let (closing, what) = match token.kind {
                    TokenKind::HeredocStart => (TokenKind::HeredocEnd, "heredoc"),
                    marker => (marker, "string"),
                };
                match tokens[i + 1..].iter().position(|t| t.kind == closing) {
                    Some(end) => {
                        i += end + 2;
                        continue;
                    }
                    None => return Some(Problem::new(line, format!("Unterminated {what}"))),
                }
            }
            TokenKind::BlockComment | TokenKind::DocComment
                if token.text.len() < 4 || !token.text.ends_with("*/") =>
            {
                return Some(Problem::new(line, "Unterminated comment"));
            }
            TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace | TokenKind::Attribute => {
                open.push((token.text, line));
            }
            TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => match open.pop() {
                None => return Some(Problem::new(line, format!("Unmatched '{}'", token.text))),
                Some((opener, opened_on)) if closer(opener) != token.text => {
                    return Some(Problem::new(
                        line,
                        format!(
                            "Unclosed '{opener}' on line {opened_on} does not match '{}'",
                            token.text
                        ),
                    ));
                }
                Some(_) => {}
            },
            _ => {}
        }
        i += 1;
    }

    open.last()
        .map(|&(opener, opened_on)| Problem::new(opened_on, format!("Unclosed '{opener}'")))
}

fn closer(opener: &str) -> &'static str {
    match opener {
        "(" => ")",
        "{" => "}",
        _ => "]",
    }
}
