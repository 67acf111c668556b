//! Line counts of named functions, methods and classes, found by tracking
//! brace depth over the significant tokens of a file.

use std::fmt;
use std::path::Path;

use mwcu_lexer::{Keyword, Scanner, TokenKind};

use crate::cursor::TokenCursor;
use crate::{read_source, AnalysisError};

/// Progress of the analysis through a file, in source order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    ClassStart { name: String },
    Function { name: String, lines: usize },
    ClassEnd { name: String, lines: usize },
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::ClassStart { name } => write!(f, "Analyzing class {name}"),
            Event::Function { name, lines } => write!(f, "{lines:>5} lines for {name}."),
            Event::ClassEnd { name, lines } => {
                write!(f, "Done with class {name}, {lines} lines long.")
            }
        }
    }
}

struct Scope {
    name: String,
    depth: usize,
    start_line: usize,
    /// The body brace has been seen; until then a `;` means there is no body.
    opened: bool,
}

/// Report every class-like declaration and named function in a PHP file.
///
/// A count is the line of the closing brace minus the line of the
/// `class` or `function` keyword. Closures and bodiless (abstract or
/// interface) methods are not reported.
pub fn analyze(source: &str) -> Vec<Event> {
    let tokens = Scanner::tokenize(source);
    let mut cursor = TokenCursor::new(&tokens);
    let mut events = Vec::new();
    let mut depth = 0usize;
    let mut class: Option<Scope> = None;
    let mut function: Option<Scope> = None;

    while let Some(token) = cursor.advance() {
        let line = token.span.line;
        match token.kind {
            TokenKind::LBrace => {
                if let Some(f) = function.as_mut().filter(|f| f.depth == depth) {
                    f.opened = true;
                }
                depth += 1;
            }
            TokenKind::RBrace => {
                depth = depth.saturating_sub(1);
                if class.as_ref().is_some_and(|c| c.depth == depth) {
                    if let Some(c) = class.take() {
                        events.push(Event::ClassEnd {
                            lines: line - c.start_line,
                            name: c.name,
                        });
                    }
                } else if function.as_ref().is_some_and(|f| f.opened && f.depth == depth) {
                    if let Some(f) = function.take() {
                        events.push(Event::Function {
                            lines: line - f.start_line,
                            name: f.name,
                        });
                    }
                }
            }
            TokenKind::Semicolon => {
                if function.as_ref().is_some_and(|f| !f.opened && f.depth == depth) {
                    function = None;
                }
            }
            TokenKind::Keyword(Keyword::Class | Keyword::Interface | Keyword::Trait) => {
                if let Some(name) = cursor.accept_kind(TokenKind::Identifier) {
                    events.push(Event::ClassStart {
                        name: name.text.to_string(),
                    });
                    class = Some(Scope {
                        name: name.text.to_string(),
                        depth,
                        start_line: line,
                        opened: false,
                    });
                }
            }
            TokenKind::Keyword(Keyword::Function) => {
                cursor.accept_kind(TokenKind::Amp);
                if let Some(name) = cursor.accept_kind(TokenKind::Identifier) {
                    let name = match &class {
                        Some(c) => format!("{}::{}", c.name, name.text),
                        None => name.text.to_string(),
                    };
                    function = Some(Scope {
                        name,
                        depth,
                        start_line: line,
                        opened: false,
                    });
                }
            }
            _ => {}
        }
    }
    events
}

pub fn analyze_file(path: &Path) -> Result<Vec<Event>, AnalysisError> {
    Ok(analyze(&read_source(path)?))
}
