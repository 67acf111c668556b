//! Classification tables for the spacing engine.
//!
//! Every token kind maps to a [`Spacing`] through an exhaustive match, so a
//! new kind in the lexer cannot be added without deciding how it is spaced.

use mwcu_lexer::{Keyword, Token, TokenKind};

/// Where a token wants a single space next to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spacing {
    None,
    Before,
    After,
    Both,
}

impl Spacing {
    pub fn before(self) -> bool {
        matches!(self, Spacing::Before | Spacing::Both)
    }

    pub fn after(self) -> bool {
        matches!(self, Spacing::After | Spacing::Both)
    }
}

/// Spacing demanded by a token kind.
///
/// `&` is deliberately unspaced: it is also the by-reference marker, so
/// `$a = &$b` keeps the ampersand bound to its operand. `-` only spaces on
/// its left so that `$foo = -1` does not become `$foo = - 1`.
pub fn spacing(kind: TokenKind) -> Spacing {
    match kind {
        TokenKind::Keyword(keyword) => keyword_spacing(keyword),

        TokenKind::Assign
        | TokenKind::PlusEqual
        | TokenKind::MinusEqual
        | TokenKind::MulEqual
        | TokenKind::DivEqual
        | TokenKind::ConcatEqual
        | TokenKind::ModEqual
        | TokenKind::PowEqual
        | TokenKind::AndEqual
        | TokenKind::OrEqual
        | TokenKind::XorEqual
        | TokenKind::ShiftLeftEqual
        | TokenKind::ShiftRightEqual
        | TokenKind::CoalesceEqual
        | TokenKind::IsEqual
        | TokenKind::IsNotEqual
        | TokenKind::IsIdentical
        | TokenKind::IsNotIdentical
        | TokenKind::IsSmallerOrEqual
        | TokenKind::IsGreaterOrEqual
        | TokenKind::Spaceship
        | TokenKind::Lt
        | TokenKind::Gt
        | TokenKind::BooleanAnd
        | TokenKind::BooleanOr
        | TokenKind::Coalesce
        | TokenKind::Plus
        | TokenKind::Star
        | TokenKind::Slash
        | TokenKind::Percent
        | TokenKind::Pow
        | TokenKind::Dot
        | TokenKind::Pipe
        | TokenKind::Caret
        | TokenKind::ShiftLeft
        | TokenKind::ShiftRight
        | TokenKind::DoubleArrow
        | TokenKind::Question
        | TokenKind::LBrace => Spacing::Both,

        TokenKind::RParen | TokenKind::RBrace | TokenKind::Minus => Spacing::Before,

        TokenKind::LParen | TokenKind::Semicolon | TokenKind::Comma | TokenKind::Colon => {
            Spacing::After
        }

        TokenKind::Whitespace
        | TokenKind::InlineHtml
        | TokenKind::OpenTag
        | TokenKind::OpenTagWithEcho
        | TokenKind::CloseTag
        | TokenKind::LineComment
        | TokenKind::BlockComment
        | TokenKind::DocComment
        | TokenKind::Attribute
        | TokenKind::DoubleQuote
        | TokenKind::SingleQuote
        | TokenKind::Backtick
        | TokenKind::HeredocStart
        | TokenKind::HeredocEnd
        | TokenKind::StringContent
        | TokenKind::Variable
        | TokenKind::Identifier
        | TokenKind::Number
        | TokenKind::Cast
        | TokenKind::Bang
        | TokenKind::Amp
        | TokenKind::Tilde
        | TokenKind::Increment
        | TokenKind::Decrement
        | TokenKind::ObjectOperator
        | TokenKind::NullsafeObjectOperator
        | TokenKind::DoubleColon
        | TokenKind::NsSeparator
        | TokenKind::LBracket
        | TokenKind::RBracket
        | TokenKind::At
        | TokenKind::Dollar
        | TokenKind::Ellipsis
        | TokenKind::Other => Spacing::None,
    }
}

fn keyword_spacing(keyword: Keyword) -> Spacing {
    match keyword {
        Keyword::As
        | Keyword::Case
        | Keyword::Catch
        | Keyword::Clone
        | Keyword::Do
        | Keyword::Else
        | Keyword::ElseIf
        | Keyword::For
        | Keyword::Foreach
        | Keyword::If
        | Keyword::Try
        | Keyword::While
        | Keyword::And
        | Keyword::Or
        | Keyword::Xor => Spacing::Both,
        _ => Spacing::None,
    }
}

/// Text of the token that closes an empty pair opened by `kind`. Nothing is
/// injected between the two halves of such a pair.
pub fn close_pair(kind: TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::LParen => Some(")"),
        TokenKind::LBrace => Some("}"),
        TokenKind::Question => Some(":"),
        TokenKind::ObjectOperator | TokenKind::NullsafeObjectOperator => Some("{"),
        _ => None,
    }
}

/// Whether `first` immediately followed by `second` forms an empty pair.
pub fn is_close_pair(first: &Token<'_>, second: &Token<'_>) -> bool {
    close_pair(first.kind) == Some(second.text)
}

/// Tokens whose own text may already end in the space a neighbor wants.
fn eats_space(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LineComment
            | TokenKind::BlockComment
            | TokenKind::OpenTag
            | TokenKind::OpenTagWithEcho
    )
}

/// Whether a neighbor already provides separation. `None` stands for the
/// virtual start and end of the sequence, which count as whitespace.
pub fn is_space(token: Option<&Token<'_>>) -> bool {
    match token {
        None => true,
        Some(t) if t.kind == TokenKind::Whitespace => true,
        Some(t) => eats_space(t.kind) && t.text.ends_with(|c: char| c.is_whitespace()),
    }
}
