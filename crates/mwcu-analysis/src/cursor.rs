use mwcu_lexer::{Keyword, Token, TokenKind};

/// Forward cursor over the significant tokens of a file.
///
/// Whitespace and comments are dropped up front, so `peek` and `accept`
/// always see the next token that carries syntax.
pub struct TokenCursor<'src> {
    tokens: Vec<Token<'src>>,
    pos: usize,
}

impl<'src> TokenCursor<'src> {
    pub fn new(tokens: &[Token<'src>]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .copied()
                .filter(|t| !t.kind.is_trivia())
                .collect(),
            pos: 0,
        }
    }

    /// Take the next token, if any.
    pub fn advance(&mut self) -> Option<Token<'src>> {
        let token = self.tokens.get(self.pos).copied()?;
        self.pos += 1;
        Some(token)
    }

    pub fn peek(&self) -> Option<&Token<'src>> {
        self.tokens.get(self.pos)
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Take the next token only if it satisfies `wanted`.
    pub fn accept(&mut self, wanted: impl Fn(&Token<'src>) -> bool) -> Option<Token<'src>> {
        if self.peek().is_some_and(|t| wanted(t)) {
            self.advance()
        } else {
            None
        }
    }

    pub fn accept_kind(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        self.accept(|t| t.kind == kind)
    }

    pub fn accept_keyword(&mut self, keyword: Keyword) -> Option<Token<'src>> {
        self.accept(|t| t.is_keyword(keyword))
    }

    /// Current position, for [`TokenCursor::rewind`].
    pub fn mark(&self) -> usize {
        self.pos
    }

    pub fn rewind(&mut self, mark: usize) {
        self.pos = mark.min(self.tokens.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mwcu_lexer::Scanner;

    #[test]
    fn test_trivia_skipped() {
        let tokens = Scanner::tokenize_code("new /* x */ Foo // y\n;");
        let mut cursor = TokenCursor::new(&tokens);
        assert!(cursor.accept_keyword(Keyword::New).is_some());
        assert_eq!(cursor.advance().map(|t| t.text), Some("Foo"));
        assert_eq!(cursor.advance().map(|t| t.kind), Some(TokenKind::Semicolon));
        assert!(cursor.is_at_end());
        assert!(cursor.advance().is_none());
    }

    #[test]
    fn test_accept_leaves_cursor_on_miss() {
        let tokens = Scanner::tokenize_code("Foo::bar");
        let mut cursor = TokenCursor::new(&tokens);
        assert!(cursor.accept_kind(TokenKind::Variable).is_none());
        assert_eq!(cursor.peek().map(|t| t.text), Some("Foo"));
        assert!(cursor.accept_kind(TokenKind::Identifier).is_some());
        assert!(cursor.accept_kind(TokenKind::DoubleColon).is_some());
    }

    #[test]
    fn test_rewind() {
        let tokens = Scanner::tokenize_code("a b c");
        let mut cursor = TokenCursor::new(&tokens);
        let mark = cursor.mark();
        cursor.advance();
        cursor.advance();
        cursor.rewind(mark);
        assert_eq!(cursor.peek().map(|t| t.text), Some("a"));
        cursor.rewind(99);
        assert!(cursor.is_at_end());
    }
}
