use crate::token::{is_cast_type, Keyword, Span, Token, TokenKind};

/// Scanner mode determines how text outside of tags is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceMode {
    /// Default mode: everything up to `<?php` or `<?=` is inline markup,
    /// as in a `.php` file on disk.
    #[default]
    Markup,
    /// The source is PHP code from its first byte.
    Code,
}

/// Operators and punctuation, longest spelling first.
const OPERATORS: &[(&str, TokenKind)] = &[
    ("<=>", TokenKind::Spaceship),
    ("**=", TokenKind::PowEqual),
    ("...", TokenKind::Ellipsis),
    ("<<=", TokenKind::ShiftLeftEqual),
    (">>=", TokenKind::ShiftRightEqual),
    ("===", TokenKind::IsIdentical),
    ("!==", TokenKind::IsNotIdentical),
    ("??=", TokenKind::CoalesceEqual),
    ("?->", TokenKind::NullsafeObjectOperator),
    ("**", TokenKind::Pow),
    ("++", TokenKind::Increment),
    ("--", TokenKind::Decrement),
    ("->", TokenKind::ObjectOperator),
    ("=>", TokenKind::DoubleArrow),
    ("::", TokenKind::DoubleColon),
    ("==", TokenKind::IsEqual),
    ("!=", TokenKind::IsNotEqual),
    ("<>", TokenKind::IsNotEqual),
    ("<=", TokenKind::IsSmallerOrEqual),
    (">=", TokenKind::IsGreaterOrEqual),
    ("&&", TokenKind::BooleanAnd),
    ("||", TokenKind::BooleanOr),
    ("??", TokenKind::Coalesce),
    ("+=", TokenKind::PlusEqual),
    ("-=", TokenKind::MinusEqual),
    ("*=", TokenKind::MulEqual),
    ("/=", TokenKind::DivEqual),
    (".=", TokenKind::ConcatEqual),
    ("%=", TokenKind::ModEqual),
    ("&=", TokenKind::AndEqual),
    ("|=", TokenKind::OrEqual),
    ("^=", TokenKind::XorEqual),
    ("<<", TokenKind::ShiftLeft),
    (">>", TokenKind::ShiftRight),
    ("=", TokenKind::Assign),
    ("+", TokenKind::Plus),
    ("-", TokenKind::Minus),
    ("*", TokenKind::Star),
    ("/", TokenKind::Slash),
    ("%", TokenKind::Percent),
    (".", TokenKind::Dot),
    ("&", TokenKind::Amp),
    ("|", TokenKind::Pipe),
    ("^", TokenKind::Caret),
    ("~", TokenKind::Tilde),
    ("!", TokenKind::Bang),
    ("<", TokenKind::Lt),
    (">", TokenKind::Gt),
    ("?", TokenKind::Question),
    (":", TokenKind::Colon),
    (";", TokenKind::Semicolon),
    (",", TokenKind::Comma),
    ("(", TokenKind::LParen),
    (")", TokenKind::RParen),
    ("[", TokenKind::LBracket),
    ("]", TokenKind::RBracket),
    ("{", TokenKind::LBrace),
    ("}", TokenKind::RBrace),
    ("@", TokenKind::At),
    ("$", TokenKind::Dollar),
    ("\\", TokenKind::NsSeparator),
];

/// PHP source scanner.
///
/// Splits source text into a flat sequence of tokens whose texts, joined
/// back together, reproduce the input byte for byte. Scanning never fails:
/// unterminated literals and comments run to the end of the input, and any
/// byte the scanner cannot classify becomes an [`TokenKind::Other`] token.
///
/// Works on the source bytes directly. Every token boundary falls on an
/// ASCII byte or the end of input, so token texts are always valid `&str`
/// slices of the source.
pub struct Scanner<'src> {
    source: &'src str,
    bytes: &'src [u8],
    pos: usize,
    line: usize,
    column: usize,
    start: usize,
    start_line: usize,
    start_column: usize,
    tokens: Vec<Token<'src>>,
    mode: SourceMode,
}

impl<'src> Scanner<'src> {
    /// Create a new scanner for the given source, starting in markup.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
            line: 1,
            column: 1,
            start: 0,
            start_line: 1,
            start_column: 1,
            tokens: Vec::new(),
            mode: SourceMode::Markup,
        }
    }

    /// Create a scanner with a specific mode.
    pub fn with_mode(source: &'src str, mode: SourceMode) -> Self {
        let mut scanner = Self::new(source);
        scanner.mode = mode;
        scanner
    }

    /// Tokenize a PHP file: inline markup until the first open tag.
    pub fn tokenize(source: &'src str) -> Vec<Token<'src>> {
        Scanner::new(source).scan()
    }

    /// Tokenize a fragment of PHP code that has no open tag.
    pub fn tokenize_code(source: &'src str) -> Vec<Token<'src>> {
        Scanner::with_mode(source, SourceMode::Code).scan()
    }

    /// Consume the scanner and return every token of the source.
    pub fn scan(mut self) -> Vec<Token<'src>> {
        while !self.is_at_end() {
            self.begin();
            match self.mode {
                SourceMode::Markup => self.scan_inline_html(),
                SourceMode::Code => self.scan_token(),
            }
        }
        self.tokens
    }

    /// Scan the next token in PHP code.
    fn scan_token(&mut self) {
        match self.peek() {
            b' ' | b'\t' | b'\n' | b'\r' => self.scan_whitespace(),

            // Comments and attributes
            b'#' if self.peek_next() == b'[' => {
                self.advance_by(2);
                self.emit(TokenKind::Attribute);
            }
            b'#' => self.scan_line_comment(),
            b'/' if self.peek_next() == b'/' => self.scan_line_comment(),
            b'/' if self.peek_next() == b'*' => self.scan_block_comment(),

            b'?' if self.peek_next() == b'>' => self.scan_close_tag(),

            // Strings
            b'"' => self.scan_quoted(b'"', TokenKind::DoubleQuote),
            b'\'' => self.scan_quoted(b'\'', TokenKind::SingleQuote),
            b'`' => self.scan_quoted(b'`', TokenKind::Backtick),
            b'<' => {
                if !self.scan_heredoc() {
                    self.scan_operator();
                }
            }

            b'$' if is_label_start(self.peek_next()) => self.scan_variable(),
            b'0'..=b'9' => self.scan_number(),
            b'.' if self.peek_next().is_ascii_digit() => self.scan_number(),
            b'(' => {
                if !self.scan_cast() {
                    self.scan_operator();
                }
            }

            // Identifiers and keywords
            c if is_label_start(c) => self.scan_word(),

            _ => self.scan_operator(),
        }
    }

    // --- Markup ---

    /// Scan inline markup up to (and including) the next open tag.
    fn scan_inline_html(&mut self) {
        while !self.is_at_end() && !self.at_open_tag() {
            self.advance();
        }
        if self.pos > self.start {
            self.emit(TokenKind::InlineHtml);
            self.begin();
        }
        if self.is_at_end() {
            return;
        }

        if self.starts_with("<?=") {
            self.advance_by(3);
            self.emit(TokenKind::OpenTagWithEcho);
        } else {
            // `<?php` owns a single whitespace character after it
            self.advance_by(5);
            match self.peek() {
                b'\r' => {
                    self.advance();
                    if self.peek() == b'\n' {
                        self.advance();
                    }
                }
                b' ' | b'\t' | b'\n' => self.advance(),
                _ => {}
            }
            self.emit(TokenKind::OpenTag);
        }
        self.mode = SourceMode::Code;
    }

    fn at_open_tag(&self) -> bool {
        if self.starts_with("<?=") {
            return true;
        }
        let rest = &self.bytes[self.pos..];
        rest.len() >= 5
            && rest[..5].eq_ignore_ascii_case(b"<?php")
            && rest.get(5).map_or(true, |b| b.is_ascii_whitespace())
    }

    /// Scan `?>`, which also swallows a single newline after it.
    fn scan_close_tag(&mut self) {
        self.advance_by(2);
        match self.peek() {
            b'\n' => self.advance(),
            b'\r' => {
                self.advance();
                if self.peek() == b'\n' {
                    self.advance();
                }
            }
            _ => {}
        }
        self.emit(TokenKind::CloseTag);
        self.mode = SourceMode::Markup;
    }

    // --- Scanners ---

    fn scan_whitespace(&mut self) {
        while matches!(self.peek(), b' ' | b'\t' | b'\n' | b'\r') && !self.is_at_end() {
            self.advance();
        }
        self.emit(TokenKind::Whitespace);
    }

    /// Scan a `#` or `//` comment. The terminating newline belongs to the
    /// comment; a close tag does not.
    fn scan_line_comment(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b'\n' => {
                    self.advance();
                    break;
                }
                b'\r' => {
                    self.advance();
                    if self.peek() == b'\n' {
                        self.advance();
                    }
                    break;
                }
                b'?' if self.peek_next() == b'>' => break,
                _ => self.advance(),
            }
        }
        self.emit(TokenKind::LineComment);
    }

    /// Scan `/* ... */` or a `/** ... */` doc comment. Unterminated comments
    /// run to the end of input.
    fn scan_block_comment(&mut self) {
        let is_doc = self.starts_with("/**") && self.byte_at(self.pos + 3).is_ascii_whitespace();
        self.advance_by(2);
        while !self.is_at_end() {
            if self.starts_with("*/") {
                self.advance_by(2);
                break;
            }
            self.advance();
        }
        let kind = if is_doc {
            TokenKind::DocComment
        } else {
            TokenKind::BlockComment
        };
        self.emit(kind);
    }

    /// Scan a quoted literal as marker, content, marker. The closing marker
    /// is missing when the literal is unterminated.
    fn scan_quoted(&mut self, quote: u8, marker: TokenKind) {
        self.advance();
        self.emit(marker);
        self.begin();

        let interpolates = quote != b'\'';
        while !self.is_at_end() && self.peek() != quote {
            match self.peek() {
                b'\\' => self.advance_by(2),
                b'{' if interpolates && self.peek_next() == b'$' => self.skip_interpolation(),
                b'$' if interpolates && self.peek_next() == b'{' => {
                    self.advance();
                    self.skip_interpolation();
                }
                _ => self.advance(),
            }
        }

        if self.pos > self.start {
            self.emit(TokenKind::StringContent);
        }
        if !self.is_at_end() {
            self.begin();
            self.advance();
            self.emit(marker);
        }
    }

    /// Skip a `{$expr}` or `${expr}` interpolation, which may itself contain
    /// braces and quoted strings.
    fn skip_interpolation(&mut self) {
        self.advance(); // consume opening `{`
        let mut depth = 1;
        while !self.is_at_end() && depth > 0 {
            match self.peek() {
                b'{' => depth += 1,
                b'}' => depth -= 1,
                q @ (b'"' | b'\'') => {
                    self.skip_nested_string(q);
                    continue;
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn skip_nested_string(&mut self, quote: u8) {
        self.advance();
        while !self.is_at_end() && self.peek() != quote {
            if self.peek() == b'\\' {
                self.advance();
            }
            self.advance();
        }
        self.advance(); // closing quote
    }

    /// Scan a heredoc or nowdoc. Returns false, consuming nothing, when the
    /// `<` does not start one.
    fn scan_heredoc(&mut self) -> bool {
        if !self.starts_with("<<<") {
            return false;
        }
        let mut i = self.pos + 3;
        while matches!(self.byte_at(i), b' ' | b'\t') {
            i += 1;
        }
        let quote = match self.byte_at(i) {
            q @ (b'"' | b'\'') => {
                i += 1;
                Some(q)
            }
            _ => None,
        };
        if !is_label_start(self.byte_at(i)) {
            return false;
        }
        let label_start = i;
        while is_label_char(self.byte_at(i)) {
            i += 1;
        }
        let label_end = i;
        if let Some(q) = quote {
            if self.byte_at(i) != q {
                return false;
            }
            i += 1;
        }
        match self.byte_at(i) {
            b'\n' => i += 1,
            b'\r' => {
                i += 1;
                if self.byte_at(i) == b'\n' {
                    i += 1;
                }
            }
            _ => return false,
        }

        let source = self.source;
        let label = &source[label_start..label_end];
        self.advance_by(i - self.pos);
        self.emit(TokenKind::HeredocStart);
        self.scan_heredoc_body(label);
        true
    }

    /// Scan heredoc lines until one starts with the closing label.
    fn scan_heredoc_body(&mut self, label: &str) {
        self.begin();
        while !self.is_at_end() {
            if let Some(len) = self.closing_label_len(label) {
                if self.pos > self.start {
                    self.emit(TokenKind::StringContent);
                }
                self.begin();
                self.advance_by(len);
                self.emit(TokenKind::HeredocEnd);
                return;
            }
            while !self.is_at_end() && self.peek() != b'\n' {
                self.advance();
            }
            self.advance();
        }
        if self.pos > self.start {
            self.emit(TokenKind::StringContent);
        }
    }

    /// Length of an (optionally indented) closing label at the cursor.
    fn closing_label_len(&self, label: &str) -> Option<usize> {
        let mut i = self.pos;
        while matches!(self.byte_at(i), b' ' | b'\t') {
            i += 1;
        }
        let rest = &self.bytes[i..];
        if rest.starts_with(label.as_bytes()) && !is_label_char(self.byte_at(i + label.len())) {
            Some(i + label.len() - self.pos)
        } else {
            None
        }
    }

    /// Scan a cast such as `(int)` or `( string )`. Returns false, consuming
    /// nothing, for an ordinary parenthesis.
    fn scan_cast(&mut self) -> bool {
        let mut i = self.pos + 1;
        while matches!(self.byte_at(i), b' ' | b'\t') {
            i += 1;
        }
        let word_start = i;
        while self.byte_at(i).is_ascii_alphabetic() {
            i += 1;
        }
        let word = &self.source[word_start..i];
        while matches!(self.byte_at(i), b' ' | b'\t') {
            i += 1;
        }
        if word.is_empty() || self.byte_at(i) != b')' || !is_cast_type(word) {
            return false;
        }
        self.advance_by(i + 1 - self.pos);
        self.emit(TokenKind::Cast);
        true
    }

    fn scan_variable(&mut self) {
        self.advance(); // consume `$`
        while is_label_char(self.peek()) {
            self.advance();
        }
        self.emit(TokenKind::Variable);
    }

    /// Scan an integer or float literal, including hex, octal and binary
    /// forms and `_` digit separators.
    fn scan_number(&mut self) {
        let radix_digit: Option<fn(u8) -> bool> = match (self.peek(), self.peek_next()) {
            (b'0', b'x' | b'X') => Some(|b: u8| b.is_ascii_hexdigit()),
            (b'0', b'b' | b'B') => Some(|b: u8| b == b'0' || b == b'1'),
            (b'0', b'o' | b'O') => Some(|b: u8| (b'0'..=b'7').contains(&b)),
            _ => None,
        };
        if let Some(is_digit) = radix_digit {
            self.advance_by(2);
            while is_digit(self.peek()) || (self.peek() == b'_' && is_digit(self.peek_next())) {
                self.advance();
            }
            self.emit(TokenKind::Number);
            return;
        }

        self.eat_digits();
        if self.peek() == b'.' {
            self.advance();
            self.eat_digits();
        }
        if matches!(self.peek(), b'e' | b'E') {
            let next = self.peek_next();
            let signed = matches!(next, b'+' | b'-') && self.byte_at(self.pos + 2).is_ascii_digit();
            if next.is_ascii_digit() || signed {
                self.advance_by(if signed { 2 } else { 1 });
                self.eat_digits();
            }
        }
        self.emit(TokenKind::Number);
    }

    fn eat_digits(&mut self) {
        while self.peek().is_ascii_digit()
            || (self.peek() == b'_' && self.peek_next().is_ascii_digit())
        {
            self.advance();
        }
    }

    /// Scan an identifier or keyword.
    fn scan_word(&mut self) {
        while is_label_char(self.peek()) {
            self.advance();
        }
        let source = self.source;
        let word = &source[self.start..self.pos];
        // After `->`, `::`, `function` or `const`, reserved words are names
        let kind = if self.after_name_position() {
            TokenKind::Identifier
        } else {
            Keyword::from_word(word).map_or(TokenKind::Identifier, TokenKind::Keyword)
        };
        self.emit(kind);
    }

    fn after_name_position(&self) -> bool {
        self.tokens
            .iter()
            .rev()
            .find(|t| !t.kind.is_trivia())
            .is_some_and(|t| {
                matches!(
                    t.kind,
                    TokenKind::ObjectOperator
                        | TokenKind::NullsafeObjectOperator
                        | TokenKind::DoubleColon
                        | TokenKind::Keyword(Keyword::Function)
                        | TokenKind::Keyword(Keyword::Const)
                )
            })
    }

    /// Scan an operator or punctuation mark; anything unknown becomes a
    /// single-character `Other` token.
    fn scan_operator(&mut self) {
        let rest = &self.bytes[self.pos..];
        match OPERATORS.iter().find(|(op, _)| rest.starts_with(op.as_bytes())) {
            Some(&(op, kind)) => {
                self.advance_by(op.len());
                self.emit(kind);
            }
            None => {
                let len = self.source[self.pos..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.advance_by(len);
                self.emit(TokenKind::Other);
            }
        }
    }

    // --- Helpers ---

    fn begin(&mut self) {
        self.start = self.pos;
        self.start_line = self.line;
        self.start_column = self.column;
    }

    fn emit(&mut self, kind: TokenKind) {
        let span = Span::new(self.start, self.pos, self.start_line, self.start_column);
        let source = self.source;
        let text = &source[self.start..self.pos];
        self.tokens.push(Token::new(kind, text, span));
    }

    fn peek(&self) -> u8 {
        self.byte_at(self.pos)
    }

    fn peek_next(&self) -> u8 {
        self.byte_at(self.pos + 1)
    }

    fn byte_at(&self, index: usize) -> u8 {
        self.bytes.get(index).copied().unwrap_or(0)
    }

    fn starts_with(&self, text: &str) -> bool {
        self.bytes[self.pos..].starts_with(text.as_bytes())
    }

    fn advance(&mut self) {
        let Some(&b) = self.bytes.get(self.pos) else {
            return;
        };
        self.pos += 1;
        let lone_cr = b == b'\r' && self.peek() != b'\n';
        if b == b'\n' || lone_cr {
            self.line += 1;
            self.column = 1;
        } else if b & 0xC0 != 0x80 {
            // Count characters, not UTF-8 continuation bytes
            self.column += 1;
        }
    }

    fn advance_by(&mut self, n: usize) {
        for _ in 0..n {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.bytes.len()
    }
}

fn is_label_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b >= 0x80
}

fn is_label_char(b: u8) -> bool {
    is_label_start(b) || b.is_ascii_digit()
}
