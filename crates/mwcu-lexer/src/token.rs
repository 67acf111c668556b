/// A position in source text, tracking line and column for diagnostics.
///
/// `start` and `end` are byte offsets into the source; `line` and `column`
/// are 1-based and describe where the token starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Token classification for PHP source.
///
/// Tokens carry no data of their own: the literal text lives on [`Token`],
/// so that the concatenated text of a token sequence always reproduces the
/// scanned input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // Layout
    Whitespace,
    InlineHtml,
    OpenTag,
    OpenTagWithEcho,
    CloseTag,

    // Comments
    LineComment,
    BlockComment,
    DocComment,
    Attribute, // #[

    // Literal boundaries. The same marker kind opens and closes a string.
    DoubleQuote,
    SingleQuote,
    Backtick,
    HeredocStart,
    HeredocEnd,
    StringContent,

    // Atoms
    Variable,
    Identifier,
    Keyword(Keyword),
    Number,
    Cast,

    // Assignment
    Assign,
    PlusEqual,
    MinusEqual,
    MulEqual,
    DivEqual,
    ConcatEqual,
    ModEqual,
    PowEqual,
    AndEqual,
    OrEqual,
    XorEqual,
    ShiftLeftEqual,
    ShiftRightEqual,
    CoalesceEqual,

    // Comparison
    IsEqual,
    IsNotEqual,
    IsIdentical,
    IsNotIdentical,
    IsSmallerOrEqual,
    IsGreaterOrEqual,
    Spaceship,
    Lt,
    Gt,

    // Logical
    BooleanAnd,
    BooleanOr,
    Coalesce,
    Bang,

    // Arithmetic and bitwise
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Pow,
    Dot,
    Amp,
    Pipe,
    Caret,
    Tilde,
    ShiftLeft,
    ShiftRight,
    Increment,
    Decrement,

    // Member access
    ObjectOperator,
    NullsafeObjectOperator,
    DoubleColon,
    DoubleArrow,
    NsSeparator,

    // Punctuation
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Semicolon,
    Comma,
    Colon,
    Question,
    At,
    Dollar,
    Ellipsis,

    /// Any span the scanner has no better classification for.
    Other,
}

impl TokenKind {
    /// Whitespace and comments: tokens with no syntactic weight.
    pub fn is_trivia(self) -> bool {
        matches!(
            self,
            TokenKind::Whitespace
                | TokenKind::LineComment
                | TokenKind::BlockComment
                | TokenKind::DocComment
        )
    }

    pub fn is_comment(self) -> bool {
        matches!(
            self,
            TokenKind::LineComment | TokenKind::BlockComment | TokenKind::DocComment
        )
    }

    /// Markers that open a literal whose interior must be copied verbatim.
    pub fn is_literal_start(self) -> bool {
        matches!(
            self,
            TokenKind::DoubleQuote
                | TokenKind::SingleQuote
                | TokenKind::Backtick
                | TokenKind::HeredocStart
        )
    }
}

/// A token produced by the PHP scanner. `text` borrows from the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub span: Span,
}

impl<'src> Token<'src> {
    pub fn new(kind: TokenKind, text: &'src str, span: Span) -> Self {
        Self { kind, text, span }
    }

    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}

/// PHP reserved words. Matching is ASCII case-insensitive, as in PHP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Abstract,
    And,
    Array,
    As,
    Break,
    Callable,
    Case,
    Catch,
    Class,
    Clone,
    Const,
    Continue,
    Declare,
    Default,
    Do,
    Echo,
    Else,
    ElseIf,
    Empty,
    EndDeclare,
    EndFor,
    EndForeach,
    EndIf,
    EndSwitch,
    EndWhile,
    Eval,
    Exit,
    Extends,
    Final,
    Finally,
    Fn,
    For,
    Foreach,
    Function,
    Global,
    Goto,
    HaltCompiler,
    If,
    Implements,
    Include,
    IncludeOnce,
    Instanceof,
    Insteadof,
    Interface,
    Isset,
    List,
    Match,
    Namespace,
    New,
    Or,
    Print,
    Private,
    Protected,
    Public,
    Readonly,
    Require,
    RequireOnce,
    Return,
    Static,
    Switch,
    Throw,
    Trait,
    Try,
    Unset,
    Use,
    Var,
    While,
    Xor,
    Yield,
}

/// Spelling of every keyword, used for lookup in both directions.
pub const KEYWORDS: &[(&str, Keyword)] = &[
    ("abstract", Keyword::Abstract),
    ("and", Keyword::And),
    ("array", Keyword::Array),
    ("as", Keyword::As),
    ("break", Keyword::Break),
    ("callable", Keyword::Callable),
    ("case", Keyword::Case),
    ("catch", Keyword::Catch),
    ("class", Keyword::Class),
    ("clone", Keyword::Clone),
    ("const", Keyword::Const),
    ("continue", Keyword::Continue),
    ("declare", Keyword::Declare),
    ("default", Keyword::Default),
    ("die", Keyword::Exit),
    ("do", Keyword::Do),
    ("echo", Keyword::Echo),
    ("else", Keyword::Else),
    ("elseif", Keyword::ElseIf),
    ("empty", Keyword::Empty),
    ("enddeclare", Keyword::EndDeclare),
    ("endfor", Keyword::EndFor),
    ("endforeach", Keyword::EndForeach),
    ("endif", Keyword::EndIf),
    ("endswitch", Keyword::EndSwitch),
    ("endwhile", Keyword::EndWhile),
    ("eval", Keyword::Eval),
    ("exit", Keyword::Exit),
    ("extends", Keyword::Extends),
    ("final", Keyword::Final),
    ("finally", Keyword::Finally),
    ("fn", Keyword::Fn),
    ("for", Keyword::For),
    ("foreach", Keyword::Foreach),
    ("function", Keyword::Function),
    ("global", Keyword::Global),
    ("goto", Keyword::Goto),
    ("__halt_compiler", Keyword::HaltCompiler),
    ("if", Keyword::If),
    ("implements", Keyword::Implements),
    ("include", Keyword::Include),
    ("include_once", Keyword::IncludeOnce),
    ("instanceof", Keyword::Instanceof),
    ("insteadof", Keyword::Insteadof),
    ("interface", Keyword::Interface),
    ("isset", Keyword::Isset),
    ("list", Keyword::List),
    ("match", Keyword::Match),
    ("namespace", Keyword::Namespace),
    ("new", Keyword::New),
    ("or", Keyword::Or),
    ("print", Keyword::Print),
    ("private", Keyword::Private),
    ("protected", Keyword::Protected),
    ("public", Keyword::Public),
    ("readonly", Keyword::Readonly),
    ("require", Keyword::Require),
    ("require_once", Keyword::RequireOnce),
    ("return", Keyword::Return),
    ("static", Keyword::Static),
    ("switch", Keyword::Switch),
    ("throw", Keyword::Throw),
    ("trait", Keyword::Trait),
    ("try", Keyword::Try),
    ("unset", Keyword::Unset),
    ("use", Keyword::Use),
    ("var", Keyword::Var),
    ("while", Keyword::While),
    ("xor", Keyword::Xor),
    ("yield", Keyword::Yield),
];

impl Keyword {
    /// Look up a word in the keyword table, ignoring ASCII case.
    pub fn from_word(word: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(spelling, _)| spelling.eq_ignore_ascii_case(word))
            .map(|&(_, keyword)| keyword)
    }

    /// Canonical lowercase spelling.
    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|&&(_, keyword)| keyword == self)
            .map(|&(spelling, _)| spelling)
            .unwrap_or("")
    }
}

/// Type names accepted inside a cast such as `(int)`.
pub const CAST_TYPES: &[&str] = &[
    "int", "integer", "bool", "boolean", "float", "double", "real", "string", "binary",
    "array", "object", "unset",
];

/// Check if a word names a cast type.
pub fn is_cast_type(word: &str) -> bool {
    CAST_TYPES.iter().any(|t| t.eq_ignore_ascii_case(word))
}
