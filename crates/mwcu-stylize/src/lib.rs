//! PHP Stylizer
//!
//! Reformats PHP source to MediaWiki's spacey house style by walking the
//! token stream once and deciding, for every token, whether a single space
//! belongs before and after it. Tokens are never rewritten apart from line
//! comments, and string, heredoc and nowdoc literals are copied verbatim.
//!
//! ```text
//! source → Scanner → [Token] → Stylizer → Output → String
//! ```
//!
//! ```
//! assert_eq!(mwcu_stylize::stylize_code("if($a==1){$b=2;}"), "if ( $a == 1 ) { $b = 2; }");
//! ```

pub mod output;
pub mod rules;

use std::borrow::Cow;

use mwcu_lexer::{Scanner, SourceMode, Token, TokenKind};

use crate::output::Output;
use crate::rules::{close_pair, is_close_pair, is_space, spacing};

/// Stylize the contents of a PHP file. Text outside `<?php` tags only has
/// its line ends trimmed.
pub fn stylize(source: &str) -> String {
    stylize_with_mode(source, SourceMode::Markup)
}

/// Stylize a fragment of PHP code that has no open tag.
pub fn stylize_code(source: &str) -> String {
    stylize_with_mode(source, SourceMode::Code)
}

pub fn stylize_with_mode(source: &str, mode: SourceMode) -> String {
    let source = normalize_newlines(source);
    let tokens = Scanner::with_mode(&source, mode).scan();
    tracing::trace!(tokens = tokens.len(), "stylizing token stream");
    stylize_tokens(&tokens)
}

/// Reformat an already scanned token sequence.
pub fn stylize_tokens(tokens: &[Token<'_>]) -> String {
    Stylizer::new(tokens).run()
}

/// Single-pass spacing engine over a token sequence.
///
/// The cursor sees one token of lookbehind and one of lookahead; `None`
/// stands for the virtual start and end of the sequence.
pub struct Stylizer<'t, 'src> {
    tokens: &'t [Token<'src>],
    pos: usize,
    out: Output,
}

impl<'t, 'src> Stylizer<'t, 'src> {
    pub fn new(tokens: &'t [Token<'src>]) -> Self {
        let capacity = tokens.iter().map(|t| t.text.len()).sum::<usize>() * 9 / 8;
        Self {
            tokens,
            pos: 0,
            out: Output::with_capacity(capacity),
        }
    }

    pub fn run(mut self) -> String {
        while self.pos < self.tokens.len() {
            self.step();
        }
        self.out.into_string()
    }

    fn step(&mut self) {
        let cur = &self.tokens[self.pos];

        // Don't format strings
        if cur.kind.is_literal_start() {
            let end = self.literal_end();
            for token in &self.tokens[self.pos..=end] {
                self.out.push_verbatim(token.text);
            }
            self.pos = end + 1;
            return;
        }

        let prev = self.pos.checked_sub(1).map(|i| &self.tokens[i]);
        let next = self.tokens.get(self.pos + 1);

        // `( )` collapses to `()`
        if cur.kind == TokenKind::Whitespace && !cur.text.contains('\n') {
            if let (Some(prev), Some(next)) = (prev, next) {
                if is_close_pair(prev, next) {
                    self.pos += 1;
                    return;
                }
            }
        }

        let close_pair_before = prev.is_some_and(|p| is_close_pair(p, cur));
        let close_pair_after = next.is_some_and(|n| close_pair(cur.kind) == Some(n.text));
        let wants = spacing(cur.kind);

        if wants.before() && !is_space(prev) && !close_pair_before {
            self.out.push_space();
        }

        if cur.kind == TokenKind::LineComment {
            self.out.push(&fix_comment(cur.text));
        } else {
            self.out.push(cur.text);
        }

        let next_wants_before = next.is_some_and(|n| spacing(n.kind).before());
        if wants.after() && !close_pair_after && !is_space(next) && !next_wants_before {
            self.out.push_space();
        }

        self.pos += 1;
    }

    /// Index of the token closing the literal opened at the cursor, or the
    /// last token when the literal is unterminated.
    fn literal_end(&self) -> usize {
        let closing = match self.tokens[self.pos].kind {
            TokenKind::HeredocStart => TokenKind::HeredocEnd,
            marker => marker,
        };
        self.tokens[self.pos + 1..]
            .iter()
            .position(|t| t.kind == closing)
            .map_or(self.tokens.len() - 1, |offset| self.pos + 1 + offset)
    }
}

/// Put a single space after the marker of a `#` or `//` comment that runs
/// straight into its text.
pub fn fix_comment(text: &str) -> Cow<'_, str> {
    let marker_len = if text.starts_with('#') {
        text.len() - text.trim_start_matches('#').len()
    } else if text.starts_with("//") {
        text.len() - text.trim_start_matches('/').len()
    } else {
        return Cow::Borrowed(text);
    };
    let (marker, rest) = text.split_at(marker_len);
    match rest.chars().next() {
        Some(c) if !c.is_whitespace() => Cow::Owned(format!("{marker} {rest}")),
        _ => Cow::Borrowed(text),
    }
}

/// Convert `\r\n` line breaks to `\n`. A lone `\r` is left alone, as it
/// may be part of a literal.
pub fn normalize_newlines(source: &str) -> Cow<'_, str> {
    if source.contains("\r\n") {
        Cow::Owned(source.replace("\r\n", "\n"))
    } else {
        Cow::Borrowed(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn check(input: &str, expected: &str) {
        assert_eq!(stylize_code(input), expected, "input: {input:?}");
    }

    // =========================================================================
    // Operators and keywords
    // =========================================================================

    #[test]
    fn test_assignment_and_comparison() {
        check("$a=$b==$c;", "$a = $b == $c;");
        check("$a.=$b;", "$a .= $b;");
        check("$x=$y??$z;", "$x = $y ?? $z;");
    }

    #[test]
    fn test_control_structures() {
        check("if($a){$b;}else{$c;}", "if ( $a ) { $b; } else { $c; }");
        check("foreach($a as $k=>$v){}", "foreach ( $a as $k => $v ) {}");
        check("while(true){$i++;}", "while ( true ) { $i++; }");
    }

    #[test]
    fn test_function_call_arguments() {
        check("foo($a,$b);", "foo( $a, $b );");
    }

    #[test]
    fn test_unary_minus_not_split() {
        check("$foo=-1;", "$foo = -1;");
        check("$a-$b;", "$a -$b;");
    }

    #[test]
    fn test_member_access_untouched() {
        check("$this->foo::bar();", "$this->foo::bar();");
        check("$a?->b;", "$a?->b;");
    }

    #[test]
    fn test_casts_are_single_tokens() {
        check("$a=(int)$b;", "$a = (int)$b;");
    }

    #[test]
    fn test_no_double_spacing() {
        check("$a = $b;", "$a = $b;");
        check("$a =$b;", "$a = $b;");
        check("$a= $b;", "$a = $b;");
    }

    // =========================================================================
    // Close pairs
    // =========================================================================

    #[test]
    fn test_empty_parens() {
        check("foo();", "foo();");
        check("foo( );", "foo();");
    }

    #[test]
    fn test_empty_braces() {
        check("function f(){}", "function f() {}");
    }

    #[test]
    fn test_short_ternary() {
        check("$a?:$b;", "$a ?: $b;");
        check("$a ?: $b;", "$a ?: $b;");
    }

    #[test]
    fn test_dynamic_property_brace() {
        check("$a->{'x'};", "$a->{ 'x' };");
    }

    #[test]
    fn test_reference_assignment() {
        check("$a=&$b;", "$a = &$b;");
        check("$a = &$b;", "$a = &$b;");
    }

    #[test]
    fn test_paren_at_line_end_keeps_newline() {
        check("foo(\n\t$a\n);", "foo(\n\t$a\n);");
    }

    // =========================================================================
    // Literals
    // =========================================================================

    #[test]
    fn test_strings_verbatim() {
        check("$a='x=y,z';", "$a = 'x=y,z';");
        check("$a=\"{$b['c']}=d\";", "$a = \"{$b['c']}=d\";");
    }

    #[test]
    fn test_heredoc_verbatim() {
        let input = "$a=<<<EOT\nx=y  \n  (z)\nEOT;\n";
        check(input, "$a = <<<EOT\nx=y  \n  (z)\nEOT;\n");
    }

    #[test]
    fn test_unterminated_string_consumed() {
        check("$a='x=y", "$a = 'x=y");
        check("$a=<<<EOT\nx=y", "$a = <<<EOT\nx=y");
    }

    // =========================================================================
    // Comments and whitespace
    // =========================================================================

    #[test]
    fn test_comment_gets_space() {
        check("#comment\n", "# comment\n");
        check("//text\n", "// text\n");
        check("// text\n", "// text\n");
        check("##x\n", "## x\n");
        check("#\n", "#\n");
    }

    #[test]
    fn test_block_comment_untouched() {
        check("/*x*/", "/*x*/");
    }

    #[test]
    fn test_comment_eats_space() {
        check("foo(// why\n$a);", "foo(// why\n$a );");
    }

    #[test]
    fn test_trailing_whitespace_stripped() {
        check("$a=1;   \n$b=2;\t\n", "$a = 1;\n$b = 2;\n");
        check("foo(\n", "foo(\n");
        check("$a=1; // x  \n", "$a = 1; // x\n");
    }

    #[test]
    fn test_crlf_normalized() {
        check("$a=1;\r\n$b=2;\r\n", "$a = 1;\n$b = 2;\n");
    }

    #[test]
    fn test_lone_cr_kept_in_literal() {
        let input = "<?php\n$s = 'a\rb';\n";
        assert_eq!(stylize(input), input);
        assert!(matches!(normalize_newlines("'a\rb'"), Cow::Borrowed(_)));
    }

    // =========================================================================
    // Files with markup
    // =========================================================================

    #[test]
    fn test_php_file() {
        let input = "<?php\nclass Foo{\n\tfunction bar($x){return $x+1;}\n}\n";
        let expected = "<?php\nclass Foo {\n\tfunction bar( $x ) { return $x + 1; }\n}\n";
        assert_eq!(stylize(input), expected);
    }

    #[test]
    fn test_inline_markup_only_trimmed() {
        let input = "var a=b.c;  \nif(a){x();}\n";
        assert_eq!(stylize(input), "var a=b.c;\nif(a){x();}\n");
    }

    #[test]
    fn test_template_with_echo_tag() {
        assert_eq!(stylize("<p><?=$a.$b?></p>"), "<p><?=$a . $b?></p>");
    }

    // =========================================================================
    // Properties
    // =========================================================================

    const SAMPLES: &[&str] = &[
        "<?php\n$a=&$b;\nif($x&&$y||!$z){foo(1,2);}else{bar();}\n",
        "<?php\n#note\n$s=\"a  b\".'c'.<<<X\n y \nX;\n$t=$a?:$b?$c:$d;\n",
        "<?php\nfunction f(array $a=[],...$rest):?int{return$a[0]-1;}\n",
        "<?php\nswitch($a){case 1:break;default:return;}\n",
        "<?php\n$o->{$p}=clone$q;\n/* keep   */\n",
        "<?php\n$a = 'unterminated\n",
    ];

    #[test]
    fn test_idempotent() {
        for sample in SAMPLES {
            let once = stylize(sample);
            assert_eq!(stylize(&once), once, "sample: {sample:?}");
        }
    }

    #[test]
    fn test_well_spaced_input_unchanged() {
        let input = "<?php\n\nclass Foo extends Bar {\n\tpublic function baz( $a, $b = null ) {\n\t\tif ( $a === $b ) {\n\t\t\treturn [];\n\t\t}\n\t\t// done\n\t\treturn $this->qux( $a ) . \"x  y\";\n\t}\n}\n";
        assert_eq!(stylize(input), input);
    }

    #[test]
    fn test_literal_text_preserved() {
        let literals = ["'a =  b ;'", "\"( x )  , {$y}\"", "<<<EOT\n  a=b  \n\tc\nEOT"];
        for literal in literals {
            let out = stylize_code(&format!("$v={literal};"));
            assert!(out.contains(literal), "{out:?} lost {literal:?}");
        }
    }

    #[test]
    fn test_fix_comment_borrows_when_unchanged() {
        assert!(matches!(fix_comment("// ok\n"), Cow::Borrowed(_)));
        assert!(matches!(fix_comment("/* x */"), Cow::Borrowed(_)));
        assert_eq!(fix_comment("//x\n"), "// x\n");
    }
}
