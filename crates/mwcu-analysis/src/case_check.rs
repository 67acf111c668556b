//! Class-name capitalization cross-checker.
//!
//! PHP resolves class names case-insensitively, so `new foobar()` works
//! against `class FooBar`, until an autoloader on a case-sensitive file
//! system is asked for `foobar.php`. The checker runs in two passes: a
//! [`ClassMap`] of every declared class, interface, trait and enum is built
//! from one tree, then every use site found in a second tree is resolved
//! against its namespace and imports and compared with the declared casing.
//!
//! Names are handled fully qualified without the leading separator, so the
//! global class `\Foo` is `Foo` and `\A\B\Foo` is `A\B\Foo`.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use mwcu_lexer::{Keyword, Scanner, Token, TokenKind};

use crate::cursor::TokenCursor;
use crate::walk::{has_extension, source_files};
use crate::{read_source, AnalysisError};

/// Extensions of the files scanned in both passes.
pub const EXTENSIONS: &[&str] = &["php", "inc"];

/// Declared class names, keyed by their lowercase form. The last
/// declaration of a name wins.
#[derive(Debug, Default, Clone)]
pub struct ClassMap {
    names: HashMap<String, String>,
}

impl ClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the map from every `.php` and `.inc` file under `root`.
    /// Unreadable files are logged and skipped.
    pub fn build(root: &Path) -> Result<Self, AnalysisError> {
        let mut map = Self::new();
        for path in source_files(root, false, |p| has_extension(p, EXTENSIONS))? {
            match read_source(&path) {
                Ok(source) => map.add_source(&source),
                Err(err) => tracing::warn!("{err}"),
            }
        }
        tracing::debug!(classes = map.len(), "built class map");
        Ok(map)
    }

    pub fn insert(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.names.insert(name.to_ascii_lowercase(), name);
    }

    /// Record every class declared in a PHP file.
    pub fn add_source(&mut self, source: &str) {
        for name in declared_classes(source) {
            self.insert(name);
        }
    }

    /// Declared casing of a fully qualified name, looked up ignoring case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.names
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn verdict(&self, site: &UseSite) -> Verdict<'_> {
        let Some(found) = site.name() else {
            return Verdict::Unresolved;
        };
        match self.get(found) {
            None => Verdict::Unknown,
            Some(expected) if expected == found => Verdict::Matches,
            Some(expected) => Verdict::Mismatch { expected },
        }
    }

    /// Mismatched use sites in one file.
    pub fn check_source(&self, path: &Path, source: &str) -> Vec<Mismatch> {
        used_classes(source)
            .iter()
            .filter_map(|site| match (self.verdict(site), site.name()) {
                (Verdict::Mismatch { expected }, Some(found)) => Some(Mismatch {
                    path: path.to_path_buf(),
                    line: site.line,
                    expected: expected.to_string(),
                    found: found.to_string(),
                }),
                _ => None,
            })
            .collect()
    }

    /// Mismatched use sites in every `.php` and `.inc` file under `root`,
    /// with paths relative to `root`. Unreadable files are logged and
    /// skipped.
    pub fn check_tree(&self, root: &Path) -> Result<Vec<Mismatch>, AnalysisError> {
        let mut mismatches = Vec::new();
        for path in source_files(root, false, |p| has_extension(p, EXTENSIONS))? {
            let source = match read_source(&path) {
                Ok(source) => source,
                Err(err) => {
                    tracing::warn!("{err}");
                    continue;
                }
            };
            let shown = match path.strip_prefix(root) {
                Ok(rel) if !rel.as_os_str().is_empty() => rel,
                _ => path.as_path(),
            };
            mismatches.extend(self.check_source(shown, &source));
        }
        Ok(mismatches)
    }
}

/// Outcome of resolving the class name at a use site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    /// The site names no class that can be resolved statically, such as
    /// `new $class`, `new static` or an anonymous class. Skipped silently.
    Unresolved,
}

/// A place where a class is referenced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseSite {
    pub line: usize,
    pub resolution: Resolution,
}

impl UseSite {
    pub fn name(&self) -> Option<&str> {
        match &self.resolution {
            Resolution::Resolved(name) => Some(name),
            Resolution::Unresolved => None,
        }
    }
}

/// A use site checked against the class map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict<'m> {
    Matches,
    Mismatch { expected: &'m str },
    /// Resolved, but not declared in the scanned tree.
    Unknown,
    Unresolved,
}

/// A use site whose casing differs from the declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub path: PathBuf,
    pub line: usize,
    pub expected: String,
    pub found: String,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: expected {}, found {}",
            self.path.display(),
            self.line,
            self.expected,
            self.found
        )
    }
}

/// Fully qualified names of the classes, interfaces, traits and enums
/// declared in a PHP file.
pub fn declared_classes(source: &str) -> Vec<String> {
    let tokens = Scanner::tokenize(source);
    let mut names = NameScanner::new(&tokens);
    let mut classes = Vec::new();

    while let Some(token) = names.cursor.advance() {
        match token.kind {
            TokenKind::Keyword(Keyword::Namespace) if !names.at_relative_name() => {
                names.namespace_declaration();
            }
            TokenKind::Keyword(Keyword::Class | Keyword::Interface | Keyword::Trait) => {
                if let Some(name) = names.cursor.accept_kind(TokenKind::Identifier) {
                    classes.push(names.qualify(name.text));
                }
            }
            TokenKind::Identifier if token.text.eq_ignore_ascii_case("enum") => {
                if let Some(name) = names.cursor.accept_kind(TokenKind::Identifier) {
                    classes.push(names.qualify(name.text));
                }
            }
            _ => {}
        }
    }
    classes
}

/// Every class reference in a PHP file: `new`, `extends` and `implements`
/// operands, and names followed by `::` or a variable (static access, type
/// declarations, `catch` clauses).
pub fn used_classes(source: &str) -> Vec<UseSite> {
    let tokens = Scanner::tokenize(source);
    let mut names = NameScanner::new(&tokens);
    let mut sites = Vec::new();

    while let Some(token) = names.cursor.advance() {
        match token.kind {
            TokenKind::LBrace => names.depth += 1,
            TokenKind::RBrace => names.depth = names.depth.saturating_sub(1),
            TokenKind::Keyword(Keyword::Namespace) if !names.at_relative_name() => {
                names.namespace_declaration();
            }
            TokenKind::Keyword(Keyword::Use) if names.at_top_level() => names.use_import(),
            TokenKind::Keyword(Keyword::New) => {
                sites.push(names.use_site(token.span.line));
            }
            TokenKind::Keyword(Keyword::Extends | Keyword::Implements) => loop {
                sites.push(names.use_site(token.span.line));
                if names.cursor.accept_kind(TokenKind::Comma).is_none() {
                    break;
                }
            },
            TokenKind::Identifier | TokenKind::NsSeparator | TokenKind::Keyword(Keyword::Namespace) => {
                let after = names.cursor.mark();
                names.cursor.rewind(after - 1);
                let site = names.class_name().filter(|_| {
                    names
                        .cursor
                        .accept(|t| matches!(t.kind, TokenKind::DoubleColon | TokenKind::Variable))
                        .is_some()
                });
                match site {
                    Some(name) => sites.push(UseSite {
                        line: token.span.line,
                        resolution: Resolution::Resolved(name),
                    }),
                    None => names.cursor.rewind(after),
                }
            }
            _ => {}
        }
    }
    sites
}

fn is_word(token: &Token<'_>) -> bool {
    matches!(token.kind, TokenKind::Identifier | TokenKind::Keyword(_))
}

/// Cursor plus the namespace and import state that name resolution needs.
struct NameScanner<'src> {
    cursor: TokenCursor<'src>,
    namespace: String,
    aliases: HashMap<String, String>,
    depth: usize,
    braced_namespace: bool,
}

impl<'src> NameScanner<'src> {
    fn new(tokens: &[Token<'src>]) -> Self {
        Self {
            cursor: TokenCursor::new(tokens),
            namespace: String::new(),
            aliases: HashMap::new(),
            depth: 0,
            braced_namespace: false,
        }
    }

    fn qualify(&self, name: &str) -> String {
        if self.namespace.is_empty() {
            name.to_string()
        } else {
            format!("{}\\{name}", self.namespace)
        }
    }

    /// Imports only happen outside class and function bodies; a `use`
    /// inside a class body pulls in a trait.
    fn at_top_level(&self) -> bool {
        self.depth == usize::from(self.braced_namespace)
    }

    /// After `namespace`, whether it starts a relative name `namespace\A`
    /// rather than a declaration.
    fn at_relative_name(&self) -> bool {
        self.cursor
            .peek()
            .is_some_and(|t| t.kind == TokenKind::NsSeparator)
    }

    /// Parse the rest of `namespace A\B;`, `namespace A\B {` or
    /// `namespace {`. Imports do not carry over into a new namespace.
    fn namespace_declaration(&mut self) {
        let mut parts = Vec::new();
        while let Some(segment) = self.cursor.accept(is_word) {
            parts.push(segment.text);
            if self.cursor.accept_kind(TokenKind::NsSeparator).is_none() {
                break;
            }
        }
        self.namespace = parts.join("\\");
        self.aliases.clear();
        self.braced_namespace = self.cursor.accept_kind(TokenKind::LBrace).is_some();
        if self.braced_namespace {
            self.depth += 1;
        }
    }

    /// Parse the rest of `use A\B;`, `use A\B as C;`, `use A, B\C;` or the
    /// group form `use A\{B, C\D as E};`.
    fn use_import(&mut self) {
        if self.import_kind_keyword() {
            return;
        }
        loop {
            self.cursor.accept_kind(TokenKind::NsSeparator);
            let (parts, open_prefix) = self.name_parts();
            if open_prefix && self.cursor.accept_kind(TokenKind::LBrace).is_some() {
                self.group_import(&parts);
                return;
            }
            if !self.import_clause(parts) {
                return;
            }
            if self.cursor.accept_kind(TokenKind::Comma).is_none() {
                return;
            }
        }
    }

    /// Members of a group import, up to and including the closing brace.
    fn group_import(&mut self, prefix: &[&'src str]) {
        loop {
            if self.cursor.accept_kind(TokenKind::RBrace).is_some() {
                return;
            }
            let skip = self.import_kind_keyword();
            let (parts, _) = self.name_parts();
            let mut full = prefix.to_vec();
            full.extend(parts);
            let ok = if skip {
                self.import_alias(&full).is_some()
            } else {
                self.import_clause(full)
            };
            if !ok {
                self.skip_past_group();
                return;
            }
            if self.cursor.accept_kind(TokenKind::Comma).is_none() {
                if self.cursor.accept_kind(TokenKind::RBrace).is_none() {
                    self.skip_past_group();
                }
                return;
            }
        }
    }

    /// `function` and `const` imports name no classes.
    fn import_kind_keyword(&mut self) -> bool {
        self.cursor.accept_keyword(Keyword::Function).is_some()
            || self.cursor.accept_keyword(Keyword::Const).is_some()
    }

    /// Name segments at the cursor, and whether a trailing `\` was consumed.
    fn name_parts(&mut self) -> (Vec<&'src str>, bool) {
        let mut parts = Vec::new();
        let mut open_prefix = false;
        while let Some(segment) = self.cursor.accept(is_word) {
            parts.push(segment.text);
            open_prefix = self.cursor.accept_kind(TokenKind::NsSeparator).is_some();
            if !open_prefix {
                break;
            }
        }
        (parts, open_prefix)
    }

    /// The alias an imported name is known by: the `as` name, or the last
    /// segment.
    fn import_alias(&mut self, parts: &[&'src str]) -> Option<&'src str> {
        let &last = parts.last()?;
        if self.cursor.accept_keyword(Keyword::As).is_some() {
            return self
                .cursor
                .accept_kind(TokenKind::Identifier)
                .map(|alias| alias.text);
        }
        Some(last)
    }

    /// Record one imported class name and its alias.
    fn import_clause(&mut self, parts: Vec<&'src str>) -> bool {
        match self.import_alias(&parts) {
            Some(alias) => {
                self.aliases
                    .insert(alias.to_ascii_lowercase(), parts.join("\\"));
                true
            }
            None => false,
        }
    }

    /// Recover from a malformed group: skip to its `}` or the end of the
    /// statement.
    fn skip_past_group(&mut self) {
        while let Some(token) = self.cursor.advance() {
            if matches!(token.kind, TokenKind::RBrace | TokenKind::Semicolon) {
                return;
            }
        }
    }

    /// Resolve the class operand of `new`, `extends` or `implements`.
    fn use_site(&mut self, keyword_line: usize) -> UseSite {
        let line = self.cursor.peek().map_or(keyword_line, |t| t.span.line);
        let resolution = match self.class_name() {
            Some(name) => Resolution::Resolved(name),
            None => Resolution::Unresolved,
        };
        UseSite { line, resolution }
    }

    /// Parse and resolve a class name at the cursor: rooted `\A\B`,
    /// relative `namespace\A`, or unqualified and qualified names, whose
    /// first segment may be an import alias.
    fn class_name(&mut self) -> Option<String> {
        let first = self.cursor.accept(|t| {
            matches!(
                t.kind,
                TokenKind::Identifier
                    | TokenKind::NsSeparator
                    | TokenKind::Keyword(Keyword::Namespace)
            )
        })?;
        let mut full = match first.kind {
            TokenKind::NsSeparator => self.cursor.accept(is_word)?.text.to_string(),
            TokenKind::Keyword(_) => {
                self.cursor.accept_kind(TokenKind::NsSeparator)?;
                let segment = self.cursor.accept(is_word)?;
                self.qualify(segment.text)
            }
            _ => {
                let name = first.text;
                if name.eq_ignore_ascii_case("parent") || name.eq_ignore_ascii_case("self") {
                    return None;
                }
                match self.aliases.get(&name.to_ascii_lowercase()) {
                    Some(full) => full.clone(),
                    None => self.qualify(name),
                }
            }
        };
        while self.cursor.accept_kind(TokenKind::NsSeparator).is_some() {
            let segment = self.cursor.accept(is_word)?;
            full.push('\\');
            full.push_str(segment.text);
        }
        Some(full)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn resolved(source: &str) -> Vec<(usize, String)> {
        used_classes(source)
            .into_iter()
            .filter_map(|site| site.name().map(|n| (site.line, n.to_string())))
            .collect()
    }

    fn names(source: &str) -> Vec<String> {
        resolved(source).into_iter().map(|(_, n)| n).collect()
    }

    // =========================================================================
    // Declarations
    // =========================================================================

    #[test]
    fn test_global_declarations() {
        assert_eq!(
            declared_classes("<?php\nclass Foo {}\ninterface IBar {}\ntrait T {}\nenum Suit: string {}\n"),
            vec!["Foo", "IBar", "T", "Suit"]
        );
    }

    #[test]
    fn test_namespaced_declarations() {
        assert_eq!(
            declared_classes("<?php\nnamespace MediaWiki\\Page;\nclass PageStore {}\n"),
            vec!["MediaWiki\\Page\\PageStore"]
        );
    }

    #[test]
    fn test_braced_namespaces() {
        let source = "<?php\nnamespace A { class X {} }\nnamespace { class Y {} }\n";
        assert_eq!(declared_classes(source), vec!["A\\X", "Y"]);
    }

    #[test]
    fn test_not_declarations() {
        let source = "<?php\n$o = new class {};\n$n = Foo::class;\n$x->class;\n";
        assert!(declared_classes(source).is_empty());
    }

    #[test]
    fn test_last_declaration_wins() {
        let mut map = ClassMap::new();
        map.add_source("<?php class FOO {}");
        map.add_source("<?php class Foo {}");
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("foo"), Some("Foo"));
    }

    // =========================================================================
    // Use sites
    // =========================================================================

    #[test]
    fn test_use_site_kinds() {
        let source = "<?php\nclass A extends B implements C, D {\n\tfunction f( E $e ) {\n\t\tF::g();\n\t\treturn new G();\n\t}\n}\n";
        assert_eq!(names(source), vec!["B", "C", "D", "E", "F", "G"]);
    }

    #[test]
    fn test_use_site_lines() {
        let source = "<?php\n\nnew Foo;\n\n\nBar::baz();\n";
        assert_eq!(
            resolved(source),
            vec![(3, "Foo".to_string()), (6, "Bar".to_string())]
        );
    }

    #[test]
    fn test_plain_calls_are_not_uses() {
        assert!(used_classes("<?php\nfoo();\n$a->b();\nconst X = 1;\n").is_empty());
    }

    #[test]
    fn test_parent_and_self_skipped() {
        assert!(names("<?php\nparent::__construct();\nself::$x;\nSELF::y();\n").is_empty());
    }

    #[test]
    fn test_dynamic_new_unresolved() {
        let sites = used_classes("<?php\nnew $class;\nnew static;\nnew class {};\n");
        assert_eq!(sites.len(), 3);
        assert!(sites.iter().all(|s| s.resolution == Resolution::Unresolved));
    }

    #[test]
    fn test_namespace_resolution() {
        let source = "<?php\nnamespace App;\nnew Foo;\nnew \\Bar;\nnew Sub\\Baz;\nnew namespace\\Qux;\n";
        assert_eq!(
            names(source),
            vec!["App\\Foo", "Bar", "App\\Sub\\Baz", "App\\Qux"]
        );
    }

    #[test]
    fn test_import_aliases() {
        let source = "<?php\nnamespace App;\nuse Lib\\Http\\Client;\nuse Lib\\Log as Logger, Other\\Thing;\nnew client;\nnew Logger\\Sink;\nThing::make();\n";
        assert_eq!(
            names(source),
            vec!["Lib\\Http\\Client", "Lib\\Log\\Sink", "Other\\Thing"]
        );
    }

    #[test]
    fn test_group_imports() {
        let source = "<?php\nnamespace App;\nuse Lib\\{Foo, Sub\\Bar as Baz, function helper,};\nLib::x();\nnew foo;\nnew Baz;\nnew Helper;\n";
        assert_eq!(
            names(source),
            vec!["App\\Lib", "Lib\\Foo", "Lib\\Sub\\Bar", "App\\Helper"]
        );
    }

    #[test]
    fn test_group_import_keeps_brace_depth() {
        let source = "<?php\nnamespace App;\nuse Lib\\{Foo};\nclass X {\n\tuse T;\n}\nT::f();\n";
        assert_eq!(names(source), vec!["App\\T"]);
    }

    #[test]
    fn test_function_imports_ignored() {
        let source = "<?php\nuse function Lib\\helper;\nnew Helper;\n";
        assert_eq!(names(source), vec!["Helper"]);
    }

    #[test]
    fn test_trait_use_is_not_import() {
        let source = "<?php\nnamespace App;\nclass X {\n\tuse Lib\\T;\n}\nT::f();\n";
        assert_eq!(names(source), vec!["App\\T"]);
    }

    #[test]
    fn test_new_namespace_drops_imports() {
        let source = "<?php\nnamespace A;\nuse Lib\\Foo;\nnamespace B;\nnew Foo;\n";
        assert_eq!(names(source), vec!["B\\Foo"]);
    }

    // =========================================================================
    // Verdicts
    // =========================================================================

    #[test]
    fn test_verdicts() {
        let mut map = ClassMap::new();
        map.insert("FooBar");
        let site = |resolution| UseSite { line: 1, resolution };

        assert_eq!(
            map.verdict(&site(Resolution::Resolved("FooBar".into()))),
            Verdict::Matches
        );
        assert_eq!(
            map.verdict(&site(Resolution::Resolved("foobar".into()))),
            Verdict::Mismatch { expected: "FooBar" }
        );
        assert_eq!(
            map.verdict(&site(Resolution::Resolved("Other".into()))),
            Verdict::Unknown
        );
        assert_eq!(map.verdict(&site(Resolution::Unresolved)), Verdict::Unresolved);
    }

    #[test]
    fn test_mismatch_display() {
        let mismatch = Mismatch {
            path: PathBuf::from("usage.php"),
            line: 10,
            expected: "FooBar".into(),
            found: "foobar".into(),
        };
        assert_eq!(mismatch.to_string(), "usage.php:10: expected FooBar, found foobar");
    }

    // =========================================================================
    // Trees
    // =========================================================================

    #[test]
    fn test_cross_check_trees() {
        let dir = tempfile::tempdir().unwrap();
        let decl = dir.path().join("decl");
        let usage = dir.path().join("usage");
        fs::create_dir_all(&decl).unwrap();
        fs::create_dir_all(&usage).unwrap();
        fs::write(decl.join("FooBar.php"), "<?php\nclass FooBar {}\n").unwrap();
        fs::write(decl.join("notes.txt"), "<?php\nclass Ignored {}\n").unwrap();

        let bad = format!("<?php\n{}new foobar();\n", "\n".repeat(8));
        fs::write(usage.join("usage.php"), bad).unwrap();
        fs::write(usage.join("good.inc"), "<?php\nnew FooBar();\n").unwrap();

        let map = ClassMap::build(&decl).unwrap();
        assert_eq!(map.len(), 1);

        let report: Vec<String> = map
            .check_tree(&usage)
            .unwrap()
            .iter()
            .map(|m| m.to_string())
            .collect();
        assert_eq!(report, vec!["usage.php:10: expected FooBar, found foobar"]);
    }

    #[test]
    fn test_correct_casing_not_reported() {
        let mut map = ClassMap::new();
        map.add_source("<?php class FooBar {}");
        assert!(map
            .check_source(Path::new("u.php"), "<?php new FooBar();")
            .is_empty());
    }
}
