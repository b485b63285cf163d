//! `//go:build` evaluation for the Go extractor.

use std::collections::HashSet;

use tracing::debug;

/// Build configuration forwarded to the Go extractor.
///
/// The search pipeline never looks inside this; it only travels with the
/// extractor.
#[derive(Debug, Clone, Default)]
pub struct BuildContext {
    tags: HashSet<String>,
    respect_constraints: bool,
}

impl BuildContext {
    pub fn new<I, S>(tags: I, respect_constraints: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tags: tags.into_iter().map(Into::into).collect(),
            respect_constraints,
        }
    }

    /// Whether a file with this source should be parsed.
    ///
    /// Always true unless constraint checking is on and the file carries a
    /// `//go:build` line that evaluates to false.
    pub fn allows(&self, source: &[u8]) -> bool {
        if !self.respect_constraints {
            return true;
        }

        let source = String::from_utf8_lossy(source);
        match build_line(&source) {
            Some(expr) => match Expr::parse(expr) {
                Some(parsed) => parsed.eval(&|tag| self.tag_enabled(tag)),
                None => {
                    debug!("Ignoring malformed build constraint: {}", expr);
                    true
                }
            },
            None => true,
        }
    }

    fn tag_enabled(&self, tag: &str) -> bool {
        if self.tags.contains(tag) {
            return true;
        }

        let goos = host_goos();
        tag == goos
            || tag == host_goarch()
            || tag == "gc"
            || (tag == "unix" && is_unix(goos))
            || is_release_tag(tag)
    }
}

/// Find the `//go:build` expression in the file header, if any.
///
/// Only comment and blank lines before the package clause are inspected.
/// `/* ... */` comments in the header are skipped.
fn build_line(source: &str) -> Option<&str> {
    let mut in_block = false;
    for line in source.lines() {
        let mut line = line.trim();
        if in_block {
            match line.find("*/") {
                Some(end) => {
                    in_block = false;
                    line = line[end + 2..].trim();
                }
                None => continue,
            }
        }
        while let Some(rest) = line.strip_prefix("/*") {
            match rest.find("*/") {
                Some(end) => line = rest[end + 2..].trim(),
                None => {
                    in_block = true;
                    line = "";
                }
            }
        }
        if line.is_empty() {
            continue;
        }
        if let Some(expr) = line.strip_prefix("//go:build") {
            if expr.is_empty() || expr.starts_with(char::is_whitespace) {
                return Some(expr.trim());
            }
        }
        if !line.starts_with("//") {
            return None;
        }
    }
    None
}

fn host_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_goarch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        other => other,
    }
}

fn is_unix(goos: &str) -> bool {
    matches!(
        goos,
        "aix"
            | "android"
            | "darwin"
            | "dragonfly"
            | "freebsd"
            | "hurd"
            | "illumos"
            | "ios"
            | "linux"
            | "netbsd"
            | "openbsd"
            | "solaris"
    )
}

fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .map(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(false)
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Tag(&'a str),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(input: &str) -> Option<Vec<Token<'_>>> {
    let bytes = input.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b' ' | b'\t' => i += 1,
            b'!' => {
                tokens.push(Token::Not);
                i += 1;
            }
            b'(' => {
                tokens.push(Token::Open);
                i += 1;
            }
            b')' => {
                tokens.push(Token::Close);
                i += 1;
            }
            b'&' if bytes.get(i + 1) == Some(&b'&') => {
                tokens.push(Token::And);
                i += 2;
            }
            b'|' if bytes.get(i + 1) == Some(&b'|') => {
                tokens.push(Token::Or);
                i += 2;
            }
            b if b.is_ascii_alphanumeric() || b == b'_' || b == b'.' => {
                let start = i;
                while i < bytes.len()
                    && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.')
                {
                    i += 1;
                }
                tokens.push(Token::Tag(&input[start..i]));
            }
            _ => return None,
        }
    }

    Some(tokens)
}

#[derive(Debug, PartialEq)]
enum Expr {
    Tag(String),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    fn parse(input: &str) -> Option<Expr> {
        let tokens = tokenize(input)?;
        let mut parser = ExprParser { tokens, pos: 0 };
        let expr = parser.or()?;
        if parser.pos == parser.tokens.len() {
            Some(expr)
        } else {
            None
        }
    }

    fn eval(&self, enabled: &dyn Fn(&str) -> bool) -> bool {
        match self {
            Expr::Tag(tag) => enabled(tag),
            Expr::Not(inner) => !inner.eval(enabled),
            Expr::And(lhs, rhs) => lhs.eval(enabled) && rhs.eval(enabled),
            Expr::Or(lhs, rhs) => lhs.eval(enabled) || rhs.eval(enabled),
        }
    }
}

struct ExprParser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
}

impl ExprParser<'_> {
    fn peek(&self) -> Option<&Token<'_>> {
        self.tokens.get(self.pos)
    }

    fn or(&mut self) -> Option<Expr> {
        let mut lhs = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            let rhs = self.and()?;
            lhs = Expr::Or(Box::new(lhs), Box::new(rhs));
        }
        Some(lhs)
    }

    fn and(&mut self) -> Option<Expr> {
        let mut lhs = self.not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            let rhs = self.not()?;
            lhs = Expr::And(Box::new(lhs), Box::new(rhs));
        }
        Some(lhs)
    }

    fn not(&mut self) -> Option<Expr> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Some(Expr::Not(Box::new(self.not()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Option<Expr> {
        match self.tokens.get(self.pos)?.clone() {
            Token::Tag(tag) => {
                self.pos += 1;
                Some(Expr::Tag(tag.to_string()))
            }
            Token::Open => {
                self.pos += 1;
                let inner = self.or()?;
                if self.peek() != Some(&Token::Close) {
                    return None;
                }
                self.pos += 1;
                Some(inner)
            }
            _ => None,
        }
    }
}
