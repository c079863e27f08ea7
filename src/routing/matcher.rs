//! Ant-style path pattern matching.
//!
//! # Responsibilities
//! - Match lookup paths against declared patterns (`*`, `?`, `**`)
//! - Apply the implicit `.*` extension and tail-pattern rules
//! - Rank matched patterns by specificity
//!
//! # Design Decisions
//! - Patterns compile once into segment lists and are cached per matcher
//! - `**` is only special as a whole segment; elsewhere it is two `*`
//! - No regex: segment globs are matched with a two-pointer scan

use std::cmp::Ordering;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

const SEPARATOR: char = '/';

/// Errors raised when a declared pattern is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("path pattern must not be empty")]
    Empty,

    #[error("path pattern '{0}' uses '**' inside a segment; '**' must stand alone")]
    EmbeddedDoubleWildcard(String),

    #[error("path pattern '{0}' contains whitespace")]
    Whitespace(String),
}

/// Check a pattern before it is accepted into a catalog.
pub fn validate_pattern(pattern: &str) -> Result<(), PatternError> {
    if pattern.is_empty() {
        return Err(PatternError::Empty);
    }
    if pattern.chars().any(char::is_whitespace) {
        return Err(PatternError::Whitespace(pattern.to_string()));
    }
    let embedded = pattern
        .split(SEPARATOR)
        .any(|segment| segment != "**" && segment.contains("**"));
    if embedded {
        return Err(PatternError::EmbeddedDoubleWildcard(pattern.to_string()));
    }
    Ok(())
}

/// Returns true if the string contains wildcard characters.
pub fn is_pattern(value: &str) -> bool {
    value.contains('*') || value.contains('?')
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Glob(String),
    AnyDepth,
}

impl Segment {
    fn parse(token: &str) -> Self {
        if token == "**" {
            Segment::AnyDepth
        } else if is_pattern(token) {
            Segment::Glob(token.to_string())
        } else {
            Segment::Literal(token.to_string())
        }
    }

    fn matches(&self, token: &str) -> bool {
        match self {
            Segment::Literal(literal) => literal == token,
            Segment::Glob(glob) => glob_matches(glob, token),
            Segment::AnyDepth => true,
        }
    }
}

#[derive(Debug)]
struct CompiledPattern {
    segments: Vec<Segment>,
    rooted: bool,
    trailing_slash: bool,
}

impl CompiledPattern {
    fn compile(pattern: &str) -> Self {
        Self {
            segments: tokenize(pattern).map(Segment::parse).collect(),
            rooted: pattern.starts_with(SEPARATOR),
            trailing_slash: pattern.ends_with(SEPARATOR),
        }
    }

    fn matches(&self, path: &str) -> bool {
        if self.rooted != path.starts_with(SEPARATOR) {
            return false;
        }
        let tokens: Vec<&str> = tokenize(path).collect();
        if !match_segments(&self.segments, &tokens) {
            return false;
        }
        // "/a/**" accepts "/a/" and "/a"; otherwise slashes must agree.
        matches!(self.segments.last(), Some(Segment::AnyDepth))
            || self.trailing_slash == path.ends_with(SEPARATOR)
    }
}

fn tokenize(value: &str) -> impl Iterator<Item = &str> {
    value.split(SEPARATOR).filter(|token| !token.is_empty())
}

fn match_segments(pattern: &[Segment], path: &[&str]) -> bool {
    match pattern.split_first() {
        None => path.is_empty(),
        Some((Segment::AnyDepth, rest)) => {
            (0..=path.len()).any(|skip| match_segments(rest, &path[skip..]))
        }
        Some((segment, rest)) => match path.split_first() {
            Some((token, remaining)) => segment.matches(token) && match_segments(rest, remaining),
            None => false,
        },
    }
}

/// Match a single segment against a glob of `*` and `?`.
fn glob_matches(glob: &str, token: &str) -> bool {
    let glob: Vec<char> = glob.chars().collect();
    let token: Vec<char> = token.chars().collect();
    let (mut g, mut t) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < token.len() {
        if g < glob.len() && (glob[g] == '?' || glob[g] == token[t]) {
            g += 1;
            t += 1;
        } else if g < glob.len() && glob[g] == '*' {
            backtrack = Some((g, t));
            g += 1;
        } else if let Some((star, consumed)) = backtrack {
            g = star + 1;
            t = consumed + 1;
            backtrack = Some((star, consumed + 1));
        } else {
            return false;
        }
    }
    glob[g..].iter().all(|c| *c == '*')
}

/// Ant-style matcher with a per-instance compiled pattern cache.
#[derive(Debug, Default)]
pub struct PathMatcher {
    compiled: DashMap<String, Arc<CompiledPattern>>,
}

impl PathMatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full mapping semantics: plain match, implicit `.*` extension, and
    /// tail patterns for declarations without a leading `/`.
    pub fn matches(&self, pattern: &str, path: &str) -> bool {
        if pattern == path || self.match_glob(pattern, path) {
            return true;
        }
        let has_suffix = pattern.contains('.');
        if !has_suffix && self.match_glob(&format!("{pattern}.*"), path) {
            return true;
        }
        if pattern.starts_with(SEPARATOR) {
            return false;
        }
        path.ends_with(&format!("{SEPARATOR}{pattern}"))
            || self.match_glob(&format!("/**/{pattern}"), path)
            || (!has_suffix && self.match_glob(&format!("/**/{pattern}.*"), path))
    }

    /// Plain Ant match with no extension or tail handling.
    pub fn match_glob(&self, pattern: &str, path: &str) -> bool {
        self.compile(pattern).matches(path)
    }

    /// Number of distinct pattern strings compiled so far.
    pub fn cached_patterns(&self) -> usize {
        self.compiled.len()
    }

    fn compile(&self, pattern: &str) -> Arc<CompiledPattern> {
        if let Some(hit) = self.compiled.get(pattern) {
            return hit.value().clone();
        }
        let compiled = Arc::new(CompiledPattern::compile(pattern));
        self.compiled
            .entry(pattern.to_string())
            .or_insert(compiled)
            .value()
            .clone()
    }
}

/// Order two matched patterns, most specific first.
///
/// A pattern equal to the lookup path beats any wildcard; between two
/// wildcards the longer pattern wins.
pub fn compare_specificity(left: &str, right: &str, lookup_path: &str) -> Ordering {
    let left_exact = left == lookup_path;
    let right_exact = right == lookup_path;
    match (left_exact, right_exact) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => Ordering::Equal,
        (false, false) => right.len().cmp(&left.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_and_single_wildcard() {
        let matcher = PathMatcher::new();
        assert!(matcher.matches("/a/b", "/a/b"));
        assert!(matcher.matches("/a/*", "/a/b"));
        assert!(!matcher.matches("/a/*", "/a/b/c"));
        assert!(matcher.matches("/a/*.do", "/a/go.do"));
        assert!(matcher.matches("/a/g?", "/a/go"));
        assert!(!matcher.matches("/a/g?", "/a/goo"));
    }

    #[test]
    fn test_double_wildcard() {
        let matcher = PathMatcher::new();
        assert!(matcher.matches("/a/**", "/a/b/go.do"));
        assert!(matcher.matches("/a/**", "/a"));
        assert!(matcher.matches("/a/**/go", "/a/go"));
        assert!(matcher.matches("/a/**/go", "/a/x/y/go"));
        assert!(!matcher.matches("/a/**/go", "/b/x/go"));
    }

    #[test]
    fn test_implicit_extension() {
        let matcher = PathMatcher::new();
        assert!(matcher.matches("/a/b/go", "/a/b/go.do"));
        assert!(!matcher.matches("/a/b/go.htm", "/a/b/go.do"));
    }

    #[test]
    fn test_tail_patterns() {
        let matcher = PathMatcher::new();
        assert!(matcher.matches("go.do", "/a/b/go.do"));
        assert!(matcher.matches("go", "/a/b/go.do"));
        assert!(matcher.matches("b/go", "/a/b/go"));
        assert!(matcher.matches("*.do", "/a/b/go.do"));
        assert!(!matcher.matches("o.do", "/a/b/go.do"));
        assert!(!matcher.matches("/go.do", "/a/b/go.do"));
    }

    #[test]
    fn test_trailing_slash_must_agree() {
        let matcher = PathMatcher::new();
        assert!(!matcher.match_glob("/a/b/", "/a/b"));
        assert!(matcher.match_glob("/a/b/", "/a/b/"));
    }

    #[test]
    fn test_repeated_calls_are_stable() {
        let matcher = PathMatcher::new();
        for _ in 0..3 {
            assert!(matcher.matches("/a/**", "/a/b"));
            assert!(!matcher.matches("/x/**", "/a/b"));
        }
        assert_eq!(matcher.cached_patterns(), 3);
    }

    #[test]
    fn test_specificity() {
        let lookup = "/a/b/go.do";
        assert_eq!(compare_specificity(lookup, "/a/**", lookup), Ordering::Less);
        assert_eq!(compare_specificity("/a/**", "/a/b/**", lookup), Ordering::Greater);
        assert_eq!(compare_specificity("/a/*", "/b/*", lookup), Ordering::Equal);
    }

    #[test]
    fn test_validate_pattern() {
        assert!(validate_pattern("/a/**/b").is_ok());
        assert_eq!(validate_pattern(""), Err(PatternError::Empty));
        assert!(matches!(
            validate_pattern("/a/**b"),
            Err(PatternError::EmbeddedDoubleWildcard(_))
        ));
        assert!(matches!(validate_pattern("/a b"), Err(PatternError::Whitespace(_))));
    }
}
