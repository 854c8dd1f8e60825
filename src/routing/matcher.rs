//! Path matching logic.
//!
//! # Responsibilities
//! - Match a literal path exactly
//! - Match a literal prefix and capture the remainder as the subpath
//! - Match one segment against a fixed set of literal alternatives
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - Prefixes only match on segment boundaries (`/api/movies` never matches `/api/moviesX`)
//! - No regex to guarantee O(n) matching

/// What a successful match extracted from the path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Capture {
    /// Remainder after the matched prefix, without its leading `/`.
    /// Empty when the bare prefix matched.
    pub subpath: String,
    /// The alternative matched by a segment-set matcher.
    pub segment: Option<String>,
}

/// Trait for matching request paths against structural patterns.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns the capture if the path matches this pattern.
    fn capture(&self, path: &str) -> Option<Capture>;

    /// Human-readable pattern, e.g. `/api/movies/{*subpath}`.
    fn pattern(&self) -> String;

    fn matches(&self, path: &str) -> bool {
        self.capture(path).is_some()
    }
}

/// Matches one literal path.
#[derive(Debug, Clone)]
pub struct ExactMatcher {
    path: String,
}

impl ExactMatcher {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into() }
    }
}

impl Matcher for ExactMatcher {
    fn capture(&self, path: &str) -> Option<Capture> {
        (path == self.path).then(Capture::default)
    }

    fn pattern(&self) -> String {
        self.path.clone()
    }
}

/// Matches a literal prefix followed by anything.
#[derive(Debug, Clone)]
pub struct WildcardMatcher {
    prefix: String,
}

impl WildcardMatcher {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl Matcher for WildcardMatcher {
    fn capture(&self, path: &str) -> Option<Capture> {
        let subpath = rest_after(path, &self.prefix)?;
        Some(Capture {
            subpath: subpath.to_string(),
            segment: None,
        })
    }

    fn pattern(&self) -> String {
        format!("{}/{{*subpath}}", self.prefix)
    }
}

/// Matches `parent/<segment>` where the segment is one of a fixed set,
/// optionally followed by a wildcard remainder.
#[derive(Debug, Clone)]
pub struct SegmentSetMatcher {
    parent: String,
    segments: Vec<String>,
    wildcard: bool,
}

impl SegmentSetMatcher {
    pub fn new(parent: impl Into<String>, segments: Vec<String>, wildcard: bool) -> Self {
        Self {
            parent: parent.into(),
            segments,
            wildcard,
        }
    }
}

impl Matcher for SegmentSetMatcher {
    fn capture(&self, path: &str) -> Option<Capture> {
        let below = path.strip_prefix(&self.parent)?.strip_prefix('/')?;
        let (segment, rest) = match below.split_once('/') {
            Some((segment, rest)) => (segment, Some(rest)),
            None => (below, None),
        };

        if !self.segments.iter().any(|s| s == segment) {
            return None;
        }

        let subpath = match rest {
            None => String::new(),
            Some(rest) if self.wildcard => rest.to_string(),
            Some(_) => return None,
        };

        Some(Capture {
            subpath,
            segment: Some(segment.to_string()),
        })
    }

    fn pattern(&self) -> String {
        let alternatives = self.segments.join("|");
        if self.wildcard {
            format!("{}/{{{}}}/{{*subpath}}", self.parent, alternatives)
        } else {
            format!("{}/{{{}}}", self.parent, alternatives)
        }
    }
}

/// Matches anything except the root path. Used for the default-origin catch-all.
#[derive(Debug, Clone, Default)]
pub struct CatchAllMatcher;

impl Matcher for CatchAllMatcher {
    fn capture(&self, path: &str) -> Option<Capture> {
        if path == "/" {
            return None;
        }
        Some(Capture {
            subpath: path.trim_start_matches('/').to_string(),
            segment: None,
        })
    }

    fn pattern(&self) -> String {
        "/{*subpath}".to_string()
    }
}

/// Remainder of `path` below `prefix`, honoring segment boundaries.
fn rest_after<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some(rest)
    } else {
        rest.strip_prefix('/')
    }
}
