//! Path predicates used to keep generated or vendored files out of prompts

use crate::error::{DiffError, DiffResult};
use globset::{Glob, GlobMatcher};
use regex::Regex;
use std::fmt;
use std::path::Path;

/// A glob or regex predicate over file paths
///
/// Accepts `glob:<pattern>`, `regex:<pattern>` or a bare glob. Regex
/// patterns must match the whole path.
#[derive(Clone)]
pub enum PathMatcher {
    Glob { pattern: String, matcher: GlobMatcher },
    Regex { pattern: String, regex: Regex },
}

impl PathMatcher {
    pub fn parse(raw: &str) -> DiffResult<Self> {
        if let Some(pattern) = raw.strip_prefix("regex:") {
            let regex = Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                DiffError::Pattern {
                    pattern: raw.to_string(),
                    message: e.to_string(),
                }
            })?;
            return Ok(PathMatcher::Regex {
                pattern: pattern.to_string(),
                regex,
            });
        }

        let pattern = raw.strip_prefix("glob:").unwrap_or(raw);
        let glob = Glob::new(pattern).map_err(|e| DiffError::Pattern {
            pattern: raw.to_string(),
            message: e.to_string(),
        })?;
        Ok(PathMatcher::Glob {
            pattern: pattern.to_string(),
            matcher: glob.compile_matcher(),
        })
    }

    pub fn parse_all<S: AsRef<str>>(patterns: &[S]) -> DiffResult<Vec<Self>> {
        patterns.iter().map(|raw| Self::parse(raw.as_ref())).collect()
    }

    pub fn matches(&self, path: &Path) -> bool {
        match self {
            PathMatcher::Glob { matcher, .. } => matcher.is_match(path),
            PathMatcher::Regex { regex, .. } => regex.is_match(&path.to_string_lossy()),
        }
    }

    pub fn pattern(&self) -> &str {
        match self {
            PathMatcher::Glob { pattern, .. } | PathMatcher::Regex { pattern, .. } => pattern,
        }
    }
}

impl fmt::Debug for PathMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathMatcher::Glob { pattern, .. } => write!(f, "glob:{}", pattern),
            PathMatcher::Regex { pattern, .. } => write!(f, "regex:{}", pattern),
        }
    }
}
