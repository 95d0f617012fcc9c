//! Change filtering and diff simplification for prompt inclusion

use crate::error::DiffResult;
use crate::matcher::PathMatcher;
use crate::patch::{PatchBuilder, NO_NEWLINE_MARKER};
use crate::types::Change;
use ctxpress_core::DiffConfig;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info};

static REVISION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(revision [^)]+\)").expect("valid revision regex"));

const NEW_FILE_HEADER: &str = "+++ b/";
const DEV_NULL_HEADER: &str = "--- /dev/null";

/// Limits applied to changes before they reach the patch builder
#[derive(Debug, Clone)]
pub struct ChangePolicy {
    pub max_changes: usize,
    pub large_file_threshold_bytes: u64,
    pub include_context: bool,
}

impl Default for ChangePolicy {
    fn default() -> Self {
        Self::from(&DiffConfig::default())
    }
}

impl From<&DiffConfig> for ChangePolicy {
    fn from(config: &DiffConfig) -> Self {
        Self {
            max_changes: config.max_changes,
            large_file_threshold_bytes: config.large_file_threshold_bytes,
            include_context: config.include_context,
        }
    }
}

pub fn is_binary_or_too_large(change: &Change, threshold_bytes: u64) -> bool {
    change.is_binary || change.size_bytes > threshold_bytes
}

/// Drop binary, oversized and ignored changes, then cap the list
///
/// Ignore patterns are matched against the post-change path, so deletions
/// are always kept.
pub fn filter_changes<'a>(
    changes: &'a [Change],
    ignore_patterns: &[PathMatcher],
    policy: &ChangePolicy,
) -> Vec<&'a Change> {
    let mut filtered: Vec<&Change> = changes
        .iter()
        .filter(|change| !is_binary_or_too_large(change, policy.large_file_threshold_bytes))
        .filter(|change| match change.after_path() {
            Some(path) => !ignore_patterns
                .iter()
                .any(|pattern| pattern.matches(Path::new(path))),
            None => true,
        })
        .collect();

    if filtered.len() > policy.max_changes {
        debug!(
            kept = policy.max_changes,
            dropped = filtered.len() - policy.max_changes,
            "Truncating change list"
        );
        filtered.truncate(policy.max_changes);
    }

    filtered
}

/// Builds a compact diff of a change list for an LLM prompt
#[derive(Debug)]
pub struct DiffSimplifier<B> {
    builder: B,
    base_path: PathBuf,
    policy: ChangePolicy,
}

impl<B: PatchBuilder> DiffSimplifier<B> {
    pub fn new(builder: B, base_path: impl Into<PathBuf>) -> Self {
        Self {
            builder,
            base_path: base_path.into(),
            policy: ChangePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: ChangePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &ChangePolicy {
        &self.policy
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn simplify(&self, changes: &[Change], ignore_patterns: &[PathMatcher]) -> DiffResult<String> {
        let filtered = filter_changes(changes, ignore_patterns, &self.policy);
        if filtered.is_empty() {
            debug!(total = changes.len(), "No changes left after filtering");
            return Ok(String::new());
        }

        let mut raw = String::new();
        self.write_raw_diff(&filtered, &mut raw)?;
        let simplified = post_process(&raw);
        info!(
            changes = filtered.len(),
            raw_bytes = raw.len(),
            simplified_bytes = simplified.len(),
            "Simplified diff"
        );
        Ok(simplified)
    }

    /// Append the unprocessed unified diff of already filtered changes
    pub fn write_raw_diff(&self, changes: &[&Change], out: &mut String) -> DiffResult<()> {
        let patches =
            self.builder
                .build_patch(changes, &self.base_path, false, self.policy.include_context)?;
        self.builder.write_patches(&patches, out, "\n")
    }
}

fn is_separator(line: &str) -> bool {
    line.len() >= 64 && line.bytes().all(|b| b == b'=')
}

fn new_file_path(header: &str) -> &str {
    let path = &header[NEW_FILE_HEADER.len()..];
    match path.find('\t') {
        Some(tab) => &path[..tab],
        None => path,
    }
}

/// Strip VCS metadata from unified diff text
///
/// Removes `diff --git`/`index` lines, separator banners, no-newline markers,
/// `/dev/null` headers and bare hunk headers, collapses new-file headers into
/// `new file <path>` and drops `(revision ...)` labels from file headers.
pub fn post_process(diff: &str) -> String {
    let lines: Vec<&str> = diff
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    let mut destination: Vec<String> = Vec::with_capacity(lines.len());
    let mut index = 0;

    while index < lines.len() {
        let line = lines[index];

        if line.starts_with("diff --git ") || line.starts_with("index ") || line.starts_with("Index ") {
            index += 1;
            continue;
        }

        if is_separator(line) || line.contains(NO_NEWLINE_MARKER) {
            index += 1;
            continue;
        }

        if line.starts_with("new file mode") {
            let header = lines
                .get(index + 1)
                .zip(lines.get(index + 2))
                .filter(|(next, after)| {
                    **next == DEV_NULL_HEADER && after.starts_with(NEW_FILE_HEADER)
                });
            if let Some((_, after)) = header {
                destination.push(format!("new file {}", new_file_path(after)));
                index += 3;
                continue;
            }
        }

        if line == DEV_NULL_HEADER {
            index += 1;
            continue;
        }

        if line.starts_with("@@") && line.ends_with("@@") {
            index += 1;
            continue;
        }

        if line.starts_with("---") || line.starts_with("+++") {
            destination.push(REVISION_RE.replace_all(line, "").into_owned());
        } else {
            destination.push(line.to_string());
        }

        index += 1;
    }

    destination.join("\n")
}
