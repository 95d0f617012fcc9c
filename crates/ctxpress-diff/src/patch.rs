//! Unified patch construction and writing

use crate::error::{DiffError, DiffResult};
use crate::types::{Change, DiffPatch, Hunk};
use git2::{DiffOptions, Patch};
use std::fmt::Write;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Banner written between the `Index:` line and the file headers
pub const SEPARATOR: &str = "===================================================================";

/// Marker for a last line without a trailing newline
pub const NO_NEWLINE_MARKER: &str = "\\ No newline at end of file";

const DEFAULT_CONTEXT_LINES: u32 = 3;

/// Turns changes into unified diff text
pub trait PatchBuilder {
    fn build_patch(
        &self,
        changes: &[&Change],
        base_path: &Path,
        reverse: bool,
        include_context: bool,
    ) -> DiffResult<Vec<DiffPatch>>;

    fn write_patches(
        &self,
        patches: &[DiffPatch],
        writer: &mut dyn Write,
        line_separator: &str,
    ) -> DiffResult<()> {
        write_unified(patches, writer, line_separator)
    }
}

/// Patch builder backed by libgit2's buffer diff
#[derive(Debug, Clone, Default)]
pub struct GitPatchBuilder {
    revision: Option<String>,
    timestamp_millis: Option<i64>,
}

impl GitPatchBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Revision label written after `---` headers
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Fixed timestamp for `+++` headers instead of the current time
    pub fn with_timestamp(mut self, millis: i64) -> Self {
        self.timestamp_millis = Some(millis);
        self
    }

    fn timestamp(&self) -> i64 {
        self.timestamp_millis.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as i64)
                .unwrap_or_default()
        })
    }

    fn diff_change(
        &self,
        change: &Change,
        base_path: &Path,
        reverse: bool,
        context_lines: u32,
    ) -> DiffResult<Option<DiffPatch>> {
        let mut old = (change.before_path(), change.before.as_deref());
        let mut new = (change.after_path(), change.after.as_deref());
        if reverse {
            std::mem::swap(&mut old, &mut new);
        }

        let old_path = old.0.map(|p| relative_to(p, base_path));
        let new_path = new.0.map(|p| relative_to(p, base_path));

        let mut opts = DiffOptions::new();
        opts.context_lines(context_lines);
        let patch = Patch::from_buffers(
            old.1.unwrap_or("").as_bytes(),
            old_path.as_deref().map(Path::new),
            new.1.unwrap_or("").as_bytes(),
            new_path.as_deref().map(Path::new),
            Some(&mut opts),
        )?;

        let hunks = collect_hunks(&patch)?;
        let renamed = old_path.is_some() && new_path.is_some() && old_path != new_path;
        let created_or_deleted = old_path.is_none() || new_path.is_none();
        if hunks.is_empty() && !renamed && !created_or_deleted {
            debug!(path = %change.path, "Skipping change without content differences");
            return Ok(None);
        }

        Ok(Some(DiffPatch {
            before_revision: old_path.as_ref().and(self.revision.clone()),
            after_timestamp: new_path.as_ref().map(|_| self.timestamp()),
            before_path: old_path,
            after_path: new_path,
            hunks,
        }))
    }
}

impl PatchBuilder for GitPatchBuilder {
    fn build_patch(
        &self,
        changes: &[&Change],
        base_path: &Path,
        reverse: bool,
        include_context: bool,
    ) -> DiffResult<Vec<DiffPatch>> {
        let context_lines = if include_context {
            DEFAULT_CONTEXT_LINES
        } else {
            0
        };

        let mut patches = Vec::with_capacity(changes.len());
        for change in changes {
            if let Some(patch) = self.diff_change(change, base_path, reverse, context_lines)? {
                patches.push(patch);
            }
        }
        Ok(patches)
    }
}

fn collect_hunks(patch: &Patch<'_>) -> DiffResult<Vec<Hunk>> {
    let mut hunks = Vec::with_capacity(patch.num_hunks());
    for hunk_idx in 0..patch.num_hunks() {
        let (hunk, line_count) = patch.hunk(hunk_idx)?;
        let header = String::from_utf8_lossy(hunk.header())
            .trim_end_matches(['\r', '\n'])
            .to_string();

        let mut lines = Vec::with_capacity(line_count);
        for line_idx in 0..line_count {
            let line = patch.line_in_hunk(hunk_idx, line_idx)?;
            match line.origin() {
                origin @ (' ' | '+' | '-') => {
                    let content = String::from_utf8_lossy(line.content());
                    let content = content
                        .strip_suffix('\n')
                        .map(|c| c.strip_suffix('\r').unwrap_or(c))
                        .unwrap_or(&content);
                    lines.push(format!("{}{}", origin, content));
                }
                '=' | '>' | '<' => lines.push(NO_NEWLINE_MARKER.to_string()),
                _ => {}
            }
        }

        hunks.push(Hunk { header, lines });
    }
    Ok(hunks)
}

/// Write paths relative to `base_path` when they live under it
fn relative_to(path: &str, base_path: &Path) -> String {
    Path::new(path)
        .strip_prefix(base_path)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string())
}

/// Write patches in unified format with `Index:` banners and file headers
pub fn write_unified(
    patches: &[DiffPatch],
    writer: &mut dyn Write,
    line_separator: &str,
) -> DiffResult<()> {
    let mut lines: Vec<String> = Vec::new();
    for patch in patches {
        let old = patch
            .before_path
            .as_deref()
            .unwrap_or(patch.display_path());
        let new = patch.after_path.as_deref().unwrap_or(patch.display_path());

        lines.push(format!("Index: {}", patch.display_path()));
        lines.push(SEPARATOR.to_string());
        lines.push(format!("diff --git a/{} b/{}", old, new));
        if patch.is_new_file() {
            lines.push("new file mode 100644".to_string());
        } else if patch.is_deleted_file() {
            lines.push("deleted file mode 100644".to_string());
        }

        lines.push(match (&patch.before_path, &patch.before_revision) {
            (None, _) => "--- /dev/null".to_string(),
            (Some(path), Some(revision)) => format!("--- a/{}\t(revision {})", path, revision),
            (Some(path), None) => format!("--- a/{}", path),
        });
        lines.push(match (&patch.after_path, patch.after_timestamp) {
            (None, _) => "+++ /dev/null".to_string(),
            (Some(path), Some(millis)) => format!("+++ b/{}\t(date {})", path, millis),
            (Some(path), None) => format!("+++ b/{}", path),
        });

        for hunk in &patch.hunks {
            lines.push(hunk.header.clone());
            lines.extend(hunk.lines.iter().cloned());
        }
    }

    for line in lines {
        writer
            .write_str(&line)
            .and_then(|_| writer.write_str(line_separator))
            .map_err(|e| DiffError::Construction(format!("Failed to write patch: {}", e)))?;
    }
    Ok(())
}
