//! Diff prompts for a list of commits

use crate::error::DiffResult;
use crate::matcher::PathMatcher;
use crate::patch::PatchBuilder;
use crate::simplifier::{filter_changes, post_process, DiffSimplifier};
use crate::types::CommitDetail;
use tracing::debug;

/// Commit subjects plus the simplified diff of their changes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitPrompt {
    /// Quoted commit subjects, in input order
    pub summaries: Vec<String>,
    pub diff: String,
}

impl<B: PatchBuilder> DiffSimplifier<B> {
    /// Build a prompt section describing each commit and its code changes
    ///
    /// Returns `None` when no commit has changes left after filtering.
    pub fn commit_prompt(
        &self,
        commits: &[CommitDetail],
        ignore_patterns: &[PathMatcher],
    ) -> DiffResult<Option<CommitPrompt>> {
        let mut raw = String::new();
        let mut summaries = Vec::with_capacity(commits.len());
        let mut is_empty = true;

        for commit in commits {
            summaries.push(format!("\"{}\"", commit.subject));

            let filtered = filter_changes(&commit.changes, ignore_patterns, self.policy());
            if filtered.is_empty() {
                debug!(commit = %commit.id, "Commit has no changes after filtering");
                continue;
            }

            raw.push_str(&format!(
                "Commit Message: {}\n\nCode Changes:\n\n",
                commit.message
            ));
            self.write_raw_diff(&filtered, &mut raw)?;
            is_empty = false;
        }

        if is_empty {
            return Ok(None);
        }

        Ok(Some(CommitPrompt {
            summaries,
            diff: post_process(&raw),
        }))
    }
}
