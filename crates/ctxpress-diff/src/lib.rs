//! VCS diff simplification for LLM prompts
//!
//! Filters a change list (binary, oversized and ignored files), renders the
//! survivors as unified diff text and strips the VCS metadata an LLM has no
//! use for: `diff --git`/`index` lines, separator banners, `/dev/null`
//! headers, bare hunk headers and revision labels.

mod commit;
mod error;
mod matcher;
mod patch;
mod simplifier;
mod types;
mod vcs;

pub use commit::CommitPrompt;
pub use error::{DiffError, DiffResult};
pub use matcher::PathMatcher;
pub use patch::{write_unified, GitPatchBuilder, PatchBuilder, NO_NEWLINE_MARKER, SEPARATOR};
pub use simplifier::{
    filter_changes, is_binary_or_too_large, post_process, ChangePolicy, DiffSimplifier,
};
pub use types::{Change, ChangeType, CommitDetail, DiffPatch, Hunk};
pub use vcs::{looks_binary, ChangeSource, GitChangeSource};

#[cfg(test)]
mod tests;
