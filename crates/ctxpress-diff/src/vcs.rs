//! Change sources backed by a git repository

use crate::error::{DiffError, DiffResult};
use crate::types::{Change, CommitDetail};
use ctxpress_core::DiffConfig;
use git2::{
    Delta, Diff, DiffFile, DiffFindOptions, DiffOptions, ErrorCode, FileMode, Oid, Repository,
};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Number of leading bytes inspected for NUL when detecting binary content
const BINARY_SNIFF_LEN: usize = 8000;

/// Supplies the changes a prompt is built from
pub trait ChangeSource {
    /// Uncommitted changes: index and working tree against HEAD
    fn pending_changes(&self) -> DiffResult<Vec<Change>>;

    /// Changes introduced by each revision, against its first parent
    fn commit_changes(&self, revisions: &[String]) -> DiffResult<Vec<CommitDetail>>;
}

#[derive(Clone, Copy)]
enum NewSide {
    Workdir,
    Tree,
}

/// One side of a delta, with content only when it is small enough to load
struct SideContent {
    bytes: Vec<u8>,
    size: u64,
    loaded: bool,
}

impl SideContent {
    fn loaded(bytes: Vec<u8>) -> Self {
        Self {
            size: bytes.len() as u64,
            bytes,
            loaded: true,
        }
    }

    fn too_large(size: u64) -> Self {
        Self {
            bytes: Vec::new(),
            size,
            loaded: false,
        }
    }
}

pub struct GitChangeSource {
    repo: Repository,
    size_limit: u64,
}

impl GitChangeSource {
    /// Open the repository containing `path`
    pub fn open(path: &Path) -> DiffResult<Self> {
        let repo = Repository::discover(path).map_err(|e| {
            DiffError::Construction(format!(
                "Failed to open repository at {}: {}",
                path.display(),
                e.message()
            ))
        })?;
        Ok(Self {
            repo,
            size_limit: DiffConfig::default().large_file_threshold_bytes,
        })
    }

    /// Files above this many bytes are reported with their size but no content
    pub fn with_size_limit(mut self, bytes: u64) -> Self {
        self.size_limit = bytes;
        self
    }

    /// Root of the working tree, falling back to the git directory
    pub fn base_path(&self) -> PathBuf {
        self.repo
            .workdir()
            .unwrap_or_else(|| self.repo.path())
            .to_path_buf()
    }

    /// Abbreviated id of HEAD, if the branch has a commit
    pub fn head_revision(&self) -> Option<String> {
        let head = self.repo.head().ok()?;
        let oid = head.target()?;
        Some(short_id(oid))
    }

    fn head_tree(&self) -> DiffResult<Option<git2::Tree<'_>>> {
        match self.repo.head() {
            Ok(head) => Ok(Some(head.peel_to_tree()?)),
            Err(e) if matches!(e.code(), ErrorCode::UnbornBranch | ErrorCode::NotFound) => {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn blob_content(&self, id: Oid) -> DiffResult<Option<SideContent>> {
        if id.is_zero() {
            return Ok(None);
        }
        let (size, _) = self.repo.odb()?.read_header(id)?;
        if size as u64 > self.size_limit {
            return Ok(Some(SideContent::too_large(size as u64)));
        }
        let blob = self.repo.find_blob(id)?;
        Ok(Some(SideContent::loaded(blob.content().to_vec())))
    }

    fn workdir_content(&self, path: &Path) -> DiffResult<Option<SideContent>> {
        let Some(workdir) = self.repo.workdir() else {
            return Ok(None);
        };
        let full_path = workdir.join(path);
        let metadata = match fs::metadata(&full_path) {
            Ok(metadata) if metadata.is_file() => metadata,
            _ => return Ok(None),
        };
        if metadata.len() > self.size_limit {
            return Ok(Some(SideContent::too_large(metadata.len())));
        }
        Ok(Some(SideContent::loaded(fs::read(full_path)?)))
    }

    fn side_content(
        &self,
        file: &DiffFile<'_>,
        from_workdir: bool,
    ) -> DiffResult<Option<SideContent>> {
        if matches!(file.mode(), FileMode::Commit) {
            debug!(path = ?file.path(), id = %file.id(), "Submodule entry");
            if file.id().is_zero() {
                return Ok(None);
            }
            let text = format!("Subproject commit {}\n", file.id());
            return Ok(Some(SideContent::loaded(text.into_bytes())));
        }

        if from_workdir {
            if let Some(content) = file
                .path()
                .map(|path| self.workdir_content(path))
                .transpose()?
                .flatten()
            {
                return Ok(Some(content));
            }
        }
        self.blob_content(file.id())
    }

    fn collect_changes(&self, diff: &Diff<'_>, new_side: NewSide) -> DiffResult<Vec<Change>> {
        let mut changes = Vec::new();
        for delta in diff.deltas() {
            let status = delta.status();
            if matches!(status, Delta::Unmodified | Delta::Ignored | Delta::Unreadable) {
                continue;
            }

            let old_path = delta.old_file().path().map(Path::to_path_buf);
            let new_path = delta.new_file().path().map(Path::to_path_buf);

            let before = match status {
                Delta::Added | Delta::Untracked => None,
                _ => self.side_content(&delta.old_file(), false)?,
            };
            let after = match (status, new_path.as_ref()) {
                (Delta::Deleted, _) | (_, None) => None,
                (_, Some(_)) => {
                    self.side_content(&delta.new_file(), matches!(new_side, NewSide::Workdir))?
                }
            };

            let Some(path) = (match status {
                Delta::Deleted => old_path.clone(),
                _ => new_path.clone().or_else(|| old_path.clone()),
            }) else {
                warn!(?status, "Skipping delta without a path");
                continue;
            };

            let previous_path = match status {
                Delta::Renamed => old_path.filter(|old| *old != path),
                _ => None,
            };

            changes.push(build_change(path, previous_path, before, after));
        }

        debug!(count = changes.len(), "Collected changes");
        Ok(changes)
    }
}

impl ChangeSource for GitChangeSource {
    fn pending_changes(&self) -> DiffResult<Vec<Change>> {
        let head_tree = self.head_tree()?;
        let mut opts = DiffOptions::new();
        opts.include_untracked(true)
            .recurse_untracked_dirs(true)
            .show_untracked_content(true);

        let mut diff = self
            .repo
            .diff_tree_to_workdir_with_index(head_tree.as_ref(), Some(&mut opts))?;
        diff.find_similar(Some(DiffFindOptions::new().renames(true)))?;

        self.collect_changes(&diff, NewSide::Workdir)
    }

    fn commit_changes(&self, revisions: &[String]) -> DiffResult<Vec<CommitDetail>> {
        let mut details = Vec::with_capacity(revisions.len());
        for revision in revisions {
            let commit = self
                .repo
                .revparse_single(revision)
                .and_then(|object| object.peel_to_commit())
                .map_err(|e| {
                    DiffError::Construction(format!(
                        "Unknown revision '{}': {}",
                        revision,
                        e.message()
                    ))
                })?;

            let tree = commit.tree()?;
            let parent_tree = match commit.parent(0) {
                Ok(parent) => Some(parent.tree()?),
                Err(_) => None,
            };

            let mut diff = self
                .repo
                .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
            diff.find_similar(Some(DiffFindOptions::new().renames(true)))?;

            details.push(CommitDetail {
                id: commit.id().to_string(),
                subject: commit.summary().unwrap_or_default().to_string(),
                message: commit.message().unwrap_or_default().trim_end().to_string(),
                changes: self.collect_changes(&diff, NewSide::Tree)?,
            });
        }
        Ok(details)
    }
}

fn short_id(oid: Oid) -> String {
    let mut id = oid.to_string();
    id.truncate(7);
    id
}

/// Git's heuristic: a NUL byte near the start means binary content
pub fn looks_binary(bytes: &[u8]) -> bool {
    bytes.iter().take(BINARY_SNIFF_LEN).any(|b| *b == 0)
}

fn build_change(
    path: PathBuf,
    previous_path: Option<PathBuf>,
    before: Option<SideContent>,
    after: Option<SideContent>,
) -> Change {
    let is_binary = [&before, &after]
        .into_iter()
        .flatten()
        .any(|side| side.loaded && looks_binary(&side.bytes));
    let size_bytes = after
        .as_ref()
        .or(before.as_ref())
        .map(|side| side.size)
        .unwrap_or(0);

    // binary or unloaded sides keep an empty body; the size still filters them
    let text = |side: SideContent| {
        if !side.loaded || is_binary {
            String::new()
        } else {
            String::from_utf8_lossy(&side.bytes).into_owned()
        }
    };

    Change {
        path: path.to_string_lossy().to_string(),
        previous_path: previous_path.map(|p| p.to_string_lossy().to_string()),
        before: before.map(text),
        after: after.map(text),
        is_binary,
        size_bytes,
    }
}
