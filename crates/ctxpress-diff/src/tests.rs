use super::*;
use git2::{Repository, Signature};
use std::cell::Cell;
use std::path::Path;

struct FailingBuilder;

impl PatchBuilder for FailingBuilder {
    fn build_patch(
        &self,
        _changes: &[&Change],
        _base_path: &Path,
        _reverse: bool,
        _include_context: bool,
    ) -> DiffResult<Vec<DiffPatch>> {
        Err(DiffError::Construction("repository unavailable".to_string()))
    }
}

#[derive(Default)]
struct CountingBuilder {
    calls: Cell<usize>,
    seen: Cell<usize>,
}

impl PatchBuilder for CountingBuilder {
    fn build_patch(
        &self,
        changes: &[&Change],
        _base_path: &Path,
        _reverse: bool,
        _include_context: bool,
    ) -> DiffResult<Vec<DiffPatch>> {
        self.calls.set(self.calls.get() + 1);
        self.seen.set(changes.len());
        Ok(Vec::new())
    }
}

fn simplifier() -> DiffSimplifier<GitPatchBuilder> {
    DiffSimplifier::new(
        GitPatchBuilder::new()
            .with_revision("1a2b3c4")
            .with_timestamp(1704768267000),
        "/repo",
    )
}

fn create_temp_repo() -> (tempfile::TempDir, Repository) {
    let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let repo = Repository::init(temp_dir.path()).expect("Failed to init repo");
    {
        let mut config = repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();
    }
    (temp_dir, repo)
}

fn commit_all(repo: &Repository, message: &str) -> git2::Oid {
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"], git2::IndexAddOption::DEFAULT, None)
        .unwrap();
    index.update_all(["*"], None).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let parents = match repo.head() {
        Ok(head) => vec![head.peel_to_commit().unwrap()],
        Err(_) => vec![],
    };
    let parent_refs: Vec<&git2::Commit> = parents.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parent_refs)
        .unwrap()
}

fn write_file(root: &Path, rel_path: &str, content: &str) {
    let full_path = root.join(rel_path);
    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(full_path, content).unwrap();
}

#[test]
fn test_simplify_new_and_modified_files() {
    let changes = vec![
        Change::added("foo.txt", "hello\n"),
        Change::modified("src/lib.rs", "fn a() {}\n", "fn b() {}\n"),
    ];

    let result = simplifier().simplify(&changes, &[]).unwrap();

    assert!(result.contains("new file foo.txt\n+hello"));
    assert!(result.contains("--- a/src/lib.rs\t\n+++ b/src/lib.rs\t(date 1704768267000)"));
    assert!(result.contains("-fn a() {}\n+fn b() {}"));
    assert!(!result.contains("diff --git"));
    assert!(!result.contains("(revision"));
    assert!(!result.contains(SEPARATOR));
    assert!(!result.contains("--- /dev/null"));
    assert!(!result.lines().any(|l| l.starts_with("@@") && l.ends_with("@@")));
}

#[test]
fn test_simplify_output_is_stable_under_post_process() {
    let changes = vec![
        Change::added("a.txt", "one\ntwo"),
        Change::deleted("b.txt", "gone\n"),
        Change::modified("c.txt", "1\n2\n3\n", "1\n2\n4\n"),
    ];
    let result = simplifier().simplify(&changes, &[]).unwrap();
    assert_eq!(post_process(&result), result);
    assert!(!result.contains(NO_NEWLINE_MARKER));
}

#[test]
fn test_simplify_skips_builder_when_everything_is_filtered() {
    let builder = CountingBuilder::default();
    let simplifier = DiffSimplifier::new(builder, "/repo");
    let ignore = PathMatcher::parse_all(&["*.lock"]).unwrap();
    let changes = vec![Change::added("Cargo.lock", "x")];

    assert_eq!(simplifier.simplify(&changes, &ignore).unwrap(), "");
    assert_eq!(simplifier.builder_calls(), 0);
}

#[test]
fn test_simplify_caps_changes_before_building() {
    let builder = CountingBuilder::default();
    let simplifier = DiffSimplifier::new(builder, "/repo");
    let changes: Vec<Change> = (0..600)
        .map(|i| Change::added(format!("f{}.txt", i), "x"))
        .collect();

    simplifier.simplify(&changes, &[]).unwrap();
    assert_eq!(simplifier.builder_calls(), 1);
    assert_eq!(simplifier.builder_seen(), 500);
}

#[test]
fn test_simplify_propagates_construction_errors() {
    let simplifier = DiffSimplifier::new(FailingBuilder, "/repo");
    let err = simplifier
        .simplify(&[Change::added("a.txt", "x")], &[])
        .unwrap_err();
    assert!(err.is_construction());
    assert_eq!(err.to_string(), "Error calculating diff: repository unavailable");
}

#[test]
fn test_pending_changes_from_git() {
    let (temp_dir, repo) = create_temp_repo();
    let root = temp_dir.path();
    write_file(root, "keep.txt", "old line\n");
    write_file(root, "remove.txt", "bye\n");
    commit_all(&repo, "Initial commit");

    write_file(root, "keep.txt", "new line\n");
    std::fs::remove_file(root.join("remove.txt")).unwrap();
    write_file(root, "docs/added.md", "# Title\n");

    let source = GitChangeSource::open(root).unwrap();
    assert!(source.head_revision().is_some());

    let mut changes = source.pending_changes().unwrap();
    changes.sort_by(|a, b| a.path.cmp(&b.path));
    let summary: Vec<(&str, ChangeType)> = changes
        .iter()
        .map(|c| (c.path.as_str(), c.change_type()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("docs/added.md", ChangeType::Added),
            ("keep.txt", ChangeType::Modified),
            ("remove.txt", ChangeType::Deleted),
        ]
    );

    let keep = &changes[1];
    assert_eq!(keep.before.as_deref(), Some("old line\n"));
    assert_eq!(keep.after.as_deref(), Some("new line\n"));

    let simplifier = DiffSimplifier::new(GitPatchBuilder::new(), source.base_path());
    let result = simplifier.simplify(&changes, &[]).unwrap();
    assert!(result.contains("new file docs/added.md\n+# Title"));
    assert!(result.contains("-old line\n+new line"));
    assert!(result.contains("-bye"));
    assert!(!result.contains("diff --git"));
}

#[test]
fn test_pending_changes_skip_binary_files() {
    let (temp_dir, repo) = create_temp_repo();
    let root = temp_dir.path();
    write_file(root, "readme.txt", "hi\n");
    commit_all(&repo, "Initial commit");

    std::fs::write(root.join("image.bin"), [0u8, 159, 146, 150]).unwrap();

    let source = GitChangeSource::open(root).unwrap();
    let changes = source.pending_changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert!(changes[0].is_binary);
    assert_eq!(changes[0].after.as_deref(), Some(""));

    let simplifier = DiffSimplifier::new(GitPatchBuilder::new(), source.base_path());
    assert_eq!(simplifier.simplify(&changes, &[]).unwrap(), "");
}

#[test]
fn test_commit_changes_and_prompt() {
    let (temp_dir, repo) = create_temp_repo();
    let root = temp_dir.path();
    write_file(root, "a.txt", "first\n");
    let first = commit_all(&repo, "Add a");
    write_file(root, "a.txt", "second\n");
    write_file(root, "yarn.lock", "lock\n");
    let second = commit_all(&repo, "Update a\n\nLonger body");

    let source = GitChangeSource::open(root).unwrap();
    let commits = source
        .commit_changes(&[first.to_string(), second.to_string()])
        .unwrap();

    assert_eq!(commits.len(), 2);
    assert_eq!(commits[0].subject, "Add a");
    assert_eq!(commits[0].changes.len(), 1);
    assert_eq!(commits[0].changes[0].change_type(), ChangeType::Added);
    assert_eq!(commits[1].subject, "Update a");
    assert_eq!(commits[1].message, "Update a\n\nLonger body");
    assert_eq!(commits[1].changes.len(), 2);

    let ignore = PathMatcher::parse_all(&["*.lock"]).unwrap();
    let simplifier = DiffSimplifier::new(GitPatchBuilder::new(), source.base_path());
    let prompt = simplifier.commit_prompt(&commits, &ignore).unwrap().unwrap();

    assert_eq!(prompt.summaries, vec!["\"Add a\"", "\"Update a\""]);
    assert!(prompt.diff.starts_with("Commit Message: Add a\n\nCode Changes:\n\n"));
    assert!(prompt.diff.contains("new file a.txt\n+first"));
    assert!(prompt.diff.contains("Commit Message: Update a\n\nLonger body\n\nCode Changes:"));
    assert!(prompt.diff.contains("-first\n+second"));
    assert!(!prompt.diff.contains("yarn.lock"));
}

#[test]
fn test_commit_prompt_without_surviving_changes() {
    let commit = CommitDetail {
        id: "abc".to_string(),
        subject: "Bump lockfile".to_string(),
        message: "Bump lockfile".to_string(),
        changes: vec![Change::modified("Cargo.lock", "a", "b")],
    };
    let ignore = PathMatcher::parse_all(&["glob:*.lock"]).unwrap();
    assert_eq!(simplifier().commit_prompt(&[commit], &ignore).unwrap(), None);
}

#[test]
fn test_unknown_revision_is_construction_error() {
    let (temp_dir, repo) = create_temp_repo();
    write_file(temp_dir.path(), "a.txt", "x\n");
    commit_all(&repo, "Add a");

    let source = GitChangeSource::open(temp_dir.path()).unwrap();
    let err = source
        .commit_changes(&["does-not-exist".to_string()])
        .unwrap_err();
    assert!(err.is_construction());
}

#[test]
fn test_pending_changes_do_not_load_large_files() {
    let (temp_dir, repo) = create_temp_repo();
    let root = temp_dir.path();
    write_file(root, "readme.txt", "hi\n");
    commit_all(&repo, "Initial commit");

    write_file(root, "build/output.log", &"log line\n".repeat(100));

    let source = GitChangeSource::open(root).unwrap().with_size_limit(64);
    let changes = source.pending_changes().unwrap();
    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, "build/output.log");
    assert_eq!(changes[0].size_bytes, 900);
    assert_eq!(changes[0].after.as_deref(), Some(""));

    let policy = ChangePolicy {
        large_file_threshold_bytes: 64,
        ..ChangePolicy::default()
    };
    let simplifier =
        DiffSimplifier::new(GitPatchBuilder::new(), source.base_path()).with_policy(policy);
    assert_eq!(simplifier.simplify(&changes, &[]).unwrap(), "");
}

#[test]
fn test_commit_with_submodule_entry() {
    let (temp_dir, repo) = create_temp_repo();
    let root = temp_dir.path();
    write_file(root, "a.txt", "x\n");
    let first = commit_all(&repo, "Add a");

    let head = repo.head().unwrap().peel_to_commit().unwrap();
    let mut builder = repo.treebuilder(Some(&head.tree().unwrap())).unwrap();
    builder.insert("vendor", first, 0o160000).unwrap();
    let tree = repo.find_tree(builder.write().unwrap()).unwrap();
    let sig = Signature::now("Test User", "test@example.com").unwrap();
    let second = repo
        .commit(Some("HEAD"), &sig, &sig, "Add vendor submodule", &tree, &[&head])
        .unwrap();

    let source = GitChangeSource::open(root).unwrap();
    let commits = source.commit_changes(&[second.to_string()]).unwrap();
    assert_eq!(commits[0].changes.len(), 1);

    let change = &commits[0].changes[0];
    let expected = format!("Subproject commit {}\n", first);
    assert_eq!(change.path, "vendor");
    assert_eq!(change.change_type(), ChangeType::Added);
    assert_eq!(change.after.as_deref(), Some(expected.as_str()));

    let simplifier = DiffSimplifier::new(GitPatchBuilder::new(), source.base_path());
    let prompt = simplifier.commit_prompt(&commits, &[]).unwrap().unwrap();
    assert!(prompt.diff.contains(&format!("new file vendor\n+Subproject commit {}", first)));
}

impl DiffSimplifier<CountingBuilder> {
    fn builder_calls(&self) -> usize {
        self.builder().calls.get()
    }

    fn builder_seen(&self) -> usize {
        self.builder().seen.get()
    }
}
