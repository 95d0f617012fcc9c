//! Type definitions for change and patch processing

/// A single file change supplied by a change source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    /// Path after the change, or the removed path for deletions
    pub path: String,
    /// Path before the change when the file was renamed
    pub previous_path: Option<String>,
    /// Content before the change, absent for added files
    pub before: Option<String>,
    /// Content after the change, absent for deleted files
    pub after: Option<String>,
    pub is_binary: bool,
    pub size_bytes: u64,
}

impl Change {
    pub fn added(path: impl Into<String>, after: impl Into<String>) -> Self {
        let after = after.into();
        Self {
            path: path.into(),
            previous_path: None,
            size_bytes: after.len() as u64,
            before: None,
            after: Some(after),
            is_binary: false,
        }
    }

    pub fn deleted(path: impl Into<String>, before: impl Into<String>) -> Self {
        let before = before.into();
        Self {
            path: path.into(),
            previous_path: None,
            size_bytes: before.len() as u64,
            before: Some(before),
            after: None,
            is_binary: false,
        }
    }

    pub fn modified(
        path: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
    ) -> Self {
        let after = after.into();
        Self {
            path: path.into(),
            previous_path: None,
            size_bytes: after.len() as u64,
            before: Some(before.into()),
            after: Some(after),
            is_binary: false,
        }
    }

    /// Path of the file after the change; `None` for deletions
    pub fn after_path(&self) -> Option<&str> {
        self.after.as_ref().map(|_| self.path.as_str())
    }

    /// Path of the file before the change; `None` for additions
    pub fn before_path(&self) -> Option<&str> {
        self.before
            .as_ref()
            .map(|_| self.previous_path.as_deref().unwrap_or(&self.path))
    }

    pub fn change_type(&self) -> ChangeType {
        match (&self.before, &self.after) {
            (None, _) => ChangeType::Added,
            (_, None) => ChangeType::Deleted,
            _ if self.previous_path.is_some() => ChangeType::Renamed,
            _ => ChangeType::Modified,
        }
    }
}

/// Type of change derived from the before/after contents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeType {
    Added,
    Deleted,
    Modified,
    Renamed,
}

impl ChangeType {
    pub fn as_str(&self) -> &str {
        match self {
            ChangeType::Added => "added",
            ChangeType::Deleted => "deleted",
            ChangeType::Modified => "modified",
            ChangeType::Renamed => "renamed",
        }
    }
}

/// One hunk of a unified diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    /// `@@ -a,b +c,d @@` header, possibly followed by section context
    pub header: String,
    /// Body lines with their ` `, `+` or `-` prefix
    pub lines: Vec<String>,
}

/// Unified diff of a single file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffPatch {
    pub before_path: Option<String>,
    pub after_path: Option<String>,
    /// Revision label written after the `---` header
    pub before_revision: Option<String>,
    /// Timestamp label (milliseconds) written after the `+++` header
    pub after_timestamp: Option<i64>,
    pub hunks: Vec<Hunk>,
}

impl DiffPatch {
    pub fn is_new_file(&self) -> bool {
        self.before_path.is_none() && self.after_path.is_some()
    }

    pub fn is_deleted_file(&self) -> bool {
        self.before_path.is_some() && self.after_path.is_none()
    }

    /// Path used for the `Index:` banner
    pub fn display_path(&self) -> &str {
        self.after_path
            .as_deref()
            .or(self.before_path.as_deref())
            .unwrap_or("unknown")
    }
}

/// One commit and the changes it introduced
#[derive(Debug, Clone)]
pub struct CommitDetail {
    pub id: String,
    /// First line of the message
    pub subject: String,
    pub message: String,
    pub changes: Vec<Change>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_type_strings() {
        assert_eq!(ChangeType::Added.as_str(), "added");
        assert_eq!(ChangeType::Deleted.as_str(), "deleted");
        assert_eq!(ChangeType::Modified.as_str(), "modified");
        assert_eq!(ChangeType::Renamed.as_str(), "renamed");
    }

    #[test]
    fn test_change_paths() {
        let added = Change::added("src/new.rs", "fn main() {}\n");
        assert_eq!(added.change_type(), ChangeType::Added);
        assert_eq!(added.after_path(), Some("src/new.rs"));
        assert_eq!(added.before_path(), None);
        assert_eq!(added.size_bytes, 13);

        let deleted = Change::deleted("old.txt", "bye\n");
        assert_eq!(deleted.change_type(), ChangeType::Deleted);
        assert_eq!(deleted.after_path(), None);
        assert_eq!(deleted.before_path(), Some("old.txt"));

        let mut renamed = Change::modified("b.txt", "x\n", "x\n");
        renamed.previous_path = Some("a.txt".to_string());
        assert_eq!(renamed.change_type(), ChangeType::Renamed);
        assert_eq!(renamed.before_path(), Some("a.txt"));
        assert_eq!(renamed.after_path(), Some("b.txt"));
    }
}
