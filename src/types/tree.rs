use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

/// One path record from a repository's recursive listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Slash-separated, relative to the repository root.
    pub path: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn file(path: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: None,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Directory segments leading to the entry, excluding the file name.
    pub fn parent_segments(&self) -> impl Iterator<Item = &str> {
        let mut segments: Vec<&str> = self.path.split('/').collect();
        segments.pop();
        segments.into_iter()
    }

    pub fn depth(&self) -> usize {
        self.path.matches('/').count()
    }
}
