//! Resource identifiers: logical paths plus a kind, compared by value.
//!
//! The workspace tree is never modeled as linked nodes with parent pointers
//! (see the "cyclic parent links" design note) — a [`Resource`] is a cheap,
//! cloneable value and ancestor walks simply strip path segments.

use std::fmt;
use std::path::{Path, PathBuf};

/// What a [`Resource`] represents in the workspace tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    File,
    Folder,
    /// A top-level CVS-managed folder directly under the workspace root.
    Project,
    /// The ceiling of the tree. Never carries sync info of its own.
    WorkspaceRoot,
}

impl ResourceKind {
    pub fn is_folder_like(self) -> bool {
        matches!(
            self,
            ResourceKind::Folder | ResourceKind::Project | ResourceKind::WorkspaceRoot
        )
    }

    pub fn is_root(self) -> bool {
        matches!(self, ResourceKind::WorkspaceRoot)
    }
}

/// A logical path (relative to the workspace root) plus its kind.
///
/// Two `Resource`s are equal iff their paths are equal; `kind` is metadata
/// about the path, not part of its identity, since a given path can only
/// ever name one kind of thing at a time in a real filesystem.
#[derive(Debug, Clone)]
pub struct Resource {
    path: PathBuf,
    kind: ResourceKind,
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        self.path == other.path
    }
}
impl Eq for Resource {}

impl std::hash::Hash for Resource {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.path.hash(state);
    }
}

impl Resource {
    pub fn workspace_root() -> Self {
        Resource {
            path: PathBuf::new(),
            kind: ResourceKind::WorkspaceRoot,
        }
    }

    pub fn project(path: impl Into<PathBuf>) -> Self {
        Resource {
            path: path.into(),
            kind: ResourceKind::Project,
        }
    }

    pub fn folder(path: impl Into<PathBuf>) -> Self {
        Resource {
            path: path.into(),
            kind: ResourceKind::Folder,
        }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Resource {
            path: path.into(),
            kind: ResourceKind::File,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn is_root(&self) -> bool {
        self.kind.is_root()
    }

    pub fn is_project(&self) -> bool {
        matches!(self.kind, ResourceKind::Project)
    }

    /// The leaf name of this resource, empty for the workspace root.
    pub fn name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("")
    }

    /// Parent folder resource, or `None` if this resource is the workspace root.
    pub fn parent(&self) -> Option<Resource> {
        if self.is_root() {
            return None;
        }
        let parent_path = self.path.parent().unwrap_or(Path::new(""));
        let kind = if parent_path.as_os_str().is_empty() {
            ResourceKind::WorkspaceRoot
        } else if parent_path.parent().map(|p| p.as_os_str().is_empty()) == Some(true) {
            ResourceKind::Project
        } else {
            ResourceKind::Folder
        };
        Some(Resource {
            path: parent_path.to_path_buf(),
            kind,
        })
    }

    pub fn child_file(&self, name: &str) -> Resource {
        Resource::file(self.path.join(name))
    }

    pub fn child_folder(&self, name: &str) -> Resource {
        Resource::folder(self.path.join(name))
    }

    /// Depth from the workspace root (root is 0, a project is 1, ...).
    pub fn depth(&self) -> usize {
        self.path.components().count()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            write!(f, "<workspace-root>")
        } else {
            write!(f, "{}", self.path.display())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parent_of_project_is_root() {
        let p = Resource::project("a");
        let parent = p.parent().unwrap();
        assert!(parent.is_root());
    }

    #[test]
    fn parent_of_nested_file_is_folder() {
        let f = Resource::file("a/b/c.txt");
        let parent = f.parent().unwrap();
        assert_eq!(parent.kind(), ResourceKind::Folder);
        assert_eq!(parent.path(), Path::new("a/b"));
    }

    #[test]
    fn root_has_no_parent() {
        assert!(Resource::workspace_root().parent().is_none());
    }

    #[test]
    fn name_is_leaf_segment() {
        let f = Resource::file("a/b/c.txt");
        assert_eq!(f.name(), "c.txt");
    }
}
