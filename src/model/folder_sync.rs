//! Per-folder sync record: repository location, tag, and static flag.

use crate::model::tag::Tag;

/// A folder's own CVS configuration. Absence means the folder is not a
/// managed CVS folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderSync {
    pub repository: String,
    pub repository_relative_path: String,
    pub tag: Option<Tag>,
    pub is_static: bool,
}

impl FolderSync {
    pub fn new(repository: impl Into<String>, repository_relative_path: impl Into<String>) -> Self {
        FolderSync {
            repository: repository.into(),
            repository_relative_path: repository_relative_path.into(),
            tag: None,
            is_static: false,
        }
    }

    /// Sets a sticky tag (`T`). Use [`Self::with_branch_tag`] or
    /// [`Self::with_date_tag`] for the other marker kinds.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(Tag::sticky(tag));
        self
    }

    pub fn with_branch_tag(mut self, branch: impl Into<String>) -> Self {
        self.tag = Some(Tag::branch(branch));
        self
    }

    pub fn with_date_tag(mut self, date: impl Into<String>) -> Self {
        self.tag = Some(Tag::date(date));
        self
    }

    pub fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Render the `CVS/Tag` line, e.g. `T<tag>`. `None` means no tag file.
    pub fn tag_line(&self) -> Option<String> {
        self.tag.as_ref().map(|t| t.render())
    }

    /// Parse a `CVS/Tag` line's single marker-prefixed tag field.
    pub fn parse_tag_line(line: &str) -> Option<Tag> {
        let line = line.trim_end_matches(['\n', '\r']);
        if line.len() < 2 {
            return None;
        }
        Tag::parse(line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_line_preserves_the_branch_marker() {
        let info = FolderSync::new("repo", "a").with_branch_tag("feature-x");
        let line = info.tag_line().unwrap();
        assert_eq!(line, "Nfeature-x");
        assert_eq!(FolderSync::parse_tag_line(&line), Some(Tag::branch("feature-x")));
    }

    #[test]
    fn tag_line_preserves_the_date_marker() {
        let info = FolderSync::new("repo", "a").with_date_tag("2024-01-01");
        let line = info.tag_line().unwrap();
        assert_eq!(line, "D2024-01-01");
        assert_eq!(FolderSync::parse_tag_line(&line), Some(Tag::date("2024-01-01")));
    }
}
