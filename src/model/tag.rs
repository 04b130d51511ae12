//! Sticky-tag marker: CVS distinguishes a sticky tag/version (`T`), a
//! sticky branch (`N`), and a sticky date (`D`) in the same field.
//! Losing the marker on round-trip turns a branch or date into a plain
//! tag, so it is carried alongside the text rather than stripped.

/// Which marker prefixed a tag field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// `T`: a sticky tag (a version or fixed revision).
    Sticky,
    /// `N`: a sticky branch.
    Branch,
    /// `D`: a sticky date.
    Date,
}

impl TagKind {
    fn marker(self) -> char {
        match self {
            TagKind::Sticky => 'T',
            TagKind::Branch => 'N',
            TagKind::Date => 'D',
        }
    }

    fn from_marker(marker: char) -> Option<Self> {
        match marker {
            'T' => Some(TagKind::Sticky),
            'N' => Some(TagKind::Branch),
            'D' => Some(TagKind::Date),
            _ => None,
        }
    }
}

/// A marker-prefixed tag field: `T<name>`, `N<name>`, or `D<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub kind: TagKind,
    pub name: String,
}

impl Tag {
    pub fn sticky(name: impl Into<String>) -> Self {
        Tag {
            kind: TagKind::Sticky,
            name: name.into(),
        }
    }

    pub fn branch(name: impl Into<String>) -> Self {
        Tag {
            kind: TagKind::Branch,
            name: name.into(),
        }
    }

    pub fn date(name: impl Into<String>) -> Self {
        Tag {
            kind: TagKind::Date,
            name: name.into(),
        }
    }

    /// Parse a marker-prefixed field, e.g. `"Tbranch-1"` or `"Dyesterday"`.
    /// `None` if `field` is empty or its first byte isn't a known marker.
    pub fn parse(field: &str) -> Option<Self> {
        let mut chars = field.chars();
        let kind = TagKind::from_marker(chars.next()?)?;
        Some(Tag {
            kind,
            name: chars.as_str().to_string(),
        })
    }

    pub fn render(&self) -> String {
        format!("{}{}", self.kind.marker(), self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_each_marker_kind() {
        for (field, kind) in [
            ("Tbranch-1", TagKind::Sticky),
            ("Nbranch-1", TagKind::Branch),
            ("Dyesterday", TagKind::Date),
        ] {
            let tag = Tag::parse(field).unwrap();
            assert_eq!(tag.kind, kind);
            assert_eq!(tag.render(), field);
        }
    }

    #[test]
    fn rejects_an_unknown_marker() {
        assert!(Tag::parse("Xwhat").is_none());
        assert!(Tag::parse("").is_none());
    }
}
