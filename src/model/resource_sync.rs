//! Typed, semantic view over a resource's sync bytes.

use crate::codec::{self, SyncBytes};
use crate::error::SyncError;
use crate::model::tag::Tag;

/// Keyword substitution mode, parsed from the raw Entries keyword field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum KeywordMode {
    /// Default text substitution (empty field).
    #[default]
    Text,
    /// `-kb`: binary, no keyword substitution.
    Binary,
    /// Any other `-k...` flag, preserved verbatim.
    Custom(String),
}

impl KeywordMode {
    pub fn parse(field: &str) -> Self {
        match field {
            "" => KeywordMode::Text,
            "-kb" => KeywordMode::Binary,
            other => KeywordMode::Custom(other.to_string()),
        }
    }

    pub fn as_field(&self) -> &str {
        match self {
            KeywordMode::Text => "",
            KeywordMode::Binary => "-kb",
            KeywordMode::Custom(s) => s,
        }
    }
}

/// Semantic view of one resource's sync record, decoded from [`SyncBytes`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceSync {
    pub name: String,
    pub revision: String,
    pub keyword_mode: KeywordMode,
    pub tag: Option<Tag>,
    pub timestamp: Option<String>,
}

impl ResourceSync {
    pub fn is_addition(&self) -> bool {
        self.revision == codec::ADDED_REVISION
    }

    pub fn is_deletion(&self) -> bool {
        self.revision.starts_with('-')
    }

    pub fn is_folder(&self) -> bool {
        self.revision.is_empty()
    }

    pub fn decode(bytes: &SyncBytes) -> std::result::Result<Self, SyncError> {
        let mutable = codec::decode(bytes)?;
        Ok(ResourceSync {
            name: mutable.name,
            revision: mutable.revision,
            keyword_mode: KeywordMode::parse(&mutable.keyword_mode),
            tag: Tag::parse(&mutable.tag),
            timestamp: if mutable.timestamp.is_empty() {
                None
            } else {
                Some(mutable.timestamp)
            },
        })
    }

    /// Decode, substituting the addition sentinel on malformed input
    /// rather than propagating the error (§7 codec error policy).
    pub fn decode_lenient(bytes: &SyncBytes) -> Self {
        Self::decode(bytes).unwrap_or_else(|_| ResourceSync {
            name: String::new(),
            revision: codec::ADDED_REVISION.to_string(),
            keyword_mode: KeywordMode::Text,
            tag: None,
            timestamp: None,
        })
    }

    pub fn to_bytes(&self) -> SyncBytes {
        let tag_field = match &self.tag {
            Some(t) => t.render(),
            None => String::new(),
        };
        codec::encode(&crate::codec::MutableResourceSync {
            name: self.name.clone(),
            revision: self.revision.clone(),
            timestamp: self.timestamp.clone().unwrap_or_default(),
            keyword_mode: self.keyword_mode.as_field().to_string(),
            tag: tag_field,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_typed_view() {
        let bytes = b"f.txt/1.3/ts/-kb/Tbranch".to_vec();
        let info = ResourceSync::decode(&bytes).unwrap();
        assert_eq!(info.tag, Some(Tag::sticky("branch")));
        assert_eq!(info.keyword_mode, KeywordMode::Binary);
        assert_eq!(info.to_bytes(), bytes);
    }

    #[test]
    fn preserves_a_branch_tag_marker_through_round_trip() {
        let bytes = b"f.txt/1.3/ts//Nbranch-1".to_vec();
        let info = ResourceSync::decode(&bytes).unwrap();
        assert_eq!(info.tag, Some(Tag::branch("branch-1")));
        assert_eq!(info.to_bytes(), bytes);
    }

    #[test]
    fn preserves_a_date_tag_marker_through_round_trip() {
        let bytes = b"f.txt/1.3/ts//Dyesterday".to_vec();
        let info = ResourceSync::decode(&bytes).unwrap();
        assert_eq!(info.tag, Some(Tag::date("yesterday")));
        assert_eq!(info.to_bytes(), bytes);
    }

    #[test]
    fn decode_lenient_substitutes_sentinel() {
        let info = ResourceSync::decode_lenient(&b"garbage".to_vec());
        assert!(info.is_addition());
    }
}
