//! Sync record codec (C1).
//!
//! Sync bytes are the exact content of a `CVS/Entries` line minus its
//! leading kind character (`/` for a file, `D` for a folder): five
//! `/`-separated fields, `name/revision/timestamp/keyword-mode/tag`. A
//! folder's own entry in its parent always carries an empty revision
//! field; that is the sole signal `is_folder` is derived from.

use crate::error::SyncError;

pub const ADDED_REVISION: &str = "0";

/// Lossless, mutable decoding of one Entries line. Round-trips through
/// [`encode`] byte-for-byte because every field — including the raw
/// keyword-mode and tag text — is preserved verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutableResourceSync {
    pub name: String,
    pub revision: String,
    pub timestamp: String,
    /// Raw keyword-mode field text (e.g. `""`, `"-kb"`, `"-kkv"`).
    pub keyword_mode: String,
    /// Raw tag field text, including its marker prefix (`T`, `N`, or `D`).
    pub tag: String,
}

impl MutableResourceSync {
    pub fn new(name: impl Into<String>) -> Self {
        MutableResourceSync {
            name: name.into(),
            revision: ADDED_REVISION.to_string(),
            timestamp: String::new(),
            keyword_mode: String::new(),
            tag: String::new(),
        }
    }
}

/// Sync bytes: the canonical, bit-identical transport/storage form.
pub type SyncBytes = Vec<u8>;

fn split_fields(bytes: &[u8]) -> std::result::Result<[&[u8]; 5], SyncError> {
    let mut fields: Vec<&[u8]> = bytes.splitn(5, |b| *b == b'/').collect();
    if fields.len() != 5 {
        return Err(SyncError::MalformedSyncRecord {
            offset: bytes.len(),
            reason: format!("expected 5 fields, found {}", fields.len()),
        });
    }
    // splitn never shrinks below requested, but guard defensively.
    while fields.len() < 5 {
        fields.push(&[]);
    }
    Ok([fields[0], fields[1], fields[2], fields[3], fields[4]])
}

fn field_str(field: &[u8]) -> std::result::Result<&str, SyncError> {
    std::str::from_utf8(field).map_err(|_| SyncError::MalformedSyncRecord {
        offset: 0,
        reason: "non-UTF8 field".to_string(),
    })
}

/// Decode sync bytes into their mutable, lossless representation.
///
/// On malformed input the error carries the byte offset of the failure;
/// callers are expected to log and fall back to [`sentinel`].
pub fn decode(bytes: &[u8]) -> std::result::Result<MutableResourceSync, SyncError> {
    let [name, revision, timestamp, keyword_mode, tag] = split_fields(bytes)?;
    Ok(MutableResourceSync {
        name: field_str(name)?.to_string(),
        revision: field_str(revision)?.to_string(),
        timestamp: field_str(timestamp)?.to_string(),
        keyword_mode: field_str(keyword_mode)?.to_string(),
        tag: field_str(tag)?.to_string(),
    })
}

/// A sentinel record substituted when decoding fails: a fresh addition
/// with an empty name, per the "codec errors never abort" policy.
pub fn sentinel() -> MutableResourceSync {
    MutableResourceSync::new(String::new())
}

/// Encode a mutable record back to sync bytes. `encode(decode(b)) == b`
/// holds for any `b` that decoded successfully.
pub fn encode(info: &MutableResourceSync) -> SyncBytes {
    format!(
        "{}/{}/{}/{}/{}",
        info.name, info.revision, info.timestamp, info.keyword_mode, info.tag
    )
    .into_bytes()
}

pub fn name_of(bytes: &[u8]) -> std::result::Result<String, SyncError> {
    Ok(field_str(split_fields(bytes)?[0])?.to_string())
}

pub fn revision_of(bytes: &[u8]) -> std::result::Result<String, SyncError> {
    Ok(field_str(split_fields(bytes)?[1])?.to_string())
}

pub fn timestamp_of(bytes: &[u8]) -> std::result::Result<Option<String>, SyncError> {
    let ts = field_str(split_fields(bytes)?[2])?;
    Ok(if ts.is_empty() {
        None
    } else {
        Some(ts.to_string())
    })
}

pub fn keyword_mode_of(bytes: &[u8]) -> std::result::Result<String, SyncError> {
    Ok(field_str(split_fields(bytes)?[3])?.to_string())
}

/// Logical tag name with its marker prefix stripped, or `None` if unset.
pub fn tag_of(bytes: &[u8]) -> std::result::Result<Option<String>, SyncError> {
    let raw = field_str(split_fields(bytes)?[4])?;
    if raw.is_empty() {
        Ok(None)
    } else {
        Ok(Some(raw[1..].to_string()))
    }
}

pub fn is_addition(bytes: &[u8]) -> bool {
    revision_of(bytes)
        .map(|r| r == ADDED_REVISION)
        .unwrap_or(false)
}

pub fn is_deletion(bytes: &[u8]) -> bool {
    revision_of(bytes)
        .map(|r| r.starts_with('-'))
        .unwrap_or(false)
}

/// A resource's own entry is a folder entry exactly when its revision
/// field is empty.
pub fn is_folder(bytes: &[u8]) -> bool {
    revision_of(bytes).map(|r| r.is_empty()).unwrap_or(false)
}

/// Prefix the revision with `-`, marking the record as deleted. A no-op
/// if already a deletion.
pub fn convert_to_deletion(bytes: &[u8]) -> std::result::Result<SyncBytes, SyncError> {
    let mut info = decode(bytes)?;
    if !info.revision.starts_with('-') {
        info.revision = format!("-{}", info.revision);
    }
    Ok(encode(&info))
}

/// Strip a leading `-` from the revision, if present.
pub fn convert_from_deletion(bytes: &[u8]) -> std::result::Result<SyncBytes, SyncError> {
    let mut info = decode(bytes)?;
    if let Some(stripped) = info.revision.strip_prefix('-') {
        info.revision = stripped.to_string();
    }
    Ok(encode(&info))
}

pub fn set_revision(bytes: &[u8], revision: &str) -> std::result::Result<SyncBytes, SyncError> {
    let mut info = decode(bytes)?;
    info.revision = revision.to_string();
    Ok(encode(&info))
}

/// Build the folder-entry form of an Entries line for `name`: an empty
/// revision marks it as a folder per [`is_folder`].
pub fn folder_entry_bytes(name: &str) -> SyncBytes {
    encode(&MutableResourceSync {
        name: name.to_string(),
        revision: String::new(),
        timestamp: String::new(),
        keyword_mode: String::new(),
        tag: String::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_well_formed_file_line() {
        let line = b"f.txt/1.1/Thu Jan  1 00:00:00 1970//";
        let decoded = decode(line).unwrap();
        assert_eq!(encode(&decoded), line);
    }

    #[test]
    fn round_trips_a_tagged_binary_file() {
        let line = b"image.png/1.4//-kb/Tmy-branch";
        let decoded = decode(line).unwrap();
        assert_eq!(encode(&decoded), line);
        assert_eq!(tag_of(line).unwrap(), Some("my-branch".to_string()));
        assert_eq!(keyword_mode_of(line).unwrap(), "-kb");
    }

    #[test]
    fn round_trips_a_folder_entry() {
        let line = folder_entry_bytes("sub");
        assert!(is_folder(&line));
        let decoded = decode(&line).unwrap();
        assert_eq!(encode(&decoded), line);
    }

    #[test]
    fn added_revision_is_addition() {
        let line = b"new.txt/0///";
        assert!(is_addition(line));
        assert!(!is_deletion(line));
        assert!(!is_folder(line));
    }

    #[test]
    fn deletion_round_trip() {
        let line = b"f.txt/1.2///";
        let deleted = convert_to_deletion(line).unwrap();
        assert!(is_deletion(&deleted));
        let restored = convert_from_deletion(&deleted).unwrap();
        assert_eq!(restored, line);
    }

    #[test]
    fn malformed_record_reports_offset() {
        let line = b"not-enough-fields";
        let err = decode(line).unwrap_err();
        match err {
            SyncError::MalformedSyncRecord { offset, .. } => assert_eq!(offset, line.len()),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn set_revision_replaces_only_that_field() {
        let line = b"f.txt/1.1/ts/-kb/Tbranch";
        let updated = set_revision(line, "1.2").unwrap();
        assert_eq!(revision_of(&updated).unwrap(), "1.2");
        assert_eq!(tag_of(&updated).unwrap(), Some("branch".to_string()));
    }
}
