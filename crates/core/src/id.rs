//! File identifiers and the lexical filter applied to incoming handles.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of a rendered file identifier in hex characters.
const ID_LEN: usize = 32;

/// Validated handle for a stored file: exactly 32 lowercase hex characters,
/// derived from the internal storage name at upload time.
///
/// A `FileId` can only be obtained by parsing a well-formed string or by
/// deriving one from a storage name, so every value in circulation is known
/// to have the canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Parse a candidate identifier, accepting only the canonical shape.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let well_formed = raw.len() == ID_LEN
            && raw
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        well_formed.then(|| Self(raw.to_owned()))
    }

    /// Derive the identifier for a storage file name.
    ///
    /// The id is the first 32 hex characters of the SHA-256 digest of the
    /// name. Storage names are unique per upload, so ids inherit that
    /// uniqueness.
    #[must_use]
    pub fn from_storage_name(file: &str) -> Self {
        let digest = Sha256::digest(file.as_bytes());
        let mut rendered = hex::encode(digest);
        rendered.truncate(ID_LEN);
        Self(rendered)
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Filter a sequence of candidate identifiers down to the valid, distinct set.
///
/// Each candidate must match the canonical shape exactly; no trimming or
/// other normalization is applied. Malformed candidates are dropped
/// silently and duplicates collapse to a single entry. Order is not
/// preserved. An empty result is a normal outcome meaning there is nothing
/// to resolve.
#[must_use]
pub fn filter_ids<'a, I>(candidates: I) -> Vec<FileId>
where
    I: IntoIterator<Item = &'a str>,
{
    let set: HashSet<FileId> = candidates
        .into_iter()
        .filter_map(FileId::parse)
        .collect();
    set.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_canonical_shape() {
        let id = "0123456789abcdef0123456789abcdef";
        assert_eq!(FileId::parse(id).unwrap().as_str(), id);
    }

    #[test]
    fn parse_rejects_bad_shapes() {
        assert!(FileId::parse("not-32-hex").is_none());
        assert!(FileId::parse("").is_none());
        // Uppercase hex is not canonical.
        assert!(FileId::parse("0123456789ABCDEF0123456789ABCDEF").is_none());
        // 31 and 33 chars.
        assert!(FileId::parse("0123456789abcdef0123456789abcde").is_none());
        assert!(FileId::parse("0123456789abcdef0123456789abcdef0").is_none());
        // Non-hex letter.
        assert!(FileId::parse("g123456789abcdef0123456789abcdef").is_none());
    }

    #[test]
    fn derived_ids_are_canonical_and_stable() {
        let a = FileId::from_storage_name("0191a0b0c0d0_report.pdf");
        let b = FileId::from_storage_name("0191a0b0c0d0_report.pdf");
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 32);
        assert!(FileId::parse(a.as_str()).is_some());

        let other = FileId::from_storage_name("0191a0b0c0d1_report.pdf");
        assert_ne!(a, other);
    }

    #[test]
    fn filter_keeps_only_valid_input_ids() {
        let valid = "0123456789abcdef0123456789abcdef";
        let ids = filter_ids(vec![valid, "nope", "", "0123"]);
        assert_eq!(ids.len(), 1);
        assert_eq!(ids[0].as_str(), valid);
    }

    #[test]
    fn filter_deduplicates() {
        let valid = "0123456789abcdef0123456789abcdef";
        let ids = filter_ids(vec![valid, valid, valid]);
        assert_eq!(ids.len(), 1);
    }

    #[test]
    fn filter_of_garbage_is_empty() {
        assert!(filter_ids(vec!["x", "y"]).is_empty());
        assert!(filter_ids(Vec::<&str>::new()).is_empty());
    }

    #[test]
    fn filter_drops_padded_candidates() {
        let valid = "0123456789abcdef0123456789abcdef";
        let padded = format!(" {valid} ");
        let trailing = format!("{valid}\n");
        assert!(filter_ids(vec![padded.as_str(), trailing.as_str()]).is_empty());
    }
}
