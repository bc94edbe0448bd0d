//! # Content Identifiers
//!
//! The network assigns a textual identifier (FID) to every uploaded payload.
//! Namespace listings report objects as fixed-width 64-byte hashes, so the
//! replication check compares fixed-width forms.
//!
//! ## Width rule
//!
//! [`FileHash::from_identifier`] copies the identifier's bytes into a
//! [`FILE_HASH_LEN`]-byte array:
//!
//! - longer identifiers are truncated to the first `FILE_HASH_LEN` bytes
//! - shorter identifiers are zero-filled, so only their leading bytes take part
//!
//! [`IdentifierMatch::FullLength`] opts out of the rule and compares the full
//! textual identifiers instead.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Width of a file hash as stored by the network.
pub const FILE_HASH_LEN: usize = 64;

/// Network-issued identifier of a stored payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentIdentifier(String);

impl ContentIdentifier {
    /// Wrap a textual identifier.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Textual form.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fixed-width form used by namespace listings.
    pub fn to_file_hash(&self) -> FileHash {
        FileHash::from_identifier(&self.0)
    }
}

impl fmt::Display for ContentIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ContentIdentifier {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Fixed-width identifier representation.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileHash([u8; FILE_HASH_LEN]);

impl FileHash {
    /// Build from text, truncating or zero-filling to [`FILE_HASH_LEN`] bytes.
    pub fn from_identifier(text: &str) -> Self {
        Self::from_slice(text.as_bytes())
    }

    /// Build from raw bytes with the same width rule.
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut out = [0u8; FILE_HASH_LEN];
        let n = bytes.len().min(FILE_HASH_LEN);
        out[..n].copy_from_slice(&bytes[..n]);
        Self(out)
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; FILE_HASH_LEN] {
        &self.0
    }
}

impl fmt::Debug for FileHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = self.0.iter().position(|b| *b == 0).unwrap_or(FILE_HASH_LEN);
        write!(f, "FileHash({})", String::from_utf8_lossy(&self.0[..end]))
    }
}

/// How the replication check decides that a listed object is the uploaded one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdentifierMatch {
    /// Compare [`FileHash`] forms byte by byte.
    #[default]
    FixedWidth,
    /// Compare the complete textual identifiers.
    FullLength,
}

impl IdentifierMatch {
    /// Does `listed` denote the same object as `target`?
    pub fn matches(&self, target: &ContentIdentifier, listed: &ContentIdentifier) -> bool {
        match self {
            IdentifierMatch::FixedWidth => target.to_file_hash() == listed.to_file_hash(),
            IdentifierMatch::FullLength => target == listed,
        }
    }

    /// Does the namespace listing contain `target`?
    pub fn contains(&self, objects: &[ContentIdentifier], target: &ContentIdentifier) -> bool {
        match self {
            IdentifierMatch::FixedWidth => {
                let wanted = target.to_file_hash();
                objects.iter().any(|o| o.to_file_hash() == wanted)
            }
            IdentifierMatch::FullLength => objects.iter().any(|o| o == target),
        }
    }
}

impl std::str::FromStr for IdentifierMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fixed-width" => Ok(IdentifierMatch::FixedWidth),
            "full-length" => Ok(IdentifierMatch::FullLength),
            other => Err(format!(
                "unknown identifier match mode {other:?} (expected fixed-width or full-length)"
            )),
        }
    }
}
