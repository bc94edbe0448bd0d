//! # Namespaces and Accounts
//!
//! A namespace (bucket) is a named container of objects owned by one account.
//!
//! ## Naming rules
//!
//! | Rule | Description |
//! |------|-------------|
//! | Length | 3 to 63 bytes |
//! | Charset | `a-z`, `0-9`, `.`, `-` |
//! | Edges | must not start or end with `.` or `-` |
//! | Dots | no `..` sequence |
//! | Shape | must not look like an IPv4 address |

use std::fmt;
use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::errors::ProbeError;

/// Minimum namespace name length.
pub const MIN_NAMESPACE_LEN: usize = 3;

/// Maximum namespace name length.
pub const MAX_NAMESPACE_LEN: usize = 63;

/// A namespace name that passed the network naming rules.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NamespaceName(String);

impl NamespaceName {
    /// Validate and wrap a namespace name.
    pub fn parse(name: &str) -> Result<Self, ProbeError> {
        let reject = |reason| {
            Err(ProbeError::InvalidName {
                name: name.to_string(),
                reason,
            })
        };

        if name.len() < MIN_NAMESPACE_LEN {
            return reject("shorter than 3 characters");
        }
        if name.len() > MAX_NAMESPACE_LEN {
            return reject("longer than 63 characters");
        }
        if !name
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'.' || b == b'-')
        {
            return reject("only lowercase letters, digits, '.' and '-' are allowed");
        }
        let first = name.as_bytes()[0];
        let last = name.as_bytes()[name.len() - 1];
        if matches!(first, b'.' | b'-') || matches!(last, b'.' | b'-') {
            return reject("must start and end with a letter or digit");
        }
        if name.contains("..") {
            return reject("must not contain consecutive dots");
        }
        if name.parse::<Ipv4Addr>().is_ok() {
            return reject("must not be formatted as an IP address");
        }

        Ok(Self(name.to_string()))
    }

    /// The validated name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for NamespaceName {
    type Error = ProbeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<NamespaceName> for String {
    fn from(value: NamespaceName) -> Self {
        value.0
    }
}

/// Public key of the account that owns the namespace.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub [u8; 32]);

impl AccountId {
    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// `0x`-prefixed hex form used on the wire.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountId({}..)", &hex::encode(self.0)[..8])
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
