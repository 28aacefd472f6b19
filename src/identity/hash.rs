use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Hex SHA-256 of a raw matricule. This is the key the attendance service
/// files employee records under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OpaqueId(String);

impl OpaqueId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OpaqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unsalted SHA-256 over the UTF-8 bytes, lower-case hex.
pub fn hash_identity(raw: &str) -> OpaqueId {
    let digest = Sha256::digest(raw.as_bytes());
    OpaqueId(hex::encode(digest))
}
