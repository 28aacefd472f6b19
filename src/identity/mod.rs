//! Badge payload parsing and the opaque correlation key derived from it.

pub mod extract;
pub mod hash;

pub use extract::extract_matricule;
pub use hash::{hash_identity, OpaqueId};
