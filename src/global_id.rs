//! Relay global object identification
//!
//! A global ID is the base64 encoding of `"{type_name}:{local_id}"`. Clients
//! must treat it as opaque; only [`to_global_id`] and [`from_global_id`] may
//! build or read one.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

const GLOBAL_ID_DELIMITER: char = ':';

/// The `(type, id)` pair recovered from a global ID.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedGlobalId {
    /// Name of the GraphQL type the ID belongs to. Empty when the ID could not be decoded.
    pub type_name: String,
    /// Type-local identifier.
    pub id: String,
}

impl ResolvedGlobalId {
    /// An empty type name marks an ID that cannot be resolved.
    pub fn is_resolvable(&self) -> bool {
        !self.type_name.is_empty()
    }
}

/// Build a global ID from a type name and a type-local identifier
pub fn to_global_id(type_name: &str, local_id: impl Display) -> String {
    BASE64.encode(format!("{type_name}{GLOBAL_ID_DELIMITER}{local_id}"))
}

/// Decode a global ID.
///
/// Never fails: malformed input yields an empty [`ResolvedGlobalId`], which
/// callers treat as "unresolvable".
pub fn from_global_id(global_id: &str) -> ResolvedGlobalId {
    try_from_global_id(global_id).unwrap_or_else(|err| {
        tracing::trace!(global_id, error = %err, "unresolvable global id");
        ResolvedGlobalId::default()
    })
}

/// Decode a global ID, reporting why decoding failed.
pub fn try_from_global_id(global_id: &str) -> crate::Result<ResolvedGlobalId> {
    let bytes = BASE64
        .decode(global_id.as_bytes())
        .map_err(|e| crate::RelayError::InvalidGlobalId(e.to_string()))?;
    let raw = String::from_utf8(bytes)
        .map_err(|e| crate::RelayError::InvalidGlobalId(e.to_string()))?;

    let (type_name, id) = raw.split_once(GLOBAL_ID_DELIMITER).ok_or_else(|| {
        crate::RelayError::InvalidGlobalId(format!("missing '{GLOBAL_ID_DELIMITER}' delimiter"))
    })?;

    Ok(ResolvedGlobalId {
        type_name: type_name.to_string(),
        id: id.to_string(),
    })
}
