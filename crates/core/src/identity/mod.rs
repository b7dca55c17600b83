//! Node identifiers for the solution graph.
//!
//! IDEs treat a changed identifier as a brand-new object, dropping open files,
//! breakpoints and per-project settings. Every node that survives regeneration
//! therefore gets a [`stable_id`] derived from its path; [`fresh_id`] exists
//! only for things that are meant to differ on every run.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a project or folder node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NodeId {
    /// Upper-case hyphenated form, the spelling project files use.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut buf = Uuid::encode_buffer();
        f.write_str(self.0.hyphenated().encode_upper(&mut buf))
    }
}

/// Name-based (UUID v5) identifier for a fully-qualified path.
///
/// Pure: the same path always yields the same id.
pub fn stable_id(path: &Path) -> NodeId {
    let key = path.to_string_lossy();
    NodeId(Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()))
}

/// Random (UUID v4) identifier for entities with no cross-run identity.
pub fn fresh_id() -> NodeId {
    NodeId(Uuid::new_v4())
}
