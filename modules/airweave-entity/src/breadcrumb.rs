use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One `(id, name, type)` step in an entity's ancestry, e.g. a Drive file's
/// `Workspace -> Folder -> File` path. Per spec §9, ancestry is always
/// stored as a flat ordered list rather than a graph of shared references
/// so entities stay trivially serializable and acyclic by construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Breadcrumb {
    pub id: String,
    pub name: String,
    pub entity_type: String,
}

impl Breadcrumb {
    pub fn new(id: impl Into<String>, name: impl Into<String>, entity_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            entity_type: entity_type.into(),
        }
    }
}
