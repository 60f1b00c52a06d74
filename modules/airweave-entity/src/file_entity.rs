use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::Entity;

/// Specialization of `Entity` carrying the fields needed to materialize a
/// remote file to a local temp path before file transformers run (spec
/// §3, §6's temp-file layout).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FileEntity {
    #[serde(flatten)]
    pub base: Entity,
    pub download_url: String,
    pub file_uuid: Uuid,
    /// Populated once the orchestrator has downloaded the file under
    /// `${TMP}/airweave/<uuid>-<safe_filename>`.
    pub local_path: Option<String>,
    pub checksum: Option<String>,
    pub total_size: Option<u64>,
    pub mime_type: String,
}

impl FileEntity {
    pub fn new(base: Entity, download_url: impl Into<String>, mime_type: impl Into<String>) -> Self {
        Self {
            base,
            download_url: download_url.into(),
            file_uuid: Uuid::new_v4(),
            local_path: None,
            checksum: None,
            total_size: None,
            mime_type: mime_type.into(),
        }
    }

    /// The safe on-disk filename component for the temp-file layout.
    pub fn safe_filename(&self) -> String {
        let raw = self
            .download_url
            .rsplit('/')
            .next()
            .unwrap_or("file")
            .to_string();
        raw.chars()
            .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' || c == '_' { c } else { '_' })
            .collect()
    }

    /// `${TMP}/airweave/<uuid>-<safe_filename>` per spec §6.
    pub fn temp_path(&self, temp_root: &str) -> std::path::PathBuf {
        std::path::Path::new(temp_root)
            .join("airweave")
            .join(format!("{}-{}", self.file_uuid, self.safe_filename()))
    }
}
