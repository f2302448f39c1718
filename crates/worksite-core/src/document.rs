//! ============================================================================
//! Generated Documents - Decode & Save
//! ============================================================================
//! Job cards and order summaries arrive from the remote side as base64
//! payloads. This module decodes them to raw bytes and hands them to a
//! save-as-file primitive with the deterministic filename
//! "{kind}-{entity_number_or_id}.pdf".
//! ============================================================================

use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::info;

use crate::types::{DocumentKind, EncodedDocument, WorkflowError};

/// Decode a generated document payload into raw PDF bytes
pub fn decode_document(encoded: &EncodedDocument) -> Result<Vec<u8>, WorkflowError> {
    let bytes = STANDARD
        .decode(encoded.payload_base64.trim())
        .map_err(|e| WorkflowError::DocumentDecode(e.to_string()))?;
    info!("Decoded document: {} bytes", bytes.len());
    Ok(bytes)
}

/// Deterministic download filename for a generated document
pub fn document_filename(kind: DocumentKind, entity_label: &str) -> String {
    format!("{}-{}.pdf", kind.slug(), entity_label)
}

/// Platform "save as file" primitive the orchestrator hands decoded bytes to
pub trait DocumentSink: Send + Sync {
    /// Persist the document, returning where it landed
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf>;
}

/// Sink writing documents into a target directory (the CLI's download dir)
pub struct FileDocumentSink {
    dir: PathBuf,
}

impl FileDocumentSink {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }
}

impl DocumentSink for FileDocumentSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| anyhow!("Failed to create directory: {}", e))?;
        let path = self.dir.join(filename);
        std::fs::write(&path, bytes).map_err(|e| anyhow!("Failed to save document: {}", e))?;
        info!("Document saved to: {}", path.display());
        Ok(path)
    }
}
