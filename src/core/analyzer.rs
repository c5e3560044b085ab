use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::backend::AnalysisBackend;
use super::node::{FileInfo, FileNode, NodeData};
use super::payload;
use crate::error::Result;

/// Callback invoked on leaf nodes during traversal.
///
/// Implementations return the node's analysis result, or an empty `NodeData`
/// when the node is not eligible. The automated and manual analyzers both
/// implement this, so they are interchangeable under the same synthesizer.
#[async_trait]
pub trait LeafCallback: Send + Sync {
    async fn analyze(&self, node: &FileNode) -> Result<NodeData>;
}

/// Read a node's content if it is eligible for leaf-level analysis.
///
/// Returns `None` (no side effect) for binary files, hidden entries, and
/// blank content. Content is only read from disk once the cheap checks pass.
pub fn eligible_content(info: &FileInfo) -> Result<Option<String>> {
    if !info.is_text_file {
        return Ok(None);
    }
    if info.is_hidden {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&info.full_path)?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(content))
}

/// Produces an analysis for a single eligible file by delegating to the
/// configured backend
pub struct FileAnalyzer {
    backend: Arc<dyn AnalysisBackend>,
    instruction: String,
}

impl FileAnalyzer {
    pub fn new(backend: Arc<dyn AnalysisBackend>, instruction: String) -> Self {
        Self {
            backend,
            instruction,
        }
    }
}

#[async_trait]
impl LeafCallback for FileAnalyzer {
    async fn analyze(&self, node: &FileNode) -> Result<NodeData> {
        let content = match eligible_content(&node.info)? {
            Some(content) => content,
            None => {
                debug!("Skipping ineligible node {}", node.name());
                return Ok(NodeData::default());
            }
        };

        let metadata = node.info.to_yaml()?;
        let payload = payload::leaf_payload(&metadata, &content);
        let analysis = self.backend.generate(&self.instruction, &payload).await?;

        Ok(NodeData {
            analysis: Some(analysis),
            accumulation_level: None,
        })
    }
}
