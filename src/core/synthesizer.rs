use std::sync::Arc;

use tracing::debug;

use super::backend::AnalysisBackend;
use super::node::{FileNode, NodeData};
use super::payload;
use crate::error::Result;

/// Combines the analyses already stored on a directory's children into one
/// analysis for the directory itself.
///
/// The traversal engine guarantees the post-order precondition: every child
/// has been visited before this runs.
pub struct DirectorySynthesizer {
    backend: Arc<dyn AnalysisBackend>,
    instruction: String,
}

impl DirectorySynthesizer {
    pub fn new(backend: Arc<dyn AnalysisBackend>, instruction: String) -> Self {
        Self {
            backend,
            instruction,
        }
    }

    /// Synthesize a directory's analysis from its contributing children.
    ///
    /// - no contributing children: empty result, the directory stays silent
    /// - exactly one: that child's result passes through unchanged, with no
    ///   backend call and no level increment
    /// - two or more: backend synthesis, with the level set to one above the
    ///   highest contributing level
    pub async fn synthesize(&self, node: &FileNode) -> Result<NodeData> {
        let contributing: Vec<&FileNode> = node
            .children
            .iter()
            .filter(|child| child.data.analysis.is_some())
            .collect();

        match contributing.len() {
            0 => {
                debug!("Directory {} has no contributing children", node.name());
                Ok(NodeData::default())
            }
            1 => {
                debug!(
                    "Directory {} passes through its single contributing child {}",
                    node.name(),
                    contributing[0].name()
                );
                Ok(contributing[0].data.clone())
            }
            k => {
                let new_level = contributing
                    .iter()
                    .map(|child| child.data.level())
                    .max()
                    .unwrap_or(0)
                    + 1;
                debug!(
                    "Synthesizing {} from {} children at level {}",
                    node.name(),
                    k,
                    new_level
                );

                let payload = payload::synthesis_payload(node, &contributing)?;
                let analysis = self.backend.generate(&self.instruction, &payload).await?;

                Ok(NodeData {
                    analysis: Some(analysis),
                    accumulation_level: Some(new_level),
                })
            }
        }
    }
}
