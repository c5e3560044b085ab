use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Metadata for one entry in the scanned tree.
///
/// Field order matters: `to_yaml` serializes fields in declaration order, and
/// the resulting text is embedded verbatim in analysis payloads, so the order
/// here is the canonical one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileInfo {
    /// Absolute path of the entry
    pub full_path: PathBuf,

    /// Entry name, unique among siblings
    pub file_name: String,

    /// File extension, if any
    pub extension: Option<String>,

    /// Size in bytes (0 for directories)
    pub size_bytes: u64,

    /// Last modification time
    pub modified: Option<DateTime<Utc>>,

    /// Whether this entry is a directory
    pub is_directory: bool,

    /// Whether the content was classified as text
    pub is_text_file: bool,

    /// Whether the name carries the reserved internal/hidden prefix
    pub is_hidden: bool,
}

impl FileInfo {
    /// Serialize to the canonical YAML form used in analysis payloads
    pub fn to_yaml(&self) -> Result<String> {
        let yaml = serde_yaml::to_string(self)?;
        Ok(yaml.trim_end().to_string())
    }
}

/// Per-node analysis results, the sole channel for communicating upward.
///
/// A default (all-absent) value means "no change"; the traversal engine merges
/// only present fields into the node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    /// Analysis text produced by the backend or a human operator
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,

    /// Synthesis steps between this analysis and the nearest leaf analysis
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accumulation_level: Option<u32>,
}

impl NodeData {
    pub fn is_empty(&self) -> bool {
        self.analysis.is_none() && self.accumulation_level.is_none()
    }

    /// Recorded accumulation level; absent reads as 0 (a fresh leaf analysis)
    pub fn level(&self) -> u32 {
        self.accumulation_level.unwrap_or(0)
    }

    /// Merge present fields of `other` into self
    pub fn merge(&mut self, other: NodeData) {
        if other.analysis.is_some() {
            self.analysis = other.analysis;
        }
        if other.accumulation_level.is_some() {
            self.accumulation_level = other.accumulation_level;
        }
    }
}

/// One node of the scanned file tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileNode {
    /// Entry metadata
    pub info: FileInfo,

    /// Child nodes in discovery order (empty for files)
    pub children: Vec<FileNode>,

    /// Accumulated analysis results
    #[serde(default, skip_serializing_if = "NodeData::is_empty")]
    pub data: NodeData,
}

impl FileNode {
    pub fn name(&self) -> &str {
        &self.info.file_name
    }

    pub fn is_directory(&self) -> bool {
        self.info.is_directory
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;

    /// Build a text-file leaf with fixed metadata for deterministic tests
    pub fn leaf(name: &str) -> FileNode {
        FileNode {
            info: FileInfo {
                full_path: PathBuf::from(format!("/project/{}", name)),
                file_name: name.to_string(),
                extension: name.rsplit_once('.').map(|(_, ext)| ext.to_string()),
                size_bytes: 64,
                modified: None,
                is_directory: false,
                is_text_file: true,
                is_hidden: name.starts_with("__"),
            },
            children: vec![],
            data: NodeData::default(),
        }
    }

    /// Build a directory node over the given children
    pub fn directory(name: &str, children: Vec<FileNode>) -> FileNode {
        FileNode {
            info: FileInfo {
                full_path: PathBuf::from(format!("/project/{}", name)),
                file_name: name.to_string(),
                extension: None,
                size_bytes: 0,
                modified: None,
                is_directory: true,
                is_text_file: false,
                is_hidden: name.starts_with("__"),
            },
            children,
            data: NodeData::default(),
        }
    }

    /// Attach an analysis (and optional level) to a node
    pub fn with_analysis(mut node: FileNode, analysis: &str, level: Option<u32>) -> FileNode {
        node.data.analysis = Some(analysis.to_string());
        node.data.accumulation_level = level;
        node
    }
}
