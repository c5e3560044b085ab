//! Payload text construction for backend calls.
//!
//! The text formats here are a compatibility surface: prompt templates are
//! written against them, so construction must be byte-for-byte reproducible
//! for fixed inputs.

use super::node::FileNode;
use crate::error::Result;

/// Wrap content in a fenced code block
pub fn to_codeblock(content: &str, lang: &str) -> String {
    format!("```{}\n{}\n```", lang, content)
}

/// Build the per-file payload: metadata fence, then content fence
pub fn leaf_payload(metadata_yaml: &str, content: &str) -> String {
    let metadata_block = to_codeblock(metadata_yaml, "yaml");
    let content_block = to_codeblock(content, "python");
    format!("{}\n{}", metadata_block, content_block)
}

/// Build the directory synthesis payload from the contributing children.
///
/// Children must be passed in their original traversal order; the section
/// order in the payload follows it exactly. Each child section is headed by a
/// divider and a line stating whether the child's analysis is an original
/// leaf analysis or an already-accumulated rollup.
pub fn synthesis_payload(directory: &FileNode, contributing: &[&FileNode]) -> Result<String> {
    let mut sections: Vec<String> = Vec::new();
    for child in contributing {
        let analysis = child
            .data
            .analysis
            .as_deref()
            .unwrap_or_default();
        sections.push("====".to_string());
        sections.push(child_header(child));
        sections.push(to_codeblock(&child.info.to_yaml()?, "yaml"));
        sections.push(to_codeblock(analysis, "markdown"));
        sections.push("\n".to_string());
    }
    let analysis_items = sections.join("\n");

    let directory_item = format!(
        "Directory to analyze: {}\n{}",
        directory.name(),
        to_codeblock(&directory.info.to_yaml()?, "yaml")
    );

    Ok([directory_item, "\n".to_string(), analysis_items].join("\n"))
}

fn child_header(child: &FileNode) -> String {
    let level = child.data.level();
    if level > 0 {
        format!(
            "Accumulated {}-level analysis for {}:",
            level,
            child.name()
        )
    } else {
        format!("Original analysis for {}:", child.name())
    }
}
