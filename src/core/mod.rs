mod analyzer;
mod backend;
mod engine;
mod manual;
mod node;
mod payload;
mod prompts;
mod scanner;
mod synthesizer;
mod traversal;

pub use analyzer::{eligible_content, FileAnalyzer, LeafCallback};
pub use backend::{create_backend, AnalysisBackend, AnthropicBackend};
pub use manual::ManualAnalyzer;
pub use node::{FileInfo, FileNode, NodeData};
pub use payload::{leaf_payload, synthesis_payload, to_codeblock};
pub use prompts::PromptLibrary;
pub use scanner::TreeScanner;
pub use synthesizer::DirectorySynthesizer;
pub use traversal::TreeTraverser;

// Export the main engine
pub use engine::Engine;
