use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::config::Config;
use super::backend::{create_backend, AnalysisBackend};
use super::{
    DirectorySynthesizer, FileAnalyzer, FileNode, LeafCallback, ManualAnalyzer, PromptLibrary,
    TreeScanner, TreeTraverser,
};

/// Main orchestration engine for Arbordoc
pub struct Engine {
    config: Config,
    prompts: PromptLibrary,
}

impl Engine {
    /// Create a new engine instance
    pub async fn new(config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        debug!("Loaded configuration: {:?}", config);

        let prompts = PromptLibrary::load_or_default(&config.prompts)?;

        Ok(Self { config, prompts })
    }

    /// Write a starter config file and the default prompt templates
    pub async fn init(&self, path: Option<PathBuf>) -> Result<()> {
        let target = path.unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&target)?;

        let config_path = target.join("Arbordoc.toml");
        self.config.save(&config_path)?;

        let mut prompt_config = self.config.prompts.clone();
        prompt_config.dir = target.join(&prompt_config.dir);
        PromptLibrary::write_defaults(&prompt_config)?;

        info!("📝 Wrote {} and prompt templates", config_path.display());
        Ok(())
    }

    /// Run one bottom-up analysis pass and write the annotated tree
    pub async fn analyze(
        &self,
        source: Option<PathBuf>,
        output: Option<PathBuf>,
        manual: bool,
    ) -> Result<()> {
        let mut scan_config = self.config.scan.clone();
        if let Some(source) = source {
            scan_config.root = source;
        }
        let report_path = output.unwrap_or_else(|| self.config.output.report.clone());

        info!("🌳 Scanning {}", scan_config.root.display());
        let scanner = TreeScanner::new(&scan_config)?;
        let mut tree = scanner.scan()?;
        info!("Found {} nodes", count_nodes(&tree));

        let backend: Arc<dyn AnalysisBackend> = Arc::from(create_backend(&self.config.llm)?);
        info!("🧠 Analysis backend: {}", backend.backend_name());

        let leaf: Box<dyn LeafCallback> = if manual {
            info!("Manual analysis mode: file analyses are entered interactively");
            Box::new(ManualAnalyzer::from_terminal())
        } else {
            Box::new(FileAnalyzer::new(
                backend.clone(),
                self.prompts.file_analysis.clone(),
            ))
        };
        let synthesizer =
            DirectorySynthesizer::new(backend, self.prompts.directory_synthesis.clone());

        let traverser = TreeTraverser::new(leaf, synthesizer);
        traverser.run(&mut tree).await?;

        let analyzed = count_analyzed(&tree);
        info!(
            "✅ Pass complete: {} analyses, root accumulation level {}",
            analyzed,
            tree.data.level()
        );

        let report = render_report(&tree, self.config.output.pretty)?;
        std::fs::write(&report_path, report)?;
        info!("📄 Report written to {}", report_path.display());

        Ok(())
    }
}

/// Render the annotated tree as the JSON report body
fn render_report(tree: &FileNode, pretty: bool) -> crate::error::Result<String> {
    if pretty {
        Ok(serde_json::to_string_pretty(tree)?)
    } else {
        Ok(serde_json::to_string(tree)?)
    }
}

fn count_nodes(node: &FileNode) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

fn count_analyzed(node: &FileNode) -> usize {
    let own = usize::from(node.data.analysis.is_some());
    own + node.children.iter().map(count_analyzed).sum::<usize>()
}
