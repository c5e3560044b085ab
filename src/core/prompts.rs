use std::path::Path;

use tracing::debug;

use crate::config::PromptConfig;
use crate::error::{ArbordocError, Result};

const DEFAULT_FILE_ANALYSIS: &str = include_str!("../../prompts/file_analysis.md");
const DEFAULT_DIRECTORY_SYNTHESIS: &str = include_str!("../../prompts/directory_synthesis.md");

/// System instructions loaded once at startup, one per backend role.
///
/// The contents are opaque to the rest of the system; only the payload
/// formats they are written against are fixed.
pub struct PromptLibrary {
    /// Instruction for per-file analysis
    pub file_analysis: String,

    /// Instruction for directory synthesis
    pub directory_synthesis: String,
}

impl PromptLibrary {
    /// Built-in templates shipped with the binary
    pub fn defaults() -> Self {
        Self {
            file_analysis: DEFAULT_FILE_ANALYSIS.to_string(),
            directory_synthesis: DEFAULT_DIRECTORY_SYNTHESIS.to_string(),
        }
    }

    /// Load both templates from the configured directory
    pub fn load(config: &PromptConfig) -> Result<Self> {
        Ok(Self {
            file_analysis: Self::read_template(&config.dir.join(&config.file_analysis))?,
            directory_synthesis: Self::read_template(&config.dir.join(&config.directory_synthesis))?,
        })
    }

    /// Load from disk when the templates exist, otherwise use the built-ins
    pub fn load_or_default(config: &PromptConfig) -> Result<Self> {
        let file_analysis = config.dir.join(&config.file_analysis);
        let directory_synthesis = config.dir.join(&config.directory_synthesis);
        if file_analysis.exists() && directory_synthesis.exists() {
            Self::load(config)
        } else {
            debug!(
                "Prompt templates not found under {}, using built-in defaults",
                config.dir.display()
            );
            Ok(Self::defaults())
        }
    }

    /// Write the built-in templates to the configured directory, for `init`
    pub fn write_defaults(config: &PromptConfig) -> Result<()> {
        std::fs::create_dir_all(&config.dir)?;
        std::fs::write(config.dir.join(&config.file_analysis), DEFAULT_FILE_ANALYSIS)?;
        std::fs::write(
            config.dir.join(&config.directory_synthesis),
            DEFAULT_DIRECTORY_SYNTHESIS,
        )?;
        Ok(())
    }

    fn read_template(path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| {
            ArbordocError::Prompt(format!("cannot read template {}: {}", path.display(), e))
        })
    }
}
