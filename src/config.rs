use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{ArbordocError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tree scanning configuration
    pub scan: ScanConfig,

    /// LLM backend settings
    pub llm: LlmConfig,

    /// Prompt template settings
    pub prompts: PromptConfig,

    /// Output settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Root directory to analyze
    pub root: PathBuf,

    /// Extra ignore patterns (gitignore syntax), applied on top of .gitignore
    pub ignore_patterns: Vec<String>,

    /// Name prefix that marks internal/hidden entries (e.g. `__init__.py`)
    pub hidden_prefix: String,

    /// Bytes of a file inspected for text/binary classification
    pub classify_sample_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider (currently only "anthropic")
    pub provider: String,

    /// Model name
    pub model: String,

    /// API key; falls back to the ANTHROPIC_API_KEY environment variable
    pub api_key: Option<String>,

    /// Base URL override (for proxies or compatible endpoints)
    pub base_url: Option<String>,

    /// Maximum tokens for responses
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Retry budget for transient failures
    pub max_retries: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Directory holding prompt template files
    pub dir: PathBuf,

    /// Template for the per-file analysis instruction
    pub file_analysis: String,

    /// Template for the directory synthesis instruction
    pub directory_synthesis: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the annotated tree is written
    pub report: PathBuf,

    /// Pretty-print the JSON report
    pub pretty: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scan: ScanConfig {
                root: PathBuf::from("."),
                ignore_patterns: vec![
                    "target/".to_string(),
                    "node_modules/".to_string(),
                    ".git/".to_string(),
                ],
                hidden_prefix: "__".to_string(),
                classify_sample_bytes: 8192,
            },
            llm: LlmConfig {
                provider: "anthropic".to_string(),
                model: "claude-3-haiku-20240307".to_string(),
                api_key: None,
                base_url: None,
                max_tokens: 3000,
                temperature: 0.1,
                max_retries: 10,
            },
            prompts: PromptConfig {
                dir: PathBuf::from("prompts"),
                file_analysis: "file_analysis.md".to_string(),
                directory_synthesis: "directory_synthesis.md".to_string(),
            },
            output: OutputConfig {
                report: PathBuf::from("analysis.json"),
                pretty: true,
            },
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ArbordocError::Config(e.to_string()))?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ArbordocError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "Arbordoc.toml",
                    "arbordoc.toml",
                    ".arbordoc.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrips_through_toml() {
        let config = Config::default();
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();

        assert_eq!(parsed.scan.hidden_prefix, "__");
        assert_eq!(parsed.llm.max_retries, 10);
        assert_eq!(parsed.prompts.file_analysis, "file_analysis.md");
    }

    #[test]
    fn test_load_missing_file_falls_back_to_default() {
        let config = Config::load_or_default(Some("does-not-exist.toml")).unwrap();
        assert_eq!(config.llm.provider, "anthropic");
    }
}
