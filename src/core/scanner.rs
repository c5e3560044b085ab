use std::path::Path;

use chrono::{DateTime, Utc};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::Match;
use tracing::debug;

use super::node::{FileInfo, FileNode, NodeData};
use crate::config::ScanConfig;
use crate::error::{ArbordocError, Result};

/// Builds the `FileNode` tree from the file system.
///
/// Classification happens here, once, so that downstream callbacks only
/// consult flags: text vs. binary from a content sample, hidden from the
/// configured reserved name prefix. Children are sorted by name so discovery
/// order is stable across runs. Symlinks are skipped entirely, so cycles
/// cannot occur and no subtree appears twice. `.gitignore` files apply to
/// the directory holding them and everything below it, on top of the
/// configured ignore patterns.
pub struct TreeScanner {
    config: ScanConfig,
    matcher: Gitignore,
}

impl TreeScanner {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let mut config = config.clone();
        config.root = config
            .root
            .canonicalize()
            .map_err(|e| ArbordocError::Scan(format!("cannot resolve scan root: {e}")))?;

        let mut builder = GitignoreBuilder::new(&config.root);
        for pattern in &config.ignore_patterns {
            builder
                .add_line(None, pattern)
                .map_err(|e| ArbordocError::Scan(format!("bad ignore pattern {pattern:?}: {e}")))?;
        }
        let matcher = builder
            .build()
            .map_err(|e| ArbordocError::Scan(e.to_string()))?;

        Ok(Self { config, matcher })
    }

    /// Scan the configured root into a tree
    pub fn scan(&self) -> Result<FileNode> {
        let mut gitignores = Vec::new();
        self.scan_entry(&self.config.root, &mut gitignores)
    }

    fn scan_entry(&self, path: &Path, gitignores: &mut Vec<Gitignore>) -> Result<FileNode> {
        let metadata = std::fs::metadata(path)?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        let is_directory = metadata.is_dir();

        let mut children = Vec::new();
        let mut is_text_file = false;
        if is_directory {
            let pushed = self.push_local_gitignore(path, gitignores)?;

            let mut entries: Vec<_> = std::fs::read_dir(path)?
                .collect::<std::io::Result<Vec<_>>>()?;
            entries.sort_by_key(|entry| entry.path());

            for entry in entries {
                // DirEntry::file_type does not follow links, so symlinked
                // directories are never descended into
                let file_type = entry.file_type()?;
                if file_type.is_symlink() {
                    debug!("Skipping symlink {}", entry.path().display());
                    continue;
                }
                let entry_path = entry.path();
                if self.is_ignored(gitignores, &entry_path, file_type.is_dir()) {
                    debug!("Ignoring {}", entry_path.display());
                    continue;
                }
                children.push(self.scan_entry(&entry_path, gitignores)?);
            }

            if pushed {
                gitignores.pop();
            }
        } else {
            is_text_file = self.classify_text(path)?;
        }

        let info = FileInfo {
            full_path: path.to_path_buf(),
            extension: path
                .extension()
                .map(|ext| ext.to_string_lossy().to_string()),
            size_bytes: if is_directory { 0 } else { metadata.len() },
            modified: metadata.modified().ok().map(DateTime::<Utc>::from),
            is_directory,
            is_text_file,
            is_hidden: file_name.starts_with(&self.config.hidden_prefix),
            file_name,
        };

        Ok(FileNode {
            info,
            children,
            data: NodeData::default(),
        })
    }

    /// Compile `dir/.gitignore` onto the matcher stack, if present
    fn push_local_gitignore(&self, dir: &Path, gitignores: &mut Vec<Gitignore>) -> Result<bool> {
        let candidate = dir.join(".gitignore");
        if !candidate.exists() {
            return Ok(false);
        }
        let mut builder = GitignoreBuilder::new(dir);
        if let Some(e) = builder.add(&candidate) {
            return Err(ArbordocError::Scan(format!(
                "invalid .gitignore {}: {}",
                candidate.display(),
                e
            )));
        }
        gitignores.push(
            builder
                .build()
                .map_err(|e| ArbordocError::Scan(e.to_string()))?,
        );
        Ok(true)
    }

    /// Innermost gitignore decides first, then the configured patterns
    fn is_ignored(&self, gitignores: &[Gitignore], path: &Path, is_dir: bool) -> bool {
        for matcher in gitignores.iter().rev() {
            match matcher.matched(path, is_dir) {
                Match::None => {}
                decided => return decided.is_ignore(),
            }
        }
        self.matcher.matched(path, is_dir).is_ignore()
    }

    /// Classify a file as text by inspecting its leading bytes: a NUL byte or
    /// invalid UTF-8 (other than a codepoint truncated by the sample window)
    /// means binary
    fn classify_text(&self, path: &Path) -> Result<bool> {
        use std::io::Read;

        let mut sample = vec![0u8; self.config.classify_sample_bytes];
        let mut file = std::fs::File::open(path)?;
        let read = file.read(&mut sample)?;
        sample.truncate(read);

        if sample.contains(&0) {
            return Ok(false);
        }
        match std::str::from_utf8(&sample) {
            Ok(_) => Ok(true),
            // A multi-byte codepoint cut off at the window edge is still text
            Err(e) => Ok(e.error_len().is_none()),
        }
    }
}
