use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const FAILURE_LOG_DIR: &str = "logs";
pub const FAILURE_LOG_FILE: &str = "failed_files.txt";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ResolveStats {
    pub success: usize,
    pub errors: usize,
    pub skipped: usize,
}

/// Media file names whose metadata update failed, in invocation order.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FailureLog {
    entries: Vec<String>,
}

impl FailureLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, file_name: impl Into<String>) {
        self.entries.push(file_name.into());
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Writes one name per line to `<dir>/failed_files.txt`, replacing any
    /// previous log. An empty log touches nothing and returns `None`.
    pub fn write_to(&self, dir: &Path) -> Result<Option<PathBuf>> {
        if self.entries.is_empty() {
            return Ok(None);
        }

        fs::create_dir_all(dir)
            .with_context(|| format!("ログフォルダを作成できませんでした: {}", dir.display()))?;
        let path = dir.join(FAILURE_LOG_FILE);
        let mut body = self.entries.join("\n");
        body.push('\n');
        fs::write(&path, body)
            .with_context(|| format!("失敗ログを書き込めませんでした: {}", path.display()))?;
        Ok(Some(path))
    }

    /// Like [`FailureLog::write_to`], but a write error is only reported.
    pub fn persist(&self, dir: &Path) -> Option<PathBuf> {
        match self.write_to(dir) {
            Ok(Some(path)) => {
                info!(path = %path.display(), count = self.len(), "失敗ログを書き込みました");
                Some(path)
            }
            Ok(None) => {
                info!("失敗したファイルはありません");
                None
            }
            Err(err) => {
                warn!(error = %format!("{err:#}"), "失敗ログの書き込みに失敗しました");
                None
            }
        }
    }
}

/// `<cwd>/logs`.
pub fn default_log_dir() -> Result<PathBuf> {
    let cwd = env::current_dir().context("カレントディレクトリを取得できませんでした")?;
    Ok(cwd.join(FAILURE_LOG_DIR))
}
