use std::path::Path;
use std::process::Command;
use thiserror::Error;

const UNKNOWN_TYPE: &str = "Unknown";

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("ファイル種別の判定コマンドを起動できませんでした ({command}): {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ファイル種別の判定に失敗しました ({status}): {path}")]
    Failed { path: String, status: String },
}

/// Reports the real binary type of a file, independent of its extension.
pub trait FileTypeProber {
    fn probe(&self, path: &Path) -> Result<String, ProbeError>;
}

/// Asks exiftool for the `FileType` tag.
#[derive(Debug, Clone)]
pub struct ExiftoolProber {
    command: String,
}

impl ExiftoolProber {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for ExiftoolProber {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

impl FileTypeProber for ExiftoolProber {
    fn probe(&self, path: &Path) -> Result<String, ProbeError> {
        let output = Command::new(&self.command)
            .arg("-FileType")
            .arg(path)
            .output()
            .map_err(|source| ProbeError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::Failed {
                path: path.display().to_string(),
                status: output.status.to_string(),
            });
        }

        Ok(parse_file_type(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Extracts the value from `File Type                       : WEBP`.
pub fn parse_file_type(output: &str) -> String {
    output
        .trim()
        .split_once(": ")
        .map(|(_, value)| value.trim().to_string())
        .unwrap_or_else(|| UNKNOWN_TYPE.to_string())
}
