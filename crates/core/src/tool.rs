use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Stdio};
use thiserror::Error;

/// Media extensions exiftool is allowed to write to.
pub const MEDIA_EXTENSIONS: &[&str] = &["mp4", "jpg", "heic", "mov", "jpeg", "png", "gif", "webp"];

const TIMESTAMP_TAGS: &[&str] = &[
    "-DateTimeOriginal<PhotoTakenTimeTimestamp",
    "-FileCreateDate<PhotoTakenTimeTimestamp",
    "-FileModifyDate<PhotoTakenTimeTimestamp",
];

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("メタデータツールを起動できませんでした ({command}): {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("メタデータツールが失敗しました (exit code {code:?}): {media}")]
    Failed { media: String, code: Option<i32> },
}

/// Copies capture timestamps from a sidecar JSON into its media file.
pub trait MetadataTool {
    fn copy_metadata(&self, sidecar: &Path, media: &Path) -> Result<(), ToolError>;
}

#[derive(Debug, Clone)]
pub struct ExiftoolMetadataTool {
    command: String,
}

impl ExiftoolMetadataTool {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }

    /// Runs `<command> -ver` and returns the reported version.
    pub fn check_available(&self) -> Result<String, ToolError> {
        let output = Command::new(&self.command)
            .arg("-ver")
            .output()
            .map_err(|source| ToolError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ToolError::Failed {
                media: String::new(),
                code: output.status.code(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

impl Default for ExiftoolMetadataTool {
    fn default() -> Self {
        Self::new("exiftool")
    }
}

impl MetadataTool for ExiftoolMetadataTool {
    fn copy_metadata(&self, sidecar: &Path, media: &Path) -> Result<(), ToolError> {
        // stdout/stderr go straight to the operator; only the exit code matters.
        let status = Command::new(&self.command)
            .args(metadata_copy_args(sidecar, media))
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| ToolError::Spawn {
                command: self.command.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Failed {
                media: media.display().to_string(),
                code: status.code(),
            })
        }
    }
}

pub fn metadata_copy_args(sidecar: &Path, media: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-d".into(), "%s".into(), "-tagsfromfile".into()];
    args.push(sidecar.as_os_str().to_os_string());
    args.extend(TIMESTAMP_TAGS.iter().map(OsString::from));
    args.push("-overwrite_original".into());
    for ext in MEDIA_EXTENSIONS {
        args.push("-ext".into());
        args.push(OsString::from(ext));
    }
    args.push(media.as_os_str().to_os_string());
    args
}

#[cfg(test)]
mod tests {
    use super::{metadata_copy_args, ExiftoolMetadataTool, MetadataTool, ToolError};
    use std::path::Path;

    #[test]
    fn builds_exiftool_argument_list() {
        let args = metadata_copy_args(
            Path::new("/t/IMG_001.jpg.supplemental-metadata.json"),
            Path::new("/t/IMG_001.jpg"),
        );
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().to_string())
            .collect();

        let expected = [
            "-d",
            "%s",
            "-tagsfromfile",
            "/t/IMG_001.jpg.supplemental-metadata.json",
            "-DateTimeOriginal<PhotoTakenTimeTimestamp",
            "-FileCreateDate<PhotoTakenTimeTimestamp",
            "-FileModifyDate<PhotoTakenTimeTimestamp",
            "-overwrite_original",
            "-ext",
            "mp4",
            "-ext",
            "jpg",
            "-ext",
            "heic",
            "-ext",
            "mov",
            "-ext",
            "jpeg",
            "-ext",
            "png",
            "-ext",
            "gif",
            "-ext",
            "webp",
            "/t/IMG_001.jpg",
        ];
        assert_eq!(args, expected);
    }

    #[test]
    fn missing_binary_is_reported_as_spawn_error() {
        let tool = ExiftoolMetadataTool::new("takeout-fixer-no-such-binary");
        let err = tool
            .copy_metadata(Path::new("a.jpg.json"), Path::new("a.jpg"))
            .expect_err("spawn must fail");
        assert!(matches!(err, ToolError::Spawn { .. }));
        assert!(matches!(
            tool.check_available(),
            Err(ToolError::Spawn { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn non_zero_exit_is_reported_with_its_code() {
        let tool = ExiftoolMetadataTool::new("false");
        let err = tool
            .copy_metadata(Path::new("a.jpg.json"), Path::new("a.jpg"))
            .expect_err("false always exits 1");
        match err {
            ToolError::Failed { media, code } => {
                assert_eq!(media, "a.jpg");
                assert_eq!(code, Some(1));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            tool.check_available(),
            Err(ToolError::Failed { code: Some(1), .. })
        ));
    }
}
