use crate::config::AppConfig;
use crate::engine::{normalize_tree, RenameReport};
use crate::probe::{ExiftoolProber, FileTypeProber};
use crate::resolver::{ResolveReport, SidecarResolver};
use crate::tool::{ExiftoolMetadataTool, MetadataTool};
use crate::walker::TreeWalker;
use anyhow::{bail, Context, Result};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunMode {
    /// Rename phases followed by sidecar resolution.
    Full,
    RenameOnly,
    ResolveOnly,
}

impl RunMode {
    fn renames(self) -> bool {
        matches!(self, RunMode::Full | RunMode::RenameOnly)
    }

    fn resolves(self) -> bool {
        matches!(self, RunMode::Full | RunMode::ResolveOnly)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub root: PathBuf,
    pub mode: RunMode,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub renames: Option<RenameReport>,
    pub resolve: Option<ResolveReport>,
    pub failure_log: Option<PathBuf>,
}

impl RunSummary {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).context("実行結果のシリアライズに失敗しました")
    }
}

/// Runs the requested phases against `root` using exiftool for probing and updates.
pub fn run_with_exiftool(root: &Path, config: &AppConfig, mode: RunMode) -> Result<RunSummary> {
    let prober = ExiftoolProber::new(config.exiftool_command.clone());
    let tool = ExiftoolMetadataTool::new(config.exiftool_command.clone());
    run(root, config, mode, &prober, &tool)
}

/// Phase one and two complete over the whole tree before resolution starts.
/// A phase error aborts the run; metadata failures only land in the failure log.
pub fn run<P, T>(
    root: &Path,
    config: &AppConfig,
    mode: RunMode,
    prober: &P,
    tool: &T,
) -> Result<RunSummary>
where
    P: FileTypeProber + ?Sized,
    T: MetadataTool + Sync + ?Sized,
{
    if !root.is_dir() {
        bail!("フォルダが存在しません: {}", root.display());
    }

    let started_at = Local::now();
    let walker = TreeWalker::new(root).include_hidden(config.include_hidden);
    info!(root = %root.display(), mode = ?mode, "処理を開始します");

    let renames = if mode.renames() {
        Some(normalize_tree(&walker, prober)?)
    } else {
        None
    };

    let mut failure_log = None;
    let resolve = if mode.resolves() {
        let report = SidecarResolver::new()?
            .parallel(config.parallel_resolve)
            .resolve(&walker, tool)
            .context("メタデータ更新が中断されました")?;
        failure_log = persist_failures(config, &report);
        Some(report)
    } else {
        None
    };

    Ok(RunSummary {
        root: root.to_path_buf(),
        mode,
        started_at,
        finished_at: Local::now(),
        renames,
        resolve,
        failure_log,
    })
}

fn persist_failures(config: &AppConfig, report: &ResolveReport) -> Option<PathBuf> {
    if report.failures.is_empty() {
        return None;
    }
    match config.resolved_log_dir() {
        Ok(dir) => report.failures.persist(&dir),
        Err(err) => {
            tracing::warn!(error = %format!("{err:#}"), "失敗ログの出力先を決定できませんでした");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{run, RunMode};
    use crate::config::AppConfig;
    use crate::failure_log::FAILURE_LOG_FILE;
    use crate::probe::{FileTypeProber, ProbeError};
    use crate::tool::{MetadataTool, ToolError};
    use crate::walker::TreeWalker;
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use tempfile::tempdir;

    struct NameProber;

    impl FileTypeProber for NameProber {
        fn probe(&self, path: &Path) -> Result<String, ProbeError> {
            let name = path
                .file_name()
                .and_then(|v| v.to_str())
                .unwrap_or_default();
            let file_type = if name.starts_with("WEBP_") { "WEBP" } else { "JPEG" };
            Ok(file_type.to_string())
        }
    }

    #[derive(Default)]
    struct RecordingTool {
        fail_missing: bool,
        targets: Mutex<Vec<PathBuf>>,
    }

    impl MetadataTool for RecordingTool {
        fn copy_metadata(&self, _sidecar: &Path, media: &Path) -> Result<(), ToolError> {
            self.targets
                .lock()
                .expect("targets lock")
                .push(media.to_path_buf());
            if self.fail_missing && !media.exists() {
                return Err(ToolError::Failed {
                    media: media.display().to_string(),
                    code: Some(1),
                });
            }
            Ok(())
        }
    }

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent dirs must be creatable");
        }
        fs::write(path, b"x").expect("file must be creatable");
    }

    fn config_with_logs(dir: &Path) -> AppConfig {
        AppConfig {
            failure_log_dir: Some(dir.to_path_buf()),
            ..AppConfig::default()
        }
    }

    fn takeout_tree(root: &Path) {
        touch(&root.join("IMG_2086.HEIC"));
        touch(&root.join("IMG_2086.HEIC.supplemental-metadata.json"));
        touch(&root.join("WEBP_0001.jpg"));
        touch(&root.join("WEBP_0001.jpg.json"));
        touch(&root.join("PXL_1.TS.mp4"));
        touch(&root.join("PXL_1.TS.mp4.supplemental-metadata.json"));
        touch(&root.join("IMG_001.jpg"));
        touch(&root.join("IMG_001.jpg.supplemental-metadata.json"));
        touch(&root.join("notes.json"));
    }

    #[test]
    fn full_run_pairs_every_sidecar_with_renamed_media() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("Takeout");
        let logs = temp.path().join("logs");
        takeout_tree(&root);

        let tool = RecordingTool {
            fail_missing: true,
            ..RecordingTool::default()
        };
        let summary = run(&root, &config_with_logs(&logs), RunMode::Full, &NameProber, &tool)
            .expect("run");

        let mut targets = tool.targets.lock().expect("targets lock").clone();
        targets.sort();
        assert_eq!(
            targets,
            vec![
                root.join("IMG_001.jpg"),
                root.join("IMG_2086.jpg"),
                root.join("PXL_1.mp4"),
                root.join("WEBP_0001.webp"),
            ]
        );

        let resolve = summary.resolve.expect("resolve report");
        assert_eq!(resolve.stats.success, 4);
        assert_eq!(resolve.stats.errors, 0);
        assert_eq!(resolve.stats.skipped, 1);
        assert!(summary.failure_log.is_none());
        assert!(!logs.exists(), "no failures means no log directory");
    }

    #[test]
    fn second_full_run_renames_nothing() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("Takeout");
        takeout_tree(&root);
        let config = config_with_logs(&temp.path().join("logs"));
        let tool = RecordingTool::default();

        let first = run(&root, &config, RunMode::Full, &NameProber, &tool).expect("first run");
        assert_eq!(first.renames.expect("renames").renamed(), 6);
        let listing = TreeWalker::new(&root).collect_files().expect("walk");

        let second = run(&root, &config, RunMode::Full, &NameProber, &tool).expect("second run");
        assert_eq!(second.renames.expect("renames").renamed(), 0);
        assert_eq!(TreeWalker::new(&root).collect_files().expect("walk"), listing);
    }

    #[test]
    fn failed_updates_are_logged_one_per_line() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("Takeout");
        let logs = temp.path().join("logs");
        touch(&root.join("IMG_0001.jpg.json"));
        touch(&root.join("IMG_0002.jpg"));
        touch(&root.join("IMG_0002.jpg.json"));
        touch(&root.join("IMG_0003.png.supplemental-metadata.json"));

        let tool = RecordingTool {
            fail_missing: true,
            ..RecordingTool::default()
        };
        let summary = run(
            &root,
            &config_with_logs(&logs),
            RunMode::ResolveOnly,
            &NameProber,
            &tool,
        )
        .expect("run");

        assert!(summary.renames.is_none());
        let log_path = summary.failure_log.expect("failure log");
        assert_eq!(log_path, logs.join(FAILURE_LOG_FILE));
        let body = fs::read_to_string(log_path).expect("read log");
        assert_eq!(
            body.lines().collect::<Vec<_>>(),
            vec!["IMG_0001.jpg", "IMG_0003.png"]
        );
    }

    #[test]
    fn rename_only_leaves_metadata_untouched() {
        let temp = tempdir().expect("tempdir");
        let root = temp.path().join("Takeout");
        touch(&root.join("PXL_1.TS.mp4"));
        touch(&root.join("PXL_1.TS.mp4.json"));

        let tool = RecordingTool::default();
        let summary = run(
            &root,
            &AppConfig::default(),
            RunMode::RenameOnly,
            &NameProber,
            &tool,
        )
        .expect("run");

        assert!(summary.resolve.is_none());
        assert!(tool.targets.lock().expect("targets lock").is_empty());
        assert!(root.join("PXL_1.mp4").exists());
        assert!(root.join("PXL_1.mp4.json").exists());
        assert!(summary.to_json().expect("json").contains("\"RenameOnly\""));
    }

    #[test]
    fn missing_root_is_rejected() {
        let temp = tempdir().expect("tempdir");
        let err = run(
            &temp.path().join("missing"),
            &AppConfig::default(),
            RunMode::Full,
            &NameProber,
            &RecordingTool::default(),
        )
        .expect_err("missing root");
        assert!(err.to_string().contains("フォルダが存在しません"));
    }
}
