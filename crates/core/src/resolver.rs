use crate::failure_log::{FailureLog, ResolveStats};
use crate::tool::{MetadataTool, ToolError};
use crate::walker::TreeWalker;
use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything up to and including the first extension that is followed by another dot.
const MEDIA_PREFIX_PATTERN: &str = r"^(.*?\.\w+)\.";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum MatchResult {
    Resolved(PathBuf),
    Unresolved,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SidecarMatch {
    pub sidecar: PathBuf,
    pub result: MatchResult,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ResolveReport {
    pub matches: Vec<SidecarMatch>,
    pub stats: ResolveStats,
    pub failures: FailureLog,
}

#[derive(Debug, Clone)]
pub struct SidecarResolver {
    pattern: Regex,
    parallel: bool,
}

impl SidecarResolver {
    pub fn new() -> Result<Self> {
        let pattern = Regex::new(MEDIA_PREFIX_PATTERN)
            .context("メディアファイル名のパターンを構築できませんでした")?;
        Ok(Self {
            pattern,
            parallel: false,
        })
    }

    /// Run tool invocations on the rayon pool. Results are still aggregated in walk order.
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// `IMG_001.jpg.supplemental-metadata.json` resolves to `IMG_001.jpg` in the same directory.
    pub fn match_sidecar(&self, sidecar: &Path) -> MatchResult {
        let Some(name) = sidecar.file_name().and_then(|v| v.to_str()) else {
            return MatchResult::Unresolved;
        };
        let Some(prefix) = self.pattern.captures(name).and_then(|caps| caps.get(1)) else {
            return MatchResult::Unresolved;
        };

        let media = match sidecar.parent() {
            Some(parent) => parent.join(prefix.as_str()),
            None => PathBuf::from(prefix.as_str()),
        };
        MatchResult::Resolved(media)
    }

    pub fn resolve<T>(&self, walker: &TreeWalker, tool: &T) -> Result<ResolveReport>
    where
        T: MetadataTool + Sync + ?Sized,
    {
        let files = walker.collect_files()?;
        let mut report = ResolveReport::default();
        let mut jobs = Vec::<(PathBuf, PathBuf)>::new();

        for path in files.into_iter().filter(|p| is_sidecar(p)) {
            let result = self.match_sidecar(&path);
            match &result {
                MatchResult::Resolved(media) => jobs.push((path.clone(), media.clone())),
                MatchResult::Unresolved => {
                    debug!(sidecar = %path.display(), "対応するメディアファイル名が見つかりません");
                    report.stats.skipped += 1;
                }
            }
            report.matches.push(SidecarMatch {
                sidecar: path,
                result,
            });
        }

        if self.parallel {
            let outcomes: Vec<Result<(), ToolError>> = jobs
                .par_iter()
                .map(|(sidecar, media)| tool.copy_metadata(sidecar, media))
                .collect();
            for ((sidecar, media), outcome) in jobs.iter().zip(outcomes) {
                record_outcome(&mut report, sidecar, media, outcome);
            }
        } else {
            for (sidecar, media) in &jobs {
                let outcome = tool.copy_metadata(sidecar, media);
                record_outcome(&mut report, sidecar, media, outcome);
            }
        }

        info!(
            success = report.stats.success,
            errors = report.stats.errors,
            skipped = report.stats.skipped,
            "メタデータ更新完了"
        );
        Ok(report)
    }
}

fn record_outcome(
    report: &mut ResolveReport,
    sidecar: &Path,
    media: &Path,
    outcome: Result<(), ToolError>,
) {
    match outcome {
        Ok(()) => {
            info!(media = %media.display(), sidecar = %sidecar.display(), "メタデータを更新しました");
            report.stats.success += 1;
        }
        Err(err) => {
            warn!(media = %media.display(), sidecar = %sidecar.display(), error = %err, "メタデータの更新に失敗しました");
            report.stats.errors += 1;
            let name = media
                .file_name()
                .map(|v| v.to_string_lossy().to_string())
                .unwrap_or_else(|| media.display().to_string());
            report.failures.push(name);
        }
    }
}

fn is_sidecar(path: &Path) -> bool {
    path.extension().and_then(|v| v.to_str()) == Some("json")
}
