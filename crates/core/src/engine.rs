use crate::classifier::{
    classify_misnamed_webp, classify_name, classify_paired_heic, classify_webp_sidecar,
    is_webp_candidate, RenameRule, RenameVerdict,
};
use crate::probe::FileTypeProber;
use crate::state::{PairingIndex, ProcessedSet};
use crate::walker::TreeWalker;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RenameOperation {
    pub from: PathBuf,
    pub to: PathBuf,
    pub rule: RenameRule,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PhaseReport {
    pub scanned_files: usize,
    pub skipped_processed: usize,
    pub probe_failures: usize,
    pub operations: Vec<RenameOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RenameReport {
    pub phase_one: PhaseReport,
    pub phase_two: PhaseReport,
}

impl RenameReport {
    pub fn operations(&self) -> impl Iterator<Item = &RenameOperation> {
        self.phase_one
            .operations
            .iter()
            .chain(self.phase_two.operations.iter())
    }

    pub fn renamed(&self) -> usize {
        self.phase_one.operations.len() + self.phase_two.operations.len()
    }
}

/// Runs both rename phases over the tree. Phase two walks a fresh listing
/// taken after phase one has finished.
pub fn normalize_tree<P>(walker: &TreeWalker, prober: &P) -> Result<RenameReport>
where
    P: FileTypeProber + ?Sized,
{
    let mut processed = ProcessedSet::new();
    let mut pairing = PairingIndex::new();

    let phase_one = run_phase_one(walker, prober, &mut processed, &mut pairing)
        .context("フェーズ1 (リネーム) が中断されました")?;
    info!(
        renamed = phase_one.operations.len(),
        heic_pairs = pairing.heic_count(),
        webp_pairs = pairing.webp_count(),
        "フェーズ1完了"
    );

    let phase_two = run_phase_two(walker, &mut processed, &pairing)
        .context("フェーズ2 (ペアリネーム) が中断されました")?;
    info!(renamed = phase_two.operations.len(), "フェーズ2完了");

    Ok(RenameReport {
        phase_one,
        phase_two,
    })
}

/// Transcoded video, HEIC sidecar and misnamed WEBP renames.
pub fn run_phase_one<P>(
    walker: &TreeWalker,
    prober: &P,
    processed: &mut ProcessedSet,
    pairing: &mut PairingIndex,
) -> Result<PhaseReport>
where
    P: FileTypeProber + ?Sized,
{
    let mut report = PhaseReport::default();

    let scanned_files = walker.visit_files(|path| {
        if processed.contains(path) {
            report.skipped_processed += 1;
            return Ok(());
        }
        let Some(name) = file_name_str(path) else {
            return Ok(());
        };

        let mut verdict = classify_name(name);
        if !verdict.is_match() && is_webp_candidate(name) {
            match prober.probe(path) {
                Ok(file_type) => verdict = classify_misnamed_webp(name, &file_type),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "ファイル種別を判定できないためスキップします");
                    report.probe_failures += 1;
                }
            }
        }

        let Some(operation) = apply_verdict(path, &verdict)? else {
            return Ok(());
        };
        processed.insert(path.to_path_buf());
        match verdict {
            RenameVerdict::HeicSidecarPlain { pairing_key, .. }
            | RenameVerdict::HeicSidecarSupplemental { pairing_key, .. } => {
                pairing.record_heic(pairing_key)
            }
            RenameVerdict::MisnamedWebp { base, .. } => pairing.record_webp(base),
            _ => {}
        }
        report.operations.push(operation);
        Ok(())
    })?;

    report.scanned_files = scanned_files;
    Ok(report)
}

/// Renames media and sidecar partners whose counterpart was renamed in phase one.
pub fn run_phase_two(
    walker: &TreeWalker,
    processed: &mut ProcessedSet,
    pairing: &PairingIndex,
) -> Result<PhaseReport> {
    let mut report = PhaseReport::default();

    let scanned_files = walker.visit_files(|path| {
        if processed.contains(path) {
            report.skipped_processed += 1;
            return Ok(());
        }
        let Some(name) = file_name_str(path) else {
            return Ok(());
        };

        let mut verdict = classify_paired_heic(name, pairing);
        if !verdict.is_match() {
            verdict = classify_webp_sidecar(name, pairing);
        }

        if let Some(operation) = apply_verdict(path, &verdict)? {
            processed.insert(path.to_path_buf());
            report.operations.push(operation);
        }
        Ok(())
    })?;

    report.scanned_files = scanned_files;
    Ok(report)
}

fn apply_verdict(path: &Path, verdict: &RenameVerdict) -> Result<Option<RenameOperation>> {
    let (Some(target_name), Some(rule)) = (verdict.target(), verdict.rule()) else {
        return Ok(None);
    };

    let parent = path
        .parent()
        .with_context(|| format!("親ディレクトリを取得できませんでした: {}", path.display()))?;
    let target = parent.join(target_name);
    rename_file(path, &target)?;
    info!(from = %path.display(), to = %target.display(), rule = ?rule, "リネームしました");

    Ok(Some(RenameOperation {
        from: path.to_path_buf(),
        to: target,
        rule,
    }))
}

fn rename_file(from: &Path, to: &Path) -> Result<()> {
    if to.symlink_metadata().is_ok() {
        bail!(
            "リネーム先が既に存在します: {} -> {}",
            from.display(),
            to.display()
        );
    }
    fs::rename(from, to)
        .with_context(|| format!("リネームに失敗しました: {} -> {}", from.display(), to.display()))
}

fn file_name_str(path: &Path) -> Option<&str> {
    let name = path.file_name().and_then(|v| v.to_str());
    if name.is_none() {
        debug!(path = %path.display(), "UTF-8でないファイル名はスキップします");
    }
    name
}
