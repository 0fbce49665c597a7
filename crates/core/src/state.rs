use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Paths already rewritten during the current run, keyed by their pre-rename path.
#[derive(Debug, Clone, Default)]
pub struct ProcessedSet {
    paths: HashSet<PathBuf>,
}

impl ProcessedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.contains(path)
    }

    /// Returns false if the path was already recorded.
    pub fn insert(&mut self, path: PathBuf) -> bool {
        self.paths.insert(path)
    }
}

/// Cross-phase pairing state.
///
/// An entry means the sidecar half was already renamed on disk, so the media
/// partner must follow. Keys are file names, not paths, and therefore match
/// across directories.
#[derive(Debug, Clone, Default)]
pub struct PairingIndex {
    heic_names: HashSet<String>,
    webp_bases: HashSet<String>,
}

impl PairingIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a trimmed HEIC name such as `IMG_2086.HEIC`.
    pub fn record_heic(&mut self, trimmed_name: String) {
        self.heic_names.insert(trimmed_name);
    }

    pub fn has_heic(&self, file_name: &str) -> bool {
        self.heic_names.contains(file_name)
    }

    /// Records the base name (up to the first dot) of a JPG renamed to WEBP.
    pub fn record_webp(&mut self, base: String) {
        self.webp_bases.insert(base);
    }

    pub fn has_webp(&self, base: &str) -> bool {
        self.webp_bases.contains(base)
    }

    pub fn heic_count(&self) -> usize {
        self.heic_names.len()
    }

    pub fn webp_count(&self) -> usize {
        self.webp_bases.len()
    }
}
