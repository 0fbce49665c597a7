mod classifier;
mod config;
mod engine;
mod failure_log;
mod filename;
mod pipeline;
mod probe;
mod resolver;
mod state;
mod tool;
mod walker;

pub use classifier::{classify_name, RenameRule, RenameVerdict};
pub use config::{
    app_paths, load_config, read_config_file, save_config, write_config_file, AppConfig, AppPaths,
};
pub use engine::{
    normalize_tree, run_phase_one, run_phase_two, PhaseReport, RenameOperation, RenameReport,
};
pub use failure_log::{default_log_dir, FailureLog, ResolveStats, FAILURE_LOG_FILE};
pub use filename::FileName;
pub use pipeline::{run, run_with_exiftool, RunMode, RunSummary};
pub use probe::{ExiftoolProber, FileTypeProber, ProbeError};
pub use resolver::{MatchResult, ResolveReport, SidecarMatch, SidecarResolver};
pub use state::{PairingIndex, ProcessedSet};
pub use tool::{ExiftoolMetadataTool, MetadataTool, ToolError, MEDIA_EXTENSIONS};
pub use walker::TreeWalker;
