use crate::failure_log::default_log_dir;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_EXIFTOOL_COMMAND: &str = "exiftool";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub exiftool_command: String,
    pub include_hidden: bool,
    pub parallel_resolve: bool,
    pub failure_log_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            exiftool_command: DEFAULT_EXIFTOOL_COMMAND.to_string(),
            include_hidden: true,
            parallel_resolve: false,
            failure_log_dir: None,
        }
    }
}

impl AppConfig {
    /// Configured failure log directory, or `<cwd>/logs`.
    pub fn resolved_log_dir(&self) -> Result<PathBuf> {
        match &self.failure_log_dir {
            Some(dir) => Ok(dir.clone()),
            None => default_log_dir(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub config_dir: PathBuf,
    pub config_path: PathBuf,
}

pub fn app_paths() -> Result<AppPaths> {
    let proj = ProjectDirs::from("com", "takeout-fixer", "takeout-fixer")
        .context("OS標準設定ディレクトリを取得できませんでした")?;
    let config_dir = proj.config_dir().to_path_buf();
    Ok(AppPaths {
        config_path: config_dir.join("config.toml"),
        config_dir,
    })
}

const CONFIG_HEADER: &str = "\
# takeout-fixer の設定ファイル
#
# exiftool_command  : ファイル種別判定とメタデータ書き込みに使う exiftool のパス
# include_hidden    : false にするとドットで始まるファイル/フォルダを処理しません
# parallel_resolve  : true にするとメタデータ更新を並列で実行します
# failure_log_dir   : 失敗ログの出力先 (未指定なら <カレント>/logs)
";

pub fn load_config() -> Result<AppConfig> {
    read_config_file(&app_paths()?.config_path)
}

/// Missing files yield the defaults; unreadable or malformed ones are errors.
pub fn read_config_file(path: &Path) -> Result<AppConfig> {
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("設定ファイルを読めませんでした: {}", path.display()))?;
    parse_config(&raw)
}

pub fn parse_config(raw: &str) -> Result<AppConfig> {
    toml::from_str::<AppConfig>(raw).context("設定ファイルのパースに失敗しました")
}

/// Serialises `config` below a commented header describing every key.
pub fn render_config(config: &AppConfig) -> Result<String> {
    let body = toml::to_string_pretty(config).context("設定のシリアライズに失敗しました")?;
    Ok(format!("{CONFIG_HEADER}\n{body}"))
}

pub fn save_config(config: &AppConfig) -> Result<PathBuf> {
    let path = app_paths()?.config_path;
    write_config_file(&path, config)?;
    Ok(path)
}

pub fn write_config_file(path: &Path, config: &AppConfig) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).with_context(|| {
            format!("設定ディレクトリを作成できませんでした: {}", dir.display())
        })?;
    }
    fs::write(path, render_config(config)?)
        .with_context(|| format!("設定ファイルを書き込めませんでした: {}", path.display()))
}
