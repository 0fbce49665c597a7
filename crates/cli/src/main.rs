mod logging;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use takeout_fixer_core::{
    app_paths, load_config, run_with_exiftool, save_config, AppConfig, ExiftoolMetadataTool,
    MatchResult, RunMode, RunSummary,
};

#[derive(Debug, Parser)]
#[command(name = "takeout-fixer-cli")]
#[command(about = "Google Takeout の写真・動画ファイル名を正規化し、JSONの撮影日時を書き戻します")]
struct Cli {
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// リネームとメタデータ更新をすべて実行します
    Fix(RunArgs),
    /// ファイル名の正規化のみ実行します
    Rename(RunArgs),
    /// JSONからメディアへのメタデータ更新のみ実行します
    Resolve(RunArgs),
    Config(ConfigArgs),
}

#[derive(Debug, Args)]
struct ConfigArgs {
    #[command(subcommand)]
    action: ConfigAction,
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    Show,
    /// 現在の設定 (未作成なら既定値) を設定ファイルに書き出します
    Init,
}

#[derive(Debug, Args)]
struct RunArgs {
    /// 対象フォルダ。省略時は対話入力
    dir: Option<PathBuf>,
    /// ドットで始まるファイル/フォルダを処理しない
    #[arg(long, default_value_t = false)]
    skip_hidden: bool,
    #[arg(long, default_value_t = false)]
    parallel: bool,
    #[arg(long)]
    exiftool: Option<String>,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Fix(args) => cmd_run(args, RunMode::Full),
        Commands::Rename(args) => cmd_run(args, RunMode::RenameOnly),
        Commands::Resolve(args) => cmd_run(args, RunMode::ResolveOnly),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init => cmd_config_init(),
        },
    }
}

fn cmd_run(args: RunArgs, mode: RunMode) -> Result<()> {
    let mut config = load_config()?;
    apply_overrides(&mut config, &args);

    let root = match args.dir {
        Some(dir) => dir,
        None => prompt_for_dir()?,
    };
    if !root.is_dir() {
        bail!("無効なフォルダです: {}", root.display());
    }

    ensure_exiftool(&config)?;

    let summary = run_with_exiftool(&root, &config, mode)?;
    match args.output {
        OutputFormat::Json => println!("{}", summary.to_json()?),
        OutputFormat::Table => print_table(&summary),
    }
    Ok(())
}

fn apply_overrides(config: &mut AppConfig, args: &RunArgs) {
    if args.skip_hidden {
        config.include_hidden = false;
    }
    if args.parallel {
        config.parallel_resolve = true;
    }
    if let Some(command) = &args.exiftool {
        config.exiftool_command = command.clone();
    }
}

fn prompt_for_dir() -> Result<PathBuf> {
    print!("対象フォルダのパスを入力してください: ");
    io::stdout().flush().context("標準出力に書き込めませんでした")?;

    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("入力を読み取れませんでした")?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        bail!("フォルダが入力されていません");
    }
    Ok(PathBuf::from(trimmed))
}

fn ensure_exiftool(config: &AppConfig) -> Result<()> {
    let tool = ExiftoolMetadataTool::new(config.exiftool_command.clone());
    match tool.check_available() {
        Ok(version) => {
            tracing::info!(version = %version, "exiftoolを検出しました");
            Ok(())
        }
        Err(err) => bail!(
            "{err}\nexiftool をインストールしてください:\n- Ubuntu/Debian: sudo apt install libimage-exiftool-perl\n- macOS: brew install exiftool\n- その他: https://exiftool.org/install.html"
        ),
    }
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let config = load_config()?;
    let path = save_config(&config)?;
    println!("設定ファイルを書き出しました: {}", path.display());
    Ok(())
}

fn print_table(summary: &RunSummary) {
    if let Some(renames) = &summary.renames {
        println!("元ファイル -> 新ファイル (rule)");
        for op in renames.operations() {
            println!("{} -> {} ({:?})", op.from.display(), op.to.display(), op.rule);
        }
        println!(
            "\nリネーム: phase1={} phase2={} probe_failures={}",
            renames.phase_one.operations.len(),
            renames.phase_two.operations.len(),
            renames.phase_one.probe_failures
        );
    }

    if let Some(resolve) = &summary.resolve {
        for m in &resolve.matches {
            if m.result == MatchResult::Unresolved {
                println!("対応するメディアなし: {}", m.sidecar.display());
            }
        }
        println!(
            "メタデータ更新: success={} errors={} skipped={}",
            resolve.stats.success, resolve.stats.errors, resolve.stats.skipped
        );
    }

    if let Some(path) = &summary.failure_log {
        println!("失敗ログ: {}", path.display());
    }
}
