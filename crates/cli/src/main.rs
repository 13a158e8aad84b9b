use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use mediaseq_core::{
    app_paths, apply_plan_with_progress, generate_plan, load_config, save_config, AppConfig,
    DateResolver, ExifTagReader, PlanOptions, RenameCandidate, RenamePlan, SystemVideoReader,
};
use std::path::PathBuf;
use std::rc::Rc;

#[derive(Debug, Parser)]
#[command(name = "mediaseq")]
#[command(about = "写真・動画を撮影日時順に連番付きでリネームします")]
struct Cli {
    /// 詳細ログ (debug) を出力する
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    Rename(RenameArgs),
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
    Init {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

#[derive(Debug, Args)]
struct RenameArgs {
    /// 対象フォルダ (サブフォルダは走査しない)
    input: PathBuf,
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long)]
    start: Option<u64>,
    #[arg(long)]
    width: Option<usize>,
    #[arg(long, default_value_t = false)]
    include_hidden: bool,
    #[arg(long, default_value_t = false)]
    dry_run: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[arg(long, default_value = "ffprobe")]
    ffprobe: PathBuf,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Rename(args) => cmd_rename(args),
        Commands::Config(config) => match config.action {
            ConfigAction::Show => cmd_config_show(),
            ConfigAction::Init { force } => cmd_config_init(force),
        },
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn cmd_rename(args: RenameArgs) -> Result<()> {
    let config = load_config()?;
    let options = PlanOptions {
        input: args.input,
        prefix: args.prefix.unwrap_or(config.prefix),
        start: args.start.unwrap_or(config.start),
        width: args.width.unwrap_or(config.width),
        include_hidden: args.include_hidden || config.include_hidden,
    };
    info!("options: {:?}", options);

    let resolver = DateResolver::new(
        Rc::new(ExifTagReader::new()),
        Rc::new(SystemVideoReader::with_ffprobe(args.ffprobe)),
    );
    let plan = generate_plan(&options, &resolver)?;

    if let OutputFormat::Json = args.output {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    }

    if args.dry_run {
        if let OutputFormat::Table = args.output {
            plan.candidates.iter().for_each(print_line);
        }
        print_summary(&plan);
        eprintln!("dry-runモード: 実ファイルは変更していません。");
        return Ok(());
    }

    let result = apply_plan_with_progress(&plan, |candidate| {
        if let OutputFormat::Table = args.output {
            print_line(candidate);
        }
    })?;
    print_summary(&plan);
    let done = format!("リネーム完了: {}件", result.applied);
    match args.output {
        OutputFormat::Table => println!("{done}"),
        OutputFormat::Json => eprintln!("{done}"),
    }

    Ok(())
}

fn cmd_config_show() -> Result<()> {
    let config = load_config()?;
    let paths = app_paths()?;
    println!("設定ファイル: {}", paths.config_path.display());
    println!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}

fn cmd_config_init(force: bool) -> Result<()> {
    let paths = app_paths()?;
    if paths.config_path.exists() && !force {
        anyhow::bail!(
            "設定ファイルは既に存在します: {} (上書きするには --force を指定してください)",
            paths.config_path.display()
        );
    }
    let path = save_config(&AppConfig::default())?;
    println!("設定ファイルを作成しました: {}", path.display());
    Ok(())
}

fn print_line(candidate: &RenameCandidate) {
    let record = &candidate.record;
    println!(
        "{} -> {}  [{} {}]",
        candidate.original_name(),
        candidate.target_name(),
        record.date.format("%Y-%m-%d %H:%M:%S"),
        record.source.label()
    );
}

fn print_summary(plan: &RenamePlan) {
    eprintln!(
        "集計: scanned={} media={} non_media_skip={} hidden_skip={} fallback_date={}",
        plan.stats.scanned_files,
        plan.stats.media_files,
        plan.stats.skipped_non_media,
        plan.stats.skipped_hidden,
        plan.stats.fallback_dates
    );
}
