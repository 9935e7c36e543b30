use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use asmviz::{ConfigMap, OutputFormat, Quality, Registry, RenderJob};

#[derive(Parser, Debug)]
#[command(name = "asmviz", version, about = "Mastermind assembly animations")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render an animation to a GIF or MP4.
    Run(RunArgs),
    /// List the available animations.
    List,
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Animation name (see `list`).
    name: String,

    /// Output container.
    #[arg(long, value_enum, default_value_t = FormatArg::Gif)]
    format: FormatArg,

    /// Quality preset.
    #[arg(long, value_enum, default_value_t = QualityArg::High)]
    quality: QualityArg,

    /// Output directory.
    #[arg(long, default_value = "media")]
    output: PathBuf,

    /// JSON file with configuration overrides.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Animation name (see `list`).
    name: String,

    /// Timeline position in seconds.
    #[arg(long, default_value_t = 0.0)]
    at: f64,

    /// Quality preset.
    #[arg(long, value_enum, default_value_t = QualityArg::High)]
    quality: QualityArg,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// JSON file with configuration overrides.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Gif,
    Video,
}

impl From<FormatArg> for OutputFormat {
    fn from(v: FormatArg) -> Self {
        match v {
            FormatArg::Gif => Self::Gif,
            FormatArg::Video => Self::Video,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum QualityArg {
    Low,
    Medium,
    High,
}

impl From<QualityArg> for Quality {
    fn from(v: QualityArg) -> Self {
        match v {
            QualityArg::Low => Self::Low,
            QualityArg::Medium => Self::Medium,
            QualityArg::High => Self::High,
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::List => cmd_list(),
        Command::Frame(args) => cmd_frame(args),
    }
}

fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let registry = Registry::builtin();
    let job = RenderJob {
        animation: args.name,
        overrides: load_overrides(args.config.as_deref())?,
        format: args.format.into(),
        quality: args.quality.into(),
        out_dir: args.output,
    };
    let report = asmviz::render_job(&registry, &job)?;
    eprintln!(
        "wrote {} ({} frames, {:.1}s)",
        report.out_path.display(),
        report.frames,
        report.duration_secs
    );
    Ok(())
}

fn cmd_list() -> anyhow::Result<()> {
    let registry = Registry::builtin();
    for spec in registry.specs() {
        println!("{:<28}{}", spec.name, spec.description);
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let registry = Registry::builtin();
    let job = RenderJob {
        animation: args.name,
        overrides: load_overrides(args.config.as_deref())?,
        format: OutputFormat::Gif,
        quality: args.quality.into(),
        out_dir: PathBuf::new(),
    };
    asmviz::render_frame_png(&registry, &job, args.at, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn load_overrides(path: Option<&std::path::Path>) -> anyhow::Result<ConfigMap> {
    let Some(path) = path else {
        return Ok(ConfigMap::new());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read config '{}'", path.display()))?;
    let map: ConfigMap = serde_json::from_str(&text)
        .with_context(|| format!("parse config '{}' as a JSON object", path.display()))?;
    Ok(map)
}
