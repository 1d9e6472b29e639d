use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use scorereel::{
    Installation, Point, Recording, Settings, Viewport, render::pixmap_to_rgba_image,
    video::ffmpeg::{FfmpegLoader, probe_video},
};

#[derive(Parser, Debug)]
#[command(name = "scorereel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the interactive installation (requires the `window` feature).
    Run(RunArgs),
    /// Render the report of a saved recording as a PNG.
    Report(ReportArgs),
    /// Print what ffprobe reports about a video (requires `ffprobe` on PATH).
    Probe(ProbeArgs),
}

#[derive(Parser, Debug)]
struct RunArgs {
    /// Settings JSON; defaults apply to missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start in borderless fullscreen.
    #[arg(long)]
    fullscreen: bool,
}

#[derive(Parser, Debug)]
struct ReportArgs {
    /// Recording CSV written by a save.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Settings JSON; defaults apply to missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame width; defaults to the configured window width.
    #[arg(long)]
    width: Option<u32>,

    /// Frame height; defaults to the configured window height.
    #[arg(long)]
    height: Option<u32>,

    /// Cursor position selecting the scrub preview frame; defaults to the center.
    #[arg(long)]
    cursor_x: Option<f64>,
}

#[derive(Parser, Debug)]
struct ProbeArgs {
    #[arg(long)]
    video: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Run(args) => cmd_run(args),
        Command::Report(args) => cmd_report(args),
        Command::Probe(args) => cmd_probe(args),
    }
}

fn load_settings(path: Option<&PathBuf>) -> anyhow::Result<Settings> {
    match path {
        Some(p) => Ok(Settings::from_path(p)?),
        None => Ok(Settings::default()),
    }
}

#[cfg(feature = "window")]
fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.config.as_ref())?;
    scorereel::shell::run(settings, args.fullscreen)?;
    Ok(())
}

#[cfg(not(feature = "window"))]
fn cmd_run(args: RunArgs) -> anyhow::Result<()> {
    let _ = load_settings(args.config.as_ref())?;
    anyhow::bail!("scorereel was built without the `window` feature; rebuild with `--features window`")
}

fn cmd_report(args: ReportArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.config.as_ref())?;
    let viewport = Viewport::new(
        args.width.unwrap_or(settings.window_width),
        args.height.unwrap_or(settings.window_height),
    )?;
    let recording = Recording::read(&args.in_path)?;

    let loader = FfmpegLoader::new(settings.assets_root.clone());
    let mut app = Installation::new(settings, viewport, Box::new(loader));
    app.setup();
    app.load_recording(recording);
    let x = args.cursor_x.unwrap_or(viewport.width_f64() / 2.0);
    app.cursor_moved(Point::new(x, app.cursor().y));

    let image = pixmap_to_rgba_image(app.draw())?;
    if let Some(parent) = args.out.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image
        .save(&args.out)
        .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_probe(args: ProbeArgs) -> anyhow::Result<()> {
    let info = probe_video(&args.video)?;
    println!("path:     {}", info.source_path.display());
    println!("size:     {}x{}", info.width, info.height);
    println!("fps:      {:.3} ({}/{})", info.source_fps(), info.fps_num, info.fps_den);
    println!("frames:   {}", info.frame_count);
    println!("duration: {:.3} s", info.duration_sec);
    Ok(())
}
