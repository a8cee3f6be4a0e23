use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use stickerloop::{
    AlignDirOptions, AlignOptions, AlignRequest, AnchorMap, AnimationSpec, AssembleOptions,
    BackgroundSpec, CombineOptions, GridSpec, MatteOptions, PublishLimits, Rgb8, TimingSpec,
    TotalDuration, VerticalAnchor,
};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "stickerloop", version, about = "Align generated frames into looping APNG stickers")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). Logs go to stderr.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Split a sprite sheet into frame_NNN.png files.
    Cut(CutArgs),
    /// Remove backgrounds and align frames onto one shared canvas.
    Align(AlignArgs),
    /// Combine frames into an APNG and validate it.
    Combine(CombineArgs),
    /// Validate an existing PNG/APNG against publishing limits.
    Validate(ValidateArgs),
}

#[derive(Parser, Debug)]
struct CutArgs {
    /// Sprite sheet image.
    image: PathBuf,

    #[arg(long)]
    rows: Option<u32>,

    #[arg(long)]
    cols: Option<u32>,

    /// Number of frames to keep (row-major); defaults to every cell.
    #[arg(long)]
    count: Option<u32>,

    /// Detect rows/cols from background divider bands.
    #[arg(long, default_value_t = false, conflicts_with_all = ["rows", "cols"])]
    auto_grid: bool,

    /// Output frame directory.
    #[arg(short, long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct AlignArgs {
    /// Directory of input frames (*.png, sorted by name).
    frames_dir: PathBuf,

    /// Output frame directory.
    #[arg(short, long)]
    out: PathBuf,

    /// Force the canvas width.
    #[arg(long)]
    width: Option<u32>,

    /// Force the canvas height.
    #[arg(long)]
    height: Option<u32>,

    /// Background key color, e.g. "#00FF00". Overrides the animation spec.
    #[arg(long)]
    chroma_key: Option<Rgb8>,

    /// Animation spec JSON (background mode, chroma key, frame prompts).
    #[arg(long)]
    spec: Option<PathBuf>,

    /// Vertical anchor: pins feet/head rows in anchor-file and pixel modes, bbox edges otherwise.
    #[arg(long, value_enum, default_value_t = AnchorArg::Center)]
    anchor: AnchorArg,

    /// Gaussian feather radius for the alpha edge, in pixels.
    #[arg(long, default_value_t = 0.0)]
    edge_feather: f32,

    /// Per-frame anchor JSON (filename -> {center_x, center_y, feet_y, head_y}).
    #[arg(long)]
    anchor_file: Option<PathBuf>,

    /// Place each frame by its alpha-weighted centroid.
    #[arg(long, default_value_t = false)]
    pixel_align: bool,

    /// Pin each frame's bbox bottom to one canvas row.
    #[arg(long, default_value_t = false)]
    bottom_anchor: bool,

    /// Print placements as JSON lines instead of text.
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AnchorArg {
    Center,
    Bottom,
    Top,
}

impl From<AnchorArg> for VerticalAnchor {
    fn from(value: AnchorArg) -> Self {
        match value {
            AnchorArg::Center => Self::Center,
            AnchorArg::Bottom => Self::Bottom,
            AnchorArg::Top => Self::Top,
        }
    }
}

#[derive(Parser, Debug)]
struct CombineArgs {
    /// Directory of aligned frames.
    frames_dir: PathBuf,

    /// Output APNG path.
    #[arg(short, long)]
    out: PathBuf,

    /// Frames per second used to derive the total duration (default 16).
    #[arg(long, conflicts_with = "duration")]
    fps: Option<f64>,

    /// Total duration in milliseconds.
    #[arg(long)]
    duration: Option<u32>,

    /// Timing preset (uniform, ease-in, ease-out, ease-in-out, bounce) or a ms list "80,60,80".
    #[arg(long)]
    timing: Option<TimingSpec>,

    /// Play count; 0 loops forever.
    #[arg(long = "loop", default_value_t = 0)]
    loop_count: u32,

    /// Reduce frames to a shared 256-color palette.
    #[arg(long, default_value_t = false)]
    quantize: bool,

    /// Scale down (80% per attempt, up to 3 attempts) while over 1 MB.
    #[arg(long, default_value_t = false)]
    auto_resize: bool,

    /// Downscale frames to fit the animated sticker limits before encoding.
    #[arg(long, default_value_t = false)]
    fit: bool,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// PNG or APNG to check.
    file: PathBuf,

    /// Check against static sticker limits instead of animated ones.
    #[arg(long = "static", default_value_t = false)]
    static_sticker: bool,

    /// Print the report as JSON.
    #[arg(long, default_value_t = false)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Cut(args) => cmd_cut(args),
        Command::Align(args) => cmd_align(args),
        Command::Combine(args) => cmd_combine(args),
        Command::Validate(args) => cmd_validate(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn cmd_cut(args: CutArgs) -> anyhow::Result<()> {
    let spec = if args.auto_grid {
        GridSpec::Auto { count: args.count }
    } else {
        match (args.rows, args.cols) {
            (Some(rows), Some(cols)) => GridSpec::Explicit {
                rows,
                cols,
                count: args.count,
            },
            _ => anyhow::bail!("pass either --auto-grid or both --rows and --cols"),
        }
    };

    let cut = stickerloop::cut_sheet_to_dir(&args.image, &spec, &args.out)?;
    eprintln!(
        "cut {} frames ({}x{} cells, {} cols x {} rows) into {}",
        cut.paths.len(),
        cut.grid.cell_width,
        cut.grid.cell_height,
        cut.grid.cols,
        cut.grid.rows,
        args.out.display()
    );
    for path in &cut.paths {
        println!("{}", path.display());
    }
    Ok(())
}

fn cmd_align(args: AlignArgs) -> anyhow::Result<()> {
    let animation = args
        .spec
        .as_deref()
        .map(AnimationSpec::from_path)
        .transpose()?;

    let background = match (args.chroma_key, &animation) {
        (Some(key), _) => BackgroundSpec::Chroma(key),
        (None, Some(spec)) => spec.background_spec()?,
        (None, None) => BackgroundSpec::Auto,
    };
    let anchors = args
        .anchor_file
        .as_deref()
        .map(AnchorMap::from_path)
        .transpose()?;

    let opts = AlignDirOptions {
        matte: MatteOptions {
            background,
            feather_radius: args.edge_feather,
            ..MatteOptions::default()
        },
        align: AlignOptions {
            request: AlignRequest {
                anchors,
                pixel_centroid: args.pixel_align,
                bottom_anchor: args.bottom_anchor,
                vertical: args.anchor.into(),
            },
            canvas_width: args.width,
            canvas_height: args.height,
        },
        expected_frames: animation
            .as_ref()
            .map(AnimationSpec::frame_count)
            .filter(|&n| n > 0),
    };

    let plan = stickerloop::align_dir(&args.frames_dir, &args.out, &opts)?;
    eprintln!(
        "aligned {} frames onto {}x{} ({} mode) in {}",
        plan.placements.len(),
        plan.canvas.width,
        plan.canvas.height,
        plan.mode,
        args.out.display()
    );
    for placement in &plan.placements {
        if args.json {
            println!(
                "{}",
                serde_json::to_string(placement).context("serialize placement")?
            );
        } else {
            println!("{placement}");
        }
    }
    Ok(())
}

fn cmd_combine(args: CombineArgs) -> anyhow::Result<()> {
    let limits = PublishLimits::animated();
    let total = match (args.duration, args.fps) {
        (Some(ms), _) => TotalDuration::Millis(ms),
        (None, Some(fps)) => TotalDuration::Fps(fps),
        (None, None) => TotalDuration::default(),
    };
    let opts = CombineOptions {
        total,
        timing: args.timing.clone().unwrap_or_default(),
        assemble: AssembleOptions {
            quantize: args.quantize,
            auto_resize: args.auto_resize,
            loop_count: args.loop_count,
            fit_within: args.fit.then_some((limits.max_width, limits.max_height)),
            ..AssembleOptions::default()
        },
        limits,
    };

    let summary = stickerloop::combine_dir(&args.frames_dir, &args.out, &opts)?;
    let artifact = &summary.outcome.artifact;
    let timing_label = match &opts.timing {
        TimingSpec::Preset(preset) => preset.to_string(),
        TimingSpec::Explicit(_) => "explicit".to_owned(),
    };
    println!(
        "created {}: {} frames, {} ms total, {}x{}, {:.1} KB, timing={timing_label}{}",
        summary.path.display(),
        artifact.frame_count,
        artifact.total_duration_ms(),
        artifact.width,
        artifact.height,
        artifact.byte_size() as f64 / 1024.0,
        if artifact.quantized { ", quantized" } else { "" },
    );
    if artifact.resize_attempts > 0 {
        println!("auto-resized {} time(s)", artifact.resize_attempts);
    }
    print!("{}", summary.report);

    if let Some(err) = summary.outcome.budget_error() {
        return Err(err).context(format!("'{}' is still over the size budget", args.out.display()));
    }
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let limits = if args.static_sticker {
        PublishLimits::static_sticker()
    } else {
        PublishLimits::animated()
    };
    let report = stickerloop::validate_file(&args.file, &limits)?;
    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("serialize report")?
        );
    } else {
        print!("{report}");
    }
    if !report.passed() {
        anyhow::bail!("'{}' fails publishing limits", display_name(&args.file));
    }
    Ok(())
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
