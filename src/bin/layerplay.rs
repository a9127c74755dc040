use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use layerplay::{
    BackendKind, CaptureOpts, ClockChannel, Fps, FrameRGBA, LayerWatcher, Player, PlayerConfig,
    ReloadOutcome, create_backend, sink_for_output, unused_materials,
};

#[derive(Parser, Debug)]
#[command(name = "layerplay", version, about = "Layered demo player")]
struct Cli {
    /// Player configuration (`config.json`); every field is optional.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the render target width.
    #[arg(long, global = true)]
    width: Option<u32>,

    /// Override the render target height.
    #[arg(long, global = true)]
    height: Option<u32>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load and validate every layer, then print object counts.
    Check(DemoArg),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render a frame range to a PNG sequence or an MP4 (requires `ffmpeg` on PATH).
    Capture(CaptureArgs),
    /// Re-render a frame whenever a layer file is saved.
    Watch(WatchArgs),
    /// Write the bill of materials as JSON.
    Bom(BomArgs),
}

#[derive(Args, Debug)]
struct DemoArg {
    /// Demo root directory; overrides `demo` from the config.
    demo: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct FrameArgs {
    #[command(flatten)]
    demo: DemoArg,

    /// Playback position in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Also write the resolved clip masks next to the frame.
    #[arg(long, default_value_t = false)]
    masks: bool,
}

#[derive(Args, Debug)]
struct CaptureArgs {
    #[command(flatten)]
    demo: DemoArg,

    /// Output directory for PNG frames, or a `.mp4` file. Defaults to `capture.output`.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Frames per second. Defaults to `capture.framerate`.
    #[arg(long)]
    fps: Option<u32>,

    /// First second to capture.
    #[arg(long, default_value_t = 0.0)]
    from: f64,

    /// End of the capture in seconds. Defaults to the demo duration.
    #[arg(long)]
    to: Option<f64>,

    /// Do not mux the soundtrack.
    #[arg(long, default_value_t = false)]
    no_audio: bool,

    /// Average this many renders per frame. Defaults to `capture.temporal-blur`.
    #[arg(long)]
    blur_samples: Option<u32>,
}

#[derive(Args, Debug)]
struct WatchArgs {
    #[command(flatten)]
    demo: DemoArg,

    /// Playback position in seconds.
    #[arg(long, default_value_t = 0.0)]
    time: f64,

    /// Output PNG path, rewritten after every published reload.
    #[arg(long)]
    out: PathBuf,

    /// Poll interval in milliseconds (default 250).
    #[arg(long)]
    interval_ms: Option<u64>,
}

#[derive(Args, Debug)]
struct BomArgs {
    #[command(flatten)]
    demo: DemoArg,

    /// Output JSON path. Prints to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also list assets nothing references.
    #[arg(long, default_value_t = false)]
    unused: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let level = match cli.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let mut cfg = match &cli.config {
        Some(path) => PlayerConfig::load(path)?,
        None => PlayerConfig::default(),
    };
    if let Some(w) = cli.width {
        cfg.target.width = w;
    }
    if let Some(h) = cli.height {
        cfg.target.height = h;
    }
    let origin = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from("<command line>"));
    cfg.validate(&origin)?;

    match cli.cmd {
        Command::Check(args) => cmd_check(cfg, args),
        Command::Frame(args) => cmd_frame(cfg, args),
        Command::Capture(args) => cmd_capture(cfg, args),
        Command::Watch(args) => cmd_watch(cfg, args),
        Command::Bom(args) => cmd_bom(cfg, args),
    }
}

fn open(mut cfg: PlayerConfig, demo: DemoArg) -> anyhow::Result<(PlayerConfig, Player)> {
    if let Some(root) = demo.demo {
        cfg.demo = root;
    }
    let player = Player::open(
        &cfg,
        create_backend(BackendKind::Cpu),
        Box::new(ClockChannel::paused()),
    )?;
    Ok((cfg, player))
}

fn cmd_check(cfg: PlayerConfig, args: DemoArg) -> anyhow::Result<()> {
    let (_, player) = open(cfg, args)?;
    let snapshot = player.snapshot();
    println!(
        "{}: {} layer(s), {} object(s), ends at {:.3}",
        player.demo().title,
        snapshot.len(),
        snapshot.object_count(),
        snapshot.end_time()
    );
    for layer in snapshot.layers() {
        let repeated = layer.objects.iter().filter(|o| o.repetition > 0).count();
        println!(
            "  {:<24} z={:<4} enabled={:<5} objects={:<5} repetitions={}",
            layer.name(),
            layer.z_index,
            layer.enabled,
            layer.objects.len(),
            repeated
        );
    }
    Ok(())
}

fn cmd_frame(cfg: PlayerConfig, args: FrameArgs) -> anyhow::Result<()> {
    let (cfg, mut player) = open(cfg, args.demo)?;
    let time = player.demo().animation_time(args.time);
    let frame = player.render_at(time)?;
    write_png(&args.out, &frame.color)?;
    if args.masks {
        for (suffix, mask) in ["mask-a", "mask-b"].iter().zip(&frame.masks) {
            write_png(&sibling(&args.out, suffix), mask)?;
        }
    }
    write_bom_if_enabled(&cfg, &player)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_capture(cfg: PlayerConfig, args: CaptureArgs) -> anyhow::Result<()> {
    let (cfg, mut player) = open(cfg, args.demo)?;
    let out = args
        .out
        .or_else(|| cfg.capture.output.clone())
        .context("no capture output: pass --out or set capture.output")?;
    let fps = Fps::new(args.fps.unwrap_or(cfg.capture.framerate), 1)?;
    let opts = CaptureOpts {
        fps,
        from: args.from,
        to: args.to,
        audio: !args.no_audio,
        blur_samples: args
            .blur_samples
            .unwrap_or_else(|| cfg.capture.blur_samples())
            .max(1),
    };

    let mut sink = sink_for_output(&out, &cfg.capture);
    let stats = player.capture(&opts, sink.as_mut())?;
    write_bom_if_enabled(&cfg, &player)?;
    eprintln!("wrote {} frame(s) to {}", stats.frames, out.display());
    Ok(())
}

fn cmd_watch(cfg: PlayerConfig, args: WatchArgs) -> anyhow::Result<()> {
    let (_, mut player) = open(cfg, args.demo)?;
    let interval = args
        .interval_ms
        .map_or(LayerWatcher::DEFAULT_INTERVAL, |ms| Duration::from_millis(ms.max(10)));
    player.watch(interval)?;
    let time = player.demo().animation_time(args.time);

    write_png(&args.out, &player.render_at(time)?.color)?;
    eprintln!(
        "wrote {}; watching {}",
        args.out.display(),
        player.paths().animations().display()
    );
    loop {
        std::thread::sleep(interval);
        let outcomes = player.pump_reloads();
        if outcomes
            .iter()
            .all(|o| matches!(o, ReloadOutcome::Rejected(_)))
        {
            continue;
        }
        // Assets can fail after a published reload (e.g. deleted files); keep watching.
        match player.render_at(time) {
            Ok(frame) => {
                write_png(&args.out, &frame.color)?;
                eprintln!("wrote {}", args.out.display());
            }
            Err(err) => tracing::error!(error = %err, "frame render failed"),
        }
    }
}

fn cmd_bom(cfg: PlayerConfig, args: BomArgs) -> anyhow::Result<()> {
    let (_, player) = open(cfg, args.demo)?;
    let bom = player.bill_of_materials();
    let mut json = serde_json::to_value(&bom)?;
    if args.unused {
        json["unused"] = serde_json::to_value(unused_materials(&bom, &player.paths().assets())?)?;
    }
    let text = serde_json::to_string_pretty(&json)?;
    match args.out {
        Some(path) => {
            ensure_parent(&path)?;
            std::fs::write(&path, text).with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{text}"),
    }
    Ok(())
}

fn write_bom_if_enabled(cfg: &PlayerConfig, player: &Player) -> anyhow::Result<()> {
    if cfg.tools.bill_of_materials {
        let bom = player.bill_of_materials();
        std::fs::write("bill-of-materials.json", bom.to_json()?)
            .context("write bill-of-materials.json")?;
    }
    if cfg.tools.unused_materials {
        let unused = unused_materials(&player.bill_of_materials(), &player.paths().assets())?;
        std::fs::write("unused-materials.json", serde_json::to_string_pretty(&unused)?)
            .context("write unused-materials.json")?;
    }
    Ok(())
}

/// `out/frame.png` -> `out/frame.<suffix>.png`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "frame".to_string());
    path.with_file_name(format!("{stem}.{suffix}.png"))
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn write_png(path: &Path, frame: &FrameRGBA) -> anyhow::Result<()> {
    ensure_parent(path)?;
    frame
        .to_rgba_image()?
        .save_with_format(path, image::ImageFormat::Png)
        .with_context(|| format!("write png '{}'", path.display()))?;
    Ok(())
}
