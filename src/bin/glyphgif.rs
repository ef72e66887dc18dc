use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "glyphgif", version)]
struct Cli {
    /// Log verbosity on stderr (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a GIF in the terminal at its own frame rate.
    Play(PlayArgs),
    /// Write every frame as text (and PNG) into a directory.
    Export(ExportArgs),
    /// Decode a GIF and print its header, loop count, comments and delays as JSON.
    Inspect(InspectArgs),
}

#[derive(Args, Debug)]
struct RenderArgs {
    /// Input GIF path, or `-` for stdin.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Options JSON; command-line flags override its fields.
    #[arg(long)]
    opts: Option<PathBuf>,

    /// Target glyph columns.
    #[arg(long)]
    width: Option<u32>,

    /// Glyph gradient, lightest to darkest.
    #[arg(long)]
    gradient: Option<String>,
}

#[derive(Args, Debug)]
struct PlayArgs {
    #[command(flatten)]
    render: RenderArgs,

    /// Replay the animation after decoding, honoring the GIF loop count.
    #[arg(long = "loop")]
    replay: bool,

    /// Cap on replay passes.
    #[arg(long)]
    max_loops: Option<u32>,

    /// Print frames one after another instead of redrawing in place.
    #[arg(long)]
    plain: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[command(flatten)]
    render: RenderArgs,

    /// Output directory.
    #[arg(long)]
    out: PathBuf,

    /// Skip PNG snapshots.
    #[arg(long)]
    no_png: bool,
}

#[derive(Args, Debug)]
struct InspectArgs {
    /// Input GIF path, or `-` for stdin.
    #[arg(long = "in")]
    in_path: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Play(args) => cmd_play(args),
        Command::Export(args) => cmd_export(args),
        Command::Inspect(args) => cmd_inspect(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(level)
        .with_target(false)
        .init();
}

fn load_opts(args: &RenderArgs) -> anyhow::Result<glyphgif::SessionOpts> {
    let mut opts = match &args.opts {
        Some(path) => glyphgif::SessionOpts::from_path(path)?,
        None => glyphgif::SessionOpts::default(),
    };
    if let Some(width) = args.width {
        opts.target_width = width;
    }
    if let Some(gradient) = &args.gradient {
        opts.gradient = gradient.clone();
    }
    Ok(opts)
}

fn open_source(path: &Path, chunk_size: usize) -> anyhow::Result<Box<dyn glyphgif::ByteSource>> {
    if path == Path::new("-") {
        return Ok(Box::new(glyphgif::ReaderSource::new(
            std::io::stdin().lock(),
            chunk_size,
        )));
    }
    let f = File::open(path).with_context(|| format!("open gif '{}'", path.display()))?;
    Ok(Box::new(glyphgif::ReaderSource::new(
        BufReader::new(f),
        chunk_size,
    )))
}

fn cmd_play(args: PlayArgs) -> anyhow::Result<()> {
    let mut opts = load_opts(&args.render)?;
    opts.pace = true;
    opts.replay |= args.replay;
    if args.max_loops.is_some() {
        opts.max_loops = args.max_loops;
    }

    let mut source = open_source(&args.render.in_path, opts.chunk_size)?;
    let stdout = std::io::stdout();
    let mut sink = if args.plain {
        glyphgif::TerminalSink::plain(stdout)
    } else {
        glyphgif::TerminalSink::new(stdout)
    };
    let mut session = glyphgif::DecodeSession::new(opts)?;
    session
        .run(source.as_mut(), &mut sink)
        .with_context(|| format!("play '{}'", args.render.in_path.display()))?;
    Ok(())
}

fn cmd_export(args: ExportArgs) -> anyhow::Result<()> {
    let mut opts = load_opts(&args.render)?;
    opts.pace = false;
    opts.replay = false;
    opts.raster = !args.no_png;

    let mut source = open_source(&args.render.in_path, opts.chunk_size)?;
    let mut sink = glyphgif::DirectorySink::new(&args.out);
    let mut session = glyphgif::DecodeSession::new(opts)?;
    let stats = session
        .run(source.as_mut(), &mut sink)
        .with_context(|| format!("export '{}'", args.render.in_path.display()))?;

    eprintln!("wrote {} frames to {}", stats.frames, args.out.display());
    Ok(())
}

fn cmd_inspect(args: InspectArgs) -> anyhow::Result<()> {
    let opts = glyphgif::SessionOpts {
        pace: false,
        ..glyphgif::SessionOpts::default()
    };
    let mut source = open_source(&args.in_path, opts.chunk_size)?;
    let mut sink = glyphgif::InMemorySink::new();
    let mut session = glyphgif::DecodeSession::new(opts)?;
    let stats = session
        .run(source.as_mut(), &mut sink)
        .with_context(|| format!("inspect '{}'", args.in_path.display()))?;

    let ctx = session.context();
    let summary = sink.summary().cloned().unwrap_or_default();
    let report = serde_json::json!({
        "version": ctx.version,
        "width": ctx.width,
        "height": ctx.height,
        "background_index": ctx.background_index,
        "global_color_table": ctx.global_color_table.as_ref().map(|t| t.len()),
        "frames": stats.frames,
        "bytes": stats.bytes_read,
        "loop_count": summary.loop_count,
        "comments": summary.comments,
        "delays": summary.delays,
    });
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
