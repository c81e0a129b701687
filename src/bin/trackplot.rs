use std::{fs::File, io::BufReader, path::Path, path::PathBuf, sync::Arc};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "trackplot", version)]
struct Cli {
    /// Catalog manifest JSON (videos, containers, frames).
    #[arg(long)]
    catalog: PathBuf,

    /// Pipeline configuration JSON; defaults apply for missing fields.
    #[arg(long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract a single frame image and print its path.
    Frame(FrameArgs),
    /// Reassemble frames into a video (requires `ffmpeg` on PATH).
    Video(VideoArgs),
    /// Plot overlays onto a single frame and print the artifact path.
    PlotFrame(PlotFrameArgs),
    /// Plot a descriptor sequence into a video (requires `ffmpeg` on PATH).
    PlotVideo(PlotVideoArgs),
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Frame id to extract.
    #[arg(long)]
    id: u64,
}

#[derive(Parser, Debug)]
struct VideoArgs {
    /// Frame ids, in output order.
    #[arg(long, value_delimiter = ',', required = true)]
    ids: Vec<u64>,
}

#[derive(Parser, Debug)]
struct PlotFrameArgs {
    /// Frame id to plot.
    #[arg(long)]
    id: u64,

    /// X coordinates (equal length with --y and --rot).
    #[arg(long, value_delimiter = ',')]
    x: Vec<f64>,

    /// Y coordinates.
    #[arg(long, value_delimiter = ',')]
    y: Vec<f64>,

    /// Rotations in radians.
    #[arg(long, value_delimiter = ',')]
    rot: Vec<f64>,
}

#[derive(Parser, Debug)]
struct PlotVideoArgs {
    /// Descriptor list JSON (`[{"frame_id": .., "x": [..], ...}, ..]`).
    #[arg(long)]
    request: PathBuf,

    /// Insert plain descriptors for index gaps within a container.
    #[arg(long)]
    fill_gap: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => read_json::<trackplot::PlotConfig>(path)?,
        None => trackplot::PlotConfig::default(),
    };
    let catalog: trackplot::MemoryCatalog = read_json(&cli.catalog)?;
    let service = trackplot::PlotService::new(config, Arc::new(catalog))?;

    let artifact = match cli.cmd {
        Command::Frame(args) => service.single_frame_path(args.id)?,
        Command::Video(args) => service.video_path(&args.ids)?,
        Command::PlotFrame(args) => {
            service.plot_single_frame(args.id, &args.x, &args.y, &args.rot)?
        }
        Command::PlotVideo(args) => {
            let descriptors: Vec<trackplot::FrameDescriptor> = read_json(&args.request)?;
            service.plot_video(&descriptors, args.fill_gap)?
        }
    };

    println!("{}", artifact.display());
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> anyhow::Result<T> {
    let f = File::open(path).with_context(|| format!("open '{}'", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parse JSON '{}'", path.display()))
}
