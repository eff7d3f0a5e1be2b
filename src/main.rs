// Command-line front end.
// `edit` runs a script of steps headlessly; `view` (feature "viewer") opens a
// window with keyboard/mouse control and optional live camera.

#[cfg(feature = "viewer")]
mod viewer;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use dip_studio::{Command, NoDevice, Operation, Studio, StudioConfig};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "dip-studio", version)]
struct Cli {
    /// JSON settings file (camera, tick interval, pen, slider defaults).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Apply edit steps to an image and save the displayed result.
    Edit(EditArgs),
    /// Open a window on an image or the live camera.
    #[cfg(feature = "viewer")]
    View(ViewArgs),
}

#[derive(Parser, Debug)]
struct EditArgs {
    /// Input image (png, jpeg, bmp).
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image; format follows the extension.
    #[arg(long)]
    out: PathBuf,

    /// Steps in order: grayscale, blur:K, edge:LO:HI, sharpen, hue:DEG, bc:B:C,
    /// preview:bc:B:C, undo, redo, reset.
    #[arg(value_parser = parse_step)]
    steps: Vec<Step>,
}

#[cfg(feature = "viewer")]
#[derive(Parser, Debug)]
struct ViewArgs {
    /// Image to open.
    #[arg(long = "in")]
    in_path: Option<PathBuf>,

    /// Start the live camera right away.
    #[arg(long)]
    live: bool,

    /// Where the save key writes the displayed frame.
    #[arg(long, default_value = "dip-studio-out.png")]
    save_to: PathBuf,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Step {
    Commit(Operation),
    Preview(Operation),
    Undo,
    Redo,
    Reset,
}

impl Step {
    fn command(self) -> Command {
        match self {
            Step::Commit(op) => Command::Commit(op),
            Step::Preview(op) => Command::Preview(op),
            Step::Undo => Command::Undo,
            Step::Redo => Command::Redo,
            Step::Reset => Command::Reset,
        }
    }
}

fn parse_step(s: &str) -> Result<Step, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "undo" => Ok(Step::Undo),
        "redo" => Ok(Step::Redo),
        "reset" => Ok(Step::Reset),
        other => match other.strip_prefix("preview:") {
            Some(op) => op.parse().map(Step::Preview).map_err(|e| e.to_string()),
            None => other.parse().map(Step::Commit).map_err(|e| e.to_string()),
        },
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => StudioConfig::load(path).with_context(|| format!("load config {}", path.display()))?,
        None => StudioConfig::default(),
    };

    match cli.cmd {
        Cmd::Edit(args) => run_edit(args, &config),
        #[cfg(feature = "viewer")]
        Cmd::View(args) => run_view(args, &config),
    }
}

fn run_edit(args: EditArgs, config: &StudioConfig) -> anyhow::Result<()> {
    let mut studio = Studio::new(NoDevice, config);

    studio
        .execute(Command::Load(args.in_path.clone()))
        .with_context(|| format!("load {}", args.in_path.display()))?;
    for (i, step) in args.steps.iter().enumerate() {
        studio
            .execute(step.command())
            .with_context(|| format!("step {} ({step:?})", i + 1))?;
    }
    studio
        .execute(Command::Save(args.out.clone()))
        .with_context(|| format!("save {}", args.out.display()))?;

    let session = studio.session();
    tracing::info!(
        history = session.history_len(),
        redo = session.redo_len(),
        out = %args.out.display(),
        "edit finished"
    );
    Ok(())
}

#[cfg(feature = "viewer")]
fn run_view(args: ViewArgs, config: &StudioConfig) -> anyhow::Result<()> {
    #[cfg(feature = "camera")]
    let device = dip_studio::camera::NokhwaDevice::new(config.camera.clone());
    #[cfg(not(feature = "camera"))]
    let device = NoDevice;

    let mut studio = Studio::new(device, config);
    if let Some(path) = &args.in_path {
        studio
            .execute(Command::Load(path.clone()))
            .with_context(|| format!("load {}", path.display()))?;
    }
    if args.live {
        studio.execute(Command::StartLive).context("start live capture")?;
    }
    viewer::run(&mut studio, config, &args.save_to)
}
