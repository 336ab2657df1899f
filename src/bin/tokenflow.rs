use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use tokenflow::{ExampleFile, MountOpts, SceneMount, Step, View, model::step::VizMode};

#[derive(Parser, Debug)]
#[command(name = "tokenflow", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render one step at a substep as SVG (or PNG when `--out` ends in `.png`).
    Frame(FrameArgs),
    /// Print the animation script of a substep as JSON.
    Script(ScriptArgs),
    /// Print the token layout of a step as JSON.
    Layout(LayoutArgs),
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ViewChoice {
    TextGeneration,
    Training,
    Decoding,
}

impl From<ViewChoice> for View {
    fn from(v: ViewChoice) -> Self {
        match v {
            ViewChoice::TextGeneration => View::TextGeneration,
            ViewChoice::Training => View::Training,
            ViewChoice::Decoding => View::Decoding,
        }
    }
}

#[derive(Parser, Debug)]
struct MountArgs {
    /// Mount options JSON (`MountOpts`); flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Defaults to training for backprop steps, else text generation.
    #[arg(long, value_enum)]
    view: Option<ViewChoice>,

    /// Container width the token row must fit into.
    #[arg(long)]
    width: Option<f64>,

    /// Show every token instead of collapsing long rows.
    #[arg(long)]
    expanded: bool,

    /// Layer count hint (defaults to the example's model info).
    #[arg(long)]
    layers: Option<u32>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Example JSON (`generation_steps` or `training_steps`) or a single step JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Step index within the example.
    #[arg(long, default_value_t = 0)]
    step: usize,

    /// Substep shown completed.
    #[arg(long, default_value_t = 0)]
    substep: u32,

    /// Output path (`.svg` or `.png`).
    #[arg(long)]
    out: PathBuf,

    /// Device pixels per scene unit for PNG output.
    #[arg(long, default_value_t = 1.0)]
    scale: f32,

    #[command(flatten)]
    mount: MountArgs,
}

#[derive(Parser, Debug)]
struct ScriptArgs {
    #[arg(long, value_enum, default_value_t = ViewChoice::TextGeneration)]
    view: ViewChoice,

    #[arg(long)]
    substep: u32,

    /// Build the script for a continuation step (only the last token is new).
    #[arg(long)]
    continuation: bool,

    /// Seconds per substep.
    #[arg(long, default_value_t = 0.8)]
    duration: f64,
}

#[derive(Parser, Debug)]
struct LayoutArgs {
    /// Example JSON (`generation_steps` or `training_steps`) or a single step JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    #[arg(long, default_value_t = 0)]
    step: usize,

    #[command(flatten)]
    mount: MountArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Frame(args) => cmd_frame(args),
        Command::Script(args) => cmd_script(args),
        Command::Layout(args) => cmd_layout(args),
    }
}

/// Load an example file (inference or training) or a bare step.
fn read_steps(path: &Path) -> anyhow::Result<(Vec<Step>, Option<u32>)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read input '{}'", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text).context("parse input JSON")?;
    let is_example = ["generation_steps", "training_steps"]
        .iter()
        .any(|k| value.get(k).is_some());
    if !is_example && value.get("tokens").is_some() {
        let step: Step = serde_json::from_value(value).context("parse step JSON")?;
        return Ok((vec![step], None));
    }
    let ex = ExampleFile::from_json_str(&text)?;
    let layers = ex.num_layers();
    Ok((ex.into_steps(), layers))
}

fn mount_opts(
    args: &MountArgs,
    steps: &[Step],
    example_layers: Option<u32>,
) -> anyhow::Result<MountOpts> {
    let mut opts = match &args.config {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("read config '{}'", p.display()))?;
            serde_json::from_str(&text).context("parse config JSON")?
        }
        None => MountOpts::default(),
    };
    let backprop = steps.iter().any(|s| s.viz_mode() == VizMode::Backprop);
    match args.view {
        Some(v) => opts.view = v.into(),
        None if backprop && args.config.is_none() => opts.view = View::Training,
        None => {}
    }
    if let Some(w) = args.width {
        opts.container_width = w;
    }
    if args.expanded {
        opts.expanded = true;
    }
    if let Some(n) = args.layers.or(example_layers) {
        opts.num_layers = n;
    }
    opts.validate()?;
    Ok(opts)
}

fn pick_step(steps: Vec<Step>, index: usize) -> anyhow::Result<Step> {
    let count = steps.len();
    steps
        .into_iter()
        .nth(index)
        .with_context(|| format!("step {index} out of range (input has {count} steps)"))
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let (steps, layers) = read_steps(&args.in_path)?;
    let opts = mount_opts(&args.mount, &steps, layers)?;
    let step = pick_step(steps, args.step)?;

    let mut mount = SceneMount::new(opts)?;
    mount.set_step(step)?;
    mount.jump_to_substep(args.substep);
    let svg = mount.to_svg();

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    let is_png = args
        .out
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("png"));
    if is_png {
        tokenflow::scene::raster::save_png(&svg, args.scale, &args.out)?;
    } else {
        std::fs::write(&args.out, svg)
            .with_context(|| format!("write svg '{}'", args.out.display()))?;
    }

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_script(args: ScriptArgs) -> anyhow::Result<()> {
    if !args.duration.is_finite() || args.duration < 0.0 {
        anyhow::bail!("--duration must be finite and >= 0");
    }
    let view: View = args.view.into();
    let timeline = tokenflow::timeline_for(view);
    let script = timeline.build_timeline(args.substep, !args.continuation, args.duration);
    if script.is_empty() {
        eprintln!("substep {} of {view:?} has no operations", args.substep);
    }
    println!("{}", script.to_json_pretty()?);
    Ok(())
}

fn cmd_layout(args: LayoutArgs) -> anyhow::Result<()> {
    let (steps, layers) = read_steps(&args.in_path)?;
    let opts = mount_opts(&args.mount, &steps, layers)?;
    let step = pick_step(steps, args.step)?;

    let mut mount = SceneMount::new(opts)?;
    mount.set_step(step)?;
    let meta = &mount.layout().meta;
    println!(
        "{}",
        serde_json::to_string_pretty(meta).context("serialize layout")?
    );
    eprintln!(
        "{} visible slots, collapsed: {}",
        meta.visible.len(),
        meta.should_collapse
    );
    Ok(())
}
