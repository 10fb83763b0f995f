use std::{fs::File, io::BufReader, path::Path, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use cinescroll::{Orchestrator, OrchestratorConfig, Scene, SceneList, SceneStager, StagingConfig};

#[derive(Parser, Debug)]
#[command(name = "cinescroll", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print staging metrics for every scene at one progress ratio.
    Stage(StageArgs),
    /// Drive a synthetic scroll ramp through the full pipeline and emit one
    /// JSON line per frame.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct StageArgs {
    /// Input scene list JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Global progress ratio in [0,1].
    #[arg(long)]
    progress: f64,

    /// Pretty-print the output.
    #[arg(long)]
    pretty: bool,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Input scene list JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Number of frames to simulate at 60fps.
    #[arg(long, default_value_t = 240)]
    frames: u64,

    /// Total scrollable height in host units.
    #[arg(long, default_value_t = 4000.0)]
    height: f64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Stage(args) => cmd_stage(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn read_scenes_json(path: &Path) -> anyhow::Result<Vec<Scene>> {
    let f = File::open(path).with_context(|| format!("open scene list '{}'", path.display()))?;
    let r = BufReader::new(f);
    let scenes: Vec<Scene> = serde_json::from_reader(r).with_context(|| "parse scene JSON")?;
    Ok(scenes)
}

fn cmd_stage(args: StageArgs) -> anyhow::Result<()> {
    let scenes = read_scenes_json(&args.in_path)?;
    let list = SceneList::new(scenes)?;
    let mut stager = SceneStager::new(StagingConfig::default(), list.len())?;

    let metrics = stager.stage_all(args.progress.clamp(0.0, 1.0));
    let rows: Vec<serde_json::Value> = list
        .iter()
        .zip(&metrics)
        .map(|(scene, m)| {
            serde_json::json!({
                "scene_id": scene.id,
                "metrics": m,
            })
        })
        .collect();

    let out = if args.pretty {
        serde_json::to_string_pretty(&rows)?
    } else {
        serde_json::to_string(&rows)?
    };
    println!("{out}");
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    let scenes = read_scenes_json(&args.in_path)?;

    let mut config = OrchestratorConfig::default();
    config.smoother.total_scrollable_height = args.height;
    let mut orch = Orchestrator::new(scenes, config)?;

    let frame_ms = 1000.0 / 60.0;
    for i in 0..args.frames {
        let ts = i as f64 * frame_ms;
        let position = args.height * (i as f64 / args.frames.max(1) as f64);
        orch.push_input(position, ts);
        let out = orch.frame(ts)?;
        println!("{}", serde_json::to_string(&out)?);
    }
    Ok(())
}
