use std::fs::File;
use std::io::{self, BufReader, IsTerminal};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use sdnroute_cli::{Session, SessionOpts};
use sdnroute_core::{Controller, Volume, Weight};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Topology specification (JSON) to load before reading commands
    #[arg(short, long)]
    topology: Option<PathBuf>,

    /// Read commands from a file instead of standard input
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Weight of links added without one
    #[arg(long)]
    default_weight: Option<Weight>,

    /// Capacity of links added without one
    #[arg(long)]
    default_capacity: Option<Volume>,

    /// Treat node identifiers case-insensitively by lowercasing every command
    #[arg(long)]
    fold_case: bool,

    /// Print `visualize` output as JSON
    #[arg(long)]
    json: bool,

    /// Increase log verbosity (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let controller = load_controller(&args)?;
    let interactive = args.script.is_none() && io::stdin().is_terminal();
    let opts = SessionOpts {
        fold_case: args.fold_case,
        json: args.json,
        prompt: interactive,
    };
    let mut session = Session::new(controller, io::stdout().lock(), opts);
    match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            session.run(BufReader::new(file))
        }
        None => session.run(io::stdin().lock()),
    }
}

/// Builds the starting controller. Command-line defaults take precedence over those declared in
/// the topology file.
fn load_controller(args: &Args) -> anyhow::Result<Controller> {
    let spec = args
        .topology
        .as_ref()
        .map(sdnroute_utils::read_topology_spec)
        .transpose()
        .context("failed to read topology")?;
    let mut opts = spec
        .as_ref()
        .and_then(|s| s.defaults)
        .unwrap_or_default();
    if let Some(weight) = args.default_weight {
        opts.default_weight = weight;
    }
    if let Some(capacity) = args.default_capacity {
        opts.default_capacity = capacity;
    }
    match spec {
        Some(spec) => spec.build(opts).context("failed to build topology"),
        None => Ok(Controller::new(opts)),
    }
}
