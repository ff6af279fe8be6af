use std::io;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{
    create_net::CreateNetArg, evolve::EvolveArg, replay::ReplayArg, show_net::ShowNetArg,
};

mod create_net;
mod evolve;
mod replay;
mod show_net;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log debug messages (overridden by RUST_LOG)
    #[arg(long, short, global = true)]
    verbose: bool,
    /// What to do
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Evolve controllers for a built-in task
    Evolve(#[clap(flatten)] EvolveArg),
    /// Write the controller architecture of a run configuration to a .net file
    CreateNet(#[clap(flatten)] CreateNetArg),
    /// Describe a .net or .phe file
    ShowNet(#[clap(flatten)] ShowNetArg),
    /// Re-evaluate saved genomes on the task of a run configuration
    Replay(#[clap(flatten)] ReplayArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    init_tracing(args.verbose);
    match args.mode {
        Mode::Evolve(arg) => evolve::run(&arg)?,
        Mode::CreateNet(arg) => create_net::run(&arg)?,
        Mode::ShowNet(arg) => show_net::run(&arg)?,
        Mode::Replay(arg) => replay::run(&arg)?,
    }
    Ok(())
}

/// Logs go to stderr so reports on stdout stay machine readable.
fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}
