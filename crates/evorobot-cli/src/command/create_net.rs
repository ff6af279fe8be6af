use std::path::PathBuf;

use anyhow::Context;
use tracing::info;

use crate::experiment::{RunConfig, TaskKind, with_experiment};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct CreateNetArg {
    /// Run configuration (JSON); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Task whose sensors and motors the network serves
    #[arg(long, value_enum)]
    task: Option<TaskKind>,
    /// Also write the current free parameters, producing a .phe file
    #[arg(long)]
    with_parameters: bool,
    /// File to write
    #[arg(long, short)]
    output: PathBuf,
}

pub(crate) fn run(arg: &CreateNetArg) -> anyhow::Result<()> {
    let mut config = RunConfig::load(arg.config.as_deref())?;
    if let Some(task) = arg.task {
        config.task.kind = task;
    }
    // binding the task labels the input and output neurons
    let net = with_experiment!(&config, experiment => experiment.into_net());
    net.save_architecture(&arg.output, arg.with_parameters)
        .with_context(|| format!("Failed to write {}", arg.output.display()))?;
    info!(
        path = %arg.output.display(),
        neurons = net.nneurons(),
        parameters = net.free_parameters(),
        "network created"
    );
    Ok(())
}
