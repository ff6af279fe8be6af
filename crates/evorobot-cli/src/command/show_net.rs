use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use evorobot_net::{Evonet, is_default};
use serde::Serialize;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ShowNetArg {
    /// A .net file, or a .phe file to include pinned parameters
    net: PathBuf,
    /// Write the description to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize)]
struct NetDescription {
    path: PathBuf,
    neurons: usize,
    inputs: usize,
    hiddens: usize,
    outputs: usize,
    labels: Vec<String>,
    blocks: Vec<String>,
    free_parameters: usize,
    parameters: Vec<ParameterDescription>,
}

#[derive(Debug, Clone, Serialize)]
struct ParameterDescription {
    name: String,
    /// Pinned value, `None` when the parameter evolves freely.
    pinned: Option<f32>,
    /// Own mutation rate, `None` for the global rate.
    mutation: Option<f32>,
}

pub(crate) fn run(arg: &ShowNetArg) -> anyhow::Result<()> {
    let net = load(&arg.net)?;
    util::write_json(&describe(&net, arg.net.clone()), arg.output.as_deref())
}

fn load(path: &Path) -> anyhow::Result<Evonet> {
    let mut net = Evonet::new();
    let is_phe = path.extension().is_some_and(|ext| ext == "phe");
    let found = if is_phe {
        net.load_parameter_overrides(path)
    } else {
        net.load_architecture(path)
    }
    .with_context(|| format!("Failed to read {}", path.display()))?;
    if !found {
        bail!("Network file not found: {}", path.display());
    }
    Ok(net)
}

fn describe(net: &Evonet, path: PathBuf) -> NetDescription {
    let free = net.parameters();
    let defined = |value: f32| (!is_default(value)).then_some(value);
    let parameters = net
        .parameter_descriptions()
        .into_iter()
        .zip(free.overrides().iter().zip(free.mutations()))
        .map(|(name, (&pinned, &mutation))| ParameterDescription {
            name,
            pinned: defined(pinned),
            mutation: defined(mutation),
        })
        .collect();
    NetDescription {
        path,
        neurons: net.nneurons(),
        inputs: net.ninputs(),
        hiddens: net.nhiddens(),
        outputs: net.noutputs(),
        labels: net.neurons().iter().map(|n| n.label().to_owned()).collect(),
        blocks: net.blocks().iter().map(ToString::to_string).collect(),
        free_parameters: net.free_parameters(),
        parameters,
    }
}
