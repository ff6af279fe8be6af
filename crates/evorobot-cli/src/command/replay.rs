use std::path::{Path, PathBuf};

use anyhow::{Context, ensure};
use evorobot_ga::{Experiment, Gene, persistence};
use serde::Serialize;
use tracing::info;

use crate::{
    experiment::{GeneKind, RunConfig, with_experiment},
    util,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct ReplayArg {
    /// Genome file written by `evolve` (G<gen>S<seed>.gen, B0S<seed>.gen, ...)
    genomes: PathBuf,
    /// Run configuration (JSON) the genomes were evolved with
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only replay the genome at this position of the file
    #[arg(long)]
    individual: Option<usize>,
    /// Seed of the trials, defaults to the seed of the run configuration
    #[arg(long)]
    seed: Option<u64>,
    /// Write the report to this file instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
struct ReplayedGenome {
    index: usize,
    name: String,
    fitness: f64,
}

pub(crate) fn run(arg: &ReplayArg) -> anyhow::Result<()> {
    let config = RunConfig::load(arg.config.as_deref())?;
    let seed = arg.seed.unwrap_or(config.ga.seed);
    let report = with_experiment!(&config, experiment => match config.gene {
        GeneKind::Integer => replay::<u8, _>(experiment, &arg.genomes, arg.individual, seed)?,
        GeneKind::Real => replay::<f32, _>(experiment, &arg.genomes, arg.individual, seed)?,
    });
    util::write_json(&report, arg.output.as_deref())
}

fn replay<G, E>(
    mut experiment: E,
    path: &Path,
    individual: Option<usize>,
    seed: u64,
) -> anyhow::Result<Vec<ReplayedGenome>>
where
    G: Gene,
    E: Experiment<G>,
{
    let records = persistence::read_genomes::<G>(path)
        .with_context(|| format!("Failed to read genomes from {}", path.display()))?;
    if let Some(index) = individual {
        ensure!(
            index < records.len(),
            "{} holds {} genomes, there is no genome {index}",
            path.display(),
            records.len()
        );
    }
    let expected = experiment.genome_length();
    experiment.new_ga_seed(seed);

    let mut report = vec![];
    for (index, record) in records.into_iter().enumerate() {
        if individual.is_some_and(|i| i != index) {
            continue;
        }
        ensure!(
            record.genes.len() == expected,
            "genome {} has {} genes, the controller needs {expected}",
            record.name,
            record.genes.len()
        );
        experiment.set_net_parameters(&record.genes);
        experiment.do_all_trials_for_individual(index);
        let fitness = experiment.fitness();
        info!(index, name = %record.name, fitness, "replayed");
        report.push(ReplayedGenome {
            index,
            name: record.name,
            fitness,
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::{fs::File, io::Write as _};

    use super::*;
    use crate::experiment::XorExperiment;

    fn xor() -> XorExperiment {
        XorExperiment::new(RunConfig::default().build_net().unwrap()).unwrap()
    }

    fn write_genomes(path: &Path, genomes: &[(&str, Vec<u8>)]) {
        let mut file = File::create(path).unwrap();
        for (name, genes) in genomes {
            persistence::write_genome(&mut file, name, genes.as_slice()).unwrap();
        }
        file.flush().unwrap();
    }

    #[test]
    fn test_replays_every_genome() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("G1S1.gen");
        write_genomes(
            &path,
            &[("a", vec![128; 6]), ("b", vec![0; 6]), ("c", vec![255; 6])],
        );

        let report = replay::<u8, _>(xor(), &path, None, 1).unwrap();
        let names: Vec<_> = report.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(report.iter().all(|r| r.fitness <= 1.0));

        let single = replay::<u8, _>(xor(), &path, Some(2), 1).unwrap();
        assert_eq!(single, vec![report[2].clone()]);
    }

    #[test]
    fn test_rejects_bad_requests() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.gen");
        write_genomes(&path, &[("short", vec![1, 2, 3])]);
        assert!(replay::<u8, _>(xor(), &path, Some(1), 1).is_err());
        assert!(replay::<u8, _>(xor(), &path, None, 1).is_err());
        assert!(replay::<u8, _>(xor(), &dir.path().join("missing.gen"), None, 1).is_err());
    }
}
