use std::path::PathBuf;

use anyhow::Context;
use chrono::{DateTime, Utc};
use evorobot_ga::{Evoga, EvolutionEvent, EvolutionState, Experiment, Gene, persistence};
use evorobot_stats::table::StatisticsTable;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    experiment::{GeneKind, RunConfig, TaskKind, with_experiment},
    util,
};

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct EvolveArg {
    /// Run configuration (JSON); built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,
    /// Task to evolve for, overriding the run configuration
    #[arg(long, value_enum)]
    task: Option<TaskKind>,
    /// Seed of the first replication (0 draws one at random)
    #[arg(long)]
    seed: Option<u64>,
    /// Number of generations of each replication
    #[arg(long)]
    generations: Option<usize>,
    /// Number of replications
    #[arg(long)]
    replications: Option<usize>,
    /// Number of evaluation threads
    #[arg(long)]
    threads: Option<usize>,
    /// Directory receiving statistics and genome files
    #[arg(long)]
    output_dir: Option<PathBuf>,
    /// Write the JSON summary to this file instead of stdout
    #[arg(long)]
    summary: Option<PathBuf>,
}

impl EvolveArg {
    fn apply(&self, config: &mut RunConfig) {
        if let Some(task) = self.task {
            config.task.kind = task;
        }
        let ga = &mut config.ga;
        if let Some(seed) = self.seed {
            ga.seed = seed;
        }
        if let Some(generations) = self.generations {
            ga.ngenerations = generations;
        }
        if let Some(replications) = self.replications {
            ga.nreplications = replications;
        }
        if let Some(threads) = self.threads {
            ga.num_threads = threads;
        }
        if let Some(dir) = &self.output_dir {
            ga.output_dir.clone_from(dir);
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct EvolutionSummary {
    finished_at: DateTime<Utc>,
    task: TaskKind,
    gene: GeneKind,
    completed: bool,
    genome_length: usize,
    population_size: usize,
    output_dir: PathBuf,
    replications: Vec<ReplicationSummary>,
}

#[derive(Debug, Clone, Serialize)]
struct ReplicationSummary {
    seed: u64,
    generations: usize,
    best_fitness: Option<f64>,
    best_generation: Option<usize>,
    last_average: Option<f64>,
    best_genome_file: PathBuf,
}

pub(crate) fn run(arg: &EvolveArg) -> anyhow::Result<()> {
    let mut config = RunConfig::load(arg.config.as_deref())?;
    arg.apply(&mut config);
    std::fs::create_dir_all(&config.ga.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            config.ga.output_dir.display()
        )
    })?;

    let summary = with_experiment!(&config, experiment => match config.gene {
        GeneKind::Integer => evolve::<u8, _>(&config, experiment)?,
        GeneKind::Real => evolve::<f32, _>(&config, experiment)?,
    });
    util::write_json(&summary, arg.summary.as_deref())
}

fn evolve<G, E>(config: &RunConfig, experiment: E) -> anyhow::Result<EvolutionSummary>
where
    G: Gene,
    E: Experiment<G>,
{
    let mut ga: Evoga<G, E> =
        Evoga::new(config.ga.clone(), experiment).context("Invalid GA configuration")?;
    info!(
        task = ?config.task.kind,
        gene = ?config.gene,
        genes = ga.genome_length(),
        "evolving"
    );
    let events = ga.subscribe();
    let state = ga.evolve_all_replicas();
    if state == EvolutionState::Stopped {
        warn!("evolution stopped before completion");
    }

    let seeds: Vec<u64> = events
        .try_iter()
        .filter_map(|event| match event {
            EvolutionEvent::StartingReplication { seed, .. } => Some(seed),
            _ => None,
        })
        .collect();
    let replications = seeds
        .into_iter()
        .map(|seed| summarize_replication(config, seed))
        .collect::<anyhow::Result<_>>()?;

    Ok(EvolutionSummary {
        finished_at: Utc::now(),
        task: config.task.kind,
        gene: config.gene,
        completed: state == EvolutionState::EvolutionComplete,
        genome_length: ga.genome_length(),
        population_size: ga.population_size(),
        output_dir: config.ga.output_dir.clone(),
        replications,
    })
}

/// Reads back the statistics file written for `seed`.
fn summarize_replication(config: &RunConfig, seed: u64) -> anyhow::Result<ReplicationSummary> {
    let dir = &config.ga.output_dir;
    let path = dir.join(persistence::file_name::statistics(seed));
    let table = StatisticsTable::load(&path)?.unwrap_or_default();
    let best = table
        .rows()
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.max.total_cmp(&b.max));
    Ok(ReplicationSummary {
        seed,
        generations: table.len(),
        best_fitness: best.map(|(_, stats)| stats.max),
        best_generation: best.map(|(generation, _)| generation),
        last_average: table.last().map(|stats| stats.average),
        best_genome_file: dir.join(persistence::file_name::bests(seed)),
    })
}

#[cfg(test)]
mod tests {
    use evorobot_ga::{EvogaConfig, EvolutionType};

    use super::*;
    use crate::experiment::TaskConfig;

    fn small_run(dir: &std::path::Path, kind: TaskKind, gene: GeneKind) -> RunConfig {
        RunConfig {
            task: TaskConfig {
                kind,
                ntrials: 2,
                nsteps: 20,
            },
            gene,
            ga: EvogaConfig {
                ngenerations: 3,
                nreplications: 2,
                nreproducing: 4,
                noffspring: 2,
                seed: 5,
                output_dir: dir.to_owned(),
                ..EvogaConfig::default()
            },
            ..RunConfig::default()
        }
    }

    fn summarize(config: &RunConfig) -> EvolutionSummary {
        let run = || -> anyhow::Result<EvolutionSummary> {
            Ok(with_experiment!(config, experiment => match config.gene {
                GeneKind::Integer => evolve::<u8, _>(config, experiment)?,
                GeneKind::Real => evolve::<f32, _>(config, experiment)?,
            }))
        };
        run().unwrap()
    }

    #[test]
    fn test_cli_overrides_run_file() {
        let arg = EvolveArg {
            seed: Some(9),
            generations: Some(2),
            threads: Some(4),
            task: Some(TaskKind::Tracking),
            output_dir: Some(PathBuf::from("out")),
            ..EvolveArg::default()
        };
        let mut config = RunConfig::default();
        arg.apply(&mut config);
        assert_eq!(config.ga.seed, 9);
        assert_eq!(config.ga.ngenerations, 2);
        assert_eq!(config.ga.nreplications, 10);
        assert_eq!(config.ga.num_threads, 4);
        assert_eq!(config.task.kind, TaskKind::Tracking);
        assert_eq!(config.ga.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_xor_summary() {
        let dir = tempfile::tempdir().unwrap();
        let summary = summarize(&small_run(dir.path(), TaskKind::Xor, GeneKind::Integer));
        assert!(summary.completed);
        assert_eq!(summary.population_size, 8);
        // 2 -> 2 -> 1 without biases
        assert_eq!(summary.genome_length, 6);
        let seeds: Vec<_> = summary.replications.iter().map(|r| r.seed).collect();
        assert_eq!(seeds, vec![5, 6]);
        for replication in &summary.replications {
            assert_eq!(replication.generations, 3);
            assert!(replication.best_fitness.unwrap() <= 1.0);
            assert!(replication.best_genome_file.exists());
        }
    }

    #[test]
    fn test_generational_tracking_with_real_genes() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = small_run(dir.path(), TaskKind::Tracking, GeneKind::Real);
        config.ga.evolution_type = EvolutionType::Generational;
        config.ga.num_threads = 2;
        let summary = summarize(&config);
        assert!(summary.completed);
        assert_eq!(summary.replications.len(), 2);
        assert!(dir.path().join("G3S6.gen").exists());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["task"], "tracking");
        assert_eq!(json["gene"], "real");
    }
}
