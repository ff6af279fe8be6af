use std::time::Instant;

use tracing::{info, info_span};

use crate::{
    Evoga, EvolutionState, Experiment, Gene, evoga::evaluate_parallel, experiment,
};

impl<G: Gene, E: Experiment<G>> Evoga<G, E> {
    /// Generational evolution of every replication.
    ///
    /// Every generation the whole population is evaluated once and replaced
    /// by the offspring of the `nreproducing` fittest individuals, see
    /// [`Evoga::reproduce`].
    pub fn evolve_generational(&mut self) -> EvolutionState {
        let pop = self.pop_size;
        self.genome.resize(pop);
        let mut workers = self.workers();
        info!(
            replications = self.config.nreplications,
            threads = self.config.num_threads,
            "generational evolution"
        );

        for replication in 0..self.config.nreplications {
            let _span = info_span!("replication", replication = replication + 1).entered();
            self.start_replication(replication, &mut workers);
            self.mutation_rate = self.config.final_mutation_rate();
            let start = self.recover_interrupted_evolution().unwrap_or(0);
            self.genome.resize(pop);

            for generation in start..self.config.ngenerations {
                let timer = Instant::now();
                info!(generation = generation + 1, "generation");

                self.experiment.init_generation(generation);
                for worker in &mut workers {
                    worker.init_generation(generation);
                }

                self.state = EvolutionState::EvaluatingIndividual;
                if workers.is_empty() {
                    for id in 0..pop {
                        self.tfitness[id] =
                            experiment::evaluate(&mut self.experiment, &self.genome[id], id);
                        if self.commit_step() {
                            return self.finish(EvolutionState::Stopped);
                        }
                    }
                } else {
                    let ids: Vec<usize> = (0..pop).collect();
                    for (id, fitness) in evaluate_parallel(&mut workers, &self.genome, &ids) {
                        self.tfitness[id] = fitness;
                    }
                    if self.commit_step() {
                        return self.finish(EvolutionState::Stopped);
                    }
                }

                if self.config.minimization {
                    self.mreproduce();
                } else {
                    self.reproduce();
                }

                self.state = EvolutionState::EndOfGenerationBookkeeping;
                self.publish_end_generation(generation);
                self.experiment.end_generation(generation);
                for worker in &mut workers {
                    worker.end_generation(generation);
                }

                let every = self.config.save_population_each_n_generations;
                if every != 0 && generation % every == 0 {
                    self.save_all_genomes();
                }

                let best = self.statistics().get(generation).map_or(f64::NAN, |s| s.max);
                info!(
                    generation = generation + 1,
                    minutes = timer.elapsed().as_secs_f64() / 60.0,
                    best,
                    "generation done"
                );
                self.state = EvolutionState::NextGeneration;
            }

            self.save_all_genomes();
            self.save_best_fitness();
        }
        self.finish(EvolutionState::EvolutionComplete)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::{
        EvogaConfig, EvolutionType, persistence,
        testing::{SumExperiment, small_config},
    };

    fn generational(dir: &std::path::Path) -> EvogaConfig {
        EvogaConfig {
            evolution_type: EvolutionType::Generational,
            ..small_config(dir)
        }
    }

    #[test]
    fn test_run_saves_statistics_and_population() {
        let dir = tempfile::tempdir().unwrap();
        let config = EvogaConfig {
            ngenerations: 10,
            elitism: 1,
            ..generational(dir.path())
        };
        let mut ga = Evoga::<u8, _>::new(config, SumExperiment::new(3)).unwrap();
        assert_eq!(ga.evolve_all_replicas(), EvolutionState::EvolutionComplete);

        assert_eq!(ga.current_generation(), 10);
        assert_eq!(ga.genomes().len(), 8);
        assert_eq!(ga.experiment().generations_started, 10);
        assert_eq!(ga.experiment().generations_ended, 10);
        assert_eq!(ga.experiment().evaluated.len(), 10 * 8);

        // the unmutated elite copy never loses fitness
        let maxima: Vec<f64> = ga.statistics().rows().iter().map(|s| s.max).collect();
        assert!(maxima.windows(2).all(|w| w[1] >= w[0]), "{maxima:?}");

        let path = dir.path();
        let stats = fs::read_to_string(path.join("statS21.fit")).unwrap();
        assert_eq!(stats.lines().count(), 10);
        let population = persistence::read_genomes::<u8>(&path.join("G10S21.gen")).unwrap();
        assert_eq!(population.len(), 8);
        assert_eq!(population[0].name, "10_0_0.wts");
        // savenbest = 1
        assert!(path.join("B1S21.gen").exists());
        assert!(!path.join("B2S21.gen").exists());
        assert!(path.join("bestgenS21.fit").exists());
    }

    #[test]
    fn test_periodic_population_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = EvogaConfig {
            ngenerations: 5,
            save_population_each_n_generations: 2,
            ..generational(dir.path())
        };
        let mut ga = Evoga::<u8, _>::new(config, SumExperiment::new(3)).unwrap();
        ga.evolve_all_replicas();
        let saved: Vec<_> = (0..=5)
            .filter(|g| dir.path().join(format!("G{g}S21.gen")).exists())
            .collect();
        assert_eq!(saved, vec![1, 3, 5]);
    }

    #[test]
    fn test_minimization_lowers_fitness() {
        let dir = tempfile::tempdir().unwrap();
        let config = EvogaConfig {
            ngenerations: 10,
            elitism: 1,
            minimization: true,
            ..generational(dir.path())
        };
        let mut ga = Evoga::<u8, _>::new(config, SumExperiment::new(3)).unwrap();
        ga.evolve_all_replicas();
        let minima: Vec<f64> = ga.statistics().rows().iter().map(|s| s.min).collect();
        assert!(minima.windows(2).all(|w| w[1] <= w[0]), "{minima:?}");
    }

    #[test]
    fn test_threaded_run() {
        let dir = tempfile::tempdir().unwrap();
        let config = EvogaConfig {
            num_threads: 2,
            ..generational(dir.path())
        };
        let mut ga = Evoga::<u8, _>::new(config, SumExperiment::new(3)).unwrap();
        assert_eq!(ga.evolve_all_replicas(), EvolutionState::EvolutionComplete);
        assert_eq!(ga.statistics().len(), 3);
        assert!(ga.experiment().evaluated.is_empty());
        assert_eq!(ga.experiment().generations_started, 3);
    }

    #[test]
    fn test_resumes_from_saved_generation() {
        let dir = tempfile::tempdir().unwrap();
        let config = EvogaConfig {
            ngenerations: 4,
            save_population_each_n_generations: 1,
            ..generational(dir.path())
        };
        let mut first = Evoga::<u8, _>::new(config.clone(), SumExperiment::new(3)).unwrap();
        first.evolve_all_replicas();

        let stats = dir.path().join("statS21.fit");
        let content = fs::read_to_string(&stats).unwrap();
        let three: String = content.lines().take(3).map(|l| format!("{l}\n")).collect();
        fs::write(&stats, three).unwrap();

        let mut second = Evoga::<u8, _>::new(config, SumExperiment::new(3)).unwrap();
        second.evolve_all_replicas();
        assert_eq!(second.experiment().generations_started, 1);
        assert_eq!(second.current_generation(), 4);
        assert_eq!(fs::read_to_string(&stats).unwrap().lines().count(), 4);
    }
}
