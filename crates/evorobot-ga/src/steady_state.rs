use std::{fs, io, time::Instant};

use tracing::{info, info_span, warn};

use crate::{
    Evoga, EvolutionState, Experiment, Gene,
    evoga::evaluate_parallel,
    experiment,
    persistence::file_name,
};

impl<G: Gene, E: Experiment<G>> Evoga<G, E> {
    /// Steady-state evolution of every replication.
    ///
    /// Each generation every parent is re-evaluated and produces one mutated
    /// offspring, which is evaluated too. Offspring, best first, then replace
    /// the worst parents as long as they are not worse than the best parent
    /// still in the running.
    pub fn evolve_steady_state(&mut self) -> EvolutionState {
        let pop = self.pop_size;
        self.genome.resize(pop * 2);
        let final_rate = self.config.final_mutation_rate();
        let mut workers = self.workers();
        info!(
            replications = self.config.nreplications,
            threads = self.config.num_threads,
            "steady state evolution"
        );

        for replication in 0..self.config.nreplications {
            let _span = info_span!("replication", replication = replication + 1).entered();
            let mut limitation = 1.0;
            self.start_replication(replication, &mut workers);
            self.mutation_rate = self.config.initial_mutation;

            let start = self.recover_interrupted_evolution().unwrap_or(0);
            if start > 0 {
                #[expect(clippy::cast_precision_loss)]
                let decayed = self.mutation_rate - start as f64 * self.config.mutation_decay;
                self.mutation_rate = decayed.max(final_rate);
                self.genome.resize(pop * 2);
            }

            for generation in start..self.config.ngenerations {
                let timer = Instant::now();
                info!(generation = generation + 1, "generation");

                let evaluated = if workers.is_empty() {
                    self.evaluate_steady_state(generation)
                } else {
                    self.evaluate_steady_state_parallel(generation, &mut workers)
                };
                if !evaluated {
                    return self.finish(EvolutionState::Stopped);
                }

                self.state = EvolutionState::ReproducingSteadyState;
                let (replaced, retention) = self.replace_worst_parents(limitation);

                self.state = EvolutionState::EndOfGenerationBookkeeping;
                self.save_best_individual();
                self.compute_average_fitness_statistics();
                self.save_fitness_statistics();
                if self.config.save_retention_statistics {
                    self.save_retention_statistics(&replaced);
                }
                self.publish_end_generation(generation);
                if self.commit_step() {
                    return self.finish(EvolutionState::Stopped);
                }

                self.generation += 1;
                if self.mutation_rate > final_rate {
                    self.mutation_rate -= self.config.mutation_decay;
                } else {
                    self.mutation_rate = final_rate;
                }
                limitation += (self.config.target_retention_rate - retention) / 10.0;
                if limitation > 1.0 {
                    limitation = 1.0;
                }

                self.save_all_genomes();
                self.remove_stale_population(generation);

                let best = self.last_statistics().map_or(f64::NAN, |s| s.max);
                info!(
                    generation = generation + 1,
                    minutes = timer.elapsed().as_secs_f64() / 60.0,
                    best,
                    "generation done"
                );
                if self.config.limit_retention {
                    info!(
                        target_rate = self.config.target_retention_rate,
                        retention,
                        limitation,
                        "retention limited"
                    );
                }
                self.state = EvolutionState::NextGeneration;
            }

            self.save_all_genomes();
            self.save_best_fitness();
        }
        self.finish(EvolutionState::EvolutionComplete)
    }

    /// Evaluates every parent and its new offspring on the own experiment.
    ///
    /// Returns `false` when the run was stopped.
    fn evaluate_steady_state(&mut self, generation: usize) -> bool {
        let pop = self.pop_size;
        self.experiment.init_generation(generation);
        if self.commit_step() {
            return false;
        }

        self.state = EvolutionState::EvaluatingIndividual;
        for id in 0..pop {
            let fitness = experiment::evaluate(&mut self.experiment, &self.genome[id], id);
            self.accumulate_fitness(id, fitness);
            if self.is_stopped() {
                return false;
            }

            let child = pop + id;
            self.copy_genes(id, child, true);
            self.tfitness[child] = 0.0;
            self.ntfitness[child] = 0.0;
            let fitness = experiment::evaluate(&mut self.experiment, &self.genome[child], child);
            self.accumulate_fitness(child, fitness);
            if self.is_stopped() {
                return false;
            }
        }

        self.experiment.end_generation(generation);
        !self.commit_step()
    }

    /// Like [`Evoga::evaluate_steady_state`], with all parents evaluated in
    /// parallel first and all offspring next.
    fn evaluate_steady_state_parallel(&mut self, generation: usize, workers: &mut [E]) -> bool {
        let pop = self.pop_size;
        for worker in workers.iter_mut() {
            worker.init_generation(generation);
        }
        if self.commit_step() {
            return false;
        }

        self.state = EvolutionState::EvaluatingIndividual;
        let parents: Vec<usize> = (0..pop).collect();
        for (id, fitness) in evaluate_parallel(workers, &self.genome, &parents) {
            self.accumulate_fitness(id, fitness);
        }
        if self.commit_step() {
            return false;
        }

        for id in 0..pop {
            self.copy_genes(id, pop + id, true);
            self.tfitness[pop + id] = 0.0;
            self.ntfitness[pop + id] = 0.0;
        }
        let children: Vec<usize> = (pop..pop * 2).collect();
        for (id, fitness) in evaluate_parallel(workers, &self.genome, &children) {
            self.accumulate_fitness(id, fitness);
        }
        if self.commit_step() {
            return false;
        }

        for worker in workers.iter_mut() {
            worker.end_generation(generation);
        }
        !self.commit_step()
    }

    /// Moves the offspring that beat the remaining parents into the slots of
    /// the worst parents.
    ///
    /// Returns, for each offspring, the parent slot it took (`None` when it
    /// was discarded), and the fraction of the population replaced. With
    /// `limit_retention` the offspring fitness is scaled by `limitation`
    /// for the comparison only.
    fn replace_worst_parents(&mut self, limitation: f64) -> (Vec<Option<usize>>, f64) {
        let pop = self.pop_size;
        let scale = if self.config.limit_retention {
            limitation
        } else {
            1.0
        };
        let mut parents: Vec<(f64, usize)> = (0..pop).map(|i| (self.average_fitness(i), i)).collect();
        let mut children: Vec<(f64, usize)> = (pop..pop * 2)
            .map(|i| (self.average_fitness(i) * scale, i))
            .collect();
        parents.sort_by(|a, b| b.0.total_cmp(&a.0));
        children.sort_by(|a, b| b.0.total_cmp(&a.0));

        let mut replaced = vec![None; pop];
        let mut retention = 0.0;
        let (mut p, mut c) = (0, 0);
        #[expect(clippy::cast_precision_loss)]
        let share = 1.0 / pop as f64;
        for _ in 0..pop {
            let (parent_fitness, _) = parents[p];
            let (child_fitness, child) = children[c];
            if parent_fitness > child_fitness {
                p += 1;
            } else {
                // the c-th worst parent
                let (_, slot) = parents[pop - 1 - c];
                self.copy_genes(child, slot, false);
                self.tfitness[slot] = self.tfitness[child];
                self.ntfitness[slot] = self.ntfitness[child];
                replaced[child - pop] = Some(slot);
                c += 1;
                retention += share;
            }
        }
        (replaced, retention)
    }

    /// Removes the population file of `generation` unless it is kept by
    /// `save_population_each_n_generations`.
    fn remove_stale_population(&self, generation: usize) {
        let every = self.config.save_population_each_n_generations;
        let keep = every != 0 && (generation <= 1 || (generation - 1) % every == 0);
        if keep {
            return;
        }
        let path = self.path(&file_name::generation(generation, self.current_seed));
        match fs::remove_file(&path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => {
                warn!(path = %path.display(), error = %e, "cannot delete population file");
            }
            _ => {}
        }
    }
}
