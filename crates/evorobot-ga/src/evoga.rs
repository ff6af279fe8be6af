use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
    sync::{
        Arc,
        mpsc::{self, Receiver, Sender},
    },
    thread,
};

use evorobot_stats::{
    fitness::{BestFitness, FitnessStats},
    table::{self, StatisticsTable},
};
use tracing::{error, info, warn};

use crate::{
    ConfigError, EvogaConfig, EvolutionType, Experiment, GaRng, Gene, GeneSettings, GenomeStore,
    StepControl, experiment,
    persistence::{self, file_name},
    rng,
};

/// Where a GA run currently is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EvolutionState {
    #[default]
    Idle,
    EvaluatingIndividual,
    ReproducingSteadyState,
    ReproducingGenerational,
    EndOfGenerationBookkeeping,
    NextGeneration,
    EvolutionComplete,
    Stopped,
}

/// Progress notifications of a run, see [`Evoga::subscribe`].
#[derive(Debug, Clone, PartialEq)]
pub enum EvolutionEvent {
    StartingReplication {
        replication: usize,
        seed: u64,
    },
    RecoveredInterruptedEvolution {
        statistics_file: PathBuf,
        generation: usize,
    },
    EndGeneration {
        generation: usize,
        max: f64,
        average: f64,
        min: f64,
    },
}

/// Source of a genome or team file.
#[derive(Debug, Clone, Copy)]
pub enum GenomeSource<'a> {
    /// The population file of a generation of the current replication.
    Generation(usize),
    File(&'a Path),
}

/// The genetic algorithm driver.
///
/// Owns the population, the experiment that evaluates it and the random
/// source of the run. See the [crate documentation](crate) for an overview.
pub struct Evoga<G: Gene, E: Experiment<G>> {
    pub(crate) config: EvogaConfig,
    pub(crate) experiment: E,
    pub(crate) genome: GenomeStore<G>,
    pub(crate) best_genome: GenomeStore<G>,
    /// Per-gene mutation rates overriding the global one.
    pub(crate) mutations: Vec<Option<f64>>,
    /// Accumulated fitness and number of evaluations of every individual.
    pub(crate) tfitness: Vec<f64>,
    pub(crate) ntfitness: Vec<f64>,
    pub(crate) statistics: StatisticsTable,
    pub(crate) best: BestFitness,
    pub(crate) generation: usize,
    pub(crate) starting_seed: u64,
    pub(crate) current_seed: u64,
    pub(crate) mutation_rate: f64,
    pub(crate) gene_settings: GeneSettings,
    pub(crate) pop_size: usize,
    pub(crate) rng: GaRng,
    pub(crate) control: Arc<StepControl>,
    pub(crate) subscribers: Vec<Sender<EvolutionEvent>>,
    pub(crate) state: EvolutionState,
    pub(crate) loaded_individuals: usize,
}

impl<G: Gene, E: Experiment<G>> Evoga<G, E> {
    /// Validates `config` and prepares a run evaluated by `experiment`.
    pub fn new(config: EvogaConfig, mut experiment: E) -> Result<Self, ConfigError> {
        config.validate()?;
        let genome_length = experiment.genome_length();
        if genome_length == 0 {
            return Err(ConfigError::EmptyGenome);
        }

        let starting_seed = if config.seed == 0 {
            rng::random_seed()
        } else {
            config.seed
        };
        info!(seed = starting_seed, "random seed set");

        let control = Arc::new(StepControl::new());
        experiment.attach_control(Arc::clone(&control));

        let pop_size = config.population_size();
        let mut genome = GenomeStore::new(genome_length);
        genome.resize(pop_size);
        let mut best_genome = GenomeStore::new(genome_length);
        best_genome.resize(config.nreproducing);
        info!(genes = genome_length, population = pop_size, "evolution configured");

        Ok(Self {
            mutation_rate: config.final_mutation_rate(),
            gene_settings: config.gene_settings(),
            experiment,
            genome,
            best_genome,
            mutations: vec![None; genome_length],
            tfitness: vec![0.0; pop_size * 2],
            ntfitness: vec![0.0; pop_size * 2],
            statistics: StatisticsTable::default(),
            best: BestFitness::new(),
            generation: 0,
            starting_seed,
            current_seed: starting_seed,
            pop_size,
            rng: GaRng::with_seed(starting_seed),
            control,
            subscribers: vec![],
            state: EvolutionState::Idle,
            loaded_individuals: 0,
            config,
        })
    }

    /// Runs every replication with the configured replacement scheme.
    ///
    /// Returns [`EvolutionState::Stopped`] when [`Evoga::stop`] interrupted
    /// the run.
    pub fn evolve_all_replicas(&mut self) -> EvolutionState {
        self.control.reset_stop();
        match self.config.evolution_type {
            EvolutionType::SteadyState => self.evolve_steady_state(),
            EvolutionType::Generational => self.evolve_generational(),
        }
    }

    /// A receiver of the events published from now on.
    ///
    /// Publishing never blocks; dropped receivers are forgotten.
    pub fn subscribe(&mut self) -> Receiver<EvolutionEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub(crate) fn publish(&mut self, event: &EvolutionEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn publish_end_generation(&mut self, generation: usize) {
        if let Some(stats) = self.statistics.get(generation).copied() {
            self.publish(&EvolutionEvent::EndGeneration {
                generation,
                max: stats.max,
                average: stats.average,
                min: stats.min,
            });
        }
    }

    pub(crate) fn finish(&mut self, state: EvolutionState) -> EvolutionState {
        if state == EvolutionState::Stopped {
            info!(generation = self.generation, "evolution stopped");
        }
        self.state = state;
        state
    }

    // Control

    /// Handle to the stop latch and step-by-step gate of this run.
    #[must_use]
    pub fn control(&self) -> Arc<StepControl> {
        Arc::clone(&self.control)
    }

    /// Commit point: waits when stepping and reports a stop request.
    pub fn commit_step(&self) -> bool {
        self.control.commit_step()
    }

    pub fn stop(&self) {
        self.control.stop();
    }

    pub fn reset_stop(&self) {
        self.control.reset_stop();
    }

    #[must_use]
    pub fn is_stopped(&self) -> bool {
        self.control.is_stopped()
    }

    pub fn enable_step_by_step(&self, enable: bool) {
        self.control.enable_step_by_step(enable);
    }

    #[must_use]
    pub fn is_step_by_step_enabled(&self) -> bool {
        self.control.is_step_by_step_enabled()
    }

    pub fn do_next_step(&self) {
        self.control.do_next_step();
    }

    // Getters

    #[must_use]
    pub fn config(&self) -> &EvogaConfig {
        &self.config
    }

    #[must_use]
    pub fn experiment(&self) -> &E {
        &self.experiment
    }

    pub fn experiment_mut(&mut self) -> &mut E {
        &mut self.experiment
    }

    #[must_use]
    pub fn state(&self) -> EvolutionState {
        self.state
    }

    #[must_use]
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    #[must_use]
    pub fn starting_seed(&self) -> u64 {
        self.starting_seed
    }

    #[must_use]
    pub fn current_seed(&self) -> u64 {
        self.current_seed
    }

    #[must_use]
    pub fn num_replications(&self) -> usize {
        self.config.nreplications
    }

    #[must_use]
    pub fn num_generations(&self) -> usize {
        self.config.ngenerations
    }

    #[must_use]
    pub fn population_size(&self) -> usize {
        self.pop_size
    }

    #[must_use]
    pub fn genome_length(&self) -> usize {
        self.genome.genome_length()
    }

    #[must_use]
    pub fn current_mutation_rate(&self) -> f64 {
        self.mutation_rate
    }

    pub fn set_current_mutation_rate(&mut self, rate: f64) {
        self.mutation_rate = rate;
    }

    #[must_use]
    pub fn statistics(&self) -> &StatisticsTable {
        &self.statistics
    }

    /// Statistics of the last recorded generation.
    #[must_use]
    pub fn last_statistics(&self) -> Option<FitnessStats> {
        self.statistics.last().copied()
    }

    #[must_use]
    pub fn best_fitness(&self) -> BestFitness {
        self.best
    }

    #[must_use]
    pub fn genomes(&self) -> &GenomeStore<G> {
        &self.genome
    }

    /// Average fitness of `individual` over its evaluations.
    #[must_use]
    pub fn fitness(&self, individual: usize) -> Option<f64> {
        (individual < self.tfitness.len()).then(|| self.average_fitness(individual))
    }

    pub(crate) fn average_fitness(&self, individual: usize) -> f64 {
        let n = self.ntfitness[individual];
        if n > 0.0 {
            self.tfitness[individual] / n
        } else {
            self.tfitness[individual]
        }
    }

    pub(crate) fn path(&self, name: &str) -> PathBuf {
        self.config.output_dir.join(name)
    }

    // Genomes

    #[must_use]
    pub fn get_genes(&self, individual: usize) -> Option<&[G]> {
        self.genome.get(individual)
    }

    /// Genome archived in slot `rank` by the last reproduction.
    #[must_use]
    pub fn get_best_genes(&self, rank: usize) -> Option<&[G]> {
        self.best_genome.get(rank)
    }

    /// Genome of `id`, typically after [`Evoga::load_genotypes`].
    #[must_use]
    pub fn get_genes_for_individual(&self, id: usize) -> Option<&[G]> {
        self.get_genes(id)
    }

    /// `gene` mutated at `rate` with the random source of the run.
    pub fn mutate(&mut self, gene: G, rate: f64) -> G {
        gene.mutated(rate, &mut self.rng, &self.gene_settings)
    }

    /// Copies genome `from` over genome `to`, optionally mutating the copy.
    ///
    /// Each gene mutates at its own rate when one is set, at the current
    /// global rate otherwise. The source genome is never modified.
    pub fn copy_genes(&mut self, from: usize, to: usize, mutate: bool) {
        let Self {
            genome,
            rng,
            mutations,
            gene_settings,
            mutation_rate,
            ..
        } = self;
        let copied = genome.copy_with(from, to, |i, g| {
            if mutate {
                let rate = mutations.get(i).copied().flatten().unwrap_or(*mutation_rate);
                g.mutated(rate, rng, gene_settings)
            } else {
                g
            }
        });
        if !copied {
            error!(from, to, "genome index out of range");
        }
    }

    /// Copies archived genome `from_best` over individual `to`.
    pub fn get_genome(&mut self, from_best: usize, to: usize, mutate: bool) {
        let Self {
            genome,
            best_genome,
            rng,
            mutations,
            gene_settings,
            mutation_rate,
            ..
        } = self;
        let (Some(source), Some(target)) = (best_genome.get(from_best), genome.get_mut(to)) else {
            error!(from_best, to, "genome index out of range");
            return;
        };
        for (i, (t, &s)) in target.iter_mut().zip(source).enumerate() {
            *t = if mutate {
                let rate = mutations.get(i).copied().flatten().unwrap_or(*mutation_rate);
                s.mutated(rate, rng, gene_settings)
            } else {
                s
            };
        }
    }

    /// Archives individual `from` into slot `to_best`.
    pub fn put_genome(&mut self, from: usize, to_best: usize) {
        let archive = self.best_genome.len();
        let (Some(source), Some(target)) = (self.genome.get(from), self.best_genome.get_mut(to_best))
        else {
            error!(from, to_best, archive, "cannot archive genome: slot out of range");
            return;
        };
        target.copy_from_slice(source);
    }

    /// Fills every stored genome with random genes.
    pub fn randomize_pop(&mut self) {
        for i in 0..self.genome.len() {
            for g in &mut self.genome[i] {
                *g = G::random(&mut self.rng, &self.gene_settings);
            }
        }
    }

    /// Pins the genes that have a value in `phe_genes` in every genome.
    pub fn set_initial_population(&mut self, phe_genes: &[Option<G>]) {
        for i in 0..self.genome.len() {
            for (g, phe) in self.genome[i].iter_mut().zip(phe_genes) {
                if let Some(phe) = phe {
                    *g = *phe;
                }
            }
        }
    }

    /// Sets the per-gene mutation rates; `None` falls back to the global rate.
    pub fn set_mutations(&mut self, mutations: &[Option<f32>]) {
        self.mutations = vec![None; self.genome.genome_length()];
        for (m, value) in self.mutations.iter_mut().zip(mutations) {
            *m = value.map(f64::from);
        }
    }

    /// Seeds the population with the parameters and mutation rates pinned by
    /// the `.phe` file of the experiment controller, if one was loaded.
    pub fn get_phe_parameters_and_mutations_from_evonet(&mut self) {
        let net = self.experiment.evonet();
        if !net.phe_file_loaded() {
            return;
        }
        let ranges = net.ranges();
        let phe: Vec<Option<G>> = net
            .phe_parameters()
            .into_iter()
            .map(|p| p.map(|value| G::from_parameter(value, &ranges)))
            .collect();
        let mutations = net.mutations();
        self.set_initial_population(&phe);
        self.set_mutations(&mutations);
        info!(
            pinned = phe.iter().flatten().count(),
            "initial population seeded from the parameter file"
        );
    }

    /// Encodes the current controller parameters into genome `individual`.
    pub fn update_genome_from_evonet(&mut self, individual: usize) {
        let net = self.experiment.evonet();
        let ranges = net.ranges();
        let Some(target) = self.genome.get_mut(individual) else {
            error!(individual, "genome index out of range");
            return;
        };
        for (g, &p) in target.iter_mut().zip(net.parameters().values()) {
            *g = G::from_parameter(p, &ranges);
        }
    }

    // Statistics

    /// Records max, average and min of the raw fitness of the population.
    pub fn compute_fitness_statistics(&mut self) {
        let stats = FitnessStats::seeded(self.tfitness[..self.pop_size].iter().copied());
        self.record_statistics(stats);
    }

    /// Records max, average and min of the fitness averaged over evaluations.
    pub fn compute_average_fitness_statistics(&mut self) {
        let stats = FitnessStats::bounded((0..self.pop_size).map(|i| self.average_fitness(i)));
        self.record_statistics(stats);
    }

    fn record_statistics(&mut self, stats: Option<FitnessStats>) {
        if let Some(stats) = stats {
            self.statistics.record(self.generation, stats);
            self.best.update(stats.max, self.generation);
        }
    }

    /// Appends the statistics of the current generation to `statS<seed>.fit`.
    pub fn save_fitness_statistics(&self) {
        let path = self.path(&file_name::statistics(self.current_seed));
        if let Err(e) = self.statistics.append_line(&path, self.generation) {
            error!(error = %e, "cannot save fitness statistics");
        }
    }

    /// Loads a statistics file and returns its number of generations.
    pub fn load_statistics(&mut self, path: &Path) -> usize {
        match StatisticsTable::load(path) {
            Ok(Some(statistics)) => {
                self.statistics = statistics;
                self.statistics.len()
            }
            Ok(None) => {
                warn!(path = %path.display(), "statistics file not found");
                0
            }
            Err(e) => {
                error!(error = %e, "cannot load statistics");
                0
            }
        }
    }

    /// Appends which parent each offspring replaced to `statS<seed>.ret`.
    pub fn save_retention_statistics(&self, replaced: &[Option<usize>]) {
        let path = self.path(&file_name::retention(self.current_seed));
        if let Err(e) = table::append_retention(&path, replaced, self.generation == 0) {
            error!(error = %e, "cannot save retention statistics");
        }
    }

    /// Appends the best fitness of the replication to `bestgenS<seed>.fit`.
    pub fn save_best_fitness(&self) {
        let path = self.path(&file_name::best_fitness(self.current_seed));
        if let Err(e) = table::append_best_fitness(&path, &self.best, self.generation == 0) {
            error!(error = %e, "cannot save best fitness");
        }
    }

    // Genome files

    /// Writes genome `individual` as a record named `name`.
    pub fn write_genotype<W>(&self, writer: &mut W, name: &str, individual: usize) -> io::Result<()>
    where
        W: Write + ?Sized,
    {
        let genes = self.genome.get(individual).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("no genome for individual {individual}"),
            )
        })?;
        persistence::write_genome(writer, name, genes)
    }

    fn write_file<F>(&self, path: &Path, truncate: bool, write: F)
    where
        F: FnOnce(&mut BufWriter<File>) -> io::Result<()>,
    {
        let result = persistence::open_writer(path, truncate).and_then(|mut writer| {
            write(&mut writer)
                .and_then(|()| writer.flush())
                .map_err(|source| persistence::GenomeFileError::Io {
                    path: path.to_owned(),
                    source,
                })
        });
        if let Err(e) = result {
            error!(error = %e, "cannot save genomes");
        }
    }

    /// Writes the whole population to `G<gen>S<seed>.gen`.
    pub fn save_all_genomes(&self) {
        let path = self.path(&file_name::generation(self.generation, self.current_seed));
        self.write_file(&path, true, |w| {
            for i in 0..self.pop_size {
                self.write_genotype(w, &format!("{}_0_{i}.wts", self.generation), i)?;
            }
            Ok(())
        });
    }

    /// Appends the individual with the best average fitness to `B0S<seed>.gen`.
    pub fn save_best_individual(&self) {
        let Some(best) = (0..self.pop_size)
            .max_by(|&a, &b| self.average_fitness(a).total_cmp(&self.average_fitness(b)))
        else {
            return;
        };
        let path = self.path(&file_name::bests(self.current_seed));
        self.write_file(&path, self.generation == 0, |w| {
            self.write_genotype(w, &format!("s{}_{best}.wts", self.generation), best)
        });
    }

    fn save_ranked_best(&self, rank: usize, individual: usize) {
        let path = self.path(&file_name::ranked_bests(rank + 1, self.current_seed));
        self.write_file(&path, self.generation == 0, |w| {
            self.write_genotype(w, &format!("s{}_{individual}.wts", self.generation), individual)
        });
    }

    /// Writes the module genomes of the fittest team to `B0S<seed>.G<gen>.gen`.
    pub fn save_best_team(&self, teams: &[Vec<usize>], fitness: &[f64]) {
        let Some(best) = fitness
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .and_then(|(i, _)| teams.get(i))
        else {
            error!("no team to save");
            return;
        };
        let path = self.path(&file_name::best_team(self.current_seed, self.generation));
        self.write_file(&path, true, |w| {
            for &module in best.iter().take(self.config.num_modules) {
                self.write_genotype(w, &format!("s{}_{module}.wts", self.generation), module)?;
            }
            Ok(())
        });
    }

    /// Writes the composition of every team to `G<gen>S<seed>.composed.gen`.
    pub fn save_all_composed(&self, teams: &[Vec<usize>]) {
        let path = self.path(&file_name::composed_generation(
            self.generation,
            self.current_seed,
        ));
        self.write_file(&path, true, |w| {
            for (i, team) in teams.iter().enumerate() {
                persistence::write_team(w, &format!("{}_0_{i}.wts", self.generation), team)?;
            }
            Ok(())
        });
    }

    fn source_path(&self, source: GenomeSource<'_>, composed: bool) -> PathBuf {
        match source {
            GenomeSource::Generation(generation) if composed => self.path(
                &file_name::composed_generation(generation, self.current_seed),
            ),
            GenomeSource::Generation(generation) => {
                self.path(&file_name::generation(generation, self.current_seed))
            }
            GenomeSource::File(path) => path.to_owned(),
        }
    }

    /// Replaces the population with the genomes of a file.
    ///
    /// Returns the number of genomes loaded. A missing or malformed file, or
    /// genomes of the wrong length, leave the population untouched and
    /// return `0`.
    pub fn load_all_genomes(&mut self, source: GenomeSource<'_>) -> usize {
        let path = self.source_path(source, false);
        let records = match persistence::read_genomes::<G>(&path) {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "cannot load genomes");
                return 0;
            }
        };
        let expected = self.genome.genome_length();
        if let Some(record) = records.iter().find(|r| r.genes.len() != expected) {
            error!(
                path = %path.display(),
                record = %record.name,
                expected,
                found = record.genes.len(),
                "genome length mismatch"
            );
            return 0;
        }

        self.genome.clear();
        for record in &records {
            let i = self.genome.add_one();
            self.genome[i].copy_from_slice(&record.genes);
        }
        // short files leave the rest of the population zeroed
        self.genome.resize(records.len().max(self.pop_size));
        self.loaded_individuals = records.len();
        info!(path = %path.display(), genomes = records.len(), "genomes loaded");
        records.len()
    }

    /// Loads the genomes of `path`, see [`Evoga::load_all_genomes`].
    pub fn load_genotypes(&mut self, path: &Path) -> usize {
        self.load_all_genomes(GenomeSource::File(path))
    }

    /// Number of genomes read by the last successful load.
    #[must_use]
    pub fn num_loaded_genotypes(&self) -> usize {
        self.loaded_individuals
    }

    /// Reads the team compositions of a composed generation file.
    ///
    /// Teams must have `num_modules` members; on any error the result is empty.
    pub fn load_all_teams(&self, source: GenomeSource<'_>) -> Vec<Vec<usize>> {
        let path = self.source_path(source, true);
        let records = match persistence::read_teams(&path) {
            Ok(records) => records,
            Err(e) => {
                error!(error = %e, "cannot load teams");
                return vec![];
            }
        };
        if let Some(record) = records
            .iter()
            .find(|r| r.modules.len() != self.config.num_modules)
        {
            error!(
                record = %record.name,
                expected = self.config.num_modules,
                found = record.modules.len(),
                "team size mismatch"
            );
            return vec![];
        }
        records.into_iter().map(|r| r.modules).collect()
    }

    // Reproduction

    /// Truncation selection for maximisation.
    ///
    /// Archives the `nreproducing` fittest individuals, saves the first
    /// `savenbest` of them, refills the population with `noffspring` mutated
    /// copies of each and moves to the next generation. The first copy of
    /// each of the first `elitism` parents is not mutated.
    pub fn reproduce(&mut self) {
        self.reproduce_with(false);
    }

    /// Like [`Evoga::reproduce`], with lower fitness being better.
    pub fn mreproduce(&mut self) {
        self.reproduce_with(true);
    }

    fn reproduce_with(&mut self, minimize: bool) {
        self.state = EvolutionState::ReproducingGenerational;
        self.compute_fitness_statistics();

        let mut taken = vec![false; self.pop_size];
        for rank in 0..self.config.nreproducing {
            let Some(chosen) = (0..self.pop_size)
                .filter(|&i| !taken[i])
                .reduce(|best, i| {
                    let (f, b) = (self.tfitness[i], self.tfitness[best]);
                    if (minimize && f < b) || (!minimize && f > b) {
                        i
                    } else {
                        best
                    }
                })
            else {
                break;
            };
            taken[chosen] = true;
            self.put_genome(chosen, rank);
            if rank < self.config.savenbest && self.generation < self.config.ngenerations {
                self.save_ranked_best(rank, chosen);
            }
        }

        let mut child = 0;
        for rank in 0..self.config.nreproducing {
            for n in 0..self.config.noffspring {
                let elite = rank < self.config.elitism && n == 0;
                self.get_genome(rank, child, !elite);
                child += 1;
            }
        }

        let reset = if minimize { 9999.0 } else { 0.0 };
        self.tfitness[..self.pop_size].fill(reset);
        self.save_fitness_statistics();
        self.generation += 1;
    }

    // Replication set-up shared by both schemes

    pub(crate) fn workers(&self) -> Vec<E> {
        if self.config.num_threads > 1 {
            (0..self.config.num_threads)
                .map(|_| self.experiment.clone())
                .collect()
        } else {
            vec![]
        }
    }

    pub(crate) fn start_replication(&mut self, replication: usize, workers: &mut [E]) {
        self.current_seed = self.starting_seed.wrapping_add(replication as u64);
        self.rng.reseed(self.current_seed);
        info!(
            replication = replication + 1,
            seed = self.current_seed,
            "starting replication"
        );
        self.generation = 0;
        self.statistics.clear();
        self.best = BestFitness::new();
        self.randomize_pop();
        self.get_phe_parameters_and_mutations_from_evonet();
        self.publish(&EvolutionEvent::StartingReplication {
            replication,
            seed: self.current_seed,
        });
        self.experiment.new_ga_seed(self.current_seed);
        for worker in workers {
            worker.new_ga_seed(self.current_seed);
        }
        self.tfitness.fill(0.0);
        self.ntfitness.fill(0.0);
    }

    /// Resumes a replication from its statistics and population files.
    ///
    /// Returns the generation to start from, or `None` when there is nothing
    /// to resume.
    pub(crate) fn recover_interrupted_evolution(&mut self) -> Option<usize> {
        let statistics_file = self.path(&file_name::statistics(self.current_seed));
        let statistics = match StatisticsTable::load(&statistics_file) {
            Ok(Some(statistics)) if !statistics.is_empty() => statistics,
            Ok(_) => return None,
            Err(e) => {
                warn!(error = %e, "cannot resume the interrupted evolution");
                return None;
            }
        };
        let start = statistics.len();
        info!(generation = start, "recovering interrupted evolution");
        if self.load_all_genomes(GenomeSource::Generation(start)) == 0 {
            warn!(generation = start, "no population to resume from, starting over");
            return None;
        }

        for (generation, stats) in statistics.rows().iter().enumerate() {
            self.best.update(stats.max, generation);
        }
        self.statistics = statistics;
        self.generation = start;
        self.publish(&EvolutionEvent::RecoveredInterruptedEvolution {
            statistics_file,
            generation: start,
        });
        Some(start)
    }

    pub(crate) fn accumulate_fitness(&mut self, individual: usize, fitness: f64) {
        if self.config.average_individual_fitness_over_generations {
            self.tfitness[individual] += fitness;
            self.ntfitness[individual] += 1.0;
        } else {
            self.tfitness[individual] = fitness;
            self.ntfitness[individual] = 1.0;
        }
    }
}

/// Evaluates `ids` on the worker experiments, each worker taking a
/// contiguous share.
///
/// Returns `(id, fitness)` pairs in the order of `ids`.
pub(crate) fn evaluate_parallel<G, E>(
    workers: &mut [E],
    genome: &GenomeStore<G>,
    ids: &[usize],
) -> Vec<(usize, f64)>
where
    G: Gene,
    E: Experiment<G>,
{
    if workers.is_empty() || ids.is_empty() {
        return vec![];
    }
    let share = ids.len().div_ceil(workers.len());
    thread::scope(|s| {
        let handles: Vec<_> = workers
            .iter_mut()
            .zip(ids.chunks(share))
            .map(|(worker, ids)| {
                s.spawn(move || {
                    ids.iter()
                        .map(|&id| (id, experiment::evaluate(&mut *worker, &genome[id], id)))
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
            .collect()
    })
}
