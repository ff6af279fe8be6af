use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, GeneSettings, MAX_INDIVIDUALS};

/// Replacement scheme of a GA run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EvolutionType {
    /// Every parent produces one offspring per generation; offspring replace
    /// the worst parents when they are not worse.
    #[default]
    SteadyState,
    /// The best `nreproducing` individuals fill the next generation with
    /// `noffspring` copies each.
    Generational,
}

/// Settings of an [`Evoga`](crate::Evoga) run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EvogaConfig {
    pub evolution_type: EvolutionType,
    pub ngenerations: usize,
    pub nreplications: usize,
    pub nreproducing: usize,
    pub noffspring: usize,
    /// Seed of the first replication; `0` draws one at random.
    pub seed: u64,
    /// Number of best genomes appended to `B<rank>S<seed>.gen` each generation.
    pub savenbest: usize,
    /// Number of best parents whose first offspring is copied unmutated.
    pub elitism: usize,
    pub num_threads: usize,
    /// Keep the population file every N generations; `0` keeps only the last.
    pub save_population_each_n_generations: usize,
    /// Mutation rate; values of 1 and above are percentages.
    pub mutation_rate: f64,
    pub mutation_decay: f64,
    pub initial_mutation: f64,
    pub average_individual_fitness_over_generations: bool,
    pub save_retention_statistics: bool,
    pub limit_retention: bool,
    pub target_retention_rate: f64,
    pub use_gaussian: bool,
    pub gaussian_mean: f64,
    pub gaussian_std_dev: f64,
    pub offspring_std_dev: f64,
    pub variable_std_dev: bool,
    pub minimization: bool,
    pub num_modules: usize,
    pub output_dir: PathBuf,
}

impl Default for EvogaConfig {
    fn default() -> Self {
        Self {
            evolution_type: EvolutionType::SteadyState,
            ngenerations: 100,
            nreplications: 10,
            nreproducing: 20,
            noffspring: 5,
            seed: 1234,
            savenbest: 1,
            elitism: 0,
            num_threads: 1,
            save_population_each_n_generations: 0,
            mutation_rate: 0.05,
            mutation_decay: 0.01,
            initial_mutation: 0.5,
            average_individual_fitness_over_generations: true,
            save_retention_statistics: false,
            limit_retention: false,
            target_retention_rate: 0.2,
            use_gaussian: false,
            gaussian_mean: 0.0,
            gaussian_std_dev: 1.0,
            offspring_std_dev: 1.0,
            variable_std_dev: false,
            minimization: false,
            num_modules: 1,
            output_dir: PathBuf::from("."),
        }
    }
}

impl EvogaConfig {
    /// `nreproducing * noffspring`.
    #[must_use]
    pub fn population_size(&self) -> usize {
        self.nreproducing * self.noffspring
    }

    /// The configured mutation rate as a probability.
    #[must_use]
    pub fn final_mutation_rate(&self) -> f64 {
        if self.mutation_rate >= 1.0 {
            self.mutation_rate / 100.0
        } else {
            self.mutation_rate
        }
    }

    #[must_use]
    pub fn gene_settings(&self) -> GeneSettings {
        GeneSettings {
            use_gaussian: self.use_gaussian,
            gaussian_mean: self.gaussian_mean,
            gaussian_std_dev: self.gaussian_std_dev,
            offspring_std_dev: self.offspring_std_dev,
            variable_std_dev: self.variable_std_dev,
        }
    }

    /// Checks the population layout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let size = self.population_size();
        if size == 0 {
            return Err(ConfigError::EmptyPopulation {
                nreproducing: self.nreproducing,
                noffspring: self.noffspring,
            });
        }
        // steady state keeps parents and offspring side by side
        let stored = match self.evolution_type {
            EvolutionType::SteadyState => size * 2,
            EvolutionType::Generational => size,
        };
        if stored > MAX_INDIVIDUALS {
            return Err(ConfigError::PopulationTooLarge { size: stored });
        }
        if self.elitism > self.nreproducing {
            return Err(ConfigError::ElitismTooLarge {
                elitism: self.elitism,
                nreproducing: self.nreproducing,
            });
        }
        if self.savenbest > self.nreproducing {
            return Err(ConfigError::SaveBestTooLarge {
                savenbest: self.savenbest,
                nreproducing: self.nreproducing,
            });
        }
        if !(0.0..=100.0).contains(&self.mutation_rate) {
            return Err(ConfigError::InvalidMutationRate {
                rate: self.mutation_rate,
            });
        }
        Ok(())
    }
}
