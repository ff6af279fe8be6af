//! Evoga: the genetic algorithm that evolves Evonet controllers.
//!
//! A run evolves a population of genomes, one per individual, over a number
//! of generations, and repeats the whole process for several replications
//! with consecutive seeds. Each genome is written into the controller of an
//! [`Experiment`], which scores it; the scores drive selection.
//!
//! Two replacement schemes are available (see [`EvolutionType`]):
//!
//! - **Steady state**: every parent is re-evaluated and produces one mutated
//!   offspring per generation; offspring replace the worst parents whenever
//!   they are not worse.
//! - **Generational**: the best `nreproducing` individuals are archived and
//!   each fills `noffspring` slots of the next generation.
//!
//! Genes are either 8-bit integers mutated by bit flips or real values
//! mutated by Gaussian noise (see [`Gene`]).
//!
//! A run writes its progress to the output directory: per-generation
//! statistics (`statS<seed>.fit`), the best genomes (`B0S<seed>.gen`), the
//! current population (`G<gen>S<seed>.gen`) and the best fitness of each
//! replication (`bestgenS<seed>.fit`). A replication whose statistics file
//! already exists resumes from its last saved population.
//!
//! # Example
//!
//! ```
//! use evorobot_ga::{Evoga, EvogaConfig, EvolutionState, Experiment};
//! use evorobot_net::{Evonet, ProceduralLayout};
//!
//! /// Rewards large first weights.
//! #[derive(Clone)]
//! struct FirstWeight {
//!     net: Evonet,
//!     fitness: f64,
//! }
//!
//! impl Experiment<u8> for FirstWeight {
//!     fn evonet(&self) -> &Evonet {
//!         &self.net
//!     }
//!     fn evonet_mut(&mut self) -> &mut Evonet {
//!         &mut self.net
//!     }
//!     fn do_all_trials_for_individual(&mut self, _individual: usize) {
//!         self.fitness = f64::from(self.net.free_parameter(0).unwrap_or_default());
//!     }
//!     fn fitness(&self) -> f64 {
//!         self.fitness
//!     }
//! }
//!
//! let mut net = Evonet::new();
//! net.build_procedural(1, 0, 1, &ProceduralLayout::default()).unwrap();
//! let dir = tempfile::tempdir().unwrap();
//! let config = EvogaConfig {
//!     ngenerations: 5,
//!     nreplications: 1,
//!     nreproducing: 4,
//!     noffspring: 1,
//!     output_dir: dir.path().to_owned(),
//!     ..EvogaConfig::default()
//! };
//! let mut ga = Evoga::new(config, FirstWeight { net, fitness: 0.0 }).unwrap();
//! assert_eq!(ga.evolve_all_replicas(), EvolutionState::EvolutionComplete);
//! assert_eq!(ga.statistics().len(), 5);
//! ```

pub use self::{
    config::*, control::*, evoga::*, experiment::*, gene::*, genome::*, rng::*,
};

mod config;
mod control;
mod evoga;
mod experiment;
mod gene;
mod generational;
mod genome;
pub mod mutation;
pub mod persistence;
mod rng;
pub mod selection;
mod steady_state;

#[cfg(test)]
mod testing;

/// Largest number of genomes a run may store.
pub const MAX_INDIVIDUALS: usize = 1000;

/// Invalid run settings, reported before any evaluation.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigError {
    #[display("empty population: nreproducing = {nreproducing}, noffspring = {noffspring}")]
    EmptyPopulation {
        nreproducing: usize,
        noffspring: usize,
    },
    #[display("{size} genomes exceed the limit of {}", MAX_INDIVIDUALS)]
    PopulationTooLarge { size: usize },
    #[display("elitism {elitism} exceeds nreproducing {nreproducing}")]
    ElitismTooLarge { elitism: usize, nreproducing: usize },
    #[display("savenbest {savenbest} exceeds nreproducing {nreproducing}")]
    SaveBestTooLarge {
        savenbest: usize,
        nreproducing: usize,
    },
    #[display("mutation rate {rate} outside 0..=100")]
    InvalidMutationRate { rate: f64 },
    #[display("the experiment has no genes to evolve")]
    EmptyGenome,
}
