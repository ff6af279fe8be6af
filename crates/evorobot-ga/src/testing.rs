use evorobot_net::{Evonet, ProceduralLayout};

use crate::{EvogaConfig, Experiment, Gene};

/// Scores an individual by the sum of its free parameters.
#[derive(Debug, Clone)]
pub(crate) struct SumExperiment {
    pub net: Evonet,
    pub fitness: f64,
    pub generations_started: usize,
    pub generations_ended: usize,
    pub seeds: Vec<u64>,
    pub evaluated: Vec<usize>,
}

impl SumExperiment {
    /// A controller with `ninputs` weights and no hidden neurons.
    pub fn new(ninputs: usize) -> Self {
        let mut net = Evonet::new();
        net.build_procedural(ninputs, 0, 1, &ProceduralLayout::default())
            .unwrap();
        Self {
            net,
            fitness: 0.0,
            generations_started: 0,
            generations_ended: 0,
            seeds: vec![],
            evaluated: vec![],
        }
    }
}

impl<G: Gene> Experiment<G> for SumExperiment {
    fn evonet(&self) -> &Evonet {
        &self.net
    }

    fn evonet_mut(&mut self) -> &mut Evonet {
        &mut self.net
    }

    fn do_all_trials_for_individual(&mut self, individual: usize) {
        self.evaluated.push(individual);
        self.fitness = self
            .net
            .parameters()
            .values()
            .iter()
            .map(|&p| f64::from(p))
            .sum();
    }

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn init_generation(&mut self, _generation: usize) {
        self.generations_started += 1;
    }

    fn end_generation(&mut self, _generation: usize) {
        self.generations_ended += 1;
    }

    fn new_ga_seed(&mut self, seed: u64) {
        self.seeds.push(seed);
    }
}

/// A small single-replication run writing into `dir`.
pub(crate) fn small_config(dir: &std::path::Path) -> EvogaConfig {
    EvogaConfig {
        ngenerations: 3,
        nreplications: 1,
        nreproducing: 4,
        noffspring: 2,
        seed: 21,
        output_dir: dir.to_owned(),
        ..EvogaConfig::default()
    }
}
