use std::sync::Arc;

use evorobot_net::Evonet;

use crate::{Gene, StepControl};

/// A task that scores controllers encoded by genomes of `G`.
///
/// The GA calls [`Experiment::set_net_parameters`] with the genome of an
/// individual, runs [`Experiment::do_all_trials_for_individual`] and reads
/// [`Experiment::fitness`]. With more than one evaluation thread every worker
/// owns a clone of the experiment, so clones must not share mutable state.
pub trait Experiment<G: Gene>: Clone + Send {
    /// The controller evaluated by this experiment.
    fn evonet(&self) -> &Evonet;

    fn evonet_mut(&mut self) -> &mut Evonet;

    /// Number of genes of a genome; defaults to the free parameters of the
    /// controller.
    fn genome_length(&self) -> usize {
        self.evonet().free_parameters()
    }

    /// Writes a genome into the controller.
    fn set_net_parameters(&mut self, genes: &[G]) {
        G::load_into(genes, self.evonet_mut());
    }

    /// Runs every trial of `individual` and stores its fitness.
    fn do_all_trials_for_individual(&mut self, individual: usize);

    /// Fitness of the last evaluated individual.
    fn fitness(&self) -> f64;

    fn init_generation(&mut self, _generation: usize) {}

    fn end_generation(&mut self, _generation: usize) {}

    /// Called at the start of each replication with its seed.
    fn new_ga_seed(&mut self, _seed: u64) {}

    /// Gives the experiment access to the stop and step-by-step controls of
    /// the run, e.g. to honour a stop request in the middle of a trial.
    fn attach_control(&mut self, _control: Arc<StepControl>) {}
}

/// Evaluates `genes` as `individual` and returns its fitness.
pub(crate) fn evaluate<G, E>(experiment: &mut E, genes: &[G], individual: usize) -> f64
where
    G: Gene,
    E: Experiment<G>,
{
    experiment.set_net_parameters(genes);
    experiment.do_all_trials_for_individual(individual);
    experiment.fitness()
}
