pub use self::{block::*, neuron::*, params::*};

pub(crate) mod block;
pub(crate) mod neuron;
pub(crate) mod params;
