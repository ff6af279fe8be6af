use anyhow::Context;
use evorobot_ga::{Experiment, Gene};
use evorobot_net::{
    Color, ControllerInputIterator, ControllerIterator, ControllerOutputIterator, Evonet,
    IteratorError,
};
use tracing::error;

const PATTERNS: [([f32; 2], f32); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

/// Exclusive or of two binary inputs.
///
/// Each pattern is presented to a freshly reset network for a single update.
/// The fitness is one minus the mean squared error of the output, so a
/// perfect controller scores `1.0`.
#[derive(Debug, Clone)]
pub struct XorExperiment {
    net: Evonet,
    sensor: usize,
    motor: usize,
    fitness: f64,
}

impl XorExperiment {
    pub fn new(mut net: Evonet) -> anyhow::Result<Self> {
        let sensor = net.register_input(2).context("Failed to bind the XOR inputs")?;
        let motor = net.register_output(1).context("Failed to bind the XOR output")?;

        let mut it = net.iterator();
        it.set_current_block(sensor)?;
        it.set_graphic_properties("x1", 0.0, 1.0, Color::rgb(0, 0, 255))?;
        it.next()?;
        it.set_graphic_properties("x2", 0.0, 1.0, Color::rgb(0, 0, 255))?;
        it.set_current_block(motor)?;
        it.set_graphic_properties("xor", 0.0, 1.0, Color::rgb(255, 0, 0))?;

        Ok(Self {
            net,
            sensor,
            motor,
            fitness: 0.0,
        })
    }

    /// The controller with its sensor and motor labels.
    pub fn into_net(self) -> Evonet {
        self.net
    }

    /// Output of the controller for one input pattern.
    pub fn respond(&mut self, inputs: [f32; 2]) -> Result<f32, IteratorError> {
        self.net.reset();
        let mut it = self.net.iterator();
        it.set_current_block(self.sensor)?;
        for (i, value) in inputs.into_iter().enumerate() {
            if i > 0 {
                it.next()?;
            }
            it.set_input(value)?;
        }

        self.net.update();
        let mut it = self.net.iterator();
        it.set_current_block(self.motor)?;
        it.get_output()
    }

    fn mean_squared_error(&mut self) -> Result<f64, IteratorError> {
        let mut sum = 0.0;
        for (inputs, target) in PATTERNS {
            let error = f64::from(self.respond(inputs)? - target);
            sum += error * error;
        }
        #[expect(clippy::cast_precision_loss)]
        let len = PATTERNS.len() as f64;
        Ok(sum / len)
    }
}

impl<G: Gene> Experiment<G> for XorExperiment {
    fn evonet(&self) -> &Evonet {
        &self.net
    }

    fn evonet_mut(&mut self) -> &mut Evonet {
        &mut self.net
    }

    fn do_all_trials_for_individual(&mut self, individual: usize) {
        self.fitness = match self.mean_squared_error() {
            Ok(error) => 1.0 - error,
            Err(e) => {
                error!(individual, error = %e, "cannot evaluate XOR");
                0.0
            }
        };
    }

    fn fitness(&self) -> f64 {
        self.fitness
    }
}

#[cfg(test)]
mod tests {
    use evorobot_net::ProceduralLayout;

    use super::*;

    fn experiment(nhiddens: usize) -> XorExperiment {
        let mut net = Evonet::new();
        net.build_procedural(2, nhiddens, 1, &ProceduralLayout::default())
            .unwrap();
        XorExperiment::new(net).unwrap()
    }

    #[test]
    fn test_labels_are_bound() {
        let xor = experiment(0);
        let labels: Vec<_> = xor.net.neurons().iter().map(|n| n.label().to_owned()).collect();
        assert_eq!(labels, vec!["x1", "x2", "xor"]);
    }

    #[test]
    fn test_zero_weights_score_three_quarters() {
        let mut xor = experiment(0);
        let zeros = vec![0.0_f32; Experiment::<f32>::genome_length(&xor)];
        Experiment::<f32>::set_net_parameters(&mut xor, &zeros);
        Experiment::<f32>::do_all_trials_for_individual(&mut xor, 0);
        // the output is 0.5 for every pattern
        assert!((Experiment::<f32>::fitness(&xor) - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_inputs_reach_the_output() {
        let mut xor = experiment(0);
        // weights x1 -> out, x2 -> out
        xor.net.set_parameters(&[2.0, 0.0]);
        let low = xor.respond([0.0, 1.0]).unwrap();
        let high = xor.respond([1.0, 0.0]).unwrap();
        assert!(high > low, "{low} {high}");
    }
}
