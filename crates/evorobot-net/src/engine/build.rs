use crate::{
    ArchitectureError, Color, ConfigureError, EvonetConfig, MAXN,
    core::{Block, Neuron, NeuronRange, NeuronType},
};

use super::evonet::Evonet;

/// Horizontal spacing of neurons in the display layout.
const LAYOUT_DX: usize = 30;
const INPUT_Y: i32 = 400;
const HIDDEN_Y: i32 = 225;
const OUTPUT_Y: i32 = 50;

/// Topology switches of a procedurally built network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProceduralLayout {
    pub input_type: NeuronType,
    pub hidden_type: NeuronType,
    pub output_type: NeuronType,
    pub recurrent_hiddens: bool,
    /// Connect inputs directly to outputs even when hidden neurons exist.
    pub input_output_connections: bool,
    pub recurrent_outputs: bool,
    pub bias_on_hidden: bool,
    pub bias_on_output: bool,
}

impl ProceduralLayout {
    /// The canonical block schedule for the given layer sizes.
    ///
    /// # Arguments
    ///
    /// * `ni`, `nh`, `no` - Number of input, hidden and output neurons
    #[must_use]
    pub fn blocks(&self, ni: usize, nh: usize, no: usize) -> Vec<Block> {
        let inputs = NeuronRange::new(0, ni);
        let hiddens = NeuronRange::new(ni, nh);
        let outputs = NeuronRange::new(ni + nh, no);

        let mut blocks = vec![Block::update(inputs)];
        if nh > 0 {
            blocks.push(Block::connection(hiddens, inputs));
        }
        if self.recurrent_hiddens {
            blocks.push(Block::connection(hiddens, hiddens));
        }
        if nh > 0 {
            blocks.push(Block::update(hiddens));
        }
        if nh == 0 || self.input_output_connections {
            blocks.push(Block::connection(outputs, inputs));
        }
        if nh > 0 {
            blocks.push(Block::connection(outputs, hiddens));
        }
        if self.recurrent_outputs {
            blocks.push(Block::connection(outputs, outputs));
        }
        blocks.push(Block::update(outputs));
        blocks
    }

    /// Neurons with their types, bias flags and display positions.
    #[expect(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    #[must_use]
    pub fn neurons(&self, ni: usize, nh: usize, no: usize) -> Vec<Neuron> {
        let x = |start: usize, i: usize| (start + i * LAYOUT_DX) as i32;
        let input_start = if ni > no {
            50
        } else {
            ((no - ni) / 2) * LAYOUT_DX + 50
        };
        let hidden_start = ni * LAYOUT_DX;
        let output_start = if ni > no {
            ((ni - no) / 2) * LAYOUT_DX + 50
        } else {
            50
        };

        let inputs = (0..ni).map(|i| Neuron {
            position: (x(input_start, i), INPUT_Y),
            ..Neuron::new(self.input_type, false)
        });
        let hiddens = (0..nh).map(|i| Neuron {
            position: (x(hidden_start, i), HIDDEN_Y),
            ..Neuron::new(self.hidden_type, self.bias_on_hidden)
        });
        let outputs = (0..no).map(|i| Neuron {
            position: (x(output_start, i), OUTPUT_Y),
            ..Neuron::new(self.output_type, self.bias_on_output)
        });
        inputs.chain(hiddens).chain(outputs).collect()
    }
}

impl Evonet {
    /// Builds the canonical network for the given layer sizes.
    ///
    /// Fails when the network would exceed [`MAXN`] neurons.
    pub fn build_procedural(
        &mut self,
        ninputs: usize,
        nhiddens: usize,
        noutputs: usize,
        layout: &ProceduralLayout,
    ) -> Result<(), ArchitectureError> {
        let count = ninputs + nhiddens + noutputs;
        if count > MAXN {
            return Err(ArchitectureError::TooManyNeurons { count });
        }
        let neurons = layout.neurons(ninputs, nhiddens, noutputs);
        let blocks = layout.blocks(ninputs, nhiddens, noutputs);
        self.set_architecture(ninputs, noutputs, neurons, blocks)
    }

    /// Prepares the network for an experiment with `n_sensors` inputs and
    /// `n_motors` outputs.
    ///
    /// Without a `net_file` the network is built procedurally. Otherwise the
    /// architecture is loaded from that file, which must exist and match the
    /// sensor and motor counts, and the parameter file with the same stem and
    /// a `.phe` extension is loaded if present.
    pub fn configure(
        &mut self,
        config: &EvonetConfig,
        n_sensors: usize,
        n_motors: usize,
    ) -> Result<(), ConfigureError> {
        self.set_ranges(config.weight_range, config.bias_range, config.gain_range);

        match &config.net_file {
            None => {
                self.build_procedural(n_sensors, config.n_hiddens, n_motors, &config.layout())?;
            }
            Some(net_file) => {
                if !self.load_architecture(net_file)? {
                    return Err(ConfigureError::MissingNetFile {
                        path: net_file.clone(),
                    });
                }
                if self.ninputs != n_sensors {
                    return Err(ConfigureError::InputMismatch {
                        expected: n_sensors,
                        found: self.ninputs,
                    });
                }
                if self.noutputs != n_motors {
                    return Err(ConfigureError::OutputMismatch {
                        expected: n_motors,
                        found: self.noutputs,
                    });
                }
                self.load_parameter_overrides(&net_file.with_extension("phe"))?;
            }
        }

        self.reset();
        self.log_blocks();

        for i in 0..self.nhiddens {
            let neuron = &mut self.neurons[self.ninputs + i];
            neuron.set_label(&format!("h{i}"));
            neuron.range = (0.0, 1.0);
            neuron.color = Color::GREY;
        }
        self.labels_dirty = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(blocks: &[Block]) -> Vec<[i64; 6]> {
        blocks.iter().map(Block::to_row).collect()
    }

    mod layout {
        use super::*;

        #[test]
        fn test_block_schedule_with_hiddens() {
            let layout = ProceduralLayout {
                recurrent_hiddens: true,
                recurrent_outputs: true,
                ..ProceduralLayout::default()
            };
            assert_eq!(
                rows(&layout.blocks(3, 2, 1)),
                vec![
                    [1, 0, 3, 0, 0, 0],
                    [0, 3, 2, 0, 3, 0],
                    [0, 3, 2, 3, 2, 0],
                    [1, 3, 2, 0, 0, 0],
                    [0, 5, 1, 3, 2, 0],
                    [0, 5, 1, 5, 1, 0],
                    [1, 5, 1, 0, 0, 0],
                ]
            );
        }

        #[test]
        fn test_input_output_block_only_without_hiddens_or_on_request() {
            let layout = ProceduralLayout::default();
            assert_eq!(
                rows(&layout.blocks(2, 0, 1)),
                vec![[1, 0, 2, 0, 0, 0], [0, 2, 1, 0, 2, 0], [1, 2, 1, 0, 0, 0]]
            );
            assert!(
                !rows(&layout.blocks(2, 1, 1)).contains(&[0, 3, 1, 0, 2, 0]),
                "no direct input-output block when hiddens exist"
            );

            let layout = ProceduralLayout {
                input_output_connections: true,
                ..ProceduralLayout::default()
            };
            assert!(rows(&layout.blocks(2, 1, 1)).contains(&[0, 3, 1, 0, 2, 0]));
        }

        #[test]
        fn test_display_positions() {
            let neurons = ProceduralLayout::default().neurons(4, 1, 2);
            let positions: Vec<_> = neurons.iter().map(|n| n.position).collect();
            assert_eq!(
                positions,
                vec![
                    (50, 400),
                    (80, 400),
                    (110, 400),
                    (140, 400),
                    (120, 225),
                    (80, 50),
                    (110, 50),
                ]
            );
            assert!(neurons.iter().all(|n| n.display));
        }

        #[test]
        fn test_bias_flags() {
            let layout = ProceduralLayout {
                bias_on_hidden: true,
                hidden_type: NeuronType::FlattenedLogistic,
                ..ProceduralLayout::default()
            };
            let neurons = layout.neurons(1, 2, 1);
            let bias: Vec<_> = neurons.iter().map(|n| n.bias).collect();
            assert_eq!(bias, vec![false, true, true, false]);
            assert_eq!(neurons[1].kind, NeuronType::FlattenedLogistic);
        }
    }

    mod configure {
        use super::*;

        #[test]
        fn test_too_many_neurons() {
            let mut net = Evonet::new();
            let err = net
                .build_procedural(MAXN, 1, 0, &ProceduralLayout::default())
                .unwrap_err();
            assert!(matches!(err, ArchitectureError::TooManyNeurons { count } if count == MAXN + 1));
        }

        #[test]
        fn test_procedural_labels_hiddens() {
            let config = EvonetConfig {
                n_hiddens: 2,
                bias_on_output_neurons: true,
                ..EvonetConfig::default()
            };
            let mut net = Evonet::new();
            net.configure(&config, 3, 2).unwrap();
            assert_eq!(net.nneurons(), 7);
            // 3*2 + 2*2 weights + 2 output biases
            assert_eq!(net.free_parameters(), 12);
            assert_eq!(net.neurons()[3].label(), "h0");
            assert_eq!(net.neurons()[4].color, Color::GREY);
        }

        #[test]
        fn test_missing_net_file_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let config = EvonetConfig {
                net_file: Some(dir.path().join("missing.net")),
                ..EvonetConfig::default()
            };
            let err = Evonet::new().configure(&config, 1, 1).unwrap_err();
            assert!(matches!(err, ConfigureError::MissingNetFile { .. }));
        }

        #[test]
        fn test_sensor_mismatch_is_fatal() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("controller.net");
            let mut net = Evonet::new();
            net.build_procedural(2, 0, 1, &ProceduralLayout::default())
                .unwrap();
            net.save_architecture(&path, false).unwrap();

            let config = EvonetConfig {
                net_file: Some(path),
                ..EvonetConfig::default()
            };
            let err = Evonet::new().configure(&config, 3, 1).unwrap_err();
            assert!(matches!(
                err,
                ConfigureError::InputMismatch {
                    expected: 3,
                    found: 2
                }
            ));
            let err = Evonet::new().configure(&config, 2, 2).unwrap_err();
            assert!(matches!(err, ConfigureError::OutputMismatch { .. }));
            Evonet::new().configure(&config, 2, 1).unwrap();
        }
    }
}
