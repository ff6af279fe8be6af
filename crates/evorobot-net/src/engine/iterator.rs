//! Binding of sensors and motors to ranges of network neurons.
//!
//! Every sensor ("controller input") and motor ("controller output") owns a
//! fixed number of consecutive neurons of the input or output layer. At
//! configuration time each of them registers its size with
//! [`Evonet::register_input`] / [`Evonet::register_output`] and keeps the
//! returned block index. At every step it selects its block on the shared
//! iterator and walks through its neurons:
//!
//! ```
//! use evorobot_net::{
//!     ControllerInputIterator, ControllerIterator, ControllerOutputIterator, Evonet,
//!     ProceduralLayout,
//! };
//!
//! let mut net = Evonet::new();
//! net.build_procedural(3, 0, 1, &ProceduralLayout::default()).unwrap();
//! let proximity = net.register_input(2).unwrap();
//! let bumper = net.register_input(1).unwrap();
//! let wheel = net.register_output(1).unwrap();
//!
//! let mut it = net.iterator();
//! it.set_current_block(proximity).unwrap();
//! for value in [0.2, 0.8] {
//!     it.set_input(value).unwrap();
//!     it.next().unwrap();
//! }
//! it.set_current_block(bumper).unwrap();
//! it.set_input(1.0).unwrap();
//! assert_eq!(net.input(2), 1.0);
//!
//! net.update();
//! let mut it = net.iterator();
//! it.set_current_block(wheel).unwrap();
//! assert_eq!(it.get_output().unwrap(), 0.5);
//! ```

use derive_more::Display;

use crate::{Color, IteratorError};

use super::evonet::Evonet;

/// Layer of the network a block of neurons belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum Layer {
    #[display("input")]
    Input,
    #[display("hidden")]
    Hidden,
    #[display("output")]
    Output,
}

/// Registered range of layer-relative neuron indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoBlock {
    pub layer: Layer,
    pub start: usize,
    pub end: usize,
}

/// Operations shared by input and output iterators.
pub trait ControllerIterator {
    /// Selects the registered block `index` and moves to its first neuron.
    fn set_current_block(&mut self, index: usize) -> Result<(), IteratorError>;

    /// Moves to the next neuron of the current block.
    ///
    /// Returns `false`, without moving, when the current neuron is the last
    /// one of the block.
    fn next(&mut self) -> Result<bool, IteratorError>;

    /// Sets the label (at most nine characters), value range and colour of
    /// the current neuron.
    fn set_graphic_properties(
        &mut self,
        label: &str,
        min: f32,
        max: f32,
        color: Color,
    ) -> Result<(), IteratorError>;

    fn label(&self) -> Result<&str, IteratorError>;
    fn min_value(&self) -> Result<f32, IteratorError>;
    fn max_value(&self) -> Result<f32, IteratorError>;
    fn color(&self) -> Result<Color, IteratorError>;
}

/// Iterator used by sensors to write input activations.
pub trait ControllerInputIterator: ControllerIterator {
    fn set_input(&mut self, value: f32) -> Result<(), IteratorError>;
}

/// Iterator used by motors to read output activations.
pub trait ControllerOutputIterator: ControllerIterator {
    fn get_output(&self) -> Result<f32, IteratorError>;
}

impl Evonet {
    /// Records a block of `size` neurons starting at `start` in `layer`.
    ///
    /// Blocks of a layer must be defined in ascending order without
    /// overlapping. Returns the index of the new block.
    pub fn define_block(
        &mut self,
        layer: Layer,
        start: usize,
        size: usize,
    ) -> Result<usize, IteratorError> {
        let layer_size = match layer {
            Layer::Input => self.ninputs,
            Layer::Hidden => self.nhiddens,
            Layer::Output => self.noutputs,
        };
        let end = start.saturating_add(size);
        if end > layer_size {
            return Err(IteratorError::LayerOverflow {
                layer,
                start,
                end,
                size: layer_size,
            });
        }
        let previous = self.io_blocks.iter().rfind(|b| b.layer == layer);
        if let Some(previous) = previous.filter(|b| start < b.end) {
            return Err(IteratorError::Unordered {
                layer,
                start,
                end,
                previous_end: previous.end,
            });
        }
        self.io_blocks.push(IoBlock { layer, start, end });
        Ok(self.io_blocks.len() - 1)
    }

    /// Registers a sensor of `size` values after the previously registered ones.
    pub fn register_input(&mut self, size: usize) -> Result<usize, IteratorError> {
        let index = self.define_block(Layer::Input, self.input_offset, size)?;
        self.input_offset += size;
        Ok(index)
    }

    /// Registers a motor of `size` values after the previously registered ones.
    pub fn register_output(&mut self, size: usize) -> Result<usize, IteratorError> {
        let index = self.define_block(Layer::Output, self.output_offset, size)?;
        self.output_offset += size;
        Ok(index)
    }

    #[must_use]
    pub fn io_blocks(&self) -> &[IoBlock] {
        &self.io_blocks
    }

    /// An iterator over the registered blocks of this network.
    pub fn iterator(&mut self) -> EvonetIterator<'_> {
        EvonetIterator {
            net: self,
            current: None,
        }
    }

    fn flat_index(&self, layer: Layer, index: usize) -> usize {
        match layer {
            Layer::Input => index,
            Layer::Hidden => self.ninputs + index,
            Layer::Output => self.ninputs + self.nhiddens + index,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Cursor {
    block: IoBlock,
    index: usize,
}

/// The iterator of an [`Evonet`], implementing both input and output traits.
#[derive(Debug)]
pub struct EvonetIterator<'a> {
    net: &'a mut Evonet,
    current: Option<Cursor>,
}

impl EvonetIterator<'_> {
    fn cursor(&self) -> Result<Cursor, IteratorError> {
        let cursor = self.current.ok_or(IteratorError::NoCurrentBlock)?;
        if cursor.index >= cursor.block.end {
            return Err(IteratorError::OutOfBlock);
        }
        Ok(cursor)
    }

    fn neuron_index(&self) -> Result<usize, IteratorError> {
        let cursor = self.cursor()?;
        Ok(self.net.flat_index(cursor.block.layer, cursor.index))
    }
}

impl ControllerIterator for EvonetIterator<'_> {
    fn set_current_block(&mut self, index: usize) -> Result<(), IteratorError> {
        let block = *self
            .net
            .io_blocks
            .get(index)
            .ok_or(IteratorError::UnknownBlock { index })?;
        self.current = Some(Cursor {
            block,
            index: block.start,
        });
        Ok(())
    }

    fn next(&mut self) -> Result<bool, IteratorError> {
        let cursor = self.current.as_mut().ok_or(IteratorError::NoCurrentBlock)?;
        if cursor.index + 1 < cursor.block.end {
            cursor.index += 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn set_graphic_properties(
        &mut self,
        label: &str,
        min: f32,
        max: f32,
        color: Color,
    ) -> Result<(), IteratorError> {
        let index = self.neuron_index()?;
        let neuron = &mut self.net.neurons[index];
        neuron.set_label(label);
        neuron.range = (min, max);
        neuron.color = color;
        self.net.labels_dirty = true;
        Ok(())
    }

    fn label(&self) -> Result<&str, IteratorError> {
        let index = self.neuron_index()?;
        Ok(self.net.neurons[index].label())
    }

    fn min_value(&self) -> Result<f32, IteratorError> {
        let index = self.neuron_index()?;
        Ok(self.net.neurons[index].range.0)
    }

    fn max_value(&self) -> Result<f32, IteratorError> {
        let index = self.neuron_index()?;
        Ok(self.net.neurons[index].range.1)
    }

    fn color(&self) -> Result<Color, IteratorError> {
        let index = self.neuron_index()?;
        Ok(self.net.neurons[index].color)
    }
}

impl ControllerInputIterator for EvonetIterator<'_> {
    fn set_input(&mut self, value: f32) -> Result<(), IteratorError> {
        let cursor = self.cursor()?;
        self.net.set_input(cursor.index, value)?;
        Ok(())
    }
}

impl ControllerOutputIterator for EvonetIterator<'_> {
    fn get_output(&self) -> Result<f32, IteratorError> {
        let cursor = self.cursor()?;
        Ok(self.net.output(cursor.index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProceduralLayout;

    fn net_with_blocks() -> (Evonet, usize, usize) {
        let mut net = Evonet::new();
        net.build_procedural(3, 1, 2, &ProceduralLayout::default())
            .unwrap();
        let sensor = net.register_input(3).unwrap();
        let motor = net.register_output(2).unwrap();
        (net, sensor, motor)
    }

    mod protocol {
        use super::*;

        #[test]
        fn test_requires_current_block() {
            let (mut net, _, _) = net_with_blocks();
            let mut it = net.iterator();
            assert!(matches!(it.set_input(1.0), Err(IteratorError::NoCurrentBlock)));
            assert!(matches!(it.next(), Err(IteratorError::NoCurrentBlock)));
            assert!(matches!(it.get_output(), Err(IteratorError::NoCurrentBlock)));
            assert!(matches!(it.label(), Err(IteratorError::NoCurrentBlock)));
            assert!(matches!(
                it.set_current_block(2),
                Err(IteratorError::UnknownBlock { index: 2 })
            ));
        }

        #[test]
        fn test_next_stops_at_block_end() {
            let (mut net, sensor, _) = net_with_blocks();
            let mut it = net.iterator();
            it.set_current_block(sensor).unwrap();
            assert!(it.next().unwrap());
            assert!(it.next().unwrap());
            assert!(!it.next().unwrap());
            assert!(!it.next().unwrap());
            it.set_input(0.75).unwrap();
            assert_eq!(net.input(2), 0.75);
            assert_eq!(net.input(0), 0.0);
        }

        #[test]
        fn test_output_translation() {
            let (mut net, _, motor) = net_with_blocks();
            net.inject_hidden(0, 0.3);
            net.update();
            let expected = net.output(1);
            let mut it = net.iterator();
            it.set_current_block(motor).unwrap();
            it.next().unwrap();
            assert_eq!(it.get_output().unwrap(), expected);
        }

        #[test]
        fn test_layer_overflow() {
            let (mut net, _, _) = net_with_blocks();
            assert!(matches!(
                net.register_input(1),
                Err(IteratorError::LayerOverflow {
                    layer: Layer::Input,
                    start: 3,
                    end: 4,
                    size: 3
                })
            ));
            let hidden = net.define_block(Layer::Hidden, 0, 1).unwrap();
            assert_eq!(net.io_blocks()[hidden].layer, Layer::Hidden);
        }

        #[test]
        fn test_blocks_of_a_layer_are_ordered() {
            let mut net = Evonet::new();
            net.build_procedural(4, 0, 2, &ProceduralLayout::default())
                .unwrap();
            net.define_block(Layer::Input, 1, 2).unwrap();
            assert!(matches!(
                net.define_block(Layer::Input, 2, 1),
                Err(IteratorError::Unordered {
                    layer: Layer::Input,
                    previous_end: 3,
                    ..
                })
            ));
            assert!(matches!(
                net.define_block(Layer::Input, 0, 1),
                Err(IteratorError::Unordered { .. })
            ));
            // other layers keep their own order
            net.define_block(Layer::Output, 0, 1).unwrap();
            net.define_block(Layer::Input, 3, 1).unwrap();
            assert_eq!(net.io_blocks().len(), 3);
        }
    }

    mod graphics {
        use super::*;

        #[test]
        fn test_properties_of_current_neuron() {
            let (mut net, _, motor) = net_with_blocks();
            let mut it = net.iterator();
            it.set_current_block(motor).unwrap();
            it.next().unwrap();
            it.set_graphic_properties("right-wheel", -1.0, 1.0, Color::rgb(255, 0, 0))
                .unwrap();
            assert_eq!(it.label().unwrap(), "right-whe");
            assert_eq!(it.min_value().unwrap(), -1.0);
            assert_eq!(it.max_value().unwrap(), 1.0);
            assert_eq!(it.color().unwrap(), Color::rgb(255, 0, 0));
            assert_eq!(net.neurons()[5].label(), "right-whe");
        }
    }
}
