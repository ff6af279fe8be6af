use std::sync::mpsc::Receiver;

use crate::{
    ArchitectureError, DEFAULT_RANGE, GENE_MAX_VALUE, HIDDEN_SENTINEL, IO_SENTINEL,
    IndexOutOfRange, MAXN, is_default,
    core::{Block, FreeParameters, Neuron, NeuronType},
};

use super::{
    history::ActivationHistory,
    iterator::IoBlock,
    monitor::{ActivationFrame, Delivery, NeuronMonitor},
};

/// Ranges mapping free parameters to physical magnitudes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterRanges {
    pub weight: f32,
    pub bias: f32,
    pub gain: f32,
}

impl Default for ParameterRanges {
    fn default() -> Self {
        Self {
            weight: DEFAULT_RANGE,
            bias: DEFAULT_RANGE,
            gain: DEFAULT_RANGE,
        }
    }
}

impl ParameterRanges {
    /// Decodes an integer gene into a parameter in `[-weight, weight]`.
    ///
    /// The mapping is linear and decreasing: gene `0` gives `weight` and gene
    /// `255` gives `-weight`.
    ///
    /// # Examples
    ///
    /// ```
    /// # use evorobot_net::ParameterRanges;
    /// let ranges = ParameterRanges::default();
    /// assert_eq!(ranges.decode_gene(0), 5.0);
    /// assert_eq!(ranges.decode_gene(255), -5.0);
    /// ```
    #[must_use]
    pub fn decode_gene(&self, gene: u8) -> f32 {
        self.weight - (f32::from(gene) / f32::from(GENE_MAX_VALUE)) * self.weight * 2.0
    }

    /// Inverse of [`Self::decode_gene`], truncated to the gene grid.
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn encode_gene(&self, parameter: f32) -> u8 {
        let gene = (self.weight - parameter) * f32::from(GENE_MAX_VALUE) / (2.0 * self.weight);
        gene.clamp(0.0, f32::from(GENE_MAX_VALUE)) as u8
    }
}

fn logistic(f: f32) -> f32 {
    1.0 / (1.0 + (-f).exp())
}

/// A block-structured neural network.
///
/// The network is built either procedurally
/// ([`Evonet::build_procedural`]) or from a `.net` file
/// ([`Evonet::load_architecture`]); [`Evonet::configure`] does either from an
/// [`EvonetConfig`](crate::EvonetConfig). Each control step the caller writes
/// the inputs, calls [`Evonet::update`] and reads the outputs.
#[derive(Debug, Clone)]
pub struct Evonet {
    name: String,
    pub(crate) ninputs: usize,
    pub(crate) nhiddens: usize,
    pub(crate) noutputs: usize,
    pub(crate) neurons: Vec<Neuron>,
    pub(crate) blocks: Vec<Block>,
    nparameters: usize,
    pub(crate) params: FreeParameters,
    ranges: ParameterRanges,
    pub(crate) phe_loaded: bool,
    act: Vec<f32>,
    netinput: Vec<f32>,
    input: Vec<f32>,
    gain: Vec<f32>,
    history: ActivationHistory,
    updates: u64,
    monitor: Option<NeuronMonitor>,
    pub(crate) labels_dirty: bool,
    pub(crate) io_blocks: Vec<IoBlock>,
    pub(crate) input_offset: usize,
    pub(crate) output_offset: usize,
}

impl Default for Evonet {
    fn default() -> Self {
        Self::new()
    }
}

impl Evonet {
    /// Creates an empty network with default ranges.
    #[must_use]
    pub fn new() -> Self {
        Self {
            name: String::new(),
            ninputs: 0,
            nhiddens: 0,
            noutputs: 0,
            neurons: vec![],
            blocks: vec![],
            nparameters: 0,
            params: FreeParameters::default(),
            ranges: ParameterRanges::default(),
            phe_loaded: false,
            act: vec![],
            netinput: vec![],
            input: vec![],
            gain: vec![],
            history: ActivationHistory::default(),
            updates: 0,
            monitor: None,
            labels_dirty: true,
            io_blocks: vec![],
            input_offset: 0,
            output_offset: 0,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Replaces the architecture of the network.
    ///
    /// Neurons `0..ninputs` are inputs, the last `noutputs` neurons are
    /// outputs and the rest are hiddens. The parameter bundle is reallocated
    /// for the new parameter count and all activations are cleared.
    pub fn set_architecture(
        &mut self,
        ninputs: usize,
        noutputs: usize,
        neurons: Vec<Neuron>,
        blocks: Vec<Block>,
    ) -> Result<(), ArchitectureError> {
        let nneurons = neurons.len();
        if nneurons > MAXN {
            return Err(ArchitectureError::TooManyNeurons { count: nneurons });
        }
        if ninputs + noutputs > nneurons {
            return Err(ArchitectureError::InvalidLayers {
                nneurons,
                ninputs,
                noutputs,
            });
        }
        for (index, block) in blocks.iter().enumerate() {
            let src = block.src();
            let reads_src = match block {
                Block::Connection { .. } => !src.is_empty(),
                Block::ModulatedGain { dest, .. } => !dest.is_empty(),
                Block::Update { .. } | Block::Gain { .. } => false,
            };
            let src_ok = !reads_src || (src.start < nneurons && src.end() <= nneurons);
            if block.dest().end() > nneurons || !src_ok {
                return Err(ArchitectureError::BlockOutOfRange {
                    index,
                    block: *block,
                    nneurons,
                });
            }
        }

        self.ninputs = ninputs;
        self.noutputs = noutputs;
        self.nhiddens = nneurons - ninputs - noutputs;
        self.neurons = neurons;
        self.blocks = blocks;
        self.act = vec![0.0; nneurons];
        self.netinput = vec![0.0; nneurons];
        self.input = vec![0.0; nneurons];
        self.gain = vec![1.0; nneurons];
        self.io_blocks.clear();
        self.input_offset = 0;
        self.output_offset = 0;
        self.phe_loaded = false;
        self.labels_dirty = true;
        self.history.clear();
        self.updates = 0;
        self.nparameters = self.compute_parameters();
        self.params.resize(self.nparameters);
        Ok(())
    }

    /// Counts the free parameters the current architecture requires.
    ///
    /// The count is the number of gain flags, plus the number of bias flags,
    /// plus the number of delta neurons, plus `dest.count * src.count` for
    /// every connection block. A warning is logged (once) when a neuron is
    /// not updated by exactly one update block.
    #[must_use]
    pub fn compute_parameters(&self) -> usize {
        let gains = self.neurons.iter().filter(|n| n.gain).count();
        let biases = self.neurons.iter().filter(|n| n.bias).count();
        let time_constants = self
            .neurons
            .iter()
            .filter(|n| n.kind.has_time_constant())
            .count();
        let weights: usize = self.blocks.iter().map(Block::weight_count).sum();

        let mut updated = vec![0_usize; self.neurons.len()];
        for block in self.blocks.iter().filter(|b| b.is_update()) {
            for t in block.dest().indices() {
                updated[t] += 1;
            }
        }
        if let Some((neuron, &count)) = updated.iter().enumerate().find(|(_, c)| **c != 1) {
            if count == 0 {
                tracing::warn!(neuron, "neuron will never be activated by the current architecture");
            } else {
                tracing::warn!(neuron, count, "neuron will be activated more than once per update");
            }
        }

        gains + biases + time_constants + weights
    }

    #[must_use]
    pub fn ninputs(&self) -> usize {
        self.ninputs
    }

    #[must_use]
    pub fn nhiddens(&self) -> usize {
        self.nhiddens
    }

    #[must_use]
    pub fn noutputs(&self) -> usize {
        self.noutputs
    }

    #[must_use]
    pub fn nneurons(&self) -> usize {
        self.neurons.len()
    }

    #[must_use]
    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    #[must_use]
    pub fn ranges(&self) -> ParameterRanges {
        self.ranges
    }

    #[must_use]
    pub fn weight_range(&self) -> f32 {
        self.ranges.weight
    }

    #[must_use]
    pub fn bias_range(&self) -> f32 {
        self.ranges.bias
    }

    #[must_use]
    pub fn gain_range(&self) -> f32 {
        self.ranges.gain
    }

    pub fn set_ranges(&mut self, weight: f32, bias: f32, gain: f32) {
        self.ranges = ParameterRanges { weight, bias, gain };
    }

    /// Number of free parameters.
    #[must_use]
    pub fn free_parameters(&self) -> usize {
        self.nparameters
    }

    #[must_use]
    pub fn free_parameter(&self, index: usize) -> Option<f32> {
        self.params.values().get(index).copied()
    }

    #[must_use]
    pub fn parameters(&self) -> &FreeParameters {
        &self.params
    }

    /// Overwrites the free parameters with `values`.
    ///
    /// Extra values are ignored; missing ones leave parameters unchanged.
    pub fn set_parameters(&mut self, values: &[f32]) {
        for (p, v) in self.params.values_mut().iter_mut().zip(values) {
            *p = *v;
        }
    }

    /// Overwrites the free parameters with decoded integer genes.
    ///
    /// See [`ParameterRanges::decode_gene`].
    pub fn set_parameters_from_genes(&mut self, genes: &[u8]) {
        let ranges = self.ranges;
        for (p, g) in self.params.values_mut().iter_mut().zip(genes) {
            *p = ranges.decode_gene(*g);
        }
    }

    /// Whether a `.phe` file has been loaded since the last architecture change.
    #[must_use]
    pub fn phe_file_loaded(&self) -> bool {
        self.phe_loaded
    }

    /// Maps the pinned parameter values back to integer genes.
    ///
    /// Parameters without an override are `None`.
    #[must_use]
    pub fn copy_phe_parameters(&self) -> Vec<Option<u8>> {
        let ranges = self.ranges;
        self.params
            .overrides()
            .iter()
            .map(|&p| (!is_default(p)).then(|| ranges.encode_gene(p)))
            .collect()
    }

    /// Pinned parameter values, `None` where unset.
    #[must_use]
    pub fn phe_parameters(&self) -> Vec<Option<f32>> {
        self.params
            .overrides()
            .iter()
            .map(|&p| (!is_default(p)).then_some(p))
            .collect()
    }

    /// Per-parameter mutation rates, `None` where unset.
    #[must_use]
    pub fn mutations(&self) -> Vec<Option<f32>> {
        self.params
            .mutations()
            .iter()
            .map(|&m| (!is_default(m)).then_some(m))
            .collect()
    }

    /// Writes the activation of input `index`.
    pub fn set_input(&mut self, index: usize, value: f32) -> Result<(), IndexOutOfRange> {
        if index >= self.ninputs {
            return Err(IndexOutOfRange {
                index,
                len: self.ninputs,
            });
        }
        self.input[index] = value;
        Ok(())
    }

    /// Activation of output `index`, or [`IO_SENTINEL`].
    #[must_use]
    pub fn output(&self, index: usize) -> f32 {
        self.try_output(index).unwrap_or(IO_SENTINEL)
    }

    #[must_use]
    pub fn try_output(&self, index: usize) -> Option<f32> {
        (index < self.noutputs).then(|| self.act[self.ninputs + self.nhiddens + index])
    }

    /// Last value written to input `index`, or [`IO_SENTINEL`].
    #[must_use]
    pub fn input(&self, index: usize) -> f32 {
        self.try_input(index).unwrap_or(IO_SENTINEL)
    }

    #[must_use]
    pub fn try_input(&self, index: usize) -> Option<f32> {
        (index < self.ninputs).then(|| self.input[index])
    }

    /// Activation of hidden neuron `index`, or [`HIDDEN_SENTINEL`].
    #[must_use]
    pub fn hidden(&self, index: usize) -> f32 {
        self.try_hidden(index).unwrap_or(HIDDEN_SENTINEL)
    }

    #[must_use]
    pub fn try_hidden(&self, index: usize) -> Option<f32> {
        (index < self.nhiddens).then(|| self.act[self.ninputs + index])
    }

    /// Activation of neuron `index`, or [`IO_SENTINEL`].
    #[must_use]
    pub fn neuron(&self, index: usize) -> f32 {
        self.try_neuron(index).unwrap_or(IO_SENTINEL)
    }

    #[must_use]
    pub fn try_neuron(&self, index: usize) -> Option<f32> {
        self.act.get(index).copied()
    }

    #[must_use]
    pub fn activations(&self) -> &[f32] {
        &self.act
    }

    /// Overwrites the activation of hidden neuron `index`; ignored if out of range.
    pub fn inject_hidden(&mut self, index: usize, value: f32) {
        if index < self.nhiddens {
            self.act[self.ninputs + index] = value;
        }
    }

    /// Forces the activation of `neuron` to `value` after every update.
    pub fn set_lesion(&mut self, neuron: usize, value: f32) -> Result<(), IndexOutOfRange> {
        let len = self.neurons.len();
        let n = self
            .neurons
            .get_mut(neuron)
            .ok_or(IndexOutOfRange { index: neuron, len })?;
        n.lesion = Some(value);
        Ok(())
    }

    pub fn clear_lesion(&mut self, neuron: usize) {
        if let Some(n) = self.neurons.get_mut(neuron) {
            n.lesion = None;
        }
    }

    pub fn clear_lesions(&mut self) {
        for n in &mut self.neurons {
            n.lesion = None;
        }
    }

    /// Sets the label of `neuron`, truncated to nine characters.
    pub fn set_neuron_label(&mut self, neuron: usize, label: &str) {
        if let Some(n) = self.neurons.get_mut(neuron) {
            n.set_label(label);
            self.labels_dirty = true;
        }
    }

    /// Zeroes activations, net inputs and inputs and the update counter.
    ///
    /// Architecture, parameters and the activation history are kept.
    pub fn reset(&mut self) {
        self.act.fill(0.0);
        self.netinput.fill(0.0);
        self.input.fill(0.0);
        self.updates = 0;
    }

    /// Number of updates since the last reset.
    #[must_use]
    pub fn update_count(&self) -> u64 {
        self.updates
    }

    /// Removes and returns the oldest activation vector of the history.
    pub fn oldest_stored_activations(&mut self) -> Option<Vec<f32>> {
        self.history.pop_oldest()
    }

    #[must_use]
    pub fn history(&self) -> &ActivationHistory {
        &self.history
    }

    /// Publishes activations on a new bounded channel after every update.
    ///
    /// A previously attached monitor is replaced.
    pub fn attach_monitor(&mut self, capacity: usize) -> Receiver<ActivationFrame> {
        let (monitor, receiver) = NeuronMonitor::channel(capacity);
        self.monitor = Some(monitor);
        self.labels_dirty = true;
        receiver
    }

    pub fn detach_monitor(&mut self) {
        self.monitor = None;
    }

    /// Suspends or resumes publishing to the attached monitor.
    pub fn set_monitor_enabled(&mut self, enabled: bool) {
        if let Some(monitor) = &mut self.monitor {
            monitor.enabled = enabled;
        }
    }

    /// Runs the block schedule once.
    pub fn update(&mut self) {
        let ParameterRanges {
            weight: wrange,
            bias: brange,
            gain: grange,
        } = self.ranges;
        let params = self.params.values();
        let mut cursor = 0;
        let mut next_param = || {
            let p = params.get(cursor).copied().unwrap_or(0.0);
            cursor += 1;
            p
        };

        for (i, neuron) in self.neurons.iter().enumerate() {
            self.gain[i] = if neuron.gain {
                next_param().abs() / wrange * grange
            } else {
                1.0
            };
        }
        for (i, neuron) in self.neurons.iter().enumerate() {
            self.netinput[i] = if neuron.bias {
                next_param() / wrange * brange
            } else {
                0.0
            };
        }

        for block in &self.blocks {
            match *block {
                Block::Connection { dest, src, .. } => {
                    for t in dest.indices() {
                        for s in src.indices() {
                            self.netinput[t] += self.act[s] * self.gain[s] * next_param();
                        }
                    }
                }
                Block::Gain { dest, .. } => {
                    for t in dest.indices() {
                        self.gain[t] = self.gain[dest.start];
                    }
                }
                Block::ModulatedGain { dest, src, .. } => {
                    for t in dest.indices() {
                        self.gain[t] = self.act[src.start];
                    }
                }
                Block::Update { dest, .. } => {
                    for t in dest.indices() {
                        let neuron = &self.neurons[t];
                        let act = &mut self.act[t];
                        if t < self.ninputs {
                            match neuron.kind {
                                NeuronType::Plain => *act = self.input[t],
                                NeuronType::Delta => {
                                    let delta = next_param().abs() / wrange;
                                    *act = (*act * delta + self.input[t] * (1.0 - delta))
                                        .clamp(0.0, 1.0);
                                }
                                NeuronType::Binary | NeuronType::FlattenedLogistic => {}
                            }
                        } else {
                            let net = self.netinput[t];
                            match neuron.kind {
                                NeuronType::Plain => *act = logistic(net),
                                NeuronType::Delta => {
                                    let delta = next_param().abs() / wrange;
                                    *act = (*act * delta + logistic(net) * (1.0 - delta))
                                        .clamp(0.0, 1.0);
                                }
                                NeuronType::Binary => *act = if net >= 0.0 { 1.0 } else { 0.0 },
                                NeuronType::FlattenedLogistic => *act = logistic(net * 0.2),
                            }
                        }
                        if let Some(value) = neuron.lesion {
                            *act = value;
                        }
                    }
                }
            }
        }

        self.history.push(&self.act);
        self.updates += 1;
        self.publish_activations();
    }

    fn publish_activations(&mut self) {
        let Some(monitor) = &self.monitor else {
            return;
        };
        if !monitor.enabled {
            return;
        }
        let labels = self.labels_dirty.then(|| {
            self.neurons
                .iter()
                .map(|n| (n.label().to_owned(), n.color))
                .collect()
        });
        let frame = ActivationFrame {
            activations: self.act.clone(),
            update_count: self.updates,
            labels,
        };
        let sent_labels = frame.labels.is_some();
        match monitor.publish(frame) {
            Delivery::Sent => {
                if sent_labels {
                    self.labels_dirty = false;
                }
            }
            Delivery::Dropped => {}
            Delivery::Disconnected => {
                tracing::debug!("activation monitor disconnected");
                self.monitor = None;
            }
        }
    }

    /// Logs the layer sizes and the block list.
    pub fn log_blocks(&self) {
        tracing::info!(
            ninputs = self.ninputs,
            nhiddens = self.nhiddens,
            noutputs = self.noutputs,
            nneurons = self.neurons.len(),
            "evonet architecture"
        );
        for block in &self.blocks {
            tracing::info!("evonet block - {block}");
        }
    }

    /// Logs the current inputs, hidden and output activations.
    pub fn log_io(&self) {
        let join = |values: &[f32]| {
            values
                .iter()
                .map(|v| format!("{v:.10}"))
                .collect::<Vec<_>>()
                .join(" ")
        };
        let hidden_end = self.ninputs + self.nhiddens;
        tracing::info!(
            "In: {} Hid: {} Out: {}",
            join(&self.input[..self.ninputs]),
            join(&self.act[self.ninputs..hidden_end]),
            join(&self.act[hidden_end..]),
        );
    }
}
