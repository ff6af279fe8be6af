//! Evonet: a block-structured neural network driven by genomes.
//!
//! A network is a flat array of neurons split into three contiguous layers
//! (inputs, hiddens, outputs) and an ordered list of [`Block`]s that forms its
//! execution schedule. Every mutable magnitude of the network (gains, biases,
//! connection weights and time constants) lives in one flat vector of free
//! parameters, in the order reported by [`Evonet::compute_parameters`].
//!
//! - [`core`] holds the plain data types: blocks, neurons and the
//!   [`FreeParameters`] bundle.
//! - [`engine`] holds the [`Evonet`] itself, its configuration, the `.net` /
//!   `.phe` file codec, the activation history and the controller iterator
//!   protocol used by sensors and motors.
//!
//! # Example
//!
//! ```
//! use evorobot_net::{Evonet, ProceduralLayout};
//!
//! let mut net = Evonet::new();
//! net.build_procedural(2, 0, 1, &ProceduralLayout::default()).unwrap();
//! assert_eq!(net.free_parameters(), 2);
//!
//! net.set_parameters(&[0.5, 0.0]);
//! net.set_input(0, 1.0).unwrap();
//! net.update();
//! assert!((net.output(0) - 0.622_459_3).abs() < 1e-6);
//! ```

use std::{io, path::PathBuf};

pub use self::{core::*, engine::*};

pub mod core;
pub mod engine;

/// Maximum number of neurons of a network.
pub const MAXN: usize = 1000;
/// Capacity of the activation history.
pub const MAX_STORED_ACTIVATIONS: usize = 100;
/// "Don't care" marker for parameter overrides and mutation rates.
pub const DEFAULT_VALUE: f32 = -99.0;
/// Largest value of an integer gene.
pub const GENE_MAX_VALUE: u8 = 255;
/// Default range of weights, gains and biases.
pub const DEFAULT_RANGE: f32 = 5.0;

/// Returned by [`Evonet::output`] and [`Evonet::input`] for a bad index.
pub const IO_SENTINEL: f32 = -1.0;
/// Returned by [`Evonet::hidden`] for a bad index.
pub const HIDDEN_SENTINEL: f32 = -999.0;

/// Whether `value` is the [`DEFAULT_VALUE`] marker.
#[expect(clippy::float_cmp)]
#[must_use]
pub fn is_default(value: f32) -> bool {
    value == DEFAULT_VALUE
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("index {index} out of range 0..{len}")]
pub struct IndexOutOfRange {
    pub index: usize,
    pub len: usize,
}

/// Failure reading or writing a `.net` / `.phe` file.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ArchitectureError {
    #[display("cannot access network file {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("{}:{line_number}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        line_number: usize,
        message: String,
    },
    #[display("too many neurons: {count} (at most {} are supported)", MAXN)]
    TooManyNeurons { count: usize },
    #[display("{ninputs} inputs and {noutputs} outputs do not fit {nneurons} neurons")]
    InvalidLayers {
        nneurons: usize,
        ninputs: usize,
        noutputs: usize,
    },
    #[display("block {index} ({block}) references neurons beyond {nneurons}")]
    BlockOutOfRange {
        index: usize,
        block: Block,
        nneurons: usize,
    },
    #[display(
        "{} contains {found} free parameters, the architecture requires {expected}",
        path.display()
    )]
    ParameterCountMismatch {
        path: PathBuf,
        expected: usize,
        found: usize,
    },
}

/// Failure configuring a network for an experiment.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ConfigureError {
    #[display("invalid network file")]
    Architecture(ArchitectureError),
    #[display("could not open the network file {}", path.display())]
    MissingNetFile { path: PathBuf },
    #[display("the network file has the wrong number of inputs (expected {expected}, got {found})")]
    InputMismatch { expected: usize, found: usize },
    #[display("the network file has the wrong number of outputs (expected {expected}, got {found})")]
    OutputMismatch { expected: usize, found: usize },
}

impl From<ArchitectureError> for ConfigureError {
    fn from(e: ArchitectureError) -> Self {
        Self::Architecture(e)
    }
}

/// Misuse of the controller iterator protocol.
#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum IteratorError {
    #[display("the block index {index} does not exist")]
    UnknownBlock { index: usize },
    #[display("set_current_block must be called first")]
    NoCurrentBlock,
    #[display("attempt to access beyond the size of the current block")]
    OutOfBlock,
    #[display("block {start}..{end} does not fit the {layer} layer of {size} neurons")]
    LayerOverflow {
        layer: Layer,
        start: usize,
        end: usize,
        size: usize,
    },
    #[display("block {start}..{end} overlaps or precedes the {layer} block ending at {previous_end}")]
    Unordered {
        layer: Layer,
        start: usize,
        end: usize,
        previous_end: usize,
    },
    #[display("cannot write inputs")]
    Input(IndexOutOfRange),
}

impl From<IndexOutOfRange> for IteratorError {
    fn from(e: IndexOutOfRange) -> Self {
        Self::Input(e)
    }
}
