use std::{fmt, ops::Range};

/// A contiguous range of neurons, given by its first index and its length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct NeuronRange {
    pub start: usize,
    pub count: usize,
}

impl NeuronRange {
    #[must_use]
    pub const fn new(start: usize, count: usize) -> Self {
        Self { start, count }
    }

    /// One past the last neuron of the range.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.start + self.count
    }

    #[must_use]
    pub const fn indices(&self) -> Range<usize> {
        self.start..self.end()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// One step of the network's execution schedule.
///
/// Blocks run strictly in the order they are stored. A connection block may
/// therefore read activations of neurons whose update block comes later, which
/// is how recurrent and same-step connections are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::IsVariant)]
pub enum Block {
    /// Adds `act[s] * gain[s] * w` to the net input of every destination
    /// neuron, for every source neuron, consuming one weight per pair.
    Connection {
        dest: NeuronRange,
        src: NeuronRange,
        flag: i32,
    },
    /// Computes the activation of the destination neurons.
    Update { dest: NeuronRange, flag: i32 },
    /// Copies the gain of the first destination neuron to the whole range.
    Gain { dest: NeuronRange, flag: i32 },
    /// Sets the gain of the destination neurons to the activation of the
    /// first source neuron.
    ModulatedGain {
        dest: NeuronRange,
        src: NeuronRange,
        flag: i32,
    },
}

impl Block {
    pub(crate) const CONNECTION: i32 = 0;
    pub(crate) const UPDATE: i32 = 1;
    pub(crate) const GAIN: i32 = 2;
    pub(crate) const MODULATED_GAIN: i32 = 3;

    #[must_use]
    pub const fn connection(dest: NeuronRange, src: NeuronRange) -> Self {
        Self::Connection { dest, src, flag: 0 }
    }

    #[must_use]
    pub const fn update(dest: NeuronRange) -> Self {
        Self::Update { dest, flag: 0 }
    }

    #[must_use]
    pub const fn dest(&self) -> NeuronRange {
        match *self {
            Self::Connection { dest, .. }
            | Self::Update { dest, .. }
            | Self::Gain { dest, .. }
            | Self::ModulatedGain { dest, .. } => dest,
        }
    }

    /// Source range; empty for blocks that have none.
    #[must_use]
    pub const fn src(&self) -> NeuronRange {
        match *self {
            Self::Connection { src, .. } | Self::ModulatedGain { src, .. } => src,
            Self::Update { .. } | Self::Gain { .. } => NeuronRange::new(0, 0),
        }
    }

    #[must_use]
    pub const fn flag(&self) -> i32 {
        match *self {
            Self::Connection { flag, .. }
            | Self::Update { flag, .. }
            | Self::Gain { flag, .. }
            | Self::ModulatedGain { flag, .. } => flag,
        }
    }

    /// Number of free parameters the connection weights of this block use.
    #[must_use]
    pub const fn weight_count(&self) -> usize {
        match *self {
            Self::Connection { dest, src, .. } => dest.count * src.count,
            _ => 0,
        }
    }

    /// Numeric tag used by the `.net` file format.
    #[must_use]
    pub const fn type_code(&self) -> i32 {
        match self {
            Self::Connection { .. } => Self::CONNECTION,
            Self::Update { .. } => Self::UPDATE,
            Self::Gain { .. } => Self::GAIN,
            Self::ModulatedGain { .. } => Self::MODULATED_GAIN,
        }
    }

    /// Rebuilds a block from the six integers of its `.net` line.
    ///
    /// Returns `None` for an unknown type tag or negative ranges.
    #[must_use]
    pub fn from_row(row: [i32; 6]) -> Option<Self> {
        let [kind, dest_start, dest_count, src_start, src_count, flag] = row;
        let range = |start: i32, count: i32| {
            Some(NeuronRange::new(
                usize::try_from(start).ok()?,
                usize::try_from(count).ok()?,
            ))
        };
        let dest = range(dest_start, dest_count)?;
        let block = match kind {
            Self::CONNECTION => Self::Connection {
                dest,
                src: range(src_start, src_count)?,
                flag,
            },
            Self::UPDATE => Self::Update { dest, flag },
            Self::GAIN => Self::Gain { dest, flag },
            Self::MODULATED_GAIN => Self::ModulatedGain {
                dest,
                src: range(src_start, src_count)?,
                flag,
            },
            _ => return None,
        };
        Some(block)
    }

    /// The six integers of this block's `.net` line.
    #[expect(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn to_row(&self) -> [i64; 6] {
        let dest = self.dest();
        let src = self.src();
        [
            i64::from(self.type_code()),
            dest.start as i64,
            dest.count as i64,
            src.start as i64,
            src.count as i64,
            i64::from(self.flag()),
        ]
    }

    /// Trailing comment written after the block in `.net` files.
    #[must_use]
    pub const fn comment(&self) -> &'static str {
        match self {
            Self::Connection { .. } => "connections block",
            Self::Update { .. } => "block to be updated",
            Self::Gain { .. } => "gain block",
            Self::ModulatedGain { .. } => "modulated gain block",
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [kind, dest_start, dest_count, src_start, src_count, flag] = self.to_row();
        write!(
            f,
            "{kind} | {dest_start} - {dest_count} -> {src_start} - {src_count} | {flag}"
        )
    }
}
