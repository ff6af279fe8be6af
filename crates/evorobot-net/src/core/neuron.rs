/// Maximum length of a neuron label.
pub const MAX_LABEL_LEN: usize = 9;

/// Activation function of a neuron.
///
/// The numeric values are those stored in `.net` files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NeuronType {
    /// Logistic for internal neurons, plain passthrough for input neurons.
    #[default]
    Plain,
    /// Leaky integrator: blends the previous activation with the new one using
    /// a time constant taken from the free parameters.
    Delta,
    /// Hard threshold at zero net input.
    Binary,
    /// Logistic of a fifth of the net input.
    FlattenedLogistic,
}

impl NeuronType {
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Plain => 0,
            Self::Delta => 1,
            Self::Binary => 2,
            Self::FlattenedLogistic => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Plain),
            1 => Some(Self::Delta),
            2 => Some(Self::Binary),
            3 => Some(Self::FlattenedLogistic),
            _ => None,
        }
    }

    /// Whether the neuron consumes a time-constant parameter.
    #[must_use]
    pub const fn has_time_constant(self) -> bool {
        matches!(self, Self::Delta)
    }
}

/// Display colour of a neuron.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const GREY: Self = Self::rgb(125, 125, 125);

    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

/// Structural flags and presentation metadata of one neuron.
#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    pub kind: NeuronType,
    /// The neuron has a bias parameter.
    pub bias: bool,
    /// The neuron has a gain parameter.
    pub gain: bool,
    /// Position used when the network is drawn.
    pub position: (i32, i32),
    pub display: bool,
    pub(crate) label: String,
    /// Expected activation range, used by monitors.
    pub range: (f32, f32),
    pub color: Color,
    /// Activation forced after every update, if set.
    pub lesion: Option<f32>,
}

impl Default for Neuron {
    fn default() -> Self {
        Self {
            kind: NeuronType::Plain,
            bias: false,
            gain: false,
            position: (0, 0),
            display: true,
            label: String::new(),
            range: (0.0, 1.0),
            color: Color::BLACK,
            lesion: None,
        }
    }
}

impl Neuron {
    #[must_use]
    pub fn new(kind: NeuronType, bias: bool) -> Self {
        Self {
            kind,
            bias,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Sets the label, keeping at most [`MAX_LABEL_LEN`] characters.
    pub fn set_label(&mut self, label: &str) {
        self.label = label.chars().take(MAX_LABEL_LEN).collect();
    }

    /// Whether the structural part (what `.net` files store) matches `other`.
    #[must_use]
    pub fn same_structure(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.bias == other.bias
            && self.gain == other.gain
            && self.position == other.position
            && self.display == other.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_is_truncated() {
        let mut neuron = Neuron::default();
        neuron.set_label("proximity-left");
        assert_eq!(neuron.label(), "proximity");
    }

    #[test]
    fn test_type_codes() {
        for code in 0..4 {
            assert_eq!(NeuronType::from_code(code).unwrap().code(), code);
        }
        assert!(NeuronType::from_code(4).is_none());
        assert!(NeuronType::Delta.has_time_constant());
        assert!(!NeuronType::Binary.has_time_constant());
    }
}
