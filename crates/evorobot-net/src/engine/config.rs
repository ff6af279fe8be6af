use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{DEFAULT_RANGE, NeuronType, ProceduralLayout};

/// Activation type of input and output neurons of a procedural network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IoNeuronType {
    #[default]
    NoDelta,
    WithDelta,
}

impl From<IoNeuronType> for NeuronType {
    fn from(kind: IoNeuronType) -> Self {
        match kind {
            IoNeuronType::NoDelta => Self::Plain,
            IoNeuronType::WithDelta => Self::Delta,
        }
    }
}

/// Activation type of hidden neurons of a procedural network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
pub enum HiddenNeuronType {
    #[default]
    #[serde(rename = "logistic")]
    Logistic,
    #[serde(rename = "logistic+delta")]
    LogisticDelta,
    #[serde(rename = "binary")]
    Binary,
    #[serde(rename = "logistic_0.2")]
    FlattenedLogistic,
}

impl From<HiddenNeuronType> for NeuronType {
    fn from(kind: HiddenNeuronType) -> Self {
        match kind {
            HiddenNeuronType::Logistic => Self::Plain,
            HiddenNeuronType::LogisticDelta => Self::Delta,
            HiddenNeuronType::Binary => Self::Binary,
            HiddenNeuronType::FlattenedLogistic => Self::FlattenedLogistic,
        }
    }
}

/// Settings used by [`Evonet::configure`](crate::Evonet::configure).
///
/// When `net_file` is set the architecture comes from that file and the
/// topology fields are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EvonetConfig {
    pub n_hiddens: usize,
    pub net_file: Option<PathBuf>,
    pub weight_range: f32,
    pub gain_range: f32,
    pub bias_range: f32,
    pub input_neuron_type: IoNeuronType,
    pub hidden_neuron_type: HiddenNeuronType,
    pub output_neuron_type: IoNeuronType,
    pub recurrent_hiddens: bool,
    pub input_output_connections: bool,
    pub recurrent_outputs: bool,
    pub bias_on_hidden_neurons: bool,
    pub bias_on_output_neurons: bool,
}

impl Default for EvonetConfig {
    fn default() -> Self {
        Self {
            n_hiddens: 0,
            net_file: None,
            weight_range: DEFAULT_RANGE,
            gain_range: DEFAULT_RANGE,
            bias_range: DEFAULT_RANGE,
            input_neuron_type: IoNeuronType::NoDelta,
            hidden_neuron_type: HiddenNeuronType::Logistic,
            output_neuron_type: IoNeuronType::NoDelta,
            recurrent_hiddens: false,
            input_output_connections: false,
            recurrent_outputs: false,
            bias_on_hidden_neurons: false,
            bias_on_output_neurons: false,
        }
    }
}

impl EvonetConfig {
    #[must_use]
    pub fn layout(&self) -> ProceduralLayout {
        ProceduralLayout {
            input_type: self.input_neuron_type.into(),
            hidden_type: self.hidden_neuron_type.into(),
            output_type: self.output_neuron_type.into(),
            recurrent_hiddens: self.recurrent_hiddens,
            input_output_connections: self.input_output_connections,
            recurrent_outputs: self.recurrent_outputs,
            bias_on_hidden: self.bias_on_hidden_neurons,
            bias_on_output: self.bias_on_output_neurons,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EvonetConfig = serde_json::from_str(
            r#"{"n_hiddens": 3, "hidden_neuron_type": "logistic+delta", "output_neuron_type": "with_delta"}"#,
        )
        .unwrap();
        assert_eq!(config.n_hiddens, 3);
        assert!(config.net_file.is_none());
        assert!((config.weight_range - DEFAULT_RANGE).abs() < f32::EPSILON);

        let layout = config.layout();
        assert_eq!(layout.input_type, NeuronType::Plain);
        assert_eq!(layout.hidden_type, NeuronType::Delta);
        assert_eq!(layout.output_type, NeuronType::Delta);
    }

    #[test]
    fn test_hidden_type_names() {
        let kind: HiddenNeuronType = serde_json::from_str(r#""logistic_0.2""#).unwrap();
        assert_eq!(NeuronType::from(kind), NeuronType::FlattenedLogistic);
        assert!(serde_json::from_str::<HiddenNeuronType>(r#""tanh""#).is_err());
    }
}
