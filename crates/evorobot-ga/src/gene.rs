use std::fmt;

use evorobot_net::{Evonet, ParameterRanges};

use crate::{GaRng, mutation};

/// Settings of the real-valued gene operators.
///
/// Integer genes ignore them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeneSettings {
    /// Draw initial values from `N(gaussian_mean, gaussian_std_dev)` instead
    /// of uniformly from `[-1, 1)`.
    pub use_gaussian: bool,
    pub gaussian_mean: f64,
    pub gaussian_std_dev: f64,
    /// Deviation of the noise added to offspring genes.
    pub offspring_std_dev: f64,
    /// Scale `offspring_std_dev` by the current mutation rate.
    pub variable_std_dev: bool,
}

impl Default for GeneSettings {
    fn default() -> Self {
        Self {
            use_gaussian: false,
            gaussian_mean: 0.0,
            gaussian_std_dev: 1.0,
            offspring_std_dev: 1.0,
            variable_std_dev: false,
        }
    }
}

/// Encoding of one free parameter of a controller.
pub trait Gene:
    Copy + Default + PartialEq + fmt::Debug + fmt::Display + Send + Sync + 'static
{
    /// A random initial value.
    fn random(rng: &mut GaRng, settings: &GeneSettings) -> Self;

    /// A copy of this gene mutated at `rate`.
    #[must_use]
    fn mutated(self, rate: f64, rng: &mut GaRng, settings: &GeneSettings) -> Self;

    /// The gene that encodes the network parameter `value`.
    fn from_parameter(value: f32, ranges: &ParameterRanges) -> Self;

    /// Writes a whole genome into the free parameters of `net`.
    fn load_into(genes: &[Self], net: &mut Evonet);

    /// Parses the text written by [`fmt::Display`].
    fn parse(text: &str) -> Option<Self>;
}

/// 8-bit genes decoded linearly into the weight range of the network.
impl Gene for u8 {
    fn random(rng: &mut GaRng, _settings: &GeneSettings) -> Self {
        u8::try_from(rng.mrand(256)).unwrap_or(u8::MAX)
    }

    fn mutated(self, rate: f64, rng: &mut GaRng, _settings: &GeneSettings) -> Self {
        mutation::flip_bits(self, rate, rng)
    }

    fn from_parameter(value: f32, ranges: &ParameterRanges) -> Self {
        ranges.encode_gene(value)
    }

    fn load_into(genes: &[Self], net: &mut Evonet) {
        net.set_parameters_from_genes(genes);
    }

    fn parse(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

/// Genes holding the parameter values themselves.
impl Gene for f32 {
    #[expect(clippy::cast_possible_truncation)]
    fn random(rng: &mut GaRng, settings: &GeneSettings) -> Self {
        if settings.use_gaussian {
            rng.normal(settings.gaussian_mean, settings.gaussian_std_dev) as f32
        } else {
            (rng.drand() * 2.0 - 1.0) as f32
        }
    }

    fn mutated(self, rate: f64, rng: &mut GaRng, settings: &GeneSettings) -> Self {
        let std_dev = if settings.variable_std_dev {
            settings.offspring_std_dev * rate
        } else {
            settings.offspring_std_dev
        };
        mutation::gaussian(self, rate, std_dev, rng)
    }

    fn from_parameter(value: f32, _ranges: &ParameterRanges) -> Self {
        value
    }

    fn load_into(genes: &[Self], net: &mut Evonet) {
        net.set_parameters(genes);
    }

    fn parse(text: &str) -> Option<Self> {
        text.trim().parse().ok()
    }
}

#[cfg(test)]
mod tests {
    use evorobot_net::ProceduralLayout;

    use super::*;

    fn net() -> Evonet {
        let mut net = Evonet::new();
        net.build_procedural(2, 0, 1, &ProceduralLayout::default())
            .unwrap();
        net
    }

    mod integer {
        use super::*;

        #[test]
        fn test_load_decodes_genes() {
            let mut net = net();
            u8::load_into(&[0, 255], &mut net);
            assert_eq!(net.free_parameter(0), Some(5.0));
            assert_eq!(net.free_parameter(1), Some(-5.0));
        }

        #[test]
        fn test_parameter_encoding_and_text() {
            let ranges = ParameterRanges::default();
            assert_eq!(u8::from_parameter(5.0, &ranges), 0);
            assert_eq!(u8::from_parameter(-5.0, &ranges), 255);
            assert_eq!(u8::parse(" 17 "), Some(17));
            assert_eq!(u8::parse("300"), None);
            assert_eq!(42_u8.to_string(), "42");
        }

        #[test]
        fn test_mutation_rate_extremes() {
            let mut rng = GaRng::with_seed(4);
            let settings = GeneSettings::default();
            assert_eq!(0x0f_u8.mutated(0.0, &mut rng, &settings), 0x0f);
            assert_eq!(0x0f_u8.mutated(1.0, &mut rng, &settings), 0xf0);
        }
    }

    mod real {
        use super::*;

        #[test]
        fn test_load_copies_values() {
            let mut net = net();
            f32::load_into(&[0.25, -1.5], &mut net);
            assert_eq!(net.free_parameter(0), Some(0.25));
            assert_eq!(net.free_parameter(1), Some(-1.5));
            assert_eq!(f32::parse("-1.5"), Some(-1.5));
        }

        #[test]
        fn test_random_initialisation() {
            let mut rng = GaRng::with_seed(8);
            let uniform = GeneSettings::default();
            for _ in 0..100 {
                let g = f32::random(&mut rng, &uniform);
                assert!((-1.0..1.0).contains(&g));
            }
            let pinned = GeneSettings {
                use_gaussian: true,
                gaussian_mean: 3.0,
                gaussian_std_dev: 0.0,
                ..GeneSettings::default()
            };
            assert_eq!(f32::random(&mut rng, &pinned), 3.0);
        }

        #[test]
        fn test_variable_deviation_vanishes_with_rate() {
            let mut rng = GaRng::with_seed(8);
            let settings = GeneSettings {
                variable_std_dev: true,
                ..GeneSettings::default()
            };
            assert_eq!(0.5_f32.mutated(0.0, &mut rng, &settings), 0.5);
        }
    }
}
