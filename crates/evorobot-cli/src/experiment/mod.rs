//! Built-in tasks used to evolve controllers from the command line.
//!
//! Both tasks bind their sensors and motors through the controller iterator
//! protocol, so they work unchanged with procedural networks and with
//! architectures loaded from `.net` files.

use std::path::Path;

use anyhow::Context;
use evorobot_ga::EvogaConfig;
use evorobot_net::{Evonet, EvonetConfig};
use serde::{Deserialize, Serialize};

use crate::util;

pub use self::{tracking::TrackingExperiment, xor::XorExperiment};

mod tracking;
mod xor;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Two-input exclusive or
    #[default]
    Xor,
    /// Follow a moving target on a line
    Tracking,
}

impl TaskKind {
    /// Number of sensor and motor values of the task.
    pub const fn io_sizes(self) -> (usize, usize) {
        match self {
            Self::Xor => (2, 1),
            Self::Tracking => (3, 1),
        }
    }
}

/// Encoding of the genomes of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum GeneKind {
    /// 8-bit genes decoded into the parameter ranges
    #[default]
    Integer,
    /// Real-valued genes used as parameters directly
    Real,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TaskConfig {
    pub kind: TaskKind,
    /// Trials per evaluation of the tracking task.
    pub ntrials: usize,
    /// Steps per tracking trial.
    pub nsteps: usize,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            kind: TaskKind::Xor,
            ntrials: 4,
            nsteps: 100,
        }
    }
}

/// Everything a run needs: the task, the controller and the GA settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RunConfig {
    pub task: TaskConfig,
    pub gene: GeneKind,
    pub net: EvonetConfig,
    pub ga: EvogaConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            task: TaskConfig::default(),
            gene: GeneKind::Integer,
            // XOR is not linearly separable
            net: EvonetConfig {
                n_hiddens: 2,
                ..EvonetConfig::default()
            },
            ga: EvogaConfig::default(),
        }
    }
}

impl RunConfig {
    /// Reads a run file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => util::read_json_file("run configuration", path),
            None => Ok(Self::default()),
        }
    }

    /// A controller configured for the sensors and motors of the task.
    pub fn build_net(&self) -> anyhow::Result<Evonet> {
        let (sensors, motors) = self.task.kind.io_sizes();
        let mut net = Evonet::new();
        net.configure(&self.net, sensors, motors)
            .context("Failed to configure the controller")?;
        Ok(net)
    }
}

/// Runs `$body` with `$experiment` bound to the experiment of the configured task.
macro_rules! with_experiment {
    ($config:expr, $experiment:ident => $body:expr) => {{
        let config: &$crate::experiment::RunConfig = $config;
        let net = config.build_net()?;
        match config.task.kind {
            $crate::experiment::TaskKind::Xor => {
                let $experiment = $crate::experiment::XorExperiment::new(net)?;
                $body
            }
            $crate::experiment::TaskKind::Tracking => {
                let $experiment =
                    $crate::experiment::TrackingExperiment::new(net, &config.task)?;
                $body
            }
        }
    }};
}

pub(crate) use with_experiment;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_run_file_keeps_defaults() {
        let config: RunConfig = serde_json::from_str(
            r#"{"task": {"kind": "tracking"}, "gene": "real", "ga": {"ngenerations": 7}}"#,
        )
        .unwrap();
        assert_eq!(config.task.kind, TaskKind::Tracking);
        assert_eq!(config.task.nsteps, 100);
        assert_eq!(config.gene, GeneKind::Real);
        assert_eq!(config.ga.ngenerations, 7);
        assert_eq!(config.ga.nreproducing, 20);
        assert_eq!(config.net.n_hiddens, 2);
    }

    #[test]
    fn test_build_net_matches_task() {
        let config = RunConfig::default();
        let net = config.build_net().unwrap();
        assert_eq!(net.ninputs(), 2);
        assert_eq!(net.nhiddens(), 2);
        assert_eq!(net.noutputs(), 1);
    }
}
