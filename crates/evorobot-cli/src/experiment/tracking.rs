use std::sync::Arc;

use anyhow::Context;
use evorobot_ga::{Experiment, GaRng, Gene, StepControl};
use evorobot_net::{
    Color, ControllerInputIterator, ControllerIterator, ControllerOutputIterator, Evonet,
    IteratorError,
};
use tracing::{debug, error};

use super::TaskConfig;

/// Largest distance the agent moves in one step.
const MAX_SPEED: f64 = 0.05;
const TARGET_SPEED: f64 = 0.01;
/// Offsets beyond this distance saturate the direction sensors.
const SENSOR_RANGE: f64 = 0.25;

/// An agent on the segment `[0, 1]` chasing a target that bounces between
/// its ends.
///
/// The controller senses how far the target is to its left and to its right
/// and its own last velocity, and drives a single motor whose activation is
/// mapped to a velocity in `[-MAX_SPEED, MAX_SPEED]`. Every step scores one
/// minus the distance to the target; the fitness is the average over all
/// steps of all trials. Trial start positions are drawn from the seed of the
/// replication, so every individual of a replication faces the same trials.
#[derive(Debug, Clone)]
pub struct TrackingExperiment {
    net: Evonet,
    sensor: usize,
    motor: usize,
    ntrials: usize,
    nsteps: usize,
    seed: u64,
    control: Option<Arc<StepControl>>,
    fitness: f64,
}

#[derive(Debug, Clone, Copy)]
struct World {
    agent: f64,
    velocity: f64,
    target: f64,
    target_velocity: f64,
}

impl World {
    fn random(rng: &mut GaRng) -> Self {
        let direction = if rng.drand() < 0.5 { -1.0 } else { 1.0 };
        Self {
            agent: rng.drand(),
            velocity: 0.0,
            target: rng.drand(),
            target_velocity: direction * TARGET_SPEED,
        }
    }

    fn sensors(&self) -> [f32; 3] {
        let offset = self.target - self.agent;
        let left = ((-offset).max(0.0) / SENSOR_RANGE).min(1.0);
        let right = (offset.max(0.0) / SENSOR_RANGE).min(1.0);
        let velocity = 0.5 + self.velocity / (2.0 * MAX_SPEED);
        #[expect(clippy::cast_possible_truncation)]
        [left as f32, right as f32, velocity as f32]
    }

    fn step(&mut self, motor: f32) -> f64 {
        self.velocity = (f64::from(motor) - 0.5) * 2.0 * MAX_SPEED;
        self.agent = (self.agent + self.velocity).clamp(0.0, 1.0);

        self.target += self.target_velocity;
        if !(0.0..=1.0).contains(&self.target) {
            self.target = self.target.clamp(0.0, 1.0);
            self.target_velocity = -self.target_velocity;
        }
        1.0 - (self.target - self.agent).abs()
    }
}

impl TrackingExperiment {
    pub fn new(mut net: Evonet, task: &TaskConfig) -> anyhow::Result<Self> {
        let sensor = net
            .register_input(3)
            .context("Failed to bind the tracking sensors")?;
        let motor = net
            .register_output(1)
            .context("Failed to bind the tracking motor")?;

        let mut it = net.iterator();
        it.set_current_block(sensor)?;
        for (i, label) in ["left", "right", "velocity"].into_iter().enumerate() {
            if i > 0 {
                it.next()?;
            }
            it.set_graphic_properties(label, 0.0, 1.0, Color::rgb(0, 0, 255))?;
        }
        it.set_current_block(motor)?;
        it.set_graphic_properties("motor", -1.0, 1.0, Color::rgb(255, 0, 0))?;

        Ok(Self {
            net,
            sensor,
            motor,
            ntrials: task.ntrials.max(1),
            nsteps: task.nsteps.max(1),
            seed: 0,
            control: None,
            fitness: 0.0,
        })
    }

    /// The controller with its sensor and motor labels.
    pub fn into_net(self) -> Evonet {
        self.net
    }

    fn step(&mut self, world: &mut World) -> Result<f64, IteratorError> {
        let mut it = self.net.iterator();
        it.set_current_block(self.sensor)?;
        for (i, value) in world.sensors().into_iter().enumerate() {
            if i > 0 {
                it.next()?;
            }
            it.set_input(value)?;
        }

        self.net.update();

        let mut it = self.net.iterator();
        it.set_current_block(self.motor)?;
        let motor = it.get_output()?;
        Ok(world.step(motor))
    }

    fn trial(&mut self, trial: usize) -> Result<f64, IteratorError> {
        let mut rng = GaRng::with_seed(self.seed.wrapping_add(trial as u64));
        let mut world = World::random(&mut rng);
        self.net.reset();
        let mut score = 0.0;
        for _ in 0..self.nsteps {
            score += self.step(&mut world)?;
        }
        #[expect(clippy::cast_precision_loss)]
        let nsteps = self.nsteps as f64;
        Ok(score / nsteps)
    }

    fn is_stopped(&self) -> bool {
        self.control.as_ref().is_some_and(|c| c.is_stopped())
    }
}

impl<G: Gene> Experiment<G> for TrackingExperiment {
    fn evonet(&self) -> &Evonet {
        &self.net
    }

    fn evonet_mut(&mut self) -> &mut Evonet {
        &mut self.net
    }

    fn do_all_trials_for_individual(&mut self, individual: usize) {
        let mut total = 0.0;
        let mut done = 0_u32;
        for trial in 0..self.ntrials {
            if self.is_stopped() {
                debug!(individual, trial, "trials interrupted");
                break;
            }
            match self.trial(trial) {
                Ok(score) => {
                    total += score;
                    done += 1;
                }
                Err(e) => {
                    error!(individual, trial, error = %e, "cannot run tracking trial");
                    break;
                }
            }
        }
        self.fitness = if done == 0 {
            0.0
        } else {
            total / f64::from(done)
        };
    }

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn new_ga_seed(&mut self, seed: u64) {
        self.seed = seed;
    }

    fn attach_control(&mut self, control: Arc<StepControl>) {
        self.control = Some(control);
    }
}
