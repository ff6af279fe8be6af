use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};

use crate::Color;

/// Activations published after one network update.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivationFrame {
    pub activations: Vec<f32>,
    pub update_count: u64,
    /// Labels and colours of every neuron, present only when they changed
    /// since the previous frame.
    pub labels: Option<Vec<(String, Color)>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Sent,
    Dropped,
    Disconnected,
}

/// Sending half of a bounded activation channel.
///
/// Publishing never blocks: when the consumer lags behind and the channel is
/// full, the frame is dropped.
#[derive(Debug, Clone)]
pub(crate) struct NeuronMonitor {
    sender: SyncSender<ActivationFrame>,
    pub(crate) enabled: bool,
}

impl NeuronMonitor {
    pub(crate) fn channel(capacity: usize) -> (Self, Receiver<ActivationFrame>) {
        let (sender, receiver) = mpsc::sync_channel(capacity);
        let monitor = Self {
            sender,
            enabled: true,
        };
        (monitor, receiver)
    }

    pub(crate) fn publish(&self, frame: ActivationFrame) -> Delivery {
        match self.sender.try_send(frame) {
            Ok(()) => Delivery::Sent,
            Err(TrySendError::Full(_)) => {
                tracing::trace!("activation monitor lagging, frame dropped");
                Delivery::Dropped
            }
            Err(TrySendError::Disconnected(_)) => Delivery::Disconnected,
        }
    }
}
