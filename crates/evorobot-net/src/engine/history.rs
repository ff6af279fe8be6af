use std::collections::VecDeque;

use crate::MAX_STORED_ACTIVATIONS;

/// Bounded queue of past activation vectors, oldest first.
///
/// Once [`MAX_STORED_ACTIVATIONS`] vectors are stored, pushing a new one
/// evicts the oldest.
#[derive(Debug, Clone, Default)]
pub struct ActivationHistory {
    frames: VecDeque<Vec<f32>>,
}

impl ActivationHistory {
    pub fn push(&mut self, activations: &[f32]) {
        let frame = if self.frames.len() == MAX_STORED_ACTIVATIONS {
            // reuse the evicted buffer
            let mut oldest = self.frames.pop_front().unwrap_or_default();
            oldest.clear();
            oldest.extend_from_slice(activations);
            oldest
        } else {
            activations.to_vec()
        };
        self.frames.push_back(frame);
    }

    /// Removes and returns the oldest stored vector.
    pub fn pop_oldest(&mut self) -> Option<Vec<f32>> {
        self.frames.pop_front()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[expect(clippy::cast_precision_loss)]
    fn test_oldest_is_evicted() {
        let mut history = ActivationHistory::default();
        for i in 0..MAX_STORED_ACTIVATIONS + 5 {
            history.push(&[i as f32]);
        }
        assert_eq!(history.len(), MAX_STORED_ACTIVATIONS);
        assert_eq!(history.pop_oldest(), Some(vec![5.0]));
        assert_eq!(history.len(), MAX_STORED_ACTIVATIONS - 1);
    }

    #[test]
    fn test_pop_empty() {
        let mut history = ActivationHistory::default();
        assert!(history.pop_oldest().is_none());
        history.push(&[1.0, 2.0]);
        assert_eq!(history.pop_oldest(), Some(vec![1.0, 2.0]));
        assert!(history.is_empty());
    }
}
