use crate::DEFAULT_VALUE;

/// The free parameters of a network together with their two shadow vectors.
///
/// All three vectors always have the same length; it only changes through
/// [`FreeParameters::resize`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FreeParameters {
    values: Vec<f32>,
    overrides: Vec<f32>,
    mutations: Vec<f32>,
}

impl FreeParameters {
    /// Creates `len` parameters set to zero with "don't care" overrides and
    /// mutation rates.
    #[must_use]
    pub fn new(len: usize) -> Self {
        let mut params = Self::default();
        params.resize(len);
        params
    }

    /// Reallocates the bundle for `len` parameters, discarding previous content.
    pub fn resize(&mut self, len: usize) {
        self.values.clear();
        self.values.resize(len, 0.0);
        self.overrides.clear();
        self.overrides.resize(len, DEFAULT_VALUE);
        self.mutations.clear();
        self.mutations.resize(len, DEFAULT_VALUE);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f32] {
        &mut self.values
    }

    /// Values pinned by a parameter file, [`DEFAULT_VALUE`] where unset.
    #[must_use]
    pub fn overrides(&self) -> &[f32] {
        &self.overrides
    }

    /// Per-parameter mutation rates, [`DEFAULT_VALUE`] where unset.
    #[must_use]
    pub fn mutations(&self) -> &[f32] {
        &self.mutations
    }

    /// Stores one line of a parameter file.
    ///
    /// The value is written both as override and as live value.
    pub(crate) fn set_loaded(&mut self, index: usize, value: f32, mutation: f32) {
        if index < self.len() {
            self.values[index] = value;
            self.overrides[index] = value;
            self.mutations[index] = mutation;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_resets_all_vectors() {
        let mut params = FreeParameters::new(2);
        params.set_loaded(0, 1.5, 0.1);
        params.resize(3);
        assert_eq!(params.values(), &[0.0; 3]);
        assert_eq!(params.overrides(), &[DEFAULT_VALUE; 3]);
        assert_eq!(params.mutations(), &[DEFAULT_VALUE; 3]);
    }

    #[test]
    fn test_set_loaded_ignores_out_of_range() {
        let mut params = FreeParameters::new(1);
        params.set_loaded(1, 1.0, 0.0);
        params.set_loaded(0, -2.0, 0.0);
        assert_eq!(params.values(), &[-2.0]);
        assert_eq!(params.overrides(), &[-2.0]);
        assert_eq!(params.mutations(), &[0.0]);
    }
}
