/// Lower bound used to seed the maximum in [`FitnessStats::bounded`].
pub const BOUNDED_MAX_SEED: f64 = -9999.0;
/// Upper bound used to seed the minimum in [`FitnessStats::bounded`].
pub const BOUNDED_MIN_SEED: f64 = 9999.0;

/// Summary of the fitness of one generation.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FitnessStats {
    /// Highest fitness in the population.
    pub max: f64,
    /// Mean fitness of the population.
    pub average: f64,
    /// Lowest fitness in the population.
    pub min: f64,
}

impl FitnessStats {
    /// Summarises raw fitness values, seeding minimum and maximum with the first value.
    ///
    /// Returns `None` for an empty population.
    ///
    /// # Examples
    ///
    /// ```
    /// # use evorobot_stats::fitness::FitnessStats;
    /// let stats = FitnessStats::seeded([3.0, 1.0, 2.0]).unwrap();
    /// assert_eq!(stats.average, 2.0);
    /// assert!(FitnessStats::seeded([]).is_none());
    /// ```
    #[must_use]
    pub fn seeded<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter();
        let first = values.next()?;
        let mut stats = Self {
            max: first,
            average: 0.0,
            min: first,
        };
        Some(stats.accumulate(std::iter::once(first).chain(values)))
    }

    /// Summarises signed fitness values with fixed seeds.
    ///
    /// The minimum starts at [`BOUNDED_MIN_SEED`] and the maximum at
    /// [`BOUNDED_MAX_SEED`], so values outside `[-9999, 9999]` saturate.
    /// Returns `None` for an empty population.
    ///
    /// # Examples
    ///
    /// ```
    /// # use evorobot_stats::fitness::FitnessStats;
    /// let stats = FitnessStats::bounded([-2.0, 0.5]).unwrap();
    /// assert_eq!(stats.min, -2.0);
    /// assert_eq!(stats.max, 0.5);
    /// ```
    #[must_use]
    pub fn bounded<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().peekable();
        values.peek()?;
        let mut stats = Self {
            max: BOUNDED_MAX_SEED,
            average: 0.0,
            min: BOUNDED_MIN_SEED,
        };
        Some(stats.accumulate(values))
    }

    #[expect(clippy::cast_precision_loss)]
    fn accumulate<I>(&mut self, values: I) -> Self
    where
        I: Iterator<Item = f64>,
    {
        let mut sum = 0.0;
        let mut count = 0_usize;
        for value in values {
            if value < self.min {
                self.min = value;
            }
            if value > self.max {
                self.max = value;
            }
            sum += value;
            count += 1;
        }
        self.average = sum / count as f64;
        *self
    }
}

/// Best fitness observed during a replication.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestFitness {
    /// The fitness value.
    pub value: f64,
    /// Generation in which it was reached.
    pub generation: usize,
}

impl BestFitness {
    /// Value the best fitness is reset to at the start of a replication.
    pub const RESET_VALUE: f64 = -99999.0;

    #[must_use]
    pub fn new() -> Self {
        Self {
            value: Self::RESET_VALUE,
            generation: 0,
        }
    }

    /// Records `max` if it improves on the best seen so far.
    ///
    /// Returns `true` when the record changed.
    pub fn update(&mut self, max: f64, generation: usize) -> bool {
        if max > self.value {
            self.value = max;
            self.generation = generation;
            true
        } else {
            false
        }
    }
}

impl Default for BestFitness {
    fn default() -> Self {
        Self::new()
    }
}
