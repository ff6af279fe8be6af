//! Fitness statistics for the Evorobot genetic algorithms.
//!
//! This crate provides the bookkeeping a GA run keeps about its population:
//!
//! - **Per-generation summaries**: maximum, average and minimum fitness
//! - **Best-ever tracking**: the highest fitness seen so far and its generation
//! - **Statistics table**: the growing per-generation table, with the
//!   line-oriented `statS<seed>.fit` file format used to plot runs and to
//!   resume interrupted ones
//! - **Retention records**: which parent slot each offspring replaced
//!
//! # Modules
//!
//! - [`fitness`]: [`FitnessStats`](fitness::FitnessStats) and
//!   [`BestFitness`](fitness::BestFitness)
//! - [`table`]: [`StatisticsTable`](table::StatisticsTable) and the file helpers
//!
//! # Examples
//!
//! ```
//! use evorobot_stats::{fitness::FitnessStats, table::StatisticsTable};
//!
//! let stats = FitnessStats::seeded([1.0, 4.0, 2.5]).unwrap();
//! assert_eq!(stats.max, 4.0);
//! assert_eq!(stats.min, 1.0);
//!
//! let mut table = StatisticsTable::default();
//! table.record(0, stats);
//! assert_eq!(table.len(), 1);
//! ```

pub mod fitness;
pub mod table;
