//! Growing per-generation statistics table and its on-disk formats.
//!
//! Every generation a GA run appends one line to `statS<seed>.fit`:
//!
//! ```text
//! <generation> <min> <max> <average>
//! ```
//!
//! Values are written with three decimals. Older runs wrote three-column
//! `<max> <average> <min>` lines; [`StatisticsTable::load`] accepts both so
//! those runs can still be resumed.
//!
//! The same module writes the two other append-only files of a run: the
//! best-fitness summary (`<generation> <best>`) and the retention record (one
//! line of replaced-parent indices per generation, `-1` when the offspring was
//! discarded).

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write as _},
    path::{Path, PathBuf},
};

use crate::fitness::{BestFitness, FitnessStats};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum StatisticsError {
    #[display("cannot access statistics file {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("malformed statistics line {line_number} in {}: {line:?}", path.display())]
    Malformed {
        path: PathBuf,
        line_number: usize,
        line: String,
    },
}

/// Fitness summaries indexed by generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatisticsTable {
    rows: Vec<FitnessStats>,
}

impl StatisticsTable {
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn rows(&self) -> &[FitnessStats] {
        &self.rows
    }

    #[must_use]
    pub fn get(&self, generation: usize) -> Option<&FitnessStats> {
        self.rows.get(generation)
    }

    #[must_use]
    pub fn last(&self) -> Option<&FitnessStats> {
        self.rows.last()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }

    /// Stores the summary of `generation`, growing the table when needed.
    pub fn record(&mut self, generation: usize, stats: FitnessStats) {
        if self.rows.len() <= generation {
            self.rows.resize(generation + 1, FitnessStats::default());
        }
        self.rows[generation] = stats;
    }

    /// Loads a statistics file.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    pub fn load(path: &Path) -> Result<Option<Self>, StatisticsError> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StatisticsError::Io {
                    path: path.to_owned(),
                    source,
                });
            }
        };

        let mut table = Self::default();
        for (i, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let malformed = || StatisticsError::Malformed {
                path: path.to_owned(),
                line_number: i + 1,
                line: line.to_owned(),
            };
            let values = line
                .split_whitespace()
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|_| malformed())?;
            let stats = match values.as_slice() {
                &[_generation, min, max, average] => FitnessStats { max, average, min },
                &[max, average, min] => FitnessStats { max, average, min },
                _ => return Err(malformed()),
            };
            table.rows.push(stats);
        }
        Ok(Some(table))
    }

    /// Appends the row of `generation` to `path`.
    ///
    /// The file is truncated first when `generation` is zero.
    pub fn append_line(&self, path: &Path, generation: usize) -> Result<(), StatisticsError> {
        let Some(stats) = self.get(generation) else {
            return Ok(());
        };
        let line = format!(
            "{generation} {:.3} {:.3} {:.3}",
            stats.min, stats.max, stats.average
        );
        append_to(path, generation == 0, &line)
    }
}

/// Appends `<generation> <best>` to the best-fitness file.
pub fn append_best_fitness(
    path: &Path,
    best: &BestFitness,
    truncate: bool,
) -> Result<(), StatisticsError> {
    let line = format!("{} {:.3}", best.generation, best.value);
    append_to(path, truncate, &line)
}

/// Appends one retention line; `None` entries are written as `-1`.
pub fn append_retention(
    path: &Path,
    replaced: &[Option<usize>],
    truncate: bool,
) -> Result<(), StatisticsError> {
    let line = replaced
        .iter()
        .map(|slot| slot.map_or_else(|| "-1".to_owned(), |s| s.to_string()))
        .collect::<Vec<_>>()
        .join(" ");
    append_to(path, truncate, &line)
}

fn append_to(path: &Path, truncate: bool, line: &str) -> Result<(), StatisticsError> {
    let io_error = |source| StatisticsError::Io {
        path: path.to_owned(),
        source,
    };
    let file = open(path, truncate).map_err(io_error)?;
    let mut writer = BufWriter::new(file);
    writeln!(writer, "{line}").map_err(io_error)?;
    writer.flush().map_err(io_error)?;
    tracing::trace!(path = %path.display(), "appended statistics line");
    Ok(())
}

fn open(path: &Path, truncate: bool) -> io::Result<File> {
    if truncate {
        File::create(path)
    } else {
        OpenOptions::new().create(true).append(true).open(path)
    }
}
