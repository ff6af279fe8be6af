//! Genome and team files.
//!
//! A genome file is a sequence of records:
//!
//! ```text
//! **NET : 3_0_0.wts
//! DYNAMICAL NN
//! 17
//! 240
//! END
//! ```
//!
//! with one gene per line. Team files list, for each team, the indices of
//! the genomes it is composed of:
//!
//! ```text
//! **TEAM : 3_0_0.wts
//! 4 9
//! END
//! ```

use std::{
    fs::{self, File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use crate::Gene;

const NET_HEADER: &str = "**NET :";
const TEAM_HEADER: &str = "**TEAM :";
const GENOTYPE_HEADER: &str = "DYNAMICAL NN";
const END: &str = "END";

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum GenomeFileError {
    #[display("cannot access genome file {}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("{}:{line_number}: {message}", path.display())]
    Malformed {
        path: PathBuf,
        line_number: usize,
        message: String,
    },
}

/// One `**NET` record.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomeRecord<G> {
    pub name: String,
    pub genes: Vec<G>,
}

/// One `**TEAM` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamRecord {
    pub name: String,
    pub modules: Vec<usize>,
}

/// Names of the files written by a run.
pub mod file_name {
    #[must_use]
    pub fn statistics(seed: u64) -> String {
        format!("statS{seed}.fit")
    }

    /// Best individual of every generation.
    #[must_use]
    pub fn bests(seed: u64) -> String {
        format!("B0S{seed}.gen")
    }

    /// The `rank`-th best individual of every generation, starting at 1.
    #[must_use]
    pub fn ranked_bests(rank: usize, seed: u64) -> String {
        format!("B{rank}S{seed}.gen")
    }

    #[must_use]
    pub fn generation(generation: usize, seed: u64) -> String {
        format!("G{generation}S{seed}.gen")
    }

    #[must_use]
    pub fn composed_generation(generation: usize, seed: u64) -> String {
        format!("G{generation}S{seed}.composed.gen")
    }

    #[must_use]
    pub fn best_team(seed: u64, generation: usize) -> String {
        format!("B0S{seed}.G{generation}.gen")
    }

    #[must_use]
    pub fn retention(seed: u64) -> String {
        format!("statS{seed}.ret")
    }

    #[must_use]
    pub fn best_fitness(seed: u64) -> String {
        format!("bestgenS{seed}.fit")
    }
}

/// Writes one genome record.
pub fn write_genome<W, G>(writer: &mut W, name: &str, genes: &[G]) -> io::Result<()>
where
    W: Write + ?Sized,
    G: Gene,
{
    writeln!(writer, "{NET_HEADER} {name}")?;
    writeln!(writer, "{GENOTYPE_HEADER}")?;
    for gene in genes {
        writeln!(writer, "{gene}")?;
    }
    writeln!(writer, "{END}")
}

/// Writes one team record.
pub fn write_team<W>(writer: &mut W, name: &str, modules: &[usize]) -> io::Result<()>
where
    W: Write + ?Sized,
{
    writeln!(writer, "{TEAM_HEADER} {name}")?;
    let modules = modules
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    writeln!(writer, "{modules}")?;
    writeln!(writer, "{END}")
}

/// Opens `path` for writing, truncating it or appending to it.
pub fn open_writer(path: &Path, truncate: bool) -> Result<BufWriter<File>, GenomeFileError> {
    let file = if truncate {
        File::create(path)
    } else {
        OpenOptions::new().create(true).append(true).open(path)
    };
    file.map(BufWriter::new).map_err(|source| GenomeFileError::Io {
        path: path.to_owned(),
        source,
    })
}

fn read(path: &Path) -> Result<String, GenomeFileError> {
    fs::read_to_string(path).map_err(|source| GenomeFileError::Io {
        path: path.to_owned(),
        source,
    })
}

/// Reads every `**NET` record of a genome file.
pub fn read_genomes<G: Gene>(path: &Path) -> Result<Vec<GenomeRecord<G>>, GenomeFileError> {
    let content = read(path)?;
    let malformed = |line_number: usize, message: String| GenomeFileError::Malformed {
        path: path.to_owned(),
        line_number,
        message,
    };

    let mut records = vec![];
    let mut lines = content.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));
    while let Some((number, line)) = lines.next() {
        let Some(name) = line.strip_prefix(NET_HEADER) else {
            continue;
        };
        match lines.next() {
            Some((_, GENOTYPE_HEADER)) => {}
            _ => return Err(malformed(number + 1, format!("expected {GENOTYPE_HEADER:?}"))),
        }
        let mut genes = vec![];
        loop {
            match lines.next() {
                Some((_, END)) => break,
                Some((n, text)) => {
                    let gene =
                        G::parse(text).ok_or_else(|| malformed(n, format!("invalid gene {text:?}")))?;
                    genes.push(gene);
                }
                None => return Err(malformed(number, "record without END".to_owned())),
            }
        }
        records.push(GenomeRecord {
            name: name.trim().to_owned(),
            genes,
        });
    }
    Ok(records)
}

/// Reads every `**TEAM` record of a team file.
pub fn read_teams(path: &Path) -> Result<Vec<TeamRecord>, GenomeFileError> {
    let content = read(path)?;
    let malformed = |line_number: usize, message: String| GenomeFileError::Malformed {
        path: path.to_owned(),
        line_number,
        message,
    };

    let mut records = vec![];
    let mut lines = content.lines().enumerate().map(|(i, l)| (i + 1, l.trim()));
    while let Some((number, line)) = lines.next() {
        let Some(name) = line.strip_prefix(TEAM_HEADER) else {
            continue;
        };
        let (n, text) = lines
            .next()
            .ok_or_else(|| malformed(number, "team without modules".to_owned()))?;
        let modules = text
            .split_whitespace()
            .map(str::parse)
            .collect::<Result<Vec<usize>, _>>()
            .map_err(|e| malformed(n, format!("invalid module index: {e}")))?;
        match lines.next() {
            Some((_, END)) => {}
            _ => return Err(malformed(n + 1, format!("expected {END:?}"))),
        }
        records.push(TeamRecord {
            name: name.trim().to_owned(),
            modules,
        });
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    mod genomes {
        use super::*;

        #[test]
        fn test_write_then_read() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(file_name::generation(3, 12));
            let mut writer = open_writer(&path, true).unwrap();
            write_genome(&mut writer, "3_0_0.wts", &[17_u8, 240]).unwrap();
            write_genome(&mut writer, "3_0_1.wts", &[0_u8, 255]).unwrap();
            writer.flush().unwrap();
            drop(writer);

            assert_eq!(
                fs::read_to_string(&path).unwrap(),
                "**NET : 3_0_0.wts\nDYNAMICAL NN\n17\n240\nEND\n\
                 **NET : 3_0_1.wts\nDYNAMICAL NN\n0\n255\nEND\n"
            );
            let records = read_genomes::<u8>(&path).unwrap();
            assert_eq!(records.len(), 2);
            assert_eq!(records[0].name, "3_0_0.wts");
            assert_eq!(records[1].genes, vec![0, 255]);
        }

        #[test]
        fn test_append_keeps_previous_records() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join(file_name::bests(1));
            for (i, truncate) in [true, false].into_iter().enumerate() {
                let mut writer = open_writer(&path, truncate).unwrap();
                write_genome(&mut writer, &format!("s{i}_0.wts"), &[0.5_f32]).unwrap();
                writer.flush().unwrap();
            }
            let records = read_genomes::<f32>(&path).unwrap();
            assert_eq!(records.len(), 2);
            assert_eq!(records[1].genes, vec![0.5]);
        }

        #[test]
        fn test_malformed_records() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("bad.gen");

            fs::write(&path, "**NET : a\n12\nEND\n").unwrap();
            assert!(matches!(
                read_genomes::<u8>(&path),
                Err(GenomeFileError::Malformed { line_number: 2, .. })
            ));

            fs::write(&path, "**NET : a\nDYNAMICAL NN\n12\nabc\nEND\n").unwrap();
            assert!(matches!(
                read_genomes::<u8>(&path),
                Err(GenomeFileError::Malformed { line_number: 4, .. })
            ));

            fs::write(&path, "**NET : a\nDYNAMICAL NN\n12\n").unwrap();
            assert!(matches!(
                read_genomes::<u8>(&path),
                Err(GenomeFileError::Malformed { line_number: 1, .. })
            ));

            assert!(matches!(
                read_genomes::<u8>(&dir.path().join("missing.gen")),
                Err(GenomeFileError::Io { .. })
            ));
        }
    }

    #[test]
    fn test_team_records() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name::composed_generation(0, 5));
        let mut writer = open_writer(&path, true).unwrap();
        write_team(&mut writer, "0_0_0.wts", &[4, 9]).unwrap();
        write_team(&mut writer, "0_0_1.wts", &[1, 2]).unwrap();
        writer.flush().unwrap();
        drop(writer);

        let teams = read_teams(&path).unwrap();
        assert_eq!(
            teams,
            vec![
                TeamRecord {
                    name: "0_0_0.wts".to_owned(),
                    modules: vec![4, 9]
                },
                TeamRecord {
                    name: "0_0_1.wts".to_owned(),
                    modules: vec![1, 2]
                },
            ]
        );
    }

    #[test]
    fn test_file_names() {
        assert_eq!(file_name::statistics(7), "statS7.fit");
        assert_eq!(file_name::ranked_bests(2, 7), "B2S7.gen");
        assert_eq!(file_name::best_team(7, 3), "B0S7.G3.gen");
        assert_eq!(file_name::retention(7), "statS7.ret");
        assert_eq!(file_name::best_fitness(7), "bestgenS7.fit");
    }
}
