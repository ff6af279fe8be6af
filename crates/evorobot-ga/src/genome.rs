use std::ops::{Index, IndexMut};

use crate::Gene;

/// Fixed-length genomes stored by individual index.
#[derive(Debug, Clone, PartialEq)]
pub struct GenomeStore<G> {
    genome_length: usize,
    genomes: Vec<Vec<G>>,
}

impl<G> Default for GenomeStore<G> {
    fn default() -> Self {
        Self {
            genome_length: 0,
            genomes: Vec::new(),
        }
    }
}

impl<G: Gene> GenomeStore<G> {
    #[must_use]
    pub fn new(genome_length: usize) -> Self {
        Self {
            genome_length,
            genomes: Vec::new(),
        }
    }

    #[must_use]
    pub fn genome_length(&self) -> usize {
        self.genome_length
    }

    /// Changes the genome length, dropping every stored genome.
    pub fn set_genome_length(&mut self, genome_length: usize) {
        self.genome_length = genome_length;
        self.genomes.clear();
    }

    /// Grows or shrinks the store to `len` genomes; new genomes are zeroed.
    pub fn resize(&mut self, len: usize) {
        let genome_length = self.genome_length;
        self.genomes
            .resize_with(len, || vec![G::default(); genome_length]);
    }

    pub fn clear(&mut self) {
        self.genomes.clear();
    }

    /// Appends a zeroed genome and returns its index.
    pub fn add_one(&mut self) -> usize {
        self.genomes.push(vec![G::default(); self.genome_length]);
        self.genomes.len() - 1
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&[G]> {
        self.genomes.get(index).map(Vec::as_slice)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut [G]> {
        self.genomes.get_mut(index).map(Vec::as_mut_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = &[G]> {
        self.genomes.iter().map(Vec::as_slice)
    }

    /// Copies genome `from` over genome `to`, mapping every gene through `f`.
    ///
    /// Returns `false` when either index is out of range.
    pub fn copy_with<F>(&mut self, from: usize, to: usize, mut f: F) -> bool
    where
        F: FnMut(usize, G) -> G,
    {
        if from >= self.genomes.len() || to >= self.genomes.len() {
            return false;
        }
        if from == to {
            for (i, g) in self.genomes[to].iter_mut().enumerate() {
                *g = f(i, *g);
            }
            return true;
        }
        let (source, target) = if from < to {
            let (head, tail) = self.genomes.split_at_mut(to);
            (&head[from], &mut tail[0])
        } else {
            let (head, tail) = self.genomes.split_at_mut(from);
            (&tail[0], &mut head[to])
        };
        for (i, (t, s)) in target.iter_mut().zip(source).enumerate() {
            *t = f(i, *s);
        }
        true
    }
}

impl<G> Index<usize> for GenomeStore<G> {
    type Output = [G];

    fn index(&self, index: usize) -> &Self::Output {
        &self.genomes[index]
    }
}

impl<G> IndexMut<usize> for GenomeStore<G> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.genomes[index]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resize_and_add() {
        let mut store = GenomeStore::<u8>::new(3);
        assert!(store.is_empty());
        store.resize(2);
        store[1][2] = 9;
        assert_eq!(store.len(), 2);
        assert_eq!(store.add_one(), 2);
        assert_eq!(&store[2], &[0, 0, 0]);
        assert_eq!(store.get(1), Some(&[0, 0, 9][..]));
        assert_eq!(store.get(3), None);

        store.resize(1);
        assert_eq!(store.len(), 1);
        store.set_genome_length(5);
        assert!(store.is_empty());
        assert_eq!(store.add_one(), 0);
        assert_eq!(store[0].len(), 5);
    }

    #[test]
    fn test_copy_with_leaves_source_untouched() {
        let mut store = GenomeStore::<u8>::new(2);
        store.resize(3);
        store[2].copy_from_slice(&[1, 2]);

        assert!(store.copy_with(2, 0, |_, g| g + 10));
        assert_eq!(&store[0], &[11, 12]);
        assert_eq!(&store[2], &[1, 2]);

        assert!(store.copy_with(0, 1, |i, g| if i == 0 { g } else { 0 }));
        assert_eq!(&store[1], &[11, 0]);

        assert!(store.copy_with(1, 1, |_, g| g + 1));
        assert_eq!(&store[1], &[12, 1]);
        assert!(!store.copy_with(0, 3, |_, g| g));
    }
}
