//! Per-sample read × allele likelihood matrices.
//!
//! The genotyping engine fills one matrix per sample with log10
//! likelihoods; annotations consume the matrices read-only, either
//! aggregating over reads (depth, mapping-quality statistics) or assigning
//! each read to its best-supported allele.

use std::sync::Arc;

use crate::reads::Read;
use crate::variant::Allele;

/// Read-by-allele likelihoods for a set of samples at one site.
#[derive(Debug, Clone)]
pub struct ReadLikelihoods {
    samples: Vec<Arc<str>>,
    alleles: Vec<Allele>,
    reads_by_sample: Vec<Vec<Arc<Read>>>,
    /// Indexed `[sample][allele][read]`, log10 space.
    values: Vec<Vec<Vec<f64>>>,
}

impl ReadLikelihoods {
    /// Allocate a zeroed matrix for the given samples, alleles and reads.
    pub fn new(
        samples: Vec<Arc<str>>,
        alleles: Vec<Allele>,
        reads_by_sample: Vec<Vec<Arc<Read>>>,
    ) -> Self {
        assert_eq!(samples.len(), reads_by_sample.len());
        let values = reads_by_sample
            .iter()
            .map(|reads| vec![vec![0.0; reads.len()]; alleles.len()])
            .collect();
        Self {
            samples,
            alleles,
            reads_by_sample,
            values,
        }
    }

    /// Number of samples.
    pub fn number_of_samples(&self) -> usize {
        self.samples.len()
    }

    /// Number of alleles.
    pub fn number_of_alleles(&self) -> usize {
        self.alleles.len()
    }

    /// Alleles in matrix order.
    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    /// Sample names in matrix order.
    pub fn samples(&self) -> &[Arc<str>] {
        &self.samples
    }

    /// Index of a sample by name.
    pub fn sample_index(&self, sample: &str) -> Option<usize> {
        self.samples.iter().position(|s| s.as_ref() == sample)
    }

    /// Reads of one sample.
    pub fn sample_reads(&self, sample_index: usize) -> &[Arc<Read>] {
        &self.reads_by_sample[sample_index]
    }

    /// Total reads across samples.
    pub fn read_count(&self) -> usize {
        self.reads_by_sample.iter().map(Vec::len).sum()
    }

    /// Log10 likelihood of one read under one allele.
    pub fn value(&self, sample_index: usize, allele_index: usize, read_index: usize) -> f64 {
        self.values[sample_index][allele_index][read_index]
    }

    /// Set the log10 likelihood of one read under one allele.
    pub fn set_value(
        &mut self,
        sample_index: usize,
        allele_index: usize,
        read_index: usize,
        value: f64,
    ) {
        self.values[sample_index][allele_index][read_index] = value;
    }

    /// Allele best supported by one read; the first allele wins ties.
    pub fn best_allele_for_read(&self, sample_index: usize, read_index: usize) -> Option<usize> {
        let matrix = &self.values[sample_index];
        if matrix.is_empty() || matrix[0].len() <= read_index {
            return None;
        }
        let mut best = 0usize;
        let mut best_value = matrix[0][read_index];
        for (allele_index, row) in matrix.iter().enumerate().skip(1) {
            if row[read_index] > best_value {
                best_value = row[read_index];
                best = allele_index;
            }
        }
        Some(best)
    }

    /// Per-allele read counts for one sample, assigning each read to its
    /// best allele.
    pub fn allele_depths_for_sample(&self, sample_index: usize) -> Vec<u32> {
        let mut depths = vec![0u32; self.alleles.len()];
        for read_index in 0..self.reads_by_sample[sample_index].len() {
            if let Some(best) = self.best_allele_for_read(sample_index, read_index) {
                depths[best] += 1;
            }
        }
        depths
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::{CigarOp, CigarOpKind, ReadFlags};

    fn read(name: &str) -> Arc<Read> {
        Arc::new(Read::new(
            name,
            "s1",
            "chr1",
            100,
            60,
            vec![CigarOp::new(CigarOpKind::Match, 4)],
            b"ACGT".to_vec(),
            vec![30; 4],
            ReadFlags::default(),
        ))
    }

    fn two_read_matrix() -> ReadLikelihoods {
        ReadLikelihoods::new(
            vec![Arc::from("s1")],
            vec![Allele::reference(b"A"), Allele::alternate(b"T")],
            vec![vec![read("r1"), read("r2")]],
        )
    }

    #[test]
    fn best_allele_follows_likelihoods() {
        let mut likelihoods = two_read_matrix();
        likelihoods.set_value(0, 0, 0, -1.0);
        likelihoods.set_value(0, 1, 0, -4.0);
        likelihoods.set_value(0, 0, 1, -5.0);
        likelihoods.set_value(0, 1, 1, -0.5);
        assert_eq!(likelihoods.best_allele_for_read(0, 0), Some(0));
        assert_eq!(likelihoods.best_allele_for_read(0, 1), Some(1));
        assert_eq!(likelihoods.allele_depths_for_sample(0), vec![1, 1]);
    }

    #[test]
    fn read_count_sums_samples() {
        let likelihoods = ReadLikelihoods::new(
            vec![Arc::from("s1"), Arc::from("s2")],
            vec![Allele::reference(b"A")],
            vec![vec![read("r1")], vec![read("r2"), read("r3")]],
        );
        assert_eq!(likelihoods.read_count(), 3);
        assert_eq!(likelihoods.sample_index("s2"), Some(1));
    }
}
