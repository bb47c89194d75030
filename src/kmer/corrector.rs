//! K-mer-based read error correction for an assembly region.
//!
//! All k-mers of the region's reads are counted first. K-mers observed often
//! enough are "solid" and act as correction targets; rarely observed k-mers
//! are mapped to their nearest solid neighbor within a Hamming-distance
//! bound. A read base is rewritten only when every overlapping k-mer window
//! proposes the same replacement.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::config::ErrorCorrectionConfig;
use crate::qual::is_regular_base;
use crate::reads::{hard_clip_low_qual_ends, Read};

use super::{Kmer, KmerCounter};

/// Longest reference homopolymer run tolerated before correction is
/// disabled for the region.
const MAX_HOMOPOLYMER_THRESHOLD: usize = 12;

/// Errors raised at corrector construction.
#[derive(Debug, Error)]
pub enum CorrectionError {
    /// A configuration value is out of range.
    #[error("invalid error-correction configuration: {0}")]
    Config(String),
}

/// Diagnostic counters accumulated while correcting a region.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorCorrectionStats {
    /// Reads with at least one rewritten base.
    pub reads_corrected: u64,
    /// Reads returned unchanged.
    pub reads_uncorrected: u64,
    /// Bases rewritten.
    pub bases_corrected: u64,
    /// K-mers mapping to themselves.
    pub solid_kmers: u64,
    /// Correctable k-mers with a solid neighbor in range.
    pub corrected_kmers: u64,
    /// Correctable k-mers with no solid neighbor in range.
    pub uncorrectable_kmers: u64,
}

/// Per-region read error corrector.
pub struct ReadErrorCorrector {
    counts_by_kmer: KmerCounter,
    kmer_correction_map: HashMap<Kmer, Vec<(usize, u8)>>,
    config: ErrorCorrectionConfig,
    max_homopolymer_length: usize,
    stats: ErrorCorrectionStats,
}

impl ReadErrorCorrector {
    /// Build a corrector for a region whose padded reference is
    /// `reference_with_padding`.
    pub fn new(
        config: ErrorCorrectionConfig,
        reference_with_padding: &[u8],
    ) -> Result<Self, CorrectionError> {
        config
            .validate()
            .map_err(|e| CorrectionError::Config(e.to_string()))?;
        let max_homopolymer_length = compute_max_homopolymer_run(reference_with_padding);
        Ok(Self {
            counts_by_kmer: KmerCounter::new(config.kmer_length),
            kmer_correction_map: HashMap::new(),
            config,
            max_homopolymer_length,
            stats: ErrorCorrectionStats::default(),
        })
    }

    fn correction_disabled(&self) -> bool {
        self.config.dont_correct_in_long_homopolymers
            && self.max_homopolymer_length > MAX_HOMOPOLYMER_THRESHOLD
    }

    /// Ingest every k-mer of every read into the counter. No-op when the
    /// region's homopolymer guard tripped.
    pub fn add_reads_to_kmers<'a, I>(&mut self, reads: I)
    where
        I: IntoIterator<Item = &'a Read>,
    {
        if self.correction_disabled() {
            return;
        }
        for read in reads {
            self.counts_by_kmer.add_sequence(read.bases());
        }
    }

    /// Correct a collection of reads against the accumulated k-mer counts,
    /// returning new reads. Reads are passed through untouched when the
    /// homopolymer guard tripped.
    pub fn correct_reads(&mut self, reads: &[Arc<Read>]) -> Vec<Arc<Read>> {
        if self.correction_disabled() {
            return reads.to_vec();
        }
        self.compute_kmer_correction_map();

        let mut corrected = Vec::with_capacity(reads.len());
        for read in reads {
            let out = self.correct_read(read);
            if self.config.trim_low_quality_bases {
                corrected.push(Arc::new(hard_clip_low_qual_ends(
                    &out,
                    self.config.min_tail_quality,
                )));
            } else {
                corrected.push(Arc::new(out));
            }
        }
        debug!(
            reads_corrected = self.stats.reads_corrected,
            bases_corrected = self.stats.bases_corrected,
            "finished region error correction"
        );
        corrected
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> ErrorCorrectionStats {
        self.stats
    }

    /// For every counted k-mer: solid k-mers map to themselves; correctable
    /// k-mers map to their nearest solid neighbor within the mismatch bound.
    /// Iteration is in ascending byte order; the first minimal distance wins.
    fn compute_kmer_correction_map(&mut self) {
        if !self.kmer_correction_map.is_empty() {
            return;
        }
        let solid: Vec<Kmer> = self
            .counts_by_kmer
            .counted_kmers()
            .filter(|&(_, count)| count >= self.config.min_observations_for_kmer_to_be_solid)
            .map(|(kmer, _)| kmer.clone())
            .collect();

        for (kmer, count) in self.counts_by_kmer.counted_kmers() {
            if count >= self.config.min_observations_for_kmer_to_be_solid {
                self.stats.solid_kmers += 1;
                self.kmer_correction_map.insert(kmer.clone(), Vec::new());
            } else if count <= self.config.max_observations_for_kmer_to_be_correctable {
                match find_nearest_neighbor(kmer, &solid, self.config.max_mismatches_to_correct) {
                    Some(diffs) => {
                        self.stats.corrected_kmers += 1;
                        self.kmer_correction_map.insert(kmer.clone(), diffs);
                    }
                    None => {
                        self.stats.uncorrectable_kmers += 1;
                    }
                }
            }
        }
        debug!(
            solid = self.stats.solid_kmers,
            corrected = self.stats.corrected_kmers,
            uncorrectable = self.stats.uncorrectable_kmers,
            "built k-mer correction map"
        );
    }

    fn correct_read(&mut self, read: &Read) -> Read {
        let correction_set = self.build_correction_set(read.bases());

        let mut bases = read.bases().to_vec();
        let mut quals = read.quals().to_vec();
        let mut corrected = false;
        for (offset, proposals) in correction_set.iter().enumerate() {
            if let Some(base) = consensus_correction(proposals) {
                if base != bases[offset] {
                    bases[offset] = base;
                    quals[offset] = self.config.quality_of_corrected_bases;
                    corrected = true;
                    self.stats.bases_corrected += 1;
                }
            }
        }

        if corrected {
            self.stats.reads_corrected += 1;
            let mut out = read.clone();
            out.set_bases(bases);
            out.set_quals(quals);
            out
        } else {
            self.stats.reads_uncorrected += 1;
            read.clone()
        }
    }

    /// Collect, per read offset, every replacement base proposed by an
    /// overlapping corrected k-mer window. Irregular bases are never
    /// proposed.
    fn build_correction_set(&self, bases: &[u8]) -> Vec<Vec<u8>> {
        let k = self.config.kmer_length;
        let mut proposals: Vec<Vec<u8>> = vec![Vec::new(); bases.len()];
        if bases.len() < k {
            return proposals;
        }
        for offset in 0..=bases.len() - k {
            let kmer = Kmer::new(bases, offset, k);
            if let Some(diffs) = self.kmer_correction_map.get(&kmer) {
                for &(index, base) in diffs {
                    if is_regular_base(base) {
                        proposals[offset + index].push(base);
                    }
                }
            }
        }
        proposals
    }
}

impl std::fmt::Debug for ReadErrorCorrector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadErrorCorrector")
            .field("kmer_length", &self.config.kmer_length)
            .field("distinct_kmers", &self.counts_by_kmer.distinct_kmers())
            .field("max_homopolymer_length", &self.max_homopolymer_length)
            .finish()
    }
}

/// Nearest solid neighbor of `kmer` within `max_distance` mismatches, as the
/// differing positions to rewrite. The candidate list must be byte-ordered;
/// the first minimal distance wins.
fn find_nearest_neighbor(
    kmer: &Kmer,
    solid: &[Kmer],
    max_distance: usize,
) -> Option<Vec<(usize, u8)>> {
    let mut best: Option<Vec<(usize, u8)>> = None;
    let mut best_distance = usize::MAX;
    for candidate in solid {
        if candidate == kmer {
            continue;
        }
        if let Some(diffs) = kmer.differing_positions(candidate, max_distance) {
            if diffs.len() < best_distance {
                best_distance = diffs.len();
                best = Some(diffs);
            }
        }
    }
    best
}

/// Strict consensus: a base is proposed only when every proposal agrees.
fn consensus_correction(proposals: &[u8]) -> Option<u8> {
    let (&first, rest) = proposals.split_first()?;
    if rest.iter().all(|&b| b == first) {
        Some(first)
    } else {
        None
    }
}

/// Longest homopolymer run in the region's padded reference.
fn compute_max_homopolymer_run(reference: &[u8]) -> usize {
    let mut run = 1usize;
    let mut max_run = usize::from(!reference.is_empty());
    for window in reference.windows(2) {
        if window[0] == window[1] {
            run += 1;
            max_run = max_run.max(run);
        } else {
            run = 1;
        }
    }
    max_run
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::{CigarOp, CigarOpKind, ReadFlags};

    fn read_of(name: &str, bases: &[u8]) -> Arc<Read> {
        Arc::new(Read::new(
            name,
            "s",
            "chr1",
            100,
            60,
            vec![CigarOp::new(CigarOpKind::Match, bases.len() as u32)],
            bases.to_vec(),
            vec![35; bases.len()],
            ReadFlags::default(),
        ))
    }

    fn config(kmer_length: usize) -> ErrorCorrectionConfig {
        ErrorCorrectionConfig {
            kmer_length,
            min_observations_for_kmer_to_be_solid: 5,
            ..ErrorCorrectionConfig::default()
        }
    }

    #[test]
    fn solid_only_read_is_unchanged() {
        let reads: Vec<Arc<Read>> = (0..5).map(|i| read_of(&format!("r{i}"), b"ACGTACGT")).collect();
        let mut corrector = ReadErrorCorrector::new(config(4), b"ACGTACGT").unwrap();
        corrector.add_reads_to_kmers(reads.iter().map(Arc::as_ref));
        let corrected = corrector.correct_reads(&reads);
        for (orig, out) in reads.iter().zip(&corrected) {
            assert_eq!(orig.bases(), out.bases());
            assert_eq!(orig.quals(), out.quals());
        }
        assert_eq!(corrector.stats().reads_corrected, 0);
    }

    #[test]
    fn lone_error_is_rewritten_to_consensus() {
        // Ten clean copies and one read with a single error in the middle.
        let mut reads: Vec<Arc<Read>> =
            (0..10).map(|i| read_of(&format!("r{i}"), b"ACGTTGCAACGT")).collect();
        reads.push(read_of("bad", b"ACGTTGGAACGT"));
        let mut corrector = ReadErrorCorrector::new(config(6), b"ACGTTGCAACGT").unwrap();
        corrector.add_reads_to_kmers(reads.iter().map(Arc::as_ref));
        let corrected = corrector.correct_reads(&reads);
        let fixed = corrected.last().unwrap();
        assert_eq!(fixed.bases(), b"ACGTTGCAACGT");
        let bad_offset = 6;
        assert_eq!(fixed.quals()[bad_offset], corrector.config.quality_of_corrected_bases);
        assert_eq!(corrector.stats().reads_corrected, 1);
    }

    #[test]
    fn homopolymer_guard_disables_correction() {
        let mut cfg = config(4);
        cfg.dont_correct_in_long_homopolymers = true;
        let long_run = vec![b'A'; 20];
        let reads = vec![read_of("r0", b"ACGTACGT")];
        let mut corrector = ReadErrorCorrector::new(cfg, &long_run).unwrap();
        corrector.add_reads_to_kmers(reads.iter().map(Arc::as_ref));
        assert_eq!(corrector.counts_by_kmer.distinct_kmers(), 0);
        let out = corrector.correct_reads(&reads);
        assert_eq!(out[0].bases(), reads[0].bases());
    }
}
