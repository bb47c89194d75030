//! Default pileup-based region caller and activity model.
//!
//! These are deliberately simple implementations of the engine collaborator
//! traits: the activity model scores a locus by its mismatch fraction, and
//! the caller genotypes each active locus from its pileup with a heuristic
//! Bayesian score. A production haplotype engine plugs in through the same
//! traits.

use std::sync::Arc;

use crate::activity::{ActivityEvaluator, AssemblyRegion};
use crate::likelihood::ReadLikelihoods;
use crate::position::GenomeLocation;
use crate::reads::Read;
use crate::reference::ReferenceProvider;
use crate::variant::{Allele, Genotype, VariantContext};

use super::{RegionCaller, TraversalError};

const NUM_BASES: usize = 4; // A, C, G, T

fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

fn index_base(index: usize) -> u8 {
    match index {
        0 => b'A',
        1 => b'C',
        2 => b'G',
        _ => b'T',
    }
}

/// Scores per-locus activity as the fraction of overlapping read bases that
/// disagree with the reference.
pub struct MismatchActivityEvaluator<'a> {
    reference: &'a dyn ReferenceProvider,
}

impl std::fmt::Debug for MismatchActivityEvaluator<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MismatchActivityEvaluator").finish()
    }
}

impl<'a> MismatchActivityEvaluator<'a> {
    /// Evaluator reading reference bases from `reference`.
    pub fn new(reference: &'a dyn ReferenceProvider) -> Self {
        Self { reference }
    }
}

impl ActivityEvaluator for MismatchActivityEvaluator<'_> {
    fn activity_probability(&self, locus: &GenomeLocation, reads: &[Arc<Read>]) -> f64 {
        let Ok(ref_bases) = self.reference.bases(locus) else {
            return 0.0;
        };
        let Some(&ref_base) = ref_bases.first() else {
            return 0.0;
        };
        let mut depth = 0u32;
        let mut mismatches = 0u32;
        for read in reads {
            let Some(coord) = read.read_coordinate_for_reference_coordinate(locus.start()) else {
                continue;
            };
            if coord.in_deletion {
                mismatches += 1;
                depth += 1;
                continue;
            }
            if let Some(&base) = read.bases().get(coord.offset) {
                depth += 1;
                if !base.eq_ignore_ascii_case(&ref_base) {
                    mismatches += 1;
                }
            }
        }
        if depth == 0 {
            0.0
        } else {
            mismatches as f64 / depth as f64
        }
    }
}

/// Per-base pileup counts at one locus.
#[derive(Debug, Clone)]
struct PileupNode {
    position: u64,
    base_counts: [u32; NUM_BASES],
    quality_sums: [f64; NUM_BASES],
    depth: u32,
}

impl PileupNode {
    fn new(position: u64) -> Self {
        Self {
            position,
            base_counts: [0; NUM_BASES],
            quality_sums: [0.0; NUM_BASES],
            depth: 0,
        }
    }

    fn observe(&mut self, base_idx: usize, quality: u8) {
        self.base_counts[base_idx] += 1;
        self.quality_sums[base_idx] += (quality as f64) / 93.0; // normalize to [0,1]
        self.depth += 1;
    }
}

/// Pileup-based caller over a region's corrected reads.
#[derive(Debug)]
pub struct PileupRegionCaller {
    quality_threshold: f64,
    hom_alt_fraction: f64,
}

impl Default for PileupRegionCaller {
    fn default() -> Self {
        Self {
            quality_threshold: 10.0,
            hom_alt_fraction: 0.8,
        }
    }
}

impl PileupRegionCaller {
    /// Caller reporting variants at or above `quality_threshold`.
    pub fn new(quality_threshold: f64) -> Self {
        Self {
            quality_threshold,
            ..Self::default()
        }
    }

    fn pileup_at(&self, region: &AssemblyRegion, position: u64) -> PileupNode {
        let mut node = PileupNode::new(position);
        for read in region.reads() {
            let Some(coord) = read.read_coordinate_for_reference_coordinate(position) else {
                continue;
            };
            if coord.in_deletion {
                continue;
            }
            if let (Some(&base), Some(&qual)) =
                (read.bases().get(coord.offset), read.quals().get(coord.offset))
            {
                if let Some(idx) = base_index(base) {
                    node.observe(idx, qual);
                }
            }
        }
        node
    }

    /// Heuristic quality of the best alternate at a node, if any.
    fn score_node(&self, node: &PileupNode, ref_base: u8) -> Option<(u8, f64, f64)> {
        if node.depth == 0 {
            return None;
        }
        let ref_idx = base_index(ref_base)?;
        let (alt_idx, &alt_count) = node
            .base_counts
            .iter()
            .enumerate()
            .filter(|&(idx, _)| idx != ref_idx)
            .max_by_key(|&(_, count)| count)?;
        if alt_count == 0 {
            return None;
        }
        let alt_fraction = alt_count as f64 / node.depth as f64;
        let avg_quality = (node.quality_sums[alt_idx] / alt_count as f64).clamp(0.0, 1.0);
        let quality = (alt_fraction * avg_quality.max(0.1) * 100.0).min(60.0);
        Some((index_base(alt_idx), quality, alt_fraction))
    }

    fn likelihoods_at(
        &self,
        region: &AssemblyRegion,
        position: u64,
        alleles: &[Allele],
    ) -> ReadLikelihoods {
        let mut samples: Vec<Arc<str>> = Vec::new();
        for read in region.reads() {
            if !samples.iter().any(|s| s == read.sample()) {
                samples.push(Arc::clone(read.sample()));
            }
        }
        let reads_by_sample: Vec<Vec<Arc<Read>>> = samples
            .iter()
            .map(|sample| {
                region
                    .reads()
                    .iter()
                    .filter(|read| read.sample() == sample)
                    .filter(|read| read.start() <= position && position <= read.end())
                    .cloned()
                    .collect()
            })
            .collect();
        let mut likelihoods =
            ReadLikelihoods::new(samples, alleles.to_vec(), reads_by_sample);
        for sample_index in 0..likelihoods.number_of_samples() {
            let reads: Vec<Arc<Read>> = likelihoods.sample_reads(sample_index).to_vec();
            for (read_index, read) in reads.iter().enumerate() {
                let observed = read
                    .read_coordinate_for_reference_coordinate(position)
                    .filter(|coord| !coord.in_deletion)
                    .and_then(|coord| {
                        read.bases()
                            .get(coord.offset)
                            .copied()
                            .zip(read.quals().get(coord.offset).copied())
                    });
                for (allele_index, allele) in alleles.iter().enumerate() {
                    let value = match observed {
                        Some((base, qual)) => {
                            if allele.bases() == &[base.to_ascii_uppercase()][..] {
                                0.0
                            } else {
                                -(qual as f64) / 10.0
                            }
                        }
                        None => 0.0,
                    };
                    likelihoods.set_value(sample_index, allele_index, read_index, value);
                }
            }
        }
        likelihoods
    }
}

impl RegionCaller for PileupRegionCaller {
    fn call_region(
        &self,
        region: &AssemblyRegion,
        reference: &dyn ReferenceProvider,
    ) -> Result<Vec<(VariantContext, ReadLikelihoods)>, TraversalError> {
        if !region.is_active() {
            return Ok(Vec::new());
        }
        let ref_bases = reference.bases(region.span())?;
        let mut calls = Vec::new();
        for (offset, &ref_base) in ref_bases.iter().enumerate() {
            let position = region.span().start() + offset as u64;
            let node = self.pileup_at(region, position);
            let Some((alt_base, quality, alt_fraction)) = self.score_node(&node, ref_base) else {
                continue;
            };
            if quality < self.quality_threshold {
                continue;
            }

            let reference_allele = Allele::reference(&[ref_base.to_ascii_uppercase()]);
            let alt_allele = Allele::alternate(&[alt_base]);
            let alleles = vec![reference_allele.clone(), alt_allele.clone()];
            let likelihoods = self.likelihoods_at(region, position, &alleles);

            let genotypes: Vec<Genotype> = likelihoods
                .samples()
                .iter()
                .map(|sample| {
                    let called = if alt_fraction >= self.hom_alt_fraction {
                        vec![alt_allele.clone(), alt_allele.clone()]
                    } else {
                        vec![reference_allele.clone(), alt_allele.clone()]
                    };
                    Genotype::new(Arc::clone(sample), called)
                        .to_builder()
                        .depth(node.depth)
                        .build()
                })
                .collect();

            let location = GenomeLocation::point(Arc::clone(region.span().contig()), position)?;
            let vc = VariantContext::builder(location, alleles)
                .qual(quality)
                .genotypes(genotypes)
                .build();
            calls.push((vc, likelihoods));
        }
        Ok(calls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::AssemblyRegion;
    use crate::reads::{CigarOp, CigarOpKind, ReadFlags};
    use crate::reference::InMemoryReference;

    fn read_with(name: &str, start: u64, bases: &[u8]) -> Arc<Read> {
        Arc::new(Read::new(
            name,
            "s1",
            "chr1",
            start,
            60,
            vec![CigarOp::new(CigarOpKind::Match, bases.len() as u32)],
            bases.to_vec(),
            vec![35; bases.len()],
            ReadFlags::default(),
        ))
    }

    fn region_with_reads(reads: Vec<Arc<Read>>) -> AssemblyRegion {
        let span = GenomeLocation::new("chr1", 1, 8).unwrap();
        let mut region = AssemblyRegion::new(span.clone(), span, true, Vec::new());
        region.set_reads(reads);
        region
    }

    #[test]
    fn homozygous_variant_is_called() {
        let reference = InMemoryReference::from_contigs([("chr1", b"ACGTACGT".to_vec())]);
        // every read says T at position 4 instead of the reference T->A at 5
        let reads: Vec<Arc<Read>> = (0..6)
            .map(|i| read_with(&format!("r{i}"), 1, b"ACGTTCGT"))
            .collect();
        let region = region_with_reads(reads);
        let calls = PileupRegionCaller::default()
            .call_region(&region, &reference)
            .unwrap();
        assert_eq!(calls.len(), 1);
        let (vc, likelihoods) = &calls[0];
        assert_eq!(vc.location().start(), 5);
        assert_eq!(vc.alternate_alleles().next().unwrap().bases(), b"T");
        assert!(vc.qual().unwrap() >= 10.0);
        assert_eq!(likelihoods.read_count(), 6);
    }

    #[test]
    fn inactive_region_yields_no_calls() {
        let reference = InMemoryReference::from_contigs([("chr1", b"ACGTACGT".to_vec())]);
        let span = GenomeLocation::new("chr1", 1, 8).unwrap();
        let region = AssemblyRegion::new(span.clone(), span, false, Vec::new());
        let calls = PileupRegionCaller::default()
            .call_region(&region, &reference)
            .unwrap();
        assert!(calls.is_empty());
    }

    #[test]
    fn mismatch_evaluator_scores_fraction() {
        let reference = InMemoryReference::from_contigs([("chr1", b"AAAA".to_vec())]);
        let evaluator = MismatchActivityEvaluator::new(&reference);
        let locus = GenomeLocation::point("chr1", 2).unwrap();
        let reads = vec![read_with("r1", 1, b"AAAA"), read_with("r2", 1, b"ATAA")];
        let prob = evaluator.activity_probability(&locus, &reads);
        assert!((prob - 0.5).abs() < 1e-9);
    }
}
