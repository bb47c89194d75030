//! Pull-based assembly-region extraction over one shard.

use std::collections::VecDeque;
use std::sync::Arc;

use tracing::debug;

use crate::config::AssemblyRegionConfig;
use crate::position::GenomeLocation;
use crate::reads::Read;
use crate::shard::Shard;

use super::profile::ActivityProfile;
use super::region::AssemblyRegion;
use super::state::ActivityProfileState;

/// Engine-provided model scoring per-locus activity.
pub trait ActivityEvaluator {
    /// Probability in `[0, 1]` that `locus` is active, given the reads
    /// overlapping it.
    fn activity_probability(&self, locus: &GenomeLocation, reads: &[Arc<Read>]) -> f64;
}

/// Forward-only iterator of assembly regions for one shard.
///
/// The activity profile is evaluated for the shard's primary interval when
/// the iterator is built; regions are then emitted in non-decreasing start
/// order, each carrying the reads overlapping its padded span. The sequence
/// is finite and cannot be restarted.
#[derive(Debug)]
pub struct AssemblyRegionIterator {
    pending: VecDeque<AssemblyRegion>,
    reads: Vec<Arc<Read>>,
}

impl AssemblyRegionIterator {
    /// Evaluate the shard and prepare its region sequence.
    pub fn new(
        shard: &mut Shard<'_>,
        evaluator: &dyn ActivityEvaluator,
        config: &AssemblyRegionConfig,
    ) -> Self {
        let primary = shard.interval().clone();
        let padded_bounds = shard.padded_interval().clone();
        let reads: Vec<Arc<Read>> = shard.reads().to_vec();
        Self::from_parts(primary, padded_bounds, reads, evaluator, config)
    }

    /// Build the iterator from an already-fetched (and possibly filtered)
    /// read set.
    pub fn from_parts(
        primary: GenomeLocation,
        padded_bounds: GenomeLocation,
        reads: Vec<Arc<Read>>,
        evaluator: &dyn ActivityEvaluator,
        config: &AssemblyRegionConfig,
    ) -> Self {
        let mut profile = ActivityProfile::new(config.clone());
        for pos in primary.start()..=primary.end() {
            let locus = GenomeLocation::point(Arc::clone(primary.contig()), pos)
                .expect("single-base locus inside shard bounds");
            let overlapping: Vec<Arc<Read>> = reads
                .iter()
                .filter(|read| read.start() <= pos && pos <= read.end())
                .cloned()
                .collect();
            let prob = evaluator.activity_probability(&locus, &overlapping);
            profile.add_state(ActivityProfileState::new(locus, prob));
        }

        let regions = extract_regions(&profile, &primary, &padded_bounds, config);
        debug!(
            shard = %primary,
            regions = regions.len(),
            "prepared assembly regions"
        );
        Self {
            pending: regions.into(),
            reads,
        }
    }
}

impl Iterator for AssemblyRegionIterator {
    type Item = AssemblyRegion;

    fn next(&mut self) -> Option<Self::Item> {
        let mut region = self.pending.pop_front()?;
        let padded = region.padded_span().clone();
        let overlapping: Vec<Arc<Read>> = self
            .reads
            .iter()
            .filter(|read| {
                read.location()
                    .map(|loc| loc.overlaps(&padded))
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        region.set_reads(overlapping);
        Some(region)
    }
}

/// Cut the smoothed profile into alternating active/inactive spans,
/// enforcing the minimum and maximum region sizes, and pad each span.
fn extract_regions(
    profile: &ActivityProfile,
    primary: &GenomeLocation,
    padded_bounds: &GenomeLocation,
    config: &AssemblyRegionConfig,
) -> Vec<AssemblyRegion> {
    if profile.is_empty() {
        return Vec::new();
    }
    let classes = merge_short_runs(profile.classifications(), config.min_region_size as usize);

    let mut regions = Vec::new();
    let mut run_start = 0usize;
    let n = classes.len();
    for i in 1..=n {
        if i == n || classes[i] != classes[run_start] {
            let active = classes[run_start];
            let mut chunk_start = run_start;
            // clamp any single region to the maximum size
            while chunk_start < i {
                let chunk_end = if active {
                    (chunk_start + config.max_region_size as usize).min(i)
                } else {
                    i
                };
                regions.push(build_region(
                    profile,
                    primary,
                    padded_bounds,
                    config,
                    chunk_start,
                    chunk_end,
                    active,
                ));
                chunk_start = chunk_end;
            }
            run_start = i;
        }
    }
    regions
}

/// Fold runs shorter than the minimum region size into their left neighbor
/// (or right neighbor for a leading short run) so active and inactive spans
/// are not both left undersized.
fn merge_short_runs(mut classes: Vec<bool>, min_size: usize) -> Vec<bool> {
    if classes.len() <= min_size {
        return classes;
    }
    loop {
        let mut changed = false;
        let mut run_start = 0usize;
        let n = classes.len();
        for i in 1..=n {
            if i == n || classes[i] != classes[run_start] {
                let run_len = i - run_start;
                if run_len < min_size && (run_start > 0 || i < n) {
                    let replacement = if run_start > 0 {
                        classes[run_start - 1]
                    } else {
                        classes[i]
                    };
                    for class in &mut classes[run_start..i] {
                        *class = replacement;
                    }
                    changed = true;
                    break;
                }
                run_start = i;
            }
        }
        if !changed {
            return classes;
        }
    }
}

fn build_region(
    profile: &ActivityProfile,
    primary: &GenomeLocation,
    padded_bounds: &GenomeLocation,
    config: &AssemblyRegionConfig,
    start_index: usize,
    end_index: usize,
    active: bool,
) -> AssemblyRegion {
    let span_start = primary.start() + start_index as u64;
    let span_end = primary.start() + end_index as u64 - 1;
    let span = GenomeLocation::new(Arc::clone(primary.contig()), span_start, span_end)
        .expect("region span within primary interval");

    let padded_start = span_start
        .saturating_sub(config.region_padding)
        .max(padded_bounds.start());
    let padded_end = (span_end + config.region_padding).min(padded_bounds.end());
    let padded_span =
        GenomeLocation::new(Arc::clone(primary.contig()), padded_start, padded_end)
            .expect("padded span within shard bounds");

    let states = profile.states()[start_index..end_index].to_vec();
    AssemblyRegion::new(span, padded_span, active, states)
}
