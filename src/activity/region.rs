//! Assembly regions: active or inactive spans cut from an activity profile.

use std::sync::Arc;

use crate::position::GenomeLocation;
use crate::reads::Read;

use super::state::ActivityProfileState;

/// A contiguous span of a shard classified as active (worth reassembly) or
/// inactive, with its supporting per-locus states and constituent reads.
///
/// Regions are mutated only while being built (read attachment); afterwards
/// they are handed to the caller engine and dropped.
#[derive(Debug, Clone)]
pub struct AssemblyRegion {
    span: GenomeLocation,
    padded_span: GenomeLocation,
    active: bool,
    states: Vec<ActivityProfileState>,
    reads: Vec<Arc<Read>>,
}

impl AssemblyRegion {
    /// Construct a region over `span` with its padded extent.
    pub fn new(
        span: GenomeLocation,
        padded_span: GenomeLocation,
        active: bool,
        states: Vec<ActivityProfileState>,
    ) -> Self {
        debug_assert!(padded_span.contains(&span));
        Self {
            span,
            padded_span,
            active,
            states,
            reads: Vec::new(),
        }
    }

    /// Primary span (padding excluded).
    pub fn span(&self) -> &GenomeLocation {
        &self.span
    }

    /// Padded span reads are collected over.
    pub fn padded_span(&self) -> &GenomeLocation {
        &self.padded_span
    }

    /// Whether this span was classified active.
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// The per-locus states supporting the classification.
    pub fn supporting_states(&self) -> &[ActivityProfileState] {
        &self.states
    }

    /// Reads overlapping the padded span, in coordinate order.
    pub fn reads(&self) -> &[Arc<Read>] {
        &self.reads
    }

    /// Attach the reads overlapping the padded span. Called once during
    /// construction by the region iterator.
    pub fn set_reads(&mut self, reads: Vec<Arc<Read>>) {
        debug_assert!(
            reads.windows(2).all(|w| w[0].start() <= w[1].start()),
            "region reads must be coordinate-ordered"
        );
        self.reads = reads;
    }

    /// Replace the reads with an error-corrected set.
    pub fn replace_reads(&mut self, reads: Vec<Arc<Read>>) {
        self.reads = reads;
    }
}
