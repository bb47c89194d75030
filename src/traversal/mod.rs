//! Per-shard traversal: the orchestrator wiring shards, activity profiling,
//! assembly regions, error correction, region calling and annotation.
//!
//! Each shard is an independent unit of work: reads are filtered and
//! downsampled, the shard is cut into assembly regions, region reads are
//! error-corrected, the region caller produces variant contexts, and the
//! annotation engine decorates them before they reach the writer. No state
//! is shared across shards.

mod pileup_caller;

pub use pileup_caller::{MismatchActivityEvaluator, PileupRegionCaller};

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::activity::{ActivityEvaluator, AssemblyRegion, AssemblyRegionIterator};
use crate::annotation::{AnnotationError, VariantAnnotatorEngine};
use crate::config::{ConfigError, TraversalConfig};
use crate::kmer::{CorrectionError, ReadErrorCorrector};
use crate::likelihood::ReadLikelihoods;
use crate::position::{GenomeLocation, LocationError};
use crate::reads::{CountingReadFilter, PositionalDownsampler, Read, ReadSource};
use crate::reference::ReferenceProvider;
use crate::shard::{divide_interval_into_shards, single_shard, Shard};
use crate::variant::VariantContext;

/// Errors raised while traversing shards.
#[derive(Debug, Error)]
pub enum TraversalError {
    /// Invalid configuration, surfaced before any work starts.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Invalid genomic coordinates.
    #[error(transparent)]
    Location(#[from] LocationError),
    /// Error-corrector construction failed.
    #[error(transparent)]
    Correction(#[from] CorrectionError),
    /// Annotation resolution or application failed.
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
    /// The region caller failed.
    #[error("region caller error: {0}")]
    Caller(String),
    /// The output writer failed.
    #[error("variant writer error: {0}")]
    Writer(String),
}

/// Region-calling collaborator: consumes a finalized assembly region and
/// produces called variants plus the likelihoods that support them.
pub trait RegionCaller {
    /// Call variants in one region.
    fn call_region(
        &self,
        region: &AssemblyRegion,
        reference: &dyn ReferenceProvider,
    ) -> Result<Vec<(VariantContext, ReadLikelihoods)>, TraversalError>;
}

/// Output collaborator accepting annotated variant contexts.
///
/// Contexts arrive in coordinate order within a shard; cross-shard ordering
/// is the orchestrator's concern.
pub trait VariantWriter {
    /// Accept one annotated context.
    fn write(&mut self, context: VariantContext) -> Result<(), TraversalError>;
}

/// Writer collecting contexts in memory.
#[derive(Debug, Default)]
pub struct VecVariantWriter {
    contexts: Vec<VariantContext>,
}

impl VecVariantWriter {
    /// Empty writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// The collected contexts.
    pub fn contexts(&self) -> &[VariantContext] {
        &self.contexts
    }

    /// Consume the writer, returning the collected contexts.
    pub fn into_contexts(self) -> Vec<VariantContext> {
        self.contexts
    }
}

impl VariantWriter for VecVariantWriter {
    fn write(&mut self, context: VariantContext) -> Result<(), TraversalError> {
        self.contexts.push(context);
        Ok(())
    }
}

/// Counters reported after a traversal.
#[derive(Debug, Default, Clone, Copy)]
pub struct TraversalSummary {
    /// Shards processed.
    pub shards: u64,
    /// Assembly regions emitted.
    pub regions: u64,
    /// Of which active.
    pub active_regions: u64,
    /// Variant contexts written.
    pub variants: u64,
    /// Reads rejected by the filter stack.
    pub reads_filtered: u64,
}

/// The per-shard orchestrator.
pub struct Traversal<'a> {
    config: TraversalConfig,
    source: &'a dyn ReadSource,
    reference: &'a dyn ReferenceProvider,
    evaluator: &'a dyn ActivityEvaluator,
    caller: &'a dyn RegionCaller,
    annotator: &'a VariantAnnotatorEngine,
}

impl<'a> Traversal<'a> {
    /// Wire up a traversal; the configuration is validated here, before any
    /// shard work starts.
    pub fn new(
        config: TraversalConfig,
        source: &'a dyn ReadSource,
        reference: &'a dyn ReferenceProvider,
        evaluator: &'a dyn ActivityEvaluator,
        caller: &'a dyn RegionCaller,
        annotator: &'a VariantAnnotatorEngine,
    ) -> Result<Self, TraversalError> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            reference,
            evaluator,
            caller,
            annotator,
        })
    }

    /// Process every interval shard by shard, writing annotated variants.
    pub fn traverse(
        &self,
        intervals: &[GenomeLocation],
        writer: &mut dyn VariantWriter,
    ) -> Result<TraversalSummary, TraversalError> {
        let dictionary = self.reference.dictionary();
        let mut summary = TraversalSummary::default();

        for interval in intervals {
            let shards: Vec<Shard<'_>> = match self.config.shard.shard_size {
                Some(size) => divide_interval_into_shards(
                    interval,
                    size,
                    self.config.shard.shard_padding,
                    self.source,
                    dictionary,
                )?,
                None => vec![single_shard(
                    interval,
                    self.config.shard.shard_padding,
                    self.source,
                    dictionary,
                )?],
            };

            for mut shard in shards {
                self.process_shard(&mut shard, writer, &mut summary)?;
                summary.shards += 1;
            }
        }

        info!(
            shards = summary.shards,
            regions = summary.regions,
            variants = summary.variants,
            reads_filtered = summary.reads_filtered,
            "traversal complete"
        );
        Ok(summary)
    }

    fn process_shard(
        &self,
        shard: &mut Shard<'_>,
        writer: &mut dyn VariantWriter,
        summary: &mut TraversalSummary,
    ) -> Result<(), TraversalError> {
        let mut filter = CountingReadFilter::standard(self.config.min_mapping_quality);
        let mut downsampler = self
            .config
            .max_reads_per_alignment_start
            .map(PositionalDownsampler::new);

        let reads: Vec<Arc<Read>> = shard
            .reads()
            .iter()
            .filter(|read| filter.test(read))
            .filter(|read| {
                downsampler
                    .as_mut()
                    .map(|ds| ds.accept(read))
                    .unwrap_or(true)
            })
            .cloned()
            .collect();
        summary.reads_filtered += filter.total_rejected();
        filter.log_summary();

        let regions = AssemblyRegionIterator::from_parts(
            shard.interval().clone(),
            shard.padded_interval().clone(),
            reads,
            self.evaluator,
            &self.config.region,
        );

        for mut region in regions {
            summary.regions += 1;
            if region.is_active() {
                summary.active_regions += 1;
            }

            if let Some(ec_config) = &self.config.error_correction {
                let padded_reference = self.reference.bases(region.padded_span())?;
                let mut corrector =
                    ReadErrorCorrector::new(ec_config.clone(), &padded_reference)?;
                corrector.add_reads_to_kmers(region.reads().iter().map(Arc::as_ref));
                let corrected = corrector.correct_reads(region.reads());
                region.replace_reads(corrected);
            }

            for (vc, likelihoods) in self.caller.call_region(&region, self.reference)? {
                let annotated =
                    self.annotator
                        .annotate_context(&vc, Some(&likelihoods), &|_| true)?;
                writer.write(annotated)?;
                summary.variants += 1;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Traversal<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Traversal")
            .field("config", &self.config)
            .finish()
    }
}
