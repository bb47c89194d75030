//! # Assembly-region calling core
//!
//! This library implements the engine at the center of a distributed
//! variant-calling pipeline: discovering assembly regions from per-locus
//! activity, correcting read errors with a k-mer table, quantizing
//! base-quality histograms, adjusting overlapping paired-fragment
//! qualities, and applying a pluggable, partially-reducible annotation
//! engine to called variants.
//!
//! ## Pipeline shape
//!
//! 1. **Shard**: a traversal interval plus padding with lazy read access
//! 2. **Activity profile**: per-locus probabilities, smoothed by propagation
//! 3. **Assembly regions**: active/inactive spans, padded and size-bounded
//! 4. **Error correction**: solid k-mers repair their rare Hamming neighbors
//! 5. **Region calling**: an engine collaborator produces variant contexts
//! 6. **Annotation**: plugins decorate sites and genotypes; reducible
//!    statistics combine across shards and finalize once
//!
//! Shards are independent units of work with no shared mutable state; the
//! only cross-shard coordination is the reducible-annotation combine, a
//! pure associative reduce over immutable partial values.
//!
//! ## Usage example
//!
//! ```ignore
//! use locuscall::annotation::VariantAnnotatorEngine;
//! use locuscall::config::TraversalConfig;
//! use locuscall::traversal::{
//!     MismatchActivityEvaluator, PileupRegionCaller, Traversal, VecVariantWriter,
//! };
//!
//! let annotator = VariantAnnotatorEngine::of_all_minus_excluded(vec![])?;
//! let evaluator = MismatchActivityEvaluator::new(&reference);
//! let caller = PileupRegionCaller::default();
//! let traversal = Traversal::new(
//!     TraversalConfig::default(), &source, &reference, &evaluator, &caller, &annotator,
//! )?;
//! let summary = traversal.traverse(&intervals, &mut writer)?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

// Core modules - leaves first, orchestrator last
pub mod position; // genomic coordinates and contig metadata
pub mod qual; // Phred conversions and quality constants
pub mod reference; // reference-sequence accessor collaborator
pub mod config; // validated configuration values
pub mod reads; // read model, filters, clipping, fragment adjustment
pub mod shard; // traversal intervals with padding and lazy reads
pub mod activity; // activity profile and assembly regions
pub mod kmer; // k-mer counting and read error correction
pub mod quantize; // quality-score quantization
pub mod variant; // alleles, genotypes, variant contexts, VCF rendering
pub mod likelihood; // per-sample read x allele likelihoods
pub mod annotation; // annotation plugins, registry and engine
pub mod traversal; // the per-shard orchestrator

// Re-exports for convenience
pub use activity::{ActivityProfile, ActivityProfileState, AssemblyRegion, AssemblyRegionIterator};
pub use annotation::VariantAnnotatorEngine;
pub use config::TraversalConfig;
pub use kmer::{Kmer, KmerCounter, ReadErrorCorrector};
pub use position::GenomeLocation;
pub use quantize::QualityQuantizer;
pub use reads::Read;
pub use traversal::Traversal;
pub use variant::VariantContext;
