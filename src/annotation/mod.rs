//! Pluggable variant annotations.
//!
//! Annotations come in two shapes: info-field annotations computing
//! site-level attributes and genotype annotations decorating individual
//! sample calls. A plugin may additionally be *reducible*: it computes a
//! serializable raw partial statistic per shard, partials are combined
//! across shards, and a finalize step converts the combined raw value into
//! the reported statistic. The plugin set is a static registry resolved at
//! engine construction; unknown names or groups are fatal.

mod coverage;
mod depth_per_allele;
mod engine;
mod mapping_quality_zero;
mod overlap;
mod raw;
mod registry;
mod rms_mapping_quality;

pub use coverage::Coverage;
pub use depth_per_allele::DepthPerAlleleBySample;
pub use engine::VariantAnnotatorEngine;
pub use mapping_quality_zero::MappingQualityZero;
pub use overlap::VariantOverlapAnnotator;
pub use raw::{RawValue, ReducibleAnnotationData};
pub use registry::{all_annotation_names, all_group_names, resolve_annotations};
pub use rms_mapping_quality::RmsMappingQuality;

use std::collections::BTreeMap;

use thiserror::Error;

use crate::likelihood::ReadLikelihoods;
use crate::variant::{Allele, AttributeValue, Genotype, GenotypeBuilder, VariantContext};

/// INFO key for read depth.
pub const DEPTH_KEY: &str = "DP";
/// FORMAT key for the minimum depth of a reference block.
pub const MIN_DP_KEY: &str = "MIN_DP";
/// INFO key for RMS mapping quality.
pub const RMS_MAPPING_QUALITY_KEY: &str = "MQ";
/// INFO key for the raw (pre-reduce) RMS mapping-quality statistic.
pub const RAW_RMS_MAPPING_QUALITY_KEY: &str = "RAW_MQ";
/// INFO key for the count of mapping-quality-zero reads.
pub const MAPPING_QUALITY_ZERO_KEY: &str = "MQ0";
/// INFO flag for known-variant-set membership.
pub const DBSNP_KEY: &str = "DB";

/// Attribute map produced by one annotation.
pub type AttributeMap = BTreeMap<String, AttributeValue>;

/// Errors raised by annotation resolution and application.
#[derive(Debug, Error)]
pub enum AnnotationError {
    /// A requested annotation name does not exist.
    #[error("annotation {0} not found; please check that you have specified the name correctly")]
    UnknownAnnotation(String),
    /// A requested annotation group does not exist.
    #[error("unknown annotation group {requested}; known groups are {known:?}")]
    UnknownGroup {
        /// The unrecognized group.
        requested: String,
        /// Valid group names.
        known: Vec<&'static str>,
    },
    /// An overlap set uses the reserved known-variants name.
    #[error("the map of overlap sets must not contain {0}")]
    ReservedOverlapName(String),
    /// A raw annotation string failed to parse.
    #[error("malformed {key} annotation: {value}")]
    MalformedRawData {
        /// Raw key being parsed.
        key: String,
        /// The offending value.
        value: String,
    },
    /// A depth derivation needed by a finalizer is missing or non-positive.
    #[error("cannot derive read count for {key}: missing or non-positive depth")]
    InvalidDepth {
        /// Key whose finalization required the depth.
        key: String,
    },
}

/// Annotation groups selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationGroup {
    /// Annotations applied by default in the calling pipeline.
    Standard,
    /// Annotations derived from read mapping qualities.
    MappingQuality,
}

impl AnnotationGroup {
    /// Stable group name used in configuration.
    pub fn name(self) -> &'static str {
        match self {
            Self::Standard => "Standard",
            Self::MappingQuality => "MappingQuality",
        }
    }
}

/// Common surface of every annotation plugin.
pub trait VariantAnnotation: Send + Sync {
    /// Stable plugin name used in configuration.
    fn name(&self) -> &'static str;

    /// Groups this plugin belongs to.
    fn groups(&self) -> &'static [AnnotationGroup];
}

/// Site-level annotation writing INFO attributes.
pub trait InfoFieldAnnotation: VariantAnnotation {
    /// INFO keys this plugin may emit.
    fn key_names(&self) -> Vec<&'static str>;

    /// Compute attributes for a site. An empty map means the annotation has
    /// nothing to say and is silently skipped.
    fn annotate(
        &self,
        vc: &VariantContext,
        likelihoods: Option<&ReadLikelihoods>,
    ) -> Result<AttributeMap, AnnotationError>;

    /// The reducible capability of this plugin, when it has one.
    fn as_reducible(&self) -> Option<&dyn ReducibleAnnotation> {
        None
    }
}

/// Genotype-level annotation decorating per-sample calls.
pub trait GenotypeAnnotation: VariantAnnotation {
    /// FORMAT keys this plugin may emit.
    fn key_names(&self) -> Vec<&'static str>;

    /// Decorate one genotype, returning the updated builder.
    fn annotate(
        &self,
        vc: &VariantContext,
        genotype: &Genotype,
        builder: GenotypeBuilder,
        likelihoods: Option<&ReadLikelihoods>,
    ) -> Result<GenotypeBuilder, AnnotationError>;
}

/// Two-phase (map/combine/finalize) capability of an info annotation.
///
/// Partial statistics are computed per shard, serialized through
/// [`ReducibleAnnotationData`], combined across shards in any grouping
/// (the combine must be associative and commutative) and finalized once.
pub trait ReducibleAnnotation: InfoFieldAnnotation {
    /// INFO key carrying the raw partial statistic.
    fn raw_key_name(&self) -> &'static str;

    /// Compute the per-shard raw statistic for a site.
    fn annotate_raw_data(
        &self,
        vc: &VariantContext,
        likelihoods: Option<&ReadLikelihoods>,
    ) -> Result<AttributeMap, AnnotationError>;

    /// Combine raw partial values from several shards.
    fn combine_raw_data(
        &self,
        alleles: &[Allele],
        partials: &[ReducibleAnnotationData],
    ) -> Result<AttributeMap, AnnotationError>;

    /// Convert the combined raw value on `vc` into the final statistic.
    /// Returns an empty map when the raw key is absent.
    fn finalize_raw_data(&self, vc: &VariantContext) -> Result<AttributeMap, AnnotationError>;
}
