//! Typed configuration for the calling core.
//!
//! Every struct validates itself up front; an out-of-range value is a fatal
//! configuration error, never silently clamped.

use thiserror::Error;

use crate::qual::MAX_QUAL_SCORE;

/// A configuration value is outside its legal range.
#[derive(Debug, Error)]
#[error("configuration error: {0}")]
pub struct ConfigError(pub String);

/// K-mer error-correction parameters.
#[derive(Debug, Clone)]
pub struct ErrorCorrectionConfig {
    /// K-mer length used for counting and correction.
    pub kmer_length: usize,
    /// Maximum Hamming distance to a correction target.
    pub max_mismatches_to_correct: usize,
    /// Count at or above which a k-mer is a correction target.
    pub min_observations_for_kmer_to_be_solid: u64,
    /// Count at or below which a k-mer may be corrected.
    pub max_observations_for_kmer_to_be_correctable: u64,
    /// Quality assigned to rewritten bases.
    pub quality_of_corrected_bases: u8,
    /// Hard-clip read tails below `min_tail_quality` after correction.
    pub trim_low_quality_bases: bool,
    /// Quality threshold for tail clipping.
    pub min_tail_quality: u8,
    /// Disable correction in regions with long reference homopolymers.
    pub dont_correct_in_long_homopolymers: bool,
}

impl Default for ErrorCorrectionConfig {
    fn default() -> Self {
        Self {
            kmer_length: 25,
            max_mismatches_to_correct: 2,
            min_observations_for_kmer_to_be_solid: 20,
            max_observations_for_kmer_to_be_correctable: 1,
            quality_of_corrected_bases: 30,
            trim_low_quality_bases: false,
            min_tail_quality: 6,
            dont_correct_in_long_homopolymers: false,
        }
    }
}

impl ErrorCorrectionConfig {
    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kmer_length == 0 {
            return Err(ConfigError("kmer_length must be > 0".into()));
        }
        if self.max_mismatches_to_correct == 0 {
            return Err(ConfigError("max_mismatches_to_correct must be >= 1".into()));
        }
        if self.quality_of_corrected_bases < 2 || self.quality_of_corrected_bases > MAX_QUAL_SCORE {
            return Err(ConfigError(format!(
                "quality_of_corrected_bases must be in [2, {}] but got {}",
                MAX_QUAL_SCORE, self.quality_of_corrected_bases
            )));
        }
        if self.min_observations_for_kmer_to_be_solid == 0 {
            return Err(ConfigError(
                "min_observations_for_kmer_to_be_solid must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Assembly-region discovery parameters.
#[derive(Debug, Clone)]
pub struct AssemblyRegionConfig {
    /// Smallest span an active or inactive region may keep.
    pub min_region_size: u64,
    /// Largest span a single active region may cover.
    pub max_region_size: u64,
    /// Symmetric padding added to every emitted region.
    pub region_padding: u64,
    /// Maximum distance activity probability propagates.
    pub max_prob_propagation_distance: u64,
    /// Probability above which a locus is active.
    pub active_prob_threshold: f64,
}

impl Default for AssemblyRegionConfig {
    fn default() -> Self {
        Self {
            min_region_size: 50,
            max_region_size: 300,
            region_padding: 100,
            max_prob_propagation_distance: 50,
            active_prob_threshold: 0.002,
        }
    }
}

impl AssemblyRegionConfig {
    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_region_size == 0 {
            return Err(ConfigError("min_region_size must be >= 1".into()));
        }
        if self.max_region_size < self.min_region_size {
            return Err(ConfigError(format!(
                "max_region_size ({}) must be >= min_region_size ({})",
                self.max_region_size, self.min_region_size
            )));
        }
        if !(0.0..=1.0).contains(&self.active_prob_threshold) {
            return Err(ConfigError(format!(
                "active_prob_threshold must be in [0, 1] but got {}",
                self.active_prob_threshold
            )));
        }
        if self.max_prob_propagation_distance == 0 {
            return Err(ConfigError(
                "max_prob_propagation_distance must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Shard subdivision parameters.
#[derive(Debug, Clone)]
pub struct ShardConfig {
    /// Shard length in bases; `None` keeps each traversal interval whole.
    pub shard_size: Option<u64>,
    /// Padding fetched around each shard.
    pub shard_padding: u64,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            shard_size: Some(5000),
            shard_padding: 100,
        }
    }
}

impl ShardConfig {
    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.shard_size == Some(0) {
            return Err(ConfigError("shard_size must be >= 1".into()));
        }
        Ok(())
    }
}

/// Annotation selection: groups and names to enable, names to exclude.
#[derive(Debug, Clone, Default)]
pub struct AnnotationConfig {
    /// Annotation group names to enable.
    pub groups_to_use: Vec<String>,
    /// Individual annotation names to enable.
    pub annotations_to_use: Vec<String>,
    /// Annotation names to exclude even if selected by a group.
    pub annotations_to_exclude: Vec<String>,
}

/// Top-level traversal parameters.
#[derive(Debug, Clone)]
pub struct TraversalConfig {
    /// Shard subdivision.
    pub shard: ShardConfig,
    /// Assembly-region discovery.
    pub region: AssemblyRegionConfig,
    /// K-mer error correction; `None` disables correction.
    pub error_correction: Option<ErrorCorrectionConfig>,
    /// Minimum mapping quality for the standard read filter stack.
    pub min_mapping_quality: u8,
    /// Cap on reads sharing one alignment start; `None` keeps all.
    pub max_reads_per_alignment_start: Option<usize>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        Self {
            shard: ShardConfig::default(),
            region: AssemblyRegionConfig::default(),
            error_correction: None,
            min_mapping_quality: 20,
            max_reads_per_alignment_start: None,
        }
    }
}

impl TraversalConfig {
    /// Validate every nested section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shard.validate()?;
        self.region.validate()?;
        if let Some(ec) = &self.error_correction {
            ec.validate()?;
        }
        if self.max_reads_per_alignment_start == Some(0) {
            return Err(ConfigError(
                "max_reads_per_alignment_start must be >= 1 when set".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_configs_validate() {
        assert!(TraversalConfig::default().validate().is_ok());
        assert!(ErrorCorrectionConfig::default().validate().is_ok());
        assert!(AssemblyRegionConfig::default().validate().is_ok());
    }

    #[test]
    fn bad_values_are_fatal() {
        let mut ec = ErrorCorrectionConfig::default();
        ec.quality_of_corrected_bases = 1;
        assert!(ec.validate().is_err());

        let mut region = AssemblyRegionConfig::default();
        region.max_region_size = 10;
        assert!(region.validate().is_err());
    }
}
