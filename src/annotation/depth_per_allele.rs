//! Per-sample allele depths (AD) from read likelihoods.

use crate::likelihood::ReadLikelihoods;
use crate::variant::{Genotype, GenotypeBuilder, VariantContext};

use super::{AnnotationError, AnnotationGroup, GenotypeAnnotation, VariantAnnotation};

const GROUPS: &[AnnotationGroup] = &[AnnotationGroup::Standard];

/// AD: reads supporting each allele for one sample, assigning every read to
/// its best-supported allele.
#[derive(Debug, Default, Clone, Copy)]
pub struct DepthPerAlleleBySample;

impl VariantAnnotation for DepthPerAlleleBySample {
    fn name(&self) -> &'static str {
        "DepthPerAlleleBySample"
    }

    fn groups(&self) -> &'static [AnnotationGroup] {
        GROUPS
    }
}

impl GenotypeAnnotation for DepthPerAlleleBySample {
    fn key_names(&self) -> Vec<&'static str> {
        vec!["AD"]
    }

    fn annotate(
        &self,
        _vc: &VariantContext,
        genotype: &Genotype,
        builder: GenotypeBuilder,
        likelihoods: Option<&ReadLikelihoods>,
    ) -> Result<GenotypeBuilder, AnnotationError> {
        let Some(likelihoods) = likelihoods else {
            return Ok(builder);
        };
        let Some(sample_index) = likelihoods.sample_index(genotype.sample()) else {
            return Ok(builder);
        };
        let depths = likelihoods.allele_depths_for_sample(sample_index);
        Ok(builder.allele_depths(depths))
    }
}
