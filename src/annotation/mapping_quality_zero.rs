//! Count of mapping-quality-zero reads at a site.

use crate::likelihood::ReadLikelihoods;
use crate::variant::{AttributeValue, VariantContext};

use super::{
    AnnotationError, AnnotationGroup, AttributeMap, InfoFieldAnnotation, VariantAnnotation,
    MAPPING_QUALITY_ZERO_KEY,
};

const GROUPS: &[AnnotationGroup] = &[AnnotationGroup::Standard, AnnotationGroup::MappingQuality];

/// MQ0: how many of the site's reads are ambiguously mapped.
#[derive(Debug, Default, Clone, Copy)]
pub struct MappingQualityZero;

impl VariantAnnotation for MappingQualityZero {
    fn name(&self) -> &'static str {
        "MappingQualityZero"
    }

    fn groups(&self) -> &'static [AnnotationGroup] {
        GROUPS
    }
}

impl InfoFieldAnnotation for MappingQualityZero {
    fn key_names(&self) -> Vec<&'static str> {
        vec![MAPPING_QUALITY_ZERO_KEY]
    }

    fn annotate(
        &self,
        _vc: &VariantContext,
        likelihoods: Option<&ReadLikelihoods>,
    ) -> Result<AttributeMap, AnnotationError> {
        let Some(likelihoods) = likelihoods else {
            return Ok(AttributeMap::new());
        };
        let zeroes = (0..likelihoods.number_of_samples())
            .flat_map(|s| likelihoods.sample_reads(s).iter())
            .filter(|read| read.mapq() == 0)
            .count();
        let mut annotations = AttributeMap::new();
        annotations.insert(
            MAPPING_QUALITY_ZERO_KEY.to_string(),
            AttributeValue::Int(zeroes as i64),
        );
        Ok(annotations)
    }
}
