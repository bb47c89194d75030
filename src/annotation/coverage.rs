//! Total read depth at a site.

use crate::likelihood::ReadLikelihoods;
use crate::variant::{AttributeValue, VariantContext};

use super::{
    AnnotationError, AnnotationGroup, AttributeMap, InfoFieldAnnotation, VariantAnnotation,
    DEPTH_KEY,
};

const GROUPS: &[AnnotationGroup] = &[AnnotationGroup::Standard];

/// DP: the number of reads considered by the genotyper at this site.
#[derive(Debug, Default, Clone, Copy)]
pub struct Coverage;

impl VariantAnnotation for Coverage {
    fn name(&self) -> &'static str {
        "Coverage"
    }

    fn groups(&self) -> &'static [AnnotationGroup] {
        GROUPS
    }
}

impl InfoFieldAnnotation for Coverage {
    fn key_names(&self) -> Vec<&'static str> {
        vec![DEPTH_KEY]
    }

    fn annotate(
        &self,
        _vc: &VariantContext,
        likelihoods: Option<&ReadLikelihoods>,
    ) -> Result<AttributeMap, AnnotationError> {
        let mut annotations = AttributeMap::new();
        if let Some(likelihoods) = likelihoods {
            let depth = likelihoods.read_count();
            if depth > 0 {
                annotations.insert(DEPTH_KEY.to_string(), AttributeValue::Int(depth as i64));
            }
        }
        Ok(annotations)
    }
}
