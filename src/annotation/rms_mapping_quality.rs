//! Root-mean-square mapping quality, the reducible annotation.
//!
//! Per shard, the raw statistic is the sum of squared mapping qualities of
//! the informative reads. Shard partials add; the finalize step divides by
//! the site's derived read count and takes the square root.

use std::collections::BTreeMap;

use crate::likelihood::ReadLikelihoods;
use crate::qual::MAPPING_QUALITY_UNAVAILABLE;
use crate::variant::{Allele, AttributeValue, VariantContext};

use super::{
    AnnotationError, AnnotationGroup, AttributeMap, InfoFieldAnnotation, RawValue,
    ReducibleAnnotation, ReducibleAnnotationData, VariantAnnotation, DEPTH_KEY, MIN_DP_KEY,
    RAW_RMS_MAPPING_QUALITY_KEY, RMS_MAPPING_QUALITY_KEY,
};

const GROUPS: &[AnnotationGroup] = &[AnnotationGroup::Standard, AnnotationGroup::MappingQuality];

/// RMS mapping quality across the reads supporting a site.
#[derive(Debug, Default, Clone, Copy)]
pub struct RmsMappingQuality;

impl RmsMappingQuality {
    fn square_sum(likelihoods: &ReadLikelihoods) -> f64 {
        (0..likelihoods.number_of_samples())
            .flat_map(|s| likelihoods.sample_reads(s).iter())
            .map(|read| read.mapq())
            .filter(|&mq| mq != MAPPING_QUALITY_UNAVAILABLE)
            .map(|mq| (mq as f64) * (mq as f64))
            .sum()
    }

    fn parse_raw(&self, raw: &str) -> Result<f64, AnnotationError> {
        // older producers appended per-allele fields after a comma; only the
        // first field is the square sum
        raw.split(',')
            .next()
            .and_then(|field| field.parse::<f64>().ok())
            .ok_or_else(|| AnnotationError::MalformedRawData {
                key: RAW_RMS_MAPPING_QUALITY_KEY.to_string(),
                value: raw.to_string(),
            })
    }

    /// Read count at a site: the DP attribute minus each hom-ref genotype's
    /// MIN_DP (or DP) contribution, since reference blocks carry no
    /// mapping-quality statistic.
    fn num_of_reads(&self, vc: &VariantContext) -> Result<i64, AnnotationError> {
        let missing = || AnnotationError::InvalidDepth {
            key: RAW_RMS_MAPPING_QUALITY_KEY.to_string(),
        };
        let mut num_reads = vc
            .attribute(DEPTH_KEY)
            .and_then(AttributeValue::as_i64)
            .ok_or_else(missing)?;
        for genotype in vc.genotypes() {
            if genotype.is_hom_ref() {
                if let Some(min_dp) = genotype.attribute(MIN_DP_KEY).and_then(AttributeValue::as_i64)
                {
                    num_reads -= min_dp;
                } else if let Some(dp) = genotype.depth() {
                    num_reads -= dp as i64;
                }
            }
        }
        if num_reads <= 0 {
            return Err(missing());
        }
        Ok(num_reads)
    }
}

impl VariantAnnotation for RmsMappingQuality {
    fn name(&self) -> &'static str {
        "RMSMappingQuality"
    }

    fn groups(&self) -> &'static [AnnotationGroup] {
        GROUPS
    }
}

impl InfoFieldAnnotation for RmsMappingQuality {
    fn key_names(&self) -> Vec<&'static str> {
        vec![RMS_MAPPING_QUALITY_KEY, RAW_RMS_MAPPING_QUALITY_KEY]
    }

    fn annotate(
        &self,
        vc: &VariantContext,
        likelihoods: Option<&ReadLikelihoods>,
    ) -> Result<AttributeMap, AnnotationError> {
        self.annotate_raw_data(vc, likelihoods)
    }

    fn as_reducible(&self) -> Option<&dyn ReducibleAnnotation> {
        Some(self)
    }
}

impl ReducibleAnnotation for RmsMappingQuality {
    fn raw_key_name(&self) -> &'static str {
        RAW_RMS_MAPPING_QUALITY_KEY
    }

    fn annotate_raw_data(
        &self,
        _vc: &VariantContext,
        likelihoods: Option<&ReadLikelihoods>,
    ) -> Result<AttributeMap, AnnotationError> {
        let Some(likelihoods) = likelihoods else {
            return Ok(AttributeMap::new());
        };
        if likelihoods.read_count() == 0 {
            return Ok(AttributeMap::new());
        }
        let square_sum = Self::square_sum(likelihoods);
        let mut annotations = AttributeMap::new();
        annotations.insert(
            RAW_RMS_MAPPING_QUALITY_KEY.to_string(),
            AttributeValue::Text(format!("{square_sum:.2}")),
        );
        Ok(annotations)
    }

    fn combine_raw_data(
        &self,
        _alleles: &[Allele],
        partials: &[ReducibleAnnotationData],
    ) -> Result<AttributeMap, AnnotationError> {
        let mut combined = 0.0f64;
        for partial in partials {
            let value = match partial.attribute(&Allele::no_call()) {
                Some(RawValue::Numeric(v)) => *v,
                _ => match partial.raw_data() {
                    Some(raw) => self.parse_raw(raw)?,
                    None => continue,
                },
            };
            combined += value;
        }
        let mut annotations = BTreeMap::new();
        annotations.insert(
            RAW_RMS_MAPPING_QUALITY_KEY.to_string(),
            AttributeValue::Text(format!("{combined:.2}")),
        );
        Ok(annotations)
    }

    fn finalize_raw_data(&self, vc: &VariantContext) -> Result<AttributeMap, AnnotationError> {
        let Some(raw) = vc.attribute(RAW_RMS_MAPPING_QUALITY_KEY) else {
            return Ok(AttributeMap::new());
        };
        let raw_string = match raw {
            AttributeValue::Text(s) => s.clone(),
            other => other.to_string(),
        };
        let square_sum = self.parse_raw(&raw_string)?;
        let num_reads = self.num_of_reads(vc)?;
        let rms = (square_sum / num_reads as f64).sqrt();
        let mut annotations = AttributeMap::new();
        annotations.insert(
            RMS_MAPPING_QUALITY_KEY.to_string(),
            AttributeValue::Text(format!("{rms:.2}")),
        );
        Ok(annotations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::GenomeLocation;
    use crate::variant::Genotype;

    fn site_with_depth(depth: i64) -> VariantContext {
        VariantContext::builder(
            GenomeLocation::point("chr1", 10).unwrap(),
            vec![Allele::reference(b"A"), Allele::alternate(b"T")],
        )
        .attribute(DEPTH_KEY, AttributeValue::Int(depth))
        .build()
    }

    #[test]
    fn finalize_computes_rms_from_raw_sum() {
        let vc = site_with_depth(4)
            .to_builder()
            .attribute(
                RAW_RMS_MAPPING_QUALITY_KEY,
                AttributeValue::Text("14400.00".into()),
            )
            .build();
        let result = RmsMappingQuality.finalize_raw_data(&vc).unwrap();
        // sqrt(14400 / 4) = 60
        assert_eq!(
            result.get(RMS_MAPPING_QUALITY_KEY),
            Some(&AttributeValue::Text("60.00".into()))
        );
    }

    #[test]
    fn malformed_raw_string_is_bad_input() {
        let vc = site_with_depth(4)
            .to_builder()
            .attribute(RAW_RMS_MAPPING_QUALITY_KEY, AttributeValue::Text("junk".into()))
            .build();
        let err = RmsMappingQuality.finalize_raw_data(&vc).unwrap_err();
        assert!(matches!(err, AnnotationError::MalformedRawData { .. }));
    }

    #[test]
    fn missing_depth_is_fatal() {
        let vc = VariantContext::builder(
            GenomeLocation::point("chr1", 10).unwrap(),
            vec![Allele::reference(b"A")],
        )
        .attribute(
            RAW_RMS_MAPPING_QUALITY_KEY,
            AttributeValue::Text("100.00".into()),
        )
        .build();
        assert!(matches!(
            RmsMappingQuality.finalize_raw_data(&vc),
            Err(AnnotationError::InvalidDepth { .. })
        ));
    }

    #[test]
    fn hom_ref_depth_is_subtracted() {
        let reference = Allele::reference(b"A");
        let vc = site_with_depth(10)
            .to_builder()
            .attribute(
                RAW_RMS_MAPPING_QUALITY_KEY,
                AttributeValue::Text("21600.00".into()),
            )
            .genotypes(vec![Genotype::new("s1", vec![reference.clone(), reference])
                .to_builder()
                .depth(4)
                .build()])
            .build();
        // 10 total minus 4 hom-ref reads leaves 6: sqrt(21600/6) = 60
        let result = RmsMappingQuality.finalize_raw_data(&vc).unwrap();
        assert_eq!(
            result.get(RMS_MAPPING_QUALITY_KEY),
            Some(&AttributeValue::Text("60.00".into()))
        );
    }

    #[test]
    fn missing_raw_key_is_skipped() {
        let result = RmsMappingQuality.finalize_raw_data(&site_with_depth(4)).unwrap();
        assert!(result.is_empty());
    }
}
