//! The annotation engine: applies the resolved plugin set to called
//! variants and drives the reducible two-phase protocol across shards.

use std::collections::{BTreeMap, BTreeSet};

use crate::config::AnnotationConfig;
use crate::likelihood::ReadLikelihoods;
use crate::variant::{Allele, VariantContext};

use super::registry::{all_minus_excluded, resolve_annotations};
use super::{
    AnnotationError, AttributeMap, GenotypeAnnotation, InfoFieldAnnotation,
    ReducibleAnnotationData, VariantAnnotation, VariantOverlapAnnotator,
};

/// Applies a configured, non-overlapping set of annotation plugins.
///
/// Read-only after construction; one engine is shared across every region a
/// job processes.
pub struct VariantAnnotatorEngine {
    info_annotations: Vec<Box<dyn InfoFieldAnnotation>>,
    genotype_annotations: Vec<Box<dyn GenotypeAnnotation>>,
    reducible_raw_keys: BTreeSet<String>,
    overlap_annotator: Option<VariantOverlapAnnotator>,
}

impl VariantAnnotatorEngine {
    /// Engine over the selected annotations.
    pub fn of_selected(config: &AnnotationConfig) -> Result<Self, AnnotationError> {
        let (info_annotations, genotype_annotations) = resolve_annotations(config)?;
        let reducible_raw_keys = info_annotations
            .iter()
            .filter_map(|a| a.as_reducible())
            .map(|r| r.raw_key_name().to_string())
            .collect();
        Ok(Self {
            info_annotations,
            genotype_annotations,
            reducible_raw_keys,
            overlap_annotator: None,
        })
    }

    /// Engine over every known annotation minus the given exclusions.
    pub fn of_all_minus_excluded(
        annotations_to_exclude: Vec<String>,
    ) -> Result<Self, AnnotationError> {
        Self::of_selected(&all_minus_excluded(annotations_to_exclude))
    }

    /// Attach a known-variant/overlap annotator.
    pub fn with_overlap_annotator(mut self, annotator: VariantOverlapAnnotator) -> Self {
        self.overlap_annotator = Some(annotator);
        self
    }

    /// Names of the resolved info annotations, sorted.
    pub fn info_annotation_names(&self) -> Vec<&'static str> {
        self.info_annotations.iter().map(|a| a.name()).collect()
    }

    /// Names of the resolved genotype annotations, sorted.
    pub fn genotype_annotation_names(&self) -> Vec<&'static str> {
        self.genotype_annotations.iter().map(|a| a.name()).collect()
    }

    /// True when `key` is the raw key of a requested reducible annotation.
    pub fn is_requested_reducible_raw_key(&self, key: &str) -> bool {
        self.reducible_raw_keys.contains(key)
    }

    /// Annotate a variant context, returning a new context.
    ///
    /// Genotype annotations run first (gated by `predicate`), then info
    /// annotations over the genotype-updated context, then known-variant
    /// and overlap-set membership. The input context is never mutated.
    pub fn annotate_context(
        &self,
        vc: &VariantContext,
        likelihoods: Option<&ReadLikelihoods>,
        predicate: &dyn Fn(&dyn VariantAnnotation) -> bool,
    ) -> Result<VariantContext, AnnotationError> {
        let genotypes = self.annotate_genotypes(vc, likelihoods, predicate)?;
        let genotype_annotated = vc.to_builder().genotypes(genotypes).build();

        let mut info_attributes = genotype_annotated.attributes().clone();
        for annotation in &self.info_annotations {
            if !predicate(annotation.as_ref()) {
                continue;
            }
            let computed = annotation.annotate(&genotype_annotated, likelihoods)?;
            info_attributes.extend(computed);
        }

        let annotated = genotype_annotated
            .to_builder()
            .attributes(info_attributes)
            .build();

        Ok(match &self.overlap_annotator {
            Some(overlap) => overlap.annotate(annotated),
            None => annotated,
        })
    }

    fn annotate_genotypes(
        &self,
        vc: &VariantContext,
        likelihoods: Option<&ReadLikelihoods>,
        predicate: &dyn Fn(&dyn VariantAnnotation) -> bool,
    ) -> Result<Vec<crate::variant::Genotype>, AnnotationError> {
        if self.genotype_annotations.is_empty() {
            return Ok(vc.genotypes().to_vec());
        }
        let mut genotypes = Vec::with_capacity(vc.n_samples());
        for genotype in vc.genotypes() {
            let mut builder = genotype.to_builder();
            for annotation in &self.genotype_annotations {
                if predicate(annotation.as_ref()) {
                    builder = annotation.annotate(vc, genotype, builder, likelihoods)?;
                }
            }
            genotypes.push(builder.build());
        }
        Ok(genotypes)
    }

    /// Combine raw partial values for every requested reducible annotation.
    ///
    /// `raw_partials` maps raw keys to the per-shard partial values for one
    /// site; combined keys are removed from the map so callers can see
    /// which inputs were consumed. Returns the combined raw attributes.
    pub fn combine_annotations(
        &self,
        alleles: &[Allele],
        raw_partials: &mut BTreeMap<String, Vec<ReducibleAnnotationData>>,
    ) -> Result<AttributeMap, AnnotationError> {
        let mut combined = AttributeMap::new();
        for annotation in &self.info_annotations {
            if let Some(reducible) = annotation.as_reducible() {
                if let Some(partials) = raw_partials.remove(reducible.raw_key_name()) {
                    combined.extend(reducible.combine_raw_data(alleles, &partials)?);
                }
            }
        }
        Ok(combined)
    }

    /// Finalize reducible annotations on a combined context: each raw value
    /// is converted to its final statistic and the raw key is removed.
    pub fn finalize_annotations(
        &self,
        vc: VariantContext,
    ) -> Result<VariantContext, AnnotationError> {
        let mut attributes = vc.attributes().clone();
        for annotation in &self.info_annotations {
            if let Some(reducible) = annotation.as_reducible() {
                let finalized = reducible.finalize_raw_data(&vc)?;
                attributes.extend(finalized);
                attributes.remove(reducible.raw_key_name());
            }
        }
        Ok(vc.to_builder().attributes(attributes).build())
    }
}

impl std::fmt::Debug for VariantAnnotatorEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantAnnotatorEngine")
            .field("info_annotations", &self.info_annotation_names())
            .field("genotype_annotations", &self.genotype_annotation_names())
            .field("reducible_raw_keys", &self.reducible_raw_keys)
            .finish()
    }
}
