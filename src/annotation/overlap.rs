//! Known-variant membership annotation.
//!
//! Marks sites overlapping a known-variants set (setting the record ID from
//! the known variant) and flags membership in any additional named overlap
//! sets.

use std::collections::BTreeMap;

use crate::variant::{AttributeValue, VariantContext};

use super::{AnnotationError, DBSNP_KEY};

/// Annotates ID and overlap-set membership flags.
#[derive(Debug, Default)]
pub struct VariantOverlapAnnotator {
    known_variants: Vec<VariantContext>,
    overlap_sets: BTreeMap<String, Vec<VariantContext>>,
}

impl VariantOverlapAnnotator {
    /// Build from a known-variants set and named overlap sets.
    ///
    /// The reserved known-variants flag name must not be used as an overlap
    /// set name.
    pub fn new(
        known_variants: Vec<VariantContext>,
        overlap_sets: BTreeMap<String, Vec<VariantContext>>,
    ) -> Result<Self, AnnotationError> {
        if overlap_sets.contains_key(DBSNP_KEY) {
            return Err(AnnotationError::ReservedOverlapName(DBSNP_KEY.to_string()));
        }
        Ok(Self {
            known_variants,
            overlap_sets,
        })
    }

    /// Names of the configured overlap sets.
    pub fn overlap_names(&self) -> impl Iterator<Item = &str> {
        self.overlap_sets.keys().map(String::as_str)
    }

    /// Annotate a context with its known-variant ID and membership flags,
    /// returning a new context.
    pub fn annotate(&self, vc: VariantContext) -> VariantContext {
        let mut builder = vc.to_builder();
        let mut flagged_known = false;

        if let Some(known) = self
            .known_variants
            .iter()
            .find(|known| Self::matches_site(known, &vc))
        {
            if let Some(id) = known.id() {
                builder = builder.id(id);
            }
            builder = builder.attribute(DBSNP_KEY, AttributeValue::Flag);
            flagged_known = true;
        }

        for (name, set) in &self.overlap_sets {
            if set.iter().any(|known| Self::matches_site(known, &vc)) {
                builder = builder.attribute(name.clone(), AttributeValue::Flag);
            }
        }

        if !flagged_known {
            builder = builder.rm_attribute(DBSNP_KEY);
        }
        builder.build()
    }

    /// A known variant matches when it starts at the same position and
    /// shares the reference allele.
    fn matches_site(known: &VariantContext, vc: &VariantContext) -> bool {
        known.location().contig() == vc.location().contig()
            && known.location().start() == vc.location().start()
            && known.reference_allele() == vc.reference_allele()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::GenomeLocation;
    use crate::variant::Allele;

    fn site(pos: u64) -> VariantContext {
        VariantContext::builder(
            GenomeLocation::point("chr1", pos).unwrap(),
            vec![Allele::reference(b"A"), Allele::alternate(b"T")],
        )
        .build()
    }

    #[test]
    fn known_variant_sets_id_and_flag() {
        let known = site(100).to_builder().id("rs42").build();
        let annotator = VariantOverlapAnnotator::new(vec![known], BTreeMap::new()).unwrap();
        let annotated = annotator.annotate(site(100));
        assert_eq!(annotated.id(), Some("rs42"));
        assert!(annotated.has_attribute(DBSNP_KEY));

        let unannotated = annotator.annotate(site(200));
        assert_eq!(unannotated.id(), None);
        assert!(!unannotated.has_attribute(DBSNP_KEY));
    }

    #[test]
    fn overlap_sets_flag_membership() {
        let mut sets = BTreeMap::new();
        sets.insert("COMP1".to_string(), vec![site(100)]);
        let annotator = VariantOverlapAnnotator::new(Vec::new(), sets).unwrap();
        assert!(annotator.annotate(site(100)).has_attribute("COMP1"));
        assert!(!annotator.annotate(site(101)).has_attribute("COMP1"));
    }

    #[test]
    fn reserved_name_is_rejected() {
        let mut sets = BTreeMap::new();
        sets.insert(DBSNP_KEY.to_string(), Vec::new());
        assert!(VariantOverlapAnnotator::new(Vec::new(), sets).is_err());
    }
}
