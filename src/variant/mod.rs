//! Variant records: alleles, genotypes and annotated variant contexts.
//!
//! A [`VariantContext`] is immutable once built; annotation always goes
//! through [`VariantContextBuilder`] and produces a new context, so partially
//! annotated records can never be observed.

mod vcf;

pub use vcf::{render_vcf, write_vcf};

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::position::GenomeLocation;

/// An allele: reference, alternate, or the no-call placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Allele {
    bases: Box<[u8]>,
    reference: bool,
}

impl Allele {
    /// Reference allele with the given bases.
    pub fn reference(bases: &[u8]) -> Self {
        Self {
            bases: bases.into(),
            reference: true,
        }
    }

    /// Alternate allele with the given bases.
    pub fn alternate(bases: &[u8]) -> Self {
        Self {
            bases: bases.into(),
            reference: false,
        }
    }

    /// The no-call placeholder allele, used to key site-level (allele
    /// independent) raw annotation values.
    pub fn no_call() -> Self {
        Self {
            bases: b".".as_slice().into(),
            reference: false,
        }
    }

    /// Allele bases.
    pub fn bases(&self) -> &[u8] {
        &self.bases
    }

    /// True for the reference allele.
    pub fn is_reference(&self) -> bool {
        self.reference
    }

    /// True for the no-call placeholder.
    pub fn is_no_call(&self) -> bool {
        !self.reference && self.bases.as_ref() == b"."
    }
}

impl fmt::Display for Allele {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bases))
    }
}

/// Attribute value stored in INFO or FORMAT maps.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    /// Integer value.
    Int(i64),
    /// Floating-point value.
    Float(f64),
    /// Free-text value.
    Text(String),
    /// List of integers.
    IntList(Vec<i64>),
    /// Presence flag.
    Flag,
}

impl AttributeValue {
    /// Integer view of the value, if it has one.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Float(v) => Some(*v as i64),
            Self::Text(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Text view of the value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v:.2}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::IntList(vs) => {
                let joined: Vec<String> = vs.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", joined.join(","))
            }
            Self::Flag => Ok(()),
        }
    }
}

/// A single sample's call at a site.
#[derive(Debug, Clone, PartialEq)]
pub struct Genotype {
    sample: Arc<str>,
    alleles: Vec<Allele>,
    depth: Option<u32>,
    allele_depths: Option<Vec<u32>>,
    genotype_quality: Option<u8>,
    attributes: BTreeMap<String, AttributeValue>,
}

impl Genotype {
    /// Construct a called genotype.
    pub fn new(sample: impl Into<Arc<str>>, alleles: Vec<Allele>) -> Self {
        Self {
            sample: sample.into(),
            alleles,
            depth: None,
            allele_depths: None,
            genotype_quality: None,
            attributes: BTreeMap::new(),
        }
    }

    /// Sample name.
    pub fn sample(&self) -> &Arc<str> {
        &self.sample
    }

    /// Called alleles.
    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    /// True when every called allele is the reference.
    pub fn is_hom_ref(&self) -> bool {
        !self.alleles.is_empty() && self.alleles.iter().all(Allele::is_reference)
    }

    /// Read depth (DP).
    pub fn depth(&self) -> Option<u32> {
        self.depth
    }

    /// Per-allele read depths (AD).
    pub fn allele_depths(&self) -> Option<&[u32]> {
        self.allele_depths.as_deref()
    }

    /// Genotype quality (GQ).
    pub fn genotype_quality(&self) -> Option<u8> {
        self.genotype_quality
    }

    /// Extended attribute lookup.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Rebuild with modifications.
    pub fn to_builder(&self) -> GenotypeBuilder {
        GenotypeBuilder {
            genotype: self.clone(),
        }
    }
}

/// Builder producing modified copies of a [`Genotype`].
#[derive(Debug, Clone)]
pub struct GenotypeBuilder {
    genotype: Genotype,
}

impl GenotypeBuilder {
    /// Start from a sample name and called alleles.
    pub fn new(sample: impl Into<Arc<str>>, alleles: Vec<Allele>) -> Self {
        Self {
            genotype: Genotype::new(sample, alleles),
        }
    }

    /// Set read depth (DP).
    pub fn depth(mut self, depth: u32) -> Self {
        self.genotype.depth = Some(depth);
        self
    }

    /// Set per-allele depths (AD).
    pub fn allele_depths(mut self, depths: Vec<u32>) -> Self {
        self.genotype.allele_depths = Some(depths);
        self
    }

    /// Set genotype quality (GQ).
    pub fn genotype_quality(mut self, gq: u8) -> Self {
        self.genotype.genotype_quality = Some(gq);
        self
    }

    /// Attach an extended attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.genotype.attributes.insert(key.into(), value);
        self
    }

    /// Finish the genotype.
    pub fn build(self) -> Genotype {
        self.genotype
    }
}

/// An annotated variant site.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantContext {
    location: GenomeLocation,
    id: Option<String>,
    alleles: Vec<Allele>,
    qual: Option<f64>,
    attributes: BTreeMap<String, AttributeValue>,
    genotypes: Vec<Genotype>,
}

impl VariantContext {
    /// Site location.
    pub fn location(&self) -> &GenomeLocation {
        &self.location
    }

    /// Variant identifier (e.g. an rsID), if known.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// All alleles, reference first.
    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    /// The reference allele.
    pub fn reference_allele(&self) -> Option<&Allele> {
        self.alleles.iter().find(|a| a.is_reference())
    }

    /// Alternate alleles in declaration order.
    pub fn alternate_alleles(&self) -> impl Iterator<Item = &Allele> {
        self.alleles.iter().filter(|a| !a.is_reference())
    }

    /// Site quality.
    pub fn qual(&self) -> Option<f64> {
        self.qual
    }

    /// INFO attribute lookup.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// True when the INFO map contains `key`.
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// All INFO attributes.
    pub fn attributes(&self) -> &BTreeMap<String, AttributeValue> {
        &self.attributes
    }

    /// Per-sample genotypes.
    pub fn genotypes(&self) -> &[Genotype] {
        &self.genotypes
    }

    /// Number of samples with genotypes.
    pub fn n_samples(&self) -> usize {
        self.genotypes.len()
    }

    /// Start a builder seeded from this context.
    pub fn to_builder(&self) -> VariantContextBuilder {
        VariantContextBuilder {
            context: self.clone(),
        }
    }

    /// Start a builder for a fresh site.
    pub fn builder(location: GenomeLocation, alleles: Vec<Allele>) -> VariantContextBuilder {
        VariantContextBuilder {
            context: VariantContext {
                location,
                id: None,
                alleles,
                qual: None,
                attributes: BTreeMap::new(),
                genotypes: Vec::new(),
            },
        }
    }
}

/// Builder producing new [`VariantContext`] values.
#[derive(Debug, Clone)]
pub struct VariantContextBuilder {
    context: VariantContext,
}

impl VariantContextBuilder {
    /// Set the identifier.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.context.id = Some(id.into());
        self
    }

    /// Set the site quality.
    pub fn qual(mut self, qual: f64) -> Self {
        self.context.qual = Some(qual);
        self
    }

    /// Attach one INFO attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.context.attributes.insert(key.into(), value);
        self
    }

    /// Replace the INFO attribute map.
    pub fn attributes(mut self, attributes: BTreeMap<String, AttributeValue>) -> Self {
        self.context.attributes = attributes;
        self
    }

    /// Remove one INFO attribute, if present.
    pub fn rm_attribute(mut self, key: &str) -> Self {
        self.context.attributes.remove(key);
        self
    }

    /// Replace the genotypes.
    pub fn genotypes(mut self, genotypes: Vec<Genotype>) -> Self {
        self.context.genotypes = genotypes;
        self
    }

    /// Finish the context.
    pub fn build(self) -> VariantContext {
        self.context
    }
}
