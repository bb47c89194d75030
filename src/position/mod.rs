//! Genomic coordinates and contig metadata.
//!
//! Positions are 1-based and inclusive on both ends, matching the convention
//! of SAM/VCF records. A [`GenomeLocation`] is immutable once constructed and
//! is used to key shards, assembly regions and annotation queries.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised when constructing or expanding locations.
#[derive(Debug, Error)]
pub enum LocationError {
    /// Start/end pair violates the `start <= end` invariant.
    #[error("invalid location {contig}:{start}-{end}: start must be <= end and >= 1")]
    InvalidInterval {
        /// Contig of the rejected location.
        contig: String,
        /// Requested start.
        start: u64,
        /// Requested end.
        end: u64,
    },
    /// Contig is not present in the dictionary.
    #[error("unknown contig {0}")]
    UnknownContig(String),
}

/// A contig interval, 1-based and inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GenomeLocation {
    contig: Arc<str>,
    start: u64,
    end: u64,
}

impl GenomeLocation {
    /// Construct a location, enforcing `1 <= start <= end`.
    pub fn new(contig: impl Into<Arc<str>>, start: u64, end: u64) -> Result<Self, LocationError> {
        let contig = contig.into();
        if start == 0 || start > end {
            return Err(LocationError::InvalidInterval {
                contig: contig.to_string(),
                start,
                end,
            });
        }
        Ok(Self { contig, start, end })
    }

    /// Single-base location.
    pub fn point(contig: impl Into<Arc<str>>, pos: u64) -> Result<Self, LocationError> {
        Self::new(contig, pos, pos)
    }

    /// Contig name.
    pub fn contig(&self) -> &Arc<str> {
        &self.contig
    }

    /// Inclusive start coordinate.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Inclusive end coordinate.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// Number of bases covered.
    pub fn size(&self) -> u64 {
        self.end - self.start + 1
    }

    /// True when both locations are on the same contig and share a base.
    pub fn overlaps(&self, other: &GenomeLocation) -> bool {
        self.contig == other.contig && self.start <= other.end && other.start <= self.end
    }

    /// True when `other` lies entirely within this location.
    pub fn contains(&self, other: &GenomeLocation) -> bool {
        self.contig == other.contig && self.start <= other.start && other.end <= self.end
    }

    /// Symmetric expansion by `padding` bases, clamped to contig bounds.
    pub fn expand_within_contig(
        &self,
        padding: u64,
        dictionary: &ContigDictionary,
    ) -> Result<GenomeLocation, LocationError> {
        let contig_length = dictionary.length_of(&self.contig)?;
        let start = self.start.saturating_sub(padding).max(1);
        let end = (self.end + padding).min(contig_length);
        Ok(GenomeLocation {
            contig: Arc::clone(&self.contig),
            start,
            end,
        })
    }

    /// Intersection with another location on the same contig, if any.
    pub fn intersect(&self, other: &GenomeLocation) -> Option<GenomeLocation> {
        if !self.overlaps(other) {
            return None;
        }
        Some(GenomeLocation {
            contig: Arc::clone(&self.contig),
            start: self.start.max(other.start),
            end: self.end.min(other.end),
        })
    }
}

impl fmt::Display for GenomeLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}-{}", self.contig, self.start, self.end)
    }
}

/// Ordered mapping from contig name to contig length.
///
/// Ordering of contigs follows insertion order so coordinate-sorted output
/// can follow the reference dictionary, as SAM headers do.
#[derive(Debug, Clone, Default)]
pub struct ContigDictionary {
    lengths: BTreeMap<Arc<str>, u64>,
    order: Vec<Arc<str>>,
}

impl ContigDictionary {
    /// Empty dictionary.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(name, length)` pairs.
    pub fn from_contigs<I, S>(contigs: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<Arc<str>>,
    {
        let mut dict = Self::new();
        for (name, length) in contigs {
            dict.add(name, length);
        }
        dict
    }

    /// Register a contig. Re-adding a contig replaces its length.
    pub fn add(&mut self, name: impl Into<Arc<str>>, length: u64) {
        let name = name.into();
        if self.lengths.insert(Arc::clone(&name), length).is_none() {
            self.order.push(name);
        }
    }

    /// Length of a contig, or an error for unknown names.
    pub fn length_of(&self, name: &str) -> Result<u64, LocationError> {
        self.lengths
            .get(name)
            .copied()
            .ok_or_else(|| LocationError::UnknownContig(name.to_string()))
    }

    /// Contigs in insertion order.
    pub fn contigs(&self) -> impl Iterator<Item = &Arc<str>> {
        self.order.iter()
    }
}
