//! Read filters applied before region discovery.
//!
//! The standard filter stack mirrors what a haplotype-calling traversal
//! applies up front: mapped, mapping-quality-available, above a minimum
//! mapping quality, primary, non-duplicate, vendor-passing, reference-
//! consuming, well-formed reads.

use tracing::debug;

use crate::qual::MAPPING_QUALITY_UNAVAILABLE;
use crate::reads::types::Read;

/// Predicate over reads.
pub trait ReadFilter {
    /// Stable filter name used in diagnostics.
    fn name(&self) -> &'static str;

    /// True when the read passes.
    fn test(&self, read: &Read) -> bool;
}

/// Read is mapped to the reference.
#[derive(Debug, Default)]
pub struct Mapped;

impl ReadFilter for Mapped {
    fn name(&self) -> &'static str {
        "Mapped"
    }

    fn test(&self, read: &Read) -> bool {
        !read.flags().unmapped
    }
}

/// Mapping quality is present.
#[derive(Debug, Default)]
pub struct MappingQualityAvailable;

impl ReadFilter for MappingQualityAvailable {
    fn name(&self) -> &'static str {
        "MappingQualityAvailable"
    }

    fn test(&self, read: &Read) -> bool {
        read.mapq() != MAPPING_QUALITY_UNAVAILABLE
    }
}

/// Mapping quality at or above a threshold.
#[derive(Debug)]
pub struct MinMappingQuality(pub u8);

impl ReadFilter for MinMappingQuality {
    fn name(&self) -> &'static str {
        "MinMappingQuality"
    }

    fn test(&self, read: &Read) -> bool {
        read.mapq() >= self.0
    }
}

/// Not a secondary alignment.
#[derive(Debug, Default)]
pub struct NotSecondaryAlignment;

impl ReadFilter for NotSecondaryAlignment {
    fn name(&self) -> &'static str {
        "NotSecondaryAlignment"
    }

    fn test(&self, read: &Read) -> bool {
        !read.flags().secondary
    }
}

/// Not flagged as a duplicate.
#[derive(Debug, Default)]
pub struct NotDuplicate;

impl ReadFilter for NotDuplicate {
    fn name(&self) -> &'static str {
        "NotDuplicate"
    }

    fn test(&self, read: &Read) -> bool {
        !read.flags().duplicate
    }
}

/// Passed the vendor quality check.
#[derive(Debug, Default)]
pub struct PassesVendorQualityCheck;

impl ReadFilter for PassesVendorQualityCheck {
    fn name(&self) -> &'static str {
        "PassesVendorQualityCheck"
    }

    fn test(&self, read: &Read) -> bool {
        !read.flags().fails_vendor_check
    }
}

/// At least one reference base is consumed by the alignment.
#[derive(Debug, Default)]
pub struct NonZeroReferenceLengthAlignment;

impl ReadFilter for NonZeroReferenceLengthAlignment {
    fn name(&self) -> &'static str {
        "NonZeroReferenceLengthAlignment"
    }

    fn test(&self, read: &Read) -> bool {
        read.cigar().iter().any(|op| op.kind.consumes_reference() && op.len > 0)
    }
}

/// CIGAR read length matches the sequence and quality arrays.
#[derive(Debug, Default)]
pub struct WellformedRead;

impl ReadFilter for WellformedRead {
    fn name(&self) -> &'static str {
        "WellformedRead"
    }

    fn test(&self, read: &Read) -> bool {
        let cigar_read_len: usize = read
            .cigar()
            .iter()
            .filter(|op| op.kind.consumes_read())
            .map(|op| op.len as usize)
            .sum();
        !read.is_empty()
            && cigar_read_len == read.len()
            && read.quals().len() == read.len()
            && read.start() >= 1
    }
}

/// Ordered filter stack that counts rejections per filter.
pub struct CountingReadFilter {
    filters: Vec<Box<dyn ReadFilter>>,
    rejected: Vec<u64>,
    passed: u64,
}

impl CountingReadFilter {
    /// Build from an ordered filter list.
    pub fn from_filters(filters: Vec<Box<dyn ReadFilter>>) -> Self {
        let n = filters.len();
        Self {
            filters,
            rejected: vec![0; n],
            passed: 0,
        }
    }

    /// The standard haplotype-calling filter stack.
    pub fn standard(min_mapping_quality: u8) -> Self {
        Self::from_filters(vec![
            Box::new(MinMappingQuality(min_mapping_quality)),
            Box::new(MappingQualityAvailable),
            Box::new(Mapped),
            Box::new(NotSecondaryAlignment),
            Box::new(NotDuplicate),
            Box::new(PassesVendorQualityCheck),
            Box::new(NonZeroReferenceLengthAlignment),
            Box::new(WellformedRead),
        ])
    }

    /// Apply all filters in order; the first rejection wins and is counted.
    pub fn test(&mut self, read: &Read) -> bool {
        for (i, filter) in self.filters.iter().enumerate() {
            if !filter.test(read) {
                self.rejected[i] += 1;
                return false;
            }
        }
        self.passed += 1;
        true
    }

    /// Reads that passed every filter.
    pub fn passed(&self) -> u64 {
        self.passed
    }

    /// Total rejected reads.
    pub fn total_rejected(&self) -> u64 {
        self.rejected.iter().sum()
    }

    /// Log per-filter rejection counts.
    pub fn log_summary(&self) {
        for (filter, &count) in self.filters.iter().zip(&self.rejected) {
            if count > 0 {
                debug!(filter = filter.name(), rejected = count, "read filter summary");
            }
        }
    }
}

impl std::fmt::Debug for CountingReadFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CountingReadFilter")
            .field("filters", &self.filters.iter().map(|x| x.name()).collect::<Vec<_>>())
            .field("rejected", &self.rejected)
            .field("passed", &self.passed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::types::{CigarOp, CigarOpKind, Read, ReadFlags};

    fn read_with(mapq: u8, flags: ReadFlags) -> Read {
        Read::new(
            "r",
            "s",
            "chr1",
            100,
            mapq,
            vec![CigarOp::new(CigarOpKind::Match, 4)],
            b"ACGT".to_vec(),
            vec![30; 4],
            flags,
        )
    }

    #[test]
    fn standard_stack_accepts_clean_read() {
        let mut filter = CountingReadFilter::standard(20);
        assert!(filter.test(&read_with(60, ReadFlags::default())));
        assert_eq!(filter.passed(), 1);
    }

    #[test]
    fn first_rejection_is_counted_once() {
        let mut filter = CountingReadFilter::standard(20);
        let dup = ReadFlags { duplicate: true, ..ReadFlags::default() };
        assert!(!filter.test(&read_with(10, dup)));
        // rejected on mapping quality before the duplicate flag is reached
        assert_eq!(filter.total_rejected(), 1);
    }

    #[test]
    fn malformed_read_is_rejected() {
        let mut filter = CountingReadFilter::standard(0);
        let mut read = read_with(60, ReadFlags::default());
        read.set_quals(vec![30; 2]);
        assert!(!filter.test(&read));
    }
}
