//! Read source collaborator interface.

use std::sync::Arc;

use crate::position::GenomeLocation;
use crate::reads::types::Read;

/// Source of aligned reads for a genomic interval.
///
/// Implementations must yield reads in reference-coordinate order,
/// deterministically for a given interval. File-format concerns live behind
/// this trait; the engine never touches a codec.
pub trait ReadSource {
    /// Reads whose aligned span overlaps `location`, coordinate-ordered.
    fn reads_overlapping(&self, location: &GenomeLocation) -> Vec<Arc<Read>>;
}

/// In-memory read source backed by a coordinate-sorted vector.
#[derive(Debug, Clone, Default)]
pub struct VecReadSource {
    reads: Vec<Arc<Read>>,
}

impl VecReadSource {
    /// Build from any read collection; reads are sorted by contig then start.
    pub fn new(mut reads: Vec<Read>) -> Self {
        reads.sort_by(|a, b| {
            a.contig()
                .cmp(b.contig())
                .then(a.start().cmp(&b.start()))
                .then(a.end().cmp(&b.end()))
        });
        Self {
            reads: reads.into_iter().map(Arc::new).collect(),
        }
    }

    /// Number of reads held.
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// True when no reads are held.
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }
}

impl ReadSource for VecReadSource {
    fn reads_overlapping(&self, location: &GenomeLocation) -> Vec<Arc<Read>> {
        self.reads
            .iter()
            .filter(|read| {
                read.location()
                    .map(|loc| loc.overlaps(location))
                    .unwrap_or(false)
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::types::{CigarOp, CigarOpKind, ReadFlags};

    fn read_at(contig: &str, start: u64) -> Read {
        Read::new(
            format!("r{start}"),
            "s",
            contig,
            start,
            60,
            vec![CigarOp::new(CigarOpKind::Match, 10)],
            vec![b'A'; 10],
            vec![30; 10],
            ReadFlags::default(),
        )
    }

    #[test]
    fn overlap_query_is_sorted_and_filtered() {
        let source = VecReadSource::new(vec![
            read_at("chr1", 500),
            read_at("chr1", 100),
            read_at("chr2", 100),
        ]);
        let loc = GenomeLocation::new("chr1", 95, 200).unwrap();
        let hits = source.reads_overlapping(&loc);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].start(), 100);
    }
}
