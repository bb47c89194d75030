//! Genomic shards: traversal intervals plus padding with lazy read access.
//!
//! A shard owns its primary interval and an expanded, padded interval; reads
//! are fetched from the source only when first requested and are released
//! with the shard. Shards are consumed sequentially and independently, one
//! distributed task each.

use std::sync::Arc;

use crate::position::{ContigDictionary, GenomeLocation, LocationError};
use crate::reads::{Read, ReadSource};

/// A traversal interval with padding and lazy reads.
pub struct Shard<'a> {
    interval: GenomeLocation,
    padded_interval: GenomeLocation,
    source: &'a dyn ReadSource,
    cached_reads: Option<Vec<Arc<Read>>>,
}

impl<'a> Shard<'a> {
    /// Construct a shard over `interval`, fetching reads over
    /// `padded_interval`.
    pub fn new(
        interval: GenomeLocation,
        padded_interval: GenomeLocation,
        source: &'a dyn ReadSource,
    ) -> Self {
        Self {
            interval,
            padded_interval,
            source,
            cached_reads: None,
        }
    }

    /// Primary interval (padding excluded).
    pub fn interval(&self) -> &GenomeLocation {
        &self.interval
    }

    /// Padded interval reads are fetched over.
    pub fn padded_interval(&self) -> &GenomeLocation {
        &self.padded_interval
    }

    /// Reads overlapping the padded interval, coordinate-ordered. Fetched
    /// lazily on first call and cached for the shard's lifetime.
    pub fn reads(&mut self) -> &[Arc<Read>] {
        if self.cached_reads.is_none() {
            self.cached_reads = Some(self.source.reads_overlapping(&self.padded_interval));
        }
        self.cached_reads.as_deref().unwrap_or(&[])
    }
}

impl std::fmt::Debug for Shard<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shard")
            .field("interval", &self.interval)
            .field("padded_interval", &self.padded_interval)
            .field("reads_fetched", &self.cached_reads.is_some())
            .finish()
    }
}

/// Subdivide `interval` into consecutive shards of at most `shard_size`
/// bases, each padded by `shard_padding` clamped to contig bounds.
pub fn divide_interval_into_shards<'a>(
    interval: &GenomeLocation,
    shard_size: u64,
    shard_padding: u64,
    source: &'a dyn ReadSource,
    dictionary: &ContigDictionary,
) -> Result<Vec<Shard<'a>>, LocationError> {
    assert!(shard_size >= 1, "shard_size must be >= 1");
    let mut shards = Vec::new();
    let mut start = interval.start();
    while start <= interval.end() {
        let end = (start + shard_size - 1).min(interval.end());
        let primary = GenomeLocation::new(Arc::clone(interval.contig()), start, end)?;
        let padded = primary.expand_within_contig(shard_padding, dictionary)?;
        shards.push(Shard::new(primary, padded, source));
        start = end + 1;
    }
    Ok(shards)
}

/// Build a single shard covering `interval` with the given padding.
pub fn single_shard<'a>(
    interval: &GenomeLocation,
    shard_padding: u64,
    source: &'a dyn ReadSource,
    dictionary: &ContigDictionary,
) -> Result<Shard<'a>, LocationError> {
    let padded = interval.expand_within_contig(shard_padding, dictionary)?;
    Ok(Shard::new(interval.clone(), padded, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::VecReadSource;

    #[test]
    fn subdivision_covers_interval_without_overlap() {
        let source = VecReadSource::default();
        let dict = ContigDictionary::from_contigs([("chr1", 10_000u64)]);
        let interval = GenomeLocation::new("chr1", 1, 2500).unwrap();
        let shards = divide_interval_into_shards(&interval, 1000, 100, &source, &dict).unwrap();
        assert_eq!(shards.len(), 3);
        assert_eq!(shards[0].interval().start(), 1);
        assert_eq!(shards[0].interval().end(), 1000);
        assert_eq!(shards[2].interval().start(), 2001);
        assert_eq!(shards[2].interval().end(), 2500);
        // padding is clamped at the contig start
        assert_eq!(shards[0].padded_interval().start(), 1);
        assert_eq!(shards[1].padded_interval().start(), 901);
    }
}
