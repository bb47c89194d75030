//! Shared builders for integration tests.

use std::sync::Arc;

use locuscall::reads::{CigarOp, CigarOpKind, Read, ReadFlags};

/// A simple fully-matched read.
#[allow(dead_code)]
pub fn matched_read(name: &str, sample: &str, contig: &str, start: u64, bases: &[u8]) -> Read {
    read_with_quals(name, sample, contig, start, bases, 30)
}

/// A fully-matched read with a uniform base quality.
#[allow(dead_code)]
pub fn read_with_quals(
    name: &str,
    sample: &str,
    contig: &str,
    start: u64,
    bases: &[u8],
    qual: u8,
) -> Read {
    Read::new(
        name,
        sample,
        contig,
        start,
        60,
        vec![CigarOp::new(CigarOpKind::Match, bases.len() as u32)],
        bases.to_vec(),
        vec![qual; bases.len()],
        ReadFlags::default(),
    )
}

/// Arc-wrapped variant of [`matched_read`].
#[allow(dead_code)]
pub fn shared_read(name: &str, sample: &str, contig: &str, start: u64, bases: &[u8]) -> Arc<Read> {
    Arc::new(matched_read(name, sample, contig, start, bases))
}
