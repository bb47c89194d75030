//! Positional downsampling of coordinate-sorted reads.

use crate::reads::types::Read;

/// Caps the number of reads sharing an alignment start.
///
/// Operates on a coordinate-sorted stream: reads at the same
/// (contig, start) beyond the cap are dropped, everything else passes
/// through unchanged.
#[derive(Debug)]
pub struct PositionalDownsampler {
    max_reads_per_alignment_start: usize,
    current_key: Option<(String, u64)>,
    current_count: usize,
    dropped: u64,
}

impl PositionalDownsampler {
    /// `max_reads_per_alignment_start` must be >= 1; use no downsampler at
    /// all to keep every read.
    pub fn new(max_reads_per_alignment_start: usize) -> Self {
        Self {
            max_reads_per_alignment_start: max_reads_per_alignment_start.max(1),
            current_key: None,
            current_count: 0,
            dropped: 0,
        }
    }

    /// True when the read survives downsampling.
    pub fn accept(&mut self, read: &Read) -> bool {
        let key = (read.contig().to_string(), read.start());
        if self.current_key.as_ref() != Some(&key) {
            self.current_key = Some(key);
            self.current_count = 0;
        }
        self.current_count += 1;
        if self.current_count > self.max_reads_per_alignment_start {
            self.dropped += 1;
            false
        } else {
            true
        }
    }

    /// Reads dropped so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::types::{CigarOp, CigarOpKind, Read, ReadFlags};

    fn read_at(start: u64) -> Read {
        Read::new(
            "r",
            "s",
            "chr1",
            start,
            60,
            vec![CigarOp::new(CigarOpKind::Match, 4)],
            b"ACGT".to_vec(),
            vec![30; 4],
            ReadFlags::default(),
        )
    }

    #[test]
    fn caps_reads_per_start() {
        let mut ds = PositionalDownsampler::new(2);
        assert!(ds.accept(&read_at(100)));
        assert!(ds.accept(&read_at(100)));
        assert!(!ds.accept(&read_at(100)));
        assert!(ds.accept(&read_at(101)));
        assert_eq!(ds.dropped(), 1);
    }
}
