//! Hard clipping of low-quality read tails.

use super::types::{CigarOp, CigarOpKind, Read};

/// Hard-clip both ends of a read while base quality is below `min_tail_qual`.
///
/// Clipped bases are removed from the sequence and quality arrays and the
/// alignment start/CIGAR are adjusted for the reference bases consumed by
/// the removed prefix. A read that would lose every base is returned with an
/// empty sequence and its original start.
pub fn hard_clip_low_qual_ends(read: &Read, min_tail_qual: u8) -> Read {
    let quals = read.quals();
    let mut from = 0usize;
    while from < quals.len() && quals[from] < min_tail_qual {
        from += 1;
    }
    let mut to = quals.len();
    while to > from && quals[to - 1] < min_tail_qual {
        to -= 1;
    }
    if from == 0 && to == quals.len() {
        return read.clone();
    }
    clip_to_offsets(read, from, to)
}

/// Keep read offsets `[from, to)`, rewriting sequence, qualities, CIGAR and
/// alignment start.
fn clip_to_offsets(read: &Read, from: usize, to: usize) -> Read {
    let bases = read.bases()[from..to].to_vec();
    let quals = read.quals()[from..to].to_vec();

    let mut new_cigar: Vec<CigarOp> = Vec::with_capacity(read.cigar().len());
    let mut ref_shift = 0u64;
    let mut read_offset = 0usize;
    for op in read.cigar() {
        let op_read_len = if op.kind.consumes_read() { op.len as usize } else { 0 };
        let op_start = read_offset;
        let op_end = read_offset + op_read_len;
        read_offset = op_end;

        if op_read_len == 0 {
            if op.kind == CigarOpKind::Deletion {
                if op_start > from && op_start < to {
                    // deletions survive only when flanked by kept bases
                    new_cigar.push(*op);
                } else if op_start <= from {
                    // a deletion left of the cut still consumed reference
                    ref_shift += op.len as u64;
                }
            }
            continue;
        }

        let kept_start = op_start.max(from);
        let kept_end = op_end.min(to);
        if kept_start >= kept_end {
            // fully clipped; track reference consumption left of the cut
            if op_end <= from && op.kind.consumes_reference() {
                ref_shift += op.len as u64;
            }
            continue;
        }
        // partially clipped prefix of a reference-consuming op shifts start
        if op.kind.consumes_reference() {
            ref_shift += (kept_start - op_start) as u64;
        }
        new_cigar.push(CigarOp::new(op.kind, (kept_end - kept_start) as u32));
    }

    let mut flags = read.flags();
    flags.unmapped = flags.unmapped || new_cigar.is_empty();
    Read::new(
        read.name().clone(),
        read.sample().clone(),
        read.contig().clone(),
        read.start() + ref_shift,
        read.mapq(),
        new_cigar,
        bases,
        quals,
        flags,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::types::ReadFlags;

    fn read_with_quals(quals: Vec<u8>) -> Read {
        let len = quals.len();
        Read::new(
            "r",
            "s",
            "chr1",
            100,
            60,
            vec![CigarOp::new(CigarOpKind::Match, len as u32)],
            vec![b'A'; len],
            quals,
            ReadFlags::default(),
        )
    }

    #[test]
    fn clips_both_tails_and_shifts_start() {
        let read = read_with_quals(vec![2, 2, 30, 30, 30, 2]);
        let clipped = hard_clip_low_qual_ends(&read, 10);
        assert_eq!(clipped.len(), 3);
        assert_eq!(clipped.start(), 102);
        assert_eq!(clipped.end(), 104);
    }

    #[test]
    fn high_quality_read_is_untouched() {
        let read = read_with_quals(vec![30; 6]);
        let clipped = hard_clip_low_qual_ends(&read, 10);
        assert_eq!(clipped.len(), 6);
        assert_eq!(clipped.start(), 100);
    }

    #[test]
    fn fully_low_quality_read_becomes_empty() {
        let read = read_with_quals(vec![2; 4]);
        let clipped = hard_clip_low_qual_ends(&read, 10);
        assert!(clipped.is_empty());
    }
}
