//! Base-quality adjustment for overlapping paired-end mates.
//!
//! Two reads from the same physical fragment that overlap on the reference
//! carry the same evidence twice. To keep downstream likelihoods honest the
//! overlapping span is down-weighted: agreeing bases are capped at half the
//! PCR error quality, disagreeing bases are zeroed on both mates.

use thiserror::Error;

use crate::qual::HALF_OF_DEFAULT_PCR_ERROR_QUAL;
use crate::reads::types::Read;

/// Errors raised by fragment adjustment.
#[derive(Debug, Error)]
pub enum FragmentError {
    /// The two reads do not share a read name, so they cannot be mates.
    #[error("attempting to adjust two reads with different names: {first} vs {second}")]
    NameMismatch {
        /// Name of the left read.
        first: String,
        /// Name of the right read.
        second: String,
    },
    /// The unordered entry point was handed something other than two reads.
    #[error("found overlapping pair with {0} reads, but expecting exactly 2")]
    NotAPair(usize),
}

/// Adjust base qualities of two overlapping mates.
///
/// `first` must start no later than `second` by soft-clipped start; use
/// [`adjust_quals_of_overlapping_pair`] when the order is unknown. Reads on
/// different contigs or without overlap are left untouched. Matching
/// overlapping bases have both qualities capped at
/// [`HALF_OF_DEFAULT_PCR_ERROR_QUAL`]; disagreeing bases are set to quality
/// zero on both reads.
pub fn adjust_quals_of_overlapping_paired_fragments(
    first: &mut Read,
    second: &mut Read,
) -> Result<(), FragmentError> {
    if first.name() != second.name() {
        return Err(FragmentError::NameMismatch {
            first: first.name().to_string(),
            second: second.name().to_string(),
        });
    }

    // fragments that do not overlap need no adjustment
    if first.end() < second.start() || first.contig() != second.contig() {
        return Ok(());
    }

    let first_read_stop = match first.read_coordinate_for_reference_coordinate(second.start()) {
        Some(coord) => coord.offset + usize::from(coord.in_deletion),
        None => return Ok(()),
    };
    let num_overlapping = (first.len() - first_read_stop).min(second.len());

    let mut first_quals = first.quals().to_vec();
    let mut second_quals = second.quals().to_vec();

    for i in 0..num_overlapping {
        let first_index = first_read_stop + i;
        let first_base = first.bases()[first_index];
        let second_base = second.bases()[i];

        if first_base == second_base {
            first_quals[first_index] = first_quals[first_index].min(HALF_OF_DEFAULT_PCR_ERROR_QUAL);
            second_quals[i] = second_quals[i].min(HALF_OF_DEFAULT_PCR_ERROR_QUAL);
        } else {
            first_quals[first_index] = 0;
            second_quals[i] = 0;
        }
    }

    first.set_quals(first_quals);
    second.set_quals(second_quals);
    Ok(())
}

/// Unordered entry point: sorts the two mates by soft-clipped start before
/// adjusting.
pub fn adjust_quals_of_overlapping_pair(pair: &mut [Read]) -> Result<(), FragmentError> {
    if pair.len() != 2 {
        return Err(FragmentError::NotAPair(pair.len()));
    }
    let (left, right) = pair.split_at_mut(1);
    let first = &mut left[0];
    let second = &mut right[0];
    if second.soft_start() < first.soft_start() {
        adjust_quals_of_overlapping_paired_fragments(second, first)
    } else {
        adjust_quals_of_overlapping_paired_fragments(first, second)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reads::types::{CigarOp, CigarOpKind, ReadFlags};

    fn mate(name: &str, start: u64, bases: &[u8], qual: u8) -> Read {
        Read::new(
            name,
            "s",
            "chr1",
            start,
            60,
            vec![CigarOp::new(CigarOpKind::Match, bases.len() as u32)],
            bases.to_vec(),
            vec![qual; bases.len()],
            ReadFlags { paired: true, ..ReadFlags::default() },
        )
    }

    #[test]
    fn name_mismatch_is_fatal() {
        let mut a = mate("fragA", 100, b"ACGT", 30);
        let mut b = mate("fragB", 102, b"GTAA", 30);
        assert!(adjust_quals_of_overlapping_paired_fragments(&mut a, &mut b).is_err());
    }

    #[test]
    fn disjoint_mates_are_untouched() {
        let mut a = mate("frag", 100, b"ACGT", 30);
        let mut b = mate("frag", 500, b"ACGT", 30);
        adjust_quals_of_overlapping_paired_fragments(&mut a, &mut b).unwrap();
        assert_eq!(a.quals(), &[30; 4]);
        assert_eq!(b.quals(), &[30; 4]);
    }

    #[test]
    fn agreeing_overlap_caps_disagreeing_zeroes() {
        // AACCGT starting at 100, AACCGG starting at 102: 4-base overlap,
        // only the final overlapping base differs.
        let mut a = mate("frag", 100, b"AACCGT", 30);
        let mut b = mate("frag", 102, b"CCGGAT", 30);
        adjust_quals_of_overlapping_paired_fragments(&mut a, &mut b).unwrap();
        assert_eq!(a.quals()[..2], [30, 30]);
        assert_eq!(a.quals()[2..5], [HALF_OF_DEFAULT_PCR_ERROR_QUAL; 3]);
        assert_eq!(a.quals()[5], 0);
        assert_eq!(b.quals()[..3], [HALF_OF_DEFAULT_PCR_ERROR_QUAL; 3]);
        assert_eq!(b.quals()[3], 0);
        assert_eq!(b.quals()[4..], [30, 30]);
    }

    #[test]
    fn unordered_pair_is_sorted_by_soft_start() {
        let mut pair = vec![mate("frag", 102, b"CCGT", 30), mate("frag", 100, b"AACC", 30)];
        adjust_quals_of_overlapping_pair(&mut pair).unwrap();
        // overlap is the CC span of the later-starting read
        assert_eq!(pair[0].quals()[..2], [HALF_OF_DEFAULT_PCR_ERROR_QUAL; 2]);
    }
}
