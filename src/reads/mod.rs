//! Aligned reads: record model, filters, clipping, downsampling and
//! fragment-overlap quality adjustment.

mod clip;
mod downsampler;
mod filter;
mod fragment;
mod source;
mod types;

pub use clip::hard_clip_low_qual_ends;
pub use downsampler::PositionalDownsampler;
pub use filter::{
    CountingReadFilter, Mapped, MappingQualityAvailable, MinMappingQuality,
    NonZeroReferenceLengthAlignment, NotDuplicate, NotSecondaryAlignment,
    PassesVendorQualityCheck, ReadFilter, WellformedRead,
};
pub use fragment::{
    adjust_quals_of_overlapping_pair, adjust_quals_of_overlapping_paired_fragments, FragmentError,
};
pub use source::{ReadSource, VecReadSource};
pub use types::{CigarOp, CigarOpKind, Read, ReadCoordinate, ReadFlags, TagValue};
