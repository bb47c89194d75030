use crate::position::GenomeLocation;

/// Optional extra evidence attached to a locus state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ActivityProfileStateType {
    /// Nothing beyond the activity probability.
    None,
    /// Average number of high-quality soft-clipped bases at the locus,
    /// hinting at a nearby indel.
    HighQualitySoftClips(f64),
}

/// Per-locus activity observation: a single-base location and the
/// probability in `[0, 1]` that the locus needs reassembly.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityProfileState {
    loc: GenomeLocation,
    active_prob: f64,
    state_type: ActivityProfileStateType,
}

impl ActivityProfileState {
    /// State for a single-base location. Probabilities are clamped to
    /// `[0, 1]`.
    pub fn new(loc: GenomeLocation, active_prob: f64) -> Self {
        Self::with_type(loc, active_prob, ActivityProfileStateType::None)
    }

    /// State carrying extra per-locus evidence.
    pub fn with_type(
        loc: GenomeLocation,
        active_prob: f64,
        state_type: ActivityProfileStateType,
    ) -> Self {
        debug_assert_eq!(loc.size(), 1, "activity states are per-base");
        Self {
            loc,
            active_prob: active_prob.clamp(0.0, 1.0),
            state_type,
        }
    }

    /// The locus.
    pub fn loc(&self) -> &GenomeLocation {
        &self.loc
    }

    /// Probability the locus is active.
    pub fn active_prob(&self) -> f64 {
        self.active_prob
    }

    /// Extra evidence, if any.
    pub fn state_type(&self) -> ActivityProfileStateType {
        self.state_type
    }
}
