//! Activity profile: per-locus probabilities smoothed by propagation.

use crate::config::AssemblyRegionConfig;

use super::state::ActivityProfileState;

/// Ordered per-locus activity states for one shard, with probability
/// propagation smoothing.
///
/// A locus with strong evidence raises its neighbors: probability `p`
/// contributes `p * d^k` to loci `k` bases away, up to the configured
/// propagation distance. The decay `d` is chosen so a full-strength signal
/// falls below the active threshold just past the propagation distance,
/// which keeps isolated spikes from activating arbitrarily wide spans.
#[derive(Debug)]
pub struct ActivityProfile {
    states: Vec<ActivityProfileState>,
    config: AssemblyRegionConfig,
}

impl ActivityProfile {
    /// Empty profile under the given region configuration.
    pub fn new(config: AssemblyRegionConfig) -> Self {
        Self {
            states: Vec::new(),
            config,
        }
    }

    /// Append the state for the next locus. States must arrive in
    /// reference order, one per base.
    pub fn add_state(&mut self, state: ActivityProfileState) {
        if let Some(last) = self.states.last() {
            debug_assert_eq!(
                last.loc().start() + 1,
                state.loc().start(),
                "activity states must be contiguous"
            );
        }
        self.states.push(state);
    }

    /// Number of loci recorded.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// True when no loci were recorded.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// The recorded states in order.
    pub fn states(&self) -> &[ActivityProfileState] {
        &self.states
    }

    /// Per-locus decay factor for one base of propagation distance.
    fn decay(&self) -> f64 {
        let threshold = self.config.active_prob_threshold;
        let distance = self.config.max_prob_propagation_distance as f64;
        if threshold <= 0.0 || threshold >= 1.0 {
            return 0.0;
        }
        threshold.powf(1.0 / distance)
    }

    /// Smoothed probability per locus: the maximum over all propagated
    /// contributions reaching it.
    pub fn smoothed_probabilities(&self) -> Vec<f64> {
        let n = self.states.len();
        let distance = self.config.max_prob_propagation_distance as usize;
        let decay = self.decay();
        let mut smoothed = vec![0.0f64; n];
        for (i, state) in self.states.iter().enumerate() {
            let p = state.active_prob();
            if p <= 0.0 {
                continue;
            }
            let lo = i.saturating_sub(distance);
            let hi = (i + distance).min(n.saturating_sub(1));
            for (j, slot) in smoothed.iter_mut().enumerate().take(hi + 1).skip(lo) {
                let k = i.abs_diff(j) as u32;
                let contribution = p * decay.powi(k as i32);
                if contribution > *slot {
                    *slot = contribution;
                }
            }
        }
        smoothed
    }

    /// Active/inactive classification after smoothing.
    pub fn classifications(&self) -> Vec<bool> {
        let threshold = self.config.active_prob_threshold;
        self.smoothed_probabilities()
            .into_iter()
            .map(|p| p > threshold)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::GenomeLocation;

    fn profile_with_probs(probs: &[f64]) -> ActivityProfile {
        let config = AssemblyRegionConfig {
            max_prob_propagation_distance: 3,
            active_prob_threshold: 0.1,
            ..AssemblyRegionConfig::default()
        };
        let mut profile = ActivityProfile::new(config);
        for (i, &p) in probs.iter().enumerate() {
            let loc = GenomeLocation::point("chr1", 100 + i as u64).unwrap();
            profile.add_state(ActivityProfileState::new(loc, p));
        }
        profile
    }

    #[test]
    fn spike_propagates_within_distance_only() {
        let profile = profile_with_probs(&[0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0]);
        let classes = profile.classifications();
        // a full-strength spike activates its neighborhood
        assert!(classes[1] && classes[2] && classes[3] && classes[4] && classes[5]);
        // but not past the propagation distance
        assert!(!classes[7]);
    }

    #[test]
    fn weak_signal_does_not_activate_neighbors() {
        let profile = profile_with_probs(&[0.0, 0.12, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
        let classes = profile.classifications();
        assert!(classes[1]);
        // 0.12 decays below the 0.1 threshold within a base or two
        assert!(!classes[4]);
    }

    #[test]
    fn quiet_profile_is_inactive() {
        let profile = profile_with_probs(&[0.0; 6]);
        assert!(profile.classifications().iter().all(|&c| !c));
    }
}
