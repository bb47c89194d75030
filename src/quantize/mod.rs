//! Quality-score quantization by greedy penalty-minimizing interval merges.
//!
//! Starting from one leaf interval per raw quality score, adjacent intervals
//! are repeatedly merged — always the pair whose merge costs least — until
//! the requested number of top-level intervals remains. The merge history
//! forms a forest of intervals held in an index-based arena, so the tree can
//! be walked or serialized without reference cycles.
//!
//! The penalty of approximating a set of leaves with one merged error rate
//! `e` is `sum_i |log10(e_i) - log10(e)| * n_observations_i` over the leaf
//! intervals, with leaves at or below the "minimum interesting quality"
//! merging for free. This is a greedy search and is not guaranteed optimal;
//! the adjacent-pair scan runs left to right and the first minimum wins, so
//! results are deterministic.

use thiserror::Error;
use tracing::debug;

use crate::qual::{error_prob_to_qual, qual_to_error_prob};

/// Errors raised at quantizer construction. All of these indicate a usage
/// mistake and are fatal.
#[derive(Debug, Error)]
pub enum QuantizerError {
    /// The observation histogram contains a negative count.
    #[error("quality histogram has negative count {count} at quality {qual}")]
    NegativeCount {
        /// Quality with the bad count.
        qual: usize,
        /// The offending count.
        count: i64,
    },
    /// The observation histogram is empty.
    #[error("quality histogram must not be empty")]
    EmptyHistogram,
    /// The requested level count cannot be produced.
    #[error("nLevels must be in [1, {max}] but got {requested}")]
    InvalidLevelCount {
        /// Requested number of levels.
        requested: usize,
        /// Number of quality bins available.
        max: usize,
    },
}

/// A contiguous interval of quality scores, inclusive on both ends.
///
/// Leaves carry a fixed quality equal to their raw score; merged nodes own
/// their two children by arena index and report a Bayesian-smoothed quality
/// derived from pooled observation and error counts.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct QualInterval {
    /// Inclusive first quality of the interval.
    pub q_start: usize,
    /// Inclusive last quality of the interval.
    pub q_end: usize,
    /// Observations pooled across the interval.
    pub n_observations: u64,
    /// Expected errors pooled across the interval.
    pub n_errors: u64,
    /// Present on leaves: the quality reported verbatim.
    pub fixed_qual: Option<u8>,
    /// Tree height: leaves are 0, a merge is one above its taller child.
    pub level: usize,
    /// Sequence number of the merge that created this node (0 for leaves).
    pub merge_order: usize,
    /// Arena indices of the two merged children, absent on leaves.
    pub children: Option<(usize, usize)>,
}

impl QualInterval {
    /// Error rate of this interval in real space.
    ///
    /// Fixed-quality leaves report their Phred-implied rate; merged nodes
    /// report the add-one smoothed rate `(n_errors + 1) / (n_observations
    /// + 1)`; an interval with no observations has rate zero.
    pub fn error_rate(&self) -> f64 {
        if let Some(fixed) = self.fixed_qual {
            qual_to_error_prob(fixed)
        } else if self.n_observations == 0 {
            0.0
        } else {
            (self.n_errors + 1) as f64 / (self.n_observations + 1) as f64
        }
    }

    /// Quantized quality this interval reports for every raw quality in it.
    pub fn qual(&self) -> u8 {
        match self.fixed_qual {
            Some(fixed) => fixed,
            None => error_prob_to_qual(self.error_rate()),
        }
    }

    /// Human-readable interval name, e.g. `10-12`.
    pub fn name(&self) -> String {
        format!("{}-{}", self.q_start, self.q_end)
    }
}

/// Greedy quality-score quantizer.
///
/// Constructing the quantizer runs the full merge; afterwards the
/// original-to-quantized map and the merge forest are available.
#[derive(Debug)]
pub struct QualityQuantizer {
    arena: Vec<QualInterval>,
    top_level: Vec<usize>,
    n_levels: usize,
    min_interesting_qual: usize,
    original_to_quantized: Vec<u8>,
    merges_done: usize,
}

impl QualityQuantizer {
    /// Quantize `n_observations_per_qual` down to `n_levels` distinct
    /// quality values.
    ///
    /// The histogram must start at quality 0 and cover every quality up to
    /// the largest observed one; zero-count bins are fine and quantize for
    /// free. Qualities at or below `min_interesting_qual` merge without
    /// penalty.
    pub fn new(
        n_observations_per_qual: &[i64],
        n_levels: usize,
        min_interesting_qual: usize,
    ) -> Result<Self, QuantizerError> {
        if n_observations_per_qual.is_empty() {
            return Err(QuantizerError::EmptyHistogram);
        }
        if let Some((qual, &count)) = n_observations_per_qual
            .iter()
            .enumerate()
            .find(|&(_, &c)| c < 0)
        {
            return Err(QuantizerError::NegativeCount { qual, count });
        }
        if n_levels == 0 || n_levels > n_observations_per_qual.len() {
            return Err(QuantizerError::InvalidLevelCount {
                requested: n_levels,
                max: n_observations_per_qual.len(),
            });
        }

        let mut quantizer = Self {
            arena: Vec::with_capacity(2 * n_observations_per_qual.len()),
            top_level: Vec::with_capacity(n_observations_per_qual.len()),
            n_levels,
            min_interesting_qual,
            original_to_quantized: Vec::new(),
            merges_done: 0,
        };

        for (qual, &count) in n_observations_per_qual.iter().enumerate() {
            let n_obs = count as u64;
            let error_rate = qual_to_error_prob(qual as u8);
            let n_errors = (n_obs as f64 * error_rate).floor() as u64;
            quantizer.arena.push(QualInterval {
                q_start: qual,
                q_end: qual,
                n_observations: n_obs,
                n_errors,
                fixed_qual: Some(qual.min(u8::MAX as usize) as u8),
                level: 0,
                merge_order: 0,
                children: None,
            });
            quantizer.top_level.push(qual);
        }

        quantizer.quantize();
        quantizer.original_to_quantized = quantizer.intervals_to_map();
        Ok(quantizer)
    }

    /// Map from raw quality (index) to quantized quality (value). Total over
    /// the histogram range; every raw quality maps to exactly one interval.
    pub fn original_to_quantized_map(&self) -> &[u8] {
        &self.original_to_quantized
    }

    /// Arena indices of the remaining top-level intervals, ascending by
    /// quality.
    pub fn top_level_intervals(&self) -> &[usize] {
        &self.top_level
    }

    /// Interval node by arena index.
    pub fn interval(&self, index: usize) -> &QualInterval {
        &self.arena[index]
    }

    /// Greedy merge loop: merge the lowest-penalty adjacent pair until only
    /// `n_levels` top-level intervals remain.
    fn quantize(&mut self) {
        while self.top_level.len() > self.n_levels {
            self.merge_lowest_penalty_pair();
        }
    }

    fn merge_lowest_penalty_pair(&mut self) {
        debug!(intervals = self.top_level.len(), "scanning for lowest-penalty merge");
        let mut min_penalty = f64::INFINITY;
        let mut min_pair = 0usize;
        for pair in 0..self.top_level.len() - 1 {
            let left = self.top_level[pair];
            let right = self.top_level[pair + 1];
            let penalty = self.merge_penalty(left, right);
            if penalty < min_penalty {
                min_penalty = penalty;
                min_pair = pair;
            }
        }

        let left = self.top_level[min_pair];
        let right = self.top_level[min_pair + 1];
        let merged = self.merge_nodes(left, right);
        debug!(
            left = %self.arena[left].name(),
            right = %self.arena[right].name(),
            penalty = min_penalty,
            "merging interval pair"
        );
        self.top_level[min_pair] = merged;
        self.top_level.remove(min_pair + 1);
    }

    /// Create the merged node for two adjacent top-level intervals.
    fn merge_nodes(&mut self, left: usize, right: usize) -> usize {
        let (l, r) = (&self.arena[left], &self.arena[right]);
        debug_assert_eq!(l.q_end + 1, r.q_start, "merging non-contiguous intervals");
        self.merges_done += 1;
        let node = QualInterval {
            q_start: l.q_start,
            q_end: r.q_end,
            n_observations: l.n_observations + r.n_observations,
            n_errors: l.n_errors + r.n_errors,
            fixed_qual: None,
            level: l.level.max(r.level) + 1,
            merge_order: self.merges_done,
            children: Some((left, right)),
        };
        self.arena.push(node);
        self.arena.len() - 1
    }

    /// Penalty of merging two adjacent intervals, evaluated against the
    /// pooled error rate of the would-be merge.
    fn merge_penalty(&self, left: usize, right: usize) -> f64 {
        let (l, r) = (&self.arena[left], &self.arena[right]);
        let n_observations = l.n_observations + r.n_observations;
        if n_observations == 0 {
            return 0.0;
        }
        let merged_rate = (l.n_errors + r.n_errors + 1) as f64 / (n_observations + 1) as f64;
        self.subtree_penalty(left, merged_rate) + self.subtree_penalty(right, merged_rate)
    }

    /// Penalty contribution of all leaves under `index` against a global
    /// error rate.
    fn subtree_penalty(&self, index: usize, global_error_rate: f64) -> f64 {
        if global_error_rate == 0.0 {
            return 0.0;
        }
        let node = &self.arena[index];
        match node.children {
            Some((left, right)) => {
                self.subtree_penalty(left, global_error_rate)
                    + self.subtree_penalty(right, global_error_rate)
            }
            None => {
                if node.q_end <= self.min_interesting_qual {
                    // free to merge up quality scores below the smallest
                    // interesting one
                    0.0
                } else {
                    (node.error_rate().log10() - global_error_rate.log10()).abs()
                        * node.n_observations as f64
                }
            }
        }
    }

    fn intervals_to_map(&self) -> Vec<u8> {
        let n_quals = self
            .top_level
            .iter()
            .map(|&i| self.arena[i].q_end + 1)
            .max()
            .unwrap_or(0);
        let mut map = vec![0u8; n_quals];
        for &index in &self.top_level {
            let interval = &self.arena[index];
            let qual = interval.qual();
            for q in interval.q_start..=interval.q_end {
                map[q] = qual;
            }
        }
        map
    }

    /// Text report of the merge forest, one row per interval node, roots
    /// first.
    pub fn report(&self) -> String {
        let mut out = String::from(
            "name\tqStart\tqEnd\tlevel\tmergeOrder\tnErrors\tnObservations\tqual\troot\n",
        );
        for &root in &self.top_level {
            self.report_interval(root, true, &mut out);
        }
        out
    }

    fn report_interval(&self, index: usize, is_root: bool, out: &mut String) {
        let node = &self.arena[index];
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
            node.name(),
            node.q_start,
            node.q_end,
            node.level,
            node.merge_order,
            node.n_errors,
            node.n_observations,
            node.qual(),
            is_root
        ));
        if let Some((left, right)) = node.children {
            self.report_interval(left, false, out);
            self.report_interval(right, false, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_counts_are_fatal() {
        let err = QualityQuantizer::new(&[10, -1, 10], 2, 0).unwrap_err();
        assert!(matches!(err, QuantizerError::NegativeCount { qual: 1, count: -1 }));
    }

    #[test]
    fn zero_levels_is_fatal() {
        assert!(QualityQuantizer::new(&[10, 10], 0, 0).is_err());
        assert!(QualityQuantizer::new(&[10, 10], 3, 0).is_err());
    }

    #[test]
    fn uniform_histogram_splits_at_free_boundary() {
        // qualities 0-2 merge for free, the rest merge by penalty
        let quantizer = QualityQuantizer::new(&[100, 100, 100, 100, 100], 2, 2).unwrap();
        let tops = quantizer.top_level_intervals();
        assert_eq!(tops.len(), 2);
        let first = quantizer.interval(tops[0]);
        let second = quantizer.interval(tops[1]);
        assert_eq!(first.q_start, 0);
        assert_eq!(second.q_end, 4);
        assert_eq!(first.q_end + 1, second.q_start);
    }

    #[test]
    fn map_is_total_over_histogram() {
        let quantizer = QualityQuantizer::new(&[5, 0, 7, 100, 0, 40, 40, 2], 3, 2).unwrap();
        let map = quantizer.original_to_quantized_map();
        assert_eq!(map.len(), 8);
        let tops = quantizer.top_level_intervals();
        assert_eq!(tops.len(), 3);
        for (q, &quantized) in map.iter().enumerate() {
            let owner = tops
                .iter()
                .map(|&i| quantizer.interval(i))
                .find(|node| node.q_start <= q && q <= node.q_end)
                .expect("every quality falls in exactly one interval");
            assert_eq!(quantized, owner.qual());
        }
    }

    #[test]
    fn single_level_merges_everything() {
        let quantizer = QualityQuantizer::new(&[1, 2, 3, 4], 1, 0).unwrap();
        let tops = quantizer.top_level_intervals();
        assert_eq!(tops.len(), 1);
        let root = quantizer.interval(tops[0]);
        assert_eq!((root.q_start, root.q_end), (0, 3));
        assert_eq!(root.n_observations, 10);
    }

    #[test]
    fn merge_levels_and_order_are_recorded() {
        let quantizer = QualityQuantizer::new(&[10, 10, 10, 10], 1, 0).unwrap();
        let root = quantizer.interval(quantizer.top_level_intervals()[0]);
        assert_eq!(root.merge_order, 3);
        assert!(root.level >= 1);
        let (left, right) = root.children.expect("root is a merge");
        assert!(quantizer.interval(left).merge_order < root.merge_order);
        assert!(quantizer.interval(right).merge_order < root.merge_order);
    }

    #[test]
    fn report_includes_all_roots() {
        let quantizer = QualityQuantizer::new(&[100, 100, 100, 100, 100], 2, 2).unwrap();
        let report = quantizer.report();
        assert!(report.lines().count() > 2);
        assert!(report.contains("true"));
    }
}
