use proptest::prelude::*;

use locuscall::quantize::QualityQuantizer;

proptest! {
    #[test]
    fn quantizer_always_returns_exactly_n_levels(
        histogram in proptest::collection::vec(0i64..10_000, 1..40),
        levels_seed in 0usize..40,
        min_interesting in 0usize..10,
    ) {
        let n_levels = 1 + levels_seed % histogram.len();
        let quantizer = QualityQuantizer::new(&histogram, n_levels, min_interesting)
            .expect("valid inputs must quantize");

        prop_assert_eq!(quantizer.top_level_intervals().len(), n_levels);
    }

    #[test]
    fn map_is_total_and_onto_the_interval_set(
        histogram in proptest::collection::vec(0i64..10_000, 1..40),
        levels_seed in 0usize..40,
    ) {
        let n_levels = 1 + levels_seed % histogram.len();
        let quantizer = QualityQuantizer::new(&histogram, n_levels, 2)
            .expect("valid inputs must quantize");
        let map = quantizer.original_to_quantized_map();

        prop_assert_eq!(map.len(), histogram.len());

        // top-level intervals tile the quality range without gaps
        let mut expected_start = 0usize;
        for &index in quantizer.top_level_intervals() {
            let interval = quantizer.interval(index);
            prop_assert_eq!(interval.q_start, expected_start);
            expected_start = interval.q_end + 1;
            // every quality in the interval maps to the interval's qual
            for q in interval.q_start..=interval.q_end {
                prop_assert_eq!(map[q], interval.qual());
            }
        }
        prop_assert_eq!(expected_start, histogram.len());
    }
}
