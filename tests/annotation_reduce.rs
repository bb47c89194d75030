use std::collections::BTreeMap;

use locuscall::annotation::{
    ReducibleAnnotation, ReducibleAnnotationData, RmsMappingQuality, VariantAnnotatorEngine,
    DEPTH_KEY, RAW_RMS_MAPPING_QUALITY_KEY, RMS_MAPPING_QUALITY_KEY,
};
use locuscall::config::AnnotationConfig;
use locuscall::position::GenomeLocation;
use locuscall::variant::{Allele, AttributeValue, VariantContext};

fn partial(value: &str) -> ReducibleAnnotationData {
    ReducibleAnnotationData::from_raw_string(value)
}

fn combine(partials: &[ReducibleAnnotationData]) -> String {
    let alleles = [Allele::reference(b"A")];
    let combined = RmsMappingQuality
        .combine_raw_data(&alleles, partials)
        .unwrap();
    match combined.get(RAW_RMS_MAPPING_QUALITY_KEY) {
        Some(AttributeValue::Text(s)) => s.clone(),
        other => panic!("unexpected combined value {other:?}"),
    }
}

#[test]
fn combine_is_associative_across_groupings() {
    let a = partial("1600.00");
    let b = partial("2500.00");
    let c = partial("3600.00");

    // all at once
    let flat = combine(&[a.clone(), b.clone(), c.clone()]);
    // (a + b) + c
    let ab_then_c = combine(&[partial(&combine(&[a.clone(), b.clone()])), c.clone()]);
    // a + (b + c)
    let a_then_bc = combine(&[a.clone(), partial(&combine(&[b.clone(), c.clone()]))]);
    // commuted
    let reversed = combine(&[c, b, a]);

    assert_eq!(flat, ab_then_c);
    assert_eq!(flat, a_then_bc);
    assert_eq!(flat, reversed);
    assert_eq!(flat, "7700.00");
}

#[test]
fn grouping_does_not_change_the_finalized_statistic() {
    let a = partial("1600.00");
    let b = partial("2500.00");
    let c = partial("3600.00");

    let finalize = |raw: String| -> String {
        let vc = VariantContext::builder(
            GenomeLocation::point("chr1", 5).unwrap(),
            vec![Allele::reference(b"A"), Allele::alternate(b"G")],
        )
        .attribute(DEPTH_KEY, AttributeValue::Int(77))
        .attribute(RAW_RMS_MAPPING_QUALITY_KEY, AttributeValue::Text(raw))
        .build();
        let result = RmsMappingQuality.finalize_raw_data(&vc).unwrap();
        match result.get(RMS_MAPPING_QUALITY_KEY) {
            Some(AttributeValue::Text(s)) => s.clone(),
            other => panic!("unexpected finalized value {other:?}"),
        }
    };

    let flat = finalize(combine(&[a.clone(), b.clone(), c.clone()]));
    let grouped = finalize(combine(&[partial(&combine(&[a, b])), c]));
    assert_eq!(flat, grouped);
    // sqrt(7700 / 77) = 10
    assert_eq!(flat, "10.00");
}

#[test]
fn malformed_partial_fails_the_combine() {
    let result = RmsMappingQuality.combine_raw_data(
        &[Allele::reference(b"A")],
        &[partial("1600.00"), partial("not-a-number")],
    );
    assert!(result.is_err());
}

#[test]
fn engine_combine_consumes_only_requested_raw_keys() {
    let engine = VariantAnnotatorEngine::of_selected(&AnnotationConfig {
        groups_to_use: vec!["MappingQuality".into()],
        ..AnnotationConfig::default()
    })
    .unwrap();
    assert!(engine.is_requested_reducible_raw_key(RAW_RMS_MAPPING_QUALITY_KEY));

    let mut raw_partials = BTreeMap::new();
    raw_partials.insert(
        RAW_RMS_MAPPING_QUALITY_KEY.to_string(),
        vec![partial("100.00"), partial("200.00")],
    );
    raw_partials.insert("SOMETHING_ELSE".to_string(), vec![partial("1.00")]);

    let combined = engine
        .combine_annotations(&[Allele::reference(b"A")], &mut raw_partials)
        .unwrap();
    assert_eq!(
        combined.get(RAW_RMS_MAPPING_QUALITY_KEY),
        Some(&AttributeValue::Text("300.00".into()))
    );
    // unrelated keys are left for downstream handling
    assert!(raw_partials.contains_key("SOMETHING_ELSE"));
    assert!(!raw_partials.contains_key(RAW_RMS_MAPPING_QUALITY_KEY));
}
