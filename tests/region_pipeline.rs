mod common;

use common::matched_read;
use locuscall::annotation::{
    VariantAnnotatorEngine, DEPTH_KEY, RAW_RMS_MAPPING_QUALITY_KEY, RMS_MAPPING_QUALITY_KEY,
};
use locuscall::config::TraversalConfig;
use locuscall::position::GenomeLocation;
use locuscall::reads::VecReadSource;
use locuscall::reference::InMemoryReference;
use locuscall::traversal::{
    MismatchActivityEvaluator, PileupRegionCaller, Traversal, VecVariantWriter,
};
use locuscall::variant::AttributeValue;

/// 300 bp of repeating ACGT.
fn reference_sequence() -> Vec<u8> {
    b"ACGT".iter().copied().cycle().take(300).collect()
}

/// Reads covering positions 101-140 with a shared mismatch at position 120.
fn variant_reads(reference: &[u8]) -> Vec<locuscall::reads::Read> {
    let mut bases = reference[100..140].to_vec();
    let variant_offset = 19; // reference position 120
    bases[variant_offset] = if bases[variant_offset] == b'T' { b'A' } else { b'T' };
    (0..8)
        .map(|i| matched_read(&format!("r{i}"), "sample1", "chr1", 101, &bases))
        .collect()
}

#[test]
fn end_to_end_traversal_calls_and_annotates_the_variant() {
    let sequence = reference_sequence();
    let reference = InMemoryReference::from_contigs([("chr1", sequence.clone())]);
    let source = VecReadSource::new(variant_reads(&sequence));
    let interval = GenomeLocation::new("chr1", 1, 300).unwrap();

    let mut config = TraversalConfig::default();
    config.shard.shard_size = Some(150);
    config.shard.shard_padding = 20;

    let annotator = VariantAnnotatorEngine::of_all_minus_excluded(Vec::new()).unwrap();
    let evaluator = MismatchActivityEvaluator::new(&reference);
    let caller = PileupRegionCaller::default();
    let traversal =
        Traversal::new(config, &source, &reference, &evaluator, &caller, &annotator).unwrap();

    let mut writer = VecVariantWriter::new();
    let summary = traversal.traverse(&[interval], &mut writer).unwrap();

    assert_eq!(summary.shards, 2);
    assert!(summary.regions > 0);
    assert!(summary.active_regions > 0);

    let contexts = writer.contexts();
    assert!(!contexts.is_empty());

    // written in non-decreasing coordinate order within the traversal
    for pair in contexts.windows(2) {
        assert!(pair[0].location().start() <= pair[1].location().start());
    }

    let variant = contexts
        .iter()
        .find(|vc| vc.location().start() == 120)
        .expect("the shared mismatch is called at position 120");
    assert_eq!(
        variant.attribute(DEPTH_KEY),
        Some(&AttributeValue::Int(8))
    );
    assert!(variant.has_attribute(RAW_RMS_MAPPING_QUALITY_KEY));
    assert!(variant.genotypes()[0].allele_depths().is_some());

    // the reducible annotation finalizes into MQ: 8 reads at MQ60
    let finalized = annotator.finalize_annotations(variant.clone()).unwrap();
    assert!(!finalized.has_attribute(RAW_RMS_MAPPING_QUALITY_KEY));
    assert_eq!(
        finalized.attribute(RMS_MAPPING_QUALITY_KEY),
        Some(&AttributeValue::Text("60.00".into()))
    );
}

#[test]
fn quiet_reference_produces_no_variants() {
    let sequence = reference_sequence();
    let reference = InMemoryReference::from_contigs([("chr1", sequence.clone())]);
    // reads agree with the reference everywhere
    let reads = (0..4)
        .map(|i| matched_read(&format!("r{i}"), "sample1", "chr1", 51, &sequence[50..90]))
        .collect();
    let source = VecReadSource::new(reads);
    let interval = GenomeLocation::new("chr1", 1, 300).unwrap();

    let config = TraversalConfig::default();
    let annotator = VariantAnnotatorEngine::of_all_minus_excluded(Vec::new()).unwrap();
    let evaluator = MismatchActivityEvaluator::new(&reference);
    let caller = PileupRegionCaller::default();
    let traversal =
        Traversal::new(config, &source, &reference, &evaluator, &caller, &annotator).unwrap();

    let mut writer = VecVariantWriter::new();
    let summary = traversal.traverse(&[interval], &mut writer).unwrap();

    assert!(writer.contexts().is_empty());
    assert!(summary.regions > 0);
    assert_eq!(summary.active_regions, 0);
}

#[test]
fn error_correction_repairs_a_lone_miscall_before_calling() {
    let sequence = reference_sequence();
    let reference = InMemoryReference::from_contigs([("chr1", sequence.clone())]);

    // ten clean reads and one read with a solitary error at position 110
    let clean = sequence[100..140].to_vec();
    let mut noisy = clean.clone();
    noisy[9] = if noisy[9] == b'C' { b'G' } else { b'C' };
    let mut reads: Vec<locuscall::reads::Read> = (0..10)
        .map(|i| matched_read(&format!("r{i}"), "sample1", "chr1", 101, &clean))
        .collect();
    reads.push(matched_read("noisy", "sample1", "chr1", 101, &noisy));
    let source = VecReadSource::new(reads);
    let interval = GenomeLocation::new("chr1", 1, 300).unwrap();

    let mut config = TraversalConfig::default();
    config.error_correction = Some(locuscall::config::ErrorCorrectionConfig {
        kmer_length: 10,
        min_observations_for_kmer_to_be_solid: 5,
        ..Default::default()
    });

    let annotator = VariantAnnotatorEngine::of_all_minus_excluded(Vec::new()).unwrap();
    let evaluator = MismatchActivityEvaluator::new(&reference);
    // a permissive threshold that would report the uncorrected miscall
    let caller = PileupRegionCaller::new(1.0);
    let traversal =
        Traversal::new(config, &source, &reference, &evaluator, &caller, &annotator).unwrap();

    let mut writer = VecVariantWriter::new();
    traversal.traverse(&[interval], &mut writer).unwrap();

    // the lone miscall is repaired, so nothing is called at position 110
    assert!(writer
        .contexts()
        .iter()
        .all(|vc| vc.location().start() != 110));
}
