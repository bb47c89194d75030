use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use locuscall::annotation::VariantAnnotatorEngine;
use locuscall::config::TraversalConfig;
use locuscall::position::GenomeLocation;
use locuscall::quantize::QualityQuantizer;
use locuscall::reads::{CigarOp, CigarOpKind, Read, ReadFlags, VecReadSource};
use locuscall::reference::InMemoryReference;
use locuscall::traversal::{
    MismatchActivityEvaluator, PileupRegionCaller, Traversal, VecVariantWriter,
};
use locuscall::variant::render_vcf;

#[derive(Parser, Debug)]
#[command(name = "locuscall", about = "Assembly-region variant calling core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Call and annotate variants from aligned reads over a reference.
    Call {
        /// Reference genome (plain FASTA without headers or raw sequence file).
        reference: PathBuf,
        /// Alignments file (`<position>\t<sequence>` per line, 1-based).
        alignments: PathBuf,
        /// Chromosome name (default: chr1).
        #[arg(long, default_value = "chr1")]
        chrom: String,
        /// Shard size in bases.
        #[arg(long, default_value_t = 5000)]
        shard_size: u64,
        /// Minimum mapping quality for the read filter stack.
        #[arg(long, default_value_t = 20)]
        min_mapping_quality: u8,
        /// Enable k-mer read error correction before calling.
        #[arg(long)]
        error_correction: bool,
    },
    /// Quantize a base-quality histogram down to a level count.
    Quantize {
        /// Histogram file: one observation count per line, starting at Q0.
        histogram: PathBuf,
        /// Number of quantized quality levels to produce.
        #[arg(long, default_value_t = 8)]
        levels: usize,
        /// Qualities at or below this value merge for free.
        #[arg(long, default_value_t = 2)]
        min_interesting_qual: usize,
        /// Also print the merge-forest report.
        #[arg(long)]
        report: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Call {
            reference,
            alignments,
            chrom,
            shard_size,
            min_mapping_quality,
            error_correction,
        } => run_call(
            reference,
            alignments,
            chrom,
            shard_size,
            min_mapping_quality,
            error_correction,
        )?,
        Commands::Quantize {
            histogram,
            levels,
            min_interesting_qual,
            report,
        } => run_quantize(histogram, levels, min_interesting_qual, report)?,
    }

    Ok(())
}

fn run_call(
    reference_path: PathBuf,
    alignments_path: PathBuf,
    chrom: String,
    shard_size: u64,
    min_mapping_quality: u8,
    error_correction: bool,
) -> Result<()> {
    let sequence = read_sequence_file(&reference_path)
        .with_context(|| format!("failed to read reference from {}", reference_path.display()))?;
    let chrom_arc: Arc<str> = Arc::from(chrom);
    let interval = GenomeLocation::new(Arc::clone(&chrom_arc), 1, sequence.len() as u64)
        .context("reference sequence is empty")?;
    let reference = InMemoryReference::from_contigs([(Arc::clone(&chrom_arc), sequence)]);

    let reads = read_alignment_file(&alignments_path, &chrom_arc)?;
    let source = VecReadSource::new(reads);

    let mut config = TraversalConfig {
        min_mapping_quality,
        ..TraversalConfig::default()
    };
    config.shard.shard_size = Some(shard_size);
    if error_correction {
        config.error_correction = Some(Default::default());
    }

    let annotator = VariantAnnotatorEngine::of_all_minus_excluded(Vec::new())
        .context("failed to resolve annotations")?;
    let evaluator = MismatchActivityEvaluator::new(&reference);
    let caller = PileupRegionCaller::default();
    let traversal = Traversal::new(config, &source, &reference, &evaluator, &caller, &annotator)
        .context("failed to initialize traversal")?;

    let mut writer = VecVariantWriter::new();
    let summary = traversal
        .traverse(&[interval], &mut writer)
        .context("traversal failed")?;

    let contexts = writer.into_contexts();
    if contexts.is_empty() {
        eprintln!(
            "No variants detected ({} shards, {} regions).",
            summary.shards, summary.regions
        );
    } else {
        let rendered = render_vcf(&contexts).context("failed to render VCF")?;
        std::io::stdout().write_all(rendered.as_bytes())?;
    }

    Ok(())
}

fn run_quantize(
    histogram_path: PathBuf,
    levels: usize,
    min_interesting_qual: usize,
    report: bool,
) -> Result<()> {
    let file = File::open(&histogram_path)
        .with_context(|| format!("failed to open histogram {}", histogram_path.display()))?;
    let mut histogram = Vec::new();
    for (line_no, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let count: i64 = trimmed
            .parse()
            .with_context(|| format!("invalid count '{}' on line {}", trimmed, line_no + 1))?;
        histogram.push(count);
    }

    let quantizer = QualityQuantizer::new(&histogram, levels, min_interesting_qual)
        .context("quantization failed")?;

    println!("qual\tquantized");
    for (qual, &quantized) in quantizer.original_to_quantized_map().iter().enumerate() {
        println!("{qual}\t{quantized}");
    }
    if report {
        print!("{}", quantizer.report());
    }

    Ok(())
}

fn read_sequence_file(path: &PathBuf) -> Result<Vec<u8>> {
    let contents = std::fs::read_to_string(path)?;
    let sequence: String = contents
        .lines()
        .filter(|line| !line.starts_with('>') && !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("");
    Ok(sequence.trim().to_ascii_uppercase().into_bytes())
}

fn read_alignment_file(path: &PathBuf, chrom: &Arc<str>) -> Result<Vec<Read>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut reads = Vec::new();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let mut fields = line.split_whitespace();
        let pos_str = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing position on line {}", line_no + 1))?;
        let seq = fields
            .next()
            .ok_or_else(|| anyhow::anyhow!("missing sequence on line {}", line_no + 1))?;

        let pos: u64 = pos_str.parse().with_context(|| {
            format!("invalid position '{}' on line {}", pos_str, line_no + 1)
        })?;

        let sequence = seq.to_ascii_uppercase().into_bytes();
        let qualities = vec![30u8; sequence.len()];
        let length = sequence.len() as u32;

        reads.push(Read::new(
            format!("read{}", line_no + 1),
            "sample1",
            Arc::clone(chrom),
            pos,
            60,
            vec![CigarOp::new(CigarOpKind::Match, length)],
            sequence,
            qualities,
            ReadFlags::default(),
        ));
    }

    Ok(reads)
}
