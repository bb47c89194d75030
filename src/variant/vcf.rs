//! VCF-style rendering of annotated variant contexts.

use anyhow::{anyhow, Result};
use std::io::Write;

use super::{AttributeValue, VariantContext};

const HEADER_PREFIX: &str = "##fileformat=VCFv4.3\n##source=locuscall\n";

/// Write variant contexts in a normalized VCF form.
///
/// Callers are responsible for passing contexts in contig/coordinate order;
/// this writer renders them as given.
pub fn write_vcf<W: Write>(writer: &mut W, contexts: &[VariantContext]) -> Result<()> {
    writer.write_all(HEADER_PREFIX.as_bytes())?;

    let mut samples: Vec<&str> = Vec::new();
    for vc in contexts {
        for genotype in vc.genotypes() {
            if !samples.contains(&genotype.sample().as_ref()) {
                samples.push(genotype.sample().as_ref());
            }
        }
    }

    let mut header = String::from("#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO");
    if !samples.is_empty() {
        header.push_str("\tFORMAT");
        for sample in &samples {
            header.push('\t');
            header.push_str(sample);
        }
    }
    header.push('\n');
    writer.write_all(header.as_bytes())?;

    for vc in contexts {
        writer.write_all(render_line(vc, &samples).as_bytes())?;
    }

    writer.flush()?;
    Ok(())
}

/// Render variant contexts into a VCF string (useful for tests and
/// snapshots).
pub fn render_vcf(contexts: &[VariantContext]) -> Result<String> {
    let mut buffer = Vec::new();
    write_vcf(&mut buffer, contexts)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered VCF is not valid UTF-8"))
}

fn render_line(vc: &VariantContext, samples: &[&str]) -> String {
    let reference = vc
        .reference_allele()
        .map(|a| a.to_string())
        .unwrap_or_else(|| ".".to_string());
    let alternates: Vec<String> = vc.alternate_alleles().map(|a| a.to_string()).collect();
    let alt_field = if alternates.is_empty() {
        ".".to_string()
    } else {
        alternates.join(",")
    };
    let qual_field = vc
        .qual()
        .map(|q| format!("{q:.2}"))
        .unwrap_or_else(|| ".".to_string());

    let mut line = format!(
        "{chrom}\t{pos}\t{id}\t{reference}\t{alt_field}\t{qual_field}\tPASS\t{info}",
        chrom = vc.location().contig(),
        pos = vc.location().start(),
        id = vc.id().unwrap_or("."),
        info = render_info(vc),
    );

    if !samples.is_empty() {
        line.push_str("\tGT:DP:GQ");
        for sample in samples {
            line.push('\t');
            match vc.genotypes().iter().find(|g| g.sample().as_ref() == *sample) {
                Some(genotype) => {
                    let gt: Vec<String> = genotype
                        .alleles()
                        .iter()
                        .map(|allele| {
                            vc.alleles()
                                .iter()
                                .position(|a| a == allele)
                                .map(|i| i.to_string())
                                .unwrap_or_else(|| ".".to_string())
                        })
                        .collect();
                    line.push_str(&format!(
                        "{}:{}:{}",
                        gt.join("/"),
                        genotype.depth().map(|d| d.to_string()).unwrap_or_else(|| ".".into()),
                        genotype
                            .genotype_quality()
                            .map(|q| q.to_string())
                            .unwrap_or_else(|| ".".into()),
                    ));
                }
                None => line.push_str("./."),
            }
        }
    }
    line.push('\n');
    line
}

fn render_info(vc: &VariantContext) -> String {
    if vc.attributes().is_empty() {
        return ".".to_string();
    }
    let fields: Vec<String> = vc
        .attributes()
        .iter()
        .map(|(key, value)| match value {
            AttributeValue::Flag => key.clone(),
            other => format!("{key}={other}"),
        })
        .collect();
    fields.join(";")
}
