use anyhow::{anyhow, Result};
use std::io::Write;

use crate::variant::{keys, format_vcf_double, Allele, AttributeValue, Genotype, VariantContext};

const FILE_FORMAT: &str = "##fileformat=VCFv4.2";
const SOURCE: &str = "##source=variant-annotator";
const FIXED_COLUMNS: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO";

/// Allele text as written in REF/ALT, with the stored padding base restored.
fn allele_text(vc: &VariantContext, allele: &Allele) -> String {
    if allele.is_symbolic() {
        return allele.base_string();
    }
    match vc.reference_base_for_indel() {
        Some(pad) => {
            let mut text = String::with_capacity(allele.len() + 1);
            text.push(pad as char);
            text.push_str(&allele.base_string());
            text
        }
        None => allele.display_string(),
    }
}

fn filter_text(vc: &VariantContext) -> String {
    match vc.filters() {
        None => keys::MISSING_VALUE.to_string(),
        Some(filters) if filters.is_empty() => keys::PASSES_FILTERS.to_string(),
        Some(filters) => filters.iter().cloned().collect::<Vec<_>>().join(";"),
    }
}

fn info_text(vc: &VariantContext) -> String {
    if vc.attributes().is_empty() {
        return keys::MISSING_VALUE.to_string();
    }
    vc.attributes()
        .iter()
        .map(|(key, value)| match value {
            AttributeValue::Flag => key.clone(),
            other => format!("{key}={other}"),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn gt_text(vc: &VariantContext, genotype: &Genotype) -> String {
    if genotype.alleles().is_empty() {
        return keys::MISSING_VALUE.to_string();
    }
    let separator = if genotype.is_phased() { "|" } else { "/" };
    genotype
        .alleles()
        .iter()
        .map(|allele| {
            if allele.is_no_call() {
                return keys::MISSING_VALUE.to_string();
            }
            vc.alleles()
                .iter()
                .position(|a| a.equals_ignore_ref(allele))
                .map_or_else(|| keys::MISSING_VALUE.to_string(), |idx| idx.to_string())
        })
        .collect::<Vec<_>>()
        .join(separator)
}

fn join_ints(values: &[i32]) -> String {
    values.iter().map(i32::to_string).collect::<Vec<_>>().join(",")
}

/// FORMAT keys for a record: inline fields in fixed order, then extended
/// keys in order of first appearance.
fn format_keys(vc: &VariantContext) -> Vec<String> {
    let genotypes = vc.genotypes();
    let mut format = vec![keys::GENOTYPE_KEY.to_string()];
    let inline = [
        (keys::GENOTYPE_ALLELE_DEPTHS, genotypes.iter().any(Genotype::has_ad)),
        (keys::DEPTH_KEY, genotypes.iter().any(Genotype::has_dp)),
        (keys::GENOTYPE_QUALITY_KEY, genotypes.iter().any(Genotype::has_gq)),
        (keys::GENOTYPE_PL_KEY, genotypes.iter().any(Genotype::has_likelihoods)),
    ];
    format.extend(inline.iter().filter(|(_, present)| *present).map(|(key, _)| key.to_string()));
    for genotype in genotypes {
        for key in genotype.extended_attributes().keys() {
            if !format.contains(key) {
                format.push(key.clone());
            }
        }
    }
    format
}

fn sample_text(vc: &VariantContext, genotype: Option<&Genotype>, format: &[String]) -> String {
    let Some(genotype) = genotype else {
        return keys::MISSING_VALUE.to_string();
    };
    format
        .iter()
        .map(|key| match key.as_str() {
            keys::GENOTYPE_KEY => gt_text(vc, genotype),
            keys::GENOTYPE_ALLELE_DEPTHS => genotype.ad().map_or_else(|| keys::MISSING_VALUE.to_string(), join_ints),
            keys::DEPTH_KEY if genotype.has_dp() => genotype.dp().to_string(),
            keys::GENOTYPE_QUALITY_KEY if genotype.has_gq() => genotype.gq().to_string(),
            keys::GENOTYPE_PL_KEY => genotype.pl().map_or_else(|| keys::MISSING_VALUE.to_string(), join_ints),
            other => genotype
                .attribute(other)
                .map_or_else(|| keys::MISSING_VALUE.to_string(), AttributeValue::to_string),
        })
        .collect::<Vec<_>>()
        .join(":")
}

/// One VCF data line (without the trailing newline).
pub fn format_record(vc: &VariantContext, samples: &[String]) -> String {
    let alts = if vc.alternate_alleles().is_empty() {
        keys::MISSING_VALUE.to_string()
    } else {
        vc.alternate_alleles()
            .iter()
            .map(|allele| allele_text(vc, allele))
            .collect::<Vec<_>>()
            .join(",")
    };
    let qual = if vc.has_log10_p_error() {
        format_vcf_double(vc.phred_scaled_qual())
    } else {
        keys::MISSING_VALUE.to_string()
    };

    let mut columns = vec![
        vc.contig().to_string(),
        vc.start().to_string(),
        vc.id().unwrap_or(keys::EMPTY_ID_FIELD).to_string(),
        allele_text(vc, vc.reference()),
        alts,
        qual,
        filter_text(vc),
        info_text(vc),
    ];
    if !samples.is_empty() {
        let format = format_keys(vc);
        columns.push(format.join(":"));
        columns.extend(
            samples
                .iter()
                .map(|sample| sample_text(vc, vc.genotype(sample), &format)),
        );
    }
    columns.join("\t")
}

/// Write a complete VCF: fixed preamble, the given `##` meta lines, the
/// column header and one line per record.
pub fn write_vcf<W: Write>(
    writer: &mut W,
    meta_lines: &[String],
    samples: &[String],
    records: &[VariantContext],
) -> Result<()> {
    writeln!(writer, "{FILE_FORMAT}")?;
    writeln!(writer, "{SOURCE}")?;
    for line in meta_lines {
        writeln!(writer, "{line}")?;
    }
    if samples.is_empty() {
        writeln!(writer, "{FIXED_COLUMNS}")?;
    } else {
        writeln!(writer, "{FIXED_COLUMNS}\tFORMAT\t{}", samples.join("\t"))?;
    }

    for record in records {
        writeln!(writer, "{}", format_record(record, samples))?;
    }

    writer.flush()?;
    Ok(())
}

/// Render a VCF into a string (useful for tests and snapshots).
pub fn render_vcf(meta_lines: &[String], samples: &[String], records: &[VariantContext]) -> Result<String> {
    let mut buffer = Vec::new();
    write_vcf(&mut buffer, meta_lines, samples, records)?;
    String::from_utf8(buffer).map_err(|_| anyhow!("rendered VCF is not valid UTF-8"))
}
