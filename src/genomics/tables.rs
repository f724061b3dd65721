//! Tab-separated inputs for the command line: site tables in the column
//! layout of VCF and per-sample read tables.
//!
//! Site tables keep `##` meta lines verbatim and decode genotype columns
//! lazily through [`FormatFieldDecoder`]. Read tables hold one aligned read
//! per line: `sample name contig pos mapq cigar sequence qualities strand`.

use std::collections::BTreeMap;
use std::io::BufRead;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};

use crate::genomics::{parse_cigar, AlignedRead};
use crate::variant::{
    keys, Allele, AttributeValue, FormatFieldDecoder, RawVariantSite, VariantContextBuilder,
};

/// Fixed columns before FORMAT.
const SITE_COLUMNS: usize = 8;
/// Base quality assumed when a read lists `*` qualities.
const DEFAULT_BASE_QUALITY: u8 = 30;
/// Offset of phred+33 quality characters.
const PHRED_OFFSET: u8 = 33;

/// Parsed site table.
#[derive(Debug, Default)]
pub struct SiteTable {
    /// `##` lines in file order.
    pub meta_lines: Vec<String>,
    /// Sample names from the `#CHROM` line.
    pub samples: Vec<String>,
    /// Records, genotypes still encoded.
    pub sites: Vec<RawVariantSite>,
}

/// Read a site table, labelling every record with `source`.
pub fn read_sites<R: BufRead>(reader: R, source: &str) -> Result<SiteTable> {
    let mut table = SiteTable::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line_no = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        if line.starts_with("##") {
            table.meta_lines.push(line);
            continue;
        }
        if let Some(header) = line.strip_prefix('#') {
            table.samples = header.split('\t').skip(SITE_COLUMNS + 1).map(str::to_string).collect();
            continue;
        }
        let site = parse_site(&line, source, &table.samples).with_context(|| format!("site line {line_no}"))?;
        table.sites.push(site);
    }
    Ok(table)
}

fn parse_site(line: &str, source: &str, samples: &[String]) -> Result<RawVariantSite> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < SITE_COLUMNS {
        bail!("expected at least {SITE_COLUMNS} columns, found {}", fields.len());
    }
    let contig = fields[0];
    let start: u32 = fields[1]
        .parse()
        .with_context(|| format!("invalid position {:?}", fields[1]))?;

    let reference = Allele::create(fields[3], true)?;
    let stop = start + reference.len().max(1) as u32 - 1;
    let mut alleles = vec![reference];
    if fields[4] != keys::MISSING_VALUE {
        for alt in fields[4].split(',') {
            alleles.push(Allele::create(alt, false)?);
        }
    }

    let mut builder = VariantContextBuilder::new(source.to_string(), contig.to_string(), start, stop, alleles);
    if fields[2] != keys::EMPTY_ID_FIELD {
        builder = builder.id(fields[2]);
    }
    if fields[5] != keys::MISSING_VALUE {
        let qual: f64 = fields[5]
            .parse()
            .with_context(|| format!("invalid QUAL {:?}", fields[5]))?;
        builder = builder.phred_qual(qual);
    }
    builder = match fields[6] {
        keys::MISSING_VALUE => builder.unfiltered(),
        keys::PASSES_FILTERS => builder.passed_filters(),
        filters => builder.filters(filters.split(';').map(str::to_string)),
    };
    if fields[7] != keys::MISSING_VALUE {
        for entry in fields[7].split(';') {
            builder = match entry.split_once('=') {
                Some((key, value)) => builder.attribute(key, value),
                None => builder.attribute(entry, AttributeValue::Flag),
            };
        }
    }
    let site = builder.make()?;

    let Some(format) = fields.get(SITE_COLUMNS) else {
        return Ok(RawVariantSite::sites_only(site));
    };
    let columns = &fields[SITE_COLUMNS + 1..];
    if columns.len() != samples.len() {
        bail!("{} genotype columns for {} samples", columns.len(), samples.len());
    }
    let decoder = FormatFieldDecoder::new(
        format,
        samples.iter().cloned().zip(columns.iter().map(|c| c.to_string())),
    );
    Ok(RawVariantSite::new(site, Arc::new(decoder)))
}

/// Reads grouped by sample, in file order.
pub type ReadsBySample = BTreeMap<String, Vec<Arc<AlignedRead>>>;

/// Read a read table.
pub fn read_reads<R: BufRead>(reader: R) -> Result<ReadsBySample> {
    let mut reads = ReadsBySample::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        let (sample, read) = parse_read(&line).with_context(|| format!("read line {}", idx + 1))?;
        reads.entry(sample).or_default().push(Arc::new(read));
    }
    Ok(reads)
}

fn parse_read(line: &str) -> Result<(String, AlignedRead)> {
    let fields: Vec<&str> = line.split('\t').collect();
    let [sample, name, contig, pos, mapq, cigar, sequence, qualities, strand] = fields[..] else {
        return Err(anyhow!("expected 9 columns, found {}", fields.len()));
    };
    let pos: u32 = pos.parse().with_context(|| format!("invalid position {pos:?}"))?;
    let mapq: u8 = mapq.parse().with_context(|| format!("invalid MAPQ {mapq:?}"))?;
    let cigar = parse_cigar(cigar)?;
    let sequence = sequence.to_ascii_uppercase().into_bytes();
    let qualities = if qualities == "*" {
        vec![DEFAULT_BASE_QUALITY; sequence.len()]
    } else {
        if qualities.len() != sequence.len() {
            bail!("{} qualities for {} bases", qualities.len(), sequence.len());
        }
        qualities.bytes().map(|q| q.saturating_sub(PHRED_OFFSET)).collect()
    };
    let is_reverse = match strand {
        "+" => false,
        "-" => true,
        other => bail!("invalid strand {other:?}"),
    };
    let read = AlignedRead::new(name, contig, pos, mapq, cigar, sequence, qualities, is_reverse);
    Ok((sample.to_string(), read))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SITES: &str = "##fileformat=VCFv4.2\n\
        ##INFO=<ID=AF,Number=A,Type=Float,Description=\"Allele Frequency\">\n\
        #CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\ts1\ts2\n\
        chr1\t10\trs1\tA\tG\t50\tPASS\tAF=0.5;DB\tGT:GQ\t0/1:40\t./.:.\n\
        chr1\t20\t.\tCT\tC\t.\t.\t.\tGT\t1/1\t0|1\n";

    #[test]
    fn reads_sites_with_deferred_genotypes() {
        let table = read_sites(SITES.as_bytes(), "calls").expect("table");
        assert_eq!(table.meta_lines.len(), 2);
        assert_eq!(table.samples, vec!["s1".to_string(), "s2".to_string()]);
        assert_eq!(table.sites.len(), 2);

        let first = &table.sites[0];
        assert!(!first.is_materialized());
        assert_eq!(first.site().id(), Some("rs1"));
        assert_eq!(first.site().attribute_as_string("AF").as_deref(), Some("0.5"));
        assert!(first.site().has_attribute("DB"));
        assert!(first.site().is_not_filtered());

        let full = first.materialize().expect("genotypes");
        assert_eq!(full.genotype("s1").map(|g| g.gq()), Some(40));
        assert!(full.genotype("s2").is_some_and(|g| g.is_no_call()));

        let deletion = table.sites[1].materialize().expect("deletion");
        assert_eq!(deletion.end(), 21);
        assert!(deletion.is_indel());
        assert!(deletion.genotype("s2").is_some_and(|g| g.is_phased()));
    }

    #[test]
    fn rejects_short_site_lines() {
        let err = read_sites("chr1\t10\t.\tA\n".as_bytes(), "calls").expect_err("short");
        assert!(format!("{err:#}").contains("site line 1"));
    }

    #[test]
    fn reads_reads_by_sample() {
        let text = "s1\tr1\tchr1\t8\t60\t5M\tTCAGG\tIIIII\t+\n\
                    s1\tr2\tchr1\t8\t0\t*\tTCGGG\t*\t-\n\
                    s2\tr3\tchr1\t9\t60\t2M1D2M\tCAGG\t*\t+\n";
        let reads = read_reads(text.as_bytes()).expect("reads");
        assert_eq!(reads["s1"].len(), 2);
        assert_eq!(reads["s1"][0].quality_at(0), Some(40));
        assert!(reads["s1"][1].is_reverse);
        assert_eq!(reads["s2"][0].end(), 13);

        assert!(read_reads("s1\tr1\tchr1\t8\t60\t5M\tTCAGG\t*\tx\n".as_bytes()).is_err());
    }
}
