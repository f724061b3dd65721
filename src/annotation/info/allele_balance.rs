use crate::annotation::{HeaderCount, HeaderType, InfoFieldAnnotation, SiteContext, VariantAnnotation, VcfHeaderLine};
use crate::genomics::base_index;
use crate::variant::{keys, AttributeMap, VariantContext};

use super::snp_bases;

/// Site-level allele balance over biallelic SNP calls.
///
/// `ABHet` is the reference fraction of ref+alt reads over heterozygous
/// samples, `ABHom` the major-allele fraction over homozygous samples and
/// `OND` the fraction of reads in homozygous samples carrying neither allele.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlleleBalance;

#[derive(Default)]
struct Tally {
    het_ref: f64,
    het_weight: f64,
    hom_major: f64,
    hom_weight: f64,
    hom_other: f64,
    hom_total: f64,
}

impl VariantAnnotation for AlleleBalance {
    fn name(&self) -> &'static str {
        "AlleleBalance"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[
            keys::ALLELE_BALANCE_HET_KEY,
            keys::ALLELE_BALANCE_HOM_KEY,
            keys::NON_DIPLOID_RATIO_KEY,
        ]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![
            VcfHeaderLine::info(
                keys::ALLELE_BALANCE_HET_KEY,
                HeaderCount::Fixed(1),
                HeaderType::Float,
                "Allele Balance for hets (ref/(ref+alt))",
            ),
            VcfHeaderLine::info(
                keys::ALLELE_BALANCE_HOM_KEY,
                HeaderCount::Fixed(1),
                HeaderType::Float,
                "Allele Balance for homs (A/(A+O))",
            ),
            VcfHeaderLine::info(
                keys::NON_DIPLOID_RATIO_KEY,
                HeaderCount::Fixed(1),
                HeaderType::Float,
                "Overall non-diploid ratio (alleles/(alleles+non-alleles))",
            ),
        ]
    }
}

impl InfoFieldAnnotation for AlleleBalance {
    fn annotate(&self, site: &SiteContext<'_>, vc: &VariantContext) -> Option<AttributeMap> {
        if !vc.is_biallelic() || !vc.has_genotypes() {
            return None;
        }
        let (ref_base, alt_bases) = snp_bases(vc)?;
        let ref_idx = base_index(ref_base)?;
        let alt_idx = base_index(*alt_bases.first()?)?;

        let mut tally = Tally::default();
        for genotype in vc.genotypes() {
            let Some(pileup) = site.pileup(genotype.sample_name()) else {
                continue;
            };
            let counts = pileup.base_counts();
            let ref_count = f64::from(counts[ref_idx]);
            let alt_count = f64::from(counts[alt_idx]);
            let total: f64 = counts.iter().map(|&c| f64::from(c)).sum();
            if genotype.is_het() {
                tally.het_ref += ref_count;
                tally.het_weight += ref_count + alt_count;
            } else if genotype.is_hom_ref() || genotype.is_hom_var() {
                let major = if genotype.is_hom_ref() { ref_count } else { alt_count };
                tally.hom_major += major;
                tally.hom_weight += ref_count + alt_count;
                tally.hom_other += total - ref_count - alt_count;
                tally.hom_total += total;
            }
        }

        let mut map = AttributeMap::new();
        if tally.het_weight > 0.0 {
            map.put(
                keys::ALLELE_BALANCE_HET_KEY,
                format!("{:.2}", tally.het_ref / tally.het_weight),
            );
        }
        if tally.hom_weight > 0.0 {
            map.put(
                keys::ALLELE_BALANCE_HOM_KEY,
                format!("{:.2}", tally.hom_major / tally.hom_weight),
            );
        }
        if tally.hom_total > 0.0 {
            map.put(
                keys::NON_DIPLOID_RATIO_KEY,
                format!("{:.2}", tally.hom_other / tally.hom_total),
            );
        }
        (!map.is_empty()).then_some(map)
    }
}
