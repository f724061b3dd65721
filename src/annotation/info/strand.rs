use crate::annotation::{HeaderCount, HeaderType, InfoFieldAnnotation, SiteContext, VariantAnnotation, VcfHeaderLine};
use crate::genomics::{fisher_exact_two_sided, phred_scale_p};
use crate::variant::{keys, AttributeMap, VariantContext};

use super::snp_bases;

/// Phred-scaled Fisher exact test of strand bias (`FS`).
///
/// SNPs tabulate ref and alt bases by strand from the pileups; other
/// variants use the most likely allele of each scored read.
#[derive(Debug, Clone, Copy, Default)]
pub struct FisherStrand;

impl FisherStrand {
    /// `[[ref_fwd, ref_rev], [alt_fwd, alt_rev]]` from pileup bases.
    fn snp_table(site: &SiteContext<'_>, vc: &VariantContext) -> Option<[[u32; 2]; 2]> {
        let (ref_base, alt_bases) = snp_bases(vc)?;
        let mut table = [[0u32; 2]; 2];
        for element in site.pileups.values().flat_map(|p| p.iter()) {
            if element.is_deletion() {
                continue;
            }
            let base = element.base().to_ascii_uppercase();
            let row = if base == ref_base {
                0
            } else if alt_bases.first() == Some(&base) {
                1
            } else {
                continue;
            };
            table[row][usize::from(element.is_reverse_strand())] += 1;
        }
        Some(table)
    }

    fn likelihood_table(site: &SiteContext<'_>, vc: &VariantContext) -> Option<[[u32; 2]; 2]> {
        let maps = site.likelihoods?;
        let mut table = [[0u32; 2]; 2];
        for read in maps.values().flat_map(|map| map.iter()) {
            let Some(best) = read.most_likely_allele() else {
                continue;
            };
            let row = if best.is_reference() {
                0
            } else if vc.has_alternate_allele(best) {
                1
            } else {
                continue;
            };
            table[row][usize::from(read.read().is_reverse)] += 1;
        }
        Some(table)
    }
}

impl VariantAnnotation for FisherStrand {
    fn name(&self) -> &'static str {
        "FisherStrand"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::FISHER_STRAND_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::info(
            keys::FISHER_STRAND_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Float,
            "Phred-scaled p-value using Fisher's exact test to detect strand bias",
        )]
    }
}

impl InfoFieldAnnotation for FisherStrand {
    fn annotate(&self, site: &SiteContext<'_>, vc: &VariantContext) -> Option<AttributeMap> {
        if !vc.is_variant() {
            return None;
        }
        let table = if vc.is_snp() && !site.pileups.is_empty() {
            Self::snp_table(site, vc)?
        } else {
            Self::likelihood_table(site, vc)?
        };
        let p = fisher_exact_two_sided(table);
        let mut map = AttributeMap::new();
        map.put(keys::FISHER_STRAND_KEY, format!("{:.3}", phred_scale_p(p)));
        Some(map)
    }
}
