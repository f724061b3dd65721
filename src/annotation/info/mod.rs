//! Built-in site-level annotations.

mod allele_balance;
mod coverage;
mod mapping_quality;
mod population;
mod rank_sum;
mod repeats;
mod strand;

pub use allele_balance::AlleleBalance;
pub use coverage::{BaseCounts, DepthOfCoverage, QualByDepth, SpanningDeletions};
pub use mapping_quality::{MappingQualityZero, RmsMappingQuality};
pub use population::{ChromosomeCounts, HardyWeinberg, InbreedingCoeff};
pub use rank_sum::RankSumTest;
pub use repeats::{HomopolymerRun, TandemRepeatAnnotator};
pub use strand::FisherStrand;

use crate::variant::VariantContext;

/// Uppercase reference base and alternate bases of a SNP record.
pub(crate) fn snp_bases(vc: &VariantContext) -> Option<(u8, Vec<u8>)> {
    if !vc.is_snp() {
        return None;
    }
    let ref_base = vc.reference().bases().first()?.to_ascii_uppercase();
    let alt_bases = vc
        .alternate_alleles()
        .iter()
        .filter_map(|allele| allele.bases().first())
        .map(u8::to_ascii_uppercase)
        .collect();
    Some((ref_base, alt_bases))
}

#[cfg(test)]
mod tests;
