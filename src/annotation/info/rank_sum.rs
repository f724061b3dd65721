use crate::annotation::{HeaderCount, HeaderType, InfoFieldAnnotation, SiteContext, VariantAnnotation, VcfHeaderLine};
use crate::genomics::{mann_whitney_u, AlignedRead, PileupElement};
use crate::variant::{keys, AttributeMap, VariantContext};

use super::snp_bases;

/// Per-read feature compared between alt and ref supporting reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RankSumFeature {
    BaseQuality,
    MappingQuality,
    ReadPosition,
}

/// Mann-Whitney rank-sum z-score of a read feature, alt reads against ref
/// reads.
///
/// SNPs classify reads by their pileup base; other variants classify them
/// by most likely allele and only support read-level features.
#[derive(Debug, Clone, Copy)]
pub struct RankSumTest {
    feature: RankSumFeature,
}

impl RankSumTest {
    /// Base qualities (`BaseQRankSum`).
    pub fn base_quality() -> Self {
        Self {
            feature: RankSumFeature::BaseQuality,
        }
    }

    /// Mapping qualities (`MQRankSum`).
    pub fn mapping_quality() -> Self {
        Self {
            feature: RankSumFeature::MappingQuality,
        }
    }

    /// Distance of the site from the nearer read end (`ReadPosRankSum`).
    pub fn read_position() -> Self {
        Self {
            feature: RankSumFeature::ReadPosition,
        }
    }

    fn key(&self) -> &'static str {
        match self.feature {
            RankSumFeature::BaseQuality => keys::BASE_QUAL_RANK_SUM_KEY,
            RankSumFeature::MappingQuality => keys::MAP_QUAL_RANK_SUM_KEY,
            RankSumFeature::ReadPosition => keys::READ_POS_RANK_SUM_KEY,
        }
    }

    fn element_value(&self, element: &PileupElement) -> f64 {
        match self.feature {
            RankSumFeature::BaseQuality => f64::from(element.qual()),
            RankSumFeature::MappingQuality => f64::from(element.mapping_quality()),
            RankSumFeature::ReadPosition => {
                let aligned = element.read().aligned_bases_counting_soft_clips();
                let mut position = element.offset();
                if position > aligned / 2 {
                    position = aligned.saturating_sub(position + 1);
                }
                position as f64
            }
        }
    }

    fn read_value(&self, read: &AlignedRead) -> Option<f64> {
        match self.feature {
            RankSumFeature::MappingQuality => Some(f64::from(read.mapq)),
            _ => None,
        }
    }

    fn pileup_sets(&self, site: &SiteContext<'_>, vc: &VariantContext) -> Option<(Vec<f64>, Vec<f64>)> {
        let (ref_base, alt_bases) = snp_bases(vc)?;
        let mut alt = Vec::new();
        let mut reference = Vec::new();
        for element in site.pileups.values().flat_map(|p| p.iter()) {
            if element.is_deletion() {
                continue;
            }
            let base = element.base().to_ascii_uppercase();
            if base == ref_base {
                reference.push(self.element_value(element));
            } else if alt_bases.contains(&base) {
                alt.push(self.element_value(element));
            }
        }
        Some((alt, reference))
    }

    fn likelihood_sets(&self, site: &SiteContext<'_>, vc: &VariantContext) -> Option<(Vec<f64>, Vec<f64>)> {
        let maps = site.likelihoods?;
        let mut alt = Vec::new();
        let mut reference = Vec::new();
        for read in maps.values().flat_map(|map| map.iter()) {
            let Some(best) = read.most_likely_allele() else {
                continue;
            };
            let value = self.read_value(read.read())?;
            if best.is_reference() {
                reference.push(value);
            } else if vc.has_alternate_allele(best) {
                alt.push(value);
            }
        }
        Some((alt, reference))
    }
}

impl VariantAnnotation for RankSumTest {
    fn name(&self) -> &'static str {
        match self.feature {
            RankSumFeature::BaseQuality => "BaseQualityRankSumTest",
            RankSumFeature::MappingQuality => "MappingQualityRankSumTest",
            RankSumFeature::ReadPosition => "ReadPosRankSumTest",
        }
    }

    fn key_names(&self) -> &'static [&'static str] {
        match self.feature {
            RankSumFeature::BaseQuality => &[keys::BASE_QUAL_RANK_SUM_KEY],
            RankSumFeature::MappingQuality => &[keys::MAP_QUAL_RANK_SUM_KEY],
            RankSumFeature::ReadPosition => &[keys::READ_POS_RANK_SUM_KEY],
        }
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        let description = match self.feature {
            RankSumFeature::BaseQuality => "Z-score from Wilcoxon rank sum test of Alt Vs. Ref base qualities",
            RankSumFeature::MappingQuality => "Z-score From Wilcoxon rank sum test of Alt vs. Ref read mapping qualities",
            RankSumFeature::ReadPosition => "Z-score from Wilcoxon rank sum test of Alt vs. Ref read position bias",
        };
        vec![VcfHeaderLine::info(self.key(), HeaderCount::Fixed(1), HeaderType::Float, description)]
    }
}

impl InfoFieldAnnotation for RankSumTest {
    fn annotate(&self, site: &SiteContext<'_>, vc: &VariantContext) -> Option<AttributeMap> {
        if !vc.is_variant() {
            return None;
        }
        let (alt, reference) = if vc.is_snp() && !site.pileups.is_empty() {
            self.pileup_sets(site, vc)?
        } else {
            self.likelihood_sets(site, vc)?
        };
        let result = mann_whitney_u(&alt, &reference)?;
        let mut map = AttributeMap::new();
        map.put(self.key(), format!("{:.3}", result.z + 0.0));
        Some(map)
    }
}
