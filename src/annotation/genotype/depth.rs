use crate::annotation::info::snp_bases;
use crate::annotation::{GenotypeAnnotation, HeaderCount, HeaderType, SiteContext, VariantAnnotation, VcfHeaderLine};
use crate::genomics::{base_index, PerReadAlleleLikelihoodMap, ReadBackedPileup};
use crate::variant::{keys, AttributeMap, Genotype, VariantContext};

/// Unfiltered reads supporting each allele, reference first (`AD`).
///
/// SNPs count pileup bases; other variants count reads whose most likely
/// allele is informative.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthPerAlleleBySample;

impl DepthPerAlleleBySample {
    fn from_pileup(vc: &VariantContext, pileup: &ReadBackedPileup) -> Option<Vec<i32>> {
        let (ref_base, alt_bases) = snp_bases(vc)?;
        let counts = pileup.base_counts();
        let count_of = |base: u8| base_index(base).map_or(0, |idx| counts[idx] as i32);
        let mut depths = Vec::with_capacity(alt_bases.len() + 1);
        depths.push(count_of(ref_base));
        depths.extend(alt_bases.into_iter().map(count_of));
        Some(depths)
    }
}

impl VariantAnnotation for DepthPerAlleleBySample {
    fn name(&self) -> &'static str {
        "DepthPerAlleleBySample"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::GENOTYPE_ALLELE_DEPTHS]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::format(
            keys::GENOTYPE_ALLELE_DEPTHS,
            HeaderCount::R,
            HeaderType::Integer,
            "Allelic depths for the ref and alt alleles in the order listed",
        )]
    }
}

impl GenotypeAnnotation for DepthPerAlleleBySample {
    fn annotate(
        &self,
        _site: &SiteContext<'_>,
        pileup: Option<&ReadBackedPileup>,
        likelihoods: Option<&PerReadAlleleLikelihoodMap>,
        vc: &VariantContext,
        genotype: &Genotype,
    ) -> Option<AttributeMap> {
        if !genotype.is_called() {
            return None;
        }
        let depths = match (pileup, likelihoods) {
            (Some(pileup), _) if vc.is_snp() => Self::from_pileup(vc, pileup)?,
            (_, Some(map)) => map.allele_depths(vc.alleles()),
            _ => return None,
        };
        let mut map = AttributeMap::new();
        map.put(keys::GENOTYPE_ALLELE_DEPTHS, depths);
        Some(map)
    }
}

/// Per-sample read depth (`DP`).
///
/// Counts informative reads when likelihoods exist, else the pileup depth.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthPerSampleHC;

impl VariantAnnotation for DepthPerSampleHC {
    fn name(&self) -> &'static str {
        "DepthPerSampleHC"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::DEPTH_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::format(
            keys::DEPTH_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Integer,
            "Approximate read depth (reads with MQ=255 or with bad mates are filtered)",
        )]
    }
}

impl GenotypeAnnotation for DepthPerSampleHC {
    fn annotate(
        &self,
        _site: &SiteContext<'_>,
        pileup: Option<&ReadBackedPileup>,
        likelihoods: Option<&PerReadAlleleLikelihoodMap>,
        _vc: &VariantContext,
        genotype: &Genotype,
    ) -> Option<AttributeMap> {
        if !genotype.is_called() {
            return None;
        }
        let depth = match (likelihoods, pileup) {
            (Some(map), _) => map
                .iter()
                .filter(|read| read.most_likely_allele().is_some())
                .count(),
            (None, Some(pileup)) => pileup.depth(),
            (None, None) => return None,
        };
        let mut map = AttributeMap::new();
        map.put(keys::DEPTH_KEY, depth as i32);
        Some(map)
    }
}
