use crate::annotation::info::snp_bases;
use crate::annotation::{GenotypeAnnotation, HeaderCount, HeaderType, SiteContext, VariantAnnotation, VcfHeaderLine};
use crate::genomics::{base_index, PerReadAlleleLikelihoodMap, ReadBackedPileup};
use crate::variant::{keys, AttributeMap, Genotype, VariantContext};

/// Reference fraction of ref+alt reads for heterozygous biallelic SNP calls
/// (`AB`).
#[derive(Debug, Clone, Copy, Default)]
pub struct AlleleBalanceBySample;

impl VariantAnnotation for AlleleBalanceBySample {
    fn name(&self) -> &'static str {
        "AlleleBalanceBySample"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::ALLELE_BALANCE_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::format(
            keys::ALLELE_BALANCE_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Float,
            "Allele balance for each het genotype",
        )]
    }
}

impl GenotypeAnnotation for AlleleBalanceBySample {
    fn annotate(
        &self,
        _site: &SiteContext<'_>,
        pileup: Option<&ReadBackedPileup>,
        _likelihoods: Option<&PerReadAlleleLikelihoodMap>,
        vc: &VariantContext,
        genotype: &Genotype,
    ) -> Option<AttributeMap> {
        if !genotype.is_het() || !vc.is_biallelic() {
            return None;
        }
        let pileup = pileup?;
        let (ref_base, alt_bases) = snp_bases(vc)?;
        let counts = pileup.base_counts();
        let ref_count = f64::from(counts[base_index(ref_base)?]);
        let alt_count = f64::from(counts[base_index(*alt_bases.first()?)?]);
        if ref_count + alt_count == 0.0 {
            return None;
        }
        let mut map = AttributeMap::new();
        map.put(
            keys::ALLELE_BALANCE_KEY,
            format!("{:.2}", ref_count / (ref_count + alt_count)),
        );
        Some(map)
    }
}

/// Per-sample count of mapping-quality-zero reads (`MQ0`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingQualityZeroBySample;

impl VariantAnnotation for MappingQualityZeroBySample {
    fn name(&self) -> &'static str {
        "MappingQualityZeroBySample"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::MAPPING_QUALITY_ZERO_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::format(
            keys::MAPPING_QUALITY_ZERO_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Integer,
            "Number of Mapping Quality Zero Reads per sample",
        )]
    }
}

impl GenotypeAnnotation for MappingQualityZeroBySample {
    fn annotate(
        &self,
        _site: &SiteContext<'_>,
        pileup: Option<&ReadBackedPileup>,
        _likelihoods: Option<&PerReadAlleleLikelihoodMap>,
        _vc: &VariantContext,
        _genotype: &Genotype,
    ) -> Option<AttributeMap> {
        let mq0 = pileup?.number_of_mapping_quality_zero_reads();
        let mut map = AttributeMap::new();
        map.put(keys::MAPPING_QUALITY_ZERO_KEY, mq0 as i32);
        Some(map)
    }
}
