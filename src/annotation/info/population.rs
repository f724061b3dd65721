use std::collections::HashSet;

use once_cell::sync::OnceCell;

use crate::annotation::{
    AnnotatorConfig, HeaderCount, HeaderType, InfoFieldAnnotation, SiteContext, VariantAnnotation, VcfHeaderLine,
};
use crate::genomics::{hardy_weinberg_p_value, inbreeding_coefficient, normalize_from_log10, phred_scale_p};
use crate::variant::utils::calculate_chromosome_counts;
use crate::variant::{keys, AttributeMap, VariantContext};

/// Fewest samples a population statistic is computed over.
const MIN_SAMPLES: usize = 10;
/// Genotypes below this GQ are ignored by the Hardy-Weinberg test.
const MIN_GENOTYPE_QUALITY: i32 = 10;

/// Allele count, frequency and number (`AC`, `AF`, `AN`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ChromosomeCounts;

impl VariantAnnotation for ChromosomeCounts {
    fn name(&self) -> &'static str {
        "ChromosomeCounts"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::ALLELE_NUMBER_KEY, keys::ALLELE_COUNT_KEY, keys::ALLELE_FREQUENCY_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![
            VcfHeaderLine::info(
                keys::ALLELE_COUNT_KEY,
                HeaderCount::A,
                HeaderType::Integer,
                "Allele count in genotypes, for each ALT allele, in the same order as listed",
            ),
            VcfHeaderLine::info(
                keys::ALLELE_FREQUENCY_KEY,
                HeaderCount::A,
                HeaderType::Float,
                "Allele Frequency, for each ALT allele, in the same order as listed",
            ),
            VcfHeaderLine::info(
                keys::ALLELE_NUMBER_KEY,
                HeaderCount::Fixed(1),
                HeaderType::Integer,
                "Total number of alleles in called genotypes",
            ),
        ]
    }
}

impl InfoFieldAnnotation for ChromosomeCounts {
    fn annotate(&self, _site: &SiteContext<'_>, vc: &VariantContext) -> Option<AttributeMap> {
        if !vc.has_genotypes() {
            return None;
        }
        let mut map = AttributeMap::new();
        calculate_chromosome_counts(vc, &mut map, true);
        (!map.is_empty()).then_some(map)
    }
}

/// Phred-scaled exact Hardy-Weinberg p-value (`HW`) for biallelic sites.
#[derive(Debug, Clone, Copy, Default)]
pub struct HardyWeinberg;

impl VariantAnnotation for HardyWeinberg {
    fn name(&self) -> &'static str {
        "HardyWeinberg"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::HARDY_WEINBERG_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::info(
            keys::HARDY_WEINBERG_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Float,
            "Phred-scaled p-value for Hardy-Weinberg violation",
        )]
    }
}

impl InfoFieldAnnotation for HardyWeinberg {
    fn annotate(&self, _site: &SiteContext<'_>, vc: &VariantContext) -> Option<AttributeMap> {
        if !vc.is_biallelic() || vc.n_samples() < MIN_SAMPLES {
            return None;
        }
        let (mut hom_ref, mut het, mut hom_var) = (0usize, 0usize, 0usize);
        for genotype in vc.genotypes() {
            if genotype.is_no_call() || !genotype.has_gq() || genotype.gq() < MIN_GENOTYPE_QUALITY {
                continue;
            }
            if genotype.is_hom_ref() {
                hom_ref += 1;
            } else if genotype.is_het() {
                het += 1;
            } else if genotype.is_hom_var() {
                hom_var += 1;
            }
        }
        if hom_ref + het + hom_var == 0 {
            return None;
        }
        let p = hardy_weinberg_p_value(hom_ref, het, hom_var);
        let mut map = AttributeMap::new();
        map.put(keys::HARDY_WEINBERG_KEY, format!("{:.1}", phred_scale_p(p)));
        Some(map)
    }
}

/// Likelihood-based inbreeding coefficient over founders (`InbreedingCoeff`).
///
/// Founders are the configured sample ids, or every sample when none were
/// configured.
#[derive(Debug, Clone, Default)]
pub struct InbreedingCoeff {
    founder_ids: Vec<String>,
    founders: OnceCell<Option<HashSet<String>>>,
}

impl InbreedingCoeff {
    fn founders(&self) -> Option<&HashSet<String>> {
        self.founders
            .get_or_init(|| {
                (!self.founder_ids.is_empty()).then(|| self.founder_ids.iter().cloned().collect())
            })
            .as_ref()
    }
}

impl VariantAnnotation for InbreedingCoeff {
    fn name(&self) -> &'static str {
        "InbreedingCoeff"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::INBREEDING_COEFFICIENT_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::info(
            keys::INBREEDING_COEFFICIENT_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Float,
            "Inbreeding coefficient as estimated from the genotype likelihoods per-sample when compared against the Hardy-Weinberg expectation",
        )]
    }

    fn initialize(&mut self, config: &AnnotatorConfig) {
        self.founder_ids = config.founder_ids.clone();
        self.founders = OnceCell::new();
    }
}

impl InfoFieldAnnotation for InbreedingCoeff {
    fn annotate(&self, _site: &SiteContext<'_>, vc: &VariantContext) -> Option<AttributeMap> {
        if !vc.is_biallelic() {
            return None;
        }
        let founders = self.founders();
        let (mut hom_ref, mut het, mut hom_var, mut samples) = (0f64, 0f64, 0f64, 0usize);
        for genotype in vc.genotypes() {
            if founders.is_some_and(|set| !set.contains(genotype.sample_name())) {
                continue;
            }
            let Some(log10) = genotype.log10_likelihoods() else {
                continue;
            };
            if log10.len() < 3 {
                continue;
            }
            let normalized = normalize_from_log10(&log10);
            hom_ref += normalized[0];
            het += normalized[1];
            hom_var += normalized[2];
            samples += 1;
        }
        if samples < MIN_SAMPLES {
            return None;
        }
        let f = inbreeding_coefficient(hom_ref, het, hom_var)?;
        let mut map = AttributeMap::new();
        map.put(keys::INBREEDING_COEFFICIENT_KEY, format!("{:.4}", f + 0.0));
        Some(map)
    }
}
