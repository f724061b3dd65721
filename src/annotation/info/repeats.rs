use crate::annotation::{HeaderCount, HeaderType, InfoFieldAnnotation, SiteContext, VariantAnnotation, VcfHeaderLine};
use crate::genomics::homopolymer_run;
use crate::variant::utils::{is_tandem_repeat, num_tandem_repeat_units};
use crate::variant::{keys, AttributeMap, AttributeValue, VariantContext};

use super::snp_bases;

/// Longest run of the alternate base adjacent to a biallelic SNP (`HRun`).
#[derive(Debug, Clone, Copy, Default)]
pub struct HomopolymerRun;

impl VariantAnnotation for HomopolymerRun {
    fn name(&self) -> &'static str {
        "HomopolymerRun"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::HOMOPOLYMER_RUN_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::info(
            keys::HOMOPOLYMER_RUN_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Integer,
            "Largest Contiguous Homopolymer Run of Variant Allele In Either Direction",
        )]
    }
}

impl InfoFieldAnnotation for HomopolymerRun {
    fn annotate(&self, site: &SiteContext<'_>, vc: &VariantContext) -> Option<AttributeMap> {
        if !vc.is_biallelic() {
            return None;
        }
        let (_, alt_bases) = snp_bases(vc)?;
        let reference = site.reference;
        let index = vc.start().checked_sub(reference.window_start())? as usize;
        if index >= reference.window().len() {
            return None;
        }
        let run = homopolymer_run(reference.window(), index, *alt_bases.first()?);
        let mut map = AttributeMap::new();
        map.put(keys::HOMOPOLYMER_RUN_KEY, run as i32);
        Some(map)
    }
}

/// Short tandem repeat description of indels (`STR`, `RU`, `RPA`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TandemRepeatAnnotator;

impl VariantAnnotation for TandemRepeatAnnotator {
    fn name(&self) -> &'static str {
        "TandemRepeatAnnotator"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::STR_PRESENT_KEY, keys::REPEAT_UNIT_KEY, keys::REPEATS_PER_ALLELE_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![
            VcfHeaderLine::info(
                keys::STR_PRESENT_KEY,
                HeaderCount::Fixed(0),
                HeaderType::Flag,
                "Variant is a short tandem repeat",
            ),
            VcfHeaderLine::info(
                keys::REPEAT_UNIT_KEY,
                HeaderCount::Fixed(1),
                HeaderType::String,
                "Tandem repeat unit (bases)",
            ),
            VcfHeaderLine::info(
                keys::REPEATS_PER_ALLELE_KEY,
                HeaderCount::Unbounded,
                HeaderType::Integer,
                "Number of times tandem repeat unit is repeated, for each allele (including reference)",
            ),
        ]
    }
}

impl InfoFieldAnnotation for TandemRepeatAnnotator {
    fn annotate(&self, site: &SiteContext<'_>, vc: &VariantContext) -> Option<AttributeMap> {
        if !vc.is_indel() {
            return None;
        }
        let ref_with_pad = site.reference.forward_bases();
        let (counts, unit) = num_tandem_repeat_units(vc, ref_with_pad)?;

        let mut map = AttributeMap::new();
        if is_tandem_repeat(vc, ref_with_pad) {
            map.put(keys::STR_PRESENT_KEY, AttributeValue::Flag);
        }
        map.put(keys::REPEAT_UNIT_KEY, String::from_utf8_lossy(&unit).into_owned());
        map.put(
            keys::REPEATS_PER_ALLELE_KEY,
            counts.into_iter().map(|c| c as i32).collect::<Vec<i32>>(),
        );
        Some(map)
    }
}
