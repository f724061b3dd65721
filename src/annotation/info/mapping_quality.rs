use crate::annotation::{HeaderCount, HeaderType, InfoFieldAnnotation, SiteContext, VariantAnnotation, VcfHeaderLine};
use crate::variant::{keys, AttributeMap, VariantContext};

/// MAPQ reserved for "unavailable"; excluded from the RMS.
const UNAVAILABLE_MAPPING_QUALITY: u8 = 255;

/// Root mean square mapping quality over all reads (`MQ`).
#[derive(Debug, Clone, Copy, Default)]
pub struct RmsMappingQuality;

impl VariantAnnotation for RmsMappingQuality {
    fn name(&self) -> &'static str {
        "RMSMappingQuality"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::RMS_MAPPING_QUALITY_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::info(
            keys::RMS_MAPPING_QUALITY_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Float,
            "RMS Mapping Quality",
        )]
    }
}

impl InfoFieldAnnotation for RmsMappingQuality {
    fn annotate(&self, site: &SiteContext<'_>, _vc: &VariantContext) -> Option<AttributeMap> {
        let (sum_squares, reads) = site
            .pileups
            .values()
            .flat_map(|pileup| pileup.iter())
            .map(|element| element.mapping_quality())
            .filter(|&mq| mq != UNAVAILABLE_MAPPING_QUALITY)
            .fold((0f64, 0usize), |(sum, n), mq| (sum + f64::from(mq).powi(2), n + 1));
        if reads == 0 {
            return None;
        }
        let rms = (sum_squares / reads as f64).sqrt();
        let mut map = AttributeMap::new();
        map.put(keys::RMS_MAPPING_QUALITY_KEY, format!("{rms:.2}"));
        Some(map)
    }
}

/// Number of reads with mapping quality zero (`MQ0`).
#[derive(Debug, Clone, Copy, Default)]
pub struct MappingQualityZero;

impl VariantAnnotation for MappingQualityZero {
    fn name(&self) -> &'static str {
        "MappingQualityZero"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::MAPPING_QUALITY_ZERO_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::info(
            keys::MAPPING_QUALITY_ZERO_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Integer,
            "Total Mapping Quality Zero Reads",
        )]
    }
}

impl InfoFieldAnnotation for MappingQualityZero {
    fn annotate(&self, site: &SiteContext<'_>, _vc: &VariantContext) -> Option<AttributeMap> {
        if site.pileups.is_empty() {
            return None;
        }
        let mq0: usize = site
            .pileups
            .values()
            .map(|pileup| pileup.number_of_mapping_quality_zero_reads())
            .sum();
        let mut map = AttributeMap::new();
        map.put(keys::MAPPING_QUALITY_ZERO_KEY, mq0 as i32);
        Some(map)
    }
}
