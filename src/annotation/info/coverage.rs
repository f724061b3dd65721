use crate::annotation::{HeaderCount, HeaderType, InfoFieldAnnotation, SiteContext, VariantAnnotation, VcfHeaderLine};
use crate::genomics::{ReadBackedPileup, NUM_BASES};
use crate::variant::{keys, AttributeMap, AttributeValue, VariantContext};

/// Total read depth over all samples (`DP`).
///
/// Falls back to the number of scored reads when only likelihoods exist.
#[derive(Debug, Clone, Copy, Default)]
pub struct DepthOfCoverage;

impl VariantAnnotation for DepthOfCoverage {
    fn name(&self) -> &'static str {
        "DepthOfCoverage"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::DEPTH_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::info(
            keys::DEPTH_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Integer,
            "Approximate read depth; some reads may have been filtered",
        )]
    }
}

impl InfoFieldAnnotation for DepthOfCoverage {
    fn annotate(&self, site: &SiteContext<'_>, _vc: &VariantContext) -> Option<AttributeMap> {
        let depth: usize = if !site.pileups.is_empty() {
            site.pileups.values().map(ReadBackedPileup::depth).sum()
        } else if site.has_likelihoods() {
            site.likelihoods?.values().map(|map| map.len()).sum()
        } else {
            return None;
        };
        let mut map = AttributeMap::new();
        map.put(keys::DEPTH_KEY, depth as i32);
        Some(map)
    }
}

/// Variant confidence divided by the depth of non-reference samples (`QD`).
#[derive(Debug, Clone, Copy, Default)]
pub struct QualByDepth;

impl VariantAnnotation for QualByDepth {
    fn name(&self) -> &'static str {
        "QualByDepth"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::QUAL_BY_DEPTH_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::info(
            keys::QUAL_BY_DEPTH_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Float,
            "Variant Confidence/Quality by Depth",
        )]
    }
}

impl InfoFieldAnnotation for QualByDepth {
    fn annotate(&self, site: &SiteContext<'_>, vc: &VariantContext) -> Option<AttributeMap> {
        if !vc.has_log10_p_error() || !vc.has_genotypes() {
            return None;
        }

        let depth: usize = vc
            .genotypes()
            .iter()
            .filter(|g| g.is_het() || g.is_hom_var())
            .map(|g| {
                if let Some(pileup) = site.pileup(g.sample_name()) {
                    pileup.depth()
                } else if let Some(map) = site.likelihood_map(g.sample_name()) {
                    map.len()
                } else if g.has_dp() {
                    g.dp().max(0) as usize
                } else {
                    0
                }
            })
            .sum();
        if depth == 0 {
            return None;
        }

        let qd = vc.phred_scaled_qual() / depth as f64;
        let mut map = AttributeMap::new();
        map.put(keys::QUAL_BY_DEPTH_KEY, format!("{qd:.2}"));
        Some(map)
    }
}

/// Fraction of reads with a deletion at the site (`Dels`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanningDeletions;

impl VariantAnnotation for SpanningDeletions {
    fn name(&self) -> &'static str {
        "SpanningDeletions"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::SPANNING_DELETIONS_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::info(
            keys::SPANNING_DELETIONS_KEY,
            HeaderCount::Fixed(1),
            HeaderType::Float,
            "Fraction of Reads Containing Spanning Deletions",
        )]
    }
}

impl InfoFieldAnnotation for SpanningDeletions {
    fn annotate(&self, site: &SiteContext<'_>, _vc: &VariantContext) -> Option<AttributeMap> {
        let (deletions, depth) = site
            .pileups
            .values()
            .fold((0usize, 0usize), |(dels, depth), pileup| {
                (dels + pileup.number_of_deletions(), depth + pileup.depth())
            });
        if depth == 0 {
            return None;
        }
        let mut map = AttributeMap::new();
        map.put(
            keys::SPANNING_DELETIONS_KEY,
            format!("{:.2}", deletions as f64 / depth as f64),
        );
        Some(map)
    }
}

/// Observed `A,C,G,T` counts summed over samples (`BaseCounts`).
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseCounts;

impl VariantAnnotation for BaseCounts {
    fn name(&self) -> &'static str {
        "BaseCounts"
    }

    fn key_names(&self) -> &'static [&'static str] {
        &[keys::BASE_COUNTS_KEY]
    }

    fn descriptions(&self) -> Vec<VcfHeaderLine> {
        vec![VcfHeaderLine::info(
            keys::BASE_COUNTS_KEY,
            HeaderCount::Fixed(NUM_BASES as u32),
            HeaderType::Integer,
            "Counts of each base",
        )]
    }
}

impl InfoFieldAnnotation for BaseCounts {
    fn annotate(&self, site: &SiteContext<'_>, _vc: &VariantContext) -> Option<AttributeMap> {
        if site.pileups.is_empty() {
            return None;
        }
        let mut totals = [0i32; NUM_BASES];
        for pileup in site.pileups.values() {
            for (total, count) in totals.iter_mut().zip(pileup.base_counts()) {
                *total += count as i32;
            }
        }
        let mut map = AttributeMap::new();
        map.put(
            keys::BASE_COUNTS_KEY,
            AttributeValue::from(totals.to_vec()),
        );
        Some(map)
    }
}
