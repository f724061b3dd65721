use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;

use crate::annotation::genotype::{
    AlleleBalanceBySample, DepthPerAlleleBySample, DepthPerSampleHC, MappingQualityZeroBySample,
};
use crate::annotation::info::{
    AlleleBalance, BaseCounts, ChromosomeCounts, DepthOfCoverage, FisherStrand, HardyWeinberg,
    HomopolymerRun, InbreedingCoeff, MappingQualityZero, QualByDepth, RankSumTest, RmsMappingQuality,
    SpanningDeletions, TandemRepeatAnnotator,
};
use crate::annotation::{AnnotationError, GenotypeAnnotation, InfoFieldAnnotation};

/// Tags grouping annotations for bulk selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnnotationGroup {
    /// Annotations produced by default.
    Standard,
    /// Useful but not part of the default set.
    Experimental,
    /// Still under development.
    WorkInProgress,
    /// Mann-Whitney rank-sum tests.
    RankSumTest,
}

impl AnnotationGroup {
    /// Every group.
    pub const ALL: [AnnotationGroup; 4] = [
        AnnotationGroup::Standard,
        AnnotationGroup::Experimental,
        AnnotationGroup::WorkInProgress,
        AnnotationGroup::RankSumTest,
    ];

    /// Canonical name.
    pub fn name(self) -> &'static str {
        match self {
            AnnotationGroup::Standard => "Standard",
            AnnotationGroup::Experimental => "Experimental",
            AnnotationGroup::WorkInProgress => "WorkInProgress",
            AnnotationGroup::RankSumTest => "RankSumTest",
        }
    }
}

impl fmt::Display for AnnotationGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for AnnotationGroup {
    type Err = AnnotationError;

    /// Accepts the canonical name with or without an `Annotation` suffix.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bare = s.strip_suffix("Annotation").unwrap_or(s);
        AnnotationGroup::ALL
            .into_iter()
            .find(|group| group.name().eq_ignore_ascii_case(bare))
            .ok_or_else(|| AnnotationError::UnknownGroup(s.to_string()))
    }
}

/// Constructor of a fresh annotation instance.
#[derive(Clone, Copy)]
pub enum AnnotationFactory {
    /// Site-level annotation.
    Info(fn() -> Box<dyn InfoFieldAnnotation>),
    /// Per-sample annotation.
    Genotype(fn() -> Box<dyn GenotypeAnnotation>),
}

impl fmt::Debug for AnnotationFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnnotationFactory::Info(_) => f.write_str("Info"),
            AnnotationFactory::Genotype(_) => f.write_str("Genotype"),
        }
    }
}

/// Metadata describing a registered annotation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationInfo {
    /// Registered name.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Groups the annotation belongs to.
    pub groups: Vec<AnnotationGroup>,
    /// Whether it writes INFO (`true`) or FORMAT fields.
    pub is_info: bool,
}

#[derive(Debug, Clone)]
struct RegistryEntry {
    name: &'static str,
    description: &'static str,
    groups: &'static [AnnotationGroup],
    factory: AnnotationFactory,
}

/// Registry of available annotations, in registration order.
#[derive(Debug, Default, Clone)]
pub struct AnnotationRegistry {
    entries: Vec<RegistryEntry>,
}

static BUILTIN: Lazy<AnnotationRegistry> = Lazy::new(AnnotationRegistry::with_builtins);

impl AnnotationRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// The shared registry of built-in annotations.
    pub fn builtin() -> &'static AnnotationRegistry {
        &BUILTIN
    }

    /// Registry pre-populated with the built-in annotations.
    pub fn with_builtins() -> Self {
        use AnnotationGroup::{Experimental, Standard, WorkInProgress};
        const RANK_SUM: AnnotationGroup = AnnotationGroup::RankSumTest;

        let mut registry = Self::new();
        registry.register_info("BaseCounts", "Counts of each base across samples", &[Experimental], || {
            Box::new(BaseCounts)
        });
        registry.register_info(
            "AlleleBalance",
            "Allele balance at heterozygous and homozygous sites",
            &[Experimental],
            || Box::new(AlleleBalance),
        );
        registry.register_info(
            "BaseQualityRankSumTest",
            "Rank-sum test of alt versus ref base qualities",
            &[Standard, RANK_SUM],
            || Box::new(RankSumTest::base_quality()),
        );
        registry.register_info(
            "ChromosomeCounts",
            "Allele count, frequency and number of called chromosomes",
            &[Standard],
            || Box::new(ChromosomeCounts),
        );
        registry.register_info("DepthOfCoverage", "Total read depth across samples", &[Standard], || {
            Box::new(DepthOfCoverage)
        });
        registry.register_info("FisherStrand", "Phred-scaled Fisher test of strand bias", &[Standard], || {
            Box::new(FisherStrand)
        });
        registry.register_info(
            "HardyWeinberg",
            "Phred-scaled Hardy-Weinberg equilibrium p-value",
            &[WorkInProgress],
            || Box::new(HardyWeinberg),
        );
        registry.register_info(
            "HomopolymerRun",
            "Longest homopolymer run of the alternate base next to the site",
            &[Experimental],
            || Box::new(HomopolymerRun),
        );
        registry.register_info(
            "InbreedingCoeff",
            "Inbreeding coefficient from genotype likelihoods of founders",
            &[Standard],
            || Box::new(InbreedingCoeff::default()),
        );
        registry.register_info(
            "MappingQualityRankSumTest",
            "Rank-sum test of alt versus ref mapping qualities",
            &[Standard, RANK_SUM],
            || Box::new(RankSumTest::mapping_quality()),
        );
        registry.register_info("MappingQualityZero", "Reads with mapping quality zero", &[Standard], || {
            Box::new(MappingQualityZero)
        });
        registry.register_info("QualByDepth", "Variant quality normalised by depth", &[Standard], || {
            Box::new(QualByDepth)
        });
        registry.register_info(
            "ReadPosRankSumTest",
            "Rank-sum test of alt versus ref read positions",
            &[Standard, RANK_SUM],
            || Box::new(RankSumTest::read_position()),
        );
        registry.register_info("RMSMappingQuality", "Root mean square mapping quality", &[Standard], || {
            Box::new(RmsMappingQuality)
        });
        registry.register_info(
            "SpanningDeletions",
            "Fraction of reads with a deletion spanning the site",
            &[Standard],
            || Box::new(SpanningDeletions),
        );
        registry.register_info(
            "TandemRepeatAnnotator",
            "Tandem repeat unit and repeats per allele for indels",
            &[Standard],
            || Box::new(TandemRepeatAnnotator),
        );
        registry.register_genotype(
            "AlleleBalanceBySample",
            "Per-sample allele balance at heterozygous SNPs",
            &[Experimental],
            || Box::new(AlleleBalanceBySample),
        );
        registry.register_genotype(
            "DepthPerAlleleBySample",
            "Per-sample read depth of each allele",
            &[Standard],
            || Box::new(DepthPerAlleleBySample),
        );
        registry.register_genotype("DepthPerSampleHC", "Per-sample informative read depth", &[Standard], || {
            Box::new(DepthPerSampleHC)
        });
        registry.register_genotype(
            "MappingQualityZeroBySample",
            "Per-sample reads with mapping quality zero",
            &[Experimental],
            || Box::new(MappingQualityZeroBySample),
        );
        registry
    }

    fn push(&mut self, entry: RegistryEntry) {
        self.entries.retain(|existing| existing.name != entry.name);
        self.entries.push(entry);
    }

    /// Register a site-level annotation; re-registering a name replaces it.
    pub fn register_info(
        &mut self,
        name: &'static str,
        description: &'static str,
        groups: &'static [AnnotationGroup],
        factory: fn() -> Box<dyn InfoFieldAnnotation>,
    ) {
        self.push(RegistryEntry {
            name,
            description,
            groups,
            factory: AnnotationFactory::Info(factory),
        });
    }

    /// Register a per-sample annotation; re-registering a name replaces it.
    pub fn register_genotype(
        &mut self,
        name: &'static str,
        description: &'static str,
        groups: &'static [AnnotationGroup],
        factory: fn() -> Box<dyn GenotypeAnnotation>,
    ) {
        self.push(RegistryEntry {
            name,
            description,
            groups,
            factory: AnnotationFactory::Genotype(factory),
        });
    }

    /// Factory registered under `name`.
    pub fn get(&self, name: &str) -> Option<AnnotationFactory> {
        self.entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| entry.factory)
    }

    /// Whether `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// List all registered annotations in registration order.
    pub fn list(&self) -> Vec<AnnotationInfo> {
        self.entries
            .iter()
            .map(|entry| AnnotationInfo {
                name: entry.name,
                description: entry.description,
                groups: entry.groups.to_vec(),
                is_info: matches!(entry.factory, AnnotationFactory::Info(_)),
            })
            .collect()
    }

    /// Check that every requested group and name exists.
    pub fn validate(&self, groups: &[String], names: &[String]) -> Result<Vec<AnnotationGroup>, AnnotationError> {
        let parsed = groups
            .iter()
            .map(|group| group.parse::<AnnotationGroup>())
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(unknown) = names.iter().find(|name| !self.contains(name)) {
            return Err(AnnotationError::UnknownAnnotation(unknown.clone()));
        }
        Ok(parsed)
    }

    /// Instantiate the selected annotations in registration order.
    ///
    /// An entry is selected when `use_all` is set, when it is named, or when
    /// it belongs to a requested group; `exclusions` then remove entries.
    pub(crate) fn instantiate(
        &self,
        use_all: bool,
        groups: &[AnnotationGroup],
        names: &[String],
        exclusions: &[String],
    ) -> (Vec<Box<dyn InfoFieldAnnotation>>, Vec<Box<dyn GenotypeAnnotation>>) {
        let mut info = Vec::new();
        let mut genotype = Vec::new();
        for entry in &self.entries {
            let selected = use_all
                || names.iter().any(|name| name == entry.name)
                || entry.groups.iter().any(|group| groups.contains(group));
            if !selected || exclusions.iter().any(|name| name == entry.name) {
                continue;
            }
            match entry.factory {
                AnnotationFactory::Info(factory) => info.push(factory()),
                AnnotationFactory::Genotype(factory) => genotype.push(factory()),
            }
        }
        (info, genotype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_registry_lists_everything_once() {
        let listing = AnnotationRegistry::builtin().list();
        assert_eq!(listing.len(), 20);
        let mut names: Vec<_> = listing.iter().map(|info| info.name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 20);
        assert_eq!(listing.iter().filter(|info| !info.is_info).count(), 4);
    }

    #[test]
    fn groups_parse_leniently() {
        assert_eq!("StandardAnnotation".parse::<AnnotationGroup>(), Ok(AnnotationGroup::Standard));
        assert_eq!("ranksumtest".parse::<AnnotationGroup>(), Ok(AnnotationGroup::RankSumTest));
        assert!("Bogus".parse::<AnnotationGroup>().is_err());
    }

    #[test]
    fn selection_respects_exclusions() {
        let registry = AnnotationRegistry::builtin();
        let (info, genotype) = registry.instantiate(
            false,
            &[AnnotationGroup::RankSumTest],
            &["DepthOfCoverage".to_string()],
            &["ReadPosRankSumTest".to_string()],
        );
        let names: Vec<_> = info.iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["BaseQualityRankSumTest", "DepthOfCoverage", "MappingQualityRankSumTest"]);
        assert!(genotype.is_empty());
    }

    #[test]
    fn validation_reports_unknown_names() {
        let registry = AnnotationRegistry::builtin();
        assert!(registry.validate(&["Standard".into()], &["FisherStrand".into()]).is_ok());
        assert_eq!(
            registry.validate(&[], &["NoSuchThing".into()]),
            Err(AnnotationError::UnknownAnnotation("NoSuchThing".into()))
        );
    }
}
