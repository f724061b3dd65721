use std::collections::BTreeMap;
use std::fmt;

use crate::annotation::{AnnotatorConfig, FeatureTracker, VcfHeaderLine};
use crate::genomics::{PerReadAlleleLikelihoodMap, ReadBackedPileup, ReferenceContext, StratifiedPileups};
use crate::variant::{AttributeMap, Genotype, VariantContext};

/// Per-sample read/allele likelihoods at one site.
pub type StratifiedLikelihoods = BTreeMap<String, PerReadAlleleLikelihoodMap>;

/// Everything an annotator may consult about one site besides the record.
#[derive(Debug, Clone, Copy)]
pub struct SiteContext<'a> {
    /// Reference window around the site.
    pub reference: &'a ReferenceContext,
    /// Per-sample pileups, keyed by sample name.
    pub pileups: &'a StratifiedPileups,
    /// Per-sample read likelihoods, when the caller computed them.
    pub likelihoods: Option<&'a StratifiedLikelihoods>,
    /// Resource, comparison and dbSNP tracks.
    pub tracker: &'a FeatureTracker,
}

impl<'a> SiteContext<'a> {
    /// Site context without likelihoods.
    pub fn new(reference: &'a ReferenceContext, pileups: &'a StratifiedPileups, tracker: &'a FeatureTracker) -> Self {
        Self {
            reference,
            pileups,
            likelihoods: None,
            tracker,
        }
    }

    /// Attach per-sample likelihood maps.
    pub fn with_likelihoods(mut self, likelihoods: &'a StratifiedLikelihoods) -> Self {
        self.likelihoods = Some(likelihoods);
        self
    }

    /// Pileup of one sample.
    pub fn pileup(&self, sample: &str) -> Option<&'a ReadBackedPileup> {
        self.pileups.get(sample)
    }

    /// Likelihood map of one sample.
    pub fn likelihood_map(&self, sample: &str) -> Option<&'a PerReadAlleleLikelihoodMap> {
        self.likelihoods.and_then(|maps| maps.get(sample))
    }

    /// Whether any sample has likelihoods.
    pub fn has_likelihoods(&self) -> bool {
        self.likelihoods.is_some_and(|maps| !maps.is_empty())
    }
}

/// Owned inputs for one site, used by batch annotation.
#[derive(Debug, Clone)]
pub struct SiteInput {
    /// Record to annotate.
    pub variant: VariantContext,
    /// Reference window around it.
    pub reference: ReferenceContext,
    /// Per-sample pileups.
    pub pileups: StratifiedPileups,
    /// Optional per-sample likelihoods.
    pub likelihoods: Option<StratifiedLikelihoods>,
}

impl SiteInput {
    /// Bundle a record with its reference window and pileups.
    pub fn new(variant: VariantContext, reference: ReferenceContext, pileups: StratifiedPileups) -> Self {
        Self {
            variant,
            reference,
            pileups,
            likelihoods: None,
        }
    }

    /// Attach likelihoods.
    pub fn with_likelihoods(mut self, likelihoods: StratifiedLikelihoods) -> Self {
        self.likelihoods = Some(likelihoods);
        self
    }

    /// Borrowed view for the engine.
    pub fn context<'a>(&'a self, tracker: &'a FeatureTracker) -> SiteContext<'a> {
        SiteContext {
            reference: &self.reference,
            pileups: &self.pileups,
            likelihoods: self.likelihoods.as_ref(),
            tracker,
        }
    }
}

/// Behaviour shared by every annotation.
pub trait VariantAnnotation: Send + Sync + fmt::Debug {
    /// Registered name.
    fn name(&self) -> &'static str;

    /// Keys this annotation may emit.
    fn key_names(&self) -> &'static [&'static str];

    /// Header lines describing the emitted keys.
    fn descriptions(&self) -> Vec<VcfHeaderLine>;

    /// One-time setup before the first site.
    fn initialize(&mut self, _config: &AnnotatorConfig) {}
}

/// Annotation producing site-level INFO fields.
pub trait InfoFieldAnnotation: VariantAnnotation {
    /// Values for this site, or `None` when the annotation does not apply.
    fn annotate(&self, site: &SiteContext<'_>, vc: &VariantContext) -> Option<AttributeMap>;
}

/// Annotation producing per-sample FORMAT fields.
pub trait GenotypeAnnotation: VariantAnnotation {
    /// Values for one sample, or `None` when the annotation does not apply.
    fn annotate(
        &self,
        site: &SiteContext<'_>,
        pileup: Option<&ReadBackedPileup>,
        likelihoods: Option<&PerReadAlleleLikelihoodMap>,
        vc: &VariantContext,
        genotype: &Genotype,
    ) -> Option<AttributeMap>;
}
