use std::collections::{HashMap, HashSet};

use rayon::prelude::*;
use tracing::{debug, info};

use crate::annotation::expression::VaExpression;
use crate::annotation::overlap::VariantOverlapAnnotator;
use crate::annotation::{
    AnnotationError, AnnotationRegistry, AnnotatorConfig, FeatureTracker, GenotypeAnnotation, HeaderSection,
    InfoFieldAnnotation, SiteContext, SiteInput, VcfHeaderLine,
};
use crate::variant::{
    keys, AttributeMap, AttributeValue, Genotype, GenotypeBuilder, GenotypesContext, VariantContext, VariantError,
};

/// Runs the selected annotations over sites and folds their output into new
/// records.
///
/// Per site the engine copies expression values from resource tracks, runs
/// every info annotation in registration order (a later annotation
/// overwrites an earlier one's key), annotates every genotype, then fills
/// rsIDs and overlap flags from dbSNP and comparison tracks.
#[derive(Debug)]
pub struct VariantAnnotatorEngine {
    info_annotations: Vec<Box<dyn InfoFieldAnnotation>>,
    genotype_annotations: Vec<Box<dyn GenotypeAnnotation>>,
    expressions: Vec<VaExpression>,
    header_info: HashMap<String, VcfHeaderLine>,
    overlaps: VariantOverlapAnnotator,
}

impl VariantAnnotatorEngine {
    /// Engine over the built-in registry.
    pub fn new(config: &AnnotatorConfig) -> Result<Self, AnnotationError> {
        Self::with_registry(AnnotationRegistry::builtin(), config)
    }

    /// Engine selecting annotations from `registry`.
    pub fn with_registry(registry: &AnnotationRegistry, config: &AnnotatorConfig) -> Result<Self, AnnotationError> {
        let groups = registry.validate(&config.groups, &config.annotations)?;
        if let Some(unknown) = config.exclusions.iter().find(|name| !registry.contains(name)) {
            return Err(AnnotationError::UnknownAnnotation(unknown.clone()));
        }
        let expressions = config
            .expressions
            .iter()
            .map(|text| VaExpression::parse(text, &config.resources))
            .collect::<Result<Vec<_>, _>>()?;

        let (mut info_annotations, mut genotype_annotations) =
            registry.instantiate(config.use_all, &groups, &config.annotations, &config.exclusions);
        for annotation in &mut info_annotations {
            annotation.initialize(config);
        }
        for annotation in &mut genotype_annotations {
            annotation.initialize(config);
        }

        let engine = Self {
            info_annotations,
            genotype_annotations,
            expressions,
            header_info: HashMap::new(),
            overlaps: VariantOverlapAnnotator::new(config.dbsnp.as_deref(), &config.comp_tracks),
        };
        info!(
            info = ?engine.info_annotation_names(),
            genotype = ?engine.genotype_annotation_names(),
            expressions = engine.expressions.len(),
            "selected annotations"
        );
        Ok(engine)
    }

    /// Register INFO header lines of resource fields, keyed by
    /// `resource.field`, needed to interpret expression values.
    pub fn with_header_info(mut self, lines: impl IntoIterator<Item = VcfHeaderLine>) -> Self {
        self.header_info.extend(
            lines
                .into_iter()
                .filter(|line| line.section == HeaderSection::Info)
                .map(|line| (line.id.clone(), line)),
        );
        self
    }

    /// Names of the selected info annotations, in run order.
    pub fn info_annotation_names(&self) -> Vec<&'static str> {
        self.info_annotations.iter().map(|a| a.name()).collect()
    }

    /// Names of the selected genotype annotations, in run order.
    pub fn genotype_annotation_names(&self) -> Vec<&'static str> {
        self.genotype_annotations.iter().map(|a| a.name()).collect()
    }

    /// Header lines for every key the engine may write, without duplicates.
    pub fn vcf_annotation_descriptions(&self) -> Vec<VcfHeaderLine> {
        let mut seen = HashSet::new();
        let info = self.info_annotations.iter().flat_map(|a| a.descriptions());
        let genotype = self.genotype_annotations.iter().flat_map(|a| a.descriptions());
        let expressions = self
            .expressions
            .iter()
            .filter_map(|expr| self.header_info.get(&expr.full_name).cloned());
        info.chain(genotype)
            .chain(expressions)
            .chain(self.overlaps.header_lines())
            .filter(|line| seen.insert((line.section, line.id.clone())))
            .collect()
    }

    /// Annotate one site.
    pub fn annotate_context(
        &self,
        site: &SiteContext<'_>,
        vc: &VariantContext,
    ) -> Result<VariantContext, AnnotationError> {
        let mut attributes = vc.attributes().clone();

        for expression in &self.expressions {
            expression.apply(site.tracker, &self.header_info, vc, &mut attributes)?;
        }

        for annotation in &self.info_annotations {
            if let Some(values) = annotation.annotate(site, vc) {
                attributes.put_all(&values);
            }
        }

        let mut builder = vc.to_builder().attributes(attributes);
        if !self.genotype_annotations.is_empty() && vc.has_genotypes() {
            builder = builder.genotypes(self.annotate_genotypes(site, vc)?);
        }
        let annotated = builder.make()?;

        let annotated = self.overlaps.annotate_rs_id(site.tracker, &annotated)?;
        Ok(self.overlaps.annotate_overlaps(site.tracker, &annotated)?)
    }

    fn annotate_genotypes(&self, site: &SiteContext<'_>, vc: &VariantContext) -> Result<GenotypesContext, VariantError> {
        vc.genotypes()
            .iter()
            .map(|genotype| self.annotate_genotype(site, vc, genotype))
            .collect::<Result<Vec<_>, _>>()
            .map(GenotypesContext::from_genotypes)
    }

    fn annotate_genotype(
        &self,
        site: &SiteContext<'_>,
        vc: &VariantContext,
        genotype: &Genotype,
    ) -> Result<Genotype, VariantError> {
        let pileup = site.pileup(genotype.sample_name());
        let likelihoods = site.likelihood_map(genotype.sample_name());

        let mut values = AttributeMap::new();
        for annotation in &self.genotype_annotations {
            if let Some(result) = annotation.annotate(site, pileup, likelihoods, vc, genotype) {
                values.put_all(&result);
            }
        }
        if values.is_empty() {
            return Ok(genotype.clone());
        }

        let mut builder = GenotypeBuilder::from_genotype(genotype);
        for (key, value) in values.iter() {
            builder = fold_genotype_value(builder, key, value)?;
        }
        builder.build()
    }

    /// Annotate independent sites in parallel, preserving input order.
    pub fn annotate_batch(
        &self,
        tracker: &FeatureTracker,
        sites: &[SiteInput],
    ) -> Result<Vec<VariantContext>, AnnotationError> {
        debug!(sites = sites.len(), "annotating batch");
        sites
            .par_iter()
            .map(|site| self.annotate_context(&site.context(tracker), &site.variant))
            .collect()
    }
}

/// Route a genotype annotation value to its inline field or to the extended
/// attributes.
fn fold_genotype_value(
    builder: GenotypeBuilder,
    key: &str,
    value: &AttributeValue,
) -> Result<GenotypeBuilder, VariantError> {
    let builder = match key {
        keys::GENOTYPE_ALLELE_DEPTHS => match value.as_int_list() {
            Some(ad) => builder.ad(ad),
            None => builder,
        },
        keys::DEPTH_KEY => match value.as_int() {
            Some(dp) => builder.dp(dp),
            None => builder,
        },
        keys::GENOTYPE_QUALITY_KEY => match value.as_int() {
            Some(gq) => builder.gq(gq),
            None => builder,
        },
        keys::GENOTYPE_PL_KEY => match value.as_int_list() {
            Some(pl) => builder.pl(pl),
            None => builder,
        },
        keys::GENOTYPE_KEY => {
            debug!("ignoring genotype annotation of GT");
            builder
        }
        _ => builder.attribute(key, value.clone())?,
    };
    Ok(builder)
}
