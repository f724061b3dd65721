use std::collections::BTreeSet;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::context::NO_LOG10_P_ERROR;
use super::{Allele, AttributeMap, AttributeValue, GenotypesContext, VariantContext, VariantError};

/// Fluent assembler for [`VariantContext`].
///
/// Setters consume and return the builder; [`VariantContextBuilder::make`]
/// borrows it, so one builder can stamp out many records. Every record is
/// validated before it is returned.
#[derive(Debug, Clone)]
pub struct VariantContextBuilder {
    source: Option<Arc<str>>,
    contig: Option<Arc<str>>,
    start: Option<u32>,
    stop: Option<u32>,
    id: Option<String>,
    alleles: Option<Vec<Allele>>,
    genotypes: Arc<GenotypesContext>,
    neg_log10_p_error: f64,
    filters: Option<BTreeSet<String>>,
    attributes: AttributeMap,
    reference_base_for_indel: Option<u8>,
}

impl Default for VariantContextBuilder {
    fn default() -> Self {
        Self {
            source: None,
            contig: None,
            start: None,
            stop: None,
            id: None,
            alleles: None,
            genotypes: Arc::new(GenotypesContext::new().immutable()),
            neg_log10_p_error: NO_LOG10_P_ERROR,
            filters: None,
            attributes: AttributeMap::new(),
            reference_base_for_indel: None,
        }
    }
}

impl VariantContextBuilder {
    /// Builder with every required field set.
    pub fn new(
        source: impl Into<Arc<str>>,
        contig: impl Into<Arc<str>>,
        start: u32,
        stop: u32,
        alleles: impl IntoIterator<Item = Allele>,
    ) -> Self {
        Self::default()
            .source(source)
            .loc(contig, start, stop)
            .alleles(alleles)
    }

    /// Builder seeded from an existing record.
    pub fn from_context(vc: &VariantContext) -> Self {
        Self {
            source: Some(Arc::clone(&vc.source)),
            contig: Some(Arc::clone(&vc.contig)),
            start: Some(vc.start),
            stop: Some(vc.stop),
            id: vc.id.clone(),
            alleles: Some(vc.alleles.to_vec()),
            genotypes: Arc::clone(&vc.genotypes),
            neg_log10_p_error: vc.neg_log10_p_error,
            filters: vc.filters.clone(),
            attributes: vc.attributes.clone(),
            reference_base_for_indel: vc.reference_base_for_indel,
        }
    }

    /// Track label.
    pub fn source(mut self, source: impl Into<Arc<str>>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Contig, start and stop in one call.
    pub fn loc(mut self, contig: impl Into<Arc<str>>, start: u32, stop: u32) -> Self {
        self.contig = Some(contig.into());
        self.start = Some(start);
        self.stop = Some(stop);
        self
    }

    /// Contig name.
    pub fn chr(mut self, contig: impl Into<Arc<str>>) -> Self {
        self.contig = Some(contig.into());
        self
    }

    /// 1-based start.
    pub fn start(mut self, start: u32) -> Self {
        self.start = Some(start);
        self
    }

    /// 1-based inclusive stop.
    pub fn stop(mut self, stop: u32) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Record identifier.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.id = if id.is_empty() || id == super::attributes::keys::EMPTY_ID_FIELD {
            None
        } else {
            Some(id)
        };
        self
    }

    /// Clear the identifier.
    pub fn no_id(mut self) -> Self {
        self.id = None;
        self
    }

    /// Allele list; order is kept except that the reference moves first.
    pub fn alleles(mut self, alleles: impl IntoIterator<Item = Allele>) -> Self {
        self.alleles = Some(alleles.into_iter().collect());
        self
    }

    /// Alleles currently set.
    pub fn current_alleles(&self) -> &[Allele] {
        self.alleles.as_deref().unwrap_or(&[])
    }

    /// Genotypes; the collection is frozen on entry.
    pub fn genotypes(mut self, genotypes: GenotypesContext) -> Self {
        self.genotypes = Arc::new(genotypes.immutable());
        self
    }

    /// Genotypes shared with another record.
    pub fn shared_genotypes(mut self, genotypes: Arc<GenotypesContext>) -> Self {
        self.genotypes = genotypes;
        self
    }

    /// Drop all genotypes.
    pub fn no_genotypes(self) -> Self {
        self.genotypes(GenotypesContext::new())
    }

    /// Quality as -log10(P(error)).
    pub fn log10_p_error(mut self, neg_log10_p_error: f64) -> Self {
        self.neg_log10_p_error = neg_log10_p_error;
        self
    }

    /// Phred-scaled quality.
    pub fn phred_qual(self, qual: f64) -> Self {
        self.log10_p_error(qual / 10.0)
    }

    /// Filters that failed.
    pub fn filters(mut self, filters: impl IntoIterator<Item = String>) -> Self {
        self.filters = Some(filters.into_iter().collect());
        self
    }

    /// Add a single failed filter.
    pub fn filter(mut self, filter: impl Into<String>) -> Self {
        self.filters
            .get_or_insert_with(BTreeSet::new)
            .insert(filter.into());
        self
    }

    /// Mark the record as passing all filters.
    pub fn passed_filters(mut self) -> Self {
        self.filters = Some(BTreeSet::new());
        self
    }

    /// Mark the record as never filtered.
    pub fn unfiltered(mut self) -> Self {
        self.filters = None;
        self
    }

    /// Replace the attribute map.
    pub fn attributes(mut self, attributes: AttributeMap) -> Self {
        self.attributes = attributes;
        self
    }

    /// Set one attribute.
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.attributes.put(key, value);
        self
    }

    /// Remove one attribute.
    pub fn rm_attribute(mut self, key: &str) -> Self {
        self.attributes.remove(key);
        self
    }

    /// Attributes currently set.
    pub fn current_attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Padding base stripped from indel alleles.
    pub fn reference_base_for_indel(mut self, base: Option<u8>) -> Self {
        self.reference_base_for_indel = base.map(|b| b.to_ascii_uppercase());
        self
    }

    /// Validate and produce a record.
    pub fn make(&self) -> Result<VariantContext, VariantError> {
        let source = self.source.clone().ok_or(VariantError::MissingField("source"))?;
        let contig = self.contig.clone().ok_or(VariantError::MissingField("contig"))?;
        let start = self.start.ok_or(VariantError::MissingField("start"))?;
        let stop = self.stop.ok_or(VariantError::MissingField("stop"))?;
        let alleles = self
            .alleles
            .as_ref()
            .ok_or(VariantError::MissingField("alleles"))?;

        let mut ordered = Vec::with_capacity(alleles.len());
        ordered.extend(alleles.iter().filter(|a| a.is_reference()).cloned());
        ordered.extend(alleles.iter().filter(|a| a.is_non_reference()).cloned());

        let genotypes = if self.genotypes.is_mutable() {
            Arc::new(GenotypesContext::clone(&self.genotypes).immutable())
        } else {
            Arc::clone(&self.genotypes)
        };

        let vc = VariantContext {
            source,
            contig,
            start,
            stop,
            id: self.id.clone(),
            alleles: Arc::from(ordered),
            genotypes,
            neg_log10_p_error: self.neg_log10_p_error,
            filters: self.filters.clone(),
            attributes: self.attributes.clone(),
            reference_base_for_indel: self.reference_base_for_indel,
            variant_type: OnceCell::new(),
        };
        vc.validate()?;
        Ok(vc)
    }
}

impl From<&VariantContext> for VariantContextBuilder {
    fn from(vc: &VariantContext) -> Self {
        VariantContextBuilder::from_context(vc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::GenotypeBuilder;
    use pretty_assertions::assert_eq;

    fn snp() -> Vec<Allele> {
        vec![
            Allele::create("A", true).expect("ref"),
            Allele::create("G", false).expect("alt"),
        ]
    }

    #[test]
    fn missing_fields_are_reported() {
        let err = VariantContextBuilder::default()
            .loc("chr1", 1, 1)
            .alleles(snp())
            .make()
            .expect_err("no source");
        assert_eq!(err, VariantError::MissingField("source"));

        let err = VariantContextBuilder::default()
            .source("t")
            .loc("chr1", 1, 1)
            .make()
            .expect_err("no alleles");
        assert_eq!(err, VariantError::MissingField("alleles"));
    }

    #[test]
    fn copy_round_trip_is_equal() {
        let alleles = snp();
        let genotype = GenotypeBuilder::new("s1", alleles.clone())
            .gq(30)
            .dp(12)
            .ad(vec![6, 6])
            .build()
            .expect("genotype");
        let vc = VariantContextBuilder::new("t", "chr2", 10, 10, alleles)
            .id("rs1")
            .phred_qual(50.0)
            .filter("LowQual")
            .attribute("DP", 12)
            .genotypes(GenotypesContext::from_genotypes(vec![genotype]))
            .make()
            .expect("valid");
        let copy = VariantContextBuilder::from(&vc).make().expect("copy");
        assert_eq!(copy, vc);
        assert!(Arc::ptr_eq(copy.shared_genotypes(), vc.shared_genotypes()));
    }

    #[test]
    fn builder_reuse_does_not_leak_into_made_records() {
        let builder = VariantContextBuilder::new("t", "chr1", 5, 5, snp()).attribute("X", 1);
        let first = builder.make().expect("first");
        let second = builder.attribute("X", 2).make().expect("second");
        assert_eq!(first.attribute_as_int("X", 0), 1);
        assert_eq!(second.attribute_as_int("X", 0), 2);
    }

    #[test]
    fn dot_id_means_no_id() {
        let vc = VariantContextBuilder::new("t", "chr1", 5, 5, snp())
            .id(".")
            .make()
            .expect("valid");
        assert!(!vc.has_id());
    }
}
