use std::collections::{BTreeSet, HashSet};
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::attributes::keys;
use super::{
    Allele, AttributeMap, AttributeValue, ContextViolation, Genotype, GenotypeBuilder,
    GenotypeType, GenotypesContext, VariantContextBuilder, VariantError,
};

/// Missing quality sentinel for `neg_log10_p_error`.
pub const NO_LOG10_P_ERROR: f64 = -1.0;

/// Variation class of a site, derived from its alleles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum VariantType {
    /// Only a reference allele.
    NoVariation,
    /// Single-base substitution.
    Snp,
    /// Multi-base substitution of equal length.
    Mnp,
    /// Insertion or deletion.
    Indel,
    /// Structural `<TAG>` allele.
    Symbolic,
    /// Alternate alleles of differing classes.
    Mixed,
}

impl fmt::Display for VariantType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VariantType::NoVariation => "NO_VARIATION",
            VariantType::Snp => "SNP",
            VariantType::Mnp => "MNP",
            VariantType::Indel => "INDEL",
            VariantType::Symbolic => "SYMBOLIC",
            VariantType::Mixed => "MIXED",
        };
        f.write_str(label)
    }
}

/// Class of a single reference/alternate pair.
pub fn type_of_biallelic_variant(reference: &Allele, allele: &Allele) -> VariantType {
    if allele.is_symbolic() || reference.is_symbolic() {
        VariantType::Symbolic
    } else if reference.len() == allele.len() {
        if allele.len() == 1 {
            VariantType::Snp
        } else {
            VariantType::Mnp
        }
    } else {
        VariantType::Indel
    }
}

/// The immutable record of one site: alleles, genotypes, quality, filters
/// and INFO attributes.
#[derive(Debug, Clone)]
pub struct VariantContext {
    pub(crate) source: Arc<str>,
    pub(crate) contig: Arc<str>,
    pub(crate) start: u32,
    pub(crate) stop: u32,
    pub(crate) id: Option<String>,
    pub(crate) alleles: Arc<[Allele]>,
    pub(crate) genotypes: Arc<GenotypesContext>,
    pub(crate) neg_log10_p_error: f64,
    pub(crate) filters: Option<BTreeSet<String>>,
    pub(crate) attributes: AttributeMap,
    pub(crate) reference_base_for_indel: Option<u8>,
    pub(crate) variant_type: OnceCell<VariantType>,
}

impl VariantContext {
    /// Builder seeded with this record's fields.
    pub fn to_builder(&self) -> VariantContextBuilder {
        VariantContextBuilder::from_context(self)
    }

    pub(crate) fn validate(&self) -> Result<(), VariantError> {
        self.validate_alleles()
            .and_then(|_| self.validate_location())
            .and_then(|_| self.validate_genotypes())
            .map_err(|reason| VariantError::InvalidContext {
                contig: self.contig.to_string(),
                start: self.start,
                reason,
            })
    }

    fn validate_alleles(&self) -> Result<(), ContextViolation> {
        if self.alleles.is_empty() {
            return Err(ContextViolation::EmptyAlleles);
        }
        if self.alleles[0].is_non_reference() {
            return Err(ContextViolation::MissingReference);
        }

        let mut seen_null = false;
        for (idx, allele) in self.alleles.iter().enumerate() {
            if idx > 0 && allele.is_reference() {
                return Err(ContextViolation::MultipleReferences(allele.to_string()));
            }
            if allele.is_no_call() {
                return Err(ContextViolation::NoCallAllele);
            }
            if allele.is_null() {
                if seen_null {
                    return Err(ContextViolation::MultipleNullAlleles);
                }
                seen_null = true;
            }
            if self.alleles[..idx].iter().any(|prior| prior.equals_ignore_ref(allele)) {
                return Err(ContextViolation::DuplicateAllele(allele.display_string()));
            }
        }
        Ok(())
    }

    fn validate_location(&self) -> Result<(), ContextViolation> {
        if self.stop < self.start {
            return Err(ContextViolation::StopBeforeStart { stop: self.stop });
        }
        let span = self.stop - self.start + 1;
        let reference = self.reference();
        let ref_len = reference.len();
        let mismatch = ContextViolation::ReferenceLengthMismatch { span, ref_len };

        if self.has_symbolic_alleles() {
            return Ok(());
        }
        if reference.is_null() && span != 1 {
            return Err(mismatch);
        }
        if reference.is_non_null() && (span as usize) > ref_len + 1 {
            return Err(mismatch);
        }

        let needs_padding = (span as usize) > ref_len;
        match (needs_padding, self.reference_base_for_indel) {
            (true, None) => Err(ContextViolation::MissingPaddingBase),
            (false, Some(base)) if (span as usize) == ref_len => {
                Err(ContextViolation::UnexpectedPaddingBase(base as char))
            }
            _ => Ok(()),
        }
    }

    fn validate_genotypes(&self) -> Result<(), ContextViolation> {
        if let Some(name) = self.genotypes.duplicate_sample() {
            return Err(ContextViolation::DuplicateSample(name.to_string()));
        }
        for genotype in self.genotypes.iter() {
            for allele in genotype.alleles() {
                if allele.is_called() && !self.has_allele(allele) {
                    return Err(ContextViolation::GenotypeAlleleMissing {
                        sample: genotype.sample_name().to_string(),
                        allele: allele.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Label of the track this record came from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Contig name.
    pub fn contig(&self) -> &str {
        &self.contig
    }

    /// 1-based start.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// 1-based inclusive stop.
    pub fn end(&self) -> u32 {
        self.stop
    }

    /// Number of reference bases spanned.
    pub fn span(&self) -> u32 {
        self.stop - self.start + 1
    }

    /// `contig:start-stop` string.
    pub fn location(&self) -> String {
        format!("{}:{}-{}", self.contig, self.start, self.stop)
    }

    /// Record identifier, if any.
    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    /// Whether an identifier is set.
    pub fn has_id(&self) -> bool {
        self.id.is_some()
    }

    /// All alleles, reference first.
    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    /// Number of alleles.
    pub fn n_alleles(&self) -> usize {
        self.alleles.len()
    }

    /// The reference allele.
    pub fn reference(&self) -> &Allele {
        &self.alleles[0]
    }

    /// Alternate alleles in order.
    pub fn alternate_alleles(&self) -> &[Allele] {
        &self.alleles[1..]
    }

    /// Alternate allele `idx`.
    pub fn alternate_allele(&self, idx: usize) -> Option<&Allele> {
        self.alternate_alleles().get(idx)
    }

    /// Strict membership test.
    pub fn has_allele(&self, allele: &Allele) -> bool {
        self.alleles.iter().any(|a| a == allele)
    }

    /// Membership test on bases alone.
    pub fn has_allele_ignoring_ref(&self, allele: &Allele) -> bool {
        self.alleles.iter().any(|a| a.equals_ignore_ref(allele))
    }

    /// Whether `allele` is one of the alternates.
    pub fn has_alternate_allele(&self, allele: &Allele) -> bool {
        self.alternate_alleles().iter().any(|a| a == allele)
    }

    /// Whether any allele is symbolic.
    pub fn has_symbolic_alleles(&self) -> bool {
        self.alleles.iter().any(Allele::is_symbolic)
    }

    /// Reference base stripped from indel alleles, if any.
    pub fn reference_base_for_indel(&self) -> Option<u8> {
        self.reference_base_for_indel
    }

    /// Whether a padding base is stored.
    pub fn has_reference_base_for_indel(&self) -> bool {
        self.reference_base_for_indel.is_some()
    }

    /// Genotypes of this site.
    pub fn genotypes(&self) -> &GenotypesContext {
        &self.genotypes
    }

    /// Shared handle on the genotypes.
    pub fn shared_genotypes(&self) -> &Arc<GenotypesContext> {
        &self.genotypes
    }

    /// Genotype for `sample_name`.
    pub fn genotype(&self, sample_name: &str) -> Option<&Genotype> {
        self.genotypes.get(sample_name)
    }

    /// Whether any genotypes are attached.
    pub fn has_genotypes(&self) -> bool {
        !self.genotypes.is_empty()
    }

    /// Number of samples.
    pub fn n_samples(&self) -> usize {
        self.genotypes.size()
    }

    /// Sample names in genotype order.
    pub fn sample_names(&self) -> Vec<&str> {
        self.genotypes.sample_names()
    }

    /// Quality as -log10(P(error)).
    pub fn neg_log10_p_error(&self) -> f64 {
        self.neg_log10_p_error
    }

    /// Whether a quality is set.
    pub fn has_log10_p_error(&self) -> bool {
        self.neg_log10_p_error != NO_LOG10_P_ERROR
    }

    /// Phred-scaled quality (`10 * -log10(P(error))`).
    pub fn phred_scaled_qual(&self) -> f64 {
        self.neg_log10_p_error * 10.0
    }

    /// Filters, `None` when filtering was never applied.
    pub fn filters(&self) -> Option<&BTreeSet<String>> {
        self.filters.as_ref()
    }

    /// Whether filters were evaluated.
    pub fn filters_were_applied(&self) -> bool {
        self.filters.is_some()
    }

    /// Failed at least one filter.
    pub fn is_filtered(&self) -> bool {
        self.filters.as_ref().is_some_and(|f| !f.is_empty())
    }

    /// Not failed by any filter (including never filtered).
    pub fn is_not_filtered(&self) -> bool {
        !self.is_filtered()
    }

    /// INFO attributes.
    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// INFO attribute value.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    /// Whether an INFO attribute is present.
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// INFO attribute as integer.
    pub fn attribute_as_int(&self, key: &str, default: i32) -> i32 {
        self.attribute(key)
            .and_then(AttributeValue::as_int)
            .unwrap_or(default)
    }

    /// INFO attribute as double.
    pub fn attribute_as_double(&self, key: &str, default: f64) -> f64 {
        self.attribute(key)
            .and_then(AttributeValue::as_double)
            .unwrap_or(default)
    }

    /// INFO attribute rendered as text.
    pub fn attribute_as_string(&self, key: &str) -> Option<String> {
        self.attribute(key).map(AttributeValue::as_string)
    }

    /// INFO attribute as boolean.
    pub fn attribute_as_bool(&self, key: &str, default: bool) -> bool {
        self.attribute(key)
            .and_then(AttributeValue::as_bool)
            .unwrap_or(default)
    }

    /// Variation class, computed once per instance.
    pub fn variant_type(&self) -> VariantType {
        *self.variant_type.get_or_init(|| self.determine_type())
    }

    fn determine_type(&self) -> VariantType {
        if self.alleles.len() <= 1 {
            return VariantType::NoVariation;
        }
        let reference = self.reference();
        let mut resolved: Option<VariantType> = None;
        for allele in self.alternate_alleles() {
            let pair = type_of_biallelic_variant(reference, allele);
            match resolved {
                None => resolved = Some(pair),
                Some(existing) if existing != pair => return VariantType::Mixed,
                Some(_) => {}
            }
        }
        resolved.unwrap_or(VariantType::NoVariation)
    }

    /// Site has at least one alternate allele.
    pub fn is_variant(&self) -> bool {
        self.variant_type() != VariantType::NoVariation
    }

    /// Single-base substitution site.
    pub fn is_snp(&self) -> bool {
        self.variant_type() == VariantType::Snp
    }

    /// Multi-base substitution site.
    pub fn is_mnp(&self) -> bool {
        self.variant_type() == VariantType::Mnp
    }

    /// Insertion/deletion site.
    pub fn is_indel(&self) -> bool {
        self.variant_type() == VariantType::Indel
    }

    /// Structural site.
    pub fn is_symbolic(&self) -> bool {
        self.variant_type() == VariantType::Symbolic
    }

    /// Alternates of differing classes.
    pub fn is_mixed(&self) -> bool {
        self.variant_type() == VariantType::Mixed
    }

    /// Exactly one alternate allele.
    pub fn is_biallelic(&self) -> bool {
        self.alleles.len() == 2
    }

    /// Biallelic indel whose reference is empty or the anchor base only.
    pub fn is_simple_insertion(&self) -> bool {
        self.is_indel()
            && self.is_biallelic()
            && self.reference().len() < self.alleles[1].len()
            && (self.reference().is_null()
                || (self.reference().len() == 1
                    && self.alleles[1].bases().starts_with(self.reference().bases())))
    }

    /// Biallelic indel whose alternate is empty or the anchor base only.
    pub fn is_simple_deletion(&self) -> bool {
        self.is_indel()
            && self.is_biallelic()
            && self.reference().len() > self.alleles[1].len()
            && (self.alleles[1].is_null()
                || (self.alleles[1].len() == 1
                    && self.reference().bases().starts_with(self.alleles[1].bases())))
    }

    /// Indel that is neither a simple insertion nor a simple deletion.
    pub fn is_complex_indel(&self) -> bool {
        self.is_indel() && !self.is_simple_insertion() && !self.is_simple_deletion()
    }

    /// Length change of each alternate relative to the reference.
    pub fn indel_lengths(&self) -> Option<Vec<i64>> {
        if !self.is_indel() && !self.is_mixed() {
            return None;
        }
        let ref_len = self.reference().len() as i64;
        Some(
            self.alternate_alleles()
                .iter()
                .map(|a| a.len() as i64 - ref_len)
                .collect(),
        )
    }

    /// Total called chromosomes over all genotypes.
    pub fn chromosome_count(&self) -> usize {
        self.genotypes
            .iter()
            .flat_map(Genotype::alleles)
            .filter(|a| a.is_called())
            .count()
    }

    /// Chromosomes carrying `allele`.
    pub fn chromosome_count_for(&self, allele: &Allele) -> usize {
        self.genotypes.iter().map(|g| g.count_allele(allele)).sum()
    }

    fn count_type(&self, genotype_type: GenotypeType) -> usize {
        self.genotypes
            .iter()
            .filter(|g| g.genotype_type() == genotype_type)
            .count()
    }

    /// Hom-ref genotypes.
    pub fn hom_ref_count(&self) -> usize {
        self.count_type(GenotypeType::HomRef)
    }

    /// Het genotypes.
    pub fn het_count(&self) -> usize {
        self.count_type(GenotypeType::Het)
    }

    /// Hom-var genotypes.
    pub fn hom_var_count(&self) -> usize {
        self.count_type(GenotypeType::HomVar)
    }

    /// No-call genotypes.
    pub fn no_call_count(&self) -> usize {
        self.count_type(GenotypeType::NoCall)
    }

    /// Partially called genotypes.
    pub fn mixed_count(&self) -> usize {
        self.count_type(GenotypeType::Mixed)
    }

    /// Every called chromosome carries the reference (or nothing is called).
    pub fn is_monomorphic_in_samples(&self) -> bool {
        self.chromosome_count_for(self.reference()) == self.chromosome_count()
    }

    /// At least one called chromosome carries an alternate.
    pub fn is_polymorphic_in_samples(&self) -> bool {
        !self.is_monomorphic_in_samples()
    }

    /// New record with different genotypes.
    pub fn modify_genotypes(&self, genotypes: GenotypesContext) -> Result<VariantContext, VariantError> {
        self.to_builder().genotypes(genotypes).make()
    }

    /// New record with different filters.
    pub fn modify_filters(&self, filters: Option<BTreeSet<String>>) -> Result<VariantContext, VariantError> {
        let builder = self.to_builder();
        match filters {
            Some(filters) => builder.filters(filters),
            None => builder.unfiltered(),
        }
        .make()
    }

    /// New record with a different attribute map.
    pub fn modify_attributes(&self, attributes: AttributeMap) -> Result<VariantContext, VariantError> {
        self.to_builder().attributes(attributes).make()
    }

    /// New record at a different location.
    pub fn modify_location(
        &self,
        contig: impl Into<Arc<str>>,
        start: u32,
        stop: u32,
    ) -> Result<VariantContext, VariantError> {
        self.to_builder().loc(contig, start, stop).make()
    }

    /// New record with a different identifier.
    pub fn modify_id(&self, id: Option<String>) -> Result<VariantContext, VariantError> {
        let builder = self.to_builder();
        match id {
            Some(id) => builder.id(id),
            None => builder.no_id(),
        }
        .make()
    }

    /// Restrict the record to `sample_names`.
    ///
    /// With `rederive_alleles` the allele list shrinks to the reference plus
    /// the alternates still carried by the remaining genotypes.
    pub fn sub_context_from_samples(
        &self,
        sample_names: &HashSet<String>,
        rederive_alleles: bool,
    ) -> Result<VariantContext, VariantError> {
        let genotypes = self.genotypes.subset_to_samples(sample_names);
        let mut builder = self.to_builder().shared_genotypes(Arc::clone(&genotypes));
        if rederive_alleles {
            let mut alleles = vec![self.reference().clone()];
            for allele in self.alternate_alleles() {
                if genotypes.iter().any(|g| g.count_allele(allele) > 0) {
                    alleles.push(allele.clone());
                }
            }
            builder = builder.alleles(alleles);
        }
        builder.make()
    }

    /// Genotypes rebuilt with every allele remapped through `map`.
    ///
    /// No-calls stay no-calls; alleles `map` returns `None` for become no-calls.
    pub(crate) fn remap_genotypes(
        &self,
        map: impl Fn(&Allele) -> Option<Allele>,
    ) -> Result<GenotypesContext, VariantError> {
        let mut remapped = GenotypesContext::with_capacity(self.n_samples());
        for genotype in self.genotypes.iter() {
            let alleles = genotype.alleles().iter().map(|a| {
                if a.is_called() {
                    map(a).unwrap_or_else(Allele::no_call)
                } else {
                    Allele::no_call()
                }
            });
            remapped.add(GenotypeBuilder::from(genotype).alleles(alleles).build()?)?;
        }
        Ok(remapped)
    }
}

impl PartialEq for VariantContext {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
            && self.contig == other.contig
            && self.start == other.start
            && self.stop == other.stop
            && self.id == other.id
            && self.alleles == other.alleles
            && self.genotypes == other.genotypes
            && self.neg_log10_p_error == other.neg_log10_p_error
            && self.filters == other.filters
            && self.attributes == other.attributes
            && self.reference_base_for_indel == other.reference_base_for_indel
    }
}

impl fmt::Display for VariantContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let alleles: Vec<String> = self.alleles.iter().map(ToString::to_string).collect();
        write!(
            f,
            "[VC {} @ {} Q{:.2} of type={} alleles=[{}] attr={} GT=[{}] filters={}]",
            self.source,
            self.location(),
            self.phred_scaled_qual(),
            self.variant_type(),
            alleles.join(", "),
            self.attributes.len(),
            self.genotypes
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(","),
            match &self.filters {
                None => keys::MISSING_VALUE.to_string(),
                Some(f) if f.is_empty() => keys::PASSES_FILTERS.to_string(),
                Some(f) => f.iter().cloned().collect::<Vec<_>>().join(";"),
            }
        )
    }
}
