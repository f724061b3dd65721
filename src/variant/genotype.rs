use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::attributes::keys;
use super::{Allele, AttributeMap, AttributeValue, VariantError};

/// Call class derived from a genotype's alleles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GenotypeType {
    /// Every allele is a no-call.
    NoCall,
    /// Every allele is the reference.
    HomRef,
    /// At least two distinct called alleles.
    Het,
    /// Every allele is the same non-reference allele.
    HomVar,
    /// Some alleles called, some not.
    Mixed,
    /// No alleles at all.
    Unavailable,
}

fn determine_type(alleles: &[Allele]) -> GenotypeType {
    if alleles.is_empty() {
        return GenotypeType::Unavailable;
    }

    let mut saw_no_call = false;
    let mut saw_multiple = false;
    let mut observed: Option<&Allele> = None;

    for allele in alleles {
        if allele.is_no_call() {
            saw_no_call = true;
        } else {
            match observed {
                None => observed = Some(allele),
                Some(first) if first != allele => saw_multiple = true,
                Some(_) => {}
            }
        }
    }

    match (saw_no_call, observed) {
        (true, None) => GenotypeType::NoCall,
        (true, Some(_)) => GenotypeType::Mixed,
        (false, None) => GenotypeType::NoCall,
        (false, Some(_)) if saw_multiple => GenotypeType::Het,
        (false, Some(allele)) if allele.is_reference() => GenotypeType::HomRef,
        (false, Some(_)) => GenotypeType::HomVar,
    }
}

/// Index of the unordered diploid pair `(a, b)` in a PL vector.
pub fn pl_index(a: usize, b: usize) -> usize {
    let (low, high) = if a <= b { (a, b) } else { (b, a) };
    high * (high + 1) / 2 + low
}

/// One sample's call at a site. Built through [`GenotypeBuilder`].
#[derive(Debug, Clone)]
pub struct Genotype {
    sample_name: String,
    alleles: Vec<Allele>,
    phased: bool,
    gq: i32,
    dp: i32,
    ad: Option<Arc<[i32]>>,
    pl: Option<Arc<[i32]>>,
    extended: AttributeMap,
    genotype_type: OnceCell<GenotypeType>,
}

impl Genotype {
    /// Sample this call belongs to.
    pub fn sample_name(&self) -> &str {
        &self.sample_name
    }

    /// Called alleles, one per chromosome copy.
    pub fn alleles(&self) -> &[Allele] {
        &self.alleles
    }

    /// Allele at position `idx`.
    pub fn allele(&self, idx: usize) -> Option<&Allele> {
        self.alleles.get(idx)
    }

    /// Number of alleles.
    pub fn ploidy(&self) -> usize {
        self.alleles.len()
    }

    /// Whether the alleles are phased.
    pub fn is_phased(&self) -> bool {
        self.phased
    }

    /// Genotype quality, `-1` when missing.
    pub fn gq(&self) -> i32 {
        self.gq
    }

    /// Whether a genotype quality is present.
    pub fn has_gq(&self) -> bool {
        self.gq != -1
    }

    /// Read depth, `-1` when missing.
    pub fn dp(&self) -> i32 {
        self.dp
    }

    /// Whether a read depth is present.
    pub fn has_dp(&self) -> bool {
        self.dp != -1
    }

    /// Per-allele read depths.
    pub fn ad(&self) -> Option<&[i32]> {
        self.ad.as_deref()
    }

    /// Whether per-allele depths are present.
    pub fn has_ad(&self) -> bool {
        self.ad.is_some()
    }

    /// Phred-scaled genotype likelihoods.
    pub fn pl(&self) -> Option<&[i32]> {
        self.pl.as_deref()
    }

    /// Whether likelihoods are present.
    pub fn has_likelihoods(&self) -> bool {
        self.pl.is_some()
    }

    /// Likelihoods converted back to log10 space.
    pub fn log10_likelihoods(&self) -> Option<Vec<f64>> {
        self.pl
            .as_ref()
            .map(|pl| pl.iter().map(|&p| f64::from(p) / -10.0).collect())
    }

    /// Extended attributes (everything except the inline fields).
    pub fn extended_attributes(&self) -> &AttributeMap {
        &self.extended
    }

    /// Whether an extended attribute is present.
    pub fn has_attribute(&self, key: &str) -> bool {
        self.extended.contains_key(key)
    }

    /// Whether `key` is present, counting the inline fields as well.
    pub fn has_any_attribute(&self, key: &str) -> bool {
        match key {
            keys::GENOTYPE_KEY => self.is_available(),
            keys::GENOTYPE_QUALITY_KEY => self.has_gq(),
            keys::DEPTH_KEY => self.has_dp(),
            keys::GENOTYPE_ALLELE_DEPTHS => self.has_ad(),
            keys::GENOTYPE_PL_KEY => self.has_likelihoods(),
            _ => self.has_attribute(key),
        }
    }

    /// Extended attribute value, if present.
    pub fn attribute(&self, key: &str) -> Option<&AttributeValue> {
        self.extended.get(key)
    }

    /// Extended attribute value, or `default` when absent.
    pub fn attribute_or<'a>(&'a self, key: &str, default: &'a AttributeValue) -> &'a AttributeValue {
        self.extended.get(key).unwrap_or(default)
    }

    /// Extended attribute as an integer.
    pub fn attribute_as_int(&self, key: &str, default: i32) -> i32 {
        self.extended
            .get(key)
            .and_then(AttributeValue::as_int)
            .unwrap_or(default)
    }

    /// Extended attribute as a double.
    pub fn attribute_as_double(&self, key: &str, default: f64) -> f64 {
        self.extended
            .get(key)
            .and_then(AttributeValue::as_double)
            .unwrap_or(default)
    }

    /// Call class, computed once per instance.
    pub fn genotype_type(&self) -> GenotypeType {
        *self
            .genotype_type
            .get_or_init(|| determine_type(&self.alleles))
    }

    /// All alleles are the reference.
    pub fn is_hom_ref(&self) -> bool {
        self.genotype_type() == GenotypeType::HomRef
    }

    /// At least two distinct called alleles.
    pub fn is_het(&self) -> bool {
        self.genotype_type() == GenotypeType::Het
    }

    /// All alleles are the same alternate.
    pub fn is_hom_var(&self) -> bool {
        self.genotype_type() == GenotypeType::HomVar
    }

    /// Hom-ref or hom-var.
    pub fn is_hom(&self) -> bool {
        self.is_hom_ref() || self.is_hom_var()
    }

    /// Every allele is a no-call.
    pub fn is_no_call(&self) -> bool {
        self.genotype_type() == GenotypeType::NoCall
    }

    /// Fully called (not no-call, mixed or unavailable).
    pub fn is_called(&self) -> bool {
        !matches!(
            self.genotype_type(),
            GenotypeType::NoCall | GenotypeType::Mixed | GenotypeType::Unavailable
        )
    }

    /// Partially called.
    pub fn is_mixed(&self) -> bool {
        self.genotype_type() == GenotypeType::Mixed
    }

    /// Has at least one allele.
    pub fn is_available(&self) -> bool {
        !self.alleles.is_empty()
    }

    /// Number of copies of `allele` (strict comparison).
    pub fn count_allele(&self, allele: &Allele) -> usize {
        self.alleles.iter().filter(|a| *a == allele).count()
    }

    /// Alleles joined by `/` or `|` depending on phasing.
    pub fn genotype_string(&self) -> String {
        let separator = if self.phased { "|" } else { "/" };
        self.alleles
            .iter()
            .map(Allele::display_string)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl PartialEq for Genotype {
    fn eq(&self, other: &Self) -> bool {
        self.sample_name == other.sample_name
            && self.alleles == other.alleles
            && self.phased == other.phased
            && self.gq == other.gq
            && self.dp == other.dp
            && self.ad == other.ad
            && self.pl == other.pl
            && self.extended == other.extended
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}", self.sample_name, self.genotype_string())?;
        if self.has_gq() {
            write!(f, " GQ {}", self.gq)?;
        }
        if self.has_dp() {
            write!(f, " DP {}", self.dp)?;
        }
        write!(f, "]")
    }
}

/// Fluent builder producing immutable [`Genotype`] snapshots.
///
/// `build` borrows the builder, so one builder can stamp out many genotypes
/// from a common template. AD and PL vectors are shared with every genotype
/// built from the same builder state rather than copied.
#[derive(Debug, Clone)]
pub struct GenotypeBuilder {
    sample_name: Option<String>,
    alleles: Vec<Allele>,
    phased: bool,
    gq: i32,
    dp: i32,
    ad: Option<Arc<[i32]>>,
    pl: Option<Arc<[i32]>>,
    extended: AttributeMap,
}

impl Default for GenotypeBuilder {
    fn default() -> Self {
        Self {
            sample_name: None,
            alleles: Vec::new(),
            phased: false,
            gq: -1,
            dp: -1,
            ad: None,
            pl: None,
            extended: AttributeMap::new(),
        }
    }
}

impl GenotypeBuilder {
    /// Builder for `sample_name` with the given alleles.
    pub fn new(sample_name: impl Into<String>, alleles: impl IntoIterator<Item = Allele>) -> Self {
        Self::default().name(sample_name).alleles(alleles)
    }

    /// Builder initialised from an existing genotype.
    pub fn from_genotype(genotype: &Genotype) -> Self {
        Self {
            sample_name: Some(genotype.sample_name.clone()),
            alleles: genotype.alleles.clone(),
            phased: genotype.phased,
            gq: genotype.gq,
            dp: genotype.dp,
            ad: genotype.ad.clone(),
            pl: genotype.pl.clone(),
            extended: genotype.extended.clone(),
        }
    }

    /// Set the sample name.
    pub fn name(mut self, sample_name: impl Into<String>) -> Self {
        self.sample_name = Some(sample_name.into());
        self
    }

    /// Replace the alleles.
    pub fn alleles(mut self, alleles: impl IntoIterator<Item = Allele>) -> Self {
        self.alleles = alleles.into_iter().collect();
        self
    }

    /// Set the phase flag.
    pub fn phased(mut self, phased: bool) -> Self {
        self.phased = phased;
        self
    }

    /// Set the genotype quality.
    pub fn gq(mut self, gq: i32) -> Self {
        self.gq = gq;
        self
    }

    /// Clear the genotype quality.
    pub fn no_gq(mut self) -> Self {
        self.gq = -1;
        self
    }

    /// Set the read depth.
    pub fn dp(mut self, dp: i32) -> Self {
        self.dp = dp;
        self
    }

    /// Clear the read depth.
    pub fn no_dp(mut self) -> Self {
        self.dp = -1;
        self
    }

    /// Set the per-allele depths.
    pub fn ad(mut self, ad: impl Into<Arc<[i32]>>) -> Self {
        self.ad = Some(ad.into());
        self
    }

    /// Clear the per-allele depths.
    pub fn no_ad(mut self) -> Self {
        self.ad = None;
        self
    }

    /// Set the phred-scaled likelihoods.
    pub fn pl(mut self, pl: impl Into<Arc<[i32]>>) -> Self {
        self.pl = Some(pl.into());
        self
    }

    /// Set likelihoods from log10 values, normalised so the best is PL 0.
    pub fn log10_likelihoods(self, log10: &[f64]) -> Self {
        let best = log10.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let pl: Vec<i32> = log10
            .iter()
            .map(|gl| (-10.0 * (gl - best)).round().min(f64::from(i32::MAX)) as i32)
            .collect();
        self.pl(pl)
    }

    /// Clear the likelihoods.
    pub fn no_pl(mut self) -> Self {
        self.pl = None;
        self
    }

    /// Set one extended attribute. Inline keys (GT, GQ, DP, AD, PL) are rejected.
    pub fn attribute(
        mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Result<Self, VariantError> {
        let key = key.into();
        if keys::INLINE_GENOTYPE_KEYS.contains(&key.as_str()) {
            return Err(VariantError::ReservedGenotypeKey(key));
        }
        self.extended.put(key, value);
        Ok(self)
    }

    /// Merge a map of extended attributes into the builder.
    pub fn attributes(mut self, attributes: &AttributeMap) -> Result<Self, VariantError> {
        for (key, value) in attributes.iter() {
            self = self.attribute(key.clone(), value.clone())?;
        }
        Ok(self)
    }

    /// Drop every extended attribute.
    pub fn no_attributes(mut self) -> Self {
        self.extended.clear();
        self
    }

    /// Snapshot the current state into an immutable genotype.
    pub fn build(&self) -> Result<Genotype, VariantError> {
        let sample_name = self
            .sample_name
            .clone()
            .ok_or(VariantError::MissingField("sample name"))?;

        for (field, values) in [
            (keys::GENOTYPE_ALLELE_DEPTHS, &self.ad),
            (keys::GENOTYPE_PL_KEY, &self.pl),
        ] {
            if let Some(&value) = values.as_deref().and_then(|v| v.iter().find(|&&x| x < 0)) {
                return Err(VariantError::NegativeValue {
                    field,
                    sample: sample_name,
                    value,
                });
            }
        }

        Ok(Genotype {
            sample_name,
            alleles: self.alleles.clone(),
            phased: self.phased,
            gq: self.gq,
            dp: self.dp,
            ad: self.ad.clone(),
            pl: self.pl.clone(),
            extended: self.extended.clone(),
            genotype_type: OnceCell::new(),
        })
    }
}

impl From<&Genotype> for GenotypeBuilder {
    fn from(genotype: &Genotype) -> Self {
        GenotypeBuilder::from_genotype(genotype)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn allele(bases: &str, is_ref: bool) -> Allele {
        Allele::create(bases, is_ref).expect("valid allele")
    }

    #[test_case(&[("A", true), ("A", true)], GenotypeType::HomRef ; "hom ref")]
    #[test_case(&[("A", true), ("C", false)], GenotypeType::Het ; "het")]
    #[test_case(&[("C", false), ("C", false)], GenotypeType::HomVar ; "hom var")]
    #[test_case(&[(".", false), (".", false)], GenotypeType::NoCall ; "no call")]
    #[test_case(&[("A", true), (".", false)], GenotypeType::Mixed ; "mixed")]
    #[test_case(&[], GenotypeType::Unavailable ; "unavailable")]
    fn classifies_genotypes(spec: &[(&str, bool)], expected: GenotypeType) {
        let alleles: Vec<Allele> = spec.iter().map(|(b, r)| allele(b, *r)).collect();
        let genotype = GenotypeBuilder::new("s1", alleles).build().expect("genotype");
        assert_eq!(genotype.genotype_type(), expected);
    }

    #[test]
    fn missing_sample_name_fails() {
        let result = GenotypeBuilder::default().build();
        assert_eq!(result.unwrap_err(), VariantError::MissingField("sample name"));
    }

    #[test]
    fn inline_keys_are_rejected() {
        for key in keys::INLINE_GENOTYPE_KEYS {
            let result = GenotypeBuilder::new("s1", vec![]).attribute(key, 1);
            assert!(matches!(result, Err(VariantError::ReservedGenotypeKey(_))));
        }
    }

    #[test]
    fn negative_pl_is_rejected() {
        let result = GenotypeBuilder::new("s1", vec![]).pl(vec![0, -3, 10]).build();
        assert!(matches!(result, Err(VariantError::NegativeValue { field: "PL", .. })));
    }

    #[test]
    fn builder_is_reusable() {
        let template = GenotypeBuilder::new("s1", vec![allele("A", true), allele("A", true)]).gq(30);
        let first = template.build().expect("first");
        let template = template.gq(50).name("s2");
        let second = template.build().expect("second");

        assert_eq!(first.gq(), 30);
        assert_eq!(first.sample_name(), "s1");
        assert_eq!(second.gq(), 50);
        assert_eq!(second.sample_name(), "s2");
    }

    #[test]
    fn attribute_defaults() {
        let genotype = GenotypeBuilder::new("s1", vec![])
            .attribute("XQ", "12")
            .expect("attribute")
            .build()
            .expect("genotype");
        assert!(genotype.has_attribute("XQ"));
        assert_eq!(genotype.attribute_as_int("XQ", 0), 12);
        assert_eq!(genotype.attribute_as_int("YY", 7), 7);
        let fallback = AttributeValue::from("none");
        assert_eq!(genotype.attribute_or("YY", &fallback), &fallback);
    }

    #[test]
    fn log10_likelihoods_are_normalised() {
        let genotype = GenotypeBuilder::new("s1", vec![])
            .log10_likelihoods(&[-5.0, -0.5, -2.5])
            .build()
            .expect("genotype");
        assert_eq!(genotype.pl(), Some(&[45, 0, 20][..]));
        assert_eq!(pl_index(0, 1), 1);
        assert_eq!(pl_index(1, 1), 2);
        assert_eq!(pl_index(2, 0), 3);
    }
}
