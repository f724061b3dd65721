//! Two-stage construction for records whose genotypes are decoded on demand.
//!
//! A [`RawVariantSite`] carries a sites-only record plus an undecoded
//! genotype payload. Callers that never look at samples (filters,
//! site-level annotation) never pay for decoding; [`RawVariantSite::materialize`]
//! decodes once and returns the validated full record on every later call.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use super::attributes::keys;
use super::{Allele, AttributeValue, GenotypeBuilder, GenotypesContext, VariantContext, VariantError};

/// Produces the genotypes of a site from some deferred representation.
pub trait GenotypeDecoder: Send + Sync + fmt::Debug {
    /// Decode against the site's allele list.
    fn decode(&self, site: &VariantContext) -> Result<GenotypesContext, VariantError>;

    /// Number of samples the payload describes, without decoding.
    fn sample_count(&self) -> usize;
}

/// A site record whose genotypes have not been decoded yet.
#[derive(Debug)]
pub struct RawVariantSite {
    site: VariantContext,
    decoder: Option<Arc<dyn GenotypeDecoder>>,
    materialized: OnceCell<Result<VariantContext, VariantError>>,
}

impl RawVariantSite {
    /// Pair a sites-only record with its deferred genotypes.
    pub fn new(site: VariantContext, decoder: Arc<dyn GenotypeDecoder>) -> Self {
        Self {
            site,
            decoder: Some(decoder),
            materialized: OnceCell::new(),
        }
    }

    /// A record with nothing to decode.
    pub fn sites_only(site: VariantContext) -> Self {
        Self {
            site,
            decoder: None,
            materialized: OnceCell::new(),
        }
    }

    /// Site-level view; genotypes are absent until materialised.
    pub fn site(&self) -> &VariantContext {
        &self.site
    }

    /// Samples in the deferred payload.
    pub fn sample_count(&self) -> usize {
        self.decoder.as_ref().map_or(0, |d| d.sample_count())
    }

    /// Whether decoding already ran.
    pub fn is_materialized(&self) -> bool {
        self.materialized.get().is_some()
    }

    /// Decode genotypes (once) and return the full, validated record.
    pub fn materialize(&self) -> Result<&VariantContext, VariantError> {
        self.materialized
            .get_or_init(|| match &self.decoder {
                Some(decoder) => {
                    let genotypes = decoder.decode(&self.site)?;
                    self.site.modify_genotypes(genotypes)
                }
                None => Ok(self.site.clone()),
            })
            .as_ref()
            .map_err(Clone::clone)
    }
}

/// Genotypes in VCF `FORMAT` + per-sample column form.
///
/// `GT` indexes into the site's alleles (`.` for a no-call, `|` for phased);
/// `GQ` and `DP` are integers, `AD` and `PL` comma-separated integers. Every
/// other key is kept as a string attribute; `.` values are skipped.
#[derive(Debug, Clone)]
pub struct FormatFieldDecoder {
    format: Vec<String>,
    samples: Vec<(String, String)>,
}

impl FormatFieldDecoder {
    /// `format` is the colon-separated FORMAT column; `samples` pairs sample
    /// names with their raw columns.
    pub fn new(format: &str, samples: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            format: format.split(':').map(str::to_string).collect(),
            samples: samples.into_iter().collect(),
        }
    }

    fn decode_gt(site: &VariantContext, sample: &str, raw: &str) -> Result<(Vec<Allele>, bool), VariantError> {
        let phased = raw.contains('|');
        let alleles = raw
            .split(['/', '|'])
            .map(|index| {
                if index == keys::MISSING_VALUE {
                    return Ok(Allele::no_call());
                }
                index
                    .parse::<usize>()
                    .ok()
                    .and_then(|i| site.alleles().get(i).cloned())
                    .ok_or_else(|| VariantError::GenotypeDecode {
                        sample: sample.to_string(),
                        reason: format!("allele index {index:?} out of range"),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok((alleles, phased))
    }

    fn parse_ints(sample: &str, key: &str, raw: &str) -> Result<Vec<i32>, VariantError> {
        raw.split(',')
            .map(|part| {
                part.trim().parse::<i32>().map_err(|err| VariantError::GenotypeDecode {
                    sample: sample.to_string(),
                    reason: format!("{key} value {part:?}: {err}"),
                })
            })
            .collect()
    }
}

impl GenotypeDecoder for FormatFieldDecoder {
    fn decode(&self, site: &VariantContext) -> Result<GenotypesContext, VariantError> {
        let mut genotypes = GenotypesContext::with_capacity(self.samples.len());
        for (sample, column) in &self.samples {
            let mut builder = GenotypeBuilder::new(sample.clone(), Vec::new());
            for (key, raw) in self.format.iter().zip(column.split(':')) {
                if raw == keys::MISSING_VALUE && key != keys::GENOTYPE_KEY {
                    continue;
                }
                builder = match key.as_str() {
                    keys::GENOTYPE_KEY => {
                        let (alleles, phased) = Self::decode_gt(site, sample, raw)?;
                        builder.alleles(alleles).phased(phased)
                    }
                    keys::GENOTYPE_QUALITY_KEY => builder.gq(Self::parse_ints(sample, key, raw)?[0]),
                    keys::DEPTH_KEY => builder.dp(Self::parse_ints(sample, key, raw)?[0]),
                    keys::GENOTYPE_ALLELE_DEPTHS => builder.ad(Self::parse_ints(sample, key, raw)?),
                    keys::GENOTYPE_PL_KEY => builder.pl(Self::parse_ints(sample, key, raw)?),
                    other => builder.attribute(other, AttributeValue::String(raw.to_string()))?,
                };
            }
            genotypes.add(builder.build()?)?;
        }
        Ok(genotypes)
    }

    fn sample_count(&self) -> usize {
        self.samples.len()
    }
}
