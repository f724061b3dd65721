//! The variant data model: alleles, per-sample genotypes and the immutable
//! per-site [`VariantContext`], plus record-level utilities and merging.
//!
//! Completed values are immutable and `Send + Sync`; every change goes
//! through a builder seeded from an existing value.

mod allele;
mod attributes;
mod builder;
mod context;
mod error;
mod genotype;
mod genotypes;
mod lazy;
pub mod merge;
pub mod utils;

pub use allele::{acceptable_allele_bases, Allele, NO_CALL_STRING, NULL_ALLELE_STRING};
pub use attributes::{format_vcf_double, keys, AttributeMap, AttributeValue};
pub use builder::VariantContextBuilder;
pub use context::{type_of_biallelic_variant, VariantContext, VariantType, NO_LOG10_P_ERROR};
pub use error::{ContextViolation, VariantError};
pub use genotype::{pl_index, Genotype, GenotypeBuilder, GenotypeType};
pub use genotypes::{GenotypesContext, SampleOrderIter};
pub use lazy::{FormatFieldDecoder, GenotypeDecoder, RawVariantSite};
pub use merge::{simple_merge, FilteredRecordMergeType, GenotypeMergeType, MergeOptions};
