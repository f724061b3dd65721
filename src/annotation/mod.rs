//! Variant annotation: a static registry of site (INFO) and per-sample
//! (FORMAT) annotations and the engine that runs a selection of them over
//! sites.
//!
//! Annotations see a site through a [`SiteContext`]: the reference window,
//! per-sample pileups, optional per-read allele likelihoods and the
//! [`FeatureTracker`] holding resource, comparison and dbSNP records.

mod api;
mod config;
mod engine;
mod error;
mod expression;
mod header;
mod overlap;
mod registry;
mod tracker;

pub mod genotype;
pub mod info;

pub use api::{
    GenotypeAnnotation, InfoFieldAnnotation, SiteContext, SiteInput, StratifiedLikelihoods, VariantAnnotation,
};
pub use config::AnnotatorConfig;
pub use engine::VariantAnnotatorEngine;
pub use error::AnnotationError;
pub use expression::VaExpression;
pub use header::{HeaderCount, HeaderSection, HeaderType, VcfHeaderLine};
pub use overlap::VariantOverlapAnnotator;
pub use registry::{AnnotationFactory, AnnotationGroup, AnnotationInfo, AnnotationRegistry};
pub use tracker::FeatureTracker;

#[cfg(test)]
pub(crate) mod test_support;
