//! # Variant contexts and annotation
//!
//! An immutable data model for called genomic variants and an engine that
//! decorates them with site-level (INFO) and per-sample (FORMAT)
//! annotations computed from read pileups.
//!
//! ## Layout
//!
//! 1. **`variant`**: alleles, genotypes, [`VariantContext`] and its builder,
//!    record utilities (padding, trimming, chromosome counts) and
//!    [`simple_merge`].
//! 2. **`genomics`**: aligned reads, pileups, reference windows, per-read
//!    allele likelihoods, the statistical tests behind the annotations and
//!    VCF rendering.
//! 3. **`annotation`**: the annotation traits, a static registry of built-in
//!    annotations and the [`VariantAnnotatorEngine`].
//!
//! ## Usage Example
//!
//! ```ignore
//! use variant_annotator::{AnnotatorConfig, FeatureTracker, SiteContext, VariantAnnotatorEngine};
//!
//! let config = AnnotatorConfig::new().with_groups(["Standard"]);
//! let engine = VariantAnnotatorEngine::new(&config)?;
//! let tracker = FeatureTracker::new();
//! let site = SiteContext::new(&reference, &pileups, &tracker);
//! let annotated = engine.annotate_context(&site, &vc)?;
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod annotation; // Annotation traits, registry and engine
pub mod genomics; // Reads, pileups, reference and statistics
pub mod variant; // Variant data model and utilities

// Re-exports for convenience
pub use annotation::{
    AnnotationError, AnnotationGroup, AnnotationRegistry, AnnotatorConfig, FeatureTracker, SiteContext, SiteInput,
    VariantAnnotatorEngine,
};
pub use genomics::{AlignedRead, ReadBackedPileup, ReferenceContext, ReferenceSequence};
pub use variant::{
    simple_merge, Allele, AttributeMap, AttributeValue, Genotype, GenotypeBuilder, GenotypesContext, MergeOptions,
    VariantContext, VariantContextBuilder, VariantError,
};
