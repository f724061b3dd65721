//! Read-level and reference-level inputs to the annotators.
//!
//! This module holds the collaborators a site annotation pass consumes:
//! aligned reads and the per-sample pileups built from them, the reference
//! window, per-read allele likelihoods, the statistical strategy functions,
//! tab-separated input tables and a VCF text renderer for annotated records.

mod likelihoods;
mod pileup;
mod reference;
mod repeats;
mod statistics;
pub mod tables;
mod types;
pub mod vcf;

pub use likelihoods::{PerReadAlleleLikelihoodMap, ReadLikelihoods, INFORMATIVE_LIKELIHOOD_THRESHOLD};
pub use pileup::{base_index, stratify_reads, PileupElement, ReadBackedPileup, StratifiedPileups};
pub(crate) use pileup::NUM_BASES;
pub use reference::{ReferenceContext, ReferenceError, ReferenceSequence};
pub use repeats::{bases_are_repeated, find_number_of_repetitions, find_repeated_substring, homopolymer_run};
pub use statistics::{
    fisher_exact_two_sided, hardy_weinberg_p_value, inbreeding_coefficient, mann_whitney_u,
    normal_cdf, normal_quantile, normalize_from_log10, phred_scale_p, phred_to_p, RankSumResult,
    EXACT_RANK_SUM_LIMIT, MIN_PVALUE,
};
pub use types::{parse_cigar, AlignedRead, CigarError, CigarOp, CigarOpKind, ReadOffset};
pub use vcf::{format_record, render_vcf, write_vcf};
