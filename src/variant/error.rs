use thiserror::Error;

/// Errors raised while constructing or transforming variant data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VariantError {
    /// Allele bytes outside the accepted alphabet.
    #[error("unparsable allele bases: {0:?}")]
    InvalidAlleleBases(String),

    /// A no-call or symbolic allele was tagged as reference.
    #[error("allele {0} cannot be tagged as reference")]
    IllegalReferenceTag(String),

    /// Symbolic alleles have no bases to extend.
    #[error("cannot extend symbolic allele {0}")]
    ExtendSymbolic(String),

    /// A builder was asked to produce a value before a required field was set.
    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    /// An extended genotype attribute collides with an inline field.
    #[error("attribute key {0} is reserved for an inline genotype field")]
    ReservedGenotypeKey(String),

    /// Likelihood or allele-depth vectors must not contain negative values.
    #[error("{field} for sample {sample} contains negative value {value}")]
    NegativeValue {
        /// Field name (`AD` or `PL`).
        field: &'static str,
        /// Sample the vector belongs to.
        sample: String,
        /// Offending value.
        value: i32,
    },

    /// Mutation attempted on a frozen genotypes collection.
    #[error("genotypes context is immutable")]
    ImmutableGenotypes,

    /// Validation failure while building a variant context.
    #[error("invalid variant context at {contig}:{start}: {reason}")]
    InvalidContext {
        /// Contig of the rejected record.
        contig: String,
        /// 1-based start of the rejected record.
        start: u32,
        /// Invariant that was violated.
        reason: ContextViolation,
    },

    /// Padding requested with neither a stored nor a usable supplied base.
    #[error("cannot pad {contig}:{start}: reference base {base:?} is not a regular base")]
    InvalidPaddingBase {
        /// Contig of the record.
        contig: String,
        /// 1-based start of the record.
        start: u32,
        /// The rejected base, as a character.
        base: char,
    },

    /// Reference allele is shorter than its span by more than one base.
    #[error("badly formed record at {contig}:{start}: reference length must be at most one base shorter than the location")]
    BadlyFormedLocation {
        /// Contig of the record.
        contig: String,
        /// 1-based start of the record.
        start: u32,
    },

    /// Substitution class requested for something other than a biallelic SNP.
    #[error("substitution type requested for a non-SNP or multi-allelic record at {contig}:{start}")]
    NotBiallelicSnp {
        /// Contig of the record.
        contig: String,
        /// 1-based start of the record.
        start: u32,
    },

    /// Two records with differing starts were passed to a merge.
    #[error("attempting to merge records with different start sites: {first} and {second}")]
    MergeStartMismatch {
        /// Location of the first record.
        first: String,
        /// Location of the offending record.
        second: String,
    },

    /// Equal-length reference alleles disagree across merge inputs.
    #[error("inconsistent references for the same position at {contig}:{start}: {first} vs. {second}")]
    InconsistentReferences {
        /// Contig of the position.
        contig: String,
        /// 1-based start of the position.
        start: u32,
        /// Reference seen first.
        first: String,
        /// Conflicting reference.
        second: String,
    },

    /// REQUIRE_UNIQUE merge saw the same sample in two inputs.
    #[error("REQUIRE_UNIQUE sample names is true but duplicate names were discovered: {0}")]
    DuplicateSampleAcrossInputs(String),

    /// A merge input's source is absent from the priority list.
    #[error("priority list {priority:?} doesn't contain variant context {source_name}")]
    UnknownPrioritySource {
        /// Priority list supplied by the caller.
        priority: Vec<String>,
        /// Source label that could not be ranked.
        source_name: String,
    },

    /// A merge policy needs a priority list that was not supplied.
    #[error("{0} requires a priority list")]
    MissingPriorityList(&'static str),

    /// Deferred genotype payload could not be decoded.
    #[error("failed to decode genotypes for sample {sample}: {reason}")]
    GenotypeDecode {
        /// Sample column being decoded.
        sample: String,
        /// Decoder message.
        reason: String,
    },
}

/// The invariant violated by a rejected variant context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextViolation {
    /// The allele list was empty.
    #[error("cannot create a variant context with an empty allele list")]
    EmptyAlleles,
    /// No allele carried the reference tag.
    #[error("no reference allele found")]
    MissingReference,
    /// More than one allele carried the reference tag.
    #[error("at most one reference allele is allowed, saw {0}")]
    MultipleReferences(String),
    /// Two alleles share the same bases.
    #[error("duplicate allele {0}")]
    DuplicateAllele(String),
    /// A no-call allele appeared in the site-level allele list.
    #[error("no-call alleles may only appear inside genotypes")]
    NoCallAllele,
    /// More than one null allele.
    #[error("received two null alleles")]
    MultipleNullAlleles,
    /// Stop precedes start.
    #[error("stop {stop} precedes start")]
    StopBeforeStart {
        /// Offending stop coordinate.
        stop: u32,
    },
    /// Span and reference allele length disagree.
    #[error("location spans {span} bases but the reference allele has length {ref_len}")]
    ReferenceLengthMismatch {
        /// `stop - start + 1`.
        span: u32,
        /// Length of the reference allele.
        ref_len: usize,
    },
    /// Span exceeds the reference allele, so a padding base is required.
    #[error("reference allele is one base shorter than the location but no padding base is set")]
    MissingPaddingBase,
    /// Span equals the reference allele, so no padding base is allowed.
    #[error("padding base {0:?} set but the reference allele covers the full location")]
    UnexpectedPaddingBase(char),
    /// A genotype references an allele that is not part of the site.
    #[error("allele {allele} in genotype {sample} is not in the variant context")]
    GenotypeAlleleMissing {
        /// Sample whose genotype failed validation.
        sample: String,
        /// Allele missing from the site.
        allele: String,
    },
    /// Two genotypes share a sample name.
    #[error("sample {0} appears more than once")]
    DuplicateSample(String),
}
