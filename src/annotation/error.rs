use thiserror::Error;

use crate::variant::VariantError;

/// Errors raised while configuring or running the annotation engine.
///
/// An annotator that simply has nothing to say at a site is not an error;
/// it returns `None` and the engine moves on.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnnotationError {
    /// A requested annotation name is not registered.
    #[error("unknown annotation {0:?}")]
    UnknownAnnotation(String),

    /// A requested annotation group is not known.
    #[error("unknown annotation group {0:?}")]
    UnknownGroup(String),

    /// An expression is not of the form `resource.field`.
    #[error("expression {0:?} should be in resource.field format")]
    MalformedExpression(String),

    /// An expression refers to a resource track that was not declared.
    #[error("expression {expression:?} refers to undeclared resource {resource:?}")]
    UnknownResource {
        /// The full expression.
        expression: String,
        /// Resource name before the last dot.
        resource: String,
    },

    /// An expression value was found but its INFO header line is unknown.
    #[error("cannot annotate expression {expression} at {location}: missing header info")]
    MissingExpressionHeader {
        /// The full expression.
        expression: String,
        /// `contig:start` of the annotated site.
        location: String,
    },

    /// Building an annotated record failed.
    #[error(transparent)]
    Variant(#[from] VariantError),
}
