/// Configuration parameters for a [`VariantAnnotatorEngine`](super::VariantAnnotatorEngine).
///
/// Exclusions always win over group or explicit selection.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AnnotatorConfig {
    /// Annotation groups to enable (e.g. `Standard`).
    pub groups: Vec<String>,
    /// Individual annotations to enable by name.
    pub annotations: Vec<String>,
    /// Annotations to drop from the selection.
    pub exclusions: Vec<String>,
    /// `resource.field` expressions copied from resource tracks.
    pub expressions: Vec<String>,
    /// Resource track names expressions may refer to.
    pub resources: Vec<String>,
    /// Comparison tracks used for membership flags.
    pub comp_tracks: Vec<String>,
    /// Track holding dbSNP records, if any.
    pub dbsnp: Option<String>,
    /// Founder samples for population statistics; empty means every sample.
    pub founder_ids: Vec<String>,
    /// Enable every registered annotation.
    pub use_all: bool,
}

impl AnnotatorConfig {
    /// Empty configuration: no annotations, no tracks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration selecting every registered annotation.
    pub fn all() -> Self {
        Self::default().with_all(true)
    }

    /// Enable annotation groups.
    pub fn with_groups<I, S>(mut self, groups: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups.extend(groups.into_iter().map(Into::into));
        self
    }

    /// Enable individual annotations.
    pub fn with_annotations<I, S>(mut self, annotations: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.annotations.extend(annotations.into_iter().map(Into::into));
        self
    }

    /// Exclude annotations.
    pub fn with_exclusions<I, S>(mut self, exclusions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions.extend(exclusions.into_iter().map(Into::into));
        self
    }

    /// Add `resource.field` expressions.
    pub fn with_expressions<I, S>(mut self, expressions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expressions.extend(expressions.into_iter().map(Into::into));
        self
    }

    /// Declare resource tracks.
    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources.extend(resources.into_iter().map(Into::into));
        self
    }

    /// Declare comparison tracks.
    pub fn with_comp_tracks<I, S>(mut self, tracks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.comp_tracks.extend(tracks.into_iter().map(Into::into));
        self
    }

    /// Set the dbSNP track.
    pub fn with_dbsnp(mut self, track: impl Into<String>) -> Self {
        self.dbsnp = Some(track.into());
        self
    }

    /// Restrict population statistics to these founders.
    pub fn with_founder_ids<I, S>(mut self, founders: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.founder_ids.extend(founders.into_iter().map(Into::into));
        self
    }

    /// Enable every registered annotation.
    pub fn with_all(mut self, enabled: bool) -> Self {
        self.use_all = enabled;
        self
    }
}
