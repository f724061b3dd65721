//! Merging records from several sources that describe the same locus.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use tracing::{debug, warn};

use super::attributes::keys;
use super::utils::{
    create_variant_context_with_padded_alleles, create_variant_context_with_trimmed_alleles,
    strip_pls, with_chromosome_counts,
};
use super::{
    Allele, AttributeMap, AttributeValue, Genotype, GenotypeBuilder, GenotypesContext,
    VariantContext, VariantContextBuilder, VariantError,
};

/// Origin label when every source called the site unfiltered.
pub const MERGE_INTERSECTION: &str = "Intersection";
/// Origin label when every source filtered the site.
pub const MERGE_FILTER_IN_ALL: &str = "FilteredInAll";
/// Origin label when no source saw variation.
pub const MERGE_REF_IN_ALL: &str = "ReferenceInAll";
/// Prefix for sources that carried the site filtered.
pub const MERGE_FILTER_PREFIX: &str = "filterIn";
/// Default INFO key receiving the origin label.
pub const DEFAULT_SET_KEY: &str = "set";

/// How genotypes from different sources are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum GenotypeMergeType {
    /// Rename every sample to `sample.source`.
    Uniquify,
    /// Process sources in priority order; first genotype per sample wins.
    Prioritize,
    /// Process sources in the given order; first genotype per sample wins.
    #[default]
    Unsorted,
    /// Fail if any sample appears in more than one source.
    RequireUnique,
}

/// How per-source filter status combines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilteredRecordMergeType {
    /// The merged record passes if any source passed.
    #[default]
    KeepIfAnyUnfiltered,
    /// The merged record carries the union of all source filters.
    KeepIfAllUnfiltered,
}

/// Policies for [`simple_merge`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MergeOptions {
    /// Source labels from highest to lowest priority.
    pub priority: Option<Vec<String>>,
    /// Filter combination policy.
    pub filtered_record_merge_type: FilteredRecordMergeType,
    /// Genotype combination policy.
    pub genotype_merge_type: GenotypeMergeType,
    /// Record which sources contributed under `set_key`.
    pub annotate_origin: bool,
    /// INFO key for the origin label.
    pub set_key: Option<String>,
    /// Ignore filtered sources entirely.
    pub filtered_are_uncalled: bool,
    /// Take INFO from the source with the largest AC.
    pub merge_info_with_max_ac: bool,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            priority: None,
            filtered_record_merge_type: FilteredRecordMergeType::default(),
            genotype_merge_type: GenotypeMergeType::default(),
            annotate_origin: false,
            set_key: Some(DEFAULT_SET_KEY.to_string()),
            filtered_are_uncalled: false,
            merge_info_with_max_ac: false,
        }
    }
}

impl MergeOptions {
    /// Set the priority list.
    pub fn with_priority<I, S>(mut self, priority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.priority = Some(priority.into_iter().map(Into::into).collect());
        self
    }

    /// Set the filter policy.
    pub fn with_filtered_record_merge_type(mut self, merge_type: FilteredRecordMergeType) -> Self {
        self.filtered_record_merge_type = merge_type;
        self
    }

    /// Set the genotype policy.
    pub fn with_genotype_merge_type(mut self, merge_type: GenotypeMergeType) -> Self {
        self.genotype_merge_type = merge_type;
        self
    }

    /// Toggle origin annotation.
    pub fn with_annotate_origin(mut self, annotate: bool) -> Self {
        self.annotate_origin = annotate;
        self
    }

    /// Set or clear the origin key.
    pub fn with_set_key(mut self, key: Option<String>) -> Self {
        self.set_key = key;
        self
    }

    /// Toggle dropping filtered sources.
    pub fn with_filtered_are_uncalled(mut self, enabled: bool) -> Self {
        self.filtered_are_uncalled = enabled;
        self
    }

    /// Toggle taking INFO from the max-AC source.
    pub fn with_merge_info_with_max_ac(mut self, enabled: bool) -> Self {
        self.merge_info_with_max_ac = enabled;
        self
    }
}

/// Sample name after merging.
pub fn merged_sample_name(source: &str, sample: &str, uniquify: bool) -> String {
    if uniquify {
        format!("{sample}.{source}")
    } else {
        sample.to_string()
    }
}

/// Order records by their source's position in `priority`.
///
/// Without a list, or under [`GenotypeMergeType::Unsorted`], input order is kept.
pub fn sort_by_priority(
    vcs: &[VariantContext],
    priority: Option<&[String]>,
    merge_type: GenotypeMergeType,
) -> Result<Vec<VariantContext>, VariantError> {
    let priority = match priority {
        Some(priority) if merge_type != GenotypeMergeType::Unsorted => priority,
        _ => return Ok(vcs.to_vec()),
    };
    let mut ranked = Vec::with_capacity(vcs.len());
    for vc in vcs {
        let rank = priority
            .iter()
            .position(|source| source == vc.source())
            .ok_or_else(|| VariantError::UnknownPrioritySource {
                priority: priority.to_vec(),
                source_name: vc.source().to_string(),
            })?;
        ranked.push((rank, vc.clone()));
    }
    ranked.sort_by_key(|(rank, _)| *rank);
    Ok(ranked.into_iter().map(|(_, vc)| vc).collect())
}

fn verify_unique_sample_names(vcs: &[VariantContext]) -> Result<(), VariantError> {
    let mut seen: HashSet<&str> = HashSet::new();
    for vc in vcs {
        let names = vc.sample_names();
        if let Some(duplicate) = names.iter().find(|name| seen.contains(*name)) {
            return Err(VariantError::DuplicateSampleAcrossInputs(duplicate.to_string()));
        }
        seen.extend(names);
    }
    Ok(())
}

fn determine_reference_allele(vcs: &[VariantContext]) -> Result<Allele, VariantError> {
    let mut reference: Option<&Allele> = None;
    for vc in vcs {
        let candidate = vc.reference();
        match reference {
            Some(current) if current.len() >= candidate.len() => {
                if current.len() == candidate.len() && current != candidate {
                    return Err(VariantError::InconsistentReferences {
                        contig: vc.contig().to_string(),
                        start: vc.start(),
                        first: current.to_string(),
                        second: candidate.to_string(),
                    });
                }
            }
            _ => reference = Some(candidate),
        }
    }
    reference
        .cloned()
        .ok_or(VariantError::MissingField("alleles"))
}

/// Maps a source's alleles onto the merged allele set.
struct AlleleMapper {
    map: Option<HashMap<Allele, Allele>>,
}

impl AlleleMapper {
    fn needs_remapping(&self) -> bool {
        self.map.is_some()
    }

    fn remap(&self, allele: &Allele) -> Allele {
        self.map
            .as_ref()
            .and_then(|map| map.get(allele))
            .cloned()
            .unwrap_or_else(|| allele.clone())
    }
}

/// Extend every allele of `vc` so its reference matches `reference`.
///
/// Extended alternates are unified with identical alleles already merged.
fn resolve_incompatible_alleles(
    reference: &Allele,
    vc: &VariantContext,
    merged: &[Allele],
) -> Result<AlleleMapper, VariantError> {
    if reference == vc.reference() {
        return Ok(AlleleMapper { map: None });
    }
    let extra = &reference.bases()[vc.reference().len()..];
    let mut map = HashMap::with_capacity(vc.n_alleles());
    for allele in vc.alleles() {
        let mapped = if allele.is_reference() {
            reference.clone()
        } else {
            let extended = Allele::extend(allele, extra)?;
            merged
                .iter()
                .find(|existing| **existing == extended)
                .cloned()
                .unwrap_or(extended)
        };
        map.insert(allele.clone(), mapped);
    }
    Ok(AlleleMapper { map: Some(map) })
}

fn merge_genotypes(
    merged: &mut BTreeMap<String, Genotype>,
    vc: &VariantContext,
    mapper: &AlleleMapper,
    uniquify: bool,
) -> Result<(), VariantError> {
    for genotype in vc.genotypes() {
        let name = merged_sample_name(vc.source(), genotype.sample_name(), uniquify);
        if merged.contains_key(&name) {
            continue;
        }
        let genotype = if uniquify || mapper.needs_remapping() {
            let alleles: Vec<Allele> = genotype.alleles().iter().map(|a| mapper.remap(a)).collect();
            GenotypeBuilder::from(genotype)
                .name(name.clone())
                .alleles(alleles)
                .build()?
        } else {
            genotype.clone()
        };
        merged.insert(name, genotype);
    }
    Ok(())
}

fn has_pl_incompatible_alleles(merged: &[Allele], single: &[Allele]) -> bool {
    merged.len() != single.len() || merged.iter().zip(single).any(|(a, b)| a != b)
}

fn origin_label(vcs: &[VariantContext], variant_sources: &HashSet<&str>, n_filtered: usize, priority_len: usize) -> String {
    if n_filtered == 0 && variant_sources.len() == priority_len {
        MERGE_INTERSECTION.to_string()
    } else if n_filtered == vcs.len() {
        MERGE_FILTER_IN_ALL.to_string()
    } else if variant_sources.is_empty() {
        MERGE_REF_IN_ALL.to_string()
    } else {
        let mut labels: Vec<String> = Vec::new();
        for vc in vcs.iter().filter(|vc| vc.is_variant()) {
            let label = if vc.is_filtered() {
                format!("{MERGE_FILTER_PREFIX}{}", vc.source())
            } else {
                vc.source().to_string()
            };
            if !labels.contains(&label) {
                labels.push(label);
            }
        }
        labels.join("-")
    }
}

/// Combine records describing the same start position into one.
///
/// Returns `Ok(None)` for empty input or when every input was filtered
/// out under `filtered_are_uncalled`. The merged record is trimmed before
/// it is returned.
pub fn simple_merge(vcs: &[VariantContext], options: &MergeOptions) -> Result<Option<VariantContext>, VariantError> {
    if vcs.is_empty() {
        return Ok(None);
    }
    if options.annotate_origin && options.priority.is_none() {
        return Err(VariantError::MissingPriorityList("origin annotation"));
    }
    if options.genotype_merge_type == GenotypeMergeType::Prioritize && options.priority.is_none() {
        return Err(VariantError::MissingPriorityList("PRIORITIZE genotype merging"));
    }
    if options.genotype_merge_type == GenotypeMergeType::RequireUnique {
        verify_unique_sample_names(vcs)?;
    }

    let sorted = sort_by_priority(vcs, options.priority.as_deref(), options.genotype_merge_type)?;
    let mut padded = Vec::with_capacity(sorted.len());
    for vc in &sorted {
        if options.filtered_are_uncalled && vc.is_filtered() {
            continue;
        }
        let pad = vc.reference_base_for_indel().unwrap_or(b'N');
        padded.push(create_variant_context_with_padded_alleles(vc, pad, false)?);
    }
    let Some(first) = padded.first() else {
        return Ok(None);
    };

    let reference = determine_reference_allele(&padded)?;
    let source: Arc<str> = Arc::from(first.source());
    let mut location = (Arc::<str>::from(first.contig()), first.start(), first.end());

    let mut alleles: Vec<Allele> = Vec::new();
    let mut filters: BTreeSet<String> = BTreeSet::new();
    let mut any_filters_applied = false;
    let mut attributes: BTreeMap<String, AttributeValue> = BTreeMap::new();
    let mut inconsistent: HashSet<String> = HashSet::new();
    let mut variant_sources: HashSet<&str> = HashSet::new();
    let mut ids: Vec<String> = Vec::new();
    let mut genotypes: BTreeMap<String, Genotype> = BTreeMap::new();
    let mut depth = 0i32;
    let mut max_ac = -1i32;
    let mut vc_with_max_ac: Option<&VariantContext> = None;
    let mut neg_log10_p_error = -1.0f64;
    let mut n_filtered = 0usize;
    let mut remapped = false;

    for vc in &padded {
        if vc.start() != first.start() {
            return Err(VariantError::MergeStartMismatch {
                first: first.location(),
                second: vc.location(),
            });
        }
        if vc.span() > location.2 - location.1 + 1 {
            location = (Arc::from(vc.contig()), vc.start(), vc.end());
        }

        if vc.is_filtered() {
            n_filtered += 1;
        }
        if vc.is_variant() {
            variant_sources.insert(vc.source());
        }

        let mapper = resolve_incompatible_alleles(&reference, vc, &alleles)?;
        remapped |= mapper.needs_remapping();
        for allele in vc.alleles() {
            let mapped = mapper.remap(allele);
            if !alleles.contains(&mapped) {
                alleles.push(mapped);
            }
        }

        merge_genotypes(
            &mut genotypes,
            vc,
            &mapper,
            options.genotype_merge_type == GenotypeMergeType::Uniquify,
        )?;

        let quality = if vc.is_variant() { vc.neg_log10_p_error() } else { -1.0 };
        neg_log10_p_error = neg_log10_p_error.max(quality);

        if let Some(vc_filters) = vc.filters() {
            any_filters_applied = true;
            filters.extend(vc_filters.iter().cloned());
        }

        if vc.has_attribute(keys::DEPTH_KEY) {
            depth += vc.attribute_as_int(keys::DEPTH_KEY, 0);
        }
        if let Some(id) = vc.id() {
            if id != keys::EMPTY_ID_FIELD && !ids.iter().any(|seen| seen == id) {
                ids.push(id.to_string());
            }
        }
        if options.merge_info_with_max_ac {
            let counts = vc
                .attribute(keys::ALLELE_COUNT_KEY)
                .and_then(AttributeValue::as_int_list)
                .unwrap_or_default();
            for ac in counts {
                if ac > max_ac {
                    max_ac = ac;
                    vc_with_max_ac = Some(vc);
                }
            }
        }

        for (key, value) in vc.attributes().iter() {
            if inconsistent.contains(key.as_str()) {
                continue;
            }
            match attributes.get(key.as_str()).cloned() {
                Some(bound) if &bound != value && !bound.is_missing() => {
                    debug!(key = %key, "dropping inconsistent INFO value during merge");
                    inconsistent.insert(key.clone());
                    attributes.remove(key.as_str());
                }
                Some(bound) if !bound.is_missing() => {}
                _ => {
                    attributes.insert(key.clone(), value.clone());
                }
            }
        }
    }

    let mut strip_likelihoods = false;
    for vc in padded.iter().filter(|vc| vc.n_alleles() > 1) {
        if has_pl_incompatible_alleles(&alleles, vc.alleles()) {
            warn!(
                location = %vc.location(),
                "stripping PLs due to incompatible alleles between merged and single records"
            );
            strip_likelihoods = true;
            break;
        }
    }

    let mut attributes_with_max_ac: BTreeMap<String, AttributeValue> = BTreeMap::new();
    if let (true, Some(max_vc)) = (options.merge_info_with_max_ac, vc_with_max_ac) {
        for (key, value) in max_vc.attributes().iter() {
            attributes_with_max_ac.insert(key.clone(), value.clone());
        }
    }

    if options.filtered_record_merge_type == FilteredRecordMergeType::KeepIfAnyUnfiltered
        && n_filtered != padded.len()
    {
        filters.clear();
    }

    if options.annotate_origin {
        let priority_len = options.priority.as_ref().map_or(0, Vec::len);
        let label = origin_label(&padded, &variant_sources, n_filtered, priority_len);
        if let Some(set_key) = &options.set_key {
            attributes.insert(set_key.clone(), AttributeValue::String(label));
            if let (true, Some(max_vc)) = (options.merge_info_with_max_ac, vc_with_max_ac) {
                attributes_with_max_ac.insert(
                    set_key.clone(),
                    AttributeValue::String(max_vc.source().to_string()),
                );
            }
        }
    }

    if depth > 0 {
        attributes.insert(keys::DEPTH_KEY.to_string(), AttributeValue::Integer(depth));
    }

    let chosen = if options.merge_info_with_max_ac {
        attributes_with_max_ac
    } else {
        attributes
    };
    let mut merged_genotypes = GenotypesContext::from_genotypes(genotypes.into_values());
    if strip_likelihoods {
        merged_genotypes = strip_pls(&merged_genotypes)?;
    }

    let mut builder = VariantContextBuilder::default()
        .source(source)
        .loc(location.0, location.1, location.2)
        .alleles(alleles)
        .genotypes(merged_genotypes)
        .log10_p_error(neg_log10_p_error)
        .attributes(chosen.into_iter().collect::<AttributeMap>());
    if any_filters_applied || !filters.is_empty() {
        builder = builder.filters(filters);
    }
    if !ids.is_empty() {
        builder = builder.id(ids.join(","));
    }

    let mut merged = builder.make()?;
    if strip_likelihoods {
        merged = with_chromosome_counts(&merged, true)?;
    }
    let merged = create_variant_context_with_trimmed_alleles(&merged)?;
    if remapped {
        debug!(record = %merged, "remapped alleles while merging");
    }
    Ok(Some(merged))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn allele(bases: &str, is_ref: bool) -> Allele {
        Allele::create(bases, is_ref).expect("allele")
    }

    fn record(source: &str, alleles: Vec<Allele>, stop: u32, samples: &[&str]) -> VariantContext {
        let reference = alleles[0].clone();
        let genotypes = samples.iter().map(|name| {
            GenotypeBuilder::new(*name, vec![reference.clone(), alleles[alleles.len() - 1].clone()])
                .pl(vec![10, 0, 100])
                .build()
                .expect("genotype")
        });
        VariantContextBuilder::new(source, "chr1", 100, stop, alleles.clone())
            .genotypes(genotypes.collect())
            .make()
            .expect("record")
    }

    #[test]
    fn require_unique_fails_on_shared_sample() {
        let a = record("one", vec![allele("A", true), allele("C", false)], 100, &["NA1"]);
        let b = record("two", vec![allele("A", true), allele("C", false)], 100, &["NA1"]);
        let options = MergeOptions::default().with_genotype_merge_type(GenotypeMergeType::RequireUnique);
        assert_eq!(
            simple_merge(&[a, b], &options),
            Err(VariantError::DuplicateSampleAcrossInputs("NA1".into()))
        );
    }

    #[test]
    fn longest_reference_wins_and_alternates_are_extended() {
        let deletion = record("one", vec![allele("ACG", true), allele("A", false)], 102, &["s1"]);
        let snp = record("two", vec![allele("A", true), allele("T", false)], 100, &["s2"]);
        let merged = simple_merge(&[deletion, snp], &MergeOptions::default())
            .expect("merge")
            .expect("record");

        let bases: Vec<&[u8]> = merged.alleles().iter().map(Allele::bases).collect();
        assert_eq!(bases, vec![&b"ACG"[..], b"A", b"TCG"]);
        assert_eq!(merged.end(), 102);
        let s2 = merged.genotype("s2").expect("s2");
        assert_eq!(s2.alleles()[1].bases(), b"TCG");
        // alleles changed relative to each input, so likelihoods are gone
        assert!(!s2.has_likelihoods());
        assert_eq!(merged.attribute_as_int("AN", 0), 4);
    }

    #[test]
    fn inconsistent_info_is_dropped_for_good() {
        let mk = |source: &str, value: i32| {
            VariantContextBuilder::new(source, "chr1", 5, 5, vec![allele("G", true), allele("T", false)])
                .attribute("X", value)
                .attribute("DP", 7)
                .id(format!("rs{value}"))
                .make()
                .expect("record")
        };
        let merged = simple_merge(&[mk("a", 1), mk("b", 2), mk("c", 1)], &MergeOptions::default())
            .expect("merge")
            .expect("record");
        assert!(!merged.has_attribute("X"));
        assert_eq!(merged.attribute_as_int("DP", 0), 21);
        assert_eq!(merged.id(), Some("rs1,rs2"));
    }

    #[test]
    fn origin_annotation_and_filters() {
        let pass = VariantContextBuilder::new("a", "chr1", 5, 5, vec![allele("G", true), allele("T", false)])
            .passed_filters()
            .make()
            .expect("record");
        let failed = VariantContextBuilder::from(&pass)
            .source("b")
            .filter("LowQual")
            .make()
            .expect("record");
        let options = MergeOptions::default()
            .with_priority(["a", "b"])
            .with_genotype_merge_type(GenotypeMergeType::Prioritize)
            .with_annotate_origin(true);
        let merged = simple_merge(&[failed.clone(), pass.clone()], &options)
            .expect("merge")
            .expect("record");
        assert_eq!(merged.source(), "a");
        assert_eq!(merged.attribute_as_string("set"), Some("a-filterInb".to_string()));
        assert!(!merged.is_filtered());

        let strict = options.with_filtered_record_merge_type(FilteredRecordMergeType::KeepIfAllUnfiltered);
        let merged = simple_merge(&[failed, pass], &strict).expect("merge").expect("record");
        assert!(merged.is_filtered());
    }

    #[test]
    fn filtered_are_uncalled_can_yield_nothing() {
        let failed = VariantContextBuilder::new("a", "chr1", 5, 5, vec![allele("G", true), allele("T", false)])
            .filter("LowQual")
            .make()
            .expect("record");
        let options = MergeOptions::default().with_filtered_are_uncalled(true);
        assert_eq!(simple_merge(&[failed], &options), Ok(None));
    }

    #[test]
    fn uniquify_renames_samples() {
        let a = record("one", vec![allele("A", true), allele("C", false)], 100, &["NA1"]);
        let b = record("two", vec![allele("A", true), allele("C", false)], 100, &["NA1"]);
        let options = MergeOptions::default().with_genotype_merge_type(GenotypeMergeType::Uniquify);
        let merged = simple_merge(&[a, b], &options).expect("merge").expect("record");
        assert_eq!(merged.genotypes().sample_names(), vec!["NA1.one", "NA1.two"]);
    }

    #[test]
    fn unknown_priority_source_is_an_error() {
        let a = record("one", vec![allele("A", true), allele("C", false)], 100, &[]);
        let options = MergeOptions::default()
            .with_priority(["two"])
            .with_genotype_merge_type(GenotypeMergeType::Prioritize);
        assert!(matches!(
            simple_merge(&[a], &options),
            Err(VariantError::UnknownPrioritySource { .. })
        ));
    }
}
