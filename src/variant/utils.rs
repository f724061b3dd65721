//! Whole-record transformations over [`VariantContext`]: allele counts,
//! padding and trimming, pruning, strand flips, type partitioning and
//! tandem-repeat classification.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::genomics::{bases_are_repeated, find_number_of_repetitions, find_repeated_substring, hardy_weinberg_p_value};

use super::attributes::keys;
use super::{
    Allele, AttributeMap, AttributeValue, Genotype, GenotypeBuilder, GenotypesContext,
    VariantContext, VariantError, VariantType,
};

const ALL_TYPES: [VariantType; 6] = [
    VariantType::NoVariation,
    VariantType::Snp,
    VariantType::Mnp,
    VariantType::Indel,
    VariantType::Symbolic,
    VariantType::Mixed,
];

/// Legacy genotype-likelihood key dropped alongside PL.
pub const GENOTYPE_LIKELIHOODS_KEY: &str = "GL";

/// Decimal places for an allele frequency with denominator `max_value`.
///
/// One digit per order of magnitude above one: AN=4 gives two places,
/// AN=40 three.
pub fn frequency_precision(mut max_value: f64) -> usize {
    let mut precision = 1;
    while max_value > 1.0 {
        precision += 1;
        max_value /= 10.0;
    }
    precision
}

/// Recompute `AN`, `AC` and `AF` from the genotypes of `vc` into `attributes`.
///
/// With no called chromosomes and `remove_stale` set, existing AC/AF/AN keys
/// are removed instead of zeroed. A site without genotypes is left untouched.
pub fn calculate_chromosome_counts(vc: &VariantContext, attributes: &mut AttributeMap, remove_stale: bool) {
    let total = vc.chromosome_count();
    if total == 0 && remove_stale {
        attributes.remove(keys::ALLELE_COUNT_KEY);
        attributes.remove(keys::ALLELE_FREQUENCY_KEY);
        attributes.remove(keys::ALLELE_NUMBER_KEY);
        return;
    }
    if !vc.has_genotypes() {
        return;
    }

    attributes.put(keys::ALLELE_NUMBER_KEY, total as i32);
    if vc.alternate_alleles().is_empty() {
        attributes.put(keys::ALLELE_COUNT_KEY, 0);
        attributes.put(keys::ALLELE_FREQUENCY_KEY, 0.0);
        return;
    }

    let precision = frequency_precision(total as f64);
    let mut counts = Vec::with_capacity(vc.alternate_alleles().len());
    let mut frequencies = Vec::with_capacity(counts.capacity());
    for allele in vc.alternate_alleles() {
        let carried = vc.chromosome_count_for(allele);
        counts.push(carried as i32);
        let frequency = if total == 0 { 0.0 } else { carried as f64 / total as f64 };
        frequencies.push(format!("{:.*}", precision, frequency));
    }

    if counts.len() == 1 {
        attributes.put(keys::ALLELE_COUNT_KEY, counts[0]);
        attributes.put(keys::ALLELE_FREQUENCY_KEY, frequencies.swap_remove(0));
    } else {
        attributes.put(keys::ALLELE_COUNT_KEY, counts);
        attributes.put(keys::ALLELE_FREQUENCY_KEY, frequencies);
    }
}

/// New record whose attributes carry freshly computed AC/AF/AN.
pub fn with_chromosome_counts(vc: &VariantContext, remove_stale: bool) -> Result<VariantContext, VariantError> {
    let mut attributes = vc.attributes().clone();
    calculate_chromosome_counts(vc, &mut attributes, remove_stale);
    vc.modify_attributes(attributes)
}

/// Put the padding base back onto every non-symbolic allele.
///
/// Pads when the reference allele is exactly one base shorter than the
/// span. The stored padding base wins over `ref_base`; `append_to_end`
/// places it after the allele bases instead of before.
pub fn create_variant_context_with_padded_alleles(
    vc: &VariantContext,
    ref_base: u8,
    append_to_end: bool,
) -> Result<VariantContext, VariantError> {
    let span = vc.span() as usize;
    let ref_len = vc.reference().len();
    let needs_padding = if vc.has_symbolic_alleles() {
        vc.has_reference_base_for_indel()
    } else if ref_len == span {
        false
    } else if ref_len + 1 == span {
        true
    } else {
        return Err(VariantError::BadlyFormedLocation {
            contig: vc.contig().to_string(),
            start: vc.start(),
        });
    };
    if !needs_padding {
        return Ok(vc.clone());
    }

    let pad = match vc.reference_base_for_indel() {
        Some(base) => base,
        None => {
            let base = ref_base.to_ascii_uppercase();
            if !matches!(base, b'A' | b'C' | b'G' | b'T' | b'N') {
                return Err(VariantError::InvalidPaddingBase {
                    contig: vc.contig().to_string(),
                    start: vc.start(),
                    base: ref_base as char,
                });
            }
            base
        }
    };

    let mut mapping = HashMap::with_capacity(vc.n_alleles());
    for allele in vc.alleles() {
        let padded = if allele.is_symbolic() {
            allele.clone()
        } else {
            let mut bases = Vec::with_capacity(allele.len() + 1);
            if append_to_end {
                bases.extend_from_slice(allele.bases());
                bases.push(pad);
            } else {
                bases.push(pad);
                bases.extend_from_slice(allele.bases());
            }
            Allele::create(bases, allele.is_reference())?
        };
        mapping.insert(allele.clone(), padded);
    }
    rebuild_with_allele_mapping(vc, &mapping, None)
}

/// Number of leading bases shared by every non-symbolic allele and the
/// reference; at most one.
pub fn compute_forward_clipping(unclipped: &[Allele], reference: &[u8]) -> usize {
    let Some(&ref0) = reference.first() else {
        return 0;
    };
    let mut saw_regular = false;
    for allele in unclipped.iter().filter(|a| !a.is_symbolic()) {
        saw_regular = true;
        if allele.is_empty() || allele.bases()[0] != ref0 {
            return 0;
        }
    }
    usize::from(saw_regular)
}

/// Number of trailing bases shared by every non-symbolic allele and
/// `reference`.
///
/// `None` means clipping would consume the whole reference while
/// `allow_full_clip` is off.
pub fn compute_reverse_clipping(
    unclipped: &[Allele],
    reference: &[u8],
    forward_clipping: usize,
    allow_full_clip: bool,
) -> Option<usize> {
    if unclipped.iter().all(Allele::is_symbolic) {
        return Some(0);
    }
    let mut clipping = 0usize;
    loop {
        for allele in unclipped.iter().filter(|a| !a.is_symbolic()) {
            let len = allele.len();
            if len == clipping {
                return if allow_full_clip {
                    Some(clipping)
                } else {
                    clipping.checked_sub(1)
                };
            }
            if len - clipping <= forward_clipping || len == forward_clipping {
                return Some(clipping);
            }
            if reference.len() == clipping {
                return if allow_full_clip { Some(clipping) } else { None };
            }
            if allele.bases()[len - clipping - 1] != reference[reference.len() - clipping - 1] {
                return Some(clipping);
            }
        }
        clipping += 1;
    }
}

/// Drop the shared leading base of every allele when doing so yields a
/// null allele, recording it as the padding base.
///
/// Monomorphic sites, null references and records that already carry a
/// padding base are returned unchanged, as are sites such as `TA/TGA/TG`
/// where clipping would not produce a null allele.
pub fn create_variant_context_with_trimmed_alleles(vc: &VariantContext) -> Result<VariantContext, VariantError> {
    if !vc.is_variant() || vc.reference().is_null() || vc.has_reference_base_for_indel() {
        return Ok(vc.clone());
    }
    if compute_forward_clipping(vc.alternate_alleles(), vc.reference().bases()) == 0 {
        return Ok(vc.clone());
    }

    let mut mapping = HashMap::with_capacity(vc.n_alleles());
    let mut produced_null = false;
    for allele in vc.alleles() {
        let trimmed = if allele.is_symbolic() {
            allele.clone()
        } else {
            Allele::create(&allele.bases()[1..], allele.is_reference())?
        };
        produced_null |= trimmed.is_null();
        mapping.insert(allele.clone(), trimmed);
    }
    if !produced_null {
        return Ok(vc.clone());
    }

    let padding = vc.reference().bases()[0];
    rebuild_with_allele_mapping(vc, &mapping, Some(padding))
}

/// Drop trailing bases shared by all alleles, shrinking the stop.
pub fn reverse_trim_alleles(vc: &VariantContext) -> Result<VariantContext, VariantError> {
    let clipping = compute_reverse_clipping(vc.alleles(), vc.reference().bases(), 0, false);
    let trim = match clipping {
        Some(trim) if trim > 0 && vc.n_alleles() > 1 => trim,
        _ => return Ok(vc.clone()),
    };

    let mut mapping = HashMap::with_capacity(vc.n_alleles());
    for allele in vc.alleles() {
        let trimmed = if allele.is_symbolic() {
            allele.clone()
        } else {
            Allele::create(&allele.bases()[..allele.len() - trim], allele.is_reference())?
        };
        mapping.insert(allele.clone(), trimmed);
    }
    let new_ref_len = (vc.reference().len() - trim) as u32;
    let padding = u32::from(vc.has_reference_base_for_indel());
    let stop = vc.start() + new_ref_len + padding - 1;

    let alleles: Vec<Allele> = vc.alleles().iter().filter_map(|a| mapping.get(a).cloned()).collect();
    let genotypes = vc.remap_genotypes(|a| mapping.get(a).cloned())?;
    vc.to_builder()
        .stop(stop)
        .alleles(alleles)
        .genotypes(genotypes)
        .make()
}

/// Rebuild `vc` with alleles remapped site- and genotype-wide and the
/// padding base replaced by `padding`.
fn rebuild_with_allele_mapping(
    vc: &VariantContext,
    mapping: &HashMap<Allele, Allele>,
    padding: Option<u8>,
) -> Result<VariantContext, VariantError> {
    let alleles: Vec<Allele> = vc
        .alleles()
        .iter()
        .map(|a| mapping.get(a).cloned().unwrap_or_else(|| a.clone()))
        .collect();
    let genotypes = vc.remap_genotypes(|a| mapping.get(a).cloned())?;
    vc.to_builder()
        .alleles(alleles)
        .genotypes(genotypes)
        .reference_base_for_indel(padding)
        .make()
}

/// Same record without genotypes.
pub fn sites_only(vc: &VariantContext) -> Result<VariantContext, VariantError> {
    vc.to_builder().no_genotypes().make()
}

/// [`sites_only`] applied to every record.
pub fn sites_only_all<'a>(
    vcs: impl IntoIterator<Item = &'a VariantContext>,
) -> Result<Vec<VariantContext>, VariantError> {
    vcs.into_iter().map(sites_only).collect()
}

/// Keep only `keys_to_preserve` among INFO and extended genotype attributes.
pub fn prune_variant_context(vc: &VariantContext, keys_to_preserve: &[&str]) -> Result<VariantContext, VariantError> {
    let keep = |key: &str| keys_to_preserve.contains(&key);

    let mut attributes = vc.attributes().clone();
    attributes.retain(|key, _| keep(key));

    let mut genotypes = GenotypesContext::with_capacity(vc.n_samples());
    for genotype in vc.genotypes() {
        let mut extended = genotype.extended_attributes().clone();
        extended.retain(|key, _| keep(key));
        genotypes.add(
            GenotypeBuilder::from(genotype)
                .no_attributes()
                .attributes(&extended)?
                .build()?,
        )?;
    }

    vc.to_builder().attributes(attributes).genotypes(genotypes).make()
}

fn complement(base: u8) -> u8 {
    match base {
        b'A' => b'T',
        b'T' => b'A',
        b'C' => b'G',
        b'G' => b'C',
        other => other,
    }
}

/// Record as seen from the opposite strand.
pub fn reverse_complement(vc: &VariantContext) -> Result<VariantContext, VariantError> {
    let mut mapping = HashMap::with_capacity(vc.n_alleles());
    for allele in vc.alleles() {
        let flipped = if allele.is_null() || allele.is_symbolic() {
            allele.clone()
        } else {
            let bases: Vec<u8> = allele.bases().iter().rev().map(|&b| complement(b)).collect();
            Allele::create(bases, allele.is_reference())?
        };
        mapping.insert(allele.clone(), flipped);
    }
    let padding = vc.reference_base_for_indel().map(complement);
    rebuild_with_allele_mapping(vc, &mapping, padding)
}

/// Drop extended genotype attributes not in `allowed`; `None` keeps all.
pub fn purge_unallowed_genotype_attributes(
    vc: &VariantContext,
    allowed: Option<&HashSet<String>>,
) -> Result<VariantContext, VariantError> {
    let Some(allowed) = allowed else {
        return Ok(vc.clone());
    };
    let mut genotypes = GenotypesContext::with_capacity(vc.n_samples());
    for genotype in vc.genotypes() {
        let mut extended = genotype.extended_attributes().clone();
        extended.retain(|key, _| allowed.contains(key));
        genotypes.add(
            GenotypeBuilder::from(genotype)
                .no_attributes()
                .attributes(&extended)?
                .build()?,
        )?;
    }
    vc.modify_genotypes(genotypes)
}

/// Whether `vc1` shares the reference of `vc2` and all its alternates
/// appear among those of `vc2`.
pub fn alleles_are_subset(vc1: &VariantContext, vc2: &VariantContext) -> bool {
    vc1.reference() == vc2.reference()
        && vc1
            .alternate_alleles()
            .iter()
            .all(|a| vc2.has_alternate_allele(a))
}

enum Regroup {
    Adopt(usize),
    Join,
}

/// Partition records by variant type.
///
/// A record whose alleles are a subset of a record of another type is
/// grouped with that record rather than under its own type.
pub fn separate_variant_contexts_by_type<'a>(
    vcs: impl IntoIterator<Item = &'a VariantContext>,
) -> BTreeMap<VariantType, Vec<VariantContext>> {
    let mut mapped: BTreeMap<VariantType, Vec<VariantContext>> = BTreeMap::new();
    for vc in vcs {
        let own = vc.variant_type();
        let mut add_to_own = true;
        for ty in ALL_TYPES {
            if ty == own {
                continue;
            }
            let action = mapped.get(&ty).and_then(|list| {
                list.iter().enumerate().find_map(|(idx, other)| {
                    if alleles_are_subset(other, vc) {
                        Some(Regroup::Adopt(idx))
                    } else if alleles_are_subset(vc, other) {
                        Some(Regroup::Join)
                    } else {
                        None
                    }
                })
            });
            match action {
                Some(Regroup::Adopt(idx)) => {
                    let adopted = match mapped.get_mut(&ty) {
                        Some(list) => {
                            let adopted = list.remove(idx);
                            if list.is_empty() {
                                mapped.remove(&ty);
                            }
                            adopted
                        }
                        None => continue,
                    };
                    mapped.entry(own).or_default().push(adopted);
                }
                Some(Regroup::Join) => {
                    if let Some(list) = mapped.get_mut(&ty) {
                        list.push(vc.clone());
                    }
                    add_to_own = false;
                }
                None => {}
            }
        }
        if add_to_own {
            mapped.entry(own).or_default().push(vc.clone());
        }
    }
    mapped
}

/// Purine/pyrimidine class of a single-base substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseSubstitutionType {
    /// A<->G or C<->T.
    Transition,
    /// Any other change.
    Transversion,
}

/// Substitution class of a biallelic SNP.
pub fn snp_substitution_type(vc: &VariantContext) -> Result<BaseSubstitutionType, VariantError> {
    if !vc.is_snp() || !vc.is_biallelic() {
        return Err(VariantError::NotBiallelicSnp {
            contig: vc.contig().to_string(),
            start: vc.start(),
        });
    }
    let reference = vc.reference().bases()[0];
    let alternate = vc.alleles()[1].bases()[0];
    let transition = matches!(
        (reference, alternate),
        (b'A', b'G') | (b'G', b'A') | (b'C', b'T') | (b'T', b'C')
    );
    Ok(if transition {
        BaseSubstitutionType::Transition
    } else {
        BaseSubstitutionType::Transversion
    })
}

/// Biallelic SNP that is a transition.
pub fn is_transition(vc: &VariantContext) -> Result<bool, VariantError> {
    snp_substitution_type(vc).map(|t| t == BaseSubstitutionType::Transition)
}

/// Biallelic SNP that is a transversion.
pub fn is_transversion(vc: &VariantContext) -> Result<bool, VariantError> {
    snp_substitution_type(vc).map(|t| t == BaseSubstitutionType::Transversion)
}

/// Exact Hardy-Weinberg p-value over the genotype classes; 0 with no calls.
pub fn compute_hardy_weinberg_pvalue(vc: &VariantContext) -> f64 {
    if vc.chromosome_count() == 0 {
        return 0.0;
    }
    hardy_weinberg_p_value(vc.hom_ref_count(), vc.het_count(), vc.hom_var_count())
}

/// Genotype without PL and GL.
pub fn remove_pls(genotype: &Genotype) -> Result<Genotype, VariantError> {
    let mut extended = genotype.extended_attributes().clone();
    extended.remove(GENOTYPE_LIKELIHOODS_KEY);
    GenotypeBuilder::from(genotype)
        .no_pl()
        .no_attributes()
        .attributes(&extended)?
        .build()
}

/// Every genotype with its likelihoods removed.
pub fn strip_pls(genotypes: &GenotypesContext) -> Result<GenotypesContext, VariantError> {
    let mut stripped = GenotypesContext::with_capacity(genotypes.size());
    for genotype in genotypes {
        if genotype.has_likelihoods() || genotype.has_attribute(GENOTYPE_LIKELIHOODS_KEY) {
            stripped.add(remove_pls(genotype)?)?;
        } else {
            stripped.add(genotype.clone())?;
        }
    }
    Ok(stripped)
}

fn unpadded<'a>(vc: &VariantContext, allele: &'a Allele) -> &'a [u8] {
    if vc.has_reference_base_for_indel() {
        allele.bases()
    } else {
        allele.bases().get(1..).unwrap_or(&[])
    }
}

/// Repeat-unit counts of an indel against its reference context.
///
/// `ref_with_pad` is the reference starting at the base before the event.
/// Returns the reference count followed by one count per alternate, and the
/// repeat unit, or `None` when some allele is not a tandem expansion.
pub fn num_tandem_repeat_units(vc: &VariantContext, ref_with_pad: &[u8]) -> Option<(Vec<usize>, Vec<u8>)> {
    if !vc.is_indel() {
        return None;
    }
    let context = ref_with_pad.get(1..)?;
    let reference = unpadded(vc, vc.reference());

    let mut lengths = Vec::with_capacity(vc.n_alleles());
    let mut unit = Vec::new();
    for allele in vc.alternate_alleles() {
        let (counts, repeat_unit) = repeat_unit_counts(reference, unpadded(vc, allele), context);
        if counts[0] <= 0 || counts[1] <= 0 {
            return None;
        }
        if lengths.is_empty() {
            lengths.push(counts[0] as usize);
        }
        lengths.push(counts[1] as usize);
        unit = repeat_unit;
    }
    Some((lengths, unit))
}

fn repeat_unit_counts(reference: &[u8], alternate: &[u8], context: &[u8]) -> ([i64; 2], Vec<u8>) {
    let longer = if alternate.len() > reference.len() {
        alternate
    } else {
        reference
    };
    let unit_len = find_repeated_substring(longer).min(longer.len());
    let unit = longer[..unit_len].to_vec();

    let in_ref = find_number_of_repetitions(&unit, reference) as i64;
    let with_context = |bases: &[u8]| {
        let mut joined = Vec::with_capacity(bases.len() + context.len());
        joined.extend_from_slice(bases);
        joined.extend_from_slice(context);
        find_number_of_repetitions(&unit, &joined) as i64 - in_ref
    };
    ([with_context(reference), with_context(alternate)], unit)
}

/// Whether every alternate of an indel is a repeat of the adjacent reference.
pub fn is_tandem_repeat(vc: &VariantContext, ref_with_pad: &[u8]) -> bool {
    if !vc.is_indel() {
        return false;
    }
    let Some(context) = ref_with_pad.get(1..) else {
        return false;
    };
    let reference = vc.reference();
    vc.alternate_alleles().iter().all(|alt| {
        if !Allele::one_is_prefix_of_other(reference, alt) {
            return false;
        }
        if reference.len() > alt.len() {
            bases_are_repeated(reference.bases(), alt.bases(), context, 2)
        } else {
            bases_are_repeated(alt.bases(), reference.bases(), context, 1)
        }
    })
}

/// Convert a list of values into a single attribute, unwrapping singletons.
pub(crate) fn collapse_list(mut values: Vec<AttributeValue>) -> AttributeValue {
    if values.len() == 1 {
        values.swap_remove(0)
    } else {
        AttributeValue::List(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::variant::VariantContextBuilder;
    use pretty_assertions::assert_eq;

    fn allele(bases: &str, is_ref: bool) -> Allele {
        Allele::create(bases, is_ref).expect("allele")
    }

    fn genotype(name: &str, alleles: &[&Allele]) -> Genotype {
        GenotypeBuilder::new(name, alleles.iter().map(|a| (*a).clone()))
            .build()
            .expect("genotype")
    }

    #[test]
    fn chromosome_counts_for_hom_ref_and_het() {
        let a = allele("A", true);
        let t = allele("T", false);
        let vc = VariantContextBuilder::new("t", "chr1", 10, 10, vec![a.clone(), t.clone()])
            .genotypes(GenotypesContext::from_genotypes(vec![
                genotype("s1", &[&a, &a]),
                genotype("s2", &[&a, &t]),
            ]))
            .make()
            .expect("vc");
        let mut attributes = AttributeMap::new();
        calculate_chromosome_counts(&vc, &mut attributes, true);
        assert_eq!(attributes.get("AN"), Some(&AttributeValue::Integer(4)));
        assert_eq!(attributes.get("AC"), Some(&AttributeValue::Integer(1)));
        assert_eq!(attributes.get("AF"), Some(&AttributeValue::String("0.25".into())));
    }

    #[test]
    fn no_calls_remove_stale_counts() {
        let a = allele("A", true);
        let nc = Allele::no_call();
        let vc = VariantContextBuilder::new("t", "chr1", 10, 10, vec![a, allele("T", false)])
            .attribute("AC", 3)
            .attribute("AN", 6)
            .genotypes(GenotypesContext::from_genotypes(vec![genotype("s1", &[&nc, &nc])]))
            .make()
            .expect("vc");
        let mut attributes = vc.attributes().clone();
        calculate_chromosome_counts(&vc, &mut attributes, true);
        assert!(attributes.is_empty());

        let mut kept = vc.attributes().clone();
        calculate_chromosome_counts(&vc, &mut kept, false);
        assert_eq!(kept.get("AN"), Some(&AttributeValue::Integer(0)));
    }

    #[test]
    fn trim_then_pad_restores_alleles() {
        let a = allele("A", true);
        let at = allele("AT", false);
        let vc = VariantContextBuilder::new("t", "chr1", 10, 10, vec![a.clone(), at.clone()])
            .genotypes(GenotypesContext::from_genotypes(vec![genotype("s1", &[&a, &at])]))
            .make()
            .expect("vc");

        let trimmed = create_variant_context_with_trimmed_alleles(&vc).expect("trim");
        assert!(trimmed.reference().is_null());
        assert_eq!(trimmed.reference_base_for_indel(), Some(b'A'));
        assert_eq!(trimmed.alleles()[1].bases(), b"T");
        let sample = trimmed.genotype("s1").expect("s1");
        assert!(sample.alleles()[0].is_null());

        let padded = create_variant_context_with_padded_alleles(&trimmed, b'G', false).expect("pad");
        assert_eq!(padded.alleles(), vc.alleles());
        assert_eq!(padded.reference_base_for_indel(), None);
        assert_eq!(padded.genotype("s1").map(|g| g.alleles().to_vec()), Some(vec![a, at]));
    }

    #[test]
    fn mixed_site_keeps_untrimmed_form() {
        let vc = VariantContextBuilder::new(
            "t",
            "chr1",
            10,
            11,
            vec![allele("TA", true), allele("TGA", false), allele("TG", false)],
        )
        .make()
        .expect("vc");
        let trimmed = create_variant_context_with_trimmed_alleles(&vc).expect("trim");
        assert_eq!(trimmed, vc);
    }

    #[test]
    fn stored_padding_base_wins_over_argument() {
        let vc = VariantContextBuilder::new("t", "chr1", 10, 10, vec![allele("-", true), allele("A", false)])
            .reference_base_for_indel(Some(b'G'))
            .make()
            .expect("vc");
        let padded = create_variant_context_with_padded_alleles(&vc, b'?', true).expect("stored base wins");
        assert_eq!(padded.reference().bases(), b"G");
        assert_eq!(padded.alleles()[1].bases(), b"AG");
    }

    #[test]
    fn padding_rejects_reference_longer_than_span() {
        let vc = VariantContextBuilder::new("t", "chr1", 10, 10, vec![allele("ACT", true), allele("A", false)])
            .make()
            .expect("vc");
        assert!(matches!(
            create_variant_context_with_padded_alleles(&vc, b'A', false),
            Err(VariantError::BadlyFormedLocation { start: 10, .. })
        ));
    }

    #[test]
    fn reverse_trim_drops_shared_suffix() {
        let vc = VariantContextBuilder::new("t", "chr1", 10, 12, vec![allele("ACT", true), allele("AGT", false)])
            .make()
            .expect("vc");
        let trimmed = reverse_trim_alleles(&vc).expect("trim");
        assert_eq!(trimmed.reference().bases(), b"AC");
        assert_eq!(trimmed.alleles()[1].bases(), b"AG");
        assert_eq!(trimmed.end(), 11);
    }

    #[test]
    fn substitution_classes() {
        let ts = VariantContextBuilder::new("t", "chr1", 1, 1, vec![allele("A", true), allele("G", false)])
            .make()
            .expect("vc");
        assert_eq!(is_transition(&ts), Ok(true));
        let tv = VariantContextBuilder::new("t", "chr1", 1, 1, vec![allele("A", true), allele("C", false)])
            .make()
            .expect("vc");
        assert_eq!(is_transversion(&tv), Ok(true));
        let indel = VariantContextBuilder::new("t", "chr1", 1, 1, vec![allele("A", true), allele("AC", false)])
            .make()
            .expect("vc");
        assert!(is_transition(&indel).is_err());
    }

    #[test]
    fn reverse_complement_flips_alleles_and_genotypes() {
        let a = allele("AC", true);
        let g = allele("GG", false);
        let vc = VariantContextBuilder::new("t", "chr1", 1, 2, vec![a.clone(), g.clone()])
            .genotypes(GenotypesContext::from_genotypes(vec![genotype("s1", &[&a, &g])]))
            .make()
            .expect("vc");
        let flipped = reverse_complement(&vc).expect("flip");
        assert_eq!(flipped.reference().bases(), b"GT");
        assert_eq!(flipped.alleles()[1].bases(), b"CC");
        assert_eq!(
            flipped.genotype("s1").map(Genotype::genotype_string),
            Some("GT/CC".to_string())
        );
    }

    #[test]
    fn separates_subset_records_under_the_richer_type() {
        let snp = VariantContextBuilder::new("t", "chr1", 1, 1, vec![allele("A", true), allele("C", false)])
            .make()
            .expect("snp");
        let mixed = VariantContextBuilder::new(
            "t",
            "chr1",
            1,
            1,
            vec![allele("A", true), allele("C", false), allele("AT", false)],
        )
        .make()
        .expect("mixed");
        let groups = separate_variant_contexts_by_type([&snp, &mixed]);
        assert!(!groups.contains_key(&VariantType::Snp));
        assert_eq!(groups.get(&VariantType::Mixed).map(Vec::len), Some(2));
    }

    #[test]
    fn tandem_repeat_counts() {
        // reference context ACACACAG, deletion of one CA unit
        let vc = VariantContextBuilder::new("t", "chr1", 1, 3, vec![allele("ACA", true), allele("A", false)])
            .make()
            .expect("vc");
        let (lengths, unit) = num_tandem_repeat_units(&vc, b"ACACACAG").expect("repeat");
        assert_eq!(lengths, vec![3, 2]);
        assert_eq!(unit, b"CA".to_vec());
        assert!(is_tandem_repeat(&vc, b"ACACACAG"));
        assert!(!is_tandem_repeat(&vc, b"AGGGGGGG"));
    }
}
