use std::sync::Arc;

use pretty_assertions::assert_eq;
use test_case::test_case;

use super::*;
use crate::annotation::test_support::{
    allele, population_site, reference, site_read, snp_site, standard_pileups, CONTIG,
};
use crate::annotation::{
    AnnotatorConfig, FeatureTracker, InfoFieldAnnotation, SiteContext, StratifiedLikelihoods, VariantAnnotation,
};
use crate::genomics::{PerReadAlleleLikelihoodMap, ReferenceContext, StratifiedPileups};
use crate::variant::{keys, Allele, AttributeMap, AttributeValue, VariantContext, VariantContextBuilder};

fn run(annotation: &dyn InfoFieldAnnotation, vc: &VariantContext) -> Option<AttributeMap> {
    let reference = reference();
    let pileups = standard_pileups();
    let tracker = FeatureTracker::new();
    annotation.annotate(&SiteContext::new(&reference, &pileups, &tracker), vc)
}

fn value(map: &AttributeMap, key: &str) -> String {
    map.get(key).map(AttributeValue::as_string).unwrap_or_default()
}

#[test_case(&DepthOfCoverage, keys::DEPTH_KEY, "9" ; "depth")]
#[test_case(&QualByDepth, keys::QUAL_BY_DEPTH_KEY, "20.00" ; "qual by depth")]
#[test_case(&RmsMappingQuality, keys::RMS_MAPPING_QUALITY_KEY, "55.48" ; "rms mapping quality")]
#[test_case(&MappingQualityZero, keys::MAPPING_QUALITY_ZERO_KEY, "1" ; "mapping quality zero")]
#[test_case(&SpanningDeletions, keys::SPANNING_DELETIONS_KEY, "0.00" ; "spanning deletions")]
#[test_case(&BaseCounts, keys::BASE_COUNTS_KEY, "7,0,2,0" ; "base counts")]
#[test_case(&FisherStrand, keys::FISHER_STRAND_KEY, "3.522" ; "fisher strand")]
#[test_case(&HomopolymerRun, keys::HOMOPOLYMER_RUN_KEY, "3" ; "homopolymer run")]
fn pileup_annotations_on_snp(annotation: &dyn InfoFieldAnnotation, key: &str, expected: &str) {
    let map = run(annotation, &snp_site()).expect("annotated");
    assert_eq!(value(&map, key), expected);
    assert!(annotation.key_names().contains(&key));
    assert!(annotation.descriptions().iter().any(|line| line.id == key));
}

#[test]
fn rank_sum_tests_compare_alt_against_ref() {
    let vc = snp_site();
    let base_q = run(&RankSumTest::base_quality(), &vc).expect("base quality");
    assert_eq!(value(&base_q, keys::BASE_QUAL_RANK_SUM_KEY), "-2.200");

    let mapping_q = run(&RankSumTest::mapping_quality(), &vc).expect("mapping quality");
    assert_eq!(value(&mapping_q, keys::MAP_QUAL_RANK_SUM_KEY), "-0.549");

    // every read has the site at offset 2 of 5, so positions tie completely
    let read_pos = run(&RankSumTest::read_position(), &vc).expect("read position");
    let z: f64 = value(&read_pos, keys::READ_POS_RANK_SUM_KEY).parse().expect("float");
    assert!(z.abs() < 1e-3);
}

#[test]
fn rank_sum_needs_both_sets() {
    let reference = reference();
    let pileups: StratifiedPileups = crate::annotation::test_support::pileups(vec![(
        "s1",
        vec![site_read("a", b'A', 30, 60, false), site_read("b", b'A', 31, 60, false)],
    )]);
    let tracker = FeatureTracker::new();
    let site = SiteContext::new(&reference, &pileups, &tracker);
    assert!(RankSumTest::base_quality().annotate(&site, &snp_site()).is_none());
}

#[test]
fn chromosome_counts_and_allele_balance() {
    let vc = snp_site();
    let counts = run(&ChromosomeCounts, &vc).expect("counts");
    assert_eq!(value(&counts, keys::ALLELE_NUMBER_KEY), "4");
    assert_eq!(value(&counts, keys::ALLELE_COUNT_KEY), "1");
    assert_eq!(value(&counts, keys::ALLELE_FREQUENCY_KEY), "0.25");

    let balance = run(&AlleleBalance, &vc).expect("balance");
    assert_eq!(value(&balance, keys::ALLELE_BALANCE_HET_KEY), "0.60");
    assert_eq!(value(&balance, keys::ALLELE_BALANCE_HOM_KEY), "1.00");
    assert_eq!(value(&balance, keys::NON_DIPLOID_RATIO_KEY), "0.00");
}

#[test]
fn sites_without_data_are_not_annotated() {
    let reference = reference();
    let pileups = StratifiedPileups::new();
    let tracker = FeatureTracker::new();
    let site = SiteContext::new(&reference, &pileups, &tracker);
    let vc = snp_site();
    assert!(DepthOfCoverage.annotate(&site, &vc).is_none());
    assert!(MappingQualityZero.annotate(&site, &vc).is_none());
    assert!(RmsMappingQuality.annotate(&site, &vc).is_none());
    assert!(FisherStrand.annotate(&site, &vc).is_none());
    assert!(BaseCounts.annotate(&site, &vc).is_none());
}

#[test]
fn hardy_weinberg_needs_ten_confident_samples() {
    assert!(run(&HardyWeinberg, &population_site(4, 3, 2)).is_none());

    let map = run(&HardyWeinberg, &population_site(5, 0, 5)).expect("hw");
    assert_eq!(value(&map, keys::HARDY_WEINBERG_KEY), "28.7");

    let balanced = run(&HardyWeinberg, &population_site(10, 0, 0)).expect("hw");
    assert_eq!(value(&balanced, keys::HARDY_WEINBERG_KEY), "0.0");
}

#[test]
fn inbreeding_coefficient_from_likelihoods() {
    let annotation = InbreedingCoeff::default();
    let map = run(&annotation, &population_site(5, 0, 5)).expect("inbred");
    assert_eq!(value(&map, keys::INBREEDING_COEFFICIENT_KEY), "0.9980");

    let outbred = run(&annotation, &population_site(0, 10, 0)).expect("outbred");
    assert_eq!(value(&outbred, keys::INBREEDING_COEFFICIENT_KEY), "-0.9960");
}

#[test]
fn inbreeding_coefficient_restricted_to_founders() {
    let mut annotation = InbreedingCoeff::default();
    annotation.initialize(&AnnotatorConfig::new().with_founder_ids(["sample0", "sample1"]));
    assert!(run(&annotation, &population_site(5, 0, 5)).is_none());
}

fn str_deletion() -> (VariantContext, ReferenceContext) {
    // T at 5 pads a CA deletion from (CA)x3
    let vc = VariantContextBuilder::new("test", CONTIG, 5, 7, vec![allele("CA", true), Allele::null(false)])
        .reference_base_for_indel(Some(b'T'))
        .make()
        .expect("deletion");
    let reference = ReferenceContext::new(CONTIG, 5, 1, b"GGGGTCACACAGT".to_vec());
    (vc, reference)
}

#[test]
fn tandem_repeat_of_deletion() {
    let (vc, reference) = str_deletion();
    let pileups = StratifiedPileups::new();
    let tracker = FeatureTracker::new();
    let site = SiteContext::new(&reference, &pileups, &tracker);

    let map = TandemRepeatAnnotator.annotate(&site, &vc).expect("str");
    assert_eq!(map.get(keys::STR_PRESENT_KEY), Some(&AttributeValue::Flag));
    assert_eq!(value(&map, keys::REPEAT_UNIT_KEY), "CA");
    assert_eq!(value(&map, keys::REPEATS_PER_ALLELE_KEY), "3,2");

    assert!(TandemRepeatAnnotator.annotate(&site, &snp_site()).is_none());
    assert!(HomopolymerRun.annotate(&site, &vc).is_none());
}

#[test]
fn indels_use_read_likelihoods() {
    let (vc, reference) = str_deletion();
    let (ref_allele, del) = (vc.reference().clone(), vc.alternate_alleles()[0].clone());
    let mut map = PerReadAlleleLikelihoodMap::new();
    for (idx, (supports_ref, reverse, mapq)) in
        [(true, false, 60), (true, true, 60), (false, true, 20), (false, true, 25), (true, false, 60)]
            .into_iter()
            .enumerate()
    {
        let read = Arc::new(crate::genomics::AlignedRead::new(
            format!("read{idx}"),
            CONTIG,
            3,
            mapq,
            Vec::new(),
            b"GGTCA".to_vec(),
            vec![30; 5],
            reverse,
        ));
        let (ref_ll, alt_ll) = if supports_ref { (-0.1, -3.0) } else { (-3.0, -0.1) };
        map.add(&read, ref_allele.clone(), ref_ll);
        map.add(&read, del.clone(), alt_ll);
    }
    let likelihoods: StratifiedLikelihoods = [("s1".to_string(), map)].into_iter().collect();
    let pileups = StratifiedPileups::new();
    let tracker = FeatureTracker::new();
    let site = SiteContext::new(&reference, &pileups, &tracker).with_likelihoods(&likelihoods);

    let depth = DepthOfCoverage.annotate(&site, &vc).expect("depth");
    assert_eq!(value(&depth, keys::DEPTH_KEY), "5");

    // ref reads: 2 forward, 1 reverse; alt reads: 2 reverse
    let fs = FisherStrand.annotate(&site, &vc).expect("fs");
    assert_eq!(value(&fs, keys::FISHER_STRAND_KEY), "3.979");

    let mq = RankSumTest::mapping_quality().annotate(&site, &vc).expect("mq rank sum");
    assert_eq!(value(&mq, keys::MAP_QUAL_RANK_SUM_KEY), "-1.645");

    assert!(RankSumTest::base_quality().annotate(&site, &vc).is_none());
}
