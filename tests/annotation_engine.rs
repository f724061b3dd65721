#[path = "common/mod.rs"]
mod common;

use std::collections::HashSet;

use blake3::hash;
use pretty_assertions::assert_eq;
use variant_annotator::annotation::{HeaderCount, HeaderType, VcfHeaderLine};
use variant_annotator::genomics::render_vcf;
use variant_annotator::variant::keys;
use variant_annotator::{
    AnnotationError, AnnotatorConfig, AttributeValue, FeatureTracker, VariantAnnotatorEngine, VariantContext,
    VariantContextBuilder,
};

use common::{allele, assert_snapshot, site_input, snp_site, CONTIG, SITE};

fn samples() -> Vec<String> {
    vec!["s1".to_string(), "s2".to_string()]
}

fn meta_lines(engine: &VariantAnnotatorEngine) -> Vec<String> {
    engine.vcf_annotation_descriptions().iter().map(ToString::to_string).collect()
}

fn track_record(source: &str, id: Option<&str>, info: &[(&str, &str)]) -> VariantContext {
    let mut builder =
        VariantContextBuilder::new(source, CONTIG, SITE, SITE, vec![allele("A", true), allele("G", false)]);
    if let Some(id) = id {
        builder = builder.id(id);
    }
    for (key, value) in info {
        builder = builder.attribute(*key, *value);
    }
    builder.make().expect("track record")
}

#[test]
fn annotated_vcf_matches_golden() {
    let config = AnnotatorConfig::new().with_annotations([
        "BaseCounts",
        "DepthOfCoverage",
        "MappingQualityZero",
        "DepthPerAlleleBySample",
    ]);
    let engine = VariantAnnotatorEngine::new(&config).expect("engine");
    let tracker = FeatureTracker::new();

    let annotated = engine
        .annotate_batch(&tracker, &[site_input(snp_site("calls"))])
        .expect("annotated");
    let vcf = render_vcf(&meta_lines(&engine), &samples(), &annotated).expect("render");
    assert_snapshot("annotation/standard_snp.vcf", &vcf);
}

#[test]
fn groups_select_in_registration_order_and_exclusions_win() {
    let config = AnnotatorConfig::new()
        .with_groups(["RankSumTest"])
        .with_annotations(["DepthOfCoverage"])
        .with_exclusions(["ReadPosRankSumTest"]);
    let engine = VariantAnnotatorEngine::new(&config).expect("engine");
    assert_eq!(
        engine.info_annotation_names(),
        vec!["BaseQualityRankSumTest", "DepthOfCoverage", "MappingQualityRankSumTest"]
    );
    assert!(engine.genotype_annotation_names().is_empty());

    let all = VariantAnnotatorEngine::new(&AnnotatorConfig::all()).expect("all");
    assert_eq!(all.info_annotation_names().len() + all.genotype_annotation_names().len(), 20);
}

#[test]
fn unknown_selections_are_rejected() {
    let group = VariantAnnotatorEngine::new(&AnnotatorConfig::new().with_groups(["NoSuchGroup"]));
    assert!(matches!(group, Err(AnnotationError::UnknownGroup(_))));

    let name = VariantAnnotatorEngine::new(&AnnotatorConfig::new().with_annotations(["NoSuchAnnotation"]));
    assert!(matches!(name, Err(AnnotationError::UnknownAnnotation(_))));

    let expression = VariantAnnotatorEngine::new(&AnnotatorConfig::new().with_expressions(["gnomad.AF"]));
    assert!(matches!(expression, Err(AnnotationError::UnknownResource { .. })));
}

#[test]
fn no_annotations_leave_the_record_unchanged() {
    let engine = VariantAnnotatorEngine::new(&AnnotatorConfig::new()).expect("engine");
    let tracker = FeatureTracker::new();
    let vc = snp_site("calls").to_builder().attribute("CUSTOM", "kept").make().expect("vc");
    let input = site_input(vc.clone());

    let annotated = engine.annotate_context(&input.context(&tracker), &vc).expect("annotated");
    assert_eq!(annotated, vc);
    assert!(engine.vcf_annotation_descriptions().is_empty());
}

#[test]
fn standard_group_on_snp() {
    let engine = VariantAnnotatorEngine::new(&AnnotatorConfig::new().with_groups(["Standard"])).expect("engine");
    let tracker = FeatureTracker::new();
    let annotated = engine
        .annotate_batch(&tracker, &[site_input(snp_site("calls"))])
        .expect("annotated")
        .remove(0);

    assert_eq!(annotated.attribute_as_string(keys::DEPTH_KEY).as_deref(), Some("9"));
    assert_eq!(annotated.attribute_as_string(keys::QUAL_BY_DEPTH_KEY).as_deref(), Some("20.00"));
    assert_eq!(annotated.attribute_as_string(keys::RMS_MAPPING_QUALITY_KEY).as_deref(), Some("55.48"));
    assert_eq!(annotated.attribute_as_string(keys::FISHER_STRAND_KEY).as_deref(), Some("3.522"));
    assert_eq!(annotated.attribute_as_string(keys::ALLELE_COUNT_KEY).as_deref(), Some("1"));

    let s1 = annotated.genotype("s1").expect("s1");
    assert_eq!(s1.ad(), Some(&[3, 2][..]));
    assert_eq!(s1.dp(), 5);
    assert!(s1.is_het());
}

#[test]
fn later_info_annotation_overwrites_input_values() {
    let engine = VariantAnnotatorEngine::new(&AnnotatorConfig::new().with_annotations(["DepthOfCoverage"]))
        .expect("engine");
    let tracker = FeatureTracker::new();
    let vc = snp_site("calls").to_builder().attribute(keys::DEPTH_KEY, 1000).make().expect("vc");
    let input = site_input(vc.clone());

    let annotated = engine.annotate_context(&input.context(&tracker), &vc).expect("annotated");
    assert_eq!(annotated.attribute_as_int(keys::DEPTH_KEY, -1), 9);
}

#[test]
fn dbsnp_and_comparison_tracks() {
    let mut tracker = FeatureTracker::new();
    tracker.add("dbsnp", track_record("dbsnp", Some("rs123"), &[]));
    tracker.add("truth", track_record("truth", None, &[]));

    let config = AnnotatorConfig::new().with_dbsnp("dbsnp").with_comp_tracks(["truth", "absent"]);
    let engine = VariantAnnotatorEngine::new(&config).expect("engine");
    let ids: Vec<String> = engine.vcf_annotation_descriptions().into_iter().map(|line| line.id).collect();
    assert_eq!(ids, vec!["DB", "truth", "absent"]);

    let vc = snp_site("calls");
    let input = site_input(vc.clone());
    let annotated = engine.annotate_context(&input.context(&tracker), &vc).expect("annotated");
    assert_eq!(annotated.id(), Some("rs123"));
    assert_eq!(annotated.attribute(keys::DBSNP_KEY), Some(&AttributeValue::Flag));
    assert!(annotated.has_attribute("truth"));
    assert!(!annotated.has_attribute("absent"));
}

#[test]
fn expressions_copy_resource_fields() {
    let mut tracker = FeatureTracker::new();
    tracker.add("gnomad", track_record("gnomad", Some("rs9"), &[("AF", "0.01")]));

    let config = AnnotatorConfig::new()
        .with_resources(["gnomad"])
        .with_expressions(["gnomad.AF", "gnomad.ID"]);
    let header = VcfHeaderLine::info("gnomad.AF", HeaderCount::A, HeaderType::Float, "Allele Frequency");
    let engine = VariantAnnotatorEngine::new(&config).expect("engine").with_header_info([header.clone()]);
    assert_eq!(engine.vcf_annotation_descriptions(), vec![header]);

    let vc = snp_site("calls");
    let input = site_input(vc.clone());
    let annotated = engine.annotate_context(&input.context(&tracker), &vc).expect("annotated");
    assert_eq!(annotated.attribute_as_string("gnomad.AF").as_deref(), Some("0.01"));
    assert_eq!(annotated.attribute_as_string("gnomad.ID").as_deref(), Some("rs9"));

    let headerless = VariantAnnotatorEngine::new(&config).expect("engine");
    let err = headerless.annotate_context(&input.context(&tracker), &vc).expect_err("missing header");
    assert!(matches!(err, AnnotationError::MissingExpressionHeader { .. }));
}

#[test]
fn batch_annotation_is_deterministic() {
    let engine = VariantAnnotatorEngine::new(&AnnotatorConfig::all()).expect("engine");
    let tracker = FeatureTracker::new();
    let inputs: Vec<_> = (0..32).map(|i| site_input(snp_site(&format!("calls{i}")))).collect();

    let sequential: Vec<VariantContext> = inputs
        .iter()
        .map(|input| engine.annotate_context(&input.context(&tracker), &input.variant).expect("annotated"))
        .collect();

    let mut fingerprints = HashSet::new();
    for _ in 0..5 {
        let batch = engine.annotate_batch(&tracker, &inputs).expect("batch");
        assert_eq!(batch, sequential);
        let vcf = render_vcf(&meta_lines(&engine), &samples(), &batch).expect("render");
        fingerprints.insert(hash(vcf.as_bytes()));
    }
    assert_eq!(fingerprints.len(), 1, "outputs diverged across runs");
}
