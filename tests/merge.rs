#[path = "common/mod.rs"]
mod common;

use pretty_assertions::assert_eq;
use test_case::test_case;
use variant_annotator::genomics::render_vcf;
use variant_annotator::genomics::tables::read_sites;
use variant_annotator::variant::keys;
use variant_annotator::{
    simple_merge, GenotypeBuilder, GenotypesContext, MergeOptions, VariantContext, VariantContextBuilder, VariantError,
};
use variant_annotator::variant::{FilteredRecordMergeType, GenotypeMergeType};

use common::{allele, CONTIG};

fn table_records(source: &str, text: &str) -> Vec<VariantContext> {
    let table = read_sites(text.as_bytes(), source).expect("table");
    table
        .sites
        .iter()
        .map(|site| site.materialize().cloned().expect("genotypes"))
        .collect()
}

const CALLS: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA1\n\
    chr1\t100\trs1\tA\tG\t50\tPASS\tDP=10;AF=0.5\tGT:GQ:PL\t0/1:40:40,0,200\n";
const TRUTH: &str = "#CHROM\tPOS\tID\tREF\tALT\tQUAL\tFILTER\tINFO\tFORMAT\tNA2\n\
    chr1\t100\trs2\tA\tG\t70\tPASS\tDP=5;AF=1.0\tGT:GQ:PL\t1/1:60:300,60,0\n";

fn merge(options: &MergeOptions) -> Result<Option<VariantContext>, VariantError> {
    let mut records = table_records("calls", CALLS);
    records.extend(table_records("truth", TRUTH));
    simple_merge(&records, options)
}

#[test]
fn merges_samples_ids_and_depth() {
    let options = MergeOptions::default().with_priority(["calls", "truth"]).with_annotate_origin(true);
    let merged = merge(&options).expect("merge").expect("record");

    assert_eq!(merged.source(), "calls");
    assert_eq!(merged.id(), Some("rs1,rs2"));
    assert_eq!(merged.sample_names(), vec!["NA1", "NA2"]);
    assert_eq!(merged.attribute_as_int(keys::DEPTH_KEY, 0), 15);
    // AF disagrees between the sources
    assert!(!merged.has_attribute(keys::ALLELE_FREQUENCY_KEY));
    assert_eq!(merged.attribute_as_string("set").as_deref(), Some("Intersection"));
    assert_eq!(merged.phred_scaled_qual().round(), 70.0);
    assert!(merged.is_not_filtered());
    assert_eq!(merged.genotype("NA2").and_then(|g| g.pl()), Some(&[300, 60, 0][..]));
}

#[test]
fn merged_record_renders_with_uniquified_samples() {
    let options = MergeOptions::default().with_genotype_merge_type(GenotypeMergeType::Uniquify);
    let merged = merge(&options).expect("merge").expect("record");
    let samples: Vec<String> = merged.sample_names().into_iter().map(str::to_string).collect();
    assert_eq!(samples, vec!["NA1.calls", "NA2.truth"]);

    let vcf = render_vcf(&[], &samples, &[merged]).expect("render");
    let data = vcf.lines().last().expect("data line");
    assert!(data.starts_with("chr1\t100\trs1,rs2\tA\tG\t70.00\tPASS\t"));
    assert!(data.ends_with("GT:GQ:PL\t0/1:40:40,0,200\t1/1:60:300,60,0"));
}

#[test_case(FilteredRecordMergeType::KeepIfAnyUnfiltered, None ; "any unfiltered passes")]
#[test_case(FilteredRecordMergeType::KeepIfAllUnfiltered, Some("LowQual") ; "all filters kept")]
fn filter_policies(policy: FilteredRecordMergeType, expected: Option<&str>) {
    let filtered = TRUTH.replace("\tPASS\t", "\tLowQual\t");
    let mut records = table_records("calls", CALLS);
    records.extend(table_records("truth", &filtered));

    let options = MergeOptions::default().with_filtered_record_merge_type(policy);
    let merged = simple_merge(&records, &options).expect("merge").expect("record");
    let filters: Vec<&str> = merged.filters().into_iter().flatten().map(String::as_str).collect();
    assert_eq!(filters.first().copied(), expected);
    assert!(merged.filters_were_applied());
}

#[test]
fn deletion_and_snp_share_an_extended_reference() {
    let deletion = table_records("indels", "chr1\t100\t.\tATC\tA\t30\t.\t.\n");
    let snp = table_records("snps", "chr1\t100\t.\tA\tG\t20\t.\t.\n");
    let records = [deletion, snp].concat();

    let merged = simple_merge(&records, &MergeOptions::default()).expect("merge").expect("record");
    let bases: Vec<String> = merged.alleles().iter().map(|a| a.base_string()).collect();
    assert_eq!(bases, vec!["ATC", "A", "GTC"]);
    assert_eq!(merged.end(), 102);
    assert!(merged.is_mixed());
    assert!(!merged.filters_were_applied());
}

#[test]
fn shared_samples_follow_the_merge_policy() {
    let (r, a) = (allele("A", true), allele("G", false));
    let record = |source: &str, alleles: [&variant_annotator::Allele; 2]| {
        let genotype = GenotypeBuilder::new("NA1", alleles.into_iter().cloned()).build().expect("genotype");
        VariantContextBuilder::new(source, CONTIG, 100, 100, vec![r.clone(), a.clone()])
            .genotypes(GenotypesContext::from_genotypes([genotype]))
            .make()
            .expect("record")
    };
    let records = [record("first", [&r, &a]), record("second", [&a, &a])];

    let unsorted = simple_merge(&records, &MergeOptions::default()).expect("merge").expect("record");
    assert!(unsorted.genotype("NA1").is_some_and(|g| g.is_het()));

    let prioritized = MergeOptions::default()
        .with_genotype_merge_type(GenotypeMergeType::Prioritize)
        .with_priority(["second", "first"]);
    let merged = simple_merge(&records, &prioritized).expect("merge").expect("record");
    assert!(merged.genotype("NA1").is_some_and(|g| g.is_hom_var()));

    let unique = MergeOptions::default().with_genotype_merge_type(GenotypeMergeType::RequireUnique);
    assert!(matches!(
        simple_merge(&records, &unique),
        Err(VariantError::DuplicateSampleAcrossInputs(name)) if name == "NA1"
    ));

    let missing_priority = MergeOptions::default().with_genotype_merge_type(GenotypeMergeType::Prioritize);
    assert!(matches!(simple_merge(&records, &missing_priority), Err(VariantError::MissingPriorityList(_))));
}
