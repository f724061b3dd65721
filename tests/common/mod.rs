#![allow(dead_code)]

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use variant_annotator::genomics::stratify_reads;
use variant_annotator::{
    AlignedRead, Allele, GenotypeBuilder, GenotypesContext, ReferenceContext, SiteInput, VariantContext,
    VariantContextBuilder,
};

pub const CONTIG: &str = "chr1";
pub const SITE: u32 = 10;
// positions 1..=20
pub const WINDOW: &[u8] = b"ACGTACGTCAGGGTTTACGT";

fn snapshot_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests").join("snapshots")
}

pub fn assert_snapshot(name: &str, actual: &str) {
    let path = snapshot_root().join(name);
    if std::env::var("VARIANT_ANNOTATOR_UPDATE_SNAPSHOTS").is_ok() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create snapshot directory");
        }
        fs::write(&path, actual).expect("write snapshot");
        return;
    }

    let expected = fs::read_to_string(&path).unwrap_or_else(|_| panic!("snapshot {:?} not found", path));
    if normalize(&expected) != normalize(actual) {
        panic!(
            "Snapshot mismatch for {:?}. Set VARIANT_ANNOTATOR_UPDATE_SNAPSHOTS=1 to regenerate.\nExpected:\n{}\nActual:\n{}",
            path, expected, actual
        );
    }
}

fn normalize(input: &str) -> String {
    input.replace("\r\n", "\n")
}

pub fn allele(bases: &str, is_ref: bool) -> Allele {
    Allele::create(bases, is_ref).expect("allele")
}

pub fn reference_at(position: u32) -> ReferenceContext {
    ReferenceContext::new(CONTIG, position, 1, WINDOW.to_vec())
}

/// Five-base read starting at 8 whose base at the site is `base`.
pub fn site_read(name: &str, base: u8, qual: u8, mapq: u8, reverse: bool) -> Arc<AlignedRead> {
    Arc::new(AlignedRead::new(
        name,
        CONTIG,
        8,
        mapq,
        Vec::new(),
        vec![b'T', b'C', base, b'G', b'G'],
        vec![30, 30, qual, 30, 30],
        reverse,
    ))
}

/// Het `s1` with 3 ref and 2 alt reads, hom-ref `s2` with 4 ref reads.
pub fn reads_by_sample() -> BTreeMap<String, Vec<Arc<AlignedRead>>> {
    let mut reads = BTreeMap::new();
    reads.insert(
        "s1".to_string(),
        vec![
            site_read("r1", b'A', 30, 60, false),
            site_read("r2", b'A', 32, 60, true),
            site_read("r3", b'A', 34, 0, false),
            site_read("r4", b'G', 20, 60, true),
            site_read("r5", b'G', 22, 50, true),
        ],
    );
    reads.insert(
        "s2".to_string(),
        vec![
            site_read("r6", b'A', 30, 60, false),
            site_read("r7", b'A', 30, 60, true),
            site_read("r8", b'A', 30, 60, false),
            site_read("r9", b'A', 30, 60, true),
        ],
    );
    reads
}

/// A/G SNP at [`SITE`] with a het `s1` and a hom-ref `s2`.
pub fn snp_site(source: &str) -> VariantContext {
    let (r, a) = (allele("A", true), allele("G", false));
    let genotypes = GenotypesContext::from_genotypes([
        GenotypeBuilder::new("s1", vec![r.clone(), a.clone()]).build().expect("s1"),
        GenotypeBuilder::new("s2", vec![r.clone(), r.clone()]).build().expect("s2"),
    ]);
    VariantContextBuilder::new(source, CONTIG, SITE, SITE, vec![r, a])
        .phred_qual(100.0)
        .genotypes(genotypes)
        .make()
        .expect("snp")
}

pub fn site_input(vc: VariantContext) -> SiteInput {
    let pileups = stratify_reads(vc.contig(), vc.start(), &reads_by_sample());
    let reference = reference_at(vc.start());
    SiteInput::new(vc, reference, pileups)
}
