use std::collections::BTreeMap;
use std::sync::Arc;

use crate::genomics::{stratify_reads, AlignedRead, ReferenceContext, StratifiedPileups};
use crate::variant::{Allele, Genotype, GenotypeBuilder, GenotypesContext, VariantContext, VariantContextBuilder};

pub(crate) const CONTIG: &str = "chr1";
pub(crate) const SITE: u32 = 10;
// positions 1..=20; A at 10 followed by GGG
pub(crate) const WINDOW: &[u8] = b"ACGTACGTCAGGGTTTACGT";

pub(crate) fn allele(bases: &str, is_ref: bool) -> Allele {
    Allele::create(bases, is_ref).expect("allele")
}

pub(crate) fn reference() -> ReferenceContext {
    ReferenceContext::new(CONTIG, SITE, 1, WINDOW.to_vec())
}

/// Five-base read starting at 8 whose base at the site is `base`.
pub(crate) fn site_read(name: &str, base: u8, qual: u8, mapq: u8, reverse: bool) -> Arc<AlignedRead> {
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

pub(crate) fn pileups(samples: Vec<(&str, Vec<Arc<AlignedRead>>)>) -> StratifiedPileups {
    let by_sample: BTreeMap<String, Vec<Arc<AlignedRead>>> =
        samples.into_iter().map(|(name, reads)| (name.to_string(), reads)).collect();
    stratify_reads(CONTIG, SITE, &by_sample)
}

/// Het sample `s1` (3 ref, 2 alt reads) and hom-ref sample `s2` (4 ref reads).
pub(crate) fn standard_pileups() -> StratifiedPileups {
    pileups(vec![
        (
            "s1",
            vec![
                site_read("r1", b'A', 30, 60, false),
                site_read("r2", b'A', 32, 60, true),
                site_read("r3", b'A', 34, 0, false),
                site_read("r4", b'G', 20, 60, true),
                site_read("r5", b'G', 22, 50, true),
            ],
        ),
        (
            "s2",
            vec![
                site_read("r6", b'A', 30, 60, false),
                site_read("r7", b'A', 30, 60, true),
                site_read("r8", b'A', 30, 60, false),
                site_read("r9", b'A', 30, 60, true),
            ],
        ),
    ])
}

pub(crate) fn genotype(sample: &str, alleles: [&Allele; 2]) -> Genotype {
    GenotypeBuilder::new(sample, alleles.into_iter().cloned())
        .build()
        .expect("genotype")
}

/// Biallelic A/G SNP at the site with a het `s1` and hom-ref `s2`.
pub(crate) fn snp_site() -> VariantContext {
    let (r, a) = (allele("A", true), allele("G", false));
    let genotypes = GenotypesContext::from_genotypes([genotype("s1", [&r, &a]), genotype("s2", [&r, &r])]);
    VariantContextBuilder::new("test", CONTIG, SITE, SITE, vec![r, a])
        .phred_qual(100.0)
        .genotypes(genotypes)
        .make()
        .expect("snp")
}

/// Biallelic SNP with `n` samples built from `(hom_ref, het, hom_var)` class
/// counts, each carrying GQ and PLs favouring its call.
pub(crate) fn population_site(hom_ref: usize, het: usize, hom_var: usize) -> VariantContext {
    let (r, a) = (allele("A", true), allele("G", false));
    let mut genotypes = Vec::new();
    let classes = [(hom_ref, [&r, &r], [0, 30, 300]), (het, [&r, &a], [30, 0, 30]), (hom_var, [&a, &a], [300, 30, 0])];
    for (count, alleles, pl) in classes {
        for _ in 0..count {
            let name = format!("sample{}", genotypes.len());
            genotypes.push(
                GenotypeBuilder::new(name, alleles.into_iter().cloned())
                    .gq(30)
                    .pl(pl.to_vec())
                    .build()
                    .expect("genotype"),
            );
        }
    }
    VariantContextBuilder::new("test", CONTIG, SITE, SITE, vec![r, a])
        .phred_qual(50.0)
        .genotypes(GenotypesContext::from_genotypes(genotypes))
        .make()
        .expect("population site")
}
