use std::sync::Arc;

use hashlink::LinkedHashMap;

use crate::genomics::AlignedRead;
use crate::variant::Allele;

/// Minimum log10 margin of the best allele over the runner-up for a read to
/// count as informative.
pub const INFORMATIVE_LIKELIHOOD_THRESHOLD: f64 = 0.2;

/// log10 likelihoods of every read under each candidate allele.
#[derive(Debug, Clone)]
pub struct ReadLikelihoods {
    read: Arc<AlignedRead>,
    by_allele: Vec<(Allele, f64)>,
}

impl ReadLikelihoods {
    /// The scored read.
    pub fn read(&self) -> &AlignedRead {
        &self.read
    }

    /// Allele likelihoods in insertion order.
    pub fn likelihoods(&self) -> &[(Allele, f64)] {
        &self.by_allele
    }

    /// Most likely allele when it beats every other by the informative
    /// threshold; `None` for uninformative reads.
    pub fn most_likely_allele(&self) -> Option<&Allele> {
        let mut best: Option<&(Allele, f64)> = None;
        let mut second = f64::NEG_INFINITY;
        for entry in &self.by_allele {
            match best {
                Some(current) if entry.1 <= current.1 => second = second.max(entry.1),
                Some(current) => {
                    second = second.max(current.1);
                    best = Some(entry);
                }
                None => best = Some(entry),
            }
        }
        best.filter(|(_, value)| value - second >= INFORMATIVE_LIKELIHOOD_THRESHOLD)
            .map(|(allele, _)| allele)
    }
}

/// Per-sample read/allele likelihoods, keyed by read name in arrival order.
#[derive(Debug, Clone, Default)]
pub struct PerReadAlleleLikelihoodMap {
    reads: LinkedHashMap<Arc<str>, ReadLikelihoods>,
}

impl PerReadAlleleLikelihoodMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `log10_likelihood` of `read` under `allele`, replacing an
    /// earlier value for the same pair.
    pub fn add(&mut self, read: &Arc<AlignedRead>, allele: Allele, log10_likelihood: f64) {
        let entry = self
            .reads
            .entry(Arc::clone(&read.name))
            .or_insert_with(|| ReadLikelihoods {
                read: Arc::clone(read),
                by_allele: Vec::new(),
            });
        match entry.by_allele.iter_mut().find(|(a, _)| *a == allele) {
            Some(slot) => slot.1 = log10_likelihood,
            None => entry.by_allele.push((allele, log10_likelihood)),
        }
    }

    /// Reads with at least one likelihood.
    pub fn len(&self) -> usize {
        self.reads.len()
    }

    /// Whether no read was scored.
    pub fn is_empty(&self) -> bool {
        self.reads.is_empty()
    }

    /// Likelihoods of one read.
    pub fn get(&self, read_name: &str) -> Option<&ReadLikelihoods> {
        self.reads.get(read_name)
    }

    /// Every scored read in arrival order.
    pub fn iter(&self) -> impl Iterator<Item = &ReadLikelihoods> {
        self.reads.values()
    }

    /// Informative reads supporting each of `alleles`, in the same order.
    pub fn allele_depths(&self, alleles: &[Allele]) -> Vec<i32> {
        let mut depths = vec![0i32; alleles.len()];
        for read in self.iter() {
            if let Some(best) = read.most_likely_allele() {
                if let Some(idx) = alleles.iter().position(|a| a == best) {
                    depths[idx] += 1;
                }
            }
        }
        depths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(name: &str) -> Arc<AlignedRead> {
        Arc::new(AlignedRead::new(name, "chr1", 10, 60, Vec::new(), b"ACGT".to_vec(), vec![30; 4], false))
    }

    #[test]
    fn informative_reads_drive_allele_depths() {
        let reference = Allele::create("A", true).expect("ref");
        let alt = Allele::create("G", false).expect("alt");
        let mut map = PerReadAlleleLikelihoodMap::new();
        let (r1, r2, r3) = (read("r1"), read("r2"), read("r3"));
        map.add(&r1, reference.clone(), -0.1);
        map.add(&r1, alt.clone(), -3.0);
        map.add(&r2, reference.clone(), -4.0);
        map.add(&r2, alt.clone(), -0.2);
        // within the threshold: uninformative
        map.add(&r3, reference.clone(), -1.0);
        map.add(&r3, alt.clone(), -1.1);

        assert_eq!(map.len(), 3);
        assert_eq!(map.get("r1").and_then(ReadLikelihoods::most_likely_allele), Some(&reference));
        assert_eq!(map.get("r3").and_then(ReadLikelihoods::most_likely_allele), None);
        assert_eq!(map.allele_depths(&[reference, alt]), vec![1, 1]);
    }
}
