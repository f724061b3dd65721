use std::collections::BTreeMap;
use std::sync::Arc;

use crate::genomics::{AlignedRead, ReadOffset};

pub(crate) const NUM_BASES: usize = 4; // A, C, G, T

/// Index of a base in `[A, C, G, T]` order.
pub fn base_index(base: u8) -> Option<usize> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' | b'U' | b'u' => Some(3),
        _ => None,
    }
}

/// One read's contribution at a pileup position.
#[derive(Debug, Clone)]
pub struct PileupElement {
    read: Arc<AlignedRead>,
    offset: usize,
    is_deletion: bool,
}

impl PileupElement {
    /// Element for `read` at read `offset`.
    pub fn new(read: Arc<AlignedRead>, offset: usize, is_deletion: bool) -> Self {
        Self {
            read,
            offset,
            is_deletion,
        }
    }

    /// Underlying read.
    pub fn read(&self) -> &AlignedRead {
        &self.read
    }

    /// Offset into the read; for deletions, the next aligned base.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the read carries a deletion here.
    pub fn is_deletion(&self) -> bool {
        self.is_deletion
    }

    /// Observed base, `D` inside a deletion.
    pub fn base(&self) -> u8 {
        if self.is_deletion {
            b'D'
        } else {
            self.read.base_at(self.offset).unwrap_or(b'N')
        }
    }

    /// Base quality, 0 inside a deletion.
    pub fn qual(&self) -> u8 {
        if self.is_deletion {
            0
        } else {
            self.read.quality_at(self.offset).unwrap_or(0)
        }
    }

    /// Mapping quality of the read.
    pub fn mapping_quality(&self) -> u8 {
        self.read.mapq
    }

    /// Whether the read aligns to the reverse strand.
    pub fn is_reverse_strand(&self) -> bool {
        self.read.is_reverse
    }
}

/// Reads covering one reference position for one sample.
#[derive(Debug, Clone)]
pub struct ReadBackedPileup {
    contig: Arc<str>,
    position: u32,
    elements: Vec<PileupElement>,
}

impl ReadBackedPileup {
    /// Pileup from explicit elements.
    pub fn new(contig: impl Into<Arc<str>>, position: u32, elements: Vec<PileupElement>) -> Self {
        Self {
            contig: contig.into(),
            position,
            elements,
        }
    }

    /// Collect every read in `reads` that spans `contig:position`.
    pub fn from_reads<'a>(
        contig: &str,
        position: u32,
        reads: impl IntoIterator<Item = &'a Arc<AlignedRead>>,
    ) -> Self {
        let elements = reads
            .into_iter()
            .filter(|read| read.overlaps(contig, position))
            .filter_map(|read| match read.offset_at(position)? {
                ReadOffset::Base(offset) => Some(PileupElement::new(Arc::clone(read), offset, false)),
                ReadOffset::Deletion(offset) => Some(PileupElement::new(Arc::clone(read), offset, true)),
            })
            .collect();
        Self::new(contig, position, elements)
    }

    /// Contig of the pileup.
    pub fn contig(&self) -> &str {
        &self.contig
    }

    /// 1-based position of the pileup.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// Elements in read order.
    pub fn iter(&self) -> std::slice::Iter<'_, PileupElement> {
        self.elements.iter()
    }

    /// Number of reads, deletions included.
    pub fn depth(&self) -> usize {
        self.elements.len()
    }

    /// Whether no reads cover the position.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Observed `[A, C, G, T]` counts, deletions and `N` excluded.
    pub fn base_counts(&self) -> [u32; NUM_BASES] {
        let mut counts = [0u32; NUM_BASES];
        for element in self.elements.iter().filter(|e| !e.is_deletion()) {
            if let Some(idx) = base_index(element.base()) {
                counts[idx] += 1;
            }
        }
        counts
    }

    /// Reads with a deletion at this position.
    pub fn number_of_deletions(&self) -> usize {
        self.elements.iter().filter(|e| e.is_deletion()).count()
    }

    /// Reads with mapping quality zero.
    pub fn number_of_mapping_quality_zero_reads(&self) -> usize {
        self.elements.iter().filter(|e| e.mapping_quality() == 0).count()
    }

    /// Mapping qualities in read order.
    pub fn mapping_qualities(&self) -> Vec<u8> {
        self.elements.iter().map(PileupElement::mapping_quality).collect()
    }

    /// Elements passing base and mapping quality thresholds.
    pub fn filtered(&self, min_base_quality: u8, min_mapping_quality: u8) -> Self {
        let elements = self
            .elements
            .iter()
            .filter(|e| {
                e.mapping_quality() >= min_mapping_quality
                    && (e.is_deletion() || e.qual() >= min_base_quality)
            })
            .cloned()
            .collect();
        Self::new(Arc::clone(&self.contig), self.position, elements)
    }
}

impl<'a> IntoIterator for &'a ReadBackedPileup {
    type Item = &'a PileupElement;
    type IntoIter = std::slice::Iter<'a, PileupElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}

/// Per-sample pileups at one site, keyed by sample name.
pub type StratifiedPileups = BTreeMap<String, ReadBackedPileup>;

/// Build per-sample pileups at `contig:position` from reads grouped by sample.
pub fn stratify_reads(
    contig: &str,
    position: u32,
    reads_by_sample: &BTreeMap<String, Vec<Arc<AlignedRead>>>,
) -> StratifiedPileups {
    reads_by_sample
        .iter()
        .map(|(sample, reads)| {
            (
                sample.clone(),
                ReadBackedPileup::from_reads(contig, position, reads.iter()),
            )
        })
        .collect()
}
