use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Simple CIGAR operation kinds describing how a read aligns to the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CigarOpKind {
    /// Consuming match/mismatch (`M`, `=`, `X`).
    Match,
    /// Insertion relative to the reference.
    Insertion,
    /// Deletion relative to the reference.
    Deletion,
    /// Skipped reference region (`N`).
    Skip,
    /// Soft clipping (sequence present in read only).
    SoftClip,
    /// Hard clipping (trimmed sequence not present in read).
    HardClip,
}

impl CigarOpKind {
    /// Whether the operation advances along the reference.
    pub fn consumes_reference(self) -> bool {
        matches!(self, CigarOpKind::Match | CigarOpKind::Deletion | CigarOpKind::Skip)
    }

    /// Whether the operation advances along the read bases.
    pub fn consumes_read(self) -> bool {
        matches!(
            self,
            CigarOpKind::Match | CigarOpKind::Insertion | CigarOpKind::SoftClip
        )
    }

    fn symbol(self) -> char {
        match self {
            CigarOpKind::Match => 'M',
            CigarOpKind::Insertion => 'I',
            CigarOpKind::Deletion => 'D',
            CigarOpKind::Skip => 'N',
            CigarOpKind::SoftClip => 'S',
            CigarOpKind::HardClip => 'H',
        }
    }
}

/// CIGAR operation with length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CigarOp {
    /// Operation kind.
    pub kind: CigarOpKind,
    /// Number of bases affected by the operation.
    pub len: u32,
}

impl CigarOp {
    /// Construct a new CIGAR operation.
    pub fn new(kind: CigarOpKind, len: u32) -> Self {
        Self { kind, len }
    }
}

/// Errors raised while parsing CIGAR strings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CigarError {
    /// Operation letter outside `MIDNSHP=X`.
    #[error("unknown CIGAR operation {0:?}")]
    UnknownOperation(char),
    /// An operation without a preceding length, or a dangling length.
    #[error("malformed CIGAR string {0:?}")]
    Malformed(String),
}

/// Parse a SAM-style CIGAR string such as `10M2I5M`. `*` yields no operations.
pub fn parse_cigar(text: &str) -> Result<Vec<CigarOp>, CigarError> {
    if text == "*" {
        return Ok(Vec::new());
    }
    let mut ops = Vec::new();
    let mut len: Option<u32> = None;
    for ch in text.chars() {
        if let Some(digit) = ch.to_digit(10) {
            len = Some(len.unwrap_or(0).saturating_mul(10).saturating_add(digit));
            continue;
        }
        let kind = match ch {
            'M' | '=' | 'X' => CigarOpKind::Match,
            'I' => CigarOpKind::Insertion,
            'D' => CigarOpKind::Deletion,
            'N' => CigarOpKind::Skip,
            'S' => CigarOpKind::SoftClip,
            'H' | 'P' => CigarOpKind::HardClip,
            other => return Err(CigarError::UnknownOperation(other)),
        };
        let op_len = len.take().ok_or_else(|| CigarError::Malformed(text.to_string()))?;
        ops.push(CigarOp::new(kind, op_len));
    }
    if len.is_some() {
        return Err(CigarError::Malformed(text.to_string()));
    }
    Ok(ops)
}

/// Where a reference position falls within a read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadOffset {
    /// Aligned to the read base at this offset.
    Base(usize),
    /// Inside a deletion; the offset is that of the next read base.
    Deletion(usize),
}

/// Aligned read with sequence and quality information.
#[derive(Debug, Clone)]
pub struct AlignedRead {
    /// Read name.
    pub name: Arc<str>,
    /// Reference contig/chromosome name.
    pub chrom: Arc<str>,
    /// 1-based leftmost aligned reference coordinate.
    pub pos: u32,
    /// Mapping quality (Phred-scaled).
    pub mapq: u8,
    /// CIGAR describing the alignment.
    pub cigar: Vec<CigarOp>,
    /// Read sequence stored as uppercase ASCII.
    pub sequence: Arc<[u8]>,
    /// Per-base quality scores in Phred space.
    pub qualities: Arc<[u8]>,
    /// Whether the read maps to the reverse complement strand.
    pub is_reverse: bool,
}

impl AlignedRead {
    /// Construct a new aligned read wrapper.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        name: impl Into<Arc<str>>,
        chrom: impl Into<Arc<str>>,
        pos: u32,
        mapq: u8,
        cigar: Vec<CigarOp>,
        sequence: impl Into<Arc<[u8]>>,
        qualities: impl Into<Arc<[u8]>>,
        is_reverse: bool,
    ) -> Self {
        let sequence: Arc<[u8]> = sequence.into();
        let cigar = if cigar.is_empty() {
            vec![CigarOp::new(CigarOpKind::Match, sequence.len() as u32)]
        } else {
            cigar
        };
        Self {
            name: name.into(),
            chrom: chrom.into(),
            pos,
            mapq,
            cigar,
            sequence,
            qualities: qualities.into(),
            is_reverse,
        }
    }

    /// Read length inferred from the sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Whether the read carries no bases.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Last reference position covered by the alignment (1-based, inclusive).
    pub fn end(&self) -> u32 {
        let span: u32 = self
            .cigar
            .iter()
            .filter(|op| op.kind.consumes_reference())
            .map(|op| op.len)
            .sum();
        (self.pos + span).saturating_sub(1).max(self.pos)
    }

    /// Whether the alignment spans `position` on `chrom`.
    pub fn overlaps(&self, chrom: &str, position: u32) -> bool {
        &*self.chrom == chrom && self.pos <= position && position <= self.end()
    }

    /// Bases in the read that are aligned or soft clipped.
    pub fn aligned_bases_counting_soft_clips(&self) -> usize {
        self.cigar
            .iter()
            .filter(|op| matches!(op.kind, CigarOpKind::Match | CigarOpKind::SoftClip))
            .map(|op| op.len as usize)
            .sum()
    }

    /// Walk the CIGAR to find where reference `position` lands in the read.
    pub fn offset_at(&self, position: u32) -> Option<ReadOffset> {
        if position < self.pos {
            return None;
        }
        let mut ref_cursor = self.pos;
        let mut read_cursor = 0usize;
        for op in &self.cigar {
            let consumes_ref = op.kind.consumes_reference();
            if consumes_ref && position < ref_cursor + op.len {
                let delta = (position - ref_cursor) as usize;
                return match op.kind {
                    CigarOpKind::Match => Some(ReadOffset::Base(read_cursor + delta)),
                    CigarOpKind::Deletion => Some(ReadOffset::Deletion(read_cursor)),
                    _ => None,
                };
            }
            if consumes_ref {
                ref_cursor += op.len;
            }
            if op.kind.consumes_read() {
                read_cursor += op.len as usize;
            }
        }
        None
    }

    /// Base at the provided read offset.
    pub fn base_at(&self, offset: usize) -> Option<u8> {
        self.sequence.get(offset).copied()
    }

    /// Quality score at the provided read offset.
    pub fn quality_at(&self, offset: usize) -> Option<u8> {
        self.qualities.get(offset).copied()
    }

    /// Mapping quality associated with the alignment.
    pub fn mapq(&self) -> u8 {
        self.mapq
    }

    /// CIGAR rendered in SAM notation.
    pub fn cigar_string(&self) -> String {
        self.cigar
            .iter()
            .map(|op| format!("{}{}", op.len, op.kind.symbol()))
            .collect()
    }
}

impl fmt::Display for AlignedRead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{} {} MQ{}",
            self.name,
            self.chrom,
            self.pos,
            self.cigar_string(),
            self.mapq
        )
    }
}
