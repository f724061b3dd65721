use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use thiserror::Error;

/// Errors raised while loading reference sequence.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// Sequence lines appeared before any `>` header.
    #[error("FASTA sequence data before the first header")]
    MissingHeader,
    /// Underlying reader failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Reference bases around one site.
///
/// The window covers `window_start..=window_start + bases.len() - 1`
/// (1-based) and always includes the site position.
#[derive(Debug, Clone)]
pub struct ReferenceContext {
    contig: Arc<str>,
    position: u32,
    window_start: u32,
    bases: Arc<[u8]>,
}

impl ReferenceContext {
    /// Context for `position` given the window that starts at `window_start`.
    pub fn new(contig: impl Into<Arc<str>>, position: u32, window_start: u32, bases: impl Into<Arc<[u8]>>) -> Self {
        Self {
            contig: contig.into(),
            position,
            window_start,
            bases: bases.into(),
        }
    }

    /// Contig name.
    pub fn contig(&self) -> &str {
        &self.contig
    }

    /// 1-based site position.
    pub fn position(&self) -> u32 {
        self.position
    }

    /// 1-based position of the first window base.
    pub fn window_start(&self) -> u32 {
        self.window_start
    }

    /// Whole window.
    pub fn window(&self) -> &[u8] {
        &self.bases
    }

    fn index_of(&self, position: u32) -> Option<usize> {
        position
            .checked_sub(self.window_start)
            .map(|idx| idx as usize)
            .filter(|&idx| idx < self.bases.len())
    }

    /// Reference base at the site, `N` if outside the window.
    pub fn base(&self) -> u8 {
        self.base_at(self.position).unwrap_or(b'N')
    }

    /// Reference base at any position inside the window.
    pub fn base_at(&self, position: u32) -> Option<u8> {
        self.index_of(position).map(|idx| self.bases[idx])
    }

    /// Window bases from the site to the end of the window.
    pub fn forward_bases(&self) -> &[u8] {
        self.index_of(self.position)
            .map_or(&[][..], |idx| &self.bases[idx..])
    }

    /// Window bases strictly before the site.
    pub fn bases_before(&self) -> &[u8] {
        self.index_of(self.position)
            .map_or(&[][..], |idx| &self.bases[..idx])
    }
}

/// In-memory multi-contig reference.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSequence {
    contigs: HashMap<String, Arc<[u8]>>,
}

impl ReferenceSequence {
    /// Empty reference.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contig; bases are upper-cased.
    pub fn insert(&mut self, contig: impl Into<String>, bases: &[u8]) {
        self.contigs
            .insert(contig.into(), Arc::from(bases.to_ascii_uppercase()));
    }

    /// Load every record of a FASTA stream. The contig name is the first
    /// whitespace-delimited word of each header.
    pub fn from_fasta<R: BufRead>(reader: R) -> Result<Self, ReferenceError> {
        let mut reference = Self::new();
        let mut current: Option<(String, Vec<u8>)> = None;
        for line in reader.lines() {
            let line = line?;
            let line = line.trim_end();
            if let Some(header) = line.strip_prefix('>') {
                if let Some((name, bases)) = current.take() {
                    reference.insert(name, &bases);
                }
                let name = header.split_whitespace().next().unwrap_or_default().to_string();
                current = Some((name, Vec::new()));
            } else if !line.is_empty() {
                match current.as_mut() {
                    Some((_, bases)) => bases.extend_from_slice(line.as_bytes()),
                    None => return Err(ReferenceError::MissingHeader),
                }
            }
        }
        if let Some((name, bases)) = current {
            reference.insert(name, &bases);
        }
        Ok(reference)
    }

    /// Length of `contig`.
    pub fn contig_len(&self, contig: &str) -> Option<usize> {
        self.contigs.get(contig).map(|bases| bases.len())
    }

    /// Bases `start..=stop` (1-based), clamped to the contig.
    pub fn fetch(&self, contig: &str, start: u32, stop: u32) -> Option<&[u8]> {
        let bases = self.contigs.get(contig)?;
        let from = start.saturating_sub(1) as usize;
        let to = (stop as usize).min(bases.len());
        (from < to).then(|| &bases[from..to])
    }

    /// Context around `position` extending `flank` bases on each side.
    pub fn context(&self, contig: &str, position: u32, flank: u32) -> Option<ReferenceContext> {
        let window_start = position.saturating_sub(flank).max(1);
        let bases = self.fetch(contig, window_start, position.saturating_add(flank))?;
        Some(ReferenceContext::new(contig, position, window_start, bases.to_vec()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_fasta_and_builds_windows() {
        let fasta = b">chr1 test contig\nACGTA\ncgtac\n>chr2\nTTTT\n";
        let reference = ReferenceSequence::from_fasta(&fasta[..]).expect("fasta");
        assert_eq!(reference.contig_len("chr1"), Some(10));
        assert_eq!(reference.fetch("chr1", 5, 7), Some(&b"ACG"[..]));

        let ctx = reference.context("chr1", 2, 3).expect("context");
        assert_eq!(ctx.window_start(), 1);
        assert_eq!(ctx.window(), b"ACGTA");
        assert_eq!(ctx.base(), b'C');
        assert_eq!(ctx.forward_bases(), b"CGTA");
        assert_eq!(ctx.bases_before(), b"A");
    }

    #[test]
    fn rejects_headerless_fasta() {
        assert!(matches!(
            ReferenceSequence::from_fasta(&b"ACGT\n"[..]),
            Err(ReferenceError::MissingHeader)
        ));
    }
}
