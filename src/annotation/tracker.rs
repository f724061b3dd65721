use std::collections::{BTreeMap, HashMap};

use crate::variant::VariantContext;

#[derive(Debug, Clone, Default)]
struct Track {
    // (contig, start) -> records starting there
    records: BTreeMap<(String, u32), Vec<VariantContext>>,
    max_span: u32,
}

/// Named tracks of external records (resources, comparison sets, dbSNP)
/// queried by locus.
#[derive(Debug, Clone, Default)]
pub struct FeatureTracker {
    tracks: HashMap<String, Track>,
}

impl FeatureTracker {
    /// Tracker with no tracks.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one record to `track`.
    pub fn add(&mut self, track: impl Into<String>, record: VariantContext) {
        let track = self.tracks.entry(track.into()).or_default();
        track.max_span = track.max_span.max(record.span());
        track
            .records
            .entry((record.contig().to_string(), record.start()))
            .or_default()
            .push(record);
    }

    /// Add every record to `track`.
    pub fn extend(&mut self, track: &str, records: impl IntoIterator<Item = VariantContext>) {
        for record in records {
            self.add(track, record);
        }
    }

    /// Whether `track` holds any record.
    pub fn has_track(&self, track: &str) -> bool {
        self.tracks.contains_key(track)
    }

    /// Names of every loaded track.
    pub fn track_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tracks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Records of `track` overlapping `contig:position`, ordered by start.
    pub fn values_at(&self, track: &str, contig: &str, position: u32) -> Vec<&VariantContext> {
        let Some(track) = self.tracks.get(track) else {
            return Vec::new();
        };
        let low = (contig.to_string(), position.saturating_sub(track.max_span));
        let high = (contig.to_string(), position);
        track
            .records
            .range(low..=high)
            .flat_map(|(_, records)| records.iter())
            .filter(|record| record.end() >= position)
            .collect()
    }

    /// Records of `track` starting exactly at `contig:start`.
    pub fn values_starting_at(&self, track: &str, contig: &str, start: u32) -> &[VariantContext] {
        self.tracks
            .get(track)
            .and_then(|t| t.records.get(&(contig.to_string(), start)))
            .map_or(&[][..], Vec::as_slice)
    }
}
