use crate::annotation::{FeatureTracker, HeaderCount, HeaderType, VcfHeaderLine};
use crate::variant::{keys, AttributeValue, VariantContext, VariantError};

/// Flags records present in comparison tracks and copies rsIDs from dbSNP.
///
/// Each overlap track maps to an INFO flag key; dbSNP uses `DB`, comparison
/// tracks use their own name.
#[derive(Debug, Clone, Default)]
pub struct VariantOverlapAnnotator {
    dbsnp: Option<String>,
    // (track name, flag key)
    overlaps: Vec<(String, String)>,
}

impl VariantOverlapAnnotator {
    /// Annotator for an optional dbSNP track plus comparison tracks.
    pub fn new(dbsnp: Option<&str>, comp_tracks: &[String]) -> Self {
        let mut overlaps = Vec::with_capacity(comp_tracks.len() + 1);
        if let Some(track) = dbsnp {
            overlaps.push((track.to_string(), keys::DBSNP_KEY.to_string()));
        }
        for track in comp_tracks {
            if overlaps.iter().any(|(_, key)| key == track) {
                continue;
            }
            overlaps.push((track.clone(), track.clone()));
        }
        Self {
            dbsnp: dbsnp.map(str::to_string),
            overlaps,
        }
    }

    /// Whether no tracks are configured.
    pub fn is_empty(&self) -> bool {
        self.overlaps.is_empty()
    }

    /// Flag header lines, one per overlap key.
    pub fn header_lines(&self) -> Vec<VcfHeaderLine> {
        self.overlaps
            .iter()
            .map(|(_, key)| {
                if key == keys::DBSNP_KEY {
                    VcfHeaderLine::info(key, HeaderCount::Fixed(0), HeaderType::Flag, "dbSNP Membership")
                } else {
                    VcfHeaderLine::membership_flag(key)
                }
            })
            .collect()
    }

    /// Fill or extend the record's ID with rsIDs of matching dbSNP records.
    pub fn annotate_rs_id(&self, tracker: &FeatureTracker, vc: &VariantContext) -> Result<VariantContext, VariantError> {
        let Some(track) = &self.dbsnp else {
            return Ok(vc.clone());
        };
        let mut ids: Vec<String> = vc
            .id()
            .map(|id| id.split(keys::ID_FIELD_SEPARATOR).map(str::to_string).collect())
            .unwrap_or_default();
        let before = ids.len();
        for record in tracker.values_starting_at(track, vc.contig(), vc.start()) {
            if !same_site(vc, record) || !shares_alternate(vc, record) {
                continue;
            }
            for rs_id in record.id().into_iter().flat_map(|id| id.split(keys::ID_FIELD_SEPARATOR)) {
                if !ids.iter().any(|existing| existing == rs_id) {
                    ids.push(rs_id.to_string());
                }
            }
        }
        if ids.len() == before {
            return Ok(vc.clone());
        }
        vc.modify_id(Some(ids.join(keys::ID_FIELD_SEPARATOR)))
    }

    /// Set the flag of every track holding a record at the same site.
    pub fn annotate_overlaps(
        &self,
        tracker: &FeatureTracker,
        vc: &VariantContext,
    ) -> Result<VariantContext, VariantError> {
        let mut attributes = vc.attributes().clone();
        let mut changed = false;
        for (track, key) in &self.overlaps {
            let present = tracker
                .values_starting_at(track, vc.contig(), vc.start())
                .iter()
                .any(|record| same_site(vc, record));
            if present {
                attributes.put(key.as_str(), AttributeValue::Flag);
                changed = true;
            }
        }
        if !changed {
            return Ok(vc.clone());
        }
        vc.modify_attributes(attributes)
    }
}

fn same_site(vc: &VariantContext, record: &VariantContext) -> bool {
    vc.contig() == record.contig()
        && vc.start() == record.start()
        && vc.reference().bases().eq_ignore_ascii_case(record.reference().bases())
}

fn shares_alternate(vc: &VariantContext, record: &VariantContext) -> bool {
    vc.alternate_alleles().iter().any(|alt| {
        record
            .alternate_alleles()
            .iter()
            .any(|other| alt.bases().eq_ignore_ascii_case(other.bases()))
    })
}
