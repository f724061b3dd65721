use std::fmt;

use hashlink::LinkedHashMap;

/// Well-known attribute and field keys.
pub mod keys {
    /// Genotype call (FORMAT).
    pub const GENOTYPE_KEY: &str = "GT";
    /// Genotype quality (FORMAT).
    pub const GENOTYPE_QUALITY_KEY: &str = "GQ";
    /// Read depth (INFO and FORMAT).
    pub const DEPTH_KEY: &str = "DP";
    /// Per-allele read depths (FORMAT).
    pub const GENOTYPE_ALLELE_DEPTHS: &str = "AD";
    /// Phred-scaled genotype likelihoods (FORMAT).
    pub const GENOTYPE_PL_KEY: &str = "PL";
    /// Alternate allele counts (INFO).
    pub const ALLELE_COUNT_KEY: &str = "AC";
    /// Alternate allele frequencies (INFO).
    pub const ALLELE_FREQUENCY_KEY: &str = "AF";
    /// Total called chromosomes (INFO).
    pub const ALLELE_NUMBER_KEY: &str = "AN";
    /// dbSNP membership flag (INFO).
    pub const DBSNP_KEY: &str = "DB";
    /// Strand bias Fisher test (INFO).
    pub const FISHER_STRAND_KEY: &str = "FS";
    /// Quality by depth (INFO).
    pub const QUAL_BY_DEPTH_KEY: &str = "QD";
    /// RMS mapping quality (INFO).
    pub const RMS_MAPPING_QUALITY_KEY: &str = "MQ";
    /// Count of MAPQ zero reads (INFO and FORMAT).
    pub const MAPPING_QUALITY_ZERO_KEY: &str = "MQ0";
    /// Hardy-Weinberg phred score (INFO).
    pub const HARDY_WEINBERG_KEY: &str = "HW";
    /// Inbreeding coefficient (INFO).
    pub const INBREEDING_COEFFICIENT_KEY: &str = "InbreedingCoeff";
    /// Homopolymer run length (INFO).
    pub const HOMOPOLYMER_RUN_KEY: &str = "HRun";
    /// Short tandem repeat flag (INFO).
    pub const STR_PRESENT_KEY: &str = "STR";
    /// Tandem repeat unit (INFO).
    pub const REPEAT_UNIT_KEY: &str = "RU";
    /// Repeats per allele (INFO).
    pub const REPEATS_PER_ALLELE_KEY: &str = "RPA";
    /// Fraction of reads spanning a deletion (INFO).
    pub const SPANNING_DELETIONS_KEY: &str = "Dels";
    /// Per-base counts across samples (INFO).
    pub const BASE_COUNTS_KEY: &str = "BaseCounts";
    /// Allele balance at het sites (INFO).
    pub const ALLELE_BALANCE_HET_KEY: &str = "ABHet";
    /// Allele balance at hom sites (INFO).
    pub const ALLELE_BALANCE_HOM_KEY: &str = "ABHom";
    /// Fraction of non-diploid reads (INFO).
    pub const NON_DIPLOID_RATIO_KEY: &str = "OND";
    /// Per-sample allele balance (FORMAT).
    pub const ALLELE_BALANCE_KEY: &str = "AB";
    /// Base quality rank sum (INFO).
    pub const BASE_QUAL_RANK_SUM_KEY: &str = "BaseQRankSum";
    /// Mapping quality rank sum (INFO).
    pub const MAP_QUAL_RANK_SUM_KEY: &str = "MQRankSum";
    /// Read position rank sum (INFO).
    pub const READ_POS_RANK_SUM_KEY: &str = "ReadPosRankSum";
    /// Missing value marker.
    pub const MISSING_VALUE: &str = ".";
    /// Empty ID column.
    pub const EMPTY_ID_FIELD: &str = ".";
    /// Separator between multiple IDs coming from one source.
    pub const ID_FIELD_SEPARATOR: &str = ";";
    /// Filter value for records that passed.
    pub const PASSES_FILTERS: &str = "PASS";
    /// Inline genotype keys that may never appear as extended attributes.
    pub const INLINE_GENOTYPE_KEYS: [&str; 5] = [
        GENOTYPE_KEY,
        GENOTYPE_QUALITY_KEY,
        DEPTH_KEY,
        GENOTYPE_ALLELE_DEPTHS,
        GENOTYPE_PL_KEY,
    ];
}

/// A typed INFO/FORMAT attribute value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeValue {
    /// Presence-only flag.
    Flag,
    /// Integer scalar.
    Integer(i32),
    /// Floating point scalar.
    Float(f64),
    /// Free text (also used for pre-formatted numbers).
    String(String),
    /// Ordered list of values, rendered comma-separated.
    List(Vec<AttributeValue>),
}

impl AttributeValue {
    /// Integer view; parses strings and truncates floats.
    pub fn as_int(&self) -> Option<i32> {
        match self {
            AttributeValue::Integer(v) => Some(*v),
            AttributeValue::Float(v) => Some(*v as i32),
            AttributeValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Floating point view; parses strings.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            AttributeValue::Integer(v) => Some(f64::from(*v)),
            AttributeValue::Float(v) => Some(*v),
            AttributeValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Boolean view: flags are true, strings parse `true`/`false`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttributeValue::Flag => Some(true),
            AttributeValue::Integer(v) => Some(*v != 0),
            AttributeValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Integer list view. Scalars become one-element lists.
    pub fn as_int_list(&self) -> Option<Vec<i32>> {
        match self {
            AttributeValue::List(values) => values.iter().map(AttributeValue::as_int).collect(),
            AttributeValue::String(s) => s
                .split(',')
                .map(|part| part.trim().parse().ok())
                .collect(),
            other => other.as_int().map(|v| vec![v]),
        }
    }

    /// Text rendering used in VCF output.
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    /// True for the `.` placeholder.
    pub fn is_missing(&self) -> bool {
        matches!(self, AttributeValue::String(s) if s == keys::MISSING_VALUE)
    }
}

/// Format a double the way VCF writers conventionally do.
pub fn format_vcf_double(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    let magnitude = value.abs();
    if magnitude < 1.0 {
        if magnitude < 0.01 {
            if magnitude >= 1e-20 {
                format!("{value:.3e}")
            } else {
                "0.00".to_string()
            }
        } else {
            format!("{value:.3}")
        }
    } else {
        format!("{value:.2}")
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Flag => Ok(()),
            AttributeValue::Integer(v) => write!(f, "{v}"),
            AttributeValue::Float(v) => write!(f, "{}", format_vcf_double(*v)),
            AttributeValue::String(s) => write!(f, "{s}"),
            AttributeValue::List(values) => {
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{value}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<i32> for AttributeValue {
    fn from(value: i32) -> Self {
        AttributeValue::Integer(value)
    }
}

impl From<f64> for AttributeValue {
    fn from(value: f64) -> Self {
        AttributeValue::Float(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<Vec<i32>> for AttributeValue {
    fn from(values: Vec<i32>) -> Self {
        AttributeValue::List(values.into_iter().map(AttributeValue::Integer).collect())
    }
}

impl From<Vec<f64>> for AttributeValue {
    fn from(values: Vec<f64>) -> Self {
        AttributeValue::List(values.into_iter().map(AttributeValue::Float).collect())
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        AttributeValue::List(values.into_iter().map(AttributeValue::String).collect())
    }
}

/// Insertion-ordered attribute map.
///
/// Overwriting a key keeps it at its original position, so rendering order is
/// the order in which keys were first seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttributeMap {
    entries: LinkedHashMap<String, AttributeValue>,
}

impl AttributeMap {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a value, returning the previous one.
    pub fn put(
        &mut self,
        key: impl Into<String>,
        value: impl Into<AttributeValue>,
    ) -> Option<AttributeValue> {
        self.entries.replace(key.into(), value.into())
    }

    /// Copy every entry of `other` in, overwriting on collision.
    pub fn put_all(&mut self, other: &AttributeMap) {
        for (key, value) in other.iter() {
            self.entries.replace(key.clone(), value.clone());
        }
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.entries.get(key)
    }

    /// Remove a key.
    pub fn remove(&mut self, key: &str) -> Option<AttributeValue> {
        self.entries.remove(key)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entries are present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.entries.keys()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.entries.iter()
    }

    /// Keep only the entries matching `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str, &AttributeValue) -> bool) {
        let dropped: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, value)| !keep(key, value))
            .map(|(key, _)| key.clone())
            .collect();
        for key in dropped {
            self.entries.remove(&key);
        }
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> FromIterator<(K, V)> for AttributeMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = AttributeMap::new();
        for (key, value) in iter {
            map.put(key, value);
        }
        map
    }
}

impl<K: Into<String>, V: Into<AttributeValue>> Extend<(K, V)> for AttributeMap {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

impl IntoIterator for AttributeMap {
    type Item = (String, AttributeValue);
    type IntoIter = hashlink::linked_hash_map::IntoIter<String, AttributeValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrite_keeps_position() {
        let mut map = AttributeMap::new();
        map.put("DP", 10);
        map.put("AF", "0.50");
        map.put("DP", 12);
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["DP", "AF"]);
        assert_eq!(map.get("DP"), Some(&AttributeValue::Integer(12)));
    }

    #[test]
    fn lenient_accessors_parse_strings() {
        assert_eq!(AttributeValue::from("17").as_int(), Some(17));
        assert_eq!(AttributeValue::from("0.25").as_double(), Some(0.25));
        assert_eq!(AttributeValue::Flag.as_bool(), Some(true));
        assert_eq!(
            AttributeValue::from(vec![1, 2]).as_int_list(),
            Some(vec![1, 2])
        );
    }

    #[test]
    fn vcf_double_formatting() {
        assert_eq!(format_vcf_double(12.3456), "12.35");
        assert_eq!(format_vcf_double(0.5), "0.500");
        assert_eq!(format_vcf_double(0.0), "0.00");
        assert_eq!(format_vcf_double(0.001), "1.000e-3");
    }

    #[test]
    fn list_rendering() {
        let value = AttributeValue::from(vec!["0.25".to_string(), "0.50".to_string()]);
        assert_eq!(value.to_string(), "0.25,0.50");
    }
}
