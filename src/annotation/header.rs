use std::fmt;
use std::str::FromStr;

/// Section a header line describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderSection {
    /// `##INFO` line.
    Info,
    /// `##FORMAT` line.
    Format,
}

/// Value count declared by a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderCount {
    /// A fixed number of values.
    Fixed(u32),
    /// One value per alternate allele.
    A,
    /// One value per allele, reference included.
    R,
    /// One value per possible genotype.
    G,
    /// Unknown or varying.
    Unbounded,
}

impl fmt::Display for HeaderCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeaderCount::Fixed(n) => write!(f, "{n}"),
            HeaderCount::A => f.write_str("A"),
            HeaderCount::R => f.write_str("R"),
            HeaderCount::G => f.write_str("G"),
            HeaderCount::Unbounded => f.write_str("."),
        }
    }
}

impl FromStr for HeaderCount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(HeaderCount::A),
            "R" => Ok(HeaderCount::R),
            "G" => Ok(HeaderCount::G),
            "." => Ok(HeaderCount::Unbounded),
            other => other
                .parse()
                .map(HeaderCount::Fixed)
                .map_err(|_| format!("invalid Number {other:?}")),
        }
    }
}

/// Value type declared by a header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HeaderType {
    /// Signed integer.
    Integer,
    /// Floating point.
    Float,
    /// Presence-only flag.
    Flag,
    /// Single character.
    Character,
    /// Free text.
    String,
}

impl fmt::Display for HeaderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HeaderType::Integer => "Integer",
            HeaderType::Float => "Float",
            HeaderType::Flag => "Flag",
            HeaderType::Character => "Character",
            HeaderType::String => "String",
        };
        f.write_str(name)
    }
}

impl FromStr for HeaderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Integer" => Ok(HeaderType::Integer),
            "Float" => Ok(HeaderType::Float),
            "Flag" => Ok(HeaderType::Flag),
            "Character" => Ok(HeaderType::Character),
            "String" => Ok(HeaderType::String),
            other => Err(format!("invalid Type {other:?}")),
        }
    }
}

/// One `##INFO` or `##FORMAT` meta line.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VcfHeaderLine {
    /// INFO or FORMAT.
    pub section: HeaderSection,
    /// Field key.
    pub id: String,
    /// Declared value count.
    pub count: HeaderCount,
    /// Declared value type.
    pub value_type: HeaderType,
    /// Human-readable description.
    pub description: String,
}

impl VcfHeaderLine {
    /// An INFO line.
    pub fn info(id: impl Into<String>, count: HeaderCount, value_type: HeaderType, description: impl Into<String>) -> Self {
        Self {
            section: HeaderSection::Info,
            id: id.into(),
            count,
            value_type,
            description: description.into(),
        }
    }

    /// A FORMAT line.
    pub fn format(id: impl Into<String>, count: HeaderCount, value_type: HeaderType, description: impl Into<String>) -> Self {
        Self {
            section: HeaderSection::Format,
            ..Self::info(id, count, value_type, description)
        }
    }

    /// Parse a `##INFO=<...>` or `##FORMAT=<...>` line; `None` for any
    /// other meta line or a line missing ID, Number or Type.
    pub fn parse(line: &str) -> Option<Self> {
        let (section, body) = if let Some(body) = line.strip_prefix("##INFO=<") {
            (HeaderSection::Info, body)
        } else if let Some(body) = line.strip_prefix("##FORMAT=<") {
            (HeaderSection::Format, body)
        } else {
            return None;
        };
        let body = body.trim_end().strip_suffix('>')?;

        let (fields, description) = match body.split_once(",Description=") {
            Some((fields, description)) => (fields, description.trim_matches('"')),
            None => (body, ""),
        };
        let mut id = None;
        let mut count = None;
        let mut value_type = None;
        for field in fields.split(',') {
            match field.split_once('=') {
                Some(("ID", value)) => id = Some(value.to_string()),
                Some(("Number", value)) => count = value.parse().ok(),
                Some(("Type", value)) => value_type = value.parse().ok(),
                _ => {}
            }
        }
        Some(Self {
            section,
            id: id?,
            count: count?,
            value_type: value_type?,
            description: description.to_string(),
        })
    }

    /// Same line under a different ID.
    pub fn renamed(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// INFO flag signalling membership in a comparison track.
    pub fn membership_flag(track: &str) -> Self {
        Self::info(track, HeaderCount::Fixed(0), HeaderType::Flag, format!("{track} Membership"))
    }
}

impl fmt::Display for VcfHeaderLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let section = match self.section {
            HeaderSection::Info => "INFO",
            HeaderSection::Format => "FORMAT",
        };
        write!(
            f,
            "##{section}=<ID={},Number={},Type={},Description=\"{}\">",
            self.id, self.count, self.value_type, self.description
        )
    }
}
