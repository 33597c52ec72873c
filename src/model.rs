use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Keyword priority tier, 1 being the most important.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum PriorityTier {
    One,
    Two,
    Three,
}

impl PriorityTier {
    /// Tier for a keyword's 1-based position in the corpus:
    /// 1..=600 -> 1, 601..=900 -> 2, everything after -> 3.
    pub fn from_ordinal(ordinal: u32) -> Self {
        match ordinal {
            0..=600 => PriorityTier::One,
            601..=900 => PriorityTier::Two,
            _ => PriorityTier::Three,
        }
    }

    pub fn as_i16(self) -> i16 {
        match self {
            PriorityTier::One => 1,
            PriorityTier::Two => 2,
            PriorityTier::Three => 3,
        }
    }
}

impl From<PriorityTier> for i16 {
    fn from(tier: PriorityTier) -> Self {
        tier.as_i16()
    }
}

impl TryFrom<i16> for PriorityTier {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(PriorityTier::One),
            2 => Ok(PriorityTier::Two),
            3 => Ok(PriorityTier::Three),
            other => Err(format!("priority tier out of range: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Keyword {
    pub id: i32,
    pub text: String,
    pub slug: String,
    pub category: String,
    pub priority: PriorityTier,
}

/// A keyword as produced by the importer, before it has a row id.
#[derive(Debug, Clone, PartialEq)]
pub struct KeywordDraft {
    pub text: String,
    pub slug: String,
    pub category: String,
    pub priority: PriorityTier,
    /// Ordinal the tier was derived from.
    pub ordinal: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LocationKind {
    Province,
    City,
}

impl LocationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LocationKind::Province => "PROVINCE",
            LocationKind::City => "CITY",
        }
    }
}

impl fmt::Display for LocationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocationKind {
    type Err = String;

    /// Towns are served exactly like cities.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "PROVINCE" => Ok(LocationKind::Province),
            "CITY" | "TOWN" => Ok(LocationKind::City),
            other => Err(format!("unsupported location kind: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: i32,
    pub name: String,
    pub slug: String,
    #[serde(rename = "type")]
    pub kind: LocationKind,
    pub parent_id: Option<i32>,
    #[serde(default)]
    pub population: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationDraft {
    pub name: String,
    pub slug: String,
    pub kind: LocationKind,
    pub parent_id: Option<i32>,
    pub population: Option<i64>,
}

/// Result of an idempotent write keyed on a natural key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    Updated,
    Unchanged,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageStats {
    pub service_count: i32,
    pub salon_count: i32,
    pub avg_price: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedLink {
    pub label: String,
    pub url: String,
}

/// Rendered SEO content for one (keyword, location) pair, written by the
/// authoring process and only read here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageContentRecord {
    pub keyword_id: i32,
    pub location_id: i32,
    pub url: String,
    pub h1: String,
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub intro_text: String,
    pub meta_title: String,
    #[serde(default)]
    pub meta_description: String,
    #[serde(default)]
    pub schema_markup: serde_json::Value,
    #[serde(default)]
    pub related_links: Vec<RelatedLink>,
    #[serde(default)]
    pub stats: PageStats,
    pub last_generated: DateTime<Utc>,
}
