//! Daily fertility observations.
//!
//! An [`Observation`] is one row of the user's daily log. The engine only
//! ever reads observations; ownership stays with the store that produced
//! them. All tag vocabularies are closed enums so that unrecognized values
//! are rejected at the input boundary instead of flowing into the detectors.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Bleeding intensity recorded for a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum BleedingLevel {
    #[default]
    None,
    Spotting,
    Heavy,
}

impl BleedingLevel {
    /// Spotting and heavy both count as a bleeding day.
    pub fn is_bleeding(self) -> bool {
        matches!(self, BleedingLevel::Spotting | BleedingLevel::Heavy)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BleedingLevel::None => "none",
            BleedingLevel::Spotting => "spotting",
            BleedingLevel::Heavy => "heavy",
        }
    }
}

impl FromStr for BleedingLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(BleedingLevel::None),
            "spotting" => Ok(BleedingLevel::Spotting),
            "heavy" => Ok(BleedingLevel::Heavy),
            other => Err(ValidationError::UnknownTag {
                field: "bleedingLevel",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for BleedingLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vulvar sensation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sensation {
    Dry,
    Moist,
    Sticky,
    Slippery,
}

impl Sensation {
    pub fn as_str(self) -> &'static str {
        match self {
            Sensation::Dry => "dry",
            Sensation::Moist => "moist",
            Sensation::Sticky => "sticky",
            Sensation::Slippery => "slippery",
        }
    }
}

impl FromStr for Sensation {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dry" => Ok(Sensation::Dry),
            "moist" => Ok(Sensation::Moist),
            "sticky" => Ok(Sensation::Sticky),
            "slippery" => Ok(Sensation::Slippery),
            other => Err(ValidationError::UnknownTag {
                field: "sensation",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Sensation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cervical mucus characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mucus {
    EggWhite,
    Clear,
    Stretchy,
    Thick,
    Sticky,
    White,
}

impl Mucus {
    pub fn as_str(self) -> &'static str {
        match self {
            Mucus::EggWhite => "eggWhite",
            Mucus::Clear => "clear",
            Mucus::Stretchy => "stretchy",
            Mucus::Thick => "thick",
            Mucus::Sticky => "sticky",
            Mucus::White => "white",
        }
    }
}

impl FromStr for Mucus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eggWhite" => Ok(Mucus::EggWhite),
            "clear" => Ok(Mucus::Clear),
            "stretchy" => Ok(Mucus::Stretchy),
            "thick" => Ok(Mucus::Thick),
            "sticky" => Ok(Mucus::Sticky),
            "white" => Ok(Mucus::White),
            other => Err(ValidationError::UnknownTag {
                field: "mucus",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Mucus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One day of logged observations, keyed by date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Observation {
    pub date: NaiveDate,
    #[serde(default)]
    pub bleeding_level: BleedingLevel,
    #[serde(default)]
    pub sensation: BTreeSet<Sensation>,
    #[serde(default)]
    pub mucus: BTreeSet<Mucus>,
    #[serde(default)]
    pub had_intercourse: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Observation {
    /// An empty observation for `date` (no bleeding, no biomarkers).
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            bleeding_level: BleedingLevel::None,
            sensation: BTreeSet::new(),
            mucus: BTreeSet::new(),
            had_intercourse: false,
            note: None,
        }
    }

    pub fn with_bleeding(mut self, level: BleedingLevel) -> Self {
        self.bleeding_level = level;
        self
    }

    pub fn with_sensation(mut self, sensation: Sensation) -> Self {
        self.sensation.insert(sensation);
        self
    }

    pub fn with_mucus(mut self, mucus: Mucus) -> Self {
        self.mucus.insert(mucus);
        self
    }

    pub fn with_intercourse(mut self, had_intercourse: bool) -> Self {
        self.had_intercourse = had_intercourse;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn is_bleeding(&self) -> bool {
        self.bleeding_level.is_bleeding()
    }

    /// Fertile biomarker rule: slippery sensation together with stretchy or
    /// clear mucus.
    pub fn has_fertile_signs(&self) -> bool {
        self.sensation.contains(&Sensation::Slippery)
            && (self.mucus.contains(&Mucus::Stretchy) || self.mucus.contains(&Mucus::Clear))
    }
}

/// Parse a `YYYY-MM-DD` calendar date.
///
/// # Errors
///
/// Returns [`ValidationError::MalformedDate`] for anything that is not a
/// real calendar day (including `2025-02-30`).
pub fn parse_date(input: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        ValidationError::MalformedDate {
            input: input.to_string(),
        }
    })
}

/// Parse a comma-separated tag list such as `"clear,stretchy"`.
///
/// Empty segments are ignored, so `""` yields an empty set.
pub fn parse_tag_set<T>(input: &str) -> Result<BTreeSet<T>, ValidationError>
where
    T: FromStr<Err = ValidationError> + Ord,
{
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(T::from_str)
        .collect()
}
