//! Wire and session data model for the advisory client.
//!
//! Apart from [`AdvisoryForm`], every type here mirrors a JSON shape exchanged
//! with the advisory service. Field names follow the backend's keys verbatim.

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// A device-resolved position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// The place submitted alongside a recommendation request.
///
/// Serializes to `{"lat":..,"lon":..}`, `{"city":..}` or `{}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationCandidate {
    Coordinates(Coordinates),
    City { city: String },
    Unresolved {},
}

impl Default for LocationCandidate {
    fn default() -> Self {
        LocationCandidate::Unresolved {}
    }
}

/// Water availability on the farm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterAccess {
    Low,
    #[default]
    Medium,
    High,
}

impl WaterAccess {
    pub const ALL: [WaterAccess; 3] = [WaterAccess::Low, WaterAccess::Medium, WaterAccess::High];

    pub fn label(self) -> &'static str {
        match self {
            WaterAccess::Low => "Low",
            WaterAccess::Medium => "Medium",
            WaterAccess::High => "High",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn previous(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

/// What the farmer wants to optimise for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Goal {
    #[default]
    Balanced,
    Profit,
    Sustainability,
}

impl Goal {
    pub const ALL: [Goal; 3] = [Goal::Balanced, Goal::Profit, Goal::Sustainability];

    pub fn label(self) -> &'static str {
        match self {
            Goal::Balanced => "Balanced",
            Goal::Profit => "Max profit",
            Goal::Sustainability => "Soil / sustainability",
        }
    }

    pub fn next(self) -> Self {
        cycle(&Self::ALL, self, 1)
    }

    pub fn previous(self) -> Self {
        cycle(&Self::ALL, self, Self::ALL.len() - 1)
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, step: usize) -> T {
    let index = all.iter().position(|v| *v == current).unwrap_or(0);
    all[(index + step) % all.len()]
}

/// The recommendation form as the user edits it.
///
/// `farm_acres` holds the raw text from the input widget; it is parsed only
/// when a request is assembled.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvisoryForm {
    pub water_access: WaterAccess,
    pub goal: Goal,
    pub farm_acres: String,
}

impl Default for AdvisoryForm {
    fn default() -> Self {
        Self {
            water_access: WaterAccess::default(),
            goal: Goal::default(),
            farm_acres: "2".to_string(),
        }
    }
}

/// Body of `POST /recommend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub location: LocationCandidate,
    pub water_access: WaterAccess,
    pub goal: Goal,
    pub farm_acres: f64,
    pub language: String,
}

/// One simulated season in a crop's multi-year outlook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearProjection {
    pub year: i32,
    pub yield_kg: f64,
    pub profit_inr: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub crop: String,
    pub final_score: f64,
    #[serde(default)]
    pub explanations: Vec<String>,
    pub estimated_profit_inr: f64,
    pub estimated_yield_kg: f64,
    /// Percentage in `0..=100`.
    pub sustainability: f64,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub sim_projection: Vec<YearProjection>,
}

/// Body returned by `POST /recommend`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub primary: String,
    pub backup: String,
    pub recommendations: Vec<CropRecommendation>,
}

/// Body of `POST /ask`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QaRequest {
    pub question: String,
    pub language: String,
}

/// Result of a question.
///
/// `Failure` is both what the backend sends for a rejected question and what
/// the client records when the round-trip itself fails, so an asked-but-failed
/// question is never confused with "nothing asked yet".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QaResponse {
    Answer {
        answer: String,
        #[serde(default)]
        source: String,
    },
    Failure {
        error: String,
    },
}

impl QaResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        QaResponse::Failure {
            error: message.into(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, QaResponse::Failure { .. })
    }
}

/// A community tip as stored by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TipEntry {
    pub tip: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub time: String,
}

impl TipEntry {
    /// Parses `time` as RFC 3339, or as an offset-less ISO timestamp taken to be UTC.
    pub fn posted_at(&self) -> Option<DateTime<Local>> {
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&self.time) {
            return Some(parsed.with_timezone(&Local));
        }
        NaiveDateTime::parse_from_str(&self.time, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| Utc.from_utc_datetime(&naive).with_timezone(&Local))
    }
}

/// Body of `POST /tips`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTip {
    pub tip: String,
    pub author: String,
}

/// Body returned by `GET /tips`. A missing `tips` key reads as an empty feed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TipsEnvelope {
    #[serde(default)]
    pub tips: Vec<TipEntry>,
}
