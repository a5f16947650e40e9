use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

const NAIVE_DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// A user record as the store returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub full_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An assignment record as the store returns it. `due_at` is kept verbatim.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignmentDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub user_email: String,
    pub course_name: Option<String>,
    pub title: Option<String>,
    pub due_at: Option<String>,
    pub points: Option<f64>,
}

/// Typed assignment used by the analysis pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub id: String,
    pub user_email: String,
    pub course_name: Option<String>,
    pub title: Option<String>,
    pub due_at: Option<DateTime<FixedOffset>>,
    pub points: Option<f64>,
}

impl Assignment {
    pub fn from_document(doc: &AssignmentDocument) -> Self {
        let due_at = doc.due_at.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                tracing::warn!(assignment_id = %doc.id, due_at = raw, "unparsable due date");
            }
            parsed
        });

        Assignment {
            id: doc.id.clone(),
            user_email: doc.user_email.clone(),
            course_name: doc.course_name.clone().filter(|s| !s.trim().is_empty()),
            title: doc.title.clone().filter(|s| !s.trim().is_empty()),
            due_at,
            points: doc.points.filter(|p| p.is_finite()),
        }
    }
}

/// Parses the timestamp shapes seen in assignment feeds and request bodies.
/// Values without an offset are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts);
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc().fixed_offset());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewKind {
    Day,
    #[default]
    Week,
    Month,
}

impl ViewKind {
    pub fn label(&self) -> &'static str {
        match self {
            ViewKind::Day => "Day",
            ViewKind::Week => "Week",
            ViewKind::Month => "Month",
        }
    }
}

impl fmt::Display for ViewKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ViewKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(ViewKind::Day),
            "week" => Ok(ViewKind::Week),
            "month" => Ok(ViewKind::Month),
            _ => Err(AppError::InvalidViewKind(s.to_string())),
        }
    }
}

/// Inclusive calendar-date range, interpreted in the anchor's offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub offset: FixedOffset,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WorkloadSummary {
    pub count: usize,
    pub quiz_count: usize,
    pub total_points: f64,
    pub overlapping_days: BTreeSet<NaiveDate>,
    pub earliest_due: Option<DateTime<FixedOffset>>,
    pub latest_due: Option<DateTime<FixedOffset>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StressLevel {
    Low,
    Moderate,
    High,
}

impl StressLevel {
    pub fn color_token(&self) -> &'static str {
        match self {
            StressLevel::High => "red",
            StressLevel::Moderate => "orange",
            StressLevel::Low => "green",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurnoutResult {
    pub burnout: u8,
    pub stress_level: StressLevel,
    pub summary: String,
    pub weekly_stress_map: BTreeMap<String, String>,
}
