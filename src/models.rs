use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StoreError;

/// One clinical encounter as read from the measurement store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicalSnapshot {
    pub date: NaiveDate,
    pub weight_kg: Option<f64>,
    pub height_m: Option<f64>,
    pub waist_cm: Option<f64>,
    pub reason: String,
}

impl ClinicalSnapshot {
    pub fn has_anthropometrics(&self) -> bool {
        self.weight_kg.is_some() || self.height_m.is_some() || self.waist_cm.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Draft,
    PendingReview,
    Active,
    Archived,
}

impl PlanStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PlanStatus::Draft => "draft",
            PlanStatus::PendingReview => "pending_review",
            PlanStatus::Active => "active",
            PlanStatus::Archived => "archived",
        }
    }
}

impl FromStr for PlanStatus {
    type Err = StoreError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "draft" => Ok(PlanStatus::Draft),
            "pending_review" => Ok(PlanStatus::PendingReview),
            "active" => Ok(PlanStatus::Active),
            "archived" => Ok(PlanStatus::Archived),
            other => Err(StoreError::InvalidValue {
                field: "diet_plans.status",
                value: other.to_string(),
            }),
        }
    }
}

/// One diet-plan record for a patient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub name: String,
    pub status: PlanStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub daily_calories_target: Option<i32>,
    pub daily_macros_target: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Improving,
    Stable,
    Concerning,
}

impl fmt::Display for Trend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trend::Improving => "improving",
            Trend::Stable => "stable",
            Trend::Concerning => "concerning",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdherenceStatus {
    OnTrack,
    Ahead,
    Behind,
}

impl fmt::Display for AdherenceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            AdherenceStatus::OnTrack => "on track",
            AdherenceStatus::Ahead => "ahead",
            AdherenceStatus::Behind => "behind",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightProgress {
    pub current_weight: Option<f64>,
    pub previous_weight: Option<f64>,
    pub change: f64,
    pub change_percent: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnthropometricProgress {
    pub waist_change: f64,
    pub bmi_current: Option<f64>,
    pub bmi_previous: Option<f64>,
    pub body_composition_trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdherenceResult {
    pub current_plan: Option<PlanSummary>,
    pub plan_duration_days: i64,
    pub expected_progress_text: String,
    pub actual_vs_expected: AdherenceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recommendations {
    pub should_adjust_plan: bool,
    pub suggested_changes: Vec<String>,
    pub concern_flags: Vec<String>,
    pub positive_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelinePoint {
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub bmi: Option<f64>,
    pub waist: Option<f64>,
    pub plan_active: bool,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressAnalysisResult {
    pub weight_progress: WeightProgress,
    pub anthropometric_progress: AnthropometricProgress,
    pub diet_plan_adherence: AdherenceResult,
    pub recommendations: Recommendations,
    pub timeline: Vec<TimelinePoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LogMeasurements {
    pub waist: Option<f64>,
    pub bmi: Option<f64>,
}

/// Daily summary persisted after each analysis, unique per patient and date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressLogEntry {
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub weight: Option<f64>,
    pub measurements: LogMeasurements,
    pub notes: String,
    pub adherence_score: i32,
    pub feeling_level: i32,
}

#[derive(Debug, Clone)]
pub struct PatientRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}
