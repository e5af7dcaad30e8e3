use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{info, warn};
use uuid::Uuid;

use crate::adherence::{self, evaluate_adherence};
use crate::error::{EngineError, StoreError};
use crate::models::{ClinicalSnapshot, PlanSummary, ProgressAnalysisResult, ProgressLogEntry};
use crate::progress_log::sync_progress_log;
use crate::recommendations;
use crate::timeline::build_timeline;
use crate::trends::{analyze_body_composition, analyze_weight};

/// Read access to a patient's measurement and plan history.
#[async_trait]
pub trait PatientHistory: Send + Sync {
    /// Snapshots in ascending date order.
    async fn list_clinical_snapshots(
        &self,
        patient_id: Uuid,
    ) -> Result<Vec<ClinicalSnapshot>, StoreError>;

    async fn list_diet_plans(&self, patient_id: Uuid) -> Result<Vec<PlanSummary>, StoreError>;
}

/// Sink for progress-log entries. Implementations must update the existing
/// row for `(patient_id, date)` instead of inserting a second one.
#[async_trait]
pub trait ProgressLogSink: Send + Sync {
    async fn upsert_progress_log(&self, entry: &ProgressLogEntry) -> Result<(), StoreError>;
}

/// Runs every analysis stage over already fetched history.
///
/// Snapshots are stable-sorted by date first so every stage sees the same
/// "latest" record; same-day snapshots keep reader order.
pub fn analyze(
    snapshots: &[ClinicalSnapshot],
    plans: &[PlanSummary],
    today: NaiveDate,
) -> ProgressAnalysisResult {
    let mut snapshots = snapshots.to_vec();
    snapshots.sort_by_key(|snapshot| snapshot.date);

    let weight_progress = analyze_weight(&snapshots);
    let anthropometric_progress = analyze_body_composition(&snapshots);

    let (diet_plan_adherence, recommendations) = if snapshots.is_empty() {
        (adherence::no_records(), recommendations::no_records())
    } else {
        let diet_plan_adherence = evaluate_adherence(&snapshots, plans, today);
        let recommendations = recommendations::synthesize(
            &weight_progress,
            &anthropometric_progress,
            &diet_plan_adherence,
        );
        (diet_plan_adherence, recommendations)
    };

    ProgressAnalysisResult {
        weight_progress,
        anthropometric_progress,
        diet_plan_adherence,
        recommendations,
        timeline: build_timeline(&snapshots, plans),
    }
}

/// Fetches a patient's history, analyzes it as of `today`, and records the
/// resulting progress-log entry. Only a failed read is returned as an error.
pub async fn analyze_patient_progress<H, S>(
    history: &H,
    sink: &S,
    patient_id: Uuid,
    today: NaiveDate,
) -> Result<ProgressAnalysisResult, EngineError>
where
    H: PatientHistory + ?Sized,
    S: ProgressLogSink + ?Sized,
{
    let snapshots = async {
        history
            .list_clinical_snapshots(patient_id)
            .await
            .map_err(|source| EngineError::UpstreamRead {
                what: "clinical snapshots",
                patient_id,
                source,
            })
    };
    let plans = async {
        history
            .list_diet_plans(patient_id)
            .await
            .map_err(|source| EngineError::UpstreamRead {
                what: "diet plans",
                patient_id,
                source,
            })
    };
    let (snapshots, plans) = tokio::try_join!(snapshots, plans)?;

    info!(
        %patient_id,
        snapshots = snapshots.len(),
        plans = plans.len(),
        %today,
        "analyzing patient progress"
    );
    if snapshots.is_empty() {
        warn!(%patient_id, "no clinical records for patient");
    }

    let result = analyze(&snapshots, &plans, today);
    sync_progress_log(sink, patient_id, &result).await;

    Ok(result)
}
