use tracing::{debug, error, info};
use uuid::Uuid;

use crate::engine::ProgressLogSink;
use crate::heuristics::body_composition::WAIST_BAND_CM;
use crate::heuristics::scoring::*;
use crate::models::{
    AdherenceStatus, LogMeasurements, ProgressAnalysisResult, ProgressLogEntry, Trend,
};

pub const FALLBACK_NOTE: &str = "Progress reviewed with no significant changes";

pub fn summarize_notes(result: &ProgressAnalysisResult) -> String {
    let mut parts = Vec::new();
    let weight = &result.weight_progress;

    match weight.trend {
        Trend::Improving => parts.push(format!(
            "Weight decreased by {:.1} kg ({:.1}%)",
            weight.change.abs(),
            weight.change_percent.abs()
        )),
        Trend::Concerning => parts.push(format!(
            "Weight increased by {:.1} kg ({:.1}%)",
            weight.change,
            weight.change_percent
        )),
        Trend::Stable => {}
    }

    let waist_change = result.anthropometric_progress.waist_change;
    if waist_change < -WAIST_BAND_CM {
        parts.push(format!("Waist reduced by {:.1} cm", waist_change.abs()));
    }

    match result.diet_plan_adherence.actual_vs_expected {
        AdherenceStatus::OnTrack => parts.push("Diet plan progress is on track".to_string()),
        AdherenceStatus::Behind => {
            parts.push("Diet plan progress is behind expectations".to_string())
        }
        AdherenceStatus::Ahead => {}
    }

    if parts.is_empty() {
        FALLBACK_NOTE.to_string()
    } else {
        parts.join(". ")
    }
}

pub fn adherence_score(result: &ProgressAnalysisResult) -> i32 {
    let mut score = BASE_ADHERENCE_SCORE;

    match result.weight_progress.trend {
        Trend::Improving => score += WEIGHT_IMPROVING_BONUS,
        Trend::Concerning => score -= WEIGHT_CONCERNING_PENALTY,
        Trend::Stable => {}
    }
    match result.anthropometric_progress.body_composition_trend {
        Trend::Improving => score += COMPOSITION_IMPROVING_BONUS,
        Trend::Concerning => score -= COMPOSITION_CONCERNING_PENALTY,
        Trend::Stable => {}
    }
    match result.diet_plan_adherence.actual_vs_expected {
        AdherenceStatus::OnTrack => score += ON_TRACK_BONUS,
        AdherenceStatus::Ahead => score += AHEAD_BONUS,
        AdherenceStatus::Behind => score -= BEHIND_PENALTY,
    }

    score.clamp(MIN_ADHERENCE_SCORE, MAX_ADHERENCE_SCORE)
}

pub fn feeling_level(result: &ProgressAnalysisResult) -> i32 {
    let mut level = BASE_FEELING_LEVEL;
    let recs = &result.recommendations;

    match result.weight_progress.trend {
        Trend::Improving => level += 1,
        Trend::Concerning => level -= 1,
        Trend::Stable => {}
    }
    if result.anthropometric_progress.body_composition_trend == Trend::Improving {
        level += 1;
    }
    if recs.positive_factors.len() > recs.concern_flags.len() {
        level += 1;
    }
    if recs.concern_flags.len() > CONCERN_FLAG_LIMIT {
        level -= 1;
    }

    level.clamp(MIN_FEELING_LEVEL, MAX_FEELING_LEVEL)
}

/// Summarizes the most recent timeline point, or `None` for an empty timeline.
pub fn build_log_entry(
    patient_id: Uuid,
    result: &ProgressAnalysisResult,
) -> Option<ProgressLogEntry> {
    let latest = result.timeline.last()?;

    Some(ProgressLogEntry {
        patient_id,
        date: latest.date,
        weight: latest.weight,
        measurements: LogMeasurements {
            waist: latest.waist,
            bmi: latest.bmi,
        },
        notes: summarize_notes(result),
        adherence_score: adherence_score(result),
        feeling_level: feeling_level(result),
    })
}

/// Writes the summary entry for the analysis. A failed write is logged and
/// swallowed so the computed analysis still reaches the caller.
pub async fn sync_progress_log<S>(
    sink: &S,
    patient_id: Uuid,
    result: &ProgressAnalysisResult,
) -> Option<ProgressLogEntry>
where
    S: ProgressLogSink + ?Sized,
{
    let Some(entry) = build_log_entry(patient_id, result) else {
        debug!(%patient_id, "empty timeline, skipping progress log");
        return None;
    };

    match sink.upsert_progress_log(&entry).await {
        Ok(()) => {
            info!(
                %patient_id,
                date = %entry.date,
                adherence_score = entry.adherence_score,
                feeling_level = entry.feeling_level,
                "progress log upserted"
            );
            Some(entry)
        }
        Err(err) => {
            error!(%patient_id, date = %entry.date, error = %err, "failed to upsert progress log");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AdherenceResult, AnthropometricProgress, Recommendations, TimelinePoint, WeightProgress,
    };
    use chrono::NaiveDate;

    fn result(weight: Trend, body: Trend, adherence: AdherenceStatus) -> ProgressAnalysisResult {
        let change = match weight {
            Trend::Improving => -1.5,
            Trend::Concerning => 1.5,
            Trend::Stable => 0.0,
        };
        let waist_change = match body {
            Trend::Improving => -3.0,
            Trend::Concerning => 3.0,
            Trend::Stable => 0.0,
        };
        ProgressAnalysisResult {
            weight_progress: WeightProgress {
                current_weight: Some(80.0 + change),
                previous_weight: Some(80.0),
                change,
                change_percent: change / 80.0 * 100.0,
                trend: weight,
            },
            anthropometric_progress: AnthropometricProgress {
                waist_change,
                bmi_current: Some(25.0),
                bmi_previous: Some(25.4),
                body_composition_trend: body,
            },
            diet_plan_adherence: AdherenceResult {
                current_plan: None,
                plan_duration_days: 21,
                expected_progress_text: String::new(),
                actual_vs_expected: adherence,
            },
            recommendations: Recommendations::default(),
            timeline: vec![TimelinePoint {
                date: NaiveDate::from_ymd_opt(2026, 4, 10).unwrap(),
                weight: Some(78.5),
                bmi: Some(25.0),
                waist: Some(90.0),
                plan_active: true,
                notes: "review".to_string(),
            }],
        }
    }

    #[test]
    fn notes_join_applicable_sentences() {
        let r = result(Trend::Improving, Trend::Improving, AdherenceStatus::OnTrack);
        assert_eq!(
            summarize_notes(&r),
            "Weight decreased by 1.5 kg (1.9%). Waist reduced by 3.0 cm. \
             Diet plan progress is on track"
        );
    }

    #[test]
    fn notes_fall_back_when_nothing_applies() {
        let r = result(Trend::Stable, Trend::Stable, AdherenceStatus::Ahead);
        assert_eq!(summarize_notes(&r), FALLBACK_NOTE);
    }

    #[test]
    fn adherence_score_clamps_high_and_low() {
        let best = result(Trend::Improving, Trend::Improving, AdherenceStatus::Ahead);
        assert_eq!(adherence_score(&best), 100);

        let worst = result(Trend::Concerning, Trend::Concerning, AdherenceStatus::Behind);
        assert_eq!(adherence_score(&worst), 0);

        let mixed = result(Trend::Stable, Trend::Concerning, AdherenceStatus::OnTrack);
        assert_eq!(adherence_score(&mixed), 65);
    }

    #[test]
    fn feeling_level_clamps_to_five_and_one() {
        let mut best = result(Trend::Improving, Trend::Improving, AdherenceStatus::OnTrack);
        best.recommendations.positive_factors = vec!["a".into(), "b".into(), "c".into()];
        assert_eq!(feeling_level(&best), 5);

        let mut worst = result(Trend::Concerning, Trend::Concerning, AdherenceStatus::Behind);
        worst.recommendations.concern_flags = vec!["a".into(), "b".into(), "c".into(), "d".into()];
        assert_eq!(feeling_level(&worst), 1);
    }

    #[test]
    fn log_entry_uses_latest_point() {
        let r = result(Trend::Stable, Trend::Stable, AdherenceStatus::OnTrack);
        let patient_id = Uuid::new_v4();
        let entry = build_log_entry(patient_id, &r).unwrap();
        assert_eq!(entry.patient_id, patient_id);
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2026, 4, 10).unwrap());
        assert_eq!(entry.weight, Some(78.5));
        assert_eq!(entry.measurements.waist, Some(90.0));
        assert_eq!(entry.adherence_score, 80);
    }

    #[test]
    fn empty_timeline_builds_nothing() {
        let mut r = result(Trend::Stable, Trend::Stable, AdherenceStatus::Behind);
        r.timeline.clear();
        assert!(build_log_entry(Uuid::new_v4(), &r).is_none());
    }
}
