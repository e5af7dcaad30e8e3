use chrono::NaiveDate;

use crate::heuristics::adherence::{
    AHEAD_RATIO, BAND_TOLERANCE_KG, EXPECTED_LOSS_PER_WEEK_KG, ON_TRACK_RATIO,
};
use crate::models::{AdherenceResult, AdherenceStatus, ClinicalSnapshot, PlanStatus, PlanSummary};

pub const NO_ACTIVE_PLAN: &str = "no active plan";
pub const NO_RECORDS: &str = "no clinical records to compare against a plan";

pub fn active_plan(plans: &[PlanSummary]) -> Option<&PlanSummary> {
    plans.iter().find(|plan| plan.status == PlanStatus::Active)
}

pub fn expected_weight_loss(plan_duration_days: i64) -> f64 {
    (plan_duration_days.max(0) / 7) as f64 * EXPECTED_LOSS_PER_WEEK_KG
}

pub fn classify(actual_loss: f64, expected_loss: f64) -> AdherenceStatus {
    if actual_loss > AHEAD_RATIO * expected_loss + BAND_TOLERANCE_KG {
        AdherenceStatus::Ahead
    } else if actual_loss + BAND_TOLERANCE_KG >= ON_TRACK_RATIO * expected_loss {
        AdherenceStatus::OnTrack
    } else {
        AdherenceStatus::Behind
    }
}

/// Neutral result for a patient without clinical records, whatever plans exist.
pub fn no_records() -> AdherenceResult {
    AdherenceResult {
        current_plan: None,
        plan_duration_days: 0,
        expected_progress_text: NO_RECORDS.to_string(),
        actual_vs_expected: AdherenceStatus::Behind,
    }
}

/// Compares observed weight loss with a fixed weekly rate since the active plan began.
///
/// The observed loss spans the whole weighed history rather than only the
/// plan period, so patients with older records are measured against more
/// history than the plan covers.
pub fn evaluate_adherence(
    snapshots: &[ClinicalSnapshot],
    plans: &[PlanSummary],
    today: NaiveDate,
) -> AdherenceResult {
    let Some(plan) = active_plan(plans) else {
        return AdherenceResult {
            current_plan: None,
            plan_duration_days: 0,
            expected_progress_text: NO_ACTIVE_PLAN.to_string(),
            actual_vs_expected: AdherenceStatus::Behind,
        };
    };

    let plan_duration_days = (today - plan.start_date).num_days().max(0);
    let weeks = plan_duration_days / 7;
    let expected = expected_weight_loss(plan_duration_days);
    let expected_progress_text = format!(
        "Expected weight loss of {expected:.1} kg after {weeks} week{} on {}",
        if weeks == 1 { "" } else { "s" },
        plan.name
    );

    let weights: Vec<f64> = snapshots.iter().filter_map(|s| s.weight_kg).collect();
    let actual_vs_expected = match (weights.first(), weights.last()) {
        (Some(first), Some(last)) if weights.len() >= 2 => classify(first - last, expected),
        _ => AdherenceStatus::Behind,
    };

    AdherenceResult {
        current_plan: Some(plan.clone()),
        plan_duration_days,
        expected_progress_text,
        actual_vs_expected,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 29).unwrap()
    }

    fn plan(status: PlanStatus, started_days_ago: i64) -> PlanSummary {
        PlanSummary {
            name: "Mediterranean reset".to_string(),
            status,
            start_date: today() - Duration::days(started_days_ago),
            end_date: today() + Duration::days(60),
            daily_calories_target: Some(1800),
            daily_macros_target: None,
        }
    }

    fn weighed(days_ago: i64, weight: f64) -> ClinicalSnapshot {
        ClinicalSnapshot {
            date: today() - Duration::days(days_ago),
            weight_kg: Some(weight),
            height_m: None,
            waist_cm: None,
            reason: "weigh-in".to_string(),
        }
    }

    #[test]
    fn without_active_plan_reports_behind() {
        let plans = vec![plan(PlanStatus::Archived, 90), plan(PlanStatus::Draft, 3)];
        let result = evaluate_adherence(&[weighed(10, 80.0)], &plans, today());
        assert!(result.current_plan.is_none());
        assert_eq!(result.plan_duration_days, 0);
        assert_eq!(result.expected_progress_text, NO_ACTIVE_PLAN);
        assert_eq!(result.actual_vs_expected, AdherenceStatus::Behind);
    }

    #[test]
    fn four_weeks_expects_two_kilograms() {
        assert!((expected_weight_loss(28) - 2.0).abs() < 1e-9);
        assert!((expected_weight_loss(34) - 2.0).abs() < 1e-9);
        assert_eq!(expected_weight_loss(6), 0.0);
    }

    #[test]
    fn classification_bands_for_four_week_plan() {
        let plans = vec![plan(PlanStatus::Active, 28)];
        let cases = [
            (78.2, AdherenceStatus::OnTrack),
            (79.5, AdherenceStatus::Behind),
            (77.4, AdherenceStatus::Ahead),
        ];
        for (latest, expected) in cases {
            let snapshots = vec![weighed(30, 80.0), weighed(1, latest)];
            let result = evaluate_adherence(&snapshots, &plans, today());
            assert_eq!(result.plan_duration_days, 28);
            assert_eq!(result.actual_vs_expected, expected, "latest weight {latest}");
        }
    }

    #[test]
    fn losses_on_band_edges_are_on_track() {
        let plans = vec![plan(PlanStatus::Active, 28)];
        for latest in [78.4, 77.6] {
            let snapshots = vec![weighed(30, 80.0), weighed(1, latest)];
            let result = evaluate_adherence(&snapshots, &plans, today());
            assert_eq!(
                result.actual_vs_expected,
                AdherenceStatus::OnTrack,
                "latest weight {latest}"
            );
        }
        assert_eq!(classify(80.0 - 78.4, 2.0), AdherenceStatus::OnTrack);
        assert_eq!(classify(80.0 - 77.6, 2.0), AdherenceStatus::OnTrack);
        assert_eq!(classify(80.0 - 78.5, 2.0), AdherenceStatus::Behind);
        assert_eq!(classify(80.0 - 77.5, 2.0), AdherenceStatus::Ahead);
    }

    #[test]
    fn no_records_result_is_neutral() {
        let result = no_records();
        assert!(result.current_plan.is_none());
        assert_eq!(result.plan_duration_days, 0);
        assert_eq!(result.expected_progress_text, NO_RECORDS);
    }

    #[test]
    fn single_weight_is_behind() {
        let plans = vec![plan(PlanStatus::Active, 28)];
        let result = evaluate_adherence(&[weighed(1, 70.0)], &plans, today());
        assert_eq!(result.actual_vs_expected, AdherenceStatus::Behind);
        assert!(result.current_plan.is_some());
    }

    #[test]
    fn loss_spans_entire_history() {
        let plans = vec![plan(PlanStatus::Active, 14)];
        let snapshots = vec![weighed(200, 90.0), weighed(14, 80.0), weighed(1, 80.0)];
        let result = evaluate_adherence(&snapshots, &plans, today());
        assert_eq!(result.actual_vs_expected, AdherenceStatus::Ahead);
    }

    #[test]
    fn progress_text_mentions_weeks_and_expectation() {
        let plans = vec![plan(PlanStatus::Active, 28)];
        let result = evaluate_adherence(&[], &plans, today());
        assert_eq!(
            result.expected_progress_text,
            "Expected weight loss of 2.0 kg after 4 weeks on Mediterranean reset"
        );
    }

    #[test]
    fn future_plan_has_zero_duration() {
        let plans = vec![plan(PlanStatus::Active, -5)];
        let result = evaluate_adherence(&[], &plans, today());
        assert_eq!(result.plan_duration_days, 0);
    }
}
