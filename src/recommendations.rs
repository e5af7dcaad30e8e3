use crate::models::{
    AdherenceResult, AdherenceStatus, AnthropometricProgress, Recommendations, Trend,
    WeightProgress,
};

pub const NO_RECORDS_FLAG: &str =
    "No clinical records found for this patient; progress cannot be assessed yet";

/// Applies each rule independently; several rules may fire for the same input.
pub fn synthesize(
    weight: &WeightProgress,
    body: &AnthropometricProgress,
    adherence: &AdherenceResult,
) -> Recommendations {
    let mut recs = Recommendations::default();

    match weight.trend {
        Trend::Concerning => {
            recs.should_adjust_plan = true;
            recs.concern_flags.push(format!(
                "Weight increased by {:.1} kg since the previous measurement",
                weight.change
            ));
            recs.suggested_changes
                .push("Review adherence to the current meal plan".to_string());
            recs.suggested_changes
                .push("Consider adjusting the daily calorie target".to_string());
        }
        Trend::Improving => {
            recs.positive_factors.push(format!(
                "Weight decreased by {:.1} kg since the previous measurement",
                weight.change.abs()
            ));
        }
        Trend::Stable => {}
    }

    match body.body_composition_trend {
        Trend::Improving => recs
            .positive_factors
            .push("Waist circumference is shrinking".to_string()),
        Trend::Concerning => recs
            .concern_flags
            .push("Waist circumference is increasing".to_string()),
        Trend::Stable => {}
    }

    match adherence.actual_vs_expected {
        AdherenceStatus::Behind => {
            recs.should_adjust_plan = true;
            recs.suggested_changes
                .push("Modify the diet plan to better fit the patient's routine".to_string());
            recs.suggested_changes
                .push("Investigate barriers to following the plan".to_string());
        }
        AdherenceStatus::OnTrack => recs
            .positive_factors
            .push("Progress is on track with the diet plan".to_string()),
        AdherenceStatus::Ahead => {}
    }

    recs
}

/// Neutral recommendations for a patient without any clinical record.
pub fn no_records() -> Recommendations {
    Recommendations {
        should_adjust_plan: false,
        suggested_changes: vec!["Record a baseline clinical measurement".to_string()],
        concern_flags: vec![NO_RECORDS_FLAG.to_string()],
        positive_factors: Vec::new(),
    }
}
