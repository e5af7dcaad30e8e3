use chrono::NaiveDate;

use crate::models::{ClinicalSnapshot, PlanSummary, TimelinePoint};
use crate::trends::bmi;

pub const DEFAULT_NOTE: &str = "Clinical measurement";

/// True when any plan's inclusive date range covers `date`, whatever its status.
pub fn plan_active_on(plans: &[PlanSummary], date: NaiveDate) -> bool {
    plans
        .iter()
        .any(|plan| plan.start_date <= date && date <= plan.end_date)
}

/// One point per snapshot, in the order given.
pub fn build_timeline(
    snapshots: &[ClinicalSnapshot],
    plans: &[PlanSummary],
) -> Vec<TimelinePoint> {
    snapshots
        .iter()
        .map(|snapshot| TimelinePoint {
            date: snapshot.date,
            weight: snapshot.weight_kg,
            bmi: bmi(snapshot.weight_kg, snapshot.height_m),
            waist: snapshot.waist_cm,
            plan_active: plan_active_on(plans, snapshot.date),
            notes: if snapshot.reason.trim().is_empty() {
                DEFAULT_NOTE.to_string()
            } else {
                snapshot.reason.clone()
            },
        })
        .collect()
}
