use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{PatientRecord, ProgressAnalysisResult};

fn fmt_opt(value: Option<f64>, unit: &str) -> String {
    match value {
        Some(v) => format!("{v:.1}{unit}"),
        None => "n/a".to_string(),
    }
}

fn write_list(output: &mut String, items: &[String], empty: &str) {
    if items.is_empty() {
        let _ = writeln!(output, "- {empty}");
    } else {
        for item in items {
            let _ = writeln!(output, "- {item}");
        }
    }
}

pub fn build_report(
    patient: &PatientRecord,
    as_of: NaiveDate,
    result: &ProgressAnalysisResult,
) -> String {
    let mut output = String::new();
    let weight = &result.weight_progress;
    let body = &result.anthropometric_progress;
    let adherence = &result.diet_plan_adherence;
    let recs = &result.recommendations;

    let _ = writeln!(output, "# Patient Progress Report");
    let _ = writeln!(
        output,
        "Generated for {} ({}) as of {}",
        patient.full_name, patient.email, as_of
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Weight");
    let _ = writeln!(
        output,
        "- Current: {}, previous: {}",
        fmt_opt(weight.current_weight, " kg"),
        fmt_opt(weight.previous_weight, " kg")
    );
    let _ = writeln!(
        output,
        "- Change: {:+.1} kg ({:+.1}%), trend {}",
        weight.change, weight.change_percent, weight.trend
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Body Composition");
    let _ = writeln!(
        output,
        "- Waist change: {:+.1} cm, trend {}",
        body.waist_change, body.body_composition_trend
    );
    let _ = writeln!(
        output,
        "- BMI: {} (previous {})",
        fmt_opt(body.bmi_current, ""),
        fmt_opt(body.bmi_previous, "")
    );
    let _ = writeln!(output);

    let _ = writeln!(output, "## Diet Plan Adherence");
    match &adherence.current_plan {
        Some(plan) => {
            let _ = writeln!(
                output,
                "- Plan: {} ({} to {}), {} days in",
                plan.name, plan.start_date, plan.end_date, adherence.plan_duration_days
            );
            if let Some(calories) = plan.daily_calories_target {
                let _ = writeln!(output, "- Daily calorie target: {calories} kcal");
            }
        }
        None => {
            let _ = writeln!(output, "- No active plan");
        }
    }
    let _ = writeln!(output, "- {}", adherence.expected_progress_text);
    let _ = writeln!(output, "- Status: {}", adherence.actual_vs_expected);
    let _ = writeln!(output);

    let _ = writeln!(output, "## Recommendations");
    if recs.should_adjust_plan {
        let _ = writeln!(output, "**Plan adjustment recommended.**");
        let _ = writeln!(output);
    }
    let _ = writeln!(output, "### Concerns");
    write_list(&mut output, &recs.concern_flags, "None");
    let _ = writeln!(output, "### Positive Factors");
    write_list(&mut output, &recs.positive_factors, "None recorded");
    let _ = writeln!(output, "### Suggested Changes");
    write_list(&mut output, &recs.suggested_changes, "No changes suggested");
    let _ = writeln!(output);

    let _ = writeln!(output, "## Timeline");
    if result.timeline.is_empty() {
        let _ = writeln!(output, "No clinical records on file.");
    } else {
        let _ = writeln!(output, "| Date | Weight | BMI | Waist | On plan | Notes |");
        let _ = writeln!(output, "|---|---|---|---|---|---|");
        for point in &result.timeline {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} |",
                point.date,
                fmt_opt(point.weight, " kg"),
                fmt_opt(point.bmi, ""),
                fmt_opt(point.waist, " cm"),
                if point.plan_active { "yes" } else { "no" },
                point.notes.replace('|', "/")
            );
        }
    }

    output
}
