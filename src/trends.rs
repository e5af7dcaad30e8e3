use crate::heuristics::{body_composition::WAIST_BAND_CM, weight::STABLE_BAND_KG};
use crate::models::{AnthropometricProgress, ClinicalSnapshot, Trend, WeightProgress};

/// Body mass index, or `None` unless both weight and height are present.
pub fn bmi(weight_kg: Option<f64>, height_m: Option<f64>) -> Option<f64> {
    match (weight_kg, height_m) {
        (Some(weight), Some(height)) if height > 0.0 => Some(weight / (height * height)),
        _ => None,
    }
}

pub fn classify_weight_change(change: f64) -> Trend {
    if change.abs() < STABLE_BAND_KG {
        Trend::Stable
    } else if change < 0.0 {
        Trend::Improving
    } else {
        Trend::Concerning
    }
}

pub fn classify_waist_change(waist_change: f64) -> Trend {
    if waist_change < -WAIST_BAND_CM {
        Trend::Improving
    } else if waist_change > WAIST_BAND_CM {
        Trend::Concerning
    } else {
        Trend::Stable
    }
}

/// Compares the two most recent snapshots that carry a weight.
pub fn analyze_weight(snapshots: &[ClinicalSnapshot]) -> WeightProgress {
    let weights: Vec<f64> = snapshots.iter().filter_map(|s| s.weight_kg).collect();

    let (current, previous) = match weights.as_slice() {
        [] => {
            return WeightProgress {
                current_weight: None,
                previous_weight: None,
                change: 0.0,
                change_percent: 0.0,
                trend: Trend::Stable,
            }
        }
        [only] => (*only, None),
        [.., previous, current] => (*current, Some(*previous)),
    };

    let Some(previous) = previous else {
        return WeightProgress {
            current_weight: Some(current),
            previous_weight: None,
            change: 0.0,
            change_percent: 0.0,
            trend: Trend::Stable,
        };
    };

    let change = current - previous;
    let change_percent = if previous == 0.0 {
        0.0
    } else {
        change / previous * 100.0
    };

    WeightProgress {
        current_weight: Some(current),
        previous_weight: Some(previous),
        change,
        change_percent,
        trend: classify_weight_change(change),
    }
}

/// Compares the two most recent snapshots that carry any body measurement.
pub fn analyze_body_composition(snapshots: &[ClinicalSnapshot]) -> AnthropometricProgress {
    let measured: Vec<&ClinicalSnapshot> = snapshots
        .iter()
        .filter(|s| s.has_anthropometrics())
        .collect();

    let (current, previous) = match measured.as_slice() {
        [] => {
            return AnthropometricProgress {
                waist_change: 0.0,
                bmi_current: None,
                bmi_previous: None,
                body_composition_trend: Trend::Stable,
            }
        }
        [only] => (*only, None),
        [.., previous, current] => (*current, Some(*previous)),
    };

    let waist_change = match (current.waist_cm, previous.and_then(|p| p.waist_cm)) {
        (Some(now), Some(before)) => now - before,
        _ => 0.0,
    };

    AnthropometricProgress {
        waist_change,
        bmi_current: bmi(current.weight_kg, current.height_m),
        bmi_previous: previous.and_then(|p| bmi(p.weight_kg, p.height_m)),
        body_composition_trend: classify_waist_change(waist_change),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn snapshot(
        day: u32,
        weight: Option<f64>,
        height: Option<f64>,
        waist: Option<f64>,
    ) -> ClinicalSnapshot {
        ClinicalSnapshot {
            date: NaiveDate::from_ymd_opt(2026, 3, day).unwrap(),
            weight_kg: weight,
            height_m: height,
            waist_cm: waist,
            reason: "follow-up".to_string(),
        }
    }

    #[test]
    fn bmi_requires_weight_and_height() {
        let value = bmi(Some(70.0), Some(1.75)).unwrap();
        assert!((value - 22.857).abs() < 0.01);
        assert_eq!(bmi(Some(70.0), None), None);
        assert_eq!(bmi(None, Some(1.75)), None);
    }

    #[test]
    fn weight_trend_follows_stable_band() {
        let cases = [(79.4, Trend::Improving), (80.3, Trend::Stable), (81.2, Trend::Concerning)];
        for (current, expected) in cases {
            let snapshots = vec![
                snapshot(1, Some(80.0), None, None),
                snapshot(8, Some(current), None, None),
            ];
            let progress = analyze_weight(&snapshots);
            assert_eq!(progress.trend, expected, "current weight {current}");
            assert!((progress.change - (current - 80.0)).abs() < 1e-9);
        }
    }

    #[test]
    fn weight_uses_last_two_weighted_snapshots() {
        let snapshots = vec![
            snapshot(1, Some(90.0), None, None),
            snapshot(5, Some(88.0), None, None),
            snapshot(9, None, None, Some(95.0)),
            snapshot(12, Some(86.0), None, None),
        ];
        let progress = analyze_weight(&snapshots);
        assert_eq!(progress.current_weight, Some(86.0));
        assert_eq!(progress.previous_weight, Some(88.0));
        assert!((progress.change + 2.0).abs() < 1e-9);
        assert!((progress.change_percent + 2.2727).abs() < 0.001);
    }

    #[test]
    fn single_weight_is_stable_with_zero_change() {
        let snapshots = vec![
            snapshot(1, Some(75.0), None, None),
            snapshot(4, None, Some(1.7), None),
        ];
        let progress = analyze_weight(&snapshots);
        assert_eq!(progress.current_weight, Some(75.0));
        assert_eq!(progress.previous_weight, None);
        assert_eq!(progress.change, 0.0);
        assert_eq!(progress.trend, Trend::Stable);
    }

    #[test]
    fn no_weights_yields_empty_progress() {
        let progress = analyze_weight(&[]);
        assert_eq!(progress.current_weight, None);
        assert_eq!(progress.change_percent, 0.0);
        assert_eq!(progress.trend, Trend::Stable);
    }

    #[test]
    fn waist_reduction_beyond_band_is_improving() {
        let snapshots = vec![
            snapshot(1, Some(80.0), Some(1.8), Some(94.0)),
            snapshot(20, Some(78.0), Some(1.8), Some(91.5)),
        ];
        let progress = analyze_body_composition(&snapshots);
        assert!((progress.waist_change + 2.5).abs() < 1e-9);
        assert_eq!(progress.body_composition_trend, Trend::Improving);
        assert!(progress.bmi_current.unwrap() < progress.bmi_previous.unwrap());
    }

    #[test]
    fn waist_growth_beyond_band_is_concerning() {
        let snapshots = vec![
            snapshot(1, None, None, Some(90.0)),
            snapshot(20, None, None, Some(92.5)),
        ];
        let progress = analyze_body_composition(&snapshots);
        assert_eq!(progress.body_composition_trend, Trend::Concerning);
        assert_eq!(progress.bmi_current, None);
    }

    #[test]
    fn missing_waist_on_either_side_counts_as_no_change() {
        let snapshots = vec![
            snapshot(1, Some(80.0), Some(1.8), None),
            snapshot(20, None, None, Some(88.0)),
        ];
        let progress = analyze_body_composition(&snapshots);
        assert_eq!(progress.waist_change, 0.0);
        assert_eq!(progress.body_composition_trend, Trend::Stable);
        assert_eq!(progress.bmi_current, None);
        assert!(progress.bmi_previous.is_some());
    }
}
