//! Fixed clinical heuristics used by the progress analysis.
//!
//! None of these values carry a documented clinical justification yet; they
//! are grouped here so they can be reviewed with a dietitian in one place.

pub mod weight {
    /// Absolute change below this (kg) is reported as stable.
    pub const STABLE_BAND_KG: f64 = 0.5;
}

pub mod body_composition {
    /// Waist reduction beyond this (cm) counts as improvement, growth beyond it as concerning.
    pub const WAIST_BAND_CM: f64 = 2.0;
}

pub mod adherence {
    pub const EXPECTED_LOSS_PER_WEEK_KG: f64 = 0.5;
    pub const ON_TRACK_RATIO: f64 = 0.8;
    pub const AHEAD_RATIO: f64 = 1.2;
    /// Weights are recorded to 0.1 kg; band edges absorb float error below this.
    pub const BAND_TOLERANCE_KG: f64 = 0.005;
}

pub mod scoring {
    pub const BASE_ADHERENCE_SCORE: i32 = 50;
    pub const WEIGHT_IMPROVING_BONUS: i32 = 30;
    pub const COMPOSITION_IMPROVING_BONUS: i32 = 20;
    pub const ON_TRACK_BONUS: i32 = 30;
    pub const AHEAD_BONUS: i32 = 40;
    pub const WEIGHT_CONCERNING_PENALTY: i32 = 20;
    pub const COMPOSITION_CONCERNING_PENALTY: i32 = 15;
    pub const BEHIND_PENALTY: i32 = 25;
    pub const MIN_ADHERENCE_SCORE: i32 = 0;
    pub const MAX_ADHERENCE_SCORE: i32 = 100;

    pub const BASE_FEELING_LEVEL: i32 = 3;
    pub const MIN_FEELING_LEVEL: i32 = 1;
    pub const MAX_FEELING_LEVEL: i32 = 5;
    /// More concern flags than this lowers the feeling level.
    pub const CONCERN_FLAG_LIMIT: usize = 2;
}
