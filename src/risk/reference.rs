//! Historical fire-occurrence conditions for Sumatra, used as the default
//! training set and as the reference for prediction confidence.

use crate::risk::assessment::RiskFactors;

/// `[temperature °C, humidity %, rainfall mm, vegetation %]`
pub const REFERENCE_INPUTS: [[f64; 4]; 20] = [
    // high risk
    [35.0, 20.0, 5.0, 80.0],
    [38.0, 15.0, 3.0, 85.0],
    [34.0, 25.0, 8.0, 75.0],
    [36.0, 18.0, 4.0, 82.0],
    [32.0, 22.0, 10.0, 78.0],
    // medium risk
    [30.0, 35.0, 15.0, 70.0],
    [28.0, 40.0, 20.0, 65.0],
    [31.0, 38.0, 18.0, 68.0],
    [29.0, 42.0, 22.0, 60.0],
    [27.0, 45.0, 25.0, 55.0],
    // low risk
    [25.0, 55.0, 35.0, 50.0],
    [22.0, 60.0, 40.0, 45.0],
    [24.0, 58.0, 38.0, 48.0],
    [20.0, 65.0, 45.0, 40.0],
    [23.0, 62.0, 42.0, 43.0],
    // mixed
    [33.0, 28.0, 12.0, 77.0],
    [26.0, 50.0, 30.0, 52.0],
    [37.0, 16.0, 6.0, 88.0],
    [28.0, 48.0, 28.0, 58.0],
    [31.0, 32.0, 16.0, 72.0],
];

/// Observed risk score (0..=100) for each row of `REFERENCE_INPUTS`.
pub const REFERENCE_RISK: [f64; 20] = [
    85.0, 95.0, 80.0, 88.0, 75.0, //
    60.0, 55.0, 62.0, 52.0, 48.0, //
    30.0, 20.0, 28.0, 18.0, 25.0, //
    78.0, 35.0, 92.0, 38.0, 65.0,
];

/// Per-factor scale used when measuring how far an input is from known conditions.
const DISTANCE_SCALE: [f64; 4] = [50.0, 100.0, 100.0, 100.0];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingSample {
    pub factors: RiskFactors,
    pub risk: f64,
}

pub fn reference_samples() -> Vec<TrainingSample> {
    REFERENCE_INPUTS
        .iter()
        .zip(REFERENCE_RISK)
        .map(|(&[t, h, r, v], risk)| TrainingSample {
            factors: RiskFactors::new(t, h, r, v),
            risk,
        })
        .collect()
}

/// Scaled Euclidean distance to the closest known input.
pub fn nearest_distance(factors: &RiskFactors, known: &[[f64; 4]]) -> f64 {
    let input = factors.to_array();
    known
        .iter()
        .map(|row| {
            input
                .iter()
                .zip(row)
                .zip(DISTANCE_SCALE)
                .map(|((a, b), scale)| ((a - b) / scale).powi(2))
                .sum::<f64>()
                .sqrt()
        })
        .fold(f64::INFINITY, f64::min)
}

/// 95 on a known input, falling by 20 per unit of scaled distance, never below 70.
pub fn proximity_confidence(factors: &RiskFactors, known: &[[f64; 4]]) -> u32 {
    let distance = nearest_distance(factors, known);
    (95.0 - distance * 20.0).max(70.0).round() as u32
}

/// The error margin implied by a confidence, in score points.
pub fn uncertainty(confidence: u32) -> u32 {
    ((1.0 - confidence as f64 / 100.0) * 15.0).round() as u32
}
