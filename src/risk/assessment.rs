// THEORY:
// The heuristic risk score is a weighted sum of four environmental factors, each
// normalised to [0, 1] before weighting:
//
//   temperature  min(T / 40, 1)          x 30   hotter is riskier
//   humidity     max((100 - H) / 100, 0) x 30   drier is riskier
//   rainfall     max((50 - R) / 50, 0)   x 20   less rain is riskier
//   vegetation   min(V / 100, 1)         x 20   more fuel is riskier
//
// The rounded sum (0..=100) is banded into Low / Medium / High / Critical at 25,
// 50 and 75. The reported range is the score ± 15%, clipped to [0, 100], and the
// feature importance is each factor's share of the sum.

use crate::risk::reference::{REFERENCE_INPUTS, proximity_confidence};
use serde::{Deserialize, Serialize};
use std::fmt;

const TEMPERATURE_WEIGHT: f64 = 30.0;
const HUMIDITY_WEIGHT: f64 = 30.0;
const RAINFALL_WEIGHT: f64 = 20.0;
const VEGETATION_WEIGHT: f64 = 20.0;
const RANGE_FRACTION: f64 = 0.15;

/// Inputs in °C, % relative humidity, mm of rain and % vegetation density.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFactors {
    pub temperature: f64,
    pub humidity: f64,
    pub rainfall: f64,
    pub vegetation: f64,
}

impl RiskFactors {
    pub fn new(temperature: f64, humidity: f64, rainfall: f64, vegetation: f64) -> Self {
        Self {
            temperature,
            humidity,
            rainfall,
            vegetation,
        }
    }

    pub fn to_array(&self) -> [f64; 4] {
        [self.temperature, self.humidity, self.rainfall, self.vegetation]
    }
}

impl Default for RiskFactors {
    /// The starting point of the prediction form: a warm, dry, densely vegetated day.
    fn default() -> Self {
        Self::new(28.0, 35.0, 5.0, 75.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskCategory {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskCategory {
    pub fn from_score(score: u32) -> Self {
        match score {
            0..25 => RiskCategory::Low,
            25..50 => RiskCategory::Medium,
            50..75 => RiskCategory::High,
            _ => RiskCategory::Critical,
        }
    }

    pub fn advice(&self) -> &'static str {
        match self {
            RiskCategory::Critical => "Critical fire risk detected. Immediate preventive measures recommended.",
            RiskCategory::High => "High fire risk. Enhanced monitoring and preparedness required.",
            RiskCategory::Medium => "Moderate fire risk. Standard precautions should be maintained.",
            RiskCategory::Low => "Low fire risk. Conditions are favorable for fire prevention.",
        }
    }
}

impl fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RiskCategory::Low => "Low",
            RiskCategory::Medium => "Medium",
            RiskCategory::High => "High",
            RiskCategory::Critical => "Critical",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: u32,
    pub max: u32,
}

impl ScoreRange {
    pub fn around(score: u32) -> Self {
        let margin = (score as f64 * RANGE_FRACTION).round() as u32;
        Self {
            min: score.saturating_sub(margin),
            max: (score + margin).min(100),
        }
    }
}

/// Percentage share of each factor in the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub temperature: u32,
    pub humidity: u32,
    pub rainfall: u32,
    pub vegetation: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub risk_score: u32,
    pub risk_level: RiskCategory,
    pub confidence: u32,
    pub confidence_range: ScoreRange,
    pub factors: RiskFactors,
    pub feature_importance: FeatureImportance,
}

/// Weighted contributions, each clipped to `[0, weight]`.
pub fn factor_contributions(factors: &RiskFactors) -> [f64; 4] {
    [
        (factors.temperature / 40.0).clamp(0.0, 1.0) * TEMPERATURE_WEIGHT,
        ((100.0 - factors.humidity) / 100.0).clamp(0.0, 1.0) * HUMIDITY_WEIGHT,
        ((50.0 - factors.rainfall) / 50.0).clamp(0.0, 1.0) * RAINFALL_WEIGHT,
        (factors.vegetation / 100.0).clamp(0.0, 1.0) * VEGETATION_WEIGHT,
    ]
}

pub fn assess(factors: RiskFactors) -> RiskAssessment {
    let contributions = factor_contributions(&factors);
    let total: f64 = contributions.iter().sum();
    let risk_score = total.round() as u32;

    let share = |value: f64| {
        if total > 0.0 {
            (value / total * 100.0).round() as u32
        } else {
            0
        }
    };

    RiskAssessment {
        risk_score,
        risk_level: RiskCategory::from_score(risk_score),
        confidence: proximity_confidence(&factors, &REFERENCE_INPUTS),
        confidence_range: ScoreRange::around(risk_score),
        factors,
        feature_importance: FeatureImportance {
            temperature: share(contributions[0]),
            humidity: share(contributions[1]),
            rainfall: share(contributions[2]),
            vegetation: share(contributions[3]),
        },
    }
}
