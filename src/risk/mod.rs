//! Environmental fire-risk estimation: a closed-form weighted score (`assess`)
//! and a trainable regressor (`RiskNetwork`) over the same four factors.

pub mod assessment;
pub mod network;
pub mod reference;

pub use assessment::{RiskAssessment, RiskCategory, RiskFactors, assess};
pub use network::{NetworkConfig, RiskNetwork, RiskPrediction, TrainingReport};
pub use reference::{TrainingSample, reference_samples};
