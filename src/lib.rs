// THEORY:
// This file is the entry point for the `ifire_vision` library crate. The public
// surface is the `FireDetector` in `pipeline` plus the data it produces
// (`DetectionResult`, `BoundingBox`) and the session-level collaborators that
// consume it: hotspot records and reports in `dashboard`, environmental risk
// estimates in `risk`.
//
// The analysis stages live in `core_modules`, leaves first:
// pixel -> pixel_sampler -> color_classifier -> grid_cell -> grid_aggregator
//       -> region -> region_merger -> detection_decider
// Each stage is usable on its own, which is how the tests exercise them.

pub mod config;
pub mod core_modules;
pub mod dashboard;
pub mod error;
pub mod pipeline;
pub mod risk;
pub mod session;
pub mod upload;

pub use config::DetectorConfig;
pub use core_modules::detection_decider::{DetectionResult, DetectionType, ImageQuality};
pub use core_modules::region::{BoundingBox, DetectionClass, Rect};
pub use error::{DetectionError, Result};
pub use pipeline::FireDetector;
