// THEORY:
// The `DetectionDecider` is the final, decision-making layer. It turns image-wide
// pixel percentages and merged boxes into one of three mutually exclusive
// outcomes, decided fresh for every image:
//
//   FireDetected   fire% > 1.5 and fireScore  > 25   (fireScore  = min(fire%  * 10, 100))
//   SmokeDetected  smoke% > 2  and smokeScore > 10   (smokeScore = min(smoke% *  5, 100))
//   NoFire         otherwise
//
// Fire is checked first, so an image with both fire and smoke evidence is always
// reported as fire. Confidence is capped per outcome (95 for fire, 90 for smoke)
// and floored at 60 for a clean verdict. The remaining fields of a
// `DetectionResult` (affected area, image quality, recommendations) are derived
// from the verdict and the source dimensions.

use crate::config::{DecisionConfig, MergePolicy};
use crate::core_modules::auxiliary::ObjectLabel;
use crate::core_modules::grid_aggregator::GridAnalysis;
use crate::core_modules::region::{BoundingBox, DetectionClass, Rect};
use crate::core_modules::region_merger::merge_regions;
use serde::{Deserialize, Serialize};
use std::fmt;

const FIRE_PRESENCE_PERCENT: f64 = 1.5;
const SMOKE_PRESENCE_PERCENT: f64 = 2.0;
const FIRE_SCORE_GAIN: f64 = 10.0;
const SMOKE_SCORE_GAIN: f64 = 5.0;
const FIRE_SCORE_THRESHOLD: f64 = 25.0;
const SMOKE_SCORE_THRESHOLD: f64 = 10.0;

/// The three possible outcomes of a detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionType {
    Fire,
    Smoke,
    #[serde(rename = "No Fire")]
    NoFire,
}

impl DetectionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionType::Fire => "Fire",
            DetectionType::Smoke => "Smoke",
            DetectionType::NoFire => "No Fire",
        }
    }

    pub fn is_hazard(&self) -> bool {
        !matches!(self, DetectionType::NoFire)
    }
}

impl fmt::Display for DetectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coarse resolution grade of the uploaded image, by width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageQuality {
    Excellent,
    Good,
    Fair,
}

impl ImageQuality {
    pub fn from_width(width: u32) -> Self {
        if width > 1000 {
            ImageQuality::Excellent
        } else if width > 600 {
            ImageQuality::Good
        } else {
            ImageQuality::Fair
        }
    }
}

/// Image-wide color evidence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorScores {
    pub fire_percentage: f64,
    pub smoke_percentage: f64,
    pub fire_score: f64,
    pub smoke_score: f64,
}

impl ColorScores {
    pub fn from_counts(fire_pixels: u64, smoke_pixels: u64, total_pixels: u64) -> Self {
        let percent = |count: u64| {
            if total_pixels == 0 {
                0.0
            } else {
                100.0 * count as f64 / total_pixels as f64
            }
        };
        Self::from_percentages(percent(fire_pixels), percent(smoke_pixels))
    }

    pub fn from_percentages(fire_percentage: f64, smoke_percentage: f64) -> Self {
        Self {
            fire_percentage,
            smoke_percentage,
            fire_score: (fire_percentage * FIRE_SCORE_GAIN).min(100.0),
            smoke_score: (smoke_percentage * SMOKE_SCORE_GAIN).min(100.0),
        }
    }

    pub fn has_fire_colors(&self) -> bool {
        self.fire_percentage > FIRE_PRESENCE_PERCENT
    }

    pub fn has_smoke_colors(&self) -> bool {
        self.smoke_percentage > SMOKE_PRESENCE_PERCENT
    }
}

/// The classification part of a result, before derived fields are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub detection_type: DetectionType,
    pub confidence: u32,
    pub detected_objects: Vec<String>,
    pub bounding_boxes: Vec<BoundingBox>,
}

/// Everything reported about one uploaded image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    pub fire_detected: bool,
    pub detection_type: DetectionType,
    pub confidence: u32,
    pub detected_objects: Vec<String>,
    pub affected_area: String,
    pub bounding_boxes: Vec<BoundingBox>,
    pub processing_time: String,
    pub image_quality: ImageQuality,
    pub lighting_conditions: String,
    pub recommendations: Vec<String>,
    /// Context labels from the auxiliary detector. Never used for the verdict.
    #[serde(default)]
    pub auxiliary_labels: Vec<ObjectLabel>,
}

/// Chooses between fire, smoke and a clean verdict.
#[derive(Debug, Clone, Default)]
pub struct DetectionDecider {
    config: DecisionConfig,
    merge_policy: MergePolicy,
}

impl DetectionDecider {
    pub fn new(config: DecisionConfig, merge_policy: MergePolicy) -> Self {
        Self {
            config,
            merge_policy,
        }
    }

    pub fn decide(&self, scores: &ColorScores, fire_boxes: &[Rect], smoke_boxes: &[Rect]) -> Verdict {
        if scores.has_fire_colors() && scores.fire_score > FIRE_SCORE_THRESHOLD {
            let confidence = (scores.fire_score.round() as u32).min(self.config.fire_confidence_cap);
            Verdict {
                detection_type: DetectionType::Fire,
                confidence,
                detected_objects: vec!["Fire".to_string(), "Flames".to_string()],
                bounding_boxes: self.boxes(DetectionClass::Fire, scores.fire_score, fire_boxes),
            }
        } else if scores.has_smoke_colors() && scores.smoke_score > SMOKE_SCORE_THRESHOLD {
            let confidence =
                (scores.smoke_score.round() as u32).min(self.config.smoke_confidence_cap);
            Verdict {
                detection_type: DetectionType::Smoke,
                confidence,
                detected_objects: vec!["Smoke".to_string()],
                bounding_boxes: self.boxes(DetectionClass::Smoke, scores.smoke_score, smoke_boxes),
            }
        } else {
            let strongest = scores.fire_score.max(scores.smoke_score).round() as u32;
            Verdict {
                detection_type: DetectionType::NoFire,
                confidence: 100u32
                    .saturating_sub(strongest)
                    .max(self.config.no_fire_confidence_floor),
                detected_objects: Vec::new(),
                bounding_boxes: Vec::new(),
            }
        }
    }

    fn boxes(&self, class: DetectionClass, score: f64, rects: &[Rect]) -> Vec<BoundingBox> {
        rects
            .iter()
            .take(self.config.max_boxes)
            .map(|&rect| BoundingBox {
                class,
                score: score.round() as u32,
                rect,
            })
            .collect()
    }

    /// Merges regions, decides, and derives every reported field.
    pub fn evaluate(&self, analysis: &GridAnalysis, source_width: u32, source_height: u32) -> DetectionResult {
        let scores = ColorScores::from_counts(
            analysis.fire_pixels,
            analysis.smoke_pixels,
            analysis.total_pixels,
        );
        let fire_boxes = merge_regions(&analysis.fire_regions, self.merge_policy);
        let smoke_boxes = merge_regions(&analysis.smoke_regions, self.merge_policy);
        let verdict = self.decide(&scores, &fire_boxes, &smoke_boxes);

        let fire_detected = verdict.detection_type.is_hazard();
        DetectionResult {
            fire_detected,
            detection_type: verdict.detection_type,
            confidence: verdict.confidence,
            detected_objects: verdict.detected_objects,
            affected_area: affected_area(
                &verdict.bounding_boxes,
                source_width,
                source_height,
                fire_detected,
            ),
            bounding_boxes: verdict.bounding_boxes,
            // Filled in by the caller that times the run.
            processing_time: String::new(),
            image_quality: ImageQuality::from_width(source_width),
            lighting_conditions: "Analyzed".to_string(),
            recommendations: recommendations(verdict.detection_type, verdict.confidence),
            auxiliary_labels: Vec::new(),
        }
    }
}

/// Share of the image covered by the boxes, e.g. `"12% of image"`, or `"0%"` when clean.
pub fn affected_area(boxes: &[BoundingBox], width: u32, height: u32, fire_detected: bool) -> String {
    if !fire_detected {
        return "0%".to_string();
    }
    let image_area = width as f64 * height as f64;
    let percent: f64 = if image_area > 0.0 {
        boxes
            .iter()
            .map(|b| b.area() as f64 / image_area * 100.0)
            .sum()
    } else {
        0.0
    };
    format!("{}% of image", percent.round() as u64)
}

/// Fixed advisory lines for each outcome.
pub fn recommendations(detection_type: DetectionType, confidence: u32) -> Vec<String> {
    match detection_type {
        DetectionType::Fire => vec![
            format!("🔥 Fire detected with {confidence}% confidence"),
            "⚠️ Immediate action required - verify and alert authorities".to_string(),
            "📞 Contact emergency services (911) if confirmed".to_string(),
            "🚨 Evacuate area and ensure safety of personnel".to_string(),
            "📍 Document location and monitor fire spread".to_string(),
        ],
        DetectionType::Smoke => vec![
            format!("💨 Smoke detected with {confidence}% confidence"),
            "⚠️ Potential fire hazard - investigate source immediately".to_string(),
            "🔍 Check for hidden fires or smoldering materials".to_string(),
            "📞 Contact fire department if smoke persists".to_string(),
            "👥 Ensure area is evacuated if smoke intensifies".to_string(),
        ],
        DetectionType::NoFire => vec![
            "✅ No fire or smoke detected in image".to_string(),
            "🔍 Image analysis complete - area appears safe".to_string(),
            format!("📊 Confidence: {confidence}%"),
            "🔄 Continue monitoring with regular scans".to_string(),
            "📸 Upload another image to continue surveillance".to_string(),
        ],
    }
}
