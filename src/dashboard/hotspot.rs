// THEORY:
// A `Hotspot` is a detection pinned to a place. It keeps only what a map or a
// report needs from the `DetectionResult` (type, confidence) plus where and when.
// The registry is the session's list of hotspots: newest first, ids handed out
// by a counter, and at most one selected entry, which is what a report is about.

use crate::core_modules::detection_decider::{DetectionResult, DetectionType};
use crate::dashboard::location::{Coordinates, LocationResolver};
use crate::error::{DetectionError, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const DEFAULT_REGION: &str = "Sumatra";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_detection(detection_type: DetectionType) -> Self {
        match detection_type {
            DetectionType::Fire => RiskLevel::High,
            DetectionType::Smoke => RiskLevel::Medium,
            DetectionType::NoFire => RiskLevel::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hotspot {
    pub id: u64,
    pub location: String,
    pub confidence: u32,
    pub detected_at: DateTime<Utc>,
    pub risk_level: RiskLevel,
    pub latitude: f64,
    pub longitude: f64,
    pub region: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detection_type: Option<DetectionType>,
}

impl Hotspot {
    /// Pins a detection to a location. Missing coordinates come from `resolver`.
    pub fn from_detection(
        id: u64,
        result: &DetectionResult,
        location: &str,
        coordinates: Option<Coordinates>,
        resolver: &dyn LocationResolver,
        detected_at: DateTime<Utc>,
    ) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(DetectionError::MissingLocation);
        }
        let point = coordinates.unwrap_or_else(|| resolver.resolve(location));
        Ok(Self {
            id,
            location: location.to_string(),
            confidence: result.confidence,
            detected_at,
            risk_level: RiskLevel::from_detection(result.detection_type),
            latitude: point.latitude,
            longitude: point.longitude,
            region: DEFAULT_REGION.to_string(),
            detection_type: Some(result.detection_type),
        })
    }

    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    /// "Just now", "5 min ago", "2 hours ago", "3 days ago".
    pub fn detection_time_label(&self, now: DateTime<Utc>) -> String {
        relative_time_label(self.detected_at, now)
    }
}

pub fn relative_time_label(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes().max(0);
    match minutes {
        0 => "Just now".to_string(),
        1..=59 => format!("{minutes} min ago"),
        60..=119 => "1 hour ago".to_string(),
        120..=1439 => format!("{} hours ago", minutes / 60),
        1440..=2879 => "1 day ago".to_string(),
        _ => format!("{} days ago", minutes / 1440),
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RiskCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Default)]
pub struct HotspotRegistry {
    hotspots: Vec<Hotspot>,
    next_id: u64,
    selected: Option<u64>,
}

impl HotspotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a hotspot from a detection, puts it first and selects it.
    pub fn add_detection(
        &mut self,
        result: &DetectionResult,
        location: &str,
        coordinates: Option<Coordinates>,
        resolver: &dyn LocationResolver,
        detected_at: DateTime<Utc>,
    ) -> Result<&Hotspot> {
        let id = self.next_id + 1;
        let hotspot = Hotspot::from_detection(id, result, location, coordinates, resolver, detected_at)?;
        self.next_id = id;
        info!(
            "Hotspot #{id} added: {} at {} ({}% confidence)",
            result.detection_type, hotspot.location, hotspot.confidence
        );
        Ok(self.insert(hotspot))
    }

    /// Adds an existing record, newest first, and selects it.
    pub fn insert(&mut self, hotspot: Hotspot) -> &Hotspot {
        self.next_id = self.next_id.max(hotspot.id);
        self.selected = Some(hotspot.id);
        self.hotspots.insert(0, hotspot);
        &self.hotspots[0]
    }

    pub fn get(&self, id: u64) -> Option<&Hotspot> {
        self.hotspots.iter().find(|h| h.id == id)
    }

    /// Returns whether `id` exists; the selection is unchanged otherwise.
    pub fn select(&mut self, id: u64) -> bool {
        if self.get(id).is_some() {
            self.selected = Some(id);
            true
        } else {
            false
        }
    }

    pub fn selected(&self) -> Option<&Hotspot> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }

    pub fn counts_by_risk(&self) -> RiskCounts {
        self.hotspots
            .iter()
            .fold(RiskCounts::default(), |mut counts, hotspot| {
                match hotspot.risk_level {
                    RiskLevel::High => counts.high += 1,
                    RiskLevel::Medium => counts.medium += 1,
                    RiskLevel::Low => counts.low += 1,
                }
                counts
            })
    }

    pub fn len(&self) -> usize {
        self.hotspots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hotspots.is_empty()
    }
}
