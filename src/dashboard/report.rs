//! Plain-text hotspot reports.

use crate::dashboard::hotspot::{Hotspot, HotspotRegistry, RiskLevel};
use crate::error::{DetectionError, Result};
use chrono::{DateTime, Datelike, TimeZone, Utc};
use log::info;
use std::fmt::Display;
use std::path::{Path, PathBuf};

const RULE: &str = "================================================================================";
const TITLE: &str = "                        iFIRE FIRE DETECTION REPORT";

/// `iFire_Report_<place>_<D>_<MM>_<YYYY>.txt`, where `<place>` is the location up to its first comma.
///
/// Only the month is zero-padded: 7 March 2025 gives `7_03_2025`, not `07_03_2025`.
pub fn report_filename(location: &str, date: &impl Datelike) -> String {
    let place = location.split(',').next().unwrap_or_default().trim();
    format!(
        "iFire_Report_{place}_{}_{:02}_{}.txt",
        date.day(),
        date.month(),
        date.year()
    )
}

pub fn render_report<Tz>(selected: &Hotspot, all: &[Hotspot], generated_at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let now = generated_at.with_timezone(&Utc);
    let high = count(all, RiskLevel::High);
    let medium = count(all, RiskLevel::Medium);
    let low = count(all, RiskLevel::Low);

    let listing: String = all
        .iter()
        .map(|hotspot| {
            format!(
                "• {} - {} - Risk: {} ({}%)\n",
                hotspot.location,
                hotspot.detection_type.map_or("N/A", |t| t.as_str()),
                hotspot.risk_level,
                hotspot.confidence
            )
        })
        .collect();

    format!(
        "{RULE}\n{TITLE}\n{RULE}\n\n\
         Report Generated: {generated}\n\n\
         SELECTED HOTSPOT DETAILS\n\
         ------------------------\n\
         Location: {location}\n\
         Detection Type: {kind}\n\
         Risk Level: {risk}\n\
         Confidence: {confidence}%\n\
         Detection Time: {age}\n\
         Coordinates: {latitude:.2}, {longitude:.2}\n\n\
         SUMMARY STATISTICS\n\
         ------------------\n\
         Total Detections: {total}\n\
         High Risk Areas: {high}\n\
         Medium Risk Areas: {medium}\n\
         Low Risk Areas: {low}\n\n\
         ALL HOTSPOTS\n\
         ------------\n\
         {listing}\n\
         {RULE}\n\
         Powered by iFire AI Detection System\n\
         {RULE}",
        generated = generated_at.format("%-m/%-d/%Y, %-I:%M:%S %p"),
        location = selected.location,
        kind = selected.detection_type.map_or("Unknown", |t| t.as_str()),
        risk = selected.risk_level,
        confidence = selected.confidence,
        age = selected.detection_time_label(now),
        latitude = selected.latitude,
        longitude = selected.longitude,
        total = all.len(),
    )
}

fn count(hotspots: &[Hotspot], level: RiskLevel) -> usize {
    hotspots.iter().filter(|h| h.risk_level == level).count()
}

/// Writes the report for the selected hotspot into `dir` and returns its path.
pub fn write_report<Tz>(dir: impl AsRef<Path>, registry: &HotspotRegistry, generated_at: &DateTime<Tz>) -> Result<PathBuf>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let selected = registry.selected().ok_or(DetectionError::NoSelection)?;
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir).map_err(|e| DetectionError::Report(e.to_string()))?;

    let path = dir.join(report_filename(&selected.location, &generated_at.date_naive()));
    let text = render_report(selected, registry.hotspots(), generated_at);
    std::fs::write(&path, text).map_err(|e| DetectionError::Report(format!("{}: {e}", path.display())))?;
    info!("Report for {} written to {}", selected.location, path.display());
    Ok(path)
}
