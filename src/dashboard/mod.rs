pub mod hotspot;
pub mod location;
pub mod report;

pub use hotspot::{Hotspot, HotspotRegistry, RiskCounts, RiskLevel};
pub use location::{Coordinates, FixedResolver, LocationResolver, RandomRegionResolver};
pub use report::{render_report, report_filename, write_report};
