// THEORY:
// Regions and bounding boxes are the spatial vocabulary of the detector.
//
// - A `Region` is a single flagged grid cell re-expressed as a rectangle in the
//   ORIGINAL image's pixel space. It remembers its grid coordinates so the
//   merger can reason about adjacency.
// - A `Rect` is a bare rectangle produced by merging regions.
// - A `BoundingBox` is the final, user-facing rectangle: a merged `Rect` tagged
//   with a class and a 0-100 score.
//
// All three are plain data containers with no behaviour beyond geometry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two classes a region or box can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DetectionClass {
    Fire,
    Smoke,
}

impl DetectionClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionClass::Fire => "Fire",
            DetectionClass::Smoke => "Smoke",
        }
    }
}

impl fmt::Display for DetectionClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An axis-aligned rectangle in full-resolution pixel space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// A grid cell whose class ratio crossed its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Column of the flagged cell.
    pub grid_x: u32,
    /// Row of the flagged cell.
    pub grid_y: u32,
    /// The cell's extent in the uploaded image.
    pub rect: Rect,
}

/// A merged, classified rectangle ready for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "BoundingBoxRecord", from = "BoundingBoxRecord")]
pub struct BoundingBox {
    pub class: DetectionClass,
    /// 0-100, the rounded class score at the time of detection.
    pub score: u32,
    pub rect: Rect,
}

impl BoundingBox {
    pub fn area(&self) -> u64 {
        self.rect.area()
    }
}

/// Wire shape of a bounding box: `{ "class", "score", "bbox": [x, y, w, h] }`.
#[derive(Serialize, Deserialize)]
struct BoundingBoxRecord {
    class: DetectionClass,
    score: u32,
    bbox: [u32; 4],
}

impl From<BoundingBox> for BoundingBoxRecord {
    fn from(b: BoundingBox) -> Self {
        BoundingBoxRecord {
            class: b.class,
            score: b.score,
            bbox: [b.rect.x, b.rect.y, b.rect.width, b.rect.height],
        }
    }
}

impl From<BoundingBoxRecord> for BoundingBox {
    fn from(record: BoundingBoxRecord) -> Self {
        let [x, y, width, height] = record.bbox;
        BoundingBox {
            class: record.class,
            score: record.score,
            rect: Rect::new(x, y, width, height),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_edges_and_area() {
        let rect = Rect::new(10, 20, 30, 40);
        assert_eq!(rect.right(), 40);
        assert_eq!(rect.bottom(), 60);
        assert_eq!(rect.area(), 1200);
    }

    #[test]
    fn bounding_box_uses_bbox_array_on_the_wire() {
        let bbox = BoundingBox {
            class: DetectionClass::Smoke,
            score: 42,
            rect: Rect::new(1, 2, 3, 4),
        };
        let json = serde_json::to_value(bbox).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "class": "Smoke", "score": 42, "bbox": [1, 2, 3, 4] })
        );
        let parsed: BoundingBox = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, bbox);
    }
}
