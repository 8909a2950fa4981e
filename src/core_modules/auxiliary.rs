// THEORY:
// A general-purpose object detector can add context ("person", "car", "tree") to
// a detection, but it is never consulted for the fire/smoke verdict. The seam is
// an async trait so a real model can load lazily and run off the scan thread.
// The pipeline awaits it after the color analysis and swallows its errors.

use crate::core_modules::pixel_sampler::WorkingImage;
use crate::error::{DetectionError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A context label from an auxiliary detector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectLabel {
    pub class: String,
    /// 0.0..=1.0
    pub score: f32,
}

impl ObjectLabel {
    pub fn new(class: impl Into<String>, score: f32) -> Self {
        Self {
            class: class.into(),
            score,
        }
    }
}

#[async_trait]
pub trait AuxiliaryObjectDetector: Send + Sync {
    /// Loads model weights. Called once by `FireDetector::load`.
    async fn load(&self) -> Result<()>;

    async fn detect(&self, image: &WorkingImage) -> Result<Vec<ObjectLabel>>;

    fn name(&self) -> &'static str;
}

/// Detector used when no auxiliary model is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAuxiliaryDetector;

#[async_trait]
impl AuxiliaryObjectDetector for NoAuxiliaryDetector {
    async fn load(&self) -> Result<()> {
        Ok(())
    }

    async fn detect(&self, _image: &WorkingImage) -> Result<Vec<ObjectLabel>> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "none"
    }
}

/// Returns the same labels for every image. Handy for demos and tests.
#[derive(Debug, Default, Clone)]
pub struct StaticLabelDetector {
    labels: Vec<ObjectLabel>,
}

impl StaticLabelDetector {
    pub fn new(labels: Vec<ObjectLabel>) -> Self {
        Self { labels }
    }
}

#[async_trait]
impl AuxiliaryObjectDetector for StaticLabelDetector {
    async fn load(&self) -> Result<()> {
        Ok(())
    }

    async fn detect(&self, _image: &WorkingImage) -> Result<Vec<ObjectLabel>> {
        Ok(self.labels.clone())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Always fails; exercises the non-fatal error path.
#[derive(Debug, Default, Clone)]
pub struct FailingDetector {
    pub message: String,
}

#[async_trait]
impl AuxiliaryObjectDetector for FailingDetector {
    async fn load(&self) -> Result<()> {
        Ok(())
    }

    async fn detect(&self, _image: &WorkingImage) -> Result<Vec<ObjectLabel>> {
        Err(DetectionError::AuxiliaryDetector(self.message.clone()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}
