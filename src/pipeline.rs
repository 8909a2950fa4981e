// THEORY:
// The `pipeline` module is the top-level API of the detector. `FireDetector` is an
// explicit context object: it owns the configuration, the analysis stages and the
// injected auxiliary detector, and it carries the one piece of mutable state the
// system has (whether the auxiliary model finished loading). Nothing is global,
// so tests can build as many independent detectors as they like.
//
// One detection runs as:
//   1. decode + downscale + grid sweep + decision, on a blocking worker thread
//      (`spawn_blocking`), one dispatch per call;
//   2. the auxiliary detector, awaited afterwards, sequentially, only if loaded;
//   3. timing and labels attached to the immutable result.
// Failures in step 1 abort the detection. Step 2 failures are logged and ignored.

use crate::config::DetectorConfig;
use crate::core_modules::auxiliary::{AuxiliaryObjectDetector, NoAuxiliaryDetector, ObjectLabel};
use crate::core_modules::detection_decider::{DetectionDecider, DetectionResult};
use crate::core_modules::grid_aggregator::GridAggregator;
use crate::core_modules::pixel_sampler::{PixelSampler, WorkingImage};
use crate::error::Result;
use crate::upload::validate_upload;
use image::DynamicImage;
use log::{debug, info, warn};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// The synchronous part of a detection, cloneable onto a worker thread.
#[derive(Debug, Clone)]
struct AnalysisStages {
    sampler: PixelSampler,
    grid: GridAggregator,
    decider: DetectionDecider,
}

impl AnalysisStages {
    fn from_config(config: &DetectorConfig) -> Self {
        Self {
            sampler: PixelSampler::new(config.sampling.max_dimension),
            grid: GridAggregator::from_config(&config.grid),
            decider: DetectionDecider::new(config.decision.clone(), config.grid.merge_policy),
        }
    }

    fn analyze(&self, working: &WorkingImage) -> DetectionResult {
        let analysis = self.grid.analyze(working);
        self.decider
            .evaluate(&analysis, working.source_width, working.source_height)
    }

    fn run_bytes(&self, bytes: &[u8]) -> Result<(WorkingImage, DetectionResult)> {
        let working = self.sampler.sample_bytes(bytes)?;
        let result = self.analyze(&working);
        Ok((working, result))
    }

    fn run_image(&self, image: &DynamicImage) -> Result<(WorkingImage, DetectionResult)> {
        let working = self.sampler.sample_image(image)?;
        let result = self.analyze(&working);
        Ok((working, result))
    }
}

/// Detection context: configuration, analysis stages and the auxiliary detector.
pub struct FireDetector {
    config: DetectorConfig,
    stages: AnalysisStages,
    auxiliary: Arc<dyn AuxiliaryObjectDetector>,
    /// Flips once from false to true when the auxiliary model has loaded.
    model_loaded: AtomicBool,
}

impl FireDetector {
    pub fn new(config: DetectorConfig) -> Self {
        Self::with_auxiliary(config, Arc::new(NoAuxiliaryDetector))
    }

    pub fn with_auxiliary(config: DetectorConfig, auxiliary: Arc<dyn AuxiliaryObjectDetector>) -> Self {
        Self {
            stages: AnalysisStages::from_config(&config),
            config,
            auxiliary,
            model_loaded: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Loads the auxiliary model. Detection works without it; labels are simply omitted.
    pub async fn load(&self) -> Result<()> {
        if self.is_ready() {
            return Ok(());
        }
        match self.auxiliary.load().await {
            Ok(()) => {
                self.model_loaded.store(true, Ordering::Release);
                info!("Auxiliary detector '{}' loaded", self.auxiliary.name());
                Ok(())
            }
            Err(err) => {
                warn!("Auxiliary detector '{}' failed to load: {err}", self.auxiliary.name());
                Err(err)
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        self.model_loaded.load(Ordering::Acquire)
    }

    /// Validates an upload against the configured limits, then detects.
    pub async fn detect_upload(&self, bytes: Vec<u8>, declared_mime: Option<&str>) -> Result<DetectionResult> {
        validate_upload(&bytes, declared_mime, &self.config.upload)?;
        self.detect(bytes).await
    }

    /// Runs a full detection on encoded image bytes.
    pub async fn detect(&self, bytes: Vec<u8>) -> Result<DetectionResult> {
        let started = Instant::now();
        let stages = self.stages.clone();
        let (working, result) = tokio::task::spawn_blocking(move || stages.run_bytes(&bytes)).await??;
        Ok(self.finish(working, result, started).await)
    }

    /// Runs a full detection on an already decoded image.
    pub async fn detect_image(&self, image: DynamicImage) -> Result<DetectionResult> {
        let started = Instant::now();
        let stages = self.stages.clone();
        let (working, result) = tokio::task::spawn_blocking(move || stages.run_image(&image)).await??;
        Ok(self.finish(working, result, started).await)
    }

    /// Color analysis only, on the calling thread. No auxiliary labels.
    pub fn detect_blocking(&self, bytes: &[u8]) -> Result<DetectionResult> {
        let started = Instant::now();
        let (_, mut result) = self.stages.run_bytes(bytes)?;
        result.processing_time = elapsed_label(started);
        log_verdict(&result);
        Ok(result)
    }

    /// Color analysis of a prepared working image. No auxiliary labels.
    pub fn analyze_working(&self, working: &WorkingImage) -> DetectionResult {
        let started = Instant::now();
        let mut result = self.stages.analyze(working);
        result.processing_time = elapsed_label(started);
        result
    }

    async fn finish(&self, working: WorkingImage, mut result: DetectionResult, started: Instant) -> DetectionResult {
        result.auxiliary_labels = self.auxiliary_labels(&working).await;
        result.processing_time = elapsed_label(started);
        log_verdict(&result);
        result
    }

    async fn auxiliary_labels(&self, working: &WorkingImage) -> Vec<ObjectLabel> {
        if !self.is_ready() {
            debug!("Auxiliary detector not loaded; skipping context labels");
            return Vec::new();
        }
        match self.auxiliary.detect(working).await {
            Ok(labels) => labels,
            Err(err) => {
                warn!("Ignoring auxiliary detector error: {err}");
                Vec::new()
            }
        }
    }
}

impl Default for FireDetector {
    fn default() -> Self {
        Self::new(DetectorConfig::default())
    }
}

fn elapsed_label(started: Instant) -> String {
    format!("{}ms", started.elapsed().as_millis())
}

fn log_verdict(result: &DetectionResult) {
    info!(
        "Detection: {} ({}% confidence, {} box(es), {}) in {}",
        result.detection_type,
        result.confidence,
        result.bounding_boxes.len(),
        result.affected_area,
        result.processing_time
    );
}
