use ifire_vision::config::{DetectorConfig, MergePolicy};
use ifire_vision::core_modules::detection_decider::ImageQuality;
use ifire_vision::core_modules::grid_aggregator::GridAggregator;
use ifire_vision::core_modules::pixel_sampler::PixelSampler;
use ifire_vision::core_modules::region_merger::merge_regions;
use ifire_vision::{DetectionClass, DetectionError, DetectionType, FireDetector, Rect};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use std::io::Cursor;

const BRIGHT_FIRE: Rgba<u8> = Rgba([230, 150, 50, 255]);
const LIGHT_GRAY: Rgba<u8> = Rgba([200, 200, 200, 255]);
const DARK: Rgba<u8> = Rgba([40, 40, 40, 255]);

fn encode(image: RgbaImage, format: ImageFormat) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgba8(image)
        .write_to(&mut Cursor::new(&mut bytes), format)
        .expect("Error encoding test image.");
    bytes
}

fn png(image: RgbaImage) -> Vec<u8> {
    encode(image, ImageFormat::Png)
}

/// 100x100 gray image; the 2x2 block of grid cells at columns 2-3, rows 3-4
/// (pixels x 20..40, y 30..50) gets fire in the columns chosen by `is_fire_column`.
fn block_image(is_fire_column: impl Fn(u32) -> bool) -> RgbaImage {
    RgbaImage::from_fn(100, 100, |x, y| {
        let in_block = (20..40).contains(&x) && (30..50).contains(&y);
        if in_block && is_fire_column(x) {
            BRIGHT_FIRE
        } else {
            LIGHT_GRAY
        }
    })
}

#[tokio::test]
async fn dense_fire_block_yields_one_box_over_the_block() {
    // 80% of the block is fire: 320 of 10,000 pixels, so fire% = 3.2 and the score is 32.
    let detector = FireDetector::default();
    let result = detector.detect(png(block_image(|x| x % 5 != 0))).await.unwrap();

    assert_eq!(result.detection_type, DetectionType::Fire);
    assert!(result.fire_detected);
    assert!((25..=95).contains(&result.confidence));
    assert_eq!(result.confidence, 32);
    assert_eq!(result.bounding_boxes.len(), 1);
    assert_eq!(result.bounding_boxes[0].class, DetectionClass::Fire);
    assert_eq!(result.bounding_boxes[0].rect, Rect::new(20, 30, 20, 20));
    assert_eq!(result.affected_area, "4% of image");
    assert_eq!(result.detected_objects, vec!["Fire", "Flames"]);
}

#[test]
fn sparse_fire_block_is_flagged_but_too_small_to_call() {
    // 20% of the block is fire. Every block cell clears the 0.15 cell ratio, but
    // image-wide that is only 0.8% fire, under the 1.5% presence threshold.
    let raster = block_image(|x| x % 5 == 0);
    let working = PixelSampler::default()
        .sample_rgba(100, 100, raster.into_raw())
        .unwrap();
    let analysis = GridAggregator::default().analyze(&working);

    assert_eq!(analysis.fire_pixels, 80);
    let flagged: Vec<(u32, u32)> = analysis
        .fire_regions
        .iter()
        .map(|r| (r.grid_x, r.grid_y))
        .collect();
    assert_eq!(flagged, vec![(2, 3), (3, 3), (2, 4), (3, 4)]);
    assert_eq!(
        merge_regions(&analysis.fire_regions, MergePolicy::Envelope),
        vec![Rect::new(20, 30, 20, 20)]
    );

    let result = FireDetector::default().analyze_working(&working);
    assert_ne!(result.detection_type, DetectionType::Fire);
    // The light gray background is smoke-colored.
    assert_eq!(result.detection_type, DetectionType::Smoke);
}

#[tokio::test]
async fn featureless_dark_image_is_clean() {
    let detector = FireDetector::default();
    let result = detector
        .detect(png(RgbaImage::from_pixel(120, 80, DARK)))
        .await
        .unwrap();

    assert_eq!(result.detection_type, DetectionType::NoFire);
    assert!(!result.fire_detected);
    assert!(result.confidence >= 60);
    assert!(result.bounding_boxes.is_empty());
    assert_eq!(result.affected_area, "0%");
}

#[tokio::test]
async fn uniform_mid_gray_reads_as_smoke() {
    // r = g = b = 150 satisfies the gray-smoke predicate on every pixel.
    let detector = FireDetector::default();
    let result = detector
        .detect(png(RgbaImage::from_pixel(100, 100, Rgba([150, 150, 150, 255]))))
        .await
        .unwrap();

    assert_eq!(result.detection_type, DetectionType::Smoke);
    assert_eq!(result.confidence, 90);
    assert_eq!(result.bounding_boxes.len(), 1);
    assert_eq!(result.bounding_boxes[0].rect, Rect::new(0, 0, 100, 100));
}

#[tokio::test]
async fn image_quality_follows_source_width() {
    let detector = FireDetector::default();
    for (width, expected) in [
        (1200, ImageQuality::Excellent),
        (800, ImageQuality::Good),
        (300, ImageQuality::Fair),
    ] {
        let result = detector
            .detect(png(RgbaImage::from_pixel(width, 40, DARK)))
            .await
            .unwrap();
        assert_eq!(result.image_quality, expected, "width {width}");
    }
}

#[tokio::test]
async fn boxes_are_reported_in_source_coordinates() {
    // 1200x900 is analysed at 600x450; regions still use 120x90 source cells.
    let raster = RgbaImage::from_fn(1200, 900, |x, _| if x < 360 { BRIGHT_FIRE } else { DARK });
    let result = FireDetector::default().detect(png(raster)).await.unwrap();

    assert_eq!(result.detection_type, DetectionType::Fire);
    assert_eq!(result.bounding_boxes[0].rect, Rect::new(0, 0, 360, 900));
    assert_eq!(result.affected_area, "30% of image");
    assert_eq!(result.image_quality, ImageQuality::Excellent);
}

#[tokio::test]
async fn connected_components_split_disjoint_clusters() {
    // Cells (1,1)-(2,1) and (7,7) burn: 300 fire pixels, fire% = 3.
    let raster = RgbaImage::from_fn(100, 100, |x, y| {
        let cluster_a = (10..30).contains(&x) && (10..20).contains(&y);
        let cluster_b = (70..80).contains(&x) && (70..80).contains(&y);
        if cluster_a || cluster_b { BRIGHT_FIRE } else { DARK }
    });
    let bytes = png(raster);

    let envelope = FireDetector::default().detect(bytes.clone()).await.unwrap();
    assert_eq!(envelope.detection_type, DetectionType::Fire);
    assert_eq!(
        envelope.bounding_boxes.iter().map(|b| b.rect).collect::<Vec<_>>(),
        vec![Rect::new(10, 10, 70, 70)]
    );

    let mut config = DetectorConfig::default();
    config.grid.merge_policy = MergePolicy::ConnectedComponents;
    let split = FireDetector::new(config).detect(bytes).await.unwrap();
    assert_eq!(
        split.bounding_boxes.iter().map(|b| b.rect).collect::<Vec<_>>(),
        vec![Rect::new(10, 10, 20, 10), Rect::new(70, 70, 10, 10)]
    );
    assert_eq!(split.confidence, envelope.confidence);
}

#[tokio::test]
async fn jpeg_uploads_decode() {
    let raster = RgbaImage::from_fn(64, 64, |x, _| if x < 32 { BRIGHT_FIRE } else { DARK });
    let rgb = DynamicImage::ImageRgba8(raster).to_rgb8();
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
        .unwrap();

    let result = FireDetector::default()
        .detect_upload(bytes, Some("image/jpeg"))
        .await
        .unwrap();
    assert_eq!(result.detection_type, DetectionType::Fire);
}

#[tokio::test]
async fn garbage_and_oversized_uploads_are_refused() {
    let detector = FireDetector::default();
    assert!(matches!(
        detector.detect_upload(b"GIF? no.".to_vec(), None).await,
        Err(DetectionError::InvalidUpload(_))
    ));

    let mut config = DetectorConfig::default();
    config.upload.max_bytes = 16;
    let strict = FireDetector::new(config);
    let bytes = png(RgbaImage::from_pixel(50, 50, DARK));
    let size = bytes.len();
    assert_eq!(
        strict.detect_upload(bytes, Some("image/png")).await,
        Err(DetectionError::UploadTooLarge { size, limit: 16 })
    );
}
