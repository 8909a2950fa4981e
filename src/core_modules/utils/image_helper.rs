pub mod image_helper {
    use crate::core_modules::region::{BoundingBox, DetectionClass};
    use image::{ImageEncoder, Rgba, RgbaImage};
    use imageproc::drawing::draw_hollow_rect_mut;
    use std::path::Path;

    const BOX_THICKNESS: i32 = 3;

    pub fn box_color(class: DetectionClass) -> Rgba<u8> {
        match class {
            DetectionClass::Fire => Rgba([239, 68, 68, 255]),
            DetectionClass::Smoke => Rgba([100, 116, 139, 255]),
        }
    }

    /// Outlines each box on the image, clipped to its bounds. Empty boxes are skipped.
    pub fn draw_boxes(image: &mut RgbaImage, boxes: &[BoundingBox]) {
        for bbox in boxes {
            let x0 = bbox.rect.x.min(image.width());
            let y0 = bbox.rect.y.min(image.height());
            let x1 = bbox.rect.right().min(image.width());
            let y1 = bbox.rect.bottom().min(image.height());
            if x1 <= x0 || y1 <= y0 {
                continue;
            }

            let color = box_color(bbox.class);
            for inset in 0..BOX_THICKNESS {
                let width = (x1 - x0) as i32 - 2 * inset;
                let height = (y1 - y0) as i32 - 2 * inset;
                if width <= 0 || height <= 0 {
                    break;
                }
                let rect = imageproc::rect::Rect::at(x0 as i32 + inset, y0 as i32 + inset)
                    .of_size(width as u32, height as u32);
                draw_hollow_rect_mut(image, rect, color);
            }
        }
    }

    pub fn save(path: impl AsRef<Path>, image: &RgbaImage) -> Result<(), image::error::ImageError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            image::ExtendedColorType::Rgba8,
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::image_helper::*;
    use crate::core_modules::region::{BoundingBox, DetectionClass, Rect};
    use image::{Rgba, RgbaImage};

    fn fire_box(x: u32, y: u32, width: u32, height: u32) -> BoundingBox {
        BoundingBox {
            class: DetectionClass::Fire,
            score: 80,
            rect: Rect::new(x, y, width, height),
        }
    }

    #[test]
    fn outlines_without_filling() {
        let mut image = RgbaImage::from_pixel(50, 50, Rgba([0, 0, 0, 255]));
        draw_boxes(&mut image, &[fire_box(10, 10, 20, 20)]);

        let red = box_color(DetectionClass::Fire);
        assert_eq!(*image.get_pixel(10, 10), red);
        assert_eq!(*image.get_pixel(29, 29), red);
        assert_eq!(*image.get_pixel(12, 20), red);
        assert_eq!(*image.get_pixel(20, 20), Rgba([0, 0, 0, 255]));
        assert_eq!(*image.get_pixel(9, 9), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn clips_and_skips_degenerate_boxes() {
        let mut image = RgbaImage::from_pixel(20, 20, Rgba([0, 0, 0, 255]));
        draw_boxes(
            &mut image,
            &[fire_box(15, 15, 100, 100), fire_box(5, 5, 0, 10), fire_box(40, 40, 5, 5)],
        );
        assert_eq!(*image.get_pixel(19, 19), box_color(DetectionClass::Fire));
        assert_eq!(*image.get_pixel(5, 8), Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn saves_annotated_png() {
        let mut image = RgbaImage::from_pixel(32, 32, Rgba([200, 200, 200, 255]));
        draw_boxes(&mut image, &[fire_box(4, 4, 16, 16)]);
        let path = std::env::temp_dir().join("ifire_vision_annotated_test.png");

        save(&path, &image).expect("Error Saving File.");
        let reloaded = image::open(&path).expect("Error Opening File.").to_rgba8();
        assert_eq!(reloaded, image);
        let _ = std::fs::remove_file(path);
    }
}
