// THEORY (single-pixel fire/smoke heuristics):
// The classifier is a pure function of one pixel's (r, g, b). It carries no state
// and reads no neighbours, so the same color always lands in the same class.
//
// Fire is any of four warm color families:
//   reddish     r > 150, r > 1.3g, r > 1.5b
//   orangish    r > 180, 80 < g < 180, b < 100
//   yellowish   r > 200, g > 150, b < 100
//   bright fire r > 220, 100 < g < 200, b < 80
//
// Smoke is a low-spread gray/white/bluish pixel inside a brightness band
// (80, 250). Bright bluish pixels are treated as sky and excluded from the gray
// and white families only; dense and bluish smoke ignore the sky test.
//
// All comparisons are strict unless written otherwise. The tuning is coupled to
// the working resolution chosen by `PixelSampler`.

use crate::core_modules::pixel::pixel::Pixel;

/// The outcome of classifying a single pixel. Both flags may be set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PixelClass {
    pub is_fire: bool,
    pub is_smoke: bool,
}

pub fn classify(pixel: &Pixel) -> PixelClass {
    PixelClass {
        is_fire: is_fire(pixel),
        is_smoke: is_smoke(pixel),
    }
}

pub fn is_fire(pixel: &Pixel) -> bool {
    is_reddish(pixel) || is_orangish(pixel) || is_yellowish(pixel) || is_bright_fire(pixel)
}

pub fn is_smoke(pixel: &Pixel) -> bool {
    let brightness = pixel.brightness();
    let in_band = brightness < 250.0 && brightness > 80.0;
    in_band
        && (is_gray_smoke(pixel)
            || is_white_smoke(pixel)
            || is_dense_smoke(pixel)
            || is_bluish_smoke(pixel))
}

pub fn is_reddish(p: &Pixel) -> bool {
    let (r, g, b) = (p.red as f64, p.green as f64, p.blue as f64);
    r > 150.0 && r > g * 1.3 && r > b * 1.5
}

pub fn is_orangish(p: &Pixel) -> bool {
    p.red > 180 && p.green > 80 && p.green < 180 && p.blue < 100
}

pub fn is_yellowish(p: &Pixel) -> bool {
    p.red > 200 && p.green > 150 && p.blue < 100
}

pub fn is_bright_fire(p: &Pixel) -> bool {
    p.red > 220 && p.green > 100 && p.green < 200 && p.blue < 80
}

/// Very bright pixels, and bright pixels dominated by blue, are assumed to be sky.
pub fn is_not_sky(p: &Pixel) -> bool {
    let brightness = p.brightness();
    let blue_dominant = p.blue > p.red && p.blue > p.green;
    brightness < 240.0 && !(brightness > 200.0 && blue_dominant)
}

pub fn is_gray_smoke(p: &Pixel) -> bool {
    let brightness = p.brightness();
    brightness > 120.0 && brightness < 220.0 && p.color_diff() < 40 && is_not_sky(p)
}

pub fn is_white_smoke(p: &Pixel) -> bool {
    let brightness = p.brightness();
    brightness > 180.0 && brightness < 245.0 && p.color_diff() < 50 && is_not_sky(p)
}

pub fn is_dense_smoke(p: &Pixel) -> bool {
    let brightness = p.brightness();
    brightness > 100.0 && brightness < 180.0 && p.color_diff() < 35
}

pub fn is_bluish_smoke(p: &Pixel) -> bool {
    let brightness = p.brightness();
    let (r, g, b) = p.signed();
    brightness > 130.0 && brightness < 200.0 && b >= r - 20 && b >= g - 20 && p.color_diff() < 45
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_families_are_fire() {
        assert!(is_reddish(&Pixel::rgb(200, 100, 80)));
        assert!(is_orangish(&Pixel::rgb(190, 120, 60)));
        assert!(is_yellowish(&Pixel::rgb(240, 210, 40)));
        assert!(is_bright_fire(&Pixel::rgb(230, 150, 50)));
        assert!(is_fire(&Pixel::rgb(230, 150, 50)));
    }

    #[test]
    fn thresholds_are_strict() {
        // r == 150 is not reddish even with no green or blue.
        assert!(!is_reddish(&Pixel::rgb(150, 0, 0)));
        assert!(is_reddish(&Pixel::rgb(151, 0, 0)));
        // r must exceed 1.3g strictly: 1.3 * 130 = 169.
        assert!(!is_reddish(&Pixel::rgb(169, 130, 0)));
        assert!(!is_orangish(&Pixel::rgb(190, 80, 50)));
        assert!(!is_orangish(&Pixel::rgb(190, 180, 50)));
        assert!(!is_bright_fire(&Pixel::rgb(230, 150, 80)));
    }

    #[test]
    fn neutral_and_cool_colors_are_not_fire() {
        for pixel in [
            Pixel::rgb(200, 200, 200),
            Pixel::rgb(150, 150, 150),
            Pixel::rgb(40, 90, 200),
            Pixel::rgb(30, 160, 40),
            Pixel::rgb(0, 0, 0),
            Pixel::rgb(255, 255, 255),
        ] {
            assert!(!is_fire(&pixel), "{pixel:?} classified as fire");
        }
    }

    #[test]
    fn grays_inside_the_band_are_smoke() {
        assert!(is_smoke(&Pixel::rgb(150, 150, 150)));
        assert!(is_smoke(&Pixel::rgb(200, 200, 200)));
        assert!(is_smoke(&Pixel::rgb(110, 110, 110)));
    }

    #[test]
    fn brightness_band_excludes_dark_and_glare() {
        assert!(!is_smoke(&Pixel::rgb(80, 80, 80)));
        assert!(!is_smoke(&Pixel::rgb(30, 30, 30)));
        assert!(!is_smoke(&Pixel::rgb(252, 252, 252)));
    }

    #[test]
    fn bright_blue_sky_is_not_smoke() {
        let sky = Pixel::rgb(190, 210, 250);
        assert!(!is_not_sky(&sky));
        assert!(!is_gray_smoke(&sky));
        assert!(!is_white_smoke(&sky));
        assert!(!is_smoke(&sky));
    }

    #[test]
    fn bluish_haze_is_smoke() {
        let haze = Pixel::rgb(140, 150, 170);
        assert!(is_bluish_smoke(&haze));
        assert!(is_smoke(&haze));
    }

    #[test]
    fn warm_grays_split_on_channel_spread() {
        // Reddish by ratio, but the spread is far too wide for any smoke family.
        let pixel = Pixel::rgb(160, 120, 100);
        assert!(is_reddish(&pixel));
        assert!(!is_smoke(&pixel));
        let pale = Pixel::rgb(170, 140, 140);
        assert_eq!(
            classify(&pale),
            PixelClass {
                is_fire: false,
                is_smoke: true
            }
        );
    }

    #[test]
    fn classification_is_deterministic() {
        for r in (0..=255u8).step_by(17) {
            for g in (0..=255u8).step_by(17) {
                for b in (0..=255u8).step_by(17) {
                    let pixel = Pixel::rgb(r, g, b);
                    assert_eq!(classify(&pixel), classify(&pixel));
                    assert_eq!(classify(&pixel), classify(&Pixel::new(r, g, b, 0)));
                }
            }
        }
    }
}
