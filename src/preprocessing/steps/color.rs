//! sRGB <-> CIE L*a*b* conversion on 8-bit planes
//!
//! Uses the common 8-bit Lab encoding: `L = L* * 255/100`, `a = a* + 128`,
//! `b = b* + 128`, with a D65 white point. Every 8-bit sRGB color lands inside
//! that range, so splitting never saturates.

use image::{GrayImage, Luma, Rgb, RgbImage};

/// D65 reference white (Y = 1)
const WHITE_X: f32 = 0.950456;
const WHITE_Z: f32 = 1.088754;

/// CIE epsilon (216/24389) and kappa (24389/27) as used by the 8-bit encoders
const EPSILON: f32 = 0.008856;
const KAPPA: f32 = 903.3;

/// Lightness and chroma planes of an image
///
/// All three planes must share the same dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct LabPlanes {
    pub lightness: GrayImage,
    pub a: GrayImage,
    pub b: GrayImage,
}

impl LabPlanes {
    pub fn dimensions(&self) -> (u32, u32) {
        self.lightness.dimensions()
    }
}

/// Convert an RGB buffer to Lab and split it into three planes
pub fn split(image: &RgbImage) -> LabPlanes {
    let to_linear = srgb_to_linear_table();
    let (width, height) = image.dimensions();

    let mut lightness = GrayImage::new(width, height);
    let mut a = GrayImage::new(width, height);
    let mut b = GrayImage::new(width, height);

    for (x, y, pixel) in image.enumerate_pixels() {
        let [l_val, a_val, b_val] = rgb_to_lab(pixel.0, &to_linear);
        lightness.put_pixel(x, y, Luma([l_val]));
        a.put_pixel(x, y, Luma([a_val]));
        b.put_pixel(x, y, Luma([b_val]));
    }

    LabPlanes { lightness, a, b }
}

/// Merge Lab planes back into an RGB buffer; out-of-gamut values are clipped
pub fn merge(planes: &LabPlanes) -> RgbImage {
    let (width, height) = planes.dimensions();
    debug_assert!(
        planes.a.dimensions() == (width, height) && planes.b.dimensions() == (width, height),
        "chroma planes do not match lightness {}x{}",
        width,
        height
    );

    RgbImage::from_fn(width, height, |x, y| {
        let lab = [
            planes.lightness.get_pixel(x, y).0[0],
            planes.a.get_pixel(x, y).0[0],
            planes.b.get_pixel(x, y).0[0],
        ];
        Rgb(lab_to_rgb(lab))
    })
}

fn rgb_to_lab(rgb: [u8; 3], to_linear: &[f32; 256]) -> [u8; 3] {
    let r = to_linear[rgb[0] as usize];
    let g = to_linear[rgb[1] as usize];
    let b = to_linear[rgb[2] as usize];

    let x = (0.412453 * r + 0.357580 * g + 0.180423 * b) / WHITE_X;
    let y = 0.212671 * r + 0.715160 * g + 0.072169 * b;
    let z = (0.019334 * r + 0.119193 * g + 0.950227 * b) / WHITE_Z;

    let fx = lab_f(x);
    let fy = lab_f(y);
    let fz = lab_f(z);

    let l_star = if y > EPSILON {
        116.0 * fy - 16.0
    } else {
        KAPPA * y
    };
    let a_star = 500.0 * (fx - fy);
    let b_star = 200.0 * (fy - fz);

    [
        saturate_u8(l_star * 255.0 / 100.0),
        saturate_u8(a_star + 128.0),
        saturate_u8(b_star + 128.0),
    ]
}

fn lab_to_rgb(lab: [u8; 3]) -> [u8; 3] {
    let l_star = lab[0] as f32 * 100.0 / 255.0;
    let a_star = lab[1] as f32 - 128.0;
    let b_star = lab[2] as f32 - 128.0;

    let fy = (l_star + 16.0) / 116.0;
    let fx = fy + a_star / 500.0;
    let fz = fy - b_star / 200.0;

    let y = if l_star > KAPPA * EPSILON {
        fy * fy * fy
    } else {
        l_star / KAPPA
    };
    let x = lab_f_inverse(fx) * WHITE_X;
    let z = lab_f_inverse(fz) * WHITE_Z;

    let r = 3.240479 * x - 1.537150 * y - 0.498535 * z;
    let g = -0.969256 * x + 1.875991 * y + 0.041556 * z;
    let b = 0.055648 * x - 0.204043 * y + 1.057311 * z;

    [
        saturate_u8(linear_to_srgb(r) * 255.0),
        saturate_u8(linear_to_srgb(g) * 255.0),
        saturate_u8(linear_to_srgb(b) * 255.0),
    ]
}

#[inline]
fn lab_f(t: f32) -> f32 {
    if t > EPSILON {
        t.cbrt()
    } else {
        7.787 * t + 16.0 / 116.0
    }
}

#[inline]
fn lab_f_inverse(f: f32) -> f32 {
    let cubed = f * f * f;
    if cubed > EPSILON {
        cubed
    } else {
        (f - 16.0 / 116.0) / 7.787
    }
}

fn srgb_to_linear_table() -> [f32; 256] {
    let mut table = [0.0f32; 256];
    for (i, entry) in table.iter_mut().enumerate() {
        let c = i as f32 / 255.0;
        *entry = if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        };
    }
    table
}

#[inline]
fn linear_to_srgb(c: f32) -> f32 {
    let c = c.clamp(0.0, 1.0);
    if c <= 0.0031308 {
        12.92 * c
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[inline]
fn saturate_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lab_of(rgb: [u8; 3]) -> [u8; 3] {
        rgb_to_lab(rgb, &srgb_to_linear_table())
    }

    #[test]
    fn test_white_and_black_reference_points() {
        assert_eq!(lab_of([255, 255, 255]), [255, 128, 128]);
        assert_eq!(lab_of([0, 0, 0]), [0, 128, 128]);
    }

    #[test]
    fn test_grays_have_neutral_chroma() {
        for v in (0..=255u8).step_by(5) {
            let [_, a, b] = lab_of([v, v, v]);
            assert_eq!((a, b), (128, 128), "gray {} should be neutral", v);
        }
    }

    #[test]
    fn test_lightness_is_monotonic_for_grays() {
        let mut previous = 0u8;
        for v in 0..=255u8 {
            let [l, _, _] = lab_of([v, v, v]);
            assert!(l >= previous, "L decreased at gray {}", v);
            previous = l;
        }
    }

    #[test]
    fn test_chroma_axes_point_the_right_way() {
        // Red sits on +a, green on -a, blue on -b, yellow on +b
        assert!(lab_of([255, 0, 0])[1] > 128);
        assert!(lab_of([0, 255, 0])[1] < 128);
        assert!(lab_of([0, 0, 255])[2] < 128);
        assert!(lab_of([255, 255, 0])[2] > 128);
    }

    #[test]
    fn test_gray_round_trip_is_close() {
        for v in 0..=255u8 {
            let back = lab_to_rgb(lab_of([v, v, v]));
            for channel in back {
                assert!(
                    (channel as i32 - v as i32).abs() <= 1,
                    "gray {} came back as {:?}",
                    v,
                    back
                );
            }
        }
    }

    #[test]
    fn test_color_round_trip_is_close() {
        // Channels near zero sit on the steep part of the sRGB curve where one
        // chroma step moves several output levels, so stay above it
        let levels = [102u8, 153, 204, 255];
        for &r in &levels {
            for &g in &levels {
                for &b in &levels {
                    let back = lab_to_rgb(lab_of([r, g, b]));
                    for (orig, got) in [r, g, b].iter().zip(back.iter()) {
                        assert!(
                            (*orig as i32 - *got as i32).abs() <= 4,
                            "{:?} came back as {:?}",
                            [r, g, b],
                            back
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_split_and_merge_preserve_dimensions() {
        let img = RgbImage::from_fn(17, 9, |x, y| Rgb([x as u8 * 10, y as u8 * 20, 90]));

        let planes = split(&img);
        assert_eq!(planes.lightness.dimensions(), (17, 9));
        assert_eq!(planes.a.dimensions(), (17, 9));
        assert_eq!(planes.b.dimensions(), (17, 9));

        let merged = merge(&planes);
        assert_eq!(merged.dimensions(), (17, 9));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "chroma planes do not match")]
    fn test_merge_rejects_mismatched_planes() {
        let mut planes = split(&RgbImage::from_pixel(6, 4, Rgb([50, 60, 70])));
        planes.a = GrayImage::new(3, 4);

        merge(&planes);
    }
}
