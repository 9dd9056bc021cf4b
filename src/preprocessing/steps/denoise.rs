use crate::preprocessing::border::PaddedPlane;
use image::GrayImage;

/// Filter strength `h`; patch distances are scaled by `h^2`
pub const FILTER_STRENGTH: f32 = 10.0;
/// Side of the square patch compared between pixels
pub const TEMPLATE_WINDOW: usize = 7;
/// Side of the square area searched for similar patches
pub const SEARCH_WINDOW: usize = 21;

/// Patches weighted below this contribute nothing
const MIN_WEIGHT: f32 = 0.001;

/// Remove noise with non-local means
/// Unlike a median filter this averages pixels whose surrounding patches look
/// alike, so strokes survive while flat paper texture is smoothed
pub fn apply(lightness: &GrayImage) -> GrayImage {
    non_local_means(lightness, FILTER_STRENGTH, TEMPLATE_WINDOW, SEARCH_WINDOW)
}

/// Non-local means over a single 8-bit plane
///
/// For every offset in the search window the patch distance of each pixel is
/// the mean squared difference between the template around it and the
/// template around its displaced partner. Distances are computed for the whole
/// plane at once with separable running sums, so the cost per pixel is linear
/// in the search area rather than search area times template area.
fn non_local_means(
    src: &GrayImage,
    h: f32,
    template_window: usize,
    search_window: usize,
) -> GrayImage {
    let width = src.width() as usize;
    let height = src.height() as usize;
    let template_radius = template_window / 2;
    let search_radius = search_window / 2;
    let border = template_radius + search_radius;
    let padded = PaddedPlane::uniform(src, border);

    let area = template_window * template_window;
    let weights = weight_table(h);

    // Distances are needed for every pixel whose template touches the image
    let ext_width = width + 2 * template_radius;
    let ext_height = height + 2 * template_radius;

    let mut weight_sum = vec![0f32; width * height];
    let mut value_sum = vec![0f32; width * height];
    let mut diff = vec![0u32; ext_width * ext_height];
    let mut row_sums = vec![0u32; width * ext_height];
    let mut column_sums = vec![0u32; width];

    let radius = search_radius as isize;
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            // Squared differences on the extended grid; (search_radius, search_radius)
            // in padded space is the top-left of that grid
            for ey in 0..ext_height {
                let center = padded.row(search_radius, ey + search_radius, ext_width);
                let shifted = padded.row(
                    (search_radius as isize + dx) as usize,
                    (ey as isize + search_radius as isize + dy) as usize,
                    ext_width,
                );
                let out = &mut diff[ey * ext_width..(ey + 1) * ext_width];
                for ((d, &a), &b) in out.iter_mut().zip(center).zip(shifted) {
                    let delta = a as i32 - b as i32;
                    *d = (delta * delta) as u32;
                }
            }

            // Horizontal template sums
            for ey in 0..ext_height {
                let line = &diff[ey * ext_width..(ey + 1) * ext_width];
                let sums = &mut row_sums[ey * width..(ey + 1) * width];
                let mut running: u32 = line[..template_window].iter().sum();
                sums[0] = running;
                for x in 1..width {
                    running = running + line[x + template_window - 1] - line[x - 1];
                    sums[x] = running;
                }
            }

            // Vertical template sums, accumulated straight into the weighted average
            column_sums.fill(0);
            for ey in 0..template_window {
                for (acc, &v) in column_sums
                    .iter_mut()
                    .zip(&row_sums[ey * width..(ey + 1) * width])
                {
                    *acc += v;
                }
            }

            for y in 0..height {
                let partner_y = (y as isize + border as isize + dy) as usize;
                let partners = padded.row(
                    (border as isize + dx) as usize,
                    partner_y,
                    width,
                );

                for x in 0..width {
                    let mean_distance = (column_sums[x] as usize + area / 2) / area;
                    if let Some(&weight) = weights.get(mean_distance) {
                        let idx = y * width + x;
                        weight_sum[idx] += weight;
                        value_sum[idx] += weight * partners[x] as f32;
                    }
                }

                if y + 1 < height {
                    let leaving = &row_sums[y * width..(y + 1) * width];
                    let entering =
                        &row_sums[(y + template_window) * width..(y + template_window + 1) * width];
                    for ((acc, &out), &inc) in column_sums.iter_mut().zip(leaving).zip(entering) {
                        *acc = *acc + inc - out;
                    }
                }
            }
        }
    }

    let mut out = GrayImage::new(width as u32, height as u32);
    for ((pixel, &num), &den) in out.iter_mut().zip(&value_sum).zip(&weight_sum) {
        // The zero offset always matches itself with weight 1
        *pixel = (num / den).round().clamp(0.0, 255.0) as u8;
    }
    out
}

/// `exp(-d / h^2)` for integer mean distances until it drops below `MIN_WEIGHT`
fn weight_table(h: f32) -> Vec<f32> {
    let h2 = h * h;
    (0u32..)
        .map(|d| (-(d as f32) / h2).exp())
        .take_while(|&w| w >= MIN_WEIGHT)
        .collect()
}
