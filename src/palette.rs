use std::cmp::Reverse;

use eframe::egui::{Color32, ColorImage};

/// Default colours the extraction is seeded with. Resolved once by the
/// caller at construction, outside this component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteSeed {
    pub background: Color32,
    pub accent: Color32,
}

impl Default for PaletteSeed {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(0x40, 0x40, 0x40),
            accent: Color32::from_rgb(0x40, 0x40, 0x40),
        }
    }
}

/// Four representative colours ordered background, text, background, text.
///
/// Long-lived: the presenter owns one for its entire lifetime and mutates it
/// in place when a transition asks for recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    colors: [Color32; 4],
}

impl Palette {
    pub fn new(background: Color32, text: Color32, alt_background: Color32, alt_text: Color32) -> Self {
        Self {
            colors: [background, text, alt_background, alt_text],
        }
    }

    pub fn from_seed(seed: &PaletteSeed) -> Self {
        Self::new(seed.background, seed.accent, seed.background, seed.accent)
    }

    pub fn background(&self) -> Color32 {
        self.colors[0]
    }

    pub fn text(&self) -> Color32 {
        self.colors[1]
    }

    pub fn alt_background(&self) -> Color32 {
        self.colors[2]
    }

    pub fn alt_text(&self) -> Color32 {
        self.colors[3]
    }

    pub fn as_array(&self) -> [Color32; 4] {
        self.colors
    }
}

/// Derives a [`Palette`] from artwork. Contractually infallible: unreadable
/// images yield the seeded defaults.
pub trait PaletteExtractor {
    fn extract(&self, image: &ColorImage, seed: &PaletteSeed) -> Palette;
}

/// K-means based extractor: samples opaque pixels, clusters them, keeps the
/// dominant visually distinct centroids and orders each pair by luminance so
/// the darker colour backs the lighter text colour.
#[derive(Debug, Clone)]
pub struct KmeansExtractor {
    pub max_samples: usize,
    pub clusters: usize,
    pub max_iterations: usize,
    /// How far extracted colours are pulled toward the seed, 0 keeps them
    /// untouched.
    pub seed_bias: f32,
}

impl Default for KmeansExtractor {
    fn default() -> Self {
        Self {
            max_samples: 6_000,
            clusters: 3,
            max_iterations: 10,
            seed_bias: 0.2,
        }
    }
}

const DISTINCT_THRESHOLD: f32 = 400.0;

impl PaletteExtractor for KmeansExtractor {
    fn extract(&self, image: &ColorImage, seed: &PaletteSeed) -> Palette {
        let samples = sample_pixels(image, self.max_samples);
        if samples.len() < 2 {
            return Palette::from_seed(seed);
        }

        let k = self.clusters.min(samples.len()).max(1);
        let mut clusters = kmeans_clusters(&samples, k, self.max_iterations);
        if clusters.is_empty() {
            return Palette::from_seed(seed);
        }

        clusters.sort_by_key(|cluster| Reverse(cluster.count));

        let mut distinct = Vec::new();
        for cluster in clusters {
            if cluster.count == 0 {
                continue;
            }
            let color = color_from_centroid(cluster.centroid);
            if distinct
                .iter()
                .all(|&existing| color_distance_sq(existing, color) > DISTINCT_THRESHOLD)
            {
                distinct.push(color);
            }
        }

        if distinct.len() < 2 {
            return Palette::from_seed(seed);
        }

        let (dark, light) = order_by_luminance(distinct[0], distinct[1]);
        let background = blend(dark, seed.background, self.seed_bias);
        let text = blend(light, seed.accent, self.seed_bias);

        let (alt_background, alt_text) = match distinct.get(2) {
            Some(&third) => {
                let (alt_dark, alt_light) = order_by_luminance(third, light);
                (
                    blend(alt_dark, seed.background, self.seed_bias),
                    blend(alt_light, seed.accent, self.seed_bias),
                )
            }
            None => (background, text),
        };

        Palette::new(background, text, alt_background, alt_text)
    }
}

#[derive(Clone, Copy)]
struct Cluster {
    centroid: [f32; 3],
    count: usize,
}

fn sample_pixels(image: &ColorImage, max_samples: usize) -> Vec<[f32; 3]> {
    if max_samples == 0 || image.pixels.is_empty() {
        return Vec::new();
    }

    let step = (image.pixels.len() / max_samples).max(1);
    let mut samples = Vec::with_capacity(max_samples.min(image.pixels.len()));

    for pixel in image.pixels.iter().step_by(step) {
        // Skip near-transparent pixels so letterboxed art does not skew
        // toward the matte colour.
        if pixel.a() < 16 {
            continue;
        }
        samples.push([pixel.r() as f32, pixel.g() as f32, pixel.b() as f32]);
        if samples.len() >= max_samples {
            break;
        }
    }

    samples
}

fn squared_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dr = a[0] - b[0];
    let dg = a[1] - b[1];
    let db = a[2] - b[2];
    dr * dr + dg * dg + db * db
}

fn kmeans_clusters(samples: &[[f32; 3]], k: usize, max_iterations: usize) -> Vec<Cluster> {
    if samples.is_empty() || k == 0 {
        return Vec::new();
    }

    let mut centroids: Vec<[f32; 3]> = (0..k)
        .map(|i| samples[((i * samples.len()) / k).min(samples.len() - 1)])
        .collect();
    let mut assignments = vec![0usize; samples.len()];

    for iteration in 0..max_iterations {
        let mut sums = vec![[0f32; 3]; k];
        let mut counts = vec![0usize; k];

        for (sample_idx, sample) in samples.iter().enumerate() {
            let mut best = 0usize;
            let mut best_dist = f32::MAX;
            for (centroid_idx, centroid) in centroids.iter().enumerate() {
                let dist = squared_distance(sample, centroid);
                if dist < best_dist {
                    best_dist = dist;
                    best = centroid_idx;
                }
            }

            assignments[sample_idx] = best;
            for channel in 0..3 {
                sums[best][channel] += sample[channel];
            }
            counts[best] += 1;
        }

        let mut changed = false;
        for i in 0..k {
            if counts[i] == 0 {
                // Re-seed an empty cluster with a different sample.
                centroids[i] = samples[(i + iteration) % samples.len()];
                changed = true;
                continue;
            }
            let updated = [
                sums[i][0] / counts[i] as f32,
                sums[i][1] / counts[i] as f32,
                sums[i][2] / counts[i] as f32,
            ];
            if squared_distance(&centroids[i], &updated) > 1e-2 {
                changed = true;
            }
            centroids[i] = updated;
        }

        if !changed {
            break;
        }
    }

    let mut counts = vec![0usize; k];
    for &assignment in &assignments {
        counts[assignment] += 1;
    }

    centroids
        .into_iter()
        .enumerate()
        .map(|(idx, centroid)| Cluster {
            centroid,
            count: counts[idx],
        })
        .collect()
}

fn color_from_centroid(centroid: [f32; 3]) -> Color32 {
    let r = centroid[0].clamp(0.0, 255.0).round() as u8;
    let g = centroid[1].clamp(0.0, 255.0).round() as u8;
    let b = centroid[2].clamp(0.0, 255.0).round() as u8;
    Color32::from_rgb(r, g, b)
}

fn color_distance_sq(a: Color32, b: Color32) -> f32 {
    let dr = a.r() as f32 - b.r() as f32;
    let dg = a.g() as f32 - b.g() as f32;
    let db = a.b() as f32 - b.b() as f32;
    dr * dr + dg * dg + db * db
}

fn luminance(color: Color32) -> f32 {
    0.2126 * color.r() as f32 + 0.7152 * color.g() as f32 + 0.0722 * color.b() as f32
}

fn order_by_luminance(a: Color32, b: Color32) -> (Color32, Color32) {
    if luminance(a) <= luminance(b) {
        (a, b)
    } else {
        (b, a)
    }
}

fn blend(color: Color32, toward: Color32, t: f32) -> Color32 {
    let t = t.clamp(0.0, 1.0);
    let inv = 1.0 - t;
    let mix = |a: u8, b: u8| (a as f32 * inv + b as f32 * t).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgb(
        mix(color.r(), toward.r()),
        mix(color.g(), toward.g()),
        mix(color.b(), toward.b()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_tone_image(size: usize, left: Color32, right: Color32) -> ColorImage {
        let mut pixels = Vec::with_capacity(size * size);
        for _row in 0..size {
            for x in 0..size {
                pixels.push(if x < size / 2 { left } else { right });
            }
        }
        ColorImage::new([size, size], pixels)
    }

    #[test]
    fn unreadable_image_yields_seed_defaults() {
        let extractor = KmeansExtractor::default();
        let seed = PaletteSeed::default();
        let empty = ColorImage::new([0, 0], Vec::new());
        assert_eq!(extractor.extract(&empty, &seed), Palette::from_seed(&seed));
    }

    #[test]
    fn uniform_image_yields_seed_defaults() {
        let extractor = KmeansExtractor::default();
        let seed = PaletteSeed::default();
        let flat = ColorImage::new([32, 32], vec![Color32::from_rgb(10, 20, 30); 32 * 32]);
        assert_eq!(extractor.extract(&flat, &seed), Palette::from_seed(&seed));
    }

    #[test]
    fn two_tone_image_orders_darker_colour_as_background() {
        let extractor = KmeansExtractor::default();
        let seed = PaletteSeed::default();
        let image = two_tone_image(
            64,
            Color32::from_rgb(200, 200, 200),
            Color32::from_rgb(20, 20, 20),
        );
        let palette = extractor.extract(&image, &seed);
        assert_ne!(palette, Palette::from_seed(&seed));
        assert!(luminance(palette.background()) < luminance(palette.text()));
    }

    #[test]
    fn extraction_is_deterministic() {
        let extractor = KmeansExtractor::default();
        let seed = PaletteSeed::default();
        let image = two_tone_image(
            48,
            Color32::from_rgb(180, 40, 40),
            Color32::from_rgb(30, 30, 120),
        );
        assert_eq!(
            extractor.extract(&image, &seed),
            extractor.extract(&image, &seed)
        );
    }

    #[test]
    fn transparent_pixels_are_ignored() {
        let extractor = KmeansExtractor::default();
        let seed = PaletteSeed::default();
        let transparent = ColorImage::new([16, 16], vec![Color32::TRANSPARENT; 256]);
        assert_eq!(
            extractor.extract(&transparent, &seed),
            Palette::from_seed(&seed)
        );
    }
}
