use std::{
    collections::hash_map::DefaultHasher,
    collections::HashMap,
    fmt,
    fs,
    hash::{Hash, Hasher},
    path::{Path, PathBuf},
    sync::Arc,
};

use eframe::egui::{Color32, ColorImage};

use crate::error::{ArtError, Result};

/// Lookup key for the track whose artwork is displayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TrackRef {
    pub title: String,
    pub artist: String,
    pub album: String,
}

impl TrackRef {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        album: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            album: album.into(),
        }
    }

    /// Builds a track from a cover file stem, splitting `Artist - Title` when
    /// the separator is present.
    pub fn from_file_stem(stem: &str) -> Self {
        match stem.split_once(" - ") {
            Some((artist, title)) => Self::new(title.trim(), artist.trim(), ""),
            None => Self::new(stem.trim(), "", ""),
        }
    }
}

impl fmt::Display for TrackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.artist.is_empty() {
            write!(f, "{}", self.title)
        } else {
            write!(f, "{} - {}", self.artist, self.title)
        }
    }
}

/// Where a displayed image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provenance {
    /// Served from the source's in-memory cache.
    Cache,
    /// Freshly decoded by the source.
    Produced,
    /// The source-level default image.
    Placeholder,
    /// Drawn at runtime because even the default was unavailable.
    Synthesized,
}

/// Decoded artwork handed from an [`ImageSource`] to the presenter.
///
/// Transient: one per transition, not retained past the display cycle.
#[derive(Clone)]
pub struct ArtImage {
    pub image: ColorImage,
    pub provenance: Provenance,
    /// Hash of the encoded bytes when known. Lets the render side skip
    /// re-uploading artwork that is identical to what is already shown.
    pub source_hash: Option<u64>,
}

impl ArtImage {
    pub fn new(image: ColorImage, provenance: Provenance) -> Self {
        Self {
            image,
            provenance,
            source_hash: None,
        }
    }

    pub fn with_hash(mut self, hash: u64) -> Self {
        self.source_hash = Some(hash);
        self
    }

    pub fn size(&self) -> [usize; 2] {
        self.image.size
    }

    /// True when the image is real album art rather than a stand-in.
    pub fn is_real_art(&self) -> bool {
        matches!(self.provenance, Provenance::Cache | Provenance::Produced)
    }
}

impl fmt::Debug for ArtImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtImage")
            .field("size", &self.image.size)
            .field("provenance", &self.provenance)
            .field("source_hash", &self.source_hash)
            .finish()
    }
}

/// Provider of artwork for the presenter.
///
/// `get` may block briefly (cache hit, local decode). Slow providers should
/// be wrapped in [`crate::fetch::AsyncArtSource`], which answers from a
/// background worker and reports completions through `poll`.
pub trait ImageSource {
    /// Artwork for `track` scaled to fit `size`, or `None` on a miss.
    fn get(&mut self, track: &TrackRef, size: u32) -> Option<ArtImage>;

    /// The source-level default image. May fail.
    fn default_image(&mut self, size: u32) -> Result<ArtImage>;

    /// Best-effort stand-in drawn at runtime. Must not fail.
    fn synthesize_fallback(&self, size: u32) -> ArtImage;

    /// For asynchronous sources: the track whose artwork became ready since
    /// the last call. Synchronous sources keep the default.
    fn poll(&mut self) -> Option<TrackRef> {
        None
    }
}

pub fn hash_art_bytes(data: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

/// Decodes encoded artwork bytes into an RGBA image.
pub fn decode_art_bytes(bytes: &[u8]) -> Result<ColorImage> {
    let decoded = image::load_from_memory(bytes).map_err(|e| ArtError::Decode(e.to_string()))?;
    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let pixels = rgba.into_raw();
    Ok(ColorImage::from_rgba_unmultiplied(size, &pixels))
}

/// Procedurally drawn record disc used when no artwork of any kind exists.
pub fn synthesized_disc(size: u32, base: Color32) -> ColorImage {
    let side = size.clamp(16, 2048) as usize;
    let mut out = ColorImage::new([side, side], vec![Color32::TRANSPARENT; side * side]);
    let radius = side as f32 / 2.0;
    let inv_radius = 1.0 / radius;
    let hole_ratio = 0.045;
    let label_ratio = 0.32;

    for y in 0..side {
        for x in 0..side {
            let dx = (x as f32 + 0.5 - radius) * inv_radius;
            let dy = (y as f32 + 0.5 - radius) * inv_radius;
            let r = (dx * dx + dy * dy).sqrt();
            if r >= 1.0 {
                continue;
            }

            let mut color = if r <= hole_ratio {
                Color32::from_rgb(24, 24, 24)
            } else if r <= label_ratio {
                lighten(base, 0.18 * (1.0 - r / label_ratio))
            } else {
                let groove = ((r - label_ratio) * 60.0).sin().abs();
                darken(base, 0.10 + 0.12 * groove)
            };

            if r > 0.9 {
                color = darken(color, ((r - 0.9) * 3.0).min(1.0));
            }

            out.pixels[y * side + x] = color;
        }
    }

    out
}

fn darken(color: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let scale = |c: u8| (c as f32 * (1.0 - amount)).round().clamp(0.0, 255.0) as u8;
    Color32::from_rgba_unmultiplied(scale(color.r()), scale(color.g()), scale(color.b()), color.a())
}

fn lighten(color: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let scale = |c: u8| {
        (c as f32 + (255.0 - c as f32) * amount)
            .round()
            .clamp(0.0, 255.0) as u8
    };
    Color32::from_rgba_unmultiplied(scale(color.r()), scale(color.g()), scale(color.b()), color.a())
}

const COVER_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "bmp"];

/// Artwork source backed by a directory of cover files.
///
/// Files are matched by stem (`Artist - Title`, `Title` or the album name)
/// and decoded results are kept in an in-memory cache keyed by path and
/// requested size.
pub struct DirArtSource {
    root: PathBuf,
    cache: HashMap<(PathBuf, u32), (Arc<ColorImage>, u64)>,
    fallback_tint: Color32,
}

impl DirArtSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            cache: HashMap::new(),
            fallback_tint: Color32::from_rgb(0x40, 0x40, 0x40),
        }
    }

    pub fn with_fallback_tint(mut self, tint: Color32) -> Self {
        self.fallback_tint = tint;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All tracks derivable from cover files in the directory, sorted by
    /// title.
    pub fn tracks(&self) -> Result<Vec<TrackRef>> {
        let mut tracks = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if !is_cover_file(&path) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if stem.eq_ignore_ascii_case("default") {
                    continue;
                }
                tracks.push(TrackRef::from_file_stem(stem));
            }
        }
        tracks.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(tracks)
    }

    fn find_cover(&self, track: &TrackRef) -> Option<PathBuf> {
        let mut stems = Vec::new();
        if !track.artist.is_empty() {
            stems.push(format!("{} - {}", track.artist, track.title));
        }
        if !track.title.is_empty() {
            stems.push(track.title.clone());
        }
        if !track.album.is_empty() {
            stems.push(track.album.clone());
        }

        for stem in stems {
            for ext in COVER_EXTENSIONS {
                let path = self.root.join(format!("{stem}.{ext}"));
                if path.is_file() {
                    return Some(path);
                }
            }
        }
        None
    }

    fn load_scaled(&mut self, path: &Path, size: u32) -> Result<(Arc<ColorImage>, u64, bool)> {
        let key = (path.to_path_buf(), size);
        if let Some((image, hash)) = self.cache.get(&key) {
            return Ok((image.clone(), *hash, true));
        }

        let bytes = fs::read(path)?;
        let hash = hash_art_bytes(&bytes);
        let decoded =
            image::load_from_memory(&bytes).map_err(|e| ArtError::Decode(e.to_string()))?;
        let scaled = decoded.thumbnail(size, size).to_rgba8();
        let dims = [scaled.width() as usize, scaled.height() as usize];
        let image = Arc::new(ColorImage::from_rgba_unmultiplied(dims, &scaled.into_raw()));
        self.cache.insert(key, (image.clone(), hash));
        Ok((image, hash, false))
    }

    fn load_cover(&mut self, track: &TrackRef, size: u32) -> Result<ArtImage> {
        let path = self.find_cover(track).ok_or(ArtError::ImageUnavailable)?;
        let (image, hash, from_cache) = self.load_scaled(&path, size)?;
        let provenance = if from_cache {
            Provenance::Cache
        } else {
            Provenance::Produced
        };
        Ok(ArtImage::new((*image).clone(), provenance).with_hash(hash))
    }
}

impl ImageSource for DirArtSource {
    fn get(&mut self, track: &TrackRef, size: u32) -> Option<ArtImage> {
        match self.load_cover(track, size) {
            Ok(art) => Some(art),
            Err(ArtError::ImageUnavailable) => None,
            Err(err) => {
                tracing::debug!(track = %track, error = %err, "cover file could not be loaded");
                None
            }
        }
    }

    fn default_image(&mut self, size: u32) -> Result<ArtImage> {
        for ext in COVER_EXTENSIONS {
            let path = self.root.join(format!("default.{ext}"));
            if path.is_file() {
                let (image, hash, _) = self.load_scaled(&path, size)?;
                return Ok(ArtImage::new((*image).clone(), Provenance::Placeholder).with_hash(hash));
            }
        }
        Err(ArtError::PlaceholderUnavailable)
    }

    fn synthesize_fallback(&self, size: u32) -> ArtImage {
        ArtImage::new(
            synthesized_disc(size, self.fallback_tint),
            Provenance::Synthesized,
        )
    }
}

fn is_cover_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .map(|ext| {
                COVER_EXTENSIONS
                    .iter()
                    .any(|known| known.eq_ignore_ascii_case(ext))
            })
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn track_from_stem_splits_artist_and_title() {
        let track = TrackRef::from_file_stem("Miles Davis - So What");
        assert_eq!(track.artist, "Miles Davis");
        assert_eq!(track.title, "So What");

        let bare = TrackRef::from_file_stem("Untitled");
        assert_eq!(bare.title, "Untitled");
        assert!(bare.artist.is_empty());
    }

    #[test]
    fn synthesized_disc_is_square_and_never_blank() {
        let disc = synthesized_disc(128, Color32::from_rgb(64, 64, 64));
        assert_eq!(disc.size, [128, 128]);
        assert!(disc.pixels.iter().any(|p| p.a() > 0));
        // Corners stay transparent, the disc is round.
        assert_eq!(disc.pixels[0], Color32::TRANSPARENT);
    }

    #[test]
    fn synthesized_disc_clamps_tiny_sizes() {
        let disc = synthesized_disc(1, Color32::WHITE);
        assert_eq!(disc.size, [16, 16]);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = decode_art_bytes(&[0, 1, 2, 3]).unwrap_err();
        assert!(matches!(err, ArtError::Decode(_)));
    }

    #[test]
    fn hashing_is_stable() {
        assert_eq!(hash_art_bytes(b"abc"), hash_art_bytes(b"abc"));
        assert_ne!(hash_art_bytes(b"abc"), hash_art_bytes(b"abd"));
    }
}
