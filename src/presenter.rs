use std::time::Duration;

use crate::{
    art::{ArtImage, ImageSource, TrackRef},
    config::PresenterConfig,
    palette::{Palette, PaletteExtractor, PaletteSeed},
    render::{Direction, RenderTarget, TransitionPair},
    spin::Turntable,
};

#[derive(Debug, Clone)]
struct PendingAdvance {
    track: TrackRef,
    direction: Direction,
    update_palette: bool,
}

/// Coordinates artwork lookups, fallback images, slide transitions and the
/// turntable spin for a track-change display.
///
/// All methods are meant to be called from one logical UI thread. The
/// collaborators are injected: the source supplies (or fails to supply)
/// artwork, the extractor turns artwork into a 4-colour palette and the
/// target shows double-buffered images with per-buffer rotation.
pub struct AlbumArtPresenter<S, P, R> {
    source: S,
    extractor: P,
    target: R,
    seed: PaletteSeed,
    palette: Palette,
    turntable: Turntable,
    art_size: u32,
    pending: Option<PendingAdvance>,
}

impl<S, P, R> AlbumArtPresenter<S, P, R>
where
    S: ImageSource,
    P: PaletteExtractor,
    R: RenderTarget,
{
    pub fn new(target: R, extractor: P, source: S, config: &PresenterConfig) -> Self {
        let seed = config.seed();
        Self {
            source,
            extractor,
            target,
            seed,
            palette: Palette::from_seed(&seed),
            turntable: Turntable::with_period(config.turn_secs()),
            art_size: config.art_size(),
            pending: None,
        }
    }

    /// Switches the display to `track` and returns the palette callers use
    /// to recolour the surrounding chrome.
    ///
    /// The spin is halted and the incoming buffer starts at angle 0; the
    /// outgoing buffer keeps its angle so its exit animation does not jump.
    /// If the spin was running it is re-armed on the new buffer. A source
    /// miss degrades to the default image and, failing that, to a
    /// synthesized disc, so the view is never left blank. The palette is
    /// only recomputed when `update_palette` is set and real artwork was
    /// found.
    pub fn advance(
        &mut self,
        track: &TrackRef,
        direction: Direction,
        update_palette: bool,
    ) -> Palette {
        let transitions = TransitionPair::for_direction(direction);
        let was_spinning = self.turntable.is_spinning();
        self.turntable.halt();
        self.target.set_incoming_angle(0.0);

        let art = self.fetch_art(track);
        if update_palette && art.is_real_art() {
            self.palette = self.extractor.extract(&art.image, &self.seed);
        }
        self.target.show_incoming(art, transitions);

        if was_spinning {
            self.turntable.set_spinning(true);
            self.target.set_current_angle(self.turntable.angle());
        }

        self.pending = Some(PendingAdvance {
            track: track.clone(),
            direction,
            update_palette,
        });

        self.palette
    }

    fn fetch_art(&mut self, track: &TrackRef) -> ArtImage {
        if let Some(art) = self.source.get(track, self.art_size) {
            return art;
        }

        match self.source.default_image(self.art_size) {
            Ok(art) => art,
            Err(err) => {
                tracing::warn!(
                    track = %track,
                    error = %err,
                    "no default artwork, showing synthesized disc"
                );
                self.source.synthesize_fallback(self.art_size)
            }
        }
    }

    /// Starts, resumes or pauses the spin. Idempotent in both directions;
    /// pausing retains the angle and resuming continues from it.
    pub fn set_spinning(&mut self, on: bool) {
        let was_spinning = self.turntable.is_spinning();
        self.turntable.set_spinning(on);
        if self.turntable.is_spinning() && !was_spinning {
            self.target.set_current_angle(self.turntable.angle());
        }
    }

    pub fn is_spinning(&self) -> bool {
        self.turntable.is_spinning()
    }

    pub fn angle(&self) -> f32 {
        self.turntable.angle()
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Frame advance for the spin. Call once per frame with the elapsed
    /// time; a no-op unless the spin is running.
    pub fn tick(&mut self, dt: Duration) {
        if !self.turntable.is_spinning() {
            return;
        }
        self.turntable.tick(dt);
        self.target.set_current_angle(self.turntable.angle());
    }

    /// Applies asynchronously completed artwork.
    ///
    /// When the source reports a completion for the most recent `advance`
    /// target, the display path is re-run with the remembered direction and
    /// palette flag and the fresh palette is returned. Completions for any
    /// other track are stale and ignored.
    pub fn pump(&mut self) -> Option<Palette> {
        let completed = self.source.poll()?;
        let pending = self.pending.clone()?;
        if completed != pending.track {
            return None;
        }
        Some(self.advance(&pending.track, pending.direction, pending.update_palette))
    }

    pub fn target(&self) -> &R {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut R {
        &mut self.target
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }
}
