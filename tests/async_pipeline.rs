use std::thread;
use std::time::{Duration, Instant};

use album_art_view::{
    AlbumArtPresenter, ArtError, ArtImage, AsyncArtSource, Direction, ImageSource,
    KmeansExtractor, Palette, PresenterConfig, Provenance, RenderTarget, TrackRef, TransitionPair,
};
use eframe::egui::{Color32, ColorImage};

/// Source slow enough that retrieval never completes within the advance
/// call. Art is a two-tone image whose split position encodes the title
/// length so applied tracks are distinguishable.
struct SlowSource {
    delay: Duration,
}

impl SlowSource {
    fn art_for(track: &TrackRef) -> ColorImage {
        let side = 64;
        let split = (track.title.len() % side).max(1);
        let mut pixels = Vec::with_capacity(side * side);
        for _row in 0..side {
            for x in 0..side {
                pixels.push(if x < split {
                    Color32::from_rgb(230, 230, 230)
                } else {
                    Color32::from_rgb(20, 20, 20)
                });
            }
        }
        ColorImage::new([side, side], pixels)
    }
}

impl ImageSource for SlowSource {
    fn get(&mut self, track: &TrackRef, _size: u32) -> Option<ArtImage> {
        thread::sleep(self.delay);
        Some(ArtImage::new(Self::art_for(track), Provenance::Produced))
    }

    fn default_image(&mut self, _size: u32) -> album_art_view::Result<ArtImage> {
        Err(ArtError::PlaceholderUnavailable)
    }

    fn synthesize_fallback(&self, size: u32) -> ArtImage {
        ArtImage::new(
            album_art_view::art::synthesized_disc(size, Color32::GRAY),
            Provenance::Synthesized,
        )
    }
}

#[derive(Default)]
struct RecordingTarget {
    shows: Vec<Provenance>,
    current_angle: f32,
    incoming_angle: f32,
}

impl RenderTarget for RecordingTarget {
    fn show_incoming(&mut self, image: ArtImage, _transitions: TransitionPair) {
        self.shows.push(image.provenance);
        self.current_angle = self.incoming_angle;
    }

    fn current_angle(&self) -> f32 {
        self.current_angle
    }

    fn set_current_angle(&mut self, degrees: f32) {
        self.current_angle = degrees;
    }

    fn set_incoming_angle(&mut self, degrees: f32) {
        self.incoming_angle = degrees;
    }
}

type Presenter = AlbumArtPresenter<AsyncArtSource, KmeansExtractor, RecordingTarget>;

fn presenter(delay: Duration) -> Presenter {
    AlbumArtPresenter::new(
        RecordingTarget::default(),
        KmeansExtractor::default(),
        AsyncArtSource::new(SlowSource { delay }),
        &PresenterConfig::default(),
    )
}

fn pump_until_applied(presenter: &mut Presenter) -> Option<Palette> {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Some(palette) = presenter.pump() {
            return Some(palette);
        }
        thread::sleep(Duration::from_millis(5));
    }
    None
}

#[test]
fn slow_retrieval_shows_standin_then_applies_real_art() {
    let mut presenter = presenter(Duration::from_millis(40));
    let defaults = Palette::from_seed(&PresenterConfig::default().seed());
    let track = TrackRef::new("Blue in Green", "", "");

    let immediate = presenter.advance(&track, Direction::Forward, true);
    assert_eq!(immediate, defaults);
    assert_eq!(presenter.target().shows, vec![Provenance::Synthesized]);

    let applied = pump_until_applied(&mut presenter).expect("completion applied");
    assert_ne!(applied, defaults);
    assert_eq!(presenter.target().shows.last(), Some(&Provenance::Produced));
}

#[test]
fn only_the_latest_request_is_applied() {
    let mut presenter = presenter(Duration::from_millis(40));
    let first = TrackRef::new("First", "", "");
    let second = TrackRef::new("A Much Longer Second Title", "", "");

    presenter.advance(&first, Direction::Forward, true);
    presenter.advance(&second, Direction::Forward, true);
    assert_eq!(presenter.target().shows.len(), 2);

    let applied = pump_until_applied(&mut presenter).expect("completion applied");

    // Exactly one real-art application happened and it is for the latest
    // request: re-running the extraction for the second track reproduces
    // the applied palette.
    let real_shows: Vec<_> = presenter
        .target()
        .shows
        .iter()
        .filter(|p| **p == Provenance::Produced)
        .collect();
    assert_eq!(real_shows.len(), 1);

    use album_art_view::PaletteExtractor;
    let expected = KmeansExtractor::default().extract(
        &SlowSource::art_for(&second),
        &PresenterConfig::default().seed(),
    );
    assert_eq!(applied, expected);

    // No late application of the superseded track follows.
    thread::sleep(Duration::from_millis(100));
    assert!(presenter.pump().is_none());
}

#[test]
fn pump_without_pending_request_is_a_noop() {
    let mut presenter = presenter(Duration::from_millis(1));
    assert!(presenter.pump().is_none());
}
