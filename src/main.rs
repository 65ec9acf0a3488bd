use std::{
    env,
    path::PathBuf,
    time::{Duration, Instant},
};

use album_art_view::{
    AlbumArtPresenter, AsyncArtSource, Config, DirArtSource, Direction, EguiScreen,
    KmeansExtractor, Palette, TrackRef,
};
use eframe::egui;
use tracing_subscriber::EnvFilter;

fn main() -> eframe::Result<()> {
    init_tracing();

    let config = Config::load().unwrap_or_else(|err| {
        tracing::warn!(error = %err, "config could not be loaded, using defaults");
        Config::default()
    });

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([480.0, 560.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Album Art View",
        options,
        Box::new(move |_cc| Ok(Box::new(App::new(config)))),
    )
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

struct App {
    presenter: AlbumArtPresenter<AsyncArtSource, KmeansExtractor, EguiScreen>,
    tracks: Vec<TrackRef>,
    index: usize,
    playing: bool,
    palette: Palette,
    last_frame: Option<Instant>,
}

impl App {
    fn new(config: Config) -> Self {
        let art_dir = config
            .art_dir
            .clone()
            .or_else(|| env::args().nth(1).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from("covers"));

        let dir_source = DirArtSource::new(&art_dir)
            .with_fallback_tint(config.presenter.default_background);
        let tracks = dir_source.tracks().unwrap_or_else(|err| {
            tracing::warn!(dir = %art_dir.display(), error = %err, "cover directory unreadable");
            Vec::new()
        });
        tracing::info!(dir = %art_dir.display(), tracks = tracks.len(), "scanned cover directory");

        let source = AsyncArtSource::new(dir_source)
            .with_fallback_tint(config.presenter.default_background);
        let screen = EguiScreen::new(Duration::from_millis(config.presenter.transition_millis()));
        let mut presenter =
            AlbumArtPresenter::new(screen, KmeansExtractor::default(), source, &config.presenter);

        let mut palette = presenter.palette();
        if let Some(first) = tracks.first() {
            palette = presenter.advance(first, Direction::Forward, true);
        }

        Self {
            presenter,
            tracks,
            index: 0,
            playing: false,
            palette,
            last_frame: None,
        }
    }

    fn current_track(&self) -> Option<&TrackRef> {
        self.tracks.get(self.index)
    }

    fn skip(&mut self, direction: Direction) {
        if self.tracks.is_empty() {
            return;
        }
        self.index = match direction {
            Direction::Forward => (self.index + 1) % self.tracks.len(),
            Direction::Backward => (self.index + self.tracks.len() - 1) % self.tracks.len(),
        };
        let track = self.tracks[self.index].clone();
        self.palette = self.presenter.advance(&track, direction, true);
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        let dt = self
            .last_frame
            .map(|last| (now - last).min(Duration::from_millis(250)))
            .unwrap_or(Duration::ZERO);
        self.last_frame = Some(now);

        self.presenter.tick(dt);
        if let Some(palette) = self.presenter.pump() {
            self.palette = palette;
        }

        let (next, previous, toggle) = ctx.input(|i| {
            (
                i.key_pressed(egui::Key::ArrowRight),
                i.key_pressed(egui::Key::ArrowLeft),
                i.key_pressed(egui::Key::Space),
            )
        });
        if next {
            self.skip(Direction::Forward);
        }
        if previous {
            self.skip(Direction::Backward);
        }
        if toggle {
            self.playing = !self.playing;
            self.presenter.set_spinning(self.playing);
        }

        let frame = egui::Frame::default()
            .fill(self.palette.background())
            .inner_margin(egui::Margin::same(16));
        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            let title = self
                .current_track()
                .map(|t| t.to_string())
                .unwrap_or_else(|| "No covers found".to_string());
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new(title)
                        .heading()
                        .color(self.palette.text()),
                );
                ui.label(
                    egui::RichText::new("\u{2190}/\u{2192} change track, space toggles the spin")
                        .small()
                        .color(self.palette.text()),
                );
            });
            ui.add_space(12.0);

            let avail = ui.available_size();
            let side = avail.x.min(avail.y).max(96.0);
            let (rect, _) = ui.allocate_exact_size(egui::vec2(side, side), egui::Sense::hover());
            self.presenter.target_mut().paint(ui, rect);
        });

        let repaint = if self.playing {
            Duration::from_millis(16)
        } else {
            Duration::from_millis(250)
        };
        ctx.request_repaint_after(repaint);
    }
}
