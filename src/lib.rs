//! Album-art presentation controller.
//!
//! The crate coordinates what a music player shows while tracks change:
//! artwork lookup with a never-blank fallback chain, slide transitions
//! between the previous and the next cover, a 4-colour palette extracted
//! from the artwork to recolour surrounding chrome and a turntable spin
//! whose running state follows playback.
//!
//! The core presenter is toolkit-agnostic behind three traits
//! ([`ImageSource`], [`PaletteExtractor`], [`RenderTarget`]); an egui
//! implementation of the render target and a directory-backed source are
//! included, as is a background fetch worker for sources too slow to call
//! from the UI thread.

pub mod art;
pub mod config;
pub mod error;
pub mod fetch;
pub mod palette;
pub mod presenter;
pub mod render;
pub mod screen;
pub mod spin;

pub use art::{ArtImage, DirArtSource, ImageSource, Provenance, TrackRef};
pub use config::{Config, PresenterConfig};
pub use error::{ArtError, Result};
pub use fetch::{ArtWorker, AsyncArtSource};
pub use palette::{KmeansExtractor, Palette, PaletteExtractor, PaletteSeed};
pub use presenter::AlbumArtPresenter;
pub use render::{Direction, RenderTarget, Transition, TransitionPair};
pub use screen::EguiScreen;
pub use spin::{SpinState, Turntable};
