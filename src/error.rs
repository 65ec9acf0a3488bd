use std::io;

/// Result alias that carries the crate-wide [`ArtError`] type.
pub type Result<T> = std::result::Result<T, ArtError>;

/// Failures of the artwork pipeline.
///
/// None of these ever reach the user as a visible failure. A source miss is
/// recovered with the default image and a missing default is recovered with a
/// synthesized one, so every transition ends with something on screen.
#[derive(Debug, thiserror::Error)]
pub enum ArtError {
    /// The source has no artwork for the requested track.
    #[error("no artwork available for the requested track")]
    ImageUnavailable,
    /// The source-level default image could not be produced.
    #[error("default artwork could not be produced")]
    PlaceholderUnavailable,
    /// Artwork bytes were rejected by the decoder.
    #[error("failed to decode artwork: {0}")]
    Decode(String),
    /// File system error while reading artwork.
    #[error(transparent)]
    Io(#[from] io::Error),
}
