use thiserror::Error;

/// Everything that can stop the tracker short of a clean end of stream.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// A score map was asked to hold the same coordinate twice. The window math
    /// makes this unreachable, so seeing it means a bug, not bad input.
    #[error("duplicate coordinate ({x}, {y}) while building score map")]
    DuplicateCoordinate { x: i32, y: i32 },
    #[error("invalid tracker configuration: {0}")]
    InvalidConfig(String),
    #[error("search window centered at ({center_x}, {center_y}) does not overlap a {frame_width}x{frame_height} frame")]
    WindowOutsideFrame {
        center_x: i32,
        center_y: i32,
        frame_width: u32,
        frame_height: u32,
    },
    #[error("scoring worker failed: {0}")]
    Worker(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type TrackerResult<T> = std::result::Result<T, TrackerError>;
