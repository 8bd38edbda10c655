pub mod animation_loop;
pub mod assets;
pub mod camera;
pub mod cli;
pub mod config;
pub mod event_queue;
pub mod graphics;
pub mod headless;
pub mod math;
pub mod reticle;
pub mod scene;
pub mod universe;
pub mod user_input;
pub mod windowing;
pub mod xr;

mod placement_tests;

pub use universe::Universe;
pub use windowing::Windowing;

/// Engine-level error type.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("feature not supported by the XR runtime: {0}")]
    Unsupported(String),

    #[error("an immersive session is already active")]
    SessionActive,

    #[error("no immersive session is active")]
    NoSession,

    #[error("asset error: {0}")]
    Asset(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("windowing error: {0}")]
    Windowing(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;
