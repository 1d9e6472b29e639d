#![forbid(unsafe_code)]

//! An interactive video installation: a visitor steers a score with the
//! cursor while a video plays, and the recorded series is turned into a report
//! of thumbnails, a score graph and a scrubbable preview.
//!
//! [`app::Installation`] drives everything; the `window` feature adds a
//! desktop shell around it and `media-ffmpeg` enables video decoding through
//! the system `ffmpeg`/`ffprobe`.

pub mod app;
pub mod config;
pub mod dialogs;
pub mod foundation;
pub mod input;
pub mod record;
pub mod render;
pub mod report;
pub mod score;
pub mod session;
#[cfg(feature = "window")]
pub mod shell;
pub mod video;

pub use app::{Installation, ShellRequest};
pub use config::Settings;
pub use dialogs::{Dialogs, ScriptedDialogs};
pub use foundation::{
    core::{NormRect, Point, Rect, Viewport},
    error::{ReelError, ReelResult},
};
pub use input::Key;
pub use record::Recording;
pub use score::{ScoreData, ScoreSeries};
pub use session::{Effect, Phase, Session, Transition};
pub use video::{
    VideoDecoder, VideoFrame,
    registry::{VideoLoader, VideoRegistry},
};
