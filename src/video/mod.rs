//! Video capability consumed by the installation: a decoder contract, the
//! registry that lazily loads decoders by identifier, and the ffmpeg-backed
//! implementation.

use std::sync::Arc;

use crate::foundation::error::ReelResult;

pub mod clock;
pub mod ffmpeg;
pub mod registry;

/// One decoded video frame in premultiplied RGBA8, row-major, tightly packed.
#[derive(Clone, Debug)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Playback and random access over one video.
///
/// Frame indices are 0-based; `position` is the playhead as a fraction of the
/// full duration.
pub trait VideoDecoder {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn total_frames(&self) -> u64;
    fn duration_sec(&self) -> f64;
    fn current_frame(&self) -> u64;
    fn position(&self) -> f64;
    /// True once playback ran off the last frame. Videos never loop.
    fn is_done(&self) -> bool;

    fn play(&mut self);
    fn stop(&mut self);
    fn set_frame(&mut self, frame: u64);
    fn set_position(&mut self, fraction: f64);
    /// Advance the playhead to wall-clock time.
    fn update(&mut self);

    /// Pixels of the frame under the playhead.
    fn current_image(&mut self) -> ReelResult<Option<VideoFrame>>;

    fn aspect_ratio(&self) -> f64 {
        if self.height() == 0 {
            return 0.0;
        }
        f64::from(self.width()) / f64::from(self.height())
    }
}
