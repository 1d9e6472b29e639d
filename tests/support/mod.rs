#![allow(dead_code)]

use std::sync::Arc;

use scorereel::{ReelError, ReelResult, VideoDecoder, VideoFrame, VideoLoader};

/// Deterministic decoder: `update` moves the playhead `step` frames while
/// playing and reports done once it would run past the last frame.
pub struct FakeVideo {
    pub total: u64,
    pub step: u64,
    pub frame: u64,
    pub playing: bool,
    pub done: bool,
}

impl FakeVideo {
    pub fn new(total: u64, step: u64) -> Self {
        Self {
            total,
            step,
            frame: 0,
            playing: false,
            done: false,
        }
    }
}

impl VideoDecoder for FakeVideo {
    fn width(&self) -> u32 {
        16
    }
    fn height(&self) -> u32 {
        9
    }
    fn total_frames(&self) -> u64 {
        self.total
    }
    fn duration_sec(&self) -> f64 {
        self.total as f64 / 30.0
    }
    fn current_frame(&self) -> u64 {
        self.frame
    }
    fn position(&self) -> f64 {
        self.frame as f64 / self.total as f64
    }
    fn is_done(&self) -> bool {
        self.done
    }
    fn play(&mut self) {
        self.playing = true;
        self.done = false;
    }
    fn stop(&mut self) {
        self.playing = false;
    }
    fn set_frame(&mut self, frame: u64) {
        self.frame = frame.min(self.total.saturating_sub(1));
    }
    fn set_position(&mut self, fraction: f64) {
        self.set_frame((fraction * self.total as f64) as u64);
    }
    fn update(&mut self) {
        if !self.playing {
            return;
        }
        if self.frame + self.step >= self.total {
            self.frame = self.total - 1;
            self.done = true;
            self.playing = false;
        } else {
            self.frame += self.step;
        }
    }
    fn current_image(&mut self) -> ReelResult<Option<VideoFrame>> {
        let px = [0u8, 0, 255, 255];
        Ok(Some(VideoFrame {
            width: 16,
            height: 9,
            rgba8_premul: Arc::new(px.iter().copied().cycle().take(16 * 9 * 4).collect()),
        }))
    }
}

/// Hands out [`FakeVideo`]s for the listed identifiers and fails for anything else.
pub struct FakeLoader {
    pub videos: Vec<(String, u64, u64)>,
}

impl FakeLoader {
    pub fn with(id: &str, total: u64, step: u64) -> Self {
        Self {
            videos: vec![(id.to_string(), total, step)],
        }
    }

    pub fn and(mut self, id: &str, total: u64, step: u64) -> Self {
        self.videos.push((id.to_string(), total, step));
        self
    }
}

impl VideoLoader for FakeLoader {
    fn load(&mut self, id: &str) -> ReelResult<Box<dyn VideoDecoder>> {
        self.videos
            .iter()
            .find(|(v, _, _)| v == id)
            .map(|&(_, total, step)| Box::new(FakeVideo::new(total, step)) as Box<dyn VideoDecoder>)
            .ok_or_else(|| ReelError::media(format!("unknown video '{id}'")))
    }
}
