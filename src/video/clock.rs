use std::time::Instant;

/// Wall-clock playhead for a non-looping video.
///
/// All methods take the current instant explicitly so playback can be driven
/// deterministically.
#[derive(Clone, Debug)]
pub struct PlaybackClock {
    fps: f64,
    total_frames: u64,
    frame: u64,
    done: bool,
    anchor: Option<(Instant, u64)>,
}

impl PlaybackClock {
    pub fn new(fps: f64, total_frames: u64) -> Self {
        Self {
            fps: if fps.is_finite() && fps > 0.0 { fps } else { 0.0 },
            total_frames,
            frame: 0,
            done: false,
            anchor: None,
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn is_playing(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Playhead as a fraction of the whole video.
    pub fn position(&self) -> f64 {
        if self.total_frames == 0 {
            return 0.0;
        }
        self.frame as f64 / self.total_frames as f64
    }

    pub fn play(&mut self, now: Instant) {
        self.done = false;
        self.anchor = Some((now, self.frame));
    }

    pub fn stop(&mut self) {
        self.anchor = None;
    }

    pub fn seek(&mut self, frame: u64, now: Instant) {
        self.frame = frame.min(self.last_frame());
        self.done = false;
        if self.anchor.is_some() {
            self.anchor = Some((now, self.frame));
        }
    }

    pub fn seek_fraction(&mut self, fraction: f64, now: Instant) {
        let fraction = if fraction.is_finite() {
            fraction.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let frame = (fraction * self.total_frames as f64).floor() as u64;
        self.seek(frame, now);
    }

    /// Move the playhead to `now`. Running past the last frame stops playback
    /// and raises the done flag.
    pub fn update(&mut self, now: Instant) {
        let Some((started, start_frame)) = self.anchor else {
            return;
        };
        let elapsed = now.saturating_duration_since(started).as_secs_f64();
        let advanced = (elapsed * self.fps).floor() as u64;
        let frame = start_frame.saturating_add(advanced);
        if frame >= self.total_frames {
            self.frame = self.last_frame();
            self.done = true;
            self.anchor = None;
        } else {
            self.frame = frame;
        }
    }

    fn last_frame(&self) -> u64 {
        self.total_frames.saturating_sub(1)
    }
}
