//! Decoding through the system `ffprobe`/`ffmpeg` binaries.
//!
//! The binaries are used instead of linking FFmpeg so the crate builds without
//! native headers. Everything that spawns a process sits behind the
//! `media-ffmpeg` feature.

use std::{
    collections::{HashMap, VecDeque},
    path::{Path, PathBuf},
    sync::Arc,
    time::Instant,
};

use crate::{
    foundation::{
        error::{ReelError, ReelResult},
        math::premultiply_rgba8_in_place,
    },
    video::{
        VideoDecoder, VideoFrame,
        clock::PlaybackClock,
        registry::VideoLoader,
    },
};

const FRAME_CACHE_CAPACITY: usize = 64;
const PREFETCH_FRAMES: u32 = 12;

#[derive(Clone, Debug)]
pub struct VideoSourceInfo {
    pub source_path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub fps_num: u32,
    pub fps_den: u32,
    pub duration_sec: f64,
    pub frame_count: u64,
}

impl VideoSourceInfo {
    pub fn source_fps(&self) -> f64 {
        if self.fps_den == 0 {
            0.0
        } else {
            f64::from(self.fps_num) / f64::from(self.fps_den)
        }
    }

    /// Presentation time of `frame` in seconds.
    pub fn frame_time_sec(&self, frame: u64) -> f64 {
        let fps = self.source_fps();
        if fps > 0.0 { frame as f64 / fps } else { 0.0 }
    }
}

pub fn is_ffmpeg_on_path() -> bool {
    ["ffmpeg", "ffprobe"].iter().all(|bin| {
        std::process::Command::new(bin)
            .arg("-version")
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    })
}

#[cfg(feature = "media-ffmpeg")]
pub fn probe_video(source_path: &Path) -> ReelResult<VideoSourceInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
        nb_frames: Option<String>,
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(source_path)
        .output()
        .map_err(|e| ReelError::media(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(ReelError::media(format!(
            "ffprobe failed for '{}': {}",
            source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| ReelError::media(format!("ffprobe json parse failed: {e}")))?;
    let video_stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ReelError::media("no video stream found"))?;
    let width = video_stream
        .width
        .ok_or_else(|| ReelError::media("missing video width from ffprobe"))?;
    let height = video_stream
        .height
        .ok_or_else(|| ReelError::media("missing video height from ffprobe"))?;

    let (fps_num, fps_den) = parse_ff_ratio(video_stream.r_frame_rate.as_deref().unwrap_or("0/1"))
        .ok_or_else(|| ReelError::media("invalid video r_frame_rate"))?;
    let duration_sec = video_stream
        .duration
        .as_ref()
        .or(parsed.format.as_ref().and_then(|f| f.duration.as_ref()))
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);
    let frame_count = video_stream
        .nb_frames
        .as_ref()
        .and_then(|s| s.parse::<u64>().ok())
        .filter(|&n| n > 0)
        .unwrap_or_else(|| estimate_frame_count(duration_sec, fps_num, fps_den));

    Ok(VideoSourceInfo {
        source_path: source_path.to_path_buf(),
        width,
        height,
        fps_num,
        fps_den,
        duration_sec,
        frame_count,
    })
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn probe_video(_source_path: &Path) -> ReelResult<VideoSourceInfo> {
    Err(ReelError::media(
        "video playback requires the 'media-ffmpeg' feature",
    ))
}

#[cfg(feature = "media-ffmpeg")]
pub fn decode_video_frames_rgba8(
    source: &VideoSourceInfo,
    start_time_sec: f64,
    frame_count: u32,
) -> ReelResult<Vec<Vec<u8>>> {
    if frame_count == 0 {
        return Ok(Vec::new());
    }

    let out = std::process::Command::new("ffmpeg")
        .args(["-v", "error", "-ss", &format!("{start_time_sec:.9}")])
        .arg("-i")
        .arg(&source.source_path)
        .args([
            "-frames:v",
            &frame_count.to_string(),
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "pipe:1",
        ])
        .output()
        .map_err(|e| ReelError::media(format!("failed to run ffmpeg for video decode: {e}")))?;

    if !out.status.success() {
        return Err(ReelError::media(format!(
            "ffmpeg video decode failed for '{}': {}",
            source.source_path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let expected_len = source.width as usize * source.height as usize * 4;
    if expected_len == 0 {
        return Err(ReelError::media(
            "decoded video frame size is zero (invalid source dimensions)",
        ));
    }
    if !out.stdout.len().is_multiple_of(expected_len) {
        return Err(ReelError::media(format!(
            "decoded video batch has invalid size: got {} bytes, expected multiples of {expected_len}",
            out.stdout.len()
        )));
    }

    let available = (out.stdout.len() / expected_len).min(frame_count as usize);
    let mut frames = Vec::with_capacity(available);
    for idx in 0..available {
        let off = idx * expected_len;
        frames.push(out.stdout[off..off + expected_len].to_vec());
    }
    Ok(frames)
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn decode_video_frames_rgba8(
    _source: &VideoSourceInfo,
    _start_time_sec: f64,
    _frame_count: u32,
) -> ReelResult<Vec<Vec<u8>>> {
    Err(ReelError::media(
        "video playback requires the 'media-ffmpeg' feature",
    ))
}

#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
fn parse_ff_ratio(s: &str) -> Option<(u32, u32)> {
    let mut parts = s.split('/');
    let a = parts.next()?.parse::<u32>().ok()?;
    let b = parts.next()?.parse::<u32>().ok()?;
    if b == 0 {
        return None;
    }
    Some((a, b))
}

#[cfg_attr(not(feature = "media-ffmpeg"), allow(dead_code))]
fn estimate_frame_count(duration_sec: f64, fps_num: u32, fps_den: u32) -> u64 {
    if fps_den == 0 || !duration_sec.is_finite() || duration_sec <= 0.0 {
        return 0;
    }
    (duration_sec * f64::from(fps_num) / f64::from(fps_den)).round() as u64
}

/// [`VideoDecoder`] over a probed file: a wall-clock playhead plus a small
/// frame cache filled in decode batches.
pub struct FfmpegVideo {
    info: Arc<VideoSourceInfo>,
    clock: PlaybackClock,
    frame_cache: HashMap<u64, VideoFrame>,
    lru: VecDeque<u64>,
}

impl FfmpegVideo {
    pub fn open(path: &Path) -> ReelResult<Self> {
        let info = probe_video(path)?;
        if info.frame_count == 0 {
            return Err(ReelError::media(format!(
                "'{}' has no decodable frames",
                path.display()
            )));
        }
        Ok(Self::from_info(info))
    }

    pub fn from_info(info: VideoSourceInfo) -> Self {
        let clock = PlaybackClock::new(info.source_fps(), info.frame_count);
        Self {
            info: Arc::new(info),
            clock,
            frame_cache: HashMap::new(),
            lru: VecDeque::new(),
        }
    }

    pub fn info(&self) -> &VideoSourceInfo {
        &self.info
    }

    fn decode_frame(&mut self, frame: u64) -> ReelResult<VideoFrame> {
        if let Some(img) = self.frame_cache.get(&frame).cloned() {
            self.touch(frame);
            return Ok(img);
        }

        let start = self.info.frame_time_sec(frame);
        let frames = decode_video_frames_rgba8(&self.info, start, PREFETCH_FRAMES)?;
        for (offset, rgba) in frames.into_iter().enumerate() {
            let key = frame + offset as u64;
            if self.frame_cache.contains_key(&key) {
                self.touch(key);
                continue;
            }
            let image = self.rgba_to_frame(rgba);
            self.insert_frame(key, image);
        }

        self.frame_cache.get(&frame).cloned().ok_or_else(|| {
            ReelError::media(format!(
                "ffmpeg returned no video frame {frame} for '{}'",
                self.info.source_path.display()
            ))
        })
    }

    fn rgba_to_frame(&self, mut rgba: Vec<u8>) -> VideoFrame {
        premultiply_rgba8_in_place(&mut rgba);
        VideoFrame {
            width: self.info.width,
            height: self.info.height,
            rgba8_premul: Arc::new(rgba),
        }
    }

    fn insert_frame(&mut self, key: u64, image: VideoFrame) {
        self.frame_cache.insert(key, image);
        self.touch(key);
        while self.lru.len() > FRAME_CACHE_CAPACITY {
            if let Some(old) = self.lru.pop_front() {
                self.frame_cache.remove(&old);
            }
        }
    }

    fn touch(&mut self, key: u64) {
        if let Some(pos) = self.lru.iter().position(|x| *x == key) {
            self.lru.remove(pos);
        }
        self.lru.push_back(key);
    }
}

impl VideoDecoder for FfmpegVideo {
    fn width(&self) -> u32 {
        self.info.width
    }

    fn height(&self) -> u32 {
        self.info.height
    }

    fn total_frames(&self) -> u64 {
        self.info.frame_count
    }

    fn duration_sec(&self) -> f64 {
        if self.info.duration_sec > 0.0 {
            self.info.duration_sec
        } else {
            self.info.frame_time_sec(self.info.frame_count)
        }
    }

    fn current_frame(&self) -> u64 {
        self.clock.frame()
    }

    fn position(&self) -> f64 {
        self.clock.position()
    }

    fn is_done(&self) -> bool {
        self.clock.is_done()
    }

    fn play(&mut self) {
        self.clock.play(Instant::now());
    }

    fn stop(&mut self) {
        self.clock.stop();
    }

    fn set_frame(&mut self, frame: u64) {
        self.clock.seek(frame, Instant::now());
    }

    fn set_position(&mut self, fraction: f64) {
        self.clock.seek_fraction(fraction, Instant::now());
    }

    fn update(&mut self) {
        self.clock.update(Instant::now());
    }

    fn current_image(&mut self) -> ReelResult<Option<VideoFrame>> {
        let frame = self.clock.frame();
        self.decode_frame(frame).map(Some)
    }
}

/// Opens identifiers as file paths relative to a root directory.
pub struct FfmpegLoader {
    root: PathBuf,
}

impl FfmpegLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl VideoLoader for FfmpegLoader {
    fn load(&mut self, id: &str) -> ReelResult<Box<dyn VideoDecoder>> {
        let path = self.root.join(id);
        if !path.is_file() {
            return Err(ReelError::media(format!(
                "video file not found: '{}'",
                path.display()
            )));
        }
        let video = FfmpegVideo::open(&path)?;
        tracing::info!(
            path = %path.display(),
            width = video.info.width,
            height = video.info.height,
            frames = video.info.frame_count,
            "video ready"
        );
        Ok(Box::new(video))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(fps_num: u32, fps_den: u32, frames: u64) -> VideoSourceInfo {
        VideoSourceInfo {
            source_path: PathBuf::from("clip.mp4"),
            width: 64,
            height: 36,
            fps_num,
            fps_den,
            duration_sec: 0.0,
            frame_count: frames,
        }
    }

    #[test]
    fn ratio_parsing_rejects_zero_denominator() {
        assert_eq!(parse_ff_ratio("30000/1001"), Some((30000, 1001)));
        assert_eq!(parse_ff_ratio("25/0"), None);
        assert_eq!(parse_ff_ratio("abc"), None);
    }

    #[test]
    fn frame_count_estimate_uses_duration_and_rate() {
        assert_eq!(estimate_frame_count(2.0, 30, 1), 60);
        assert_eq!(estimate_frame_count(0.0, 30, 1), 0);
        assert_eq!(estimate_frame_count(1.0, 30, 0), 0);
    }

    #[test]
    fn frame_times_follow_source_rate() {
        let i = info(25, 1, 50);
        assert!((i.frame_time_sec(25) - 1.0).abs() < 1e-12);
        assert_eq!(info(0, 1, 0).frame_time_sec(10), 0.0);
    }

    #[test]
    fn decoder_reports_metadata_without_decoding() {
        let mut v = FfmpegVideo::from_info(info(30, 1, 90));
        assert_eq!(v.total_frames(), 90);
        assert!((v.duration_sec() - 3.0).abs() < 1e-12);
        assert!((v.aspect_ratio() - 64.0 / 36.0).abs() < 1e-12);
        v.set_position(0.5);
        assert_eq!(v.current_frame(), 45);
        assert!(!v.is_done());
    }

    #[test]
    fn loader_rejects_missing_files() {
        let mut loader = FfmpegLoader::new("/definitely/not/here");
        let err = loader.load("nope.mp4").err().unwrap();
        assert!(err.to_string().contains("not found"));
    }
}
