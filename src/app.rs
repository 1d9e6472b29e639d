//! The installation: owns the session, the videos and the drawing resources,
//! and turns ticks, keys and cursor motion into state changes and frames.

use std::{path::PathBuf, sync::Arc, time::Instant};

use crate::{
    config::Settings,
    dialogs::Dialogs,
    foundation::{
        core::{Point, Rect, Viewport},
        error::{ReelError, ReelResult},
    },
    input::{Key, preset_x},
    record::{self, Recording, SavedPaths},
    render::{
        Canvas, FontRenderer, HAlign, ParleyFont, Rgba8, VAlign, draw_text, load_image,
        pixmap_from_frame,
    },
    report::{ReportCache, ReportKey, draw_scrub_preview, render_report},
    score,
    session::{Effect, Phase, Session, Transition},
    video::{
        VideoDecoder,
        registry::{VideoLoader, VideoRegistry},
    },
};

const INFO_TEXT_SIZE_PX: f32 = 13.0;

/// Something only the windowing layer can do.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ShellRequest {
    /// Move the OS cursor to this position in viewport pixels.
    WarpCursor(Point),
    ToggleFullscreen,
}

/// Smoothed ticks per second for the info overlay.
#[derive(Clone, Debug, Default)]
struct FpsMeter {
    last: Option<Instant>,
    fps: f64,
}

impl FpsMeter {
    fn tick(&mut self, now: Instant) {
        if let Some(last) = self.last.replace(now) {
            let dt = now.duration_since(last).as_secs_f64();
            if dt > 0.0 {
                let inst = 1.0 / dt;
                self.fps = if self.fps == 0.0 {
                    inst
                } else {
                    self.fps * 0.9 + inst * 0.1
                };
            }
        }
    }
}

pub struct Installation {
    settings: Settings,
    viewport: Viewport,
    registry: VideoRegistry,
    session: Session,
    cursor: Point,
    show_info: bool,
    report: ReportCache,
    background: Option<Arc<vello_cpu::Pixmap>>,
    start_image: Option<Arc<vello_cpu::Pixmap>>,
    font: Option<Box<dyn FontRenderer>>,
    frame: Option<vello_cpu::Pixmap>,
    fps: FpsMeter,
    requests: Vec<ShellRequest>,
}

impl Installation {
    /// Nothing is loaded until [`Installation::setup`].
    pub fn new(settings: Settings, viewport: Viewport, loader: Box<dyn VideoLoader>) -> Self {
        let cursor = Point::new(viewport.width_f64() / 2.0, viewport.height_f64() / 2.0);
        Self {
            settings,
            viewport,
            registry: VideoRegistry::new(loader),
            session: Session::default(),
            cursor,
            show_info: false,
            report: ReportCache::new(),
            background: None,
            start_image: None,
            font: None,
            frame: None,
            fps: FpsMeter::default(),
            requests: Vec::new(),
        }
    }

    /// Use `font` instead of loading `Settings::font_path`.
    pub fn with_font(mut self, font: Box<dyn FontRenderer>) -> Self {
        self.font = Some(font);
        self
    }

    /// Preload both videos, load images and font, then enter Pre.
    ///
    /// Missing assets only degrade drawing.
    pub fn setup(&mut self) {
        let main = self.settings.main_video.clone();
        let test = self.settings.test_video.clone();
        self.registry.preload(&main);
        self.registry.preload(&test);

        self.background = self.load_optional_image(self.settings.background_image.clone());
        self.start_image = self.load_optional_image(self.settings.start_image.clone());
        if self.font.is_none() {
            let path = self.settings.resolve(&self.settings.font_path);
            match ParleyFont::from_path(&path) {
                Ok(font) => self.font = Some(Box::new(font)),
                Err(err) => tracing::warn!(path = %path.display(), error = %err, "font unavailable, text disabled"),
            }
        }

        self.transition(|_| Session::start());
    }

    fn load_optional_image(&self, path: PathBuf) -> Option<Arc<vello_cpu::Pixmap>> {
        let path = self.settings.resolve(path);
        match load_image(&path) {
            Ok(image) => Some(image),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "image unavailable");
                None
            }
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn registry(&self) -> &VideoRegistry {
        &self.registry
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn cursor(&self) -> Point {
        self.cursor
    }

    pub fn show_info(&self) -> bool {
        self.show_info
    }

    /// How many times the report surface was rendered so far.
    pub fn report_renders(&self) -> u64 {
        self.report.renders()
    }

    /// Requests for the windowing layer queued since the last call.
    pub fn take_requests(&mut self) -> Vec<ShellRequest> {
        std::mem::take(&mut self.requests)
    }

    fn transition(&mut self, f: impl FnOnce(Session) -> Transition) {
        let Transition { session, effects } = f(std::mem::take(&mut self.session));
        self.session = session;
        for effect in effects {
            self.apply(effect);
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::CenterCursor => {
                let x = self.viewport.width_f64() / 2.0;
                self.warp_cursor(x);
            }
            Effect::SelectVideo(id) => {
                self.registry.select(&id);
            }
            Effect::RestartVideo => {
                if let Some(video) = self.registry.current_mut() {
                    video.set_position(0.0);
                    video.play();
                }
            }
            Effect::StopVideo => {
                if let Some(video) = self.registry.current_mut() {
                    video.stop();
                }
            }
            Effect::AllocateReport => self.report.invalidate(),
        }
    }

    /// Put the cursor at `x`, vertically centered in the score bar.
    fn warp_cursor(&mut self, x: f64) {
        let y = self.viewport.height_f64() - self.score_box_height() / 2.0;
        self.cursor = Point::new(x, y);
        self.requests.push(ShellRequest::WarpCursor(self.cursor));
    }

    fn score_box_height(&self) -> f64 {
        self.viewport.pixh(self.settings.score_box_height)
    }

    pub fn cursor_moved(&mut self, position: Point) {
        self.cursor = position;
    }

    /// A zero-sized window (minimized) keeps the previous viewport.
    pub fn resized(&mut self, width: u32, height: u32) {
        match Viewport::new(width, height) {
            Ok(viewport) => self.viewport = viewport,
            Err(err) => tracing::debug!(width, height, error = %err, "ignoring resize"),
        }
    }

    /// One update tick: sample the cursor, advance playback, check end conditions.
    pub fn update(&mut self) {
        self.fps.tick(Instant::now());

        let phase = self.session.phase();
        if !phase.samples_cursor() {
            return;
        }

        let sample = score::sample(
            self.cursor.x,
            self.viewport.width_f64(),
            self.registry.current().map(|v| v.current_frame()),
            self.session.current(),
        );

        let mut video_done = false;
        if phase == Phase::Playing
            && let Some(video) = self.registry.current_mut()
        {
            video.update();
            video_done = video.is_done();
        }

        let threshold = self.settings.end_score_threshold;
        self.transition(|s| s.tick(sample, video_done, threshold));
    }

    pub fn key_pressed(&mut self, key: Key, dialogs: &mut dyn Dialogs) {
        match key {
            Key::Advance => {
                let main = self.settings.main_video.clone();
                self.transition(|s| s.advance(&main));
            }
            Key::Preset(n) => {
                let x = preset_x(n, self.viewport.width_f64());
                self.warp_cursor(x);
            }
            Key::ToggleInfo => self.show_info = !self.show_info,
            Key::Save => {
                if let Err(err) = self.save_data(dialogs) {
                    tracing::error!(error = %err, "save failed");
                    dialogs.alert(&format!("Save failed: {err}"));
                }
            }
            Key::Load => {
                if let Err(err) = self.load_data(dialogs) {
                    tracing::error!(error = %err, "load failed");
                    dialogs.alert(&format!("Load failed: {err}"));
                }
            }
            Key::Rehearse => {
                let test = self.settings.test_video.clone();
                self.transition(|s| s.rehearse(&test));
            }
            Key::Fullscreen => self.requests.push(ShellRequest::ToggleFullscreen),
        }
    }

    /// Prompt for a name and write the report capture and the CSV.
    ///
    /// Returns `Ok(None)` when the prompt was cancelled or left blank.
    pub fn save_data(&mut self, dialogs: &mut dyn Dialogs) -> ReelResult<Option<SavedPaths>> {
        let Some(name) = dialogs
            .prompt_name("Enter name for data", "")
            .filter(|n| !n.trim().is_empty())
        else {
            tracing::info!("save cancelled");
            return Ok(None);
        };
        let stem = record::output_stem(&name, &chrono::Local::now());

        let video_id = self
            .registry
            .current_id()
            .unwrap_or(self.settings.main_video.as_str())
            .to_string();
        let recording = Recording::new(video_id, self.session.series().clone());

        let report = self.settings.report_rect().to_pixels(self.viewport);
        let region = record::capture_region(self.viewport, report, self.settings.capture_margin_px);
        let out_dir = self.settings.resolve(&self.settings.out_dir);

        if self.frame.is_none() {
            self.draw();
        }
        let Some(frame) = self.frame.as_ref() else {
            return Err(ReelError::render("no frame to capture"));
        };
        let paths = record::save(&out_dir, &stem, frame, region, &recording)?;

        dialogs.alert(&format!("Saved data for {stem}"));
        Ok(Some(paths))
    }

    /// Pick a CSV and show its report. The session is untouched when the file
    /// cannot be read or parsed. Returns whether a recording was loaded.
    pub fn load_data(&mut self, dialogs: &mut dyn Dialogs) -> ReelResult<bool> {
        let Some(path) = dialogs.pick_file("Select CSV to load") else {
            return Ok(false);
        };
        let recording = Recording::read(&path)?;
        tracing::info!(
            path = %path.display(),
            video = %recording.video_id,
            samples = recording.series.len(),
            "loaded recording"
        );
        self.load_recording(recording);
        Ok(true)
    }

    pub fn load_recording(&mut self, recording: Recording) {
        let Recording { video_id, series } = recording;
        self.transition(|s| s.load(&video_id, series));
    }

    /// The most recently drawn frame.
    pub fn last_frame(&self) -> Option<&vello_cpu::Pixmap> {
        self.frame.as_ref()
    }

    /// Draw one frame for the current phase.
    pub fn draw(&mut self) -> &vello_cpu::Pixmap {
        let mut canvas = Canvas::new(self.viewport);
        canvas.clear(Rgba8::gray(self.settings.background_gray));
        if let Some(bg) = &self.background {
            canvas.draw_image(bg, self.viewport.rect());
        }

        let drawn = match self.session.phase() {
            Phase::Pre => self.draw_pre(&mut canvas),
            Phase::Playing => self.draw_playing(&mut canvas),
            Phase::Post => self.draw_title(&mut canvas, "Thank you!"),
            Phase::Report => self.draw_report(&mut canvas),
        };
        if let Err(err) = drawn {
            tracing::warn!(phase = self.session.phase().name(), error = %err, "draw failed");
        }

        if self.show_info
            && let Some(font) = self.font.as_deref_mut()
        {
            let text = format!("{:.2}", self.fps.fps);
            if let Err(err) = draw_text(
                font,
                &mut canvas,
                &text,
                INFO_TEXT_SIZE_PX,
                10.0,
                20.0,
                (HAlign::Left, VAlign::Bottom),
                Rgba8::WHITE,
            ) {
                tracing::warn!(error = %err, "info overlay failed");
            }
        }

        self.frame.insert(canvas.finish())
    }

    fn draw_start_image(&self, canvas: &mut Canvas) {
        if let Some(start) = &self.start_image {
            canvas.draw_image(start, self.viewport.rect());
        }
    }

    fn draw_pre(&mut self, canvas: &mut Canvas) -> ReelResult<()> {
        self.draw_start_image(canvas);
        self.draw_score_bar(canvas)
    }

    fn draw_playing(&mut self, canvas: &mut Canvas) -> ReelResult<()> {
        let video_area_height = self.viewport.height_f64() - self.score_box_height();
        let center_x = self.viewport.width_f64() / 2.0;
        let current = match self.registry.current_mut() {
            Some(video) => match video.current_image() {
                Ok(frame) => frame.map(|frame| (frame, video.aspect_ratio())),
                Err(err) => {
                    tracing::warn!(
                        frame = video.current_frame(),
                        error = %err,
                        "video frame unavailable"
                    );
                    None
                }
            },
            None => None,
        };
        if let Some((frame, aspect)) = current {
            let width = video_area_height * aspect;
            let dst = Rect::new(
                center_x - width / 2.0,
                0.0,
                center_x + width / 2.0,
                video_area_height,
            );
            self.draw_start_image(canvas);
            canvas.draw_image(&pixmap_from_frame(&frame)?, dst);
        }
        self.draw_score_bar(canvas)
    }

    /// Filled up to the current score, outlined over the full width.
    fn draw_score_bar(&mut self, canvas: &mut Canvas) -> ReelResult<()> {
        let (w, h) = (self.viewport.width_f64(), self.viewport.height_f64());
        let box_h = self.score_box_height();
        let score = self.session.current().score;
        let score_x = (w * f64::from(score) * 0.01).round();

        canvas.fill_rect(
            Rect::new(0.0, h - box_h, score_x, h),
            Rgba8::from_rgb(self.settings.score_rgb()),
        );
        if self.show_info
            && let Some(font) = self.font.as_deref_mut()
        {
            draw_text(
                font,
                canvas,
                &score.to_string(),
                INFO_TEXT_SIZE_PX,
                score_x - 20.0,
                h - 7.0,
                (HAlign::Left, VAlign::Bottom),
                Rgba8::WHITE,
            )?;
        }
        canvas.stroke_rect(Rect::new(0.0, h - box_h, w, h), Rgba8::WHITE, 1.0);
        Ok(())
    }

    fn draw_title(&mut self, canvas: &mut Canvas, text: &str) -> ReelResult<()> {
        let Some(font) = self.font.as_deref_mut() else {
            return Ok(());
        };
        draw_text(
            font,
            canvas,
            text,
            self.settings.large_text_size,
            self.viewport.width_f64() / 2.0,
            self.viewport.height_f64() * 0.4,
            (HAlign::Center, VAlign::Center),
            Rgba8::WHITE,
        )?;
        Ok(())
    }

    fn draw_report(&mut self, canvas: &mut Canvas) -> ReelResult<()> {
        self.draw_title(canvas, "Report")?;

        let viewport = self.viewport;
        let key = ReportKey {
            generation: self.session.report_generation(),
            viewport,
        };
        let (settings, session, registry) = (&self.settings, &self.session, &mut self.registry);
        let surface = self.report.get_or_render(key, || {
            render_report(
                settings,
                viewport,
                session.series(),
                registry.current_mut().map(|v| v as &mut dyn VideoDecoder),
            )
        })?;
        if let Some(surface) = surface {
            canvas.draw_image(&surface, viewport.rect());
        }

        if let Some(video) = self.registry.current_mut() {
            let font = self.font.as_deref_mut().map(|f| f as &mut dyn FontRenderer);
            draw_scrub_preview(
                canvas,
                font,
                &self.settings,
                viewport,
                self.cursor.x,
                video,
            )?;
        }
        Ok(())
    }
}
