use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::foundation::{
    core::NormRect,
    error::{ReelError, ReelResult},
};

/// Every tunable of the installation.
///
/// Missing fields in a settings file fall back to [`Settings::default`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Playing ends as soon as the score drops below this value.
    pub end_score_threshold: u8,
    pub main_video: String,
    pub test_video: String,
    /// Update/draw ticks per second.
    pub frame_rate: u32,
    pub window_width: u32,
    pub window_height: u32,
    pub large_text_size: f32,
    /// Height of the score bar, as a fraction of the viewport height.
    pub score_box_height: f64,
    /// `0xRRGGBB`.
    pub score_color: u32,
    pub background_gray: u8,
    pub report_thumbs_rect: NormRect,
    pub report_graph_rect: NormRect,
    /// Height of the scrub preview frame, as a fraction of the viewport height.
    pub report_frame_height: f64,
    pub grid_lines: u32,
    /// Extra pixels captured above the report region when saving.
    pub capture_margin_px: u32,
    pub font_path: PathBuf,
    pub background_image: PathBuf,
    pub start_image: PathBuf,
    pub out_dir: PathBuf,
    /// Base directory that relative asset paths (videos, font, images) resolve against.
    pub assets_root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            end_score_threshold: 2,
            main_video: "video/empathy_001.mov".to_string(),
            test_video: "video/test.mp4".to_string(),
            frame_rate: 30,
            window_width: 1280,
            window_height: 720,
            large_text_size: 70.0,
            score_box_height: 0.1,
            score_color: 0xce7900,
            background_gray: 50,
            report_thumbs_rect: NormRect::new(0.0, 0.45, 1.0, 0.05),
            report_graph_rect: NormRect::new(0.0, 0.5, 1.0, 0.2),
            report_frame_height: 0.2,
            grid_lines: 11,
            capture_margin_px: 25,
            font_path: PathBuf::from("fonts/LT_51868.ttf"),
            background_image: PathBuf::from("images/bg.jpg"),
            start_image: PathBuf::from("images/start.png"),
            out_dir: PathBuf::from("out"),
            assets_root: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn from_path(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read settings '{}'", path.display()))?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> ReelResult<Self> {
        let settings: Self = serde_json::from_str(text)
            .map_err(|e| ReelError::validation(format!("settings json: {e}")))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ReelResult<()> {
        if self.end_score_threshold > 100 {
            return Err(ReelError::validation(
                "end_score_threshold must be within 0..=100",
            ));
        }
        if self.frame_rate == 0 {
            return Err(ReelError::validation("frame_rate must be non-zero"));
        }
        if self.window_width == 0 || self.window_height == 0 {
            return Err(ReelError::validation("window size must be non-zero"));
        }
        if !self.large_text_size.is_finite() || self.large_text_size <= 0.0 {
            return Err(ReelError::validation(
                "large_text_size must be finite and > 0",
            ));
        }
        for (name, v) in [
            ("score_box_height", self.score_box_height),
            ("report_frame_height", self.report_frame_height),
        ] {
            if !v.is_finite() || v <= 0.0 || v > 1.0 {
                return Err(ReelError::validation(format!(
                    "{name} must be within (0, 1]"
                )));
            }
        }
        if self.grid_lines < 2 {
            return Err(ReelError::validation("grid_lines must be at least 2"));
        }
        if self.score_color > 0x00ff_ffff {
            return Err(ReelError::validation("score_color must be 0xRRGGBB"));
        }
        // written verbatim as the first line of saved recordings
        for (name, id) in [
            ("main_video", &self.main_video),
            ("test_video", &self.test_video),
        ] {
            if id.is_empty() || id.trim() != id.as_str() || id.contains(['\n', '\r']) {
                return Err(ReelError::validation(format!(
                    "{name} must be a non-blank single-line identifier without surrounding whitespace"
                )));
            }
        }
        self.report_thumbs_rect.validate("report_thumbs_rect")?;
        self.report_graph_rect.validate("report_graph_rect")?;
        Ok(())
    }

    /// Union of the thumbnail strip and the graph band.
    pub fn report_rect(&self) -> NormRect {
        self.report_graph_rect.union(self.report_thumbs_rect)
    }

    pub fn score_rgb(&self) -> [u8; 3] {
        [
            ((self.score_color >> 16) & 0xff) as u8,
            ((self.score_color >> 8) & 0xff) as u8,
            (self.score_color & 0xff) as u8,
        ]
    }

    /// Resolve an asset path against [`Settings::assets_root`]. Absolute paths pass through.
    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.assets_root.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        Settings::default().validate().unwrap();
    }

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let s = Settings::from_json(r#"{ "end_score_threshold": 5, "main_video": "a.mp4" }"#)
            .unwrap();
        assert_eq!(s.end_score_threshold, 5);
        assert_eq!(s.main_video, "a.mp4");
        assert_eq!(s.test_video, Settings::default().test_video);
        assert_eq!(s.grid_lines, 11);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(Settings::from_json(r#"{ "frame_rate": 0 }"#).is_err());
        assert!(Settings::from_json(r#"{ "end_score_threshold": 101 }"#).is_err());
        assert!(Settings::from_json(r#"{ "score_box_height": 1.5 }"#).is_err());
        assert!(Settings::from_json("not json").is_err());
    }

    #[test]
    fn video_ids_must_survive_the_recording_header() {
        for bad in [
            r#"{ "main_video": "" }"#,
            r#"{ "main_video": " a.mp4" }"#,
            r#"{ "test_video": "t.mp4\n" }"#,
        ] {
            let err = Settings::from_json(bad).unwrap_err();
            assert!(err.to_string().contains("_video"), "{bad}: {err}");
        }
        assert!(Settings::from_json(r#"{ "main_video": "video/a b.mp4" }"#).is_ok());
    }

    #[test]
    fn score_color_splits_into_channels() {
        assert_eq!(Settings::default().score_rgb(), [0xce, 0x79, 0x00]);
    }

    #[test]
    fn report_rect_spans_thumbs_and_graph() {
        let r = Settings::default().report_rect();
        assert!((r.top() - 0.45).abs() < 1e-12);
        assert!((r.bottom() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn resolve_joins_relative_paths() {
        let s = Settings {
            assets_root: PathBuf::from("/data"),
            ..Settings::default()
        };
        assert_eq!(s.resolve("video/a.mp4"), PathBuf::from("/data/video/a.mp4"));
        assert_eq!(s.resolve("/abs/b.mp4"), PathBuf::from("/abs/b.mp4"));
    }
}
