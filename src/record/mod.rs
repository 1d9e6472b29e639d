//! Persistence of recordings: a CSV of the scored series next to a PNG capture
//! of the report, both under a timestamped directory.

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Context as _;

use crate::{
    foundation::{
        core::{Rect, Viewport},
        error::{ReelError, ReelResult},
    },
    render::crop_to_rgba_image,
    score::{MAX_SCORE, ScoreData, ScoreSeries},
};

const STEM_TIME_FORMAT: &str = "%Y-%m-%d-%H-%M-%S-%3f";

/// One play-through: the video it was recorded against and its samples.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Recording {
    pub video_id: String,
    pub series: ScoreSeries,
}

impl Recording {
    pub fn new(video_id: impl Into<String>, series: ScoreSeries) -> Self {
        Self {
            video_id: video_id.into(),
            series,
        }
    }

    /// Video identifier on the first line, then one `frame, score` line per sample.
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(self.video_id.len() + 1 + self.series.len() * 10);
        out.push_str(&self.video_id);
        out.push('\n');
        for s in &self.series {
            let _ = writeln!(out, "{}, {}", s.frame, s.score);
        }
        out
    }

    /// Strict inverse of [`Recording::to_csv`]. Blank lines are skipped; any
    /// other line that is not two integers fails with its 1-based line number.
    pub fn from_csv(text: &str) -> ReelResult<Self> {
        let (header, body) = text.split_once('\n').unwrap_or((text, ""));
        let video_id = header.trim();
        if video_id.is_empty() {
            return Err(ReelError::parse("line 1: missing video identifier"));
        }

        let mut series = ScoreSeries::new();
        for (i, raw) in body.lines().enumerate() {
            // body starts on line 2 of the file
            let line = i + 2;
            if raw.trim().is_empty() {
                continue;
            }
            let sample = parse_row(raw)
                .map_err(|msg| ReelError::parse(format!("line {line}: {msg}: '{}'", raw.trim())))?;
            series.push(sample);
        }
        Ok(Self {
            video_id: video_id.to_string(),
            series,
        })
    }

    pub fn read(path: &Path) -> ReelResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read recording '{}'", path.display()))?;
        Self::from_csv(&text)
    }

    pub fn write(&self, path: &Path) -> ReelResult<()> {
        std::fs::write(path, self.to_csv())
            .with_context(|| format!("write recording '{}'", path.display()))?;
        Ok(())
    }
}

/// One line of the body. Quotes are literal, so a row can never span lines.
fn parse_row(raw: &str) -> Result<ScoreData, &'static str> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(raw.as_bytes());
    let mut records = reader.records();
    let record = match records.next() {
        Some(record) => record.map_err(|_| "row is not valid csv")?,
        None => return Err("expected two comma-separated fields"),
    };
    if records.next().is_some() {
        return Err("expected one record per line");
    }
    parse_sample(&record)
}

fn parse_sample(record: &csv::StringRecord) -> Result<ScoreData, &'static str> {
    let (Some(frame), Some(score), None) = (record.get(0), record.get(1), record.get(2)) else {
        return Err("expected two comma-separated fields");
    };
    let frame: u64 = frame.parse().map_err(|_| "frame is not a non-negative integer")?;
    let score: u8 = score.parse().map_err(|_| "score is not an integer in 0..=100")?;
    if score > MAX_SCORE {
        return Err("score is not an integer in 0..=100");
    }
    Ok(ScoreData::new(frame, score))
}

/// `<name>-<timestamp>`, the shared stem of the output directory and its files.
pub fn output_stem<Tz>(name: &str, at: &chrono::DateTime<Tz>) -> String
where
    Tz: chrono::TimeZone,
    Tz::Offset: std::fmt::Display,
{
    format!("{}-{}", name.trim(), at.format(STEM_TIME_FORMAT))
}

/// Paths written by one save.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SavedPaths {
    pub stem: String,
    pub dir: PathBuf,
    pub csv: PathBuf,
    pub png: PathBuf,
}

impl SavedPaths {
    pub fn new(out_dir: &Path, stem: &str) -> Self {
        let dir = out_dir.join(stem);
        Self {
            stem: stem.to_string(),
            csv: dir.join(format!("{stem}.csv")),
            png: dir.join(format!("{stem}.png")),
            dir,
        }
    }
}

/// Part of the frame kept in the saved image: full width, from `margin_px`
/// above the report region down to its bottom.
pub fn capture_region(viewport: Viewport, report: Rect, margin_px: u32) -> Rect {
    let top = (report.y0 - f64::from(margin_px)).max(0.0);
    Rect::new(
        0.0,
        top,
        viewport.width_f64(),
        report.y1.min(viewport.height_f64()),
    )
}

/// Write `<out_dir>/<stem>/<stem>.png` and `.csv`.
#[tracing::instrument(skip(frame, recording), fields(samples = recording.series.len()))]
pub fn save(
    out_dir: &Path,
    stem: &str,
    frame: &vello_cpu::Pixmap,
    region: Rect,
    recording: &Recording,
) -> ReelResult<SavedPaths> {
    let paths = SavedPaths::new(out_dir, stem);
    std::fs::create_dir_all(&paths.dir)
        .with_context(|| format!("create output dir '{}'", paths.dir.display()))?;

    let image = crop_to_rgba_image(frame, region)?;
    image
        .save(&paths.png)
        .with_context(|| format!("write report image '{}'", paths.png.display()))?;
    recording.write(&paths.csv)?;

    tracing::info!(dir = %paths.dir.display(), "saved recording");
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;

    use super::*;

    fn recording() -> Recording {
        Recording::new(
            "video/empathy_001.mov",
            [ScoreData::new(0, 25), ScoreData::new(10, 25), ScoreData::new(20, 1)]
                .into_iter()
                .collect(),
        )
    }

    #[test]
    fn csv_layout_is_id_then_frame_score_lines() {
        assert_eq!(
            recording().to_csv(),
            "video/empathy_001.mov\n0, 25\n10, 25\n20, 1\n"
        );
    }

    #[test]
    fn csv_reads_back_identically() {
        let rec = recording();
        assert_eq!(Recording::from_csv(&rec.to_csv()).unwrap(), rec);
    }

    #[test]
    fn loose_whitespace_and_blank_lines_are_accepted() {
        let rec = Recording::from_csv("  v.mp4 \n\n 3 ,  40\r\n\n7,100\n").unwrap();
        assert_eq!(rec.video_id, "v.mp4");
        assert_eq!(
            rec.series.as_slice(),
            &[ScoreData::new(3, 40), ScoreData::new(7, 100)]
        );
    }

    #[test]
    fn empty_series_is_valid() {
        let rec = Recording::from_csv("v.mp4\n").unwrap();
        assert!(rec.series.is_empty());
    }

    #[test]
    fn malformed_lines_name_their_line_number() {
        for (text, line) in [
            ("v\n1, 2\nthree, 4\n", "line 3"),
            ("v\n1, 2, 3\n", "line 2"),
            ("v\n1\n", "line 2"),
            ("v\n-1, 2\n", "line 2"),
            ("v\n1, 101\n", "line 2"),
            ("v\n\n\n1, x\n", "line 4"),
            ("v\n1, 2\n\n3, 4\n5,x\n", "line 5"),
            ("v.mp4\n\"1\n\",2\n5,6\n", "line 2"),
            ("v.mp4\n\"1\",2\n", "line 2"),
            ("v\n1,2\r3,4\n", "line 2"),
        ] {
            let err = Recording::from_csv(text).unwrap_err();
            assert!(matches!(err, ReelError::Parse(_)), "{text:?}");
            assert!(err.to_string().contains(line), "{text:?}: {err}");
        }
    }

    #[test]
    fn missing_header_is_a_parse_error() {
        assert!(matches!(Recording::from_csv(""), Err(ReelError::Parse(_))));
        assert!(matches!(Recording::from_csv("\n1, 2\n"), Err(ReelError::Parse(_))));
    }

    #[test]
    fn stem_carries_millisecond_timestamp() {
        let at = chrono::Utc
            .with_ymd_and_hms(2024, 3, 9, 14, 5, 7)
            .unwrap()
            + chrono::Duration::milliseconds(42);
        assert_eq!(output_stem(" ana ", &at), "ana-2024-03-09-14-05-07-042");
    }

    #[test]
    fn capture_region_includes_margin_above_report() {
        let vp = Viewport::new(1000, 400).unwrap();
        let r = capture_region(vp, Rect::new(0.0, 180.0, 1000.0, 280.0), 25);
        assert_eq!(r, Rect::new(0.0, 155.0, 1000.0, 280.0));

        let clipped = capture_region(vp, Rect::new(0.0, 10.0, 1000.0, 500.0), 25);
        assert_eq!(clipped, Rect::new(0.0, 0.0, 1000.0, 400.0));
    }

    #[test]
    fn save_writes_png_and_csv_under_stem_dir() {
        let dir = tempfile::tempdir().unwrap();
        let vp = Viewport::new(20, 10).unwrap();
        let frame = crate::render::Canvas::new(vp).finish();
        let paths = save(
            dir.path(),
            "ana-2024",
            &frame,
            Rect::new(0.0, 2.0, 20.0, 8.0),
            &recording(),
        )
        .unwrap();

        assert_eq!(paths.dir, dir.path().join("ana-2024"));
        assert_eq!(image::open(&paths.png).unwrap().to_rgba8().dimensions(), (20, 6));
        assert_eq!(Recording::read(&paths.csv).unwrap(), recording());
    }
}
