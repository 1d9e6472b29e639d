//! Scores, the recorded series and the cursor sampler.

use crate::foundation::math::map_range;

/// Highest score a sample can carry.
pub const MAX_SCORE: u8 = 100;

/// One recorded sample: the video frame on screen and the score at that moment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ScoreData {
    pub frame: u64,
    pub score: u8,
}

impl ScoreData {
    pub fn new(frame: u64, score: u8) -> Self {
        Self {
            frame,
            score: score.min(MAX_SCORE),
        }
    }
}

/// Ordered history of samples for one play-through.
///
/// Appends keep temporal order; nothing is ever removed except by [`ScoreSeries::clear`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScoreSeries {
    samples: Vec<ScoreData>,
}

impl ScoreSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sample: ScoreData) {
        self.samples.push(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn last(&self) -> Option<ScoreData> {
        self.samples.last().copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoreData> {
        self.samples.iter()
    }

    pub fn as_slice(&self) -> &[ScoreData] {
        &self.samples
    }
}

impl FromIterator<ScoreData> for ScoreSeries {
    fn from_iter<I: IntoIterator<Item = ScoreData>>(iter: I) -> Self {
        Self {
            samples: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ScoreSeries {
    type Item = &'a ScoreData;
    type IntoIter = std::slice::Iter<'a, ScoreData>;

    fn into_iter(self) -> Self::IntoIter {
        self.samples.iter()
    }
}

/// Map a cursor x position across `width` pixels onto `0..=100`.
///
/// The position is clamped to the viewport first, so the result is monotonic in
/// `cursor_x`. A zero-width viewport scores 0.
pub fn score_from_cursor(cursor_x: f64, width: f64) -> u8 {
    if width.is_nan() || width <= 0.0 || !cursor_x.is_finite() {
        return 0;
    }
    let t = (cursor_x / width).clamp(0.0, 1.0);
    (t * f64::from(MAX_SCORE)).round() as u8
}

/// Cursor x position for a score, the inverse of [`score_from_cursor`].
pub fn cursor_for_score(score: u8, width: f64) -> f64 {
    map_range(f64::from(score.min(MAX_SCORE)), 0.0, f64::from(MAX_SCORE), 0.0, width)
}

/// Build the current sample from the cursor and the video's decode position.
///
/// Without a video the frame of `previous` is carried over.
pub fn sample(cursor_x: f64, width: f64, video_frame: Option<u64>, previous: ScoreData) -> ScoreData {
    ScoreData {
        frame: video_frame.unwrap_or(previous.frame),
        score: score_from_cursor(cursor_x, width),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quarter_width_scores_25() {
        assert_eq!(score_from_cursor(250.0, 1000.0), 25);
    }

    #[test]
    fn score_is_clamped_and_monotonic() {
        let width = 777.0;
        let mut prev = 0;
        for x in -50..=850 {
            let s = score_from_cursor(f64::from(x), width);
            assert!(s <= MAX_SCORE);
            assert!(s >= prev, "score decreased at x={x}");
            prev = s;
        }
        assert_eq!(score_from_cursor(-10.0, width), 0);
        assert_eq!(score_from_cursor(width, width), 100);
        assert_eq!(score_from_cursor(2.0 * width, width), 100);
    }

    #[test]
    fn degenerate_inputs_score_zero() {
        assert_eq!(score_from_cursor(10.0, 0.0), 0);
        assert_eq!(score_from_cursor(f64::NAN, 100.0), 0);
    }

    #[test]
    fn cursor_for_score_inverts_the_sampler() {
        for score in [0u8, 1, 25, 50, 99, 100] {
            let x = cursor_for_score(score, 640.0);
            assert_eq!(score_from_cursor(x, 640.0), score);
        }
    }

    #[test]
    fn sample_keeps_previous_frame_without_video() {
        let prev = ScoreData::new(42, 10);
        let s = sample(500.0, 1000.0, None, prev);
        assert_eq!(s, ScoreData::new(42, 50));
        let s = sample(500.0, 1000.0, Some(7), prev);
        assert_eq!(s.frame, 7);
    }

    #[test]
    fn series_keeps_insertion_order_and_duplicates() {
        let mut series = ScoreSeries::new();
        series.push(ScoreData::new(0, 25));
        series.push(ScoreData::new(0, 25));
        series.push(ScoreData::new(10, 30));
        assert_eq!(series.len(), 3);
        assert_eq!(series.as_slice()[1], ScoreData::new(0, 25));
        assert_eq!(series.last(), Some(ScoreData::new(10, 30)));
        series.clear();
        assert!(series.is_empty());
    }
}
