//! The playback/recording state machine.
//!
//! Transitions are pure: they consume a [`Session`] and hand back the next one
//! together with the side effects the application must apply to its video,
//! cursor and report surface.

use crate::score::{ScoreData, ScoreSeries};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Waiting for a visitor; the score bar follows the cursor.
    Pre,
    /// Video running, every tick's sample is recorded.
    Playing,
    /// Thank-you screen.
    Post,
    /// Thumbnails, score graph and scrub preview.
    Report,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Phase::Pre => "pre",
            Phase::Playing => "playing",
            Phase::Post => "post",
            Phase::Report => "report",
        }
    }

    /// Phases in which the cursor is sampled every tick.
    pub fn samples_cursor(self) -> bool {
        matches!(self, Phase::Pre | Phase::Playing)
    }
}

/// Side effect requested by a transition, applied in order by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Warp the cursor to the middle of the score bar.
    CenterCursor,
    /// Make this identifier the current video, loading it on first use.
    SelectVideo(String),
    /// Seek the current video to frame 0 and play.
    RestartVideo,
    StopVideo,
    /// Size the report surface to the current viewport.
    AllocateReport,
}

/// Owned state of one installation run.
///
/// [`Session::default`] sits in Pre without having run any enter effects; use
/// [`Session::start`] for a properly entered session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    phase: Phase,
    series: ScoreSeries,
    current: ScoreData,
    report_generation: u64,
}

/// Result of a transition: the next session and the effects to apply.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct Transition {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn unchanged(session: Session) -> Self {
        Self {
            session,
            effects: Vec::new(),
        }
    }

    fn preceded_by(mut self, effect: Effect) -> Self {
        self.effects.insert(0, effect);
        self
    }
}

impl Default for Session {
    fn default() -> Self {
        Self {
            phase: Phase::Pre,
            series: ScoreSeries::new(),
            current: ScoreData::default(),
            report_generation: 0,
        }
    }
}

impl Session {
    /// A fresh session, already entered into [`Phase::Pre`].
    pub fn start() -> Transition {
        Self::default().enter(Phase::Pre)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn series(&self) -> &ScoreSeries {
        &self.series
    }

    /// Latest sample, recorded or not.
    pub fn current(&self) -> ScoreData {
        self.current
    }

    /// Bumped on every entry into [`Phase::Report`]; report caches key on it.
    pub fn report_generation(&self) -> u64 {
        self.report_generation
    }

    /// Enter `phase`, running its enter effects. Re-entering the current phase is allowed.
    pub fn enter(mut self, phase: Phase) -> Transition {
        tracing::info!(from = self.phase.name(), to = phase.name(), "enter phase");
        self.phase = phase;
        let effects = match phase {
            Phase::Pre => vec![Effect::CenterCursor, Effect::StopVideo],
            Phase::Playing => {
                self.series.clear();
                vec![Effect::CenterCursor, Effect::RestartVideo]
            }
            Phase::Post => vec![Effect::StopVideo],
            Phase::Report => {
                self.report_generation += 1;
                vec![Effect::StopVideo, Effect::AllocateReport]
            }
        };
        Transition {
            session: self,
            effects,
        }
    }

    /// The "advance" command: Pre → Playing → Post → Report → Pre.
    ///
    /// Leaving Pre selects `main_video` before playback starts.
    pub fn advance(self, main_video: &str) -> Transition {
        match self.phase {
            Phase::Pre => self
                .enter(Phase::Playing)
                .preceded_by(Effect::SelectVideo(main_video.to_string())),
            Phase::Playing => self.enter(Phase::Post),
            Phase::Post => self.enter(Phase::Report),
            Phase::Report => self.enter(Phase::Pre),
        }
    }

    /// Jump straight into Playing with the rehearsal video, from any phase.
    pub fn rehearse(self, test_video: &str) -> Transition {
        self.enter(Phase::Playing)
            .preceded_by(Effect::SelectVideo(test_video.to_string()))
    }

    /// Replace the series with a loaded recording and show its report.
    pub fn load(mut self, video_id: &str, series: ScoreSeries) -> Transition {
        self.series = series;
        self.current = self.series.last().unwrap_or_default();
        self.enter(Phase::Report)
            .preceded_by(Effect::SelectVideo(video_id.to_string()))
    }

    /// One update tick.
    ///
    /// In Pre the sample only becomes the current score. In Playing it is also
    /// appended, and the session moves to Post once the video is done or the
    /// score falls below `end_threshold`.
    pub fn tick(mut self, sample: ScoreData, video_done: bool, end_threshold: u8) -> Transition {
        match self.phase {
            Phase::Pre => {
                self.current = sample;
                Transition::unchanged(self)
            }
            Phase::Playing => {
                self.current = sample;
                self.series.push(sample);
                if video_done || sample.score < end_threshold {
                    tracing::info!(
                        video_done,
                        score = sample.score,
                        samples = self.series.len(),
                        "playback finished"
                    );
                    self.enter(Phase::Post)
                } else {
                    Transition::unchanged(self)
                }
            }
            Phase::Post | Phase::Report => Transition::unchanged(self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MAIN: &str = "video/main.mov";
    const TEST: &str = "video/test.mp4";

    fn playing() -> Session {
        Session::start().session.advance(MAIN).session
    }

    #[test]
    fn start_enters_pre_with_pre_effects() {
        let t = Session::start();
        assert_eq!(t.session.phase(), Phase::Pre);
        assert_eq!(t.effects, vec![Effect::CenterCursor, Effect::StopVideo]);
        assert_eq!(t.session.report_generation(), 0);
    }

    #[test]
    fn advance_cycles_through_all_phases() {
        let t = Session::start().session.advance(MAIN);
        assert_eq!(t.session.phase(), Phase::Playing);
        assert_eq!(
            t.effects,
            vec![
                Effect::SelectVideo(MAIN.to_string()),
                Effect::CenterCursor,
                Effect::RestartVideo
            ]
        );

        let t = t.session.advance(MAIN);
        assert_eq!(t.session.phase(), Phase::Post);
        assert_eq!(t.effects, vec![Effect::StopVideo]);

        let t = t.session.advance(MAIN);
        assert_eq!(t.session.phase(), Phase::Report);
        assert_eq!(t.effects, vec![Effect::StopVideo, Effect::AllocateReport]);
        assert_eq!(t.session.report_generation(), 1);

        let t = t.session.advance(MAIN);
        assert_eq!(t.session.phase(), Phase::Pre);
    }

    #[test]
    fn every_report_entry_marks_the_report_dirty() {
        let s = Session::start().session;
        let s = s.enter(Phase::Report).session;
        let s = s.enter(Phase::Report).session;
        assert_eq!(s.phase(), Phase::Report);
        assert_eq!(s.report_generation(), 2);
    }

    #[test]
    fn entering_playing_clears_the_series() {
        let mut s = playing();
        for f in 0..5 {
            s = s.tick(ScoreData::new(f, 50), false, 2).session;
        }
        assert_eq!(s.series().len(), 5);
        let s = s.rehearse(TEST).session;
        assert!(s.series().is_empty());
    }

    #[test]
    fn rehearse_selects_test_video_from_any_phase() {
        for phase in [Phase::Pre, Phase::Playing, Phase::Post, Phase::Report] {
            let s = Session::start().session.enter(phase).session;
            let t = s.rehearse(TEST);
            assert_eq!(t.session.phase(), Phase::Playing);
            assert_eq!(t.effects[0], Effect::SelectVideo(TEST.to_string()));
        }
    }

    #[test]
    fn low_score_ends_playing_after_the_sample_is_recorded() {
        let mut s = playing();
        let samples = [(0, 25), (10, 25), (20, 1)];
        let mut phases = Vec::new();
        for (frame, score) in samples {
            let t = s.tick(ScoreData::new(frame, score), false, 2);
            phases.push(t.session.phase());
            s = t.session;
        }
        assert_eq!(phases, vec![Phase::Playing, Phase::Playing, Phase::Post]);
        assert_eq!(s.series().len(), 3);
        assert_eq!(s.series().last(), Some(ScoreData::new(20, 1)));
    }

    #[test]
    fn video_done_ends_playing() {
        let t = playing().tick(ScoreData::new(99, 80), true, 2);
        assert_eq!(t.session.phase(), Phase::Post);
        assert_eq!(t.effects, vec![Effect::StopVideo]);
    }

    #[test]
    fn score_at_threshold_keeps_playing() {
        let t = playing().tick(ScoreData::new(1, 2), false, 2);
        assert_eq!(t.session.phase(), Phase::Playing);
        assert!(t.effects.is_empty());
    }

    #[test]
    fn pre_tick_updates_current_without_recording() {
        let s = Session::start().session;
        let t = s.tick(ScoreData::new(0, 1), false, 2);
        assert_eq!(t.session.phase(), Phase::Pre);
        assert_eq!(t.session.current(), ScoreData::new(0, 1));
        assert!(t.session.series().is_empty());
    }

    #[test]
    fn post_and_report_ignore_ticks() {
        for phase in [Phase::Post, Phase::Report] {
            let s = Session::start().session.enter(phase).session;
            let t = s.clone().tick(ScoreData::new(3, 0), true, 2);
            assert_eq!(t.session, s);
            assert!(t.effects.is_empty());
        }
    }

    #[test]
    fn load_replaces_series_and_enters_report() {
        let series: ScoreSeries = [ScoreData::new(0, 10), ScoreData::new(5, 90)]
            .into_iter()
            .collect();
        let t = playing().load("clip.mp4", series.clone());
        assert_eq!(t.session.phase(), Phase::Report);
        assert_eq!(t.session.series(), &series);
        assert_eq!(t.session.current(), ScoreData::new(5, 90));
        assert_eq!(
            t.effects,
            vec![
                Effect::SelectVideo("clip.mp4".to_string()),
                Effect::StopVideo,
                Effect::AllocateReport
            ]
        );
    }
}
