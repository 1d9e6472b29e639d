#[cfg(feature = "media-ffmpeg")]
mod media_ffmpeg {
    use std::{path::Path, process::Command};

    use scorereel::{
        Installation, Phase, Recording, ScoreData, Settings, VideoLoader, Viewport,
        video::ffmpeg::{FfmpegLoader, is_ffmpeg_on_path, probe_video},
    };

    fn synth_clip(root: &Path) -> anyhow::Result<()> {
        std::fs::create_dir_all(root)?;
        let status = Command::new("ffmpeg")
            .args([
                "-v",
                "error",
                "-y",
                "-f",
                "lavfi",
                "-i",
                "testsrc=size=64x36:rate=30",
                "-t",
                "1",
                "-pix_fmt",
                "yuv420p",
                "-c:v",
                "libx264",
            ])
            .arg(root.join("clip.mp4"))
            .status()?;
        anyhow::ensure!(status.success(), "ffmpeg failed creating clip.mp4");
        Ok(())
    }

    #[test]
    fn probe_reports_clip_geometry() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        synth_clip(dir.path()).unwrap();

        let info = probe_video(&dir.path().join("clip.mp4")).unwrap();
        assert_eq!((info.width, info.height), (64, 36));
        assert!((info.source_fps() - 30.0).abs() < 1e-6);
        assert!((29..=31).contains(&info.frame_count), "{}", info.frame_count);
    }

    #[test]
    fn loader_decodes_frames_at_seek_positions() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        synth_clip(dir.path()).unwrap();

        let mut loader = FfmpegLoader::new(dir.path());
        assert!(loader.load("missing.mp4").is_err());
        let mut video = loader.load("clip.mp4").unwrap();
        assert_eq!(video.current_frame(), 0);

        video.set_frame(15);
        assert_eq!(video.current_frame(), 15);
        let frame = video.current_image().unwrap().unwrap();
        assert_eq!((frame.width, frame.height), (64, 36));
        assert_eq!(frame.rgba8_premul.len(), 64 * 36 * 4);

        video.set_frame(10_000);
        assert_eq!(video.current_frame(), video.total_frames() - 1);
    }

    #[test]
    fn report_with_real_video_draws_thumbnails() {
        if !is_ffmpeg_on_path() {
            eprintln!("skipping: ffmpeg/ffprobe not on PATH");
            return;
        }
        let dir = tempfile::tempdir().unwrap();
        synth_clip(dir.path()).unwrap();

        let settings = Settings {
            assets_root: dir.path().to_path_buf(),
            ..Settings::default()
        };
        let loader = FfmpegLoader::new(dir.path());
        let mut app = Installation::new(settings, Viewport::new(320, 180).unwrap(), Box::new(loader));
        app.setup();
        app.load_recording(Recording::new(
            "clip.mp4",
            [ScoreData::new(0, 50), ScoreData::new(29, 70)]
                .into_iter()
                .collect(),
        ));
        assert_eq!(app.session().phase(), Phase::Report);

        assert_eq!(app.registry().status("clip.mp4"), Some(true));
        let frame = app.draw();
        assert_eq!((frame.width(), frame.height()), (320, 180));
        assert_eq!(app.report_renders(), 1);
    }
}
