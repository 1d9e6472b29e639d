use crate::{
    config::Settings,
    foundation::{
        core::{Point, Rect, Viewport},
        error::ReelResult,
    },
    render::{Canvas, FontRenderer, HAlign, Rgba8, VAlign, draw_text, pixmap_from_frame},
    report::layout::{
        GRAPH_LINE_WIDTH, ThumbStrip, graph_domain, graph_point, grid_lines, scrub_frame,
        scrub_rect,
    },
    score::ScoreSeries,
    video::VideoDecoder,
};

const TIME_LABEL_SIZE_PX: f32 = 13.0;
const TIME_LABEL_OFFSET_PX: f64 = 15.0;

/// Render the cached part of the report: thumbnails (when a video is
/// available) and the score graph, on a transparent surface of the viewport size.
#[tracing::instrument(skip_all, fields(width = viewport.width, height = viewport.height, samples = series.len()))]
pub fn render_report(
    settings: &Settings,
    viewport: Viewport,
    series: &ScoreSeries,
    mut video: Option<&mut dyn VideoDecoder>,
) -> ReelResult<vello_cpu::Pixmap> {
    let mut canvas = Canvas::new(viewport);
    let total_frames = video.as_ref().map(|v| v.total_frames());

    if let Some(video) = video.as_deref_mut() {
        draw_thumbnails(&mut canvas, settings, viewport, video)?;
    }
    draw_score_graph(&mut canvas, settings, viewport, series, total_frames);

    Ok(canvas.finish())
}

fn draw_thumbnails(
    canvas: &mut Canvas,
    settings: &Settings,
    viewport: Viewport,
    video: &mut dyn VideoDecoder,
) -> ReelResult<()> {
    let band = settings.report_thumbs_rect.to_pixels(viewport);
    let Some(strip) = ThumbStrip::compute(
        viewport.width_f64(),
        band.height(),
        video.aspect_ratio(),
        band.y0,
    ) else {
        tracing::warn!("video has no usable aspect ratio, skipping thumbnails");
        return Ok(());
    };

    let total = video.total_frames();
    for i in 0..strip.count {
        video.set_frame(strip.frame_for_tile(i, total));
        match video.current_image() {
            Ok(Some(frame)) => canvas.draw_image(&pixmap_from_frame(&frame)?, strip.tile_rect(i)),
            Ok(None) => {}
            Err(err) => tracing::warn!(tile = i, error = %err, "thumbnail decode failed"),
        }
    }
    Ok(())
}

fn draw_score_graph(
    canvas: &mut Canvas,
    settings: &Settings,
    viewport: Viewport,
    series: &ScoreSeries,
    total_frames: Option<u64>,
) {
    let band = settings.report_graph_rect.to_pixels(viewport);
    canvas.fill_rect(band, Rgba8::BLACK);

    for (y, shade) in grid_lines(band, settings.grid_lines) {
        canvas.line(Point::new(band.x0, y), Point::new(band.x1, y), shade, 1.0);
    }

    let domain = graph_domain(total_frames, series.len());
    let points: Vec<Point> = series
        .iter()
        .map(|s| graph_point(*s, domain, band))
        .collect();
    canvas.polyline(
        &points,
        Rgba8::from_rgb(settings.score_rgb()),
        GRAPH_LINE_WIDTH,
    );
}

/// Draw the frame under the cursor below the report region, with its time
/// stamp. Runs every draw; nothing here is cached.
pub fn draw_scrub_preview(
    canvas: &mut Canvas,
    font: Option<&mut dyn FontRenderer>,
    settings: &Settings,
    viewport: Viewport,
    cursor_x: f64,
    video: &mut dyn VideoDecoder,
) -> ReelResult<Rect> {
    let total = video.total_frames();
    video.set_frame(scrub_frame(cursor_x, viewport.width_f64(), total));

    let rect = scrub_rect(
        cursor_x,
        viewport.width_f64(),
        video.aspect_ratio(),
        viewport.pixh(settings.report_frame_height),
        viewport.pixh(settings.report_rect().bottom()),
    );
    if let Some(frame) = video.current_image()? {
        canvas.draw_image(&pixmap_from_frame(&frame)?, rect);
    }

    if let Some(font) = font {
        let seconds = video.position() * video.duration_sec();
        draw_text(
            font,
            canvas,
            &format!("Time: {seconds:.2} s"),
            TIME_LABEL_SIZE_PX,
            rect.x0,
            rect.y1 + TIME_LABEL_OFFSET_PX,
            (HAlign::Left, VAlign::Bottom),
            Rgba8::WHITE,
        )?;
    }
    Ok(rect)
}
