//! Chart Rendering
//!
//! Two figures per (participant, condition) unit: the raw total-force
//! trace annotated with every detected jump window, and the normalized
//! ensemble of one channel with its mean ± SD band. Output is SVG.
//! Styling is best-effort plumbing; the analysis lives upstream.

use crate::normalize::NormalizedJump;
use crate::report::ensemble::ChannelEnsemble;
use crate::segmentation::JumpRecord;
use crate::series::TimeSeries;
use plotters::prelude::*;
use std::path::Path;
use tracing::{info, warn};

const CHART_SIZE: (u32, u32) = (1280, 720);

fn draw_error<E: std::fmt::Display>(e: E) -> crate::Error {
    crate::Error::Report(e.to_string())
}

/// Render the raw total-force trace with shaded analysis windows,
/// flight-phase spans, and takeoff/landing markers.
pub fn render_force_overview(
    series: &TimeSeries,
    total_force: &[f64],
    jumps: &[JumpRecord],
    title: &str,
    path: &Path,
) -> crate::Result<()> {
    let y_max = total_force
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::MIN, f64::max);
    if y_max == f64::MIN {
        warn!(title, "no finite force samples, skipping overview chart");
        return Ok(());
    }
    let y_max = y_max * 1.1;

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(series.start_time()..series.end_time(), 0.0..y_max)
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .x_desc("Time (s)")
        .y_desc("Total force (N)")
        .draw()
        .map_err(draw_error)?;

    for (i, jump) in jumps.iter().enumerate() {
        let tint = Palette99::pick(i);

        // Buffered analysis window, then the flight phase on top of it
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(jump.start_ana, 0.0), (jump.end_ana, y_max)],
                tint.mix(0.12).filled(),
            )))
            .map_err(draw_error)?;
        chart
            .draw_series(std::iter::once(Rectangle::new(
                [(jump.takeoff_time, 0.0), (jump.landing_time, y_max)],
                tint.mix(0.25).filled(),
            )))
            .map_err(draw_error)?;

        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(jump.takeoff_time, 0.0), (jump.takeoff_time, y_max)],
                GREEN.stroke_width(2),
            )))
            .map_err(draw_error)?;
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(jump.landing_time, 0.0), (jump.landing_time, y_max)],
                RED.stroke_width(2),
            )))
            .map_err(draw_error)?;

        let mid = jump.takeoff_time + jump.flight_duration / 2.0;
        chart
            .draw_series(std::iter::once(Text::new(
                format!("jump {} ({:.2}s)", jump.index, jump.flight_duration),
                (mid, y_max * 0.92),
                ("sans-serif", 16).into_font(),
            )))
            .map_err(draw_error)?;
    }

    chart
        .draw_series(LineSeries::new(
            series
                .time()
                .iter()
                .zip(total_force.iter())
                .map(|(t, f)| (*t, *f)),
            BLACK.mix(0.7),
        ))
        .map_err(draw_error)?;

    root.present().map_err(draw_error)?;
    info!(path = %path.display(), jumps = jumps.len(), "wrote force overview chart");
    Ok(())
}

/// Render one channel's normalized ensemble: individual traces in the
/// background, mean line on top, ±SD band behind it.
pub fn render_ensemble_chart(
    ensemble: &ChannelEnsemble,
    jumps: &[&NormalizedJump],
    title: &str,
    path: &Path,
) -> crate::Result<()> {
    let axis = crate::normalize::linspace(0.0, 1.0, ensemble.mean.len());

    let mut y_min = f64::MAX;
    let mut y_max = f64::MIN;
    for (m, s) in ensemble.mean.iter().zip(ensemble.sd.iter()) {
        if m.is_finite() && s.is_finite() {
            y_min = y_min.min(m - s);
            y_max = y_max.max(m + s);
        }
    }
    for jump in jumps {
        if let Some(values) = jump.numeric_channel(&ensemble.channel) {
            for v in values.iter().copied().filter(|v| v.is_finite()) {
                y_min = y_min.min(v);
                y_max = y_max.max(v);
            }
        }
    }
    if y_min > y_max {
        warn!(channel = %ensemble.channel, "no finite values, skipping ensemble chart");
        return Ok(());
    }
    let pad = ((y_max - y_min) * 0.05).max(1e-6);
    let (y_min, y_max) = (y_min - pad, y_max + pad);

    let root = SVGBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(draw_error)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..1.0, y_min..y_max)
        .map_err(draw_error)?;

    chart
        .configure_mesh()
        .x_desc("Normalized time (0-100%)")
        .y_desc(ensemble.channel.as_str())
        .draw()
        .map_err(draw_error)?;

    // SD band first so every line draws on top of it
    let band: Vec<(f64, f64)> = axis
        .iter()
        .zip(ensemble.mean.iter().zip(ensemble.sd.iter()))
        .map(|(x, (m, s))| (*x, m + s))
        .chain(
            axis.iter()
                .zip(ensemble.mean.iter().zip(ensemble.sd.iter()))
                .rev()
                .map(|(x, (m, s))| (*x, m - s)),
        )
        .collect();
    let band_style = RGBColor(120, 120, 120).mix(0.25);
    chart
        .draw_series(std::iter::once(Polygon::new(band, band_style.filled())))
        .map_err(draw_error)?
        .label("± SD")
        .legend(move |(x, y)| {
            Rectangle::new([(x, y - 5), (x + 20, y + 5)], band_style.filled())
        });

    for (i, jump) in jumps.iter().enumerate() {
        if let Some(values) = jump.numeric_channel(&ensemble.channel) {
            let style = Palette99::pick(i).mix(0.4);
            chart
                .draw_series(LineSeries::new(
                    axis.iter().zip(values.iter()).map(|(x, v)| (*x, *v)),
                    style,
                ))
                .map_err(draw_error)?
                .label(jump.key.clone())
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], style)
                });
        }
    }

    chart
        .draw_series(LineSeries::new(
            axis.iter()
                .zip(ensemble.mean.iter())
                .map(|(x, m)| (*x, *m)),
            BLACK.stroke_width(3),
        ))
        .map_err(draw_error)?
        .label("mean")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.stroke_width(3)));

    chart
        .configure_series_labels()
        .border_style(BLACK)
        .background_style(WHITE.mix(0.8))
        .draw()
        .map_err(draw_error)?;

    root.present().map_err(draw_error)?;
    info!(path = %path.display(), channel = %ensemble.channel, "wrote ensemble chart");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{NormalizeConfig, TimeNormalizer};
    use crate::segmentation::{detect_jumps, SegmenterConfig};
    use crate::series::{Condition, TimeSeries, LEFT_FORCE_CHANNEL, RIGHT_FORCE_CHANNEL};

    fn jump_series() -> TimeSeries {
        let mut forces = vec![400.0; 60];
        for f in forces.iter_mut().take(35).skip(25) {
            *f = 10.0;
        }
        let time: Vec<f64> = (0..forces.len()).map(|i| i as f64 * 0.1).collect();
        let half: Vec<f64> = forces.iter().map(|f| f / 2.0).collect();
        TimeSeries::new(
            time,
            vec![
                (LEFT_FORCE_CHANNEL.to_string(), half.clone()),
                (RIGHT_FORCE_CHANNEL.to_string(), half),
            ],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn test_force_overview_smoke() {
        let series = jump_series();
        let config = SegmenterConfig::default();
        let jumps = detect_jumps(&series, Condition::Real1, &config).unwrap();
        assert!(!jumps.is_empty());

        let total = series
            .total_force(LEFT_FORCE_CHANNEL, RIGHT_FORCE_CHANNEL)
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("overview.svg");

        render_force_overview(&series, &total, &jumps, "ID_1 REAL_1", &path).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }

    #[test]
    fn test_ensemble_chart_smoke() {
        let series = jump_series();
        let jumps = detect_jumps(&series, Condition::Real1, &SegmenterConfig::default()).unwrap();
        let normalizer = TimeNormalizer::new(NormalizeConfig::default());
        let normalized: Vec<_> = jumps
            .iter()
            .filter_map(|j| normalizer.normalize(&series, j).unwrap())
            .collect();
        let refs: Vec<&NormalizedJump> = normalized.iter().collect();

        let ensemble = crate::report::channel_ensemble(&refs, LEFT_FORCE_CHANNEL)
            .unwrap()
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ensemble.svg");
        render_ensemble_chart(&ensemble, &refs, "ID_1 REAL_1 left force", &path).unwrap();
        assert!(path.exists());
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
