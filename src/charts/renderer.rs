//! Static Chart Renderer
//! Writes the dashboard charts as SVG files using plotters.
//!
//! One file per chart:
//! 1. Daily revenue, grouped by city
//! 2. Revenue per city
//! 3. Revenue per product line, grouped by city (horizontal)
//! 4. Revenue share per payment method (pie)
//! 5. Average rating per city

use crate::charts::plotter::{category_label, group_offset, ChartKind, PALETTE};
use crate::stats::{CategoryValue, GroupedValues, PaymentShare, SalesReport};
use plotters::prelude::*;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to create {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to draw chart: {0}")]
    Draw(String),
    #[error("No data to draw for '{0}'")]
    Empty(&'static str),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for RenderError {
    fn from(err: DrawingAreaErrorKind<E>) -> Self {
        RenderError::Draw(err.to_string())
    }
}

/// Palette entry as a plotters color.
fn palette_color(index: usize) -> RGBColor {
    let [r, g, b, _] = PALETTE[index % PALETTE.len()].to_array();
    RGBColor(r, g, b)
}

/// Top of the value axis, with headroom above the tallest bar.
fn axis_top(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Render every chart of the report into `dir`, in parallel.
    /// Returns the written file paths in chart order. Charts with nothing
    /// to draw are skipped; any other failure aborts the export.
    pub fn export_report(
        report: &SalesReport,
        dir: &Path,
        size: (u32, u32),
    ) -> Result<Vec<PathBuf>, RenderError> {
        fs::create_dir_all(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let paths = ChartKind::ALL
            .par_iter()
            .map(|&kind| {
                let path = dir.join(kind.file_name());
                match Self::render_chart(report, kind, &path, size) {
                    Ok(()) => Ok(Some(path)),
                    Err(RenderError::Empty(title)) => {
                        warn!(chart = title, "Skipping chart with no data");
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            })
            .collect::<Result<Vec<Option<PathBuf>>, RenderError>>()?
            .into_iter()
            .flatten()
            .collect::<Vec<PathBuf>>();

        info!(dir = %dir.display(), charts = paths.len(), "Exported charts");
        Ok(paths)
    }

    /// Render one chart of the report to an SVG file.
    pub fn render_chart(
        report: &SalesReport,
        kind: ChartKind,
        path: &Path,
        size: (u32, u32),
    ) -> Result<(), RenderError> {
        match kind {
            ChartKind::DailyRevenue => {
                Self::draw_grouped_bars(path, size, kind, &report.daily_revenue, false)
            }
            ChartKind::RevenueByCity => {
                Self::draw_bars(path, size, kind, &report.revenue_by_city)
            }
            ChartKind::RevenueByProduct => {
                Self::draw_grouped_bars(path, size, kind, &report.revenue_by_product, true)
            }
            ChartKind::PaymentShare => Self::draw_pie(path, size, &report.payment_shares),
            ChartKind::RatingByCity => Self::draw_bars(path, size, kind, &report.rating_by_city),
        }
    }

    fn draw_bars(
        path: &Path,
        size: (u32, u32),
        kind: ChartKind,
        values: &[CategoryValue],
    ) -> Result<(), RenderError> {
        if values.is_empty() {
            return Err(RenderError::Empty(kind.title()));
        }

        let root = SVGBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let (x_desc, y_desc) = kind.axis_labels();
        let max = values.iter().map(|v| v.value).fold(0.0, f64::max);

        let mut chart = ChartBuilder::on(&root)
            .caption(kind.title(), (FONT, 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d((0..values.len()).into_segmented(), 0.0..axis_top(max))?;

        let label = |x: &SegmentValue<usize>| match x {
            SegmentValue::CenterOf(i) => values.get(*i).map(|v| v.label.clone()).unwrap_or_default(),
            _ => String::new(),
        };
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_desc(x_desc)
            .y_desc(y_desc)
            .x_label_formatter(&label)
            .draw()?;

        chart.draw_series(
            Histogram::vertical(&chart)
                .style(palette_color(0).filled())
                .margin(20)
                .data(values.iter().enumerate().map(|(i, v)| (i, v.value))),
        )?;

        root.present()?;
        Ok(())
    }

    fn draw_grouped_bars(
        path: &Path,
        size: (u32, u32),
        kind: ChartKind,
        data: &GroupedValues,
        horizontal: bool,
    ) -> Result<(), RenderError> {
        if data.is_empty() {
            return Err(RenderError::Empty(kind.title()));
        }

        let root = SVGBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;

        let (x_desc, y_desc) = kind.axis_labels();
        let n = data.categories.len();
        let category_range = -0.5..(n as f64 - 0.5);
        let value_range = 0.0..axis_top(data.max_value());
        let (x_range, y_range) = if horizontal {
            (value_range, category_range)
        } else {
            (category_range, value_range)
        };

        let mut chart = ChartBuilder::on(&root)
            .caption(kind.title(), (FONT, 24))
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(if horizontal { 180 } else { 70 })
            .build_cartesian_2d(x_range, y_range)?;

        let label = |position: &f64| category_label(&data.categories, *position);
        let mut mesh = chart.configure_mesh();
        mesh.x_desc(x_desc).y_desc(y_desc);
        if horizontal {
            mesh.disable_y_mesh().y_labels(n).y_label_formatter(&label);
        } else {
            mesh.disable_x_mesh().x_labels(n).x_label_formatter(&label);
        }
        mesh.draw()?;

        for (g, group) in data.groups.iter().enumerate() {
            let (offset, width) = group_offset(g, data.groups.len());
            let color = palette_color(g);

            let bars = data.values[g].iter().enumerate().map(|(c, &v)| {
                let start = c as f64 + offset - width / 2.0;
                let corners = if horizontal {
                    [(0.0, start), (v, start + width)]
                } else {
                    [(start, 0.0), (start + width, v)]
                };
                Rectangle::new(corners, color.filled())
            });

            chart
                .draw_series(bars)?
                .label(group.as_str())
                .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 10, y + 5)], color.filled()));
        }

        chart
            .configure_series_labels()
            .background_style(WHITE.mix(0.8))
            .border_style(BLACK)
            .draw()?;

        root.present()?;
        Ok(())
    }

    fn draw_pie(path: &Path, size: (u32, u32), shares: &[PaymentShare]) -> Result<(), RenderError> {
        let kind = ChartKind::PaymentShare;
        let total: f64 = shares.iter().map(|s| s.total).sum();
        if shares.is_empty() || total <= 0.0 {
            return Err(RenderError::Empty(kind.title()));
        }

        let root = SVGBackend::new(path, size).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(kind.title(), (FONT, 24))?;

        let (width, height) = root.dim_in_pixel();
        let center = ((width / 2) as i32, (height / 2) as i32);
        let radius = width.min(height) as f64 * 0.35;

        let sizes: Vec<f64> = shares.iter().map(|s| s.total).collect();
        let colors: Vec<RGBColor> = (0..shares.len()).map(palette_color).collect();
        let labels: Vec<String> = shares
            .iter()
            .map(|s| format!("{} {:.1}%", s.label, s.percent))
            .collect();

        let pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
        root.draw(&pie)?;

        root.present()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_matches_window_colors() {
        assert_eq!(palette_color(0).rgb(), (99, 110, 250));
        assert_eq!(palette_color(PALETTE.len() + 1).rgb(), palette_color(1).rgb());
    }

    #[test]
    fn axis_top_has_headroom() {
        assert!((axis_top(100.0) - 110.0).abs() < 1e-9);
        assert_eq!(axis_top(0.0), 1.0);
    }

    #[test]
    fn empty_data_is_rejected_before_drawing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.svg");

        let err = StaticChartRenderer::draw_bars(&path, (400, 300), ChartKind::RevenueByCity, &[])
            .unwrap_err();
        assert!(matches!(err, RenderError::Empty(_)));

        let err = StaticChartRenderer::draw_pie(&path, (400, 300), &[]).unwrap_err();
        assert!(matches!(err, RenderError::Empty(_)));
        assert!(!path.exists());
    }

    #[test]
    fn export_skips_charts_without_data() {
        let mut report = SalesReport::build(&crate::data::fixtures::sample_table()).unwrap();
        report.daily_revenue = GroupedValues::default();
        report.revenue_by_city.clear();
        report.revenue_by_product = GroupedValues::default();
        report.rating_by_city.clear();
        for share in &mut report.payment_shares {
            share.total = 0.0;
            share.percent = 0.0;
        }

        let dir = tempfile::tempdir().unwrap();
        let paths = StaticChartRenderer::export_report(&report, dir.path(), (400, 300)).unwrap();
        assert!(paths.is_empty());
        for kind in ChartKind::ALL {
            assert!(!dir.path().join(kind.file_name()).exists());
        }
    }
}
