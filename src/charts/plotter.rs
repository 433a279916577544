//! Chart Plotter Module
//! Creates the interactive dashboard charts using egui_plot.

use crate::stats::{CategoryValue, GroupedValues, PaymentShare};
use egui::{Color32, RichText};
use egui_plot::{Bar, BarChart, GridMark, Legend, Plot};
use std::ops::RangeInclusive;

/// Qualitative palette shared by the window and the SVG export.
pub const PALETTE: [Color32; 10] = [
    Color32::from_rgb(99, 110, 250),  // Blue
    Color32::from_rgb(239, 85, 59),   // Red
    Color32::from_rgb(0, 204, 150),   // Green
    Color32::from_rgb(171, 99, 250),  // Purple
    Color32::from_rgb(255, 161, 90),  // Orange
    Color32::from_rgb(25, 211, 243),  // Cyan
    Color32::from_rgb(255, 102, 146), // Pink
    Color32::from_rgb(182, 232, 128), // Light Green
    Color32::from_rgb(255, 151, 255), // Magenta
    Color32::from_rgb(254, 203, 82),  // Yellow
];

/// The five charts of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    DailyRevenue,
    RevenueByCity,
    RevenueByProduct,
    PaymentShare,
    RatingByCity,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        ChartKind::DailyRevenue,
        ChartKind::RevenueByCity,
        ChartKind::RevenueByProduct,
        ChartKind::PaymentShare,
        ChartKind::RatingByCity,
    ];

    pub fn title(self) -> &'static str {
        match self {
            ChartKind::DailyRevenue => "Faturamento por Dia",
            ChartKind::RevenueByCity => "Faturamento por Filial",
            ChartKind::RevenueByProduct => "Faturamento por Tipo de Produto",
            ChartKind::PaymentShare => "Faturamento por Tipo de Pagamento",
            ChartKind::RatingByCity => "Avaliação das Filiais",
        }
    }

    /// (x axis, y axis) descriptions.
    pub fn axis_labels(self) -> (&'static str, &'static str) {
        match self {
            ChartKind::DailyRevenue => ("Data", "Faturamento (R$)"),
            ChartKind::RevenueByCity => ("Cidade", "Total"),
            ChartKind::RevenueByProduct => ("Faturamento (R$)", "Linha de Produto"),
            ChartKind::PaymentShare => ("Pagamento", "Participação (%)"),
            ChartKind::RatingByCity => ("Filial", "Avaliação Média"),
        }
    }

    pub fn file_name(self) -> &'static str {
        match self {
            ChartKind::DailyRevenue => "faturamento_por_dia.svg",
            ChartKind::RevenueByCity => "faturamento_por_filial.svg",
            ChartKind::RevenueByProduct => "faturamento_por_produto.svg",
            ChartKind::PaymentShare => "faturamento_por_pagamento.svg",
            ChartKind::RatingByCity => "avaliacao_das_filiais.svg",
        }
    }
}

/// Palette color for the n-th series.
pub fn series_color(index: usize) -> Color32 {
    PALETTE[index % PALETTE.len()]
}

/// Label for a category axis mark; only whole positions carry a label.
pub fn category_label(labels: &[String], position: f64) -> String {
    let idx = position.round();
    if (position - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    labels.get(idx as usize).cloned().unwrap_or_default()
}

/// Offset of group `group` within a category slot of width 0.8.
pub fn group_offset(group: usize, group_count: usize) -> (f64, f64) {
    let width = 0.8 / group_count.max(1) as f64;
    let offset = (group as f64 - (group_count as f64 - 1.0) / 2.0) * width;
    (offset, width)
}

/// Creates dashboard charts using egui_plot.
pub struct ChartPlotter;

impl ChartPlotter {
    const HEIGHT: f32 = 280.0;

    fn title(ui: &mut egui::Ui, kind: ChartKind) {
        ui.label(RichText::new(kind.title()).size(18.0).strong());
    }

    /// Grouped bars: one bar per (category, group), colored by group.
    pub fn draw_grouped_bars(
        ui: &mut egui::Ui,
        kind: ChartKind,
        data: &GroupedValues,
        horizontal: bool,
    ) {
        Self::title(ui, kind);
        let (x_label, y_label) = kind.axis_labels();
        let labels = data.categories.clone();

        let mut plot = Plot::new(format!("plot_{:?}", kind))
            .height(Self::HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .x_axis_label(x_label)
            .y_axis_label(y_label);

        let formatter = move |mark: GridMark, _range: &RangeInclusive<f64>| {
            category_label(&labels, mark.value)
        };
        plot = if horizontal {
            plot.y_axis_formatter(formatter)
        } else {
            plot.x_axis_formatter(formatter)
        };

        plot.show(ui, |plot_ui| {
            for (g, group) in data.groups.iter().enumerate() {
                let (offset, width) = group_offset(g, data.groups.len());
                let color = series_color(g);
                let bars: Vec<Bar> = data.values[g]
                    .iter()
                    .enumerate()
                    .filter(|(_, v)| **v != 0.0)
                    .map(|(c, &v)| {
                        Bar::new(c as f64 + offset, v)
                            .width(width)
                            .name(format!("{} - {}", data.categories[c], group))
                    })
                    .collect();

                let mut chart = BarChart::new(bars).name(group).color(color);
                if horizontal {
                    chart = chart.horizontal();
                }
                plot_ui.bar_chart(chart);
            }
        });
    }

    /// One bar per category.
    pub fn draw_bars(ui: &mut egui::Ui, kind: ChartKind, values: &[CategoryValue]) {
        Self::title(ui, kind);
        let (x_label, y_label) = kind.axis_labels();
        let labels: Vec<String> = values.iter().map(|v| v.label.clone()).collect();

        Plot::new(format!("plot_{:?}", kind))
            .height(Self::HEIGHT)
            .allow_scroll(false)
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                let bars: Vec<Bar> = values
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        Bar::new(i as f64, v.value)
                            .width(0.6)
                            .name(&v.label)
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).color(PALETTE[0]));
            });
    }

    /// Payment share as percentage bars, one color per method.
    pub fn draw_payment_shares(ui: &mut egui::Ui, shares: &[PaymentShare]) {
        let kind = ChartKind::PaymentShare;
        Self::title(ui, kind);
        let (x_label, y_label) = kind.axis_labels();
        let labels: Vec<String> = shares
            .iter()
            .map(|s| format!("{} ({:.1}%)", s.label, s.percent))
            .collect();

        Plot::new(format!("plot_{:?}", kind))
            .height(Self::HEIGHT)
            .legend(Legend::default())
            .allow_scroll(false)
            .include_y(100.0)
            .x_axis_label(x_label)
            .y_axis_label(y_label)
            .x_axis_formatter(move |mark, _range| category_label(&labels, mark.value))
            .show(ui, |plot_ui| {
                for (i, share) in shares.iter().enumerate() {
                    let bar = Bar::new(i as f64, share.percent)
                        .width(0.6)
                        .name(format!("{:.1}%", share.percent));
                    plot_ui.bar_chart(
                        BarChart::new(vec![bar])
                            .name(&share.label)
                            .color(series_color(i)),
                    );
                }
            });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels_only_on_whole_positions() {
        let labels = vec!["Mandalay".to_string(), "Yangon".to_string()];
        assert_eq!(category_label(&labels, 0.0), "Mandalay");
        assert_eq!(category_label(&labels, 1.0), "Yangon");
        assert_eq!(category_label(&labels, 0.5), "");
        assert_eq!(category_label(&labels, 2.0), "");
        assert_eq!(category_label(&labels, -1.0), "");
    }

    #[test]
    fn group_offsets_are_centered() {
        let (first, width) = group_offset(0, 3);
        let (middle, _) = group_offset(1, 3);
        let (last, _) = group_offset(2, 3);
        assert!((width - 0.8 / 3.0).abs() < 1e-12);
        assert!(middle.abs() < 1e-12);
        assert!((first + last).abs() < 1e-12);

        assert_eq!(group_offset(0, 1), (0.0, 0.8));
    }

    #[test]
    fn chart_files_are_distinct() {
        let mut names: Vec<_> = ChartKind::ALL.iter().map(|k| k.file_name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), ChartKind::ALL.len());
    }
}
