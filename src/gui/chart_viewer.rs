//! Chart Viewer Widget
//! Central scrollable panel with the KPI cards and the five charts.

use crate::charts::{ChartKind, ChartPlotter};
use crate::stats::{format_currency, SalesReport};
use egui::{Color32, RichText, ScrollArea};

const CARD_SPACING: f32 = 15.0;

/// What the central panel currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ViewerContent {
    #[default]
    Empty,
    Report(Box<SalesReport>),
    /// The render cycle was aborted; nothing but the message is shown.
    Error(String),
}

pub struct ChartViewer {
    pub content: ViewerContent,
    pub currency_symbol: String,
}

impl Default for ChartViewer {
    fn default() -> Self {
        Self {
            content: ViewerContent::Empty,
            currency_symbol: "R$".to_string(),
        }
    }
}

impl ChartViewer {
    pub fn new(currency_symbol: &str) -> Self {
        Self {
            currency_symbol: currency_symbol.to_string(),
            ..Self::default()
        }
    }

    pub fn clear(&mut self) {
        self.content = ViewerContent::Empty;
    }

    pub fn set_report(&mut self, report: SalesReport) {
        self.content = ViewerContent::Report(Box::new(report));
    }

    pub fn set_error(&mut self, message: String) {
        self.content = ViewerContent::Error(message);
    }

    pub fn report(&self) -> Option<&SalesReport> {
        match &self.content {
            ViewerContent::Report(report) => Some(report.as_ref()),
            _ => None,
        }
    }

    fn metric(ui: &mut egui::Ui, title: &str, value: String) {
        egui::Frame::none()
            .fill(ui.visuals().widgets.noninteractive.bg_fill)
            .rounding(5.0)
            .inner_margin(10.0)
            .show(ui, |ui| {
                ui.set_min_width(ui.available_width());
                ui.label(RichText::new(title).size(13.0).color(Color32::GRAY));
                ui.label(RichText::new(value).size(24.0).strong());
            });
    }

    fn show_report(&self, ui: &mut egui::Ui, report: &SalesReport) {
        ui.label(RichText::new("Indicadores de Desempenho").size(20.0).strong());
        ui.add_space(5.0);

        ui.columns(3, |cols| {
            Self::metric(
                &mut cols[0],
                "Faturamento Total",
                format_currency(report.kpis.total_revenue, &self.currency_symbol),
            );
            Self::metric(
                &mut cols[1],
                "Quantidade de Vendas",
                report.kpis.sale_count.to_string(),
            );
            Self::metric(
                &mut cols[2],
                "Lucro Bruto",
                format_currency(report.kpis.gross_income, &self.currency_symbol),
            );
        });

        ui.add_space(CARD_SPACING);
        ui.columns(2, |cols| {
            Self::metric(
                &mut cols[0],
                "Produto Mais Vendido",
                report.best_selling.label.clone(),
            );
            Self::metric(
                &mut cols[1],
                "Produto Mais Lucrativo",
                report.most_profitable.label.clone(),
            );
        });

        ui.add_space(CARD_SPACING);
        ui.separator();
        ui.label(RichText::new("Análise de Faturamento e Desempenho").size(20.0).strong());
        ui.columns(2, |cols| {
            ChartPlotter::draw_grouped_bars(
                &mut cols[0],
                ChartKind::DailyRevenue,
                &report.daily_revenue,
                false,
            );
            ChartPlotter::draw_bars(&mut cols[1], ChartKind::RevenueByCity, &report.revenue_by_city);
        });

        ui.add_space(CARD_SPACING);
        ui.separator();
        ui.label(RichText::new("Análise por Categoria e Pagamento").size(20.0).strong());
        ui.columns(2, |cols| {
            ChartPlotter::draw_grouped_bars(
                &mut cols[0],
                ChartKind::RevenueByProduct,
                &report.revenue_by_product,
                true,
            );
            ChartPlotter::draw_payment_shares(&mut cols[1], &report.payment_shares);
        });

        ui.add_space(CARD_SPACING);
        ui.separator();
        ui.label(RichText::new("Satisfação do Cliente").size(20.0).strong());
        ui.columns(2, |cols| {
            ChartPlotter::draw_bars(&mut cols[0], ChartKind::RatingByCity, &report.rating_by_city);
        });
    }

    /// Draw the viewer
    pub fn show(&self, ui: &mut egui::Ui) {
        match &self.content {
            ViewerContent::Empty => {
                ui.centered_and_justified(|ui| {
                    ui.label(RichText::new("No Data").size(20.0));
                });
            }
            ViewerContent::Error(message) => {
                ui.centered_and_justified(|ui| {
                    ui.label(
                        RichText::new(message)
                            .size(18.0)
                            .color(Color32::from_rgb(220, 53, 69)),
                    );
                });
            }
            ViewerContent::Report(report) => {
                ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| self.show_report(ui, report));
            }
        }
    }
}
