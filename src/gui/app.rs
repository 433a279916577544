//! Sales Dashboard Main Application
//! Main window with the filter sidebar and the report viewer.

use crate::charts::StaticChartRenderer;
use crate::config::DashboardConfig;
use crate::data::schema::display;
use crate::data::{load_sales_table, CacheKey, DataLoader, LoadOptions};
use crate::gui::{ChartViewer, ControlPanel, ControlPanelAction};
use crate::stats::SalesReport;
use egui::SidePanel;
use polars::prelude::DataFrame;
use std::path::PathBuf;
use std::sync::mpsc::{channel, Receiver, TryRecvError};
use std::thread;
use tracing::{info, warn};

/// CSV loading result from background thread
enum LoadResult {
    Complete { key: CacheKey, df: DataFrame },
    Error(String),
}

/// Main application window.
pub struct SalesDashboardApp {
    config: DashboardConfig,
    loader: DataLoader,
    control_panel: ControlPanel,
    chart_viewer: ChartViewer,

    // Async CSV loading
    load_rx: Option<Receiver<LoadResult>>,
    is_loading: bool,
}

impl SalesDashboardApp {
    pub fn new(
        _cc: &eframe::CreationContext<'_>,
        config: DashboardConfig,
        load_options: LoadOptions,
    ) -> Self {
        let mut app = Self {
            chart_viewer: ChartViewer::new(&config.currency_symbol),
            loader: DataLoader::new(load_options),
            control_panel: ControlPanel::new(),
            config,
            load_rx: None,
            is_loading: false,
        };

        let path = app.config.dataset_path.clone();
        app.start_loading(path);
        app
    }

    /// Load a sales file on a background thread, unless the cached table
    /// is still current.
    fn start_loading(&mut self, path: PathBuf) {
        if self.is_loading {
            return;
        }
        self.control_panel.csv_path = Some(path.clone());

        if self.loader.is_fresh(&path) {
            self.apply_loaded_table();
            return;
        }

        self.chart_viewer.clear();
        self.control_panel.export_enabled = false;
        self.control_panel.set_status("Loading CSV file...");
        self.is_loading = true;

        let (tx, rx) = channel();
        self.load_rx = Some(rx);
        let options = self.loader.options().clone();

        thread::spawn(move || {
            let result = CacheKey::for_path(&path)
                .and_then(|key| Ok((key, load_sales_table(&path, &options)?)));
            let result = match result {
                Ok((key, df)) => LoadResult::Complete { key, df },
                Err(e) => LoadResult::Error(e.to_string()),
            };
            let _ = tx.send(result);
        });
    }

    /// Check for CSV loading results
    fn check_load_results(&mut self) {
        let Some(rx) = self.load_rx.take() else {
            return;
        };

        match rx.try_recv() {
            Ok(LoadResult::Complete { key, df }) => {
                self.is_loading = false;
                self.loader.store(key, df);
                self.apply_loaded_table();
            }
            Ok(LoadResult::Error(error)) => {
                self.is_loading = false;
                self.fail(&format!("Error: {}", error));
            }
            Err(TryRecvError::Empty) => self.load_rx = Some(rx),
            Err(TryRecvError::Disconnected) => {
                self.is_loading = false;
                self.fail("Error: CSV loader stopped unexpectedly");
            }
        }
    }

    fn fail(&mut self, message: &str) {
        warn!("{}", message);
        self.control_panel.set_status(message);
        self.control_panel.export_enabled = false;
        self.chart_viewer.set_error(message.to_string());
    }

    /// Populate the filter controls from the loaded table, then render.
    fn apply_loaded_table(&mut self) {
        let months = self.loader.get_unique_values(display::MONTH);
        let cities = self.loader.get_unique_values(display::CITY);
        let genders = self.loader.get_unique_values(display::GENDER);
        let customer_types = self.loader.get_unique_values(display::CUSTOMER_TYPE);
        self.control_panel
            .update_options(months, cities, genders, customer_types);

        let rows = self.loader.get_dataframe().map(|df| df.height()).unwrap_or(0);
        self.control_panel
            .set_status(&format!("Loaded {} sales", rows));
        self.refresh_report();
    }

    /// Recompute the filtered view and the report for the current selection.
    fn refresh_report(&mut self) {
        let Some(df) = self.loader.get_dataframe() else {
            return;
        };
        let Some(selection) = self.control_panel.selection() else {
            self.chart_viewer.clear();
            self.control_panel.export_enabled = false;
            return;
        };

        let report = selection
            .apply(df)
            .map_err(|e| e.to_string())
            .and_then(|filtered| SalesReport::build(&filtered).map_err(|e| e.to_string()));

        match report {
            Ok(report) => {
                self.chart_viewer.set_report(report);
                self.control_panel.export_enabled = true;
            }
            Err(message) => {
                warn!(month = %selection.month, "{}", message);
                self.chart_viewer.set_error(message);
                self.control_panel.export_enabled = false;
            }
        }
    }

    /// Handle CSV file selection
    fn handle_browse_csv(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV Files", &["csv"])
            .pick_file()
        {
            self.start_loading(path);
        }
    }

    fn handle_reload(&mut self) {
        if let Some(path) = self.control_panel.csv_path.clone() {
            self.loader.invalidate();
            self.start_loading(path);
        }
    }

    /// Write the current charts as SVG files and open the folder.
    fn handle_export_svg(&mut self) {
        let Some(report) = self.chart_viewer.report() else {
            self.control_panel.set_status("No charts to export");
            return;
        };

        let Some(dir) = rfd::FileDialog::new()
            .set_directory(&self.config.export_dir)
            .pick_folder()
        else {
            return; // User cancelled
        };

        match StaticChartRenderer::export_report(report, &dir, self.config.export_size()) {
            Ok(paths) => {
                info!(dir = %dir.display(), "SVG export complete");
                self.control_panel
                    .set_status(&format!("Exported {} charts", paths.len()));
                if let Err(e) = open::that(&dir) {
                    warn!("Failed to open {}: {}", dir.display(), e);
                }
            }
            Err(e) => {
                self.control_panel
                    .set_status(&format!("Error: {}", e));
            }
        }
    }
}

impl eframe::App for SalesDashboardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.check_load_results();

        if self.is_loading {
            ctx.request_repaint();
        }

        // Left panel - Control Panel
        SidePanel::left("control_panel")
            .min_width(260.0)
            .max_width(320.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    let action = self.control_panel.show(ui);

                    match action {
                        ControlPanelAction::BrowseCsv => self.handle_browse_csv(),
                        ControlPanelAction::Reload => self.handle_reload(),
                        ControlPanelAction::SelectionChanged => self.refresh_report(),
                        ControlPanelAction::ExportSvg => self.handle_export_svg(),
                        ControlPanelAction::None => {}
                    }
                });
            });

        // Central panel - Report Viewer
        egui::CentralPanel::default().show(ctx, |ui| {
            self.chart_viewer.show(ui);
        });
    }
}
