//! Sales Dashboard - Supermarket sales report with interactive filters
//!
//! Loads the sales CSV, filters it by month, city, gender and customer type,
//! and shows KPIs and charts. `--export` renders the charts headless.

mod charts;
mod config;
mod data;
mod gui;
mod stats;

use anyhow::{Context, Result};
use charts::StaticChartRenderer;
use clap::Parser;
use config::{DashboardConfig, LOG_ENV_VAR};
use data::{unique_values, DataLoader, FilterSelection, LoadOptions};
use eframe::egui;
use gui::SalesDashboardApp;
use stats::{format_currency, SalesReport};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sales-dashboard", version, about)]
struct Cli {
    /// Sales CSV file (overrides the config file)
    dataset: Option<PathBuf>,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Render the charts as SVG into this directory and exit
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Saved selection (JSON) to start from; the flags below override it
    #[arg(long, value_name = "FILE")]
    selection: Option<PathBuf>,

    /// Month bucket to report on, e.g. 2019-1 (default: first month)
    #[arg(long)]
    month: Option<String>,

    /// Restrict to these cities (repeatable)
    #[arg(long = "city")]
    cities: Vec<String>,

    /// Restrict to these genders (repeatable)
    #[arg(long = "gender")]
    genders: Vec<String>,

    /// Restrict to these customer types (repeatable)
    #[arg(long = "customer-type")]
    customer_types: Vec<String>,
}

/// Selection written next to the exported charts.
const SELECTION_FILE: &str = "selection.json";

/// Initialize tracing from SALES_DASHBOARD_LOG, defaulting to "info".
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env(LOG_ENV_VAR)
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Load, filter, build the report and write the SVG charts.
fn run_export(
    cli: Cli,
    config: &DashboardConfig,
    options: LoadOptions,
    dir: PathBuf,
) -> Result<()> {
    let mut loader = DataLoader::new(options);
    let df = loader
        .load(&config.dataset_path)
        .with_context(|| format!("loading {}", config.dataset_path.display()))?;

    let mut selection = match &cli.selection {
        Some(path) => FilterSelection::from_file(path)?,
        None => FilterSelection::default(),
    };
    if let Some(month) = cli.month {
        selection.month = month;
    }
    if selection.month.is_empty() {
        selection.month = unique_values(df, data::schema::display::MONTH)
            .into_iter()
            .next()
            .context("the sales table has no months")?;
    }
    for (flags, set) in [
        (cli.cities, &mut selection.cities),
        (cli.genders, &mut selection.genders),
        (cli.customer_types, &mut selection.customer_types),
    ] {
        if !flags.is_empty() {
            *set = flags;
        }
    }
    let filtered = selection.apply(df)?;
    let report = SalesReport::build(&filtered)
        .with_context(|| format!("building report for {}", selection.month))?;

    let paths = StaticChartRenderer::export_report(&report, &dir, config.export_size())?;
    selection.save(&dir.join(SELECTION_FILE))?;

    let symbol = &config.currency_symbol;
    println!("Mês: {}", selection.month);
    println!(
        "Faturamento Total: {}",
        format_currency(report.kpis.total_revenue, symbol)
    );
    println!("Quantidade de Vendas: {}", report.kpis.sale_count);
    println!(
        "Lucro Bruto: {}",
        format_currency(report.kpis.gross_income, symbol)
    );
    println!("Produto Mais Vendido: {}", report.best_selling.label);
    println!("Produto Mais Lucrativo: {}", report.most_profitable.label);
    for path in paths {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    if let Some(dataset) = &cli.dataset {
        config.dataset_path = dataset.clone();
    }
    let options = config.load_options()?;

    if let Some(dir) = cli.export.clone() {
        return run_export(cli, &config, options, dir);
    }

    info!(dataset = %config.dataset_path.display(), "Starting dashboard");

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1400.0, 900.0])
            .with_min_inner_size([1100.0, 700.0])
            .with_title("Dashboard de Vendas do Supermercado"),
        ..Default::default()
    };

    eframe::run_native(
        "Sales Dashboard",
        native_options,
        Box::new(move |cc| Ok(Box::new(SalesDashboardApp::new(cc, config, options)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
