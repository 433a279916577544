//! Sales Report Module
//! Builds every KPI and chart dataset for one filtered view.

use crate::data::schema::display;
use crate::stats::kpi::{CategoryValue, GroupedValues, KpiCalculator, Kpis, PaymentShare, StatsError};
use polars::prelude::*;
use tracing::debug;

/// Everything the dashboard shows for the current selection.
#[derive(Debug, Clone, PartialEq)]
pub struct SalesReport {
    pub kpis: Kpis,
    pub best_selling: CategoryValue,
    pub most_profitable: CategoryValue,
    /// Revenue per day, one group per city.
    pub daily_revenue: GroupedValues,
    pub revenue_by_city: Vec<CategoryValue>,
    /// Revenue per product line, one group per city.
    pub revenue_by_product: GroupedValues,
    pub payment_shares: Vec<PaymentShare>,
    pub rating_by_city: Vec<CategoryValue>,
}

impl SalesReport {
    /// Compute the full report. The first failing aggregate aborts the
    /// build; there is no partial report.
    pub fn build(df: &DataFrame) -> Result<Self, StatsError> {
        let report = Self {
            kpis: KpiCalculator::compute_kpis(df)?,
            best_selling: KpiCalculator::best_selling_product(df)?,
            most_profitable: KpiCalculator::most_profitable_product(df)?,
            daily_revenue: KpiCalculator::sum_by_pair(
                df,
                display::DATE,
                display::CITY,
                display::TOTAL,
            )?,
            revenue_by_city: KpiCalculator::sum_by(df, display::CITY, display::TOTAL)?,
            revenue_by_product: KpiCalculator::sum_by_pair(
                df,
                display::PRODUCT_LINE,
                display::CITY,
                display::TOTAL,
            )?,
            payment_shares: KpiCalculator::payment_shares(df)?,
            rating_by_city: KpiCalculator::mean_by(df, display::CITY, display::RATING)?,
        };

        debug!(
            sales = report.kpis.sale_count,
            revenue = report.kpis.total_revenue,
            "Built sales report"
        );
        Ok(report)
    }
}

/// Format a currency amount as `"{symbol} 1,234.56"`.
pub fn format_currency(value: f64, symbol: &str) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{symbol} {sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::sample_table;
    use crate::data::FilterSelection;

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(30.5, "R$"), "R$ 30.50");
        assert_eq!(format_currency(0.0, "R$"), "R$ 0.00");
        assert_eq!(format_currency(1234.567, "R$"), "R$ 1,234.57");
        assert_eq!(format_currency(322966.749, "R$"), "R$ 322,966.75");
        assert_eq!(format_currency(1_000_000.0, "$"), "$ 1,000,000.00");
        assert_eq!(format_currency(-999.999, "R$"), "R$ -1,000.00");
    }

    #[test]
    fn report_over_full_table() {
        let df = sample_table();
        let report = SalesReport::build(&df).unwrap();

        assert_eq!(report.kpis.sale_count, 5);
        assert_eq!(report.best_selling.label, "Health and beauty");
        assert_eq!(report.revenue_by_city.len(), 3);
        assert_eq!(report.rating_by_city.len(), 3);
        assert_eq!(report.payment_shares.len(), 4);
        assert_eq!(report.revenue_by_product.categories.len(), 4);
        assert_eq!(report.daily_revenue.groups.len(), 3);
    }

    #[test]
    fn report_over_empty_selection_fails() {
        let df = sample_table();
        let empty = FilterSelection {
            month: "2019-2".to_string(),
            cities: vec!["Yangon".to_string()],
            ..Default::default()
        }
        .apply(&df)
        .unwrap();

        assert!(matches!(
            SalesReport::build(&empty),
            Err(StatsError::EmptySelection)
        ));
    }
}
