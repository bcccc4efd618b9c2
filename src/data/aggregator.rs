//! Dashboard Aggregator Module
//! Turns the sales table and the current selection into four chart-ready aggregates.

use super::loader::{SalesTable, AD_SPEND, MONTH, RECESSION, SALES, UNEMPLOYMENT, VEHICLE_TYPE, YEAR};
use super::view::{
    AggregateRow, AggregatedTable, ChartKind, ChartPanel, GroupKey, GroupedRow, GroupedTable,
    StatisticMode, ViewResult,
};
use polars::prelude::*;
use std::cmp::Ordering;
use tracing::{debug, warn};

/// Message shown when the selection cannot produce charts.
pub const PLACEHOLDER_MESSAGE: &str = "Please select a valid option.";

const VALUE_ALIAS: &str = "__value";

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    Mean,
    Sum,
}

impl Aggregation {
    fn expr(self, column: &str) -> Expr {
        match self {
            Aggregation::Mean => col(column).mean(),
            Aggregation::Sum => col(column).sum(),
        }
    }
}

/// Ordering applied to aggregate keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrder {
    Numeric,
    Calendar,
    Lexical,
}

/// Zero-based calendar position of a month label ("Jan", "january", "1").
pub fn month_rank(label: &str) -> Option<usize> {
    let label = label.trim().to_ascii_lowercase();
    if let Ok(n) = label.parse::<usize>() {
        return (1..=12).contains(&n).then(|| n - 1);
    }
    if label.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|name| *name == label || (label.len() == 3 && name.starts_with(&label)))
}

fn compare_keys(a: &GroupKey, b: &GroupKey, order: KeyOrder) -> Ordering {
    match order {
        KeyOrder::Numeric => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => a.to_string().cmp(&b.to_string()),
        },
        KeyOrder::Calendar => {
            let (a_label, b_label) = (a.to_string(), b.to_string());
            match (month_rank(&a_label), month_rank(&b_label)) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => a_label.cmp(&b_label),
            }
        }
        KeyOrder::Lexical => a.to_string().cmp(&b.to_string()),
    }
}

/// Computes dashboard views from the immutable sales table.
pub struct DashboardAggregator;

impl DashboardAggregator {
    /// Whether the year dropdown is disabled for `mode`.
    pub fn year_selector_disabled(mode: Option<StatisticMode>) -> bool {
        mode == Some(StatisticMode::RecessionPeriod)
    }

    /// Build the four dashboard panels for a selection.
    pub fn compute_view(
        table: &SalesTable,
        mode: Option<StatisticMode>,
        year: Option<i32>,
    ) -> ViewResult {
        debug!(?mode, ?year, "computing dashboard view");
        match (mode, year) {
            (Some(StatisticMode::RecessionPeriod), _) => Self::recession_view(table),
            (Some(StatisticMode::Yearly), Some(year)) => Self::yearly_view(table, year),
            _ => ViewResult::Placeholder(PLACEHOLDER_MESSAGE.to_string()),
        }
    }

    fn recession_view(table: &SalesTable) -> ViewResult {
        let recession = table
            .dataframe()
            .clone()
            .lazy()
            .filter(col(RECESSION).neq(lit(0)));

        ViewResult::Charts([
            ChartPanel::table(
                "Average Automobile Sales Over Recession Years",
                ChartKind::Line,
                Self::aggregate(recession.clone(), YEAR, SALES, Aggregation::Mean, KeyOrder::Numeric),
            ),
            ChartPanel::table(
                "Average Automobile Sales by Vehicle Type",
                ChartKind::Bar,
                Self::aggregate(
                    recession.clone(),
                    VEHICLE_TYPE,
                    SALES,
                    Aggregation::Mean,
                    KeyOrder::Lexical,
                ),
            ),
            ChartPanel::table(
                "Total Advertising Expenditure Share by Vehicle Type",
                ChartKind::Pie,
                Self::aggregate(
                    recession.clone(),
                    VEHICLE_TYPE,
                    AD_SPEND,
                    Aggregation::Sum,
                    KeyOrder::Lexical,
                ),
            ),
            ChartPanel::grouped(
                "Effect of Unemployment Rate on Vehicle Type and Sales",
                Self::aggregate_grouped(recession, UNEMPLOYMENT, VEHICLE_TYPE, SALES, Aggregation::Mean),
            ),
        ])
    }

    fn yearly_view(table: &SalesTable, year: i32) -> ViewResult {
        let all_years = table.dataframe().clone().lazy();
        let in_year = all_years.clone().filter(col(YEAR).eq(lit(year)));

        ViewResult::Charts([
            ChartPanel::table(
                "Average Automobile Sales Over Years",
                ChartKind::Line,
                Self::aggregate(all_years, YEAR, SALES, Aggregation::Mean, KeyOrder::Numeric),
            ),
            ChartPanel::table(
                format!("Total Monthly Automobile Sales in {year}"),
                ChartKind::Line,
                Self::aggregate(in_year.clone(), MONTH, SALES, Aggregation::Sum, KeyOrder::Calendar),
            ),
            ChartPanel::table(
                format!("Average Automobile Sales by Vehicle Type in {year}"),
                ChartKind::Bar,
                Self::aggregate(
                    in_year.clone(),
                    VEHICLE_TYPE,
                    SALES,
                    Aggregation::Mean,
                    KeyOrder::Lexical,
                ),
            ),
            ChartPanel::table(
                format!("Advertising Expenditure Share by Vehicle Type in {year}"),
                ChartKind::Pie,
                Self::aggregate(in_year, VEHICLE_TYPE, AD_SPEND, Aggregation::Sum, KeyOrder::Lexical),
            ),
        ])
    }

    /// Group `frame` by `key` and aggregate `value`. Failures yield an empty table.
    pub fn aggregate(
        frame: LazyFrame,
        key: &str,
        value: &str,
        aggregation: Aggregation,
        order: KeyOrder,
    ) -> AggregatedTable {
        Self::try_aggregate(frame, key, value, aggregation, order).unwrap_or_else(|e| {
            warn!(key, value, error = %e, "aggregation failed, using empty table");
            AggregatedTable::empty(key, value)
        })
    }

    fn try_aggregate(
        frame: LazyFrame,
        key: &str,
        value: &str,
        aggregation: Aggregation,
        order: KeyOrder,
    ) -> PolarsResult<AggregatedTable> {
        let df = frame
            .group_by([col(key)])
            .agg([aggregation.expr(value).alias(VALUE_ALIAS)])
            .collect()?;

        let keys = df.column(key)?;
        let values = df.column(VALUE_ALIAS)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut rows = Vec::with_capacity(df.height());
        for (i, value) in values.into_iter().enumerate() {
            let Some(value) = value.filter(|v| v.is_finite()) else {
                continue;
            };
            let Some(key) = GroupKey::from_any_value(&keys.get(i)?) else {
                continue;
            };
            rows.push(AggregateRow { key, value });
        }
        rows.sort_by(|a, b| compare_keys(&a.key, &b.key, order));

        Ok(AggregatedTable {
            key_label: key.to_string(),
            value_label: value.to_string(),
            rows,
        })
    }

    /// Group by (`key`, `series`) and aggregate `value`; rows ordered by key then series.
    pub fn aggregate_grouped(
        frame: LazyFrame,
        key: &str,
        series: &str,
        value: &str,
        aggregation: Aggregation,
    ) -> GroupedTable {
        Self::try_aggregate_grouped(frame, key, series, value, aggregation).unwrap_or_else(|e| {
            warn!(key, series, value, error = %e, "grouped aggregation failed, using empty table");
            GroupedTable::empty(key, series, value)
        })
    }

    fn try_aggregate_grouped(
        frame: LazyFrame,
        key: &str,
        series: &str,
        value: &str,
        aggregation: Aggregation,
    ) -> PolarsResult<GroupedTable> {
        let df = frame
            .group_by([col(key), col(series)])
            .agg([aggregation.expr(value).alias(VALUE_ALIAS)])
            .collect()?;

        let keys = df.column(key)?;
        let names = df.column(series)?.cast(&DataType::String)?;
        let names = names.str()?;
        let values = df.column(VALUE_ALIAS)?.cast(&DataType::Float64)?;
        let values = values.f64()?;

        let mut rows = Vec::with_capacity(df.height());
        for (i, (name, value)) in names.into_iter().zip(values.into_iter()).enumerate() {
            let (Some(name), Some(value)) = (name, value.filter(|v| v.is_finite())) else {
                continue;
            };
            let Some(key) = GroupKey::from_any_value(&keys.get(i)?) else {
                continue;
            };
            rows.push(GroupedRow {
                key,
                series: name.to_string(),
                value,
            });
        }
        rows.sort_by(|a, b| {
            compare_keys(&a.key, &b.key, KeyOrder::Numeric).then_with(|| a.series.cmp(&b.series))
        });

        Ok(GroupedTable {
            key_label: key.to_string(),
            series_label: series.to_string(),
            value_label: value.to_string(),
            rows,
        })
    }
}
