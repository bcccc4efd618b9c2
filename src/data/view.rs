//! Dashboard View Types
//! Selection inputs and the chart-ready aggregates produced for them.

use polars::prelude::AnyValue;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Top-level statistic selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatisticMode {
    Yearly,
    RecessionPeriod,
}

impl StatisticMode {
    pub const ALL: [StatisticMode; 2] = [StatisticMode::Yearly, StatisticMode::RecessionPeriod];

    /// Label shown in the statistic dropdown.
    pub fn label(self) -> &'static str {
        match self {
            StatisticMode::Yearly => "Yearly Statistics",
            StatisticMode::RecessionPeriod => "Recession Period Statistics",
        }
    }
}

impl fmt::Display for StatisticMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unrecognized statistic type: {0:?}")]
pub struct UnknownStatistic(pub String);

impl FromStr for StatisticMode {
    type Err = UnknownStatistic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StatisticMode::ALL
            .into_iter()
            .find(|mode| mode.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownStatistic(s.to_string()))
    }
}

/// The pair of user choices driving one recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Selection {
    pub mode: Option<StatisticMode>,
    pub year: Option<i32>,
}

/// Group key of an aggregate row.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupKey {
    Int(i64),
    Float(f64),
    Text(String),
}

impl GroupKey {
    /// Convert a polars cell; nulls, NaN and unsupported dtypes yield `None`.
    pub fn from_any_value(value: &AnyValue<'_>) -> Option<Self> {
        match value {
            AnyValue::Int8(v) => Some(GroupKey::Int(*v as i64)),
            AnyValue::Int16(v) => Some(GroupKey::Int(*v as i64)),
            AnyValue::Int32(v) => Some(GroupKey::Int(*v as i64)),
            AnyValue::Int64(v) => Some(GroupKey::Int(*v)),
            AnyValue::UInt8(v) => Some(GroupKey::Int(*v as i64)),
            AnyValue::UInt16(v) => Some(GroupKey::Int(*v as i64)),
            AnyValue::UInt32(v) => Some(GroupKey::Int(*v as i64)),
            AnyValue::Float32(v) if v.is_finite() => Some(GroupKey::Float(*v as f64)),
            AnyValue::Float64(v) if v.is_finite() => Some(GroupKey::Float(*v)),
            AnyValue::String(s) => Some(GroupKey::Text(s.to_string())),
            AnyValue::StringOwned(s) => Some(GroupKey::Text(s.to_string())),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            GroupKey::Int(v) => Some(*v as f64),
            GroupKey::Float(v) => Some(*v),
            GroupKey::Text(_) => None,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Int(v) => write!(f, "{v}"),
            GroupKey::Float(v) => write!(f, "{v}"),
            GroupKey::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: GroupKey,
    pub value: f64,
}

/// Ordered (key, value) pairs of a single-key aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedTable {
    pub key_label: String,
    pub value_label: String,
    pub rows: Vec<AggregateRow>,
}

impl AggregatedTable {
    pub fn empty(key_label: &str, value_label: &str) -> Self {
        Self {
            key_label: key_label.to_string(),
            value_label: value_label.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Value for the row whose key renders as `key`.
    #[cfg(test)]
    pub fn value_of(&self, key: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|row| row.key.to_string() == key)
            .map(|row| row.value)
    }

    pub fn labels(&self) -> Vec<String> {
        self.rows.iter().map(|row| row.key.to_string()).collect()
    }

    pub fn total(&self) -> f64 {
        self.rows.iter().map(|row| row.value).sum()
    }

    /// Each positive row's proportion of the positive total. Rows at or
    /// below zero have no slice; empty when nothing is positive.
    pub fn shares(&self) -> Vec<(GroupKey, f64)> {
        let positive: f64 = self
            .rows
            .iter()
            .map(|row| row.value)
            .filter(|v| *v > 0.0)
            .sum();
        if !(positive > 0.0) {
            return Vec::new();
        }
        self.rows
            .iter()
            .filter(|row| row.value > 0.0)
            .map(|row| (row.key.clone(), row.value / positive))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupedRow {
    pub key: GroupKey,
    pub series: String,
    pub value: f64,
}

/// Two-key aggregate: keyed by `key_label`, split into series by `series_label`.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupedTable {
    pub key_label: String,
    pub series_label: String,
    pub value_label: String,
    pub rows: Vec<GroupedRow>,
}

impl GroupedTable {
    pub fn empty(key_label: &str, series_label: &str, value_label: &str) -> Self {
        Self {
            key_label: key_label.to_string(),
            series_label: series_label.to_string(),
            value_label: value_label.to_string(),
            rows: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct keys in row order.
    pub fn keys(&self) -> Vec<GroupKey> {
        let mut keys: Vec<GroupKey> = Vec::new();
        for row in &self.rows {
            if keys.last() != Some(&row.key) {
                keys.push(row.key.clone());
            }
        }
        keys
    }

    /// Distinct series names, sorted.
    pub fn series_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.rows.iter().map(|row| row.series.clone()).collect();
        names.sort();
        names.dedup();
        names
    }

    /// (key, value) points of one series, in key order.
    pub fn series(&self, name: &str) -> Vec<(GroupKey, f64)> {
        self.rows
            .iter()
            .filter(|row| row.series == name)
            .map(|row| (row.key.clone(), row.value))
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    GroupedBar,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelData {
    Table(AggregatedTable),
    Grouped(GroupedTable),
}

/// One of the four dashboard charts.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartPanel {
    pub title: String,
    pub kind: ChartKind,
    pub data: PanelData,
}

impl ChartPanel {
    pub fn table(title: impl Into<String>, kind: ChartKind, table: AggregatedTable) -> Self {
        Self {
            title: title.into(),
            kind,
            data: PanelData::Table(table),
        }
    }

    pub fn grouped(title: impl Into<String>, table: GroupedTable) -> Self {
        Self {
            title: title.into(),
            kind: ChartKind::GroupedBar,
            data: PanelData::Grouped(table),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.data {
            PanelData::Table(table) => table.is_empty(),
            PanelData::Grouped(table) => table.is_empty(),
        }
    }

    pub fn as_table(&self) -> Option<&AggregatedTable> {
        match &self.data {
            PanelData::Table(table) => Some(table),
            PanelData::Grouped(_) => None,
        }
    }

    pub fn as_grouped(&self) -> Option<&GroupedTable> {
        match &self.data {
            PanelData::Grouped(table) => Some(table),
            PanelData::Table(_) => None,
        }
    }
}

/// Result of one recomputation.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewResult {
    Charts([ChartPanel; 4]),
    /// No valid selection; carries the message shown to the user
    Placeholder(String),
}

impl ViewResult {
    pub fn panels(&self) -> Option<&[ChartPanel; 4]> {
        match self {
            ViewResult::Charts(panels) => Some(panels),
            ViewResult::Placeholder(_) => None,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, ViewResult::Placeholder(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[(&str, f64)]) -> AggregatedTable {
        AggregatedTable {
            key_label: "Vehicle_Type".into(),
            value_label: "Advertising_Expenditure".into(),
            rows: rows
                .iter()
                .map(|(k, v)| AggregateRow {
                    key: GroupKey::Text(k.to_string()),
                    value: *v,
                })
                .collect(),
        }
    }

    #[test]
    fn statistic_mode_parses_its_labels() {
        assert_eq!(
            "Yearly Statistics".parse::<StatisticMode>(),
            Ok(StatisticMode::Yearly)
        );
        assert_eq!(
            " recession period statistics ".parse::<StatisticMode>(),
            Ok(StatisticMode::RecessionPeriod)
        );
        assert!("Monthly Statistics".parse::<StatisticMode>().is_err());
        for mode in StatisticMode::ALL {
            assert_eq!(mode.to_string().parse::<StatisticMode>(), Ok(mode));
        }
    }

    #[test]
    fn shares_sum_to_one() {
        let t = table(&[("Car", 30.0), ("Truck", 10.0)]);
        let shares = t.shares();
        assert_eq!(shares.len(), 2);
        assert!((shares[0].1 - 0.75).abs() < 1e-12);
        assert!((shares.iter().map(|(_, s)| s).sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn shares_of_zero_total_are_empty() {
        assert!(table(&[("Car", 0.0)]).shares().is_empty());
        assert!(table(&[]).shares().is_empty());
        assert!(table(&[("Car", -5.0), ("Truck", 0.0)]).shares().is_empty());
    }

    #[test]
    fn negative_rows_get_no_share() {
        let t = table(&[("Car", 50.0), ("Truck", -20.0), ("Bus", 50.0)]);
        let shares = t.shares();
        let labels: Vec<String> = shares.iter().map(|(k, _)| k.to_string()).collect();
        assert_eq!(labels, vec!["Car", "Bus"]);
        assert!(shares.iter().all(|(_, s)| (0.0..=1.0).contains(s)));
        assert!((shares[0].1 - 0.5).abs() < 1e-12);
    }

    #[test]
    fn group_key_conversion_skips_nulls_and_nan() {
        assert_eq!(GroupKey::from_any_value(&AnyValue::Null), None);
        assert_eq!(GroupKey::from_any_value(&AnyValue::Float64(f64::NAN)), None);
        assert_eq!(
            GroupKey::from_any_value(&AnyValue::Int32(1980)),
            Some(GroupKey::Int(1980))
        );
        assert_eq!(
            GroupKey::from_any_value(&AnyValue::String("Sports")),
            Some(GroupKey::Text("Sports".into()))
        );
        assert_eq!(GroupKey::Float(6.5).to_string(), "6.5");
    }

    #[test]
    fn grouped_table_splits_series() {
        let grouped = GroupedTable {
            key_label: "Unemployment_Rate".into(),
            series_label: "Vehicle_Type".into(),
            value_label: "Automobile_Sales".into(),
            rows: vec![
                GroupedRow { key: GroupKey::Float(2.5), series: "Truck".into(), value: 1.0 },
                GroupedRow { key: GroupKey::Float(2.5), series: "Car".into(), value: 2.0 },
                GroupedRow { key: GroupKey::Float(3.0), series: "Car".into(), value: 3.0 },
            ],
        };
        assert_eq!(grouped.keys(), vec![GroupKey::Float(2.5), GroupKey::Float(3.0)]);
        assert_eq!(grouped.series_names(), vec!["Car".to_string(), "Truck".to_string()]);
        assert_eq!(
            grouped.series("Car"),
            vec![(GroupKey::Float(2.5), 2.0), (GroupKey::Float(3.0), 3.0)]
        );
    }
}
