//! Data module - CSV loading and selection-driven aggregation

mod aggregator;
mod loader;
mod view;

pub use aggregator::DashboardAggregator;
pub use loader::{DataSource, SalesDataLoader, SalesTable, RECESSION, SALES, VEHICLE_TYPE};
pub use view::{
    AggregatedTable, ChartKind, ChartPanel, GroupedTable, PanelData, Selection, StatisticMode,
    ViewResult,
};
