//! Statistics Calculator Module
//! Recession impact per vehicle type: descriptive stats and Welch's t-test.

use crate::data::{SalesTable, RECESSION, SALES, VEHICLE_TYPE};
use polars::prelude::*;
use rayon::prelude::*;
use statrs::distribution::{ContinuousCDF, StudentsT};

/// Significance threshold for t-test
pub const SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Mean and unbiased (n - 1) variance of a sample.
#[derive(Debug, Clone, Copy)]
struct Moments {
    n: usize,
    mean: f64,
    variance: f64,
}

impl Moments {
    fn of(values: &[f64]) -> Self {
        let n = values.len();
        let mean = values.iter().sum::<f64>() / n as f64;
        let sum_sq: f64 = values.iter().map(|x| (x - mean) * (x - mean)).sum();
        let variance = if n > 1 { sum_sq / (n - 1) as f64 } else { 0.0 };
        Self { n, mean, variance }
    }

    /// Squared standard error of the mean.
    fn sem_sq(&self) -> f64 {
        self.variance / self.n as f64
    }
}

/// Linearly interpolated quantile of ascending `sorted`, `q` in 0..=1.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    match sorted {
        [] => f64::NAN,
        [only] => *only,
        _ => {
            let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
            let below = pos.floor() as usize;
            let above = (below + 1).min(sorted.len() - 1);
            let weight = pos - below as f64;
            sorted[below] + (sorted[above] - sorted[below]) * weight
        }
    }
}

/// Summary of one group of monthly sales.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleStats {
    pub count: usize,
    pub mean: f64,
    pub median: f64,
    pub std: f64,
}

impl Default for SampleStats {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            median: f64::NAN,
            std: f64::NAN,
        }
    }
}

impl SampleStats {
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let moments = Moments::of(values);

        Self {
            count: moments.n,
            mean: moments.mean,
            median: quantile(&sorted, 0.5),
            std: moments.variance.sqrt(),
        }
    }
}

/// Two-sided Welch's t-test between recession and normal sales.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WelchTest {
    pub t: f64,
    pub dof: f64,
    pub p_value: f64,
}

impl WelchTest {
    /// `None` when either group has fewer than two observations.
    pub fn compare(a: &[f64], b: &[f64]) -> Option<Self> {
        if a.len() < 2 || b.len() < 2 {
            return None;
        }
        let (ma, mb) = (Moments::of(a), Moments::of(b));
        let pooled = ma.sem_sq() + mb.sem_sq();

        // Both groups constant: no evidence of a difference.
        if pooled == 0.0 {
            return Some(Self {
                t: 0.0,
                dof: (ma.n + mb.n - 2) as f64,
                p_value: 1.0,
            });
        }

        let t = (ma.mean - mb.mean) / pooled.sqrt();
        let dof = pooled.powi(2)
            / (ma.sem_sq().powi(2) / (ma.n - 1) as f64 + mb.sem_sq().powi(2) / (mb.n - 1) as f64);
        let p_value = StudentsT::new(0.0, 1.0, dof)
            .map(|dist| 2.0 * dist.sf(t.abs()))
            .unwrap_or(f64::NAN);

        Some(Self { t, dof, p_value })
    }

    pub fn is_significant(&self) -> bool {
        self.p_value <= SIGNIFICANCE_THRESHOLD
    }
}

/// Sales during recession vs. outside recession for one vehicle type.
#[derive(Debug, Clone)]
pub struct RecessionImpact {
    pub vehicle_type: String,
    pub recession: SampleStats,
    pub normal: SampleStats,
    pub welch: Option<WelchTest>,
}

impl RecessionImpact {
    /// NaN when a group is too small to test.
    pub fn p_value(&self) -> f64 {
        self.welch.map_or(f64::NAN, |test| test.p_value)
    }

    pub fn is_significant(&self) -> bool {
        self.welch.is_some_and(|test| test.is_significant())
    }

    /// Relative change of mean sales in recession, e.g. -0.25 for a 25% drop.
    pub fn mean_change(&self) -> Option<f64> {
        let (rec, norm) = (self.recession.mean, self.normal.mean);
        if rec.is_finite() && norm.is_finite() && norm != 0.0 {
            Some((rec - norm) / norm)
        } else {
            None
        }
    }
}

/// Recession impact over a loaded sales table.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Sales values for a vehicle type, inside or outside recession.
    pub fn sales_values(df: &DataFrame, vehicle_type: &str, in_recession: bool) -> Vec<f64> {
        let recession_filter = if in_recession {
            col(RECESSION).neq(lit(0))
        } else {
            col(RECESSION).eq(lit(0))
        };

        df.clone()
            .lazy()
            .filter(col(VEHICLE_TYPE).eq(lit(vehicle_type)).and(recession_filter))
            .select([col(SALES)])
            .collect()
            .ok()
            .and_then(|df| df.column(SALES).ok().cloned())
            .map(|col| {
                col.f64()
                    .ok()
                    .map(|ca| ca.into_iter().flatten().filter(|v| v.is_finite()).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    /// Compare recession and non-recession sales for every vehicle type in parallel.
    pub fn recession_impact(table: &SalesTable) -> Vec<RecessionImpact> {
        let df = table.dataframe();

        let impacts: Vec<RecessionImpact> = table
            .vehicle_types()
            .par_iter()
            .map(|vehicle_type| {
                let recession = Self::sales_values(df, vehicle_type, true);
                let normal = Self::sales_values(df, vehicle_type, false);
                RecessionImpact {
                    vehicle_type: vehicle_type.clone(),
                    recession: SampleStats::from_values(&recession),
                    normal: SampleStats::from_values(&normal),
                    welch: WelchTest::compare(&recession, &normal),
                }
            })
            .collect();

        tracing::info!(
            vehicle_types = impacts.len(),
            significant = impacts.iter().filter(|i| i.is_significant()).count(),
            "computed recession impact statistics"
        );
        impacts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_stats_of_small_sample() {
        let stats = SampleStats::from_values(&[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(stats.count, 4);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
        assert!((stats.std - (5.0f64 / 3.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn sample_stats_of_empty_sample_are_nan() {
        let stats = SampleStats::from_values(&[]);
        assert_eq!(stats.count, 0);
        assert!(stats.mean.is_nan());
        assert!(stats.median.is_nan());
    }

    #[test]
    fn quantile_interpolates_between_neighbours() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!((quantile(&sorted, 0.05) - 1.15).abs() < 1e-12);
        assert!((quantile(&sorted, 0.95) - 3.85).abs() < 1e-12);
        assert_eq!(quantile(&sorted, 1.0), 4.0);
        assert_eq!(quantile(&[7.0], 0.3), 7.0);
    }

    #[test]
    fn welch_detects_clear_difference() {
        let low = [10.0, 11.0, 9.5, 10.5, 10.2, 9.8];
        let high = [20.0, 21.0, 19.5, 20.5, 20.2, 19.8];
        let test = WelchTest::compare(&low, &high).unwrap();
        assert!(test.t < 0.0);
        assert!(test.p_value < 0.001);
        assert!(test.is_significant());
    }

    #[test]
    fn welch_identical_samples_not_significant() {
        let a = [1.0, 2.0, 3.0, 4.0];
        let test = WelchTest::compare(&a, &a).unwrap();
        assert_eq!(test.t, 0.0);
        assert!((test.p_value - 1.0).abs() < 1e-9);
        assert!(!test.is_significant());
    }

    #[test]
    fn welch_constant_groups_are_not_significant() {
        let test = WelchTest::compare(&[5.0, 5.0], &[5.0, 5.0, 5.0]).unwrap();
        assert_eq!(test.p_value, 1.0);
        assert!(!test.is_significant());
    }

    #[test]
    fn welch_needs_two_samples_each() {
        assert!(WelchTest::compare(&[1.0], &[1.0, 2.0, 3.0]).is_none());
    }

    #[test]
    fn recession_impact_per_vehicle_type() {
        let df = df!(
            "Year" => [1980i32, 1980, 1981, 1981, 1982, 1982],
            "Month" => ["Jan", "Feb", "Jan", "Feb", "Jan", "Feb"],
            VEHICLE_TYPE => ["Sports", "Sports", "Sports", "Sports", "Sports", "Bus"],
            SALES => [100.0, 120.0, 300.0, 320.0, 310.0, 50.0],
            "Advertising_Expenditure" => [1.0, 1.0, 1.0, 1.0, 1.0, 1.0],
            "Unemployment_Rate" => [6.0, 6.0, 3.0, 3.0, 3.0, 3.0],
            RECESSION => [1i32, 1, 0, 0, 0, 0],
        )
        .unwrap();
        let table = SalesTable::from_dataframe(df).unwrap();

        let impacts = StatsCalculator::recession_impact(&table);
        let names: Vec<&str> = impacts.iter().map(|i| i.vehicle_type.as_str()).collect();
        assert_eq!(names, vec!["Bus", "Sports"]);

        let bus = &impacts[0];
        assert_eq!(bus.recession.count, 0);
        assert_eq!(bus.normal.count, 1);
        assert!(bus.mean_change().is_none());
        assert!(bus.welch.is_none());
        assert!(bus.p_value().is_nan());
        assert!(!bus.is_significant());

        let sports = &impacts[1];
        assert_eq!(sports.recession.mean, 110.0);
        assert_eq!(sports.normal.mean, 310.0);
        let change = sports.mean_change().unwrap();
        assert!((change - (110.0 - 310.0) / 310.0).abs() < 1e-12);
        assert!(sports.is_significant());
    }
}
