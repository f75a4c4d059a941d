//! Derived labels and ratios computed from numeric results.
//!
//! Every function here is total over `f64`. Negative inputs are not valid
//! inventory or demand values and are clamped to 0 before classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Round to two decimal places, the reporting granularity for ratios.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round to one decimal place (ages and similar).
#[must_use]
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

// =============================================================================
// Stock status
// =============================================================================

/// Upper bounds (exclusive) of the low and moderate stock bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockThresholds {
    /// Below this (and above zero) stock is low.
    pub low: f64,
    /// Below this stock is moderate.
    pub moderate: f64,
}

impl Default for StockThresholds {
    fn default() -> Self {
        Self {
            low: 10.0,
            moderate: 50.0,
        }
    }
}

/// Stock level band of a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// No units.
    OutOfStock,
    /// Fewer than the low threshold.
    LowStock,
    /// Fewer than the moderate threshold.
    ModerateStock,
    /// At or above the moderate threshold.
    InStock,
}

impl StockStatus {
    /// Classify a unit count.
    #[must_use]
    pub fn classify(units: f64, thresholds: &StockThresholds) -> Self {
        let units = non_negative(units);
        if units <= 0.0 {
            Self::OutOfStock
        } else if units < thresholds.low {
            Self::LowStock
        } else if units < thresholds.moderate {
            Self::ModerateStock
        } else {
            Self::InStock
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OutOfStock => "out_of_stock",
            Self::LowStock => "low_stock",
            Self::ModerateStock => "moderate_stock",
            Self::InStock => "in_stock",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Alert severity
// =============================================================================

/// Urgency of a low-stock alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    /// Out of stock.
    Critical,
    /// At or below half the threshold.
    High,
    /// Above half the threshold.
    Medium,
}

impl AlertSeverity {
    /// Severity of `units` against `threshold`, or `None` above the threshold.
    #[must_use]
    pub fn classify(units: f64, threshold: f64) -> Option<Self> {
        let units = non_negative(units);
        if units > threshold {
            None
        } else if units <= 0.0 {
            Some(Self::Critical)
        } else if units <= threshold / 2.0 {
            Some(Self::High)
        } else {
            Some(Self::Medium)
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

impl fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Readiness
// =============================================================================

/// Whether stock covers forecast demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReadinessStatus {
    /// Score of at least 100.
    Ready,
    /// Score below 100.
    #[serde(rename = "Needs Restocking")]
    NeedsRestocking,
}

impl ReadinessStatus {
    /// Status for a readiness score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 100.0 {
            Self::Ready
        } else {
            Self::NeedsRestocking
        }
    }

    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::NeedsRestocking => "Needs Restocking",
        }
    }
}

impl fmt::Display for ReadinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inventory measured against forecast demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Readiness {
    /// Inventory as a percentage of demand, rounded to two places; 0 when demand is 0.
    pub score: f64,
    /// Classified on the unrounded percentage.
    pub status: ReadinessStatus,
}

impl Readiness {
    /// Score and classify stock against demand.
    #[must_use]
    pub fn assess(inventory: f64, demand: f64) -> Self {
        let percent = safe_ratio(non_negative(inventory), non_negative(demand)) * 100.0;
        Self {
            score: round2(percent),
            status: ReadinessStatus::from_score(percent),
        }
    }
}

// =============================================================================
// Restock need
// =============================================================================

/// Units missing to cover forecast demand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RestockNeed {
    /// `max(0, forecast - inventory)`.
    pub shortage: f64,
    /// `shortage > 0`.
    pub needs_restock: bool,
}

/// Shortage of `inventory` against `forecast`.
#[must_use]
pub fn restock_need(inventory: f64, forecast: f64) -> RestockNeed {
    let shortage = (non_negative(forecast) - non_negative(inventory)).max(0.0);
    RestockNeed {
        shortage,
        needs_restock: shortage > 0.0,
    }
}

// =============================================================================
// Shares
// =============================================================================

/// `part / whole`, 0 when `whole` is 0.
#[must_use]
pub fn safe_ratio(part: f64, whole: f64) -> f64 {
    if whole.abs() < f64::EPSILON {
        0.0
    } else {
        part / whole
    }
}

/// `part` as a percentage of `whole`, rounded to 2 dp; 0 when `whole` is 0.
#[must_use]
pub fn percentage_share(part: f64, whole: f64) -> f64 {
    round2(safe_ratio(part, whole) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(n: f64) -> StockStatus {
        StockStatus::classify(n, &StockThresholds::default())
    }

    #[test]
    fn test_stock_status_boundaries() {
        assert_eq!(status(0.0), StockStatus::OutOfStock);
        assert_eq!(status(1.0), StockStatus::LowStock);
        assert_eq!(status(9.0), StockStatus::LowStock);
        assert_eq!(status(10.0), StockStatus::ModerateStock);
        assert_eq!(status(49.0), StockStatus::ModerateStock);
        assert_eq!(status(50.0), StockStatus::InStock);
        assert_eq!(status(10_000.0), StockStatus::InStock);
    }

    #[test]
    fn test_stock_status_partition_is_total() {
        for n in 0..200 {
            let n = f64::from(n);
            let s = status(n);
            let expected = if n < 1.0 {
                StockStatus::OutOfStock
            } else if n < 10.0 {
                StockStatus::LowStock
            } else if n < 50.0 {
                StockStatus::ModerateStock
            } else {
                StockStatus::InStock
            };
            assert_eq!(s, expected, "n = {n}");
        }
    }

    #[test]
    fn test_stock_status_negative_clamped() {
        assert_eq!(status(-3.0), StockStatus::OutOfStock);
        assert_eq!(status(f64::NAN), StockStatus::OutOfStock);
    }

    #[test]
    fn test_stock_thresholds_are_configurable() {
        let thresholds = StockThresholds {
            low: 5.0,
            moderate: 20.0,
        };
        assert_eq!(
            StockStatus::classify(7.0, &thresholds),
            StockStatus::ModerateStock
        );
        assert_eq!(StockStatus::classify(20.0, &thresholds), StockStatus::InStock);
    }

    #[test]
    fn test_stock_status_serializes_snake_case() {
        let json = serde_json::to_string(&StockStatus::ModerateStock).unwrap_or_default();
        assert_eq!(json, "\"moderate_stock\"");
        assert_eq!(StockStatus::OutOfStock.to_string(), "out_of_stock");
    }

    #[test]
    fn test_alert_severity() {
        assert_eq!(AlertSeverity::classify(0.0, 10.0), Some(AlertSeverity::Critical));
        assert_eq!(AlertSeverity::classify(5.0, 10.0), Some(AlertSeverity::High));
        assert_eq!(AlertSeverity::classify(6.0, 10.0), Some(AlertSeverity::Medium));
        assert_eq!(AlertSeverity::classify(10.0, 10.0), Some(AlertSeverity::Medium));
        assert_eq!(AlertSeverity::classify(11.0, 10.0), None);
    }

    #[test]
    fn test_readiness_zero_demand() {
        let readiness = Readiness::assess(500.0, 0.0);
        assert!(readiness.score.abs() < f64::EPSILON);
        assert_eq!(readiness.status, ReadinessStatus::NeedsRestocking);
        assert!(Readiness::assess(0.0, 0.0).score.abs() < f64::EPSILON);
    }

    #[test]
    fn test_readiness_score_and_status() {
        let readiness = Readiness::assess(150.0, 120.0);
        assert!((readiness.score - 125.0).abs() < f64::EPSILON);
        assert_eq!(readiness.status, ReadinessStatus::Ready);

        let short = Readiness::assess(2.0, 3.0);
        assert!((short.score - 66.67).abs() < 1e-9);
        assert_eq!(short.status, ReadinessStatus::NeedsRestocking);
        assert_eq!(Readiness::assess(120.0, 120.0).status, ReadinessStatus::Ready);
    }

    #[test]
    fn test_readiness_status_ignores_rounding() {
        // 99.996% rounds up to 100.0 but demand is still not covered.
        let readiness = Readiness::assess(99_996.0, 100_000.0);
        assert!((readiness.score - 100.0).abs() < f64::EPSILON);
        assert_eq!(readiness.status, ReadinessStatus::NeedsRestocking);
    }

    #[test]
    fn test_readiness_status_wire_names() {
        let json = serde_json::to_string(&ReadinessStatus::NeedsRestocking).unwrap_or_default();
        assert_eq!(json, "\"Needs Restocking\"");
        assert_eq!(ReadinessStatus::Ready.to_string(), "Ready");
    }

    #[test]
    fn test_restock_need() {
        let need = restock_need(12.0, 20.0);
        assert!((need.shortage - 8.0).abs() < f64::EPSILON);
        assert!(need.needs_restock);

        let need = restock_need(25.0, 20.0);
        assert!(need.shortage.abs() < f64::EPSILON);
        assert!(!need.needs_restock);

        let need = restock_need(20.0, 20.0);
        assert!(!need.needs_restock);
    }

    #[test]
    fn test_percentage_shares_sum_to_hundred() {
        let parts = [3.0, 3.0, 3.0, 7.0, 11.0];
        let whole: f64 = parts.iter().sum();
        let total: f64 = parts.iter().map(|p| percentage_share(*p, whole)).sum();
        assert!((total - 100.0).abs() <= 0.05, "total = {total}");
    }

    #[test]
    fn test_percentage_share_zero_whole() {
        assert!(percentage_share(5.0, 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rounding() {
        assert!((round2(1.234_5) - 1.23).abs() < 1e-9);
        assert!((round2(2.675_1) - 2.68).abs() < 1e-9);
        assert!((round1(43.46) - 43.5).abs() < 1e-9);
    }
}
