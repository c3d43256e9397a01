//! Threshold rule catalogue
//!
//! The monitored resources are a data table: adding a resource means adding a
//! [`ThresholdRule`] row, not a new branch in the evaluator.

use serde::Serialize;
use std::fmt;

use crate::monitor::types::MachineSnapshot;

/// Full liquid tank volume in ml.
pub const LIQUID_CAPACITY_ML: u64 = 20_000;

/// Cup count below which a warning fires.
pub const CUP_WARNING_BOUND: f64 = 30.0;

/// Liquid level (percent of capacity) below which a warning fires.
pub const LIQUID_WARNING_PERCENT: f64 = 15.0;

/// Which part of the machine document a resource lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    Inventory,
    Levels,
}

/// Identifies one monitored field of a [`MachineSnapshot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ResourceKey {
    pub container: Container,
    pub field: &'static str,
}

impl ResourceKey {
    pub const fn inventory(field: &'static str) -> Self {
        Self { container: Container::Inventory, field }
    }

    pub const fn level(field: &'static str) -> Self {
        Self { container: Container::Levels, field }
    }

    /// Read the raw value from a snapshot. Missing fields read as `0`.
    pub fn read(&self, snapshot: &MachineSnapshot) -> u64 {
        let map = match self.container {
            Container::Inventory => &snapshot.inventory,
            Container::Levels => &snapshot.levels,
        };
        map.get(self.field).copied().unwrap_or(0)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let container = match self.container {
            Container::Inventory => "inventory",
            Container::Levels => "levels",
        };
        write!(f, "{}.{}", container, self.field)
    }
}

pub const SMALL_CUPS: ResourceKey = ResourceKey::inventory("smallCups");
pub const LARGE_CUPS: ResourceKey = ResourceKey::inventory("largeCups");
pub const LIQUID: ResourceKey = ResourceKey::level("liquid");

/// Boundaries for one monitored quantity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdRule {
    pub resource: ResourceKey,
    /// Human-readable resource name used in messages
    pub label: &'static str,
    /// Unit of the raw reading, e.g. "cups" or "ml"
    pub unit: &'static str,
    /// When set, readings are compared as a percentage of this value
    pub capacity: Option<u64>,
    /// Raw count, or percent when `capacity` is set
    pub warning_bound: f64,
}

impl ThresholdRule {
    /// Convert a raw reading into the quantity compared against the bounds.
    ///
    /// A zero capacity is treated as "no capacity" rather than dividing by it.
    pub fn measure(&self, raw: u64) -> f64 {
        match self.capacity {
            Some(capacity) if capacity > 0 => raw as f64 * 100.0 / capacity as f64,
            _ => raw as f64,
        }
    }

    pub fn is_percentage(&self) -> bool {
        matches!(self.capacity, Some(capacity) if capacity > 0)
    }
}

/// Ordered rule catalogue. Evaluation order (and therefore alert order)
/// follows declaration order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleSet {
    rules: Vec<ThresholdRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<ThresholdRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[ThresholdRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::new(vec![
            ThresholdRule {
                resource: SMALL_CUPS,
                label: "Small cup stock",
                unit: "cups",
                capacity: None,
                warning_bound: CUP_WARNING_BOUND,
            },
            ThresholdRule {
                resource: LARGE_CUPS,
                label: "Large cup stock",
                unit: "cups",
                capacity: None,
                warning_bound: CUP_WARNING_BOUND,
            },
            ThresholdRule {
                resource: LIQUID,
                label: "Liquid level",
                unit: "ml",
                capacity: Some(LIQUID_CAPACITY_ML),
                warning_bound: LIQUID_WARNING_PERCENT,
            },
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalogue_has_fixed_bounds() {
        let rules = RuleSet::default();
        assert_eq!(rules.len(), 3);

        let small = &rules.rules()[0];
        assert_eq!(small.resource, SMALL_CUPS);
        assert_eq!(small.capacity, None);
        assert_eq!(small.warning_bound, 30.0);

        let liquid = &rules.rules()[2];
        assert_eq!(liquid.resource, LIQUID);
        assert_eq!(liquid.capacity, Some(20_000));
        assert_eq!(liquid.warning_bound, 15.0);
    }

    #[test]
    fn measure_converts_capacity_resources_to_percent() {
        let liquid = RuleSet::default().rules()[2].clone();
        assert_eq!(liquid.measure(4000), 20.0);
        assert_eq!(liquid.measure(2900), 14.5);
        assert_eq!(liquid.measure(0), 0.0);
    }

    #[test]
    fn measure_leaves_count_resources_raw() {
        let small = RuleSet::default().rules()[0].clone();
        assert_eq!(small.measure(42), 42.0);
    }

    #[test]
    fn zero_capacity_falls_back_to_raw_value() {
        let rule = ThresholdRule {
            resource: LIQUID,
            label: "Broken",
            unit: "ml",
            capacity: Some(0),
            warning_bound: 15.0,
        };
        assert_eq!(rule.measure(10), 10.0);
        assert!(!rule.is_percentage());
    }

    #[test]
    fn read_returns_zero_for_missing_field() {
        let snapshot = MachineSnapshot::default();
        assert_eq!(SMALL_CUPS.read(&snapshot), 0);
        assert_eq!(LIQUID.read(&snapshot), 0);
    }

    #[test]
    fn resource_key_displays_as_document_path() {
        assert_eq!(SMALL_CUPS.to_string(), "inventory.smallCups");
        assert_eq!(LIQUID.to_string(), "levels.liquid");
    }
}
