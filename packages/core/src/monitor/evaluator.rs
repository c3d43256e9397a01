//! Edge evaluator
//!
//! Compares two consecutive snapshots of one machine against the rule
//! catalogue and reports the threshold crossings between them.

use crate::monitor::{
    rules::{RuleSet, ThresholdRule},
    types::{AlertEvent, MachineSnapshot, Severity},
};

/// Evaluate one `before -> after` transition against every rule.
///
/// Alerts come back in rule declaration order, at most one per rule. Only
/// degradation is reported: a refill never produces an alert.
///
/// This is a stateless pairwise detector. "One alert per crossing" holds only
/// when the caller feeds every consecutive pair of a machine's snapshots, in
/// order, so that the `after` of one call is the `before` of the next. If
/// intermediate states are skipped or coalesced, a crossing that happened
/// between two observed snapshots is either reported once (when the pair
/// still straddles the bound) or not at all (when the value dipped and
/// recovered in between). Out-of-order pairs are not detected.
pub fn evaluate(
    machine_id: &str,
    before: &MachineSnapshot,
    after: &MachineSnapshot,
    rules: &RuleSet,
) -> Vec<AlertEvent> {
    rules
        .rules()
        .iter()
        .filter_map(|rule| evaluate_rule(machine_id, before, after, rule))
        .collect()
}

/// Evaluate a single rule. Depleted takes precedence over Warning.
pub fn evaluate_rule(
    machine_id: &str,
    before: &MachineSnapshot,
    after: &MachineSnapshot,
    rule: &ThresholdRule,
) -> Option<AlertEvent> {
    let before_raw = rule.resource.read(before);
    let after_raw = rule.resource.read(after);
    let before_value = rule.measure(before_raw);
    let after_value = rule.measure(after_raw);

    let severity = if after_raw == 0 && before_raw > 0 {
        Severity::Depleted
    } else if after_value < rule.warning_bound
        && before_value >= rule.warning_bound
        && after_raw > 0
    {
        Severity::Warning
    } else {
        return None;
    };

    Some(AlertEvent {
        machine_id: machine_id.to_string(),
        resource: rule.resource,
        label: rule.label,
        severity,
        before_value,
        after_value,
        after_raw,
        message: describe(rule, severity, after_raw),
    })
}

fn describe(rule: &ThresholdRule, severity: Severity, after_raw: u64) -> String {
    match severity {
        Severity::Warning if rule.is_percentage() => format!(
            "{} dropped below {}% ({} {}). Refill required soon.",
            rule.label, rule.warning_bound, after_raw, rule.unit
        ),
        Severity::Warning => format!(
            "{} dropped to {} {}. Refill recommended.",
            rule.label, after_raw, rule.unit
        ),
        Severity::Depleted => format!(
            "{} reached 0 {}. Sales have been halted.",
            rule.label, rule.unit
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::rules::{LARGE_CUPS, LIQUID, SMALL_CUPS};

    fn cups(small: u64, large: u64) -> MachineSnapshot {
        let mut snapshot = MachineSnapshot::default();
        snapshot.inventory.insert("smallCups".to_string(), small);
        snapshot.inventory.insert("largeCups".to_string(), large);
        snapshot.levels.insert("liquid".to_string(), 20_000);
        snapshot
    }

    fn liquid(ml: u64) -> MachineSnapshot {
        let mut snapshot = cups(100, 100);
        snapshot.levels.insert("liquid".to_string(), ml);
        snapshot
    }

    fn run(before: &MachineSnapshot, after: &MachineSnapshot) -> Vec<AlertEvent> {
        evaluate("M-0001", before, after, &RuleSet::default())
    }

    #[test]
    fn crossing_warning_bound_fires_warning() {
        let alerts = run(&cups(30, 100), &cups(29, 100));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].resource, SMALL_CUPS);
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert_eq!(alerts[0].after_raw, 29);
        assert!(alerts[0].message.contains("29 cups"));
    }

    #[test]
    fn landing_on_the_bound_does_not_fire() {
        assert!(run(&cups(35, 100), &cups(30, 100)).is_empty());
    }

    #[test]
    fn drop_straight_to_zero_fires_only_depleted() {
        let alerts = run(&cups(40, 100), &cups(0, 100));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Depleted);
        assert_eq!(alerts[0].before_value, 40.0);
        assert_eq!(alerts[0].after_value, 0.0);
    }

    #[test]
    fn already_below_bound_stays_silent() {
        assert!(run(&cups(5, 100), &cups(3, 100)).is_empty());
    }

    #[test]
    fn already_empty_stays_silent() {
        assert!(run(&cups(0, 100), &cups(0, 100)).is_empty());
    }

    #[test]
    fn low_to_zero_fires_depleted() {
        let alerts = run(&cups(3, 100), &cups(0, 100));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Depleted);
        assert!(alerts[0].message.contains("Sales have been halted"));
    }

    #[test]
    fn refill_across_bound_is_silent() {
        assert!(run(&cups(10, 100), &cups(80, 100)).is_empty());
        assert!(run(&cups(0, 0), &cups(50, 50)).is_empty());
        assert!(run(&liquid(0), &liquid(20_000)).is_empty());
    }

    #[test]
    fn liquid_warning_uses_percentage_of_capacity() {
        let alerts = run(&liquid(4000), &liquid(2900));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].resource, LIQUID);
        assert_eq!(alerts[0].severity, Severity::Warning);
        assert_eq!(alerts[0].before_value, 20.0);
        assert_eq!(alerts[0].after_value, 14.5);
        assert!(alerts[0].message.contains("below 15%"));
        assert!(alerts[0].message.contains("2900 ml"));
    }

    #[test]
    fn liquid_exactly_fifteen_percent_is_not_low() {
        assert!(run(&liquid(4000), &liquid(3000)).is_empty());
    }

    #[test]
    fn liquid_low_to_empty_fires_only_depleted() {
        let alerts = run(&liquid(2900), &liquid(0));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Depleted);
    }

    #[test]
    fn alerts_follow_rule_declaration_order() {
        let mut before = cups(50, 50);
        before.levels.insert("liquid".to_string(), 10_000);
        let mut after = cups(0, 10);
        after.levels.insert("liquid".to_string(), 1_000);

        let alerts = run(&before, &after);
        let order: Vec<_> = alerts.iter().map(|a| (a.resource, a.severity)).collect();
        assert_eq!(
            order,
            vec![
                (SMALL_CUPS, Severity::Depleted),
                (LARGE_CUPS, Severity::Warning),
                (LIQUID, Severity::Warning),
            ]
        );
    }

    #[test]
    fn missing_fields_read_as_zero() {
        let empty = MachineSnapshot::default();
        let alerts = run(&cups(50, 50), &empty);
        // Both cup kinds and the liquid tank go to zero.
        assert_eq!(alerts.len(), 3);
        assert!(alerts.iter().all(|a| a.severity == Severity::Depleted));
    }

    #[test]
    fn custom_rule_is_a_data_change() {
        use crate::monitor::rules::{ResourceKey, ThresholdRule};

        let rules = RuleSet::new(vec![ThresholdRule {
            resource: ResourceKey::level("syrup"),
            label: "Syrup level",
            unit: "ml",
            capacity: Some(1_000),
            warning_bound: 50.0,
        }]);
        let mut before = MachineSnapshot::default();
        before.levels.insert("syrup".to_string(), 600);
        let mut after = MachineSnapshot::default();
        after.levels.insert("syrup".to_string(), 400);

        let alerts = evaluate("M-0002", &before, &after, &rules);
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].machine_id, "M-0002");
        assert_eq!(alerts[0].label, "Syrup level");
    }

    #[test]
    fn hovering_at_boundary_fires_once() {
        let sequence = [cups(31, 100), cups(30, 100), cups(30, 100), cups(29, 100), cups(29, 100)];
        let fired: usize = sequence
            .windows(2)
            .map(|pair| run(&pair[0], &pair[1]).len())
            .sum();
        assert_eq!(fired, 1);
    }

    #[test]
    fn skipped_snapshot_can_hide_a_dip() {
        // 40 -> 20 -> 40 observed pairwise raises one warning...
        let observed = [cups(40, 100), cups(20, 100), cups(40, 100)];
        let fired: usize = observed
            .windows(2)
            .map(|pair| run(&pair[0], &pair[1]).len())
            .sum();
        assert_eq!(fired, 1);

        // ...but if the middle snapshot is coalesced away nothing fires.
        assert!(run(&observed[0], &observed[2]).is_empty());
    }

    #[test]
    fn skipped_snapshot_still_reports_a_straddled_crossing() {
        // 40 -> 25 -> 10 coalesced into 40 -> 10 still fires one warning.
        let alerts = run(&cups(40, 100), &cups(10, 100));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, Severity::Warning);
    }
}
