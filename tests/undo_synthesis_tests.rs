//! End-to-end tests for the diff and undo synthesis pipeline

use comware_push::modules::network::{
    diff, synthesize, CommandPlan, ConfigText, DiffLine, Synthesis, NO_CHANGES,
};

fn run(previous: &[&str], current: &[&str]) -> Synthesis {
    synthesize(diff(previous, current).body())
}

fn text(lines: &[&str]) -> ConfigText {
    lines.iter().copied().collect()
}

#[test]
fn test_identical_configs_are_a_noop() {
    let configs: [&[&str]; 3] = [
        &[],
        &["sysname sw1"],
        &["vsi blue", " vxlan 10", "interface Tunnel1", " source 10.0.0.1"],
    ];
    for config in configs {
        let result = run(config, config);
        assert!(result.changed_lines.is_empty());
        assert!(result.commands.is_empty());
        assert!(diff(config, config).is_empty());
    }
}

#[test]
fn test_pipeline_is_deterministic() {
    let previous = [
        "sysname sw1",
        "ip vpn-instance red",
        "vsi blue",
        "interface Vsi-interface10",
        "bgp 65000",
    ];
    let current = ["sysname sw2", "vsi green", "bgp 65000"];

    let first = diff(&previous, &current);
    let second = diff(&previous, &current);
    assert_eq!(first.render(), second.render());
    assert_eq!(run(&previous, &current), run(&previous, &current));
}

#[test]
fn test_service_instance_context_line() {
    let result = run(&["context-line", "service-instance 5"], &["context-line"]);
    assert_eq!(
        result.commands,
        vec!["context-line", "undo service-instance 5", "quit"]
    );
}

#[test]
fn test_vpn_instance_under_removed_bgp() {
    let result = run(
        &["sysname sw1", "bgp", "ip vpn-instance test"],
        &["sysname sw1"],
    );
    assert_eq!(
        result.commands,
        vec!["bgp", "undo ip vpn-instance test", "quit"]
    );
}

#[test]
fn test_vpn_instance_without_bgp() {
    let result = run(&["sysname sw1", "ip vpn-instance test"], &["sysname sw1"]);
    assert_eq!(result.commands, vec!["undo ip vpn-instance test"]);
}

#[test]
fn test_unrecognized_removal_is_reported_only() {
    let result = run(&["description foo"], &[]);
    assert_eq!(result.changed_lines, vec![DiffLine::removed("description foo")]);
    assert!(result.commands.is_empty());
}

#[test]
fn test_empty_previous() {
    let result = run(&[], &["a", "b"]);
    assert_eq!(
        result.changed_lines,
        vec![DiffLine::added("a"), DiffLine::added("b")]
    );
    assert!(result.commands.is_empty());
}

#[test]
fn test_every_family_in_one_pass() {
    let previous = [
        "ip vpn-instance red",
        "ip route-static vpn-instance red 0.0.0.0 0 10.0.0.1",
        "vsi blue",
        "interface Vsi-interface10",
        "interface Tunnel5 mode vxlan",
        "sysname sw1",
    ];
    let result = run(&previous, &["sysname sw1"]);
    assert_eq!(
        result.commands,
        vec![
            "undo ip vpn-instance red",
            "undo ip route-static vpn-instance red 0.0.0.0 0 10.0.0.1",
            "undo vsi blue",
            "undo interface Vsi-interface10",
            "undo interface Tunnel5 mode vxlan",
        ]
    );
    assert_eq!(result.changed_lines.len(), 5);
}

#[test]
fn test_full_replacement_ignores_previous() {
    let lines = vec!["vsi red".to_string(), "sysname sw1".to_string()];
    let plan = CommandPlan::full_replacement(lines.clone());
    assert_eq!(plan.commands, lines);
    assert!(plan.undo_commands.is_empty());
    assert!(!plan.is_noop());
}

#[test]
fn test_incremental_plan_orders_undo_first() {
    let previous = text(&["vsi blue", "sysname sw1"]);
    let current = text(&["sysname sw1", "vsi red"]);
    let plan = CommandPlan::incremental(
        &previous,
        &current,
        vec!["sysname sw1".to_string(), "vsi red".to_string()],
    );
    assert_eq!(plan.commands, vec!["undo vsi blue", "sysname sw1", "vsi red"]);
    assert_eq!(plan.undo_commands, vec!["undo vsi blue"]);
}

#[test]
fn test_incremental_noop_plan() {
    let config = text(&["sysname sw1"]);
    let plan = CommandPlan::incremental(&config, &config, vec!["sysname sw1".to_string()]);
    assert!(plan.is_noop());
    assert_eq!(plan.commands, vec![NO_CHANGES]);
    assert!(plan.list_diff().is_empty());
}
