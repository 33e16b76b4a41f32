//! Closed-form loop bounds against brute-force unrolling

#[path = "../common/mod.rs"]
mod common;

use common::*;
use errorprop_engine::config::ErrorPropConfig;
use errorprop_engine::features::flow_graph::{FlowAnalysis, ScheduleItem};
use pretty_assertions::assert_eq;

#[test]
fn scenario_d_halving_loop_closed_form() {
    let fixture = halving_loop(3, 0.1);
    let analysis = analyze(&fixture.module);

    assert_no_failures(&analysis);
    // 0.1 * 0.5^3
    assert_error_close(analysis.value_error(fixture.func, fixture.exit), 0.0125);
    assert_error_close(analysis.value_error(fixture.func, fixture.update), 0.0125);
    assert_error_close(analysis.function_error(fixture.func), 0.0125);
}

#[test]
fn closed_form_matches_unrolled_propagation() {
    for trip in [1, 3, 6] {
        let fixture = halving_loop(trip, 0.1);
        let closed = analyze(&fixture.module);
        let unrolled = analyze_with(&fixture.module, ErrorPropConfig::default().lipschitz_loops(false));

        assert_same_bound(
            closed.value_error(fixture.func, fixture.exit),
            unrolled.value_error(fixture.func, fixture.exit),
        );
        let expected = 0.1 * 0.5f64.powi(trip as i32);
        assert_error_close(unrolled.value_error(fixture.func, fixture.exit), expected);
    }
}

#[test]
fn eligible_loop_scheduled_as_closed_form() {
    let fixture = halving_loop(4, 0.1);
    let func = fixture.module.function(fixture.func).unwrap();
    let flow = FlowAnalysis::compute(func);

    let schedule = flow.schedule(func, &ErrorPropConfig::default());
    let closed: Vec<_> = schedule
        .items
        .iter()
        .filter_map(|item| match item {
            ScheduleItem::LipschitzLoop { trip_count, fallback, .. } => Some((*trip_count, fallback.len())),
            _ => None,
        })
        .collect();
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].0, 4);
    // the first iteration runs inline, the fallback repeats the rest
    assert_eq!(closed[0].1, 3);

    let unrolled = flow.schedule(func, &ErrorPropConfig::default().lipschitz_loops(false));
    assert!(unrolled
        .items
        .iter()
        .all(|item| matches!(item, ScheduleItem::Block { .. })));
}
