//! Integration tests for ramp limiting and hysteresis across cycles.

mod common;

use std::time::{Duration, Instant};

use evse_cluster::chargepoint::{ChargeMode, Hysteresis, SetPointRequest};

use common::{cluster, surplus_grid, three_phase_params};

#[test]
fn first_cycle_is_not_ramp_limited() {
    let mut cluster = cluster();
    let result = cluster.run_cycle(
        Instant::now(),
        surplus_grid(30000),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );
    assert_eq!(result.actions[0].set_point, SetPointRequest::MilliAmpere(16000));
}

#[test]
fn rising_allocation_is_ramp_limited_across_cycles() {
    let mut cluster = cluster();
    let t0 = Instant::now();

    // settle at the minimum first
    let result = cluster.run_cycle(
        t0,
        surplus_grid(4140),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );
    assert_eq!(result.entries[0].allocated_power, 4140);

    // then offer the full budget: 500 W/s rise toward 11040 W
    let mut now = t0;
    let mut last = 4140;
    let mut allocations = Vec::new();
    for _ in 0..20 {
        now += Duration::from_secs(1);
        let result = cluster.run_cycle(
            now,
            surplus_grid(30000),
            vec![three_phase_params("cp0", ChargeMode::Surplus)],
        );
        let allocated = result.entries[0].allocated_power;
        assert!(
            allocated - last <= 500,
            "rise {} exceeds 500 W in one second",
            allocated - last
        );
        assert!(allocated >= last, "allocation must not fall while rising");
        last = allocated;
        allocations.push(allocated);
    }
    assert_eq!(last, 11040, "must converge to the device maximum");
    assert_eq!(allocations[0], 4640);
    assert_eq!(allocations[1], 5140);
}

#[test]
fn falling_allocation_drops_immediately() {
    let mut cluster = cluster();
    let t0 = Instant::now();
    cluster.run_cycle(
        t0,
        surplus_grid(30000),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );

    let result = cluster.run_cycle(
        t0 + Duration::from_secs(1),
        surplus_grid(4140),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );
    assert_eq!(result.entries[0].allocated_power, 4140);
}

#[test]
fn vanished_budget_stops_charging_in_one_cycle() {
    let mut cluster = cluster();
    let t0 = Instant::now();
    cluster.run_cycle(
        t0,
        surplus_grid(30000),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );

    let result = cluster.run_cycle(
        t0 + Duration::from_secs(1),
        surplus_grid(0),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );
    assert_eq!(result.actions[0].set_point, SetPointRequest::Zero);
}

#[test]
fn restart_after_zero_steps_to_minimum_first() {
    let mut cluster = cluster();
    let t0 = Instant::now();
    let result = cluster.run_cycle(
        t0,
        surplus_grid(0),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );
    assert_eq!(result.entries[0].allocated_power, 0);

    // budget returns: the first step up is the minimum, not the target
    let result = cluster.run_cycle(
        t0 + Duration::from_secs(1),
        surplus_grid(30000),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );
    assert_eq!(result.actions[0].set_point, SetPointRequest::MilliAmpere(6000));

    // and the ramp takes over from there
    let result = cluster.run_cycle(
        t0 + Duration::from_secs(2),
        surplus_grid(30000),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );
    assert_eq!(result.entries[0].allocated_power, 4640);
}

#[test]
fn force_mode_bypasses_the_ramp() {
    let mut cluster = cluster();
    let t0 = Instant::now();
    cluster.run_cycle(
        t0,
        surplus_grid(4140),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );

    // switching to FORCE jumps straight to the device maximum
    let result = cluster.run_cycle(
        t0 + Duration::from_secs(1),
        surplus_grid(0),
        vec![three_phase_params("cp0", ChargeMode::Force)],
    );
    assert_eq!(result.actions[0].set_point, SetPointRequest::MilliAmpere(16000));
}

#[test]
fn ramp_continues_from_a_forced_value() {
    let mut cluster = cluster();
    let t0 = Instant::now();
    cluster.run_cycle(
        t0,
        surplus_grid(0),
        vec![three_phase_params("cp0", ChargeMode::Force)],
    );

    // back to SURPLUS with a small budget: the drop is immediate
    let result = cluster.run_cycle(
        t0 + Duration::from_secs(1),
        surplus_grid(4140),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );
    assert_eq!(result.entries[0].allocated_power, 4140);
}

#[test]
fn clock_rollback_grants_no_ramp_allowance() {
    let mut cluster = cluster();
    let t0 = Instant::now() + Duration::from_secs(1000);
    cluster.run_cycle(
        t0,
        surplus_grid(4140),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );

    // a cycle stamped earlier than the history entry gets zero elapsed
    let result = cluster.run_cycle(
        t0 - Duration::from_secs(500),
        surplus_grid(30000),
        vec![three_phase_params("cp0", ChargeMode::Surplus)],
    );
    assert_eq!(result.entries[0].allocated_power, 4140);
}

#[test]
fn fully_charged_is_held_at_minimum_despite_budget() {
    let mut cluster = cluster();
    let t0 = Instant::now();
    let mut params = three_phase_params("cp0", ChargeMode::Surplus);
    params.appears_to_be_fully_charged = true;

    for s in 0..5 {
        let result = cluster.run_cycle(
            t0 + Duration::from_secs(s),
            surplus_grid(30000),
            vec![params.clone()],
        );
        assert_eq!(result.actions[0].set_point, SetPointRequest::MilliAmpere(6000));
        assert!(!result.entries[0].active);
    }
}

#[test]
fn fully_charged_with_keep_zero_stays_zero_until_hysteresis_clears() {
    let mut cluster = cluster();
    let t0 = Instant::now();
    let mut params = three_phase_params("cp0", ChargeMode::Surplus);
    params.appears_to_be_fully_charged = true;
    params.hysteresis = Hysteresis::KeepZero;

    // while hysteresis holds, ample budget changes nothing
    for s in 0..3 {
        let result = cluster.run_cycle(
            t0 + Duration::from_secs(s),
            surplus_grid(30000),
            vec![params.clone()],
        );
        assert_eq!(result.actions[0].set_point, SetPointRequest::Zero);
    }

    // hysteresis reports inactive again: back to the held minimum
    params.hysteresis = Hysteresis::Inactive;
    let result = cluster.run_cycle(
        t0 + Duration::from_secs(3),
        surplus_grid(30000),
        vec![params],
    );
    assert_eq!(result.actions[0].set_point, SetPointRequest::MilliAmpere(6000));
}

#[test]
fn keep_charging_holds_minimum_through_budget_dips() {
    let mut cluster = cluster();
    let t0 = Instant::now();
    let mut params = three_phase_params("cp0", ChargeMode::Surplus);
    params.hysteresis = Hysteresis::KeepCharging;

    // 1000 W cannot cover the 4140 W minimum, but hysteresis keeps it
    let result = cluster.run_cycle(t0, surplus_grid(1000), vec![params]);
    assert_eq!(result.actions[0].set_point, SetPointRequest::MilliAmpere(6000));
}
