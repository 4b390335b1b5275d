// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of PowerPlan.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Physical-consistency properties of solved plans, exercised against the
//! real microlp backend.

use chrono::{DateTime, FixedOffset, TimeZone};
use powerplan_core::{GoodLpBackend, PlanError, run_optimizer};
use powerplan_types::{ForecastSeries, Horizon, InitialState, PlanParameters, Solution};
use std::sync::Arc;

const TOL: f64 = 1e-4;

fn morning_horizon(n: usize) -> Horizon {
    let tz = FixedOffset::east_opt(7200).unwrap();
    let times: Vec<DateTime<FixedOffset>> = (0..n)
        .map(|h| tz.with_ymd_and_hms(2025, 6, 1, 8 + h as u32, 0, 0).unwrap())
        .collect();
    Horizon::hourly(times).unwrap()
}

fn flat_series(n: usize, pv: f64, load: f64, buy: f64, sell: f64) -> ForecastSeries {
    ForecastSeries {
        pv_kw: vec![pv; n],
        load_kw: vec![load; n],
        buy_price: vec![buy; n],
        sell_price: vec![sell; n],
        dhw_demand_kwh: vec![0.0; n],
        heating_demand_kwh: vec![0.0; n],
        outdoor_temp_c: vec![18.0; n],
    }
}

fn warm_tank_state(soc_percent: f64) -> InitialState {
    InitialState {
        battery_soc_percent: soc_percent,
        temp_lower_c: 55.0,
        temp_upper_c: 80.0,
    }
}

fn solve(series: &ForecastSeries, initial: &InitialState, horizon: &Horizon) -> Solution {
    run_optimizer(
        series,
        initial,
        horizon,
        &PlanParameters::default(),
        Arc::new(GoodLpBackend),
    )
    .expect("model should be feasible")
}

fn mixed_day_solution() -> Solution {
    let n = 8;
    let horizon = morning_horizon(n);
    let mut series = flat_series(n, 0.0, 1.2, 4.0, 1.8);
    series.pv_kw = vec![0.5, 2.0, 4.5, 6.0, 6.5, 5.0, 2.5, 0.8];
    series.load_kw = vec![0.8, 1.0, 1.5, 1.2, 2.0, 1.8, 1.1, 0.9];
    series.buy_price = vec![3.0, 2.8, 2.5, 2.4, 2.6, 3.5, 5.5, 6.2];
    series.sell_price = vec![1.2, 1.1, 1.0, 0.9, 1.0, 1.4, 2.0, 2.3];
    series.dhw_demand_kwh = vec![0.0, 0.3, 0.0, 0.0, 0.5, 0.0, 0.8, 0.4];
    solve(&series, &warm_tank_state(55.0), &horizon)
}

#[test]
fn test_energy_balance_holds_on_every_step() {
    let solution = mixed_day_solution();
    let p = &solution.options;
    let out = &solution.outputs;
    for i in 0..solution.times.len() {
        let supply = solution.inputs.pv_kw[i] + out.g_buy[i] + out.b_discharge[i] * p.b_eff_out;
        let demand = solution.inputs.load_kw[i]
            + out.b_charge[i] / p.b_eff_in
            + (out.h_in_lower[i] + out.h_in_upper[i]) * (1.0 + p.parasitic_water_heating)
            + out.g_sell[i]
            + out.fve_unused[i];
        assert!(
            (supply - demand).abs() < TOL,
            "step {i}: supply {supply} != demand {demand}"
        );
    }
}

#[test]
fn test_heater_overhead_matches_parasitic_output() {
    let solution = mixed_day_solution();
    let p = &solution.options;
    let out = &solution.outputs;
    for i in 0..solution.times.len() {
        let expected = p.parasitic_water_heating * (out.h_in_lower[i] + out.h_in_upper[i]);
        assert!((out.parasitic[i] - expected).abs() < TOL);
    }
}

#[test]
fn test_all_quantities_stay_within_bounds() {
    let solution = mixed_day_solution();
    let p = &solution.options;
    let out = &solution.outputs;
    for i in 0..solution.times.len() {
        assert!(out.b_soc[i] >= p.b_min - TOL && out.b_soc[i] <= p.b_max + TOL);
        assert!(out.h_soc_lower[i] >= -TOL && out.h_soc_lower[i] <= p.lower_cap() + TOL);
        assert!(out.h_soc_upper[i] >= -TOL && out.h_soc_upper[i] <= p.upper_cap() + TOL);
        assert!(out.b_charge[i] >= -TOL && out.b_charge[i] <= p.b_power + TOL);
        assert!(out.b_discharge[i] >= -TOL && out.b_discharge[i] <= p.b_power + TOL);
        assert!(out.h_in_lower[i] >= -TOL && out.h_in_lower[i] <= p.h_lower_power + TOL);
        assert!(out.h_in_upper[i] >= -TOL && out.h_in_upper[i] <= p.h_upper_power + TOL);
        assert!(out.g_buy[i] + out.b_charge[i] + out.h_in_lower[i] + out.h_in_upper[i]
            <= p.grid_limit + TOL);
        assert!(
            out.b_discharge[i] + out.h_in_lower[i] + out.h_in_upper[i] + out.g_sell[i]
                <= p.inverter_limit + TOL
        );
    }
}

#[test]
fn test_battery_dynamics_are_consistent() {
    let solution = mixed_day_solution();
    let p = &solution.options;
    let out = &solution.outputs;
    let mut prev = (55.0 / 100.0 * p.b_cap).clamp(p.b_min, p.b_max);
    for i in 0..solution.times.len() {
        let expected = prev
            + (out.b_charge[i] * p.b_eff_in - out.b_discharge[i] / p.b_eff_out)
                * solution.dt[i];
        assert!(
            (out.b_soc[i] - expected).abs() < TOL,
            "step {i}: soc {} != {expected}",
            out.b_soc[i]
        );
        prev = out.b_soc[i];
    }
}

#[test]
fn test_threshold_split_identity() {
    let solution = mixed_day_solution();
    let last = *solution.outputs.b_soc.last().unwrap();
    let split = solution.results.b_short_final + solution.results.b_surplus_final;
    assert!((split - last).abs() < TOL);
}

#[test]
fn test_temperatures_follow_stored_energy() {
    let solution = mixed_day_solution();
    let p = &solution.options;
    let out = &solution.outputs;
    for i in 0..solution.times.len() {
        let expected = p.h_upper_min_t
            + out.h_soc_upper[i] / p.upper_cap() * (p.h_upper_max_t - p.h_upper_min_t);
        assert!((out.temp_upper[i] - expected).abs() < 1e-6);
    }
}

#[test]
fn test_flat_prices_and_no_pv_mean_no_cycling() {
    let n = 6;
    let horizon = morning_horizon(n);
    let series = flat_series(n, 0.0, 1.0, 5.0, 2.0);
    // terminal valuation tracks the flat tariff, as the resolver derives it;
    // with that, neither charging nor discharging can pay for its losses
    let mut params = PlanParameters::default();
    params.bat_price_below = 5.0;
    params.bat_price_above = 4.5;
    let solution = run_optimizer(
        &series,
        &warm_tank_state(80.0),
        &horizon,
        &params,
        Arc::new(GoodLpBackend),
    )
    .expect("model should be feasible");
    for i in 0..n {
        assert!(
            solution.outputs.b_charge[i].abs() < 1e-5,
            "unexpected charge at step {i}"
        );
        assert!(
            solution.outputs.b_discharge[i].abs() < 1e-5,
            "unexpected discharge at step {i}"
        );
    }
}

#[test]
fn test_impossible_demand_is_infeasible() {
    let n = 4;
    let horizon = morning_horizon(n);
    let series = flat_series(n, 0.0, 100.0, 5.0, 2.0);
    let result = run_optimizer(
        &series,
        &warm_tank_state(50.0),
        &horizon,
        &PlanParameters::default(),
        Arc::new(GoodLpBackend),
    );
    assert!(matches!(result, Err(PlanError::Infeasible)));
}

#[test]
fn test_empty_horizon_is_an_input_error() {
    // the struct literal bypasses the constructor checks
    let horizon = Horizon {
        times: Vec::new(),
        dt: Vec::new(),
    };
    let series = flat_series(0, 0.0, 0.0, 3.0, 1.0);
    let result = run_optimizer(
        &series,
        &warm_tank_state(50.0),
        &horizon,
        &PlanParameters::default(),
        Arc::new(GoodLpBackend),
    );
    assert!(matches!(result, Err(PlanError::Input(_))));
}

#[test]
fn test_heating_demand_caps_battery_even_when_not_served() {
    let n = 4;
    let horizon = morning_horizon(n);
    let mut series = flat_series(n, 10.0, 1.0, 3.0, 1.5);
    series.heating_demand_kwh = vec![0.4; n];
    let solution = solve(&series, &warm_tank_state(80.0), &horizon);
    assert!(!solution.options.heating_enabled);

    let cap = 0.9 * solution.options.b_cap;
    for (i, soc) in solution.outputs.b_soc.iter().enumerate() {
        assert!(*soc <= cap + TOL, "step {i}: soc {soc} above headroom cap");
    }
    // the surplus is worth storing, so the plan charges right up to the cap
    assert!(*solution.outputs.b_soc.last().unwrap() > cap - 0.5);
}

#[test]
fn test_series_mismatch_is_an_input_error() {
    let horizon = morning_horizon(4);
    let series = flat_series(3, 0.0, 1.0, 5.0, 2.0);
    let result = run_optimizer(
        &series,
        &warm_tank_state(50.0),
        &horizon,
        &PlanParameters::default(),
        Arc::new(GoodLpBackend),
    );
    assert!(matches!(result, Err(PlanError::Input(_))));
}

#[test]
fn test_dhw_draw_depletes_upper_zone() {
    let n = 6;
    let horizon = morning_horizon(n);
    let mut series = flat_series(n, 0.0, 0.5, 8.0, 1.0);
    series.dhw_demand_kwh = vec![1.5; n];
    // neutral heat valuation, so the plan rides the stored heat instead of
    // refilling the tank for its terminal value
    let mut params = PlanParameters::default();
    params.water_priority_bonus = 0.0;
    params.upper_zone_priority = 0.0;
    params.tank_value_bonus = 0.0;
    params.final_boiler_price = 1.0;
    let solution = run_optimizer(
        &series,
        &warm_tank_state(60.0),
        &horizon,
        &params,
        Arc::new(GoodLpBackend),
    )
    .expect("model should be feasible");
    let first = solution.outputs.h_soc_upper[0];
    let last = *solution.outputs.h_soc_upper.last().unwrap();
    assert!(last < first, "upper zone should drain under draw");
}
