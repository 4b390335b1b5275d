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

//! Maps the first step of a solved plan onto discrete Solax actuator
//! commands. Pure and infallible: any missing upstream value reads as zero,
//! and the only state is the explicit mode-hysteresis record threaded
//! through each cycle.

use chrono::{DateTime, Duration, Timelike, Utc};
use powerplan_types::{
    ActionSet, ChargerMode, HysteresisState, PlanParameters, SensorSnapshot, Solution,
};
use tracing::debug;

/// Optimizer heater draw above this counts as a deliberate signal [kW].
const MPC_SIGNAL_KW: f64 = 0.1;
/// Battery power below this counts as idle [kW].
const MODE_EPSILON_KW: f64 = 0.1;
/// No reserve charging once the battery is effectively full [%].
const RESERVE_FULL_SOC_PCT: f64 = 90.0;
/// Hours of lead time before the bath window in which the upper zone
/// starts preheating.
const BATH_PREP_LEAD_H: i64 = 2;

// Compound safety cutoffs for the forced heating block. Deliberately not
// tunable; they protect the battery, not comfort.
const BLOCK_SURPLUS_KW: f64 = 0.2;
const BLOCK_SOC_PCT: f64 = 20.0;
const CRITICAL_SOC_PCT: f64 = 15.0;

fn at(values: &[f64], index: usize) -> f64 {
    values.get(index).copied().unwrap_or(0.0)
}

/// Everything one slot contributes to action selection.
struct SlotInputs {
    b_charge: f64,
    b_discharge: f64,
    b_soc_percent: f64,
    g_buy: f64,
    g_sell: f64,
    h_in_upper: f64,
    h_in_lower: f64,
    temp_upper: f64,
    temp_lower: f64,
    pv_live: f64,
    load_live: f64,
    buy_price: f64,
    hour: i64,
}

fn slot_inputs(solution: &Solution, index: usize, pv_live: f64, load_live: f64) -> SlotInputs {
    let out = &solution.outputs;
    SlotInputs {
        b_charge: at(&out.b_charge, index),
        b_discharge: at(&out.b_discharge, index),
        b_soc_percent: at(&out.b_soc_percent, index),
        g_buy: at(&out.g_buy, index),
        g_sell: at(&out.g_sell, index),
        h_in_upper: at(&out.h_in_upper, index),
        h_in_lower: at(&out.h_in_lower, index),
        temp_upper: at(&out.temp_upper, index),
        temp_lower: at(&out.temp_lower, index),
        pv_live,
        load_live,
        buy_price: at(&solution.inputs.buy_price, index),
        hour: solution
            .times
            .get(index)
            .map(|t| i64::from(t.hour()))
            .unwrap_or(0),
    }
}

/// Inverter mode, strict priority order, first match wins.
fn select_mode(slot: &SlotInputs, params: &PlanParameters) -> ChargerMode {
    if slot.b_discharge > params.manual_mode_threshold {
        ChargerMode::ManualDischarge
    } else if slot.b_charge > params.manual_mode_threshold {
        ChargerMode::ManualCharge
    } else if slot.b_discharge.abs() < MODE_EPSILON_KW
        && slot.b_charge.abs() < MODE_EPSILON_KW
        && slot.g_buy > params.idle_buy_threshold
        && slot.pv_live < params.idle_pv_threshold
    {
        ChargerMode::ManualIdle
    } else if slot.g_sell > params.export_threshold {
        ChargerMode::FeedinPriority
    } else {
        params.standard_mode
    }
}

struct HeatingFlags {
    upper_on: bool,
    lower_on: bool,
    max_heat: bool,
    block: bool,
    comfort_grid: bool,
}

fn heating_flags(slot: &SlotInputs, params: &PlanParameters) -> HeatingFlags {
    let surplus = (slot.pv_live - slot.load_live).max(0.0);
    let healthy = slot.b_soc_percent > params.battery_healthy_soc;
    let cheap = slot.buy_price < params.cheap_price;
    let expensive = slot.buy_price > params.expensive_price;
    let negative_price = slot.buy_price < 0.0;
    let lower_warm = slot.temp_lower > params.temp_lower_warm;

    let needs_comfort = slot.temp_upper < params.temp_comfort_target;
    let evening_prep = slot.hour + BATH_PREP_LEAD_H >= params.bath_time_start;
    let bath_target = if lower_warm {
        params.temp_bath_reduced
    } else {
        params.temp_bath_target
    };
    let needs_bath = evening_prep && slot.temp_upper < bath_target;

    let upper_on = needs_comfort
        || needs_bath
        || (surplus > params.surplus_threshold
            && healthy
            && slot.temp_upper < params.temp_accumulation_target)
        || (cheap && slot.h_in_upper > MPC_SIGNAL_KW)
        || surplus > params.big_surplus_threshold;

    let lower_on = slot.h_in_lower > MPC_SIGNAL_KW
        || (surplus > params.lower_surplus_threshold && healthy)
        || surplus > params.mid_surplus_threshold;

    let max_heat = (surplus > params.max_heat_surplus
        && healthy
        && slot.temp_upper < params.temp_full_tank
        && slot.temp_lower < params.temp_full_tank)
        || (negative_price
            && healthy
            && (slot.temp_upper < params.temp_full_tank
                || slot.temp_lower < params.temp_full_tank));

    let mut block = (surplus < BLOCK_SURPLUS_KW
        && slot.b_soc_percent < BLOCK_SOC_PCT
        && expensive)
        || slot.b_soc_percent < CRITICAL_SOC_PCT;
    // never block below the hard comfort floor
    if slot.temp_upper < params.temp_critical_min || slot.temp_lower < params.temp_critical_min {
        block = false;
    }

    let comfort_grid =
        needs_comfort || needs_bath || (slot.h_in_upper > MPC_SIGNAL_KW && cheap) || negative_price;

    HeatingFlags {
        upper_on,
        lower_on,
        max_heat,
        block,
        comfort_grid,
    }
}

fn slot_actions(slot: &SlotInputs, mode: ChargerMode, params: &PlanParameters) -> ActionSet {
    let flags = heating_flags(slot, params);
    ActionSet {
        charger_use_mode: mode,
        upper_accumulation_on: flags.upper_on,
        lower_accumulation_on: flags.lower_on,
        max_heat_on: flags.max_heat,
        forced_heating_block: flags.block,
        comfort_heating_grid: flags.comfort_grid,
        battery_discharge_power: if mode == ChargerMode::ManualDischarge {
            slot.b_discharge * 1000.0
        } else {
            0.0
        },
        battery_target_soc: (slot.b_soc_percent * 10.0).round() / 10.0,
        reserve_power_charging: if slot.b_soc_percent < RESERVE_FULL_SOC_PCT {
            slot.b_charge * 1000.0
        } else {
            0.0
        },
        minimum_battery_soc: if flags.max_heat {
            (params.min_soc_reserve - 10.0).max(20.0)
        } else {
            params.min_soc_reserve
        },
    }
}

/// Derives the actuator commands for the running slot.
///
/// The returned [`HysteresisState`] must be passed back on the next cycle;
/// a raw mode change is adopted only once the held mode has been stable for
/// `mode_dwell_minutes`.
pub fn derive_actions(
    solution: &Solution,
    sensors: &SensorSnapshot,
    params: &PlanParameters,
    prev: Option<HysteresisState>,
    now: DateTime<Utc>,
) -> (ActionSet, HysteresisState) {
    let slot = slot_inputs(solution, 0, sensors.pv_kw, sensors.load_kw);
    let raw = select_mode(&slot, params);

    let state = match prev {
        Some(held) if held.mode == raw => held,
        Some(held)
            if now.signed_duration_since(held.since)
                < Duration::minutes(params.mode_dwell_minutes) =>
        {
            debug!(raw = %raw, held = %held.mode, "holding inverter mode within dwell window");
            held
        }
        _ => HysteresisState { mode: raw, since: now },
    };

    (slot_actions(&slot, state.mode, params), state)
}

/// Replays the mapping over every slot of the plan, using that slot's
/// forecast as the live reading. No hysteresis chaining; this feeds
/// dashboards, not actuators.
pub fn derive_action_timeline(solution: &Solution, params: &PlanParameters) -> Vec<ActionSet> {
    (0..solution.times.len())
        .map(|index| {
            let slot = slot_inputs(
                solution,
                index,
                at(&solution.inputs.pv_kw, index),
                at(&solution.inputs.load_kw, index),
            );
            let mode = select_mode(&slot, params);
            slot_actions(&slot, mode, params)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use powerplan_types::{ForecastSeries, PlanOutputs, PlanSummary};

    struct Fixture {
        b_charge: f64,
        b_discharge: f64,
        b_soc_percent: f64,
        g_buy: f64,
        g_sell: f64,
        h_in_upper: f64,
        h_in_lower: f64,
        temp_upper: f64,
        temp_lower: f64,
        buy_price: f64,
        hour: u32,
    }

    impl Default for Fixture {
        fn default() -> Self {
            Self {
                b_charge: 0.0,
                b_discharge: 0.0,
                b_soc_percent: 60.0,
                g_buy: 0.0,
                g_sell: 0.0,
                h_in_upper: 0.0,
                h_in_lower: 0.0,
                temp_upper: 60.0,
                temp_lower: 45.0,
                buy_price: 3.0,
                hour: 12,
            }
        }
    }

    fn solution(fx: &Fixture) -> Solution {
        let tz = FixedOffset::east_opt(3600).unwrap();
        let outputs = PlanOutputs {
            b_charge: vec![fx.b_charge],
            b_discharge: vec![fx.b_discharge],
            b_soc_percent: vec![fx.b_soc_percent],
            g_buy: vec![fx.g_buy],
            g_sell: vec![fx.g_sell],
            h_in_upper: vec![fx.h_in_upper],
            h_in_lower: vec![fx.h_in_lower],
            temp_upper: vec![fx.temp_upper],
            temp_lower: vec![fx.temp_lower],
            ..PlanOutputs::default()
        };
        Solution {
            generated_at: Utc::now(),
            times: vec![tz.with_ymd_and_hms(2025, 6, 1, fx.hour, 0, 0).unwrap()],
            dt: vec![1.0],
            inputs: ForecastSeries {
                pv_kw: vec![0.0],
                load_kw: vec![0.0],
                buy_price: vec![fx.buy_price],
                sell_price: vec![1.0],
                ..ForecastSeries::default()
            },
            outputs,
            results: PlanSummary::default(),
            options: PlanParameters::default(),
            solve_time: 0.01,
        }
    }

    fn derive(fx: &Fixture, sensors: SensorSnapshot) -> ActionSet {
        let params = PlanParameters::default();
        derive_actions(&solution(fx), &sensors, &params, None, Utc::now()).0
    }

    #[test]
    fn test_discharge_takes_priority_over_export() {
        let fx = Fixture {
            b_discharge: 5.0,
            g_sell: 3.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot::default());
        assert_eq!(actions.charger_use_mode, ChargerMode::ManualDischarge);
        assert_eq!(actions.battery_discharge_power, 5000.0);
    }

    #[test]
    fn test_charge_mode_reports_reserve_power() {
        let fx = Fixture {
            b_charge: 6.0,
            b_soc_percent: 50.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot::default());
        assert_eq!(actions.charger_use_mode, ChargerMode::ManualCharge);
        assert_eq!(actions.reserve_power_charging, 6000.0);
        assert_eq!(actions.battery_discharge_power, 0.0);
    }

    #[test]
    fn test_no_reserve_power_near_full() {
        let fx = Fixture {
            b_charge: 4.0,
            b_soc_percent: 95.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot::default());
        assert_eq!(actions.reserve_power_charging, 0.0);
    }

    #[test]
    fn test_idle_when_buying_without_pv() {
        let fx = Fixture {
            g_buy: 1.5,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot { pv_kw: 0.2, load_kw: 1.5 });
        assert_eq!(actions.charger_use_mode, ChargerMode::ManualIdle);
    }

    #[test]
    fn test_export_engages_feedin_priority() {
        let fx = Fixture {
            g_sell: 2.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot { pv_kw: 4.0, load_kw: 1.0 });
        assert_eq!(actions.charger_use_mode, ChargerMode::FeedinPriority);
    }

    #[test]
    fn test_quiet_plan_falls_back_to_standard_mode() {
        let actions = derive(&Fixture::default(), SensorSnapshot { pv_kw: 1.0, load_kw: 0.9 });
        assert_eq!(actions.charger_use_mode, ChargerMode::BackupStandard);
    }

    #[test]
    fn test_large_surplus_enables_both_zones() {
        let fx = Fixture {
            b_soc_percent: 80.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot { pv_kw: 10.0, load_kw: 1.0 });
        assert!(actions.upper_accumulation_on);
        assert!(actions.lower_accumulation_on);
        assert!(actions.max_heat_on);
        // reduced floor while max-heat runs
        assert_eq!(actions.minimum_battery_soc, 30.0);
    }

    #[test]
    fn test_cold_upper_zone_forces_comfort_heating() {
        let fx = Fixture {
            temp_upper: 42.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot::default());
        assert!(actions.upper_accumulation_on);
        assert!(actions.comfort_heating_grid);
    }

    #[test]
    fn test_evening_prep_targets_bath_temperature() {
        let fx = Fixture {
            hour: 16,
            temp_upper: 60.0,
            temp_lower: 40.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot::default());
        // 60 degC is below the 65 degC bath target
        assert!(actions.upper_accumulation_on);
        assert!(actions.comfort_heating_grid);
    }

    #[test]
    fn test_warm_lower_zone_reduces_bath_target() {
        let fx = Fixture {
            hour: 16,
            temp_upper: 60.0,
            temp_lower: 55.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot::default());
        // reduced 55 degC target is already met
        assert!(!actions.upper_accumulation_on);
    }

    #[test]
    fn test_weak_battery_blocks_heating() {
        let fx = Fixture {
            b_soc_percent: 10.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot::default());
        assert!(actions.forced_heating_block);
    }

    #[test]
    fn test_critical_temperature_overrides_block() {
        let fx = Fixture {
            b_soc_percent: 10.0,
            temp_upper: 35.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot::default());
        assert!(!actions.forced_heating_block);
        assert!(actions.upper_accumulation_on);
    }

    #[test]
    fn test_negative_price_heats_everything() {
        let fx = Fixture {
            buy_price: -0.5,
            b_soc_percent: 70.0,
            ..Fixture::default()
        };
        let actions = derive(&fx, SensorSnapshot::default());
        assert!(actions.max_heat_on);
        assert!(actions.comfort_heating_grid);
    }

    #[test]
    fn test_derivation_is_idempotent() {
        let fx = Fixture {
            b_discharge: 5.0,
            ..Fixture::default()
        };
        let params = PlanParameters::default();
        let sol = solution(&fx);
        let sensors = SensorSnapshot { pv_kw: 0.5, load_kw: 1.0 };
        let now = Utc::now();
        let (first, _) = derive_actions(&sol, &sensors, &params, None, now);
        let (second, _) = derive_actions(&sol, &sensors, &params, None, now);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn test_dwell_holds_recent_mode() {
        let fx = Fixture {
            b_discharge: 5.0,
            ..Fixture::default()
        };
        let params = PlanParameters::default();
        let now = Utc::now();
        let held = HysteresisState {
            mode: ChargerMode::ManualCharge,
            since: now - Duration::minutes(5),
        };
        let (actions, state) =
            derive_actions(&solution(&fx), &SensorSnapshot::default(), &params, Some(held), now);
        assert_eq!(actions.charger_use_mode, ChargerMode::ManualCharge);
        assert_eq!(state, held);
    }

    #[test]
    fn test_dwell_expiry_adopts_new_mode() {
        let fx = Fixture {
            b_discharge: 5.0,
            ..Fixture::default()
        };
        let params = PlanParameters::default();
        let now = Utc::now();
        let held = HysteresisState {
            mode: ChargerMode::ManualCharge,
            since: now - Duration::minutes(20),
        };
        let (actions, state) =
            derive_actions(&solution(&fx), &SensorSnapshot::default(), &params, Some(held), now);
        assert_eq!(actions.charger_use_mode, ChargerMode::ManualDischarge);
        assert_eq!(state.mode, ChargerMode::ManualDischarge);
        assert_eq!(state.since, now);
    }

    #[test]
    fn test_unchanged_mode_keeps_dwell_clock() {
        let fx = Fixture {
            b_discharge: 5.0,
            ..Fixture::default()
        };
        let params = PlanParameters::default();
        let now = Utc::now();
        let held = HysteresisState {
            mode: ChargerMode::ManualDischarge,
            since: now - Duration::minutes(40),
        };
        let (_, state) =
            derive_actions(&solution(&fx), &SensorSnapshot::default(), &params, Some(held), now);
        assert_eq!(state.since, held.since);
    }

    #[test]
    fn test_empty_outputs_read_as_zeros() {
        let mut sol = solution(&Fixture::default());
        sol.outputs = PlanOutputs::default();
        let params = PlanParameters::default();
        let (actions, _) =
            derive_actions(&sol, &SensorSnapshot::default(), &params, None, Utc::now());
        assert_eq!(actions.battery_target_soc, 0.0);
        assert_eq!(actions.charger_use_mode, ChargerMode::BackupStandard);
    }

    #[test]
    fn test_timeline_covers_every_slot() {
        let fx = Fixture::default();
        let mut sol = solution(&fx);
        let tz = FixedOffset::east_opt(3600).unwrap();
        sol.times = (0..4)
            .map(|h| tz.with_ymd_and_hms(2025, 6, 1, h, 0, 0).unwrap())
            .collect();
        let params = PlanParameters::default();
        let timeline = derive_action_timeline(&sol, &params);
        assert_eq!(timeline.len(), 4);
    }
}
