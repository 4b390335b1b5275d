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

use crate::action::ChargerMode;
use serde::{Deserialize, Serialize};

/// Fully-resolved planner configuration.
///
/// Every tunable the optimizer or the action derivation reads lives here;
/// no other component embeds a literal default. Instances come from the
/// parameter resolver, which applies overrides, derivation rules and range
/// checks, so downstream code can trust the values without re-validating.
/// The struct is echoed verbatim into every stored `Solution`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanParameters {
    // -- toggles -----------------------------------------------------------
    /// Serve the space-heating series from the lower zone
    pub heating_enabled: bool,
    /// Cap battery at 90 % on steps with thermal demand, keeping room for
    /// surplus that would otherwise be wasted
    pub heat_headroom: bool,

    // -- battery -----------------------------------------------------------
    /// Usable battery capacity [kWh]
    pub b_cap: f64,
    /// Minimum battery energy [kWh]; derived as 15 % of capacity
    pub b_min: f64,
    /// Maximum battery energy [kWh]; derived as full capacity
    pub b_max: f64,
    /// Charge/discharge power limit [kW]
    pub b_power: f64,
    /// Charging efficiency
    pub b_eff_in: f64,
    /// Discharging efficiency
    pub b_eff_out: f64,

    // -- thermal store -----------------------------------------------------
    /// Total tank capacity [kWh]
    pub h_cap: f64,
    pub h_lower_min_t: f64,
    pub h_lower_max_t: f64,
    pub h_upper_min_t: f64,
    pub h_upper_max_t: f64,
    /// Lower-zone share of the tank volume
    pub h_lower_vol: f64,
    /// Upper-zone share of the tank volume
    pub h_upper_vol: f64,
    /// Lower-zone heater rating [kW]
    pub h_lower_power: f64,
    /// Upper-zone heater rating [kW]
    pub h_upper_power: f64,
    /// Combined heater limit [kW]
    pub h_power: f64,

    // -- network -----------------------------------------------------------
    /// Main breaker limit [kW]
    pub grid_limit: f64,
    /// Inverter AC output limit [kW]
    pub inverter_limit: f64,

    // -- valuation ---------------------------------------------------------
    /// Value of thermal energy left in the tank at horizon end [Kc/kWh];
    /// derived as min(buy) - 0.5
    pub final_boiler_price: f64,
    /// Battery threshold split point as a fraction of capacity
    pub bat_threshold_pct: f64,
    /// Value of final battery energy below the threshold [Kc/kWh];
    /// derived as min(buy)
    pub bat_price_below: f64,
    /// Value of final battery energy above the threshold [Kc/kWh];
    /// derived as min(buy) - 0.5
    pub bat_price_above: f64,
    /// Wear cost per discharged kWh [Kc/kWh]
    pub battery_penalty: f64,
    pub fve_unused_penalty: f64,
    pub water_priority_bonus: f64,
    pub bat_under_penalty: f64,
    /// Bonus weight on tank energy held at `tank_value_hour`
    pub tank_value_bonus: f64,
    /// Electrical overhead fraction of heater draw
    pub parasitic_water_heating: f64,
    /// Inter-zone transfer rate [kW/degC over the lower zone span]
    pub alpha: f64,
    pub upper_zone_priority: f64,

    // -- comfort temperatures ----------------------------------------------
    pub temp_comfort_penalty: f64,
    pub temp_bath_penalty: f64,
    pub temp_critical_penalty: f64,
    /// Baseline upper-zone comfort floor [degC]
    pub temp_comfort_target: f64,
    /// Evening bath target [degC]
    pub temp_bath_target: f64,
    /// Evening bath target when the lower zone is already warm [degC]
    pub temp_bath_reduced: f64,
    /// Hard comfort floor; below it heating blocks are overridden [degC]
    pub temp_critical_min: f64,
    /// Lower-zone temperature considered "warm" [degC]
    pub temp_lower_warm: f64,
    /// Surplus accumulation target for the upper zone [degC]
    pub temp_accumulation_target: f64,
    /// Full-tank ceiling for max-heat [degC]
    pub temp_full_tank: f64,

    // -- action thresholds -------------------------------------------------
    /// Manual charge/discharge mode threshold [kW]
    pub manual_mode_threshold: f64,
    /// Export power above which Feedin Priority engages [kW]
    pub export_threshold: f64,
    pub idle_buy_threshold: f64,
    pub idle_pv_threshold: f64,
    /// PV surplus enabling upper accumulation [kW]
    pub surplus_threshold: f64,
    /// PV surplus enabling lower accumulation [kW]
    pub lower_surplus_threshold: f64,
    /// PV surplus forcing lower accumulation regardless of battery [kW]
    pub mid_surplus_threshold: f64,
    /// PV surplus forcing upper accumulation regardless of battery [kW]
    pub big_surplus_threshold: f64,
    /// PV surplus enabling the full-power heating element [kW]
    pub max_heat_surplus: f64,
    /// Electricity below this price counts as cheap [Kc/kWh]
    pub cheap_price: f64,
    /// Electricity above this price counts as expensive [Kc/kWh]
    pub expensive_price: f64,
    /// Battery SoC considered healthy for opportunistic heating [%]
    pub battery_healthy_soc: f64,
    /// Default minimum-SoC floor handed to the actuator [%]
    pub min_soc_reserve: f64,

    // -- schedule ----------------------------------------------------------
    /// Local hour whose tank energy earns `tank_value_bonus`
    pub tank_value_hour: i64,
    /// Evening comfort window, local hours inclusive
    pub bath_time_start: i64,
    pub bath_time_end: i64,
    /// Minimum minutes between inverter mode switches
    pub mode_dwell_minutes: i64,
    pub solver_timeout_secs: u64,

    /// Mode used when no manual override condition matches
    pub standard_mode: ChargerMode,
}

impl Default for PlanParameters {
    fn default() -> Self {
        Self {
            heating_enabled: false,
            heat_headroom: true,

            b_cap: 17.4,
            b_min: 17.4 * 0.15,
            b_max: 17.4,
            b_power: 9.0,
            b_eff_in: 0.94,
            b_eff_out: 0.94,

            h_cap: 45.0,
            h_lower_min_t: 30.0,
            h_lower_max_t: 85.0,
            h_upper_min_t: 45.0,
            h_upper_max_t: 90.0,
            h_lower_vol: 0.7,
            h_upper_vol: 0.3,
            h_lower_power: 8.0,
            h_upper_power: 4.0,
            h_power: 12.0,

            grid_limit: 18.0,
            inverter_limit: 15.0,

            // Price-derived fields default to a flat 2.5 Kc/kWh tariff;
            // the resolver recomputes them from the actual buy series.
            final_boiler_price: 2.0,
            bat_threshold_pct: 0.40,
            bat_price_below: 2.5,
            bat_price_above: 2.0,
            battery_penalty: 1.0,
            fve_unused_penalty: 0.1,
            water_priority_bonus: 1.0,
            bat_under_penalty: 0.1,
            tank_value_bonus: 1.0,
            parasitic_water_heating: 0.05,
            alpha: 0.1,
            upper_zone_priority: 0.5,

            temp_comfort_penalty: 2.0,
            temp_bath_penalty: 1.0,
            temp_critical_penalty: 10.0,
            temp_comfort_target: 45.0,
            temp_bath_target: 65.0,
            temp_bath_reduced: 55.0,
            temp_critical_min: 40.0,
            temp_lower_warm: 50.0,
            temp_accumulation_target: 70.0,
            temp_full_tank: 90.0,

            manual_mode_threshold: 3.5,
            export_threshold: 0.10,
            idle_buy_threshold: 0.2,
            idle_pv_threshold: 0.6,
            surplus_threshold: 2.0,
            lower_surplus_threshold: 1.0,
            mid_surplus_threshold: 3.0,
            big_surplus_threshold: 5.0,
            max_heat_surplus: 8.0,
            cheap_price: 2.5,
            expensive_price: 6.0,
            battery_healthy_soc: 40.0,
            min_soc_reserve: 40.0,

            tank_value_hour: 18,
            bath_time_start: 18,
            bath_time_end: 21,
            mode_dwell_minutes: 15,
            solver_timeout_secs: 20,

            standard_mode: ChargerMode::BackupStandard,
        }
    }
}

impl PlanParameters {
    /// Lower-zone capacity [kWh].
    pub fn lower_cap(&self) -> f64 {
        self.h_cap * self.h_lower_vol
    }

    /// Upper-zone capacity [kWh].
    pub fn upper_cap(&self) -> f64 {
        self.h_cap * self.h_upper_vol
    }

    /// Battery threshold-split point [kWh].
    pub fn threshold(&self) -> f64 {
        self.bat_threshold_pct * self.b_cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_consistent() {
        let p = PlanParameters::default();
        assert!((p.b_min - 2.61).abs() < 1e-9);
        assert_eq!(p.b_max, p.b_cap);
        assert!((p.lower_cap() + p.upper_cap() - p.h_cap).abs() < 1e-9);
        assert!((p.threshold() - 6.96).abs() < 1e-9);
        assert!(p.h_lower_power + p.h_upper_power == p.h_power);
    }
}
