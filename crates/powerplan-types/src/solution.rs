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

use crate::input::ForecastSeries;
use crate::params::PlanParameters;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};

/// One optimizer run, snapshotted after every successful cycle: the inputs
/// it saw, every per-step decision, the aggregated economics and the
/// parameter set it was solved with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    pub generated_at: DateTime<Utc>,
    pub times: Vec<DateTime<FixedOffset>>,
    /// Step durations [h]; the first step may be fractional
    pub dt: Vec<f64>,
    pub inputs: ForecastSeries,
    pub outputs: PlanOutputs,
    pub results: PlanSummary,
    pub options: PlanParameters,
    /// Wall-clock solve duration [s]
    pub solve_time: f64,
}

/// Per-step optimizer decisions and derived views. Powers in kW, energies
/// in kWh, temperatures in degC, money in Kc.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanOutputs {
    /// Net battery power, charge positive [kW]
    pub b_power: Vec<f64>,
    pub b_charge: Vec<f64>,
    pub b_discharge: Vec<f64>,
    pub b_soc: Vec<f64>,
    pub b_soc_percent: Vec<f64>,
    pub g_buy: Vec<f64>,
    pub g_sell: Vec<f64>,
    pub h_in_lower: Vec<f64>,
    pub h_in_upper: Vec<f64>,
    /// Thermal transfer from the lower to the upper zone [kW]
    pub h_to_upper: Vec<f64>,
    pub h_out_lower: Vec<f64>,
    pub h_out_upper: Vec<f64>,
    pub h_soc_lower: Vec<f64>,
    pub h_soc_upper: Vec<f64>,
    pub h_soc_lower_percent: Vec<f64>,
    pub h_soc_upper_percent: Vec<f64>,
    pub temp_lower: Vec<f64>,
    pub temp_upper: Vec<f64>,
    /// Curtailed PV production [kW]
    pub fve_unused: Vec<f64>,
    /// Battery energy below the threshold split [kWh]
    pub bat_under: Vec<f64>,
    /// Heater overhead drawn on top of delivered heat [kW]
    pub parasitic: Vec<f64>,
    pub buy_cost: Vec<f64>,
    pub sell_income: Vec<f64>,
    pub net_step_cost: Vec<f64>,
    pub temp_comfort_deficit: Vec<f64>,
    pub temp_bath_deficit: Vec<f64>,
    pub temp_critical_deficit: Vec<f64>,
}

/// Horizon-wide aggregates, computed after extraction, never fed back into
/// the model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanSummary {
    pub objective_value: f64,
    /// Buy cost minus sell income [Kc]
    pub net_bilance: f64,
    pub total_buy_cost: f64,
    pub total_sell_income: f64,
    /// Energy drawn from the grid [kWh]
    pub grid_consumption: f64,
    /// Energy exported to the grid [kWh]
    pub grid_injection: f64,
    pub total_charged: f64,
    pub total_discharged: f64,
    pub total_fve_unused: f64,
    pub total_battery_penalty: f64,
    pub total_fve_unused_penalty: f64,
    pub total_water_priority_bonus: f64,
    pub total_upper_zone_priority: f64,
    pub total_battery_under_penalty: f64,
    /// Terminal battery valuation from the threshold split [Kc]
    pub final_battery_value: f64,
    pub total_final_boiler_value: f64,
    pub tank_value_bonus: f64,
    pub total_parasitic_energy: f64,
    pub total_parasitic_to_battery: f64,
    pub total_parasitic_to_grid: f64,
    pub total_temp_comfort_penalty: f64,
    pub total_temp_bath_penalty: f64,
    pub total_temp_critical_penalty: f64,
    pub b_short_final: f64,
    pub b_surplus_final: f64,
}
