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

//! Objective composition: grid economics plus soft penalties and terminal
//! valuations, all linear. Zero-weight terms degrade to no-ops.

use crate::optimizer::backend::LinearExpr;
use crate::optimizer::model::PlanVars;
use chrono::Timelike;
use powerplan_types::{ForecastSeries, Horizon, PlanParameters};

pub(crate) fn build_objective(
    vars: &PlanVars,
    series: &ForecastSeries,
    horizon: &Horizon,
    params: &PlanParameters,
) -> LinearExpr {
    let n = horizon.steps();
    let mut objective = LinearExpr::default();

    for i in 0..n {
        let dt = horizon.dt[i];
        objective.add_term(vars.g_buy[i], series.buy_price[i] * dt);
        objective.add_term(vars.g_sell[i], -series.sell_price[i] * dt);
        // wear cost on discharged energy
        objective.add_term(vars.b_discharge[i], params.battery_penalty * dt);
        objective.add_term(vars.fve_unused[i], params.fve_unused_penalty * dt);
        // nudge surplus into hot water, upper zone first
        objective.add_term(vars.h_in_lower[i], -params.water_priority_bonus * dt);
        objective.add_term(
            vars.h_in_upper[i],
            -(params.water_priority_bonus + params.upper_zone_priority) * dt,
        );
        objective.add_term(vars.bat_under[i], params.bat_under_penalty * dt);
        objective.add_term(
            vars.temp_comfort_deficit[i],
            params.temp_comfort_penalty * dt,
        );
        objective.add_term(vars.temp_bath_deficit[i], params.temp_bath_penalty * dt);
        objective.add_term(
            vars.temp_critical_deficit[i],
            params.temp_critical_penalty * dt,
        );
        // reward tank energy held going into the evening
        if i64::from(horizon.times[i].hour()) == params.tank_value_hour {
            objective.add_term(vars.h_soc_lower[i], -params.tank_value_bonus);
            objective.add_term(vars.h_soc_upper[i], -params.tank_value_bonus);
        }
    }

    // terminal battery valuation: bat_price_below * (threshold - b_short)
    // - bat_price_above * b_surplus
    objective.add_term(vars.b_surplus, -params.bat_price_above);
    objective.add_term(vars.b_short, -params.bat_price_below);
    objective = objective + params.bat_price_below * params.threshold();

    // terminal tank valuation
    objective.add_term(vars.h_soc_lower[n - 1], -params.final_boiler_price);
    objective.add_term(vars.h_soc_upper[n - 1], -params.final_boiler_price);

    objective
}
