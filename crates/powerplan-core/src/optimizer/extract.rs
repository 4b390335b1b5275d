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

//! Turns a solved variable vector into the stored [`Solution`]: per-step
//! arrays, percentage and temperature views, and horizon-wide aggregates.
//! Aggregates are post-hoc bookkeeping only, never fed back into the model.

use crate::optimizer::backend::{LinearExpr, LpSolution};
use crate::optimizer::model::PlanVars;
use crate::optimizer::thermal::ZoneGeometry;
use chrono::{Timelike, Utc};
use powerplan_types::{
    ForecastSeries, Horizon, PlanOutputs, PlanParameters, PlanSummary, Solution,
};

#[allow(clippy::too_many_arguments)]
pub(crate) fn extract(
    solved: &LpSolution,
    vars: &PlanVars,
    objective: &LinearExpr,
    series: &ForecastSeries,
    horizon: &Horizon,
    params: &PlanParameters,
    solve_time: f64,
) -> Solution {
    let n = horizon.steps();
    let lower = ZoneGeometry::lower(params);
    let upper = ZoneGeometry::upper(params);

    let mut outputs = PlanOutputs::default();
    for i in 0..n {
        let dt = horizon.dt[i];
        let b_charge = solved.value(vars.b_charge[i]);
        let b_discharge = solved.value(vars.b_discharge[i]);
        let b_soc = solved.value(vars.b_soc[i]);
        let g_buy = solved.value(vars.g_buy[i]);
        let g_sell = solved.value(vars.g_sell[i]);
        let h_in_lower = solved.value(vars.h_in_lower[i]);
        let h_in_upper = solved.value(vars.h_in_upper[i]);
        let h_soc_lower = solved.value(vars.h_soc_lower[i]);
        let h_soc_upper = solved.value(vars.h_soc_upper[i]);

        outputs.b_power.push(solved.value(vars.b_power_net[i]));
        outputs.b_charge.push(b_charge);
        outputs.b_discharge.push(b_discharge);
        outputs.b_soc.push(b_soc);
        outputs.b_soc_percent.push(100.0 * b_soc / params.b_cap);
        outputs.g_buy.push(g_buy);
        outputs.g_sell.push(g_sell);
        outputs.h_in_lower.push(h_in_lower);
        outputs.h_in_upper.push(h_in_upper);
        outputs.h_to_upper.push(solved.value(vars.h_to_upper[i]));
        outputs.h_out_lower.push(if params.heating_enabled {
            series.heating_at(i)
        } else {
            0.0
        });
        outputs.h_out_upper.push(series.dhw_at(i));
        outputs.h_soc_lower.push(h_soc_lower);
        outputs.h_soc_upper.push(h_soc_upper);
        outputs
            .h_soc_lower_percent
            .push(100.0 * h_soc_lower / lower.cap);
        outputs
            .h_soc_upper_percent
            .push(100.0 * h_soc_upper / upper.cap);
        outputs.temp_lower.push(lower.temp_for_energy(h_soc_lower));
        outputs.temp_upper.push(upper.temp_for_energy(h_soc_upper));
        outputs.fve_unused.push(solved.value(vars.fve_unused[i]));
        outputs.bat_under.push(solved.value(vars.bat_under[i]));
        outputs
            .parasitic
            .push(params.parasitic_water_heating * (h_in_lower + h_in_upper));
        outputs.buy_cost.push(g_buy * series.buy_price[i] * dt);
        outputs.sell_income.push(g_sell * series.sell_price[i] * dt);
        outputs
            .net_step_cost
            .push(g_buy * series.buy_price[i] * dt - g_sell * series.sell_price[i] * dt);
        outputs
            .temp_comfort_deficit
            .push(solved.value(vars.temp_comfort_deficit[i]));
        outputs
            .temp_bath_deficit
            .push(solved.value(vars.temp_bath_deficit[i]));
        outputs
            .temp_critical_deficit
            .push(solved.value(vars.temp_critical_deficit[i]));
    }

    let results = summarize(&outputs, solved, vars, objective, series, horizon, params);

    Solution {
        generated_at: Utc::now(),
        times: horizon.times.clone(),
        dt: horizon.dt.clone(),
        inputs: series.clone(),
        outputs,
        results,
        options: params.clone(),
        solve_time,
    }
}

fn summarize(
    outputs: &PlanOutputs,
    solved: &LpSolution,
    vars: &PlanVars,
    objective: &LinearExpr,
    series: &ForecastSeries,
    horizon: &Horizon,
    params: &PlanParameters,
) -> PlanSummary {
    let n = horizon.steps();
    let mut summary = PlanSummary::default();

    for i in 0..n {
        let dt = horizon.dt[i];
        summary.total_buy_cost += outputs.buy_cost[i];
        summary.total_sell_income += outputs.sell_income[i];
        summary.grid_consumption += outputs.g_buy[i] * dt;
        summary.grid_injection += outputs.g_sell[i] * dt;
        summary.total_charged += outputs.b_charge[i] * dt;
        summary.total_discharged += outputs.b_discharge[i] * dt;
        summary.total_fve_unused += outputs.fve_unused[i] * dt;
        summary.total_battery_penalty += params.battery_penalty * outputs.b_discharge[i] * dt;
        summary.total_fve_unused_penalty +=
            params.fve_unused_penalty * outputs.fve_unused[i] * dt;
        summary.total_water_priority_bonus +=
            params.water_priority_bonus * (outputs.h_in_lower[i] + outputs.h_in_upper[i]) * dt;
        summary.total_upper_zone_priority +=
            params.upper_zone_priority * outputs.h_in_upper[i] * dt;
        summary.total_battery_under_penalty +=
            params.bat_under_penalty * outputs.bat_under[i] * dt;
        summary.total_temp_comfort_penalty +=
            params.temp_comfort_penalty * outputs.temp_comfort_deficit[i] * dt;
        summary.total_temp_bath_penalty +=
            params.temp_bath_penalty * outputs.temp_bath_deficit[i] * dt;
        summary.total_temp_critical_penalty +=
            params.temp_critical_penalty * outputs.temp_critical_deficit[i] * dt;

        if i64::from(horizon.times[i].hour()) == params.tank_value_hour {
            summary.tank_value_bonus +=
                params.tank_value_bonus * (outputs.h_soc_lower[i] + outputs.h_soc_upper[i]);
        }

        // attribute heater overhead to its supply sources, pro rata
        let parasitic_energy = outputs.parasitic[i] * dt;
        summary.total_parasitic_energy += parasitic_energy;
        let supply =
            series.pv_kw[i] + outputs.g_buy[i] + outputs.b_discharge[i] * params.b_eff_out;
        if supply > 1e-9 {
            summary.total_parasitic_to_battery +=
                parasitic_energy * outputs.b_discharge[i] * params.b_eff_out / supply;
            summary.total_parasitic_to_grid += parasitic_energy * outputs.g_buy[i] / supply;
        }
    }

    summary.net_bilance = summary.total_buy_cost - summary.total_sell_income;
    summary.b_short_final = solved.value(vars.b_short);
    summary.b_surplus_final = solved.value(vars.b_surplus);
    summary.final_battery_value = params.bat_price_above * summary.b_surplus_final
        - params.bat_price_below * (params.threshold() - summary.b_short_final);
    summary.total_final_boiler_value =
        params.final_boiler_price * (outputs.h_soc_lower[n - 1] + outputs.h_soc_upper[n - 1]);
    summary.objective_value = objective.eval(solved);

    summary
}
