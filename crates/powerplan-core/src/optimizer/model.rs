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

//! Dispatch model: one block of decision variables per horizon step, tied
//! together by battery and tank energy dynamics plus the AC power balance.

use crate::optimizer::backend::{Cmp, LinearExpr, LpModel, VarId};
use crate::optimizer::thermal::ZoneGeometry;
use chrono::Timelike;
use powerplan_types::{ForecastSeries, Horizon, InitialState, PlanParameters};

/// Handles to every decision variable of one built model, for the
/// objective composer and the result extractor.
pub(crate) struct PlanVars {
    pub b_charge: Vec<VarId>,
    pub b_discharge: Vec<VarId>,
    pub b_power_net: Vec<VarId>,
    pub b_soc: Vec<VarId>,
    pub h_in_lower: Vec<VarId>,
    pub h_in_upper: Vec<VarId>,
    pub h_to_upper: Vec<VarId>,
    pub h_soc_lower: Vec<VarId>,
    pub h_soc_upper: Vec<VarId>,
    pub g_buy: Vec<VarId>,
    pub g_sell: Vec<VarId>,
    pub fve_unused: Vec<VarId>,
    pub bat_under: Vec<VarId>,
    pub temp_comfort_deficit: Vec<VarId>,
    pub temp_bath_deficit: Vec<VarId>,
    pub temp_critical_deficit: Vec<VarId>,
    /// Final battery energy below the threshold split
    pub b_short: VarId,
    /// Final battery energy above the threshold split
    pub b_surplus: VarId,
}

pub(crate) fn build_model(
    series: &ForecastSeries,
    initial: &InitialState,
    horizon: &Horizon,
    params: &PlanParameters,
) -> (LpModel, PlanVars) {
    let n = horizon.steps();
    let lower = ZoneGeometry::lower(params);
    let upper = ZoneGeometry::upper(params);
    let threshold = params.threshold();

    let b_soc0 = (initial.battery_soc_percent / 100.0 * params.b_cap)
        .clamp(params.b_min, params.b_max);
    let h_lower0 = lower.energy_for_temp(initial.temp_lower_c);
    let h_upper0 = upper.energy_for_temp(initial.temp_upper_c);

    // Transfer pump rating: alpha kW per degC of lower-zone span.
    let transfer_cap = params.alpha * (params.h_lower_max_t - params.h_lower_min_t);

    let mut model = LpModel::new();
    let mut vars = PlanVars {
        b_charge: Vec::with_capacity(n),
        b_discharge: Vec::with_capacity(n),
        b_power_net: Vec::with_capacity(n),
        b_soc: Vec::with_capacity(n),
        h_in_lower: Vec::with_capacity(n),
        h_in_upper: Vec::with_capacity(n),
        h_to_upper: Vec::with_capacity(n),
        h_soc_lower: Vec::with_capacity(n),
        h_soc_upper: Vec::with_capacity(n),
        g_buy: Vec::with_capacity(n),
        g_sell: Vec::with_capacity(n),
        fve_unused: Vec::with_capacity(n),
        bat_under: Vec::with_capacity(n),
        temp_comfort_deficit: Vec::with_capacity(n),
        temp_bath_deficit: Vec::with_capacity(n),
        temp_critical_deficit: Vec::with_capacity(n),
        b_short: VarId::default(),
        b_surplus: VarId::default(),
    };

    for _ in 0..n {
        vars.b_charge.push(model.add_var(0.0, params.b_power));
        vars.b_discharge.push(model.add_var(0.0, params.b_power));
        vars.b_power_net
            .push(model.add_var(-params.b_power, params.b_power));
        vars.b_soc.push(model.add_var(params.b_min, params.b_max));
        vars.h_in_lower.push(model.add_var(0.0, params.h_lower_power));
        vars.h_in_upper.push(model.add_var(0.0, params.h_upper_power));
        vars.h_to_upper.push(model.add_var(0.0, transfer_cap));
        vars.h_soc_lower.push(model.add_var(0.0, lower.cap));
        vars.h_soc_upper.push(model.add_var(0.0, upper.cap));
        vars.g_buy.push(model.add_var(0.0, f64::INFINITY));
        vars.g_sell.push(model.add_var(0.0, f64::INFINITY));
        vars.fve_unused.push(model.add_var(0.0, f64::INFINITY));
        vars.bat_under.push(model.add_var(0.0, f64::INFINITY));
        vars.temp_comfort_deficit
            .push(model.add_var(0.0, f64::INFINITY));
        vars.temp_bath_deficit.push(model.add_var(0.0, f64::INFINITY));
        vars.temp_critical_deficit
            .push(model.add_var(0.0, f64::INFINITY));
    }
    vars.b_short = model.add_var(0.0, threshold);
    vars.b_surplus = model.add_var(0.0, (params.b_cap - threshold).max(0.0));

    let (loss_lower_off, loss_lower_slope) = lower.loss_coefficients();
    let (loss_upper_off, loss_upper_slope) = upper.loss_coefficients();
    let parasitic = params.parasitic_water_heating;
    let upper_deg = upper.degrees_per_kwh();

    // The evening target relaxes when the lower zone starts warm; mixing
    // covers part of the draw.
    let bath_target = if initial.temp_lower_c > params.temp_lower_warm {
        params.temp_bath_reduced
    } else {
        params.temp_bath_target
    };

    for i in 0..n {
        let dt = horizon.dt[i];
        let dhw = series.dhw_at(i);
        let heating = if params.heating_enabled {
            series.heating_at(i)
        } else {
            0.0
        };

        // net battery power, charge positive
        model.constrain(
            LinearExpr::from(vars.b_power_net[i]) - vars.b_charge[i] + vars.b_discharge[i],
            Cmp::Eq,
            0.0,
        );

        // battery energy dynamics
        let soc_step = LinearExpr::from(vars.b_soc[i])
            - vars.b_charge[i] * (params.b_eff_in * dt)
            + vars.b_discharge[i] * (dt / params.b_eff_out);
        if i == 0 {
            model.constrain(soc_step, Cmp::Eq, b_soc0);
        } else {
            model.constrain(soc_step - vars.b_soc[i - 1], Cmp::Eq, 0.0);
        }

        // lower zone energy dynamics; standing loss is affine in the energy
        // held at the start of the step
        let lower_step = LinearExpr::from(vars.h_soc_lower[i])
            - vars.h_in_lower[i] * dt
            + vars.h_to_upper[i] * dt;
        if i == 0 {
            model.constrain(
                lower_step,
                Cmp::Eq,
                h_lower0 * (1.0 - loss_lower_slope * dt) - heating - loss_lower_off * dt,
            );
        } else {
            model.constrain(
                lower_step + vars.h_soc_lower[i - 1] * (loss_lower_slope * dt - 1.0),
                Cmp::Eq,
                -heating - loss_lower_off * dt,
            );
        }

        // upper zone energy dynamics
        let upper_step = LinearExpr::from(vars.h_soc_upper[i])
            - vars.h_in_upper[i] * dt
            - vars.h_to_upper[i] * dt;
        if i == 0 {
            model.constrain(
                upper_step,
                Cmp::Eq,
                h_upper0 * (1.0 - loss_upper_slope * dt) - dhw - loss_upper_off * dt,
            );
        } else {
            model.constrain(
                upper_step + vars.h_soc_upper[i - 1] * (loss_upper_slope * dt - 1.0),
                Cmp::Eq,
                -dhw - loss_upper_off * dt,
            );
        }

        // transfer cannot move more energy than the lower zone holds
        if i == 0 {
            model.constrain(vars.h_to_upper[i] * dt, Cmp::Leq, h_lower0);
        } else {
            model.constrain(
                vars.h_to_upper[i] * dt - vars.h_soc_lower[i - 1],
                Cmp::Leq,
                0.0,
            );
        }

        // AC power balance: pv + buy + discharge = load + charge + heaters
        // + parasitic overhead + sell + curtailment
        model.constrain(
            LinearExpr::from(vars.g_buy[i])
                + vars.b_discharge[i] * params.b_eff_out
                - vars.b_charge[i] * (1.0 / params.b_eff_in)
                - vars.h_in_lower[i] * (1.0 + parasitic)
                - vars.h_in_upper[i] * (1.0 + parasitic)
                - vars.g_sell[i]
                - vars.fve_unused[i],
            Cmp::Eq,
            series.load_kw[i] - series.pv_kw[i],
        );

        // combined heater rating
        model.constrain(
            LinearExpr::from(vars.h_in_lower[i]) + vars.h_in_upper[i],
            Cmp::Leq,
            params.h_power,
        );
        // main breaker
        model.constrain(
            LinearExpr::from(vars.g_buy[i])
                + vars.b_charge[i]
                + vars.h_in_lower[i]
                + vars.h_in_upper[i],
            Cmp::Leq,
            params.grid_limit,
        );
        // inverter AC side
        model.constrain(
            LinearExpr::from(vars.b_discharge[i])
                + vars.h_in_lower[i]
                + vars.h_in_upper[i]
                + vars.g_sell[i],
            Cmp::Leq,
            params.inverter_limit,
        );

        // keep battery headroom on steps with thermal demand; the raw
        // heating series counts even when the optimizer does not serve it,
        // the heater draw is coming either way
        if params.heat_headroom && dhw + series.heating_at(i) > 0.0 {
            model.constrain(LinearExpr::from(vars.b_soc[i]), Cmp::Leq, 0.9 * params.b_cap);
        }

        // energy missing below the threshold split
        model.constrain(
            LinearExpr::from(vars.bat_under[i]) + vars.b_soc[i],
            Cmp::Geq,
            threshold,
        );

        // upper zone temperature deficits, T(soc) affine
        model.constrain(
            LinearExpr::from(vars.temp_critical_deficit[i]) + vars.h_soc_upper[i] * upper_deg,
            Cmp::Geq,
            params.temp_critical_min - upper.t_min,
        );
        model.constrain(
            LinearExpr::from(vars.temp_comfort_deficit[i]) + vars.h_soc_upper[i] * upper_deg,
            Cmp::Geq,
            params.temp_comfort_target - upper.t_min,
        );
        let hour = i64::from(horizon.times[i].hour());
        if hour >= params.bath_time_start && hour <= params.bath_time_end {
            model.constrain(
                LinearExpr::from(vars.temp_bath_deficit[i]) + vars.h_soc_upper[i] * upper_deg,
                Cmp::Geq,
                bath_target - upper.t_min,
            );
        } else {
            model.constrain(LinearExpr::from(vars.temp_bath_deficit[i]), Cmp::Eq, 0.0);
        }
    }

    // threshold split of the final battery energy
    model.constrain(
        LinearExpr::from(vars.b_short) + vars.b_surplus - vars.b_soc[n - 1],
        Cmp::Eq,
        0.0,
    );

    (model, vars)
}
