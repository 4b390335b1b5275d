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

//! Parameter resolver: turns a flat string-keyed override map into a
//! fully-typed [`PlanParameters`].
//!
//! Resolution never fails. Unknown keys are ignored with a warning,
//! wrong-typed or out-of-range values fall back to the declared default,
//! and the capacity/price-derived fields fall back to their derivation
//! rules. The declarative table doubles as metadata for a settings UI.

use powerplan_types::{ChargerMode, PlanParameters};
use serde_json::{Map, Value, json};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    Float,
    Int,
}

impl OptionKind {
    fn as_str(self) -> &'static str {
        match self {
            OptionKind::Bool => "bool",
            OptionKind::Float => "float",
            OptionKind::Int => "int",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum OptionDefault {
    Bool(bool),
    Float(f64),
    Int(i64),
    /// Computed from other inputs; the string names the rule.
    Derived(&'static str),
}

/// One tunable: key, type, unit, inclusive range and default.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub key: &'static str,
    pub kind: OptionKind,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
    pub default: OptionDefault,
}

use OptionDefault as D;
use OptionKind as K;

macro_rules! opt {
    ($key:literal, $kind:expr, $unit:literal, $min:expr, $max:expr, $default:expr) => {
        OptionSpec {
            key: $key,
            kind: $kind,
            unit: $unit,
            min: $min,
            max: $max,
            default: $default,
        }
    };
}

pub const OPTION_SPECS: &[OptionSpec] = &[
    opt!("heating_enabled", K::Bool, "", 0.0, 1.0, D::Bool(false)),
    opt!("heat_headroom", K::Bool, "", 0.0, 1.0, D::Bool(true)),
    opt!("b_cap", K::Float, "kWh", 0.1, 200.0, D::Float(17.4)),
    opt!("b_min", K::Float, "kWh", 0.0, 200.0, D::Derived("b_cap * 0.15")),
    opt!("b_max", K::Float, "kWh", 0.0, 200.0, D::Derived("b_cap")),
    opt!("b_power", K::Float, "kW", 0.0, 100.0, D::Float(9.0)),
    opt!("b_eff_in", K::Float, "", 0.5, 1.0, D::Float(0.94)),
    opt!("b_eff_out", K::Float, "", 0.5, 1.0, D::Float(0.94)),
    opt!("h_cap", K::Float, "kWh", 1.0, 500.0, D::Float(45.0)),
    opt!("h_lower_min_t", K::Float, "degC", 0.0, 100.0, D::Float(30.0)),
    opt!("h_lower_max_t", K::Float, "degC", 0.0, 100.0, D::Float(85.0)),
    opt!("h_upper_min_t", K::Float, "degC", 0.0, 100.0, D::Float(45.0)),
    opt!("h_upper_max_t", K::Float, "degC", 0.0, 100.0, D::Float(90.0)),
    opt!("h_lower_vol", K::Float, "", 0.0, 1.0, D::Float(0.7)),
    opt!("h_upper_vol", K::Float, "", 0.0, 1.0, D::Float(0.3)),
    opt!("h_lower_power", K::Float, "kW", 0.0, 100.0, D::Float(8.0)),
    opt!("h_upper_power", K::Float, "kW", 0.0, 100.0, D::Float(4.0)),
    opt!("h_power", K::Float, "kW", 0.0, 100.0, D::Float(12.0)),
    opt!("grid_limit", K::Float, "kW", 1.0, 100.0, D::Float(18.0)),
    opt!("inverter_limit", K::Float, "kW", 1.0, 100.0, D::Float(15.0)),
    opt!(
        "final_boiler_price",
        K::Float,
        "Kc/kWh",
        -50.0,
        50.0,
        D::Derived("min(buy_price) - 0.5")
    ),
    opt!("bat_threshold_pct", K::Float, "", 0.0, 1.0, D::Float(0.40)),
    opt!(
        "bat_price_below",
        K::Float,
        "Kc/kWh",
        -50.0,
        50.0,
        D::Derived("min(buy_price)")
    ),
    opt!(
        "bat_price_above",
        K::Float,
        "Kc/kWh",
        -50.0,
        50.0,
        D::Derived("min(buy_price) - 0.5")
    ),
    opt!("battery_penalty", K::Float, "Kc/kWh", 0.0, 100.0, D::Float(1.0)),
    opt!("fve_unused_penalty", K::Float, "Kc/kWh", 0.0, 100.0, D::Float(0.1)),
    opt!("water_priority_bonus", K::Float, "Kc/kWh", 0.0, 100.0, D::Float(1.0)),
    opt!("bat_under_penalty", K::Float, "Kc/kWh", 0.0, 100.0, D::Float(0.1)),
    opt!("tank_value_bonus", K::Float, "Kc/kWh", 0.0, 100.0, D::Float(1.0)),
    opt!("parasitic_water_heating", K::Float, "", 0.0, 1.0, D::Float(0.05)),
    opt!("alpha", K::Float, "kW/degC", 0.0, 10.0, D::Float(0.1)),
    opt!("upper_zone_priority", K::Float, "Kc/kWh", 0.0, 100.0, D::Float(0.5)),
    opt!("temp_comfort_penalty", K::Float, "Kc/degC", 0.0, 1000.0, D::Float(2.0)),
    opt!("temp_bath_penalty", K::Float, "Kc/degC", 0.0, 1000.0, D::Float(1.0)),
    opt!("temp_critical_penalty", K::Float, "Kc/degC", 0.0, 1000.0, D::Float(10.0)),
    opt!("temp_comfort_target", K::Float, "degC", 0.0, 100.0, D::Float(45.0)),
    opt!("temp_bath_target", K::Float, "degC", 0.0, 100.0, D::Float(65.0)),
    opt!("temp_bath_reduced", K::Float, "degC", 0.0, 100.0, D::Float(55.0)),
    opt!("temp_critical_min", K::Float, "degC", 0.0, 100.0, D::Float(40.0)),
    opt!("temp_lower_warm", K::Float, "degC", 0.0, 100.0, D::Float(50.0)),
    opt!("temp_accumulation_target", K::Float, "degC", 0.0, 100.0, D::Float(70.0)),
    opt!("temp_full_tank", K::Float, "degC", 0.0, 100.0, D::Float(90.0)),
    opt!("manual_mode_threshold", K::Float, "kW", 0.0, 100.0, D::Float(3.5)),
    opt!("export_threshold", K::Float, "kW", 0.0, 100.0, D::Float(0.10)),
    opt!("idle_buy_threshold", K::Float, "kW", 0.0, 100.0, D::Float(0.2)),
    opt!("idle_pv_threshold", K::Float, "kW", 0.0, 100.0, D::Float(0.6)),
    opt!("surplus_threshold", K::Float, "kW", 0.0, 100.0, D::Float(2.0)),
    opt!("lower_surplus_threshold", K::Float, "kW", 0.0, 100.0, D::Float(1.0)),
    opt!("mid_surplus_threshold", K::Float, "kW", 0.0, 100.0, D::Float(3.0)),
    opt!("big_surplus_threshold", K::Float, "kW", 0.0, 100.0, D::Float(5.0)),
    opt!("max_heat_surplus", K::Float, "kW", 0.0, 100.0, D::Float(8.0)),
    opt!("cheap_price", K::Float, "Kc/kWh", -50.0, 50.0, D::Float(2.5)),
    opt!("expensive_price", K::Float, "Kc/kWh", -50.0, 50.0, D::Float(6.0)),
    opt!("battery_healthy_soc", K::Float, "%", 0.0, 100.0, D::Float(40.0)),
    opt!("min_soc_reserve", K::Float, "%", 0.0, 100.0, D::Float(40.0)),
    opt!("tank_value_hour", K::Int, "h", 0.0, 23.0, D::Int(18)),
    opt!("bath_time_start", K::Int, "h", 0.0, 23.0, D::Int(18)),
    opt!("bath_time_end", K::Int, "h", 0.0, 23.0, D::Int(21)),
    opt!("mode_dwell_minutes", K::Int, "min", 0.0, 1440.0, D::Int(15)),
    opt!("solver_timeout_secs", K::Int, "s", 1.0, 600.0, D::Int(20)),
];

fn spec_for(key: &str) -> Option<&'static OptionSpec> {
    OPTION_SPECS.iter().find(|spec| spec.key == key)
}

fn resolve_bool(overrides: &Map<String, Value>, key: &'static str) -> bool {
    let Some(spec) = spec_for(key) else {
        return false;
    };
    let fallback = match spec.default {
        OptionDefault::Bool(v) => v,
        _ => false,
    };
    match overrides.get(key) {
        None => fallback,
        Some(value) => value.as_bool().unwrap_or_else(|| {
            warn!(key, "option override has wrong type, using default");
            fallback
        }),
    }
}

fn resolve_float(overrides: &Map<String, Value>, key: &'static str) -> f64 {
    let Some(spec) = spec_for(key) else {
        return 0.0;
    };
    let fallback = match spec.default {
        OptionDefault::Float(v) => v,
        _ => 0.0,
    };
    match overrides.get(key) {
        None => fallback,
        Some(value) => match value.as_f64() {
            Some(v) if v.is_finite() && v >= spec.min && v <= spec.max => v,
            Some(v) => {
                warn!(
                    key,
                    value = v,
                    min = spec.min,
                    max = spec.max,
                    "option override out of range, using default"
                );
                fallback
            }
            None => {
                warn!(key, "option override has wrong type, using default");
                fallback
            }
        },
    }
}

fn resolve_int(overrides: &Map<String, Value>, key: &'static str) -> i64 {
    let Some(spec) = spec_for(key) else {
        return 0;
    };
    let fallback = match spec.default {
        OptionDefault::Int(v) => v,
        _ => 0,
    };
    match overrides.get(key) {
        None => fallback,
        Some(value) => match value.as_i64() {
            Some(v) if v as f64 >= spec.min && v as f64 <= spec.max => v,
            Some(v) => {
                warn!(
                    key,
                    value = v,
                    min = spec.min,
                    max = spec.max,
                    "option override out of range, using default"
                );
                fallback
            }
            None => {
                warn!(key, "option override has wrong type, using default");
                fallback
            }
        },
    }
}

/// Explicit override for a derived option. Returns `None` when absent or
/// unusable, in which case the derivation rule applies.
fn derived_override(
    overrides: &Map<String, Value>,
    key: &'static str,
    strictly_positive: bool,
) -> Option<f64> {
    let spec = spec_for(key)?;
    let value = overrides.get(key)?;
    match value.as_f64() {
        Some(v) if strictly_positive && v <= 0.0 => {
            warn!(key, value = v, "non-positive capacity override, using derivation rule");
            None
        }
        Some(v) if v.is_finite() && v >= spec.min && v <= spec.max => Some(v),
        Some(v) => {
            warn!(
                key,
                value = v,
                min = spec.min,
                max = spec.max,
                "option override out of range, using derivation rule"
            );
            None
        }
        None => {
            warn!(key, "option override has wrong type, using derivation rule");
            None
        }
    }
}

/// Resolves an override map against the declarative table. Never fails;
/// every fallback is logged. `buy_price` feeds the price-derived defaults.
pub fn resolve(overrides: &Map<String, Value>, buy_price: &[f64]) -> PlanParameters {
    for key in overrides.keys() {
        if key != "standard_mode" && spec_for(key).is_none() {
            warn!(key = key.as_str(), "ignoring unknown option key");
        }
    }

    let min_buy = buy_price.iter().copied().fold(f64::INFINITY, f64::min);
    let min_buy = if min_buy.is_finite() { min_buy } else { 0.0 };

    let b = |key| resolve_bool(overrides, key);
    let f = |key| resolve_float(overrides, key);
    let i = |key| resolve_int(overrides, key);

    let b_cap = f("b_cap");

    let standard_mode = overrides
        .get("standard_mode")
        .and_then(|value| serde_json::from_value::<ChargerMode>(value.clone()).ok())
        .unwrap_or_default();

    PlanParameters {
        heating_enabled: b("heating_enabled"),
        heat_headroom: b("heat_headroom"),

        b_cap,
        b_min: derived_override(overrides, "b_min", true).unwrap_or(b_cap * 0.15),
        b_max: derived_override(overrides, "b_max", true).unwrap_or(b_cap),
        b_power: f("b_power"),
        b_eff_in: f("b_eff_in"),
        b_eff_out: f("b_eff_out"),

        h_cap: f("h_cap"),
        h_lower_min_t: f("h_lower_min_t"),
        h_lower_max_t: f("h_lower_max_t"),
        h_upper_min_t: f("h_upper_min_t"),
        h_upper_max_t: f("h_upper_max_t"),
        h_lower_vol: f("h_lower_vol"),
        h_upper_vol: f("h_upper_vol"),
        h_lower_power: f("h_lower_power"),
        h_upper_power: f("h_upper_power"),
        h_power: f("h_power"),

        grid_limit: f("grid_limit"),
        inverter_limit: f("inverter_limit"),

        final_boiler_price: derived_override(overrides, "final_boiler_price", false)
            .unwrap_or(min_buy - 0.5),
        bat_threshold_pct: f("bat_threshold_pct"),
        bat_price_below: derived_override(overrides, "bat_price_below", false).unwrap_or(min_buy),
        bat_price_above: derived_override(overrides, "bat_price_above", false)
            .unwrap_or(min_buy - 0.5),
        battery_penalty: f("battery_penalty"),
        fve_unused_penalty: f("fve_unused_penalty"),
        water_priority_bonus: f("water_priority_bonus"),
        bat_under_penalty: f("bat_under_penalty"),
        tank_value_bonus: f("tank_value_bonus"),
        parasitic_water_heating: f("parasitic_water_heating"),
        alpha: f("alpha"),
        upper_zone_priority: f("upper_zone_priority"),

        temp_comfort_penalty: f("temp_comfort_penalty"),
        temp_bath_penalty: f("temp_bath_penalty"),
        temp_critical_penalty: f("temp_critical_penalty"),
        temp_comfort_target: f("temp_comfort_target"),
        temp_bath_target: f("temp_bath_target"),
        temp_bath_reduced: f("temp_bath_reduced"),
        temp_critical_min: f("temp_critical_min"),
        temp_lower_warm: f("temp_lower_warm"),
        temp_accumulation_target: f("temp_accumulation_target"),
        temp_full_tank: f("temp_full_tank"),

        manual_mode_threshold: f("manual_mode_threshold"),
        export_threshold: f("export_threshold"),
        idle_buy_threshold: f("idle_buy_threshold"),
        idle_pv_threshold: f("idle_pv_threshold"),
        surplus_threshold: f("surplus_threshold"),
        lower_surplus_threshold: f("lower_surplus_threshold"),
        mid_surplus_threshold: f("mid_surplus_threshold"),
        big_surplus_threshold: f("big_surplus_threshold"),
        max_heat_surplus: f("max_heat_surplus"),
        cheap_price: f("cheap_price"),
        expensive_price: f("expensive_price"),
        battery_healthy_soc: f("battery_healthy_soc"),
        min_soc_reserve: f("min_soc_reserve"),

        tank_value_hour: i("tank_value_hour"),
        bath_time_start: i("bath_time_start"),
        bath_time_end: i("bath_time_end"),
        mode_dwell_minutes: i("mode_dwell_minutes"),
        solver_timeout_secs: i("solver_timeout_secs").max(1) as u64,

        standard_mode,
    }
}

/// Option metadata as JSON, for a settings-editing frontend.
pub fn options_table() -> Value {
    let entries: Vec<Value> = OPTION_SPECS
        .iter()
        .map(|spec| {
            let default = match spec.default {
                OptionDefault::Bool(v) => json!(v),
                OptionDefault::Float(v) => json!(v),
                OptionDefault::Int(v) => json!(v),
                OptionDefault::Derived(rule) => json!({ "derived": rule }),
            };
            json!({
                "key": spec.key,
                "type": spec.kind.as_str(),
                "unit": spec.unit,
                "min": spec.min,
                "max": spec.max,
                "default": default,
            })
        })
        .collect();
    Value::Array(entries)
}
