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

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inverter operating mode as understood by the Solax actuator layer.
///
/// The serialized strings are a wire contract with the downstream
/// automation and must never be renamed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargerMode {
    #[serde(rename = "Manual Discharge")]
    ManualDischarge,
    #[serde(rename = "Manual Charge")]
    ManualCharge,
    #[serde(rename = "Manual Idle")]
    ManualIdle,
    #[serde(rename = "Feedin Priority")]
    FeedinPriority,
    #[serde(rename = "Back Up Mode")]
    BackupStandard,
}

impl ChargerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChargerMode::ManualDischarge => "Manual Discharge",
            ChargerMode::ManualCharge => "Manual Charge",
            ChargerMode::ManualIdle => "Manual Idle",
            ChargerMode::FeedinPriority => "Feedin Priority",
            ChargerMode::BackupStandard => "Back Up Mode",
        }
    }
}

impl fmt::Display for ChargerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Default for ChargerMode {
    fn default() -> Self {
        ChargerMode::BackupStandard
    }
}

/// One actuation record published after every planning cycle. Field names
/// are a stable wire contract with the actuator layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSet {
    pub charger_use_mode: ChargerMode,
    pub upper_accumulation_on: bool,
    pub lower_accumulation_on: bool,
    pub max_heat_on: bool,
    pub forced_heating_block: bool,
    pub comfort_heating_grid: bool,
    /// Battery discharge power [W], nonzero only in Manual Discharge
    pub battery_discharge_power: f64,
    /// Battery target state of charge [%]
    pub battery_target_soc: f64,
    /// Reserve charging power [W]
    pub reserve_power_charging: f64,
    /// Minimum battery state of charge the actuator may drain to [%]
    pub minimum_battery_soc: f64,
}

/// Mode-selection memory carried between planning cycles. Keeps the
/// inverter from chattering when plan values hover around a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HysteresisState {
    pub mode: ChargerMode,
    pub since: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charger_mode_wire_strings() {
        let cases = [
            (ChargerMode::ManualDischarge, "\"Manual Discharge\""),
            (ChargerMode::ManualCharge, "\"Manual Charge\""),
            (ChargerMode::ManualIdle, "\"Manual Idle\""),
            (ChargerMode::FeedinPriority, "\"Feedin Priority\""),
            (ChargerMode::BackupStandard, "\"Back Up Mode\""),
        ];
        for (mode, wire) in cases {
            assert_eq!(serde_json::to_string(&mode).unwrap(), wire);
            let back: ChargerMode = serde_json::from_str(wire).unwrap();
            assert_eq!(back, mode);
        }
    }

    #[test]
    fn test_action_set_field_names_are_stable() {
        let actions = ActionSet {
            charger_use_mode: ChargerMode::BackupStandard,
            upper_accumulation_on: true,
            lower_accumulation_on: false,
            max_heat_on: false,
            forced_heating_block: false,
            comfort_heating_grid: true,
            battery_discharge_power: 0.0,
            battery_target_soc: 55.5,
            reserve_power_charging: 2000.0,
            minimum_battery_soc: 40.0,
        };
        let value = serde_json::to_value(&actions).unwrap();
        let object = value.as_object().unwrap();
        for key in [
            "charger_use_mode",
            "upper_accumulation_on",
            "lower_accumulation_on",
            "max_heat_on",
            "forced_heating_block",
            "comfort_heating_grid",
            "battery_discharge_power",
            "battery_target_soc",
            "reserve_power_charging",
            "minimum_battery_soc",
        ] {
            assert!(object.contains_key(key), "missing wire field {key}");
        }
        assert_eq!(object["charger_use_mode"], "Back Up Mode");
    }
}
