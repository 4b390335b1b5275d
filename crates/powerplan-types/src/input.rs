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

use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failures at the input boundary. Anything past this point
/// can assume consistent, finite data.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("horizon contains no timestamps")]
    EmptyHorizon,

    #[error("series `{name}` has {actual} samples, horizon has {expected} steps")]
    LengthMismatch {
        name: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("series `{name}` has a non-finite value at step {index}")]
    NonFinite { name: &'static str, index: usize },

    #[error("series `{name}` has a negative value at step {index}")]
    Negative { name: &'static str, index: usize },

    #[error("step duration at index {index} must be positive and finite")]
    BadStep { index: usize },

    #[error("step durations have {actual} entries, horizon has {expected} timestamps")]
    StepCountMismatch { expected: usize, actual: usize },
}

/// Planning horizon: ordered zone-aware timestamps plus per-step durations
/// in hours. The local hour of each timestamp drives the time-of-day terms
/// of the objective and the evening comfort window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Horizon {
    pub times: Vec<DateTime<FixedOffset>>,
    pub dt: Vec<f64>,
}

impl Horizon {
    /// Horizon with a uniform 1.0 h step.
    pub fn hourly(times: Vec<DateTime<FixedOffset>>) -> Result<Self, InputError> {
        if times.is_empty() {
            return Err(InputError::EmptyHorizon);
        }
        let dt = vec![1.0; times.len()];
        Ok(Self { times, dt })
    }

    /// Horizon with explicit per-step durations.
    pub fn with_steps(
        times: Vec<DateTime<FixedOffset>>,
        dt: Vec<f64>,
    ) -> Result<Self, InputError> {
        if times.is_empty() {
            return Err(InputError::EmptyHorizon);
        }
        if dt.len() != times.len() {
            return Err(InputError::StepCountMismatch {
                expected: times.len(),
                actual: dt.len(),
            });
        }
        for (index, &step) in dt.iter().enumerate() {
            if !step.is_finite() || step <= 0.0 {
                return Err(InputError::BadStep { index });
            }
        }
        Ok(Self { times, dt })
    }

    pub fn steps(&self) -> usize {
        self.times.len()
    }

    /// Shrinks the first step to the remainder of the current slot so that a
    /// cycle triggered mid-hour does not over-account the running slot.
    pub fn align_first_step(&mut self, now: DateTime<Utc>) {
        if self.times.len() < 2 {
            return;
        }
        let remain = self.times[1]
            .with_timezone(&Utc)
            .signed_duration_since(now)
            .num_seconds() as f64
            / 3600.0;
        if remain > 0.0 && remain < self.dt[0] {
            self.dt[0] = remain;
        }
    }
}

/// Forecast arrays, one entry per horizon step. The demand and outdoor
/// temperature series are optional; an empty array reads as all zeros.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSeries {
    /// PV production forecast [kW]
    pub pv_kw: Vec<f64>,
    /// Household consumption forecast [kW], water heating excluded
    pub load_kw: Vec<f64>,
    /// Purchase price [Kc/kWh]
    pub buy_price: Vec<f64>,
    /// Feed-in price [Kc/kWh]
    pub sell_price: Vec<f64>,
    /// Domestic hot water draw, served from the upper zone [kWh per step]
    #[serde(default)]
    pub dhw_demand_kwh: Vec<f64>,
    /// Space-heating draw, served from the lower zone [kWh per step]
    #[serde(default)]
    pub heating_demand_kwh: Vec<f64>,
    /// Outdoor temperature forecast [degC]
    #[serde(default)]
    pub outdoor_temp_c: Vec<f64>,
}

impl ForecastSeries {
    pub fn validate(&self, expected: usize) -> Result<(), InputError> {
        let required: [(&'static str, &[f64]); 4] = [
            ("pv_kw", &self.pv_kw),
            ("load_kw", &self.load_kw),
            ("buy_price", &self.buy_price),
            ("sell_price", &self.sell_price),
        ];
        for (name, values) in required {
            if values.len() != expected {
                return Err(InputError::LengthMismatch {
                    name,
                    expected,
                    actual: values.len(),
                });
            }
        }
        let optional: [(&'static str, &[f64]); 3] = [
            ("dhw_demand_kwh", &self.dhw_demand_kwh),
            ("heating_demand_kwh", &self.heating_demand_kwh),
            ("outdoor_temp_c", &self.outdoor_temp_c),
        ];
        for (name, values) in optional {
            if !values.is_empty() && values.len() != expected {
                return Err(InputError::LengthMismatch {
                    name,
                    expected,
                    actual: values.len(),
                });
            }
        }
        let all: [(&'static str, &[f64]); 7] = [
            ("pv_kw", &self.pv_kw),
            ("load_kw", &self.load_kw),
            ("buy_price", &self.buy_price),
            ("sell_price", &self.sell_price),
            ("dhw_demand_kwh", &self.dhw_demand_kwh),
            ("heating_demand_kwh", &self.heating_demand_kwh),
            ("outdoor_temp_c", &self.outdoor_temp_c),
        ];
        for (name, values) in all {
            for (index, &value) in values.iter().enumerate() {
                if !value.is_finite() {
                    return Err(InputError::NonFinite { name, index });
                }
            }
        }
        // Prices may go negative, temperatures too; physical quantities not.
        let non_negative: [(&'static str, &[f64]); 4] = [
            ("pv_kw", &self.pv_kw),
            ("load_kw", &self.load_kw),
            ("dhw_demand_kwh", &self.dhw_demand_kwh),
            ("heating_demand_kwh", &self.heating_demand_kwh),
        ];
        for (name, values) in non_negative {
            for (index, &value) in values.iter().enumerate() {
                if value < 0.0 {
                    return Err(InputError::Negative { name, index });
                }
            }
        }
        Ok(())
    }

    pub fn dhw_at(&self, index: usize) -> f64 {
        self.dhw_demand_kwh.get(index).copied().unwrap_or(0.0)
    }

    pub fn heating_at(&self, index: usize) -> f64 {
        self.heating_demand_kwh.get(index).copied().unwrap_or(0.0)
    }
}

/// Measured state at the start of the horizon.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InitialState {
    /// Battery state of charge [%]
    pub battery_soc_percent: f64,
    /// Lower tank zone temperature [degC]
    pub temp_lower_c: f64,
    /// Upper tank zone temperature [degC]
    pub temp_upper_c: f64,
}

/// Live readings consumed only by action derivation, never by the model.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SensorSnapshot {
    pub pv_kw: f64,
    pub load_kw: f64,
}

/// The complete input contract of one planning cycle, as delivered by the
/// upstream aggregator. `dt` defaults to 1.0 h per step when absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputBundle {
    pub times: Vec<DateTime<FixedOffset>>,
    #[serde(default)]
    pub dt: Option<Vec<f64>>,
    pub series: ForecastSeries,
    pub initials: InitialState,
}

impl InputBundle {
    pub fn into_parts(self) -> Result<(ForecastSeries, InitialState, Horizon), InputError> {
        let horizon = match self.dt {
            Some(dt) => Horizon::with_steps(self.times, dt)?,
            None => Horizon::hourly(self.times)?,
        };
        self.series.validate(horizon.steps())?;
        Ok((self.series, self.initials, horizon))
    }
}
