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

//! Tank zone thermodynamics, kept affine so the optimizer stays linear.

use powerplan_types::PlanParameters;

/// Tank shell loss coefficient [kW/degC]
pub const K_TANK: f64 = 0.002;
/// Circulation loop loss coefficient [kW/degC]
pub const K_CIRC: f64 = 0.006;
/// Utility-room ambient temperature [degC]
pub const T_AMBIENT: f64 = 20.0;
/// Fraction of time the circulation loop runs
pub const CIRC_FRACTION: f64 = 0.3;

/// One tank zone: capacity plus the temperature span it maps onto.
///
/// Stored energy and temperature are affine images of each other, so the
/// standing loss (proportional to temperature above ambient) is affine in
/// stored energy too.
#[derive(Debug, Clone, Copy)]
pub struct ZoneGeometry {
    /// Zone capacity [kWh]
    pub cap: f64,
    /// Temperature at zero stored energy [degC]
    pub t_min: f64,
    /// Temperature at full stored energy [degC]
    pub t_max: f64,
}

impl ZoneGeometry {
    pub fn lower(params: &PlanParameters) -> Self {
        Self {
            cap: params.lower_cap(),
            t_min: params.h_lower_min_t,
            t_max: params.h_lower_max_t,
        }
    }

    pub fn upper(params: &PlanParameters) -> Self {
        Self {
            cap: params.upper_cap(),
            t_min: params.h_upper_min_t,
            t_max: params.h_upper_max_t,
        }
    }

    /// degC per stored kWh.
    pub fn degrees_per_kwh(&self) -> f64 {
        (self.t_max - self.t_min) / self.cap
    }

    pub fn temp_for_energy(&self, soc: f64) -> f64 {
        self.t_min + soc * self.degrees_per_kwh()
    }

    /// Inverse map, clamped to the physical zone range.
    pub fn energy_for_temp(&self, temp: f64) -> f64 {
        let soc = (temp - self.t_min) / self.degrees_per_kwh();
        soc.clamp(0.0, self.cap)
    }

    /// Standing loss as `offset + slope * soc` [kW].
    ///
    /// `loss(T) = (K_TANK + K_CIRC * CIRC_FRACTION) * (T - T_AMBIENT)`
    /// with `T` affine in soc.
    pub fn loss_coefficients(&self) -> (f64, f64) {
        let k = K_TANK + K_CIRC * CIRC_FRACTION;
        let offset = k * (self.t_min - T_AMBIENT);
        let slope = k * self.degrees_per_kwh();
        (offset, slope)
    }

    pub fn loss_at(&self, soc: f64) -> f64 {
        let (offset, slope) = self.loss_coefficients();
        offset + slope * soc
    }
}
