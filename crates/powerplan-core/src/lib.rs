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

//! Receding-horizon dispatch planning for a household with a PV plant,
//! a battery and a two-zone hot-water store.
//!
//! Each cycle re-optimizes the whole horizon as a linear program, then maps
//! the first step of the plan onto discrete Solax actuator commands. Only the
//! first step is ever executed; the next cycle replans from fresh state.

pub mod actions;
pub mod cycle;
pub mod error;
pub mod optimizer;
pub mod params;
pub mod snapshot;

pub use actions::{derive_action_timeline, derive_actions};
pub use cycle::{CycleOutcome, Planner};
pub use error::PlanError;
pub use optimizer::backend::{GoodLpBackend, LpBackend};
pub use optimizer::run_optimizer;
pub use params::{OPTION_SPECS, OptionSpec, options_table, resolve};
pub use snapshot::SnapshotStore;
