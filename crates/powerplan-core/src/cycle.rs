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

//! One planning cycle end to end: validate, resolve, solve, derive,
//! persist. An external scheduler triggers cycles; overlapping triggers
//! are rejected rather than queued.

use crate::actions::derive_actions;
use crate::error::PlanError;
use crate::optimizer::backend::{GoodLpBackend, LpBackend};
use crate::optimizer::run_optimizer;
use crate::params::resolve;
use crate::snapshot::SnapshotStore;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use powerplan_types::{ActionSet, HysteresisState, InputBundle, SensorSnapshot, Solution};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Everything one successful cycle produces.
#[derive(Debug, Clone)]
pub struct CycleOutcome {
    pub solution: Solution,
    pub actions: ActionSet,
    pub snapshot_path: PathBuf,
}

/// Cycle driver. Holds the option overrides, the snapshot store and the
/// mode-hysteresis memory; a `try_lock` guard rejects overlapping cycles
/// so two solves can never race on `latest.json`.
pub struct Planner {
    overrides: Map<String, Value>,
    backend: Arc<dyn LpBackend>,
    store: SnapshotStore,
    hysteresis: Mutex<Option<HysteresisState>>,
}

impl Planner {
    pub fn new(overrides: Map<String, Value>, store: SnapshotStore) -> Self {
        Self::with_backend(overrides, store, Arc::new(GoodLpBackend))
    }

    pub fn with_backend(
        overrides: Map<String, Value>,
        store: SnapshotStore,
        backend: Arc<dyn LpBackend>,
    ) -> Self {
        Self {
            overrides,
            backend,
            store,
            hysteresis: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Runs one full cycle. A failed solve leaves the previous snapshot
    /// and the hysteresis state untouched; the caller keeps acting on the
    /// last good ActionSet.
    pub fn run_cycle(
        &self,
        bundle: InputBundle,
        sensors: &SensorSnapshot,
        now: DateTime<Utc>,
    ) -> Result<CycleOutcome, PlanError> {
        let mut hysteresis = self.hysteresis.try_lock().ok_or(PlanError::CycleInProgress)?;

        let (series, initial, mut horizon) = bundle.into_parts()?;
        horizon.align_first_step(now);

        let params = resolve(&self.overrides, &series.buy_price);
        info!(
            steps = horizon.steps(),
            first_dt = horizon.dt.first().copied().unwrap_or(0.0),
            soc = initial.battery_soc_percent,
            "starting planning cycle"
        );

        let solution = run_optimizer(
            &series,
            &initial,
            &horizon,
            &params,
            Arc::clone(&self.backend),
        )?;

        let (actions, state) = derive_actions(&solution, sensors, &params, *hysteresis, now);
        let snapshot_path = self.store.save(&solution).map_err(PlanError::Snapshot)?;
        *hysteresis = Some(state);

        info!(
            mode = %actions.charger_use_mode,
            upper = actions.upper_accumulation_on,
            lower = actions.lower_accumulation_on,
            "planning cycle finished"
        );
        Ok(CycleOutcome {
            solution,
            actions,
            snapshot_path,
        })
    }
}
