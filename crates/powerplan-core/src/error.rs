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

use powerplan_types::InputError;
use thiserror::Error;

/// Failure modes of one planning cycle.
///
/// A failed solve is fatal for the cycle and never produces a partial
/// `Solution`; the caller keeps the previous ActionSet instead of replacing
/// it with zeros.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("optimal solution not found, model infeasible")]
    Infeasible,

    #[error("model unbounded, check price and bonus weights")]
    Unbounded,

    #[error("solver did not finish within {secs} s")]
    SolveTimeout { secs: u64 },

    #[error("solver failed: {0}")]
    Solver(String),

    #[error(transparent)]
    Input(#[from] InputError),

    #[error("a planning cycle is already running")]
    CycleInProgress,

    #[error("snapshot store failure")]
    Snapshot(#[source] anyhow::Error),
}
