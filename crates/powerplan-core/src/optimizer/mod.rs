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

//! Receding-horizon LP engine: model builder, objective composer, solver
//! backend seam and result extraction.

pub mod backend;
mod extract;
mod model;
mod objective;
pub mod thermal;

use crate::error::PlanError;
use backend::{LpBackend, LpModel, LpSolution, SolveFailure};
use powerplan_types::{
    ForecastSeries, Horizon, InitialState, InputError, PlanParameters, Solution,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Solves one planning horizon. Validates the series, builds the LP, runs
/// the backend under a watchdog and extracts the full [`Solution`]. A
/// failed solve returns an error and never a partial plan.
pub fn run_optimizer(
    series: &ForecastSeries,
    initial: &InitialState,
    horizon: &Horizon,
    params: &PlanParameters,
    backend: Arc<dyn LpBackend>,
) -> Result<Solution, PlanError> {
    // a hand-built Horizon can bypass the constructor checks
    if horizon.steps() == 0 {
        return Err(InputError::EmptyHorizon.into());
    }
    series.validate(horizon.steps())?;

    let (mut lp, vars) = model::build_model(series, initial, horizon, params);
    let objective = objective::build_objective(&vars, series, horizon, params);
    lp.minimize(objective.clone());
    debug!(
        steps = horizon.steps(),
        vars = lp.num_vars(),
        constraints = lp.num_constraints(),
        "dispatch model built"
    );

    let started = Instant::now();
    let solved = solve_with_timeout(lp, backend, params.solver_timeout_secs)?;
    let solve_time = started.elapsed().as_secs_f64();

    let solution = extract::extract(
        &solved, &vars, &objective, series, horizon, params, solve_time,
    );
    info!(
        steps = horizon.steps(),
        solve_time,
        objective = solution.results.objective_value,
        net_bilance = solution.results.net_bilance,
        "dispatch plan solved"
    );
    Ok(solution)
}

/// Runs the backend on a worker thread and bounds the wait. On expiry the
/// worker is abandoned; its send into the bounded channel just fails.
fn solve_with_timeout(
    model: LpModel,
    backend: Arc<dyn LpBackend>,
    secs: u64,
) -> Result<LpSolution, PlanError> {
    let (tx, rx) = crossbeam_channel::bounded(1);
    std::thread::spawn(move || {
        let _ = tx.send(backend.solve(&model));
    });
    match rx.recv_timeout(Duration::from_secs(secs)) {
        Ok(Ok(solution)) => Ok(solution),
        Ok(Err(SolveFailure::Infeasible)) => Err(PlanError::Infeasible),
        Ok(Err(SolveFailure::Unbounded)) => Err(PlanError::Unbounded),
        Ok(Err(SolveFailure::Other(message))) => Err(PlanError::Solver(message)),
        Err(_) => {
            warn!(secs, "solver watchdog expired");
            Err(PlanError::SolveTimeout { secs })
        }
    }
}
