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

//! Minimal LP abstraction so constraint-writing code never touches the
//! solver crate directly and the backend stays swappable.

use good_lp::{Expression, ResolutionError, Solution, SolverModel, default_solver, variable};
use std::ops::{Add, Div, Mul, Neg, Sub};

/// Index of a decision variable inside one [`LpModel`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct VarId(usize);

/// Linear combination of variables plus a constant.
#[derive(Debug, Clone, Default)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn constant(value: f64) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) {
        self.terms.push((var, coefficient));
    }

    /// Evaluates the expression against a solved value vector.
    pub fn eval(&self, solution: &LpSolution) -> f64 {
        self.constant
            + self
                .terms
                .iter()
                .map(|&(var, c)| c * solution.value(var))
                .sum::<f64>()
    }
}

impl From<VarId> for LinearExpr {
    fn from(var: VarId) -> Self {
        Self {
            terms: vec![(var, 1.0)],
            constant: 0.0,
        }
    }
}

impl Mul<f64> for VarId {
    type Output = LinearExpr;
    fn mul(self, rhs: f64) -> LinearExpr {
        LinearExpr {
            terms: vec![(self, rhs)],
            constant: 0.0,
        }
    }
}

impl Add for LinearExpr {
    type Output = LinearExpr;
    fn add(mut self, rhs: LinearExpr) -> LinearExpr {
        self.terms.extend(rhs.terms);
        self.constant += rhs.constant;
        self
    }
}

impl Add<VarId> for LinearExpr {
    type Output = LinearExpr;
    fn add(mut self, rhs: VarId) -> LinearExpr {
        self.terms.push((rhs, 1.0));
        self
    }
}

impl Add<f64> for LinearExpr {
    type Output = LinearExpr;
    fn add(mut self, rhs: f64) -> LinearExpr {
        self.constant += rhs;
        self
    }
}

impl Sub for LinearExpr {
    type Output = LinearExpr;
    fn sub(mut self, rhs: LinearExpr) -> LinearExpr {
        for (var, c) in rhs.terms {
            self.terms.push((var, -c));
        }
        self.constant -= rhs.constant;
        self
    }
}

impl Sub<VarId> for LinearExpr {
    type Output = LinearExpr;
    fn sub(mut self, rhs: VarId) -> LinearExpr {
        self.terms.push((rhs, -1.0));
        self
    }
}

impl Sub<f64> for LinearExpr {
    type Output = LinearExpr;
    fn sub(mut self, rhs: f64) -> LinearExpr {
        self.constant -= rhs;
        self
    }
}

impl Mul<f64> for LinearExpr {
    type Output = LinearExpr;
    fn mul(mut self, rhs: f64) -> LinearExpr {
        for term in &mut self.terms {
            term.1 *= rhs;
        }
        self.constant *= rhs;
        self
    }
}

impl Div<f64> for LinearExpr {
    type Output = LinearExpr;
    fn div(self, rhs: f64) -> LinearExpr {
        self * (1.0 / rhs)
    }
}

impl Neg for LinearExpr {
    type Output = LinearExpr;
    fn neg(self) -> LinearExpr {
        self * -1.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cmp {
    Eq,
    Leq,
    Geq,
}

#[derive(Debug, Clone)]
pub struct LpConstraint {
    pub expr: LinearExpr,
    pub cmp: Cmp,
    pub rhs: f64,
}

/// Plain-data LP: variable bounds, linear constraints and a minimized
/// linear objective. Holds no solver state.
#[derive(Debug, Clone, Default)]
pub struct LpModel {
    bounds: Vec<(f64, f64)>,
    constraints: Vec<LpConstraint>,
    objective: LinearExpr,
}

impl LpModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a continuous variable with inclusive bounds. `f64::INFINITY`
    /// leaves the upper bound open.
    pub fn add_var(&mut self, min: f64, max: f64) -> VarId {
        let id = VarId(self.bounds.len());
        self.bounds.push((min, max));
        id
    }

    pub fn constrain(&mut self, expr: impl Into<LinearExpr>, cmp: Cmp, rhs: f64) {
        self.constraints.push(LpConstraint {
            expr: expr.into(),
            cmp,
            rhs,
        });
    }

    /// Sets the objective to be minimized.
    pub fn minimize(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn num_vars(&self) -> usize {
        self.bounds.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }
}

/// Solved variable values, indexed by [`VarId`].
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    values: Vec<f64>,
}

impl LpSolution {
    pub fn value(&self, var: VarId) -> f64 {
        self.values[var.0]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SolveFailure {
    Infeasible,
    Unbounded,
    Other(String),
}

/// Backend seam. Implementations must be shareable across threads so the
/// solve can run under a watchdog timeout.
pub trait LpBackend: Send + Sync {
    fn solve(&self, model: &LpModel) -> Result<LpSolution, SolveFailure>;
}

/// `good_lp` adapter over the pure-Rust microlp simplex solver.
#[derive(Debug, Clone, Copy, Default)]
pub struct GoodLpBackend;

impl LpBackend for GoodLpBackend {
    fn solve(&self, model: &LpModel) -> Result<LpSolution, SolveFailure> {
        let mut vars = good_lp::variables!();
        let handles: Vec<good_lp::Variable> = model
            .bounds
            .iter()
            .map(|&(min, max)| {
                let mut def = variable().min(min);
                if max.is_finite() {
                    def = def.max(max);
                }
                vars.add(def)
            })
            .collect();

        let to_expr = |expr: &LinearExpr| -> Expression {
            let mut out = Expression::from(expr.constant);
            for &(VarId(index), coefficient) in &expr.terms {
                out += handles[index] * coefficient;
            }
            out
        };

        let mut problem = vars.minimise(to_expr(&model.objective)).using(default_solver);
        for constraint in &model.constraints {
            let lhs = to_expr(&constraint.expr);
            let bound = match constraint.cmp {
                Cmp::Eq => lhs.eq(constraint.rhs),
                Cmp::Leq => lhs.leq(constraint.rhs),
                Cmp::Geq => lhs.geq(constraint.rhs),
            };
            problem = problem.with(good_lp::Constraint::from(bound));
        }

        match problem.solve() {
            Ok(solved) => Ok(LpSolution {
                values: handles.iter().map(|&handle| solved.value(handle)).collect(),
            }),
            Err(ResolutionError::Infeasible) => Err(SolveFailure::Infeasible),
            Err(ResolutionError::Unbounded) => Err(SolveFailure::Unbounded),
            Err(other) => Err(SolveFailure::Other(other.to_string())),
        }
    }
}
