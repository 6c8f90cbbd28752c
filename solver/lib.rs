/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

use std::{
    fmt,
    time::{Duration, Instant},
};

use tracing::trace;

/// Opaque handle to an integer decision variable.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct VariableId(usize);

/// Opaque handle to a linear constraint.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub struct ConstraintId(usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    /// The incumbent solution is proven optimal.
    Optimal,
    /// A feasible incumbent was found before the time budget ran out.
    Feasible,
    /// The feasible region is empty.
    Infeasible,
    /// The objective is unbounded below. Cannot occur while every variable
    /// carries finite bounds.
    Unbounded,
    /// The time budget ran out before any feasible solution was found.
    NotSolved,
}

impl SolveStatus {
    pub fn has_solution(&self) -> bool {
        matches!(self, Self::Optimal | Self::Feasible)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Optimal => write!(f, "optimal"),
            Self::Feasible => write!(f, "feasible"),
            Self::Infeasible => write!(f, "infeasible"),
            Self::Unbounded => write!(f, "unbounded"),
            Self::NotSolved => write!(f, "not-solved"),
        }
    }
}

/// The solver-facing interface the planner depends on. Any MILP backend can
/// stand behind it; variables and constraints are referenced exclusively
/// through the opaque handles it returns. Constraints are closed intervals
/// `[lo, hi]` over weighted sums of integer variables; the objective is a
/// weighted sum that is minimised.
pub trait MilpSolver {
    fn make_int_var(&mut self, lo: i64, hi: i64, name: &str) -> VariableId;

    fn make_constraint(&mut self, lo: f64, hi: f64, name: &str) -> ConstraintId;

    fn set_constraint_coefficient(&mut self, constraint: ConstraintId, variable: VariableId, coefficient: f64);

    fn set_objective_coefficient(&mut self, variable: VariableId, coefficient: f64);

    fn solve(&mut self, time_budget: Duration) -> SolveStatus;

    fn solution_value(&self, variable: VariableId) -> f64;

    fn objective_value(&self) -> f64;
}

#[derive(Debug)]
struct IntVariable {
    lo: i64,
    hi: i64,
    name: String,
    objective: f64,
}

struct LinearConstraint {
    lo: f64,
    hi: f64,
    name: String,
    terms: Vec<(usize, f64)>,
}

/// Exact depth-first branch-and-bound over bounded integer variables.
///
/// Deterministic by construction: variables are branched in creation order,
/// values are tried from the upper bound downwards, and the incumbent is
/// only replaced on strict objective improvement. Ties therefore resolve to
/// the first optimum encountered, which prefers setting early-created
/// binary variables to 1.
#[derive(Default)]
pub struct BranchAndBound {
    variables: Vec<IntVariable>,
    constraints: Vec<LinearConstraint>,
    incumbent: Option<Vec<i64>>,
    incumbent_objective: f64,
}

impl BranchAndBound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }
}

impl MilpSolver for BranchAndBound {
    fn make_int_var(&mut self, lo: i64, hi: i64, name: &str) -> VariableId {
        debug_assert!(lo <= hi, "variable '{name}' has an empty domain [{lo}, {hi}]");
        trace!(name, lo, hi, "created integer variable");
        self.variables.push(IntVariable { lo, hi, name: name.to_owned(), objective: 0.0 });
        VariableId(self.variables.len() - 1)
    }

    fn make_constraint(&mut self, lo: f64, hi: f64, name: &str) -> ConstraintId {
        trace!(name, lo, hi, "created constraint");
        self.constraints.push(LinearConstraint { lo, hi, name: name.to_owned(), terms: Vec::new() });
        ConstraintId(self.constraints.len() - 1)
    }

    fn set_constraint_coefficient(&mut self, constraint: ConstraintId, variable: VariableId, coefficient: f64) {
        let terms = &mut self.constraints[constraint.0].terms;
        match terms.iter_mut().find(|(existing, _)| *existing == variable.0) {
            Some((_, existing)) => *existing = coefficient,
            None => terms.push((variable.0, coefficient)),
        }
    }

    fn set_objective_coefficient(&mut self, variable: VariableId, coefficient: f64) {
        self.variables[variable.0].objective = coefficient;
    }

    fn solve(&mut self, time_budget: Duration) -> SolveStatus {
        self.incumbent = None;
        self.incumbent_objective = f64::INFINITY;

        // remaining_minimum[d]: least objective the variables from `d` onwards
        // can still contribute, for sound pruning under any coefficient sign
        let mut remaining_minimum = vec![0.0; self.variables.len() + 1];
        for (index, variable) in self.variables.iter().enumerate().rev() {
            let at_lo = variable.objective * variable.lo as f64;
            let at_hi = variable.objective * variable.hi as f64;
            remaining_minimum[index] = remaining_minimum[index + 1] + at_lo.min(at_hi);
        }

        let mut search = Search {
            variables: &self.variables,
            constraints: &self.constraints,
            assignment: vec![0; self.variables.len()],
            remaining_minimum,
            incumbent: None,
            incumbent_objective: f64::INFINITY,
            deadline: Instant::now().checked_add(time_budget),
            out_of_time: false,
        };
        if search.intervals_feasible(0) {
            search.branch(0, 0.0);
        }

        let out_of_time = search.out_of_time;
        self.incumbent = search.incumbent;
        self.incumbent_objective = search.incumbent_objective;

        match (&self.incumbent, out_of_time) {
            (Some(_), false) => SolveStatus::Optimal,
            (Some(_), true) => SolveStatus::Feasible,
            (None, false) => SolveStatus::Infeasible,
            (None, true) => SolveStatus::NotSolved,
        }
    }

    fn solution_value(&self, variable: VariableId) -> f64 {
        debug_assert!(self.incumbent.is_some(), "solution queried before a successful solve");
        self.incumbent.as_ref().map(|values| values[variable.0] as f64).unwrap_or(0.0)
    }

    fn objective_value(&self) -> f64 {
        debug_assert!(self.incumbent.is_some(), "objective queried before a successful solve");
        self.incumbent_objective
    }
}

impl fmt::Debug for BranchAndBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "BranchAndBound ({} variables, {} constraints)", self.variables.len(), self.constraints.len())?;
        for variable in &self.variables {
            writeln!(f, "  var {} in [{}, {}] objective {}", variable.name, variable.lo, variable.hi, variable.objective)?;
        }
        for constraint in &self.constraints {
            write!(f, "  con {}: {} <= ", constraint.name, constraint.lo)?;
            for (index, (variable, coefficient)) in constraint.terms.iter().enumerate() {
                if index > 0 {
                    write!(f, " + ")?;
                }
                write!(f, "{}*{}", coefficient, self.variables[*variable].name)?;
            }
            writeln!(f, " <= {}", constraint.hi)?;
        }
        Ok(())
    }
}

const FEASIBILITY_EPSILON: f64 = 1e-6;

struct Search<'a> {
    variables: &'a [IntVariable],
    constraints: &'a [LinearConstraint],
    assignment: Vec<i64>,
    remaining_minimum: Vec<f64>,
    incumbent: Option<Vec<i64>>,
    incumbent_objective: f64,
    deadline: Option<Instant>,
    out_of_time: bool,
}

impl Search<'_> {
    fn branch(&mut self, depth: usize, objective_so_far: f64) {
        if self.out_of_time {
            return;
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.out_of_time = true;
                return;
            }
        }

        if depth == self.variables.len() {
            if objective_so_far < self.incumbent_objective {
                self.incumbent = Some(self.assignment.clone());
                self.incumbent_objective = objective_so_far;
            }
            return;
        }

        let variable = &self.variables[depth];
        for value in (variable.lo..=variable.hi).rev() {
            self.assignment[depth] = value;
            let objective = objective_so_far + variable.objective * value as f64;
            if objective + self.remaining_minimum[depth + 1] >= self.incumbent_objective - FEASIBILITY_EPSILON {
                continue;
            }
            if !self.intervals_feasible(depth + 1) {
                continue;
            }
            self.branch(depth + 1, objective);
            if self.out_of_time {
                return;
            }
        }
    }

    /// Interval-arithmetic feasibility of every constraint given the first
    /// `assigned` variables fixed and the rest ranging over their bounds.
    fn intervals_feasible(&self, assigned: usize) -> bool {
        for constraint in self.constraints {
            let mut min = 0.0;
            let mut max = 0.0;
            for &(variable, coefficient) in &constraint.terms {
                if variable < assigned {
                    let value = self.assignment[variable] as f64 * coefficient;
                    min += value;
                    max += value;
                } else {
                    let at_lo = self.variables[variable].lo as f64 * coefficient;
                    let at_hi = self.variables[variable].hi as f64 * coefficient;
                    min += at_lo.min(at_hi);
                    max += at_lo.max(at_hi);
                }
            }
            if min > constraint.hi + FEASIBILITY_EPSILON || max < constraint.lo - FEASIBILITY_EPSILON {
                return false;
            }
        }
        true
    }
}
