//! Stage 1: min-max density balancing.
//!
//! Chooses a target head count per enclosure so that the worst deviation
//! between achieved and optimal density is as small as possible, subject to
//! the total population and each enclosure's `rho_max` capacity. The
//! continuous optimum is then rounded and reconciled so the integer targets
//! still add up to the total exactly.

use good_lp::{
    constraint, default_solver, variable, variables, Expression, ResolutionError, Solution,
    SolverModel, Variable,
};
use serde::Serialize;
use tracing::{debug, info};

use crate::enclosure::Prepared;
use crate::error::{AllocationError, Result};

/// Absolute slack accepted on solver output.
const TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Target {
    pub id: String,
    /// Solver value before rounding.
    pub continuous: f64,
    pub target: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Balance {
    /// One entry per enclosure, in request order.
    pub targets: Vec<Target>,
    /// Optimal worst-case density deviation (Z).
    pub max_deviation: f64,
    /// Units moved by the rounding reconciliation (positive: added).
    pub residual: i64,
}

impl Balance {
    pub fn continuous_total(&self) -> f64 {
        self.targets.iter().map(|t| t.continuous).sum()
    }

    pub fn total(&self) -> u64 {
        self.targets.iter().map(|t| t.target).sum()
    }
}

pub fn balance(prepared: &Prepared) -> Result<Balance> {
    let total = prepared.total_population;
    let active: Vec<usize> = prepared
        .enclosures
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_active())
        .map(|(i, _)| i)
        .collect();

    let capacity: f64 = active
        .iter()
        .map(|&i| prepared.enclosures[i].capacity(prepared.rho_max))
        .sum();
    if capacity + TOLERANCE < total as f64 {
        return Err(AllocationError::InfeasibleAllocation(format!(
            "total population {total} exceeds capacity {capacity:.1} at rho_max {}",
            prepared.rho_max
        )));
    }
    let whole_capacity: Vec<u64> = prepared
        .enclosures
        .iter()
        .map(|e| {
            if e.is_active() {
                (e.capacity(prepared.rho_max) + TOLERANCE).floor() as u64
            } else {
                0
            }
        })
        .collect();
    let whole_total: u64 = whole_capacity.iter().sum();
    if whole_total < total {
        return Err(AllocationError::InfeasibleAllocation(format!(
            "total population {total} exceeds whole-animal capacity {whole_total}"
        )));
    }

    let (continuous, max_deviation) = if active.is_empty() {
        // Only reachable with a zero total after the capacity check.
        (vec![0.0; prepared.enclosures.len()], 0.0)
    } else {
        solve(prepared, &active)?
    };

    let placed: f64 = continuous.iter().sum();
    if (placed - total as f64).abs() > TOLERANCE * (total as f64).max(1.0) {
        return Err(AllocationError::Solver(format!(
            "balanced populations sum to {placed}, expected {total}"
        )));
    }

    let mut targets: Vec<u64> = continuous
        .iter()
        .zip(&whole_capacity)
        .map(|(&x, &cap)| (x.round().max(0.0) as u64).min(cap))
        .collect();
    let residual = reconcile(&mut targets, &continuous, &whole_capacity, total)?;
    if residual != 0 {
        debug!(residual, "reconciled rounded targets");
    }
    info!(max_deviation, total, "balanced enclosure densities");

    let targets = prepared
        .enclosures
        .iter()
        .zip(continuous)
        .zip(targets)
        .map(|((e, continuous), target)| Target {
            id: e.id.clone(),
            continuous,
            target,
        })
        .collect();

    Ok(Balance {
        targets,
        max_deviation,
        residual,
    })
}

/// Builds and solves the LP for the active enclosures. Returns the
/// continuous population per enclosure (zero for inactive ones) and Z.
fn solve(prepared: &Prepared, active: &[usize]) -> Result<(Vec<f64>, f64)> {
    let mut vars = variables!();
    let z = vars.add(variable().min(0.0));
    let columns: Vec<(usize, Variable, Variable)> = active
        .iter()
        .map(|&i| {
            let cap = prepared.enclosures[i].capacity(prepared.rho_max);
            let x = vars.add(variable().min(0.0).max(cap));
            let d = vars.add(variable().min(0.0));
            (i, x, d)
        })
        .collect();

    let mut model = vars.minimise(z).using(default_solver);
    for &(i, x, d) in &columns {
        let enclosure = &prepared.enclosures[i];
        let scale = 1.0 / enclosure.effective_area;
        let rho = enclosure.optimal_density;
        model = model
            .with(constraint!(scale * x - d <= rho))
            .with(constraint!(scale * x + d >= rho))
            .with(constraint!(d <= z));
    }
    let placed: Expression = columns.iter().map(|&(_, x, _)| x).sum();
    let total = prepared.total_population as f64;
    model = model.with(constraint!(placed == total));

    let solution = model.solve().map_err(|err| match err {
        ResolutionError::Infeasible => AllocationError::InfeasibleAllocation(format!(
            "no assignment of {} animals satisfies the density bounds",
            prepared.total_population
        )),
        other => AllocationError::Solver(other.to_string()),
    })?;

    let mut populations = vec![0.0; prepared.enclosures.len()];
    for &(i, x, _) in &columns {
        populations[i] = solution.value(x).max(0.0);
    }
    Ok((populations, solution.value(z).max(0.0)))
}

/// Restores `sum(targets) == total` after rounding. Missing animals go to
/// the enclosure with the most unused capacity; surplus animals come from
/// the enclosure that was rounded up the most. Ties resolve to the earliest
/// enclosure.
pub(crate) fn reconcile(
    targets: &mut [u64],
    continuous: &[f64],
    capacity: &[u64],
    total: u64,
) -> Result<i64> {
    let placed: u64 = targets.iter().sum();
    let residual = total as i64 - placed as i64;

    for _ in 0..residual.max(0) {
        let slot = (0..targets.len())
            .filter(|&i| targets[i] < capacity[i])
            .max_by(|&a, &b| {
                let room_a = capacity[a] - targets[a];
                let room_b = capacity[b] - targets[b];
                room_a.cmp(&room_b).then(b.cmp(&a))
            })
            .ok_or_else(|| {
                AllocationError::Inconsistent("no capacity left while reconciling".into())
            })?;
        targets[slot] += 1;
    }

    for _ in 0..(-residual).max(0) {
        let slot = (0..targets.len())
            .filter(|&i| targets[i] > 0)
            .max_by(|&a, &b| {
                let up_a = targets[a] as f64 - continuous[a];
                let up_b = targets[b] as f64 - continuous[b];
                up_a.total_cmp(&up_b).then(b.cmp(&a))
            })
            .ok_or_else(|| {
                AllocationError::Inconsistent("no population left while reconciling".into())
            })?;
        targets[slot] -= 1;
    }

    Ok(residual)
}
