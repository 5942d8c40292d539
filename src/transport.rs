//! Stage 2: minimum-cost transfers from over- to under-stocked enclosures.
//!
//! The transportation constraint matrix is totally unimodular, so the simplex
//! vertex returned for integral supplies and demands is integral. Flows are
//! still checked before being turned into whole-animal movements.

use good_lp::{
    constraint, default_solver, variable, variables, Expression, ResolutionError, Solution,
    SolverModel, Variable,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AllocationError, Result};
use crate::facility::Facility;

const INTEGRALITY_TOLERANCE: f64 = 1e-6;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Movement {
    pub from: String,
    pub to: String,
    pub quantity: u64,
    pub unit_cost: f64,
    pub total_cost: f64,
}

/// Current versus target head count for one enclosure.
#[derive(Clone, Debug, PartialEq)]
pub struct Stock {
    pub id: String,
    pub current: u64,
    pub target: u64,
}

impl Stock {
    pub fn supply(&self) -> u64 {
        self.current.saturating_sub(self.target)
    }

    pub fn demand(&self) -> u64 {
        self.target.saturating_sub(self.current)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TransferPlan {
    pub movements: Vec<Movement>,
    pub total_cost: f64,
}

impl TransferPlan {
    pub fn outgoing(&self, id: &str) -> u64 {
        self.movements
            .iter()
            .filter(|m| m.from == id)
            .map(|m| m.quantity)
            .sum()
    }

    pub fn incoming(&self, id: &str) -> u64 {
        self.movements
            .iter()
            .filter(|m| m.to == id)
            .map(|m| m.quantity)
            .sum()
    }
}

struct Lane {
    from: usize,
    to: usize,
    unit_cost: f64,
    flow: Variable,
}

pub fn plan_transfers(stocks: &[Stock], facility: &Facility) -> Result<TransferPlan> {
    let supply: u64 = stocks.iter().map(Stock::supply).sum();
    let demand: u64 = stocks.iter().map(Stock::demand).sum();
    if supply != demand {
        return Err(AllocationError::Inconsistent(format!(
            "supply {supply} does not match demand {demand}"
        )));
    }
    if supply == 0 {
        info!("enclosures already on target, no transfers needed");
        return Ok(TransferPlan::default());
    }

    let mut vars = variables!();
    let mut lanes = Vec::new();
    for (i, source) in stocks.iter().enumerate() {
        if source.supply() == 0 {
            continue;
        }
        for (j, sink) in stocks.iter().enumerate() {
            // A surplus enclosure never has demand, so i != j here.
            if sink.demand() == 0 {
                continue;
            }
            let unit_cost = facility
                .movement_cost(&source.id, &sink.id)
                .ok_or_else(|| AllocationError::UnknownEnclosure(sink.id.clone()))?;
            lanes.push(Lane {
                from: i,
                to: j,
                unit_cost,
                flow: vars.add(variable().min(0.0)),
            });
        }
    }

    let objective: Expression = lanes.iter().map(|l| l.unit_cost * l.flow).sum();
    let mut model = vars.minimise(objective).using(default_solver);
    for (i, stock) in stocks.iter().enumerate() {
        let (surplus, deficit) = (stock.supply() as f64, stock.demand() as f64);
        if surplus > 0.0 {
            let shipped: Expression = lanes.iter().filter(|l| l.from == i).map(|l| l.flow).sum();
            model = model.with(constraint!(shipped == surplus));
        }
        if deficit > 0.0 {
            let received: Expression = lanes.iter().filter(|l| l.to == i).map(|l| l.flow).sum();
            model = model.with(constraint!(received == deficit));
        }
    }

    let solution = model.solve().map_err(|err| match err {
        ResolutionError::Infeasible => AllocationError::InfeasibleRedistribution(format!(
            "cannot route {supply} animals between enclosures"
        )),
        other => AllocationError::Solver(other.to_string()),
    })?;

    let mut movements = Vec::new();
    for lane in &lanes {
        let value = solution.value(lane.flow);
        let quantity = value.round();
        if (value - quantity).abs() > INTEGRALITY_TOLERANCE {
            return Err(AllocationError::Inconsistent(format!(
                "non-integral flow {value} from {} to {}",
                stocks[lane.from].id, stocks[lane.to].id
            )));
        }
        if quantity < 1.0 {
            continue;
        }
        let quantity = quantity as u64;
        movements.push(Movement {
            from: stocks[lane.from].id.clone(),
            to: stocks[lane.to].id.clone(),
            quantity,
            unit_cost: lane.unit_cost,
            total_cost: quantity as f64 * lane.unit_cost,
        });
    }

    let plan = TransferPlan {
        total_cost: movements.iter().map(|m| m.total_cost).sum(),
        movements,
    };
    for stock in stocks {
        if plan.outgoing(&stock.id) != stock.supply() || plan.incoming(&stock.id) != stock.demand()
        {
            return Err(AllocationError::Inconsistent(format!(
                "transfers for '{}' do not balance its surplus or deficit",
                stock.id
            )));
        }
    }

    info!(
        moved = supply,
        movements = plan.movements.len(),
        total_cost = plan.total_cost,
        "planned transfers"
    );
    Ok(plan)
}
