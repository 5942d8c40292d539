//! Assembly of the per-enclosure summary and the transfer outcome.

use serde::{Deserialize, Serialize};

use crate::balance::Balance;
use crate::enclosure::Enclosure;
use crate::transport::{Movement, TransferPlan};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnclosureSummary {
    pub id: String,
    pub total_area: f64,
    pub effective_area: f64,
    pub usable_area_pct: f64,
    pub optimal_density: f64,
    pub current_population: u64,
    pub continuous_target: f64,
    pub target_population: u64,
    pub current_density: Option<f64>,
    pub target_density: Option<f64>,
    pub recommended_area: Option<f64>,
    pub recommended_area_pct: Option<f64>,
    pub cold_penalty: f64,
    pub heat_penalty: f64,
}

/// Whether animals had to be moved to reach the targets.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Plan {
    /// Nothing was stocked yet; targets are a placement, not a transfer.
    FreshAllocation,
    Redistribution(TransferPlan),
}

impl Plan {
    pub fn movements(&self) -> &[Movement] {
        match self {
            Plan::FreshAllocation => &[],
            Plan::Redistribution(plan) => &plan.movements,
        }
    }

    pub fn total_cost(&self) -> f64 {
        match self {
            Plan::FreshAllocation => 0.0,
            Plan::Redistribution(plan) => plan.total_cost,
        }
    }

    pub fn is_fresh_allocation(&self) -> bool {
        matches!(self, Plan::FreshAllocation)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub enclosures: Vec<EnclosureSummary>,
    pub max_deviation: f64,
    pub plan: Plan,
}

impl AllocationResult {
    pub fn movements(&self) -> &[Movement] {
        self.plan.movements()
    }

    pub fn total_cost(&self) -> f64 {
        self.plan.total_cost()
    }

    pub fn enclosure(&self, id: &str) -> Option<&EnclosureSummary> {
        self.enclosures.iter().find(|e| e.id == id)
    }
}

pub fn assemble(enclosures: &[Enclosure], balance: &Balance, plan: Plan) -> AllocationResult {
    let enclosures = enclosures
        .iter()
        .zip(&balance.targets)
        .map(|(e, t)| summarize(e, t.continuous, t.target))
        .collect();

    AllocationResult {
        enclosures,
        max_deviation: balance.max_deviation,
        plan,
    }
}

fn summarize(e: &Enclosure, continuous_target: f64, target: u64) -> EnclosureSummary {
    let density = |population: u64| {
        (e.effective_area > 0.0).then(|| population as f64 / e.effective_area)
    };
    let recommended_area = (e.optimal_density > 0.0).then(|| target as f64 / e.optimal_density);

    EnclosureSummary {
        id: e.id.clone(),
        total_area: e.total_area,
        effective_area: e.effective_area,
        usable_area_pct: 100.0 * e.effective_area / e.total_area,
        optimal_density: e.optimal_density,
        current_population: e.current_population,
        continuous_target,
        target_population: target,
        current_density: density(e.current_population),
        target_density: density(target),
        recommended_area,
        recommended_area_pct: recommended_area.map(|area| 100.0 * area / e.total_area),
        cold_penalty: e.cold_penalty,
        heat_penalty: e.heat_penalty,
    }
}
