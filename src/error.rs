//! Failure taxonomy for the allocation engine

use thiserror::Error;

pub type Result<T> = std::result::Result<T, AllocationError>;

/// Every way a single allocation request can fail.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AllocationError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("enclosure '{0}' is not part of the facility configuration")]
    UnknownEnclosure(String),

    #[error("no feasible allocation: {0}")]
    InfeasibleAllocation(String),

    #[error("no feasible redistribution: {0}")]
    InfeasibleRedistribution(String),

    #[error("solver failure: {0}")]
    Solver(String),

    /// An internal invariant between stages did not hold.
    #[error("internal consistency error: {0}")]
    Inconsistent(String),
}

impl AllocationError {
    pub fn kind(&self) -> &'static str {
        match self {
            AllocationError::Validation(_) => "validation",
            AllocationError::UnknownEnclosure(_) => "unknown_enclosure",
            AllocationError::InfeasibleAllocation(_) => "infeasible_allocation",
            AllocationError::InfeasibleRedistribution(_) => "infeasible_redistribution",
            AllocationError::Solver(_) => "solver",
            AllocationError::Inconsistent(_) => "inconsistent",
        }
    }

    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            AllocationError::InfeasibleAllocation(_) | AllocationError::InfeasibleRedistribution(_)
        )
    }
}

/// Problems in the static facility tables.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FacilityError {
    #[error("facility must define at least one enclosure")]
    Empty,

    #[error("enclosure id '{0}' defined more than once")]
    DuplicateEnclosure(String),

    #[error("enclosure '{id}' has non-positive area {area}")]
    InvalidArea { id: String, area: f64 },

    #[error("movement cost references unknown enclosure '{0}'")]
    UnknownCostEndpoint(String),

    #[error("movement cost {from} -> {to} must be finite and non-negative, got {cost}")]
    InvalidCost { from: String, to: String, cost: f64 },

    #[error("movement cost {from} -> {to} conflicts with its reverse entry ({cost} vs {reverse})")]
    AsymmetricCost {
        from: String,
        to: String,
        cost: f64,
        reverse: f64,
    },

    #[error("no movement cost defined between '{0}' and '{1}'")]
    MissingCost(String, String),
}
