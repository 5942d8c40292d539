use tracing::info;

use crate::balance::balance;
use crate::config::FacilityConfig;
use crate::enclosure::prepare;
use crate::error::{FacilityError, Result};
use crate::facility::Facility;
use crate::report::{assemble, AllocationResult, Plan};
use crate::request::AllocationRequest;
use crate::transport::{plan_transfers, Stock};

/// Runs the allocation pipeline against one facility. Holds no per-request
/// state, so a single engine can serve any number of requests.
#[derive(Clone, Debug)]
pub struct AllocationEngine {
    facility: Facility,
}

impl AllocationEngine {
    pub fn new(facility: Facility) -> Self {
        Self { facility }
    }

    pub fn from_config(config: &FacilityConfig) -> std::result::Result<Self, FacilityError> {
        Ok(Self::new(Facility::from_config(config)?))
    }

    pub fn facility(&self) -> &Facility {
        &self.facility
    }

    pub fn allocate(&self, request: &AllocationRequest) -> Result<AllocationResult> {
        let prepared = prepare(request, &self.facility)?;
        info!(
            enclosures = prepared.enclosures.len(),
            total_population = prepared.total_population,
            fresh_flock = prepared.fresh_flock,
            "allocating"
        );

        let balance = balance(&prepared)?;

        let plan = if prepared.fresh_flock {
            Plan::FreshAllocation
        } else {
            let stocks: Vec<Stock> = prepared
                .enclosures
                .iter()
                .zip(&balance.targets)
                .map(|(e, t)| Stock {
                    id: e.id.clone(),
                    current: e.current_population,
                    target: t.target,
                })
                .collect();
            Plan::Redistribution(plan_transfers(&stocks, &self.facility)?)
        };

        Ok(assemble(&prepared.enclosures, &balance, plan))
    }
}
