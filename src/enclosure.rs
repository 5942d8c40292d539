//! Per-enclosure derived metrics.

use serde::Serialize;
use tracing::debug;

use crate::error::{AllocationError, Result};
use crate::facility::Facility;
use crate::profile::{profile_for_age, Profile};
use crate::request::{AllocationRequest, EnclosureInput};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Enclosure {
    pub id: String,
    pub total_area: f64,
    pub usable_fraction: f64,
    pub temperature: f64,
    pub current_population: u64,
    pub effective_area: f64,
    pub cold_penalty: f64,
    pub heat_penalty: f64,
    pub optimal_density: f64,
}

impl Enclosure {
    /// Enclosures without usable floor take no part in balancing.
    pub fn is_active(&self) -> bool {
        self.effective_area > 0.0
    }

    pub fn capacity(&self, rho_max: f64) -> f64 {
        self.effective_area * rho_max
    }
}

/// Everything the solver stages need from one request.
#[derive(Clone, Debug)]
pub struct Prepared {
    pub profile: Profile,
    pub enclosures: Vec<Enclosure>,
    pub fresh_flock: bool,
    pub total_population: u64,
    pub rho_min: f64,
    pub rho_max: f64,
}

pub fn prepare(request: &AllocationRequest, facility: &Facility) -> Result<Prepared> {
    request.validate()?;
    let profile = profile_for_age(request.age);

    let enclosures = request
        .enclosures
        .iter()
        .map(|input| {
            let total_area = facility
                .area(&input.id)
                .ok_or_else(|| AllocationError::UnknownEnclosure(input.id.clone()))?;
            Ok(derive(input, total_area, &profile, request))
        })
        .collect::<Result<Vec<_>>>()?;

    let fresh_flock = request.is_fresh_flock();
    let total_population = request.total_population()?;
    debug!(
        age = request.age,
        ideal_temperature = profile.ideal_temperature,
        baseline_density = profile.baseline_density,
        fresh_flock,
        total_population,
        "prepared enclosures"
    );

    Ok(Prepared {
        profile,
        enclosures,
        fresh_flock,
        total_population,
        rho_min: request.rho_min,
        rho_max: request.rho_max,
    })
}

fn derive(
    input: &EnclosureInput,
    total_area: f64,
    profile: &Profile,
    request: &AllocationRequest,
) -> Enclosure {
    let effective_area = (input.usable_fraction * total_area).max(0.0);
    let cold_penalty =
        request.cold_sensitivity * (profile.ideal_temperature - input.temperature).max(0.0);
    let heat_penalty =
        request.heat_sensitivity * (input.temperature - profile.ideal_temperature).max(0.0);
    let optimal_density = (profile.baseline_density - heat_penalty + cold_penalty)
        .clamp(request.rho_min, request.rho_max);

    Enclosure {
        id: input.id.clone(),
        total_area,
        usable_fraction: input.usable_fraction,
        temperature: input.temperature,
        current_population: input.current_population,
        effective_area,
        cold_penalty,
        heat_penalty,
        optimal_density,
    }
}
