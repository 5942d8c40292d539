use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{AllocationError, Result};

/// One enclosure as reported by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnclosureInput {
    pub id: String,
    /// Current temperature in °C.
    pub temperature: f64,
    /// Fraction of the floor area currently enabled, in [0, 1].
    pub usable_fraction: f64,
    #[serde(default)]
    pub current_population: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    /// Flock age in days.
    pub age: u32,
    pub cold_sensitivity: f64,
    pub heat_sensitivity: f64,
    pub rho_min: f64,
    pub rho_max: f64,
    /// Only honoured for a fresh flock; existing populations are authoritative otherwise.
    #[serde(default)]
    pub total_population: Option<u64>,
    pub enclosures: Vec<EnclosureInput>,
}

impl AllocationRequest {
    pub fn validate(&self) -> Result<()> {
        if self.enclosures.is_empty() {
            return Err(invalid("request must list at least one enclosure"));
        }

        let mut seen = HashSet::new();
        for enclosure in &self.enclosures {
            if !seen.insert(enclosure.id.as_str()) {
                return Err(invalid(format!(
                    "enclosure '{}' listed more than once",
                    enclosure.id
                )));
            }
            if !(0.0..=1.0).contains(&enclosure.usable_fraction) {
                return Err(invalid(format!(
                    "usable fraction of '{}' must lie in [0, 1], got {}",
                    enclosure.id, enclosure.usable_fraction
                )));
            }
            if !enclosure.temperature.is_finite() {
                return Err(invalid(format!(
                    "temperature of '{}' must be finite",
                    enclosure.id
                )));
            }
        }

        for (name, value) in [
            ("cold_sensitivity", self.cold_sensitivity),
            ("heat_sensitivity", self.heat_sensitivity),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(invalid(format!(
                    "{name} must be finite and non-negative, got {value}"
                )));
            }
        }

        for (name, value) in [("rho_min", self.rho_min), ("rho_max", self.rho_max)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(invalid(format!("{name} must be positive, got {value}")));
            }
        }
        if self.rho_min > self.rho_max {
            return Err(invalid(format!(
                "rho_min ({}) must not exceed rho_max ({})",
                self.rho_min, self.rho_max
            )));
        }

        Ok(())
    }

    pub fn is_fresh_flock(&self) -> bool {
        self.enclosures.iter().all(|e| e.current_population == 0)
    }

    /// The population to distribute: the override for a fresh flock, the
    /// current head count otherwise.
    pub fn total_population(&self) -> Result<u64> {
        if self.is_fresh_flock() {
            self.total_population.ok_or_else(|| {
                invalid("total_population is required when no enclosure is currently stocked")
            })
        } else {
            Ok(self.enclosures.iter().map(|e| e.current_population).sum())
        }
    }
}

fn invalid(msg: impl Into<String>) -> AllocationError {
    AllocationError::Validation(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(populations: &[u64], total: Option<u64>) -> AllocationRequest {
        AllocationRequest {
            age: 15,
            cold_sensitivity: 0.6,
            heat_sensitivity: 1.5,
            rho_min: 7.0,
            rho_max: 60.0,
            total_population: total,
            enclosures: populations
                .iter()
                .enumerate()
                .map(|(i, &current_population)| EnclosureInput {
                    id: format!("G{}", i + 1),
                    temperature: 26.0,
                    usable_fraction: 1.0,
                    current_population,
                })
                .collect(),
        }
    }

    #[test]
    fn override_only_applies_to_fresh_flock() {
        let fresh = request(&[0, 0], Some(5_000));
        assert!(fresh.is_fresh_flock());
        assert_eq!(fresh.total_population().unwrap(), 5_000);

        let stocked = request(&[100, 250], Some(5_000));
        assert!(!stocked.is_fresh_flock());
        assert_eq!(stocked.total_population().unwrap(), 350);
    }

    #[test]
    fn fresh_flock_needs_a_total() {
        let err = request(&[0, 0], None).total_population().unwrap_err();
        assert_eq!(err.kind(), "validation");
    }

    #[test]
    fn rejects_bad_density_bounds() {
        let mut req = request(&[10], None);
        req.rho_min = 70.0;
        assert!(req.validate().is_err());

        req.rho_min = 0.0;
        assert!(req.validate().is_err());

        req.rho_min = 7.0;
        assert!(req.validate().is_ok());
    }

    #[test]
    fn rejects_structural_problems() {
        let empty = request(&[], Some(1));
        assert!(empty.validate().is_err());

        let mut duplicate = request(&[1, 2], None);
        duplicate.enclosures[1].id = "G1".into();
        assert!(duplicate.validate().is_err());

        let mut fraction = request(&[1], None);
        fraction.enclosures[0].usable_fraction = 1.2;
        assert!(fraction.validate().is_err());

        let mut coeff = request(&[1], None);
        coeff.heat_sensitivity = -1.0;
        assert!(coeff.validate().is_err());
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = r#"{
            "age": 10,
            "cold_sensitivity": 0.6,
            "heat_sensitivity": 1.5,
            "rho_min": 7,
            "rho_max": 60,
            "enclosures": [{"id": "G1", "temperature": 27, "usable_fraction": 0.5}]
        }"#;
        let req: AllocationRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.total_population, None);
        assert_eq!(req.enclosures[0].current_population, 0);
    }
}
