//! Validated facility tables handed to the engine at construction.

use std::collections::BTreeMap;

use crate::config::FacilityConfig;
use crate::error::FacilityError;

#[derive(Clone, Debug)]
pub struct Facility {
    areas: BTreeMap<String, f64>,
    /// Keyed by the lexicographically ordered id pair.
    costs: BTreeMap<(String, String), f64>,
}

fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

impl Facility {
    pub fn from_config(config: &FacilityConfig) -> Result<Self, FacilityError> {
        if config.enclosures.is_empty() {
            return Err(FacilityError::Empty);
        }

        let mut areas = BTreeMap::new();
        for enclosure in &config.enclosures {
            if !(enclosure.area.is_finite() && enclosure.area > 0.0) {
                return Err(FacilityError::InvalidArea {
                    id: enclosure.id.clone(),
                    area: enclosure.area,
                });
            }
            if areas.insert(enclosure.id.clone(), enclosure.area).is_some() {
                return Err(FacilityError::DuplicateEnclosure(enclosure.id.clone()));
            }
        }

        let mut costs: BTreeMap<(String, String), f64> = BTreeMap::new();
        for entry in &config.movement_costs {
            for endpoint in [&entry.from, &entry.to] {
                if !areas.contains_key(endpoint) {
                    return Err(FacilityError::UnknownCostEndpoint(endpoint.clone()));
                }
            }
            if !(entry.cost.is_finite() && entry.cost >= 0.0) {
                return Err(FacilityError::InvalidCost {
                    from: entry.from.clone(),
                    to: entry.to.clone(),
                    cost: entry.cost,
                });
            }
            if entry.from == entry.to {
                if entry.cost != 0.0 {
                    return Err(FacilityError::InvalidCost {
                        from: entry.from.clone(),
                        to: entry.to.clone(),
                        cost: entry.cost,
                    });
                }
                continue;
            }
            let key = pair_key(&entry.from, &entry.to);
            if let Some(&reverse) = costs.get(&key) {
                if reverse != entry.cost {
                    return Err(FacilityError::AsymmetricCost {
                        from: entry.from.clone(),
                        to: entry.to.clone(),
                        cost: entry.cost,
                        reverse,
                    });
                }
            }
            costs.insert(key, entry.cost);
        }

        let ids: Vec<&String> = areas.keys().collect();
        for (i, a) in ids.iter().enumerate() {
            for b in &ids[i + 1..] {
                if !costs.contains_key(&pair_key(a, b)) {
                    return Err(FacilityError::MissingCost((*a).clone(), (*b).clone()));
                }
            }
        }

        Ok(Self { areas, costs })
    }

    pub fn area(&self, id: &str) -> Option<f64> {
        self.areas.get(id).copied()
    }

    /// Unit movement cost; zero on the diagonal, `None` for unknown ids.
    pub fn movement_cost(&self, from: &str, to: &str) -> Option<f64> {
        if !self.areas.contains_key(from) || !self.areas.contains_key(to) {
            return None;
        }
        if from == to {
            return Some(0.0);
        }
        self.costs.get(&pair_key(from, to)).copied()
    }

    pub fn enclosures(&self) -> impl Iterator<Item = (&str, f64)> {
        self.areas.iter().map(|(id, area)| (id.as_str(), *area))
    }

    pub fn len(&self) -> usize {
        self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.areas.is_empty()
    }
}
