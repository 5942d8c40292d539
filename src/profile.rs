//! Age-dependent climate and stocking profile

use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Profile {
    /// Ideal ambient temperature in °C.
    pub ideal_temperature: f64,
    /// Baseline stocking density in animals per m².
    pub baseline_density: f64,
}

#[derive(Clone, Copy, Debug)]
struct Bracket {
    min_age: u32,
    profile: Profile,
}

const fn bracket(min_age: u32, ideal_temperature: f64, baseline_density: f64) -> Bracket {
    Bracket {
        min_age,
        profile: Profile {
            ideal_temperature,
            baseline_density,
        },
    }
}

/// Ascending by lower age bound; each bracket runs until the next one starts.
const BRACKETS: [Bracket; 9] = [
    bracket(0, 33.0, 40.0),
    bracket(4, 31.0, 35.0),
    bracket(7, 29.0, 30.0),
    bracket(10, 27.0, 25.0),
    bracket(14, 26.0, 22.0),
    bracket(18, 25.0, 20.0),
    bracket(22, 23.0, 18.0),
    bracket(28, 22.0, 16.0),
    bracket(34, 21.0, 12.0),
];

/// Looks up the profile for an age in days. Total over every `u32`.
pub fn profile_for_age(age: u32) -> Profile {
    let upper = BRACKETS.partition_point(|b| b.min_age <= age);
    // BRACKETS[0] starts at 0, so `upper` is at least 1.
    BRACKETS[upper - 1].profile
}
