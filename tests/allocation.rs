use flockplan::{
    AllocationEngine, AllocationError, AllocationRequest, AllocationResult, EnclosureInput, Plan,
    ServiceConfig,
};

fn engine() -> AllocationEngine {
    AllocationEngine::from_config(&ServiceConfig::demo().facility).unwrap()
}

fn load_request(name: &str) -> AllocationRequest {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("requests")
        .join(name);
    let data = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&data).unwrap()
}

/// Age 15 flock at its ideal 26 °C in all four demo houses.
fn request(populations: [u64; 4], total: Option<u64>) -> AllocationRequest {
    AllocationRequest {
        age: 15,
        cold_sensitivity: 0.6,
        heat_sensitivity: 1.5,
        rho_min: 7.0,
        rho_max: 60.0,
        total_population: total,
        enclosures: ["G1", "G2", "G3", "G4"]
            .iter()
            .zip(populations)
            .map(|(id, current_population)| EnclosureInput {
                id: id.to_string(),
                temperature: 26.0,
                usable_fraction: 1.0,
                current_population,
            })
            .collect(),
    }
}

fn targets(result: &AllocationResult) -> Vec<u64> {
    result
        .enclosures
        .iter()
        .map(|e| e.target_population)
        .collect()
}

fn assert_conserves_flow(result: &AllocationResult) {
    let Plan::Redistribution(plan) = &result.plan else {
        panic!("expected a redistribution");
    };
    for e in &result.enclosures {
        let supply = e.current_population.saturating_sub(e.target_population);
        let demand = e.target_population.saturating_sub(e.current_population);
        assert_eq!(plan.outgoing(&e.id), supply, "outgoing from {}", e.id);
        assert_eq!(plan.incoming(&e.id), demand, "incoming to {}", e.id);
    }
    for m in &plan.movements {
        assert_ne!(m.from, m.to);
        assert!(m.quantity > 0);
        assert_eq!(m.total_cost, m.quantity as f64 * m.unit_cost);
    }
}

#[test]
fn fresh_flock_is_placed_in_proportion_to_area() {
    let result = engine().allocate(&request([0; 4], Some(150_000))).unwrap();

    assert!(result.plan.is_fresh_allocation());
    assert!(result.movements().is_empty());
    assert_eq!(result.total_cost(), 0.0);
    assert_eq!(targets(&result), vec![37_500, 26_786, 37_500, 48_214]);

    let continuous: f64 = result.enclosures.iter().map(|e| e.continuous_target).sum();
    assert!((continuous - 150_000.0).abs() < 1e-3);
    for e in &result.enclosures {
        assert_eq!(e.optimal_density, 22.0);
        assert_eq!(e.cold_penalty, 0.0);
        assert_eq!(e.heat_penalty, 0.0);
    }
    assert!((result.max_deviation - (150_000.0 / 5_600.0 - 22.0)).abs() < 1e-6);
}

#[test]
fn stocked_houses_are_rebalanced_at_minimum_cost() {
    let result = engine()
        .allocate(&request([17_500, 12_000, 17_500, 23_000], None))
        .unwrap();

    assert_eq!(targets(&result), vec![17_500, 12_500, 17_500, 22_500]);
    let movements = result.movements();
    assert_eq!(movements.len(), 1);
    assert_eq!((movements[0].from.as_str(), movements[0].to.as_str()), ("G4", "G2"));
    assert_eq!(movements[0].quantity, 500);
    assert_eq!(result.total_cost(), 47_500.0);
    assert_conserves_flow(&result);
}

#[test]
fn balanced_houses_yield_an_empty_redistribution() {
    let result = engine()
        .allocate(&request([14_000, 10_000, 14_000, 18_000], None))
        .unwrap();
    assert_eq!(result.plan, Plan::Redistribution(Default::default()));
    assert!(!result.plan.is_fresh_allocation());
}

#[test]
fn override_is_ignored_for_stocked_houses() {
    let result = engine()
        .allocate(&request([17_500, 12_000, 17_500, 23_000], Some(1_000)))
        .unwrap();
    assert_eq!(targets(&result).iter().sum::<u64>(), 70_000);
}

#[test]
fn closed_house_is_emptied() {
    let mut req = request([17_500, 12_000, 17_500, 23_000], None);
    req.enclosures[1].usable_fraction = 0.0;
    let result = engine().allocate(&req).unwrap();

    let g2 = result.enclosure("G2").unwrap();
    assert_eq!(g2.target_population, 0);
    assert_eq!(g2.effective_area, 0.0);
    assert_eq!(g2.current_density, None);
    assert_eq!(targets(&result).iter().sum::<u64>(), 70_000);
    assert_conserves_flow(&result);
}

#[test]
fn shipped_redistribution_request_conserves_flow() {
    let req = load_request("redistribution.json");
    let result = engine().allocate(&req).unwrap();

    assert_eq!(targets(&result).iter().sum::<u64>(), 70_000);
    for e in &result.enclosures {
        assert!(e.target_population as f64 <= e.effective_area * req.rho_max + 1e-6);
        assert!(e.optimal_density >= req.rho_min && e.optimal_density <= req.rho_max);
    }
    assert_conserves_flow(&result);
}

#[test]
fn shipped_fresh_request_is_a_fresh_allocation() {
    let result = engine().allocate(&load_request("fresh_flock.json")).unwrap();
    assert_eq!(result.plan, Plan::FreshAllocation);
    assert_eq!(targets(&result).iter().sum::<u64>(), 150_000);
}

#[test]
fn repeated_runs_agree_on_objectives() {
    let req = load_request("redistribution.json");
    let first = engine().allocate(&req).unwrap();
    let second = engine().allocate(&req).unwrap();
    assert!((first.max_deviation - second.max_deviation).abs() < 1e-9);
    assert_eq!(first.total_cost(), second.total_cost());
}

#[test]
fn over_capacity_reports_infeasible_allocation() {
    let mut req = request([0; 4], Some(150_000));
    req.rho_max = 20.0;
    let err = engine().allocate(&req).unwrap_err();
    assert!(matches!(err, AllocationError::InfeasibleAllocation(_)));
}

#[test]
fn unknown_house_is_rejected() {
    let mut req = request([0; 4], Some(1_000));
    req.enclosures[3].id = "G7".into();
    let err = engine().allocate(&req).unwrap_err();
    assert_eq!(err, AllocationError::UnknownEnclosure("G7".into()));
}

#[test]
fn fresh_flock_without_total_is_invalid() {
    let err = engine().allocate(&request([0; 4], None)).unwrap_err();
    assert!(matches!(err, AllocationError::Validation(_)));
}

#[test]
fn shipped_config_matches_demo() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios/demo_farm.yaml");
    let config = ServiceConfig::from_yaml(path).unwrap();
    let shipped = AllocationEngine::from_config(&config.facility).unwrap();
    let demo = engine();
    for (id, area) in demo.facility().enclosures() {
        assert_eq!(shipped.facility().area(id), Some(area));
        for (other, _) in demo.facility().enclosures() {
            assert_eq!(
                shipped.facility().movement_cost(id, other),
                demo.facility().movement_cost(id, other)
            );
        }
    }
}
