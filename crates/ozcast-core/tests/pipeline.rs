//! End-to-end properties of the inference pipeline on the shipped
//! calibrations.
//!
//! Dense checks draw inputs from a seeded `StdRng` so failures reproduce.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::float_cmp,
    clippy::panic,
    clippy::arithmetic_side_effects
)]

use std::sync::Arc;
use std::thread;

use ozcast_core::aggregation::{AggregatedSurface, aggregate, extract_category_possibilities};
use ozcast_core::fuzzifier::fuzzify;
use ozcast_core::membership::Interval;
use ozcast_core::{BUILT_IN, Calibration, CalibrationHandle, CalibrationSet};
use ozcast_types::{Category, InferenceResult, PrecursorRecord, VersionTag};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const TOL: f64 = 1e-9;

fn built_in(tag: &str) -> Calibration {
    Calibration::built_in(tag)
        .expect("known built-in")
        .expect("built-in calibration builds")
}

fn universe(calibration: &Calibration, name: &str) -> Interval {
    calibration
        .registry()
        .get_variable(name)
        .expect("registered variable")
        .universe()
}

/// Draw a record, with each scalar up to 20% beyond its universe.
fn random_record(rng: &mut StdRng, calibration: &Calibration) -> PrecursorRecord {
    let mut draw = |name: &str| {
        let u = universe(calibration, name);
        let margin = 0.2 * u.width();
        rng.random_range((u.lo - margin)..=(u.hi + margin))
    };
    PrecursorRecord::new(draw("snow"), draw("mslp"), draw("wind"), draw("solar"))
}

fn clip_record(calibration: &Calibration, record: &PrecursorRecord) -> PrecursorRecord {
    PrecursorRecord::new(
        universe(calibration, "snow").clip(record.snow_depth_mm),
        universe(calibration, "mslp").clip(record.mslp_hpa),
        universe(calibration, "wind").clip(record.wind_speed_ms),
        universe(calibration, "solar").clip(record.solar_wm2),
    )
}

fn surface_for(calibration: &Calibration, record: &PrecursorRecord) -> AggregatedSurface {
    let inputs = calibration.fuzzify_record(record).unwrap();
    let activations = calibration.rules().fire(&inputs);
    aggregate(
        calibration.output().universe(),
        calibration.resolution(),
        calibration.rules().implicate(&activations),
    )
}

fn scenario() -> PrecursorRecord {
    PrecursorRecord::new(100.0, 1032.0, 1.5, 500.0)
}

// ---------------------------------------------------------------------------
// Membership and fuzzification
// ---------------------------------------------------------------------------

#[test]
fn memberships_are_well_formed() {
    let mut rng = StdRng::seed_from_u64(7);
    for (tag, _) in BUILT_IN {
        let calibration = built_in(tag);
        let registry = calibration.registry();
        for index in 0..registry.len() {
            let variable = registry
                .variable(ozcast_core::registry::VariableId(index))
                .unwrap();
            let u = variable.universe();
            for (term_index, term) in variable.terms().iter().enumerate() {
                let id = ozcast_core::registry::TermId(term_index);
                for _ in 0..2000 {
                    let x = rng.random_range(u.lo..=u.hi);
                    let d = variable.degree(id, x);
                    assert!((0.0..=1.0).contains(&d), "{tag} {} {}: {d} at {x}", variable.name(), term.name);
                    let below = u.lo - rng.random_range(1e-6..=u.width());
                    let above = u.hi + rng.random_range(1e-6..=u.width());
                    assert_eq!(variable.degree(id, below), 0.0);
                    assert_eq!(variable.degree(id, above), 0.0);
                }
            }
        }
    }
}

#[test]
fn clipping_is_idempotent_for_every_input() {
    let mut rng = StdRng::seed_from_u64(11);
    let calibration = built_in("v0.9");
    for name in ["snow", "mslp", "wind", "solar"] {
        let u = universe(&calibration, name);
        for _ in 0..1000 {
            let x = rng.random_range((u.lo - u.width())..=(u.hi + u.width()));
            let direct = fuzzify(calibration.registry(), name, x).unwrap();
            let clipped = fuzzify(calibration.registry(), name, u.clip(x)).unwrap();
            assert_eq!(direct.to_map(), clipped.to_map(), "{name} at {x}");
            assert_eq!(direct.value, clipped.value);
        }
    }
}

#[test]
fn clipped_records_infer_identically() {
    let mut rng = StdRng::seed_from_u64(13);
    let calibration = built_in("v1.0");
    for _ in 0..200 {
        let record = random_record(&mut rng, &calibration);
        let direct = calibration.infer(&record).unwrap();
        let clipped = calibration.infer(&clip_record(&calibration, &record)).unwrap();
        assert_eq!(direct.possibilities, clipped.possibilities);
        assert_eq!(direct.percentiles, clipped.percentiles);
        assert!(clipped.clipped_inputs.is_empty());
    }
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[test]
fn adding_a_rule_never_lowers_possibility_or_area() {
    let (_, yaml) = BUILT_IN[0];
    let extended = yaml.replace("version: \"v0.9\"", "version: \"v0.9-extra\"")
        + "\n  - id: calm_anyway\n    when: { wind: calm }\n    then: extreme\n";
    let base = built_in("v0.9");
    let more = Calibration::parse(&extended).unwrap();
    assert_eq!(more.rules().len(), base.rules().len() + 1);

    let mut rng = StdRng::seed_from_u64(17);
    for _ in 0..200 {
        let record = random_record(&mut rng, &base);
        let before = surface_for(&base, &record);
        let after = surface_for(&more, &record);
        assert!(after.area() + TOL >= before.area());

        let p_before = extract_category_possibilities(&before, base.output().bands());
        let p_after = extract_category_possibilities(&after, more.output().bands());
        for category in Category::ALL {
            assert!(p_after[&category] + TOL >= p_before[&category], "{category}");
        }
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

const SPARSE: &str = r"
version: sparse
inputs:
  - name: snow
    universe: [0.0, 250.0]
    terms:
      - { name: sufficient, shape: ramp_up, points: [40.0, 80.0] }
  - name: mslp
    universe: [995.0, 1050.0]
    terms:
      - { name: high, shape: ramp_up, points: [1022.0, 1040.0] }
  - name: wind
    universe: [0.0, 20.0]
    terms:
      - { name: calm, shape: ramp_down, points: [1.0, 4.0] }
  - name: solar
    universe: [0.0, 900.0]
    terms:
      - { name: high, shape: ramp_up, points: [400.0, 700.0] }
output:
  universe: [20.0, 140.0]
  categories:
    background: { shape: trapezoid, points: [20.0, 20.0, 40.0, 55.0] }
    moderate: { shape: trapezoid, points: [40.0, 55.0, 60.0, 75.0] }
    elevated: { shape: trapezoid, points: [60.0, 75.0, 80.0, 95.0] }
    extreme: { shape: trapezoid, points: [80.0, 95.0, 140.0, 140.0] }
rules:
  - id: stagnant_bright
    when: { snow: sufficient, mslp: high, wind: calm, solar: high }
    then: extreme
";

#[test]
fn no_activation_means_total_ignorance() {
    let calibration = Calibration::parse(SPARSE).unwrap();
    let result = calibration
        .infer(&PrecursorRecord::new(0.0, 1000.0, 10.0, 50.0))
        .unwrap();
    assert_eq!(result.ignorance, 1.0);
    assert!(result.possibilities.values().all(|&p| p == 0.0));
    assert_eq!(result.possibilities.len(), 4);
    assert_eq!(result.percentiles.p10, None);
    assert_eq!(result.percentiles.p50, None);
    assert_eq!(result.percentiles.p90, None);
    assert_eq!(result.dominant_category(), None);
    assert_eq!(result.activations.len(), 1);
    assert_eq!(result.activations[0].strength, 0.0);
}

#[test]
fn undefined_percentiles_serialize_as_null() {
    let calibration = Calibration::parse(SPARSE).unwrap();
    let result = calibration
        .infer(&PrecursorRecord::new(0.0, 1000.0, 10.0, 50.0))
        .unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert!(json["percentiles"]["p50"].is_null());
}

#[test]
fn percentiles_are_ordered_within_universe() {
    let mut rng = StdRng::seed_from_u64(19);
    for (tag, _) in BUILT_IN {
        let calibration = built_in(tag);
        let out = calibration.output().universe();
        for _ in 0..300 {
            let record = random_record(&mut rng, &calibration);
            let result = calibration.infer(&record).unwrap();
            let p = result.percentiles;
            if let (Some(p10), Some(p50), Some(p90)) = (p.p10, p.p50, p.p90) {
                assert!(p10 <= p50 && p50 <= p90, "{tag}: {p:?}");
                assert!(out.contains(p10) && out.contains(p90), "{tag}: {p:?}");
            } else {
                assert_eq!(p, ozcast_types::Percentiles::UNDEFINED);
                assert_eq!(result.ignorance, 1.0);
            }
        }
    }
}

#[test]
fn possibility_requires_a_firing_rule_with_that_consequent() {
    let mut rng = StdRng::seed_from_u64(23);
    for (tag, _) in BUILT_IN {
        let calibration = built_in(tag);
        for _ in 0..300 {
            let result = calibration.infer(&random_record(&mut rng, &calibration)).unwrap();
            for category in Category::ALL {
                let strongest = strongest_rule(&result, category);
                let possibility = result.possibility(category);
                assert!(
                    possibility <= strongest + TOL,
                    "{tag} {category}: {possibility} > {strongest}"
                );
                if strongest <= 0.0 {
                    assert_eq!(possibility, 0.0, "{tag} {category}");
                }
            }
            let max = result.possibilities.values().copied().fold(0.0, f64::max);
            assert!((result.ignorance - (1.0 - max)).abs() < TOL);
        }
    }
}

fn strongest_rule(result: &InferenceResult, category: Category) -> f64 {
    result
        .activations
        .iter()
        .filter(|a| a.consequent == category)
        .map(|a| a.strength)
        .fold(0.0, f64::max)
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn stagnant_snow_covered_ridge() {
    let result = built_in("v0.9").infer(&scenario()).unwrap();
    assert!(result.possibility(Category::Extreme) > 0.3);
    assert!(result.possibility(Category::Elevated) > 0.5);
    assert!(result.possibility(Category::Background) < TOL);
    assert!(result.ignorance > 0.4);

    // Background's support is [20, 55]; its midpoint is 37.5.
    let p50 = result.percentiles.p50.unwrap();
    assert!(p50 > 37.5);
    assert!((p50 - 94.03).abs() < 0.5, "p50 {p50}");
}

#[test]
fn no_snow_overrides_everything() {
    let result = built_in("v0.9")
        .infer(&PrecursorRecord::new(0.0, 1032.0, 1.5, 500.0))
        .unwrap();
    assert!((result.possibility(Category::Background) - 1.0).abs() < TOL);
    assert_eq!(result.possibility(Category::Moderate), 0.0);
    assert_eq!(result.possibility(Category::Elevated), 0.0);
    assert_eq!(result.possibility(Category::Extreme), 0.0);
    assert!(result.ignorance.abs() < TOL);
    assert_eq!(result.dominant_category(), Some(Category::Background));
}

// ---------------------------------------------------------------------------
// Versions and concurrency
// ---------------------------------------------------------------------------

#[test]
fn versions_are_isolated() {
    let v09 = built_in("v0.9");
    let before = v09.infer(&scenario()).unwrap();

    let v10 = built_in("v1.0");
    let other = v10.infer(&scenario()).unwrap();
    let after = v09.infer(&scenario()).unwrap();

    assert_eq!(before, after);
    assert_ne!(before.possibilities, other.possibilities);
    assert_eq!(other.version, VersionTag::new("v1.0"));
    assert!((other.possibility(Category::Elevated) - 2.0 / 3.0).abs() < TOL);
    assert!((other.possibility(Category::Extreme) - 1.0 / 3.0).abs() < TOL);
}

#[test]
fn set_serves_both_versions_side_by_side() {
    let set = CalibrationSet::built_in().unwrap();
    let a = set.get(&VersionTag::new("v0.9")).unwrap().infer(&scenario()).unwrap();
    let b = set.get(&VersionTag::new("v1.0")).unwrap().infer(&scenario()).unwrap();
    assert_eq!(a.version.as_str(), "v0.9");
    assert_eq!(b.version.as_str(), "v1.0");
    assert!(set.get(&VersionTag::new("v3")).is_err());
}

#[test]
fn shared_calibration_gives_identical_results_across_threads() {
    let calibration = Arc::new(built_in("v0.9"));
    let mut rng = StdRng::seed_from_u64(29);
    let records: Arc<Vec<PrecursorRecord>> =
        Arc::new((0..64).map(|_| random_record(&mut rng, &calibration)).collect());
    let expected: Vec<InferenceResult> = records
        .iter()
        .map(|r| calibration.infer(r).unwrap())
        .collect();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let calibration = Arc::clone(&calibration);
            let records = Arc::clone(&records);
            thread::spawn(move || {
                records
                    .iter()
                    .map(|r| calibration.infer(r).unwrap())
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), expected);
    }
}

#[test]
fn readers_never_see_a_partial_swap() {
    let set = CalibrationSet::built_in().unwrap();
    let v09 = set.get(&VersionTag::new("v0.9")).unwrap();
    let v10 = set.get(&VersionTag::new("v1.0")).unwrap();
    let expected_v09 = v09.infer(&scenario()).unwrap();
    let expected_v10 = v10.infer(&scenario()).unwrap();

    let handle = Arc::new(CalibrationHandle::new(Arc::clone(&v09)));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = Arc::clone(&handle);
            let expected_v09 = expected_v09.clone();
            let expected_v10 = expected_v10.clone();
            thread::spawn(move || {
                for _ in 0..200 {
                    let result = handle.current().infer(&scenario()).unwrap();
                    assert!(result == expected_v09 || result == expected_v10);
                }
            })
        })
        .collect();

    for i in 0..50 {
        let next = if i % 2 == 0 { Arc::clone(&v10) } else { Arc::clone(&v09) };
        handle.replace(next);
    }
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(handle.current().version().as_str(), "v0.9");
}
