//! End-to-end properties of the emissions engine through its public API.

use carbon_core::calculator::{round_to, CarbonCalculator};
use carbon_core::clock::FixedClock;
use carbon_core::factors::{Category, EMISSION_FACTORS};
use carbon_core::request::{ApiResponse, EmissionRequest};
use carbon_core::{EmissionLedger, EmissionResult};
use chrono::{TimeZone, Utc};
use pretty_assertions::assert_eq;
use serde_json::json;

fn calculator() -> CarbonCalculator<FixedClock> {
    let at = Utc.with_ymd_and_hms(2025, 11, 10, 12, 0, 0).unwrap();
    CarbonCalculator::with_clock(FixedClock::new(at))
}

fn assert_tons_consistent(result: &EmissionResult) {
    assert_eq!(
        result.emissions_tons,
        round_to(result.emissions_kg / 1000.0, 4),
        "tons out of step with kg for {result:?}"
    );
}

#[test]
fn every_table_entry_at_one_canonical_unit() {
    let calc = calculator();
    for (category, entry) in EMISSION_FACTORS.entries() {
        let result = calc.calculate(category.name(), 1.0, category.canonical_unit(), Some(entry.name), "direct");
        assert_eq!(
            result.emissions_kg,
            round_to(entry.kg_co2e_per_unit, 2),
            "{category}/{}",
            entry.name
        );
        assert_tons_consistent(&result);
    }
}

#[test]
fn documented_examples() {
    let calc = calculator();

    let r = calc.calculate("energy", 1.0, "kwh", Some("unknown_sub"), "direct");
    assert_eq!(r.emissions_kg, round_to(0.082, 2));

    let r = calc.calculate("materials", 1.0, "kg", Some("unknown_sub"), "direct");
    assert_eq!(r.emissions_kg, 2.0);

    let r = calc.calculate("transport", 10.0, "km", Some("gasoline_car"), "indirect");
    assert_eq!(r.emissions_kg, 1.63);

    let r = calc.calculate("materials", 2.0, "ton", Some("steel"), "direct");
    assert_eq!(r.emissions_kg, 4600.0);

    let r = calc.calculate("energy", 5.0, "bogus_unit", Some("solar"), "direct");
    assert_eq!(r.emissions_kg, round_to(5.0 * 0.045, 2));

    let r = calc.calculate("unknown_cat", 3.0, "x", None, "direct");
    assert_eq!(r.emissions_kg, 3.0);
}

#[test]
fn tons_track_kg_across_a_grid_of_inputs() {
    let calc = calculator();
    let quantities = [0.0, 0.049, 0.5, 1.0, 7.3, 49.99, 123.456, 1000.0, 98765.4321];
    let scopes = ["direct", "indirect", "other", "unknown"];

    for category in Category::ALL {
        for entry in EMISSION_FACTORS.subcategories(category) {
            for quantity in quantities {
                for scope in scopes {
                    let result = calc.calculate(category.name(), quantity, category.canonical_unit(), Some(entry.name), scope);
                    assert_tons_consistent(&result);
                    assert!((result.emissions_kg * 100.0 - (result.emissions_kg * 100.0).round()).abs() < 1e-6);
                }
            }
        }
    }
}

#[test]
fn json_request_to_envelope_to_ledger() {
    let body = json!({
        "category": "water",
        "quantity": "2500",
        "unit": "liter",
        "subcategory": "wastewater",
        "scope": "indirect"
    });

    let calc = calculator();
    let request = EmissionRequest::from_json(&body).unwrap();
    let result = calc.calculate_request(&request);
    assert_eq!(result.emissions_kg, round_to(2500.0 * 0.001 * 0.45 * 0.85, 2));

    let envelope = serde_json::to_value(ApiResponse::ok(result.clone())).unwrap();
    assert_eq!(envelope["success"], true);
    assert_eq!(envelope["data"]["unit"], "liter");
    assert_eq!(envelope["data"]["quantity"], 2500.0);
    assert_eq!(envelope["data"]["timestamp"], "2025-11-10T12:00:00Z");

    let mut ledger = EmissionLedger::new();
    let id = ledger.insert("ana@example.com", result.clone());
    assert_eq!(ledger.get(id).unwrap().result, result);
}

#[test]
fn non_numeric_quantity_never_reaches_the_engine() {
    let body = json!({ "category": "energy", "quantity": "twelve", "unit": "kwh", "scope": "direct" });
    let err = EmissionRequest::from_json(&body).unwrap_err();
    assert_eq!(err.error_code(), "INVALID_QUANTITY");

    let envelope: ApiResponse<EmissionResult> = Err(err).into();
    let json = serde_json::to_value(&envelope).unwrap();
    assert_eq!(json["success"], false);
    assert!(json.get("data").is_none());
}

#[test]
fn concurrent_calculations_agree() {
    let handles: Vec<_> = (0..8)
        .map(|_| {
            std::thread::spawn(|| {
                let calc = calculator();
                calc.calculate("transport", 321.0, "km", Some("airplane"), "other")
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert!(results.windows(2).all(|w| w[0] == w[1]));
}
