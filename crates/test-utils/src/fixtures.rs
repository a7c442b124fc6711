//! Canned backing-store rows for sensor-sos tests.
//!
//! The sample network: one weather offering and one hydrology offering,
//! three procedures, and a feature hierarchy where a gauging station
//! belongs to both a river stretch and a monitoring network:
//!
//! ```text
//! basin ─┬─ river-stretch ── gauge-1
//!        │                     │
//! network ─────────────────────┘      (gauge-1 has two parents)
//! network ── weather-site-1
//! ```

use sos_common::SosOperation;
use sos_store::{FeatureRecord, InMemoryStore, OfferingRecord, ProcedureRecord};

/// Offering rows of the sample network.
pub fn sample_offerings() -> Vec<OfferingRecord> {
    let mut weather = OfferingRecord::new("weather");
    weather.name = Some("Weather observations".to_string());
    weather.procedures = vec!["thermometer-1".to_string(), "barometer-1".to_string()];
    weather.observable_properties = vec!["air_temperature".to_string(), "air_pressure".to_string()];

    let mut hydrology = OfferingRecord::new("hydrology");
    hydrology.name = Some("Hydrology observations".to_string());
    hydrology.procedures = vec!["water-gauge-1".to_string()];
    hydrology.observable_properties = vec!["water_level".to_string()];

    vec![weather, hydrology]
}

/// Procedure rows of the sample network.
pub fn sample_procedures() -> Vec<ProcedureRecord> {
    let mut thermometer = ProcedureRecord::new("thermometer-1");
    thermometer.name = Some("Station thermometer".to_string());

    vec![
        thermometer,
        ProcedureRecord::new("barometer-1"),
        ProcedureRecord::new("water-gauge-1"),
    ]
}

/// Feature rows of the sample network, including the two-parent gauge.
pub fn sample_features() -> Vec<FeatureRecord> {
    let mut gauge = FeatureRecord::new("gauge-1").with_parents(&["river-stretch", "network"]);
    gauge.procedures = vec!["water-gauge-1".to_string()];

    let mut weather_site = FeatureRecord::new("weather-site-1").with_parents(&["network"]);
    weather_site.procedures = vec!["thermometer-1".to_string(), "barometer-1".to_string()];

    vec![
        FeatureRecord::new("basin"),
        FeatureRecord::new("river-stretch").with_parents(&["basin"]),
        FeatureRecord::new("network"),
        gauge,
        weather_site,
    ]
}

/// Operations the sample deployment supports.
pub fn sample_operations() -> Vec<SosOperation> {
    vec![
        SosOperation::GetCapabilities,
        SosOperation::DescribeSensor,
        SosOperation::GetObservation,
        SosOperation::GetFeatureOfInterest,
    ]
}

/// An in-memory store loaded with the full sample network.
pub async fn populate_sample_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    store.set_offerings(sample_offerings()).await;
    store.set_procedures(sample_procedures()).await;
    store.set_features(sample_features()).await;
    store.set_operations(sample_operations()).await;
    store
}

/// A linear feature chain `chain-0 <- chain-1 <- ... <- chain-(n-1)`,
/// useful for closure-depth tests.
pub fn feature_chain(n: usize) -> Vec<FeatureRecord> {
    (0..n)
        .map(|i| {
            let mut record = FeatureRecord::new(format!("chain-{}", i));
            if i > 0 {
                record.parents = vec![format!("chain-{}", i - 1)];
            }
            record
        })
        .collect()
}
